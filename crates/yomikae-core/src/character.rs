//! Character entries: the primary lookup unit of the reference.
//!
//! A character entry is keyed by its written form (a single character or a
//! compound). Japanese and Chinese readings are optional sub-records; an
//! entry may carry either, both or neither.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── JLPT ────────────────────────────────────────────────────────────────────

/// Japanese-Language-Proficiency-Test tier; 1 is hardest, 5 is easiest.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct JlptLevel(u8);

impl JlptLevel {
  pub const N1: Self = Self(1);
  pub const N5: Self = Self(5);

  pub fn new(level: i64) -> crate::Result<Self> {
    match level {
      1..=5 => Ok(Self(level as u8)),
      other => Err(Error::InvalidJlptLevel(other)),
    }
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<u8> for JlptLevel {
  type Error = Error;

  fn try_from(value: u8) -> crate::Result<Self> { Self::new(i64::from(value)) }
}

impl From<JlptLevel> for u8 {
  fn from(level: JlptLevel) -> u8 { level.0 }
}

impl fmt::Display for JlptLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "N{}", self.0)
  }
}

// ─── Readings ────────────────────────────────────────────────────────────────

/// Japanese readings and glosses for a character.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JapaneseReading {
  /// Sino-Japanese readings.
  pub onyomi:     Vec<String>,
  /// Native Japanese readings.
  pub kunyomi:    Vec<String>,
  pub meanings:   Vec<String>,
  pub jlpt_level: Option<JlptLevel>,
}

/// Chinese readings and glosses, split by orthography where they diverge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChineseReading {
  pub pinyin:               Vec<String>,
  pub simplified:           Option<String>,
  pub traditional:          Option<String>,
  pub meanings_simplified:  Vec<String>,
  pub meanings_traditional: Vec<String>,
}

// ─── CharacterEntry ──────────────────────────────────────────────────────────

/// A single character or compound with its readings in both languages.
///
/// `character` is the natural key; writing an entry with an existing key
/// replaces the stored record wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterEntry {
  pub character:       String,
  pub japanese:        Option<JapaneseReading>,
  pub chinese:         Option<ChineseReading>,
  pub stroke_count:    Option<u32>,
  pub radical:         Option<String>,
  /// Lower is more frequent.
  pub frequency_rank:  Option<u32>,
  /// Id of the [`FalseFriendEntry`](crate::false_friend::FalseFriendEntry)
  /// describing this form, if any. Not enforced as a foreign key.
  pub false_friend_id: Option<String>,
}

impl CharacterEntry {
  /// Convenience constructor with every optional field unset.
  pub fn new(character: impl Into<String>) -> Self {
    Self {
      character:       character.into(),
      japanese:        None,
      chinese:         None,
      stroke_count:    None,
      radical:         None,
      frequency_rank:  None,
      false_friend_id: None,
    }
  }

  pub fn is_false_friend(&self) -> bool { self.false_friend_id.is_some() }

  pub fn jlpt_level(&self) -> Option<JlptLevel> {
    self.japanese.as_ref().and_then(|jp| jp.jlpt_level)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn jlpt_level_bounds() {
    assert_eq!(JlptLevel::new(1).unwrap(), JlptLevel::N1);
    assert_eq!(JlptLevel::new(5).unwrap(), JlptLevel::N5);
    assert!(matches!(JlptLevel::new(0), Err(Error::InvalidJlptLevel(0))));
    assert!(matches!(JlptLevel::new(6), Err(Error::InvalidJlptLevel(6))));
  }

  #[test]
  fn jlpt_level_rejects_out_of_range_json() {
    let ok: JlptLevel = serde_json::from_str("3").unwrap();
    assert_eq!(ok.get(), 3);
    assert_eq!(ok.to_string(), "N3");
    assert!(serde_json::from_str::<JlptLevel>("9").is_err());
  }

  #[test]
  fn false_friend_flag_follows_reference() {
    let mut entry = CharacterEntry::new("手紙");
    assert!(!entry.is_false_friend());
    entry.false_friend_id = Some("ff_001".into());
    assert!(entry.is_false_friend());
  }
}
