//! False-friend entries: written forms whose meaning diverges between
//! Japanese and Chinese.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

// ─── Classification ──────────────────────────────────────────────────────────

/// How badly a learner is misled by the shared form.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
  Critical,
  Important,
  Subtle,
}

impl Severity {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Critical => "critical",
      Self::Important => "important",
      Self::Subtle => "subtle",
    }
  }
}

impl FromStr for Severity {
  type Err = Error;

  fn from_str(s: &str) -> crate::Result<Self> {
    match s {
      "critical" => Ok(Self::Critical),
      "important" => Ok(Self::Important),
      "subtle" => Ok(Self::Subtle),
      _ => Err(Error::UnknownSeverity(s.to_owned())),
    }
  }
}

/// Why the meanings diverged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
  /// Meanings drifted apart over centuries in both languages.
  #[serde(alias = "trueDivergence")]
  TrueDivergence,
  /// Simplified Chinese merged distinct traditional characters into one.
  #[serde(alias = "simplificationMerge")]
  SimplificationMerge,
  /// A Meiji-era Japanese coinage borrowed back into Chinese.
  #[serde(alias = "japaneseCoinage")]
  JapaneseCoinage,
  /// Same core meaning with a different range of usage.
  #[serde(alias = "scopeDifference")]
  ScopeDifference,
}

impl Category {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::TrueDivergence => "true_divergence",
      Self::SimplificationMerge => "simplification_merge",
      Self::JapaneseCoinage => "japanese_coinage",
      Self::ScopeDifference => "scope_difference",
    }
  }
}

impl FromStr for Category {
  type Err = Error;

  fn from_str(s: &str) -> crate::Result<Self> {
    match s {
      "true_divergence" | "trueDivergence" => Ok(Self::TrueDivergence),
      "simplification_merge" | "simplificationMerge" => {
        Ok(Self::SimplificationMerge)
      }
      "japanese_coinage" | "japaneseCoinage" => Ok(Self::JapaneseCoinage),
      "scope_difference" | "scopeDifference" => Ok(Self::ScopeDifference),
      _ => Err(Error::UnknownCategory(s.to_owned())),
    }
  }
}

/// A Chinese writing system a reader may have chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orthography {
  Simplified,
  Traditional,
}

/// Which Chinese orthographies exhibit the divergence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffectedSystem {
  Both,
  #[serde(alias = "simplifiedOnly")]
  SimplifiedOnly,
  #[serde(alias = "traditionalOnly")]
  TraditionalOnly,
}

impl AffectedSystem {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Both => "both",
      Self::SimplifiedOnly => "simplified_only",
      Self::TraditionalOnly => "traditional_only",
    }
  }

  /// Whether a reader of `orthography` is exposed to this false friend.
  pub fn affects(self, orthography: Orthography) -> bool {
    match self {
      Self::Both => true,
      Self::SimplifiedOnly => orthography == Orthography::Simplified,
      Self::TraditionalOnly => orthography == Orthography::Traditional,
    }
  }
}

impl FromStr for AffectedSystem {
  type Err = Error;

  fn from_str(s: &str) -> crate::Result<Self> {
    match s {
      "both" => Ok(Self::Both),
      "simplified_only" | "simplifiedOnly" => Ok(Self::SimplifiedOnly),
      "traditional_only" | "traditionalOnly" => Ok(Self::TraditionalOnly),
      _ => Err(Error::UnknownAffectedSystem(s.to_owned())),
    }
  }
}

// ─── Sub-records ─────────────────────────────────────────────────────────────

/// A usage example in each language. Fields may contain `base[reading]`
/// annotations; see [`crate::annotation`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Example {
  pub japanese:            String,
  pub chinese_simplified:  String,
  pub chinese_traditional: String,
  pub translation:         String,
}

/// Meanings split by whether both languages share them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeaningOverlap {
  pub shared:  Vec<String>,
  pub jp_only: Vec<String>,
  pub cn_only: Vec<String>,
}

impl MeaningOverlap {
  pub fn is_empty(&self) -> bool {
    self.shared.is_empty() && self.jp_only.is_empty() && self.cn_only.is_empty()
  }
}

// ─── FalseFriendEntry ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FalseFriendEntry {
  pub id:                      String,
  /// The shared written form. Several entries may share one.
  pub character:               String,
  pub jp_meanings:             Vec<String>,
  pub cn_meanings_simplified:  Vec<String>,
  pub cn_meanings_traditional: Vec<String>,
  pub severity:                Severity,
  pub category:                Category,
  pub affected_system:         AffectedSystem,
  pub explanation:             String,
  pub examples:                Vec<Example>,
  pub traditional_note:        Option<String>,
  /// Legacy forms collapsed by simplification; only for
  /// [`Category::SimplificationMerge`].
  pub merged_from:             Option<Vec<String>>,
  pub jp_reading:              Option<String>,
  pub cn_pinyin:               Option<String>,
  /// The Chinese spelling when it differs from `character`.
  pub cn_characters:           Option<String>,
  pub mnemonic_tip:            Option<String>,
  pub meaning_overlap:         Option<MeaningOverlap>,
}

impl FalseFriendEntry {
  /// Whether a reader of `orthography` should be shown this entry.
  pub fn is_relevant_to(&self, orthography: Orthography) -> bool {
    self.affected_system.affects(orthography)
  }
}
