//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings. Readings, meaning lists, examples and
//! overlap breakdowns are compact JSON. Enumerations use their snake_case
//! labels.

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use yomikae_core::{
  character::{CharacterEntry, ChineseReading, JapaneseReading},
  false_friend::{AffectedSystem, Category, Example, FalseFriendEntry, MeaningOverlap, Severity},
  store::{ImportBatch, PayloadKind},
};

use crate::{Error, Result};

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

pub fn decode_json<T: DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

fn encode_json_opt<T: Serialize>(value: Option<&T>) -> Result<Option<String>> {
  value.map(encode_json).transpose()
}

fn decode_json_opt<T: DeserializeOwned>(s: Option<&str>) -> Result<Option<T>> {
  s.map(decode_json).transpose()
}

/// Natural keys are never blank.
fn key(field: &'static str, value: &str) -> Result<String> {
  if value.trim().is_empty() {
    return Err(yomikae_core::Error::EmptyKey(field).into());
  }
  Ok(value.to_owned())
}

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("bad timestamp {s:?}: {e}")))
}

// ─── PayloadKind ─────────────────────────────────────────────────────────────

pub fn decode_payload_kind(s: &str) -> Result<PayloadKind> {
  match s {
    "characters" => Ok(PayloadKind::Characters),
    "false_friends" => Ok(PayloadKind::FalseFriends),
    other => Err(Error::Decode(format!("unknown payload kind: {other:?}"))),
  }
}

pub fn decode_count(n: i64) -> Result<usize> {
  usize::try_from(n).map_err(|_| Error::Decode(format!("negative count: {n}")))
}

// ─── Character rows ──────────────────────────────────────────────────────────

/// Column list shared by every character `SELECT`.
pub const CHARACTER_COLUMNS: &str =
  "character, japanese, chinese, stroke_count, radical, frequency_rank, false_friend_id";

/// A [`CharacterEntry`] encoded into column values, ready to bind.
pub struct CharacterRow {
  pub character:       String,
  pub japanese:        Option<String>,
  pub chinese:         Option<String>,
  pub stroke_count:    Option<u32>,
  pub radical:         Option<String>,
  pub frequency_rank:  Option<u32>,
  pub jlpt_level:      Option<u8>,
  pub false_friend_id: Option<String>,
}

impl CharacterRow {
  pub fn encode(entry: &CharacterEntry) -> Result<Self> {
    Ok(Self {
      character:       key("character", &entry.character)?,
      japanese:        encode_json_opt(entry.japanese.as_ref())?,
      chinese:         encode_json_opt(entry.chinese.as_ref())?,
      stroke_count:    entry.stroke_count,
      radical:         entry.radical.clone(),
      frequency_rank:  entry.frequency_rank,
      jlpt_level:      entry.jlpt_level().map(|l| l.get()),
      false_friend_id: entry.false_friend_id.clone(),
    })
  }
}

/// Raw values read from a `character_entries` row in [`CHARACTER_COLUMNS`]
/// order.
pub struct RawCharacter {
  pub character:       String,
  pub japanese:        Option<String>,
  pub chinese:         Option<String>,
  pub stroke_count:    Option<u32>,
  pub radical:         Option<String>,
  pub frequency_rank:  Option<u32>,
  pub false_friend_id: Option<String>,
}

impl RawCharacter {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      character:       row.get(0)?,
      japanese:        row.get(1)?,
      chinese:         row.get(2)?,
      stroke_count:    row.get(3)?,
      radical:         row.get(4)?,
      frequency_rank:  row.get(5)?,
      false_friend_id: row.get(6)?,
    })
  }

  pub fn into_entry(self) -> Result<CharacterEntry> {
    Ok(CharacterEntry {
      character:       self.character,
      japanese:        decode_json_opt::<JapaneseReading>(self.japanese.as_deref())?,
      chinese:         decode_json_opt::<ChineseReading>(self.chinese.as_deref())?,
      stroke_count:    self.stroke_count,
      radical:         self.radical,
      frequency_rank:  self.frequency_rank,
      false_friend_id: self.false_friend_id,
    })
  }
}

// ─── False-friend rows ───────────────────────────────────────────────────────

/// Column list shared by every false-friend `SELECT`.
pub const FALSE_FRIEND_COLUMNS: &str = "id, character, jp_meanings, cn_meanings_simplified, \
   cn_meanings_traditional, severity, category, affected_system, explanation, examples, \
   traditional_note, merged_from, jp_reading, cn_pinyin, cn_characters, mnemonic_tip, \
   meaning_overlap";

/// Encoded column values for a [`FalseFriendEntry`]. The same struct is
/// filled from a `SELECT` in [`FALSE_FRIEND_COLUMNS`] order.
pub struct FalseFriendRow {
  pub id:                      String,
  pub character:               String,
  pub jp_meanings:             String,
  pub cn_meanings_simplified:  String,
  pub cn_meanings_traditional: String,
  pub severity:                String,
  pub category:                String,
  pub affected_system:         String,
  pub explanation:             String,
  pub examples:                String,
  pub traditional_note:        Option<String>,
  pub merged_from:             Option<String>,
  pub jp_reading:              Option<String>,
  pub cn_pinyin:               Option<String>,
  pub cn_characters:           Option<String>,
  pub mnemonic_tip:            Option<String>,
  pub meaning_overlap:         Option<String>,
}

impl FalseFriendRow {
  pub fn encode(entry: &FalseFriendEntry) -> Result<Self> {
    Ok(Self {
      id:                      key("id", &entry.id)?,
      character:               entry.character.clone(),
      jp_meanings:             encode_json(&entry.jp_meanings)?,
      cn_meanings_simplified:  encode_json(&entry.cn_meanings_simplified)?,
      cn_meanings_traditional: encode_json(&entry.cn_meanings_traditional)?,
      severity:                entry.severity.as_str().to_owned(),
      category:                entry.category.as_str().to_owned(),
      affected_system:         entry.affected_system.as_str().to_owned(),
      explanation:             entry.explanation.clone(),
      examples:                encode_json(&entry.examples)?,
      traditional_note:        entry.traditional_note.clone(),
      merged_from:             encode_json_opt(entry.merged_from.as_ref())?,
      jp_reading:              entry.jp_reading.clone(),
      cn_pinyin:               entry.cn_pinyin.clone(),
      cn_characters:           entry.cn_characters.clone(),
      mnemonic_tip:            entry.mnemonic_tip.clone(),
      meaning_overlap:         encode_json_opt(entry.meaning_overlap.as_ref())?,
    })
  }

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                      row.get(0)?,
      character:               row.get(1)?,
      jp_meanings:             row.get(2)?,
      cn_meanings_simplified:  row.get(3)?,
      cn_meanings_traditional: row.get(4)?,
      severity:                row.get(5)?,
      category:                row.get(6)?,
      affected_system:         row.get(7)?,
      explanation:             row.get(8)?,
      examples:                row.get(9)?,
      traditional_note:        row.get(10)?,
      merged_from:             row.get(11)?,
      jp_reading:              row.get(12)?,
      cn_pinyin:               row.get(13)?,
      cn_characters:           row.get(14)?,
      mnemonic_tip:            row.get(15)?,
      meaning_overlap:         row.get(16)?,
    })
  }

  pub fn into_entry(self) -> Result<FalseFriendEntry> {
    Ok(FalseFriendEntry {
      id:                      self.id,
      character:               self.character,
      jp_meanings:             decode_json(&self.jp_meanings)?,
      cn_meanings_simplified:  decode_json(&self.cn_meanings_simplified)?,
      cn_meanings_traditional: decode_json(&self.cn_meanings_traditional)?,
      severity:                self.severity.parse::<Severity>()?,
      category:                self.category.parse::<Category>()?,
      affected_system:         self.affected_system.parse::<AffectedSystem>()?,
      explanation:             self.explanation,
      examples:                decode_json::<Vec<Example>>(&self.examples)?,
      traditional_note:        self.traditional_note,
      merged_from:             decode_json_opt(self.merged_from.as_deref())?,
      jp_reading:              self.jp_reading,
      cn_pinyin:               self.cn_pinyin,
      cn_characters:           self.cn_characters,
      mnemonic_tip:            self.mnemonic_tip,
      meaning_overlap:         decode_json_opt::<MeaningOverlap>(
        self.meaning_overlap.as_deref(),
      )?,
    })
  }
}

// ─── Import batches ──────────────────────────────────────────────────────────

pub struct RawImportBatch {
  pub kind:            String,
  pub source_shape:    String,
  pub payload_version: Option<String>,
  pub accepted:        i64,
  pub rejected:        i64,
  pub imported_at:     String,
}

impl RawImportBatch {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      kind:            row.get(0)?,
      source_shape:    row.get(1)?,
      payload_version: row.get(2)?,
      accepted:        row.get(3)?,
      rejected:        row.get(4)?,
      imported_at:     row.get(5)?,
    })
  }

  pub fn into_batch(self) -> Result<ImportBatch> {
    Ok(ImportBatch {
      kind:            decode_payload_kind(&self.kind)?,
      source_shape:    self.source_shape,
      payload_version: self.payload_version,
      accepted:        decode_count(self.accepted)?,
      rejected:        decode_count(self.rejected)?,
      imported_at:     decode_dt(&self.imported_at)?,
    })
  }
}
