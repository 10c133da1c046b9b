//! False-friend payload normalisers, one per [`SourceShape`].

use serde::Deserialize;
use serde_json::Value;
use yomikae_core::false_friend::{
  AffectedSystem, Category, Example, FalseFriendEntry, MeaningOverlap, Severity,
};

use crate::{
  Normalized, SourceShape, collect_records,
  fields::{self, TextList, list},
  shape::Detected,
};

const KEY_FIELDS: &[&str] = &["id"];

pub(crate) fn normalize(detected: Detected) -> Normalized<FalseFriendEntry> {
  match detected.shape {
    SourceShape::Structured => collect_records(detected, KEY_FIELDS, from_structured),
    SourceShape::Wrapped => collect_records(detected, KEY_FIELDS, from_wrapped),
    SourceShape::Simplified => collect_records(detected, KEY_FIELDS, from_simplified),
  }
}

// ─── Canonical draft ─────────────────────────────────────────────────────────

#[derive(Default)]
struct FalseFriendDraft {
  id:                      String,
  character:               String,
  jp_meanings:             Option<Vec<String>>,
  cn_meanings_simplified:  Option<Vec<String>>,
  cn_meanings_traditional: Option<Vec<String>>,
  /// One list covering both orthographies.
  cn_meanings:             Option<Vec<String>>,
  severity:                Option<String>,
  category:                Option<String>,
  affected_system:         Option<String>,
  explanation:             String,
  examples:                Vec<Example>,
  traditional_note:        Option<String>,
  merged_from:             Option<Vec<String>>,
  jp_reading:              Option<String>,
  cn_pinyin:               Option<String>,
  cn_characters:           Option<String>,
  mnemonic_tip:            Option<String>,
  shared_meanings:         Option<Vec<String>>,
  jp_only_meanings:        Option<Vec<String>>,
  cn_only_meanings:        Option<Vec<String>>,
}

fn required_list(value: Option<Vec<String>>, field: &str) -> Result<Vec<String>, String> {
  match value {
    Some(v) if !v.is_empty() => Ok(v),
    _ => Err(format!("{field} is empty")),
  }
}

fn finish(draft: FalseFriendDraft) -> Result<FalseFriendEntry, String> {
  let id = draft.id.trim().to_owned();
  if id.is_empty() {
    return Err("id is empty".into());
  }
  let character = draft.character.trim().to_owned();
  if character.is_empty() {
    return Err("character is empty".into());
  }

  let jp_meanings = required_list(draft.jp_meanings, "jp_meanings")?;
  let cn_meanings_simplified = required_list(
    draft.cn_meanings_simplified.or_else(|| draft.cn_meanings.clone()),
    "cn_meanings_simplified",
  )?;
  let cn_meanings_traditional = required_list(
    draft.cn_meanings_traditional.or(draft.cn_meanings),
    "cn_meanings_traditional",
  )?;

  // Absent classifications fall back to the historical defaults; present
  // but unknown values reject the record.
  let severity = match draft.severity.as_deref() {
    None => Severity::Important,
    Some(s) => s.parse().map_err(|e: yomikae_core::Error| e.to_string())?,
  };
  let category = match draft.category.as_deref() {
    None => Category::TrueDivergence,
    Some(s) => s.parse().map_err(|e: yomikae_core::Error| e.to_string())?,
  };
  let affected_system = match draft.affected_system.as_deref() {
    None => AffectedSystem::Both,
    Some(s) => s.parse().map_err(|e: yomikae_core::Error| e.to_string())?,
  };

  let explanation = draft.explanation.trim().to_owned();
  if explanation.is_empty() {
    return Err("explanation is empty".into());
  }

  let merged_from = match draft.merged_from.filter(|m| !m.is_empty()) {
    Some(forms) if category == Category::SimplificationMerge => Some(forms),
    Some(_) => {
      tracing::warn!(id = %id, category = category.as_str(), "dropping merged_from outside a simplification merge");
      None
    }
    None => None,
  };

  let meaning_overlap = MeaningOverlap {
    shared:  draft.shared_meanings.unwrap_or_default(),
    jp_only: draft.jp_only_meanings.unwrap_or_default(),
    cn_only: draft.cn_only_meanings.unwrap_or_default(),
  };

  let cn_characters =
    fields::text(draft.cn_characters).filter(|cn| *cn != character);

  Ok(FalseFriendEntry {
    id,
    character,
    jp_meanings,
    cn_meanings_simplified,
    cn_meanings_traditional,
    severity,
    category,
    affected_system,
    explanation,
    examples: draft.examples,
    traditional_note: fields::text(draft.traditional_note),
    merged_from,
    jp_reading: fields::text(draft.jp_reading),
    cn_pinyin: fields::text(draft.cn_pinyin),
    cn_characters,
    mnemonic_tip: fields::text(draft.mnemonic_tip),
    meaning_overlap: (!meaning_overlap.is_empty()).then_some(meaning_overlap),
  })
}

fn decode<T: serde::de::DeserializeOwned>(record: Value) -> Result<T, String> {
  serde_json::from_value(record).map_err(|e| e.to_string())
}

#[derive(Deserialize)]
struct RawExample {
  #[serde(default)]
  japanese:            String,
  #[serde(default, alias = "chineseSimplified")]
  chinese_simplified:  String,
  #[serde(default, alias = "chineseTraditional")]
  chinese_traditional: String,
  #[serde(default)]
  translation:         String,
}

impl From<RawExample> for Example {
  fn from(raw: RawExample) -> Self {
    Self {
      japanese:            raw.japanese,
      chinese_simplified:  raw.chinese_simplified,
      chinese_traditional: raw.chinese_traditional,
      translation:         raw.translation,
    }
  }
}

// ─── Structured layout ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StructuredFalseFriend {
  #[serde(default)]
  id:                      String,
  #[serde(default, alias = "characters")]
  character:               String,
  #[serde(alias = "jpMeanings", alias = "japanese_meanings")]
  jp_meanings:             Option<TextList>,
  #[serde(alias = "cnMeaningsSimplified")]
  cn_meanings_simplified:  Option<TextList>,
  #[serde(alias = "cnMeaningsTraditional")]
  cn_meanings_traditional: Option<TextList>,
  #[serde(alias = "chinese_meanings")]
  cn_meanings:             Option<TextList>,
  severity:                Option<String>,
  category:                Option<String>,
  #[serde(alias = "affects", alias = "affectedSystem")]
  affected_system:         Option<String>,
  #[serde(default)]
  explanation:             String,
  #[serde(default)]
  examples:                Vec<RawExample>,
  #[serde(alias = "traditionalNote")]
  traditional_note:        Option<String>,
  #[serde(alias = "mergedFrom")]
  merged_from:             Option<TextList>,
  jp_reading:              Option<String>,
  cn_pinyin:               Option<String>,
  cn_characters:           Option<String>,
  mnemonic_tip:            Option<String>,
}

fn from_structured(record: Value) -> Result<FalseFriendEntry, String> {
  let raw: StructuredFalseFriend = decode(record)?;

  finish(FalseFriendDraft {
    id: raw.id,
    character: raw.character,
    jp_meanings: list(raw.jp_meanings),
    cn_meanings_simplified: list(raw.cn_meanings_simplified),
    cn_meanings_traditional: list(raw.cn_meanings_traditional),
    cn_meanings: list(raw.cn_meanings),
    severity: raw.severity,
    category: raw.category,
    affected_system: raw.affected_system,
    explanation: raw.explanation,
    examples: raw.examples.into_iter().map(Example::from).collect(),
    traditional_note: raw.traditional_note,
    merged_from: list(raw.merged_from),
    jp_reading: raw.jp_reading,
    cn_pinyin: raw.cn_pinyin,
    cn_characters: raw.cn_characters,
    mnemonic_tip: raw.mnemonic_tip,
    ..Default::default()
  })
}

// ─── Wrapped layout ──────────────────────────────────────────────────────────

/// Record layout of the versioned export, with one example flattened into
/// `jp_example*` / `cn_example*` fields.
#[derive(Deserialize)]
struct WrappedFalseFriend {
  #[serde(default)]
  id:                      String,
  #[serde(default, alias = "character")]
  characters:              String,
  jp_reading:              Option<String>,
  jp_meanings:             Option<TextList>,
  jp_example:              Option<String>,
  jp_example_translation:  Option<String>,
  cn_pinyin:               Option<String>,
  cn_characters:           Option<String>,
  cn_meanings:             Option<TextList>,
  cn_meanings_simplified:  Option<TextList>,
  cn_meanings_traditional: Option<TextList>,
  cn_example:              Option<String>,
  cn_example_translation:  Option<String>,
  severity:                Option<String>,
  category:                Option<String>,
  #[serde(alias = "affected_system")]
  affects:                 Option<String>,
  #[serde(default)]
  explanation:             String,
  #[serde(default)]
  examples:                Vec<RawExample>,
  mnemonic_tip:            Option<String>,
  traditional_note:        Option<String>,
  merged_from:             Option<TextList>,
  shared_meanings:         Option<TextList>,
  jp_only_meanings:        Option<TextList>,
  cn_only_meanings:        Option<TextList>,
}

/// Fold the flattened example fields into one [`Example`], if any are set.
fn flattened_example(raw: &WrappedFalseFriend) -> Option<Example> {
  let japanese = fields::text(raw.jp_example.clone()).unwrap_or_default();
  let chinese = fields::text(raw.cn_example.clone()).unwrap_or_default();
  if japanese.is_empty() && chinese.is_empty() {
    return None;
  }

  let translation = fields::text(raw.jp_example_translation.clone())
    .or_else(|| fields::text(raw.cn_example_translation.clone()))
    .unwrap_or_default();

  Some(Example {
    japanese,
    chinese_simplified: chinese.clone(),
    chinese_traditional: chinese,
    translation,
  })
}

fn from_wrapped(record: Value) -> Result<FalseFriendEntry, String> {
  let raw: WrappedFalseFriend = decode(record)?;

  let flattened = flattened_example(&raw);
  let mut examples: Vec<Example> =
    raw.examples.into_iter().map(Example::from).collect();
  examples.extend(flattened);

  finish(FalseFriendDraft {
    id: raw.id,
    character: raw.characters,
    jp_meanings: list(raw.jp_meanings),
    cn_meanings_simplified: list(raw.cn_meanings_simplified),
    cn_meanings_traditional: list(raw.cn_meanings_traditional),
    cn_meanings: list(raw.cn_meanings),
    severity: raw.severity,
    category: raw.category,
    affected_system: raw.affects,
    explanation: raw.explanation,
    examples,
    traditional_note: raw.traditional_note,
    merged_from: list(raw.merged_from),
    jp_reading: raw.jp_reading,
    cn_pinyin: raw.cn_pinyin,
    cn_characters: raw.cn_characters,
    mnemonic_tip: raw.mnemonic_tip,
    shared_meanings: list(raw.shared_meanings),
    jp_only_meanings: list(raw.jp_only_meanings),
    cn_only_meanings: list(raw.cn_only_meanings),
  })
}

// ─── Simplified layout ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct SimplifiedFalseFriend {
  #[serde(default)]
  id:               String,
  #[serde(default, alias = "characters")]
  character:        String,
  #[serde(alias = "japanese_meanings")]
  jp_meanings:      Option<TextList>,
  #[serde(alias = "chinese_meanings")]
  cn_meanings:      Option<TextList>,
  severity:         Option<String>,
  category:         Option<String>,
  #[serde(alias = "affected_system")]
  affects:          Option<String>,
  #[serde(default)]
  explanation:      String,
  #[serde(default)]
  examples:         Vec<RawExample>,
  traditional_note: Option<String>,
  merged_from:      Option<TextList>,
  jp_reading:       Option<String>,
  cn_pinyin:        Option<String>,
  cn_characters:    Option<String>,
  mnemonic_tip:     Option<String>,
}

fn from_simplified(record: Value) -> Result<FalseFriendEntry, String> {
  let raw: SimplifiedFalseFriend = decode(record)?;

  finish(FalseFriendDraft {
    id: raw.id,
    character: raw.character,
    jp_meanings: list(raw.jp_meanings),
    cn_meanings: list(raw.cn_meanings),
    severity: raw.severity,
    category: raw.category,
    affected_system: raw.affects,
    explanation: raw.explanation,
    examples: raw.examples.into_iter().map(Example::from).collect(),
    traditional_note: raw.traditional_note,
    merged_from: list(raw.merged_from),
    jp_reading: raw.jp_reading,
    cn_pinyin: raw.cn_pinyin,
    cn_characters: raw.cn_characters,
    mnemonic_tip: raw.mnemonic_tip,
    ..Default::default()
  })
}
