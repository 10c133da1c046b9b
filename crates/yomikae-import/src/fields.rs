//! Field-level helpers shared by the per-layout normalisers.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use yomikae_core::character::JlptLevel;

/// A list-valued field that some sources publish as a single string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum TextList {
  Many(Vec<String>),
  One(String),
}

impl TextList {
  /// Flatten into trimmed, non-empty items. A single string is split on
  /// ASCII, ideographic and full-width commas.
  pub fn into_vec(self) -> Vec<String> {
    let items: Vec<String> = match self {
      Self::Many(items) => items,
      Self::One(s) => s
        .split([',', '、', '，'])
        .map(str::to_owned)
        .collect(),
    };
    items
      .into_iter()
      .map(|s| s.trim().to_owned())
      .filter(|s| !s.is_empty())
      .collect()
  }
}

pub(crate) fn list(value: Option<TextList>) -> Option<Vec<String>> {
  value.map(TextList::into_vec)
}

/// `a` followed by the items of `b` not already in `a`.
pub(crate) fn merge_unique(a: Vec<String>, b: Vec<String>) -> Vec<String> {
  let mut merged = a;
  for item in b {
    if !merged.contains(&item) {
      merged.push(item);
    }
  }
  merged
}

/// Trimmed string, with blank treated as absent.
pub(crate) fn text(value: Option<String>) -> Option<String> {
  value
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty())
}

pub(crate) fn stroke_count(value: Option<i64>) -> Result<Option<u32>, String> {
  value
    .map(|n| u32::try_from(n).map_err(|_| format!("invalid stroke count {n}")))
    .transpose()
}

pub(crate) fn frequency_rank(value: Option<i64>) -> Result<Option<u32>, String> {
  value
    .map(|n| match u32::try_from(n) {
      Ok(rank) if rank > 0 => Ok(rank),
      _ => Err(format!("frequency rank must be positive, got {n}")),
    })
    .transpose()
}

pub(crate) fn jlpt_level(value: Option<i64>) -> Result<Option<JlptLevel>, String> {
  value
    .map(|n| JlptLevel::new(n).map_err(|e| e.to_string()))
    .transpose()
}

/// Best-effort natural key of a raw record, for error reports.
pub(crate) fn record_key(record: &Value, keys: &[&str]) -> Option<String> {
  keys
    .iter()
    .find_map(|k| record.get(*k).and_then(Value::as_str))
    .map(str::to_owned)
    .filter(|k| !k.trim().is_empty())
}

/// Accept a string or a number (e.g. `"3.0"` or `3.0`).
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Option::<Value>::deserialize(deserializer)? {
    Some(Value::String(s)) => Some(s),
    Some(Value::Number(n)) => Some(n.to_string()),
    _ => None,
  })
}
