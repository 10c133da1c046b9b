//! Import reconciler for Yomikae datasets.
//!
//! Accepts the JSON layouts the bundled datasets have been published in over
//! time and normalises every record into [`yomikae_core`] types. Pure
//! synchronous; the [`loader`] module is the only part that touches a store.
//!
//! # Quick start
//!
//! ```no_run
//! let raw = r#"[{"character": "日", "readings": ["ニチ"]}]"#;
//! let normalized = yomikae_import::normalize_characters(raw.as_bytes()).unwrap();
//! println!("{} entries, {} rejected", normalized.entries.len(), normalized.errors.len());
//! ```

mod characters;
pub mod error;
mod false_friends;
mod fields;
pub mod loader;
mod shape;

use std::collections::{HashMap, HashSet};

use serde::Deserialize;
use yomikae_core::{character::CharacterEntry, false_friend::FalseFriendEntry};

pub use error::{Error, Result};
pub use shape::SourceShape;

// ─── Public types
// ─────────────────────────────────────────────────────────────

/// The `metadata` block of a wrapped payload.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PayloadMetadata {
  #[serde(default, deserialize_with = "fields::lenient_string")]
  pub version:       Option<String>,
  pub description:   Option<String>,
  pub total_entries: Option<usize>,
  /// Category key → human-readable description.
  #[serde(default)]
  pub categories:    HashMap<String, String>,
}

/// A record that was skipped during normalisation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("record {index}: {reason}")]
pub struct ImportError {
  /// Zero-based position of the record in the source list.
  pub index:  usize,
  /// Natural key of the record, when one could be read.
  pub key:    Option<String>,
  pub reason: String,
}

/// The outcome of normalising one payload.
#[derive(Debug, Clone)]
pub struct Normalized<T> {
  pub shape:    SourceShape,
  pub metadata: Option<PayloadMetadata>,
  pub entries:  Vec<T>,
  pub errors:   Vec<ImportError>,
}

// ─── Public API
// ───────────────────────────────────────────────────────────────

/// Normalise a character payload.
///
/// Fails only when the payload as a whole cannot be read; individual bad
/// records land in [`Normalized::errors`].
pub fn normalize_characters(raw: &[u8]) -> Result<Normalized<CharacterEntry>> {
  let doc = serde_json::from_slice(raw)?;
  let detected = shape::detect(doc, &shape::CHARACTER_LAYOUT)?;
  let normalized = characters::normalize(detected);
  Ok(dedupe(normalized, |e| e.character.as_str()))
}

/// Normalise a false-friend payload.
pub fn normalize_false_friends(raw: &[u8]) -> Result<Normalized<FalseFriendEntry>> {
  let doc = serde_json::from_slice(raw)?;
  let detected = shape::detect(doc, &shape::FALSE_FRIEND_LAYOUT)?;
  let normalized = false_friends::normalize(detected);
  Ok(dedupe(normalized, |e| e.id.as_str()))
}

/// Characters whose `false_friend_id` is not in `known_ids`.
pub fn dangling_references<'a>(
  characters: &'a [CharacterEntry],
  known_ids: &HashSet<String>,
) -> Vec<&'a CharacterEntry> {
  characters
    .iter()
    .filter(|c| {
      c.false_friend_id
        .as_ref()
        .is_some_and(|id| !known_ids.contains(id))
    })
    .collect()
}

/// Collapse records sharing a natural key: the later record replaces the
/// earlier one in the earlier one's position.
fn dedupe<T>(
  mut normalized: Normalized<T>,
  key: impl Fn(&T) -> &str,
) -> Normalized<T> {
  let mut positions: HashMap<String, usize> = HashMap::new();
  let mut unique: Vec<T> = Vec::with_capacity(normalized.entries.len());

  for entry in normalized.entries.drain(..) {
    let k = key(&entry).to_owned();
    match positions.get(&k) {
      Some(&pos) => {
        tracing::warn!(key = %k, "duplicate record in payload; keeping the later one");
        unique[pos] = entry;
      }
      None => {
        positions.insert(k, unique.len());
        unique.push(entry);
      }
    }
  }

  normalized.entries = unique;
  normalized
}

/// Run `convert` over every record, collecting failures instead of stopping.
pub(crate) fn collect_records<T>(
  detected: shape::Detected,
  key_fields: &[&str],
  convert: impl Fn(serde_json::Value) -> std::result::Result<T, String>,
) -> Normalized<T> {
  let shape::Detected { shape, metadata, records } = detected;
  let mut entries = Vec::with_capacity(records.len());
  let mut errors = Vec::new();

  for (index, record) in records.into_iter().enumerate() {
    let key = fields::record_key(&record, key_fields);
    match convert(record) {
      Ok(entry) => entries.push(entry),
      Err(reason) => {
        tracing::warn!(index, key = ?key, %reason, "skipping malformed record");
        errors.push(ImportError { index, key, reason });
      }
    }
  }

  Normalized { shape, metadata, entries, errors }
}
