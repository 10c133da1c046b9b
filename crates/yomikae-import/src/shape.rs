//! Structural detection of payload layouts.
//!
//! The layout is decided once per payload by probing the top-level value and
//! the records it holds, never by file name or version flag. A bare array is
//! structured as soon as any record carries a structured-only field.

use serde_json::{Map, Value};

use crate::{Error, PayloadMetadata, Result};

/// The source layouts observed in published datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
  /// Top-level array; records carry nested sub-objects or split fields.
  Structured,
  /// `{ "metadata": {...}, "<list>": [...] }` with flattened record fields.
  Wrapped,
  /// Top-level array; records carry single combined lists.
  Simplified,
}

impl SourceShape {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Structured => "structured",
      Self::Wrapped => "wrapped",
      Self::Simplified => "simplified",
    }
  }
}

/// Keys that identify a layout for one entity family.
pub(crate) struct Layout {
  /// Candidate names of the entity list inside a wrapper object.
  list_keys:          &'static [&'static str],
  /// Record keys that only appear in the structured layout.
  structured_markers: &'static [&'static str],
}

pub(crate) const CHARACTER_LAYOUT: Layout = Layout {
  list_keys:          &["characters", "entries", "kanji"],
  structured_markers: &[
    "japanese",
    "chinese",
    "on_readings",
    "kun_readings",
    "pinyin_simplified",
    "pinyin_traditional",
    "cn_meanings_simplified",
    "cn_meanings_traditional",
  ],
};

pub(crate) const FALSE_FRIEND_LAYOUT: Layout = Layout {
  list_keys:          &["false_friends", "falseFriends", "entries"],
  structured_markers: &[
    "examples",
    "affected_system",
    "cn_meanings_simplified",
    "cn_meanings_traditional",
  ],
};

/// A payload split into its layout, metadata and raw records.
pub(crate) struct Detected {
  pub shape:    SourceShape,
  pub metadata: Option<PayloadMetadata>,
  pub records:  Vec<Value>,
}

pub(crate) fn detect(doc: Value, layout: &Layout) -> Result<Detected> {
  match doc {
    Value::Array(records) => {
      let structured = records
        .iter()
        .filter_map(Value::as_object)
        .any(|record| is_structured(record, layout));
      let shape = if structured {
        SourceShape::Structured
      } else {
        SourceShape::Simplified
      };
      Ok(Detected { shape, metadata: None, records })
    }
    Value::Object(mut map) => {
      let list_key = layout
        .list_keys
        .iter()
        .find(|k| map.get(**k).is_some_and(Value::is_array))
        .ok_or_else(|| {
          Error::UnrecognizedShape(format!(
            "object payload has none of the list keys {:?}",
            layout.list_keys
          ))
        })?;

      let records = match map.remove(*list_key) {
        Some(Value::Array(records)) => records,
        _ => Vec::new(),
      };
      let metadata = map.remove("metadata").and_then(read_metadata);
      check_total(metadata.as_ref(), records.len());

      Ok(Detected { shape: SourceShape::Wrapped, metadata, records })
    }
    other => Err(Error::UnrecognizedShape(format!(
      "expected an array or object at top level, found {}",
      kind_name(&other)
    ))),
  }
}

fn is_structured(record: &Map<String, Value>, layout: &Layout) -> bool {
  layout.structured_markers.iter().any(|k| match record.get(*k) {
    Some(Value::Null) | None => false,
    Some(_) => true,
  })
}

fn read_metadata(value: Value) -> Option<PayloadMetadata> {
  match serde_json::from_value(value) {
    Ok(meta) => Some(meta),
    Err(e) => {
      tracing::warn!(error = %e, "ignoring unreadable payload metadata");
      None
    }
  }
}

fn check_total(metadata: Option<&PayloadMetadata>, actual: usize) {
  if let Some(expected) = metadata.and_then(|m| m.total_entries)
    && expected != actual
  {
    tracing::warn!(expected, actual, "payload metadata total_entries disagrees with record count");
  }
}

fn kind_name(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn nested_objects_are_structured() {
    let doc = json!([{ "character": "日", "japanese": { "onyomi": ["ニチ"] } }]);
    let d = detect(doc, &CHARACTER_LAYOUT).unwrap();
    assert_eq!(d.shape, SourceShape::Structured);
    assert_eq!(d.records.len(), 1);
  }

  #[test]
  fn flat_array_is_simplified() {
    let doc = json!([{ "character": "日", "readings": ["ニチ"], "cn_meanings": ["sun"] }]);
    assert_eq!(detect(doc, &CHARACTER_LAYOUT).unwrap().shape, SourceShape::Simplified);
  }

  #[test]
  fn any_structured_record_makes_the_array_structured() {
    let doc = json!([
      { "character": "〇" },
      { "character": "日", "chinese": { "pinyin": ["rì"] } },
    ]);
    assert_eq!(detect(doc, &CHARACTER_LAYOUT).unwrap().shape, SourceShape::Structured);
  }

  #[test]
  fn meanings_pair_marks_structured_characters() {
    let doc = json!([{ "character": "后", "cn_meanings_traditional": ["queen"] }]);
    assert_eq!(detect(doc, &CHARACTER_LAYOUT).unwrap().shape, SourceShape::Structured);
  }

  #[test]
  fn empty_array_is_simplified() {
    let d = detect(json!([]), &FALSE_FRIEND_LAYOUT).unwrap();
    assert_eq!(d.shape, SourceShape::Simplified);
    assert!(d.records.is_empty());
  }

  #[test]
  fn wrapper_object_with_metadata() {
    let doc = json!({
      "metadata": { "version": "3.0", "total_entries": 1 },
      "false_friends": [{ "id": "ff_1" }],
    });
    let d = detect(doc, &FALSE_FRIEND_LAYOUT).unwrap();
    assert_eq!(d.shape, SourceShape::Wrapped);
    assert_eq!(d.metadata.unwrap().version.as_deref(), Some("3.0"));
    assert_eq!(d.records.len(), 1);
  }

  #[test]
  fn wrapper_without_metadata_is_still_wrapped() {
    let d = detect(json!({ "characters": [] }), &CHARACTER_LAYOUT).unwrap();
    assert_eq!(d.shape, SourceShape::Wrapped);
    assert!(d.metadata.is_none());
  }

  #[test]
  fn object_without_list_is_rejected() {
    let err = detect(json!({ "metadata": {} }), &CHARACTER_LAYOUT);
    assert!(matches!(err, Err(Error::UnrecognizedShape(_))));
  }

  #[test]
  fn scalar_is_rejected() {
    assert!(matches!(
      detect(json!("日"), &CHARACTER_LAYOUT),
      Err(Error::UnrecognizedShape(_))
    ));
  }
}
