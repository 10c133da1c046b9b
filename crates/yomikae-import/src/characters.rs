//! Character payload normalisers, one per [`SourceShape`].
//!
//! Each layout deserialises into its own raw record type, which is folded
//! into a [`CharacterDraft`] and validated by [`finish`]. The structured
//! record embeds the bare-array one, so either style of record survives in a
//! structured payload.

use serde::Deserialize;
use serde_json::Value;
use yomikae_core::character::{CharacterEntry, ChineseReading, JapaneseReading};

use crate::{
  Normalized, SourceShape, collect_records,
  fields::{self, TextList, list},
  shape::Detected,
};

const KEY_FIELDS: &[&str] = &["character", "characters", "kanji"];

pub(crate) fn normalize(detected: Detected) -> Normalized<CharacterEntry> {
  match detected.shape {
    SourceShape::Structured => collect_records(detected, KEY_FIELDS, from_structured),
    SourceShape::Wrapped => collect_records(detected, KEY_FIELDS, from_wrapped),
    SourceShape::Simplified => collect_records(detected, KEY_FIELDS, from_simplified),
  }
}

// ─── Canonical draft ─────────────────────────────────────────────────────────

#[derive(Default)]
struct JapaneseParts {
  /// A `japanese` sub-object was present, even if empty.
  declared:   bool,
  onyomi:     Option<Vec<String>>,
  kunyomi:    Option<Vec<String>>,
  /// A single list that does not distinguish on'yomi from kun'yomi.
  combined:   Option<Vec<String>>,
  meanings:   Option<Vec<String>>,
  jlpt_level: Option<i64>,
}

impl JapaneseParts {
  fn build(self) -> Result<Option<JapaneseReading>, String> {
    let jlpt_level = fields::jlpt_level(self.jlpt_level)?;
    let any_field = self.onyomi.is_some()
      || self.kunyomi.is_some()
      || self.combined.is_some()
      || self.meanings.is_some()
      || jlpt_level.is_some();
    if !self.declared && !any_field {
      return Ok(None);
    }

    // A combined list is taken as on'yomi wholesale; the split is lost.
    // TODO: split by script (katakana on'yomi, hiragana kun'yomi) once the
    // bundled payloads are checked for romaji readings.
    let (onyomi, kunyomi) = if self.onyomi.is_some() || self.kunyomi.is_some() {
      (self.onyomi.unwrap_or_default(), self.kunyomi.unwrap_or_default())
    } else {
      (self.combined.unwrap_or_default(), Vec::new())
    };

    Ok(Some(JapaneseReading {
      onyomi,
      kunyomi,
      meanings: self.meanings.unwrap_or_default(),
      jlpt_level,
    }))
  }
}

#[derive(Default)]
struct ChineseParts {
  declared:             bool,
  pinyin:               Option<Vec<String>>,
  pinyin_simplified:    Option<Vec<String>>,
  pinyin_traditional:   Option<Vec<String>>,
  simplified:           Option<String>,
  traditional:          Option<String>,
  meanings_simplified:  Option<Vec<String>>,
  meanings_traditional: Option<Vec<String>>,
  /// One list covering both orthographies.
  meanings:             Option<Vec<String>>,
}

impl ChineseParts {
  fn build(self) -> Option<ChineseReading> {
    let simplified = fields::text(self.simplified);
    let traditional = fields::text(self.traditional);
    let any_field = self.pinyin.is_some()
      || self.pinyin_simplified.is_some()
      || self.pinyin_traditional.is_some()
      || simplified.is_some()
      || traditional.is_some()
      || self.meanings_simplified.is_some()
      || self.meanings_traditional.is_some()
      || self.meanings.is_some();
    if !self.declared && !any_field {
      return None;
    }

    let pinyin = match self.pinyin {
      Some(pinyin) => pinyin,
      None => fields::merge_unique(
        self.pinyin_simplified.unwrap_or_default(),
        self.pinyin_traditional.unwrap_or_default(),
      ),
    };

    Some(ChineseReading {
      pinyin,
      simplified,
      traditional,
      meanings_simplified: self
        .meanings_simplified
        .or_else(|| self.meanings.clone())
        .unwrap_or_default(),
      meanings_traditional: self
        .meanings_traditional
        .or(self.meanings)
        .unwrap_or_default(),
    })
  }
}

struct CharacterDraft {
  character:       String,
  japanese:        JapaneseParts,
  chinese:         ChineseParts,
  stroke_count:    Option<i64>,
  radical:         Option<String>,
  frequency_rank:  Option<i64>,
  false_friend_id: Option<String>,
}

fn finish(draft: CharacterDraft) -> Result<CharacterEntry, String> {
  let character = draft.character.trim().to_owned();
  if character.is_empty() {
    return Err("character is empty".into());
  }

  Ok(CharacterEntry {
    character,
    japanese: draft.japanese.build()?,
    chinese: draft.chinese.build(),
    stroke_count: fields::stroke_count(draft.stroke_count)?,
    radical: fields::text(draft.radical),
    frequency_rank: fields::frequency_rank(draft.frequency_rank)?,
    false_friend_id: fields::text(draft.false_friend_id),
  })
}

fn decode<T: for<'de> Deserialize<'de>>(record: Value) -> Result<T, String> {
  serde_json::from_value(record).map_err(|e| e.to_string())
}

// ─── Structured layout ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct StructuredJapanese {
  onyomi:     Option<TextList>,
  kunyomi:    Option<TextList>,
  readings:   Option<TextList>,
  meanings:   Option<TextList>,
  #[serde(alias = "jlptLevel")]
  jlpt_level: Option<i64>,
}

#[derive(Deserialize)]
struct StructuredChinese {
  pinyin:               Option<TextList>,
  simplified:           Option<String>,
  traditional:          Option<String>,
  #[serde(alias = "meaningsSimplified")]
  meanings_simplified:  Option<TextList>,
  #[serde(alias = "meaningsTraditional")]
  meanings_traditional: Option<TextList>,
  meanings:             Option<TextList>,
}

/// Nested sub-objects layered over the bare-array record fields. A record
/// without `japanese`/`chinese` reads exactly like a simplified one, so a
/// payload mixing both styles loses nothing.
#[derive(Deserialize)]
struct StructuredCharacter {
  japanese: Option<StructuredJapanese>,
  chinese:  Option<StructuredChinese>,
  #[serde(flatten)]
  flat:     FlatCharacter,
}

fn from_structured(record: Value) -> Result<CharacterEntry, String> {
  let raw: StructuredCharacter = decode(record)?;
  let mut draft = flat_draft(raw.flat);

  if let Some(jp) = raw.japanese {
    let japanese = &mut draft.japanese;
    japanese.declared = true;
    japanese.onyomi = list(jp.onyomi).or(japanese.onyomi.take());
    japanese.kunyomi = list(jp.kunyomi).or(japanese.kunyomi.take());
    japanese.combined = list(jp.readings).or(japanese.combined.take());
    japanese.meanings = list(jp.meanings).or(japanese.meanings.take());
    japanese.jlpt_level = jp.jlpt_level.or(japanese.jlpt_level);
  }

  if let Some(cn) = raw.chinese {
    let chinese = &mut draft.chinese;
    chinese.declared = true;
    chinese.pinyin = list(cn.pinyin).or(chinese.pinyin.take());
    chinese.simplified = cn.simplified.or(chinese.simplified.take());
    chinese.traditional = cn.traditional.or(chinese.traditional.take());
    chinese.meanings_simplified =
      list(cn.meanings_simplified).or(chinese.meanings_simplified.take());
    chinese.meanings_traditional =
      list(cn.meanings_traditional).or(chinese.meanings_traditional.take());
    chinese.meanings = list(cn.meanings).or(chinese.meanings.take());
  }

  finish(draft)
}

// ─── Wrapped layout ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct WrappedCharacter {
  #[serde(default, alias = "characters", alias = "kanji")]
  character:               String,
  jp_reading:              Option<TextList>,
  on_readings:             Option<TextList>,
  kun_readings:            Option<TextList>,
  jp_meanings:             Option<TextList>,
  jlpt_level:              Option<i64>,
  cn_pinyin:               Option<TextList>,
  #[serde(alias = "cn_characters")]
  cn_simplified:           Option<String>,
  cn_traditional:          Option<String>,
  cn_meanings:             Option<TextList>,
  cn_meanings_simplified:  Option<TextList>,
  cn_meanings_traditional: Option<TextList>,
  stroke_count:            Option<i64>,
  radical:                 Option<String>,
  frequency_rank:          Option<i64>,
  false_friend_id:         Option<String>,
}

fn from_wrapped(record: Value) -> Result<CharacterEntry, String> {
  let raw: WrappedCharacter = decode(record)?;

  finish(CharacterDraft {
    character:       raw.character,
    japanese:        JapaneseParts {
      onyomi: list(raw.on_readings),
      kunyomi: list(raw.kun_readings),
      combined: list(raw.jp_reading),
      meanings: list(raw.jp_meanings),
      jlpt_level: raw.jlpt_level,
      ..Default::default()
    },
    chinese:         ChineseParts {
      pinyin: list(raw.cn_pinyin),
      simplified: raw.cn_simplified,
      traditional: raw.cn_traditional,
      meanings_simplified: list(raw.cn_meanings_simplified),
      meanings_traditional: list(raw.cn_meanings_traditional),
      meanings: list(raw.cn_meanings),
      ..Default::default()
    },
    stroke_count:    raw.stroke_count,
    radical:         raw.radical,
    frequency_rank:  raw.frequency_rank,
    false_friend_id: raw.false_friend_id,
  })
}

// ─── Simplified layout ───────────────────────────────────────────────────────

/// Top-level record fields of a bare-array payload. Split readings and the
/// per-orthography meanings pair are accepted here as well as the combined
/// lists.
#[derive(Deserialize)]
struct FlatCharacter {
  #[serde(default)]
  character:               String,
  #[serde(alias = "jp_reading")]
  readings:                Option<TextList>,
  on_readings:             Option<TextList>,
  kun_readings:            Option<TextList>,
  /// Japanese glosses.
  #[serde(alias = "jp_meanings")]
  meanings:                Option<TextList>,
  #[serde(alias = "jlptLevel")]
  jlpt_level:              Option<i64>,
  #[serde(alias = "cn_pinyin")]
  pinyin:                  Option<TextList>,
  pinyin_simplified:       Option<TextList>,
  pinyin_traditional:      Option<TextList>,
  #[serde(alias = "cn_simplified")]
  simplified:              Option<String>,
  #[serde(alias = "cn_traditional")]
  traditional:             Option<String>,
  #[serde(alias = "chinese_meanings")]
  cn_meanings:             Option<TextList>,
  cn_meanings_simplified:  Option<TextList>,
  cn_meanings_traditional: Option<TextList>,
  #[serde(alias = "strokeCount")]
  stroke_count:            Option<i64>,
  radical:                 Option<String>,
  #[serde(alias = "frequencyRank")]
  frequency_rank:          Option<i64>,
  #[serde(alias = "falseFriendId")]
  false_friend_id:         Option<String>,
}

fn flat_draft(raw: FlatCharacter) -> CharacterDraft {
  CharacterDraft {
    character:       raw.character,
    japanese:        JapaneseParts {
      onyomi: list(raw.on_readings),
      kunyomi: list(raw.kun_readings),
      combined: list(raw.readings),
      meanings: list(raw.meanings),
      jlpt_level: raw.jlpt_level,
      ..Default::default()
    },
    chinese:         ChineseParts {
      pinyin: list(raw.pinyin),
      pinyin_simplified: list(raw.pinyin_simplified),
      pinyin_traditional: list(raw.pinyin_traditional),
      simplified: raw.simplified,
      traditional: raw.traditional,
      meanings_simplified: list(raw.cn_meanings_simplified),
      meanings_traditional: list(raw.cn_meanings_traditional),
      meanings: list(raw.cn_meanings),
      ..Default::default()
    },
    stroke_count:    raw.stroke_count,
    radical:         raw.radical,
    frequency_rank:  raw.frequency_rank,
    false_friend_id: raw.false_friend_id,
  }
}

fn from_simplified(record: Value) -> Result<CharacterEntry, String> {
  let raw: FlatCharacter = decode(record)?;
  finish(flat_draft(raw))
}

#[cfg(test)]
mod tests {
  use serde_json::json;
  use yomikae_core::character::JlptLevel;

  use crate::normalize_characters;

  fn bytes(v: serde_json::Value) -> Vec<u8> { serde_json::to_vec(&v).unwrap() }

  #[test]
  fn structured_nested_fields() {
    let raw = bytes(json!([{
      "character": "日",
      "japanese": {
        "onyomi": ["ニチ", "ジツ"],
        "kunyomi": ["ひ", "か"],
        "meanings": ["day", "sun"],
        "jlptLevel": 5
      },
      "chinese": {
        "pinyin": ["rì"],
        "simplified": "日",
        "traditional": "日",
        "meaningsSimplified": ["sun"],
        "meaningsTraditional": ["sun", "day"]
      },
      "strokeCount": 4,
      "radical": "日",
      "frequencyRank": 1
    }]));

    let n = normalize_characters(&raw).unwrap();
    assert_eq!(n.shape, crate::SourceShape::Structured);
    assert!(n.errors.is_empty());

    let e = &n.entries[0];
    let jp = e.japanese.as_ref().unwrap();
    assert_eq!(jp.onyomi, ["ニチ", "ジツ"]);
    assert_eq!(jp.kunyomi, ["ひ", "か"]);
    assert_eq!(jp.jlpt_level, Some(JlptLevel::N5));
    let cn = e.chinese.as_ref().unwrap();
    assert_eq!(cn.meanings_traditional, ["sun", "day"]);
    assert_eq!(e.stroke_count, Some(4));
    assert_eq!(e.frequency_rank, Some(1));
    assert!(!e.is_false_friend());
  }

  #[test]
  fn structured_split_reading_fields() {
    let raw = bytes(json!([{
      "character": "後",
      "on_readings": ["ゴ", "コウ"],
      "kun_readings": ["あと", "のち"],
      "pinyin_simplified": ["hòu"],
      "pinyin_traditional": ["hòu", "hou"]
    }]));

    let n = normalize_characters(&raw).unwrap();
    let e = &n.entries[0];
    let jp = e.japanese.as_ref().unwrap();
    assert_eq!(jp.onyomi, ["ゴ", "コウ"]);
    assert_eq!(jp.kunyomi, ["あと", "のち"]);
    assert!(jp.meanings.is_empty());
    assert_eq!(e.chinese.as_ref().unwrap().pinyin, ["hòu", "hou"]);
  }

  #[test]
  fn combined_readings_become_onyomi() {
    let raw = bytes(json!([{ "character": "山", "readings": ["サン", "やま"] }]));
    let n = normalize_characters(&raw).unwrap();
    assert_eq!(n.shape, crate::SourceShape::Simplified);
    let jp = n.entries[0].japanese.as_ref().unwrap();
    assert_eq!(jp.onyomi, ["サン", "やま"]);
    assert!(jp.kunyomi.is_empty());
  }

  #[test]
  fn singular_chinese_meanings_fill_both_orthographies() {
    let raw = bytes(json!([{ "character": "汤", "cn_meanings": ["soup"], "pinyin": "tāng" }]));
    let n = normalize_characters(&raw).unwrap();
    let cn = n.entries[0].chinese.as_ref().unwrap();
    assert_eq!(cn.meanings_simplified, ["soup"]);
    assert_eq!(cn.meanings_traditional, ["soup"]);
    assert_eq!(cn.pinyin, ["tāng"]);
    assert!(n.entries[0].japanese.is_none());
  }

  #[test]
  fn wrapped_flattened_fields() {
    let raw = bytes(json!({
      "metadata": { "version": 2, "total_entries": 1 },
      "characters": [{
        "character": "手紙",
        "jp_reading": "テガミ",
        "jp_meanings": ["letter"],
        "cn_pinyin": "shǒu zhǐ",
        "cn_meanings": ["toilet paper"],
        "false_friend_id": "ff_tegami",
        "frequency_rank": 800
      }]
    }));

    let n = normalize_characters(&raw).unwrap();
    assert_eq!(n.shape, crate::SourceShape::Wrapped);
    assert_eq!(n.metadata.unwrap().version.as_deref(), Some("2"));

    let e = &n.entries[0];
    assert_eq!(e.japanese.as_ref().unwrap().onyomi, ["テガミ"]);
    let cn = e.chinese.as_ref().unwrap();
    assert_eq!(cn.pinyin, ["shǒu zhǐ"]);
    assert_eq!(cn.meanings_simplified, cn.meanings_traditional);
    assert_eq!(e.false_friend_id.as_deref(), Some("ff_tegami"));
  }

  #[test]
  fn wrapped_pair_is_kept_apart() {
    let raw = bytes(json!({ "characters": [{
      "character": "后",
      "cn_meanings_simplified": ["after", "queen"],
      "cn_meanings_traditional": ["queen"]
    }]}));
    let n = normalize_characters(&raw).unwrap();
    let cn = n.entries[0].chinese.as_ref().unwrap();
    assert_eq!(cn.meanings_simplified, ["after", "queen"]);
    assert_eq!(cn.meanings_traditional, ["queen"]);
  }

  #[test]
  fn one_bad_record_does_not_sink_the_batch() {
    let records: Vec<_> = (0..10)
      .map(|i| {
        if i == 4 {
          json!({ "character": "", "readings": ["x"] })
        } else {
          json!({ "character": format!("字{i}"), "readings": ["ジ"] })
        }
      })
      .collect();

    let n = normalize_characters(&bytes(json!(records))).unwrap();
    assert_eq!(n.entries.len(), 9);
    assert_eq!(n.errors.len(), 1);
    assert_eq!(n.errors[0].index, 4);
  }

  #[test]
  fn invalid_numbers_are_record_errors() {
    let raw = bytes(json!([
      { "character": "一", "jlpt_level": 7 },
      { "character": "二", "frequency_rank": 0 },
      { "character": "三", "stroke_count": -3 },
      { "character": "四", "frequency_rank": "often" },
      { "character": "五", "jlpt_level": 5 }
    ]));
    let n = normalize_characters(&raw).unwrap();
    assert_eq!(n.entries.len(), 1);
    assert_eq!(n.entries[0].character, "五");
    let indices: Vec<_> = n.errors.iter().map(|e| e.index).collect();
    assert_eq!(indices, [0, 1, 2, 3]);
    assert_eq!(n.errors[1].key.as_deref(), Some("二"));
  }

  #[test]
  fn duplicate_keys_keep_the_later_record() {
    let raw = bytes(json!([
      { "character": "日", "frequency_rank": 9 },
      { "character": "月" },
      { "character": "日", "frequency_rank": 1 }
    ]));
    let n = normalize_characters(&raw).unwrap();
    assert_eq!(n.entries.len(), 2);
    assert_eq!(n.entries[0].character, "日");
    assert_eq!(n.entries[0].frequency_rank, Some(1));
  }

  #[test]
  fn not_json_is_a_payload_error() {
    assert!(matches!(
      normalize_characters(b"{not json"),
      Err(crate::Error::Json(_))
    ));
  }

  #[test]
  fn nested_records_after_a_bare_first_record_are_kept() {
    let raw = bytes(json!([
      { "character": "〇" },
      {
        "character": "日",
        "japanese": { "onyomi": ["ニチ"], "kunyomi": ["ひ"], "meanings": ["sun"] },
        "chinese": { "pinyin": ["rì"], "meaningsSimplified": ["sun"] }
      },
      { "character": "山", "readings": ["サン"], "cn_meanings": ["mountain"] }
    ]));

    let n = normalize_characters(&raw).unwrap();
    assert_eq!(n.shape, crate::SourceShape::Structured);
    assert!(n.errors.is_empty());

    let bare = &n.entries[0];
    assert!(bare.japanese.is_none() && bare.chinese.is_none());

    let nested = &n.entries[1];
    assert_eq!(nested.japanese.as_ref().unwrap().kunyomi, ["ひ"]);
    assert_eq!(nested.chinese.as_ref().unwrap().pinyin, ["rì"]);

    let flat = &n.entries[2];
    assert_eq!(flat.japanese.as_ref().unwrap().onyomi, ["サン"]);
    assert_eq!(flat.chinese.as_ref().unwrap().meanings_traditional, ["mountain"]);
  }

  #[test]
  fn bare_array_meanings_pair_is_structured() {
    let raw = bytes(json!([{
      "character": "后",
      "cn_meanings_simplified": ["after", "queen"],
      "cn_meanings_traditional": ["queen"]
    }]));

    let n = normalize_characters(&raw).unwrap();
    assert_eq!(n.shape, crate::SourceShape::Structured);
    let cn = n.entries[0].chinese.as_ref().unwrap();
    assert_eq!(cn.meanings_simplified, ["after", "queen"]);
    assert_eq!(cn.meanings_traditional, ["queen"]);
  }

  #[test]
  fn bare_array_accepts_flattened_export_fields() {
    let raw = bytes(json!([{
      "character": "手紙",
      "jp_reading": "てがみ",
      "jp_meanings": ["letter"],
      "cn_pinyin": "shǒu zhǐ",
      "cn_meanings": ["toilet paper"]
    }]));

    let n = normalize_characters(&raw).unwrap();
    assert_eq!(n.shape, crate::SourceShape::Simplified);
    let e = &n.entries[0];
    let jp = e.japanese.as_ref().unwrap();
    assert_eq!(jp.onyomi, ["てがみ"]);
    assert_eq!(jp.meanings, ["letter"]);
    assert_eq!(e.chinese.as_ref().unwrap().pinyin, ["shǒu zhǐ"]);
  }
}
