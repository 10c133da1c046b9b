//! Matching and ranking rules shared by every store backend.
//!
//! Backends are free to pre-filter candidates however they like (the SQLite
//! store uses `LIKE` over its columns); the final match check and ordering
//! always go through [`rank`] so results are identical across backends.

use crate::character::CharacterEntry;

/// Trim and lowercase a raw query. Returns `None` for a blank query, which
/// matches nothing.
pub fn normalize_query(query: &str) -> Option<String> {
  let trimmed = query.trim();
  if trimmed.is_empty() {
    None
  } else {
    Some(trimmed.to_lowercase())
  }
}

/// Case-insensitive substring match of `needle` (already normalised) against
/// the character, radical, readings and meanings of `entry`.
pub fn matches(entry: &CharacterEntry, needle: &str) -> bool {
  if contains(&entry.character, needle)
    || entry.radical.as_deref().is_some_and(|r| contains(r, needle))
  {
    return true;
  }

  if let Some(jp) = &entry.japanese
    && (any_contains(&jp.onyomi, needle)
      || any_contains(&jp.kunyomi, needle)
      || any_contains(&jp.meanings, needle))
  {
    return true;
  }

  if let Some(cn) = &entry.chinese {
    return any_contains(&cn.pinyin, needle)
      || cn.simplified.as_deref().is_some_and(|s| contains(s, needle))
      || cn.traditional.as_deref().is_some_and(|s| contains(s, needle))
      || any_contains(&cn.meanings_simplified, needle)
      || any_contains(&cn.meanings_traditional, needle);
  }

  false
}

fn contains(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(needle)
}

fn any_contains(haystacks: &[String], needle: &str) -> bool {
  haystacks.iter().any(|h| contains(h, needle))
}

/// Filter `candidates` (in storage order) down to those matching `query` and
/// order them: exact character match first, then by frequency rank, then
/// unranked. At most `limit` entries are returned.
pub fn rank(
  candidates: Vec<CharacterEntry>,
  query: &str,
  limit: usize,
) -> Vec<CharacterEntry> {
  let Some(needle) = normalize_query(query) else {
    return Vec::new();
  };

  let mut hits: Vec<CharacterEntry> =
    candidates.into_iter().filter(|e| matches(e, &needle)).collect();

  hits.sort_by_key(|e| {
    let exact = e.character.to_lowercase() == needle;
    (!exact, frequency_key(e.frequency_rank))
  });
  hits.truncate(limit);
  hits
}

fn frequency_key(rank: Option<u32>) -> (bool, u32) {
  match rank {
    Some(r) => (false, r),
    None => (true, 0),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::character::{ChineseReading, JapaneseReading};

  fn entry(character: &str, rank: Option<u32>) -> CharacterEntry {
    CharacterEntry { frequency_rank: rank, ..CharacterEntry::new(character) }
  }

  fn keys(entries: &[CharacterEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.character.as_str()).collect()
  }

  #[test]
  fn exact_then_ranked_then_unranked() {
    let candidates = vec![
      entry("日本", None),
      entry("日光", Some(50)),
      entry("日", Some(5)),
    ];
    let ranked = rank(candidates, "日", 10);
    assert_eq!(keys(&ranked), ["日", "日光", "日本"]);
  }

  #[test]
  fn exact_match_beats_better_rank() {
    let candidates = vec![entry("日曜日", Some(1)), entry("日", Some(900))];
    assert_eq!(keys(&rank(candidates, "日", 10)), ["日", "日曜日"]);
  }

  #[test]
  fn unranked_keep_storage_order() {
    let candidates = vec![
      entry("本日", None),
      entry("日本", None),
      entry("休日", None),
      entry("日", Some(3)),
    ];
    assert_eq!(keys(&rank(candidates, "日", 10)), ["日", "本日", "日本", "休日"]);
  }

  #[test]
  fn blank_query_matches_nothing() {
    assert!(rank(vec![entry("日", Some(1))], "   ", 10).is_empty());
  }

  #[test]
  fn limit_applies_after_ordering() {
    let candidates = vec![entry("日本", None), entry("日", Some(1)), entry("毎日", Some(2))];
    assert_eq!(keys(&rank(candidates, "日", 2)), ["日", "毎日"]);
  }

  #[test]
  fn matches_readings_and_meanings_case_insensitively() {
    let mut e = entry("水", Some(10));
    e.japanese = Some(JapaneseReading {
      onyomi: vec!["スイ".into()],
      kunyomi: vec!["みず".into()],
      meanings: vec!["Water".into()],
      jlpt_level: None,
    });
    e.chinese = Some(ChineseReading {
      pinyin: vec!["shuǐ".into()],
      ..Default::default()
    });

    assert!(matches(&e, "water"));
    assert!(matches(&e, "みず"));
    assert!(matches(&e, "shuǐ"));
    assert!(!matches(&e, "fire"));
    // Field names of the stored representation never count as a hit.
    assert!(!matches(&e, "onyomi"));
  }

  #[test]
  fn radical_matches() {
    let mut e = entry("海", None);
    e.radical = Some("氵".into());
    assert!(matches(&e, "氵"));
  }
}
