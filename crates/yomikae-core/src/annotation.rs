//! Ruby-annotation parser for example strings.
//!
//! Examples are authored as `base[reading]base[reading]...`. Each bracketed
//! reading glosses the text accumulated since the previous closing bracket.
//!
//! ```
//! use yomikae_core::annotation::{parse, Segment};
//!
//! let segments: Vec<Segment> = parse("的[de]书").collect();
//! assert_eq!(segments[0], Segment::annotated("的", "de"));
//! assert_eq!(segments[1], Segment::plain("书"));
//! ```

use std::iter::FusedIterator;

use serde::Serialize;

/// A run of base text with an optional reading rendered above it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Segment {
  pub base:    String,
  pub reading: Option<String>,
}

impl Segment {
  pub fn plain(base: impl Into<String>) -> Self {
    Self { base: base.into(), reading: None }
  }

  pub fn annotated(base: impl Into<String>, reading: impl Into<String>) -> Self {
    Self { base: base.into(), reading: Some(reading.into()) }
  }

  pub fn has_reading(&self) -> bool { self.reading.is_some() }
}

/// Lazily segment `text`. The iterator borrows `text` and can be cloned to
/// restart from the current position.
///
/// An `[` with no matching `]` is kept as literal text. `base[]` yields a
/// segment with no reading.
pub fn parse(text: &str) -> Segments<'_> { Segments { rest: text } }

/// The base text with every reading removed.
pub fn plain_text(text: &str) -> String {
  parse(text).map(|segment| segment.base).collect()
}

/// Iterator returned by [`parse`].
#[derive(Debug, Clone)]
pub struct Segments<'a> {
  rest: &'a str,
}

impl Segments<'_> {
  fn take_rest(&mut self) -> Segment {
    let base = self.rest;
    self.rest = "";
    Segment::plain(base)
  }
}

impl Iterator for Segments<'_> {
  type Item = Segment;

  fn next(&mut self) -> Option<Segment> {
    if self.rest.is_empty() {
      return None;
    }

    let Some(open) = self.rest.find('[') else {
      return Some(self.take_rest());
    };

    let after_open = &self.rest[open + 1..];
    let Some(close) = after_open.find(']') else {
      // Unterminated: everything left is literal.
      return Some(self.take_rest());
    };

    let base = &self.rest[..open];
    let reading = &after_open[..close];
    self.rest = &after_open[close + 1..];

    Some(Segment {
      base:    base.to_owned(),
      reading: (!reading.is_empty()).then(|| reading.to_owned()),
    })
  }
}

impl FusedIterator for Segments<'_> {}

#[cfg(test)]
mod tests {
  use super::*;

  fn segments(text: &str) -> Vec<Segment> { parse(text).collect() }

  #[test]
  fn annotated_pinyin() {
    assert_eq!(segments("卫生间[wèi shēng jiān]的[de]"), vec![
      Segment::annotated("卫生间", "wèi shēng jiān"),
      Segment::annotated("的", "de"),
    ]);
  }

  #[test]
  fn plain_text_is_one_segment() {
    assert_eq!(segments("plain text"), vec![Segment::plain("plain text")]);
  }

  #[test]
  fn unterminated_bracket_is_literal() {
    assert_eq!(segments("broken[unterminated"), vec![Segment::plain(
      "broken[unterminated"
    )]);
  }

  #[test]
  fn trailing_text_after_last_reading() {
    assert_eq!(segments("手紙[てがみ]を書[か]く"), vec![
      Segment::annotated("手紙", "てがみ"),
      Segment::annotated("を書", "か"),
      Segment::plain("く"),
    ]);
  }

  #[test]
  fn unterminated_after_complete_annotation() {
    assert_eq!(segments("日[にち]本[ほん"), vec![
      Segment::annotated("日", "にち"),
      Segment::plain("本[ほん"),
    ]);
  }

  #[test]
  fn empty_input_and_empty_reading() {
    assert!(segments("").is_empty());
    assert_eq!(segments("字[]"), vec![Segment::plain("字")]);
  }

  #[test]
  fn restartable_and_deterministic() {
    let text = "汽车[qì chē]站";
    let iter = parse(text);
    let first: Vec<_> = iter.clone().collect();
    let second: Vec<_> = iter.collect();
    assert_eq!(first, second);
    assert_eq!(first, segments(text));
  }

  #[test]
  fn strips_readings() {
    assert_eq!(plain_text("卫生间[wèi shēng jiān]在哪儿[nǎr]？"), "卫生间在哪儿？");
  }
}
