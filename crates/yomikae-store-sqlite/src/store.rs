//! [`SqliteStore`]: the SQLite implementation of [`ReferenceStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use yomikae_core::{
  character::{CharacterEntry, JlptLevel},
  false_friend::{FalseFriendEntry, Severity},
  search,
  store::{ImportBatch, ReferenceStore},
};

use crate::{
  Error, Result,
  encode::{
    CHARACTER_COLUMNS, CharacterRow, FALSE_FRIEND_COLUMNS, FalseFriendRow, RawCharacter,
    RawImportBatch, decode_count, encode_dt,
  },
  schema::{self, SCHEMA_VERSION},
};

const UPSERT_CHARACTER: &str = "
INSERT INTO character_entries (
  character, japanese, chinese, stroke_count, radical,
  frequency_rank, jlpt_level, false_friend_id
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(character) DO UPDATE SET
  japanese        = excluded.japanese,
  chinese         = excluded.chinese,
  stroke_count    = excluded.stroke_count,
  radical         = excluded.radical,
  frequency_rank  = excluded.frequency_rank,
  jlpt_level      = excluded.jlpt_level,
  false_friend_id = excluded.false_friend_id";

const UPSERT_FALSE_FRIEND: &str = "
INSERT INTO false_friend_entries (
  id, character, jp_meanings, cn_meanings_simplified, cn_meanings_traditional,
  severity, category, affected_system, explanation, examples,
  traditional_note, merged_from, jp_reading, cn_pinyin, cn_characters,
  mnemonic_tip, meaning_overlap
) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
ON CONFLICT(id) DO UPDATE SET
  character               = excluded.character,
  jp_meanings             = excluded.jp_meanings,
  cn_meanings_simplified  = excluded.cn_meanings_simplified,
  cn_meanings_traditional = excluded.cn_meanings_traditional,
  severity                = excluded.severity,
  category                = excluded.category,
  affected_system         = excluded.affected_system,
  explanation             = excluded.explanation,
  examples                = excluded.examples,
  traditional_note        = excluded.traditional_note,
  merged_from             = excluded.merged_from,
  jp_reading              = excluded.jp_reading,
  cn_pinyin               = excluded.cn_pinyin,
  cn_characters           = excluded.cn_characters,
  mnemonic_tip            = excluded.mnemonic_tip,
  meaning_overlap         = excluded.meaning_overlap";

/// Frequency-ranked entries first, unranked ones after in storage order.
const BY_FREQUENCY: &str = "ORDER BY frequency_rank IS NULL, frequency_rank, rowid";

fn write_character(conn: &rusqlite::Connection, row: &CharacterRow) -> rusqlite::Result<()> {
  conn.execute(
    UPSERT_CHARACTER,
    rusqlite::params![
      row.character,
      row.japanese,
      row.chinese,
      row.stroke_count,
      row.radical,
      row.frequency_rank,
      row.jlpt_level,
      row.false_friend_id,
    ],
  )?;
  Ok(())
}

fn write_false_friend(
  conn: &rusqlite::Connection,
  row: &FalseFriendRow,
) -> rusqlite::Result<()> {
  conn.execute(
    UPSERT_FALSE_FRIEND,
    rusqlite::params![
      row.id,
      row.character,
      row.jp_meanings,
      row.cn_meanings_simplified,
      row.cn_meanings_traditional,
      row.severity,
      row.category,
      row.affected_system,
      row.explanation,
      row.examples,
      row.traditional_note,
      row.merged_from,
      row.jp_reading,
      row.cn_pinyin,
      row.cn_characters,
      row.mnemonic_tip,
      row.meaning_overlap,
    ],
  )?;
  Ok(())
}

/// `LIKE` pattern for a substring search, with `\` as the escape character.
fn like_pattern(needle: &str) -> String {
  let mut pattern = String::with_capacity(needle.len() + 2);
  pattern.push('%');
  for c in needle.chars() {
    if matches!(c, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(c);
  }
  pattern.push('%');
  pattern
}

/// Whether SQLite's `LIKE` can narrow candidates for `needle` without
/// losing hits. `LIKE` only folds ASCII case, and JSON columns escape
/// quotes and backslashes.
fn prefilter_safe(needle: &str) -> bool {
  needle
    .chars()
    .all(|c| (c.is_ascii() || !(c.is_lowercase() || c.is_uppercase())) && !matches!(c, '"' | '\\'))
}

fn decode_characters(raw: Vec<RawCharacter>) -> Result<Vec<CharacterEntry>> {
  raw.into_iter().map(RawCharacter::into_entry).collect()
}

fn decode_false_friends(raw: Vec<FalseFriendRow>) -> Result<Vec<FalseFriendEntry>> {
  raw.into_iter().map(FalseFriendRow::into_entry).collect()
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Yomikae reference store backed by a single SQLite file.
///
/// Cloning is cheap: every clone shares one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and bring its schema up to date.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.ensure_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.ensure_schema().await?;
    Ok(store)
  }

  async fn ensure_schema(&self) -> Result<()> {
    let version = self
      .conn
      .call(|conn| {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        schema::migrate_to(conn, SCHEMA_VERSION)
          .map_err(|e| tokio_rusqlite::Error::Other(Box::new(e)))
      })
      .await
      .map_err(Error::Schema)?;
    tracing::debug!(version, "store schema ready");
    Ok(())
  }

  /// The schema version recorded in the database.
  pub async fn schema_version(&self) -> Result<u32> {
    let version = self
      .conn
      .call(|conn| Ok(schema::current_version(conn)?))
      .await?;
    Ok(version)
  }

  async fn query_characters(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<CharacterEntry>> {
    let raw = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), RawCharacter::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    decode_characters(raw)
  }

  async fn query_false_friends(
    &self,
    sql: String,
    params: Vec<rusqlite::types::Value>,
  ) -> Result<Vec<FalseFriendEntry>> {
    let raw = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(params), FalseFriendRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    decode_false_friends(raw)
  }

  async fn count(&self, table: &'static str) -> Result<usize> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    decode_count(n)
  }
}

// ─── ReferenceStore impl ─────────────────────────────────────────────────────

impl ReferenceStore for SqliteStore {
  type Error = Error;

  // ── Writes ────────────────────────────────────────────────────────────────

  async fn upsert_character(&self, entry: CharacterEntry) -> Result<()> {
    let row = CharacterRow::encode(&entry)?;
    self
      .conn
      .call(move |conn| Ok(write_character(conn, &row)?))
      .await?;
    Ok(())
  }

  async fn upsert_characters(&self, entries: Vec<CharacterEntry>) -> Result<usize> {
    let rows = entries
      .iter()
      .map(CharacterRow::encode)
      .collect::<Result<Vec<_>>>()?;

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for row in &rows {
          write_character(&tx, row)?;
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;
    tracing::debug!(written, "upserted character batch");
    Ok(written)
  }

  async fn upsert_false_friend(&self, entry: FalseFriendEntry) -> Result<()> {
    let row = FalseFriendRow::encode(&entry)?;
    self
      .conn
      .call(move |conn| Ok(write_false_friend(conn, &row)?))
      .await?;
    Ok(())
  }

  async fn upsert_false_friends(&self, entries: Vec<FalseFriendEntry>) -> Result<usize> {
    let rows = entries
      .iter()
      .map(FalseFriendRow::encode)
      .collect::<Result<Vec<_>>>()?;

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for row in &rows {
          write_false_friend(&tx, row)?;
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;
    tracing::debug!(written, "upserted false-friend batch");
    Ok(written)
  }

  async fn record_import(&self, batch: ImportBatch) -> Result<()> {
    let kind = batch.kind.as_str();
    let at = encode_dt(batch.imported_at);
    let accepted = i64::try_from(batch.accepted)
      .map_err(|_| Error::Decode(format!("accepted count too large: {}", batch.accepted)))?;
    let rejected = i64::try_from(batch.rejected)
      .map_err(|_| Error::Decode(format!("rejected count too large: {}", batch.rejected)))?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO import_batches (
             kind, source_shape, payload_version, accepted, rejected, imported_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![
            kind,
            batch.source_shape,
            batch.payload_version,
            accepted,
            rejected,
            at,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Character reads ───────────────────────────────────────────────────────

  async fn get_character<'a>(&'a self, character: &'a str) -> Result<Option<CharacterEntry>> {
    let key = character.to_owned();
    let raw = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {CHARACTER_COLUMNS} FROM character_entries WHERE character = ?1"),
              [key],
              RawCharacter::from_row,
            )
            .optional()?,
        )
      })
      .await?;
    raw.map(RawCharacter::into_entry).transpose()
  }

  async fn search_characters<'a>(
    &'a self,
    query: &'a str,
    limit: usize,
  ) -> Result<Vec<CharacterEntry>> {
    let Some(needle) = search::normalize_query(query) else {
      return Ok(Vec::new());
    };
    if limit == 0 {
      return Ok(Vec::new());
    }

    let candidates = if prefilter_safe(&needle) {
      self
        .query_characters(
          format!(
            "SELECT {CHARACTER_COLUMNS} FROM character_entries
             WHERE character LIKE ?1 ESCAPE '\\'
                OR radical   LIKE ?1 ESCAPE '\\'
                OR japanese  LIKE ?1 ESCAPE '\\'
                OR chinese   LIKE ?1 ESCAPE '\\'
             ORDER BY rowid"
          ),
          vec![like_pattern(&needle).into()],
        )
        .await?
    } else {
      self
        .query_characters(
          format!("SELECT {CHARACTER_COLUMNS} FROM character_entries ORDER BY rowid"),
          Vec::new(),
        )
        .await?
    };

    Ok(search::rank(candidates, &needle, limit))
  }

  async fn false_friend_characters(&self) -> Result<Vec<CharacterEntry>> {
    self
      .query_characters(
        format!(
          "SELECT {CHARACTER_COLUMNS} FROM character_entries
           WHERE false_friend_id IS NOT NULL {BY_FREQUENCY}"
        ),
        Vec::new(),
      )
      .await
  }

  async fn characters_by_jlpt_level(&self, level: JlptLevel) -> Result<Vec<CharacterEntry>> {
    self
      .query_characters(
        format!(
          "SELECT {CHARACTER_COLUMNS} FROM character_entries
           WHERE jlpt_level = ?1 {BY_FREQUENCY}"
        ),
        vec![i64::from(level.get()).into()],
      )
      .await
  }

  async fn character_count(&self) -> Result<usize> { self.count("character_entries").await }

  // ── False-friend reads ────────────────────────────────────────────────────

  async fn get_false_friend<'a>(&'a self, id: &'a str) -> Result<Option<FalseFriendEntry>> {
    let mut found = self
      .query_false_friends(
        format!("SELECT {FALSE_FRIEND_COLUMNS} FROM false_friend_entries WHERE id = ?1"),
        vec![id.to_owned().into()],
      )
      .await?;
    Ok(found.pop())
  }

  async fn get_false_friend_by_character<'a>(
    &'a self,
    character: &'a str,
  ) -> Result<Option<FalseFriendEntry>> {
    let mut found = self
      .query_false_friends(
        format!(
          "SELECT {FALSE_FRIEND_COLUMNS} FROM false_friend_entries
           WHERE character = ?1 ORDER BY rowid LIMIT 1"
        ),
        vec![character.to_owned().into()],
      )
      .await?;
    Ok(found.pop())
  }

  async fn list_false_friends(
    &self,
    severity: Option<Severity>,
  ) -> Result<Vec<FalseFriendEntry>> {
    let (filter, params) = match severity {
      Some(s) => ("WHERE severity = ?1", vec![s.as_str().to_owned().into()]),
      None => ("", Vec::new()),
    };
    self
      .query_false_friends(
        format!(
          "SELECT {FALSE_FRIEND_COLUMNS} FROM false_friend_entries {filter}
           ORDER BY CASE severity
                      WHEN 'critical'  THEN 0
                      WHEN 'important' THEN 1
                      ELSE 2
                    END,
                    character, rowid"
        ),
        params,
      )
      .await
  }

  async fn false_friend_count(&self) -> Result<usize> {
    self.count("false_friend_entries").await
  }

  // ── Diagnostics ───────────────────────────────────────────────────────────

  async fn import_batches(&self) -> Result<Vec<ImportBatch>> {
    let raw = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT kind, source_shape, payload_version, accepted, rejected, imported_at
           FROM import_batches ORDER BY batch_id",
        )?;
        let rows = stmt
          .query_map([], RawImportBatch::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raw.into_iter().map(RawImportBatch::into_batch).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("日"), "%日%");
    assert_eq!(like_pattern("100%_a\\b"), "%100\\%\\_a\\\\b%");
  }

  #[test]
  fn prefilter_skips_case_folding_outside_ascii() {
    assert!(prefilter_safe("water"));
    assert!(prefilter_safe("日"));
    assert!(prefilter_safe("みず"));
    assert!(!prefilter_safe("shuǐ"));
    assert!(!prefilter_safe("say \"hi\""));
  }
}
