//! SQL schema and migrations for the Yomikae SQLite store.
//!
//! The current version lives in `schema_meta` under the key
//! `schema_version`. Each migration runs in its own transaction together
//! with the version bump, so a failed step leaves the previous version
//! intact. Every step is safe to re-run against a schema that already has
//! its changes.

use rusqlite::{Connection, OptionalExtension as _};
use thiserror::Error;

/// Version this build migrates to.
pub const SCHEMA_VERSION: u32 = 4;

const VERSION_KEY: &str = "schema_version";

const META_TABLE: &str = "
CREATE TABLE IF NOT EXISTS schema_meta (
    key   TEXT PRIMARY KEY,
    value INTEGER NOT NULL
);
";

#[derive(Debug, Error)]
#[error("migration to schema version {version} failed: {source}")]
pub struct MigrationError {
  pub version: u32,
  #[source]
  pub source:  rusqlite::Error,
}

type Migration = fn(&Connection) -> rusqlite::Result<()>;

/// Ordered by version; version `n` is at index `n - 1`.
const MIGRATIONS: &[(u32, Migration)] = &[
  (1, create_entry_tables),
  (2, create_lookup_indexes),
  (3, add_false_friend_details),
  (4, create_import_batches),
];

// ─── Migrations ──────────────────────────────────────────────────────────────

fn create_entry_tables(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "
CREATE TABLE IF NOT EXISTS character_entries (
    character       TEXT PRIMARY KEY,
    japanese        TEXT,             -- JSON JapaneseReading or NULL
    chinese         TEXT,             -- JSON ChineseReading or NULL
    stroke_count    INTEGER,
    radical         TEXT,
    frequency_rank  INTEGER,
    jlpt_level      INTEGER,          -- copy of japanese.jlpt_level
    false_friend_id TEXT              -- not a foreign key; may dangle
);

CREATE TABLE IF NOT EXISTS false_friend_entries (
    id                      TEXT PRIMARY KEY,
    character               TEXT NOT NULL,
    jp_meanings             TEXT NOT NULL,   -- JSON string arrays
    cn_meanings_simplified  TEXT NOT NULL,
    cn_meanings_traditional TEXT NOT NULL,
    severity                TEXT NOT NULL,   -- 'critical' | 'important' | 'subtle'
    category                TEXT NOT NULL,
    affected_system         TEXT NOT NULL,   -- 'both' | 'simplified_only' | 'traditional_only'
    explanation             TEXT NOT NULL,
    examples                TEXT NOT NULL DEFAULT '[]',
    traditional_note        TEXT,
    merged_from             TEXT             -- JSON array or NULL
);
",
  )
}

fn create_lookup_indexes(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "
CREATE INDEX IF NOT EXISTS character_frequency_idx    ON character_entries(frequency_rank);
CREATE INDEX IF NOT EXISTS character_jlpt_idx         ON character_entries(jlpt_level);
CREATE INDEX IF NOT EXISTS character_false_friend_idx ON character_entries(false_friend_id);
CREATE INDEX IF NOT EXISTS false_friend_severity_idx  ON false_friend_entries(severity, character);
CREATE INDEX IF NOT EXISTS false_friend_character_idx ON false_friend_entries(character);
",
  )
}

fn add_false_friend_details(conn: &Connection) -> rusqlite::Result<()> {
  let existing = column_names(conn, "false_friend_entries")?;
  for (column, decl) in [
    ("jp_reading", "TEXT"),
    ("cn_pinyin", "TEXT"),
    ("cn_characters", "TEXT"),
    ("mnemonic_tip", "TEXT"),
    ("meaning_overlap", "TEXT"), // JSON MeaningOverlap or NULL
  ] {
    if !existing.iter().any(|c| c == column) {
      conn.execute_batch(&format!(
        "ALTER TABLE false_friend_entries ADD COLUMN {column} {decl};"
      ))?;
    }
  }
  Ok(())
}

fn create_import_batches(conn: &Connection) -> rusqlite::Result<()> {
  conn.execute_batch(
    "
CREATE TABLE IF NOT EXISTS import_batches (
    batch_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    kind            TEXT NOT NULL,   -- 'characters' | 'false_friends'
    source_shape    TEXT NOT NULL,
    payload_version TEXT,
    accepted        INTEGER NOT NULL,
    rejected        INTEGER NOT NULL,
    imported_at     TEXT NOT NULL    -- RFC 3339 UTC
);
",
  )
}

// ─── Protocol ────────────────────────────────────────────────────────────────

fn column_names(conn: &Connection, table: &str) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
  let names = stmt
    .query_map([table], |row| row.get(0))?
    .collect::<rusqlite::Result<Vec<String>>>()?;
  Ok(names)
}

/// The stored schema version; 0 when nothing has been applied yet.
pub fn current_version(conn: &Connection) -> rusqlite::Result<u32> {
  let exists: bool = conn
    .query_row(
      "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_meta'",
      [],
      |_| Ok(true),
    )
    .optional()?
    .unwrap_or(false);
  if !exists {
    return Ok(0);
  }

  Ok(
    conn
      .query_row(
        "SELECT value FROM schema_meta WHERE key = ?1",
        [VERSION_KEY],
        |row| row.get(0),
      )
      .optional()?
      .unwrap_or(0),
  )
}

fn set_version(conn: &Connection, version: u32) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO schema_meta (key, value) VALUES (?1, ?2)
     ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    rusqlite::params![VERSION_KEY, version],
  )?;
  Ok(())
}

/// Bring the schema up to `target`, returning the resulting version.
///
/// A stored version above `target` is left alone with a warning so that an
/// older build can still read data written by a newer one.
pub(crate) fn migrate_to(
  conn: &mut Connection,
  target: u32,
) -> Result<u32, MigrationError> {
  run(conn, MIGRATIONS, target)
}

fn run(
  conn: &mut Connection,
  migrations: &[(u32, Migration)],
  target: u32,
) -> Result<u32, MigrationError> {
  conn
    .execute_batch(META_TABLE)
    .map_err(|source| MigrationError { version: 0, source })?;
  let current =
    current_version(conn).map_err(|source| MigrationError { version: 0, source })?;

  if current > target {
    tracing::warn!(
      stored = current,
      supported = target,
      "schema is newer than this build; continuing without migrating"
    );
    return Ok(current);
  }

  for &(version, migration) in migrations {
    if version <= current || version > target {
      continue;
    }

    let step = |conn: &mut Connection| -> rusqlite::Result<()> {
      let tx = conn.transaction()?;
      migration(&tx)?;
      set_version(&tx, version)?;
      tx.commit()
    };
    step(conn).map_err(|source| MigrationError { version, source })?;
    tracing::info!(version, "applied schema migration");
  }

  Ok(current.max(target.min(migrations.last().map_or(0, |m| m.0))))
}
