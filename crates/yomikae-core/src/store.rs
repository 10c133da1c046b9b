//! The `ReferenceStore` trait and supporting record types.
//!
//! The trait is implemented by storage backends (e.g. `yomikae-store-sqlite`).
//! The importer's loader and the binary depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  character::{CharacterEntry, JlptLevel},
  false_friend::{FalseFriendEntry, Severity},
};

// ─── Import bookkeeping ──────────────────────────────────────────────────────

/// Which logical dataset a payload carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
  Characters,
  FalseFriends,
}

impl PayloadKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Characters => "characters",
      Self::FalseFriends => "false_friends",
    }
  }
}

/// Diagnostic record of one bulk import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatch {
  pub kind:            PayloadKind,
  /// Label of the detected source layout, e.g. `"wrapped"`.
  pub source_shape:    String,
  /// `metadata.version` of a wrapped payload.
  pub payload_version: Option<String>,
  pub accepted:        usize,
  pub rejected:        usize,
  pub imported_at:     DateTime<Utc>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Yomikae reference store backend.
///
/// Writes replace by natural key (`character` for characters, `id` for false
/// friends) and never fail because a record already exists. Lookups that
/// find nothing return `Ok(None)` or an empty vector.
///
/// All methods return `Send` futures so a store handle can be shared across
/// tasks of a multi-threaded runtime.
pub trait ReferenceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Writes ────────────────────────────────────────────────────────────

  /// Insert or replace a single character entry.
  fn upsert_character(
    &self,
    entry: CharacterEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert or replace a batch of character entries in one transaction.
  /// Either every entry is written or none is. Returns the number written.
  fn upsert_characters(
    &self,
    entries: Vec<CharacterEntry>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Insert or replace a single false-friend entry.
  fn upsert_false_friend(
    &self,
    entry: FalseFriendEntry,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Insert or replace a batch of false-friend entries in one transaction.
  fn upsert_false_friends(
    &self,
    entries: Vec<FalseFriendEntry>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  /// Append an import diagnostic record.
  fn record_import(
    &self,
    batch: ImportBatch,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Character reads ───────────────────────────────────────────────────

  /// Exact lookup by written form.
  fn get_character<'a>(
    &'a self,
    character: &'a str,
  ) -> impl Future<Output = Result<Option<CharacterEntry>, Self::Error>> + Send + 'a;

  /// Substring search over characters, radicals, readings and meanings,
  /// ordered by [`crate::search::rank`]. A blank query returns nothing.
  fn search_characters<'a>(
    &'a self,
    query: &'a str,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<CharacterEntry>, Self::Error>> + Send + 'a;

  /// Every character that references a false-friend entry, most frequent
  /// first, unranked last.
  fn false_friend_characters(
    &self,
  ) -> impl Future<Output = Result<Vec<CharacterEntry>, Self::Error>> + Send + '_;

  /// Characters tagged with `level`, ordered like
  /// [`false_friend_characters`](Self::false_friend_characters).
  fn characters_by_jlpt_level(
    &self,
    level: JlptLevel,
  ) -> impl Future<Output = Result<Vec<CharacterEntry>, Self::Error>> + Send + '_;

  fn character_count(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── False-friend reads ────────────────────────────────────────────────

  fn get_false_friend<'a>(
    &'a self,
    id: &'a str,
  ) -> impl Future<Output = Result<Option<FalseFriendEntry>, Self::Error>> + Send + 'a;

  /// The first stored entry whose shared form is `character`.
  fn get_false_friend_by_character<'a>(
    &'a self,
    character: &'a str,
  ) -> impl Future<Output = Result<Option<FalseFriendEntry>, Self::Error>> + Send + 'a;

  /// All false friends, optionally restricted to one severity, ordered by
  /// severity (critical first) and then by character.
  fn list_false_friends(
    &self,
    severity: Option<Severity>,
  ) -> impl Future<Output = Result<Vec<FalseFriendEntry>, Self::Error>> + Send + '_;

  fn false_friend_count(
    &self,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Diagnostics ───────────────────────────────────────────────────────

  /// Import records, oldest first.
  fn import_batches(
    &self,
  ) -> impl Future<Output = Result<Vec<ImportBatch>, Self::Error>> + Send + '_;
}
