//! Feeding normalised payloads into a [`ReferenceStore`].
//!
//! Each payload is written as one batch, so a storage failure leaves the
//! store as it was before the payload. Per-record validation failures are
//! logged and returned in the summary; they never abort the import.

use std::collections::{BTreeSet, HashSet};

use chrono::Utc;
use thiserror::Error;
use yomikae_core::{
  character::CharacterEntry,
  false_friend::FalseFriendEntry,
  store::{ImportBatch, PayloadKind, ReferenceStore},
};

use crate::{
  ImportError, Normalized, PayloadMetadata, SourceShape, dangling_references,
  normalize_characters, normalize_false_friends,
};

#[derive(Debug, Error)]
pub enum LoadError {
  #[error("payload error: {0}")]
  Payload(#[from] crate::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn store_error<E: std::error::Error + Send + Sync + 'static>(e: E) -> LoadError {
  LoadError::Store(Box::new(e))
}

/// What one payload import did.
#[derive(Debug, Clone)]
pub struct ImportSummary {
  pub kind:     PayloadKind,
  pub shape:    SourceShape,
  pub accepted: usize,
  pub errors:   Vec<ImportError>,
  /// Characters whose `false_friend_id` resolved to nothing. Stored anyway.
  pub dangling: Vec<String>,
}

/// Outcome of [`bootstrap`] on an empty store.
#[derive(Debug, Clone, Default)]
pub struct BootstrapReport {
  pub false_friends: Option<ImportSummary>,
  pub characters:    Option<ImportSummary>,
}

/// Normalise and store a false-friend payload.
pub async fn import_false_friends<S: ReferenceStore>(
  store: &S,
  raw: &[u8],
) -> Result<ImportSummary, LoadError> {
  write_false_friends(store, normalize_false_friends(raw)?).await
}

/// Normalise and store a character payload.
///
/// False-friend references are checked against what the store already
/// holds, so import false friends first.
pub async fn import_characters<S: ReferenceStore>(
  store: &S,
  raw: &[u8],
) -> Result<ImportSummary, LoadError> {
  write_characters(store, normalize_characters(raw)?).await
}

async fn write_false_friends<S: ReferenceStore>(
  store: &S,
  normalized: Normalized<FalseFriendEntry>,
) -> Result<ImportSummary, LoadError> {
  let Normalized { shape, metadata, entries, errors } = normalized;

  let accepted = store.upsert_false_friends(entries).await.map_err(store_error)?;
  record(store, PayloadKind::FalseFriends, shape, metadata, accepted, errors.len()).await?;

  Ok(ImportSummary {
    kind: PayloadKind::FalseFriends,
    shape,
    accepted,
    errors,
    dangling: Vec::new(),
  })
}

async fn write_characters<S: ReferenceStore>(
  store: &S,
  normalized: Normalized<CharacterEntry>,
) -> Result<ImportSummary, LoadError> {
  let Normalized { shape, metadata, entries, errors } = normalized;

  let referenced: BTreeSet<&str> = entries
    .iter()
    .filter_map(|e| e.false_friend_id.as_deref())
    .collect();
  let mut known = HashSet::new();
  for id in referenced {
    if store.get_false_friend(id).await.map_err(store_error)?.is_some() {
      known.insert(id.to_owned());
    }
  }

  let dangling: Vec<String> = dangling_references(&entries, &known)
    .into_iter()
    .map(|e| e.character.clone())
    .collect();
  for character in &dangling {
    tracing::warn!(%character, "false_friend_id does not resolve to a stored false friend");
  }

  let accepted = store.upsert_characters(entries).await.map_err(store_error)?;
  record(store, PayloadKind::Characters, shape, metadata, accepted, errors.len()).await?;

  Ok(ImportSummary { kind: PayloadKind::Characters, shape, accepted, errors, dangling })
}

/// Populate an empty store from the bundled payloads.
///
/// Returns `Ok(None)` without touching anything when the store already holds
/// data. Both payloads are normalised before either is written, so a payload
/// that fails to parse leaves the store empty.
pub async fn bootstrap<S: ReferenceStore>(
  store: &S,
  characters: Option<&[u8]>,
  false_friends: Option<&[u8]>,
) -> Result<Option<BootstrapReport>, LoadError> {
  let populated = store.character_count().await.map_err(store_error)? > 0
    || store.false_friend_count().await.map_err(store_error)? > 0;
  if populated {
    tracing::debug!("store already populated; skipping bootstrap import");
    return Ok(None);
  }

  let false_friends = false_friends.map(normalize_false_friends).transpose()?;
  let characters = characters.map(normalize_characters).transpose()?;

  let mut report = BootstrapReport::default();
  if let Some(normalized) = false_friends {
    report.false_friends = Some(write_false_friends(store, normalized).await?);
  }
  if let Some(normalized) = characters {
    report.characters = Some(write_characters(store, normalized).await?);
  }
  Ok(Some(report))
}

async fn record<S: ReferenceStore>(
  store: &S,
  kind: PayloadKind,
  shape: SourceShape,
  metadata: Option<PayloadMetadata>,
  accepted: usize,
  rejected: usize,
) -> Result<(), LoadError> {
  tracing::info!(
    kind = kind.as_str(),
    shape = shape.as_str(),
    accepted,
    rejected,
    "import complete"
  );

  store
    .record_import(ImportBatch {
      kind,
      source_shape: shape.as_str().to_owned(),
      payload_version: metadata.and_then(|m| m.version),
      accepted,
      rejected,
      imported_at: Utc::now(),
    })
    .await
    .map_err(store_error)
}
