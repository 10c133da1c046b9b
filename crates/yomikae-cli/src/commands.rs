//! Command implementations. Each returns a JSON document for `main` to
//! print.

use std::path::Path;

use anyhow::{Context as _, bail};
use serde::Serialize;
use serde_json::{Value, json};
use yomikae_core::{
  annotation::{self, Segment},
  character::{CharacterEntry, JlptLevel},
  false_friend::{Example, FalseFriendEntry, Orthography, Severity},
  store::ReferenceStore,
};
use yomikae_import::loader::{self, BootstrapReport, ImportSummary};
use yomikae_store_sqlite::SqliteStore;

use crate::AppConfig;

// ─── Views ───────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct SummaryView {
  kind:     &'static str,
  shape:    &'static str,
  accepted: usize,
  rejected: usize,
  errors:   Vec<String>,
  dangling: Vec<String>,
}

impl From<ImportSummary> for SummaryView {
  fn from(s: ImportSummary) -> Self {
    Self {
      kind:     s.kind.as_str(),
      shape:    s.shape.as_str(),
      accepted: s.accepted,
      rejected: s.errors.len(),
      errors:   s.errors.iter().map(ToString::to_string).collect(),
      dangling: s.dangling,
    }
  }
}

#[derive(Serialize)]
struct ExampleRuby {
  japanese:            Vec<Segment>,
  chinese_simplified:  Vec<Segment>,
  chinese_traditional: Vec<Segment>,
  translation:         String,
}

impl From<&Example> for ExampleRuby {
  fn from(e: &Example) -> Self {
    Self {
      japanese:            annotation::parse(&e.japanese).collect(),
      chinese_simplified:  annotation::parse(&e.chinese_simplified).collect(),
      chinese_traditional: annotation::parse(&e.chinese_traditional).collect(),
      translation:         e.translation.clone(),
    }
  }
}

#[derive(Serialize)]
struct FalseFriendDetail {
  #[serde(flatten)]
  entry: FalseFriendEntry,
  ruby:  Vec<ExampleRuby>,
}

impl From<FalseFriendEntry> for FalseFriendDetail {
  fn from(entry: FalseFriendEntry) -> Self {
    let ruby = entry.examples.iter().map(ExampleRuby::from).collect();
    Self { entry, ruby }
  }
}

#[derive(Serialize)]
struct CharacterDetail {
  #[serde(flatten)]
  entry:        CharacterEntry,
  /// The referenced false friend, when the reference resolves.
  false_friend: Option<FalseFriendDetail>,
}

fn report_json(report: Option<BootstrapReport>) -> Value {
  match report {
    Some(r) => json!({
      "bootstrapped": true,
      "false_friends": r.false_friends.map(SummaryView::from),
      "characters": r.characters.map(SummaryView::from),
    }),
    None => json!({ "bootstrapped": false }),
  }
}

// ─── Store lifecycle ─────────────────────────────────────────────────────────

async fn read_payload(path: &Path) -> anyhow::Result<Vec<u8>> {
  tokio::fs::read(path)
    .await
    .with_context(|| format!("failed to read payload {}", path.display()))
}

/// Open the configured store and, if it is empty, populate it from the
/// configured payloads.
pub async fn open_store(
  cfg: &AppConfig,
) -> anyhow::Result<(SqliteStore, Option<BootstrapReport>)> {
  if let Some(parent) = cfg.store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  let report = bootstrap(&store, cfg).await?;
  Ok((store, report))
}

/// Run the bundled-payload import against `store` if it holds no data.
///
/// Payload files are only read when the store is empty.
pub async fn bootstrap<S: ReferenceStore>(
  store: &S,
  cfg: &AppConfig,
) -> anyhow::Result<Option<BootstrapReport>> {
  if cfg.characters_path.is_none() && cfg.false_friends_path.is_none() {
    return Ok(None);
  }
  if store.character_count().await? > 0 || store.false_friend_count().await? > 0 {
    return Ok(None);
  }

  let characters = match &cfg.characters_path {
    Some(p) => Some(read_payload(p).await?),
    None => None,
  };
  let false_friends = match &cfg.false_friends_path {
    Some(p) => Some(read_payload(p).await?),
    None => None,
  };

  let report = loader::bootstrap(store, characters.as_deref(), false_friends.as_deref())
    .await
    .context("bootstrap import failed")?;
  Ok(report)
}

// ─── Commands ────────────────────────────────────────────────────────────────

/// `init`: report what opening the store did.
pub async fn init(
  store: &SqliteStore,
  report: Option<BootstrapReport>,
) -> anyhow::Result<Value> {
  let mut out = report_json(report);
  out["status"] = status(store).await?;
  Ok(out)
}

/// `import`: normalise and upsert the given payloads, false friends first.
pub async fn import<S: ReferenceStore>(
  store: &S,
  characters: Option<&Path>,
  false_friends: Option<&Path>,
) -> anyhow::Result<Value> {
  if characters.is_none() && false_friends.is_none() {
    bail!("nothing to import; pass --characters and/or --false-friends");
  }

  let mut summaries = Vec::new();
  if let Some(path) = false_friends {
    let raw = read_payload(path).await?;
    let summary = loader::import_false_friends(store, &raw)
      .await
      .with_context(|| format!("failed to import {}", path.display()))?;
    summaries.push(SummaryView::from(summary));
  }
  if let Some(path) = characters {
    let raw = read_payload(path).await?;
    let summary = loader::import_characters(store, &raw)
      .await
      .with_context(|| format!("failed to import {}", path.display()))?;
    summaries.push(SummaryView::from(summary));
  }
  Ok(serde_json::to_value(summaries)?)
}

/// `show <character>`: the entry plus its false friend, if any.
pub async fn show<S: ReferenceStore>(store: &S, character: &str) -> anyhow::Result<Value> {
  let Some(entry) = store.get_character(character).await? else {
    bail!("no character entry for {character:?}");
  };

  let false_friend = match entry.false_friend_id.as_deref() {
    Some(id) => store.get_false_friend(id).await?.map(FalseFriendDetail::from),
    None => None,
  };
  Ok(serde_json::to_value(CharacterDetail { entry, false_friend })?)
}

pub async fn search<S: ReferenceStore>(
  store: &S,
  query: &str,
  limit: usize,
) -> anyhow::Result<Value> {
  Ok(serde_json::to_value(store.search_characters(query, limit).await?)?)
}

/// `false-friends`: the catalogue, optionally narrowed by severity and by
/// the orthography a reader uses.
pub async fn false_friends<S: ReferenceStore>(
  store: &S,
  severity: Option<Severity>,
  orthography: Option<Orthography>,
) -> anyhow::Result<Value> {
  let mut entries = store.list_false_friends(severity).await?;
  if let Some(o) = orthography {
    entries.retain(|e| e.is_relevant_to(o));
  }
  Ok(serde_json::to_value(entries)?)
}

/// `false-friend <key>`: lookup by id, falling back to the shared
/// character.
pub async fn false_friend<S: ReferenceStore>(store: &S, key: &str) -> anyhow::Result<Value> {
  let found = match store.get_false_friend(key).await? {
    Some(e) => Some(e),
    None => store.get_false_friend_by_character(key).await?,
  };
  let Some(entry) = found else {
    bail!("no false friend with id or character {key:?}");
  };
  Ok(serde_json::to_value(FalseFriendDetail::from(entry))?)
}

pub async fn jlpt<S: ReferenceStore>(store: &S, level: u8) -> anyhow::Result<Value> {
  let level = JlptLevel::new(i64::from(level))?;
  Ok(serde_json::to_value(store.characters_by_jlpt_level(level).await?)?)
}

/// `ruby <text>`: segment bracket-annotated text.
pub fn ruby(text: &str) -> anyhow::Result<Value> {
  let segments: Vec<Segment> = annotation::parse(text).collect();
  Ok(json!({
    "plain": annotation::plain_text(text),
    "segments": segments,
  }))
}

pub async fn status(store: &SqliteStore) -> anyhow::Result<Value> {
  let batches = store.import_batches().await?;
  Ok(json!({
    "schema_version": store.schema_version().await?,
    "characters": store.character_count().await?,
    "false_friends": store.false_friend_count().await?,
    "imports": batches,
  }))
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn seeded() -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let false_friends = json!([{
      "id": "ff_001",
      "character": "手紙",
      "jp_meanings": ["letter"],
      "cn_meanings_simplified": ["toilet paper"],
      "cn_meanings_traditional": ["toilet paper"],
      "severity": "critical",
      "category": "true_divergence",
      "affected_system": "both",
      "explanation": "Japanese 'letter' vs Chinese 'toilet paper'",
      "examples": [{
        "japanese": "手紙[てがみ]を書[か]く",
        "chinese_simplified": "买手纸[mǎi shǒuzhǐ]",
        "chinese_traditional": "買手紙[mǎi shǒuzhǐ]",
        "translation": "write a letter"
      }]
    }, {
      "id": "ff_002",
      "character": "后",
      "jp_meanings": ["empress"],
      "cn_meanings_simplified": ["after", "empress"],
      "cn_meanings_traditional": ["empress"],
      "severity": "important",
      "category": "simplification_merge",
      "affected_system": "simplified_only",
      "explanation": "Simplified 后 also stands for 後"
    }]);
    let characters = json!([
      { "character": "手紙", "readings": ["てがみ"], "false_friend_id": "ff_001", "jlpt_level": 4 },
      { "character": "手", "readings": ["シュ"], "meanings": ["hand"], "jlpt_level": 5 }
    ]);
    loader::import_false_friends(&store, &serde_json::to_vec(&false_friends).unwrap())
      .await
      .unwrap();
    loader::import_characters(&store, &serde_json::to_vec(&characters).unwrap())
      .await
      .unwrap();
    store
  }

  #[tokio::test]
  async fn show_embeds_the_false_friend() {
    let store = seeded().await;
    let out = show(&store, "手紙").await.unwrap();

    assert_eq!(out["character"], "手紙");
    assert_eq!(out["false_friend"]["id"], "ff_001");
    let first = &out["false_friend"]["ruby"][0]["japanese"][0];
    assert_eq!(first["base"], "手紙");
    assert_eq!(first["reading"], "てがみ");
  }

  #[tokio::test]
  async fn show_missing_is_an_error() {
    let store = seeded().await;
    assert!(show(&store, "無").await.is_err());
  }

  #[tokio::test]
  async fn false_friend_falls_back_to_character() {
    let store = seeded().await;
    assert_eq!(false_friend(&store, "ff_002").await.unwrap()["character"], "后");
    assert_eq!(false_friend(&store, "手紙").await.unwrap()["id"], "ff_001");
    assert!(false_friend(&store, "ff_404").await.is_err());
  }

  #[tokio::test]
  async fn catalogue_filters_by_orthography() {
    let store = seeded().await;
    let all = false_friends(&store, None, None).await.unwrap();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let traditional = false_friends(&store, None, Some(Orthography::Traditional))
      .await
      .unwrap();
    assert_eq!(traditional.as_array().unwrap().len(), 1);
    assert_eq!(traditional[0]["id"], "ff_001");

    let important = false_friends(&store, Some(Severity::Important), None).await.unwrap();
    assert_eq!(important[0]["id"], "ff_002");
  }

  #[tokio::test]
  async fn jlpt_rejects_out_of_range_levels() {
    let store = seeded().await;
    let n5 = jlpt(&store, 5).await.unwrap();
    assert_eq!(n5[0]["character"], "手");
    assert!(jlpt(&store, 6).await.is_err());
    assert!(jlpt(&store, 0).await.is_err());
  }

  #[tokio::test]
  async fn status_reports_counts_and_imports() {
    let store = seeded().await;
    let out = status(&store).await.unwrap();
    assert_eq!(out["characters"], 2);
    assert_eq!(out["false_friends"], 2);
    assert_eq!(out["imports"].as_array().unwrap().len(), 2);
  }

  #[test]
  fn ruby_segments_and_plain_text() {
    let out = ruby("日本[にほん]へ").unwrap();
    assert_eq!(out["plain"], "日本へ");
    assert_eq!(out["segments"][0]["reading"], "にほん");
    assert_eq!(out["segments"][1]["base"], "へ");
    assert!(out["segments"][1]["reading"].is_null());
  }

  #[tokio::test]
  async fn bootstrap_without_payloads_does_nothing() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let cfg = AppConfig {
      store_path:         ":memory:".into(),
      characters_path:    None,
      false_friends_path: None,
    };
    assert!(bootstrap(&store, &cfg).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn populated_store_never_reads_payloads() {
    let store = seeded().await;
    let cfg = AppConfig {
      store_path:         ":memory:".into(),
      characters_path:    Some("/nonexistent/characters.json".into()),
      false_friends_path: Some("/nonexistent/false_friends.json".into()),
    };
    assert!(bootstrap(&store, &cfg).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn empty_store_reports_missing_payload_files() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let cfg = AppConfig {
      store_path:         ":memory:".into(),
      characters_path:    Some("/nonexistent/characters.json".into()),
      false_friends_path: None,
    };
    let err = bootstrap(&store, &cfg).await.unwrap_err();
    assert!(err.to_string().contains("failed to read payload"));
  }
}
