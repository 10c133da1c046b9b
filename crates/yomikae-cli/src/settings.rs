//! `config.toml` + `YOMIKAE_*` environment configuration.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

const DEFAULT_STORE_PATH: &str = "~/.local/share/yomikae/yomikae.sqlite3";

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
  /// SQLite file holding the reference store.
  pub store_path:         PathBuf,
  /// Bundled character payload imported into an empty store.
  #[serde(default)]
  pub characters_path:    Option<PathBuf>,
  /// Bundled false-friend payload imported into an empty store.
  #[serde(default)]
  pub false_friends_path: Option<PathBuf>,
}

/// Read `path` (if it exists) layered under `YOMIKAE_*` environment
/// variables, then expand `~` in every path.
pub fn load_config(path: &Path) -> anyhow::Result<AppConfig> {
  let settings = config::Config::builder()
    .set_default("store_path", DEFAULT_STORE_PATH)?
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("YOMIKAE"))
    .build()
    .context("failed to read config file")?;

  let cfg: AppConfig = settings
    .try_deserialize()
    .context("failed to deserialise AppConfig")?;

  Ok(AppConfig {
    store_path:         expand_tilde(&cfg.store_path),
    characters_path:    cfg.characters_path.as_deref().map(expand_tilde),
    false_friends_path: cfg.false_friends_path.as_deref().map(expand_tilde),
  })
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn scratch_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("yomikae-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
  }

  #[test]
  fn plain_paths_are_untouched() {
    assert_eq!(expand_tilde(Path::new("/var/lib/y.db")), PathBuf::from("/var/lib/y.db"));
    assert_eq!(expand_tilde(Path::new("data/~/x")), PathBuf::from("data/~/x"));
  }

  #[test]
  fn file_values_are_read() {
    let path = scratch_file(
      "full.toml",
      r#"
store_path         = "/tmp/yomikae/store.sqlite3"
characters_path    = "/opt/yomikae/characters.json"
false_friends_path = "/opt/yomikae/false_friends.json"
"#,
    );

    let cfg = load_config(&path).unwrap();
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/yomikae/store.sqlite3"));
    assert_eq!(
      cfg.characters_path.as_deref(),
      Some(Path::new("/opt/yomikae/characters.json"))
    );
    assert_eq!(
      cfg.false_friends_path.as_deref(),
      Some(Path::new("/opt/yomikae/false_friends.json"))
    );
  }

  #[test]
  fn payload_paths_are_optional() {
    let path = scratch_file("minimal.toml", "store_path = \"/tmp/y.sqlite3\"\n");
    let cfg = load_config(&path).unwrap();
    assert_eq!(cfg.characters_path, None);
    assert_eq!(cfg.false_friends_path, None);
  }
}
