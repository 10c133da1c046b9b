//! `yomikae`: Japanese/Chinese character reference lookups.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `YOMIKAE_*` environment variables, opens the SQLite store (populating it
//! from the configured payloads when empty) and prints the result of one
//! command as JSON on stdout. Logs go to stderr.
//!
//! ```text
//! yomikae init
//! yomikae search water --limit 5
//! yomikae false-friends --severity critical --orthography traditional
//! yomikae ruby '手紙[てがみ]を書[か]く'
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use yomikae_cli::{commands, load_config};
use yomikae_core::false_friend::{Orthography, Severity};

#[derive(Parser)]
#[command(author, version, about = "Japanese/Chinese character reference")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Create or migrate the store and import the bundled payloads if empty.
  Init,
  /// Import payload files, replacing entries with the same key.
  Import {
    #[arg(long, value_name = "FILE")]
    characters:    Option<PathBuf>,
    #[arg(long, value_name = "FILE")]
    false_friends: Option<PathBuf>,
  },
  /// Show one character entry.
  Show { character: String },
  /// Search characters, readings and meanings.
  Search {
    query: String,
    #[arg(short, long, default_value_t = 20)]
    limit: usize,
  },
  /// List false friends, critical first.
  FalseFriends {
    #[arg(long)]
    severity:    Option<Severity>,
    /// Only entries that affect readers of this orthography.
    #[arg(long, value_enum)]
    orthography: Option<OrthographyArg>,
  },
  /// Show one false friend by id or by character.
  FalseFriend { key: String },
  /// List characters at a JLPT level (1-5).
  Jlpt { level: u8 },
  /// Segment bracket-annotated text into base/reading pairs.
  Ruby { text: String },
  /// Schema version, entry counts and import history.
  Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum OrthographyArg {
  Simplified,
  Traditional,
}

impl From<OrthographyArg> for Orthography {
  fn from(o: OrthographyArg) -> Self {
    match o {
      OrthographyArg::Simplified => Self::Simplified,
      OrthographyArg::Traditional => Self::Traditional,
    }
  }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let out = match cli.command {
    // Pure text processing; no store needed.
    Command::Ruby { text } => commands::ruby(&text)?,
    command => run(command, &cli.config).await?,
  };

  print(out)
}

async fn run(command: Command, config: &Path) -> anyhow::Result<serde_json::Value> {
  let cfg = load_config(config)?;
  tracing::debug!(store = %cfg.store_path.display(), "configuration loaded");

  let (store, report) = commands::open_store(&cfg).await?;

  let out = match command {
    Command::Init => commands::init(&store, report).await?,
    Command::Import { characters, false_friends } => {
      commands::import(&store, characters.as_deref(), false_friends.as_deref()).await?
    }
    Command::Show { character } => commands::show(&store, &character).await?,
    Command::Search { query, limit } => commands::search(&store, &query, limit).await?,
    Command::FalseFriends { severity, orthography } => {
      commands::false_friends(&store, severity, orthography.map(Orthography::from)).await?
    }
    Command::FalseFriend { key } => commands::false_friend(&store, &key).await?,
    Command::Jlpt { level } => commands::jlpt(&store, level).await?,
    Command::Ruby { text } => commands::ruby(&text)?,
    Command::Status => commands::status(&store).await?,
  };
  Ok(out)
}

fn print(value: serde_json::Value) -> anyhow::Result<()> {
  let text = serde_json::to_string_pretty(&value).context("failed to render output")?;
  println!("{text}");
  Ok(())
}
