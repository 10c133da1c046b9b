//! Composition root for the `yomikae` binary.
//!
//! Owns configuration loading and the command implementations; `main.rs`
//! only parses arguments, installs logging and prints results.

pub mod commands;
mod settings;

pub use settings::{AppConfig, expand_tilde, load_config};
