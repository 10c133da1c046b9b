//! Core types and trait definitions for the Yomikae character reference.
//!
//! This crate is deliberately free of database and I/O dependencies. The
//! importer, the SQLite backend and the binary all depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod annotation;
pub mod character;
pub mod error;
pub mod false_friend;
pub mod search;
pub mod store;

pub use error::{Error, Result};
