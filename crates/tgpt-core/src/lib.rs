//! Core domain + application logic for the Telegram → LLM relay bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the
//! completion provider live behind ports (traits) implemented in adapter
//! crates; the HTTP server lives in `tgpt-telegram`.

pub mod chunking;
pub mod completion;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod receiver;
pub mod retry;
pub mod update;
pub mod utils;

pub use errors::{Error, Result};
