//! Chat-platform abstractions (Telegram today).

pub mod port;
