/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type. Completion
/// failures never reach it: the dispatcher turns them into an apology.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("malformed update: {0}")]
    MalformedUpdate(String),

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
