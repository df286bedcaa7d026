/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram update id (monotonic per bot).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UpdateId(pub i64);
