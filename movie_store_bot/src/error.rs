use teloxide::RequestError;

/// Everything that can go wrong while handling an update.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Telegram request failed: {0}")]
    Request(#[from] RequestError),
    /// No media under the requested short ID.
    #[error("not found")]
    NotFound,
    /// Sender is not the admin.
    #[error("permission denied")]
    PermissionDenied,
    #[error("external call failed: {0}")]
    External(#[from] reqwest::Error),
    #[error("link shortener returned an unexpected response")]
    BadShortenerResponse,
    #[error("bad configuration: {0}")]
    Config(#[from] ::config::ConfigError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
