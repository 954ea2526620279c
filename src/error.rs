use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("napcat action '{action}' failed: {message}")]
    Api { action: String, message: String },
    #[error("gateway connection lost: {0}")]
    Disconnected(String),
    #[error("invalid image url: {0}")]
    InvalidImageUrl(String),
}

pub type Result<T> = std::result::Result<T, BotError>;
