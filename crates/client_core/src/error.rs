use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid colour '{0}', expected #rrggbb")]
    InvalidColor(String),
    #[error("invalid setting {key}: {reason}")]
    Setting { key: &'static str, reason: String },
    #[error("server_url must start with http://, https://, ws:// or wss://, got '{0}'")]
    InvalidServerUrl(String),
    #[error("game session task has stopped")]
    SessionClosed,
}
