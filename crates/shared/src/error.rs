use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    NotFound,
    Forbidden,
    Validation,
    NotYourTurn,
    RateLimited,
    Internal,
}

/// Error payload pushed by the authority when it refuses a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("board size {0} is outside the supported range")]
    BoardSize(i64),
    #[error("coordinate {coords:?} must be an [x, y] pair")]
    CoordinateArity { coords: Vec<i64> },
    #[error("coordinate ({x}, {y}) is outside a {size}x{size} board")]
    OutOfBounds { x: i64, y: i64, size: u32 },
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("move delta ({dx}, {dy}) is not a unit step")]
    InvalidDelta { dx: i32, dy: i32 },
    #[error("both pieces would occupy {x},{y}")]
    Collision { x: u32, y: u32 },
    #[error("player '{0}' has no role in this trial")]
    UnassignedPlayer(String),
}
