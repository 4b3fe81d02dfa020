use crate::client::ApiError;

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The requested game type is not in the catalog.
    #[error("unknown game type '{0}'")]
    InvalidVariant(String),

    #[error("game server unavailable: {0}")]
    ServerUnavailable(#[source] ApiError),

    /// A live score report failed. Logged, never returned to callers.
    #[error("score update dropped: {0}")]
    UpdateDropped(#[source] ApiError),
}

impl GameError {
    pub fn is_invalid_variant(&self) -> bool {
        matches!(self, GameError::InvalidVariant(_))
    }

    pub fn is_server_unavailable(&self) -> bool {
        matches!(self, GameError::ServerUnavailable(_))
    }
}

impl From<ApiError> for GameError {
    fn from(err: ApiError) -> Self {
        Self::ServerUnavailable(err)
    }
}
