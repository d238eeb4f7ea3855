use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown screen: {name} (expected one of: pager, intro, login)")]
    UnknownScreen { name: String },

    #[error("unknown action for {screen} screen: {token}")]
    UnknownAction { screen: &'static str, token: String },

    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl DemoError {
    /// Process exit code for this error. Usage errors exit with 2.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::UnknownScreen { .. } | Self::UnknownAction { .. } | Self::InvalidArgument { .. } => {
                2
            }
            Self::Io(_) | Self::Json(_) => 1,
        }
    }

    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}
