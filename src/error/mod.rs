use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Render error: {message}")]
    Render { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Backend API errors.
///
/// `NotFound` means "no data yet" and is resolved to an empty state by callers;
/// everything else is a `RequestFailed` carrying a human-readable message.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("{message}")]
    RequestFailed { status: Option<u16>, message: String },
}

/// Session store errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store connection failed: {message}")]
    Connection { message: String },

    #[error("Session query failed: {message}")]
    Query { message: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

impl ApiError {
    /// Whether the backend reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }

    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::RequestFailed { status, .. } => *status,
        }
    }

    /// Message suitable for inline display next to the affected panel.
    pub fn user_message(&self) -> &str {
        match self {
            ApiError::NotFound { message } | ApiError::RequestFailed { message, .. } => message,
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for backend API calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type alias for session store operations
pub type SessionResult<T> = Result<T, SessionError>;
