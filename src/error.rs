//! Error type shared by every query-layer operation.
use serde::Serialize;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    /// A referenced article, user, comment or topic is absent, or a page came back empty.
    #[error("{0}")]
    NotFound(&'static str),
    /// A uniqueness precondition failed (duplicate article title or topic slug).
    #[error("{0}")]
    AlreadyExists(&'static str),
    /// Input rejected before any query ran.
    #[error("{0}")]
    BadRequest(&'static str),
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// `{status, msg}` pair handed to whatever transport sits above this layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub msg: String,
}

impl ModelError {
    pub const BAD_REQUEST: ModelError = ModelError::BadRequest("Bad Request");

    pub fn status(&self) -> u16 {
        match self {
            ModelError::NotFound(_) => 404,
            ModelError::AlreadyExists(_) | ModelError::BadRequest(_) => 400,
            ModelError::Storage(_) | ModelError::Migrate(_) => 500,
        }
    }

    pub fn msg(&self) -> String {
        match self {
            ModelError::NotFound(msg)
            | ModelError::AlreadyExists(msg)
            | ModelError::BadRequest(msg) => (*msg).to_string(),
            ModelError::Storage(_) | ModelError::Migrate(_) => "Internal Server Error".to_string(),
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            status: self.status(),
            msg: self.msg(),
        }
    }
}
