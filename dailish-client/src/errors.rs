use dailish_core::TaskError;
use thiserror::Error;

/// Failures of the remote document store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Document not found")]
    NotFound,

    #[error("Document already exists")]
    AlreadyExists,

    #[error("Operation not supported by the remote store")]
    Unsupported,

    #[error("Remote store rejected the request (status {status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => RemoteError::Rejected {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => RemoteError::Unavailable(err.to_string()),
        }
    }
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Username not found")]
    UserNotFound,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Incorrect PIN")]
    IncorrectPin,

    #[error("Not signed in")]
    NoSession,

    #[error("Failed to acquire lock: {0}")]
    LockError(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Text shown to the user when an operation fails.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Task(e) => e.to_string(),
            ClientError::Remote(RemoteError::Unavailable(_)) => {
                "You appear to be offline. Please try again when connected.".to_string()
            }
            ClientError::Remote(RemoteError::NotFound) | ClientError::UserNotFound => {
                "Username not found. Please check your username or create a new list.".to_string()
            }
            ClientError::Remote(RemoteError::AlreadyExists) | ClientError::UsernameTaken => {
                "Username already exists. Please choose another or view your existing list."
                    .to_string()
            }
            ClientError::IncorrectPin => "Incorrect PIN. Please try again.".to_string(),
            ClientError::NoSession => {
                "You are not signed in. Run `dailish login` or `dailish signup` first.".to_string()
            }
            _ => "An error occurred. Please try again.".to_string(),
        }
    }

    pub fn is_offline(&self) -> bool {
        matches!(self, ClientError::Remote(RemoteError::Unavailable(_)))
    }
}
