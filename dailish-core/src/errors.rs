use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    #[error("Please enter a task title")]
    EmptyTitle,

    #[error("Please enter a username")]
    EmptyUsername,

    #[error("PIN must be 4 digits")]
    InvalidPin,

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Task id {0} matches more than one task")]
    AmbiguousTaskId(String),

    #[error("Duplicate task id: {0}")]
    DuplicateTaskId(String),

    #[error("No task being edited")]
    NoTaskBeingEdited,

    #[error("No tasks found to export")]
    NothingToExport,

    #[error("Malformed user key: {0}")]
    MalformedUserKey(String),

    #[error("Failed to format export")]
    Format(#[from] std::fmt::Error),
}

impl From<base64::DecodeError> for TaskError {
    fn from(err: base64::DecodeError) -> Self {
        TaskError::MalformedUserKey(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for TaskError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        TaskError::MalformedUserKey(err.to_string())
    }
}
