//! Request and response bodies of the document server's HTTP API.

use serde::{Deserialize, Serialize};

use crate::models::Task;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub pin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaceTasksRequest {
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendTaskRequest {
    pub task: Task,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

/// Path of a user's document, relative to the server root.
pub fn document_path(user_key: &str) -> String {
    format!("/api/users/{}", urlencoding::encode(user_key))
}

pub fn tasks_path(user_key: &str) -> String {
    format!("{}/tasks", document_path(user_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::UserKey;

    #[test]
    fn test_paths_escape_base64_characters() {
        let key = UserKey::from_raw("ab/c+d=");
        assert_eq!(document_path(key.as_str()), "/api/users/ab%2Fc%2Bd%3D");
        assert_eq!(tasks_path(key.as_str()), "/api/users/ab%2Fc%2Bd%3D/tasks");
    }
}
