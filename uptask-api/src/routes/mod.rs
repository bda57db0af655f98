/// API route handlers
///
/// - `auth`: account creation, confirmation, login and password reset
/// - `projects`: project CRUD
/// - `tasks`: task CRUD and status changes within a project
/// - `health`: liveness and storage check

use serde::{Deserialize, Serialize};

pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;

/// `{"message": ...}` response body
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
