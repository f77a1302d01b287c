//! The success envelope every endpoint responds with.

use serde::Serialize;

/// `{status: "successful", message?, data}` wrapper.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self { status: "successful", message: None, data }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self { status: "successful", message: Some(message.into()), data }
    }
}
