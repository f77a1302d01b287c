//! The wire-facing error surface.
//!
//! Every failure a service can return carries one of a closed set of kinds;
//! the transport adapter maps the kind to an HTTP status and serializes the
//! `{type, message, internal?}` envelope.

use serde::Serialize;
use thiserror::Error;

/// Result alias used across the service layer.
pub type Result<T> = std::result::Result<T, Error>;

/// Closed set of error kinds exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "AUTHENTICATION_ERROR")]
    Authentication,
    #[serde(rename = "INVALID_TOKEN_ERROR")]
    InvalidToken,
    #[serde(rename = "EXPIRED_TOKEN_ERROR")]
    ExpiredToken,
    #[serde(rename = "AUTHORIZATION_ERROR")]
    Authorization,
    #[serde(rename = "PERMISSION_ERROR")]
    Permission,
    #[serde(rename = "ENTRY_NOT_FOUND_ERROR")]
    NotFound,
    #[serde(rename = "ENTRY_EXISTS_ERROR")]
    EntryExists,
    #[serde(rename = "ENTRY_DELETED_ERROR")]
    EntryDeleted,
    #[serde(rename = "FAILED_DEPENDENCY")]
    FailedDependency,
    #[serde(rename = "NOT_IMPLEMENTED_ERROR")]
    NotImplemented,
    #[serde(rename = "FATAL_ERROR")]
    Fatal,
}

impl ErrorKind {
    /// The `type` field value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::InvalidToken => "INVALID_TOKEN_ERROR",
            Self::ExpiredToken => "EXPIRED_TOKEN_ERROR",
            Self::Authorization => "AUTHORIZATION_ERROR",
            Self::Permission => "PERMISSION_ERROR",
            Self::NotFound => "ENTRY_NOT_FOUND_ERROR",
            Self::EntryExists => "ENTRY_EXISTS_ERROR",
            Self::EntryDeleted => "ENTRY_DELETED_ERROR",
            Self::FailedDependency => "FAILED_DEPENDENCY",
            Self::NotImplemented => "NOT_IMPLEMENTED_ERROR",
            Self::Fatal => "FATAL_ERROR",
        }
    }

    /// HTTP status code the kind serializes with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::Authentication | Self::InvalidToken | Self::ExpiredToken | Self::Authorization => 401,
            Self::Permission => 403,
            Self::NotFound => 404,
            Self::EntryExists => 409,
            Self::EntryDeleted => 410,
            Self::FailedDependency => 424,
            Self::NotImplemented => 501,
            Self::Fatal => 500,
        }
    }
}

/// A service-level error: a kind, a user-facing message and optional
/// diagnostic detail. One type carries the whole taxonomy so services can
/// attach any kind to any message.
#[derive(Debug, Clone, Error, Serialize)]
#[error("{}: {}", .kind.as_str(), .message)]
pub struct Error {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
    /// Diagnostic detail; serialized only when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), internal: None }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn entry_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EntryExists, message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permission, message)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn invalid_token() -> Self {
        Self::new(ErrorKind::InvalidToken, "Invalid token")
    }

    pub fn failed_dependency(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::FailedDependency, message)
    }

    pub fn not_implemented() -> Self {
        Self::new(
            ErrorKind::NotImplemented,
            "functionality not implemented requires additional information",
        )
    }

    /// An unexpected internal failure. The public message is fixed; the
    /// cause travels in `internal`.
    pub fn fatal(cause: impl std::fmt::Display) -> Self {
        Self {
            kind: ErrorKind::Fatal,
            message: "Oops! something happened on our end.".to_string(),
            internal: Some(cause.to_string()),
        }
    }

    /// Attach diagnostic detail.
    pub fn with_internal(mut self, internal: impl Into<String>) -> Self {
        self.internal = Some(internal.into());
        self
    }
}
