//! Error types for the core library

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not signed in")]
    Unauthenticated,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Malformed document {id}: {reason}")]
    MalformedDocument { id: String, reason: String },

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Task {0} still has pending subtasks")]
    PendingSubtasks(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Broad failure class, used to decide how the UI reacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    Remote,
    Validation,
    Storage,
}

/// What the view does with a failure. None of these end the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    RedirectToLogin,
    InlineMessage,
    FieldMessage,
    Silent,
}

impl Error {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            id: id.into(),
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Authentication,
            Self::Validation { .. } | Self::PendingSubtasks(_) => ErrorKind::Validation,
            Self::Storage(_) | Self::Io(_) => ErrorKind::Storage,
            Self::Network(_)
            | Self::PermissionDenied(_)
            | Self::MalformedDocument { .. }
            | Self::TaskNotFound(_)
            | Self::Timeout(_)
            | Self::Serialization(_) => ErrorKind::Remote,
        }
    }

    pub fn recovery(&self) -> Recovery {
        match self.kind() {
            ErrorKind::Authentication => Recovery::RedirectToLogin,
            ErrorKind::Remote => Recovery::InlineMessage,
            ErrorKind::Validation => Recovery::FieldMessage,
            ErrorKind::Storage => Recovery::Silent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovery_per_kind() {
        assert_eq!(Error::Unauthenticated.recovery(), Recovery::RedirectToLogin);
        assert_eq!(
            Error::Network("offline".into()).recovery(),
            Recovery::InlineMessage
        );
        assert_eq!(
            Error::validation("title", "cannot be empty").recovery(),
            Recovery::FieldMessage
        );
        assert_eq!(
            Error::Storage("quota exceeded".into()).recovery(),
            Recovery::Silent
        );
    }

    #[test]
    fn test_distinct_remote_kinds() {
        let errors = [
            Error::Network("reset".into()),
            Error::PermissionDenied("tasks/1".into()),
            Error::malformed("1", "missing userId"),
        ];
        for err in &errors {
            assert_eq!(err.kind(), ErrorKind::Remote);
        }
        assert!(matches!(errors[2], Error::MalformedDocument { .. }));
    }
}
