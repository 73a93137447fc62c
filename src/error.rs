//! Client error taxonomy for FuelPoa.
//!
//! Every failure an operation can produce is one of four kinds. All of them
//! carry a human-readable message meant to be shown to the user as-is, and
//! none of them are retried automatically.

use std::fmt;
use thiserror::Error;

/// Machine-readable error kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Client-side input check failed before any request was made
    Validation,
    /// Invalid credentials/role, or any failure while signing in
    Authentication,
    /// Network unreachable or non-success response
    Transport,
    /// Business-rule rejection (insufficient balance, inactive card, ...)
    Application,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Authentication => "authentication_error",
            ErrorKind::Transport => "transport_error",
            ErrorKind::Application => "application_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified client error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    Application(String),
}

impl ClientError {
    /// Single field validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::Application(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation { .. } => ErrorKind::Validation,
            ClientError::Authentication(_) => ErrorKind::Authentication,
            ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::Application(_) => ErrorKind::Application,
        }
    }

    /// The message to display to the user
    pub fn message(&self) -> &str {
        match self {
            ClientError::Validation { message, .. } => message,
            ClientError::Authentication(message)
            | ClientError::Transport(message)
            | ClientError::Application(message) => message,
        }
    }

    /// Field name for validation errors
    pub fn field(&self) -> Option<&str> {
        match self {
            ClientError::Validation { field, .. } => Some(field),
            _ => None,
        }
    }
}

/// Convenience alias used throughout the client
pub type ClientResult<T> = Result<T, ClientError>;

// -------------------------------------------------------------------------
// Builder for forms that check several fields before submitting
// -------------------------------------------------------------------------

/// Collects field errors in the order they were found
#[derive(Debug, Default)]
pub struct ValidationErrorBuilder {
    errors: Vec<(String, String)>,
}

impl ValidationErrorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a validation error for a field
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.push((field.into(), message.into()));
        self
    }

    /// Record the error of a `Result<(), String>` check, if any
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.add(field, message);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Build the error if anything was collected.
    ///
    /// A single error keeps its own message; several errors are summarised
    /// and the field names are joined.
    pub fn build(self) -> Option<ClientError> {
        match self.errors.len() {
            0 => None,
            1 => self
                .errors
                .into_iter()
                .next()
                .map(|(field, message)| ClientError::Validation { field, message }),
            n => {
                let fields: Vec<&str> = self.errors.iter().map(|(f, _)| f.as_str()).collect();
                Some(ClientError::Validation {
                    field: fields.join(", "),
                    message: format!("Validation failed for {} fields", n),
                })
            }
        }
    }

    /// Return Ok(()) if no errors, or the built error otherwise
    pub fn finish(self) -> ClientResult<()> {
        match self.build() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            ClientError::validation("amount", "x").kind(),
            ErrorKind::Validation
        );
        assert_eq!(
            ClientError::authentication("x").kind(),
            ErrorKind::Authentication
        );
        assert_eq!(ClientError::transport("x").kind(), ErrorKind::Transport);
        assert_eq!(ClientError::application("x").kind(), ErrorKind::Application);
        assert_eq!(ErrorKind::Transport.to_string(), "transport_error");
    }

    #[test]
    fn test_display_is_the_message() {
        let err = ClientError::validation("phone", "Invalid phone number.");
        assert_eq!(err.to_string(), "Invalid phone number.");
        assert_eq!(err.message(), "Invalid phone number.");
        assert_eq!(err.field(), Some("phone"));

        let err = ClientError::application("Insufficient balance");
        assert_eq!(err.to_string(), "Insufficient balance");
        assert_eq!(err.field(), None);
    }

    #[test]
    fn test_builder_single_error_keeps_message() {
        let mut builder = ValidationErrorBuilder::new();
        builder.add("password", "Passwords do not match.");

        let err = builder.build().unwrap();
        assert_eq!(err.message(), "Passwords do not match.");
        assert_eq!(err.field(), Some("password"));
    }

    #[test]
    fn test_builder_multiple_errors() {
        let mut builder = ValidationErrorBuilder::new();
        builder.add("name", "Name is required");
        builder.check("email", Err("Invalid email format".to_string()));
        builder.check("phone", Ok(()));

        assert!(!builder.is_empty());
        let err = builder.build().unwrap();
        assert_eq!(err.field(), Some("name, email"));
        assert!(err.message().contains("2 fields"));
    }

    #[test]
    fn test_builder_finish_ok_when_empty() {
        assert!(ValidationErrorBuilder::new().finish().is_ok());
    }
}
