//! Error types for Roster.
//!
//! Store, validation, registration and configuration failures all share one
//! enum so flows can decide in one place what becomes a user notification.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A specialized `Result` type for Roster operations.
pub type Result<T> = std::result::Result<T, RosterError>;

/// A single field-level validation failure.
///
/// `field` is the wire (camelCase) name so it lines up with request bodies
/// and form fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Wire name of the offending field (e.g. `firstName`).
    pub field: String,
    /// Message shown next to the field.
    pub message: String,
}

impl FieldError {
    /// Creates a new `FieldError`.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors that can occur in the record store, the flows and configuration.
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    // ========================================================================
    // Record errors
    // ========================================================================
    /// Input failed one or more field constraints.
    #[error("Validation failed: {}", join_fields(.errors))]
    Validation {
        /// Every violated constraint, in field order.
        errors: Vec<FieldError>,
    },

    /// Update targeted an id that is not in the store.
    #[error("Student not found: '{id}'")]
    NotFound {
        /// The missing record id.
        id: String,
    },

    /// The backend is temporarily unavailable.
    #[error("Backend unavailable: {message}\n\nSuggestion: Retry the action")]
    Transient {
        /// What went wrong.
        message: String,
    },

    /// Registration was attempted for a course that has no sections.
    #[error("No section available for course '{course}'")]
    NoSectionAvailable {
        /// The selected course id.
        course: String,
    },

    // ========================================================================
    // Configuration errors
    // ========================================================================
    /// Invalid JSON syntax in configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your roster.json with a JSON linter")]
    ConfigParse {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    /// A config file exists but could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RosterError {
    /// Creates a `Validation` error from a list of field errors.
    #[must_use]
    pub fn validation(errors: Vec<FieldError>) -> Self {
        Self::Validation { errors }
    }

    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Creates a `Transient` error.
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Creates a `NoSectionAvailable` error.
    #[must_use]
    pub fn no_section(course: impl Into<String>) -> Self {
        Self::NoSectionAvailable {
            course: course.into(),
        }
    }

    /// Creates a new `ConfigParse` error with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidation` error with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Returns the field errors if this is a `Validation` error.
    #[must_use]
    pub fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }

    /// Returns `true` if re-invoking the same action may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
