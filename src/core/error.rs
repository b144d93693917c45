use thiserror::Error;

/// Errors that can occur while pricing, configuring or approving invoices.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CobranzaError {
    /// Operator input was rejected; the message is meant for the UI as-is.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Malformed domain data reached a pure computation (e.g. missing service).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Writing to the row store (or the backend persisting a recalculation) failed.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A document or configuration collided with one that already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Transport failure talking to an external endpoint.
    #[error("network error: {0}")]
    Network(String),

    /// A best-effort notification could not be delivered.
    #[error("notification failed: {0}")]
    Notification(String),

    /// Backend settings could not be loaded.
    #[error("settings error: {0}")]
    Settings(String),
}

/// A single validation problem with the offending form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Form field name (e.g. "tax_percentage").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Fold a list of field problems into a single [`CobranzaError::Validation`].
///
/// Returns `Ok(())` when the list is empty.
pub fn into_validation_result(errors: Vec<ValidationError>) -> Result<(), CobranzaError> {
    if errors.is_empty() {
        return Ok(());
    }
    let msg = errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    Err(CobranzaError::Validation(msg))
}
