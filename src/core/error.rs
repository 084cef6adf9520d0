use thiserror::Error;

use super::tax_id::TaxIdKind;

/// A field-scoped validation error raised while constructing the document model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dot-separated path to the invalid field (e.g. "customer.address.zip_code").
    pub field: String,
    /// Human-readable error description.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Re-scope an error produced by a nested entity under a parent field,
    /// e.g. `zip_code` becomes `customer.address.zip_code`.
    pub fn nested(self, parent: &str) -> Self {
        Self {
            field: format!("{parent}.{}", self.field),
            message: self.message,
        }
    }

    pub(crate) fn required(field: impl Into<String>) -> Self {
        Self::new(field, "is required")
    }
}

/// Errors from CPF/CNPJ validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TaxIdError {
    /// Wrong length, non-digit characters or a repeated-digit sequence.
    /// No checksum math is attempted for these.
    #[error("invalid tax ID '{value}': {reason}")]
    InvalidFormat { value: String, reason: String },

    /// Well-formed but the check digits do not match.
    #[error("invalid {kind} '{value}': check digits do not match")]
    ChecksumMismatch { value: String, kind: TaxIdKind },
}

/// A value that could not be read as a monetary amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid monetary value '{value}'")]
pub struct MonetaryError {
    /// The input as received.
    pub value: String,
}

impl From<TaxIdError> for ValidationError {
    fn from(err: TaxIdError) -> Self {
        ValidationError::new("document", err.to_string())
    }
}
