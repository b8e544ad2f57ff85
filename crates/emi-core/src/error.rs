use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which constraint an input value broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Violation {
    /// Value must be strictly greater than zero.
    NotPositive,
    /// Value must not be below zero.
    Negative,
    /// Down payment must leave something to finance.
    NotBelowPrincipal,
    /// NaN or infinite.
    NotFinite,
    /// Finite and signed correctly, but outside what the formula can amortise.
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmiError {
    #[error("Invalid input: {field} ({reason})")]
    InvalidInput {
        field: String,
        violation: Violation,
        reason: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EmiError {
    pub(crate) fn invalid(field: &str, violation: Violation, reason: impl Into<String>) -> Self {
        EmiError::InvalidInput {
            field: field.into(),
            violation,
            reason: reason.into(),
        }
    }

    /// The violated constraint, if this is an input error.
    pub fn violation(&self) -> Option<Violation> {
        match self {
            EmiError::InvalidInput { violation, .. } => Some(*violation),
            EmiError::SerializationError(_) => None,
        }
    }

    /// The offending field name, if this is an input error.
    pub fn field(&self) -> Option<&str> {
        match self {
            EmiError::InvalidInput { field, .. } => Some(field),
            EmiError::SerializationError(_) => None,
        }
    }
}

impl From<serde_json::Error> for EmiError {
    fn from(e: serde_json::Error) -> Self {
        EmiError::SerializationError(e.to_string())
    }
}
