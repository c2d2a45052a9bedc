//! Error types for quickid

use std::fmt;
use thiserror::Error;

/// Structural field of an encoded ID
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdField {
    Time,
    Sequence,
}

impl fmt::Display for IdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdField::Time => write!(f, "time"),
            IdField::Sequence => write!(f, "sequence"),
        }
    }
}

/// Core error type for quickid operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuickIdError {
    #[error("Malformed ID '{id}': {len} bytes, need at least 13")]
    MalformedId { id: String, len: usize },

    #[error("Invalid base-32 {field} field: '{value}'")]
    InvalidDigit { field: IdField, value: String },

    #[error("Sequence {0} out of range (limit 1048576)")]
    SequenceOutOfRange(u32),
}

impl QuickIdError {
    pub fn malformed(id: impl Into<String>) -> Self {
        let id = id.into();
        let len = id.len();
        Self::MalformedId { id, len }
    }

    pub fn invalid_digit(field: IdField, value: impl Into<String>) -> Self {
        Self::InvalidDigit {
            field,
            value: value.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, QuickIdError>;
