use thiserror::Error;

/// Errors produced by type construction and validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("{field} is required")]
    MissingField { field: &'static str },

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl TypeError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Trim `value` and reject it when nothing is left.
pub(crate) fn required(field: &'static str, value: &str) -> Result<String, TypeError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(TypeError::MissingField { field });
    }
    Ok(trimmed.to_string())
}
