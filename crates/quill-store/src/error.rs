use quill_types::TypeError;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the given id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A unique field already holds this value.
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// A mutation rejected the record it was applied to.
    #[error("rejected: {0}")]
    Rejected(#[from] TypeError),

    /// The backend is unavailable or its state is unusable.
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
