#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The referenced entity does not exist, or is not visible to the caller.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    /// Input rejected before any store mutation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The backing record store could not be read or written.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a missing version. Used for both unknown ids and
    /// versions owned by someone else.
    pub fn version_not_found(id: impl ToString) -> Self {
        CoreError::NotFound {
            entity: "Version",
            id: id.to_string(),
        }
    }

    /// Whether the caller may reasonably retry the operation.
    pub fn is_retriable(&self) -> bool {
        matches!(self, CoreError::StoreUnavailable(_))
    }
}
