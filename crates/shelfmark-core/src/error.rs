use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A delete was blocked because other records still reference the target.
    #[error("cannot delete {entity} {id}: still referenced by {dependents} {dependent_entity} record(s)")]
    Integrity {
        entity: &'static str,
        id: String,
        dependent_entity: &'static str,
        dependents: usize,
    },

    #[error("not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Returns `true` for field-level validation failures.
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns `true` when a delete was rejected by a restricting relation.
    pub const fn is_integrity(&self) -> bool {
        matches!(self, Self::Integrity { .. })
    }
}

/// A write rejected because a field value breaks a declared constraint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("{field} must be at most {max} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("{field} must be exactly {expected} characters (got {actual})")]
    WrongLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("{field} {value:?} is already in use")]
    NotUnique { field: &'static str, value: String },

    #[error("{value:?} is not a valid choice for {field}")]
    InvalidChoice { field: &'static str, value: String },
}

impl ValidationError {
    /// The name of the field that failed.
    pub fn field(&self) -> &'static str {
        match *self {
            Self::Required { field }
            | Self::TooLong { field, .. }
            | Self::WrongLength { field, .. }
            | Self::NotUnique { field, .. }
            | Self::InvalidChoice { field, .. } => field,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
