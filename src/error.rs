use serde::Serialize;

/// Constraint a field failed during validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    Required,
    MinLength(usize),
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,     // dotted path, e.g. "fullname.firstname"
    pub constraint: Constraint,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("validation failed: {}", describe(.0))]
    Validation(Vec<FieldViolation>),

    #[error("{field} is already registered")]
    UniquenessConflict { field: &'static str },

    #[error("token signing failed: {0}")]
    Signing(String),

    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("password comparison failed: {0}")]
    Comparison(String),

    #[error("password hashing failed: {0}")]
    Hashing(String),

    #[error("storage error: {0}")]
    Store(#[from] sqlx::Error),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    /// Field violations when this is a validation failure.
    pub fn violations(&self) -> Option<&[FieldViolation]> {
        match self {
            UserError::Validation(v) => Some(v),
            _ => None,
        }
    }
}

fn describe(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}
