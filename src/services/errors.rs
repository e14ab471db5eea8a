use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::types::TypeConstraintError;
use crate::forms::FormError;
use crate::repository::errors::RepositoryError;

/// Field name to the messages reported for it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("unauthenticated")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Form(String),

    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("type constraint: {0}")]
    TypeConstraint(#[from] TypeConstraintError),

    #[error("repository error: {0}")]
    Repository(RepositoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Single-field validation failure.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        ServiceError::Validation(errors)
    }

    /// First message of a validation failure, used for flash notices.
    pub fn summary(&self) -> String {
        match self {
            ServiceError::Validation(errors) => errors
                .values()
                .flatten()
                .next()
                .cloned()
                .unwrap_or_else(|| "The given data was invalid.".to_string()),
            other => other.to_string(),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => ServiceError::NotFound,
            ref violation @ RepositoryError::ConstraintViolation(_) => {
                match violation.unique_column() {
                    Some(column) => {
                        ServiceError::field(column, format!("The {column} has already been taken."))
                    }
                    None => ServiceError::Conflict(violation.to_string()),
                }
            }
            other => ServiceError::Repository(other),
        }
    }
}

impl From<FormError> for ServiceError {
    fn from(err: FormError) -> Self {
        ServiceError::Validation(err.into_field_errors())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_becomes_field_error() {
        let err = ServiceError::from(RepositoryError::ConstraintViolation(
            "Unique constraint violation: UNIQUE constraint failed: users.email".into(),
        ));
        let ServiceError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get("email"),
            Some(&vec!["The email has already been taken.".to_string()])
        );
    }

    #[test]
    fn foreign_key_violation_is_a_conflict() {
        let err = ServiceError::from(RepositoryError::ConstraintViolation(
            "Foreign key constraint violation: FOREIGN KEY constraint failed".into(),
        ));
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn missing_rows_map_to_not_found() {
        assert!(matches!(
            ServiceError::from(RepositoryError::NotFound),
            ServiceError::NotFound
        ));
    }
}
