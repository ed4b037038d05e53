//! Failure types produced by checkers and their HTTP rendering

use axum::response::{IntoResponse, Response};
use serde::Serialize;

use super::entity::LookupError;
use crate::error::ApiError;

/// A field-level validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    /// Malformed request, 400
    Validation,
    /// Referenced record does not exist, 404
    NotFound,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::Validation => "ValidationError",
            RejectionKind::NotFound => "NotFound",
        }
    }
}

/// A business-level refusal; the handler never runs
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub kind: RejectionKind,
    pub message: String,
    pub errors: Vec<FieldError>,
}

impl Rejection {
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: RejectionKind::Validation,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            kind: RejectionKind::NotFound,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        let kind = rejection.kind.as_str();
        let error = match rejection.kind {
            RejectionKind::Validation => ApiError::bad_request(kind, rejection.message),
            RejectionKind::NotFound => ApiError::not_found(kind, rejection.message),
        };
        error.with_field_errors(rejection.errors)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Why a validation chain stopped
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("{0}")]
    Rejected(Rejection),
    /// The lookup collaborator could not answer
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

impl From<Rejection> for ValidationError {
    fn from(rejection: Rejection) -> Self {
        ValidationError::Rejected(rejection)
    }
}

impl ValidationError {
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            ValidationError::Rejected(rejection) => Some(rejection),
            ValidationError::Lookup(_) => None,
        }
    }
}

impl IntoResponse for ValidationError {
    fn into_response(self) -> Response {
        match self {
            ValidationError::Rejected(rejection) => rejection.into_response(),
            ValidationError::Lookup(err) => {
                tracing::error!(error = %err, "entity lookup failed during validation");
                ApiError::internal("An unexpected database error occurred").into_response()
            }
        }
    }
}

/// Builder for accumulating validation errors
#[derive(Debug, Default)]
pub struct ValidationBuilder {
    errors: Vec<FieldError>,
}

impl ValidationBuilder {
    pub fn new() -> Self {
        Self { errors: vec![] }
    }

    /// Add an error if the result is Err
    pub fn check<F>(&mut self, field: &str, validator: F) -> &mut Self
    where
        F: FnOnce() -> Result<(), String>,
    {
        if let Err(message) = validator() {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    /// Add an error directly
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors.push(FieldError::new(field, message));
        self
    }

    /// Finish with one aggregated rejection whose message is built from all errors
    pub fn build<F>(self, summarize: F) -> Result<(), Rejection>
    where
        F: FnOnce(&[FieldError]) -> String,
    {
        if self.errors.is_empty() {
            return Ok(());
        }
        let message = summarize(&self.errors);
        Err(Rejection::validation(message).with_errors(self.errors))
    }

    /// Finish, joining each error message with `separator`
    pub fn build_joined(self, separator: &str) -> Result<(), Rejection> {
        self.build(|errors| {
            errors
                .iter()
                .map(|e| e.message.as_str())
                .collect::<Vec<_>>()
                .join(separator)
        })
    }
}
