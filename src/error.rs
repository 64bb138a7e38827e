//! Unified error type and the centralized error stage.
//!
//! Every failure on the request path becomes one [`Error`] value, whether a
//! middleware rejected the caller or a handler panicked. Converting that
//! value into a [`Response`] is the single place error responses are built:
//! handlers and middleware never write error bodies themselves.

use serde::Serialize;
use tracing::{debug, error};

use crate::response::{IntoResponse, Response};
use crate::status::Status;

/// One field-level problem reported by validation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

impl Violation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }
}

/// The error type for everything roster does, on and off the request path.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No caller identity on a route that requires one.
    #[error("authentication required")]
    Unauthenticated,

    /// Caller identity present but none of its roles are allowed.
    #[error("insufficient role for this route")]
    Forbidden,

    /// Request body failed its shape check.
    #[error("validation failed ({} violation(s))", .0.len())]
    ValidationFailed(Vec<Violation>),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("conflict: {0}")]
    Conflict(String),

    /// Request body longer than the server accepts, in bytes.
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// Opaque service-layer failure.
    #[error("domain error: {0}")]
    Domain(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a single-violation [`Error::ValidationFailed`].
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationFailed(vec![Violation::new(field, message)])
    }

    pub fn status(&self) -> Status {
        match self {
            Self::Unauthenticated     => Status::Unauthorized,
            Self::Forbidden           => Status::Forbidden,
            Self::ValidationFailed(_) => Status::BadRequest,
            Self::NotFound(_)         => Status::NotFound,
            Self::MethodNotAllowed    => Status::MethodNotAllowed,
            Self::Conflict(_)         => Status::Conflict,
            Self::PayloadTooLarge(_)  => Status::ContentTooLarge,
            Self::Domain(_)           => Status::UnprocessableContent,
            Self::Internal(_)         => Status::InternalServerError,
            Self::Io(_)               => Status::InternalServerError,
        }
    }

    /// Stable machine-readable label written as `error` in the body.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated     => "Unauthenticated",
            Self::Forbidden           => "Forbidden",
            Self::ValidationFailed(_) => "ValidationFailed",
            Self::NotFound(_)         => "NotFound",
            Self::MethodNotAllowed    => "MethodNotAllowed",
            Self::Conflict(_)         => "Conflict",
            Self::PayloadTooLarge(_)  => "PayloadTooLarge",
            Self::Domain(_)           => "DomainError",
            Self::Internal(_)         => "Internal",
            Self::Io(_)               => "Internal",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    violations: Option<&'a [Violation]>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.as_u16() >= 500 {
            error!(kind = self.kind(), "request failed: {self}");
        } else {
            debug!(kind = self.kind(), "request rejected: {self}");
        }

        // Internal details stay in the log.
        let message = match &self {
            Self::Internal(_) | Self::Io(_) => "internal server error".to_owned(),
            other => other.to_string(),
        };
        let body = ErrorBody {
            error: self.kind(),
            message,
            violations: match &self {
                Self::ValidationFailed(v) => Some(v.as_slice()),
                _ => None,
            },
        };

        match serde_json::to_vec(&body) {
            Ok(bytes) => Response::builder().status(status).json(bytes),
            Err(_) => Response::status(status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_failure_lists_violations() {
        let res = Error::ValidationFailed(vec![
            Violation::new("name", "is required"),
            Violation::new("password", "too short"),
        ])
        .into_response();

        assert_eq!(res.status_code(), 400);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "ValidationFailed");
        assert_eq!(body["violations"][1]["field"], "password");
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let res = Error::Internal("db password is hunter2".into()).into_response();
        assert_eq!(res.status_code(), 500);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["message"], "internal server error");
        assert!(body.get("violations").is_none());
    }

    #[test]
    fn auth_failures_map_to_401_and_403() {
        assert_eq!(Error::Unauthenticated.into_response().status_code(), 401);
        assert_eq!(Error::Forbidden.into_response().status_code(), 403);
    }

    #[test]
    fn oversized_body_is_413() {
        let res = Error::PayloadTooLarge(1024).into_response();
        assert_eq!(res.status_code(), 413);
        let body: serde_json::Value = serde_json::from_slice(res.body()).unwrap();
        assert_eq!(body["error"], "PayloadTooLarge");
    }
}
