//! Error types for the gateway.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation. Every
//! error body is JSON carrying `error`, `kind`, and `status`; validation
//! errors also name the offending `field`.

use axum::extract::rejection::{JsonDataError, JsonRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use cascade_core::SessionError;

/// Errors that can occur in the gateway layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// Malformed caller input.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// The offending input field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl ObserverError {
    /// Validation failure for a field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Machine-readable error kind.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::NotFound(_) => "not_found",
        }
    }
}

impl From<SessionError> for ObserverError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation { field, reason } => Self::validation(field, reason),
            SessionError::NotFound { entity, id } => Self::NotFound(format!("{entity} {id}")),
        }
    }
}

impl From<JsonRejection> for ObserverError {
    fn from(rejection: JsonRejection) -> Self {
        let field = match &rejection {
            JsonRejection::JsonDataError(err) => failing_field(err),
            _ => None,
        };
        Self::validation(
            field.unwrap_or_else(|| "body".to_owned()),
            rejection.body_text(),
        )
    }
}

/// Path serde reported for a mistyped value, e.g. `location.lat`.
///
/// Somewhere in the source chain the message reads `<path>: <reason>`;
/// root-level failures carry no path.
fn failing_field(err: &JsonDataError) -> Option<String> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = current {
        let text = e.to_string();
        if let Some((path, _)) = text.split_once(": ") {
            if !path.is_empty() && path != "." && !path.contains(char::is_whitespace) {
                return Some(path.to_owned());
            }
        }
        current = e.source();
    }
    None
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let mut body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
            "status": status.as_u16(),
        });
        if let (Self::Validation { field, .. }, Some(map)) = (&self, body.as_object_mut()) {
            map.insert("field".to_owned(), serde_json::Value::from(field.as_str()));
        }

        tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");

        (status, axum::Json(body)).into_response()
    }
}
