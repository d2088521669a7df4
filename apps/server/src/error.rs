//! Error types and their HTTP rendering.
//!
//! Every failure maps to a structured JSON body. Client errors carry either an
//! `error_description` taken from the [`ErrorCode`] catalog or a list of
//! field `violations`. Server errors are logged and rendered generically.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use heck::ToLowerCamelCase;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Catalog of client-visible rejection reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    StudyNotFound,
    AppNotFound,
    SiteNotFound,
    StudyPermissionAccessDenied,
    CannotUpdateEnrollmentTargetForCloseStudy,
    CannotUpdateEnrollmentTargetForDecommissionedSite,
}

impl ErrorCode {
    /// Stable identifier returned as `error_code`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StudyNotFound => "STUDY_NOT_FOUND",
            Self::AppNotFound => "APP_NOT_FOUND",
            Self::SiteNotFound => "SITE_NOT_FOUND",
            Self::StudyPermissionAccessDenied => "STUDY_PERMISSION_ACCESS_DENIED",
            Self::CannotUpdateEnrollmentTargetForCloseStudy => {
                "CANNOT_UPDATE_ENROLLMENT_TARGET_FOR_CLOSE_STUDY"
            }
            Self::CannotUpdateEnrollmentTargetForDecommissionedSite => {
                "CANNOT_UPDATE_ENROLLMENT_TARGET_FOR_DECOMMISSIONED_SITE"
            }
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::StudyNotFound => "Study not found",
            Self::AppNotFound => "App not found",
            Self::SiteNotFound => "Site not found",
            Self::StudyPermissionAccessDenied => {
                "You do not have permission to access this study"
            }
            Self::CannotUpdateEnrollmentTargetForCloseStudy => {
                "Enrollment target cannot be updated for a closed study"
            }
            Self::CannotUpdateEnrollmentTargetForDecommissionedSite => {
                "Enrollment target cannot be updated for a decommissioned site"
            }
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// One failed input constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl Violation {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation failed: {}", format_violations(.0))]
    Validation(Vec<Violation>),

    #[error("{0}")]
    NotFound(ErrorCode),

    #[error("{0}")]
    Forbidden(ErrorCode),

    #[error("{0}")]
    BusinessRule(ErrorCode),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Shorthand for a single-field validation failure.
    pub fn violation(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(vec![Violation::new(path, message)])
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BusinessRule(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Database(_) | Self::Migration(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Catalog entry for client errors that have one.
    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            Self::NotFound(code) | Self::Forbidden(code) | Self::BusinessRule(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut violations: Vec<Violation> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                let path = field.to_lower_camel_case();
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    Violation::new(path.clone(), message)
                })
            })
            .collect();
        violations.sort_by(|a, b| a.path.cmp(&b.path));
        Self::Validation(violations)
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::violation("body", rejection.body_text())
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.path, v.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_type = status.canonical_reason().unwrap_or("Error");

        let body = match &self {
            Self::Validation(violations) => json!({
                "status": status.as_u16(),
                "error_type": error_type,
                "violations": violations,
            }),
            Self::NotFound(code) | Self::Forbidden(code) | Self::BusinessRule(code) => json!({
                "status": status.as_u16(),
                "error_type": error_type,
                "error_code": code.code(),
                "error_description": code.description(),
            }),
            Self::Database(_) | Self::Migration(_) | Self::Internal(_) => {
                tracing::error!(error = %self, "Request failed with a server error");
                json!({
                    "status": status.as_u16(),
                    "error_type": error_type,
                    "error_description": "An internal error occurred",
                })
            }
        };

        (status, Json(body)).into_response()
    }
}
