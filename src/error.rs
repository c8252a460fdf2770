//! Error types for the patient service
//!
//! The core only constructs error values; logging happens once, at the
//! HTTP boundary, when an error is converted into a response. Failure
//! variants carry the context the boundary needs (patient id, family
//! name, a generated trace id).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Patient with provided id does not exist")]
    PatientNotFound { id: Uuid, trace_id: Uuid },

    #[error("Patient with provided id already exists")]
    PatientAlreadyExists {
        id: Uuid,
        family: String,
        trace_id: Uuid,
    },

    #[error("Birth date is invalid")]
    InvalidBirthDate,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unable to {op} patient entry in database")]
    Storage {
        op: &'static str,
        id: Uuid,
        family: Option<String>,
        trace_id: Uuid,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(id: Uuid) -> Self {
        Self::PatientNotFound {
            id,
            trace_id: Uuid::new_v4(),
        }
    }

    pub fn already_exists(id: Uuid, family: String) -> Self {
        Self::PatientAlreadyExists {
            id,
            family,
            trace_id: Uuid::new_v4(),
        }
    }

    pub fn storage(op: &'static str, id: Uuid, family: Option<String>, source: sqlx::Error) -> Self {
        Self::Storage {
            op,
            id,
            family,
            trace_id: Uuid::new_v4(),
            source,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Error::Database(_) | Error::Migrate(_) | Error::Other(_) => "internal",
            Error::PatientNotFound { .. } => "patient_not_found",
            Error::PatientAlreadyExists { .. } => "patient_already_exists",
            Error::InvalidBirthDate => "invalid_birth_date",
            Error::Validation(_) => "validation",
            Error::Storage { .. } => "storage_failure",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::PatientNotFound { .. } => StatusCode::NOT_FOUND,
            Error::PatientAlreadyExists { .. } => StatusCode::CONFLICT,
            Error::InvalidBirthDate | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Storage { .. } | Error::Database(_) | Error::Migrate(_) | Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        // Log write failures with full context; the response body stays generic.
        let (message, trace_id) = match &self {
            Error::Storage {
                op,
                id,
                family,
                trace_id,
                source,
            } => {
                tracing::error!(
                    patient_id = %id,
                    family = family.as_deref().unwrap_or(""),
                    trace_id = %trace_id,
                    error = %source,
                    "Storage failure during {op}"
                );
                (self.to_string(), Some(*trace_id))
            }
            Error::Database(e) => {
                tracing::error!(error = %e, "Database error");
                ("Internal server error".to_string(), None)
            }
            Error::Migrate(e) => {
                tracing::error!(error = %e, "Migration error");
                ("Internal server error".to_string(), None)
            }
            Error::Other(e) => {
                tracing::error!(error = %e, "Internal error");
                ("Internal server error".to_string(), None)
            }
            Error::PatientNotFound { id, trace_id } => {
                tracing::debug!(patient_id = %id, trace_id = %trace_id, "Patient not found");
                (self.to_string(), Some(*trace_id))
            }
            Error::PatientAlreadyExists {
                id,
                family,
                trace_id,
            } => {
                tracing::warn!(
                    patient_id = %id,
                    family = %family,
                    trace_id = %trace_id,
                    "Create rejected: id collision"
                );
                (self.to_string(), Some(*trace_id))
            }
            _ => (self.to_string(), None),
        };

        let mut body = json!({
            "code": self.code(),
            "message": message,
        });
        if let Some(trace_id) = trace_id {
            body["traceId"] = json!(trace_id);
        }

        (status, Json(body)).into_response()
    }
}
