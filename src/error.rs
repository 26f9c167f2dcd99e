use actix_web::{body, http::{self, header::ContentType, StatusCode}, HttpResponse};
use sea_orm::DbErr;
use thiserror::Error;

/// Everything that can stop a payroll operation
///
/// None of these leave partial state behind, handlers bail out before persisting.
#[derive(Debug, Error)]
pub enum PayrollError {
    #[error("Monthly Target Hours are not set for position: {position}")]
    Configuration { position: String },

    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(#[from] DbErr),

    #[error("malformed upstream data: {0}")]
    MalformedUpstream(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    TerminalState(String),

    #[error("{0} not found")]
    NotFound(&'static str),
}

impl PayrollError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

impl actix_web::error::ResponseError for PayrollError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        match self {
            PayrollError::UpstreamFetch(err) => tracing::error!(error = %err, "collaborator query failed"),
            PayrollError::MalformedUpstream(msg) => tracing::error!(reason = %msg, "rejected stored data"),
            other => tracing::warn!(error = %other, "payroll request refused"),
        }

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            PayrollError::Configuration { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PayrollError::UpstreamFetch(_) => StatusCode::SERVICE_UNAVAILABLE,
            PayrollError::MalformedUpstream(_) => StatusCode::BAD_GATEWAY,
            PayrollError::Validation(_) => StatusCode::BAD_REQUEST,
            PayrollError::TerminalState(_) => StatusCode::CONFLICT,
            PayrollError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

pub type PayrollResult<T> = Result<T, PayrollError>;
