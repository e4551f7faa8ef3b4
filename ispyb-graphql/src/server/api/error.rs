use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::db;

/// Failures that prevent a GraphQL request from being executed at all.
#[derive(thiserror::Error, Serialize, Debug, Clone)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum Error {
    #[error("database unavailable")]
    DatabaseUnavailable {
        #[serde(skip)]
        source: db::error::Error,
    },
}
impl Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<db::error::Error> for Error {
    fn from(source: db::error::Error) -> Self {
        Self::DatabaseUnavailable { source }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            status: u16,
            error: Error,
        }

        match &self {
            Self::DatabaseUnavailable { source } => {
                tracing::error!(error = %self, %source, "rejected request");
            }
        }

        let status = self.status_code();

        (
            status,
            axum::Json(ErrorResponse {
                status: status.as_u16(),
                error: self,
            }),
        )
            .into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
