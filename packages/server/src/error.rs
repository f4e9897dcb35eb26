//! Mapping from library errors to HTTP responses.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use malaria_forecast_analytics::AnalyticsError;
use malaria_forecast_dataset::DatasetError;
use malaria_forecast_server_models::ApiError;

/// Errors a handler can return.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No cached dataset has this id.
    #[error("Unknown dataset '{id}': upload it first")]
    DatasetNotFound {
        /// The requested id.
        id: String,
    },

    /// The upload could not be parsed.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Summary or forecast failed.
    #[error(transparent)]
    Analytics(#[from] AnalyticsError),

    /// The blocking worker pool failed to run the job.
    #[error("Background task failed: {0}")]
    Blocking(#[from] actix_web::error::BlockingError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::DatasetNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Dataset(DatasetError::Io(_)) | Self::Blocking(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Dataset(_) => StatusCode::BAD_REQUEST,
            Self::Analytics(AnalyticsError::ModelFit { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Analytics(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() || status == StatusCode::UNPROCESSABLE_ENTITY {
            log::error!("{status}: {self}");
        } else {
            log::warn!("{status}: {self}");
        }
        HttpResponse::build(status).json(ApiError {
            error: self.to_string(),
        })
    }
}
