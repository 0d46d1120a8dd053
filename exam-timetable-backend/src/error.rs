use axum::extract::multipart::MultipartError;
use axum::response::{IntoResponse, Response};
use exam_timetable_client::ReferenceDataError;
use exam_timetable_config::ConfigError;
use http::StatusCode;
use tracing::error;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("form upload error: {0}")]
    Multipart(#[from] MultipartError),
    #[error("template error: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("{0}")]
    ReferenceData(#[from] ReferenceDataError),
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    File(#[from] std::io::Error),
    #[error("not found")]
    NotFound,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            err @ AppError::Multipart(_) => {
                (StatusCode::BAD_REQUEST, format!("{err}")).into_response()
            }
            err @ AppError::NotFound => (StatusCode::NOT_FOUND, format!("{err}")).into_response(),
            err @ (AppError::Render(_)
            | AppError::ReferenceData(_)
            | AppError::Config(_)
            | AppError::File(_)) => {
                error!(error = %err, "request failed");
                // intentionally not using handlebars here so a broken template still shows something
                (StatusCode::INTERNAL_SERVER_ERROR, format!("{err}")).into_response()
            }
        }
    }
}
