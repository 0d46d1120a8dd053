use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use tracing::error;

use crate::proxy::{ProxyResponse, UploadForm, UploadProxy};

pub async fn generate_timetable(
    State(proxy): State<Arc<UploadProxy>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ProxyResponse {
    let multipart = match multipart {
        Ok(multipart) => multipart,
        Err(rejection) => {
            error!(%rejection, "Error generating timetable");
            return ProxyResponse::failure();
        }
    };
    match UploadForm::from_multipart(multipart).await {
        Ok(form) => proxy.forward(form).await,
        Err(error) => {
            error!(%error, "Error generating timetable");
            ProxyResponse::failure()
        }
    }
}
