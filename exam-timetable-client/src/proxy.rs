use async_trait::async_trait;
use tracing::warn;

use crate::model::first_message;
use crate::timetable::{GeneratedArtifact, UploadRequest};

pub const GENERATE_TIMETABLE_PATH: &str = "/api/generate-timetable";

/// Shown when a failed generation doesn't say why.
pub const FALLBACK_MESSAGE: &str = "Failed to generate timetable";

#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
#[error("{message}")]
pub struct GenerationError {
    pub message: String,
}

impl GenerationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Uses `detail[0].msg` of the error body, or the generic message when the
    /// body has some other shape.
    #[must_use]
    pub fn from_error_body(body: &serde_json::Value) -> Self {
        Self::new(first_message(body).unwrap_or(FALLBACK_MESSAGE))
    }
}

/// Something that can turn an [`UploadRequest`] into a timetable.
#[async_trait]
pub trait GenerateTimetable: Send + Sync {
    async fn generate(&self, request: UploadRequest) -> Result<GeneratedArtifact, GenerationError>;
}

/// Calls the upload proxy endpoint of a running server, the same way the
/// browser form does.
#[derive(Clone, Debug)]
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}{GENERATE_TIMETABLE_PATH}",
            self.base_url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl GenerateTimetable for ProxyClient {
    async fn generate(&self, request: UploadRequest) -> Result<GeneratedArtifact, GenerationError> {
        let transport = |error: reqwest::Error| {
            warn!(%error, "timetable generation request failed");
            GenerationError::new(error.to_string())
        };
        let form = request.into_form().map_err(transport)?;
        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            let body = response
                .json::<serde_json::Value>()
                .await
                .unwrap_or(serde_json::Value::Null);
            return Err(GenerationError::from_error_body(&body));
        }
        let bytes = response.bytes().await.map_err(transport)?;
        Ok(GeneratedArtifact { bytes })
    }
}
