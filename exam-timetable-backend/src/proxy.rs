//! The same-origin `/api/generate-timetable` endpoint. It validates the
//! multipart upload, forwards it to the scheduling backend and relays the
//! answer.

use async_trait::async_trait;
use axum::extract::multipart::MultipartError;
use axum::extract::Multipart;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use exam_timetable_client::names::NameList;
use exam_timetable_client::timetable::{
    ARTIFACT_FILE_NAME, FIELD_DOCX_FILE, FIELD_INVIGILATORS, FIELD_VENUES,
};
use exam_timetable_client::wizard::{MIN_INVIGILATORS, MIN_VENUES};
use exam_timetable_client::{
    BackendReply, DocxFile, ErrorBody, GenerateTimetable, GeneratedArtifact, GenerationError,
    TimetableBackend, UploadRequest,
};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use http::StatusCode;
use tracing::{debug, error, info, warn};

pub const GENERIC_FAILURE: &str = "An error occurred while generating the timetable";

/// Checked in declaration order, the first failing check is reported.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("DOCX file is required")]
    MissingFile,
    #[error("Uploaded file must be a .docx document")]
    NotDocx,
    #[error("Invigilators list is required")]
    MissingInvigilators,
    #[error("Venues list is required")]
    MissingVenues,
    #[error("At least two invigilators are required")]
    TooFewInvigilators,
    #[error("At least one venue is required")]
    TooFewVenues,
}

/// The raw multipart fields, before any checks.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadForm {
    pub docx_file: Option<DocxFile>,
    pub invigilators: Option<String>,
    pub venues: Option<String>,
}

impl UploadForm {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, MultipartError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(ToOwned::to_owned);
            match name.as_deref() {
                Some(FIELD_DOCX_FILE) => {
                    let file_name = field.file_name().map(ToOwned::to_owned);
                    let content_type = field.content_type().map(ToOwned::to_owned);
                    let bytes = field.bytes().await?;
                    // browsers send an empty part when no file was picked
                    if file_name.as_deref().is_some_and(|name| !name.is_empty()) || !bytes.is_empty()
                    {
                        form.docx_file = Some(DocxFile {
                            file_name: file_name.unwrap_or_default(),
                            content_type,
                            bytes,
                        });
                    }
                }
                Some(FIELD_INVIGILATORS) => form.invigilators = Some(field.text().await?),
                Some(FIELD_VENUES) => form.venues = Some(field.text().await?),
                other => debug!(field = ?other, "ignoring unknown upload field"),
            }
        }
        Ok(form)
    }

    /// Applies the checks and builds the request that is forwarded. The name
    /// lists are forwarded exactly as they were received.
    pub fn validate(self, require_venues: bool) -> Result<UploadRequest, ValidationError> {
        let file = self.docx_file.ok_or(ValidationError::MissingFile)?;
        if !file.is_docx() {
            return Err(ValidationError::NotDocx);
        }
        let invigilators = self
            .invigilators
            .filter(|value| !value.is_empty())
            .ok_or(ValidationError::MissingInvigilators)?;
        let venues = self.venues.filter(|value| !value.is_empty());
        if require_venues && venues.is_none() {
            return Err(ValidationError::MissingVenues);
        }
        if NameList::parse(&invigilators).count() < MIN_INVIGILATORS {
            return Err(ValidationError::TooFewInvigilators);
        }
        if require_venues
            && venues
                .as_deref()
                .map_or(0, |venues| NameList::parse(venues).count())
                < MIN_VENUES
        {
            return Err(ValidationError::TooFewVenues);
        }
        Ok(UploadRequest {
            file,
            invigilators,
            venues,
        })
    }
}

impl From<UploadRequest> for UploadForm {
    fn from(request: UploadRequest) -> Self {
        Self {
            docx_file: Some(request.file),
            invigilators: Some(request.invigilators),
            venues: request.venues,
        }
    }
}

#[derive(Debug, PartialEq)]
pub enum ProxyResponse {
    Pdf(Bytes),
    Json {
        status: StatusCode,
        body: serde_json::Value,
    },
}

impl ProxyResponse {
    fn error(status: StatusCode, msg: impl Into<String>) -> Self {
        Self::Json {
            status,
            body: serde_json::json!(ErrorBody::message(msg)),
        }
    }

    #[must_use]
    pub fn invalid(error: ValidationError) -> Self {
        Self::error(StatusCode::UNPROCESSABLE_ENTITY, error.to_string())
    }

    #[must_use]
    pub fn failure() -> Self {
        Self::error(StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE)
    }
}

impl IntoResponse for ProxyResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Pdf(bytes) => (
                [
                    (CONTENT_TYPE, "application/pdf".to_owned()),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename={ARTIFACT_FILE_NAME}"),
                    ),
                ],
                bytes,
            )
                .into_response(),
            Self::Json { status, body } => (status, Json(body)).into_response(),
        }
    }
}

pub struct UploadProxy {
    backend: TimetableBackend,
    require_venues: bool,
}

impl UploadProxy {
    #[must_use]
    pub const fn new(backend: TimetableBackend, require_venues: bool) -> Self {
        Self {
            backend,
            require_venues,
        }
    }

    #[must_use]
    pub const fn require_venues(&self) -> bool {
        self.require_venues
    }

    /// Never fails, every problem becomes a JSON error response.
    pub async fn forward(&self, form: UploadForm) -> ProxyResponse {
        let request = match form.validate(self.require_venues) {
            Ok(request) => request,
            Err(error) => {
                info!(%error, "rejecting timetable upload");
                return ProxyResponse::invalid(error);
            }
        };
        match self.backend.send(request).await {
            Ok(BackendReply::Pdf(bytes)) => ProxyResponse::Pdf(bytes),
            Ok(BackendReply::Failed { status, body }) => {
                warn!(%status, "scheduling backend refused the upload");
                ProxyResponse::Json { status, body }
            }
            Err(error) => {
                error!(%error, "Error generating timetable");
                ProxyResponse::failure()
            }
        }
    }
}

#[async_trait]
impl GenerateTimetable for UploadProxy {
    async fn generate(&self, request: UploadRequest) -> Result<GeneratedArtifact, GenerationError> {
        match self.forward(request.into()).await {
            ProxyResponse::Pdf(bytes) => Ok(GeneratedArtifact { bytes }),
            ProxyResponse::Json { body, .. } => Err(GenerationError::from_error_body(&body)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(file: Option<&str>, invigilators: Option<&str>, venues: Option<&str>) -> UploadForm {
        UploadForm {
            docx_file: file.map(|name| DocxFile::new(name, "PK")),
            invigilators: invigilators.map(ToOwned::to_owned),
            venues: venues.map(ToOwned::to_owned),
        }
    }

    #[test]
    fn checks_run_in_order() {
        let cases = [
            (form(None, None, None), ValidationError::MissingFile),
            (
                form(Some("schedule.pdf"), None, None),
                ValidationError::NotDocx,
            ),
            (
                form(Some("schedule.docx"), Some(""), Some("D01")),
                ValidationError::MissingInvigilators,
            ),
            (
                form(Some("schedule.docx"), Some("Dr. A"), None),
                ValidationError::MissingVenues,
            ),
            (
                form(Some("schedule.docx"), Some("Dr. A"), Some("D01")),
                ValidationError::TooFewInvigilators,
            ),
            (
                form(Some("schedule.docx"), Some("Dr. A, Dr. B"), Some(" , ")),
                ValidationError::TooFewVenues,
            ),
        ];
        for (form, expected) in cases {
            assert_eq!(form.validate(true), Err(expected));
        }
    }

    #[test]
    fn venues_are_optional_when_not_required() {
        let request = form(Some("schedule.docx"), Some("Dr. A, Dr. B"), None)
            .validate(false)
            .unwrap();
        assert_eq!(request.venues, None);
        assert_eq!(request.invigilators, "Dr. A, Dr. B");

        // still forwarded when sent anyway
        let request = form(Some("schedule.docx"), Some("Dr. A,Dr. B"), Some("D01"))
            .validate(false)
            .unwrap();
        assert_eq!(request.venues.as_deref(), Some("D01"));
    }

    #[test]
    fn names_are_forwarded_verbatim() {
        let request = form(
            Some("schedule.docx"),
            Some(" Dr. A ,, Dr. B "),
            Some("D01,"),
        )
        .validate(true)
        .unwrap();
        assert_eq!(request.invigilators, " Dr. A ,, Dr. B ");
        assert_eq!(request.venues.as_deref(), Some("D01,"));
    }

    #[test]
    fn pdf_response_is_an_attachment() {
        let response = ProxyResponse::Pdf(Bytes::from_static(b"%PDF-1.7")).into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=exam-timetable.pdf"
        );
    }

    #[test]
    fn failure_uses_generic_message() {
        assert_eq!(
            ProxyResponse::failure(),
            ProxyResponse::Json {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: serde_json::json!({ "detail": [{ "msg": GENERIC_FAILURE }] }),
            }
        );
    }
}
