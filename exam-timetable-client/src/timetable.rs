use bytes::Bytes;
use http::StatusCode;
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

pub const FIELD_DOCX_FILE: &str = "docx_file";
pub const FIELD_INVIGILATORS: &str = "invigilators";
pub const FIELD_VENUES: &str = "venues";

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// File name the generated timetable is always offered as.
pub const ARTIFACT_FILE_NAME: &str = "exam-timetable.pdf";

/// An uploaded exam schedule document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocxFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl DocxFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: Some(DOCX_CONTENT_TYPE.to_owned()),
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub fn is_docx(&self) -> bool {
        std::path::Path::new(&self.file_name)
            .extension()
            .is_some_and(|extension| extension.eq_ignore_ascii_case("docx"))
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    fn into_part(self) -> Result<Part, reqwest::Error> {
        let part = Part::stream_with_length(self.bytes.clone(), self.bytes.len() as u64)
            .file_name(self.file_name);
        match self.content_type {
            Some(content_type) => part.mime_str(&content_type),
            None => Ok(part),
        }
    }
}

/// One generation request. Built fresh for every submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadRequest {
    pub file: DocxFile,
    /// Comma separated, sent exactly as entered.
    pub invigilators: String,
    /// `None` in flows that don't collect venues.
    pub venues: Option<String>,
}

impl UploadRequest {
    pub fn into_form(self) -> Result<Form, reqwest::Error> {
        let form = Form::new()
            .part(FIELD_DOCX_FILE, self.file.into_part()?)
            .text(FIELD_INVIGILATORS, self.invigilators);
        Ok(match self.venues {
            Some(venues) => form.text(FIELD_VENUES, venues),
            None => form,
        })
    }
}

/// The PDF produced by the scheduling backend for one request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedArtifact {
    pub bytes: Bytes,
}

impl GeneratedArtifact {
    #[must_use]
    pub const fn file_name(&self) -> &'static str {
        ARTIFACT_FILE_NAME
    }
}

#[derive(thiserror::Error, Debug)]
pub enum TimetableError {
    #[error("timetable backend request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("timetable backend answered {status} with a body that is not JSON: {source}")]
    MalformedErrorBody {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, PartialEq)]
pub enum BackendReply {
    Pdf(Bytes),
    Failed {
        status: StatusCode,
        body: serde_json::Value,
    },
}

/// Client for the external scheduling backend that turns a schedule document
/// plus name lists into a timetable PDF.
#[derive(Clone, Debug)]
pub struct TimetableBackend {
    client: reqwest::Client,
    url: String,
}

impl TimetableBackend {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn send(&self, request: UploadRequest) -> Result<BackendReply, TimetableError> {
        info!(
            url = %self.url,
            file_name = %request.file.file_name,
            size = request.file.size(),
            "forwarding timetable request"
        );
        let response = self
            .client
            .post(&self.url)
            .multipart(request.into_form()?)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            debug!(%status, size = body.len(), "timetable backend returned a document");
            return Ok(BackendReply::Pdf(body));
        }
        let body = serde_json::from_slice(&body)
            .map_err(|source| TimetableError::MalformedErrorBody { status, source })?;
        debug!(%status, "timetable backend rejected the request");
        Ok(BackendReply::Failed { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn docx_detection_is_by_extension() {
        assert!(DocxFile::new("schedule.docx", "x").is_docx());
        assert!(DocxFile::new("SCHEDULE.DOCX", "x").is_docx());
        assert!(!DocxFile::new("schedule.doc", "x").is_docx());
        assert!(!DocxFile::new("schedule.docx.pdf", "x").is_docx());
        assert!(!DocxFile::new("docx", "x").is_docx());
    }

    #[test]
    fn artifact_is_always_named_exam_timetable() {
        let artifact = GeneratedArtifact {
            bytes: Bytes::from_static(b"%PDF-1.7"),
        };
        assert_eq!(artifact.file_name(), "exam-timetable.pdf");
    }
}
