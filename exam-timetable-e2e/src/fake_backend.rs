//! An in-memory stand-in for the external backend: the `{id, name}` lists
//! below `/api/` and the timetable generation endpoint.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use bytes::Bytes;
use exam_timetable_client::{NamedRecord, ResourceKind};
use http::header::CONTENT_TYPE;
use http::StatusCode;
use serde::Deserialize;
use tracing::debug;

pub const GENERATE_PATH: &str = "/generate-timetable";

pub const FAKE_PDF: &[u8] = b"%PDF-1.7 fake timetable";

#[derive(Clone, Debug)]
pub enum TimetableReply {
    Pdf(Bytes),
    /// A successful document sent with some other content type.
    Document {
        content_type: &'static str,
        body: Bytes,
    },
    Json {
        status: StatusCode,
        body: serde_json::Value,
    },
    /// A failure whose body is not JSON.
    Text { status: StatusCode, body: String },
}

/// One multipart request as the generation endpoint saw it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReceivedUpload {
    pub fields: Vec<String>,
    pub file_name: Option<String>,
    pub invigilators: Option<String>,
    pub venues: Option<String>,
}

struct Inner {
    records: HashMap<ResourceKind, Vec<NamedRecord>>,
    next_id: i64,
    reply: TimetableReply,
    uploads: Vec<ReceivedUpload>,
}

#[derive(Clone)]
pub struct FakeBackend {
    inner: Arc<Mutex<Inner>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct NamePayload {
    name: String,
}

impl FakeBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                records: HashMap::new(),
                next_id: 1,
                reply: TimetableReply::Pdf(Bytes::from_static(FAKE_PDF)),
                uploads: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_reply(&self, reply: TimetableReply) {
        self.lock().reply = reply;
    }

    /// Stores a record as is and returns its id.
    pub fn seed(&self, kind: ResourceKind, name: &str) -> i64 {
        let mut inner = self.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.records.entry(kind).or_default().push(NamedRecord {
            id,
            name: name.to_owned(),
        });
        id
    }

    #[must_use]
    pub fn records(&self, kind: ResourceKind) -> Vec<NamedRecord> {
        self.lock().records.get(&kind).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn uploads(&self) -> Vec<ReceivedUpload> {
        self.lock().uploads.clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/api/:kind/", get(list).post(create))
            .route("/api/:kind/:id", put(update).delete(remove))
            .route(GENERATE_PATH, post(generate))
            .with_state(self.clone())
    }
}

async fn list(State(backend): State<FakeBackend>, Path(kind): Path<ResourceKind>) -> Response {
    Json(backend.records(kind)).into_response()
}

async fn create(
    State(backend): State<FakeBackend>,
    Path(kind): Path<ResourceKind>,
    Json(payload): Json<NamePayload>,
) -> Response {
    let id = backend.seed(kind, &payload.name);
    debug!(%kind, id, "fake backend created record");
    (
        StatusCode::CREATED,
        Json(NamedRecord {
            id,
            name: payload.name,
        }),
    )
        .into_response()
}

async fn update(
    State(backend): State<FakeBackend>,
    Path((kind, id)): Path<(ResourceKind, i64)>,
    Json(payload): Json<NamePayload>,
) -> Response {
    let mut inner = backend.lock();
    let record = inner
        .records
        .entry(kind)
        .or_default()
        .iter_mut()
        .find(|record| record.id == id);
    match record {
        Some(record) => {
            record.name = payload.name;
            Json(record.clone()).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn remove(
    State(backend): State<FakeBackend>,
    Path((kind, id)): Path<(ResourceKind, i64)>,
) -> StatusCode {
    let mut inner = backend.lock();
    let records = inner.records.entry(kind).or_default();
    let before = records.len();
    records.retain(|record| record.id != id);
    if records.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

async fn generate(State(backend): State<FakeBackend>, mut multipart: Multipart) -> Response {
    let mut upload = ReceivedUpload::default();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => return (StatusCode::BAD_REQUEST, error.to_string()).into_response(),
        };
        let name = field.name().unwrap_or_default().to_owned();
        if name == "docx_file" {
            upload.file_name = field.file_name().map(ToOwned::to_owned);
        } else {
            let value = match field.text().await {
                Ok(value) => value,
                Err(error) => return (StatusCode::BAD_REQUEST, error.to_string()).into_response(),
            };
            match name.as_str() {
                "invigilators" => upload.invigilators = Some(value),
                "venues" => upload.venues = Some(value),
                _ => {}
            }
        }
        upload.fields.push(name);
    }
    let reply = {
        let mut inner = backend.lock();
        inner.uploads.push(upload);
        inner.reply.clone()
    };
    match reply {
        TimetableReply::Pdf(bytes) => ([(CONTENT_TYPE, "application/pdf")], bytes).into_response(),
        TimetableReply::Document { content_type, body } => {
            ([(CONTENT_TYPE, content_type)], body).into_response()
        }
        TimetableReply::Json { status, body } => (status, Json(body)).into_response(),
        TimetableReply::Text { status, body } => (status, body).into_response(),
    }
}
