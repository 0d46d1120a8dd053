use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use exam_timetable_client::{NamedRecord, ReferenceDataClient, ResourceKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;
use crate::session::Session;
use crate::templating::render;

#[derive(Deserialize)]
pub struct ListQuery {
    tab: Option<ResourceKind>,
}

#[derive(Deserialize)]
pub struct NamePayload {
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
pub struct DeletePayload {
    #[serde(default)]
    confirm: String,
}

#[derive(Serialize)]
struct Tab {
    kind: ResourceKind,
    title: &'static str,
    active: bool,
}

#[derive(Serialize)]
struct ListPage {
    tabs: Vec<Tab>,
    kind: ResourceKind,
    title: &'static str,
    singular: &'static str,
    records: Vec<NamedRecord>,
    error: Option<String>,
}

#[derive(Serialize)]
struct RecordFormPage {
    kind: ResourceKind,
    heading: String,
    action: String,
    name: String,
    error: Option<String>,
}

#[derive(Serialize)]
struct ConfirmDeletePage {
    kind: ResourceKind,
    singular: &'static str,
    record: NamedRecord,
}

const fn capitalized(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Invigilators => "Invigilator",
        ResourceKind::Venues => "Venue",
    }
}

fn list_location(kind: ResourceKind) -> Redirect {
    Redirect::to(&format!("/admin?tab={kind}"))
}

/// Sends visitors without a session to the login page.
fn require_login(session: &Session) -> Option<Response> {
    (!session.is_authenticated()).then(|| Redirect::to("/login").into_response())
}

async fn render_list(
    reference_data: &ReferenceDataClient,
    session: &Session,
    kind: ResourceKind,
    error: Option<String>,
) -> Result<Response, AppError> {
    let (records, error) = match reference_data.list(kind).await {
        Ok(records) => (records, error),
        Err(fetch_error) => (Vec::new(), error.or_else(|| Some(fetch_error.to_string()))),
    };
    Ok(render(
        session,
        "admin",
        ListPage {
            tabs: ResourceKind::ALL
                .into_iter()
                .map(|tab| Tab {
                    kind: tab,
                    title: tab.title(),
                    active: tab == kind,
                })
                .collect(),
            kind,
            title: kind.title(),
            singular: kind.singular(),
            records,
            error,
        },
    )?
    .into_response())
}

fn render_form(
    session: &Session,
    kind: ResourceKind,
    id: Option<i64>,
    name: String,
    error: Option<String>,
) -> Result<Response, AppError> {
    let (heading, action) = match id {
        Some(id) => (
            format!("Edit {}", capitalized(kind)),
            format!("/admin/{kind}/{id}"),
        ),
        None => (
            format!("Add New {}", capitalized(kind)),
            format!("/admin/{kind}"),
        ),
    };
    Ok(render(
        session,
        "record-form",
        RecordFormPage {
            kind,
            heading,
            action,
            name,
            error,
        },
    )?
    .into_response())
}

async fn existing(
    reference_data: &ReferenceDataClient,
    kind: ResourceKind,
    id: i64,
) -> Result<NamedRecord, AppError> {
    reference_data
        .find(kind, id)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn list(
    State(reference_data): State<ReferenceDataClient>,
    session: Session,
    Query(query): Query<ListQuery>,
) -> Result<Response, AppError> {
    if let Some(redirect) = require_login(&session) {
        return Ok(redirect);
    }
    let kind = query.tab.unwrap_or(ResourceKind::Invigilators);
    render_list(&reference_data, &session, kind, None).await
}

pub async fn new_record(
    session: Session,
    Path(kind): Path<ResourceKind>,
) -> Result<Response, AppError> {
    if let Some(redirect) = require_login(&session) {
        return Ok(redirect);
    }
    render_form(&session, kind, None, String::new(), None)
}

pub async fn create(
    State(reference_data): State<ReferenceDataClient>,
    session: Session,
    Path(kind): Path<ResourceKind>,
    Form(payload): Form<NamePayload>,
) -> Result<Response, AppError> {
    if let Some(redirect) = require_login(&session) {
        return Ok(redirect);
    }
    match reference_data.create(kind, &payload.name).await {
        Ok(()) => Ok(list_location(kind).into_response()),
        Err(error) => {
            warn!(%kind, %error, "could not create record");
            render_form(&session, kind, None, payload.name, Some(error.to_string()))
        }
    }
}

pub async fn edit_record(
    State(reference_data): State<ReferenceDataClient>,
    session: Session,
    Path((kind, id)): Path<(ResourceKind, i64)>,
) -> Result<Response, AppError> {
    if let Some(redirect) = require_login(&session) {
        return Ok(redirect);
    }
    let record = existing(&reference_data, kind, id).await?;
    render_form(&session, kind, Some(id), record.name, None)
}

pub async fn update(
    State(reference_data): State<ReferenceDataClient>,
    session: Session,
    Path((kind, id)): Path<(ResourceKind, i64)>,
    Form(payload): Form<NamePayload>,
) -> Result<Response, AppError> {
    if let Some(redirect) = require_login(&session) {
        return Ok(redirect);
    }
    match reference_data.update(kind, id, &payload.name).await {
        Ok(()) => Ok(list_location(kind).into_response()),
        Err(error) => {
            warn!(%kind, id, %error, "could not update record");
            render_form(&session, kind, Some(id), payload.name, Some(error.to_string()))
        }
    }
}

pub async fn confirm_delete(
    State(reference_data): State<ReferenceDataClient>,
    session: Session,
    Path((kind, id)): Path<(ResourceKind, i64)>,
) -> Result<Response, AppError> {
    if let Some(redirect) = require_login(&session) {
        return Ok(redirect);
    }
    let record = existing(&reference_data, kind, id).await?;
    Ok(render(
        &session,
        "confirm-delete",
        ConfirmDeletePage {
            kind,
            singular: kind.singular(),
            record,
        },
    )?
    .into_response())
}

/// Only deletes when the confirmation form was submitted with `confirm=yes`.
pub async fn delete(
    State(reference_data): State<ReferenceDataClient>,
    session: Session,
    Path((kind, id)): Path<(ResourceKind, i64)>,
    Form(payload): Form<DeletePayload>,
) -> Result<Response, AppError> {
    if let Some(redirect) = require_login(&session) {
        return Ok(redirect);
    }
    if payload.confirm != "yes" {
        return Ok(list_location(kind).into_response());
    }
    match reference_data.delete(kind, id).await {
        Ok(()) => Ok(list_location(kind).into_response()),
        Err(error) => {
            warn!(%kind, id, %error, "could not delete record");
            render_list(&reference_data, &session, kind, Some(error.to_string())).await
        }
    }
}
