use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::Form;
use exam_timetable_client::timetable::FIELD_DOCX_FILE;
use exam_timetable_client::{
    DocxFile, NameInput, NamedRecord, ReferenceDataClient, ResourceKind, Step, Wizard,
    WizardError,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::AppError;
use crate::proxy::{ProxyResponse, UploadProxy};
use crate::session::Session;
use crate::templating::render;
use crate::wizard_store::WizardStore;

#[derive(Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Save,
    Next,
    Generate,
}

/// Typed names and ticked records. Ticked records win when both are sent.
#[derive(Deserialize)]
pub struct NamesPayload {
    #[serde(default)]
    names: String,
    #[serde(default)]
    record: Vec<i64>,
    #[serde(default)]
    action: Action,
}

#[derive(Serialize)]
struct StepTab {
    step: Step,
    label: &'static str,
    active: bool,
    enabled: bool,
    complete: bool,
}

#[derive(Serialize)]
struct FileView {
    name: String,
    size_kb: usize,
}

#[derive(Serialize)]
struct Choice {
    id: i64,
    name: String,
    selected: bool,
}

#[derive(Serialize)]
struct NamesView {
    text: String,
    choices: Vec<Choice>,
    choices_error: Option<String>,
    count: usize,
}

#[derive(Serialize)]
struct WizardPage {
    tabs: Vec<StepTab>,
    on_upload: bool,
    on_invigilators: bool,
    on_venues: bool,
    done: bool,
    /// Whether the current page is the last one taking input.
    last_input_step: bool,
    file: Option<FileView>,
    invigilators: Option<NamesView>,
    venues: Option<NamesView>,
    can_generate: bool,
    error: Option<String>,
}

const fn label(step: Step) -> &'static str {
    match step {
        Step::Upload => "Upload Exam Schedule",
        Step::Invigilators => "Invigilators",
        Step::Venues => "Venues",
        Step::Done => "Timetable",
    }
}

fn note<T>(result: Result<T, WizardError>) {
    if let Err(error) = result {
        debug!(%error, "timetable form refused the change");
    }
}

fn wizard_for(store: &WizardStore, session: Session) -> (Session, Arc<Mutex<Wizard>>) {
    let (session, id) = session.wizard_id();
    let wizard = store.get(&id);
    (session, wizard)
}

async fn names_view(
    reference_data: &ReferenceDataClient,
    kind: ResourceKind,
    input: &NameInput,
) -> NamesView {
    let selected = input.selected_ids();
    let (choices, choices_error) = match reference_data.list(kind).await {
        Ok(records) => (
            records
                .into_iter()
                .map(|record| Choice {
                    selected: selected.contains(&record.id),
                    id: record.id,
                    name: record.name,
                })
                .collect(),
            None,
        ),
        Err(error) => (Vec::new(), Some(error.to_string())),
    };
    NamesView {
        text: match input {
            NameInput::Text(text) => text.clone(),
            NameInput::Records(_) => String::new(),
        },
        choices,
        choices_error,
        count: input.count(),
    }
}

/// Resolves ticked ids against the current records, keeping the record order.
async fn name_input(
    reference_data: &ReferenceDataClient,
    kind: ResourceKind,
    payload: NamesPayload,
) -> Result<NameInput, String> {
    if payload.record.is_empty() {
        return Ok(NameInput::Text(payload.names));
    }
    let records: Vec<NamedRecord> = reference_data
        .list(kind)
        .await
        .map_err(|error| error.to_string())?
        .into_iter()
        .filter(|record| payload.record.contains(&record.id))
        .collect();
    Ok(NameInput::Records(records))
}

pub async fn index(
    State(store): State<WizardStore>,
    State(reference_data): State<ReferenceDataClient>,
    session: Session,
) -> Result<Response, AppError> {
    // a visit without a form cookie only looks at an empty form
    let wizard = session
        .existing_wizard_id()
        .and_then(|id| store.existing(&id))
        .unwrap_or_else(|| Arc::new(Mutex::new(Wizard::new(store.variant()))));
    let wizard = wizard.lock().await;
    let step = wizard.step();
    let variant = wizard.variant();
    let invigilators = if step == Step::Invigilators {
        Some(names_view(&reference_data, ResourceKind::Invigilators, wizard.invigilators()).await)
    } else {
        None
    };
    let venues = if step == Step::Venues {
        Some(names_view(&reference_data, ResourceKind::Venues, wizard.venues()).await)
    } else {
        None
    };
    let page = WizardPage {
        tabs: variant
            .input_steps()
            .iter()
            .chain(core::iter::once(&Step::Done))
            .map(|tab| StepTab {
                step: *tab,
                label: label(*tab),
                active: *tab == step,
                enabled: wizard.can_enter(*tab),
                complete: wizard.is_step_complete(*tab),
            })
            .collect(),
        on_upload: step == Step::Upload,
        on_invigilators: step == Step::Invigilators,
        on_venues: step == Step::Venues,
        done: step == Step::Done,
        last_input_step: variant.input_steps().last() == Some(&step),
        file: wizard.file().map(|file| FileView {
            name: file.file_name.clone(),
            size_kb: file.size().div_ceil(1024),
        }),
        invigilators,
        venues,
        can_generate: wizard.build_request().is_ok(),
        error: wizard.error().map(ToOwned::to_owned),
    };
    let html = render(&session, "wizard", page)?;
    Ok((session, html).into_response())
}

pub async fn upload(
    State(store): State<WizardStore>,
    session: Session,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let mut file = None;
    let mut action = Action::Save;
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(ToOwned::to_owned);
        match name.as_deref() {
            Some(FIELD_DOCX_FILE) => {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(ToOwned::to_owned);
                let bytes = field.bytes().await?;
                if !file_name.is_empty() {
                    file = Some(DocxFile {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
            }
            Some("action") => {
                if field.text().await? == "next" {
                    action = Action::Next;
                }
            }
            _ => {}
        }
    }
    let (session, wizard) = wizard_for(&store, session);
    let mut wizard = wizard.lock().await;
    if let Some(file) = file {
        note(wizard.choose_file(file));
    }
    if action == Action::Next {
        note(wizard.next());
    }
    Ok((session, Redirect::to("/")))
}

pub async fn remove_file(State(store): State<WizardStore>, session: Session) -> impl IntoResponse {
    let (session, wizard) = wizard_for(&store, session);
    note(wizard.lock().await.remove_file());
    (session, Redirect::to("/"))
}

pub async fn invigilators(
    State(store): State<WizardStore>,
    State(reference_data): State<ReferenceDataClient>,
    State(proxy): State<Arc<UploadProxy>>,
    session: Session,
    Form(payload): Form<NamesPayload>,
) -> impl IntoResponse {
    let (session, wizard) = wizard_for(&store, session);
    let mut wizard = wizard.lock().await;
    let action = payload.action;
    match name_input(&reference_data, ResourceKind::Invigilators, payload).await {
        Ok(input) => note(wizard.set_invigilators(input)),
        Err(message) => wizard.report(message),
    }
    match action {
        Action::Save => {}
        Action::Next => note(wizard.next()),
        Action::Generate => note(wizard.submit(&*proxy).await),
    }
    (session, Redirect::to("/"))
}

pub async fn venues(
    State(store): State<WizardStore>,
    State(reference_data): State<ReferenceDataClient>,
    State(proxy): State<Arc<UploadProxy>>,
    session: Session,
    Form(payload): Form<NamesPayload>,
) -> impl IntoResponse {
    let (session, wizard) = wizard_for(&store, session);
    let mut wizard = wizard.lock().await;
    let action = payload.action;
    match name_input(&reference_data, ResourceKind::Venues, payload).await {
        Ok(input) => note(wizard.set_venues(input)),
        Err(message) => wizard.report(message),
    }
    match action {
        Action::Save => {}
        Action::Next => note(wizard.next()),
        Action::Generate => note(wizard.submit(&*proxy).await),
    }
    (session, Redirect::to("/"))
}

/// Submits what the form already holds. Used to retry after a failure.
pub async fn generate(
    State(store): State<WizardStore>,
    State(proxy): State<Arc<UploadProxy>>,
    session: Session,
) -> impl IntoResponse {
    let (session, wizard) = wizard_for(&store, session);
    note(wizard.lock().await.submit(&*proxy).await);
    (session, Redirect::to("/"))
}

pub async fn select_step(
    State(store): State<WizardStore>,
    session: Session,
    Path(step): Path<Step>,
) -> impl IntoResponse {
    let (session, wizard) = wizard_for(&store, session);
    note(wizard.lock().await.select_tab(step));
    (session, Redirect::to("/"))
}

pub async fn reset(State(store): State<WizardStore>, session: Session) -> impl IntoResponse {
    let (session, wizard) = wizard_for(&store, session);
    wizard.lock().await.reset();
    (session, Redirect::to("/"))
}

pub async fn download(
    State(store): State<WizardStore>,
    session: Session,
) -> Result<Response, AppError> {
    let wizard = session
        .existing_wizard_id()
        .and_then(|id| store.existing(&id))
        .ok_or(AppError::NotFound)?;
    let wizard = wizard.lock().await;
    let artifact = wizard.artifact().ok_or(AppError::NotFound)?;
    Ok((session, ProxyResponse::Pdf(artifact.bytes.clone())).into_response())
}
