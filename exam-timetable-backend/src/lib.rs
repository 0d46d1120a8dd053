//! The exam timetable web server: the timetable form, the upload proxy in
//! front of the scheduling backend and the admin pages for invigilators and
//! venues.

pub mod error;
pub mod proxy;
pub mod routes;
pub mod session;
pub mod telemetry;
pub mod templating;
pub mod wizard_store;

use core::future::Future;
use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, FromRef};
use axum::routing::{get, post};
use axum::Router;
use error::AppError;
use exam_timetable_client::proxy::GENERATE_TIMETABLE_PATH;
use exam_timetable_client::{FlowVariant, ReferenceDataClient, TimetableBackend};
use exam_timetable_config::Config;
use proxy::UploadProxy;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, warn};
use wizard_store::WizardStore;

use crate::routes::{admin, generate_timetable, login, wizard};

#[derive(Clone, FromRef)]
pub struct MyState {
    pub proxy: Arc<UploadProxy>,
    pub reference_data: ReferenceDataClient,
    pub wizards: WizardStore,
}

impl MyState {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            proxy: Arc::new(UploadProxy::new(
                TimetableBackend::new(config.timetable_api_url.clone()),
                config.require_venues,
            )),
            reference_data: ReferenceDataClient::new(config.reference_data_url.clone()),
            wizards: WizardStore::new(
                FlowVariant::from_require_venues(config.require_venues),
                config.wizard_idle(),
            ),
        }
    }
}

pub fn routes() -> Router<MyState> {
    Router::new()
        .route("/", get(wizard::index))
        .route("/wizard/upload", post(wizard::upload))
        .route("/wizard/remove-file", post(wizard::remove_file))
        .route("/wizard/invigilators", post(wizard::invigilators))
        .route("/wizard/venues", post(wizard::venues))
        .route("/wizard/generate", post(wizard::generate))
        .route("/wizard/step/:step", get(wizard::select_step))
        .route("/wizard/reset", post(wizard::reset))
        .route("/timetable.pdf", get(wizard::download))
        .route(
            GENERATE_TIMETABLE_PATH,
            post(generate_timetable::generate_timetable),
        )
        .route("/login", get(login::login_page).post(login::login))
        .route("/logout", post(login::logout))
        .route("/admin", get(admin::list))
        .route("/admin/:kind", post(admin::create))
        .route("/admin/:kind/new", get(admin::new_record))
        .route("/admin/:kind/:id", post(admin::update))
        .route("/admin/:kind/:id/edit", get(admin::edit_record))
        .route(
            "/admin/:kind/:id/delete",
            get(admin::confirm_delete).post(admin::delete),
        )
}

pub fn layers(app: Router<MyState>, state: MyState, max_upload_bytes: usize) -> Router<()> {
    // layers are in reverse order
    let app: Router<MyState> = app.layer(DefaultBodyLimit::max(max_upload_bytes));
    let app: Router<()> = app.with_state(state);
    let app = app.layer(
        ServiceBuilder::new()
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::default().include_headers(true))
                    .on_response(DefaultOnResponse::default().include_headers(true)),
            )
            .layer(CatchPanicLayer::new()),
    );
    let app: Router<()> = app.layer(PropagateRequestIdLayer::x_request_id());
    app.layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

#[must_use]
pub fn app(config: &Config) -> Router<()> {
    layers(routes(), MyState::new(config), config.max_upload_bytes)
}

/// Serves until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    config: &Config,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), AppError> {
    if config.uses_placeholder_api_url() {
        warn!(
            url = %config.timetable_api_url,
            "timetable_api_url is not configured, generation requests will fail"
        );
    }
    info!(
        address = %listener.local_addr()?,
        require_venues = config.require_venues,
        "started up server"
    );
    let state = MyState::new(config);
    let sweeper = tokio::spawn(state.wizards.clone().sweep());
    let result = axum::serve(
        listener,
        layers(routes(), state, config.max_upload_bytes).into_make_service(),
    )
    .with_graceful_shutdown(shutdown)
    .await;
    sweeper.abort();
    Ok(result?)
}

pub async fn run_server(config: Config) -> Result<(), AppError> {
    let listener = TcpListener::bind(config.listen_address).await?;
    serve(listener, &config, shutdown_signal()).await
}

#[allow(clippy::redundant_pub_crate)]
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
