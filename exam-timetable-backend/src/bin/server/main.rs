use exam_timetable_backend::error::AppError;
use exam_timetable_backend::run_server;
use exam_timetable_backend::telemetry::setup_tracing;
use exam_timetable_config::get_config;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    setup_tracing();

    let config = get_config()?;

    run_server(config).await
}
