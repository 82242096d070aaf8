use applyflow::application::attachments::AttachmentSlot;
use applyflow::application::memory::{
    MemoryProfiles, MemorySnapshots, MemoryStore, TracingNotifier,
};
use applyflow::application::{
    application_router, score, ApplicationService, AttachmentStaging, Draft, StudentProfile,
    UserContext, UserId,
};
use applyflow::config::AppConfig;
use applyflow::error::AppError;
use applyflow::telemetry;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone)]
struct OpsState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "applyflow",
    about = "Run the application draft and submission engine from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a draft JSON file against the required-field checklist
    Score(ScoreArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    /// Path to a draft record in JSON form
    draft: PathBuf,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Score(args) => run_score(args),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let user = UserContext {
        user_id: UserId("demo-student".to_string()),
        email: "demo.student@example.edu".to_string(),
        authenticated: true,
    };
    let profiles = MemoryProfiles::with_profile(
        &user,
        StudentProfile {
            full_name: "Demo Student".to_string(),
            email: user.email.clone(),
            phone: String::new(),
            date_of_birth: None,
            gender: String::new(),
            institution: "Example Institute of Technology".to_string(),
            program: "Computer Science".to_string(),
        },
    );

    let mut service = ApplicationService::new(
        Arc::new(MemoryStore::default()),
        Arc::new(profiles),
        Arc::new(MemorySnapshots::default()),
        Arc::new(TracingNotifier),
        config.engine.clone(),
        user,
    );
    // Seed the draft before the first request so the UI sees profile
    // defaults immediately. The store is in-memory, so this cannot fail
    // with anything but a missing profile.
    if let Err(err) = service.load().await {
        info!(error = %err, "initial load skipped");
    }
    let service = Arc::new(Mutex::new(service));

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = OpsState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(application_router(service))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "application engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let raw = std::fs::read(&args.draft)?;
    let draft: Draft = serde_json::from_slice(&raw).map_err(AppError::Encode)?;

    let staging = AttachmentStaging {
        identity: AttachmentSlot::from_persisted_field(&draft.identity_proof.document_image),
        college_id: AttachmentSlot::from_persisted_field(&draft.college_id_proof.document_image),
    };
    let report = score(&draft, &staging);

    let rendered = serde_json::to_string_pretty(&report).map_err(AppError::Encode)?;
    println!("{rendered}");
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<OpsState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(json!({ "ready": ready })))
}

async fn metrics_endpoint(State(state): State<OpsState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        state.metrics.render(),
    )
}
