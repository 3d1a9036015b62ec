//! HTTP server wiring: application state, router, background sweep tasks,
//! and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth;
use crate::config::AppConfig;
use crate::db;
use crate::handlers;
use crate::ingest::CallbackProcessor;
use crate::provider::ProviderClient;
use crate::resilience::RetryPolicy;
use crate::sinks::{Notifier, SheetExporter};
use crate::sweep::Sweeper;
use crate::telemetry;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub provider: ProviderClient,
    pub processor: CallbackProcessor,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::root,
        handlers::health,
        handlers::callbacks::process_job,
        handlers::schedules::create_schedule,
        handlers::schedules::delete_schedule,
        handlers::products::create_product_mappings,
    ),
    components(schemas(
        handlers::ServiceInfo,
        handlers::callbacks::JobCallbackRequest,
        handlers::schedules::CreateScheduleRequest,
        handlers::schedules::ScheduleResponse,
        handlers::products::ProductMappingItem,
        handlers::products::ProductMappingBatchResponse,
        crate::error::ApiError,
        crate::provider::types::JobStatus,
        crate::provider::types::ScheduleFrequency,
    )),
    tags(
        (name = "root", description = "Service metadata"),
        (name = "callbacks", description = "Provider job callbacks"),
        (name = "schedules", description = "Scrape schedule management"),
        (name = "products", description = "Product mapping management"),
    )
)]
pub struct ApiDoc;

/// Builds the shared state and the background sweeper from one HTTP client.
pub fn build_components(config: Arc<AppConfig>, db: DatabaseConnection) -> (AppState, Sweeper) {
    let http = reqwest::Client::new();
    let policy = RetryPolicy::from_config(&config.retry);

    let provider = ProviderClient::new(http.clone(), config.provider.clone(), policy.clone());
    let notifier = Notifier::new(
        http.clone(),
        config.notify_webhook_url.clone(),
        policy.clone(),
    );
    let processor = CallbackProcessor::new(provider.clone(), notifier.clone(), db.clone());
    let sheet = SheetExporter::new(http.clone(), config.sheet_exporter_url.clone(), policy.clone());

    let sweeper = Sweeper::new(
        db.clone(),
        http,
        config.analytics.clone(),
        sheet,
        notifier,
        processor.clone(),
        policy,
        Duration::from_secs(config.sweep.push_interval_seconds),
        Duration::from_secs(config.sweep.maintenance_interval_seconds),
    );

    let state = AppState {
        config,
        db,
        provider,
        processor,
    };

    (state, sweeper)
}

/// Builds the API router. Admin endpoints sit behind the API key; the job
/// callback, root, health and OpenAPI surfaces stay open.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/schedule",
            post(handlers::schedules::create_schedule)
                .delete(handlers::schedules::delete_schedule),
        )
        .route(
            "/product_mapping",
            post(handlers::products::create_product_mappings),
        )
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/process_job", post(handlers::callbacks::process_job))
        .merge(protected)
        .layer(middleware::from_fn(telemetry::trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Runs the service until a shutdown signal arrives.
pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let config = Arc::new(config);

    telemetry::init_tracing(&config)?;
    tracing::info!(config = %config.redacted_json()?, "Starting review-relay");

    let database = db::init_pool(&config).await?;
    Migrator::up(&database, None).await?;

    let (state, sweeper) = build_components(Arc::clone(&config), database);

    let cancel = CancellationToken::new();
    let push_task = tokio::spawn(sweeper.clone().run_push_loop(cancel.clone()));
    let maintenance_task = tokio::spawn(sweeper.run_maintenance_loop(cancel.clone()));

    let addr = config.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cancel.cancel();
    let _ = tokio::join!(push_task, maintenance_task);

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
