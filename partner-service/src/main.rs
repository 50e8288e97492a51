use partner_service::{
    build_router,
    config::PartnerConfig,
    db,
    services::{metrics, AuditRecorder, Database, SystemClock},
    utils::Password,
    AppState,
};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;

const AUDIT_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // Load configuration - fail fast if invalid
    let config = PartnerConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    );

    metrics::init_metrics()
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to init metrics: {}", e)))?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
        "Starting partner service"
    );

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;
    let database = Arc::new(Database::new(pool));
    tracing::info!("Database initialized successfully");

    let clock = Arc::new(
        SystemClock::new(config.partner.contract_utc_offset_hours).map_err(AppError::ConfigError)?,
    );

    let shutdown = CancellationToken::new();
    let (audit, audit_writer) = AuditRecorder::spawn(
        database.clone(),
        config.partner.audit_queue_capacity,
        shutdown.clone(),
    );
    tracing::info!(
        capacity = config.partner.audit_queue_capacity,
        "Audit writer started"
    );

    let state = AppState::new(
        config.clone(),
        database.clone(),
        database.clone(),
        database,
        clock,
        audit,
    )?;

    if let Some(bootstrap) = &config.bootstrap_admin {
        let created = state
            .sessions
            .ensure_superadmin(
                &bootstrap.username,
                Password::new(bootstrap.password.expose_secret().clone()),
            )
            .await?;
        if created {
            tracing::info!(username = %bootstrap.username, "Bootstrap admin ready");
        }
    }

    let app = build_router(state).await?;

    let addr = config.common.socket_addr();

    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
        environment = ?config.environment,
    );
    let _guard = service_span.enter();

    tracing::info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Requests are done; let the audit writer flush what is queued.
    shutdown.cancel();
    match tokio::time::timeout(AUDIT_DRAIN_TIMEOUT, audit_writer).await {
        Ok(Ok(())) => tracing::info!("Audit queue drained"),
        Ok(Err(e)) => tracing::error!(error = %e, "Audit writer task failed"),
        Err(_) => tracing::warn!("Audit queue not drained before timeout"),
    }

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
