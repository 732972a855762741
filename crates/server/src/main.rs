//! Haven server entry point.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use haven_api::{
    BroadcastEventPublisher, StreamingState, middleware::AppState, router as api_router,
    streaming_handler,
};
use haven_common::{Config, ReportCipher};
use haven_core::{
    AlertDispatcher, EmailService, EscalationScanner, MediaService, NotificationBuffer,
    ReportService, SmsService,
};
use haven_db::repositories::{MediaRepository, ReportRepository};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
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
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Periodic escalation sweep.
///
/// The scanner only finds overdue reports; this task is the collaborator
/// that decides to transition them and re-trigger the dispatcher.
async fn escalation_sweep(
    scanner: EscalationScanner,
    report_service: ReportService,
    interval_minutes: u64,
) {
    let mut interval = tokio::time::interval(Duration::from_secs(interval_minutes * 60));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let overdue = match scanner.find_needing_escalation().await {
            Ok(hits) => hits,
            Err(e) => {
                error!(error = %e, "Escalation scan failed");
                continue;
            }
        };

        for report in overdue {
            match report_service.escalate(&report.id).await {
                Ok((escalated, _summary)) => {
                    warn!(
                        report_id = %escalated.id,
                        short_id = %escalated.short_id,
                        "Escalated overdue report"
                    );
                }
                Err(e) => {
                    error!(report_id = %report.id, error = %e, "Failed to escalate report");
                }
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "haven=debug,tower_http=debug".into()),
        )
        .init();

    dotenvy::dotenv().ok();

    info!("Starting haven server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database and run migrations
    let db = haven_db::init(&config).await?;
    info!("Connected to database");

    info!("Running database migrations...");
    haven_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let report_repo = ReportRepository::new(Arc::clone(&db));
    let media_repo = MediaRepository::new(Arc::clone(&db));

    // Initialize services with process-wide lifecycle; everything is
    // constructed once here and injected explicitly.
    let cipher = Arc::new(ReportCipher::from_hex_key(&config.encryption.key)?);

    let streaming = StreamingState::new();
    let publisher = Arc::new(BroadcastEventPublisher::new(streaming.clone()));

    let notification_buffer = NotificationBuffer::new(config.notifications.buffer_capacity);

    let sms_service = SmsService::new(config.alerts.sms.clone());
    let email_service = EmailService::new(config.alerts.email.clone())?;
    if !sms_service.is_enabled() {
        warn!("SMS channel not configured; urgent SMS alerts disabled");
    }
    if !email_service.is_enabled() {
        warn!("Email channel not configured; urgent email alerts disabled");
    }

    let alert_dispatcher = AlertDispatcher::new(
        publisher,
        notification_buffer.clone(),
        sms_service,
        email_service,
        config.alerts.admin_phone.clone(),
        config.alerts.admin_email.clone(),
    );

    let report_service = ReportService::new(
        report_repo.clone(),
        cipher,
        alert_dispatcher.clone(),
    );
    let media_service = MediaService::new(
        media_repo,
        config.media.chunk_size,
        config.media.max_size,
    );
    let escalation_scanner = EscalationScanner::new(
        report_repo,
        config.notifications.escalation_threshold_hours,
    );

    // Spawn the periodic escalation sweep
    tokio::spawn(escalation_sweep(
        escalation_scanner.clone(),
        report_service.clone(),
        config.notifications.escalation_sweep_minutes,
    ));

    let state = AppState {
        report_service,
        media_service,
        escalation_scanner,
        alert_dispatcher,
        notification_buffer,
        streaming,
        admin_token: config.server.admin_token.clone(),
    };

    if state.admin_token.is_none() {
        warn!("No admin token configured; admin and polling routes are disabled");
    }

    let app = Router::new()
        .route("/", get(health))
        .nest("/api", api_router())
        .route("/streaming", get(streaming_handler))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn health() -> &'static str {
    "haven is running\n"
}
