mod core;
mod features;
mod shared;

use crate::core::config::Config;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::activities::{
    routes as activities_routes, ActivityLogger, ActivityService, ActivityWorker,
    PgActivityRepository,
};
use crate::features::auth::JwtValidator;
use crate::features::backups::{routes as backups_routes, BackupService, MaintenanceWorker};
use crate::features::customers::{routes as customers_routes, CustomerService, PgCustomerRepository};
use crate::features::exports::{routes as exports_routes, ExportService};
use crate::features::imports::{routes as imports_routes, ImportService};
use crate::features::notes::PgNoteRepository;
use crate::features::notifications::{HttpMailer, LogMailer, Mailer, NotificationService};
use crate::features::tickets::{routes as tickets_routes, PgTicketRepository, TicketService};
use crate::features::users::{PgUserRepository, UserRepository};
use axum::{extract::DefaultBodyLimit, middleware::from_fn, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    let available_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    tracing::info!(
        "System info: available_cpus={}, tokio_worker_threads={}, pid={}",
        available_cpus,
        worker_threads,
        std::process::id()
    );

    tracing::info!("Configuration loaded successfully");

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    database::run_migrations(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let jwt_validator = Arc::new(JwtValidator::new(
        &config.auth.jwt_secret,
        config.auth.jwt_leeway,
    ));
    tracing::info!("Auth configuration initialized");

    // Repositories
    let customer_repository = Arc::new(PgCustomerRepository::new(pool.clone()));
    let ticket_repository = Arc::new(PgTicketRepository::new(pool.clone()));
    let note_repository = Arc::new(PgNoteRepository::new(pool.clone()));
    let user_repository: Arc<dyn UserRepository> = Arc::new(PgUserRepository::new(pool.clone()));
    let activity_repository = Arc::new(PgActivityRepository::new(pool.clone()));

    // Activity log: handlers enqueue, a single worker persists
    let (activity_logger, activity_rx) =
        ActivityLogger::channel(config.maintenance.activity_channel_capacity);
    let activity_worker = ActivityWorker::new(activity_rx, activity_repository.clone());
    tokio::spawn(async move {
        activity_worker.run().await;
    });
    tracing::info!("Activity worker spawned");

    let mailer: Arc<dyn Mailer> = match config.mail.relay_url.clone() {
        Some(url) => {
            tracing::info!("Email notifications via relay {}", url);
            Arc::new(HttpMailer::new(url, config.mail.relay_token.clone()))
        }
        None => {
            tracing::warn!("MAIL_RELAY_URL not set, notification emails will only be logged");
            Arc::new(LogMailer)
        }
    };
    let notification_service = Arc::new(
        NotificationService::new(mailer, config.mail.from.clone())
            .map_err(|e| anyhow::anyhow!("Failed to initialize notifications: {}", e))?,
    );
    tracing::info!("Notification service initialized");

    let customer_service = Arc::new(CustomerService::new(
        customer_repository.clone(),
        ticket_repository.clone(),
        note_repository.clone(),
        user_repository.clone(),
        activity_logger.clone(),
    ));
    tracing::info!("Customer service initialized");

    let ticket_service = Arc::new(TicketService::new(
        ticket_repository.clone(),
        customer_repository.clone(),
        user_repository.clone(),
        note_repository.clone(),
        activity_logger.clone(),
        Arc::clone(&notification_service),
    ));
    tracing::info!("Ticket service initialized");

    let activity_service = Arc::new(ActivityService::new(activity_repository));
    tracing::info!("Activity service initialized");

    let import_service = Arc::new(ImportService::new(
        Arc::clone(&customer_service),
        activity_logger.clone(),
    ));
    tracing::info!("Import service initialized");

    let export_service = Arc::new(ExportService::new(
        customer_repository,
        ticket_repository,
        note_repository,
        user_repository.clone(),
        activity_logger,
    ));
    tracing::info!("Export service initialized");

    let backup_service = Arc::new(BackupService::new(
        Arc::clone(&export_service),
        user_repository.clone(),
        config.maintenance.backup_dir.clone(),
    ));
    tracing::info!(
        "Backup service initialized (dir: {})",
        config.maintenance.backup_dir.display()
    );

    let maintenance_worker = MaintenanceWorker::new(
        Arc::clone(&backup_service),
        Arc::clone(&activity_service),
        config.maintenance.interval,
        config.maintenance.backup_retention_days,
        config.maintenance.activity_retention_days,
    );
    tokio::spawn(async move {
        maintenance_worker.run().await;
    });
    tracing::info!("Maintenance worker spawned");

    // Build application router with dynamic swagger config
    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn(middleware::basic_auth_middleware(Arc::new(
                credentials,
            ))))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Protected routes (require JWT authentication)
    let mut protected_routes = Router::new()
        .merge(imports_routes::routes(import_service))
        .merge(customers_routes::routes(customer_service))
        .merge(tickets_routes::routes(ticket_service))
        .merge(activities_routes::routes(activity_service))
        .merge(backups_routes::routes(backup_service))
        .merge(exports_routes::routes(export_service));

    // Layered before the JWT check so it runs after it
    if config.auth.require_verified_user {
        protected_routes = protected_routes.route_layer(axum::middleware::from_fn_with_state(
            user_repository,
            middleware::verified_user_middleware,
        ));
        tracing::info!("Email verification required for API access");
    }

    let protected_routes = protected_routes.route_layer(axum::middleware::from_fn_with_state(
        jwt_validator,
        middleware::auth_middleware,
    ));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(protected_routes)
        .merge(health_route)
        .layer(DefaultBodyLimit::max(config.app.max_request_body_size))
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    // Start server
    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    // Use socket2 for TCP listener configuration
    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    socket.set_recv_buffer_size(256 * 1024)?;
    socket.set_send_buffer_size(256 * 1024)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on {}", format!("http://{}", addr));
    tracing::info!(
        "Swagger UI available at {}",
        format!("http://{}/swagger-ui/", addr)
    );

    axum::serve(listener, app).await?;

    Ok(())
}
