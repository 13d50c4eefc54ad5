mod config;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use async_graphql_axum::GraphQLSubscription;
use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use riverlog_api::mail::{DisabledMailer, Mailer, SmtpMailer};
use riverlog_api::schema::build_schema;
use riverlog_api::state::{AppState, AppStateInner};
use riverlog_db::Database;
use riverlog_gateway::EventBus;

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "riverlog=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    if config.uses_default_secret() {
        warn!("RIVERLOG_JWT_SECRET is unset, signing tokens with the development secret");
    }

    let db = Arc::new(Database::open(&config.db_path)?);

    let mailer: Arc<dyn Mailer> = match &config.mail {
        Some(mail) => Arc::new(SmtpMailer::new(mail)?),
        None => {
            warn!("MAIL_HOST is unset, password reset mail is disabled");
            Arc::new(DisabledMailer)
        }
    };

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret.clone(),
        bus: EventBus::new(),
        mailer,
    });
    let schema = build_schema(app_state);

    let app = Router::new()
        .route("/graphql", get(routes::graphiql).post(routes::graphql))
        .route_service("/subscriptions", GraphQLSubscription::new(schema.clone()))
        .route("/health", get(routes::health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(schema);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Riverlog server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Riverlog server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
