use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use termas_server::config::Config;
use termas_server::jobs::spawn_expiry_sweeper;
use termas_server::notifications::{LogMailer, Mailer, SmtpMailer};
use termas_server::routes::create_routes;
use termas_server::state::AppState;

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("termas_server=info,tower_http=info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Failed to connect to database: {e}");
            process::exit(1);
        }
    };
    tracing::info!("Successfully connected to database");

    if let Err(e) = sqlx::migrate!().run(&pool).await {
        tracing::error!("Failed to run migrations: {e}");
        process::exit(1);
    }
    tracing::info!("Migrations run successfully");

    let mailer: Arc<dyn Mailer> = match &config.smtp {
        Some(smtp) => match SmtpMailer::new(smtp, config.mail_from.clone()) {
            Ok(mailer) => Arc::new(mailer),
            Err(e) => {
                tracing::error!("Invalid SMTP settings: {e}");
                process::exit(1);
            }
        },
        None => {
            tracing::warn!("SMTP not configured, emails will only be logged");
            Arc::new(LogMailer)
        }
    };

    let addr = config.bind_addr;
    let state = AppState::new(pool, config, mailer);
    spawn_expiry_sweeper(state.clone());
    let app = create_routes(state);

    let listener = match TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {addr}: {e}");
            process::exit(1);
        }
    };
    tracing::info!("Server running at http://{}", addr);

    if let Err(e) = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await {
        tracing::error!("Server failed: {e}");
        process::exit(1);
    }
}
