use std::sync::Arc;
use std::time::Duration;

use tech_catalog_api::auth::otp::OtpStore;
use tech_catalog_api::config::AppConfig;
use tech_catalog_api::state::AppState;
use tech_catalog_api::{database, mail, routes};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tech_catalog_api=info,tower_http=info".into()),
        )
        .init();

    // Secrets and connection parameters come from the environment only;
    // refuse to start without them.
    let config = match AppConfig::from_env() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            eprintln!("configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match database::connect(&config.database) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("database setup error: {}", e);
            std::process::exit(1);
        }
    };

    let mailer = match mail::from_config(&config.mail) {
        Ok(mailer) => mailer,
        Err(e) => {
            eprintln!("mail transport error: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        pool,
        otp: OtpStore::new(Duration::from_secs(config.otp_ttl_secs)),
        mailer,
        config: config.clone(),
    };

    let app = routes::app(state);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("tech-catalog-api listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
