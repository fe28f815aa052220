use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pulse_auth::{LogDelivery, OtpService, TokenIssuer};
use pulse_billing::{BillingService, SandboxGateway};
use pulse_core::config::PortalConfig;
use pulse_axum::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = PortalConfig::new();
    config.set("http.host", "127.0.0.1");
    config.set("http.port", "3030");
    config.set("database.url", "sqlite://pulse.db?mode=rwc");
    config.load_env();
    let config = config.snapshot();

    let db = pulse_store::connect(
        config
            .get("database.url")
            .unwrap_or("sqlite://pulse.db?mode=rwc"),
    )
    .await?;
    pulse_store::init_schema(&db).await?;

    let secret = config
        .get_string("auth.token_secret")
        .unwrap_or_else(|| "dev-secret-change-me".to_string());
    let ttl = config.get_u64("auth.token_ttl_secs").unwrap_or(24 * 3600);
    let tokens = TokenIssuer::new(secret, Duration::from_secs(ttl));

    let otp = Arc::new(OtpService::new(
        db.clone(),
        Arc::new(LogDelivery),
        tokens.clone(),
    ));
    let billing = Arc::new(BillingService::new(
        db.clone(),
        Arc::new(SandboxGateway::default()),
    ));

    let state = AppState::new(db, config.clone(), otp, billing, tokens);
    let router = pulse_axum::router(state);

    let host = config
        .get_string("http.host")
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let port = config
        .get_string("http.port")
        .unwrap_or_else(|| "3030".to_string());
    let addr = format!("{host}:{port}");

    println!("[pulse] listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
