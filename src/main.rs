use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};

use exampay::config::Config;
use exampay::db::{self, AppState, queries};
use exampay::finance::{PricingConfig, PricingEngine};
use exampay::models::{CreateUser, UserRole, UserType};
use exampay::payments::ZarinpalClient;

#[derive(Parser)]
#[command(name = "exampay", about = "Exam marketplace pricing and payments service")]
struct Cli {
    /// Override the listen host from the environment
    #[arg(long)]
    host: Option<String>,
    /// Override the listen port from the environment
    #[arg(long)]
    port: Option<u16>,
    /// Override the database path from the environment
    #[arg(long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,exampay=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(database) = cli.database {
        config.database_path = database;
    }

    if config.dev_mode {
        tracing::warn!("Running in dev mode: /dev endpoints are enabled");
    }

    let pool = db::init_pool(&config.database_path)?;
    bootstrap_admin(&pool, &config)?;

    let state = AppState {
        db: pool,
        pricing: PricingEngine::new(PricingConfig::default()),
        gateway: ZarinpalClient::new(&config.gateway_merchant_id, &config.gateway_base_url),
        base_url: config.base_url.clone(),
        success_page_url: config.success_page_url.clone(),
        payment_link_ttl_secs: config.payment_link_ttl_secs,
        dev_mode: config.dev_mode,
    };

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(50)
            .finish()
            .expect("valid rate limit config"),
    );

    let app = exampay::app(state).layer(GovernorLayer::new(governor_conf));

    let listener = tokio::net::TcpListener::bind(&config.addr()).await?;
    tracing::info!("exampay listening on {}", config.addr());

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Create the first admin account when BOOTSTRAP_ADMIN_EMAIL is set and no
/// users exist yet. The API key is logged once and never recoverable.
fn bootstrap_admin(pool: &db::DbPool, config: &Config) -> anyhow::Result<()> {
    let Some(email) = &config.bootstrap_admin_email else {
        return Ok(());
    };

    let conn = pool.get()?;
    if queries::get_user_by_email(&conn, email)?.is_some() {
        return Ok(());
    }

    let (admin, api_key) = queries::create_user(
        &conn,
        &CreateUser {
            email: email.clone(),
            name: "Bootstrap Admin".to_string(),
            user_type: UserType::Regular,
        },
        UserRole::Admin,
    )?;

    tracing::warn!(
        "Bootstrapped admin {} ({}) with API key: {} — store it now, it will not be shown again",
        admin.email,
        admin.id,
        api_key,
    );

    Ok(())
}
