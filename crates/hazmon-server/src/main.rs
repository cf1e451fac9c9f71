use anyhow::Result;
use chrono::Utc;
use hazmon_feeds::seismic::SeismicClient;
use hazmon_feeds::weather::WeatherClient;
use hazmon_server::app;
use hazmon_server::auth;
use hazmon_server::config::ServerConfig;
use hazmon_server::scheduler::seismic::SeismicPoller;
use hazmon_server::scheduler::weather::WeatherPoller;
use hazmon_server::seed;
use hazmon_server::state::AppState;
use hazmon_storage::Store;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::EnvFilter;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  hazmon-server [config.toml]    Start the server (default config/server.toml)");
}

#[tokio::main]
async fn main() -> Result<()> {
    hazmon_common::id::init(1, 1);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hazmon=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();
    match args.get(1).map(|s| s.as_str()) {
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        other => {
            let config_path = other.unwrap_or("config/server.toml");
            run_server(config_path).await
        }
    }
}

async fn run_server(config_path: &str) -> Result<()> {
    let config = ServerConfig::load(config_path)?;

    tracing::info!(
        http_port = config.http_port,
        db = %config.database.url,
        "hazmon-server starting"
    );

    let store = Arc::new(Store::new(&config.database.url).await?);

    // Seed the poll interval settings and the default admin account
    if let Err(e) = seed::init_default_settings(&store).await {
        tracing::error!(error = %e, "Failed to seed default settings");
    }
    if let Err(e) = seed::ensure_default_admin(
        &store,
        &config.auth.default_admin_email,
        &config.auth.default_admin_password,
    )
    .await
    {
        tracing::error!(error = %e, "Failed to create default admin account");
    }

    // JWT secret: use configured value or generate a random one
    let jwt_secret = match &config.auth.jwt_secret {
        Some(secret) => Arc::new(secret.clone()),
        None => {
            tracing::warn!(
                "No jwt_secret configured. A random secret was generated and will change on \
                 restart. Set [auth].jwt_secret in config for production use."
            );
            Arc::new(auth::generate_secret())
        }
    };

    let weather = Arc::new(WeatherClient::new(&config.feeds)?);
    let seismic = Arc::new(SeismicClient::new(&config.feeds)?);

    let state = AppState {
        store: store.clone(),
        weather: weather.clone(),
        seismic: seismic.clone(),
        refire_policy: config.alerting.refire_policy,
        start_time: Utc::now(),
        jwt_secret,
        token_expire_secs: config.auth.token_expire_secs,
        config: Arc::new(config.clone()),
    };

    // Pollers, one task per feed
    let weather_handle = if config.poller.weather_enabled {
        let poller = WeatherPoller::new(
            store.clone(),
            weather,
            config.alerting.refire_policy,
            config.poller.max_concurrent_fetches,
        );
        Some(tokio::spawn(async move {
            poller.run().await;
        }))
    } else {
        tracing::info!("Weather poller disabled");
        None
    };

    let seismic_handle = if config.poller.earthquake_enabled {
        let poller = SeismicPoller::new(store.clone(), seismic, config.alerting.refire_policy);
        Some(tokio::spawn(async move {
            poller.run().await;
        }))
    } else {
        tracing::info!("Seismic poller disabled");
        None
    };

    // HTTP server
    let http_addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    let app = app::build_http_app(state);

    tracing::info!(http = %http_addr, "Server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
        })
        .await?;

    tracing::info!("Shutting down gracefully");
    if let Some(handle) = weather_handle {
        handle.abort();
    }
    if let Some(handle) = seismic_handle {
        handle.abort();
    }
    tracing::info!("Server stopped");

    Ok(())
}
