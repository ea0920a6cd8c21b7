mod action;
mod app;
mod app_state;
mod component;
mod components;
mod focus;
mod theme;
mod widgets;

use tfscan_proto::client::ApiClient;
use tfscan_proto::config::Config;
use tfscan_proto::platform;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = platform::log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // Config first: its [log] filter is the default when RUST_LOG is unset.
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("tfscan: ignoring config ({:#}), using defaults", e);
            let mut config = Config::default();
            config.apply_env(std::env::var(tfscan_proto::config::API_URL_ENV).ok());
            config
        }
    };

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log.filter.clone());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    eprintln!("tfscan log: {}", log_path.display());
    tracing::info!(
        "tfscan starting, service {} (config {})",
        config.api.base_url,
        Config::config_path().display()
    );

    let client = ApiClient::new(&config.api)?;
    app::App::new(&config, client).run().await?;

    Ok(())
}
