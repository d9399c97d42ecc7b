use anyhow::Result;
use clap::Parser;
use log_token_agent::cache::token::CacheKeys;
use log_token_agent::cache::token_cache::InMemoryTokenCache;
use log_token_agent::secrets::store::{ConfiguredSecretStore, SecretKeys};
use log_token_agent::server;
use log_token_agent::sinks::log_sink::LogSink;
use log_token_agent::sources::executor::token_refresh::{RefreshOutcome, RefreshSettings, TokenLifecycleManager};
use log_token_agent::sources::oauth2::TokenExchange;
use log_token_agent::utils::config_loader;
use log_token_agent::utils::logging::{self, LogLevel};
use log_token_agent::utils::shutdown;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "log-token-agent.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Shared handles
    // -------------------------------

    let cache = InMemoryTokenCache::new();
    let cache_keys = CacheKeys::from_prefix(&service_config.token.cache_prefix);
    let secrets = ConfiguredSecretStore::from_config(
        &service_config.secrets,
        SecretKeys::from_prefix(&service_config.token.secret_prefix),
    );
    let exchange = TokenExchange::with_timeout(
        service_config.token.endpoint.to_owned(),
        service_config.token.http_timeout_ms,
    )?;

    // -------------------------------
    // 3. Token maintenance loop
    // -------------------------------

    let cancel = CancellationToken::new();
    let manager = TokenLifecycleManager::new(
        RefreshSettings::from_config(&service_config),
        secrets,
        cache.clone(),
        exchange,
    )
    .with_callback(|result| match result {
        Ok(RefreshOutcome::Refreshed { token, .. }) => {
            info!("access token renewed, expires at {}", token.expiry_epoch_seconds)
        }
        Ok(outcome) => debug!("token check done, next in {:?}", outcome.next_check()),
        Err(err) => error!("token maintenance iteration failed: {}", err),
    });
    let refresher = manager.spawn(cancel.clone());

    // -------------------------------
    // 4. Log sink and http server
    // -------------------------------

    let log_sink = match &service_config.log_sink {
        Some(sink_config) => {
            let client = Client::builder()
                .timeout(Duration::from_millis(service_config.token.http_timeout_ms))
                .build()?;
            Some(LogSink::new(sink_config, cache.clone(), cache_keys, client))
        }
        None => None,
    };
    let http_server = tokio::spawn({
        let settings = service_config.settings.clone();
        let cancel = cancel.clone();
        async move { server::server::start(&settings, log_sink, cancel).await }
    });

    // -------------------------------
    // 5. Run until ctrl-c; a stopped refresh loop leaves the server up
    // -------------------------------

    info!("Service starting...");
    shutdown::run_until_shutdown(refresher, http_server, tokio::signal::ctrl_c(), cancel).await
}
