//! Model Market server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use model_market::adapters::helio::{HelioClient, HelioConfig};
use model_market::adapters::http::{build_router, AppState, HttpSettings, ReconcilerSettings};
use model_market::adapters::memory::{
    InMemoryCatalog, InMemoryEarningsLedger, InMemoryPaymentProvider, InMemoryPaymentRepository,
    InMemorySubscriptionRepository, InMemoryUsageRepository,
};
use model_market::adapters::postgres::{
    self, PostgresCatalogReader, PostgresEarningsLedger, PostgresPaymentRepository,
    PostgresSubscriptionRepository, PostgresUsageRepository,
};
use model_market::adapters::rate_limiter::{InMemoryRateLimiter, RedisRateLimiter};
use model_market::config::{AppConfig, ConfigError, ServerConfig};
use model_market::domain::billing::HelioWebhookVerifier;
use model_market::domain::foundation::Timestamp;
use model_market::ports::{PaymentProvider, RateLimiter};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to initialise logging: {0}")]
    Logging(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("timed out connecting to redis")]
    RedisTimeout,

    #[error("payment provider setup failed: {0}")]
    PaymentProvider(#[from] model_market::ports::PaymentProviderError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

fn init_tracing(server: &ServerConfig) -> Result<(), StartupError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if server.use_json_logs() {
        registry.with(tracing_subscriber::fmt::layer().json()).try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    result.map_err(|e| StartupError::Logging(e.to_string()))
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

async fn build_state(config: &AppConfig) -> Result<AppState, StartupError> {
    let payment_provider: Arc<dyn PaymentProvider> = match &config.payment.helio_api_key {
        Some(api_key) => Arc::new(HelioClient::new(
            HelioConfig::new(api_key.clone())
                .with_base_url(&config.payment.helio_api_base_url)
                .with_checkout_base_url(&config.payment.helio_checkout_base_url)
                .with_timeout(config.payment.request_timeout()),
        )?),
        None => {
            tracing::warn!("No Helio API key configured, using in-memory payment provider");
            Arc::new(InMemoryPaymentProvider::new(
                config.payment.helio_checkout_base_url.clone(),
            ))
        }
    };

    if config.payment.helio_webhook_secret.is_none() {
        tracing::warn!("No Helio webhook secret configured, webhooks will be rejected");
    }

    let webhook_verifier = Arc::new(HelioWebhookVerifier::new(
        config.payment.helio_webhook_secret.clone(),
    ));
    let cost_schedule = config.usage.cost_schedule();
    let reconciler = ReconcilerSettings {
        status_timeout: config.payment.status_timeout(),
        renewal_lookback_days: config.subscription.renewal_lookback_days,
    };

    let state = match &config.database.url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .min_connections(config.database.min_connections)
                .max_connections(config.database.max_connections)
                .acquire_timeout(config.database.acquire_timeout())
                .connect(url.expose_secret())
                .await?;

            if config.database.run_migrations {
                tracing::info!("Running database migrations");
                postgres::run_migrations(&pool).await?;
            }

            AppState {
                payments: Arc::new(PostgresPaymentRepository::new(pool.clone())),
                subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
                catalog: Arc::new(PostgresCatalogReader::new(pool.clone())),
                usage: Arc::new(PostgresUsageRepository::new(pool.clone())),
                earnings: Arc::new(PostgresEarningsLedger::new(pool)),
                payment_provider,
                webhook_verifier,
                cost_schedule,
                reconciler,
            }
        }
        None => {
            tracing::warn!("No database configured, using in-memory stores");
            AppState {
                payments: Arc::new(InMemoryPaymentRepository::new()),
                subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
                catalog: Arc::new(InMemoryCatalog::new()),
                usage: Arc::new(InMemoryUsageRepository::new()),
                earnings: Arc::new(InMemoryEarningsLedger::new()),
                payment_provider,
                webhook_verifier,
                cost_schedule,
                reconciler,
            }
        }
    };

    Ok(state)
}

async fn build_rate_limiter(config: &AppConfig) -> Result<Arc<dyn RateLimiter>, StartupError> {
    match &config.redis.url {
        Some(url) => {
            let client = redis::Client::open(url.as_str())?;
            let conn = tokio::time::timeout(
                config.redis.timeout(),
                client.get_multiplexed_tokio_connection(),
            )
            .await
            .map_err(|_| StartupError::RedisTimeout)??;
            tracing::info!("Using Redis rate limiter");
            Ok(Arc::new(RedisRateLimiter::new(conn, config.rate_limit.clone())))
        }
        None => Ok(Arc::new(InMemoryRateLimiter::new(config.rate_limit.clone()))),
    }
}

/// Expires lapsed subscriptions on a fixed interval until the process exits.
fn spawn_expiry_sweep(state: &AppState, config: &AppConfig) {
    let handler = state
        .expire_lapsed_handler()
        .with_batch_size(config.subscription.expiry_batch_size);
    let mut interval = tokio::time::interval(config.subscription.expiry_sweep_interval());

    tokio::spawn(async move {
        loop {
            interval.tick().await;
            match handler.handle(Timestamp::now()).await {
                Ok(result) if result.expired > 0 || result.failed > 0 => {
                    tracing::info!(
                        expired = result.expired,
                        failed = result.failed,
                        "Lapsed subscription sweep finished"
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Lapsed subscription sweep failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server)?;
    config.validate().map_err(ConfigError::from)?;

    let state = build_state(&config).await?;
    let limiter = build_rate_limiter(&config).await?;
    spawn_expiry_sweep(&state, &config);

    let settings = HttpSettings {
        request_timeout: config.server.request_timeout(),
        cors_allowed_origins: config.server.cors_origins_list(),
    };
    let app = build_router(state, limiter, &settings);

    let addr = config.server.socket_addr().map_err(ConfigError::from)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Model Market listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}
