//! Storefront Audit server.
//!
//! Serves the audit and billing API on the configured address. All settings
//! come from `STOREFRONT_AUDIT__*` environment variables.

#![forbid(unsafe_code)]

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use storefront_audit::adapters::analysis::{HttpAuditEngine, HttpAuditEngineConfig};
use storefront_audit::adapters::auth::{JwtConfig, JwtSessionValidator};
use storefront_audit::adapters::http::{
    build_router, AuditAppState, BillingAppState, HttpOptions, PaymentCredentials,
};
use storefront_audit::adapters::postgres::{
    PostgresAuditRepository, PostgresPaymentRepository, PostgresProfileRepository,
    PostgresSubscriptionRepository, PostgresWebhookEventRepository,
};
use storefront_audit::adapters::razorpay::{RazorpayConfig, RazorpayGateway};
use storefront_audit::adapters::{InMemoryResultCache, SystemClock};
use storefront_audit::config::{AppConfig, ConfigError, LogFormat, ValidationError};
use storefront_audit::domain::billing::PlanCatalog;
use storefront_audit::domain::foundation::DomainError;
use storefront_audit::ports::{Clock, ResultCache, WebhookEventRepository};

#[derive(Debug, Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    #[error("database unavailable: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Adapter(#[from] DomainError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!(error = %err, "storefront-audit failed to start");
        eprintln!("storefront-audit: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), StartupError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    tracing::info!("Database pool created");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Migrations applied");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(InMemoryResultCache::new(
        clock.clone(),
        config.audit.cache_ttl(),
        config.audit.cache_max_entries,
    ));
    let webhook_events = Arc::new(PostgresWebhookEventRepository::new(pool.clone()));

    let (audit, billing) = build_states(
        &config,
        pool,
        clock.clone(),
        cache.clone(),
        webhook_events.clone(),
    )?;

    let mut jwt = JwtConfig::new(config.auth.jwt_secret.clone());
    if let Some(audience) = &config.auth.jwt_audience {
        jwt = jwt.with_audience(audience.clone());
    }
    let auth = Arc::new(JwtSessionValidator::new(jwt));

    let options = HttpOptions {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let app = build_router(audit, billing, auth, &options);

    tokio::spawn(purge_loop(
        cache,
        webhook_events,
        clock,
        config.audit.purge_interval(),
        config.audit.webhook_retention_days,
    ));

    let addr = config.server.socket_addr()?;
    tracing::info!(
        %addr,
        environment = ?config.server.environment,
        test_mode = config.payment.is_test_mode(),
        "storefront-audit listening"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.server.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

fn build_states(
    config: &AppConfig,
    pool: PgPool,
    clock: Arc<dyn Clock>,
    cache: Arc<InMemoryResultCache>,
    webhook_events: Arc<PostgresWebhookEventRepository>,
) -> Result<(AuditAppState, BillingAppState), StartupError> {
    let profiles = Arc::new(PostgresProfileRepository::new(pool.clone()));
    let subscriptions = Arc::new(PostgresSubscriptionRepository::new(pool.clone()));

    let mut engine_config = HttpAuditEngineConfig {
        timeout: config.audit.fetch_timeout(),
        ..Default::default()
    };
    if let Some(user_agent) = &config.audit.user_agent {
        engine_config.user_agent = user_agent.clone();
    }

    let audit = AuditAppState {
        engine: Arc::new(HttpAuditEngine::new(engine_config)?),
        audits: Arc::new(PostgresAuditRepository::new(pool.clone())),
        cache,
        profiles: profiles.clone(),
        subscriptions: subscriptions.clone(),
        clock: clock.clone(),
    };

    let payment = &config.payment;
    let gateway = RazorpayGateway::new(
        RazorpayConfig::new(payment.key_id.clone(), payment.key_secret.clone())
            .with_base_url(payment.api_base_url.clone()),
    );

    let billing = BillingAppState::new(
        Arc::new(PlanCatalog::standard()),
        Arc::new(gateway),
        profiles,
        subscriptions,
        Arc::new(PostgresPaymentRepository::new(pool)),
        webhook_events,
        clock,
        PaymentCredentials {
            key_id: payment.key_id.clone(),
            key_secret: payment.key_secret.clone(),
            webhook_secret: payment.webhook_secret.clone(),
        },
    );

    Ok((audit, billing))
}

/// Periodically drops expired cache entries and old webhook records.
async fn purge_loop(
    cache: Arc<InMemoryResultCache>,
    webhook_events: Arc<PostgresWebhookEventRepository>,
    clock: Arc<dyn Clock>,
    every: std::time::Duration,
    retention_days: i64,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;

        match cache.purge_expired().await {
            Ok(0) => {}
            Ok(purged) => tracing::debug!(purged, "Expired audit results purged"),
            Err(e) => tracing::warn!(error = %e, "Cache purge failed"),
        }

        let cutoff = clock.now().add_days(-retention_days);
        match webhook_events.delete_before(cutoff).await {
            Ok(0) => {}
            Ok(deleted) => tracing::info!(deleted, "Old webhook deliveries removed"),
            Err(e) => tracing::warn!(error = %e, "Webhook retention sweep failed"),
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
