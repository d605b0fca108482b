//! Poputchiki realtime server.
//!
//! Startup order: configuration, logging, PostgreSQL, Redis, notification
//! policy and command handlers, hub registry, then the axum router until
//! SIGINT/SIGTERM.

use std::error::Error;
use std::sync::Arc;

use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use poputchiki::adapters::auth::RedisTokenValidator;
use poputchiki::adapters::broker::RedisBroker;
use poputchiki::adapters::email::BrokerSecondaryChannel;
use poputchiki::adapters::http::{api_router, AuthState, SocialHandlers, UpdateHandlers};
use poputchiki::adapters::postgres::{
    PostgresBlacklistReader, PostgresGuestRepository, PostgresMessageRepository,
    PostgresOfflineUpdateStore, PostgresPresenceReader, PostgresSubscriptionPreferences,
};
use poputchiki::adapters::websocket::{HubRegistry, RealtimeState};
use poputchiki::application::{
    NotificationPolicy, RealtimePublisher, RecordGuestVisitHandler, SendMessageHandler,
};
use poputchiki::config::{AppConfig, ServerConfig};
use poputchiki::ports::{Broker, OfflineUpdateStore};

type BoxError = Box<dyn Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config.server);
    config.validate()?;

    info!(environment = ?config.server.environment, "Connecting to PostgreSQL...");
    let pool = config
        .database
        .pool_options()
        .connect(&config.database.url)
        .await?;
    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Migrations applied");
    }

    info!("Connecting to Redis...");
    let broker = tokio::time::timeout(
        config.redis.timeout(),
        RedisBroker::connect(&config.redis.url, config.realtime.broker_buffer),
    )
    .await
    .map_err(|_| "timed out connecting to Redis")??;
    let token_conn = tokio::time::timeout(config.redis.timeout(), async {
        redis::Client::open(config.redis.url.as_str())?
            .get_multiplexed_async_connection()
            .await
    })
    .await
    .map_err(|_| "timed out connecting to Redis")??;

    let broker: Arc<dyn Broker> = Arc::new(broker);
    let validator: AuthState = Arc::new(RedisTokenValidator::new(
        token_conn,
        &config.realtime.namespace,
    ));

    let namespace = config.realtime.namespace.as_str();
    let offline_store: Arc<dyn OfflineUpdateStore> =
        Arc::new(PostgresOfflineUpdateStore::new(pool.clone()));
    let policy = Arc::new(NotificationPolicy::new(
        Arc::new(PostgresPresenceReader::new(pool.clone())),
        broker.clone(),
        offline_store.clone(),
        Arc::new(PostgresSubscriptionPreferences::new(pool.clone())),
        Arc::new(BrokerSecondaryChannel::new(broker.clone(), namespace)),
        namespace,
    ));
    let social = SocialHandlers::new(
        Arc::new(SendMessageHandler::new(
            Arc::new(PostgresMessageRepository::new(pool.clone())),
            Arc::new(PostgresBlacklistReader::new(pool.clone())),
            policy.clone(),
            RealtimePublisher::new(broker.clone(), namespace),
        )),
        Arc::new(RecordGuestVisitHandler::new(
            Arc::new(PostgresGuestRepository::new(pool.clone())),
            policy,
        )),
    );

    let registry = Arc::new(HubRegistry::new(broker, config.realtime.hub_settings()));
    let sweeper = registry.spawn_sweeper(
        config.realtime.hub_idle_grace(),
        config.realtime.hub_sweep_interval(),
    );

    let realtime = RealtimeState::new(registry.clone(), config.realtime.connection_settings());
    let updates = UpdateHandlers::new(offline_store);

    let app = api_router(validator, realtime, updates, social).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors_layer(&config.server)),
    );

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, namespace = %config.realtime.namespace, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    info!(hubs = registry.hub_count(), "Server stopped");
    pool.close().await;
    Ok(())
}

fn init_tracing(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));

    if server.is_production() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
