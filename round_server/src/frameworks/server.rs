// Framework bootstrap for the round server runtime.

use crate::domain::HistoryStore;
use crate::frameworks::config::{self, ServerConfig};
use crate::interface_adapters::history::{InMemoryHistoryStore, JsonlHistoryStore};
use crate::interface_adapters::net::round_event_serializer;
use crate::interface_adapters::routes::app;
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::world::InMemoryWorld;
use crate::use_cases::{Arena, GameRegistry};

use axum::extract::ws::Utf8Bytes;
use std::io::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{Notify, broadcast};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener, config: ServerConfig) -> Result<()> {
    let address = listener.local_addr()?;
    let state = build_state(&config)?;

    // Serialize round events once for every websocket client.
    tokio::spawn(round_event_serializer(
        state.arena.subscribe(),
        state.event_bytes_tx.clone(),
    ));

    // Drive rounds on the fixed tick until the server stops.
    let shutdown = Arc::new(Notify::new());
    let tick_loop = state.arena.clone().spawn_tick_loop(shutdown.clone());

    let app = app(state);
    tracing::info!(
        %address,
        tick_rate_hz = config.tick_rate_hz,
        default_game_type = %config.default_game_type,
        "listening"
    );

    // Serve app and report errors rather than panicking
    let served = axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    });

    shutdown.notify_one();
    if let Err(e) = tick_loop.await {
        tracing::warn!(error = %e, "tick loop task failed");
    }
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let config = ServerConfig::from_env().map_err(|e| {
        tracing::error!(error = %e, "invalid configuration");
        Error::other(e)
    })?;
    let address = SocketAddr::from(([127, 0, 0, 1], config.port));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener, config).await
}

fn build_state(config: &ServerConfig) -> Result<Arc<AppState>> {
    let registry = GameRegistry::with_builtin_games();
    config.validate(&registry).map_err(|e| {
        tracing::error!(error = %e, "configuration rejected");
        Error::other(e)
    })?;

    let world = Arc::new(InMemoryWorld::new(config::RESPAWN_POINT));

    let history: Arc<dyn HistoryStore> = match &config.history_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "persisting round history");
            Arc::new(JsonlHistoryStore::spawn(
                path.clone(),
                config::HISTORY_CHANNEL_CAPACITY,
            ))
        }
        None => {
            tracing::debug!("round history kept in memory");
            Arc::new(InMemoryHistoryStore::default())
        }
    };

    // events: Round events fanned out to the serializer.
    let (events, _events_rx) = broadcast::channel(config::EVENT_BROADCAST_CAPACITY);
    // event_bytes_tx: Serialized events shared across all websocket clients.
    let (event_bytes_tx, _event_bytes_rx) =
        broadcast::channel::<Utf8Bytes>(config::EVENT_BROADCAST_CAPACITY);

    let arena = Arena::new(
        config.arena_settings(),
        registry,
        world.clone(),
        history,
        events,
    );

    Ok(Arc::new(AppState {
        arena: Arc::new(arena),
        world,
        event_bytes_tx,
    }))
}
