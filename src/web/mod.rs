mod assets;

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
    time::Duration,
};

use anyhow::{anyhow, Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        Html, IntoResponse,
    },
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{error, info};

use crate::{
    engine::{EngineBuilder, EngineSettings, TickSummary},
    render::{DisplayMode, MapFrame},
    scenario::Scenario,
    tile::TileSnapshot,
    world::{SimClock, World},
};

const PAUSE_POLL: Duration = Duration::from_millis(50);

/// Pushed to SSE subscribers after every tick.
#[derive(Clone, Serialize)]
pub struct TickEvent {
    pub summary: TickSummary,
    pub clock: SimClock,
    pub sea_level: f64,
    pub greenhouse: f64,
    pub land_fraction: f64,
    pub completed: bool,
}

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub scenario: String,
    pub total_ticks: u64,
    pub tick: u64,
    pub grid_size: usize,
    pub clock: SimClock,
    pub sun_hour_angle: u32,
    pub sea_level: f64,
    pub greenhouse: f64,
    pub land_fraction: f64,
    pub mean_surface_temperature: f64,
    pub mean_air_temperature: f64,
    pub paused: bool,
    pub completed: bool,
    pub modes: Vec<&'static str>,
}

/// Driver adjustments accepted by `/api/control`. Scalar changes land between
/// ticks and are seen by the next one.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlCommand {
    RaiseSeaLevel,
    LowerSeaLevel,
    RaiseGreenhouse,
    LowerGreenhouse,
    Pause,
    Resume,
}

struct AppState {
    world: Arc<Mutex<World>>,
    broadcaster: broadcast::Sender<String>,
    scenario_name: String,
    total_ticks: u64,
    paused: Arc<AtomicBool>,
    simulation_done: Arc<AtomicBool>,
}

pub struct WebServerConfig {
    pub scenario: Scenario,
    pub ticks: u64,
    pub snapshot_interval: u64,
    pub snapshot_dir: PathBuf,
    pub host: String,
    pub port: u16,
    /// Wall-clock pause between ticks so the map can be watched.
    pub tick_interval: Duration,
}

fn lock_world(world: &Mutex<World>) -> Result<MutexGuard<'_, World>> {
    world.lock().map_err(|_| anyhow!("world lock poisoned"))
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig {
        scenario,
        ticks,
        snapshot_interval,
        snapshot_dir,
        host,
        port,
        tick_interval,
    } = config;

    let scenario_name = scenario.name.clone();
    let world = Arc::new(Mutex::new(scenario.build_world()?));
    let settings = EngineSettings {
        scenario_name: scenario_name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    };
    let mut engine = EngineBuilder::new(settings)
        .with_climate_systems(&scenario.atmosphere)
        .build();

    let (tx, _) = broadcast::channel::<String>(512);
    let paused = Arc::new(AtomicBool::new(false));
    let simulation_done = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(AtomicBool::new(false));

    let world_for_sim = world.clone();
    let tx_for_sim = tx.clone();
    let paused_for_sim = paused.clone();
    let done_for_sim = simulation_done.clone();
    let shutdown_for_sim = shutdown.clone();

    let sim_handle = tokio::task::spawn_blocking(move || -> Result<()> {
        let mut done = 0;
        while done < ticks {
            if shutdown_for_sim.load(Ordering::SeqCst) {
                return Ok(());
            }
            if paused_for_sim.load(Ordering::SeqCst) {
                std::thread::sleep(PAUSE_POLL);
                continue;
            }
            done += 1;
            let event = {
                let mut world = lock_world(&world_for_sim)?;
                let summary = engine.advance_tick(&mut world)?;
                TickEvent {
                    summary,
                    clock: world.clock(),
                    sea_level: world.sea_level(),
                    greenhouse: world.greenhouse(),
                    land_fraction: world.land_fraction(),
                    completed: done >= ticks,
                }
            };
            if let Ok(payload) = serde_json::to_string(&event) {
                let _ = tx_for_sim.send(payload);
            }
            if !tick_interval.is_zero() {
                std::thread::sleep(tick_interval);
            }
        }
        done_for_sim.store(true, Ordering::SeqCst);
        Ok(())
    });

    let state = Arc::new(AppState {
        world,
        broadcaster: tx,
        scenario_name: scenario_name.clone(),
        total_ticks: ticks,
        paused,
        simulation_done,
    });

    tokio::spawn(async move {
        match sim_handle.await {
            Ok(Ok(())) => info!(scenario = %scenario_name, "simulation finished"),
            Ok(Err(err)) => error!("simulation error: {err:?}"),
            Err(err) => error!("simulation task failed: {err:?}"),
        }
    });

    let router = Router::new()
        .route("/", get(index))
        .route("/styles.css", get(styles))
        .route("/app.js", get(script))
        .route("/api/state", get(latest_state))
        .route("/api/frame", get(frame))
        .route("/api/tile/:row/:col", get(tile))
        .route("/api/control", post(control))
        .route("/api/events", get(stream_events))
        .with_state(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    let listener = TcpListener::bind(addr).await?;
    info!("viewer live at http://{addr} (Ctrl+C to stop)");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    shutdown.store(true, Ordering::SeqCst);
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down viewer");
}

type ApiError = (StatusCode, String);

fn internal(err: anyhow::Error) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

async fn index() -> Html<&'static str> {
    Html(assets::INDEX_HTML)
}

async fn styles() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        assets::STYLES_CSS,
    )
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        assets::APP_JS,
    )
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Result<Json<StateEnvelope>, ApiError> {
    let world = lock_world(&state.world).map_err(internal)?;
    Ok(Json(StateEnvelope {
        scenario: state.scenario_name.clone(),
        total_ticks: state.total_ticks,
        tick: world.tick(),
        grid_size: world.size(),
        clock: world.clock(),
        sun_hour_angle: world.sun_hour_angle(),
        sea_level: world.sea_level(),
        greenhouse: world.greenhouse(),
        land_fraction: world.land_fraction(),
        mean_surface_temperature: world.mean_surface_temperature(),
        mean_air_temperature: world.mean_air_temperature(),
        paused: state.paused.load(Ordering::SeqCst),
        completed: state.simulation_done.load(Ordering::SeqCst),
        modes: DisplayMode::ALL.iter().map(|m| m.as_str()).collect(),
    }))
}

#[derive(Deserialize)]
struct FrameQuery {
    mode: Option<String>,
}

async fn frame(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FrameQuery>,
) -> Result<Json<MapFrame>, ApiError> {
    let mode = match query.mode.as_deref() {
        Some(name) => name
            .parse::<DisplayMode>()
            .map_err(|err| (StatusCode::BAD_REQUEST, err.to_string()))?,
        None => DisplayMode::Surface,
    };
    let world = lock_world(&state.world).map_err(internal)?;
    Ok(Json(MapFrame::render(&world, mode)))
}

async fn tile(
    State(state): State<Arc<AppState>>,
    Path((row, col)): Path<(usize, usize)>,
) -> Result<Json<TileSnapshot>, ApiError> {
    let world = lock_world(&state.world).map_err(internal)?;
    world
        .tile_snapshot(row, col)
        .map(Json)
        .map_err(|err| (StatusCode::NOT_FOUND, err.to_string()))
}

async fn control(
    State(state): State<Arc<AppState>>,
    Json(command): Json<ControlCommand>,
) -> Result<StatusCode, ApiError> {
    match command {
        ControlCommand::Pause => state.paused.store(true, Ordering::SeqCst),
        ControlCommand::Resume => state.paused.store(false, Ordering::SeqCst),
        adjustment => {
            let mut world = lock_world(&state.world).map_err(internal)?;
            apply_adjustment(&mut world, adjustment);
        }
    }
    info!(?command, "control applied");
    Ok(StatusCode::ACCEPTED)
}

fn apply_adjustment(world: &mut World, command: ControlCommand) {
    let sea_step = world.climate().sea_level_increment_ft;
    let greenhouse_step = world.climate().greenhouse_increment;
    match command {
        ControlCommand::RaiseSeaLevel => world.adjust_sea_level(sea_step),
        ControlCommand::LowerSeaLevel => world.adjust_sea_level(-sea_step),
        ControlCommand::RaiseGreenhouse => world.adjust_greenhouse(greenhouse_step),
        ControlCommand::LowerGreenhouse => world.adjust_greenhouse(-greenhouse_step),
        ControlCommand::Pause | ControlCommand::Resume => {}
    }
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
