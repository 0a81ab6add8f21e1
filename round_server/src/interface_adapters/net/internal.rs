use crate::domain::{PlayerId, RoundResult, Vec3, WorldPort};
use crate::interface_adapters::http::{ApiError, error_response};
use crate::interface_adapters::protocol::{
    AddTrickRequest, AddTrickResponse, EliminateRequest, EndRoundRequest, JoinPlayerRequest,
    JoinPlayerResponse, ScoreRequest, StartRoundRequest, WorldSnapshot,
};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{ArenaError, GameTypeInfo, RoundStatus, RoundSummary};

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

const MAX_PLAYER_NAME_LEN: usize = 32;

fn map_arena_error(err: ArenaError) -> ApiError {
    let status = match err {
        ArenaError::Configuration(_) => StatusCode::BAD_REQUEST,
        ArenaError::RoundInProgress => StatusCode::CONFLICT,
        ArenaError::NoActiveRound => StatusCode::NOT_FOUND,
    };
    error_response(status, err.to_string())
}

pub async fn join_player(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<JoinPlayerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(error_response(StatusCode::BAD_REQUEST, "name is required"));
    }
    if name.chars().count() > MAX_PLAYER_NAME_LEN {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            format!("name must be at most {MAX_PLAYER_NAME_LEN} characters"),
        ));
    }

    let player_id = state.world.join_player(name, payload.spectating);
    Ok((StatusCode::CREATED, Json(JoinPlayerResponse { player_id })))
}

pub async fn set_position(
    State(state): State<Arc<AppState>>,
    Path(player_id): Path<PlayerId>,
    Json(position): Json<Vec3>,
) -> Result<StatusCode, ApiError> {
    if state.world.set_player_position(player_id, position) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error_response(StatusCode::NOT_FOUND, "player not found"))
    }
}

pub async fn start_round(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<StartRoundRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let status = state
        .arena
        .start_round(&payload.game_type, payload.time_limit_ms)
        .await
        .map_err(map_arena_error)?;
    info!(round_id = %status.id, game_type = %status.game_type, "round started via api");
    Ok((StatusCode::CREATED, Json(status)))
}

pub async fn current_round(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RoundStatus>, ApiError> {
    state
        .arena
        .status()
        .await
        .map(Json)
        .ok_or_else(|| map_arena_error(ArenaError::NoActiveRound))
}

pub async fn last_round(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RoundSummary>, ApiError> {
    state
        .arena
        .last_summary()
        .map(Json)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "no round has finished yet"))
}

pub async fn end_current_round(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<EndRoundRequest>>,
) -> Result<Json<RoundSummary>, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let result = payload
        .result
        .as_deref()
        .map(RoundResult::from_tag)
        .unwrap_or(RoundResult::Cancelled);
    state
        .arena
        .end_round(result)
        .await
        .map(Json)
        .map_err(map_arena_error)
}

pub async fn add_trick(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AddTrickRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let trick_id = state
        .arena
        .add_trick(payload.trigger, payload.action)
        .await
        .map_err(map_arena_error)?;
    Ok((StatusCode::CREATED, Json(AddTrickResponse { trick_id })))
}

pub async fn add_score(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ScoreRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .arena
        .add_score(payload.player_id, payload.points)
        .await
        .map_err(map_arena_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn eliminate_player(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EliminateRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .arena
        .eliminate_player(payload.player_id)
        .await
        .map_err(map_arena_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_games(State(state): State<Arc<AppState>>) -> Json<Vec<GameTypeInfo>> {
    let registry = state.arena.registry();
    Json(
        registry
            .tags()
            .filter_map(|tag| registry.info(tag).cloned())
            .collect(),
    )
}

pub async fn world_snapshot(State(state): State<Arc<AppState>>) -> Json<WorldSnapshot> {
    let world = &state.world;
    Json(WorldSnapshot {
        phase: world.phase(),
        physics: world.physics(),
        players: world.players(),
        entities: world.entities(),
        announcements: world.recent_announcements(),
        spells: world.active_spells(),
        records: world.records(),
    })
}
