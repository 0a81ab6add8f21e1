use crate::interface_adapters::net::{
    add_score, add_trick, current_round, eliminate_player, end_current_round, join_player,
    last_round, list_games, set_position, start_round, world_snapshot, ws_handler,
};
use crate::interface_adapters::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/games", get(list_games))
        .route("/world", get(world_snapshot))
        .route("/players", post(join_player))
        .route("/players/{id}/position", post(set_position))
        .route("/rounds", post(start_round))
        .route("/rounds/current", get(current_round))
        .route("/rounds/last", get(last_round))
        .route("/rounds/current/end", post(end_current_round))
        .route("/rounds/current/tricks", post(add_trick))
        .route("/rounds/current/score", post(add_score))
        .route("/rounds/current/eliminate", post(eliminate_player))
        .with_state(state)
}
