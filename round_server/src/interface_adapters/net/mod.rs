// Network adapter modules split by streaming websocket clients vs HTTP control routes.

pub mod client;
pub mod internal;

pub use client::{round_event_serializer, ws_handler};
pub use internal::{
    add_score, add_trick, current_round, eliminate_player, end_current_round, join_player,
    last_round, list_games, set_position, start_round, world_snapshot,
};
