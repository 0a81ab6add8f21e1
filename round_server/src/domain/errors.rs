// Domain-level errors for round creation and world access.

use std::fmt;

use crate::domain::entities::EntityId;

/// Raised when a round is requested for a game type nobody registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    UnknownGameType { game_type: String },
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownGameType { game_type } => write!(
                f,
                "unknown game type: {game_type}; register it in the game registry"
            ),
        }
    }
}

impl std::error::Error for ConfigurationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    EntityNotFound { id: EntityId },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EntityNotFound { id } => write!(f, "entity {id} not found"),
        }
    }
}

impl std::error::Error for WorldError {}

/// Raised when a round record cannot be handed to the history store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryError {
    QueueFull,
    WriterStopped,
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => f.write_str("history queue full"),
            Self::WriterStopped => f.write_str("history writer stopped"),
        }
    }
}

impl std::error::Error for HistoryError {}
