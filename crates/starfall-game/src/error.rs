//! Error types for the progression layer.

use starfall_client::ClientError;

use crate::GamePhase;

/// Errors surfaced by [`ProgressionController`](crate::ProgressionController)
/// operations.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// A mode was started before the level feed arrived.
    #[error("level definitions are not loaded yet")]
    LevelsNotLoaded,

    /// The operation is not valid in the controller's current phase.
    #[error("operation not valid in phase {0}")]
    InvalidPhase(GamePhase),

    /// A backend call was rejected before it was sent.
    #[error(transparent)]
    Client(#[from] ClientError),
}
