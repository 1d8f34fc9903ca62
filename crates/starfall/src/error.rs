//! Unified error type for the Starfall stack.

use starfall_client::ClientError;
use starfall_game::GameError;
use starfall_protocol::ProtocolError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `starfall` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum StarfallError {
    /// A contract-level error (response payload shape).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A client-level error (auth gate, transport, server rejection).
    #[error(transparent)]
    Client(#[from] ClientError),

    /// A progression-level error (phase misuse, missing level feed).
    #[error(transparent)]
    Game(#[from] GameError),
}
