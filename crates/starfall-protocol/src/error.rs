//! Error types for the protocol layer.
//!
//! Each crate in Starfall defines its own error enum. A `ProtocolError`
//! always means the backend's response document didn't have the shape we
//! expected — not that the network failed or that the server rejected the
//! request (those live in the client layer).

/// Errors produced while parsing a backend response document.
///
/// Per the error-handling design, a parse failure must never crash the
/// frame step: callers convert it into a failure completion with a generic
/// message and move on.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// A field the contract requires was absent.
    ///
    /// The path is dotted JSON notation, e.g. `data.playerName`.
    #[error("response missing expected field: {0}")]
    MissingField(String),

    /// A field was present but held the wrong JSON type.
    #[error("response field {path} has unexpected type (wanted {expected})")]
    WrongType {
        /// Dotted path of the offending field.
        path: String,
        /// What the contract expected, e.g. "string" or "integer".
        expected: &'static str,
    },
}

impl ProtocolError {
    /// Shorthand for a [`ProtocolError::MissingField`].
    pub fn missing(path: impl Into<String>) -> Self {
        Self::MissingField(path.into())
    }
}
