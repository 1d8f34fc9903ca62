//! Error types for the client layer.

use starfall_protocol::ProtocolError;

/// Errors reported through an operation's failure completion (or, for the
/// precondition variants, synchronously from the call itself).
///
/// The taxonomy:
/// - [`NotAuthenticated`](Self::NotAuthenticated) — precondition failure;
///   the request was never sent.
/// - [`Transport`](Self::Transport) — backend unreachable; generic message.
/// - [`Server`](Self::Server) — the backend returned a structured failure;
///   the status message is forwarded verbatim.
/// - [`Response`](Self::Response) — the success payload was missing an
///   expected field. Treated like a server error with a generic message;
///   it never aborts the frame step.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A protected operation was attempted without an authenticated session.
    #[error("user is not authenticated")]
    NotAuthenticated,

    /// A reconnect was requested but no identifiers are stored.
    #[error("no stored identifiers to reconnect with")]
    NoStoredIdentity,

    /// The backend could not be reached.
    #[error("backend unreachable: {0}")]
    Transport(String),

    /// The backend rejected the request with a structured failure.
    #[error("{message}")]
    Server {
        /// Numeric status code from the failure payload.
        code: i32,
        /// Status message, forwarded verbatim.
        message: String,
    },

    /// The success payload didn't have the shape the contract promises.
    #[error(transparent)]
    Response(#[from] ProtocolError),
}

impl ClientError {
    /// A human-readable message suitable for a dialog.
    ///
    /// Server messages pass through verbatim; everything else collapses to
    /// its generic description.
    pub fn status_message(&self) -> String {
        self.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_displays_message_verbatim() {
        let err = ClientError::Server {
            code: 40307,
            message: "Invalid credentials".into(),
        };
        assert_eq!(err.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_response_error_is_transparent() {
        let err: ClientError = ProtocolError::missing("data.playerName").into();
        assert!(err.to_string().contains("data.playerName"));
    }
}
