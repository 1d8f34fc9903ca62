//! The transport seam between the client and the backend service.
//!
//! Starfall does not speak the backend's wire protocol itself — a
//! [`BackendTransport`] implementation does. The contract consumed here is
//! deliberately small: submit a request, and eventually deliver exactly one
//! [`BackendReply`] for it on the provided channel. The channel buffers
//! completions independently of the game's drain cadence, so a slow frame
//! delays callbacks but never loses them.
//!
//! Timeout policy belongs to the transport: from the client's point of view
//! every submitted request eventually resolves, success or failure.

use serde_json::Value;
use starfall_protocol::{response, ApiCall, RequestId};
use tokio::sync::mpsc;

/// Channel on which a transport delivers replies.
///
/// Unbounded on purpose: the reply volume is one per issued request and the
/// drain runs every frame, so the queue stays tiny; blocking the transport
/// on a full buffer would be the worse failure mode.
pub type ReplySender = mpsc::UnboundedSender<BackendReply>;

/// One outbound backend request.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendRequest {
    /// Client-assigned id, echoed back on the reply.
    pub id: RequestId,
    /// The operation and its fields.
    pub call: ApiCall,
}

/// A structured failure from the transport or the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendFault {
    /// The backend processed the request and rejected it.
    Server {
        /// Numeric status code.
        code: i32,
        /// Human-readable status message, forwarded verbatim.
        message: String,
    },
    /// The backend could not be reached (connection refused, timeout —
    /// whatever the transport's policy decided was terminal).
    Unreachable {
        message: String,
    },
}

impl BackendFault {
    /// Builds a server rejection from the backend's raw error document,
    /// extracting the human-readable status message. Transports hand the
    /// error body here instead of parsing it themselves.
    pub fn from_error_document(code: i32, doc: &Value) -> Self {
        Self::Server {
            code,
            message: response::status_message(doc),
        }
    }
}

/// The terminal outcome of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    /// Id of the request this reply answers.
    pub id: RequestId,
    /// Success payload (opaque structured document) or failure.
    pub outcome: Result<Value, BackendFault>,
}

/// Submits requests toward the backend service.
///
/// # Contract
///
/// For every `submit` call, the transport must eventually send exactly one
/// [`BackendReply`] carrying the same [`RequestId`] on `replies` — never
/// zero, never two. Replies may arrive in any order relative to other
/// requests. Cancellation is not supported. Backend rejections are reported
/// as [`BackendFault::from_error_document`] so the status message reaches
/// the player verbatim.
///
/// `Send + Sync + 'static` because real transports run their I/O on
/// background tasks and deliver replies cross-thread.
pub trait BackendTransport: Send + Sync + 'static {
    /// Accepts a request for delivery. Must not block.
    fn submit(&self, request: BackendRequest, replies: ReplySender);
}

// =========================================================================
// Tests
// =========================================================================
