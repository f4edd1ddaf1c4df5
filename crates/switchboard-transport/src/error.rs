use switchboard_config::TransportKind;
use thiserror::Error;

/// Errors that can occur while sending a task request.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
  /// The request did not complete within its timeout.
  #[error("request timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  /// The connection could not be established.
  #[error("connection refused: {message}")]
  ConnectionRefused { message: String },

  /// The peer answered with a non-2xx status.
  #[error("peer returned status {status}")]
  Status { status: u16, body: String },

  /// None of the client's transports are offered by the peer.
  #[error("peer '{peer}' offers no supported transport (offered: {offered:?})")]
  UnsupportedTransport {
    peer: String,
    offered: Vec<TransportKind>,
  },

  /// Any other request failure.
  #[error("request failed: {message}")]
  Request { message: String },
}

impl TransportError {
  pub(crate) fn from_reqwest(e: reqwest::Error, timeout_ms: u64) -> Self {
    if e.is_timeout() {
      TransportError::Timeout { timeout_ms }
    } else if e.is_connect() {
      TransportError::ConnectionRefused {
        message: e.to_string(),
      }
    } else {
      TransportError::Request {
        message: e.to_string(),
      }
    }
  }
}
