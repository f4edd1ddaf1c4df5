//! Normalized dispatch results.

use serde::Serialize;
use switchboard_resolver::ResolveError;
use switchboard_transport::TransportError;
use thiserror::Error;

/// Why a dispatch did not produce a response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorKind {
  #[error("unknown peer '{peer}'")]
  UnknownPeer { peer: String },

  #[error("descriptor unreachable: {message}")]
  DescriptorUnreachable { message: String },

  #[error("descriptor malformed: {message}")]
  DescriptorMalformed { message: String },

  #[error("timed out after {timeout_ms}ms")]
  Timeout { timeout_ms: u64 },

  #[error("connection refused: {message}")]
  ConnectionRefused { message: String },

  #[error("peer returned status {status}")]
  Status { status: u16 },

  #[error("no supported transport: {message}")]
  UnsupportedTransport { message: String },

  #[error("{message}")]
  Other { message: String },
}

impl From<ResolveError> for ErrorKind {
  fn from(e: ResolveError) -> Self {
    match e {
      ResolveError::DescriptorUnreachable { .. } => ErrorKind::DescriptorUnreachable {
        message: e.to_string(),
      },
      ResolveError::DescriptorMalformed { .. } => ErrorKind::DescriptorMalformed {
        message: e.to_string(),
      },
    }
  }
}

impl From<TransportError> for ErrorKind {
  fn from(e: TransportError) -> Self {
    match e {
      TransportError::Timeout { timeout_ms } => ErrorKind::Timeout { timeout_ms },
      TransportError::ConnectionRefused { message } => ErrorKind::ConnectionRefused { message },
      TransportError::Status { status, .. } => ErrorKind::Status { status },
      TransportError::UnsupportedTransport { .. } => ErrorKind::UnsupportedTransport {
        message: e.to_string(),
      },
      TransportError::Request { message } => ErrorKind::Other { message },
    }
  }
}

/// Outcome of one dispatch. Always exactly one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskResult {
  /// The first artifact's first text part.
  Success { text: String },

  /// The peer answered, but the body holds no usable text.
  EmptyOrMalformed { reason: String, raw: String },

  /// No response body was obtained.
  TransportFailure { cause: ErrorKind },
}

impl TaskResult {
  pub fn success(text: impl Into<String>) -> Self {
    TaskResult::Success { text: text.into() }
  }

  pub fn transport_failure(cause: impl Into<ErrorKind>) -> Self {
    TaskResult::TransportFailure {
      cause: cause.into(),
    }
  }

  pub fn is_success(&self) -> bool {
    matches!(self, TaskResult::Success { .. })
  }

  /// Success text, if any.
  pub fn text(&self) -> Option<&str> {
    match self {
      TaskResult::Success { text } => Some(text),
      _ => None,
    }
  }

  /// Human-readable account of a non-success result, keeping the raw body.
  pub fn describe(&self) -> String {
    match self {
      TaskResult::Success { text } => text.clone(),
      TaskResult::EmptyOrMalformed { reason, raw } => {
        format!("task failed or returned empty ({}): {}", reason, raw)
      }
      TaskResult::TransportFailure { cause } => format!("transport failure: {}", cause),
    }
  }
}
