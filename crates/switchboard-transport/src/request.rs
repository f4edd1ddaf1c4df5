use std::sync::Arc;

use serde_json::json;
use switchboard_resolver::PeerDescriptor;

/// A single task request, created and owned by one dispatch call.
#[derive(Debug, Clone)]
pub struct TaskRequest {
  /// Resolved target. A request is never built for an unresolved peer.
  pub target: Arc<PeerDescriptor>,
  /// Text sent to the peer.
  pub payload: String,
  /// Opaque token tying log lines and the wire request together.
  pub correlation_id: String,
}

impl TaskRequest {
  /// Create a request with a fresh correlation id.
  pub fn new(target: Arc<PeerDescriptor>, payload: impl Into<String>) -> Self {
    Self {
      target,
      payload: payload.into(),
      correlation_id: uuid::Uuid::new_v4().to_string(),
    }
  }
}

/// Build the user text message carried by both bindings.
pub fn message_object(request: &TaskRequest) -> serde_json::Value {
  json!({
    "kind": "message",
    "role": "user",
    "messageId": request.correlation_id,
    "parts": [{ "kind": "text", "text": request.payload }],
  })
}
