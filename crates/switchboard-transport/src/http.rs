use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use switchboard_config::TransportKind;
use tracing::debug;

use crate::error::TransportError;
use crate::request::{TaskRequest, message_object};

/// Sends one task request and returns the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
  /// Send `request` and wait at most `timeout` for the full response.
  ///
  /// Never retries. All failures are returned as [`TransportError`].
  async fn send(&self, request: &TaskRequest, timeout: Duration) -> Result<String, TransportError>;
}

/// Transport over HTTP POST, supporting the JSON-RPC and HTTP+JSON bindings.
#[derive(Debug, Clone)]
pub struct HttpTransport {
  client: Client,
  preference: Vec<TransportKind>,
}

impl HttpTransport {
  /// Create a transport with the default binding preference.
  pub fn new(client: Client) -> Self {
    Self::with_preference(client, TransportKind::default_preference())
  }

  /// Create a transport with a custom binding preference, most preferred first.
  pub fn with_preference(client: Client, preference: Vec<TransportKind>) -> Self {
    Self { client, preference }
  }

  /// Pick the first client-preferred binding the peer supports.
  pub fn select_transport(&self, request: &TaskRequest) -> Result<TransportKind, TransportError> {
    let offered = request.target.supported_transports();
    self
      .preference
      .iter()
      .copied()
      .filter(|kind| matches!(kind, TransportKind::Jsonrpc | TransportKind::HttpJson))
      .find(|kind| offered.contains(kind))
      .ok_or_else(|| TransportError::UnsupportedTransport {
        peer: request.target.peer.clone(),
        offered,
      })
  }

  fn build_call(
    &self,
    kind: TransportKind,
    request: &TaskRequest,
  ) -> Result<(String, serde_json::Value), TransportError> {
    let endpoint = request.target.endpoint(kind).ok_or_else(|| {
      TransportError::UnsupportedTransport {
        peer: request.target.peer.clone(),
        offered: request.target.supported_transports(),
      }
    })?;

    let message = message_object(request);
    match kind {
      TransportKind::Jsonrpc => Ok((
        endpoint.to_string(),
        json!({
          "jsonrpc": "2.0",
          "id": request.correlation_id,
          "method": "message/send",
          "params": { "message": message },
        }),
      )),
      TransportKind::HttpJson => Ok((
        format!("{}/v1/message:send", endpoint.as_str().trim_end_matches('/')),
        json!({ "message": message }),
      )),
      TransportKind::Grpc => Err(TransportError::UnsupportedTransport {
        peer: request.target.peer.clone(),
        offered: request.target.supported_transports(),
      }),
    }
  }
}

#[async_trait]
impl Transport for HttpTransport {
  async fn send(&self, request: &TaskRequest, timeout: Duration) -> Result<String, TransportError> {
    let kind = self.select_transport(request)?;
    let (url, body) = self.build_call(kind, request)?;
    let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);

    debug!(
      correlation_id = %request.correlation_id,
      peer = %request.target.peer,
      transport = %kind,
      url = %url,
      "sending task request"
    );

    let response = self
      .client
      .post(&url)
      .timeout(timeout)
      .json(&body)
      .send()
      .await
      .map_err(|e| TransportError::from_reqwest(e, timeout_ms))?;

    let status = response.status();
    let text = response
      .text()
      .await
      .map_err(|e| TransportError::from_reqwest(e, timeout_ms))?;

    if !status.is_success() {
      return Err(TransportError::Status {
        status: status.as_u16(),
        body: text,
      });
    }

    Ok(text)
  }
}
