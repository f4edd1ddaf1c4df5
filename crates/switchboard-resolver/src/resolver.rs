use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use switchboard_config::AGENT_CARD_WELL_KNOWN_PATH;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::descriptor::{PeerDescriptor, parse_descriptor};
use crate::error::ResolveError;

/// Resolver turns a peer's base address into a [`PeerDescriptor`].
#[async_trait]
pub trait DescriptorResolver: Send + Sync {
  /// Fetch and parse the descriptor for `peer` served under `base_url`.
  ///
  /// Performs exactly one outbound request.
  async fn resolve(&self, peer: &str, base_url: &Url) -> Result<PeerDescriptor, ResolveError>;
}

/// Build the descriptor URL for a base address.
pub fn card_url(base_url: &Url, card_path: &str) -> String {
  format!(
    "{}/{}",
    base_url.as_str().trim_end_matches('/'),
    card_path.trim_start_matches('/')
  )
}

/// Resolver that fetches the card over HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpResolver {
  client: Client,
  card_path: String,
  timeout: Duration,
}

impl HttpResolver {
  /// Create a resolver using the standard well-known card path.
  pub fn new(client: Client, timeout: Duration) -> Self {
    Self::with_card_path(client, timeout, AGENT_CARD_WELL_KNOWN_PATH)
  }

  /// Create a resolver with a custom card path.
  pub fn with_card_path(client: Client, timeout: Duration, card_path: impl Into<String>) -> Self {
    Self {
      client,
      card_path: card_path.into(),
      timeout,
    }
  }
}

#[async_trait]
impl DescriptorResolver for HttpResolver {
  #[instrument(name = "resolve_descriptor", skip(self, base_url), fields(base_url = %base_url))]
  async fn resolve(&self, peer: &str, base_url: &Url) -> Result<PeerDescriptor, ResolveError> {
    let url = card_url(base_url, &self.card_path);
    let unreachable = |message: String| ResolveError::DescriptorUnreachable {
      peer: peer.to_string(),
      message,
    };

    let response = self
      .client
      .get(&url)
      .timeout(self.timeout)
      .send()
      .await
      .map_err(|e| {
        warn!(peer = %peer, url = %url, error = %e, "descriptor_fetch_failed");
        unreachable(e.to_string())
      })?;

    let status = response.status();
    if !status.is_success() {
      warn!(peer = %peer, url = %url, status = status.as_u16(), "descriptor_fetch_failed");
      return Err(unreachable(format!("{} returned status {}", url, status)));
    }

    let body = response.text().await.map_err(|e| unreachable(e.to_string()))?;
    let descriptor = parse_descriptor(peer, &body)?;

    debug!(
      peer = %peer,
      name = %descriptor.name,
      endpoint = %descriptor.url,
      transports = ?descriptor.supported_transports(),
      "descriptor_resolved"
    );

    Ok(descriptor)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_card_url_joins_cleanly() {
    let base = Url::parse("http://localhost:11001").unwrap();
    assert_eq!(
      card_url(&base, AGENT_CARD_WELL_KNOWN_PATH),
      "http://localhost:11001/.well-known/agent-card.json"
    );

    let nested = Url::parse("http://localhost:11001/agents/data/").unwrap();
    assert_eq!(
      card_url(&nested, "card.json"),
      "http://localhost:11001/agents/data/card.json"
    );
  }

  #[tokio::test]
  async fn test_unreachable_peer() {
    let resolver = HttpResolver::new(Client::new(), Duration::from_millis(500));
    // Port 9 (discard) on loopback is expected to refuse connections.
    let base = Url::parse("http://127.0.0.1:9").unwrap();

    let result = resolver.resolve("data", &base).await;
    assert!(matches!(
      result,
      Err(ResolveError::DescriptorUnreachable { .. })
    ));
  }
}
