//! Task dispatcher.

use std::sync::Arc;
use std::time::Duration;

use switchboard_config::RouterConfig;
use switchboard_registry::{PeerRegistry, Url};
use switchboard_resolver::{
  DescriptorCache, DescriptorResolver, HttpResolver, PeerDescriptor, ResolveError,
};
use switchboard_transport::{HttpTransport, TaskRequest, Transport, TransportError};
use tracing::{error, info, instrument, warn};

use crate::extract::extract;
use crate::result::{ErrorKind, TaskResult};

/// Sends text to a named peer and normalizes the answer.
///
/// Owns the descriptor cache for its routing session. Cloning is cheap and
/// clones share the registry, resolver, transport and cache.
#[derive(Clone)]
pub struct TaskDispatcher {
  registry: Arc<dyn PeerRegistry>,
  resolver: Arc<dyn DescriptorResolver>,
  transport: Arc<dyn Transport>,
  cache: DescriptorCache,
  default_timeout: Duration,
}

impl TaskDispatcher {
  /// Create a dispatcher from explicit parts.
  pub fn new(
    registry: Arc<dyn PeerRegistry>,
    resolver: Arc<dyn DescriptorResolver>,
    transport: Arc<dyn Transport>,
    default_timeout: Duration,
  ) -> Self {
    Self {
      registry,
      resolver,
      transport,
      cache: DescriptorCache::new(),
      default_timeout,
    }
  }

  /// Create an HTTP dispatcher for a router config.
  pub fn from_config(config: &RouterConfig, registry: Arc<dyn PeerRegistry>) -> Self {
    let timeout = Duration::from_millis(config.request_timeout_ms);
    let client = reqwest::Client::new();
    let resolver = HttpResolver::with_card_path(client.clone(), timeout, config.card_path.clone());
    let transport = HttpTransport::with_preference(client, config.transports.clone());
    Self::new(registry, Arc::new(resolver), Arc::new(transport), timeout)
  }

  /// The registry this dispatcher routes through.
  pub fn registry(&self) -> &dyn PeerRegistry {
    self.registry.as_ref()
  }

  /// The session's descriptor cache.
  pub fn cache(&self) -> &DescriptorCache {
    &self.cache
  }

  /// Timeout used when a dispatch does not specify one.
  pub fn default_timeout(&self) -> Duration {
    self.default_timeout
  }

  /// Send `payload` to `peer` with the default timeout.
  pub async fn dispatch(&self, peer: &str, payload: &str) -> TaskResult {
    self.dispatch_with_timeout(peer, payload, None).await
  }

  /// Send `payload` to `peer`.
  ///
  /// Resolves the peer (through the cache), sends exactly one request and
  /// extracts the result. The only resend happens when a cached descriptor
  /// turns out to be stale: the connection is refused, so the request was
  /// never delivered. In that case the peer is re-resolved once and the
  /// request is sent again.
  #[instrument(name = "dispatch", skip(self, payload, timeout))]
  pub async fn dispatch_with_timeout(
    &self,
    peer: &str,
    payload: &str,
    timeout: Option<Duration>,
  ) -> TaskResult {
    let timeout = timeout.unwrap_or(self.default_timeout);

    let Some(base_url) = self.registry.address(peer).cloned() else {
      error!(peer = %peer, "dispatch_failed: unknown peer");
      return TaskResult::transport_failure(ErrorKind::UnknownPeer {
        peer: peer.to_string(),
      });
    };

    let (target, from_cache) = match self.descriptor(peer, &base_url).await {
      Ok(found) => found,
      Err(e) => {
        error!(peer = %peer, error = %e, "dispatch_failed");
        return TaskResult::transport_failure(e);
      }
    };

    let request = TaskRequest::new(target, payload);
    let sent = match self.send(&request, timeout).await {
      Err(TransportError::ConnectionRefused { message }) if from_cache => {
        warn!(
          peer = %peer,
          correlation_id = %request.correlation_id,
          error = %message,
          "cached descriptor stale, re-resolving"
        );
        self.cache.invalidate(peer);
        match self.resolve_fresh(peer, &base_url).await {
          Ok(target) => {
            let retry = TaskRequest {
              target,
              ..request.clone()
            };
            self.send(&retry, timeout).await
          }
          Err(e) => {
            error!(peer = %peer, error = %e, "dispatch_failed");
            return TaskResult::transport_failure(e);
          }
        }
      }
      other => other,
    };

    let result = match sent {
      Ok(body) => extract(&body),
      Err(e) => TaskResult::transport_failure(e),
    };

    match &result {
      TaskResult::Success { text } => info!(
        peer = %peer,
        correlation_id = %request.correlation_id,
        bytes = text.len(),
        "dispatch_completed"
      ),
      TaskResult::EmptyOrMalformed { reason, .. } => warn!(
        peer = %peer,
        correlation_id = %request.correlation_id,
        reason = %reason,
        "dispatch_completed: empty or malformed response"
      ),
      TaskResult::TransportFailure { cause } => error!(
        peer = %peer,
        correlation_id = %request.correlation_id,
        error = %cause,
        "dispatch_failed"
      ),
    }

    result
  }

  /// Resolve a descriptor, preferring the cache. Returns whether it was cached.
  async fn descriptor(
    &self,
    peer: &str,
    base_url: &Url,
  ) -> Result<(Arc<PeerDescriptor>, bool), ResolveError> {
    if let Some(cached) = self.cache.get(peer) {
      return Ok((cached, true));
    }
    Ok((self.resolve_fresh(peer, base_url).await?, false))
  }

  async fn resolve_fresh(
    &self,
    peer: &str,
    base_url: &Url,
  ) -> Result<Arc<PeerDescriptor>, ResolveError> {
    let descriptor = self.resolver.resolve(peer, base_url).await?;
    Ok(self.cache.insert(descriptor))
  }

  async fn send(&self, request: &TaskRequest, timeout: Duration) -> Result<String, TransportError> {
    info!(
      peer = %request.target.peer,
      correlation_id = %request.correlation_id,
      timeout_ms = timeout.as_millis() as u64,
      "dispatch_started"
    );
    self.transport.send(request, timeout).await
  }

  /// Resolve a peer's descriptor without sending anything.
  pub async fn describe(&self, peer: &str) -> Result<Arc<PeerDescriptor>, ErrorKind> {
    let base_url = self
      .registry
      .address(peer)
      .cloned()
      .ok_or_else(|| ErrorKind::UnknownPeer {
        peer: peer.to_string(),
      })?;
    let (descriptor, _) = self.descriptor(peer, &base_url).await?;
    Ok(descriptor)
  }
}

#[cfg(test)]
mod tests {
  use std::collections::VecDeque;
  use std::sync::Mutex;
  use std::sync::atomic::{AtomicUsize, Ordering};

  use async_trait::async_trait;
  use switchboard_registry::StaticRegistry;
  use switchboard_resolver::parse_descriptor;

  use super::*;

  /// Mock resolver counting calls and serving a fixed card per peer.
  struct MockResolver {
    calls: AtomicUsize,
    fail: bool,
  }

  impl MockResolver {
    fn new() -> Self {
      Self {
        calls: AtomicUsize::new(0),
        fail: false,
      }
    }

    fn failing() -> Self {
      Self {
        calls: AtomicUsize::new(0),
        fail: true,
      }
    }
  }

  #[async_trait]
  impl DescriptorResolver for MockResolver {
    async fn resolve(&self, peer: &str, base_url: &Url) -> Result<PeerDescriptor, ResolveError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if self.fail {
        return Err(ResolveError::DescriptorUnreachable {
          peer: peer.to_string(),
          message: "connection refused".to_string(),
        });
      }
      parse_descriptor(
        peer,
        &format!(r#"{{ "name": "{peer}", "url": "{base_url}" }}"#),
      )
    }
  }

  /// Mock transport replaying scripted outcomes, then echoing the payload.
  struct ScriptedTransport {
    script: Mutex<VecDeque<Result<String, TransportError>>>,
    sent: Mutex<Vec<String>>,
  }

  impl ScriptedTransport {
    fn new(script: Vec<Result<String, TransportError>>) -> Self {
      Self {
        script: Mutex::new(script.into()),
        sent: Mutex::new(Vec::new()),
      }
    }

    fn sent(&self) -> Vec<String> {
      self.sent.lock().unwrap().clone()
    }
  }

  #[async_trait]
  impl Transport for ScriptedTransport {
    async fn send(
      &self,
      request: &TaskRequest,
      _timeout: Duration,
    ) -> Result<String, TransportError> {
      self.sent.lock().unwrap().push(request.payload.clone());
      if let Some(next) = self.script.lock().unwrap().pop_front() {
        return next;
      }
      Ok(echo_envelope(&request.payload))
    }
  }

  fn echo_envelope(text: &str) -> String {
    serde_json::json!({ "task": { "artifacts": [{ "parts": [{ "root": { "text": text } }] }] } })
      .to_string()
  }

  fn refused() -> Result<String, TransportError> {
    Err(TransportError::ConnectionRefused {
      message: "connection refused".to_string(),
    })
  }

  fn dispatcher(
    resolver: Arc<MockResolver>,
    transport: Arc<ScriptedTransport>,
  ) -> TaskDispatcher {
    let registry = StaticRegistry::new([("data", "http://localhost:11001")]).unwrap();
    TaskDispatcher::new(
      Arc::new(registry),
      resolver,
      transport,
      Duration::from_secs(60),
    )
  }

  #[tokio::test]
  async fn test_echo_round_trip() {
    let resolver = Arc::new(MockResolver::new());
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let dispatcher = dispatcher(resolver.clone(), transport.clone());

    let result = dispatcher.dispatch("data", "fetch customer 5").await;
    assert_eq!(result, TaskResult::success("fetch customer 5"));
  }

  #[tokio::test]
  async fn test_descriptor_is_cached() {
    let resolver = Arc::new(MockResolver::new());
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let dispatcher = dispatcher(resolver.clone(), transport.clone());

    dispatcher.dispatch("data", "one").await;
    dispatcher.dispatch("data", "two").await;

    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
    assert_eq!(transport.sent(), vec!["one", "two"]);
  }

  #[tokio::test]
  async fn test_unknown_peer_is_typed_failure() {
    let resolver = Arc::new(MockResolver::new());
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let dispatcher = dispatcher(resolver.clone(), transport.clone());

    let result = dispatcher.dispatch("billing", "refund").await;
    assert_eq!(
      result,
      TaskResult::transport_failure(ErrorKind::UnknownPeer {
        peer: "billing".to_string()
      })
    );
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    assert!(transport.sent().is_empty());
  }

  #[tokio::test]
  async fn test_unreachable_descriptor_never_sends() {
    let resolver = Arc::new(MockResolver::failing());
    let transport = Arc::new(ScriptedTransport::new(vec![]));
    let dispatcher = dispatcher(resolver.clone(), transport.clone());

    let result = dispatcher.dispatch("data", "fetch").await;
    assert!(matches!(
      result,
      TaskResult::TransportFailure {
        cause: ErrorKind::DescriptorUnreachable { .. }
      }
    ));
    assert!(transport.sent().is_empty());
  }

  #[tokio::test]
  async fn test_stale_cache_re_resolves_once() {
    let resolver = Arc::new(MockResolver::new());
    // First dispatch succeeds; second is refused once, then echoes.
    let transport = Arc::new(ScriptedTransport::new(vec![
      Ok(echo_envelope("warm")),
      refused(),
    ]));
    let dispatcher = dispatcher(resolver.clone(), transport.clone());

    dispatcher.dispatch("data", "warm").await;
    let result = dispatcher.dispatch("data", "again").await;

    assert_eq!(result, TaskResult::success("again"));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 2);
    assert_eq!(transport.sent(), vec!["warm", "again", "again"]);
  }

  #[tokio::test]
  async fn test_fresh_descriptor_is_not_retried() {
    let resolver = Arc::new(MockResolver::new());
    let transport = Arc::new(ScriptedTransport::new(vec![refused()]));
    let dispatcher = dispatcher(resolver.clone(), transport.clone());

    let result = dispatcher.dispatch("data", "fetch").await;
    assert!(matches!(
      result,
      TaskResult::TransportFailure {
        cause: ErrorKind::ConnectionRefused { .. }
      }
    ));
    assert_eq!(transport.sent().len(), 1);
  }

  #[tokio::test]
  async fn test_timeout_is_not_retried() {
    let resolver = Arc::new(MockResolver::new());
    let transport = Arc::new(ScriptedTransport::new(vec![
      Ok(echo_envelope("warm")),
      Err(TransportError::Timeout { timeout_ms: 10 }),
    ]));
    let dispatcher = dispatcher(resolver.clone(), transport.clone());

    dispatcher.dispatch("data", "warm").await;
    let result = dispatcher.dispatch("data", "slow").await;

    assert_eq!(
      result,
      TaskResult::transport_failure(ErrorKind::Timeout { timeout_ms: 10 })
    );
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_malformed_body_keeps_raw() {
    let resolver = Arc::new(MockResolver::new());
    let transport = Arc::new(ScriptedTransport::new(vec![Ok(
      r#"{"task": null}"#.to_string(),
    )]));
    let dispatcher = dispatcher(resolver, transport);

    match dispatcher.dispatch("data", "fetch").await {
      TaskResult::EmptyOrMalformed { raw, .. } => assert_eq!(raw, r#"{"task": null}"#),
      other => panic!("expected EmptyOrMalformed, got {:?}", other),
    }
  }
}
