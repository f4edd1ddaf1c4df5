use url::Url;

/// Read-only mapping from logical peer name to base address.
///
/// Built once per routing session and shared across concurrent dispatches.
pub trait PeerRegistry: Send + Sync {
  /// Base address of a peer, if known.
  fn address(&self, name: &str) -> Option<&Url>;

  /// All registered peer names, sorted.
  fn names(&self) -> Vec<&str>;

  /// Whether a peer with this name is registered.
  fn contains(&self, name: &str) -> bool {
    self.address(name).is_some()
  }
}
