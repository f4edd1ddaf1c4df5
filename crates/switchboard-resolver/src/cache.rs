//! Descriptor caching for a routing session.
//!
//! Descriptors are resolved once and reused for every later dispatch to the
//! same peer. Concurrent resolutions of one peer may race; the last write wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::descriptor::PeerDescriptor;

/// Caches resolved descriptors keyed by registry name.
#[derive(Debug, Clone, Default)]
pub struct DescriptorCache {
  cache: Arc<RwLock<HashMap<String, Arc<PeerDescriptor>>>>,
}

impl DescriptorCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Get a cached descriptor.
  pub fn get(&self, peer: &str) -> Option<Arc<PeerDescriptor>> {
    let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
    cache.get(peer).cloned()
  }

  /// Insert a descriptor, replacing any previous entry for the peer.
  pub fn insert(&self, descriptor: PeerDescriptor) -> Arc<PeerDescriptor> {
    let descriptor = Arc::new(descriptor);
    let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
    cache.insert(descriptor.peer.clone(), descriptor.clone());
    descriptor
  }

  /// Drop the entry for a peer so the next lookup re-resolves it.
  pub fn invalidate(&self, peer: &str) -> bool {
    let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
    cache.remove(peer).is_some()
  }

  /// Number of cached descriptors.
  pub fn len(&self) -> usize {
    self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Clear the cache.
  pub fn clear(&self) {
    let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
    cache.clear();
  }
}
