use std::collections::BTreeMap;

use switchboard_config::RouterConfig;
use url::Url;

use crate::error::RegistryError;
use crate::registry::PeerRegistry;

/// In-memory registry validated at construction time.
///
/// Addresses must be absolute `http`/`https` URLs with a host. A trailing
/// slash is normalized away so that well-known paths join cleanly.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
  peers: BTreeMap<String, Url>,
}

impl StaticRegistry {
  /// Build a registry from `(name, address)` pairs.
  pub fn new<I, N, A>(peers: I) -> Result<Self, RegistryError>
  where
    I: IntoIterator<Item = (N, A)>,
    N: Into<String>,
    A: AsRef<str>,
  {
    let mut map = BTreeMap::new();
    for (name, address) in peers {
      let name = name.into();
      let url = Self::parse_address(&name, address.as_ref())?;
      map.insert(name, url);
    }
    Ok(Self { peers: map })
  }

  /// Build a registry from the `peers` table of a router config.
  pub fn from_config(config: &RouterConfig) -> Result<Self, RegistryError> {
    Self::new(config.peers.iter().map(|(k, v)| (k.clone(), v.as_str())))
  }

  fn parse_address(name: &str, address: &str) -> Result<Url, RegistryError> {
    if name.trim().is_empty() {
      return Err(RegistryError::EmptyName);
    }

    let invalid = |message: String| RegistryError::InvalidAddress {
      name: name.to_string(),
      message,
    };

    let trimmed = address.trim();
    if trimmed.is_empty() {
      return Err(invalid("address is empty".to_string()));
    }

    let url = Url::parse(trimmed.trim_end_matches('/')).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
      return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().is_none_or(str::is_empty) {
      return Err(invalid("address has no host".to_string()));
    }

    Ok(url)
  }
}

impl PeerRegistry for StaticRegistry {
  fn address(&self, name: &str) -> Option<&Url> {
    self.peers.get(name)
  }

  fn names(&self) -> Vec<&str> {
    self.peers.keys().map(String::as_str).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_lookup_registered_peer() {
    let registry = StaticRegistry::new([
      ("data", "http://localhost:11001"),
      ("support", "http://localhost:11002/"),
    ])
    .unwrap();

    assert_eq!(
      registry.address("data").map(Url::as_str),
      Some("http://localhost:11001/")
    );
    assert!(registry.contains("support"));
    assert!(!registry.contains("billing"));
    assert_eq!(registry.names(), vec!["data", "support"]);
  }

  #[test]
  fn test_rejects_empty_address() {
    let result = StaticRegistry::new([("data", "  ")]);
    assert!(matches!(result, Err(RegistryError::InvalidAddress { .. })));
  }

  #[test]
  fn test_rejects_non_http_scheme() {
    let result = StaticRegistry::new([("data", "ftp://localhost:11001")]);
    assert!(matches!(result, Err(RegistryError::InvalidAddress { .. })));
  }

  #[test]
  fn test_rejects_relative_address() {
    let result = StaticRegistry::new([("data", "localhost/agent")]);
    assert!(matches!(result, Err(RegistryError::InvalidAddress { .. })));
  }

  #[test]
  fn test_rejects_empty_name() {
    let result = StaticRegistry::new([("", "http://localhost:11001")]);
    assert!(matches!(result, Err(RegistryError::EmptyName)));
  }

  #[test]
  fn test_from_config() {
    let registry = StaticRegistry::from_config(&RouterConfig::local_demo()).unwrap();
    assert_eq!(registry.names(), vec!["data", "router", "support"]);
  }
}
