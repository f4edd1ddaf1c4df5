use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, read_json};
use crate::transport::TransportKind;

/// Path, relative to a peer's base address, of its self-describing card.
pub const AGENT_CARD_WELL_KNOWN_PATH: &str = "/.well-known/agent-card.json";

/// Per-request timeout applied when neither the config nor a step overrides it.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 60_000;

/// Configuration for one routing session.
///
/// ```json
/// {
///   "peers": {
///     "data": "http://localhost:11001",
///     "support": "http://localhost:11002"
///   },
///   "presenter": "support",
///   "request_timeout_ms": 60000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
  /// Logical peer name -> base address.
  pub peers: BTreeMap<String, String>,

  /// Per-request timeout for descriptor fetches and task sends.
  #[serde(default = "default_timeout_ms")]
  pub request_timeout_ms: u64,

  /// Path of the descriptor document relative to each base address.
  #[serde(default = "default_card_path")]
  pub card_path: String,

  /// Peer that produces user-facing text. Workflows must end on it.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub presenter: Option<String>,

  /// Client transport preference, most preferred first.
  #[serde(default = "TransportKind::default_preference")]
  pub transports: Vec<TransportKind>,
}

fn default_timeout_ms() -> u64 {
  DEFAULT_REQUEST_TIMEOUT_MS
}

fn default_card_path() -> String {
  AGENT_CARD_WELL_KNOWN_PATH.to_string()
}

impl RouterConfig {
  /// Load a router config from a JSON file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    read_json(path.as_ref())
  }

  /// The three-agent customer support layout: a router in front of a
  /// data agent and a support (presentation) agent, all on localhost.
  pub fn local_demo() -> Self {
    let mut peers = BTreeMap::new();
    peers.insert("router".to_string(), "http://localhost:11000".to_string());
    peers.insert("data".to_string(), "http://localhost:11001".to_string());
    peers.insert("support".to_string(), "http://localhost:11002".to_string());

    Self {
      peers,
      request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
      card_path: default_card_path(),
      presenter: Some("support".to_string()),
      transports: TransportKind::default_preference(),
    }
  }
}
