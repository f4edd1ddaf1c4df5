//! Peer descriptor document.
//!
//! Cards in the wild use camelCase (`defaultInputModes`, `preferredTransport`)
//! while hand-written fixtures often use snake_case. Both spellings parse.

use serde::{Deserialize, Serialize};
use switchboard_config::TransportKind;
use url::Url;

use crate::error::ResolveError;

/// Capability flags advertised by a peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerCapabilities {
  #[serde(default)]
  pub streaming: bool,
  #[serde(default, alias = "pushNotifications")]
  pub push_notifications: bool,
}

/// A skill advertised by a peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerSkill {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub tags: Vec<String>,
}

/// An additional endpoint a peer accepts requests on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInterface {
  pub url: Url,
  pub transport: TransportKind,
}

/// A resolved peer descriptor. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerDescriptor {
  /// Registry name the descriptor was resolved under.
  pub peer: String,
  /// Display name from the card.
  pub name: String,
  /// Endpoint task requests are sent to.
  pub url: Url,
  pub description: String,
  pub version: String,
  pub capabilities: PeerCapabilities,
  pub default_input_modes: Vec<String>,
  pub default_output_modes: Vec<String>,
  pub preferred_transport: TransportKind,
  pub additional_interfaces: Vec<PeerInterface>,
  pub skills: Vec<PeerSkill>,
}

impl PeerDescriptor {
  /// Transports the peer accepts, preferred first, without duplicates.
  pub fn supported_transports(&self) -> Vec<TransportKind> {
    let mut kinds = vec![self.preferred_transport];
    for interface in &self.additional_interfaces {
      if !kinds.contains(&interface.transport) {
        kinds.push(interface.transport);
      }
    }
    kinds
  }

  /// Endpoint for a given transport, if the peer supports it.
  pub fn endpoint(&self, transport: TransportKind) -> Option<&Url> {
    if transport == self.preferred_transport {
      return Some(&self.url);
    }
    self
      .additional_interfaces
      .iter()
      .find(|i| i.transport == transport)
      .map(|i| &i.url)
  }
}

/// Raw card as found on the wire, before validation.
#[derive(Debug, Deserialize)]
struct RawCard {
  name: Option<String>,
  url: Option<String>,
  #[serde(default)]
  description: String,
  #[serde(default)]
  version: String,
  #[serde(default)]
  capabilities: PeerCapabilities,
  #[serde(default, alias = "defaultInputModes")]
  default_input_modes: Vec<String>,
  #[serde(default, alias = "defaultOutputModes")]
  default_output_modes: Vec<String>,
  #[serde(default, alias = "preferredTransport")]
  preferred_transport: Option<TransportKind>,
  #[serde(default, alias = "additionalInterfaces")]
  additional_interfaces: Vec<PeerInterface>,
  #[serde(default)]
  skills: Vec<PeerSkill>,
}

/// Parse and validate a descriptor document.
///
/// A missing `preferred_transport` means JSON-RPC, the protocol default.
pub fn parse_descriptor(peer: &str, body: &str) -> Result<PeerDescriptor, ResolveError> {
  let malformed = |message: String| ResolveError::DescriptorMalformed {
    peer: peer.to_string(),
    message,
  };

  let raw: RawCard = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;

  let name = raw
    .name
    .filter(|n| !n.trim().is_empty())
    .ok_or_else(|| malformed("missing field 'name'".to_string()))?;

  let url = raw
    .url
    .filter(|u| !u.trim().is_empty())
    .ok_or_else(|| malformed("missing field 'url'".to_string()))?;
  let url = Url::parse(&url).map_err(|e| malformed(format!("invalid url '{}': {}", url, e)))?;
  if !matches!(url.scheme(), "http" | "https") {
    return Err(malformed(format!(
      "unsupported url scheme '{}'",
      url.scheme()
    )));
  }

  Ok(PeerDescriptor {
    peer: peer.to_string(),
    name,
    url,
    description: raw.description,
    version: raw.version,
    capabilities: raw.capabilities,
    default_input_modes: raw.default_input_modes,
    default_output_modes: raw.default_output_modes,
    preferred_transport: raw.preferred_transport.unwrap_or(TransportKind::Jsonrpc),
    additional_interfaces: raw.additional_interfaces,
    skills: raw.skills,
  })
}
