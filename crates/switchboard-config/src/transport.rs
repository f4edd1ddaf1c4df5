use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire binding a peer accepts task requests on.
///
/// Agent cards spell these `JSONRPC` / `HTTP+JSON` / `GRPC`; configuration
/// files use the snake_case names. Both are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
  #[serde(alias = "JSONRPC", alias = "json_rpc", alias = "JSON-RPC")]
  Jsonrpc,
  #[serde(alias = "HTTP+JSON", alias = "http+json", alias = "rest")]
  HttpJson,
  #[serde(alias = "GRPC")]
  Grpc,
}

impl TransportKind {
  /// Default client preference: JSON-RPC first, then the HTTP+JSON binding.
  pub fn default_preference() -> Vec<TransportKind> {
    vec![TransportKind::Jsonrpc, TransportKind::HttpJson]
  }
}

impl fmt::Display for TransportKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      TransportKind::Jsonrpc => "jsonrpc",
      TransportKind::HttpJson => "http_json",
      TransportKind::Grpc => "grpc",
    };
    f.write_str(s)
  }
}
