use thiserror::Error;

/// Errors that can occur while building a peer registry.
#[derive(Debug, Error)]
pub enum RegistryError {
  /// A peer was configured with an empty name.
  #[error("peer name must not be empty")]
  EmptyName,

  /// A peer address is not an absolute http(s) URL.
  #[error("invalid address for peer '{name}': {message}")]
  InvalidAddress { name: String, message: String },
}
