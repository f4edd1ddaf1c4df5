use thiserror::Error;

/// Errors that can occur while resolving a peer descriptor.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
  /// The descriptor could not be fetched (connection, timeout, non-2xx).
  #[error("descriptor for '{peer}' unreachable: {message}")]
  DescriptorUnreachable { peer: String, message: String },

  /// The descriptor was fetched but is missing fields or has invalid values.
  #[error("descriptor for '{peer}' malformed: {message}")]
  DescriptorMalformed { peer: String, message: String },
}
