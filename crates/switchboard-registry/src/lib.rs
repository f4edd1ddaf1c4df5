mod error;
mod registry;
mod static_registry;

pub use error::RegistryError;
pub use registry::PeerRegistry;
pub use static_registry::StaticRegistry;
pub use url::Url;
