//! Switchboard Resolver
//!
//! Fetches a peer's self-describing card from a well-known path and parses
//! it into a [`PeerDescriptor`]. Resolved descriptors are kept in a
//! [`DescriptorCache`] for the lifetime of a routing session.

mod cache;
mod descriptor;
mod error;
mod resolver;

pub use cache::DescriptorCache;
pub use descriptor::{PeerCapabilities, PeerDescriptor, PeerInterface, PeerSkill, parse_descriptor};
pub use error::ResolveError;
pub use resolver::{DescriptorResolver, HttpResolver, card_url};
