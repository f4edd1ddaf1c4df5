//! Switchboard Config
//!
//! This crate contains the serializable configuration types for Switchboard.
//! These types describe routing sessions and workflows before they are
//! validated against a peer registry and locked for execution.
//!
//! Configuration is loaded from JSON files:
//! - the router config (peer addresses, timeouts, transport preference)
//! - workflow definitions (ordered steps)
//! - scenario files (canned requests for the demo client)

mod error;
mod router;
mod scenario;
mod step;
mod transport;
mod workflow;

pub use error::ConfigError;
pub use router::{AGENT_CARD_WELL_KNOWN_PATH, DEFAULT_REQUEST_TIMEOUT_MS, RouterConfig};
pub use scenario::{ScenarioDef, ScenarioFile};
pub use step::{StepDef, StepKind};
pub use transport::TransportKind;
pub use workflow::WorkflowDef;
