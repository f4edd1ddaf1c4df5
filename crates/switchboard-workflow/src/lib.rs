//! Switchboard Workflow
//!
//! This crate provides the "locked" workflow representation for Switchboard.
//! A locked workflow is a validated form of a workflow definition that is
//! ready for execution.
//!
//! Key differences from `switchboard-config`:
//! - Every step targets a peer known to the registry
//! - The terminal step is a single or chained dispatch (never a bare fan-out)
//! - Templates and filter expressions have been compiled once
//! - Nothing has been dispatched; locking is side-effect free
//!
//! It also holds the pieces of fan-out handling that need no I/O: item list
//! parsing, the keyed [`AggregateResult`], and filter/compile.

mod aggregate;
mod error;
mod filter;
mod items;
mod step;
mod template;
mod workflow;

pub use aggregate::{AggregateEntry, AggregateResult, CompiledEntry};
pub use error::{ContractViolation, TemplateError};
pub use filter::ItemFilter;
pub use items::{DEFAULT_ID_FIELD, parse_items};
pub use step::{Step, StepKind};
pub use template::{TemplateContext, render};
pub use workflow::Workflow;
