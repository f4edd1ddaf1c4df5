//! Error types for workflow execution.

use switchboard_dispatch::TaskResult;
use switchboard_workflow::{AggregateEntry, ContractViolation, TemplateError};
use thiserror::Error;

/// Why a workflow did not complete.
///
/// Carries the first root cause; later steps never run after a failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorkflowError {
  /// The definition was rejected before any dispatch.
  #[error("contract violation: {0}")]
  ContractViolation(#[from] ContractViolation),

  /// A single or chained step did not succeed.
  #[error("step {index} ('{peer}') failed: {}", .cause.describe())]
  StepFailed {
    index: usize,
    peer: String,
    cause: TaskResult,
  },

  /// Every item of a fan-out step failed.
  #[error("step {index} ('{peer}'): all {} items failed", .failures.len())]
  AllItemsFailed {
    index: usize,
    peer: String,
    failures: Vec<AggregateEntry>,
  },

  /// A payload template or filter could not be evaluated.
  #[error("step {index}: template error: {source}")]
  Template {
    index: usize,
    #[source]
    source: TemplateError,
  },
}

/// A planner could not produce a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
  /// The request cannot be served by any known workflow.
  #[error("no workflow for request: {message}")]
  NoWorkflow { message: String },

  /// The planner itself failed.
  #[error("planner failed: {message}")]
  Planner { message: String },
}

/// Errors surfaced by the [`Router`](crate::Router).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
  #[error(transparent)]
  Plan(#[from] PlanError),

  #[error(transparent)]
  Workflow(#[from] WorkflowError),
}
