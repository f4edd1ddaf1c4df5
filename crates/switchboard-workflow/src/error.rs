use thiserror::Error;

/// A workflow definition breaks the execution contract.
///
/// Raised while locking, before any dispatch happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractViolation {
  #[error("workflow '{workflow_id}' has no steps")]
  EmptyWorkflow { workflow_id: String },

  #[error("terminal step {index} is a {kind} step; workflows must end on a single or chained dispatch")]
  TerminalStep { index: usize, kind: &'static str },

  #[error("terminal step targets '{actual}' but the presenter is '{expected}'")]
  PresenterMismatch { expected: String, actual: String },

  #[error("step {index} is chained but has no previous step")]
  ChainedFirst { index: usize },

  #[error("step {index} is a fan-out with no items and no previous step")]
  FanOutWithoutItems { index: usize },

  #[error("step {index} targets unknown peer '{peer}'")]
  UnknownPeer { index: usize, peer: String },

  #[error("step {index} has an invalid template: {message}")]
  InvalidTemplate { index: usize, message: String },

  #[error("step {index} has an invalid filter: {message}")]
  InvalidFilter { index: usize, message: String },
}

/// Rendering a template or evaluating a filter failed at run time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TemplateError {
  pub message: String,
}

impl From<minijinja::Error> for TemplateError {
  fn from(e: minijinja::Error) -> Self {
    Self {
      message: e.to_string(),
    }
  }
}
