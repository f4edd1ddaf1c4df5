//! Workflow execution results.

use switchboard_workflow::AggregateResult;

use crate::error::WorkflowError;

/// Output of one completed step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
  pub index: usize,
  pub name: String,
  pub peer: String,
  /// Text handed to the next step as `previous`.
  pub output: String,
  /// Per-item outcomes, for fan-out steps.
  pub aggregate: Option<AggregateResult>,
}

/// Result of a completed workflow run.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
  pub execution_id: String,
  pub workflow_id: String,
  /// Output of the terminal step. Never a raw aggregate.
  pub text: String,
  pub steps: Vec<StepOutput>,
}

/// Where a workflow run stands.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowState {
  Pending,
  /// Running the step at this index.
  Executing(usize),
  Failed(WorkflowError),
  Completed(String),
}

impl WorkflowState {
  pub fn is_terminal(&self) -> bool {
    matches!(self, WorkflowState::Failed(_) | WorkflowState::Completed(_))
  }
}

impl From<&Result<Completion, WorkflowError>> for WorkflowState {
  fn from(result: &Result<Completion, WorkflowError>) -> Self {
    match result {
      Ok(completion) => WorkflowState::Completed(completion.text.clone()),
      Err(e) => WorkflowState::Failed(e.clone()),
    }
  }
}
