use async_trait::async_trait;
use switchboard_config::WorkflowDef;

use crate::error::PlanError;

/// Turns a natural-language request into a workflow definition.
///
/// Deciding what to call lives behind this seam; the router only plans,
/// locks and runs.
#[async_trait]
pub trait Planner: Send + Sync {
  async fn plan(&self, request: &str) -> Result<WorkflowDef, PlanError>;
}

/// Always plans the same workflow.
#[derive(Debug, Clone)]
pub struct FixedPlanner {
  workflow: WorkflowDef,
}

impl FixedPlanner {
  pub fn new(workflow: WorkflowDef) -> Self {
    Self { workflow }
  }
}

#[async_trait]
impl Planner for FixedPlanner {
  async fn plan(&self, _request: &str) -> Result<WorkflowDef, PlanError> {
    Ok(self.workflow.clone())
  }
}
