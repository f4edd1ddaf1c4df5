use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, read_json};
use crate::step::StepDef;

/// An ordered workflow definition, as produced by a planner or read from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDef {
  pub workflow_id: String,
  pub name: String,

  /// Presentation peer the final step must target. Falls back to the
  /// router config's presenter when absent.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub presenter: Option<String>,

  pub steps: Vec<StepDef>,
}

impl WorkflowDef {
  /// Load a workflow definition from a JSON file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    read_json(path.as_ref())
  }
}
