use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, read_json};

/// A canned request sent by the scenario runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDef {
  pub title: String,
  pub query: String,

  /// Peer that receives the query. Defaults to the file-level target.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub peer: Option<String>,
}

/// A list of scenarios run in order against one entry peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
  #[serde(default = "default_target")]
  pub target: String,

  /// Pause between scenarios, for upstream quota limits.
  #[serde(default)]
  pub pause_ms: u64,

  pub scenarios: Vec<ScenarioDef>,
}

fn default_target() -> String {
  "router".to_string()
}

impl ScenarioFile {
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    read_json(path.as_ref())
  }

  /// Peer a given scenario is sent to.
  pub fn target_for<'a>(&'a self, scenario: &'a ScenarioDef) -> &'a str {
    scenario.peer.as_deref().unwrap_or(&self.target)
  }
}
