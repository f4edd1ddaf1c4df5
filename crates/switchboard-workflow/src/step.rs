use std::time::Duration;

use crate::filter::ItemFilter;

/// A validated workflow step.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
  /// Position within the workflow, zero-based.
  pub index: usize,
  pub name: String,
  pub peer: String,
  pub kind: StepKind,
  /// Per-dispatch timeout. `None` means the dispatcher default.
  pub timeout: Option<Duration>,
  pub max_retry_attempts: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepKind {
  Single {
    payload: String,
  },
  Chained {
    payload: String,
  },
  FanOut {
    /// Static items. `None` means parse the previous step's output.
    items: Option<Vec<String>>,
    id_field: String,
    payload: String,
    filter: Option<ItemFilter>,
  },
}

impl StepKind {
  pub fn name(&self) -> &'static str {
    match self {
      StepKind::Single { .. } => "single",
      StepKind::Chained { .. } => "chained",
      StepKind::FanOut { .. } => "fan_out",
    }
  }

  pub fn payload(&self) -> &str {
    match self {
      StepKind::Single { payload }
      | StepKind::Chained { payload }
      | StepKind::FanOut { payload, .. } => payload,
    }
  }
}
