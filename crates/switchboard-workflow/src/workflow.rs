use std::time::Duration;

use switchboard_config::{StepDef, WorkflowDef};
use switchboard_registry::PeerRegistry;

use crate::error::ContractViolation;
use crate::filter::ItemFilter;
use crate::items::{DEFAULT_ID_FIELD, normalize_items};
use crate::step::{Step, StepKind};
use crate::template;

/// A locked workflow ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct Workflow {
  pub workflow_id: String,
  pub name: String,
  pub presenter: Option<String>,
  pub steps: Vec<Step>,
}

impl Workflow {
  /// Validate a definition against a registry.
  ///
  /// `default_presenter` applies when the definition names none.
  pub fn lock(
    def: &WorkflowDef,
    registry: &dyn PeerRegistry,
    default_presenter: Option<&str>,
  ) -> Result<Self, ContractViolation> {
    if def.steps.is_empty() {
      return Err(ContractViolation::EmptyWorkflow {
        workflow_id: def.workflow_id.clone(),
      });
    }

    let steps = def
      .steps
      .iter()
      .enumerate()
      .map(|(index, step)| lock_step(index, step, registry))
      .collect::<Result<Vec<_>, _>>()?;

    // Guarded by the emptiness check above.
    let Some(last) = steps.last() else {
      return Err(ContractViolation::EmptyWorkflow {
        workflow_id: def.workflow_id.clone(),
      });
    };

    if let StepKind::FanOut { .. } = last.kind {
      return Err(ContractViolation::TerminalStep {
        index: last.index,
        kind: last.kind.name(),
      });
    }

    let presenter = def
      .presenter
      .clone()
      .or_else(|| default_presenter.map(str::to_string));

    match &presenter {
      Some(expected) if last.peer != *expected => {
        return Err(ContractViolation::PresenterMismatch {
          expected: expected.clone(),
          actual: last.peer.clone(),
        });
      }
      _ => {}
    }

    Ok(Self {
      workflow_id: def.workflow_id.clone(),
      name: def.name.clone(),
      presenter,
      steps,
    })
  }

  pub fn get_step(&self, index: usize) -> Option<&Step> {
    self.steps.get(index)
  }

  /// Peers this workflow dispatches to, in first-use order.
  pub fn peers(&self) -> Vec<&str> {
    let mut peers: Vec<&str> = Vec::new();
    for step in &self.steps {
      if !peers.contains(&step.peer.as_str()) {
        peers.push(&step.peer);
      }
    }
    peers
  }
}

fn lock_step(
  index: usize,
  def: &StepDef,
  registry: &dyn PeerRegistry,
) -> Result<Step, ContractViolation> {
  if !registry.contains(&def.peer) {
    return Err(ContractViolation::UnknownPeer {
      index,
      peer: def.peer.clone(),
    });
  }

  let invalid_template = |message| ContractViolation::InvalidTemplate { index, message };

  let kind = match &def.kind {
    switchboard_config::StepKind::Single { payload } => {
      template::check(payload).map_err(invalid_template)?;
      StepKind::Single {
        payload: payload.clone(),
      }
    }
    switchboard_config::StepKind::Chained { payload } => {
      if index == 0 {
        return Err(ContractViolation::ChainedFirst { index });
      }
      template::check(payload).map_err(invalid_template)?;
      StepKind::Chained {
        payload: payload.clone(),
      }
    }
    switchboard_config::StepKind::FanOut {
      items,
      id_field,
      payload,
      filter,
    } => {
      if index == 0 && items.is_none() {
        return Err(ContractViolation::FanOutWithoutItems { index });
      }
      template::check(payload).map_err(invalid_template)?;
      let filter = filter
        .as_deref()
        .map(ItemFilter::new)
        .transpose()
        .map_err(|message| ContractViolation::InvalidFilter { index, message })?;

      let items = items.as_ref().map(normalize_items);

      StepKind::FanOut {
        items,
        id_field: id_field
          .clone()
          .unwrap_or_else(|| DEFAULT_ID_FIELD.to_string()),
        payload: payload.clone(),
        filter,
      }
    }
  };

  Ok(Step {
    index,
    name: def.name.clone().unwrap_or_else(|| index.to_string()),
    peer: def.peer.clone(),
    kind,
    timeout: def.timeout_ms.map(Duration::from_millis),
    max_retry_attempts: def.max_retry_attempts.unwrap_or(0),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use switchboard_registry::StaticRegistry;

  fn registry() -> StaticRegistry {
    StaticRegistry::new([
      ("router", "http://localhost:11000"),
      ("data", "http://localhost:11001"),
      ("support", "http://localhost:11002"),
    ])
    .unwrap()
  }

  fn def(steps: serde_json::Value) -> WorkflowDef {
    serde_json::from_value(json!({
      "workflow_id": "wf-1",
      "name": "test",
      "steps": steps
    }))
    .unwrap()
  }

  #[test]
  fn test_lock_single_then_chained() {
    let def = def(json!([
      { "kind": "single", "peer": "data", "payload": "Get customer information for ID 1" },
      { "kind": "chained", "peer": "support", "timeout_ms": 500, "max_retry_attempts": 2 }
    ]));

    let workflow = Workflow::lock(&def, &registry(), Some("support")).unwrap();
    assert_eq!(workflow.steps.len(), 2);
    assert_eq!(workflow.presenter.as_deref(), Some("support"));
    assert_eq!(workflow.steps[0].name, "0");
    assert_eq!(workflow.steps[1].kind.payload(), "{{ previous }}");
    assert_eq!(workflow.steps[1].timeout, Some(Duration::from_millis(500)));
    assert_eq!(workflow.steps[1].max_retry_attempts, 2);
    assert_eq!(workflow.peers(), vec!["data", "support"]);
  }

  #[test]
  fn test_empty_workflow_is_rejected() {
    let err = Workflow::lock(&def(json!([])), &registry(), None).unwrap_err();
    assert!(matches!(err, ContractViolation::EmptyWorkflow { .. }));
  }

  #[test]
  fn test_trailing_fan_out_is_rejected() {
    let def = def(json!([
      { "kind": "single", "peer": "data", "payload": "List all active customers" },
      { "kind": "fan_out", "peer": "data", "payload": "history for {{ item }}" }
    ]));

    let err = Workflow::lock(&def, &registry(), None).unwrap_err();
    assert_eq!(
      err,
      ContractViolation::TerminalStep {
        index: 1,
        kind: "fan_out"
      }
    );
  }

  #[test]
  fn test_presenter_must_be_last() {
    let def = def(json!([
      { "kind": "single", "peer": "support", "payload": "help" },
      { "kind": "chained", "peer": "data" }
    ]));

    let err = Workflow::lock(&def, &registry(), Some("support")).unwrap_err();
    assert_eq!(
      err,
      ContractViolation::PresenterMismatch {
        expected: "support".to_string(),
        actual: "data".to_string()
      }
    );

    // Without a presenter any single/chained terminal step is fine.
    assert!(Workflow::lock(&def, &registry(), None).is_ok());
  }

  #[test]
  fn test_first_step_needs_its_own_input() {
    let chained = def(json!([{ "kind": "chained", "peer": "support" }]));
    assert_eq!(
      Workflow::lock(&chained, &registry(), None).unwrap_err(),
      ContractViolation::ChainedFirst { index: 0 }
    );

    let fan_out = def(json!([
      { "kind": "fan_out", "peer": "data", "payload": "{{ item }}" },
      { "kind": "chained", "peer": "support" }
    ]));
    assert_eq!(
      Workflow::lock(&fan_out, &registry(), None).unwrap_err(),
      ContractViolation::FanOutWithoutItems { index: 0 }
    );

    let static_items = def(json!([
      { "kind": "fan_out", "peer": "data", "items": ["1", " 2", "1", ""], "payload": "{{ item }}" },
      { "kind": "chained", "peer": "support" }
    ]));
    let workflow = Workflow::lock(&static_items, &registry(), None).unwrap();
    match &workflow.steps[0].kind {
      StepKind::FanOut { items, id_field, .. } => {
        assert_eq!(items.as_deref(), Some(&["1".to_string(), "2".to_string()][..]));
        assert_eq!(id_field, "id");
      }
      other => panic!("expected fan-out, got {:?}", other),
    }
  }

  #[test]
  fn test_static_items_keep_commas() {
    let def = def(json!([
      { "kind": "fan_out", "peer": "data", "items": ["Doe, Jane", "Smith, John", "Doe, Jane"], "payload": "{{ item }}" },
      { "kind": "chained", "peer": "support" }
    ]));

    let workflow = Workflow::lock(&def, &registry(), None).unwrap();
    match &workflow.steps[0].kind {
      StepKind::FanOut { items, .. } => assert_eq!(
        items.as_deref(),
        Some(&["Doe, Jane".to_string(), "Smith, John".to_string()][..])
      ),
      other => panic!("expected fan-out, got {:?}", other),
    }
  }

  #[test]
  fn test_unknown_peer_is_rejected() {
    let def = def(json!([{ "kind": "single", "peer": "billing", "payload": "x" }]));
    assert_eq!(
      Workflow::lock(&def, &registry(), None).unwrap_err(),
      ContractViolation::UnknownPeer {
        index: 0,
        peer: "billing".to_string()
      }
    );
  }

  #[test]
  fn test_invalid_template_and_filter_are_rejected() {
    let bad_template = def(json!([{ "kind": "single", "peer": "data", "payload": "{{ request " }]));
    assert!(matches!(
      Workflow::lock(&bad_template, &registry(), None).unwrap_err(),
      ContractViolation::InvalidTemplate { index: 0, .. }
    ));

    let bad_filter = def(json!([
      { "kind": "single", "peer": "data", "payload": "List all active customers" },
      { "kind": "fan_out", "peer": "data", "payload": "{{ item }}", "filter": "status ==" },
      { "kind": "chained", "peer": "support" }
    ]));
    assert!(matches!(
      Workflow::lock(&bad_filter, &registry(), None).unwrap_err(),
      ContractViolation::InvalidFilter { index: 1, .. }
    ));
  }
}
