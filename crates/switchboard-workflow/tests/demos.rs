//! The shipped demo workflows lock against the local demo peers.

use switchboard_config::{RouterConfig, WorkflowDef};
use switchboard_registry::StaticRegistry;
use switchboard_workflow::{StepKind, Workflow};

fn lock(source: &str) -> Workflow {
  let config = RouterConfig::local_demo();
  let registry = StaticRegistry::from_config(&config).unwrap();
  let def: WorkflowDef = serde_json::from_str(source).unwrap();
  Workflow::lock(&def, &registry, config.presenter.as_deref()).unwrap()
}

#[test]
fn test_customer_help_locks() {
  let workflow = lock(include_str!("../../../demos/customer-help.json"));
  assert_eq!(workflow.presenter.as_deref(), Some("support"));
  assert_eq!(workflow.steps[1].max_retry_attempts, 1);
}

#[test]
fn test_open_tickets_locks() {
  let workflow = lock(include_str!("../../../demos/open-tickets.json"));
  assert_eq!(workflow.peers(), vec!["data", "support"]);
  match &workflow.steps[1].kind {
    StepKind::FanOut { items, filter, .. } => {
      assert!(items.is_none());
      assert_eq!(filter.as_ref().map(|f| f.source()), Some("status == 'open'"));
    }
    other => panic!("expected fan-out, got {:?}", other),
  }
}
