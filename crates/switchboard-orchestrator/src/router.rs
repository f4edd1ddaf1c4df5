use switchboard_dispatch::TaskDispatcher;
use switchboard_workflow::Workflow;
use tracing::{info, instrument, warn};

use crate::error::{RouteError, WorkflowError};
use crate::events::{ExecutionNotifier, NoopNotifier};
use crate::planner::Planner;
use crate::result::Completion;
use crate::sequencer::Sequencer;

/// Plans, locks and runs a workflow for each request.
pub struct Router<P: Planner, N: ExecutionNotifier = NoopNotifier> {
  planner: P,
  sequencer: Sequencer<N>,
  presenter: Option<String>,
}

impl<P: Planner> Router<P, NoopNotifier> {
  pub fn new(planner: P, dispatcher: TaskDispatcher) -> Self {
    Self::with_notifier(planner, dispatcher, NoopNotifier)
  }
}

impl<P: Planner, N: ExecutionNotifier> Router<P, N> {
  pub fn with_notifier(planner: P, dispatcher: TaskDispatcher, notifier: N) -> Self {
    Self {
      planner,
      sequencer: Sequencer::with_notifier(dispatcher, notifier),
      presenter: None,
    }
  }

  /// Require every workflow to end on this peer unless it names its own.
  pub fn with_presenter(mut self, presenter: impl Into<String>) -> Self {
    self.presenter = Some(presenter.into());
    self
  }

  pub fn sequencer(&self) -> &Sequencer<N> {
    &self.sequencer
  }

  #[instrument(name = "route", skip(self, request))]
  pub async fn route(&self, request: &str) -> Result<Completion, RouteError> {
    let def = self.planner.plan(request).await?;
    info!(
      workflow_id = %def.workflow_id,
      steps = def.steps.len(),
      "workflow_planned"
    );

    let workflow = Workflow::lock(
      &def,
      self.sequencer.dispatcher().registry(),
      self.presenter.as_deref(),
    )
    .map_err(|e| {
      warn!(workflow_id = %def.workflow_id, error = %e, "workflow_rejected");
      WorkflowError::from(e)
    })?;

    Ok(self.sequencer.run(&workflow, request).await?)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::time::Duration;

  use async_trait::async_trait;
  use serde_json::json;
  use switchboard_config::WorkflowDef;
  use switchboard_registry::{StaticRegistry, Url};
  use switchboard_resolver::{DescriptorResolver, PeerDescriptor, ResolveError, parse_descriptor};
  use switchboard_transport::{TaskRequest, Transport, TransportError};
  use switchboard_workflow::ContractViolation;

  use super::*;
  use crate::error::PlanError;
  use crate::planner::FixedPlanner;

  struct CountingResolver(AtomicUsize);

  #[async_trait]
  impl DescriptorResolver for CountingResolver {
    async fn resolve(&self, peer: &str, base_url: &Url) -> Result<PeerDescriptor, ResolveError> {
      self.0.fetch_add(1, Ordering::SeqCst);
      parse_descriptor(
        peer,
        &format!(r#"{{ "name": "{peer}", "url": "{base_url}" }}"#),
      )
    }
  }

  struct CountingTransport(AtomicUsize);

  #[async_trait]
  impl Transport for CountingTransport {
    async fn send(
      &self,
      request: &TaskRequest,
      _timeout: Duration,
    ) -> Result<String, TransportError> {
      self.0.fetch_add(1, Ordering::SeqCst);
      Ok(
        json!({ "task": { "artifacts": [{ "parts": [{ "root": { "text": request.payload } }] }] } })
          .to_string(),
      )
    }
  }

  struct Refusing;

  #[async_trait]
  impl Planner for Refusing {
    async fn plan(&self, request: &str) -> Result<WorkflowDef, PlanError> {
      Err(PlanError::NoWorkflow {
        message: request.to_string(),
      })
    }
  }

  fn parts() -> (Arc<CountingResolver>, Arc<CountingTransport>, TaskDispatcher) {
    let resolver = Arc::new(CountingResolver(AtomicUsize::new(0)));
    let transport = Arc::new(CountingTransport(AtomicUsize::new(0)));
    let registry = StaticRegistry::new([
      ("data", "http://localhost:11001"),
      ("support", "http://localhost:11002"),
    ])
    .unwrap();
    let dispatcher = TaskDispatcher::new(
      Arc::new(registry),
      resolver.clone(),
      transport.clone(),
      Duration::from_secs(5),
    );
    (resolver, transport, dispatcher)
  }

  fn def(steps: serde_json::Value) -> WorkflowDef {
    serde_json::from_value(json!({ "workflow_id": "wf", "name": "wf", "steps": steps })).unwrap()
  }

  #[tokio::test]
  async fn test_routes_through_planned_workflow() {
    let (_, transport, dispatcher) = parts();
    let planner = FixedPlanner::new(def(json!([
      { "kind": "single", "peer": "data", "payload": "lookup: {{ request }}" },
      { "kind": "chained", "peer": "support", "payload": "answer: {{ previous }}" }
    ])));
    let router = Router::new(planner, dispatcher).with_presenter("support");

    let completion = router.route("customer 5").await.unwrap();
    assert_eq!(completion.text, "answer: lookup: customer 5");
    assert_eq!(transport.0.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_trailing_fan_out_dispatches_nothing() {
    let (resolver, transport, dispatcher) = parts();
    let planner = FixedPlanner::new(def(json!([
      { "kind": "single", "peer": "data", "payload": "List all active customers" },
      { "kind": "fan_out", "peer": "data", "payload": "history {{ item }}" }
    ])));
    let router = Router::new(planner, dispatcher);

    let err = router.route("report").await.unwrap_err();
    assert_eq!(
      err,
      RouteError::Workflow(WorkflowError::ContractViolation(
        ContractViolation::TerminalStep {
          index: 1,
          kind: "fan_out"
        }
      ))
    );
    assert_eq!(resolver.0.load(Ordering::SeqCst), 0);
    assert_eq!(transport.0.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_planner_errors_pass_through() {
    let (_, transport, dispatcher) = parts();
    let router = Router::new(Refusing, dispatcher);

    let err = router.route("unknown").await.unwrap_err();
    assert!(matches!(err, RouteError::Plan(PlanError::NoWorkflow { .. })));
    assert_eq!(transport.0.load(Ordering::SeqCst), 0);
  }
}
