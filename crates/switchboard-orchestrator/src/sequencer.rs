//! Workflow sequencing.
//!
//! Steps run strictly in order. A single or chained step makes one dispatch;
//! a fan-out step dispatches every item concurrently and waits for all of
//! them before the next step starts.

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use serde_json::Value;
use switchboard_dispatch::{ErrorKind, TaskDispatcher, TaskResult};
use switchboard_workflow::{
  AggregateEntry, AggregateResult, ItemFilter, Step, StepKind, TemplateContext, TemplateError,
  Workflow, parse_items, render,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::WorkflowError;
use crate::events::{ExecutionEvent, ExecutionNotifier, NoopNotifier};
use crate::result::{Completion, StepOutput, WorkflowState};

/// Runs locked workflows against a dispatcher.
///
/// Generic over `N: ExecutionNotifier` so callers choose how progress is
/// observed. `Sequencer::new` discards events.
pub struct Sequencer<N: ExecutionNotifier = NoopNotifier> {
  dispatcher: TaskDispatcher,
  notifier: N,
}

impl Sequencer<NoopNotifier> {
  pub fn new(dispatcher: TaskDispatcher) -> Self {
    Self::with_notifier(dispatcher, NoopNotifier)
  }
}

impl<N: ExecutionNotifier> Sequencer<N> {
  pub fn with_notifier(dispatcher: TaskDispatcher, notifier: N) -> Self {
    Self {
      dispatcher,
      notifier,
    }
  }

  pub fn dispatcher(&self) -> &TaskDispatcher {
    &self.dispatcher
  }

  /// Run a workflow for one request.
  #[instrument(
    name = "workflow_run",
    skip(self, workflow, request),
    fields(workflow_id = %workflow.workflow_id)
  )]
  pub async fn run(&self, workflow: &Workflow, request: &str) -> Result<Completion, WorkflowError> {
    let execution_id = uuid::Uuid::new_v4().to_string();

    info!(
      execution_id = %execution_id,
      workflow_id = %workflow.workflow_id,
      steps = workflow.steps.len(),
      "workflow_started"
    );
    self.notifier.notify(ExecutionEvent::WorkflowStarted {
      execution_id: execution_id.clone(),
      workflow_id: workflow.workflow_id.clone(),
    });

    let result = self.run_steps(workflow, request, &execution_id).await;

    match &result {
      Ok(_) => {
        info!(execution_id = %execution_id, "workflow_completed");
        self.notifier.notify(ExecutionEvent::WorkflowCompleted {
          execution_id: execution_id.clone(),
        });
      }
      Err(e) => {
        error!(execution_id = %execution_id, error = %e, "workflow_failed");
        self.notifier.notify(ExecutionEvent::WorkflowFailed {
          execution_id: execution_id.clone(),
          error: e.to_string(),
        });
      }
    }
    debug!(
      execution_id = %execution_id,
      state = ?WorkflowState::from(&result),
      "state_changed"
    );

    result
  }

  async fn run_steps(
    &self,
    workflow: &Workflow,
    request: &str,
    execution_id: &str,
  ) -> Result<Completion, WorkflowError> {
    let mut context = TemplateContext::new(request);
    let mut outputs: Vec<StepOutput> = Vec::with_capacity(workflow.steps.len());

    for step in &workflow.steps {
      debug!(
        execution_id = %execution_id,
        state = ?WorkflowState::Executing(step.index),
        "state_changed"
      );
      info!(
        execution_id = %execution_id,
        step = step.index,
        name = %step.name,
        kind = step.kind.name(),
        peer = %step.peer,
        "step_started"
      );
      self.notifier.notify(ExecutionEvent::StepStarted {
        execution_id: execution_id.to_string(),
        index: step.index,
        peer: step.peer.clone(),
      });

      let outcome = match &step.kind {
        StepKind::Single { payload } | StepKind::Chained { payload } => self
          .run_dispatch(step, payload, &context)
          .await
          .map(|text| (text, None)),
        StepKind::FanOut {
          items,
          id_field,
          payload,
          filter,
        } => {
          let items = match items {
            Some(items) => items.clone(),
            None => parse_items(context.previous.as_deref().unwrap_or_default(), id_field),
          };
          self
            .run_fan_out(step, items, payload, filter.as_ref(), &context, execution_id)
            .await
            .map(|(compiled, aggregate)| (compiled.to_string(), Some((compiled, aggregate))))
        }
      };

      let (output, fan_out) = match outcome {
        Ok(done) => done,
        Err(e) => {
          error!(
            execution_id = %execution_id,
            step = step.index,
            peer = %step.peer,
            error = %e,
            "step_failed"
          );
          self.notifier.notify(ExecutionEvent::StepFailed {
            execution_id: execution_id.to_string(),
            index: step.index,
            error: e.to_string(),
          });
          return Err(e);
        }
      };

      info!(
        execution_id = %execution_id,
        step = step.index,
        peer = %step.peer,
        output_len = output.len(),
        "step_completed"
      );
      self.notifier.notify(ExecutionEvent::StepCompleted {
        execution_id: execution_id.to_string(),
        index: step.index,
        output: output.clone(),
      });

      let aggregate = fan_out.map(|(compiled, aggregate)| {
        context.items = Some(compiled);
        aggregate
      });
      context.previous = Some(output.clone());

      outputs.push(StepOutput {
        index: step.index,
        name: step.name.clone(),
        peer: step.peer.clone(),
        output,
        aggregate,
      });
    }

    // Locking guarantees a single or chained terminal step.
    let text = outputs
      .last()
      .map(|last| last.output.clone())
      .unwrap_or_default();

    Ok(Completion {
      execution_id: execution_id.to_string(),
      workflow_id: workflow.workflow_id.clone(),
      text,
      steps: outputs,
    })
  }

  /// One dispatch; anything but a success fails the step.
  async fn run_dispatch(
    &self,
    step: &Step,
    payload: &str,
    context: &TemplateContext,
  ) -> Result<String, WorkflowError> {
    let rendered = render(payload, context).map_err(|source| WorkflowError::Template {
      index: step.index,
      source,
    })?;

    match self.dispatch_with_retries(step, &rendered).await {
      TaskResult::Success { text } => Ok(text),
      cause => Err(WorkflowError::StepFailed {
        index: step.index,
        peer: step.peer.clone(),
        cause,
      }),
    }
  }

  /// Dispatch every item concurrently and compile the aggregate.
  ///
  /// Results are slotted by item index, so the aggregate does not depend on
  /// which dispatch finishes first.
  async fn run_fan_out(
    &self,
    step: &Step,
    items: Vec<String>,
    payload: &str,
    filter: Option<&ItemFilter>,
    context: &TemplateContext,
    execution_id: &str,
  ) -> Result<(Value, AggregateResult), WorkflowError> {
    let template_error = |source| WorkflowError::Template {
      index: step.index,
      source,
    };

    // Render everything up front so a bad template fails before any dispatch.
    let payloads = items
      .iter()
      .map(|item| render(payload, &context.with_item(item)))
      .collect::<Result<Vec<_>, _>>()
      .map_err(template_error)?;

    info!(
      execution_id = %execution_id,
      step = step.index,
      peer = %step.peer,
      items = items.len(),
      "fan_out_started"
    );

    let mut pending: FuturesUnordered<_> = payloads
      .iter()
      .enumerate()
      .map(|(slot, payload)| async move { (slot, self.dispatch_with_retries(step, payload).await) })
      .collect();

    let mut slots: Vec<Option<TaskResult>> = vec![None; items.len()];
    while let Some((slot, result)) = pending.next().await {
      debug!(
        execution_id = %execution_id,
        step = step.index,
        item = %items[slot],
        success = result.is_success(),
        "item_completed"
      );
      self.notifier.notify(ExecutionEvent::ItemCompleted {
        execution_id: execution_id.to_string(),
        index: step.index,
        item: items[slot].clone(),
        success: result.is_success(),
      });
      slots[slot] = Some(result);
    }

    let entries = items
      .into_iter()
      .zip(slots)
      .map(|(item, result)| AggregateEntry {
        item,
        result: result.unwrap_or_else(|| {
          TaskResult::transport_failure(ErrorKind::Other {
            message: "item was never dispatched".to_string(),
          })
        }),
      })
      .collect();
    let aggregate = AggregateResult::new(entries);

    info!(
      execution_id = %execution_id,
      step = step.index,
      succeeded = aggregate.succeeded(),
      failed = aggregate.failed(),
      "fan_out_completed"
    );

    if aggregate.all_failed() {
      return Err(WorkflowError::AllItemsFailed {
        index: step.index,
        peer: step.peer.clone(),
        failures: aggregate.entries().to_vec(),
      });
    }

    let compiled = serde_json::to_value(aggregate.compile(filter)).map_err(|e| {
      template_error(TemplateError {
        message: e.to_string(),
      })
    })?;

    Ok((compiled, aggregate))
  }

  /// Dispatch, retrying transport failures up to the step's explicit limit.
  async fn dispatch_with_retries(&self, step: &Step, payload: &str) -> TaskResult {
    let mut attempt = 0;
    loop {
      let result = self
        .dispatcher
        .dispatch_with_timeout(&step.peer, payload, step.timeout)
        .await;

      match &result {
        TaskResult::TransportFailure { cause } if attempt < step.max_retry_attempts => {
          attempt += 1;
          warn!(
            step = step.index,
            peer = %step.peer,
            attempt,
            max_retry_attempts = step.max_retry_attempts,
            cause = %cause,
            "dispatch_retry"
          );
        }
        _ => return result,
      }
    }
  }
}
