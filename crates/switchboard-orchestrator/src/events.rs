//! Execution events and notifiers.
//!
//! The sequencer reports every state transition through an
//! [`ExecutionNotifier`]. Consumers decide what to do with the events:
//! print progress, stream them elsewhere, or ignore them.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Events emitted while a workflow runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ExecutionEvent {
  WorkflowStarted {
    execution_id: String,
    workflow_id: String,
  },

  /// A step is about to dispatch.
  StepStarted {
    execution_id: String,
    index: usize,
    peer: String,
  },

  /// One fan-out item finished, successfully or not.
  ItemCompleted {
    execution_id: String,
    index: usize,
    item: String,
    success: bool,
  },

  StepCompleted {
    execution_id: String,
    index: usize,
    output: String,
  },

  StepFailed {
    execution_id: String,
    index: usize,
    error: String,
  },

  WorkflowCompleted { execution_id: String },

  WorkflowFailed { execution_id: String, error: String },
}

/// Receives execution events.
pub trait ExecutionNotifier: Send + Sync {
  fn notify(&self, event: ExecutionEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl ExecutionNotifier for NoopNotifier {
  fn notify(&self, _event: ExecutionEvent) {}
}

/// Forwards events to an unbounded channel.
///
/// Unbounded so a slow consumer never stalls a dispatch; a workflow emits a
/// handful of events per step.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  sender: mpsc::UnboundedSender<ExecutionEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<ExecutionEvent>) -> Self {
    Self { sender }
  }
}

impl ExecutionNotifier for ChannelNotifier {
  fn notify(&self, event: ExecutionEvent) {
    // The receiver may have been dropped.
    let _ = self.sender.send(event);
  }
}
