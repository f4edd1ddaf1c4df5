//! Keyed results of a fan-out step.

use serde::Serialize;
use serde_json::Value;
use switchboard_dispatch::TaskResult;

use crate::filter::{ItemFilter, Kept};

/// One item's outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateEntry {
  pub item: String,
  pub result: TaskResult,
}

/// Every item's outcome, in listing order.
///
/// Entries are placed by item index, not by completion order, so two runs
/// over the same items produce the same aggregate regardless of which peer
/// answered first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
  entries: Vec<AggregateEntry>,
}

/// A compiled aggregate entry, as handed to the next step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CompiledEntry {
  Ok { item: String, result: Value },
  Failed { item: String, error: String },
}

impl AggregateResult {
  pub fn new(entries: Vec<AggregateEntry>) -> Self {
    Self { entries }
  }

  pub fn entries(&self) -> &[AggregateEntry] {
    &self.entries
  }

  /// Result for one item identifier.
  pub fn get(&self, item: &str) -> Option<&TaskResult> {
    self
      .entries
      .iter()
      .find(|entry| entry.item == item)
      .map(|entry| &entry.result)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn succeeded(&self) -> usize {
    self.entries.iter().filter(|e| e.result.is_success()).count()
  }

  pub fn failed(&self) -> usize {
    self.len() - self.succeeded()
  }

  /// At least one item, and none succeeded.
  pub fn all_failed(&self) -> bool {
    !self.is_empty() && self.succeeded() == 0
  }

  /// Compile the aggregate into the entries the next step sees.
  ///
  /// Without a filter every item appears, failures included. With a filter
  /// only successes are considered, and only what matches survives; a value
  /// the filter cannot evaluate counts as not matching.
  pub fn compile(&self, filter: Option<&ItemFilter>) -> Vec<CompiledEntry> {
    let mut compiled = Vec::with_capacity(self.entries.len());

    for entry in &self.entries {
      let item = entry.item.clone();
      match (&entry.result, filter) {
        (TaskResult::Success { text }, None) => compiled.push(CompiledEntry::Ok {
          item,
          result: embed(text),
        }),
        (TaskResult::Success { text }, Some(filter)) => {
          if let Kept::Value(result) = filter.apply(&entry.item, text) {
            compiled.push(CompiledEntry::Ok { item, result });
          }
        }
        (failure, None) => compiled.push(CompiledEntry::Failed {
          item,
          error: failure.describe(),
        }),
        (_, Some(_)) => {}
      }
    }

    compiled
  }
}

/// Structured text is embedded as JSON, anything else as a string.
fn embed(text: &str) -> Value {
  match serde_json::from_str::<Value>(text) {
    Ok(value @ (Value::Array(_) | Value::Object(_))) => value,
    _ => Value::String(text.to_string()),
  }
}
