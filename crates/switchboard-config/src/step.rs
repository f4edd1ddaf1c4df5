//! Workflow step definitions.
//!
//! Every payload is a template string rendered by minijinja right before the
//! step dispatches. The context always has `request` (the original request);
//! later steps also see `previous` (the prior step's output text) and, after
//! a fan-out, `items` (its compiled entries). Fan-out payloads are rendered
//! once per item with `item` bound to the item identifier.
//!
//! ```json
//! [
//!   { "kind": "single", "peer": "data", "payload": "List all active customers" },
//!   {
//!     "kind": "fan_out",
//!     "peer": "data",
//!     "payload": "Get ticket history for customer {{ item }}",
//!     "filter": "status == 'open'"
//!   },
//!   { "kind": "chained", "peer": "support", "payload": "{{ request }}\n\n{{ previous }}" }
//! ]
//! ```

use serde::{Deserialize, Serialize};

/// A single step of a workflow definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDef {
  /// Optional label used in logs and events. Defaults to the step index.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,

  /// Logical name of the peer to dispatch to.
  pub peer: String,

  #[serde(flatten)]
  pub kind: StepKind,

  /// Per-dispatch timeout override.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeout_ms: Option<u64>,

  /// Explicit retries on transport failure. Zero when absent.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub max_retry_attempts: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
  /// One dispatch with a payload that does not depend on earlier steps.
  Single { payload: String },

  /// One dispatch whose payload embeds the previous step's output.
  Chained {
    #[serde(default = "default_chained_payload")]
    payload: String,
  },

  /// One dispatch per item, collected into an aggregate.
  FanOut {
    /// Static item identifiers. When absent the previous step's output is
    /// parsed as the item list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<Vec<String>>,

    /// Field holding the identifier when the item list is a JSON array of objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id_field: Option<String>,

    /// Per-item payload template.
    payload: String,

    /// Boolean expression applied to each successful item result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
  },
}

fn default_chained_payload() -> String {
  "{{ previous }}".to_string()
}

impl StepDef {
  /// Short kind label for logs and error messages.
  pub fn kind_name(&self) -> &'static str {
    match self.kind {
      StepKind::Single { .. } => "single",
      StepKind::Chained { .. } => "chained",
      StepKind::FanOut { .. } => "fan_out",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_fan_out_step() {
    let step: StepDef = serde_json::from_str(
      r#"{
        "kind": "fan_out",
        "peer": "data",
        "payload": "history for {{ item }}",
        "filter": "status == 'open'",
        "timeout_ms": 5000
      }"#,
    )
    .unwrap();

    assert_eq!(step.peer, "data");
    assert_eq!(step.timeout_ms, Some(5000));
    assert_eq!(step.max_retry_attempts, None);
    match step.kind {
      StepKind::FanOut {
        items,
        filter,
        payload,
        ..
      } => {
        assert_eq!(items, None);
        assert_eq!(filter.as_deref(), Some("status == 'open'"));
        assert_eq!(payload, "history for {{ item }}");
      }
      _ => panic!("expected fan_out step"),
    }
  }

  #[test]
  fn test_chained_payload_defaults_to_previous() {
    let step: StepDef =
      serde_json::from_str(r#"{ "kind": "chained", "peer": "support" }"#).unwrap();
    assert_eq!(
      step.kind,
      StepKind::Chained {
        payload: "{{ previous }}".to_string()
      }
    );
    assert_eq!(step.kind_name(), "chained");
  }

  #[test]
  fn test_unknown_kind_is_rejected() {
    let result: Result<StepDef, _> =
      serde_json::from_str(r#"{ "kind": "broadcast", "peer": "data", "payload": "x" }"#);
    assert!(result.is_err());
  }
}
