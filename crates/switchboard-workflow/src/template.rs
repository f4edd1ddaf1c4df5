//! Payload templates.
//!
//! Payloads are minijinja templates rendered against a [`TemplateContext`]:
//!
//! ```text
//! Original request: {{ request }}
//! Customer data: {{ previous }}
//! {% for entry in items %}- {{ entry.item }}: {{ entry.result }}{% endfor %}
//! ```

use minijinja::{Environment, Value};
use serde::Serialize;

use crate::error::TemplateError;

/// Values visible to a payload template.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TemplateContext {
  /// The original request the workflow was planned for.
  pub request: String,

  /// Output text of the previous step.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub previous: Option<String>,

  /// Compiled entries of the previous fan-out step.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub items: Option<serde_json::Value>,

  /// Current item identifier, inside a fan-out.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub item: Option<String>,
}

impl TemplateContext {
  pub fn new(request: impl Into<String>) -> Self {
    Self {
      request: request.into(),
      ..Default::default()
    }
  }

  /// Same context, bound to one fan-out item.
  pub fn with_item(&self, item: &str) -> Self {
    Self {
      item: Some(item.to_string()),
      ..self.clone()
    }
  }
}

/// Render a payload template.
pub fn render(source: &str, context: &TemplateContext) -> Result<String, TemplateError> {
  let env = Environment::new();
  Ok(env.render_str(source, Value::from_serialize(context))?)
}

/// Check that a template parses.
pub(crate) fn check(source: &str) -> Result<(), String> {
  let env = Environment::new();
  env
    .template_from_str(source)
    .map(|_| ())
    .map_err(|e| e.to_string())
}
