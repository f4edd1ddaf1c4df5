//! Item filter expressions.
//!
//! A filter is a minijinja expression evaluated against each successful
//! fan-out result. The result text decides what the expression sees:
//! - a JSON object: its fields
//! - a JSON array: each element in turn (objects expose their fields,
//!   scalars are bound to `value`)
//! - plain text: `text`
//!
//! The item identifier is always bound to `item`. Examples:
//! `status == "open"`, `priority in ["high", "medium"]`, `"refund" in text`.
//!
//! A value the expression cannot be evaluated against (a missing nested
//! field, a type mismatch) is not kept. Only syntax errors are fatal, and
//! those surface when the workflow is locked.

use minijinja::Environment;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::TemplateError;

/// A boolean expression, syntax-checked on construction.
///
/// The expression is compiled again for each evaluation; `minijinja`
/// expressions borrow their environment, and filters run once per item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFilter {
  source: String,
}

/// What survives filtering for one item.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Kept {
  Nothing,
  Value(Value),
}

impl ItemFilter {
  /// Parse a filter expression.
  pub fn new(source: impl Into<String>) -> Result<Self, String> {
    let source = source.into();
    let env = Environment::new();
    env.compile_expression(&source).map_err(|e| e.to_string())?;
    Ok(Self { source })
  }

  pub fn source(&self) -> &str {
    &self.source
  }

  /// Evaluate the predicate against one context object.
  pub fn matches(&self, context: &Map<String, Value>) -> Result<bool, TemplateError> {
    let env = Environment::new();
    let expression = env.compile_expression(&self.source)?;
    Ok(expression.eval(context)?.is_true())
  }

  /// Reduce one item's success text to the part that matches.
  pub(crate) fn apply(&self, item: &str, text: &str) -> Kept {
    match serde_json::from_str::<Value>(text) {
      Ok(Value::Array(elements)) => {
        let kept: Vec<Value> = elements
          .into_iter()
          .filter(|element| self.keeps(item, &element_context(item, element)))
          .collect();
        if kept.is_empty() {
          Kept::Nothing
        } else {
          Kept::Value(Value::Array(kept))
        }
      }
      Ok(object @ Value::Object(_)) => {
        if self.keeps(item, &element_context(item, &object)) {
          Kept::Value(object)
        } else {
          Kept::Nothing
        }
      }
      _ => {
        let mut context = Map::new();
        context.insert("item".to_string(), Value::String(item.to_string()));
        context.insert("text".to_string(), Value::String(text.to_string()));
        if self.keeps(item, &context) {
          Kept::Value(Value::String(text.to_string()))
        } else {
          Kept::Nothing
        }
      }
    }
  }

  fn keeps(&self, item: &str, context: &Map<String, Value>) -> bool {
    match self.matches(context) {
      Ok(matched) => matched,
      Err(e) => {
        warn!(
          item = %item,
          filter = %self.source,
          error = %e,
          "filter_evaluation_failed"
        );
        false
      }
    }
  }
}

fn element_context(item: &str, element: &Value) -> Map<String, Value> {
  let mut context = match element {
    Value::Object(fields) => fields.clone(),
    other => {
      let mut map = Map::new();
      map.insert("value".to_string(), other.clone());
      map
    }
  };
  context.insert("item".to_string(), Value::String(item.to_string()));
  context
}
