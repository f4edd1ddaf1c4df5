//! Fan-out item list parsing.

use std::collections::HashSet;

use serde_json::Value;

/// Field read from object items when no other field is configured.
pub const DEFAULT_ID_FIELD: &str = "id";

/// Interpret a step's output text as a list of item identifiers.
///
/// Accepted shapes, in order:
/// - a JSON array of strings or numbers: `[1, 2, 3]`
/// - a JSON array of objects carrying `id_field`: `[{"id": 1, "name": "..."}]`
/// - a JSON object wrapping such an array under its only array-valued field
///   (`{"customers": [...]}`)
/// - anything else: split on newlines and commas
///
/// Blank identifiers are dropped. Duplicates are dropped, keeping the first
/// occurrence, so the result preserves listing order.
pub fn parse_items(text: &str, id_field: &str) -> Vec<String> {
  let raw = match serde_json::from_str::<Value>(text) {
    Ok(Value::Array(values)) => from_values(&values, id_field),
    Ok(Value::Object(map)) => {
      let mut arrays = map.values().filter_map(Value::as_array);
      match (arrays.next(), arrays.next()) {
        (Some(values), None) => from_values(values, id_field),
        _ => split_text(text),
      }
    }
    _ => split_text(text),
  };

  normalize_items(raw)
}

/// Trim, drop blanks and drop duplicates, keeping first positions.
///
/// Declared items go through here as they are; only output text is split.
pub(crate) fn normalize_items<I, S>(items: I) -> Vec<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  let mut seen = HashSet::new();
  items
    .into_iter()
    .map(|item| item.as_ref().trim().to_string())
    .filter(|item| !item.is_empty())
    .filter(|item| seen.insert(item.clone()))
    .collect()
}

fn from_values(values: &[Value], id_field: &str) -> Vec<String> {
  values
    .iter()
    .filter_map(|value| match value {
      Value::Object(map) => map.get(id_field).and_then(scalar),
      other => scalar(other),
    })
    .collect()
}

fn scalar(value: &Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

fn split_text(text: &str) -> Vec<String> {
  text
    .split(['\n', ','])
    .map(str::to_string)
    .collect()
}
