//! Response envelope extraction.
//!
//! Peers answer with loosely-shaped envelopes. The task object may sit under
//! `task`, under a JSON-RPC `result` (optionally wrapping `task` again), or be
//! the body itself (HTTP+JSON binding). Text is read from
//! `artifacts[0].parts[0].root.text`, or the flat `artifacts[0].parts[0].text`
//! that the protocol's root model serializes to. Later artifacts and parts
//! are ignored.

use serde_json::{Map, Value};
use tracing::debug;

use crate::result::TaskResult;

/// Normalize a raw response body. Never fails.
pub fn extract(raw: &str) -> TaskResult {
  match extract_text(raw) {
    Ok(text) => TaskResult::Success { text },
    Err(reason) => {
      debug!(reason = %reason, "response envelope not usable");
      TaskResult::EmptyOrMalformed {
        reason: reason.to_string(),
        raw: raw.to_string(),
      }
    }
  }
}

fn extract_text(raw: &str) -> Result<String, &'static str> {
  if raw.trim().is_empty() {
    return Err("empty body");
  }

  let body: Value = serde_json::from_str(raw).map_err(|_| "body is not JSON")?;
  let task = locate_task(&body)?;

  let artifacts = match task.get("artifacts") {
    None | Some(Value::Null) => return Err("task has no artifacts"),
    Some(Value::Array(artifacts)) => artifacts,
    Some(_) => return Err("artifacts is not an array"),
  };
  let artifact = artifacts.first().ok_or("task has no artifacts")?;

  let parts = artifact
    .get("parts")
    .and_then(Value::as_array)
    .ok_or("first artifact has no parts")?;
  let part = parts.first().ok_or("first artifact has no parts")?;

  let text = part
    .get("root")
    .and_then(|root| root.get("text"))
    .or_else(|| part.get("text"))
    .ok_or("first part has no text")?
    .as_str()
    .ok_or("first part text is not a string")?;

  Ok(text.to_string())
}

fn locate_task(body: &Value) -> Result<&Map<String, Value>, &'static str> {
  let object = body.as_object().ok_or("body is not an object")?;

  if object.get("error").is_some_and(|e| !e.is_null()) {
    return Err("peer returned an error");
  }

  let candidate = if let Some(task) = object.get("task") {
    task
  } else if let Some(result) = object.get("result") {
    match result.get("task") {
      Some(inner) => inner,
      None => result,
    }
  } else if object.contains_key("artifacts") {
    body
  } else {
    return Err("no task in response");
  };

  match candidate {
    Value::Null => Err("task is null"),
    Value::Object(task) => Ok(task),
    _ => Err("task is not an object"),
  }
}
