//! Tolerant extraction of identifiers and readiness from server JSON.
//!
//! The server is not consistent about field names, so every lookup walks a
//! list of accepted names and takes the first usable value. Non-object
//! bodies simply yield nothing.

use serde_json::Value;

use crate::constants::{JOB_ID_FIELDS, READY_FLAGS, RESULT_ID_FIELDS, STATUS_DONE};
use crate::types::{JobHandle, ResultId};

/// Outcome of a single status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStatus {
    Ready(ResultId),
    Pending,
}

/// Reads the job identifier from an upload response.
pub fn job_id(body: &Value) -> Option<JobHandle> {
    first_id(body, &JOB_ID_FIELDS).map(JobHandle::new)
}

/// Reads the result identifier from a status response or push message.
pub fn result_id(body: &Value) -> Option<ResultId> {
    first_id(body, &RESULT_ID_FIELDS).map(ResultId::new)
}

/// Returns `true` if any accepted readiness convention is set.
pub fn is_ready(body: &Value) -> bool {
    if body.get("status").and_then(Value::as_str) == Some(STATUS_DONE) {
        return true;
    }
    READY_FLAGS
        .iter()
        .any(|flag| body.get(*flag).is_some_and(truthy))
}

/// Interprets a status response.
///
/// A response that claims readiness but carries no result identifier is
/// still pending.
pub fn poll_status(body: &Value) -> PollStatus {
    if !is_ready(body) {
        return PollStatus::Pending;
    }
    match result_id(body) {
        Some(id) => PollStatus::Ready(id),
        None => PollStatus::Pending,
    }
}

/// First non-empty string or numeric value among `fields`.
fn first_id(body: &Value, fields: &[&str]) -> Option<String> {
    let obj = body.as_object()?;
    fields.iter().find_map(|field| match obj.get(*field)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn truthy(v: &Value) -> bool {
    match v {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
