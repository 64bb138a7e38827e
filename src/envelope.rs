//! The response envelope every successful result is wrapped in.
//!
//! ```json
//! { "data": { "id": "7f1c…", "name": "Ada" }, "elapsedMs": 3, "status": "OK" }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::response::{IntoResponse, Response};

/// Status label used by every built-in handler.
pub const OK: &str = "OK";

/// Fixed-shape success payload: `data`, `elapsedMs`, `status`, nothing else.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub data: T,
    pub elapsed_ms: u64,
    pub status: String,
}

/// Wraps `data` with the elapsed processing time and a status label.
///
/// Pure and infallible; `data` passes through untouched, including `()`
/// (serialized as `null`).
pub fn format<T>(data: T, elapsed_ms: u64, status: impl Into<String>) -> Envelope<T> {
    Envelope { data, elapsed_ms, status: status.into() }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        match serde_json::to_vec(&self) {
            Ok(bytes) => Response::json(bytes),
            Err(e) => Error::Internal(format!("envelope serialization failed: {e}")).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_exactly_three_fields() {
        let env = format(serde_json::json!({ "id": 1 }), 12, OK);
        let value = serde_json::to_value(&env).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj.len(), 3);
        assert_eq!(obj["data"]["id"], 1);
        assert_eq!(obj["elapsedMs"], 12);
        assert_eq!(obj["status"], "OK");
    }

    #[test]
    fn unit_payload_becomes_null() {
        let value = serde_json::to_value(format((), 0, OK)).unwrap();
        assert!(value["data"].is_null());
        assert_eq!(value["elapsedMs"], 0);
    }

    #[test]
    fn renders_as_json_200() {
        let res = format(vec!["a", "b"], 1, OK).into_response();
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.header("content-type"), Some("application/json"));
    }
}
