//! Structural validation of incoming request documents.
//!
//! The JSON-RPC 2.0 request shape is described by a Draft-04 JSON Schema that
//! ships with the crate and is compiled once on first use.

use jsonschema::Validator;
use lazy_static::lazy_static;
use serde_json::Value;

use crate::error::JsonRpcServerError;

/// Draft-04 schema for a single JSON-RPC 2.0 request object
pub const REQUEST_SCHEMA: &str = include_str!("request-schema.json");

lazy_static! {
    static ref REQUEST_VALIDATOR: Validator = {
        let schema: Value =
            serde_json::from_str(REQUEST_SCHEMA).expect("bundled request schema is valid JSON");
        jsonschema::draft4::new(&schema).expect("bundled request schema compiles")
    };
}

/// Validate a single request document.
///
/// The first violation is reported as `InvalidRequest` with the validator's
/// description as detail.
pub fn validate_request(document: &Value) -> Result<(), JsonRpcServerError> {
    match REQUEST_VALIDATOR.iter_errors(document).next() {
        Some(violation) => Err(JsonRpcServerError::invalid_request(violation.to_string())),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_valid_requests() {
        assert!(validate_request(&json!({"jsonrpc": "2.0", "method": "ping"})).is_ok());
        assert!(validate_request(&json!({"jsonrpc": "2.0", "method": "ping", "id": 1})).is_ok());
        assert!(validate_request(&json!({"jsonrpc": "2.0", "method": "ping", "id": null})).is_ok());

        let positional = json!({"jsonrpc": "2.0", "method": "add", "params": [1, 2], "id": "a"});
        assert!(validate_request(&positional).is_ok());
        let named = json!({"jsonrpc": "2.0", "method": "add", "params": {"a": 1}});
        assert!(validate_request(&named).is_ok());
    }

    #[test]
    fn test_missing_method() {
        let error = validate_request(&json!({"jsonrpc": "2.0", "id": 1})).unwrap_err();
        assert_eq!(error.code(), -32600);
        assert!(error.to_string().contains("method"));
    }

    #[test]
    fn test_wrong_version() {
        assert!(validate_request(&json!({"jsonrpc": "1.0", "method": "ping"})).is_err());
        assert!(validate_request(&json!({"method": "ping"})).is_err());
    }

    #[test]
    fn test_invalid_member_types() {
        assert!(validate_request(&json!({"jsonrpc": "2.0", "method": 5})).is_err());
        assert!(validate_request(&json!({"jsonrpc": "2.0", "method": "x", "params": 5})).is_err());
        let object_id = json!({"jsonrpc": "2.0", "method": "x", "id": {"a": 1}});
        assert!(validate_request(&object_id).is_err());
        let unknown_member = json!({"jsonrpc": "2.0", "method": "x", "extra": true});
        assert!(validate_request(&unknown_member).is_err());
        assert!(validate_request(&json!("ping")).is_err());
    }
}
