//! # JSON-RPC 2.0 Dispatch
//!
//! A transport-agnostic JSON-RPC 2.0 dispatch core. It takes an already
//! received request document, validates it, binds its params against the
//! target method's declared signature, runs the method and renders the
//! response together with an HTTP-equivalent status code. Transports (HTTP,
//! WebSocket, stdio, ...) only move bytes in and out.
//!
//! ## Features
//! - Draft-04 schema validation of request documents (can be disabled)
//! - Positional and named params bound against explicit method signatures
//! - Notifications, batches and canonical response member order
//! - Two error tiers: protocol errors are reported in full, method failures
//!   are only described to the caller in debug mode
//! - Optional camelCase to snake_case conversion and context injection
//!
//! ```rust,no_run
//! use serde_json::json;
//! use turul_json_rpc_dispatch::prelude::*;
//!
//! # async fn run() {
//! let mut dispatcher = JsonRpcDispatcher::new();
//! dispatcher.method_sync("ping", MethodSignature::new(), |_| Ok(json!("pong")));
//!
//! let (body, status) = dispatcher
//!     .dispatch_str(r#"{"jsonrpc": "2.0", "method": "ping", "id": 1}"#)
//!     .await;
//! assert_eq!(status, StatusCode::OK);
//! assert_eq!(body, Some(json!({"jsonrpc": "2.0", "result": "pong", "id": 1})));
//! # }
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod method;
pub mod prelude;
pub mod request;
pub mod response;
pub mod schema;
pub mod signature;
pub mod types;

// Re-export main types
pub use config::{DispatcherConfig, RequestOptions};
pub use dispatch::{JsonRpcDispatcher, parse_document};
pub use error::{JsonRpcErrorCode, JsonRpcServerError, RequestError};
pub use method::{FunctionMethod, JsonRpcMethod, MethodRegistry, SyncFunctionMethod};
pub use request::{Request, RequestParams, convert_camel_case_string, get_arguments};
pub use response::{ErrorResponse, Response, SuccessResponse, sort_dict_response};
pub use signature::{BoundParams, MethodSignature, Parameter, ParameterKind};
pub use types::{JsonRpcVersion, RequestId};

pub use http::StatusCode;

/// JSON-RPC 2.0 version constant
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC 2.0 error codes
pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const SERVER_ERROR: i64 = -32000;
}
