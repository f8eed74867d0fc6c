//! # JSON-RPC Dispatch Prelude
//!
//! This module provides convenient re-exports of the most commonly used types
//! from the JSON-RPC dispatch library.
//!
//! ```rust
//! use turul_json_rpc_dispatch::prelude::*;
//! ```

pub use crate::config::{DispatcherConfig, RequestOptions};
pub use crate::dispatch::JsonRpcDispatcher;
pub use crate::error::{JsonRpcErrorCode, JsonRpcServerError};
pub use crate::method::{JsonRpcMethod, MethodRegistry};
pub use crate::response::Response;
pub use crate::signature::{BoundParams, MethodSignature, Parameter};
pub use crate::types::RequestId;

pub use http::StatusCode;

// Standard error codes
pub use crate::error_codes::*;
