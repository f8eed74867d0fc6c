use std::fmt;

use http::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// JSON-RPC error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonRpcErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    ServerError,
}

impl JsonRpcErrorCode {
    pub fn code(&self) -> i64 {
        match self {
            JsonRpcErrorCode::ParseError => crate::error_codes::PARSE_ERROR,
            JsonRpcErrorCode::InvalidRequest => crate::error_codes::INVALID_REQUEST,
            JsonRpcErrorCode::MethodNotFound => crate::error_codes::METHOD_NOT_FOUND,
            JsonRpcErrorCode::InvalidParams => crate::error_codes::INVALID_PARAMS,
            JsonRpcErrorCode::ServerError => crate::error_codes::SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            JsonRpcErrorCode::ParseError => "Parse error",
            JsonRpcErrorCode::InvalidRequest => "Invalid Request",
            JsonRpcErrorCode::MethodNotFound => "Method not found",
            JsonRpcErrorCode::InvalidParams => "Invalid params",
            JsonRpcErrorCode::ServerError => "Server error",
        }
    }

    /// HTTP-equivalent status used when this error is returned to a client.
    pub fn http_status(&self) -> StatusCode {
        match self {
            JsonRpcErrorCode::ParseError
            | JsonRpcErrorCode::InvalidRequest
            | JsonRpcErrorCode::InvalidParams => StatusCode::BAD_REQUEST,
            JsonRpcErrorCode::MethodNotFound => StatusCode::NOT_FOUND,
            JsonRpcErrorCode::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for JsonRpcErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

/// Anticipated protocol and usage failures.
///
/// These are safe to report to the caller. The payload becomes the error's
/// `data` member, which is only rendered when the dispatcher runs in debug
/// mode. A method handler may return one of these (through `anyhow`) to
/// report a protocol error of its own; anything else a handler returns is
/// treated as an opaque server failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsonRpcServerError {
    #[error("Parse error")]
    ParseError,

    #[error("Invalid Request: {0}")]
    InvalidRequest(String),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl JsonRpcServerError {
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        JsonRpcServerError::InvalidRequest(detail.into())
    }

    pub fn method_not_found(method: impl Into<String>) -> Self {
        JsonRpcServerError::MethodNotFound(method.into())
    }

    pub fn invalid_params(detail: impl Into<String>) -> Self {
        JsonRpcServerError::InvalidParams(detail.into())
    }

    pub fn server_error(detail: impl Into<String>) -> Self {
        JsonRpcServerError::ServerError(detail.into())
    }

    pub fn kind(&self) -> JsonRpcErrorCode {
        match self {
            JsonRpcServerError::ParseError => JsonRpcErrorCode::ParseError,
            JsonRpcServerError::InvalidRequest(_) => JsonRpcErrorCode::InvalidRequest,
            JsonRpcServerError::MethodNotFound(_) => JsonRpcErrorCode::MethodNotFound,
            JsonRpcServerError::InvalidParams(_) => JsonRpcErrorCode::InvalidParams,
            JsonRpcServerError::ServerError(_) => JsonRpcErrorCode::ServerError,
        }
    }

    pub fn code(&self) -> i64 {
        self.kind().code()
    }

    pub fn message(&self) -> &'static str {
        self.kind().message()
    }

    pub fn http_status(&self) -> StatusCode {
        self.kind().http_status()
    }

    /// Debug payload carried in the error's `data` member.
    pub fn data(&self) -> Option<Value> {
        match self {
            JsonRpcServerError::ParseError => None,
            JsonRpcServerError::InvalidRequest(detail)
            | JsonRpcServerError::MethodNotFound(detail)
            | JsonRpcServerError::InvalidParams(detail)
            | JsonRpcServerError::ServerError(detail) => Some(Value::String(detail.clone())),
        }
    }
}

/// Errors raised while normalizing a request's parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("params must be an array, an object or null, got {0}")]
    InvalidArguments(&'static str),
}

impl From<RequestError> for JsonRpcServerError {
    fn from(error: RequestError) -> Self {
        JsonRpcServerError::InvalidParams(error.to_string())
    }
}
