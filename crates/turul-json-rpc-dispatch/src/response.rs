use std::fmt;

use http::StatusCode;
use serde_json::{Map, Value};

use crate::error::{JsonRpcErrorCode, JsonRpcServerError};
use crate::types::{JsonRpcVersion, RequestId};

/// A successful JSON-RPC response
#[derive(Debug, Clone, PartialEq)]
pub struct SuccessResponse {
    pub version: JsonRpcVersion,
    pub result: Value,
    pub id: RequestId,
}

impl SuccessResponse {
    pub fn new(result: Value, id: RequestId) -> Self {
        Self {
            version: JsonRpcVersion::V2_0,
            result,
            id,
        }
    }

    pub fn to_value(&self) -> Value {
        let mut document = Map::new();
        document.insert("jsonrpc".to_string(), Value::from(self.version.as_str()));
        document.insert("result".to_string(), self.result.clone());
        document.insert("id".to_string(), self.id.to_value());
        Value::Object(document)
    }
}

/// A JSON-RPC error response.
///
/// `id` is `None` when the request had no usable id, in which case the
/// rendered document has no `id` member. `data` is only rendered when
/// `debug` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorResponse {
    pub code: i64,
    pub message: String,
    pub id: Option<RequestId>,
    pub data: Option<Value>,
    pub http_status: StatusCode,
    pub debug: bool,
}

impl ErrorResponse {
    pub fn new(
        code: i64,
        message: impl Into<String>,
        id: Option<RequestId>,
        data: Option<Value>,
        http_status: StatusCode,
        debug: bool,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            id,
            data,
            http_status,
            debug,
        }
    }

    /// Render a taxonomy error
    pub fn from_server_error(
        error: &JsonRpcServerError,
        id: Option<RequestId>,
        debug: bool,
    ) -> Self {
        Self::new(
            error.code(),
            error.message(),
            id,
            error.data(),
            error.http_status(),
            debug,
        )
    }

    pub fn to_value(&self) -> Value {
        let mut error = Map::new();
        error.insert("code".to_string(), Value::from(self.code));
        error.insert("message".to_string(), Value::from(self.message.as_str()));
        if self.debug {
            if let Some(data) = &self.data {
                error.insert("data".to_string(), data.clone());
            }
        }

        let mut document = Map::new();
        document.insert(
            "jsonrpc".to_string(),
            Value::from(JsonRpcVersion::V2_0.as_str()),
        );
        document.insert("error".to_string(), Value::Object(error));
        if let Some(id) = &self.id {
            document.insert("id".to_string(), id.to_value());
        }
        Value::Object(document)
    }
}

/// Every shape a dispatch can answer with
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Success(SuccessResponse),
    Error(ErrorResponse),
    /// The request was a notification; nothing is sent back
    Notification,
    /// A failure that escaped a method, reported as a generic server error
    Exception(ErrorResponse),
    Batch(Vec<Response>),
}

impl Response {
    pub fn success(result: Value, id: RequestId) -> Self {
        Response::Success(SuccessResponse::new(result, id))
    }

    pub fn error(error: &JsonRpcServerError, id: Option<RequestId>, debug: bool) -> Self {
        Response::Error(ErrorResponse::from_server_error(error, id, debug))
    }

    /// Build a server error from a failure's description.
    ///
    /// The description becomes `data` and is therefore only shown in debug
    /// mode.
    pub fn exception(description: impl Into<String>, id: Option<RequestId>, debug: bool) -> Self {
        let kind = JsonRpcErrorCode::ServerError;
        Response::Exception(ErrorResponse::new(
            kind.code(),
            kind.message(),
            id,
            Some(Value::String(description.into())),
            kind.http_status(),
            debug,
        ))
    }

    pub fn is_notification(&self) -> bool {
        matches!(self, Response::Notification)
    }

    /// Check if this is an error response
    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error(_) | Response::Exception(_))
    }

    /// Transport status to send along with the document
    pub fn http_status(&self) -> StatusCode {
        match self {
            Response::Success(_) => StatusCode::OK,
            Response::Error(error) | Response::Exception(error) => error.http_status,
            Response::Notification => StatusCode::NO_CONTENT,
            Response::Batch(items) => {
                if items.iter().all(Response::is_notification) {
                    StatusCode::NO_CONTENT
                } else {
                    StatusCode::OK
                }
            }
        }
    }

    /// Render the response document, or `None` when there is nothing to send.
    ///
    /// Batches leave out their notification items and render nothing when
    /// every item is a notification.
    pub fn to_value(&self) -> Option<Value> {
        match self {
            Response::Success(success) => Some(success.to_value()),
            Response::Error(error) | Response::Exception(error) => Some(error.to_value()),
            Response::Notification => None,
            Response::Batch(items) => {
                let documents: Vec<Value> = items.iter().filter_map(Response::to_value).collect();
                if documents.is_empty() {
                    None
                } else {
                    Some(Value::Array(documents))
                }
            }
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_value() {
            Some(document) => write!(f, "{}", document),
            None => Ok(()),
        }
    }
}

impl From<SuccessResponse> for Response {
    fn from(response: SuccessResponse) -> Self {
        Response::Success(response)
    }
}

impl From<ErrorResponse> for Response {
    fn from(response: ErrorResponse) -> Self {
        Response::Error(response)
    }
}

const RESPONSE_KEY_ORDER: [&str; 4] = ["jsonrpc", "result", "error", "id"];
const ERROR_KEY_ORDER: [&str; 3] = ["code", "message", "data"];

fn reorder(object: Map<String, Value>, order: &[&str]) -> Map<String, Value> {
    let (mut known, unknown): (Vec<_>, Vec<_>) = object
        .into_iter()
        .partition(|(key, _)| order.contains(&key.as_str()));
    known.sort_by_key(|(key, _)| order.iter().position(|candidate| candidate == key));
    // unknown members keep their relative order after the known ones
    known.into_iter().chain(unknown).collect()
}

/// Put the members of a response document into canonical order:
/// `jsonrpc`, `result` or `error`, then `id`; inside `error`: `code`,
/// `message`, `data`. Batch arrays are sorted item by item.
pub fn sort_dict_response(response: Value) -> Value {
    match response {
        Value::Object(object) => {
            let mut sorted = reorder(object, &RESPONSE_KEY_ORDER);
            if let Some(Value::Object(error)) = sorted.get_mut("error") {
                *error = reorder(std::mem::take(error), &ERROR_KEY_ORDER);
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_dict_response).collect()),
        other => other,
    }
}
