use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

use crate::config::RequestOptions;
use crate::error::{JsonRpcServerError, RequestError};
use crate::types::RequestId;

lazy_static! {
    static ref CAPITALIZED_WORD: Regex = Regex::new(r"(.)([A-Z][a-z]+)").expect("valid regex");
    static ref LOWER_TO_UPPER: Regex = Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex");
}

/// Convert a camelCase name to snake_case.
///
/// `_` is inserted before a capitalized word that follows any character and
/// between a lowercase letter or digit and an uppercase letter, then the
/// whole string is lowercased. The output contains no uppercase letters, so
/// converting twice gives the same result as converting once.
pub fn convert_camel_case_string(name: &str) -> String {
    let words = CAPITALIZED_WORD.replace_all(name, "${1}_${2}");
    LOWER_TO_UPPER
        .replace_all(&words, "${1}_${2}")
        .to_lowercase()
}

/// Convert every key of an object to snake_case, descending into nested objects.
pub fn convert_camel_case_keys(original: &Map<String, Value>) -> Map<String, Value> {
    original
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::Object(nested) => Value::Object(convert_camel_case_keys(nested)),
                other => other.clone(),
            };
            (convert_camel_case_string(key), value)
        })
        .collect()
}

/// Parameters for a JSON-RPC request
#[derive(Debug, Clone, PartialEq)]
pub enum RequestParams {
    /// Positional parameters as an array
    Array(Vec<Value>),
    /// Named parameters as an object
    Object(Map<String, Value>),
}

impl RequestParams {
    /// Classify a raw `params` member.
    ///
    /// Absent and `null` params yield `None`; scalars are rejected.
    pub fn from_value(params: Option<Value>) -> Result<Option<Self>, RequestError> {
        match params {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(values)) => Ok(Some(RequestParams::Array(values))),
            Some(Value::Object(map)) => Ok(Some(RequestParams::Object(map))),
            Some(Value::String(_)) => Err(RequestError::InvalidArguments("a string")),
            Some(Value::Number(_)) => Err(RequestError::InvalidArguments("a number")),
            Some(Value::Bool(_)) => Err(RequestError::InvalidArguments("a boolean")),
        }
    }
}

/// Split request params into positional and keyword arguments.
///
/// An array becomes the positional arguments, an object the keyword
/// arguments. When `context` is given it is added to the keyword arguments
/// under `"context"`, replacing any value the client sent under that name.
pub fn get_arguments(
    params: Option<RequestParams>,
    context: Option<Value>,
) -> (Vec<Value>, Map<String, Value>) {
    let (positionals, mut nameds) = match params {
        Some(RequestParams::Array(values)) => (values, Map::new()),
        Some(RequestParams::Object(map)) => (Vec::new(), map),
        None => (Vec::new(), Map::new()),
    };

    // JSON-RPC params are either by-position or by-name, never both.
    assert!(
        positionals.is_empty() || nameds.is_empty(),
        "Cannot have both positional and keyword arguments in JSON-RPC."
    );

    if let Some(context) = context {
        nameds.insert("context".to_string(), context);
    }

    (positionals, nameds)
}

/// A normalized JSON-RPC request.
///
/// Built once per incoming document and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    method: String,
    args: Vec<Value>,
    kwargs: Map<String, Value>,
    id: Option<RequestId>,
}

impl Request {
    /// Normalize already-validated request members.
    ///
    /// `id` is `None` when the document had no `id` member at all.
    pub fn build(
        method: impl Into<String>,
        params: Option<Value>,
        id: Option<RequestId>,
        options: &RequestOptions,
    ) -> Result<Self, RequestError> {
        let params = RequestParams::from_value(params)?;
        let (args, mut kwargs) = get_arguments(params, options.context.clone());
        let mut method = method.into();

        if options.convert_camel_case {
            method = convert_camel_case_string(&method);
            if !kwargs.is_empty() {
                kwargs = convert_camel_case_keys(&kwargs);
            }
        }

        Ok(Self {
            method,
            args,
            kwargs,
            id,
        })
    }

    /// Build a request straight from a raw document.
    ///
    /// Only the shape needed for dispatch is checked here: the document must
    /// be an object with a string `method`, and a present `id` must be a
    /// string, number or null.
    pub fn from_document(
        document: &Value,
        options: &RequestOptions,
    ) -> Result<Self, JsonRpcServerError> {
        let object = document
            .as_object()
            .ok_or_else(|| JsonRpcServerError::invalid_request("request must be an object"))?;

        let method = object
            .get("method")
            .and_then(Value::as_str)
            .ok_or_else(|| JsonRpcServerError::invalid_request("'method' must be a string"))?;

        let id = match object.get("id") {
            None => None,
            Some(raw) => Some(RequestId::from_value(raw).ok_or_else(|| {
                JsonRpcServerError::invalid_request("'id' must be a string, number or null")
            })?),
        };

        Ok(Self::build(method, object.get("params").cloned(), id, options)?)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn kwargs(&self) -> &Map<String, Value> {
        &self.kwargs
    }

    pub fn id(&self) -> Option<&RequestId> {
        self.id.as_ref()
    }

    /// True if no `id` was supplied. An explicit `null` id is not a notification.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// Hand the arguments over to the binder
    pub fn into_arguments(self) -> (Vec<Value>, Map<String, Value>) {
        (self.args, self.kwargs)
    }
}
