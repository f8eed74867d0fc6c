use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Dispatcher-wide settings, fixed when the dispatcher is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Include the `data` member in error responses. It may carry internal
    /// detail such as handler failure messages.
    pub debug: bool,
    /// Validate each request document against the JSON-RPC 2.0 request schema
    pub validate_requests: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            debug: false,
            validate_requests: true,
        }
    }
}

impl DispatcherConfig {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_validate_requests(mut self, validate_requests: bool) -> Self {
        self.validate_requests = validate_requests;
        self
    }
}

/// Options applied to a single dispatch call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    /// Rewrite the method name and keyword argument names to snake_case
    pub convert_camel_case: bool,
    /// Passed to the method as the `context` keyword argument
    pub context: Option<Value>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_camel_case_conversion(mut self, convert: bool) -> Self {
        self.convert_camel_case = convert;
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }
}
