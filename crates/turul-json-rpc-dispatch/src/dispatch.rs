use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use http::StatusCode;
use serde_json::Value;
use tracing::{debug, error, info};

use crate::{
    config::{DispatcherConfig, RequestOptions},
    error::JsonRpcServerError,
    method::{JsonRpcMethod, MethodRegistry},
    request::Request,
    response::Response,
    schema,
    signature::{BoundParams, MethodSignature},
    types::RequestId,
};

/// Parse request text into a JSON document
pub fn parse_document(text: &str) -> Result<Value, JsonRpcServerError> {
    serde_json::from_str(text).map_err(|e| {
        debug!("Failed to parse JSON-RPC payload: {}", e);
        JsonRpcServerError::ParseError
    })
}

/// A request that passed validation, lookup and binding
struct PreparedCall {
    id: Option<RequestId>,
    method: Arc<dyn JsonRpcMethod>,
    params: BoundParams,
}

/// Routes JSON-RPC documents to registered methods and renders the outcome.
///
/// Methods are registered through `&mut self` before the dispatcher is
/// shared; dispatching only needs `&self`, so one dispatcher can serve many
/// tasks at once.
#[derive(Debug, Default)]
pub struct JsonRpcDispatcher {
    methods: MethodRegistry,
    config: DispatcherConfig,
}

impl JsonRpcDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            methods: MethodRegistry::new(),
            config,
        }
    }

    pub fn from_registry(methods: MethodRegistry, config: DispatcherConfig) -> Self {
        Self { methods, config }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn methods(&self) -> &MethodRegistry {
        &self.methods
    }

    /// Register a method under its own name
    pub fn register_method<M>(&mut self, method: M) -> &mut Self
    where
        M: JsonRpcMethod + 'static,
    {
        self.methods.register(method);
        self
    }

    /// Register a method under an explicit name
    pub fn register_method_as<M>(&mut self, name: impl Into<String>, method: M) -> &mut Self
    where
        M: JsonRpcMethod + 'static,
    {
        self.methods.register_as(name, method);
        self
    }

    /// Register an async closure as a method
    pub fn method<F, Fut>(
        &mut self,
        name: impl Into<String>,
        signature: MethodSignature,
        handler_fn: F,
    ) -> &mut Self
    where
        F: Fn(BoundParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.methods.method(name, signature, handler_fn);
        self
    }

    /// Register a synchronous closure as a method
    pub fn method_sync<F>(
        &mut self,
        name: impl Into<String>,
        signature: MethodSignature,
        handler_fn: F,
    ) -> &mut Self
    where
        F: Fn(BoundParams) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.methods.method_sync(name, signature, handler_fn);
        self
    }

    /// Get all registered methods
    pub fn registered_methods(&self) -> Vec<String> {
        self.methods.names()
    }

    /// Dispatch a request document.
    ///
    /// Returns the response document (`None` when nothing should be sent)
    /// and the transport status to send it with.
    pub async fn dispatch(&self, document: &Value) -> (Option<Value>, StatusCode) {
        self.dispatch_with(document, &RequestOptions::default()).await
    }

    /// Dispatch a request document with per-request options
    pub async fn dispatch_with(
        &self,
        document: &Value,
        options: &RequestOptions,
    ) -> (Option<Value>, StatusCode) {
        let response = self.handle(document, options).await;
        self.render(&response)
    }

    /// Parse and dispatch request text.
    ///
    /// Text that is not valid JSON is answered with a parse error without
    /// going through dispatch.
    pub async fn dispatch_str(&self, text: &str) -> (Option<Value>, StatusCode) {
        self.dispatch_str_with(text, &RequestOptions::default()).await
    }

    pub async fn dispatch_str_with(
        &self,
        text: &str,
        options: &RequestOptions,
    ) -> (Option<Value>, StatusCode) {
        match parse_document(text) {
            Ok(document) => self.dispatch_with(&document, options).await,
            Err(parse_error) => {
                let response = Response::error(&parse_error, None, self.config.debug);
                self.render(&response)
            }
        }
    }

    /// Dispatch a request document and return the response before rendering.
    ///
    /// An array document is a batch: each item is dispatched in order and the
    /// results are collected into [`Response::Batch`].
    pub async fn handle(&self, document: &Value, options: &RequestOptions) -> Response {
        info!(target: "turul_json_rpc_dispatch::request", request = %document, "JSON-RPC request");

        match document {
            Value::Array(items) if items.is_empty() => Response::error(
                &JsonRpcServerError::invalid_request("batch must contain at least one request"),
                None,
                self.config.debug,
            ),
            Value::Array(items) => {
                let mut responses = Vec::with_capacity(items.len());
                for item in items {
                    responses.push(self.handle_single(item, options).await);
                }
                Response::Batch(responses)
            }
            single => self.handle_single(single, options).await,
        }
    }

    async fn handle_single(&self, document: &Value, options: &RequestOptions) -> Response {
        let call = match self.prepare(document, options) {
            Ok(call) => call,
            Err(rpc_error) => {
                return Response::error(&rpc_error, RequestId::extract(document), self.config.debug);
            }
        };

        match invoke(&call.method, call.params).await {
            Ok(result) => match call.id {
                Some(id) => Response::success(result, id),
                None => Response::Notification,
            },
            Err(failure) => match failure.downcast_ref::<JsonRpcServerError>() {
                Some(rpc_error) => Response::error(rpc_error, call.id, self.config.debug),
                None => {
                    error!(
                        method = call.method.name(),
                        "JSON-RPC method failed: {:?}",
                        failure
                    );
                    Response::exception(format!("{:#}", failure), call.id, self.config.debug)
                }
            },
        }
    }

    /// Validate, normalize, look up and bind a single request
    fn prepare(
        &self,
        document: &Value,
        options: &RequestOptions,
    ) -> Result<PreparedCall, JsonRpcServerError> {
        if self.config.validate_requests {
            schema::validate_request(document)?;
        }

        let request = Request::from_document(document, options)?;

        let method = self
            .methods
            .get(request.method())
            .cloned()
            .ok_or_else(|| JsonRpcServerError::method_not_found(request.method()))?;

        let id = request.id().cloned();
        let (args, kwargs) = request.into_arguments();
        let params = method.signature().bind(args, kwargs)?;

        Ok(PreparedCall { id, method, params })
    }

    fn render(&self, response: &Response) -> (Option<Value>, StatusCode) {
        let status = response.http_status();
        let body = response.to_value();

        info!(
            target: "turul_json_rpc_dispatch::response",
            response = %response,
            http_code = status.as_u16(),
            http_reason = status.canonical_reason().unwrap_or(""),
            "JSON-RPC response"
        );

        (body, status)
    }
}

/// Run a method, turning a panic into an ordinary failure
async fn invoke(method: &Arc<dyn JsonRpcMethod>, params: BoundParams) -> anyhow::Result<Value> {
    match AssertUnwindSafe(method.call(params)).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(payload) => Err(anyhow::anyhow!(
            "method panicked: {}",
            panic_description(payload.as_ref())
        )),
    }
}

fn panic_description(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    fn dispatcher(config: DispatcherConfig) -> JsonRpcDispatcher {
        let mut dispatcher = JsonRpcDispatcher::with_config(config);
        dispatcher
            .method_sync("ping", MethodSignature::new(), |_| Ok(json!("pong")))
            .method_sync(
                "subtract",
                MethodSignature::new().required("minuend").required("subtrahend"),
                |params| {
                    let minuend: i64 = params.get_as("minuend")?;
                    let subtrahend: i64 = params.get_as("subtrahend")?;
                    Ok(json!(minuend - subtrahend))
                },
            )
            .method_sync("fail", MethodSignature::new(), |_| {
                Err(anyhow::anyhow!("database unavailable"))
            })
            .method_sync("reject", MethodSignature::new().required("value"), |_| {
                Err(JsonRpcServerError::invalid_params("value out of range").into())
            })
            .method_sync("explode", MethodSignature::new(), |_| panic!("kaboom"));
        dispatcher
    }

    #[test]
    fn test_parse_document() {
        assert_eq!(parse_document("{not json"), Err(JsonRpcServerError::ParseError));
        assert_eq!(parse_document(r#"{"a": 1}"#).unwrap(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_dispatch_success() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "ping", "id": 1}))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Some(json!({"jsonrpc": "2.0", "result": "pong", "id": 1})));
    }

    #[tokio::test]
    async fn test_positional_and_keyword_params() {
        let dispatcher = dispatcher(DispatcherConfig::default());

        let (body, _) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 1}))
            .await;
        assert_eq!(body.unwrap()["result"], json!(19));

        let (body, _) = dispatcher
            .dispatch(&json!({
                "jsonrpc": "2.0",
                "method": "subtract",
                "params": {"subtrahend": 23, "minuend": 42},
                "id": 2
            }))
            .await;
        assert_eq!(body.unwrap()["result"], json!(19));
    }

    #[tokio::test]
    async fn test_notification_has_no_body() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "ping"}))
            .await;

        assert_eq!(body, None);
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_null_id_gets_a_response() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "ping", "id": null}))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Some(json!({"jsonrpc": "2.0", "result": "pong", "id": null})));
    }

    #[tokio::test]
    async fn test_method_not_found() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "nonexistent", "id": 1}))
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            Some(json!({
                "jsonrpc": "2.0",
                "error": {"code": -32601, "message": "Method not found"},
                "id": 1
            }))
        );
    }

    #[tokio::test]
    async fn test_binding_failure_is_invalid_params() {
        let dispatcher = dispatcher(DispatcherConfig::default().with_debug(true));
        let (body, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "subtract", "params": [1], "id": 1}))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = body.unwrap();
        assert_eq!(body["error"]["code"], json!(-32602));
        assert_eq!(body["error"]["data"], json!("missing a required argument: 'subtrahend'"));
    }

    #[tokio::test]
    async fn test_method_may_return_taxonomy_error() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "reject", "params": [7], "id": 3}))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            Some(json!({
                "jsonrpc": "2.0",
                "error": {"code": -32602, "message": "Invalid params"},
                "id": 3
            }))
        );
    }

    #[tokio::test]
    async fn test_opaque_failure_hides_detail() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "fail", "id": 1}))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body,
            Some(json!({
                "jsonrpc": "2.0",
                "error": {"code": -32000, "message": "Server error"},
                "id": 1
            }))
        );
    }

    #[tokio::test]
    async fn test_opaque_failure_detail_in_debug_mode() {
        let dispatcher = dispatcher(DispatcherConfig::default().with_debug(true));
        let (body, _) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "fail", "id": 1}))
            .await;

        assert_eq!(body.unwrap()["error"]["data"], json!("database unavailable"));
    }

    #[tokio::test]
    async fn test_wrong_argument_type_is_opaque() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "subtract", "params": ["a", 1], "id": 1}))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.unwrap()["error"]["code"], json!(-32000));
    }

    #[tokio::test]
    async fn test_panic_becomes_server_error() {
        let dispatcher = dispatcher(DispatcherConfig::default().with_debug(true));
        let (body, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "explode", "id": 1}))
            .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.unwrap()["error"]["data"], json!("method panicked: kaboom"));
    }

    #[tokio::test]
    async fn test_invalid_request() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "id": 5}))
            .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            Some(json!({
                "jsonrpc": "2.0",
                "error": {"code": -32600, "message": "Invalid Request"},
                "id": 5
            }))
        );
    }

    #[tokio::test]
    async fn test_validation_can_be_disabled() {
        let dispatcher = dispatcher(DispatcherConfig::default().with_validate_requests(false));

        // Unknown members are tolerated without schema validation.
        let (body, status) = dispatcher
            .dispatch(&json!({"method": "ping", "id": 1, "extra": true}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["result"], json!("pong"));

        let (body, status) = dispatcher
            .dispatch(&json!({"method": "ping", "params": "scalar", "id": 2}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.unwrap()["error"]["code"], json!(-32602));
    }

    #[tokio::test]
    async fn test_dispatch_str_parse_error() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher.dispatch_str("{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            Some(json!({"jsonrpc": "2.0", "error": {"code": -32700, "message": "Parse error"}}))
        );
    }

    #[tokio::test]
    async fn test_camel_case_and_context_options() {
        let mut dispatcher = JsonRpcDispatcher::new();
        dispatcher.method_sync(
            "get_user",
            MethodSignature::new().required("user_id").required("context"),
            |params| {
                Ok(json!({
                    "user": params.get_as::<i64>("user_id")?,
                    "tenant": params.get("context").cloned()
                }))
            },
        );

        let options = RequestOptions::new()
            .with_camel_case_conversion(true)
            .with_context(json!("acme"));
        let (body, status) = dispatcher
            .dispatch_with(
                &json!({"jsonrpc": "2.0", "method": "getUser", "params": {"userId": 7}, "id": 1}),
                &options,
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.unwrap()["result"], json!({"user": 7, "tenant": "acme"}));
    }

    #[tokio::test]
    async fn test_batch() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher
            .dispatch(&json!([
                {"jsonrpc": "2.0", "method": "ping", "id": 1},
                {"jsonrpc": "2.0", "method": "ping"},
                {"jsonrpc": "2.0", "method": "missing", "id": 2}
            ]))
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            Some(json!([
                {"jsonrpc": "2.0", "result": "pong", "id": 1},
                {
                    "jsonrpc": "2.0",
                    "error": {"code": -32601, "message": "Method not found"},
                    "id": 2
                }
            ]))
        );
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, status) = dispatcher.dispatch(&json!([])).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.unwrap()["error"]["code"], json!(-32600));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_request_and_response_are_logged() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (_, status) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "nonexistent", "id": 1}))
            .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(logs_contain("turul_json_rpc_dispatch::request"));
        assert!(logs_contain(r#""method":"nonexistent""#));
        assert!(logs_contain("turul_json_rpc_dispatch::response"));
        assert!(logs_contain("http_code=404"));
        assert!(logs_contain(r#"http_reason="Not Found""#));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_notification_response_is_logged_with_no_content() {
        let dispatcher = dispatcher(DispatcherConfig::default());
        let (body, _) = dispatcher
            .dispatch(&json!({"jsonrpc": "2.0", "method": "ping"}))
            .await;

        assert!(body.is_none());
        assert!(logs_contain("http_code=204"));
        assert!(logs_contain(r#"http_reason="No Content""#));
    }
}
