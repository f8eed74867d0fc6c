use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::signature::{BoundParams, MethodSignature};

/// A callable JSON-RPC method
#[async_trait]
pub trait JsonRpcMethod: Send + Sync {
    /// Name the method registers under unless another is given
    fn name(&self) -> &str;

    /// Parameters the method accepts
    fn signature(&self) -> &MethodSignature;

    /// Run the method with arguments already bound to its signature.
    ///
    /// Returning a [`JsonRpcServerError`](crate::JsonRpcServerError) (converted
    /// into `anyhow::Error`) reports that protocol error to the caller. Any
    /// other error is logged and answered with a generic server error.
    async fn call(&self, params: BoundParams) -> anyhow::Result<Value>;
}

/// A method backed by an async closure
pub struct FunctionMethod<F> {
    name: String,
    signature: MethodSignature,
    handler_fn: F,
}

impl<F, Fut> FunctionMethod<F>
where
    F: Fn(BoundParams) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    pub fn new(name: impl Into<String>, signature: MethodSignature, handler_fn: F) -> Self {
        Self {
            name: name.into(),
            signature,
            handler_fn,
        }
    }
}

#[async_trait]
impl<F, Fut> JsonRpcMethod for FunctionMethod<F>
where
    F: Fn(BoundParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    async fn call(&self, params: BoundParams) -> anyhow::Result<Value> {
        (self.handler_fn)(params).await
    }
}

/// A method backed by a plain synchronous closure
pub struct SyncFunctionMethod<F> {
    name: String,
    signature: MethodSignature,
    handler_fn: F,
}

impl<F> SyncFunctionMethod<F>
where
    F: Fn(BoundParams) -> anyhow::Result<Value> + Send + Sync,
{
    pub fn new(name: impl Into<String>, signature: MethodSignature, handler_fn: F) -> Self {
        Self {
            name: name.into(),
            signature,
            handler_fn,
        }
    }
}

#[async_trait]
impl<F> JsonRpcMethod for SyncFunctionMethod<F>
where
    F: Fn(BoundParams) -> anyhow::Result<Value> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    async fn call(&self, params: BoundParams) -> anyhow::Result<Value> {
        (self.handler_fn)(params)
    }
}

/// Methods available to a dispatcher, keyed by name.
///
/// Registering a name twice replaces the earlier method.
#[derive(Clone, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, Arc<dyn JsonRpcMethod>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method under its own name
    pub fn register<M>(&mut self, method: M) -> &mut Self
    where
        M: JsonRpcMethod + 'static,
    {
        let name = method.name().to_string();
        self.insert(name, Arc::new(method))
    }

    /// Register a method under an explicit name
    pub fn register_as<M>(&mut self, name: impl Into<String>, method: M) -> &mut Self
    where
        M: JsonRpcMethod + 'static,
    {
        self.insert(name.into(), Arc::new(method))
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
        self.register(FunctionMethod::new(name, signature, handler_fn))
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
        self.register(SyncFunctionMethod::new(name, signature, handler_fn))
    }

    fn insert(&mut self, name: String, method: Arc<dyn JsonRpcMethod>) -> &mut Self {
        if self.methods.insert(name.clone(), method).is_some() {
            debug!("Replaced JSON-RPC method: {}", name);
        } else {
            debug!("Registered JSON-RPC method: {}", name);
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn JsonRpcMethod>> {
        self.methods.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Get all registered method names
    pub fn names(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl std::fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = self.names();
        names.sort();
        f.debug_struct("MethodRegistry").field("methods", &names).finish()
    }
}
