//! Declared parameter lists and argument binding.
//!
//! Every registered method describes the arguments it accepts with a
//! [`MethodSignature`]. Incoming positional and keyword arguments are bound
//! against that description before the method runs, so arity and naming
//! mistakes are reported as `Invalid params` without ever reaching the
//! handler.

use anyhow::{Context, anyhow};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::JsonRpcServerError;

/// Whether a parameter must be supplied
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterKind {
    Required,
    /// May be omitted; `default` is bound in its place when present
    Optional { default: Option<Value> },
}

/// A single named parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
}

impl Parameter {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Required,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Optional { default: None },
        }
    }

    pub fn with_default(name: impl Into<String>, default: Value) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::Optional {
                default: Some(default),
            },
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self.kind, ParameterKind::Required)
    }
}

/// The parameter list of a method.
///
/// Declared parameters can be filled by position or by name. A signature may
/// additionally capture surplus positional arguments and unknown keyword
/// arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MethodSignature {
    params: Vec<Parameter>,
    var_positional: Option<String>,
    var_keyword: Option<String>,
}

impl MethodSignature {
    /// A signature that takes no arguments
    pub fn new() -> Self {
        Self::default()
    }

    /// A signature that accepts any arguments
    pub fn any() -> Self {
        Self::new().var_positional("args").var_keyword("kwargs")
    }

    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    pub fn required(self, name: impl Into<String>) -> Self {
        self.param(Parameter::required(name))
    }

    pub fn optional(self, name: impl Into<String>) -> Self {
        self.param(Parameter::optional(name))
    }

    pub fn with_default(self, name: impl Into<String>, default: Value) -> Self {
        self.param(Parameter::with_default(name, default))
    }

    /// Capture positional arguments beyond the declared parameters
    pub fn var_positional(mut self, name: impl Into<String>) -> Self {
        self.var_positional = Some(name.into());
        self
    }

    /// Capture keyword arguments that match no declared parameter
    pub fn var_keyword(mut self, name: impl Into<String>) -> Self {
        self.var_keyword = Some(name.into());
        self
    }

    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    pub fn accepts_var_positional(&self) -> bool {
        self.var_positional.is_some()
    }

    pub fn accepts_var_keyword(&self) -> bool {
        self.var_keyword.is_some()
    }

    /// Bind call arguments to this signature.
    ///
    /// Positional arguments fill declared parameters in order, keyword
    /// arguments fill them by name. Surplus positionals and unknown keywords
    /// are only accepted when the signature captures them. Every required
    /// parameter must end up with a value.
    pub fn bind(
        &self,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<BoundParams, JsonRpcServerError> {
        let mut slots: Vec<Option<Value>> = vec![None; self.params.len()];

        let mut positional = args.into_iter();
        for slot in slots.iter_mut() {
            match positional.next() {
                Some(value) => *slot = Some(value),
                None => break,
            }
        }
        let rest: Vec<Value> = positional.collect();
        if !rest.is_empty() && self.var_positional.is_none() {
            return Err(JsonRpcServerError::invalid_params(
                "too many positional arguments",
            ));
        }

        let mut extra = Map::new();
        for (key, value) in kwargs {
            match self.params.iter().position(|param| param.name == key) {
                Some(index) if slots[index].is_some() => {
                    return Err(JsonRpcServerError::invalid_params(format!(
                        "multiple values for argument '{}'",
                        key
                    )));
                }
                Some(index) => slots[index] = Some(value),
                None if self.var_keyword.is_some() => {
                    extra.insert(key, value);
                }
                None => {
                    return Err(JsonRpcServerError::invalid_params(format!(
                        "got an unexpected keyword argument '{}'",
                        key
                    )));
                }
            }
        }

        let mut named = Map::new();
        for (param, slot) in self.params.iter().zip(slots) {
            match (slot, &param.kind) {
                (Some(value), _) => {
                    named.insert(param.name.clone(), value);
                }
                (None, ParameterKind::Required) => {
                    return Err(JsonRpcServerError::invalid_params(format!(
                        "missing a required argument: '{}'",
                        param.name
                    )));
                }
                (None, ParameterKind::Optional { default: Some(default) }) => {
                    named.insert(param.name.clone(), default.clone());
                }
                (None, ParameterKind::Optional { default: None }) => {}
            }
        }

        Ok(BoundParams { named, rest, extra })
    }
}

/// Arguments bound to a method's signature, handed to the method on invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoundParams {
    named: Map<String, Value>,
    rest: Vec<Value>,
    extra: Map<String, Value>,
}

impl BoundParams {
    /// Look up a declared parameter, falling back to captured keyword arguments
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.get(name).or_else(|| self.extra.get(name))
    }

    /// Deserialize a supplied argument.
    ///
    /// A missing argument or one of the wrong type is a failure of the
    /// method itself, not of the binding.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<T> {
        let value = self
            .get(name)
            .ok_or_else(|| anyhow!("argument '{}' was not supplied", name))?;
        serde_json::from_value(value.clone())
            .with_context(|| format!("argument '{}' has an unexpected type", name))
    }

    /// Like [`get_as`](Self::get_as), but an omitted or `null` argument is `None`
    pub fn get_opt<T: DeserializeOwned>(&self, name: &str) -> anyhow::Result<Option<T>> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(_) => self.get_as(name).map(Some),
        }
    }

    /// Declared parameters that received a value, in declaration order
    pub fn named(&self) -> &Map<String, Value> {
        &self.named
    }

    /// Positional arguments captured beyond the declared parameters
    pub fn rest(&self) -> &[Value] {
        &self.rest
    }

    /// Keyword arguments captured because they match no declared parameter
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    pub fn is_empty(&self) -> bool {
        self.named.is_empty() && self.rest.is_empty() && self.extra.is_empty()
    }
}
