//! The mixin type: capability methods plus lifecycle callbacks.

use crate::context::ExecutionContext;
use crate::error::EngineResult;
use crate::tool::ToolDefinition;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A capability method contributed by a mixin.
///
/// The execution context is passed as an explicit receiver; extra call
/// arguments arrive as a slice of JSON values.
pub type CapabilityFn =
    Arc<dyn Fn(&mut ExecutionContext, &[Value]) -> anyhow::Result<Value> + Send + Sync>;

/// A per-context initialization callback, run once when a context is built.
///
/// Receives the context as an explicit receiver and the extra arguments
/// that were supplied to the `include` directive at attach time.
pub type InitFn =
    Arc<dyn Fn(&mut ExecutionContext, &[Value]) -> anyhow::Result<()> + Send + Sync>;

/// A per-definition inclusion callback, run once at attach time.
///
/// Receives the tool definition as an explicit receiver and may mutate it,
/// e.g. declare additional flags or define methods.
pub type IncludeFn =
    Arc<dyn Fn(&mut ToolDefinition, &[Value]) -> EngineResult<()> + Send + Sync>;

/// A named, reusable bundle of capability methods with optional attach-time
/// and instantiate-time lifecycle hooks.
///
/// Mixins are immutable once declared in a registry and are referenced via
/// `Arc` by every tool definition that attaches them.
///
/// # Example
///
/// ```
/// use grove::mixin::Mixin;
/// use serde_json::json;
///
/// let mixin = Mixin::new("greeter")
///     .method("greet", |_ctx, args| {
///         let who = args.first().and_then(|v| v.as_str()).unwrap_or("world");
///         Ok(json!(format!("hello, {}", who)))
///     });
///
/// assert_eq!(mixin.name(), "greeter");
/// assert!(mixin.capability("greet").is_some());
/// assert!(!mixin.is_configured());
/// ```
pub struct Mixin {
    name: String,
    methods: HashMap<String, CapabilityFn>,
    initialization_callback: Option<InitFn>,
    inclusion_callback: Option<IncludeFn>,
}

impl Mixin {
    /// Create a new mixin with no methods and no callbacks.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
            initialization_callback: None,
            inclusion_callback: None,
        }
    }

    /// Add a capability method using the builder pattern.
    ///
    /// Adding a method under an existing name replaces it.
    pub fn method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&mut ExecutionContext, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
        self
    }

    /// Set the initialization callback. Idempotent; last write wins.
    pub fn on_initialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ExecutionContext, &[Value]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.initialization_callback = Some(Arc::new(f));
        self
    }

    /// Set the inclusion callback. Idempotent; last write wins.
    pub fn on_include<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut ToolDefinition, &[Value]) -> EngineResult<()> + Send + Sync + 'static,
    {
        self.inclusion_callback = Some(Arc::new(f));
        self
    }

    /// The mixin's registry name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a capability method by name.
    pub fn capability(&self, name: &str) -> Option<&CapabilityFn> {
        self.methods.get(name)
    }

    /// Names of all capability methods this mixin contributes.
    pub fn capability_names(&self) -> Vec<&str> {
        self.methods.keys().map(|s| s.as_str()).collect()
    }

    /// Whether this mixin declares at least one lifecycle callback.
    ///
    /// A mixin without callbacks is a plain capability bundle; one with
    /// callbacks participates in definition and context lifecycles.
    pub fn is_configured(&self) -> bool {
        self.initialization_callback.is_some() || self.inclusion_callback.is_some()
    }

    /// The initialization callback, if set.
    pub fn initialization_callback(&self) -> Option<&InitFn> {
        self.initialization_callback.as_ref()
    }

    /// The inclusion callback, if set.
    pub fn inclusion_callback(&self) -> Option<&IncludeFn> {
        self.inclusion_callback.as_ref()
    }
}

impl std::fmt::Debug for Mixin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mixin")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("configured", &self.is_configured())
            .finish()
    }
}

/// One attachment of a mixin to a tool definition: the shared mixin entry
/// plus the extra arguments supplied to the `include` directive.
#[derive(Clone)]
pub struct MixinAttachment {
    /// The attached mixin, shared by reference.
    pub mixin: Arc<Mixin>,
    /// Extra arguments stored at attach time and replayed to the
    /// initialization callback for every context built from the definition.
    pub extra_args: Vec<Value>,
}

impl std::fmt::Debug for MixinAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MixinAttachment")
            .field("mixin", &self.mixin.name())
            .field("extra_args", &self.extra_args)
            .finish()
    }
}
