//! The directive surface declarative sources are evaluated against.

use crate::context::ExecutionContext;
use crate::error::{EngineError, EngineResult};
use crate::middleware::Middleware;
use crate::mixin::MixinRegistry;
use crate::tool::{ArgSpec, FlagSpec, RunHandler, ToolDefinition};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Lookup scopes available to a source while it evaluates.
///
/// Sources resolve `include` directives against the mixin registry and
/// named-handler references against the handler map; both are owned by the
/// CLI entry point and borrowed here for the duration of one evaluation.
pub struct SourceEnv<'a> {
    /// The mixin lookup scope for `include` directives.
    pub mixins: &'a dyn MixinRegistry,
    /// Named run handlers registered on the CLI, referenced by declarative
    /// file sources.
    pub handlers: &'a HashMap<String, RunHandler>,
}

/// The directive scope handed to a declarative source.
///
/// Directives are processed in emission order and may nest to arbitrary
/// depth via [`ToolDsl::tool`]. Each scope addresses one tool definition;
/// nesting creates (or revisits) a child definition.
///
/// # Example
///
/// ```
/// use grove::tree::{SourceEnv, ToolDsl};
/// use grove::mixin::DefaultMixinRegistry;
/// use grove::tool::{ArgSpec, FlagSpec, ToolDefinition};
/// use std::collections::HashMap;
///
/// let registry = DefaultMixinRegistry::new();
/// let handlers = HashMap::new();
/// let env = SourceEnv { mixins: &registry, handlers: &handlers };
///
/// let mut root = ToolDefinition::root();
/// let mut dsl = ToolDsl::new(&mut root, &env);
/// dsl.tool("greet", |t| {
///     t.desc("Say hello");
///     t.flag(FlagSpec::boolean("shout"));
///     t.arg(ArgSpec::string("name"));
///     t.run(|ctx| {
///         ctx.logger().info("greeting");
///         Ok(())
///     });
///     Ok(())
/// })
/// .unwrap();
///
/// assert!(root.child("greet").unwrap().is_runnable());
/// ```
pub struct ToolDsl<'a> {
    tool: &'a mut ToolDefinition,
    env: &'a SourceEnv<'a>,
}

impl<'a> ToolDsl<'a> {
    /// Create a directive scope addressing the given definition.
    pub fn new(tool: &'a mut ToolDefinition, env: &'a SourceEnv<'a>) -> Self {
        Self { tool, env }
    }

    /// The definition this scope addresses.
    pub fn definition(&mut self) -> &mut ToolDefinition {
        self.tool
    }

    /// Set the tool description.
    pub fn desc(&mut self, text: impl Into<String>) {
        self.tool.set_description(text);
    }

    /// Add an alias for this tool under its parent namespace.
    pub fn alias(&mut self, name: impl Into<String>) {
        self.tool.add_alias(name);
    }

    /// Declare a flag.
    pub fn flag(&mut self, spec: FlagSpec) {
        self.tool.add_flag(spec);
    }

    /// Declare a positional argument.
    pub fn arg(&mut self, spec: ArgSpec) {
        self.tool.add_arg(spec);
    }

    /// Attach a declared mixin by name, with extra arguments.
    ///
    /// An unknown name is a definition error, detected here at load time.
    pub fn include(&mut self, mixin_name: &str, extra_args: Vec<Value>) -> EngineResult<()> {
        let mixin = self
            .env
            .mixins
            .get(mixin_name)
            .ok_or_else(|| EngineError::unknown_mixin(mixin_name))?;
        self.tool.attach(mixin, extra_args)
    }

    /// Set the run handler from a closure. Last writer wins.
    pub fn run<F>(&mut self, handler: F)
    where
        F: Fn(&mut ExecutionContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.tool.set_run_handler(Arc::new(handler));
    }

    /// Set the run handler from a shared handle, e.g. one registered on
    /// the CLI under a name.
    pub fn run_arc(&mut self, handler: RunHandler) {
        self.tool.set_run_handler(handler);
    }

    /// Look up a named handler registered on the CLI.
    pub fn named_handler(&self, name: &str) -> EngineResult<RunHandler> {
        self.env
            .handlers
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::definition(format!("unknown handler: {}", name)))
    }

    /// Replace the inherited middleware pipeline for this tool.
    pub fn middleware(&mut self, stages: Vec<Arc<dyn Middleware>>) {
        self.tool.set_middleware(stages);
    }

    /// Open a nested directive scope for a child tool, creating the child
    /// if needed. Revisiting an existing child mutates it in place, so
    /// separately loaded sources compose instead of clobbering each other.
    pub fn tool<F>(&mut self, name: &str, body: F) -> EngineResult<()>
    where
        F: FnOnce(&mut ToolDsl<'_>) -> EngineResult<()>,
    {
        let env = self.env;
        let child = self.tool.get_or_create_child(name);
        let mut dsl = ToolDsl { tool: child, env };
        body(&mut dsl)
    }
}
