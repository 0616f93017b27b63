//! The per-invocation execution context.
//!
//! Exactly one context exists per tool invocation. It carries the resolved
//! tool definition, the parsed argument values, the mixin-provided state
//! map, and the logger handle. Mixin initialization callbacks run during
//! [`ExecutionContext::build`], in attachment order, before any pipeline
//! stage sees the context; if one fails, construction aborts and no
//! partially-initialized context escapes.

mod logger;

pub use logger::Logger;

use crate::error::{EngineError, EngineResult};
use crate::tool::ToolDefinition;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// The per-invocation instance a resolved tool runs inside.
///
/// # Example
///
/// ```
/// use grove::context::{ExecutionContext, Logger};
/// use grove::tool::ToolDefinition;
/// use serde_json::json;
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// let mut tool = ToolDefinition::new(vec!["greet".into()]);
/// tool.set_run_handler(Arc::new(|ctx| {
///     let who = ctx.string_arg("name").unwrap_or_else(|| "world".into());
///     ctx.set("greeting", json!(format!("hello, {}", who)));
///     Ok(())
/// }));
///
/// let mut args = HashMap::new();
/// args.insert("name".to_string(), json!("rubygems"));
///
/// let mut ctx = ExecutionContext::build(Arc::new(tool), args, Logger::new("greet")).unwrap();
/// ctx.run().unwrap();
/// assert_eq!(ctx.get("greeting"), Some(&json!("hello, rubygems")));
/// ```
pub struct ExecutionContext {
    tool: Arc<ToolDefinition>,
    parsed_args: HashMap<String, Value>,
    state: HashMap<String, Value>,
    logger: Logger,
    exit_code: i32,
}

impl ExecutionContext {
    /// Build a context for a resolved tool.
    ///
    /// Runs each attached mixin's initialization callback in attachment
    /// order, with the context as its receiver and the extra arguments
    /// stored at attach time. Fails fast: the first initializer error
    /// aborts construction with an initialization error naming the
    /// offending mixin, and the context is never handed to the pipeline.
    pub fn build(
        tool: Arc<ToolDefinition>,
        parsed_args: HashMap<String, Value>,
        logger: Logger,
    ) -> EngineResult<Self> {
        let mut ctx = Self {
            tool: tool.clone(),
            parsed_args,
            state: HashMap::new(),
            logger,
            exit_code: 0,
        };

        for attachment in tool.attached_mixins() {
            if let Some(initializer) = attachment.mixin.initialization_callback() {
                initializer(&mut ctx, &attachment.extra_args).map_err(|err| {
                    EngineError::initialization(attachment.mixin.name(), format!("{:#}", err))
                })?;
            }
        }

        Ok(ctx)
    }

    /// The resolved tool definition.
    pub fn tool(&self) -> &ToolDefinition {
        &self.tool
    }

    /// The resolved tool definition as a shared handle.
    pub fn tool_arc(&self) -> Arc<ToolDefinition> {
        self.tool.clone()
    }

    /// The full parsed-argument map.
    pub fn parsed_args(&self) -> &HashMap<String, Value> {
        &self.parsed_args
    }

    /// A parsed argument value by declared name.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.parsed_args.get(name)
    }

    /// A parsed string argument, cloned out of the value map.
    pub fn string_arg(&self, name: &str) -> Option<String> {
        self.arg(name).and_then(Value::as_str).map(str::to_string)
    }

    /// A parsed boolean flag; false when absent.
    pub fn bool_arg(&self, name: &str) -> bool {
        self.arg(name).and_then(Value::as_bool).unwrap_or(false)
    }

    /// A parsed occurrence count; 0 when absent. A plain boolean true
    /// counts as one occurrence.
    pub fn count_arg(&self, name: &str) -> u64 {
        match self.arg(name) {
            Some(Value::Bool(true)) => 1,
            Some(value) => value.as_u64().unwrap_or(0),
            None => 0,
        }
    }

    /// Set a mixin-state value.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.state.insert(key.into(), value);
    }

    /// Get a mixin-state value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.state.get(key)
    }

    /// The logger handle for this invocation.
    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Mutable access to the logger handle.
    pub fn logger_mut(&mut self) -> &mut Logger {
        &mut self.logger
    }

    /// The exit code the invocation will report. Defaults to 0.
    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Set the exit code reported on success.
    pub fn set_exit_code(&mut self, code: i32) {
        self.exit_code = code;
    }

    /// Resolve and invoke a capability method by name.
    ///
    /// Resolution scans attached mixins in reverse attachment order, then
    /// the tool's directly-defined methods.
    pub fn invoke_capability(&mut self, name: &str, args: &[Value]) -> EngineResult<Value> {
        let capability = self.tool.resolve_capability(name)?;
        capability(self, args).map_err(|err| {
            EngineError::execution(format!("capability '{}' failed: {:#}", name, err))
        })
    }

    /// Invoke the resolved tool's run handler with this context as its
    /// receiver.
    pub fn run(&mut self) -> EngineResult<()> {
        let handler = self
            .tool
            .run_handler()
            .cloned()
            .ok_or_else(|| {
                EngineError::execution(format!(
                    "tool '{}' has no run handler",
                    self.tool.display_name()
                ))
            })?;
        handler(self).map_err(EngineError::from)
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("tool", &self.tool.display_name())
            .field("parsed_args", &self.parsed_args)
            .field("state_keys", &self.state.keys().collect::<Vec<_>>())
            .field("exit_code", &self.exit_code)
            .finish()
    }
}
