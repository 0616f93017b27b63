//! The tool definition type: one node in the command tree.

use crate::context::ExecutionContext;
use crate::error::{EngineError, EngineResult};
use crate::middleware::Middleware;
use crate::mixin::{CapabilityFn, Mixin, MixinAttachment};
use crate::tool::{ArgSpec, FlagSpec};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// The body executed when a runnable tool is invoked.
///
/// Receives the execution context as an explicit receiver; its error, if
/// any, becomes the invocation's execution failure.
pub type RunHandler = Arc<dyn Fn(&mut ExecutionContext) -> anyhow::Result<()> + Send + Sync>;

/// One node in the command tree.
///
/// A definition is created the first time a declarative directive addresses
/// its path, directly or implicitly as an ancestor of a more specific
/// directive, and may be mutated by subsequent directives at the same path.
/// It is runnable only once a run handler is set; intermediate namespace
/// nodes have children but no handler and resolve to a help display.
#[derive(Clone)]
pub struct ToolDefinition {
    full_name: Vec<String>,
    description: Option<String>,
    aliases: Vec<String>,
    flags: Vec<FlagSpec>,
    args: Vec<ArgSpec>,
    methods: HashMap<String, CapabilityFn>,
    attached_mixins: Vec<MixinAttachment>,
    middleware_overrides: Option<Vec<Arc<dyn Middleware>>>,
    run_handler: Option<RunHandler>,
    children: BTreeMap<String, ToolDefinition>,
}

impl ToolDefinition {
    /// Create a definition at the given path from the root.
    pub fn new(full_name: Vec<String>) -> Self {
        Self {
            full_name,
            description: None,
            aliases: Vec::new(),
            flags: Vec::new(),
            args: Vec::new(),
            methods: HashMap::new(),
            attached_mixins: Vec::new(),
            middleware_overrides: None,
            run_handler: None,
            children: BTreeMap::new(),
        }
    }

    /// Create the root namespace node.
    pub fn root() -> Self {
        Self::new(Vec::new())
    }

    /// The path of name segments from the root.
    pub fn full_name(&self) -> &[String] {
        &self.full_name
    }

    /// The final name segment, or the empty string for the root.
    pub fn name(&self) -> &str {
        self.full_name.last().map(String::as_str).unwrap_or("")
    }

    /// The space-joined display path, e.g. `"gem build"`.
    pub fn display_name(&self) -> String {
        self.full_name.join(" ")
    }

    /// The tool description, if set.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Set the tool description. Last write wins.
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = Some(description.into());
    }

    /// Alternate names this tool answers to under its parent.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Add an alias.
    pub fn add_alias(&mut self, alias: impl Into<String>) {
        self.aliases.push(alias.into());
    }

    /// Declared flags, in declaration order.
    pub fn flags(&self) -> &[FlagSpec] {
        &self.flags
    }

    /// Declare a flag.
    pub fn add_flag(&mut self, flag: FlagSpec) {
        self.flags.push(flag);
    }

    /// Declared positional arguments, in declaration order.
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Declare a positional argument.
    pub fn add_arg(&mut self, arg: ArgSpec) {
        self.args.push(arg);
    }

    /// Define a method directly on this tool.
    ///
    /// Directly-defined methods are the fallback of capability resolution,
    /// consulted after all attached mixins.
    pub fn define_method<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&mut ExecutionContext, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(f));
    }

    /// The ordered mixin attachment records.
    pub fn attached_mixins(&self) -> &[MixinAttachment] {
        &self.attached_mixins
    }

    /// Attach a mixin to this definition.
    ///
    /// If the mixin declares an inclusion callback it runs exactly once,
    /// here, with this definition as its receiver, and may mutate it. The
    /// attachment record is appended afterward; attachment order is
    /// significant because later attachments shadow earlier ones during
    /// capability resolution.
    pub fn attach(&mut self, mixin: Arc<Mixin>, extra_args: Vec<Value>) -> EngineResult<()> {
        if let Some(callback) = mixin.inclusion_callback() {
            let callback = callback.clone();
            callback(self, &extra_args)?;
        }
        self.attached_mixins.push(MixinAttachment { mixin, extra_args });
        Ok(())
    }

    /// Resolve a capability method by name.
    ///
    /// Scans attached mixins in reverse attachment order (most recent
    /// wins), then this tool's directly-defined methods.
    pub fn resolve_capability(&self, name: &str) -> EngineResult<CapabilityFn> {
        for attachment in self.attached_mixins.iter().rev() {
            if let Some(capability) = attachment.mixin.capability(name) {
                return Ok(capability.clone());
            }
        }
        self.methods
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::unknown_capability(name))
    }

    /// Whether this definition can be executed.
    pub fn is_runnable(&self) -> bool {
        self.run_handler.is_some()
    }

    /// The run handler, if set.
    pub fn run_handler(&self) -> Option<&RunHandler> {
        self.run_handler.as_ref()
    }

    /// Set the run handler. Last writer wins; a later directive at the same
    /// path replaces the body, matching redefinition ergonomics.
    pub fn set_run_handler(&mut self, handler: RunHandler) {
        self.run_handler = Some(handler);
    }

    /// Set the run handler, failing if one is already present.
    ///
    /// For loaders whose policy forbids redefining a runnable path.
    pub fn try_set_run_handler(&mut self, handler: RunHandler) -> EngineResult<()> {
        if self.run_handler.is_some() {
            return Err(EngineError::already_runnable(self.display_name()));
        }
        self.run_handler = Some(handler);
        Ok(())
    }

    /// Replace the inherited middleware pipeline for this tool.
    ///
    /// Overrides replace the default chain wholesale; there is no merging.
    pub fn set_middleware(&mut self, stages: Vec<Arc<dyn Middleware>>) {
        self.middleware_overrides = Some(stages);
    }

    /// The middleware override, if set.
    pub fn middleware_overrides(&self) -> Option<&[Arc<dyn Middleware>]> {
        self.middleware_overrides.as_deref()
    }

    /// Get the child with the given name segment, creating a non-runnable
    /// intermediate node if absent. Idempotent.
    pub fn get_or_create_child(&mut self, segment: impl Into<String>) -> &mut ToolDefinition {
        let segment = segment.into();
        let full_name = &self.full_name;
        self.children.entry(segment.clone()).or_insert_with(|| {
            let mut child_name = full_name.clone();
            child_name.push(segment);
            ToolDefinition::new(child_name)
        })
    }

    /// Look up a child by name or alias, returning its canonical segment.
    pub fn resolve_child_segment(&self, segment: &str) -> Option<&str> {
        if self.children.contains_key(segment) {
            return self.children.get_key_value(segment).map(|(k, _)| k.as_str());
        }
        self.children
            .values()
            .find(|child| child.aliases.iter().any(|a| a == segment))
            .map(|child| child.name())
    }

    /// Look up a child by canonical name segment.
    pub fn child(&self, segment: &str) -> Option<&ToolDefinition> {
        self.children.get(segment)
    }

    /// Mutable lookup of a child by canonical name segment.
    pub fn child_mut(&mut self, segment: &str) -> Option<&mut ToolDefinition> {
        self.children.get_mut(segment)
    }

    /// Iterate over child definitions in name order.
    pub fn children(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.children.values()
    }

    /// Whether this definition has any children.
    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("full_name", &self.full_name)
            .field("runnable", &self.is_runnable())
            .field("mixins", &self.attached_mixins.len())
            .field("children", &self.children.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ExecutionContext, Logger};
    use serde_json::json;

    fn make_context(tool: ToolDefinition) -> ExecutionContext {
        ExecutionContext::build(Arc::new(tool), HashMap::new(), Logger::new("test")).unwrap()
    }

    #[test]
    fn test_root_is_namespace() {
        let root = ToolDefinition::root();
        assert_eq!(root.name(), "");
        assert!(!root.is_runnable());
        assert!(!root.has_children());
    }

    #[test]
    fn test_get_or_create_child_is_idempotent() {
        let mut root = ToolDefinition::root();
        root.get_or_create_child("gem").get_or_create_child("build");
        let again = root.get_or_create_child("gem");
        assert_eq!(again.full_name(), &["gem".to_string()]);
        assert!(again.child("build").is_some());
        assert_eq!(root.children().count(), 1);
    }

    #[test]
    fn test_set_run_handler_last_writer_wins() {
        let mut tool = ToolDefinition::new(vec!["build".into()]);
        tool.set_run_handler(Arc::new(|ctx| {
            ctx.set_exit_code(10);
            Ok(())
        }));
        tool.set_run_handler(Arc::new(|ctx| {
            ctx.set_exit_code(20);
            Ok(())
        }));

        let mut ctx = make_context(tool);
        ctx.run().unwrap();
        assert_eq!(ctx.exit_code(), 20);
    }

    #[test]
    fn test_try_set_run_handler_rejects_overwrite() {
        let mut tool = ToolDefinition::new(vec!["build".into()]);
        tool.try_set_run_handler(Arc::new(|_ctx| Ok(()))).unwrap();

        let result = tool.try_set_run_handler(Arc::new(|_ctx| Ok(())));
        match result.unwrap_err() {
            EngineError::AlreadyRunnable { path } => assert_eq!(path, "build"),
            other => panic!("expected AlreadyRunnable, got {:?}", other),
        }
    }

    #[test]
    fn test_capability_shadowing_by_attachment_order() {
        let m1 = Arc::new(Mixin::new("m1").method("foo", |_ctx, _args| Ok(json!("m1"))));
        let m2 = Arc::new(Mixin::new("m2").method("foo", |_ctx, _args| Ok(json!("m2"))));

        let mut tool = ToolDefinition::new(vec!["t".into()]);
        tool.attach(m1.clone(), vec![]).unwrap();
        tool.attach(m2.clone(), vec![]).unwrap();
        let capability = tool.resolve_capability("foo").unwrap();
        let mut ctx = make_context(tool);
        assert_eq!(capability(&mut ctx, &[]).unwrap(), json!("m2"));

        // Reverse attachment order flips the winner.
        let mut tool = ToolDefinition::new(vec!["t".into()]);
        tool.attach(m2, vec![]).unwrap();
        tool.attach(m1, vec![]).unwrap();
        let capability = tool.resolve_capability("foo").unwrap();
        let mut ctx = make_context(tool);
        assert_eq!(capability(&mut ctx, &[]).unwrap(), json!("m1"));
    }

    #[test]
    fn test_mixins_shadow_own_methods() {
        let mixin = Arc::new(Mixin::new("m").method("foo", |_ctx, _args| Ok(json!("mixin"))));

        let mut tool = ToolDefinition::new(vec!["t".into()]);
        tool.define_method("foo", |_ctx, _args| Ok(json!("own")));
        tool.attach(mixin, vec![]).unwrap();

        let capability = tool.resolve_capability("foo").unwrap();
        let mut ctx = make_context(tool);
        assert_eq!(capability(&mut ctx, &[]).unwrap(), json!("mixin"));
    }

    #[test]
    fn test_unknown_capability() {
        let tool = ToolDefinition::new(vec!["t".into()]);
        let Err(err) = tool.resolve_capability("nope") else {
            panic!("expected UnknownCapability error");
        };
        match err {
            EngineError::UnknownCapability { name } => assert_eq!(name, "nope"),
            other => panic!("expected UnknownCapability, got {:?}", other),
        }
    }

    #[test]
    fn test_inclusion_callback_mutates_definition() {
        let mixin = Arc::new(Mixin::new("flagger").on_include(|tool, extra| {
            let flag_name = extra
                .first()
                .and_then(|v| v.as_str())
                .unwrap_or("extra")
                .to_string();
            tool.add_flag(FlagSpec::boolean(flag_name));
            Ok(())
        }));

        let mut tool = ToolDefinition::new(vec!["t".into()]);
        tool.attach(mixin, vec![json!("dry-run")]).unwrap();

        assert_eq!(tool.flags().len(), 1);
        assert_eq!(tool.flags()[0].name, "dry-run");
        assert_eq!(tool.attached_mixins().len(), 1);
    }

    #[test]
    fn test_resolve_child_segment_honors_aliases() {
        let mut root = ToolDefinition::root();
        let child = root.get_or_create_child("release");
        child.add_alias("rel");

        assert_eq!(root.resolve_child_segment("release"), Some("release"));
        assert_eq!(root.resolve_child_segment("rel"), Some("release"));
        assert_eq!(root.resolve_child_segment("nope"), None);
    }
}
