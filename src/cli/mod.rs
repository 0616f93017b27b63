//! The CLI entry point tying the engine together.
//!
//! A [`Cli`] owns the tool tree, the mixin registry, the named-handler
//! map, and the default middleware pipeline. Running an argv resolves it
//! against the tree, parses residual arguments, builds the execution
//! context (running mixin initializers), and sends the context through the
//! pipeline. Errors map onto a stable exit-code table:
//!
//! | code | meaning                                    |
//! |------|--------------------------------------------|
//! | 0    | success, including namespace help outcomes |
//! | 1    | execution error (handler or stage failed)  |
//! | 2    | usage error (argument parse failure)       |
//! | 3    | resolution error (strict mode, no match)   |
//! | 4    | definition error (malformed directives)    |
//! | 5    | initialization error (mixin initializer)   |

use crate::context::{ExecutionContext, Logger};
use crate::error::EngineResult;
use crate::middleware::{self, Middleware, SetVerbosity, ShowHelp};
use crate::mixin::{DefaultMixinRegistry, Mixin, MixinRegistry};
use crate::parser;
use crate::tool::RunHandler;
use crate::tree::{Source, SourceEnv, ToolTree};
use colored::Colorize;
use std::collections::HashMap;
use std::sync::Arc;

/// A configured command-line application.
///
/// # Example
///
/// ```
/// use grove::cli::Cli;
///
/// let mut cli = Cli::new("mycli");
/// cli.define(|dsl| {
///     dsl.tool("greet", |t| {
///         t.desc("Say hello");
///         t.run(|ctx| {
///             ctx.logger().info("hello");
///             Ok(())
///         });
///         Ok(())
///     })
/// });
///
/// let exit = cli.run(&["greet".to_string()]);
/// assert_eq!(exit, 0);
/// ```
pub struct Cli {
    name: String,
    tree: ToolTree,
    mixins: DefaultMixinRegistry,
    handlers: HashMap<String, RunHandler>,
    default_middleware: Vec<Arc<dyn Middleware>>,
}

impl Cli {
    /// Create a CLI with the default middleware pipeline
    /// (`ShowHelp`, then `SetVerbosity`).
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tree: ToolTree::new(),
            mixins: DefaultMixinRegistry::new(),
            handlers: HashMap::new(),
            default_middleware: vec![Arc::new(ShowHelp::new()), Arc::new(SetVerbosity::new())],
        }
    }

    /// The application name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the default middleware pipeline, builder-style.
    pub fn with_default_middleware(mut self, stages: Vec<Arc<dyn Middleware>>) -> Self {
        self.default_middleware = stages;
        self
    }

    /// Enable strict resolution: unmatched command lines become resolution
    /// errors instead of namespace help.
    pub fn with_strict_resolution(mut self, strict: bool) -> Self {
        self.tree.set_strict(strict);
        self
    }

    /// Register a named run handler that declarative file sources can
    /// reference by key.
    pub fn register_handler<F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut ExecutionContext) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Arc::new(handler));
        self
    }

    /// Declare a mixin in this CLI's registry.
    pub fn declare_mixin(&mut self, mixin: Mixin) -> EngineResult<Arc<Mixin>> {
        self.mixins.declare(mixin)
    }

    /// The mixin registry.
    pub fn mixins(&self) -> &DefaultMixinRegistry {
        &self.mixins
    }

    /// Register a deferred source at a path prefix.
    pub fn add_source(&mut self, prefix: Vec<String>, source: Source) {
        self.tree.add_source(prefix, source);
    }

    /// Register a programmatic source at the tree root.
    pub fn define<F>(&mut self, body: F)
    where
        F: FnOnce(&mut crate::tree::ToolDsl<'_>) -> EngineResult<()> + Send + 'static,
    {
        self.tree.add_source(Vec::new(), Source::from_fn(body));
    }

    /// The tool tree.
    pub fn tree(&self) -> &ToolTree {
        &self.tree
    }

    /// Run an invocation and report its exit code.
    ///
    /// Never panics on engine errors: failures print to stderr with their
    /// category and map onto the documented exit-code table.
    pub fn run(&mut self, argv: &[String]) -> i32 {
        match self.try_run(argv) {
            Ok(code) => code,
            Err(err) => {
                let category = format!("[{} error]", err.category());
                eprintln!("{} {}", category.red().bold(), err);
                err.exit_code()
            }
        }
    }

    /// Run an invocation, surfacing engine errors to the caller.
    ///
    /// This is the programmatic entry: resolution, argument parsing,
    /// context construction, and the middleware pipeline, in that order.
    pub fn try_run(&mut self, argv: &[String]) -> EngineResult<i32> {
        let env = SourceEnv {
            mixins: &self.mixins,
            handlers: &self.handlers,
        };
        let resolution = self.tree.resolve(argv, &env)?;
        tracing::debug!(
            tool = %resolution.tool.display_name(),
            runnable = resolution.runnable,
            "dispatching"
        );

        // Namespace outcomes skip the parser: their residual argv is the
        // unmatched path, not arguments to validate.
        let parsed = if resolution.runnable {
            parser::parse_args(&resolution.tool, &resolution.residual)?
        } else {
            HashMap::new()
        };

        let logger_name = if resolution.tool.full_name().is_empty() {
            self.name.clone()
        } else {
            resolution.tool.display_name()
        };
        let mut ctx =
            ExecutionContext::build(resolution.tool.clone(), parsed, Logger::new(logger_name))?;

        let stages: Vec<Arc<dyn Middleware>> = match resolution.tool.middleware_overrides() {
            Some(overrides) => overrides.to_vec(),
            None => self.default_middleware.clone(),
        };
        middleware::run_pipeline(&stages, &mut ctx)?;

        Ok(ctx.exit_code())
    }
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("name", &self.name)
            .field("mixins", &self.mixins.len())
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("middleware", &self.default_middleware.len())
            .finish()
    }
}
