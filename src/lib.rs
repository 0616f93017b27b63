//! Grove - a declarative engine for multi-level command-line tools
//!
//! Grove assembles a hierarchical namespace of named commands ("tools")
//! from declarative sources, resolves a command line to a specific tool
//! plus residual arguments, and runs the resolved tool through an ordered,
//! short-circuitable middleware pipeline. Reusable behavior ships as
//! mixins: named capability bundles attached to a tool at definition time
//! and instantiated per run.
//!
//! - **`mixin`** - capability bundles with attach-time and
//!   instantiate-time lifecycle callbacks
//! - **`tool`** - tool definitions: flags, args, mixins, run handlers,
//!   children
//! - **`tree`** - lazy namespace loading and longest-prefix resolution
//! - **`middleware`** - the wrapper pipeline around execution
//! - **`context`** - the per-invocation execution context
//! - **`parser`** - the clap-backed argument-parsing boundary
//! - **`cli`** - the `run(argv) -> exit code` entry point
//!
//! # Example
//!
//! ```
//! use grove::cli::Cli;
//! use grove::mixin::Mixin;
//! use grove::tool::FlagSpec;
//! use serde_json::json;
//!
//! let mut cli = Cli::new("mycli");
//!
//! cli.declare_mixin(Mixin::new("counter").on_initialize(|ctx, extra| {
//!     let start = extra.first().and_then(|v| v.as_i64()).unwrap_or(0);
//!     ctx.set("count", json!(start));
//!     Ok(())
//! }))
//! .unwrap();
//!
//! cli.define(|dsl| {
//!     dsl.tool("gem", |gem| {
//!         gem.desc("Gem management tools");
//!         gem.tool("build", |build| {
//!             build.flag(FlagSpec::boolean("force").with_short('f'));
//!             build.include("counter", vec![json!(1)])?;
//!             build.run(|ctx| {
//!                 if ctx.bool_arg("force") {
//!                     ctx.logger().info("forcing build");
//!                 }
//!                 Ok(())
//!             });
//!             Ok(())
//!         })
//!     })
//! });
//!
//! let exit = cli.run(&["gem".to_string(), "build".to_string()]);
//! assert_eq!(exit, 0);
//! ```

#![warn(missing_docs)]

pub mod cli;
pub mod context;
pub mod error;
pub mod middleware;
pub mod mixin;
pub mod parser;
pub mod tool;
pub mod tree;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cli::Cli;
    pub use crate::context::{ExecutionContext, Logger};
    pub use crate::error::{EngineError, EngineResult, ErrorCategory};
    pub use crate::middleware::{Middleware, Next, SetVerbosity, ShowHelp};
    pub use crate::mixin::{DefaultMixinRegistry, Mixin, MixinRegistry};
    pub use crate::tool::{ArgSpec, FlagSpec, RunHandler, ToolDefinition};
    pub use crate::tree::{Resolution, Source, SourceEnv, ToolDsl, ToolFileConfig, ToolTree};
}
