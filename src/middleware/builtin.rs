//! Built-in middleware stages for the default pipeline.

use crate::context::ExecutionContext;
use crate::error::EngineResult;
use crate::middleware::{Middleware, Next};
use crate::parser;

/// Shows help and short-circuits when the user asked for it, or when the
/// resolved tool is a namespace node with no run handler.
///
/// This stage is what makes a bare namespace invocation (e.g. `mycli gem`)
/// print the list of subtools instead of failing.
#[derive(Debug, Default)]
pub struct ShowHelp;

impl ShowHelp {
    /// Create the stage.
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for ShowHelp {
    fn handle(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> EngineResult<()> {
        if ctx.bool_arg("help") || !ctx.tool().is_runnable() {
            println!("{}", parser::render_help(ctx.tool()));
            return Ok(());
        }
        next.run(ctx)
    }
}

/// Folds `-v`/`-q` occurrence counts into the context logger's verbosity.
///
/// Reads the conventional `verbose` and `quiet` flags if the tool declares
/// them; absent flags contribute nothing. Always delegates to the rest of
/// the chain.
#[derive(Debug, Default)]
pub struct SetVerbosity;

impl SetVerbosity {
    /// Create the stage.
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for SetVerbosity {
    fn handle(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> EngineResult<()> {
        let delta = ctx.count_arg("verbose") as i32 - ctx.count_arg("quiet") as i32;
        if delta != 0 {
            let base = ctx.logger().verbosity();
            ctx.logger_mut().set_verbosity(base + delta);
        }
        next.run(ctx)
    }
}
