//! The ordered middleware pipeline surrounding tool execution.
//!
//! A pipeline is an ordered sequence of stages. Each stage receives the
//! execution context plus a [`Next`] continuation for the remainder of the
//! chain; it may run logic before calling `next`, call it zero or more
//! times, run logic after it returns, or skip it entirely to short-circuit.
//! The final continuation invokes the resolved tool's run handler.
//!
//! Ordering is significant and caller-specified; there is no implicit
//! sorting or priority system. A tool definition's middleware override
//! replaces the inherited pipeline wholesale.
//!
//! # Example
//!
//! ```
//! use grove::context::{ExecutionContext, Logger};
//! use grove::middleware::{self, Middleware, Next};
//! use grove::error::EngineResult;
//! use grove::tool::ToolDefinition;
//! use std::collections::HashMap;
//! use std::sync::Arc;
//!
//! struct Gate;
//!
//! impl Middleware for Gate {
//!     fn handle(&self, ctx: &mut ExecutionContext, _next: Next<'_>) -> EngineResult<()> {
//!         // Short-circuit: never call next.
//!         ctx.set_exit_code(0);
//!         Ok(())
//!     }
//! }
//!
//! let mut tool = ToolDefinition::new(vec!["noop".into()]);
//! tool.set_run_handler(Arc::new(|_ctx| panic!("never reached")));
//! let mut ctx =
//!     ExecutionContext::build(Arc::new(tool), HashMap::new(), Logger::new("noop")).unwrap();
//!
//! let stages: Vec<Arc<dyn Middleware>> = vec![Arc::new(Gate)];
//! middleware::run_pipeline(&stages, &mut ctx).unwrap();
//! ```

mod builtin;

pub use builtin::{SetVerbosity, ShowHelp};

use crate::context::ExecutionContext;
use crate::error::{EngineError, EngineResult};
use std::sync::Arc;

/// One wrapper stage in the execution pipeline.
pub trait Middleware: Send + Sync {
    /// Run this stage.
    ///
    /// Call `next.run(ctx)` to delegate to the remainder of the chain, or
    /// return without calling it to short-circuit. An error aborts the
    /// remainder of the chain and unwinds through outer stages' normal
    /// return path, so code written after the `next` call still executes
    /// during unwind.
    fn handle(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> EngineResult<()>;
}

/// The continuation handed to each middleware stage.
///
/// Cheap to copy; a stage may invoke it zero or more times (normally
/// exactly once). When no stages remain, running it invokes the resolved
/// tool's run handler.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [Arc<dyn Middleware>],
}

impl Next<'_> {
    /// Invoke the remainder of the chain.
    pub fn run(self, ctx: &mut ExecutionContext) -> EngineResult<()> {
        match self.stages.split_first() {
            Some((stage, rest)) => stage.handle(ctx, Next { stages: rest }),
            None => {
                if !ctx.tool().is_runnable() {
                    return Err(EngineError::execution(format!(
                        "tool '{}' has no run handler",
                        ctx.tool().display_name()
                    )));
                }
                ctx.run()
            }
        }
    }
}

/// Run a context through an ordered pipeline of stages.
///
/// The final stage's continuation invokes the tool's run handler inside
/// the context.
pub fn run_pipeline(
    stages: &[Arc<dyn Middleware>],
    ctx: &mut ExecutionContext,
) -> EngineResult<()> {
    Next { stages }.run(ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Logger;
    use crate::tool::ToolDefinition;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Trace = Arc<Mutex<Vec<&'static str>>>;

    struct Recorder {
        label: &'static str,
        call_next: bool,
        trace: Trace,
    }

    impl Middleware for Recorder {
        fn handle(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> EngineResult<()> {
            self.trace.lock().unwrap().push(self.label);
            let result = if self.call_next { next.run(ctx) } else { Ok(()) };
            // After-logic: runs on success and on error unwind alike.
            self.trace.lock().unwrap().push("after");
            result
        }
    }

    fn make_runnable(trace: Trace) -> ToolDefinition {
        let mut tool = ToolDefinition::new(vec!["t".into()]);
        tool.set_run_handler(Arc::new(move |_ctx| {
            trace.lock().unwrap().push("run");
            Ok(())
        }));
        tool
    }

    fn build_ctx(tool: ToolDefinition) -> ExecutionContext {
        ExecutionContext::build(Arc::new(tool), HashMap::new(), Logger::new("t")).unwrap()
    }

    #[test]
    fn test_stages_run_in_order() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let stages: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Recorder {
                label: "a",
                call_next: true,
                trace: trace.clone(),
            }),
            Arc::new(Recorder {
                label: "b",
                call_next: true,
                trace: trace.clone(),
            }),
        ];

        let mut ctx = build_ctx(make_runnable(trace.clone()));
        run_pipeline(&stages, &mut ctx).unwrap();

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["a", "b", "run", "after", "after"]
        );
    }

    #[test]
    fn test_short_circuit_skips_rest_but_runs_outer_after_logic() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let stages: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Recorder {
                label: "a",
                call_next: true,
                trace: trace.clone(),
            }),
            Arc::new(Recorder {
                label: "b",
                call_next: false,
                trace: trace.clone(),
            }),
            Arc::new(Recorder {
                label: "c",
                call_next: true,
                trace: trace.clone(),
            }),
        ];

        let mut ctx = build_ctx(make_runnable(trace.clone()));
        run_pipeline(&stages, &mut ctx).unwrap();

        // Stage c and the run handler never execute; stage a's after-logic
        // still does.
        assert_eq!(
            *trace.lock().unwrap(),
            vec!["a", "b", "after", "after"]
        );
    }

    #[test]
    fn test_error_unwinds_through_outer_stages() {
        struct Failing;
        impl Middleware for Failing {
            fn handle(&self, _ctx: &mut ExecutionContext, _next: Next<'_>) -> EngineResult<()> {
                Err(EngineError::execution("stage failed"))
            }
        }

        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let stages: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(Recorder {
                label: "outer",
                call_next: true,
                trace: trace.clone(),
            }),
            Arc::new(Failing),
        ];

        let mut ctx = build_ctx(make_runnable(trace.clone()));
        let err = run_pipeline(&stages, &mut ctx).unwrap_err();

        assert!(err.to_string().contains("stage failed"));
        assert_eq!(*trace.lock().unwrap(), vec!["outer", "after"]);
    }

    #[test]
    fn test_next_may_be_called_twice() {
        struct Twice;
        impl Middleware for Twice {
            fn handle(&self, ctx: &mut ExecutionContext, next: Next<'_>) -> EngineResult<()> {
                next.run(ctx)?;
                next.run(ctx)
            }
        }

        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let stages: Vec<Arc<dyn Middleware>> = vec![Arc::new(Twice)];

        let mut ctx = build_ctx(make_runnable(trace.clone()));
        run_pipeline(&stages, &mut ctx).unwrap();

        assert_eq!(*trace.lock().unwrap(), vec!["run", "run"]);
    }

    #[test]
    fn test_empty_pipeline_invokes_run_handler() {
        let trace: Trace = Arc::new(Mutex::new(Vec::new()));
        let mut ctx = build_ctx(make_runnable(trace.clone()));
        run_pipeline(&[], &mut ctx).unwrap();
        assert_eq!(*trace.lock().unwrap(), vec!["run"]);
    }

    #[test]
    fn test_terminal_on_namespace_is_execution_error() {
        let tool = ToolDefinition::new(vec!["ns".into()]);
        let mut ctx = build_ctx(tool);
        let err = run_pipeline(&[], &mut ctx).unwrap_err();
        assert!(err.to_string().contains("no run handler"));
    }
}
