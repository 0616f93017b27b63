//! Per-invocation logger handle.

/// A logger handle carried by each execution context.
///
/// Mixin methods and run handlers log through this handle rather than a
/// process-wide global, so nested invocations keep their own verbosity and
/// tool attribution. Events are emitted through `tracing`; the host
/// application installs whatever subscriber it wants.
#[derive(Debug, Clone)]
pub struct Logger {
    tool: String,
    verbosity: i32,
}

impl Logger {
    /// Create a logger attributed to the given tool path, at verbosity 0.
    pub fn new(tool: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            verbosity: 0,
        }
    }

    /// Set the verbosity and return the logger, builder-style.
    pub fn with_verbosity(mut self, verbosity: i32) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Current verbosity. 0 is the default; positive values enable debug
    /// and trace output, negative values suppress info output.
    pub fn verbosity(&self) -> i32 {
        self.verbosity
    }

    /// Adjust the verbosity (used by the `SetVerbosity` middleware).
    pub fn set_verbosity(&mut self, verbosity: i32) {
        self.verbosity = verbosity;
    }

    /// Log at error level. Always emitted.
    pub fn error(&self, message: &str) {
        tracing::error!(tool = %self.tool, "{}", message);
    }

    /// Log at warn level. Always emitted.
    pub fn warn(&self, message: &str) {
        tracing::warn!(tool = %self.tool, "{}", message);
    }

    /// Log at info level. Suppressed when verbosity is negative.
    pub fn info(&self, message: &str) {
        if self.verbosity >= 0 {
            tracing::info!(tool = %self.tool, "{}", message);
        }
    }

    /// Log at debug level. Emitted at verbosity 1 and above.
    pub fn debug(&self, message: &str) {
        if self.verbosity >= 1 {
            tracing::debug!(tool = %self.tool, "{}", message);
        }
    }

    /// Log at trace level. Emitted at verbosity 2 and above.
    pub fn trace(&self, message: &str) {
        if self.verbosity >= 2 {
            tracing::trace!(tool = %self.tool, "{}", message);
        }
    }
}
