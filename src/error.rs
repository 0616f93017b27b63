//! Error types for the tool engine.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while defining, resolving, or running tools.
///
/// Every variant belongs to one of five categories (see [`ErrorCategory`]):
/// definition errors surface tool-authoring bugs at load time, resolution
/// errors mean the command line matched nothing under strict policy, usage
/// errors come from the argument parser, initialization errors abort
/// context construction, and execution errors are runtime failures of the
/// tool's own logic.
///
/// # Example
///
/// ```
/// use grove::error::{EngineError, ErrorCategory};
///
/// let error = EngineError::unknown_mixin("fileutils");
/// assert!(error.to_string().contains("fileutils"));
/// assert_eq!(error.category(), ErrorCategory::Definition);
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// A mixin with the same name is already declared in the registry.
    #[error("mixin already declared: {name}")]
    DuplicateMixin {
        /// Name of the duplicate mixin.
        name: String,
    },

    /// An `include` directive referenced a mixin that was never declared.
    #[error("unknown mixin: {name}")]
    UnknownMixin {
        /// Name of the missing mixin.
        name: String,
    },

    /// A run handler was assigned to a tool that already has one, under a
    /// loader policy that forbids overwriting.
    #[error("tool is already runnable: {path}")]
    AlreadyRunnable {
        /// Display path of the tool.
        path: String,
    },

    /// A capability lookup found no matching method on the tool or any of
    /// its attached mixins.
    #[error("unknown capability: {name}")]
    UnknownCapability {
        /// Name of the missing capability method.
        name: String,
    },

    /// A declarative directive was malformed.
    #[error("definition error: {message}")]
    Definition {
        /// Description of the malformed directive.
        message: String,
    },

    /// The command line matched no runnable tool under strict resolution.
    #[error("no such tool: {path}")]
    NoSuchTool {
        /// The argv path that failed to resolve.
        path: String,
    },

    /// The argument parser rejected the residual command line.
    #[error("{message}")]
    Parse {
        /// Parser diagnostic, rendered for the user.
        message: String,
    },

    /// A mixin's initialization callback failed while building the
    /// execution context. The context is never handed to the pipeline.
    #[error("mixin {mixin} failed to initialize: {message}")]
    Initialization {
        /// Name of the offending mixin.
        mixin: String,
        /// Description of the failure.
        message: String,
    },

    /// The run handler or a middleware stage failed after the context was
    /// built.
    #[error("execution failed: {message}")]
    Execution {
        /// Description of the failure.
        message: String,
    },

    /// An I/O error while reading a declarative source file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of an [`EngineError`], used for exit-code mapping
/// and stderr reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Runtime failure of the tool's own logic (exit code 1).
    Execution,
    /// The user supplied arguments the parser rejected (exit code 2).
    Usage,
    /// No tool matched under strict resolution (exit code 3).
    Resolution,
    /// A tool-authoring bug detected at load time (exit code 4).
    Definition,
    /// A mixin initializer failed before the pipeline ran (exit code 5).
    Initialization,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Execution => "execution",
            Self::Usage => "usage",
            Self::Resolution => "resolution",
            Self::Definition => "definition",
            Self::Initialization => "initialization",
        };
        write!(f, "{}", label)
    }
}

impl ErrorCategory {
    /// The stable process exit code for this category.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Execution => 1,
            Self::Usage => 2,
            Self::Resolution => 3,
            Self::Definition => 4,
            Self::Initialization => 5,
        }
    }
}

impl EngineError {
    /// Create a DuplicateMixin error for the given mixin name.
    pub fn duplicate_mixin(name: impl Into<String>) -> Self {
        Self::DuplicateMixin { name: name.into() }
    }

    /// Create an UnknownMixin error for the given mixin name.
    pub fn unknown_mixin(name: impl Into<String>) -> Self {
        Self::UnknownMixin { name: name.into() }
    }

    /// Create an AlreadyRunnable error for the given tool path.
    pub fn already_runnable(path: impl Into<String>) -> Self {
        Self::AlreadyRunnable { path: path.into() }
    }

    /// Create an UnknownCapability error.
    pub fn unknown_capability(name: impl Into<String>) -> Self {
        Self::UnknownCapability { name: name.into() }
    }

    /// Create a Definition error.
    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition {
            message: message.into(),
        }
    }

    /// Create a NoSuchTool error for the given argv path.
    pub fn no_such_tool(path: impl Into<String>) -> Self {
        Self::NoSuchTool { path: path.into() }
    }

    /// Create a Parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Create an Initialization error naming the offending mixin.
    pub fn initialization(mixin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Initialization {
            mixin: mixin.into(),
            message: message.into(),
        }
    }

    /// Create an Execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution {
            message: message.into(),
        }
    }

    /// Classify this error for reporting and exit-code mapping.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateMixin { .. }
            | Self::UnknownMixin { .. }
            | Self::AlreadyRunnable { .. }
            | Self::Definition { .. }
            | Self::Io(_) => ErrorCategory::Definition,
            Self::NoSuchTool { .. } => ErrorCategory::Resolution,
            Self::Parse { .. } => ErrorCategory::Usage,
            Self::Initialization { .. } => ErrorCategory::Initialization,
            Self::UnknownCapability { .. } | Self::Execution { .. } => ErrorCategory::Execution,
        }
    }

    /// The stable process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        self.category().exit_code()
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        EngineError::Execution {
            message: format!("{:#}", err),
        }
    }
}
