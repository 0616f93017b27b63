//! The tool tree: a lazily-loaded namespace of tool definitions.
//!
//! Declarative sources register at path prefixes without being evaluated;
//! resolution walks a command line left to right, forcing exactly the
//! sources along the walked path, and returns the longest-prefix match
//! plus residual arguments. Resolved paths are cached, and registering a
//! source invalidates the cache entries it could affect.
//!
//! # Architecture
//!
//! ```text
//! Source (closure | file | config)
//!        │ registered at a path prefix
//!        ▼
//! ToolTree ── force on first touch ──▶ ToolDsl directives
//!        │                                   │
//!        │ longest-prefix walk               ▼
//!        ▼                             ToolDefinition nodes
//! Resolution { tool, residual, runnable }
//! ```

mod config;
mod dsl;
mod loader;

pub use config::{MixinRef, ToolConfig, ToolFileConfig};
pub use dsl::{SourceEnv, ToolDsl};
pub use loader::{Resolution, Source, ToolTree};
