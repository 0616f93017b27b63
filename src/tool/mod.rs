//! Tool definitions: the nodes of the command tree.
//!
//! A [`ToolDefinition`] is one addressable command. It carries its own flag
//! and positional-argument specs, the ordered list of attached mixins, an
//! optional middleware override, an optional run handler, and a map of
//! child definitions. A definition without a run handler is a namespace
//! node; resolving to one triggers help display rather than execution.

mod definition;
mod spec;

pub use definition::{RunHandler, ToolDefinition};
pub use spec::{ArgSpec, FlagSpec};
