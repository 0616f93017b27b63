//! Reusable behavior bundles that tools can include.
//!
//! A mixin is a named collection of capability methods plus two optional
//! lifecycle callbacks. Attaching a mixin to a tool definition makes its
//! methods resolvable on every execution context built from that
//! definition; the mixin itself is shared by reference and never copied.
//!
//! The two callbacks mirror the difference between class-level and
//! instance-level configuration:
//!
//! - the *inclusion* callback runs once per tool definition at attach time,
//!   with the definition as its receiver, and may issue further directives
//!   (declare flags, define methods);
//! - the *initialization* callback runs once per execution context, with
//!   the context as its receiver, and typically seeds per-run state via
//!   [`ExecutionContext::set`](crate::context::ExecutionContext::set).
//!
//! # Quick Start
//!
//! ```
//! use grove::mixin::{DefaultMixinRegistry, Mixin, MixinRegistry};
//! use serde_json::{json, Value};
//!
//! let counter = Mixin::new("counter")
//!     .on_initialize(|ctx, extra| {
//!         let start = extra.first().and_then(Value::as_i64).unwrap_or(0);
//!         ctx.set("counter_value", json!(start));
//!         Ok(())
//!     })
//!     .method("increment", |ctx, _args| {
//!         let next = ctx.get("counter_value").and_then(Value::as_i64).unwrap_or(0) + 1;
//!         ctx.set("counter_value", json!(next));
//!         Ok(json!(next))
//!     });
//!
//! let mut registry = DefaultMixinRegistry::new();
//! let entry = registry.declare(counter).unwrap();
//! assert!(entry.is_configured());
//! ```

mod definition;
mod registry;

pub use definition::{CapabilityFn, IncludeFn, InitFn, Mixin, MixinAttachment};
pub use registry::{DefaultMixinRegistry, MixinRegistry};
