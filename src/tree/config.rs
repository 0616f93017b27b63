//! Declarative tool files.
//!
//! A tool file declares a subtree of the command namespace as data: tool
//! names, descriptions, flags, args, mixin references, and named-handler
//! references. Files are TOML or JSON with extension-based auto-detect.
//! Loading a file produces a [`ToolFileConfig`]; evaluating it replays the
//! declarations as directives against a [`ToolDsl`](crate::tree::ToolDsl)
//! scope, so file sources and closure sources compose identically.

use crate::error::{EngineError, EngineResult};
use crate::tool::{ArgSpec, FlagSpec};
use crate::tree::ToolDsl;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Root of a declarative tool file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolFileConfig {
    /// Tools declared at the source's path prefix.
    #[serde(default)]
    pub tools: Vec<ToolConfig>,
}

/// One declared tool, possibly with nested subtools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool name (one path segment).
    pub name: String,

    /// Description shown in help output.
    #[serde(default)]
    pub description: Option<String>,

    /// Alternate names under the parent namespace.
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Declared flags.
    #[serde(default)]
    pub flags: Vec<FlagSpec>,

    /// Declared positional arguments.
    #[serde(default)]
    pub args: Vec<ArgSpec>,

    /// Mixins to include, in order.
    #[serde(default)]
    pub mixins: Vec<MixinRef>,

    /// Named run handler registered on the CLI (e.g. "release::run").
    /// Absent for namespace nodes.
    #[serde(default)]
    pub handler: Option<String>,

    /// Nested subtools.
    #[serde(default)]
    pub subtools: Vec<ToolConfig>,
}

/// A mixin reference in a tool file: the declared name plus the extra
/// arguments forwarded to its lifecycle callbacks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixinRef {
    /// Name of a mixin declared in the registry.
    pub name: String,

    /// Extra arguments stored with the attachment.
    #[serde(default)]
    pub extra_args: Vec<Value>,
}

impl ToolFileConfig {
    /// Load from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&content).map_err(|err| {
            EngineError::definition(format!(
                "failed to parse tool file {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }

    /// Load from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&content).map_err(|err| {
            EngineError::definition(format!(
                "failed to parse tool file {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }

    /// Auto-detect format from the extension and load.
    ///
    /// Unknown extensions try TOML first, then JSON.
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Self::from_toml_file(path).or_else(|_| Self::from_json_file(path)),
        }
    }

    /// Replay this file's declarations as directives.
    pub fn apply(&self, dsl: &mut ToolDsl<'_>) -> EngineResult<()> {
        for tool in &self.tools {
            apply_tool(dsl, tool)?;
        }
        Ok(())
    }
}

fn apply_tool(dsl: &mut ToolDsl<'_>, config: &ToolConfig) -> EngineResult<()> {
    dsl.tool(&config.name, |scope| {
        if let Some(description) = &config.description {
            scope.desc(description.clone());
        }
        for alias in &config.aliases {
            scope.alias(alias.clone());
        }
        for flag in &config.flags {
            scope.flag(flag.clone());
        }
        for arg in &config.args {
            scope.arg(arg.clone());
        }
        for mixin in &config.mixins {
            scope.include(&mixin.name, mixin.extra_args.clone())?;
        }
        if let Some(handler_name) = &config.handler {
            let handler = scope.named_handler(handler_name)?;
            scope.run_arc(handler);
        }
        for subtool in &config.subtools {
            apply_tool(scope, subtool)?;
        }
        Ok(())
    })
}
