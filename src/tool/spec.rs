//! Flag and positional-argument specifications.
//!
//! These types are opaque to the engine core; the parser boundary consumes
//! them to build the concrete argument grammar. They are serde types so
//! declarative file sources can carry them verbatim.

use serde::{Deserialize, Serialize};

fn default_value_type() -> String {
    "string".to_string()
}

/// Specification of one named flag on a tool.
///
/// The `value_type` string selects the parser behavior: `bool`, `count`,
/// `int`, `float`, `path`, or `string` (the default).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlagSpec {
    /// Flag name, used as the key in the parsed-argument map.
    pub name: String,

    /// Short flag character (e.g. 'v' for -v).
    #[serde(default)]
    pub short: Option<char>,

    /// Long flag name (e.g. "verbose" for --verbose).
    #[serde(default)]
    pub long: Option<String>,

    /// Help text.
    #[serde(default)]
    pub help: Option<String>,

    /// Declared value type.
    #[serde(rename = "type", default = "default_value_type")]
    pub value_type: String,

    /// Whether the flag must be supplied.
    #[serde(default)]
    pub required: bool,

    /// Default value, as a string handed to the parser.
    #[serde(default)]
    pub default: Option<String>,

    /// Whether the flag may be repeated to collect multiple values.
    #[serde(default)]
    pub multiple: bool,

    /// Allowed values (enum validation).
    #[serde(default)]
    pub possible_values: Vec<String>,

    /// Value placeholder for help text.
    #[serde(default)]
    pub value_name: Option<String>,
}

impl FlagSpec {
    /// Create a flag spec with the given name and value type.
    ///
    /// The long form defaults to the flag name.
    pub fn new(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            long: Some(name.clone()),
            name,
            short: None,
            help: None,
            value_type: value_type.into(),
            required: false,
            default: None,
            multiple: false,
            possible_values: Vec::new(),
            value_name: None,
        }
    }

    /// Create a boolean flag.
    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, "bool")
    }

    /// Create a counted flag (repeatable, parsed to an occurrence count).
    pub fn counted(name: impl Into<String>) -> Self {
        Self::new(name, "count")
    }

    /// Create a string-valued flag.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, "string")
    }

    /// Set the short form.
    pub fn with_short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    /// Set the long form (overriding the name-derived default).
    pub fn with_long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark the flag required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Allow the flag to be repeated.
    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }

    /// Restrict the flag to a set of allowed values.
    pub fn with_possible_values(mut self, values: Vec<String>) -> Self {
        self.possible_values = values;
        self
    }

    /// Set the value placeholder shown in help text.
    pub fn with_value_name(mut self, value_name: impl Into<String>) -> Self {
        self.value_name = Some(value_name.into());
        self
    }
}

/// Specification of one positional argument on a tool.
///
/// Positional arguments bind in declaration order; a trailing arg collects
/// all remaining command-line words.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgSpec {
    /// Argument name, used as the key in the parsed-argument map.
    pub name: String,

    /// Help text.
    #[serde(default)]
    pub help: Option<String>,

    /// Declared value type.
    #[serde(rename = "type", default = "default_value_type")]
    pub value_type: String,

    /// Whether the argument must be supplied.
    #[serde(default)]
    pub required: bool,

    /// Default value, as a string handed to the parser.
    #[serde(default)]
    pub default: Option<String>,

    /// Whether this argument collects all trailing words.
    #[serde(default)]
    pub trailing: bool,
}

impl ArgSpec {
    /// Create a positional argument spec with the given name and value type.
    pub fn new(name: impl Into<String>, value_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            help: None,
            value_type: value_type.into(),
            required: false,
            default: None,
            trailing: false,
        }
    }

    /// Create a string-valued positional argument.
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, "string")
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Mark the argument required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Collect all trailing command-line words into this argument.
    pub fn trailing(mut self) -> Self {
        self.trailing = true;
        self
    }
}
