//! The argument-parser boundary.
//!
//! Flag and argument grammar is owned by clap; this module is the bridge
//! the engine calls after resolution and before context construction. It
//! converts a tool definition's declared specs into a `clap::Command`,
//! parses the residual command line into a name-to-value map, and renders
//! help text (including the subtool listing for namespace nodes).

use crate::error::{EngineError, EngineResult};
use crate::tool::{ArgSpec, FlagSpec, ToolDefinition};
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use serde_json::Value;
use std::collections::HashMap;

/// Build a `clap::Command` from a tool definition's flag and arg specs.
///
/// clap's automatic help flag is disabled in favor of an engine-declared
/// `--help` flag, so a help request parses like any other flag and the
/// `ShowHelp` middleware can act on it.
pub fn build_command(tool: &ToolDefinition) -> Command {
    let name: &'static str = Box::leak(display_or_default(tool).into_boxed_str());
    let mut command = Command::new(name)
        .disable_help_flag(true)
        .disable_help_subcommand(true)
        .no_binary_name(true);

    if let Some(description) = tool.description() {
        let about: &'static str = Box::leak(description.to_string().into_boxed_str());
        command = command.about(about);
    }

    for flag in tool.flags() {
        command = command.arg(build_flag(flag));
    }
    for (index, arg) in tool.args().iter().enumerate() {
        command = command.arg(build_positional(arg, index + 1));
    }

    command.arg(
        Arg::new("help")
            .long("help")
            .action(ArgAction::SetTrue)
            .help("Print help"),
    )
}

fn display_or_default(tool: &ToolDefinition) -> String {
    let display = tool.display_name();
    if display.is_empty() {
        "tool".to_string()
    } else {
        display
    }
}

/// Build a single named flag.
fn build_flag(spec: &FlagSpec) -> Arg {
    let name: &'static str = Box::leak(spec.name.clone().into_boxed_str());
    let mut arg = Arg::new(name);

    if let Some(short) = spec.short {
        arg = arg.short(short);
    }
    if let Some(long) = &spec.long {
        let long: &'static str = Box::leak(long.clone().into_boxed_str());
        arg = arg.long(long);
    } else if spec.short.is_none() {
        // A flag with no declared form would otherwise parse as a
        // positional; default the long form to the flag name.
        arg = arg.long(name);
    }
    if let Some(help) = &spec.help {
        let help: &'static str = Box::leak(help.clone().into_boxed_str());
        arg = arg.help(help);
    }
    if let Some(value_name) = &spec.value_name {
        let value_name: &'static str = Box::leak(value_name.clone().into_boxed_str());
        arg = arg.value_name(value_name);
    }

    match spec.value_type.as_str() {
        "bool" | "boolean" => {
            arg = arg.action(ArgAction::SetTrue);
        }
        "count" => {
            arg = arg.action(ArgAction::Count);
        }
        "int" | "integer" => {
            arg = arg.action(ArgAction::Set).value_parser(clap::value_parser!(i64));
        }
        "float" => {
            arg = arg.action(ArgAction::Set).value_parser(clap::value_parser!(f64));
        }
        _ => {
            if spec.multiple {
                arg = arg.action(ArgAction::Append);
            } else {
                arg = arg.action(ArgAction::Set);
            }
            arg = arg.value_parser(clap::value_parser!(String));
        }
    }

    if !spec.possible_values.is_empty() {
        let values: Vec<&'static str> = spec
            .possible_values
            .iter()
            .map(|v| Box::leak(v.clone().into_boxed_str()) as &'static str)
            .collect();
        arg = arg.value_parser(values);
    }

    if spec.required {
        arg = arg.required(true);
    }
    if let Some(default) = &spec.default {
        let default: &'static str = Box::leak(default.clone().into_boxed_str());
        arg = arg.default_value(default);
    }

    arg
}

/// Build a single positional argument.
fn build_positional(spec: &ArgSpec, index: usize) -> Arg {
    let name: &'static str = Box::leak(spec.name.clone().into_boxed_str());
    let mut arg = Arg::new(name).index(index);

    if let Some(help) = &spec.help {
        let help: &'static str = Box::leak(help.clone().into_boxed_str());
        arg = arg.help(help);
    }

    match spec.value_type.as_str() {
        "int" | "integer" => {
            arg = arg.value_parser(clap::value_parser!(i64));
        }
        "float" => {
            arg = arg.value_parser(clap::value_parser!(f64));
        }
        _ => {
            arg = arg.value_parser(clap::value_parser!(String));
        }
    }

    if spec.trailing {
        arg = arg.num_args(0..).trailing_var_arg(true);
    }
    if spec.required {
        arg = arg.required(true);
    }
    if let Some(default) = &spec.default {
        let default: &'static str = Box::leak(default.clone().into_boxed_str());
        arg = arg.default_value(default);
    }

    arg
}

/// Parse the residual command line against a tool's declared specs.
///
/// Returns the parsed values keyed by declared name. Parser rejections
/// surface as usage errors in the engine taxonomy.
pub fn parse_args(
    tool: &ToolDefinition,
    residual: &[String],
) -> EngineResult<HashMap<String, Value>> {
    let command = build_command(tool);
    let matches = command
        .try_get_matches_from(residual)
        .map_err(|err| EngineError::parse(err.to_string()))?;

    let mut parsed = HashMap::new();
    parsed.insert("help".to_string(), Value::Bool(matches.get_flag("help")));

    for flag in tool.flags() {
        extract_flag(&matches, flag, &mut parsed);
    }
    for arg in tool.args() {
        extract_positional(&matches, arg, &mut parsed);
    }

    Ok(parsed)
}

fn extract_flag(matches: &ArgMatches, spec: &FlagSpec, parsed: &mut HashMap<String, Value>) {
    match spec.value_type.as_str() {
        "bool" | "boolean" => {
            parsed.insert(spec.name.clone(), Value::Bool(matches.get_flag(&spec.name)));
        }
        "count" => {
            let count = matches.get_count(&spec.name) as u64;
            parsed.insert(spec.name.clone(), Value::from(count));
        }
        "int" | "integer" => {
            if let Some(value) = matches.get_one::<i64>(&spec.name) {
                parsed.insert(spec.name.clone(), Value::from(*value));
            }
        }
        "float" => {
            if let Some(value) = matches.get_one::<f64>(&spec.name) {
                parsed.insert(spec.name.clone(), Value::from(*value));
            }
        }
        _ => {
            if spec.multiple {
                if let Some(values) = matches.get_many::<String>(&spec.name) {
                    let collected: Vec<Value> =
                        values.map(|v| Value::String(v.clone())).collect();
                    parsed.insert(spec.name.clone(), Value::Array(collected));
                }
            } else if let Some(value) = matches.get_one::<String>(&spec.name) {
                parsed.insert(spec.name.clone(), Value::String(value.clone()));
            }
        }
    }
}

fn extract_positional(matches: &ArgMatches, spec: &ArgSpec, parsed: &mut HashMap<String, Value>) {
    if spec.trailing {
        let collected: Vec<Value> = matches
            .get_many::<String>(&spec.name)
            .map(|values| values.map(|v| Value::String(v.clone())).collect())
            .unwrap_or_default();
        parsed.insert(spec.name.clone(), Value::Array(collected));
        return;
    }

    match spec.value_type.as_str() {
        "int" | "integer" => {
            if let Some(value) = matches.get_one::<i64>(&spec.name) {
                parsed.insert(spec.name.clone(), Value::from(*value));
            }
        }
        "float" => {
            if let Some(value) = matches.get_one::<f64>(&spec.name) {
                parsed.insert(spec.name.clone(), Value::from(*value));
            }
        }
        _ => {
            if let Some(value) = matches.get_one::<String>(&spec.name) {
                parsed.insert(spec.name.clone(), Value::String(value.clone()));
            }
        }
    }
}

/// Render help text for a tool.
///
/// Runnable tools get clap's rendered usage; namespace nodes additionally
/// list their child tools so a bare namespace invocation is navigable.
pub fn render_help(tool: &ToolDefinition) -> String {
    let mut command = build_command(tool);
    let mut output = command.render_help().to_string();

    if tool.has_children() {
        output.push_str("\nSubtools:\n");
        for child in tool.children() {
            let description = child.description().unwrap_or("");
            output.push_str(&format!(
                "  {}  {}\n",
                child.name().cyan().bold(),
                description
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn make_tool() -> ToolDefinition {
        let mut tool = ToolDefinition::new(vec!["build".into()]);
        tool.add_flag(FlagSpec::boolean("force").with_short('f'));
        tool.add_flag(FlagSpec::counted("verbose").with_short('v'));
        tool.add_flag(
            FlagSpec::new("level", "int")
                .with_short('l')
                .with_default("3"),
        );
        tool.add_arg(ArgSpec::string("target").required());
        tool.add_arg(ArgSpec::string("rest").trailing());
        tool
    }

    #[test]
    fn test_parse_flags_and_positionals() {
        let tool = make_tool();
        let parsed = parse_args(
            &tool,
            &argv(&["-f", "-vv", "mylib", "one", "two"]),
        )
        .unwrap();

        assert_eq!(parsed["force"], Value::Bool(true));
        assert_eq!(parsed["verbose"], Value::from(2u64));
        assert_eq!(parsed["level"], Value::from(3i64));
        assert_eq!(parsed["target"], Value::String("mylib".into()));
        assert_eq!(
            parsed["rest"],
            Value::Array(vec![
                Value::String("one".into()),
                Value::String("two".into())
            ])
        );
        assert_eq!(parsed["help"], Value::Bool(false));
    }

    #[test]
    fn test_parse_failure_is_usage_error() {
        let tool = make_tool();
        let err = parse_args(&tool, &argv(&["--no-such-flag"])).unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_required_positional_fails() {
        let tool = make_tool();
        let err = parse_args(&tool, &argv(&[])).unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn test_help_flag_parses_like_any_other() {
        let mut tool = ToolDefinition::new(vec!["t".into()]);
        tool.add_arg(ArgSpec::string("target"));
        let parsed = parse_args(&tool, &argv(&["--help"])).unwrap();
        assert_eq!(parsed["help"], Value::Bool(true));
    }

    #[test]
    fn test_possible_values_validated() {
        let mut tool = ToolDefinition::new(vec!["t".into()]);
        tool.add_flag(
            FlagSpec::string("format")
                .with_possible_values(vec!["json".into(), "text".into()]),
        );

        let parsed = parse_args(&tool, &argv(&["--format", "json"])).unwrap();
        assert_eq!(parsed["format"], Value::String("json".into()));

        let err = parse_args(&tool, &argv(&["--format", "yaml"])).unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
    }

    #[test]
    fn test_flag_without_declared_form_gets_long_from_name() {
        // Deserialized specs may carry neither a short nor a long form;
        // the flag must still parse as --name, not as a positional.
        let mut tool = ToolDefinition::new(vec!["t".into()]);
        let mut spec = FlagSpec::boolean("dry-run");
        spec.long = None;
        tool.add_flag(spec);

        let parsed = parse_args(&tool, &argv(&["--dry-run"])).unwrap();
        assert_eq!(parsed["dry-run"], Value::Bool(true));
    }

    #[test]
    fn test_multiple_flag_collects_values() {
        let mut tool = ToolDefinition::new(vec!["t".into()]);
        tool.add_flag(FlagSpec::string("tag").multiple());

        let parsed =
            parse_args(&tool, &argv(&["--tag", "a", "--tag", "b"])).unwrap();
        assert_eq!(
            parsed["tag"],
            Value::Array(vec![Value::String("a".into()), Value::String("b".into())])
        );
    }

    #[test]
    fn test_render_help_lists_subtools() {
        let mut namespace = ToolDefinition::new(vec!["gem".into()]);
        namespace.set_description("Gem management tools");
        namespace
            .get_or_create_child("build")
            .set_description("Build the gem");
        namespace.get_or_create_child("release");

        let help = render_help(&namespace);
        assert!(help.contains("Subtools:"));
        assert!(help.contains("build"));
        assert!(help.contains("release"));
        assert!(help.contains("Build the gem"));
    }

    #[test]
    fn test_render_help_for_runnable_tool() {
        let tool = make_tool();
        let help = render_help(&tool);
        assert!(help.contains("--force"));
        assert!(help.contains("target"));
        assert!(!help.contains("Subtools:"));
    }
}
