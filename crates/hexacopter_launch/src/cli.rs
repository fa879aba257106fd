//! Command-line interface for hexacopter_launch

use crate::plan::LaunchPlan;
use argh::FromArgs;
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

/// Build the launch plan for the simulated hexacopter
#[derive(FromArgs, Debug)]
pub struct LaunchArgs {
    /// path to a launch config (default: built-in hexacopter config)
    #[argh(positional)]
    pub config: Option<String>,

    /// override launch arguments (format: key:=value)
    #[argh(option, short = 'a', from_str_fn(parse_arg_override))]
    pub arg: Vec<(String, String)>,

    /// map a package to its share directory (format: package=dir)
    #[argh(option, from_str_fn(parse_share_override))]
    pub share: Vec<(String, PathBuf)>,

    /// include the rqt_gui rule
    #[argh(switch)]
    pub gui: bool,

    /// output format: text, yaml or json
    #[argh(option, short = 'f', default = "OutputFormat::Text")]
    pub format: OutputFormat,

    /// validate the launch config and exit
    #[argh(switch)]
    pub validate: bool,

    /// log level (error, warn, info, debug, trace)
    #[argh(option, short = 'l', default = "String::from(\"info\")")]
    pub log_level: String,
}

/// How the plan is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Yaml,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "yaml" => Ok(OutputFormat::Yaml),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Invalid format '{}'. Expected 'text', 'yaml' or 'json'",
                s
            )),
        }
    }
}

impl OutputFormat {
    /// Render a plan in this format
    pub fn render(self, plan: &LaunchPlan) -> Result<String, RenderError> {
        match self {
            OutputFormat::Text => Ok(plan.to_string()),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(plan)?),
            OutputFormat::Json => Ok(serde_json::to_string_pretty(plan)?),
        }
    }
}

/// Errors that can occur when rendering a plan
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Failed to serialize plan as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to serialize plan as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse argument override in format "key:=value"
fn parse_arg_override(s: &str) -> Result<(String, String), String> {
    match s.split_once(":=") {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!(
            "Invalid argument format '{}'. Expected 'key:=value'",
            s
        )),
    }
}

/// Parse share directory override in format "package=dir"
fn parse_share_override(s: &str) -> Result<(String, PathBuf), String> {
    match s.split_once('=') {
        Some((package, dir)) if !package.is_empty() && !dir.is_empty() => {
            Ok((package.to_string(), PathBuf::from(dir)))
        }
        _ => Err(format!(
            "Invalid share format '{}'. Expected 'package=dir'",
            s
        )),
    }
}

impl LaunchArgs {
    /// Convert argument overrides to a HashMap
    pub fn arg_overrides(&self) -> HashMap<String, String> {
        self.arg.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arg_override() {
        let result = parse_arg_override("entity:=hexa_1");
        assert_eq!(result, Ok(("entity".to_string(), "hexa_1".to_string())));
    }

    #[test]
    fn test_parse_arg_override_with_equals() {
        let result = parse_arg_override("world:=worlds/a:=b.world");
        assert_eq!(
            result,
            Ok(("world".to_string(), "worlds/a:=b.world".to_string()))
        );
    }

    #[test]
    fn test_parse_arg_override_invalid() {
        assert!(parse_arg_override("invalid").is_err());
        assert!(parse_arg_override(":=value").is_err());
    }

    #[test]
    fn test_parse_share_override() {
        let result = parse_share_override("gazebo_ros=/opt/ros/humble/share/gazebo_ros");
        assert_eq!(
            result,
            Ok((
                "gazebo_ros".to_string(),
                PathBuf::from("/opt/ros/humble/share/gazebo_ros")
            ))
        );
        assert!(parse_share_override("gazebo_ros").is_err());
    }

    #[test]
    fn test_output_format() {
        assert_eq!("YAML".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_args_from_command_line() {
        let args = LaunchArgs::from_args(
            &["hexacopter_launch"],
            &["hexa.yaml", "-a", "entity:=hexa_1", "--gui", "-f", "json"],
        )
        .unwrap();

        assert_eq!(args.config.as_deref(), Some("hexa.yaml"));
        assert_eq!(args.arg_overrides()["entity"], "hexa_1");
        assert!(args.gui);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.log_level, "info");
    }
}
