//! Launch directives: what the runtime should start

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a node's stdout/stderr goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Log files only (runtime default)
    #[default]
    Log,
    /// Console
    Screen,
    /// Console and log files
    Both,
}

/// A shell command whose stdout becomes a value at launch time
///
/// The parts are concatenated verbatim, so separators belong in the parts
/// themselves (`["xacro ", "/path/robot.xacro"]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandSubstitution {
    parts: Vec<String>,
}

impl CommandSubstitution {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// The command line handed to the shell
    pub fn command_line(&self) -> String {
        self.parts.concat()
    }
}

impl fmt::Display for CommandSubstitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "$(command {})", self.command_line())
    }
}

/// Node parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterValue {
    Text(String),
    /// Evaluated by the runtime when the node starts
    Command(CommandSubstitution),
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        ParameterValue::Text(s.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        ParameterValue::Text(s)
    }
}

impl From<CommandSubstitution> for ParameterValue {
    fn from(command: CommandSubstitution) -> Self {
        ParameterValue::Command(command)
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterValue::Text(s) => f.write_str(s),
            ParameterValue::Command(c) => c.fmt(f),
        }
    }
}

/// One external process to start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDirective {
    package: String,
    executable: String,
    #[serde(default)]
    arguments: Vec<String>,
    #[serde(default)]
    parameters: IndexMap<String, ParameterValue>,
    #[serde(default)]
    output: OutputMode,
}

impl NodeDirective {
    pub fn new(package: impl Into<String>, executable: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            executable: executable.into(),
            arguments: Vec::new(),
            parameters: IndexMap::new(),
            output: OutputMode::default(),
        }
    }

    /// Append positional arguments
    pub fn with_arguments<I, S>(mut self, arguments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(arguments.into_iter().map(Into::into));
        self
    }

    pub fn with_parameter(
        mut self,
        name: impl Into<String>,
        value: impl Into<ParameterValue>,
    ) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    pub fn with_output(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn parameters(&self) -> &IndexMap<String, ParameterValue> {
        &self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.get(name)
    }

    pub fn output(&self) -> OutputMode {
        self.output
    }

    /// `package/executable`
    pub fn label(&self) -> String {
        format!("{}/{}", self.package, self.executable)
    }
}

/// Inclusion of another launch description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeDirective {
    source: PathBuf,
    #[serde(default)]
    launch_arguments: IndexMap<String, String>,
}

impl IncludeDirective {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            launch_arguments: IndexMap::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.launch_arguments.insert(name.into(), value.into());
        self
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn launch_arguments(&self) -> &IndexMap<String, String> {
        &self.launch_arguments
    }

    pub fn launch_argument(&self, name: &str) -> Option<&str> {
        self.launch_arguments.get(name).map(String::as_str)
    }
}

/// Top-level action in a plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LaunchAction {
    Node(NodeDirective),
    Include(IncludeDirective),
}

impl LaunchAction {
    pub fn as_node(&self) -> Option<&NodeDirective> {
        match self {
            LaunchAction::Node(node) => Some(node),
            LaunchAction::Include(_) => None,
        }
    }

    pub fn as_include(&self) -> Option<&IncludeDirective> {
        match self {
            LaunchAction::Include(include) => Some(include),
            LaunchAction::Node(_) => None,
        }
    }

    pub fn label(&self) -> String {
        match self {
            LaunchAction::Node(node) => node.label(),
            LaunchAction::Include(include) => include.source.display().to_string(),
        }
    }
}

impl From<NodeDirective> for LaunchAction {
    fn from(node: NodeDirective) -> Self {
        LaunchAction::Node(node)
    }
}

impl From<IncludeDirective> for LaunchAction {
    fn from(include: IncludeDirective) -> Self {
        LaunchAction::Include(include)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_substitution_concatenates_parts() {
        let command = CommandSubstitution::new(["xacro ", "/ws/share/my_hexacopter/urdf/robot_arm.xacro"]);
        assert_eq!(
            command.command_line(),
            "xacro /ws/share/my_hexacopter/urdf/robot_arm.xacro"
        );
        assert_eq!(
            command.to_string(),
            "$(command xacro /ws/share/my_hexacopter/urdf/robot_arm.xacro)"
        );
    }

    #[test]
    fn test_node_directive_builder() {
        let node = NodeDirective::new("controller_manager", "spawner.py")
            .with_arguments(["joint_state_broadcaster"])
            .with_output(OutputMode::Screen);

        assert_eq!(node.label(), "controller_manager/spawner.py");
        assert_eq!(node.arguments(), ["joint_state_broadcaster"]);
        assert_eq!(node.output(), OutputMode::Screen);
        assert!(node.parameters().is_empty());
    }

    #[test]
    fn test_default_output_is_log() {
        let node = NodeDirective::new("tf2_ros", "static_transform_publisher");
        assert_eq!(node.output(), OutputMode::Log);
    }

    #[test]
    fn test_parameters_keep_insertion_order() {
        let node = NodeDirective::new("robot_state_publisher", "robot_state_publisher")
            .with_parameter("use_sim_time", "true")
            .with_parameter("robot_description", CommandSubstitution::new(["xacro ", "a.xacro"]));

        let names: Vec<_> = node.parameters().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["use_sim_time", "robot_description"]);
        assert!(matches!(
            node.parameter("robot_description"),
            Some(ParameterValue::Command(_))
        ));
    }

    #[test]
    fn test_action_serializes_with_kind_tag() {
        let action = LaunchAction::from(
            IncludeDirective::new("/opt/ros/share/gazebo_ros/launch/gazebo.launch.py")
                .with_argument("pause", "false"),
        );
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["kind"], "include");
        assert_eq!(json["launch_arguments"]["pause"], "false");
    }
}
