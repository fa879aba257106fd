//! Launch configuration YAML schema definitions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Root launch configuration
///
/// Every section is optional; an empty document describes the stock
/// hexacopter simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Configuration format version
    #[serde(default = "default_version")]
    pub version: String,

    /// Declared launch arguments with defaults
    #[serde(default)]
    pub args: IndexMap<String, ArgDefinition>,

    /// Robot package and the files it ships
    #[serde(default)]
    pub robot: RobotConfig,

    /// Static transform between the world and the robot frames
    #[serde(default)]
    pub static_transform: StaticTransformConfig,

    /// Simulator bring-up include
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// Entity spawn in the simulator
    #[serde(default)]
    pub spawn: SpawnConfig,

    /// Controllers spawned once the entity is in the simulator
    #[serde(default)]
    pub controllers: ControllersConfig,

    /// Optional rqt GUI
    #[serde(default)]
    pub gui: GuiConfig,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            args: IndexMap::new(),
            robot: RobotConfig::default(),
            static_transform: StaticTransformConfig::default(),
            simulator: SimulatorConfig::default(),
            spawn: SpawnConfig::default(),
            controllers: ControllersConfig::default(),
            gui: GuiConfig::default(),
        }
    }
}

/// Argument definition with default value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgDefinition {
    /// Default value for the argument
    pub default: ArgValue,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

/// Argument values can be strings, booleans, or numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl ArgValue {
    /// Convert to string representation
    pub fn as_str(&self) -> String {
        match self {
            ArgValue::Bool(b) => b.to_string(),
            ArgValue::Int(i) => i.to_string(),
            ArgValue::Float(f) => f.to_string(),
            ArgValue::String(s) => s.clone(),
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("true") {
            return ArgValue::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return ArgValue::Bool(false);
        }
        if let Ok(i) = s.parse::<i64>() {
            return ArgValue::Int(i);
        }
        if let Ok(f) = s.parse::<f64>() {
            return ArgValue::Float(f);
        }
        ArgValue::String(s.to_string())
    }

    /// Check if value is truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            ArgValue::Bool(b) => *b,
            ArgValue::Int(i) => *i != 0,
            ArgValue::Float(f) => *f != 0.0,
            ArgValue::String(s) => {
                !s.is_empty()
                    && !s.eq_ignore_ascii_case("false")
                    && !s.eq_ignore_ascii_case("0")
                    && !s.eq_ignore_ascii_case("no")
            }
        }
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::String(s.to_string())
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

/// Enabled value can be a direct boolean or a substitution string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnabledValue {
    Bool(bool),
    String(String),
}

impl Default for EnabledValue {
    fn default() -> Self {
        EnabledValue::Bool(false)
    }
}

/// Robot package layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    /// Package whose share directory holds the description and controller files
    pub package: String,
    /// Entity name inside the simulator (defaults to the package name)
    pub entity: Option<String>,
    /// Description source, relative to the package share directory
    pub description: PathBuf,
    /// Command that expands the description source into a flat description
    pub description_compiler: String,
    /// Controller configuration, relative to the package share directory
    pub controller_config: PathBuf,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            package: "my_hexacopter".to_string(),
            entity: None,
            description: PathBuf::from("urdf/robot_arm.xacro"),
            description_compiler: "xacro".to_string(),
            controller_config: PathBuf::from("config/controller_config.yaml"),
        }
    }
}

/// Static transform published between two frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticTransformConfig {
    /// x, y, z offsets
    pub translation: [f64; 3],
    /// roll, pitch, yaw
    pub rotation: [f64; 3],
    pub parent_frame: String,
    pub child_frame: String,
}

impl Default for StaticTransformConfig {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation: [0.0; 3],
            parent_frame: "map".to_string(),
            child_frame: "base_link".to_string(),
        }
    }
}

/// Simulator bring-up include
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Package providing the bring-up launch file
    pub package: String,
    /// Launch file, relative to the package share directory
    pub launch_file: PathBuf,
    /// Arguments passed to the included launch file
    pub launch_arguments: IndexMap<String, ArgValue>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        let mut launch_arguments = IndexMap::new();
        launch_arguments.insert("pause".to_string(), ArgValue::Bool(false));
        Self {
            package: "gazebo_ros".to_string(),
            launch_file: PathBuf::from("launch/gazebo.launch.py"),
            launch_arguments,
        }
    }
}

/// Entity spawn parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Topic the spawner reads the robot description from
    pub topic: String,
    /// Spawn position (x, y, z)
    pub position: [f64; 3],
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            topic: "/robot_description".to_string(),
            position: [0.0; 3],
        }
    }
}

/// Controllers spawned after the entity spawner exits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllersConfig {
    /// Delay after the spawner exits, in seconds
    pub delay_secs: f64,
    /// Registered controller names, in spawn order
    pub names: Vec<String>,
}

impl Default for ControllersConfig {
    fn default() -> Self {
        Self {
            delay_secs: 5.0,
            names: vec![
                "joint_state_broadcaster".to_string(),
                "joint_position_controller".to_string(),
            ],
        }
    }
}

/// rqt GUI launched after the controllers had time to come up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuiConfig {
    /// Whether the GUI rule is part of the plan
    /// Can be a boolean or a string like "$(arg use_gui)"
    pub enabled: EnabledValue,
    /// Delay after the spawner exits, in seconds
    pub delay_secs: f64,
    pub package: String,
    pub executable: String,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            enabled: EnabledValue::default(),
            delay_secs: 10.0,
            package: "rqt_gui".to_string(),
            executable: "rqt_gui".to_string(),
        }
    }
}

impl LaunchConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LaunchConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LaunchConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(content: &str) -> Result<Self, LaunchConfigError> {
        let config: LaunchConfig =
            serde_yaml::from_str(content).map_err(LaunchConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), LaunchConfigError> {
        if self.robot.package.trim().is_empty() {
            return Err(validation("robot.package must not be empty"));
        }
        if matches!(&self.robot.entity, Some(entity) if entity.trim().is_empty()) {
            return Err(validation("robot.entity must not be empty when set"));
        }
        if self.robot.description_compiler.trim().is_empty() {
            return Err(validation("robot.description_compiler must not be empty"));
        }
        if self.simulator.package.trim().is_empty() {
            return Err(validation("simulator.package must not be empty"));
        }
        if self.gui.package.trim().is_empty() || self.gui.executable.trim().is_empty() {
            return Err(validation("gui.package and gui.executable must not be empty"));
        }

        let transform = &self.static_transform;
        if transform.parent_frame.is_empty() || transform.child_frame.is_empty() {
            return Err(validation("static_transform frames must not be empty"));
        }
        if transform.parent_frame == transform.child_frame {
            return Err(LaunchConfigError::Validation(format!(
                "static_transform: parent and child frame are both '{}'",
                transform.parent_frame
            )));
        }

        let mut offsets = transform
            .translation
            .iter()
            .chain(&transform.rotation)
            .chain(&self.spawn.position);
        if offsets.any(|v| !v.is_finite()) {
            return Err(validation("offsets must be finite numbers"));
        }

        check_delay("controllers.delay_secs", self.controllers.delay_secs)?;
        check_delay("gui.delay_secs", self.gui.delay_secs)?;

        let mut seen = HashSet::new();
        for name in &self.controllers.names {
            if name.trim().is_empty() {
                return Err(validation("controllers.names contains an empty name"));
            }
            if !seen.insert(name.as_str()) {
                return Err(LaunchConfigError::Validation(format!(
                    "controllers.names: '{}' listed more than once",
                    name
                )));
            }
        }

        Ok(())
    }
}

fn validation(message: &str) -> LaunchConfigError {
    LaunchConfigError::Validation(message.to_string())
}

fn check_delay(field: &str, secs: f64) -> Result<(), LaunchConfigError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(LaunchConfigError::Validation(format!(
            "{}: expected a non-negative number of seconds, got {}",
            field, secs
        )));
    }
    Ok(())
}

/// Errors that can occur when loading a launch configuration
#[derive(Debug, thiserror::Error)]
pub enum LaunchConfigError {
    #[error("Failed to read launch config '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse launch config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
