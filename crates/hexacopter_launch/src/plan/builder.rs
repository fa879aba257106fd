//! Launch plan builder for the hexacopter simulation

use super::directive::{CommandSubstitution, IncludeDirective, NodeDirective, OutputMode};
use super::event::EventRule;
use super::launch_plan::{LaunchPlan, PlanError, PlanResources};
use crate::ament::{PackageResolver, ResolveError};
use crate::config::{
    ArgValue, EnabledValue, LaunchConfig, LaunchConfigError, SubstitutionContext,
    SubstitutionError,
};
use std::collections::HashMap;
use std::time::Duration;

const STATE_PUBLISHER: (&str, &str) = ("robot_state_publisher", "robot_state_publisher");
const STATIC_TRANSFORM: (&str, &str) = ("tf2_ros", "static_transform_publisher");
const SPAWN_ENTITY: (&str, &str) = ("gazebo_ros", "spawn_entity.py");
const CONTROLLER_SPAWNER: (&str, &str) = ("controller_manager", "spawner.py");

/// Parameter carrying the compiled robot description
pub const ROBOT_DESCRIPTION: &str = "robot_description";

/// Assembles the [`LaunchPlan`] for one robot
#[derive(Debug, Clone)]
pub struct LaunchPlanBuilder {
    config: LaunchConfig,
    subst_ctx: SubstitutionContext,
    gui_override: Option<bool>,
}

impl LaunchPlanBuilder {
    /// Create a builder from a configuration and launch argument overrides
    pub fn new(
        config: LaunchConfig,
        arg_overrides: HashMap<String, String>,
    ) -> Result<Self, BuildError> {
        config.validate()?;

        let mut args: HashMap<String, String> = config
            .args
            .iter()
            .map(|(name, def)| (name.clone(), def.default.as_str()))
            .collect();

        for (name, value) in arg_overrides {
            if !config.args.contains_key(&name) {
                return Err(BuildError::UnknownArgument(name));
            }
            args.insert(name, value);
        }

        Ok(Self {
            config,
            subst_ctx: SubstitutionContext::new().with_args(args),
            gui_override: None,
        })
    }

    /// Force the GUI rule on or off, ignoring `gui.enabled`
    pub fn with_gui(mut self, enabled: bool) -> Self {
        self.gui_override = Some(enabled);
        self
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }

    /// Resolved launch arguments
    pub fn args(&self) -> &HashMap<String, String> {
        &self.subst_ctx.args
    }

    /// Whether the GUI rule ends up in the plan
    pub fn gui_enabled(&self) -> Result<bool, BuildError> {
        if let Some(enabled) = self.gui_override {
            return Ok(enabled);
        }
        match &self.config.gui.enabled {
            EnabledValue::Bool(b) => Ok(*b),
            EnabledValue::String(s) => {
                let resolved = self.substitute(s, "gui.enabled")?;
                Ok(ArgValue::parse(&resolved).is_truthy())
            }
        }
    }

    /// Build the plan
    ///
    /// Only the package lookups touch the filesystem; the description source
    /// and controller configuration are referenced, never read.
    pub fn build(&self, resolver: &dyn PackageResolver) -> Result<LaunchPlan, BuildError> {
        let robot = &self.config.robot;
        let package = self.substitute(&robot.package, "robot.package")?;
        let entity = match &robot.entity {
            Some(entity) => self.substitute(entity, "robot.entity")?,
            None => package.clone(),
        };

        let share = resolver.share_directory(&package)?;
        let description_source = share.join(&robot.description);
        let controller_config = share.join(&robot.controller_config);
        log::debug!("Robot description source: {}", description_source.display());

        let description = CommandSubstitution::new([
            format!("{} ", robot.description_compiler),
            description_source.display().to_string(),
        ]);

        let mut plan = LaunchPlan::new().with_resources(PlanResources {
            description_source: Some(description_source),
            controller_config: Some(controller_config),
        });

        plan.push_action(
            NodeDirective::new(STATE_PUBLISHER.0, STATE_PUBLISHER.1)
                .with_output(OutputMode::Screen)
                .with_parameter(ROBOT_DESCRIPTION, description),
        );

        plan.push_action(
            NodeDirective::new(STATIC_TRANSFORM.0, STATIC_TRANSFORM.1)
                .with_arguments(self.transform_arguments()),
        );

        plan.push_action(self.simulator_include(resolver)?);

        let spawn_entity = plan.push_action(
            NodeDirective::new(SPAWN_ENTITY.0, SPAWN_ENTITY.1)
                .with_output(OutputMode::Screen)
                .with_arguments(self.spawn_arguments(&entity)),
        );

        let controllers = &self.config.controllers;
        let delay = seconds(controllers.delay_secs, "controllers.delay_secs")?;
        for controller in &controllers.names {
            let spawner = NodeDirective::new(CONTROLLER_SPAWNER.0, CONTROLLER_SPAWNER.1)
                .with_arguments([controller.as_str()])
                .with_output(OutputMode::Screen);
            plan.push_rule(EventRule::on_exit(spawn_entity, delay, vec![spawner]))?;
        }

        if self.gui_enabled()? {
            let gui = &self.config.gui;
            let delay = seconds(gui.delay_secs, "gui.delay_secs")?;
            let node =
                NodeDirective::new(&gui.package, &gui.executable).with_output(OutputMode::Screen);
            plan.push_rule(EventRule::on_exit(spawn_entity, delay, vec![node]))?;
        } else {
            log::debug!("GUI rule disabled");
        }

        log::info!(
            "Built launch plan for '{}': {} entries ({} event rules)",
            entity,
            plan.len(),
            plan.event_rules().count()
        );
        Ok(plan)
    }

    /// x y z roll pitch yaw parent child
    fn transform_arguments(&self) -> Vec<String> {
        let transform = &self.config.static_transform;
        transform
            .translation
            .iter()
            .chain(&transform.rotation)
            .map(|v| format_offset(*v))
            .chain([
                transform.parent_frame.clone(),
                transform.child_frame.clone(),
            ])
            .collect()
    }

    fn spawn_arguments(&self, entity: &str) -> Vec<String> {
        let [x, y, z] = self.config.spawn.position;
        vec![
            "-topic".to_string(),
            self.config.spawn.topic.clone(),
            "-entity".to_string(),
            entity.to_string(),
            "-x".to_string(),
            format_offset(x),
            "-y".to_string(),
            format_offset(y),
            "-z".to_string(),
            format_offset(z),
        ]
    }

    fn simulator_include(
        &self,
        resolver: &dyn PackageResolver,
    ) -> Result<IncludeDirective, BuildError> {
        let simulator = &self.config.simulator;
        let share = resolver.share_directory(&simulator.package)?;
        let mut include = IncludeDirective::new(share.join(&simulator.launch_file));

        for (name, value) in &simulator.launch_arguments {
            let context = format!("simulator.launch_arguments.{}", name);
            let value = self.substitute(&value.as_str(), &context)?;
            include = include.with_argument(name, value);
        }

        Ok(include)
    }

    fn substitute(&self, input: &str, context: &str) -> Result<String, BuildError> {
        self.subst_ctx
            .substitute(input)
            .map_err(|e| BuildError::SubstitutionFailed {
                context: context.to_string(),
                source: e,
            })
    }
}

/// `f64` Display, except negative zero renders as "0"
fn format_offset(value: f64) -> String {
    if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

fn seconds(secs: f64, field: &str) -> Result<Duration, BuildError> {
    Duration::try_from_secs_f64(secs).map_err(|_| {
        BuildError::Config(LaunchConfigError::Validation(format!(
            "{}: {} is not a valid delay",
            field, secs
        )))
    })
}

/// Errors that can occur while building a plan
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Unknown argument: {0}")]
    UnknownArgument(String),

    #[error("Invalid launch config: {0}")]
    Config(#[from] LaunchConfigError),

    #[error("Substitution failed in {context}: {source}")]
    SubstitutionFailed {
        context: String,
        #[source]
        source: SubstitutionError,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("Invalid plan: {0}")]
    Plan(#[from] PlanError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ament::StaticResolver;
    use crate::config::ArgDefinition;
    use crate::plan::directive::{LaunchAction, ParameterValue};
    use std::path::PathBuf;

    fn resolver() -> StaticResolver {
        StaticResolver::new()
            .with_package("my_hexacopter", "/ws/install/my_hexacopter/share/my_hexacopter")
            .with_root("/opt/ros/humble/share")
    }

    fn default_plan() -> LaunchPlan {
        LaunchPlanBuilder::new(LaunchConfig::default(), HashMap::new())
            .unwrap()
            .build(&resolver())
            .unwrap()
    }

    fn node(plan: &LaunchPlan, index: usize) -> &NodeDirective {
        plan.entries()[index]
            .as_action()
            .and_then(LaunchAction::as_node)
            .unwrap()
    }

    #[test]
    fn test_four_actions_then_two_rules() {
        let plan = default_plan();

        assert_eq!(plan.len(), 6);
        assert!(plan.entries()[..4].iter().all(|e| e.as_action().is_some()));
        assert!(plan.entries()[4..].iter().all(|e| e.as_event_rule().is_some()));
    }

    #[test]
    fn test_state_publisher_carries_description_command() {
        let plan = default_plan();
        let publisher = node(&plan, 0);

        assert_eq!(publisher.label(), "robot_state_publisher/robot_state_publisher");
        assert_eq!(publisher.output(), OutputMode::Screen);
        assert!(publisher.arguments().is_empty());
        match publisher.parameter(ROBOT_DESCRIPTION) {
            Some(ParameterValue::Command(command)) => assert_eq!(
                command.command_line(),
                "xacro /ws/install/my_hexacopter/share/my_hexacopter/urdf/robot_arm.xacro"
            ),
            other => panic!("unexpected robot_description: {:?}", other),
        }
    }

    #[test]
    fn test_static_transform_arguments() {
        let plan = default_plan();
        let transform = node(&plan, 1);

        assert_eq!(transform.label(), "tf2_ros/static_transform_publisher");
        assert_eq!(
            transform.arguments(),
            ["0", "0", "0", "0", "0", "0", "map", "base_link"]
        );
        assert_eq!(transform.output(), OutputMode::Log);
    }

    #[test]
    fn test_simulator_include_is_unpaused() {
        let plan = default_plan();
        let include = plan.entries()[2]
            .as_action()
            .and_then(LaunchAction::as_include)
            .unwrap();

        assert_eq!(
            include.source(),
            PathBuf::from("/opt/ros/humble/share/gazebo_ros/launch/gazebo.launch.py")
        );
        assert_eq!(include.launch_argument("pause"), Some("false"));
        assert_eq!(include.launch_arguments().len(), 1);
    }

    #[test]
    fn test_spawn_entity_arguments() {
        let plan = default_plan();
        let spawn = node(&plan, 3);

        assert_eq!(spawn.label(), "gazebo_ros/spawn_entity.py");
        assert_eq!(
            spawn.arguments(),
            [
                "-topic",
                "/robot_description",
                "-entity",
                "my_hexacopter",
                "-x",
                "0",
                "-y",
                "0",
                "-z",
                "0"
            ]
        );
    }

    #[test]
    fn test_controller_rules() {
        let plan = default_plan();
        let (spawn_id, _) = plan.actions().nth(3).unwrap();
        let rules: Vec<_> = plan.event_rules().collect();

        for (rule, controller) in rules
            .iter()
            .zip(["joint_state_broadcaster", "joint_position_controller"])
        {
            assert_eq!(rule.trigger(), spawn_id);
            assert_eq!(rule.delay().as_secs_f64(), 5.0);
            assert_eq!(rule.actions().len(), 1);
            assert_eq!(rule.actions()[0].label(), "controller_manager/spawner.py");
            assert_eq!(rule.actions()[0].arguments(), [controller]);
        }
    }

    #[test]
    fn test_gui_rule_when_enabled() {
        let plan = LaunchPlanBuilder::new(LaunchConfig::default(), HashMap::new())
            .unwrap()
            .with_gui(true)
            .build(&resolver())
            .unwrap();

        assert_eq!(plan.len(), 7);
        let gui = plan.event_rules().last().unwrap();
        assert_eq!(gui.delay(), Duration::from_secs(10));
        assert_eq!(gui.actions()[0].label(), "rqt_gui/rqt_gui");
        assert!(gui.actions()[0].arguments().is_empty());
    }

    #[test]
    fn test_gui_enabled_through_argument() {
        let mut config = LaunchConfig::default();
        config.args.insert(
            "use_gui".to_string(),
            ArgDefinition {
                default: ArgValue::Bool(false),
                description: None,
            },
        );
        config.gui.enabled = EnabledValue::String("$(arg use_gui)".to_string());

        let off = LaunchPlanBuilder::new(config.clone(), HashMap::new()).unwrap();
        assert!(!off.gui_enabled().unwrap());

        let overrides = HashMap::from([("use_gui".to_string(), "true".to_string())]);
        let on = LaunchPlanBuilder::new(config, overrides).unwrap();
        assert!(on.gui_enabled().unwrap());
        assert_eq!(on.build(&resolver()).unwrap().event_rules().count(), 3);
    }

    #[test]
    fn test_unknown_argument_override() {
        let overrides = HashMap::from([("entity".to_string(), "x".to_string())]);
        let result = LaunchPlanBuilder::new(LaunchConfig::default(), overrides);
        assert!(matches!(result, Err(BuildError::UnknownArgument(_))));
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(default_plan(), default_plan());
    }

    #[test]
    fn test_missing_package_propagates() {
        let builder = LaunchPlanBuilder::new(LaunchConfig::default(), HashMap::new()).unwrap();
        let result = builder.build(&StaticResolver::new());
        assert!(matches!(
            result,
            Err(BuildError::Resolve(ResolveError::PackageNotFound { ref package, .. })) if package == "my_hexacopter"
        ));
    }

    #[test]
    fn test_negative_zero_offsets_render_as_zero() {
        let mut config = LaunchConfig::default();
        config.static_transform.translation = [-0.0, 0.25, 0.0];
        config.static_transform.rotation = [0.0, -0.0, -1.5];
        config.spawn.position = [-0.0, -0.0, 2.0];

        let plan = LaunchPlanBuilder::new(config, HashMap::new())
            .unwrap()
            .build(&resolver())
            .unwrap();

        assert_eq!(
            node(&plan, 1).arguments(),
            ["0", "0.25", "0", "0", "0", "-1.5", "map", "base_link"]
        );
        assert_eq!(
            node(&plan, 3).arguments(),
            ["-topic", "/robot_description", "-entity", "my_hexacopter", "-x", "0", "-y", "0", "-z", "2"]
        );
    }

    #[test]
    fn test_entity_from_argument() {
        let mut config = LaunchConfig::default();
        config.args.insert(
            "entity".to_string(),
            ArgDefinition {
                default: ArgValue::from("hexa_0"),
                description: Some("Simulator entity name".to_string()),
            },
        );
        config.robot.entity = Some("$(arg entity)".to_string());
        config.spawn.position = [1.0, -2.0, 0.5];

        let overrides = HashMap::from([("entity".to_string(), "hexa_7".to_string())]);
        let plan = LaunchPlanBuilder::new(config, overrides)
            .unwrap()
            .build(&resolver())
            .unwrap();

        assert_eq!(
            node(&plan, 3).arguments(),
            ["-topic", "/robot_description", "-entity", "hexa_7", "-x", "1", "-y", "-2", "-z", "0.5"]
        );
    }
}
