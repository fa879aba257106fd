//! Hexacopter Launch
//!
//! Builds the launch plan for a simulated hexacopter under ROS2 and Gazebo.
//!
//! # Overview
//!
//! The plan is plain data handed to a launch runtime; nothing here spawns a
//! process. In launch order it holds:
//! - `robot_state_publisher` with the description compiled by `xacro`
//! - a static transform from `map` to `base_link`
//! - the Gazebo bring-up include with `pause:=false`
//! - `spawn_entity.py` spawning the robot from `/robot_description`
//! - one event rule per controller: when the spawner exits, wait 5s, then run
//!   `controller_manager/spawner.py <controller>`
//! - optionally, a rule starting `rqt_gui` 10s after the spawner exits
//!
//! # Example Launch Config
//!
//! ```yaml
//! version: "1.0"
//!
//! args:
//!   use_gui:
//!     default: false
//!
//! robot:
//!   package: my_hexacopter
//!
//! gui:
//!   enabled: "$(arg use_gui)"
//! ```

pub mod ament;
pub mod cli;
pub mod config;
pub mod plan;

pub use ament::{AmentIndex, PackageResolver, ResolveError, StaticResolver};
pub use cli::{LaunchArgs, OutputFormat, RenderError};
pub use config::{LaunchConfig, LaunchConfigError, SubstitutionContext, SubstitutionError};
pub use plan::{
    ActionId, BuildError, CommandSubstitution, EventRule, IncludeDirective, LaunchAction,
    LaunchPlan, LaunchPlanBuilder, NodeDirective, OutputMode, ParameterValue, PlanEntry,
    PlanError, PlanResources, ScheduledLaunch, TriggerEvent,
};
