//! Event rules: "on this process's exit, after a delay, start these"

use super::directive::NodeDirective;
use super::launch_plan::ActionId;
use serde::Serialize;
use std::time::Duration;

/// Process event a rule reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    ProcessExit,
}

/// Declarative binding interpreted by the launch runtime
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRule {
    trigger: ActionId,
    event: TriggerEvent,
    #[serde(rename = "delay_secs", serialize_with = "serialize_secs")]
    delay: Duration,
    actions: Vec<NodeDirective>,
}

impl EventRule {
    /// Rule fired when the `trigger` action's process exits
    pub fn on_exit(trigger: ActionId, delay: Duration, actions: Vec<NodeDirective>) -> Self {
        Self {
            trigger,
            event: TriggerEvent::ProcessExit,
            delay,
            actions,
        }
    }

    pub fn trigger(&self) -> ActionId {
        self.trigger
    }

    pub fn event(&self) -> TriggerEvent {
        self.event
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn actions(&self) -> &[NodeDirective] {
        &self.actions
    }
}

fn serialize_secs<S: serde::Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(delay.as_secs_f64())
}
