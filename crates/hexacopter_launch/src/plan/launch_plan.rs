//! The launch plan handed to the runtime

use super::directive::{LaunchAction, NodeDirective};
use super::event::EventRule;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Source of per-plan tags carried by every [`ActionId`]
static NEXT_PLAN_TAG: AtomicU64 = AtomicU64::new(1);

/// Handle to an action appended to a [`LaunchPlan`]
///
/// Event rules reference their trigger through this handle. It carries the
/// tag of the plan that issued it, so handles from another plan never match
/// even when their index does. Serialized as the bare index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId {
    plan: u64,
    index: usize,
}

impl ActionId {
    pub fn index(self) -> usize {
        self.index
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

impl Serialize for ActionId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(self.index as u64)
    }
}

/// One entry of the plan, in launch order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum PlanEntry {
    Action { id: ActionId, action: LaunchAction },
    EventRule(EventRule),
}

impl PlanEntry {
    pub fn as_action(&self) -> Option<&LaunchAction> {
        match self {
            PlanEntry::Action { action, .. } => Some(action),
            PlanEntry::EventRule(_) => None,
        }
    }

    pub fn as_event_rule(&self) -> Option<&EventRule> {
        match self {
            PlanEntry::EventRule(rule) => Some(rule),
            PlanEntry::Action { .. } => None,
        }
    }
}

/// Files the plan refers to but never reads
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanResources {
    /// Robot description source fed to the description compiler
    pub description_source: Option<PathBuf>,
    /// Controller configuration consumed by the controller manager
    pub controller_config: Option<PathBuf>,
}

/// A node launch the runtime schedules after a process exits
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledLaunch<'a> {
    pub delay: Duration,
    pub node: &'a NodeDirective,
}

/// Ordered launch directives and event rules
///
/// Equality is structural: action handles compare by position, so two plans
/// built from the same inputs are equal even though their tags differ.
#[derive(Debug, Clone, Serialize)]
pub struct LaunchPlan {
    entries: Vec<PlanEntry>,
    resources: PlanResources,
    #[serde(skip)]
    tag: u64,
    #[serde(skip)]
    next_id: usize,
}

impl Default for LaunchPlan {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            resources: PlanResources::default(),
            tag: NEXT_PLAN_TAG.fetch_add(1, Ordering::Relaxed),
            next_id: 0,
        }
    }
}

impl PartialEq for LaunchPlan {
    fn eq(&self, other: &Self) -> bool {
        self.resources == other.resources
            && self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| same_structure(a, b))
    }
}

fn same_structure(a: &PlanEntry, b: &PlanEntry) -> bool {
    match (a, b) {
        (
            PlanEntry::Action { id: a_id, action: a_action },
            PlanEntry::Action { id: b_id, action: b_action },
        ) => a_id.index == b_id.index && a_action == b_action,
        (PlanEntry::EventRule(a), PlanEntry::EventRule(b)) => {
            a.trigger().index == b.trigger().index
                && a.event() == b.event()
                && a.delay() == b.delay()
                && a.actions() == b.actions()
        }
        _ => false,
    }
}

impl LaunchPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(mut self, resources: PlanResources) -> Self {
        self.resources = resources;
        self
    }

    /// Append an action and return its handle
    pub fn push_action(&mut self, action: impl Into<LaunchAction>) -> ActionId {
        let id = ActionId {
            plan: self.tag,
            index: self.next_id,
        };
        self.next_id += 1;
        let action = action.into();
        log::debug!("Plan entry {}: {} {}", self.entries.len(), id, action.label());
        self.entries.push(PlanEntry::Action { id, action });
        id
    }

    /// Append an event rule
    ///
    /// The trigger must be a node already in this plan; includes have no
    /// process whose exit could be observed.
    pub fn push_rule(&mut self, rule: EventRule) -> Result<(), PlanError> {
        match self.action(rule.trigger()) {
            None => return Err(PlanError::UnknownTrigger(rule.trigger())),
            Some(LaunchAction::Include(include)) => {
                return Err(PlanError::TriggerNotProcess {
                    trigger: rule.trigger(),
                    source_file: include.source().to_path_buf(),
                });
            }
            Some(LaunchAction::Node(_)) => {}
        }

        log::debug!(
            "Plan entry {}: on exit of {} after {:?} launch {} node(s)",
            self.entries.len(),
            rule.trigger(),
            rule.delay(),
            rule.actions().len()
        );
        self.entries.push(PlanEntry::EventRule(rule));
        Ok(())
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn resources(&self) -> &PlanResources {
        &self.resources
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Top-level actions in launch order
    pub fn actions(&self) -> impl Iterator<Item = (ActionId, &LaunchAction)> {
        self.entries.iter().filter_map(|entry| match entry {
            PlanEntry::Action { id, action } => Some((*id, action)),
            PlanEntry::EventRule(_) => None,
        })
    }

    /// Event rules in plan order
    pub fn event_rules(&self) -> impl Iterator<Item = &EventRule> {
        self.entries.iter().filter_map(PlanEntry::as_event_rule)
    }

    pub fn action(&self, id: ActionId) -> Option<&LaunchAction> {
        self.actions()
            .find(|(action_id, _)| *action_id == id)
            .map(|(_, action)| action)
    }

    /// Nodes the runtime launches once `id` exits, in plan order then
    /// action order
    pub fn on_exit(&self, id: ActionId) -> Vec<ScheduledLaunch<'_>> {
        self.event_rules()
            .filter(|rule| rule.trigger() == id)
            .flat_map(|rule| {
                rule.actions().iter().map(move |node| ScheduledLaunch {
                    delay: rule.delay(),
                    node,
                })
            })
            .collect()
    }
}

/// Errors that can occur when assembling a plan
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    #[error("Event rule trigger {0} was not issued by this plan")]
    UnknownTrigger(ActionId),

    #[error("Event rule trigger {trigger} is an include of '{}', which has no process", .source_file.display())]
    TriggerNotProcess {
        trigger: ActionId,
        source_file: PathBuf,
    },
}

/// Display the launch plan in a human-readable format
impl fmt::Display for LaunchPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Launch Plan")?;
        writeln!(f, "===========")?;
        writeln!(f)?;

        if let Some(source) = &self.resources.description_source {
            writeln!(f, "Description source: {}", source.display())?;
        }
        if let Some(config) = &self.resources.controller_config {
            writeln!(f, "Controller config:  {}", config.display())?;
        }

        writeln!(f)?;
        writeln!(f, "Entries (in launch order):")?;
        for (i, entry) in self.entries.iter().enumerate() {
            writeln!(f)?;
            match entry {
                PlanEntry::Action { id, action } => {
                    writeln!(f, "  {}. {} {}", i + 1, id, action.label())?;
                    match action {
                        LaunchAction::Node(node) => write_node(f, node, "     ")?,
                        LaunchAction::Include(include) => {
                            for (key, value) in include.launch_arguments() {
                                writeln!(f, "     {}:={}", key, value)?;
                            }
                        }
                    }
                }
                PlanEntry::EventRule(rule) => {
                    writeln!(
                        f,
                        "  {}. on exit of {}, after {}s:",
                        i + 1,
                        rule.trigger(),
                        rule.delay().as_secs_f64()
                    )?;
                    for node in rule.actions() {
                        writeln!(f, "     - {}", node.label())?;
                        write_node(f, node, "       ")?;
                    }
                }
            }
        }

        Ok(())
    }
}

fn write_node(f: &mut fmt::Formatter<'_>, node: &NodeDirective, indent: &str) -> fmt::Result {
    if !node.arguments().is_empty() {
        writeln!(f, "{}Arguments: {}", indent, node.arguments().join(" "))?;
    }
    for (name, value) in node.parameters() {
        writeln!(f, "{}Parameter {}: {}", indent, name, value)?;
    }
    writeln!(f, "{}Output: {:?}", indent, node.output())
}
