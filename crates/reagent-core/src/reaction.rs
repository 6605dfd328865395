//! Reaction descriptors and the per-reactor reaction registry
//!
//! A reaction binds a label, an ordered set of triggers and an ordered set of
//! outputs to a body that runs against the owning reactor's state. Reactions
//! are registered once, during the construct phase, and run later when the
//! environment fires one of their triggers.

use crate::error::{Result, ValidationError};
use crate::identity::{ReactionId, ReactorIdentity};
use crate::parameter::ParameterSet;
use crate::time::{Microstep, Tag};
use crate::trigger::{TimerSpec, Trigger};
use crate::value::ParamType;
use indexmap::{IndexMap, IndexSet};
use std::time::Duration;

/// Error type a reaction body may return
pub type ReactionError = Box<dyn std::error::Error + Send + Sync>;

/// Result of running a reaction body
pub type ReactionResult = std::result::Result<(), ReactionError>;

/// Boxed reaction body
pub type ReactionBody<R> = Box<dyn FnMut(&mut R, &ReactionContext<'_>) -> ReactionResult>;

/// What a reaction body can see while it runs
pub struct ReactionContext<'a> {
    pub(crate) tag: Tag,
    pub(crate) physical_time: Duration,
    pub(crate) identity: &'a ReactorIdentity,
    pub(crate) parameters: &'a ParameterSet,
    pub(crate) present: &'a [Trigger],
}

impl<'a> ReactionContext<'a> {
    /// Current logical tag
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Logical time elapsed since startup
    pub fn elapsed_logical_time(&self) -> Duration {
        self.tag.time
    }

    /// Microstep of the current tag
    pub fn microstep(&self) -> Microstep {
        self.tag.microstep
    }

    /// Physical time elapsed since the run started
    pub fn elapsed_physical_time(&self) -> Duration {
        self.physical_time
    }

    /// Identity of the reactor this reaction belongs to
    pub fn identity(&self) -> &ReactorIdentity {
        self.identity
    }

    /// The reactor's own name
    pub fn name(&self) -> &str {
        self.identity.name()
    }

    /// The reactor's fully-qualified name
    pub fn fqn(&self) -> &str {
        self.identity.fqn()
    }

    /// The reactor's bank index
    pub fn bank_index(&self) -> usize {
        self.identity.bank_index()
    }

    /// The reactor's parameters
    pub fn parameters(&self) -> &ParameterSet {
        self.parameters
    }

    /// Read one of the reactor's parameters
    pub fn param<T: ParamType>(&self, name: &str) -> Result<T> {
        self.parameters.get(name)
    }

    /// Check if a trigger of this reactor fired at the current tag
    pub fn is_present(&self, trigger: &Trigger) -> bool {
        self.present.contains(trigger)
    }
}

/// A trigger-bound callback
pub struct Reaction<R> {
    label: String,
    triggers: Vec<Trigger>,
    outputs: Vec<String>,
    body: ReactionBody<R>,
}

impl<R> Reaction<R> {
    /// Create a reaction descriptor
    pub fn new<F>(
        label: impl Into<String>,
        triggers: Vec<Trigger>,
        outputs: Vec<String>,
        body: F,
    ) -> Self
    where
        F: FnMut(&mut R, &ReactionContext<'_>) -> ReactionResult + 'static,
    {
        Self {
            label: label.into(),
            triggers,
            outputs,
            body: Box::new(body),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    pub(crate) fn run(&mut self, state: &mut R, ctx: &ReactionContext<'_>) -> ReactionResult {
        (self.body)(state, ctx)
    }
}

impl<R> std::fmt::Debug for Reaction<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reaction")
            .field("label", &self.label)
            .field("triggers", &self.triggers)
            .field("outputs", &self.outputs)
            .finish_non_exhaustive()
    }
}

/// Ordered reactions of one reactor, plus the timers and outputs they refer to
pub struct ReactionRegistry<R> {
    /// Fully-qualified name of the owning reactor, for error messages
    reactor: String,
    timers: IndexMap<String, TimerSpec>,
    outputs: IndexSet<String>,
    reactions: Vec<Reaction<R>>,
}

impl<R> ReactionRegistry<R> {
    /// Create an empty registry for the reactor with the given fqn
    pub fn new(reactor: impl Into<String>) -> Self {
        Self {
            reactor: reactor.into(),
            timers: IndexMap::new(),
            outputs: IndexSet::new(),
            reactions: Vec::new(),
        }
    }

    /// Declare a timer that reactions can be triggered by
    pub fn timer(&mut self, name: impl Into<String>, spec: TimerSpec) -> Result<Trigger> {
        let name = name.into();
        if self.timers.contains_key(&name) {
            return Err(ValidationError::DuplicateTimer {
                reactor: self.reactor.clone(),
                name,
            }
            .into());
        }
        if spec.period == Some(Duration::ZERO) {
            return Err(ValidationError::ZeroPeriod {
                reactor: self.reactor.clone(),
                name,
            }
            .into());
        }
        self.timers.insert(name.clone(), spec);
        Ok(Trigger::Timer(name))
    }

    /// Declare an output that reactions can list as an effect
    pub fn output(&mut self, name: impl Into<String>) -> Result<String> {
        let name = name.into();
        if !self.outputs.insert(name.clone()) {
            return Err(ValidationError::DuplicateOutput {
                reactor: self.reactor.clone(),
                name,
            }
            .into());
        }
        Ok(name)
    }

    /// Append a reaction, after validating its label, triggers and outputs
    ///
    /// Declaration order is the priority among reactions that share a
    /// trigger.
    pub fn register(&mut self, reaction: Reaction<R>) -> Result<ReactionId> {
        let label = &reaction.label;

        if self.reactions.iter().any(|r| &r.label == label) {
            return Err(ValidationError::DuplicateReaction {
                reactor: self.reactor.clone(),
                label: label.clone(),
            }
            .into());
        }
        if reaction.triggers.is_empty() {
            return Err(ValidationError::NoTriggers {
                reactor: self.reactor.clone(),
                label: label.clone(),
            }
            .into());
        }
        for trigger in &reaction.triggers {
            if let Trigger::Timer(name) = trigger {
                if !self.timers.contains_key(name) {
                    return Err(ValidationError::UnknownTrigger {
                        reactor: self.reactor.clone(),
                        label: label.clone(),
                        trigger: trigger.to_string(),
                    }
                    .into());
                }
            }
        }
        for output in &reaction.outputs {
            if !self.outputs.contains(output) {
                return Err(ValidationError::UnknownOutput {
                    reactor: self.reactor.clone(),
                    label: label.clone(),
                    output: output.clone(),
                }
                .into());
            }
        }

        let id = ReactionId(self.reactions.len());
        tracing::trace!(reactor = %self.reactor, reaction = %label, %id, "reaction registered");
        self.reactions.push(reaction);
        Ok(id)
    }

    /// Reactions in declaration order
    pub fn reactions(&self) -> &[Reaction<R>] {
        &self.reactions
    }

    /// Declared timers in declaration order
    pub fn timers(&self) -> impl Iterator<Item = (&str, &TimerSpec)> {
        self.timers.iter().map(|(name, spec)| (name.as_str(), spec))
    }

    /// Declared outputs in declaration order
    pub fn outputs(&self) -> impl Iterator<Item = &str> {
        self.outputs.iter().map(String::as_str)
    }

    /// Number of registered reactions
    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    /// Check if no reactions are registered
    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }

    /// Reactions bound to any of `present`, in declaration order
    ///
    /// Each reaction comes with the lowest rank among its present triggers,
    /// which decides where it runs within the tag.
    pub(crate) fn triggered_by<'a>(
        &'a self,
        present: &'a [Trigger],
    ) -> impl Iterator<Item = (ReactionId, u8)> + 'a {
        self.reactions.iter().enumerate().filter_map(move |(i, r)| {
            r.triggers
                .iter()
                .filter(|t| present.contains(t))
                .map(Trigger::rank)
                .min()
                .map(|rank| (ReactionId(i), rank))
        })
    }

    pub(crate) fn get_mut(&mut self, id: ReactionId) -> Option<&mut Reaction<R>> {
        self.reactions.get_mut(id.0)
    }
}
