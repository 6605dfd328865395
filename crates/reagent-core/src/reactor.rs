//! Reactor instances
//!
//! A [`ReactorInstance`] composes the identity of an instance, the
//! [`ParameterSet`] it exclusively owns, its [`ReactionRegistry`] and the
//! user's reactor state (plain fields such as scratch counters). The
//! environment stores instances behind the object-safe [`Instance`] trait.

use crate::error::{Error, Result};
use crate::identity::{ReactionId, ReactorId, ReactorIdentity};
use crate::parameter::ParameterSet;
use crate::reaction::{ReactionContext, ReactionRegistry};
use crate::time::Tag;
use crate::topology::{ReactionTopology, ReactorTopology, TimerTopology};
use crate::trigger::{TimerSpec, Trigger};
use std::any::Any;
use std::time::Duration;

/// User-defined reactor behaviour
///
/// `construct` runs exactly once, after every reactor of the environment has
/// been attached and before the first event is processed.
pub trait Reactor: Any + Sized {
    /// Register this reactor's timers, outputs and reactions
    fn construct(
        &self,
        parameters: &ParameterSet,
        reactions: &mut ReactionRegistry<Self>,
    ) -> Result<()>;
}

/// A reactor together with its identity, parameters and reactions
pub struct ReactorInstance<R: Reactor> {
    identity: ReactorIdentity,
    parameters: ParameterSet,
    reactions: ReactionRegistry<R>,
    state: R,
    constructed: bool,
}

impl<R: Reactor> ReactorInstance<R> {
    /// Wrap a reactor, taking ownership of its already-validated parameters
    pub fn new(identity: ReactorIdentity, parameters: ParameterSet, state: R) -> Self {
        let reactions = ReactionRegistry::new(identity.fqn());
        Self {
            identity,
            parameters,
            reactions,
            state,
            constructed: false,
        }
    }

    pub fn identity(&self) -> &ReactorIdentity {
        &self.identity
    }

    pub fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    pub fn reactions(&self) -> &ReactionRegistry<R> {
        &self.reactions
    }

    pub fn state(&self) -> &R {
        &self.state
    }
}

/// Object-safe view of a [`ReactorInstance`] used by the environment
pub(crate) trait Instance {
    fn identity(&self) -> &ReactorIdentity;

    fn parameters(&self) -> &ParameterSet;

    /// Run the construct phase; a second call is an error
    fn construct(&mut self) -> Result<()>;

    fn timers(&self) -> Vec<(String, TimerSpec)>;

    /// Reactions bound to any of `present` with their rank, in declaration order
    fn triggered_by(&self, present: &[Trigger]) -> Vec<(ReactionId, u8)>;

    fn reaction_label(&self, id: ReactionId) -> Option<&str>;

    fn react(
        &mut self,
        id: ReactionId,
        tag: Tag,
        physical_time: Duration,
        present: &[Trigger],
    ) -> Result<()>;

    fn describe(&self, id: ReactorId) -> ReactorTopology;

    fn state_any(&self) -> &dyn Any;
}

impl<R: Reactor> Instance for ReactorInstance<R> {
    fn identity(&self) -> &ReactorIdentity {
        &self.identity
    }

    fn parameters(&self) -> &ParameterSet {
        &self.parameters
    }

    fn construct(&mut self) -> Result<()> {
        if self.constructed {
            return Err(Error::InvalidPhase(format!(
                "reactor `{}` was already constructed",
                self.identity.fqn()
            )));
        }
        self.state.construct(&self.parameters, &mut self.reactions)?;
        self.constructed = true;
        tracing::debug!(
            reactor = %self.identity.fqn(),
            reactions = self.reactions.len(),
            "reactor constructed"
        );
        Ok(())
    }

    fn timers(&self) -> Vec<(String, TimerSpec)> {
        self.reactions
            .timers()
            .map(|(name, spec)| (name.to_string(), *spec))
            .collect()
    }

    fn triggered_by(&self, present: &[Trigger]) -> Vec<(ReactionId, u8)> {
        self.reactions.triggered_by(present).collect()
    }

    fn reaction_label(&self, id: ReactionId) -> Option<&str> {
        self.reactions.reactions().get(id.0).map(|r| r.label())
    }

    fn react(
        &mut self,
        id: ReactionId,
        tag: Tag,
        physical_time: Duration,
        present: &[Trigger],
    ) -> Result<()> {
        let fqn = self.identity.fqn();
        let reaction = self
            .reactions
            .get_mut(id)
            .ok_or_else(|| Error::InvalidPhase(format!("{} has no {}", fqn, id)))?;

        let ctx = ReactionContext {
            tag,
            physical_time,
            identity: &self.identity,
            parameters: &self.parameters,
            present,
        };
        reaction
            .run(&mut self.state, &ctx)
            .map_err(|source| Error::ReactionFailed {
                reaction: format!("{}.{}", fqn, reaction.label()),
                source,
            })
    }

    fn describe(&self, id: ReactorId) -> ReactorTopology {
        ReactorTopology {
            id,
            name: self.identity.name().to_string(),
            fqn: self.identity.fqn().to_string(),
            parent: self.identity.parent(),
            bank_index: self.identity.bank(),
            parameters: self.parameters.iter().cloned().collect(),
            timers: self
                .reactions
                .timers()
                .map(|(name, spec)| TimerTopology {
                    name: name.to_string(),
                    offset: spec.offset,
                    period: spec.period,
                })
                .collect(),
            outputs: self.reactions.outputs().map(str::to_string).collect(),
            reactions: self
                .reactions
                .reactions()
                .iter()
                .map(|r| ReactionTopology {
                    label: r.label().to_string(),
                    triggers: r.triggers().iter().map(|t| t.to_string()).collect(),
                    outputs: r.outputs().to_vec(),
                })
                .collect(),
        }
    }

    fn state_any(&self) -> &dyn Any {
        &self.state
    }
}
