//! Runtime environment: construction, assembly and the event loop

use crate::config::EnvironmentConfig;
use crate::error::{Error, Result, ValidationError};
use crate::identity::{validate_name, ReactionId, ReactorId, ReactorIdentity};
use crate::parameter::ParameterSet;
use crate::reactor::{Instance, Reactor, ReactorInstance};
use crate::time::{Clock, Tag};
use crate::topology::Topology;
use crate::trigger::{TimerSpec, Trigger};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

/// Lifecycle of an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Reactors can be attached
    Construction,
    /// `run()` is assembling reactors or processing events
    Running,
    /// The run has ended, successfully or not
    Terminated,
}

/// Statistics of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Tag at which the run ended (the shutdown tag)
    pub final_tag: Tag,
    /// Number of distinct tags processed
    pub tags_processed: usize,
    /// Number of reaction bodies executed
    pub reactions_executed: usize,
    /// Wall-clock duration of the event loop
    pub elapsed_physical_time: Duration,
    /// RON rendering of the topology, when visualization was requested
    pub topology: Option<String>,
}

/// A trigger firing for one reactor
#[derive(Debug, Clone)]
struct Event {
    reactor: ReactorId,
    trigger: Trigger,
}

/// Owns the reactor instances, the event queue and the clock
pub struct Environment {
    config: EnvironmentConfig,
    phase: Phase,
    /// Instances in construction order, indexed by `ReactorId`
    instances: Vec<Box<dyn Instance>>,
    /// (parent, name) pairs already taken
    names: HashSet<(Option<ReactorId>, String)>,
    /// Pending events ordered by tag
    queue: BTreeMap<Tag, Vec<Event>>,
    /// Timer declarations collected during assembly
    timers: HashMap<(ReactorId, String), TimerSpec>,
    clock: Clock,
    /// Rendered during assembly when visualization is requested
    rendered_topology: Option<String>,
}

/// Pair every instance with its id
///
/// `attach` only admits instances whose index fits a `ReactorId`.
fn with_ids(
    instances: &[Box<dyn Instance>],
) -> impl Iterator<Item = (ReactorId, &dyn Instance)> {
    (0..=u32::MAX)
        .map(ReactorId::new)
        .zip(instances.iter().map(|i| &**i))
}

/// Create an environment from individual settings
///
/// `timeout` of `None` runs until no events remain.
pub fn create_simulator_instance(
    workers: usize,
    fast: bool,
    timeout: Option<Duration>,
    visualize: bool,
) -> Environment {
    Environment::new(EnvironmentConfig::new(workers, fast, timeout, visualize))
}

impl Environment {
    /// Create an empty environment
    pub fn new(config: EnvironmentConfig) -> Self {
        Self {
            config,
            phase: Phase::Construction,
            instances: Vec::new(),
            names: HashSet::new(),
            queue: BTreeMap::new(),
            timers: HashMap::new(),
            clock: Clock::new(),
            rendered_topology: None,
        }
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Number of attached reactors
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Attach a root reactor
    pub fn add_reactor<R: Reactor>(
        &mut self,
        name: impl Into<String>,
        parameters: ParameterSet,
        reactor: R,
    ) -> Result<ReactorId> {
        let name = name.into();
        self.check_capacity(&name, 1)?;
        self.claim_name(None, &name)?;
        self.attach(None, name, None, parameters, reactor)
    }

    /// Attach a reactor nested under `parent`
    pub fn add_child<R: Reactor>(
        &mut self,
        parent: ReactorId,
        name: impl Into<String>,
        parameters: ParameterSet,
        reactor: R,
    ) -> Result<ReactorId> {
        let name = name.into();
        self.check_capacity(&name, 1)?;
        self.claim_name(Some(parent), &name)?;
        self.attach(Some(parent), name, None, parameters, reactor)
    }

    /// Attach `width` same-named reactors with bank indices `0..width`
    ///
    /// `factory` is called once per index. Every member is built before any
    /// is attached, so a failing factory leaves the environment unchanged.
    pub fn add_bank<R, F>(
        &mut self,
        parent: Option<ReactorId>,
        name: impl Into<String>,
        width: usize,
        mut factory: F,
    ) -> Result<Vec<ReactorId>>
    where
        R: Reactor,
        F: FnMut(usize) -> Result<(ParameterSet, R)>,
    {
        let name = name.into();
        self.check_name(parent, &name)?;
        self.check_capacity(&name, width)?;

        let members = (0..width).map(&mut factory).collect::<Result<Vec<_>>>()?;

        self.claim_name(parent, &name)?;
        members
            .into_iter()
            .enumerate()
            .map(|(index, (parameters, reactor))| {
                self.attach(parent, name.clone(), Some(index), parameters, reactor)
            })
            .collect()
    }

    /// Identity of an attached reactor
    pub fn identity(&self, id: ReactorId) -> Option<&ReactorIdentity> {
        self.instances.get(id.index()).map(|i| i.identity())
    }

    /// Parameters of an attached reactor
    pub fn parameters(&self, id: ReactorId) -> Option<&ParameterSet> {
        self.instances.get(id.index()).map(|i| i.parameters())
    }

    /// State of an attached reactor, if it is of type `R`
    pub fn state<R: Reactor>(&self, id: ReactorId) -> Option<&R> {
        self.instances
            .get(id.index())
            .and_then(|i| i.state_any().downcast_ref::<R>())
    }

    /// Find a reactor by fully-qualified name
    pub fn find(&self, fqn: &str) -> Option<ReactorId> {
        with_ids(&self.instances)
            .find(|(_, i)| i.identity().fqn() == fqn)
            .map(|(id, _)| id)
    }

    /// Snapshot of every reactor, its parameters and reactions
    pub fn topology(&self) -> Topology {
        Topology {
            reactors: with_ids(&self.instances)
                .map(|(id, i)| i.describe(id))
                .collect(),
        }
    }

    /// Assemble every reactor and process events until shutdown
    ///
    /// Construct phases run first, for all reactors, so no reaction executes
    /// before assembly is complete. Any validation or reaction error ends the
    /// run and is returned.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.phase != Phase::Construction {
            return Err(Error::InvalidPhase(format!(
                "run() called in phase {:?}",
                self.phase
            )));
        }
        self.phase = Phase::Running;
        let result = self.assemble().and_then(|()| self.execute());
        self.phase = Phase::Terminated;

        match &result {
            Ok(summary) => tracing::info!(
                final_tag = %summary.final_tag,
                tags = summary.tags_processed,
                reactions = summary.reactions_executed,
                "run complete"
            ),
            Err(err) => tracing::error!(error = %err, "run aborted"),
        }
        result
    }

    fn check_name(&self, parent: Option<ReactorId>, name: &str) -> Result<()> {
        if self.phase != Phase::Construction {
            return Err(Error::InvalidPhase(format!(
                "cannot attach `{}` in phase {:?}",
                name, self.phase
            )));
        }
        validate_name(name)?;
        if let Some(parent) = parent {
            if parent.index() >= self.instances.len() {
                return Err(Error::ReactorNotFound(parent.to_string()));
            }
        }
        if self.names.contains(&(parent, name.to_string())) {
            let parent = match parent {
                Some(id) => self.instances[id.index()].identity().fqn().to_string(),
                None => "<environment>".to_string(),
            };
            return Err(ValidationError::DuplicateReactor {
                parent,
                name: name.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Every one of `additional` new instances must get an id that fits `u32`
    fn check_capacity(&self, name: &str, additional: usize) -> Result<()> {
        let Some(extra) = additional.checked_sub(1) else {
            return Ok(());
        };
        self.instances
            .len()
            .checked_add(extra)
            .and_then(|last| u32::try_from(last).ok())
            .map(|_| ())
            .ok_or_else(|| Error::TooManyReactors(name.to_string()))
    }

    fn claim_name(&mut self, parent: Option<ReactorId>, name: &str) -> Result<()> {
        self.check_name(parent, name)?;
        self.names.insert((parent, name.to_string()));
        Ok(())
    }

    fn attach<R: Reactor>(
        &mut self,
        parent: Option<ReactorId>,
        name: String,
        bank: Option<usize>,
        parameters: ParameterSet,
        reactor: R,
    ) -> Result<ReactorId> {
        let raw = u32::try_from(self.instances.len())
            .map_err(|_| Error::TooManyReactors(name.clone()))?;
        let id = ReactorId::new(raw);
        let identity = match parent {
            Some(parent) => {
                let parent_fqn = self.instances[parent.index()].identity().fqn();
                ReactorIdentity::nested(name, parent, parent_fqn, bank)
            }
            None => ReactorIdentity::root(name, bank),
        };
        tracing::debug!(reactor = %identity.fqn(), %id, "reactor attached");
        self.instances
            .push(Box::new(ReactorInstance::new(identity, parameters, reactor)));
        Ok(id)
    }

    /// Run every construct phase and seed the event queue
    fn assemble(&mut self) -> Result<()> {
        tracing::info!(
            config = %self.config,
            reactors = self.instances.len(),
            "assembling environment"
        );
        if !self.config.is_single_worker() {
            tracing::debug!(
                workers = self.config.workers(),
                "reactions execute on the calling thread"
            );
        }

        for instance in &mut self.instances {
            instance.construct()?;
        }

        if self.config.visualize() {
            let rendered = self.topology().to_ron()?;
            tracing::info!(topology = %rendered, "reactor topology");
            self.rendered_topology = Some(rendered);
        }

        for (reactor, instance) in with_ids(&self.instances) {
            self.queue.entry(Tag::ZERO).or_default().push(Event {
                reactor,
                trigger: Trigger::Startup,
            });
            for (name, spec) in instance.timers() {
                self.queue.entry(Tag::at(spec.offset)).or_default().push(Event {
                    reactor,
                    trigger: Trigger::Timer(name.clone()),
                });
                self.timers.insert((reactor, name), spec);
            }
        }
        if let Some(timeout) = self.config.timeout() {
            self.schedule_shutdown(Tag::at(timeout));
        }
        Ok(())
    }

    fn schedule_shutdown(&mut self, tag: Tag) {
        let events = self.queue.entry(tag).or_default();
        for (reactor, _) in with_ids(&self.instances) {
            events.push(Event {
                reactor,
                trigger: Trigger::Shutdown,
            });
        }
    }

    fn execute(&mut self) -> Result<RunSummary> {
        self.clock.start();
        let mut summary = RunSummary {
            final_tag: Tag::ZERO,
            tags_processed: 0,
            reactions_executed: 0,
            elapsed_physical_time: Duration::ZERO,
            topology: self.rendered_topology.take(),
        };
        if self.instances.is_empty() {
            return Ok(summary);
        }

        let mut shutdown_scheduled = self.config.timeout().is_some();
        let mut last_tag = Tag::ZERO;

        loop {
            let Some((tag, events)) = self.queue.pop_first() else {
                if shutdown_scheduled {
                    break;
                }
                // Nothing left to do: shut down one microstep later
                self.schedule_shutdown(last_tag.next_microstep());
                shutdown_scheduled = true;
                continue;
            };

            if !self.config.fast() {
                self.clock.wait_until(tag);
            }
            self.clock.advance_to(tag);

            let shutdown = events.iter().any(|e| e.trigger == Trigger::Shutdown);
            summary.reactions_executed += self.process_tag(tag, events)?;
            summary.tags_processed += 1;
            last_tag = tag;

            if shutdown {
                self.queue.clear();
                break;
            }
        }

        summary.final_tag = last_tag;
        summary.elapsed_physical_time = self.clock.elapsed_physical_time();
        Ok(summary)
    }

    /// Execute every reaction triggered at `tag`
    ///
    /// Startup reactions run before timer reactions, which run before
    /// shutdown reactions; ties break by reactor construction order, then by
    /// declaration order. A reaction runs at most once per tag.
    fn process_tag(&mut self, tag: Tag, events: Vec<Event>) -> Result<usize> {
        tracing::trace!(%tag, events = events.len(), "processing tag");

        let mut present: BTreeMap<ReactorId, Vec<Trigger>> = BTreeMap::new();
        for event in events {
            if let Trigger::Timer(name) = &event.trigger {
                self.reschedule_timer(tag, event.reactor, name);
            }
            let triggers = present.entry(event.reactor).or_default();
            if !triggers.contains(&event.trigger) {
                triggers.push(event.trigger);
            }
        }

        let mut batch: Vec<(u8, ReactorId, ReactionId)> = Vec::new();
        for (reactor, triggers) in &present {
            for (reaction, rank) in self.instances[reactor.index()].triggered_by(triggers) {
                batch.push((rank, *reactor, reaction));
            }
        }
        batch.sort();

        for (_, reactor, reaction) in &batch {
            let instance = &mut self.instances[reactor.index()];
            tracing::debug!(
                %tag,
                reactor = %instance.identity().fqn(),
                reaction = instance.reaction_label(*reaction).unwrap_or_default(),
                "executing reaction"
            );
            let physical_time = self.clock.elapsed_physical_time();
            instance.react(*reaction, tag, physical_time, &present[reactor])?;
        }
        Ok(batch.len())
    }

    fn reschedule_timer(&mut self, tag: Tag, reactor: ReactorId, name: &str) {
        let Some(spec) = self.timers.get(&(reactor, name.to_string())) else {
            return;
        };
        let Some(period) = spec.period else {
            return;
        };
        match tag.delayed(period) {
            Some(next) => self.queue.entry(next).or_default().push(Event {
                reactor,
                trigger: Trigger::Timer(name.to_string()),
            }),
            None => tracing::warn!(%tag, timer = name, "timer overflowed logical time"),
        }
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("reactors", &self.instances.len())
            .field("pending_tags", &self.queue.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterMetadata;
    use crate::reaction::{Reaction, ReactionRegistry};
    use tracing_test::traced_test;

    /// Records `(label, tag)` for every reaction it runs
    #[derive(Default)]
    struct Recorder {
        log: Vec<(String, Tag)>,
        timer: Option<TimerSpec>,
        fail_on_startup: bool,
    }

    impl Recorder {
        fn with_timer(spec: TimerSpec) -> Self {
            Self {
                timer: Some(spec),
                ..Self::default()
            }
        }
    }

    impl Reactor for Recorder {
        fn construct(
            &self,
            _parameters: &ParameterSet,
            reactions: &mut ReactionRegistry<Self>,
        ) -> Result<()> {
            let fail = self.fail_on_startup;
            reactions.register(Reaction::new(
                "on_startup",
                vec![Trigger::Startup],
                vec![],
                move |r: &mut Recorder, ctx| {
                    if fail {
                        return Err("boom".into());
                    }
                    r.log.push(("on_startup".into(), ctx.tag()));
                    Ok(())
                },
            ))?;
            if let Some(spec) = self.timer {
                let timer = reactions.timer("t", spec)?;
                reactions.register(Reaction::new(
                    "on_timer",
                    vec![timer],
                    vec![],
                    |r: &mut Recorder, ctx| {
                        r.log.push(("on_timer".into(), ctx.tag()));
                        Ok(())
                    },
                ))?;
            }
            reactions.register(Reaction::new(
                "on_shutdown",
                vec![Trigger::Shutdown],
                vec![],
                |r: &mut Recorder, ctx| {
                    r.log.push(("on_shutdown".into(), ctx.tag()));
                    Ok(())
                },
            ))?;
            Ok(())
        }
    }

    fn fast_env(timeout: Option<Duration>) -> Environment {
        Environment::new(
            EnvironmentConfig::default()
                .with_fast(true)
                .with_timeout(timeout),
        )
    }

    fn labels(log: &[(String, Tag)]) -> Vec<&str> {
        log.iter().map(|(l, _)| l.as_str()).collect()
    }

    #[test]
    fn test_startup_then_shutdown() {
        let mut env = fast_env(None);
        let id = env
            .add_reactor("Hello", ParameterSet::new("Hello"), Recorder::default())
            .unwrap();

        let summary = env.run().unwrap();
        let log = &env.state::<Recorder>(id).unwrap().log;

        assert_eq!(labels(log), vec!["on_startup", "on_shutdown"]);
        assert_eq!(log[0].1, Tag::ZERO);
        assert_eq!(log[1].1, Tag::ZERO.next_microstep());
        assert_eq!(summary.reactions_executed, 2);
        assert_eq!(summary.tags_processed, 2);
        assert_eq!(env.phase(), Phase::Terminated);
    }

    #[test]
    fn test_periodic_timer_until_timeout() {
        let ms = Duration::from_millis;
        let mut env = fast_env(Some(ms(30)));
        let id = env
            .add_reactor(
                "Ticker",
                ParameterSet::new("Ticker"),
                Recorder::with_timer(TimerSpec::periodic(ms(0), ms(10))),
            )
            .unwrap();

        let summary = env.run().unwrap();
        let log = &env.state::<Recorder>(id).unwrap().log;

        assert_eq!(
            labels(log),
            vec![
                "on_startup",
                "on_timer",
                "on_timer",
                "on_timer",
                "on_timer",
                "on_shutdown"
            ]
        );
        let timer_tags: Vec<_> = log
            .iter()
            .filter(|(l, _)| l == "on_timer")
            .map(|(_, t)| t.time)
            .collect();
        assert_eq!(timer_tags, vec![ms(0), ms(10), ms(20), ms(30)]);
        assert_eq!(summary.final_tag, Tag::at(ms(30)));
    }

    #[test]
    fn test_startup_runs_before_other_reactors_timers() {
        let mut env = fast_env(Some(Duration::ZERO));
        let first = env
            .add_reactor(
                "A",
                ParameterSet::new("A"),
                Recorder::with_timer(TimerSpec::once(Duration::ZERO)),
            )
            .unwrap();
        let second = env
            .add_reactor("B", ParameterSet::new("B"), Recorder::default())
            .unwrap();

        env.run().unwrap();

        // A's timer and B's startup share tag (0, 0); every startup goes first
        let a = &env.state::<Recorder>(first).unwrap().log;
        let b = &env.state::<Recorder>(second).unwrap().log;
        assert_eq!(labels(a), vec!["on_startup", "on_timer", "on_shutdown"]);
        assert_eq!(labels(b), vec!["on_startup", "on_shutdown"]);
        assert!(a.iter().chain(b.iter()).all(|(_, tag)| *tag == Tag::ZERO));
    }

    #[test]
    fn test_duplicate_sibling_names() {
        let mut env = fast_env(None);
        let main = env
            .add_reactor("Main", ParameterSet::new("Main"), Recorder::default())
            .unwrap();
        env.add_child(main, "Hello", ParameterSet::new("Hello"), Recorder::default())
            .unwrap();

        let err = env
            .add_child(main, "Hello", ParameterSet::new("Hello"), Recorder::default())
            .unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::DuplicateReactor { .. })
        ));
        assert_eq!(env.len(), 2);

        // Same name under a different parent is fine
        let other = env
            .add_reactor("Other", ParameterSet::new("Other"), Recorder::default())
            .unwrap();
        env.add_child(other, "Hello", ParameterSet::new("Hello"), Recorder::default())
            .unwrap();
    }

    #[test]
    fn test_nested_identity() {
        let mut env = fast_env(None);
        let main = env
            .add_reactor("Main", ParameterSet::new("Main"), Recorder::default())
            .unwrap();
        let child = env
            .add_child(main, "Hello", ParameterSet::new("Hello"), Recorder::default())
            .unwrap();

        let identity = env.identity(child).unwrap();
        assert_eq!(identity.fqn(), "Main.Hello");
        assert_eq!(identity.parent(), Some(main));
        assert_eq!(identity.bank_index(), 0);
        assert_eq!(env.find("Main.Hello"), Some(child));
    }

    #[test]
    fn test_bank() {
        let mut env = fast_env(None);
        let main = env
            .add_reactor("Main", ParameterSet::new("Main"), Recorder::default())
            .unwrap();
        let members = env
            .add_bank(Some(main), "worker", 3, |index| {
                let mut params = ParameterSet::new("worker");
                params.add(
                    "index",
                    index as i64,
                    ParameterMetadata::new("bank position", 0, 10),
                )?;
                Ok((params, Recorder::default()))
            })
            .unwrap();

        assert_eq!(members.len(), 3);
        for (index, id) in members.iter().enumerate() {
            let identity = env.identity(*id).unwrap();
            assert_eq!(identity.bank_index(), index);
            assert_eq!(identity.name(), "worker");
            assert_eq!(identity.fqn(), format!("Main.worker[{}]", index));
            assert_eq!(
                env.parameters(*id).unwrap().get::<i64>("index").unwrap(),
                index as i64
            );
        }

        // The bank name is taken among Main's children
        assert!(env
            .add_child(main, "worker", ParameterSet::new("worker"), Recorder::default())
            .is_err());
    }

    #[test]
    fn test_failed_bank_leaves_environment_unchanged() {
        let mut env = fast_env(None);
        let result = env.add_bank(None, "worker", 4, |index| {
            let mut params = ParameterSet::new("worker");
            params.add(
                "index",
                index as i64,
                ParameterMetadata::new("bank position", 0, 2),
            )?;
            Ok((params, Recorder::default()))
        });

        assert!(result.is_err());
        assert!(env.is_empty());
        // The name was not claimed either
        env.add_reactor("worker", ParameterSet::new("worker"), Recorder::default())
            .unwrap();
    }

    #[test]
    fn test_invalid_names_and_parents() {
        let mut env = fast_env(None);
        assert!(env
            .add_reactor("", ParameterSet::new(""), Recorder::default())
            .is_err());
        assert!(env
            .add_reactor("a.b", ParameterSet::new("a.b"), Recorder::default())
            .is_err());
        assert!(env
            .add_reactor("w[1]", ParameterSet::new("w[1]"), Recorder::default())
            .is_err());
        assert!(matches!(
            env.add_child(
                ReactorId::new(9),
                "Hello",
                ParameterSet::new("Hello"),
                Recorder::default()
            ),
            Err(Error::ReactorNotFound(_))
        ));
    }

    #[test]
    fn test_reaction_failure_is_fatal() {
        let mut env = fast_env(None);
        let failing = Recorder {
            fail_on_startup: true,
            ..Recorder::default()
        };
        let bad = env
            .add_reactor("Bad", ParameterSet::new("Bad"), failing)
            .unwrap();
        let good = env
            .add_reactor("Good", ParameterSet::new("Good"), Recorder::default())
            .unwrap();

        let err = env.run().unwrap_err();
        match err {
            Error::ReactionFailed { reaction, .. } => assert_eq!(reaction, "Bad.on_startup"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(env.state::<Recorder>(bad).unwrap().log.is_empty());
        // Later reactions never ran
        assert!(env.state::<Recorder>(good).unwrap().log.is_empty());
        assert_eq!(env.phase(), Phase::Terminated);
    }

    #[test]
    fn test_phase_guards() {
        let mut env = fast_env(None);
        env.add_reactor("Hello", ParameterSet::new("Hello"), Recorder::default())
            .unwrap();
        env.run().unwrap();

        assert!(matches!(env.run(), Err(Error::InvalidPhase(_))));
        assert!(matches!(
            env.add_reactor("Late", ParameterSet::new("Late"), Recorder::default()),
            Err(Error::InvalidPhase(_))
        ));
    }

    struct DuplicateLabels;

    impl Reactor for DuplicateLabels {
        fn construct(
            &self,
            _parameters: &ParameterSet,
            reactions: &mut ReactionRegistry<Self>,
        ) -> Result<()> {
            for _ in 0..2 {
                reactions.register(Reaction::new(
                    "reaction_1",
                    vec![Trigger::Startup],
                    vec![],
                    |_: &mut DuplicateLabels, _| Ok(()),
                ))?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_assembly_failure_runs_nothing() {
        let mut env = fast_env(None);
        let recorder = env
            .add_reactor("First", ParameterSet::new("First"), Recorder::default())
            .unwrap();
        env.add_reactor("Dup", ParameterSet::new("Dup"), DuplicateLabels)
            .unwrap();

        let err = env.run().unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::DuplicateReaction { .. })
        ));
        assert!(env.state::<Recorder>(recorder).unwrap().log.is_empty());
    }

    #[test]
    fn test_state_downcast_and_topology() {
        let mut env = create_simulator_instance(1, true, None, false);
        let id = env
            .add_reactor("Hello", ParameterSet::new("Hello"), Recorder::default())
            .unwrap();
        assert!(env.state::<DuplicateLabels>(id).is_none());

        env.run().unwrap();
        let topology = env.topology();
        let hello = topology.find("Hello").unwrap();
        let labels: Vec<_> = hello.reactions.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["on_startup", "on_shutdown"]);
    }

    #[test]
    fn test_empty_environment() {
        let mut env = fast_env(None);
        let summary = env.run().unwrap();
        assert_eq!(summary.tags_processed, 0);
    }

    #[test]
    fn test_real_time_pacing() {
        let ms = Duration::from_millis;
        let mut env = Environment::new(EnvironmentConfig::default().with_timeout(Some(ms(20))));
        env.add_reactor("Hello", ParameterSet::new("Hello"), Recorder::default())
            .unwrap();

        let summary = env.run().unwrap();
        assert!(summary.elapsed_physical_time >= ms(20));
    }

    #[traced_test]
    #[test]
    fn test_visualize_logs_topology() {
        let mut env = create_simulator_instance(1, true, None, true);
        env.add_reactor("Hello", ParameterSet::new("Hello"), Recorder::default())
            .unwrap();
        let summary = env.run().unwrap();

        assert!(logs_contain("reactor topology"));
        assert!(logs_contain("run complete"));

        let rendered = summary.topology.unwrap();
        let topology = Topology::from_ron(&rendered).unwrap();
        assert_eq!(topology, env.topology());
    }

    #[test]
    fn test_topology_not_rendered_without_visualize() {
        let mut env = fast_env(None);
        env.add_reactor("Hello", ParameterSet::new("Hello"), Recorder::default())
            .unwrap();
        assert!(env.run().unwrap().topology.is_none());
    }

    #[test]
    fn test_singleton_cannot_shadow_bank_member() {
        let mut env = fast_env(None);
        let main = env
            .add_reactor("Main", ParameterSet::new("Main"), Recorder::default())
            .unwrap();

        let err = env
            .add_child(main, "w[0]", ParameterSet::new("w[0]"), Recorder::default())
            .unwrap_err();
        assert!(matches!(
            err.as_validation(),
            Some(ValidationError::InvalidName { .. })
        ));

        let members = env
            .add_bank(Some(main), "w", 1, |_| {
                Ok((ParameterSet::new("w"), Recorder::default()))
            })
            .unwrap();
        assert_eq!(env.find("Main.w[0]"), Some(members[0]));
        assert_eq!(env.len(), 2);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_bank_beyond_id_range_is_rejected() {
        let mut env = fast_env(None);
        let mut built = 0;
        let err = env
            .add_bank(None, "w", usize::MAX, |_| {
                built += 1;
                Ok((ParameterSet::new("w"), Recorder::default()))
            })
            .unwrap_err();

        assert!(matches!(err, Error::TooManyReactors(_)));
        assert_eq!(built, 0);
        assert!(env.is_empty());
        assert!(env.check_capacity("w", u32::MAX as usize + 1).is_ok());
        assert!(env.check_capacity("w", u32::MAX as usize + 2).is_err());
    }
}
