//! Reagent Core - Reactor construction for discrete-event simulation
//!
//! This crate provides the pieces a reactor is built from:
//! - Bounded, described parameters (`ParameterSet`, `ParameterMetadata`)
//! - Trigger-bound reactions (`Reaction`, `ReactionRegistry`)
//! - Hierarchical identity (`ReactorIdentity`: name, fqn, bank index)
//! - A minimal single-threaded `Environment` that fires startup, timers and
//!   shutdown in tag order
//!
//! ## Lifecycle
//!
//! 1. Build each reactor's `ParameterSet` (validation happens here)
//! 2. Attach reactors to an `Environment` as roots, children or banks
//! 3. `Environment::run()` calls every reactor's `construct` once, then
//!    processes events until shutdown
//!
//! ```
//! use reagent_core::{
//!     Environment, EnvironmentConfig, ParameterMetadata, ParameterSet, Reaction,
//!     ReactionRegistry, Reactor, Result, Trigger,
//! };
//!
//! struct Hello {
//!     greeted: bool,
//! }
//!
//! impl Reactor for Hello {
//!     fn construct(&self, _: &ParameterSet, reactions: &mut ReactionRegistry<Self>) -> Result<()> {
//!         reactions.register(Reaction::new(
//!             "greet",
//!             vec![Trigger::Startup],
//!             vec![],
//!             |hello: &mut Hello, _ctx| {
//!                 hello.greeted = true;
//!                 Ok(())
//!             },
//!         ))?;
//!         Ok(())
//!     }
//! }
//!
//! let mut params = ParameterSet::new("Hello");
//! params.add("rate", 10i64, ParameterMetadata::new("rate", 0, 100))?;
//!
//! let mut env = Environment::new(EnvironmentConfig::default().with_fast(true));
//! let id = env.add_reactor("Hello", params, Hello { greeted: false })?;
//! env.run()?;
//! assert!(env.state::<Hello>(id).unwrap().greeted);
//! # Ok::<(), reagent_core::Error>(())
//! ```

pub mod config;
mod error;
mod identity;
mod parameter;
mod reaction;
mod reactor;
pub mod runtime;
pub mod time;
pub mod topology;
mod trigger;
mod value;

pub use config::{max_workers, EnvironmentConfig};
pub use error::{Error, Result, ValidationError};
pub use identity::{
    validate_name, ReactionId, ReactorId, ReactorIdentity, FQN_SEPARATOR, RESERVED_NAME_CHARS,
};
pub use parameter::{Parameter, ParameterMetadata, ParameterSet, Parameters};
pub use reaction::{
    Reaction, ReactionBody, ReactionContext, ReactionError, ReactionRegistry, ReactionResult,
};
pub use reactor::{Reactor, ReactorInstance};
pub use runtime::{create_simulator_instance, Environment, Phase, RunSummary};
pub use time::{Clock, Microstep, Tag};
pub use topology::Topology;
pub use trigger::{TimerSpec, Trigger};
pub use value::{ParamType, Value};
