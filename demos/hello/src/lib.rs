//! Hello reactor
//!
//! One validated parameter (`test_param`), one plain field (`test_local`),
//! and a reaction that prints identity and timing information at startup.

use clap::Parser;
use reagent_core::{
    Environment, EnvironmentConfig, ParameterMetadata, ParameterSet, Parameters, Reaction,
    ReactionContext, ReactionRegistry, Reactor, ReactorId, Result, Trigger,
};

/// Worker count of the example program
pub const WORKERS: usize = 1;
/// The example paces logical time against physical time
pub const FAST: bool = false;

/// Parameters of [`Hello`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloParameters {
    pub test_param: i64,
}

impl Default for HelloParameters {
    fn default() -> Self {
        Self { test_param: 10 }
    }
}

impl Parameters for HelloParameters {
    fn declare(&self, set: &mut ParameterSet) -> Result<()> {
        set.add(
            "test_param",
            self.test_param,
            ParameterMetadata::new("This is test parameter", 0, 100),
        )?;
        Ok(())
    }
}

/// Reactor state: plain fields, not subject to validation
#[derive(Debug, Default)]
pub struct Hello {
    pub test_local: i64,
    /// Every line printed by this instance
    pub transcript: Vec<String>,
}

impl Reactor for Hello {
    fn construct(
        &self,
        _parameters: &ParameterSet,
        reactions: &mut ReactionRegistry<Self>,
    ) -> Result<()> {
        reactions.register(Reaction::new(
            "reaction_1",
            vec![Trigger::Startup],
            vec![],
            |hello: &mut Hello, ctx| {
                let test_param: i64 = ctx.param("test_param")?;
                let line = startup_line(ctx, test_param, hello.test_local);
                println!("{}", line);
                hello.transcript.push(line);
                Ok(())
            },
        ))?;
        Ok(())
    }
}

/// Attach a `Hello` named `name`, at the root or under `parent`
///
/// Parameters are validated before anything is attached.
pub fn add_hello(
    env: &mut Environment,
    parent: Option<ReactorId>,
    name: &str,
    params: &HelloParameters,
) -> Result<ReactorId> {
    let set = ParameterSet::from_parameters(name, params)?;
    tracing::debug!(reactor = name, test_param = params.test_param, "hello parameters validated");
    match parent {
        Some(parent) => env.add_child(parent, name, set, Hello::default()),
        None => env.add_reactor(name, set, Hello::default()),
    }
}

/// The line printed by the startup reaction
pub fn startup_line(ctx: &ReactionContext<'_>, test_param: i64, test_local: i64) -> String {
    format!(
        "({:?}, {}), physical_time: {:?} Starting up reaction Bank:{} name:{} fully_qualified_name:{} test_param:{} test_local:{}",
        ctx.elapsed_logical_time(),
        ctx.microstep(),
        ctx.elapsed_physical_time(),
        ctx.bank_index(),
        ctx.name(),
        ctx.fqn(),
        test_param,
        test_local,
    )
}

/// Command line of the `hello` program
///
/// Every argument is captured as a plain value so nothing on the command line
/// can make parsing fail; only the first one is looked at.
#[derive(Parser, Debug, Default)]
#[command(name = "hello")]
#[command(about = "Run a single reactor that reacts to startup")]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// `true` to visualize the reactor topology; anything else is ignored
    #[arg(num_args = 0.., allow_hyphen_values = true, trailing_var_arg = true)]
    pub args: Vec<String>,
}

impl Cli {
    /// Parse `args` (program name first), treating any failure as no arguments
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::try_parse_from(args).unwrap_or_default()
    }

    pub fn visualize(&self) -> bool {
        parse_visualize(self.args.first().map(String::as_str))
    }
}

/// The configuration banner printed before the run
pub fn parameters_line(config: &EnvironmentConfig) -> String {
    let timeout = match config.timeout() {
        Some(timeout) => format!("{:?}", timeout),
        None => "unbounded".to_string(),
    };
    format!(
        "parameters - workers:{} fast:{} timeout:{} visualize:{}",
        config.workers(),
        if config.fast() { "True" } else { "False" },
        timeout,
        u8::from(config.visualize()),
    )
}

/// Interpret the optional command-line argument
///
/// Only the literal `"true"` enables visualization; anything else, including
/// malformed input, means false.
pub fn parse_visualize(arg: Option<&str>) -> bool {
    arg == Some("true")
}
