//! Hello Example
//!
//! Builds a single `Hello` reactor and runs it until shutdown.
//!
//! Usage: `hello [true]` - passing `true` prints the reactor topology.

use hello::{add_hello, parameters_line, Cli, HelloParameters, FAST, WORKERS};
use reagent_core::create_simulator_instance;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::from_args(std::env::args_os());

    let mut env = create_simulator_instance(WORKERS, FAST, None, cli.visualize());
    println!("{}", parameters_line(env.config()));

    add_hello(&mut env, None, "Hello", &HelloParameters::default())?;
    let summary = env.run()?;

    if let Some(topology) = summary.topology {
        println!("{}", topology);
    }

    Ok(())
}
