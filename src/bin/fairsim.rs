//! fairsim — run the fair-scheduling simulator against an event socket.

use std::path::PathBuf;

use clap::Parser;

use fairsim::{transport, Scheduler};

/// Tick-driven fair-scheduling simulator fed by event batches.
#[derive(Parser)]
#[command(name = "fairsim", version, allow_negative_numbers = true)]
struct Cli {
    /// Vruntime scale per scheduled tick (values below 1 become 1).
    quanta: i64,

    /// Number of simulated CPUs (values below 1 become 1).
    cpus: i64,

    /// Unix socket delivering event batches.
    #[arg(short, long, default_value = "./event.socket")]
    socket: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let quanta = cli.quanta.max(1);
    let cpus = cli.cpus.max(1) as usize;

    let mut sched = Scheduler::new(cpus, quanta);
    if let Err(e) = transport::run(&cli.socket, &mut sched) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}
