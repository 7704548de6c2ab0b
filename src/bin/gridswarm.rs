use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{Level, error};

use gridswarm::cluster::{ClusterOptions, run_cluster};
use gridswarm::core::error::{GridswarmError, Result};
use gridswarm::core::rng::DEFAULT_SEED;
use gridswarm::graph::io::{load_graph, read_agent_file};
use gridswarm::topology::ZoneTopology;

/// Zone-parallel stochastic agent-migration simulator for grid graphs.
#[derive(Parser, Debug)]
#[command(name = "gridswarm", version)]
struct Cli {
    /// Graph file
    #[arg(short = 'g', long = "graph", value_name = "GFILE")]
    graph: Option<PathBuf>,

    /// Initial agent position file
    #[arg(short = 'r', long = "agents", value_name = "RFILE")]
    agents: Option<PathBuf>,

    /// Number of simulation steps
    #[arg(short = 'n', long = "steps", value_name = "STEPS", default_value_t = 1)]
    steps: u32,

    /// Initial RNG seed
    #[arg(short = 's', long = "seed", value_name = "SEED", default_value_t = DEFAULT_SEED)]
    seed: u32,

    /// Operate in quiet mode; do not generate simulation results
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Display update interval
    #[arg(short = 'i', long = "interval", value_name = "INT", default_value_t = 1)]
    interval: u32,

    /// Instrument simulation activities
    #[arg(short = 'I', long = "instrument")]
    instrument: bool,

    /// Number of zone workers
    #[arg(short = 'p', long = "zones", value_name = "ZONES", default_value_t = 1)]
    zones: usize,

    /// Partition into ZONES zones, print the layout, and exit without
    /// running the simulation
    #[arg(short = 'z', long = "show-zones", value_name = "ZONES")]
    show_zones: Option<usize>,
}

fn run(cli: Cli) -> Result<()> {
    let graph_path = cli
        .graph
        .as_deref()
        .ok_or_else(|| GridswarmError::invalid_argument("need a graph file"))?;

    if let Some(nzone) = cli.show_zones {
        let graph = load_graph(graph_path, nzone)?;
        for zone in 0..nzone {
            ZoneTopology::build(&graph, zone).log_summary();
        }
        println!("DONE");
        return Ok(());
    }

    let agents = cli
        .agents
        .as_deref()
        .ok_or_else(|| GridswarmError::invalid_argument("need an initial agent position file"))?;
    let graph = load_graph(graph_path, cli.zones)?;
    let positions = read_agent_file(agents, &graph)?;

    let opts = ClusterOptions {
        zones: cli.zones,
        seed: cli.seed,
        steps: cli.steps,
        interval: cli.interval,
        display: !cli.quiet,
        instrument: cli.instrument,
    };
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    run_cluster(graph, positions, &opts, &mut out)?;
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    // The logging feature may have installed a subscriber already.
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_writer(io::stderr)
        .try_init()
        .ok();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            println!("DONE");
            ExitCode::from(1)
        }
    }
}
