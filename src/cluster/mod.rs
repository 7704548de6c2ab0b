/*!
# Cluster Boot and Distribution

Spawns one worker thread per zone and distributes the inputs. The master
(zone 0, the calling thread) hands each worker a bincode-serialized private
copy of the zoned graph plus the full initial position vector; zones share no
memory, and all later coordination flows through the exchange fabric. A
worker failure, or a worker panic, aborts the whole run.
*/

use std::io::Write;
use std::thread;

use tracing::{info, info_span};

use crate::core::error::{GridswarmError, Result};
use crate::core::rng::DEFAULT_SEED;
use crate::exchange::{ZoneFabric, build_fabric};
use crate::graph::model::GridGraph;
use crate::instrument::{Activity, ActivityLog};
use crate::sim::driver::{RunOptions, RunReport, simulate};
use crate::sim::state::SimState;
use crate::topology::ZoneTopology;

/// Parameters for a full cluster run.
#[derive(Debug, Clone, Copy)]
pub struct ClusterOptions {
    /// Number of zone workers; must match the graph's partitioning.
    pub zones: usize,
    pub seed: u32,
    pub steps: u32,
    pub interval: u32,
    pub display: bool,
    pub instrument: bool,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        ClusterOptions {
            zones: 1,
            seed: DEFAULT_SEED,
            steps: 1,
            interval: 1,
            display: true,
            instrument: false,
        }
    }
}

/// Sets up one zone and runs its simulation loop.
fn run_zone(
    graph: &GridGraph,
    positions: Vec<u32>,
    seed: u32,
    zone: usize,
    fabric: ZoneFabric,
    opts: RunOptions,
    out: Option<&mut dyn Write>,
) -> Result<RunReport> {
    let mut activity = ActivityLog::new(opts.instrument);
    activity.start(Activity::Startup);
    let topo = ZoneTopology::build(graph, zone);
    let mut state = SimState::new(graph, positions, seed)?;
    state.init_residency(graph, zone as u32);
    activity.finish(Activity::Startup);

    let report = simulate(graph, &topo, &mut state, &fabric, &opts, out, &mut activity)?;
    activity.report(zone, topo.local_nodes.len(), topo.local_edge_count);
    Ok(report)
}

/// Runs the full simulation across `opts.zones` zone workers, writing the
/// output stream of zone 0 into `out`.
///
/// The graph must already be partitioned into exactly `opts.zones` zones
/// (see [`crate::graph::io::load_graph`]).
pub fn run_cluster<W: Write>(
    graph: GridGraph,
    positions: Vec<u32>,
    opts: &ClusterOptions,
    out: &mut W,
) -> Result<RunReport> {
    if opts.zones == 0 {
        return Err(GridswarmError::invalid_argument("zone count must be positive"));
    }
    if graph.zone_count() != opts.zones {
        return Err(GridswarmError::invalid_argument(format!(
            "graph is partitioned into {} zones but {} workers were requested",
            graph.zone_count(),
            opts.zones
        )));
    }

    let run_opts = RunOptions {
        steps: opts.steps,
        interval: opts.interval,
        display: opts.display,
        instrument: opts.instrument,
    };

    let mut fabrics = build_fabric(opts.zones);
    let master_fabric = fabrics.remove(0);

    // Broadcast: each worker decodes its own private copy of the graph.
    let graph_blob = bincode::serialize(&graph)?;

    let mut handles = Vec::with_capacity(fabrics.len());
    for (idx, fabric) in fabrics.into_iter().enumerate() {
        let zone = idx + 1;
        let blob = graph_blob.clone();
        let positions = positions.clone();
        let seed = opts.seed;
        let handle = thread::Builder::new()
            .name(format!("zone-{}", zone))
            .spawn(move || -> Result<()> {
                let _span = info_span!("zone", id = zone).entered();
                let graph: GridGraph = bincode::deserialize(&blob)?;
                run_zone(&graph, positions, seed, zone, fabric, run_opts, None)?;
                Ok(())
            })
            .map_err(|e| GridswarmError::generic(format!("couldn't spawn zone {}: {}", zone, e)))?;
        handles.push(handle);
    }

    info!(zones = opts.zones, "running simulation");
    // Running the master last means its fabric drops on any failure, which
    // unblocks every worker still waiting on a receive.
    let master_result = run_zone(
        &graph,
        positions,
        opts.seed,
        0,
        master_fabric,
        run_opts,
        Some(out),
    );

    let mut worker_error = None;
    for (idx, handle) in handles.into_iter().enumerate() {
        let zone = idx + 1;
        match handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                worker_error.get_or_insert(e);
            }
            Err(_) => {
                worker_error
                    .get_or_insert(GridswarmError::peer_lost(zone, "worker thread panicked"));
            }
        }
    }

    let report = master_result?;
    if let Some(e) = worker_error {
        return Err(e);
    }
    info!(
        steps = report.steps,
        agents = report.nagent,
        secs = report.elapsed_secs,
        "simulation finished"
    );
    Ok(report)
}
