/*!
# Simulation Driver

The per-zone main loop: census, initial weights, then the stepped batch loop
with display hand-off. Zone 0 owns the output stream; on display steps it
gathers the other zones' node counts to reconstruct the full snapshot before
writing a frame.
*/

use std::io::Write;
use std::time::Instant;

use crate::core::error::{GridswarmError, Result};
use crate::exchange::ZoneFabric;
use crate::graph::model::GridGraph;
use crate::instrument::{Activity, ActivityLog};
use crate::sim::state::SimState;
use crate::sim::step::{batch_step, compute_all_weights};
use crate::topology::ZoneTopology;

/// Per-run parameters shared by every zone.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub steps: u32,
    /// Steps between frames that include per-node counts.
    pub interval: u32,
    pub display: bool,
    pub instrument: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            steps: 1,
            interval: 1,
            display: true,
            instrument: false,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
    pub steps: u32,
    pub nagent: usize,
    pub elapsed_secs: f64,
}

/// Writes one display frame. The body carries one count line per node, in
/// node-id order, when counts are shown.
fn write_frame(
    out: &mut dyn Write,
    graph: &GridGraph,
    state: &SimState,
    show_counts: bool,
) -> Result<()> {
    writeln!(
        out,
        "STEP {} {} {}",
        graph.width(),
        graph.height(),
        state.nagent
    )?;
    if show_counts {
        for nid in 0..graph.node_count() {
            writeln!(out, "{}", state.counts[nid])?;
        }
    }
    writeln!(out, "END")?;
    Ok(())
}

/// Zone 0: overwrites its count slots for every foreign zone's local nodes.
/// Its own local slots are already authoritative.
fn gather_node_state(state: &mut SimState, fabric: &ZoneFabric) -> Result<()> {
    for peer in 1..fabric.zone_count() {
        let entries = fabric.recv_gather(peer)?;
        for (nid, count) in entries {
            state.counts[nid as usize] = count;
        }
    }
    Ok(())
}

/// Non-master zones: publishes `(node, count)` pairs for every local node.
fn send_node_state(topo: &ZoneTopology, state: &SimState, fabric: &ZoneFabric) -> Result<()> {
    let entries: Vec<(u32, u32)> = topo
        .local_nodes
        .iter()
        .map(|&nid| (nid, state.counts[nid as usize]))
        .collect();
    fabric.send_gather(entries)
}

/// Runs the simulation loop for one zone.
///
/// Every zone holds the complete position vector at entry (the boot
/// broadcast guarantees it), so the census and the initial weights are
/// computed locally everywhere. Only zone 0 writes to `out`; other zones
/// pass `None`.
pub fn simulate(
    graph: &GridGraph,
    topo: &ZoneTopology,
    state: &mut SimState,
    fabric: &ZoneFabric,
    opts: &RunOptions,
    mut out: Option<&mut dyn Write>,
    activity: &mut ActivityLog,
) -> Result<RunReport> {
    if opts.interval == 0 {
        return Err(GridswarmError::invalid_argument(
            "display interval must be positive",
        ));
    }
    let master = fabric.zone() == 0;
    let start = Instant::now();

    state.take_census();
    activity.start(Activity::Weights);
    compute_all_weights(graph, topo, state);
    activity.finish(Activity::Weights);

    if opts.display && master {
        if let Some(out) = out.as_deref_mut() {
            write_frame(out, graph, state, true)?;
        }
    }

    for step in 0..opts.steps {
        batch_step(graph, topo, state, fabric, activity)?;
        if opts.display {
            let show_counts = (step + 1) % opts.interval == 0 || step == opts.steps - 1;
            if master {
                if show_counts && fabric.zone_count() > 1 {
                    activity.start(Activity::GlobalComm);
                    gather_node_state(state, fabric)?;
                    activity.finish(Activity::GlobalComm);
                }
                if let Some(out) = out.as_deref_mut() {
                    write_frame(out, graph, state, show_counts)?;
                }
            } else if show_counts {
                activity.start(Activity::GlobalComm);
                send_node_state(topo, state, fabric)?;
                activity.finish(Activity::GlobalComm);
            }
        }
    }

    let elapsed_secs = start.elapsed().as_secs_f64();
    if master {
        if let Some(out) = out.as_deref_mut() {
            writeln!(out, "DONE")?;
        }
    }
    Ok(RunReport {
        steps: opts.steps,
        nagent: state.nagent,
        elapsed_secs,
    })
}
