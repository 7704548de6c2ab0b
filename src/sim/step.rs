/*!
# Batch Loop and Boundary Exchanges

One batch processes a contiguous slice of agent ids: refresh the cumulative
weights for local nodes, move every resident agent in the slice, then run the
three boundary exchanges in fixed order (migrants, counts, weights) with the
weight recomputation between the last two. Agents are walked in global id
order so the sequence of seed draws is deterministic for a given residency
map; non-resident agents are skipped entirely.
*/

use rayon::prelude::*;

use crate::core::error::{GridswarmError, Result};
use crate::exchange::{Migrant, ZoneFabric};
use crate::graph::model::GridGraph;
use crate::instrument::{Activity, ActivityLog};
use crate::sim::kernels::{BASE_ILF, imbalance, locate_value, mweight};
use crate::sim::state::SimState;
use crate::topology::ZoneTopology;

/// Ideal load factor of a node: the base value shifted by half the mean
/// population imbalance against its out-neighbors. The mean over an empty
/// neighborhood is zero, so a self-loop-only node sits at the base value.
fn neighbor_ilf(graph: &GridGraph, counts: &[u32], nid: u32) -> f64 {
    let out = graph.out_neighbors(nid);
    if out.is_empty() {
        return BASE_ILF;
    }
    let lcount = counts[nid as usize];
    let sum: f64 = out
        .iter()
        .map(|&other| imbalance(lcount, counts[other as usize]))
        .sum();
    BASE_ILF + 0.5 * (sum / out.len() as f64)
}

fn compute_weight(graph: &GridGraph, counts: &[u32], load_factor: f64, nid: u32) -> f64 {
    let count = counts[nid as usize];
    let ilf = neighbor_ilf(graph, counts, nid);
    mweight(count as f64 / load_factor, ilf)
}

/// Recomputes the weight of every authoritative node (imports first, then
/// locals, as published count data covers exactly that set).
///
/// The map runs in parallel and the scatter is sequential, so the result is
/// bit-identical to the serial loop.
pub fn compute_all_weights(graph: &GridGraph, topo: &ZoneTopology, state: &mut SimState) {
    let nodes = topo.authoritative_nodes();
    let counts = &state.counts;
    let load_factor = state.load_factor;
    let updates: Vec<(u32, f64)> = nodes
        .par_iter()
        .map(|&nid| (nid, compute_weight(graph, counts, load_factor, nid)))
        .collect();
    for (nid, w) in updates {
        state.weights[nid as usize] = w;
    }
}

/// Refreshes the per-node weight sums and the cumulative weights along each
/// local adjacency run.
fn find_all_sums(graph: &GridGraph, topo: &ZoneTopology, state: &mut SimState) {
    for &nid in &topo.local_nodes {
        let mut sum = 0.0;
        for (eid, &other) in graph.adjacency_range(nid).zip(graph.neighbors(nid)) {
            sum += state.weights[other as usize];
            state.cum_weight[eid] = sum;
        }
        state.sum_weight[nid as usize] = sum;
    }
}

/// Draws the next node for `agent` from the cumulative weights at its
/// current node.
fn next_random_move(graph: &GridGraph, state: &mut SimState, agent: usize) -> Result<u32> {
    let nid = state.positions[agent];
    let tsum = state.sum_weight[nid as usize];
    let val = state.seeds[agent].next_float(tsum);
    let range = graph.adjacency_range(nid);
    let offset = locate_value(val, &state.cum_weight[range]).ok_or_else(|| {
        GridswarmError::internal(format!(
            "no move bucket for agent {} at node {} (target {:.6} of {:.6})",
            agent, nid, val, tsum
        ))
    })?;
    Ok(graph.neighbors(nid)[offset])
}

/// E1: trades migrating agents with every peer. Every peer gets a payload
/// each batch, empty ones included; senders have already cleared residency
/// and decremented the old counts.
pub fn exchange_migrants(state: &mut SimState, fabric: &ZoneFabric) -> Result<()> {
    let me = fabric.zone();
    for peer in 0..fabric.zone_count() {
        if peer == me {
            continue;
        }
        let batch = std::mem::take(&mut state.outgoing[peer]);
        fabric.send_migrants(peer, batch)?;
    }
    for peer in 0..fabric.zone_count() {
        if peer == me {
            continue;
        }
        let batch = fabric.recv_migrants(peer)?;
        state.apply_migrants(&batch);
    }
    Ok(())
}

/// E2: publishes counts of export nodes and installs counts of import nodes.
/// Both sides walk their lists in stored (ascending) order, so position `i`
/// on the wire refers to the same node on both ends.
pub fn exchange_counts(topo: &ZoneTopology, state: &mut SimState, fabric: &ZoneFabric) -> Result<()> {
    for peer in 0..fabric.zone_count() {
        let exports = &topo.export_nodes[peer];
        if exports.is_empty() {
            continue;
        }
        let payload: Vec<u32> = exports.iter().map(|&n| state.counts[n as usize]).collect();
        fabric.send_counts(peer, payload)?;
    }
    for peer in 0..fabric.zone_count() {
        let imports = &topo.import_nodes[peer];
        if imports.is_empty() {
            continue;
        }
        let payload = fabric.recv_counts(peer)?;
        if payload.len() != imports.len() {
            return Err(GridswarmError::internal(format!(
                "count payload from zone {} has {} entries for {} import nodes",
                peer,
                payload.len(),
                imports.len()
            )));
        }
        for (&nid, &count) in imports.iter().zip(&payload) {
            state.counts[nid as usize] = count;
        }
    }
    Ok(())
}

/// E3: identical to E2 with weights in place of counts.
pub fn exchange_weights(topo: &ZoneTopology, state: &mut SimState, fabric: &ZoneFabric) -> Result<()> {
    for peer in 0..fabric.zone_count() {
        let exports = &topo.export_nodes[peer];
        if exports.is_empty() {
            continue;
        }
        let payload: Vec<f64> = exports.iter().map(|&n| state.weights[n as usize]).collect();
        fabric.send_weights(peer, payload)?;
    }
    for peer in 0..fabric.zone_count() {
        let imports = &topo.import_nodes[peer];
        if imports.is_empty() {
            continue;
        }
        let payload = fabric.recv_weights(peer)?;
        if payload.len() != imports.len() {
            return Err(GridswarmError::internal(format!(
                "weight payload from zone {} has {} entries for {} import nodes",
                peer,
                payload.len(),
                imports.len()
            )));
        }
        for (&nid, &weight) in imports.iter().zip(&payload) {
            state.weights[nid as usize] = weight;
        }
    }
    Ok(())
}

fn do_batch(
    graph: &GridGraph,
    topo: &ZoneTopology,
    state: &mut SimState,
    fabric: &ZoneFabric,
    bstart: usize,
    bcount: usize,
    activity: &mut ActivityLog,
) -> Result<()> {
    activity.start(Activity::Sums);
    find_all_sums(graph, topo, state);
    activity.finish(Activity::Sums);

    for buf in &mut state.outgoing {
        buf.clear();
    }

    activity.start(Activity::Next);
    let this_zone = fabric.zone() as u32;
    for agent in bstart..bstart + bcount {
        if !state.resident[agent] {
            continue;
        }
        let old_node = state.positions[agent];
        let new_node = next_random_move(graph, state, agent)?;
        let new_zone = graph.zone_of(new_node);
        if new_zone == this_zone {
            state.positions[agent] = new_node;
            state.counts[old_node as usize] -= 1;
            state.counts[new_node as usize] += 1;
        } else {
            state.counts[old_node as usize] -= 1;
            state.resident[agent] = false;
            state.outgoing[new_zone as usize].push(Migrant {
                agent: agent as u32,
                node: new_node,
                seed: state.seeds[agent].state(),
            });
        }
    }
    activity.finish(Activity::Next);

    activity.start(Activity::Comm);
    exchange_migrants(state, fabric)?;
    exchange_counts(topo, state, fabric)?;
    activity.finish(Activity::Comm);

    activity.start(Activity::Weights);
    compute_all_weights(graph, topo, state);
    activity.finish(Activity::Weights);

    activity.start(Activity::Comm);
    exchange_weights(topo, state, fabric)?;
    activity.finish(Activity::Comm);
    Ok(())
}

/// Runs one simulation step: the whole agent id space in contiguous slices
/// of at most `batch_size`.
pub fn batch_step(
    graph: &GridGraph,
    topo: &ZoneTopology,
    state: &mut SimState,
    fabric: &ZoneFabric,
    activity: &mut ActivityLog,
) -> Result<()> {
    let mut bstart = 0;
    while bstart < state.nagent {
        let bcount = (state.nagent - bstart).min(state.batch_size);
        do_batch(graph, topo, state, fabric, bstart, bcount, activity)?;
        bstart += bcount;
    }
    Ok(())
}
