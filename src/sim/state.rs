/*!
# Simulation State

The mutable per-zone state: every agent's position, residency bit, and RNG
state, plus the per-node population counts and weights. All arrays are sized
once at setup; the steady state never reallocates.

Position and seed entries are authoritative only for agents whose residency
bit is set; a non-resident agent's entries go stale until it migrates back in
and its record refreshes them.
*/

use crate::core::error::{GridswarmError, Result};
use crate::core::rng::SimRng;
use crate::exchange::Migrant;
use crate::graph::model::GridGraph;

/// Fraction of the population processed per batch.
pub const BATCH_FRACTION: f64 = 0.02;

pub struct SimState {
    /// Total agent count, global across all zones.
    pub nagent: usize,
    pub global_seed: u32,
    /// Current node of each agent, globally indexed.
    pub positions: Vec<u32>,
    /// Per-agent generator state; travels with the agent on migration.
    pub seeds: Vec<SimRng>,
    /// True iff the agent currently lives in this zone.
    pub resident: Vec<bool>,
    /// Population per node; authoritative for local and imported nodes.
    pub counts: Vec<u32>,
    /// Weight per node; same authority domain as `counts`.
    pub weights: Vec<f64>,
    /// Per-node weight sums, recomputed each batch for local nodes.
    pub sum_weight: Vec<f64>,
    /// Cumulative weights along each adjacency run, aligned with the
    /// graph's neighbor buffer.
    pub cum_weight: Vec<f64>,
    /// Global population divided by node count; constant over the run.
    pub load_factor: f64,
    pub batch_size: usize,
    /// Outgoing migration buffers, one per peer zone, bounded by batch size.
    pub outgoing: Vec<Vec<Migrant>>,
}

impl SimState {
    /// Allocates the state for a zone and derives every agent's seed from
    /// `(global_seed, agent_id)`.
    pub fn new(graph: &GridGraph, positions: Vec<u32>, global_seed: u32) -> Result<Self> {
        let nnode = graph.node_count();
        if nnode == 0 {
            return Err(GridswarmError::invalid_graph("graph has no nodes"));
        }
        if let Some(&p) = positions.iter().find(|&&p| p as usize >= nnode) {
            return Err(GridswarmError::invalid_input(format!(
                "agent position {} out of range for {} nodes",
                p, nnode
            )));
        }
        let nagent = positions.len();
        let load_factor = nagent as f64 / nnode as f64;
        let rpct = (BATCH_FRACTION * nagent as f64) as usize;
        let sroot = (nagent as f64).sqrt() as usize;
        let batch_size = rpct.max(sroot);

        let seeds = (0..nagent)
            .map(|r| SimRng::from_seed_list(&[global_seed, r as u32]))
            .collect();

        Ok(SimState {
            nagent,
            global_seed,
            positions,
            seeds,
            resident: vec![false; nagent],
            counts: vec![0; nnode],
            weights: vec![0.0; nnode],
            sum_weight: vec![0.0; nnode],
            cum_weight: vec![0.0; nnode + graph.edge_count()],
            load_factor,
            batch_size,
            outgoing: vec![Vec::new(); graph.zone_count()],
        })
    }

    /// Marks the agents whose current node belongs to `zone` as residents.
    pub fn init_residency(&mut self, graph: &GridGraph, zone: u32) {
        for r in 0..self.nagent {
            self.resident[r] = graph.zone_of(self.positions[r]) == zone;
        }
    }

    /// Rebuilds every node count from the position vector.
    ///
    /// Only valid at step 0, when all zones still hold the complete position
    /// vector from the boot broadcast.
    pub fn take_census(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
        for &pos in &self.positions {
            self.counts[pos as usize] += 1;
        }
    }

    /// Installs a batch of arriving migrants: position, residency, node
    /// count, and the carried generator state.
    pub fn apply_migrants(&mut self, batch: &[Migrant]) {
        for m in batch {
            let rid = m.agent as usize;
            self.positions[rid] = m.node;
            self.resident[rid] = true;
            self.counts[m.node as usize] += 1;
            self.seeds[rid] = SimRng::from_state(m.seed);
        }
    }

    /// Number of agents currently resident in this zone.
    pub fn resident_count(&self) -> usize {
        self.resident.iter().filter(|&&r| r).count()
    }
}
