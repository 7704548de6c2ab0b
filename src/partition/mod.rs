/*!
# Region Partitioner

Assigns regions to zones so that per-zone cost variance is minimized. Regions
are sorted by edge count and split into contiguous runs by a dynamic program
that minimizes the sum of squared partition costs; minimizing the sum of
squares over a fixed total minimizes the variance of the per-zone costs.
*/

use crate::core::error::{GridswarmError, Result};
use crate::core::stats::data_stddev;
use crate::graph::model::Region;

/// Memo tables for the contiguous optimal partition.
///
/// Entries are indexed by `(k, trim)`: `k` is the number of parts still to
/// form, `trim` the number of rightmost weights already consumed. Each entry
/// records the best cost and the length of the rightmost part that achieves
/// it; a zero length marks an unfilled entry (every real part is non-empty).
struct PartitionTable<'a> {
    weights: &'a [f64],
    cost: Vec<f64>,
    rlen: Vec<usize>,
}

impl<'a> PartitionTable<'a> {
    fn new(weights: &'a [f64], nparts: usize) -> Self {
        PartitionTable {
            weights,
            cost: vec![0.0; weights.len() * nparts],
            rlen: vec![0; weights.len() * nparts],
        }
    }

    fn index(&self, k: usize, trim: usize) -> usize {
        (k - 1) * self.weights.len() + trim
    }

    fn filled(&self, k: usize, trim: usize) -> bool {
        self.rlen[self.index(k, trim)] != 0
    }

    /// Cost of a contiguous run of weights: the squared run sum.
    fn segment_cost(&self, left: usize, len: usize) -> f64 {
        let sum: f64 = self.weights[left..left + len].iter().sum();
        sum * sum
    }

    /// Fills the `(k, trim)` entry and everything it depends on.
    fn build(&mut self, k: usize, trim: usize) {
        if self.filled(k, trim) {
            return;
        }
        let n = self.weights.len() - trim;
        let (best_cost, best_rlen) = if k == 1 {
            // The whole remaining prefix becomes a single part.
            (self.segment_cost(0, n), n)
        } else {
            let mut best_cost = f64::INFINITY;
            let mut best_rlen = 0;
            for rlen in 1..=n - k + 1 {
                let seg_cost = self.segment_cost(n - rlen, rlen);
                self.build(k - 1, trim + rlen);
                let rest_cost = self.cost[self.index(k - 1, trim + rlen)];
                let cost = seg_cost + rest_cost;
                if cost < best_cost {
                    best_cost = cost;
                    best_rlen = rlen;
                }
            }
            (best_cost, best_rlen)
        };
        let idx = self.index(k, trim);
        self.cost[idx] = best_cost;
        self.rlen[idx] = best_rlen;
    }

    /// Walks the rightmost-length table from `(nparts, 0)` down to recover
    /// the split sizes in left-to-right order.
    fn splits(&self, nparts: usize) -> Vec<usize> {
        let mut splits = vec![0; nparts];
        let mut trim = 0;
        for k in (1..=nparts).rev() {
            let rlen = self.rlen[self.index(k, trim)];
            splits[k - 1] = rlen;
            trim += rlen;
        }
        splits
    }
}

/// Splits `weights` into `nparts` contiguous parts minimizing the sum of
/// squared part sums. Returns the part sizes in order; sizes always sum to
/// the weight count.
///
/// When there are at least as many parts as weights, the first `weights.len()`
/// parts get one weight each and the rest are empty; callers must tolerate
/// zero-sized parts.
///
/// # Example
///
/// ```rust
/// use gridswarm::partition::find_partition;
///
/// assert_eq!(find_partition(&[1.0, 1.0, 1.0, 1.0], 2), vec![2, 2]);
/// assert_eq!(find_partition(&[3.0, 1.0, 1.0, 1.0], 2), vec![1, 3]);
/// assert_eq!(find_partition(&[1.0, 2.0], 1), vec![2]);
/// assert_eq!(find_partition(&[1.0, 2.0], 4), vec![1, 1, 0, 0]);
/// ```
pub fn find_partition(weights: &[f64], nparts: usize) -> Vec<usize> {
    if nparts == 0 {
        return Vec::new();
    }
    if nparts == 1 {
        return vec![weights.len()];
    }
    if nparts >= weights.len() {
        return (0..nparts).map(|i| usize::from(i < weights.len())).collect();
    }
    let mut table = PartitionTable::new(weights, nparts);
    table.build(nparts, 0);
    table.splits(nparts)
}

/// Assigns a zone id to every region.
///
/// Regions are stable-sorted by edge count. The partition weight is the node
/// count when it varies more than the edge count (by standard deviation), and
/// the edge count otherwise; zones then consume the sorted regions in
/// contiguous runs sized by [`find_partition`].
pub fn assign_zones(regions: &mut [Region], nzone: usize) -> Result<()> {
    if nzone == 0 {
        return Err(GridswarmError::invalid_argument("zone count must be positive"));
    }
    regions.sort_by_key(|r| r.edge_count);

    let node_weights: Vec<f64> = regions.iter().map(|r| r.node_count as f64).collect();
    let edge_weights: Vec<f64> = regions.iter().map(|r| r.edge_count as f64).collect();
    let weights = if data_stddev(&node_weights) > data_stddev(&edge_weights) {
        &node_weights
    } else {
        &edge_weights
    };

    let splits = find_partition(weights, nzone);
    let mut cur = 0;
    for (zid, &size) in splits.iter().enumerate() {
        for _ in 0..size {
            regions[cur].zone = zid;
            cur += 1;
        }
    }
    if cur != regions.len() {
        return Err(GridswarmError::internal(format!(
            "partition splits covered {} of {} regions",
            cur,
            regions.len()
        )));
    }
    Ok(())
}
