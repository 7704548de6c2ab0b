/*!
# Graph Generators

Programmatic grid construction for tests and benchmarks: full and random
4-neighbor grids, uniform region tilings, and random initial agent
placements. The simulation's own randomness never comes from here; these
generators only build inputs.
*/

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::core::error::{GridswarmError, Result};
use crate::graph::model::{GridGraph, Region};

fn four_neighbors(width: u32, height: u32, x: u32, y: u32) -> Vec<(u32, u32)> {
    let mut out = Vec::with_capacity(4);
    if x > 0 {
        out.push((x - 1, y));
    }
    if x + 1 < width {
        out.push((x + 1, y));
    }
    if y > 0 {
        out.push((x, y - 1));
    }
    if y + 1 < height {
        out.push((x, y + 1));
    }
    out
}

/// Builds a grid where every node is connected to its 4-neighbors, each link
/// encoded as a pair of directed edges.
pub fn full_grid(width: u32, height: u32) -> Result<GridGraph> {
    let mut edges = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let head = y * width + x;
            for (nx, ny) in four_neighbors(width, height, x, y) {
                edges.push((head, ny * width + nx));
            }
        }
    }
    edges.sort_by_key(|&(head, _)| head);
    GridGraph::from_sorted_edges(width, height, &edges)
}

/// Builds a grid keeping each undirected 4-neighbor link with probability
/// `p`; kept links are encoded in both directions.
pub fn random_grid(width: u32, height: u32, p: f64, seed: u64) -> Result<GridGraph> {
    if !(0.0..=1.0).contains(&p) {
        return Err(GridswarmError::invalid_argument(format!(
            "link probability {} outside [0, 1]",
            p
        )));
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut edges = Vec::new();
    for y in 0..height {
        for x in 0..width {
            let head = y * width + x;
            // Decide each link once, at its lexicographically smaller end.
            for (nx, ny) in [(x + 1, y), (x, y + 1)] {
                if nx >= width || ny >= height {
                    continue;
                }
                if rng.random_bool(p) {
                    let tail = ny * width + nx;
                    edges.push((head, tail));
                    edges.push((tail, head));
                }
            }
        }
    }
    edges.sort_by_key(|&(head, _)| head);
    GridGraph::from_sorted_edges(width, height, &edges)
}

/// Tiles the grid with regions of `rw` by `rh` nodes. The region size must
/// divide the grid evenly.
pub fn uniform_regions(graph: &GridGraph, rw: u32, rh: u32) -> Result<Vec<Region>> {
    if rw == 0 || rh == 0 || graph.width() % rw != 0 || graph.height() % rh != 0 {
        return Err(GridswarmError::invalid_argument(format!(
            "{}x{} regions don't tile a {}x{} grid",
            rw,
            rh,
            graph.width(),
            graph.height()
        )));
    }
    let mut regions = Vec::new();
    for y in (0..graph.height()).step_by(rh as usize) {
        for x in (0..graph.width()).step_by(rw as usize) {
            regions.push(Region::from_rect(regions.len(), x, y, rw, rh, graph)?);
        }
    }
    Ok(regions)
}

/// Draws a uniform random initial node for each of `nagent` agents.
pub fn random_positions(nnode: usize, nagent: usize, seed: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..nagent)
        .map(|_| rng.random_range(0..nnode) as u32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_grid_edge_count() {
        // A 3x3 grid has 12 undirected 4-neighbor links.
        let g = full_grid(3, 3).unwrap();
        assert_eq!(g.node_count(), 9);
        assert_eq!(g.edge_count(), 24);
        // The center node sees all four neighbors.
        assert_eq!(g.out_neighbors(4).len(), 4);
    }

    #[test]
    fn test_random_grid_is_symmetric() {
        let g = random_grid(4, 4, 0.6, 42).unwrap();
        for nid in 0..g.node_count() as u32 {
            for &other in g.out_neighbors(nid) {
                assert!(g.out_neighbors(other).contains(&nid));
            }
        }
    }

    #[test]
    fn test_random_grid_extremes() {
        assert_eq!(random_grid(3, 3, 1.0, 1).unwrap().edge_count(), 24);
        assert_eq!(random_grid(3, 3, 0.0, 1).unwrap().edge_count(), 0);
        assert!(random_grid(3, 3, 1.5, 1).is_err());
    }

    #[test]
    fn test_uniform_regions_tile() {
        let g = full_grid(10, 10).unwrap();
        let regions = uniform_regions(&g, 5, 5).unwrap();
        assert_eq!(regions.len(), 4);
        assert_eq!(regions.iter().map(|r| r.node_count).sum::<usize>(), 100);
        assert!(uniform_regions(&g, 3, 5).is_err());
    }

    #[test]
    fn test_random_positions_in_range() {
        let positions = random_positions(16, 100, 7);
        assert_eq!(positions.len(), 100);
        assert!(positions.iter().all(|&p| p < 16));
    }
}
