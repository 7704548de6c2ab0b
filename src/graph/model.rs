/*!
# Grid Graph Model

The simulation graph: a `W x H` grid of nodes in row-major order with a
compressed adjacency representation. Every node's adjacency run begins with an
implicit self-loop, followed by its out-neighbors in input order. The graph is
immutable once zones have been applied; workers receive private copies during
boot, so the structure is serializable.
*/

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::core::error::{GridswarmError, Result};

/// Immutable compressed-adjacency grid graph with a per-node zone map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridGraph {
    width: u32,
    height: u32,
    nedge: usize,
    nzone: usize,
    /// Adjacency runs, self-loop first. Length `N + E`.
    neighbor: Vec<u32>,
    /// Start offset of each node's run; `neighbor_start[N] == N + E`.
    neighbor_start: Vec<usize>,
    /// Zone id per node, in `[0, nzone)`.
    zone_of: Vec<u32>,
}

impl GridGraph {
    /// Builds a graph from directed edges whose heads are nondecreasing.
    ///
    /// Node ids are row-major over the grid. Nodes that never appear as a
    /// head get a self-loop-only run, including any trailing isolated nodes.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gridswarm::graph::GridGraph;
    ///
    /// // A 2x1 grid with one undirected edge encoded as two directed edges.
    /// let g = GridGraph::from_sorted_edges(2, 1, &[(0, 1), (1, 0)]).unwrap();
    /// assert_eq!(g.node_count(), 2);
    /// assert_eq!(g.neighbors(0), &[0, 1]);
    /// assert_eq!(g.out_neighbors(1), &[0]);
    /// ```
    pub fn from_sorted_edges(width: u32, height: u32, edges: &[(u32, u32)]) -> Result<Self> {
        let nnode = width as usize * height as usize;
        let nedge = edges.len();
        let mut neighbor = Vec::with_capacity(nnode + nedge);
        let mut neighbor_start = vec![0usize; nnode + 1];
        // Number of nodes whose adjacency runs have been opened so far.
        let mut cur: usize = 0;
        for &(head, tail) in edges {
            let (h, t) = (head as usize, tail as usize);
            if h >= nnode {
                return Err(GridswarmError::invalid_graph(format!(
                    "edge head {} out of range (graph has {} nodes)",
                    head, nnode
                )));
            }
            if t >= nnode {
                return Err(GridswarmError::invalid_graph(format!(
                    "edge tail {} out of range (graph has {} nodes)",
                    tail, nnode
                )));
            }
            if h + 1 < cur {
                return Err(GridswarmError::invalid_graph(format!(
                    "edge head {} out of order",
                    head
                )));
            }
            while cur <= h {
                neighbor_start[cur] = neighbor.len();
                neighbor.push(cur as u32);
                cur += 1;
            }
            neighbor.push(tail);
        }
        while cur < nnode {
            neighbor_start[cur] = neighbor.len();
            neighbor.push(cur as u32);
            cur += 1;
        }
        neighbor_start[nnode] = neighbor.len();
        Ok(GridGraph {
            width,
            height,
            nedge,
            nzone: 1,
            neighbor,
            neighbor_start,
            zone_of: vec![0; nnode],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn node_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of explicit edges, excluding the implicit self-loops.
    pub fn edge_count(&self) -> usize {
        self.nedge
    }

    /// Number of zones the graph has been partitioned into.
    pub fn zone_count(&self) -> usize {
        self.nzone
    }

    /// Row-major node id of grid coordinates `(x, y)`.
    pub fn node_at(&self, x: u32, y: u32) -> u32 {
        y * self.width + x
    }

    /// Offsets of the adjacency run for `node` within the neighbor buffer.
    pub fn adjacency_range(&self, node: u32) -> Range<usize> {
        self.neighbor_start[node as usize]..self.neighbor_start[node as usize + 1]
    }

    /// Full adjacency run of `node`, self-loop first.
    pub fn neighbors(&self, node: u32) -> &[u32] {
        &self.neighbor[self.adjacency_range(node)]
    }

    /// Out-neighbors of `node`, excluding the self-loop.
    pub fn out_neighbors(&self, node: u32) -> &[u32] {
        &self.neighbors(node)[1..]
    }

    /// Zone owning `node`.
    pub fn zone_of(&self, node: u32) -> u32 {
        self.zone_of[node as usize]
    }

    /// Applies a partitioned region list to the zone map.
    ///
    /// Every node inside a region rectangle inherits the region's zone.
    pub fn apply_zones(&mut self, regions: &[Region], nzone: usize) -> Result<()> {
        for region in regions {
            if region.zone >= nzone {
                return Err(GridswarmError::partition(format!(
                    "invalid zone {} assigned to region {}",
                    region.zone, region.id
                )));
            }
            for x in region.x..region.x + region.w {
                for y in region.y..region.y + region.h {
                    let nid = self.node_at(x, y);
                    self.zone_of[nid as usize] = region.zone as u32;
                }
            }
        }
        self.nzone = nzone;
        Ok(())
    }

    /// Installs an explicit zone map; intended for tests and tools that
    /// bypass the region partitioner.
    pub fn set_zone_map(&mut self, zone_of: Vec<u32>, nzone: usize) -> Result<()> {
        if zone_of.len() != self.node_count() {
            return Err(GridswarmError::invalid_argument(format!(
                "zone map has {} entries for {} nodes",
                zone_of.len(),
                self.node_count()
            )));
        }
        if let Some(&z) = zone_of.iter().find(|&&z| z as usize >= nzone) {
            return Err(GridswarmError::invalid_argument(format!(
                "zone id {} out of range for {} zones",
                z, nzone
            )));
        }
        self.zone_of = zone_of;
        self.nzone = nzone;
        Ok(())
    }
}

/// An input rectangle over the grid. The partitioner assigns zones to
/// regions, never to individual nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Region {
    pub id: usize,
    /// Left X of the rectangle.
    pub x: u32,
    /// Upper Y of the rectangle.
    pub y: u32,
    pub w: u32,
    pub h: u32,
    /// Number of nodes covered.
    pub node_count: usize,
    /// Sum of adjacency run lengths over the covered nodes.
    pub edge_count: usize,
    /// Zone assigned by the partitioner.
    pub zone: usize,
}

impl Region {
    /// Measures a rectangle against the graph, computing its node and edge
    /// counts.
    pub fn from_rect(id: usize, x: u32, y: u32, w: u32, h: u32, graph: &GridGraph) -> Result<Self> {
        if x + w > graph.width() || y + h > graph.height() {
            return Err(GridswarmError::invalid_input(format!(
                "region {} ({},{} {}x{}) exceeds the {}x{} grid",
                id,
                x,
                y,
                w,
                h,
                graph.width(),
                graph.height()
            )));
        }
        let mut edge_count = 0;
        for dx in x..x + w {
            for dy in y..y + h {
                let nid = graph.node_at(dx, dy);
                edge_count += graph.adjacency_range(nid).len();
            }
        }
        Ok(Region {
            id,
            x,
            y,
            w,
            h,
            node_count: w as usize * h as usize,
            edge_count,
            zone: 0,
        })
    }
}
