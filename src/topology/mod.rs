/*!
# Zone Topology

Boundary bookkeeping for one zone: which nodes it owns, which foreign nodes
it must read (imports), and which of its own nodes it must publish (exports).
Built once per zone from the frozen graph and never mutated afterwards.
*/

use tracing::info;

use crate::graph::model::GridGraph;

/// Per-zone boundary topology.
///
/// For each foreign zone `y`, `export_nodes[y]` holds local nodes with at
/// least one out-edge into `y`, and `import_nodes[y]` holds nodes of `y` that
/// are out-neighbors of some local node. Import lists are sorted ascending;
/// export lists are deduplicated in insertion order, which is also ascending
/// because local nodes are walked in ascending id order. The entries for the
/// zone itself stay empty.
#[derive(Debug, Clone)]
pub struct ZoneTopology {
    pub zone: usize,
    pub nzone: usize,
    /// Ascending list of node ids owned by this zone.
    pub local_nodes: Vec<u32>,
    /// Sum of adjacency run lengths over the local nodes.
    pub local_edge_count: usize,
    pub export_nodes: Vec<Vec<u32>>,
    pub import_nodes: Vec<Vec<u32>>,
}

impl ZoneTopology {
    /// Derives the topology of `zone` in two passes over the graph.
    ///
    /// The first pass collects the local nodes and counts distinct imports
    /// per foreign zone; the second allocates exact-sized lists and fills
    /// them, deduplicating through bit vectors.
    pub fn build(graph: &GridGraph, zone: usize) -> Self {
        let nnode = graph.node_count();
        let nzone = graph.zone_count();
        let this_zone = zone as u32;

        let mut local_nodes = Vec::new();
        let mut local_edge_count = 0;
        let mut import_counts = vec![0usize; nzone];
        let mut seen = vec![false; nnode];

        for nid in 0..nnode as u32 {
            if graph.zone_of(nid) != this_zone {
                continue;
            }
            local_nodes.push(nid);
            local_edge_count += graph.adjacency_range(nid).len();
            for &other in graph.out_neighbors(nid) {
                let other_zone = graph.zone_of(other);
                if other_zone != this_zone && !seen[other as usize] {
                    import_counts[other_zone as usize] += 1;
                    seen[other as usize] = true;
                }
            }
        }

        let mut import_nodes: Vec<Vec<u32>> = import_counts
            .iter()
            .map(|&c| Vec::with_capacity(c))
            .collect();
        let mut export_nodes: Vec<Vec<u32>> = vec![Vec::new(); nzone];
        let mut export_seen: Vec<Vec<bool>> = vec![vec![false; local_nodes.len()]; nzone];
        seen.iter_mut().for_each(|s| *s = false);

        for (idx, &nid) in local_nodes.iter().enumerate() {
            for &other in graph.out_neighbors(nid) {
                let other_zone = graph.zone_of(other) as usize;
                if other_zone == zone {
                    continue;
                }
                if !seen[other as usize] {
                    import_nodes[other_zone].push(other);
                    seen[other as usize] = true;
                }
                if !export_seen[other_zone][idx] {
                    export_nodes[other_zone].push(nid);
                    export_seen[other_zone][idx] = true;
                }
            }
        }
        for list in &mut import_nodes {
            list.sort_unstable();
        }

        ZoneTopology {
            zone,
            nzone,
            local_nodes,
            local_edge_count,
            export_nodes,
            import_nodes,
        }
    }

    /// Every node this zone holds authoritative counts and weights for:
    /// its local nodes plus all imports.
    pub fn authoritative_nodes(&self) -> Vec<u32> {
        let mut nodes: Vec<u32> = self.import_nodes.iter().flatten().copied().collect();
        nodes.extend_from_slice(&self.local_nodes);
        nodes
    }

    /// Logs the zone layout, with node lists truncated to ten entries.
    /// Used by the partition-preview mode.
    pub fn log_summary(&self) {
        info!(
            "Zone {} has {} nodes: {}",
            self.zone,
            self.local_nodes.len(),
            format_node_list(&self.local_nodes)
        );
        info!("Zone {} has {} edges", self.zone, self.local_edge_count);
        for zid in 0..self.nzone {
            if !self.export_nodes[zid].is_empty() {
                info!(
                    "Zone {} has {} nodes connected to zone {}: {}",
                    self.zone,
                    self.export_nodes[zid].len(),
                    zid,
                    format_node_list(&self.export_nodes[zid])
                );
            }
            if !self.import_nodes[zid].is_empty() {
                info!(
                    "Zone {} has {} nodes in zone {} connected to it: {}",
                    self.zone,
                    self.import_nodes[zid].len(),
                    zid,
                    format_node_list(&self.import_nodes[zid])
                );
            }
        }
    }
}

fn format_node_list(list: &[u32]) -> String {
    let mut out = String::from("[");
    for (i, val) in list.iter().take(10).enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&val.to_string());
    }
    if list.len() > 10 {
        out.push_str(" ... ");
    }
    out.push(']');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::model::GridGraph;

    fn two_zone_line() -> GridGraph {
        // 4x1 line 0-1-2-3, zones [0, 0, 1, 1].
        let mut g = GridGraph::from_sorted_edges(
            4,
            1,
            &[(0, 1), (1, 0), (1, 2), (2, 1), (2, 3), (3, 2)],
        )
        .unwrap();
        g.set_zone_map(vec![0, 0, 1, 1], 2).unwrap();
        g
    }

    #[test]
    fn test_local_nodes_and_edges() {
        let g = two_zone_line();
        let t0 = ZoneTopology::build(&g, 0);
        assert_eq!(t0.local_nodes, vec![0, 1]);
        // Runs: node 0 has [0, 1], node 1 has [1, 0, 2].
        assert_eq!(t0.local_edge_count, 5);
    }

    #[test]
    fn test_import_export_lists() {
        let g = two_zone_line();
        let t0 = ZoneTopology::build(&g, 0);
        let t1 = ZoneTopology::build(&g, 1);
        assert_eq!(t0.export_nodes[1], vec![1]);
        assert_eq!(t0.import_nodes[1], vec![2]);
        assert_eq!(t1.export_nodes[0], vec![2]);
        assert_eq!(t1.import_nodes[0], vec![1]);
        // A zone never has a boundary with itself.
        assert!(t0.export_nodes[0].is_empty());
        assert!(t1.import_nodes[1].is_empty());
    }

    #[test]
    fn test_boundary_alignment() {
        let g = two_zone_line();
        let t0 = ZoneTopology::build(&g, 0);
        let t1 = ZoneTopology::build(&g, 1);
        // With undirected adjacency, each side's import list matches the
        // peer's export list entry for entry.
        assert_eq!(t0.import_nodes[1], t1.export_nodes[0]);
        assert_eq!(t1.import_nodes[0], t0.export_nodes[1]);
    }

    #[test]
    fn test_format_node_list_truncation() {
        let list: Vec<u32> = (0..12).collect();
        let text = format_node_list(&list);
        assert!(text.starts_with("[0, 1, "));
        assert!(text.ends_with(" ... ]"));
        assert_eq!(format_node_list(&[3]), "[3]");
        assert_eq!(format_node_list(&[]), "[]");
    }
}
