/*!
# Input File Parsers

Readers for the two simulation input files.

- **Graph file:** header `W H E [REGIONS]`; then `N` node lines `n ILF` (the
  ILF value is parsed and discarded, weights are computed dynamically); then
  `E` edge lines `e HEAD TAIL` with heads in nondecreasing order; then
  optional region rectangles `r X Y W H`.
- **Agent file:** header `N R` (`N` must match the graph), then `R` lines
  holding each agent's initial node id.

Lines whose first non-blank character is `#` are comments and are skipped
anywhere in either file, as are blank lines. All parse and range failures are
input errors reported before any simulation work starts.
*/

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

use crate::core::error::{GridswarmError, Result};
use crate::graph::model::{GridGraph, Region};
use crate::partition::assign_zones;

/// Reads a file into significant (non-comment, non-blank) lines, paired with
/// their 1-based line numbers for error reporting.
fn significant_lines(path: &Path) -> Result<Vec<(usize, String)>> {
    let file = File::open(path).map_err(|e| {
        GridswarmError::invalid_input(format!("couldn't open {}: {}", path.display(), e))
    })?;
    let reader = BufReader::new(file);
    let mut lines = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        lines.push((idx + 1, trimmed.to_string()));
    }
    Ok(lines)
}

fn parse_token<T: std::str::FromStr>(token: &str, lineno: usize, what: &str) -> Result<T> {
    token.parse().map_err(|_| {
        GridswarmError::invalid_input(format!(
            "line {}: couldn't parse {} from '{}'",
            lineno, what, token
        ))
    })
}

/// Parses a graph file into the graph and its (unpartitioned) region list.
pub fn read_graph_file(path: &Path) -> Result<(GridGraph, Vec<Region>)> {
    let lines = significant_lines(path)?;
    let mut cursor = lines.iter();

    let (lineno, header) = cursor
        .next()
        .ok_or_else(|| GridswarmError::invalid_input("graph file is empty"))?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(GridswarmError::invalid_input(format!(
            "line {}: malformed graph file header",
            lineno
        )));
    }
    let width: u32 = parse_token(fields[0], *lineno, "width")?;
    let height: u32 = parse_token(fields[1], *lineno, "height")?;
    let nedge: usize = parse_token(fields[2], *lineno, "edge count")?;
    let nregion: usize = if fields.len() > 3 {
        parse_token(fields[3], *lineno, "region count")?
    } else {
        0
    };
    let nnode = width as usize * height as usize;

    // Node lines carry a static ILF that the simulation ignores; they are
    // still validated so a truncated file is caught early.
    for i in 0..nnode {
        let (lineno, line) = cursor.next().ok_or_else(|| {
            GridswarmError::invalid_input(format!("graph file ended before node {}", i))
        })?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 2 || fields[0] != "n" {
            return Err(GridswarmError::invalid_input(format!(
                "line {}: expected node line for node {}",
                lineno, i
            )));
        }
        let _ilf: f64 = parse_token(fields[1], *lineno, "node load factor")?;
    }

    let mut edges = Vec::with_capacity(nedge);
    let mut last_head: Option<u32> = None;
    for i in 0..nedge {
        let (lineno, line) = cursor.next().ok_or_else(|| {
            GridswarmError::invalid_input(format!("graph file ended before edge {}", i))
        })?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 || fields[0] != "e" {
            return Err(GridswarmError::invalid_input(format!(
                "line {}: expected edge line for edge {}",
                lineno, i
            )));
        }
        let head: u32 = parse_token(fields[1], *lineno, "edge head")?;
        let tail: u32 = parse_token(fields[2], *lineno, "edge tail")?;
        if head as usize >= nnode || tail as usize >= nnode {
            return Err(GridswarmError::invalid_input(format!(
                "line {}: edge ({}, {}) out of range for {} nodes",
                lineno, head, tail, nnode
            )));
        }
        if let Some(prev) = last_head {
            if head < prev {
                return Err(GridswarmError::invalid_input(format!(
                    "line {}: edge head {} out of order",
                    lineno, head
                )));
            }
        }
        last_head = Some(head);
        edges.push((head, tail));
    }

    let graph = GridGraph::from_sorted_edges(width, height, &edges)?;

    let mut regions = Vec::with_capacity(nregion);
    for i in 0..nregion {
        let (lineno, line) = cursor.next().ok_or_else(|| {
            GridswarmError::invalid_input(format!("graph file ended before region {}", i))
        })?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 5 || fields[0] != "r" {
            return Err(GridswarmError::invalid_input(format!(
                "line {}: expected region line for region {}",
                lineno, i
            )));
        }
        let x: u32 = parse_token(fields[1], *lineno, "region x")?;
        let y: u32 = parse_token(fields[2], *lineno, "region y")?;
        let w: u32 = parse_token(fields[3], *lineno, "region width")?;
        let h: u32 = parse_token(fields[4], *lineno, "region height")?;
        regions.push(Region::from_rect(i, x, y, w, h, &graph)?);
    }

    info!(
        nodes = nnode,
        edges = nedge,
        regions = nregion,
        "loaded graph"
    );
    Ok((graph, regions))
}

/// Loads a graph file and partitions it into `nzone` zones.
///
/// A graph without regions keeps every node in zone 0; the remaining zones
/// stay empty, which is legal but usually unintended, so it is warned about.
pub fn load_graph(path: &Path, nzone: usize) -> Result<GridGraph> {
    if nzone == 0 {
        return Err(GridswarmError::invalid_argument("zone count must be positive"));
    }
    let (mut graph, mut regions) = read_graph_file(path)?;
    if regions.is_empty() {
        if nzone > 1 {
            warn!(
                zones = nzone,
                "graph has no regions; all nodes stay in zone 0"
            );
        }
        let nnode = graph.node_count();
        graph.set_zone_map(vec![0; nnode], nzone)?;
    } else {
        assign_zones(&mut regions, nzone)?;
        graph.apply_zones(&regions, nzone)?;
        info!(zones = nzone, regions = regions.len(), "partitioned graph");
    }
    Ok(graph)
}

/// Reads an agent file, returning the initial node id of every agent.
pub fn read_agent_file(path: &Path, graph: &GridGraph) -> Result<Vec<u32>> {
    let lines = significant_lines(path)?;
    let mut cursor = lines.iter();

    let (lineno, header) = cursor
        .next()
        .ok_or_else(|| GridswarmError::invalid_input("agent file is empty"))?;
    let fields: Vec<&str> = header.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(GridswarmError::invalid_input(format!(
            "line {}: malformed agent file header",
            lineno
        )));
    }
    let nnode: usize = parse_token(fields[0], *lineno, "node count")?;
    let nagent: usize = parse_token(fields[1], *lineno, "agent count")?;
    if nnode != graph.node_count() {
        return Err(GridswarmError::invalid_input(format!(
            "graph contains {} nodes, but agent file has {}",
            graph.node_count(),
            nnode
        )));
    }

    let mut positions = Vec::with_capacity(nagent);
    for i in 0..nagent {
        let (lineno, line) = cursor.next().ok_or_else(|| {
            GridswarmError::invalid_input(format!("agent file ended before agent {}", i))
        })?;
        let node: u32 = parse_token(line.split_whitespace().next().unwrap_or(""), *lineno, "node id")?;
        if node as usize >= nnode {
            return Err(GridswarmError::invalid_input(format!(
                "line {}: invalid node number {}",
                lineno, node
            )));
        }
        positions.push(node);
    }

    info!(agents = nagent, "loaded agents");
    Ok(positions)
}
