/*!
# Exchange Fabric

Typed point-to-point channels between zones. Every ordered zone pair gets one
channel per message kind (migrants, boundary counts, boundary weights, and the
display gather into zone 0), so a payload can never be taken for one of
another kind and delivery between two peers stays FIFO per kind. Sends are
unbounded and therefore never block, which lets every zone post all of its
sends before issuing any blocking receive; an empty payload still completes.

Payload vectors move into the channel, so a buffer can never be overwritten
while its transfer is in flight. A disconnected channel end means the peer
zone is gone, which is fatal for the run.
*/

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::core::error::{GridswarmError, Result};

/// One migrating agent: its id, destination node, and live RNG state.
///
/// The generator state travels with the agent so its draw sequence is
/// independent of the path it takes across zones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migrant {
    pub agent: u32,
    pub node: u32,
    pub seed: u32,
}

/// Per-node count snapshot entry sent to zone 0 for display frames.
pub type GatherEntry = (u32, u32);

/// One zone's endpoints of the exchange fabric.
pub struct ZoneFabric {
    zone: usize,
    nzone: usize,
    migrant_tx: Vec<Option<Sender<Vec<Migrant>>>>,
    migrant_rx: Vec<Option<Receiver<Vec<Migrant>>>>,
    count_tx: Vec<Option<Sender<Vec<u32>>>>,
    count_rx: Vec<Option<Receiver<Vec<u32>>>>,
    weight_tx: Vec<Option<Sender<Vec<f64>>>>,
    weight_rx: Vec<Option<Receiver<Vec<f64>>>>,
    gather_tx: Option<Sender<Vec<GatherEntry>>>,
    gather_rx: Vec<Option<Receiver<Vec<GatherEntry>>>>,
}

fn none_vec<T>(n: usize) -> Vec<Option<T>> {
    (0..n).map(|_| None).collect()
}

/// Builds the full fabric for `nzone` zones, one endpoint set per zone.
pub fn build_fabric(nzone: usize) -> Vec<ZoneFabric> {
    let mut fabrics: Vec<ZoneFabric> = (0..nzone)
        .map(|zone| ZoneFabric {
            zone,
            nzone,
            migrant_tx: none_vec(nzone),
            migrant_rx: none_vec(nzone),
            count_tx: none_vec(nzone),
            count_rx: none_vec(nzone),
            weight_tx: none_vec(nzone),
            weight_rx: none_vec(nzone),
            gather_tx: None,
            gather_rx: none_vec(nzone),
        })
        .collect();

    for src in 0..nzone {
        for dst in 0..nzone {
            if src == dst {
                continue;
            }
            let (tx, rx) = unbounded();
            fabrics[src].migrant_tx[dst] = Some(tx);
            fabrics[dst].migrant_rx[src] = Some(rx);
            let (tx, rx) = unbounded();
            fabrics[src].count_tx[dst] = Some(tx);
            fabrics[dst].count_rx[src] = Some(rx);
            let (tx, rx) = unbounded();
            fabrics[src].weight_tx[dst] = Some(tx);
            fabrics[dst].weight_rx[src] = Some(rx);
        }
    }
    for src in 1..nzone {
        let (tx, rx) = unbounded();
        fabrics[src].gather_tx = Some(tx);
        fabrics[0].gather_rx[src] = Some(rx);
    }
    fabrics
}

impl ZoneFabric {
    pub fn zone(&self) -> usize {
        self.zone
    }

    pub fn zone_count(&self) -> usize {
        self.nzone
    }

    fn lost(&self, peer: usize, kind: &str) -> GridswarmError {
        GridswarmError::peer_lost(peer, format!("{} channel closed", kind))
    }

    fn no_channel(&self, peer: usize, kind: &str) -> GridswarmError {
        GridswarmError::internal(format!(
            "zone {} has no {} channel to zone {}",
            self.zone, kind, peer
        ))
    }

    pub fn send_migrants(&self, peer: usize, batch: Vec<Migrant>) -> Result<()> {
        self.migrant_tx[peer]
            .as_ref()
            .ok_or_else(|| self.no_channel(peer, "migrant"))?
            .send(batch)
            .map_err(|_| self.lost(peer, "migrant"))
    }

    pub fn recv_migrants(&self, peer: usize) -> Result<Vec<Migrant>> {
        self.migrant_rx[peer]
            .as_ref()
            .ok_or_else(|| self.no_channel(peer, "migrant"))?
            .recv()
            .map_err(|_| self.lost(peer, "migrant"))
    }

    pub fn send_counts(&self, peer: usize, counts: Vec<u32>) -> Result<()> {
        self.count_tx[peer]
            .as_ref()
            .ok_or_else(|| self.no_channel(peer, "count"))?
            .send(counts)
            .map_err(|_| self.lost(peer, "count"))
    }

    pub fn recv_counts(&self, peer: usize) -> Result<Vec<u32>> {
        self.count_rx[peer]
            .as_ref()
            .ok_or_else(|| self.no_channel(peer, "count"))?
            .recv()
            .map_err(|_| self.lost(peer, "count"))
    }

    pub fn send_weights(&self, peer: usize, weights: Vec<f64>) -> Result<()> {
        self.weight_tx[peer]
            .as_ref()
            .ok_or_else(|| self.no_channel(peer, "weight"))?
            .send(weights)
            .map_err(|_| self.lost(peer, "weight"))
    }

    pub fn recv_weights(&self, peer: usize) -> Result<Vec<f64>> {
        self.weight_rx[peer]
            .as_ref()
            .ok_or_else(|| self.no_channel(peer, "weight"))?
            .recv()
            .map_err(|_| self.lost(peer, "weight"))
    }

    /// Sends this zone's local node counts toward zone 0.
    pub fn send_gather(&self, entries: Vec<GatherEntry>) -> Result<()> {
        self.gather_tx
            .as_ref()
            .ok_or_else(|| self.no_channel(0, "gather"))?
            .send(entries)
            .map_err(|_| self.lost(0, "gather"))
    }

    /// Receives one gather payload from `peer`; zone 0 only.
    pub fn recv_gather(&self, peer: usize) -> Result<Vec<GatherEntry>> {
        self.gather_rx[peer]
            .as_ref()
            .ok_or_else(|| self.no_channel(peer, "gather"))?
            .recv()
            .map_err(|_| self.lost(peer, "gather"))
    }
}
