//! Post-win wild spawning
//!
//! Every winning cluster spawns one wild inside its own footprint after the
//! cluster is cleared. The wild type is drawn for every cluster, including
//! one whose spawn later forfeits, so the RNG stream advances identically
//! on every path.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::clusters::Cluster;
use crate::config::WildSpawnWeights;
use crate::grid::{Grid, Position};
use crate::rng::SpinRng;
use crate::symbols::Symbol;

/// One spawn attempt for one cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnAttempt {
    /// Symbol kind of the cluster that earned the spawn.
    pub cluster_symbol: Symbol,
    /// Which wild was drawn (`Wild` or `ExplosivoWild`).
    pub wild_type: Symbol,
    /// Where it landed, or `None` when the spawn forfeited.
    pub position: Option<Position>,
}

impl SpawnAttempt {
    /// No candidate cell was free inside the footprint.
    pub fn forfeited(&self) -> bool {
        self.position.is_none()
    }
}

/// Tally of one batch of spawn attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnStats {
    pub attempts: u32,
    pub placed: u32,
    pub forfeited: u32,
    pub wilds: u32,
    pub explosivo_wilds: u32,
}

impl SpawnStats {
    pub fn from_attempts(attempts: &[SpawnAttempt]) -> Self {
        let mut stats = Self {
            attempts: attempts.len() as u32,
            ..Self::default()
        };
        for attempt in attempts {
            if attempt.forfeited() {
                stats.forfeited += 1;
            } else {
                stats.placed += 1;
                if attempt.wild_type == Symbol::ExplosivoWild {
                    stats.explosivo_wilds += 1;
                } else {
                    stats.wilds += 1;
                }
            }
        }
        stats
    }
}

/// Spawns wilds into cleared cluster footprints.
#[derive(Debug, Clone, Copy)]
pub struct WildSpawner {
    weights: [f64; 2],
}

impl WildSpawner {
    pub fn new(probabilities: WildSpawnWeights) -> Self {
        Self {
            weights: [probabilities.wild, probabilities.explosivo],
        }
    }

    /// Process `clusters` in order, placing one wild per cluster.
    ///
    /// Candidates are the footprint cells that are still empty and not
    /// already claimed by an earlier cluster of this batch. An empty
    /// candidate set forfeits the spawn: no retry, no expansion. The grid
    /// must already have the winning cells cleared.
    pub fn spawn_for_clusters(
        &self,
        grid: &mut Grid,
        clusters: &[Cluster],
        rng: &mut SpinRng,
    ) -> Vec<SpawnAttempt> {
        let mut attempts = Vec::with_capacity(clusters.len());
        let mut claimed: BTreeSet<Position> = BTreeSet::new();

        for cluster in clusters {
            // Unconditional type draw keeps the stream aligned even when
            // the placement below fails.
            let wild_type = match rng.weighted(&self.weights) {
                0 => Symbol::Wild,
                _ => Symbol::ExplosivoWild,
            };

            // Footprint positions are already sorted row-major.
            let candidates: Vec<Position> = cluster
                .positions
                .iter()
                .copied()
                .filter(|&pos| grid.is_empty(pos) && !claimed.contains(&pos))
                .collect();

            let position = if candidates.is_empty() {
                log::debug!("spawn forfeited for {:?} cluster", cluster.symbol);
                None
            } else {
                let pos = candidates[rng.bounded(candidates.len())];
                grid.set_symbol(pos, wild_type);
                claimed.insert(pos);
                log::debug!("spawned {:?} at {:?}", wild_type, pos);
                Some(pos)
            };

            attempts.push(SpawnAttempt {
                cluster_symbol: cluster.symbol,
                wild_type,
                position,
            });
        }

        attempts
    }
}
