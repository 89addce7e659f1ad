//! Explosivo wild explosions
//!
//! An explosivo wild detonates a 3×3 area, destroying low-pay symbols only.
//! Whether it is allowed to fire depends on how it got to its cell, so the
//! engine tracks three disjoint position sets per cascade:
//!
//! - `landed_this_drop` — placed by the most recent refill;
//! - `in_winning_clusters` — collected by a winning cluster; the cell is
//!   already empty, but the explosion still fires from the remembered spot;
//! - `spawned_this_cascade` — produced by the wild spawner; never eligible
//!   until a later refill re-registers them as landed.
//!
//! Everything eligible fires simultaneously in one step; there are no chain
//! reactions within a step.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::clusters::Cluster;
use crate::grid::{Grid, Position, COLS, ROWS};
use crate::symbols::Symbol;

/// Summary of one explosion step. Only produced when the step changed the
/// grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplosionEvent {
    /// Cells the blasts emanated from (live and remembered), row-major.
    pub origins: Vec<Position>,
    /// Low-pay cells destroyed, row-major.
    pub destroyed: Vec<Position>,
    /// Live explosivo wilds consumed by their own blast, row-major.
    pub consumed_ews: Vec<Position>,
}

/// Tracks explosivo-wild eligibility across a cascade and executes the
/// simultaneous explosion step.
#[derive(Debug, Default)]
pub struct ExplosionEngine {
    landed_this_drop: BTreeSet<Position>,
    in_winning_clusters: BTreeSet<Position>,
    spawned_this_cascade: BTreeSet<Position>,
    collected: u32,
}

impl ExplosionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refill boundary: wilds spawned on the previous step become ordinary
    /// landers once the next drop registers them.
    pub fn begin_drop(&mut self) {
        self.spawned_this_cascade.clear();
    }

    /// Register every explosivo wild present after a refill, except those
    /// spawned within the current cascade step.
    pub fn track_landed(&mut self, grid: &Grid) {
        self.landed_this_drop = grid
            .positions_of(Symbol::ExplosivoWild)
            .into_iter()
            .filter(|pos| !self.spawned_this_cascade.contains(pos))
            .collect();
        debug_assert!(self
            .landed_this_drop
            .is_disjoint(&self.spawned_this_cascade));
        log::debug!("tracked {} landed explosivo wilds", self.landed_this_drop.len());
    }

    /// Record the explosivo wilds inside winning clusters, before the
    /// clusters are cleared. Each is collected exactly once even when a
    /// shared wild sits in several clusters.
    pub fn track_cluster_ews(&mut self, clusters: &[Cluster], grid: &Grid) {
        self.in_winning_clusters.clear();
        for cluster in clusters {
            for &pos in &cluster.positions {
                if grid.symbol_at(pos).is_explosivo_wild() && self.in_winning_clusters.insert(pos)
                {
                    self.collected += 1;
                    log::debug!("collected explosivo wild from cluster at {pos:?}");
                }
            }
        }
    }

    /// Record a freshly spawned explosivo wild; it may not fire this
    /// cascade.
    pub fn track_spawned(&mut self, pos: Position) {
        self.spawned_this_cascade.insert(pos);
    }

    /// Follow live wilds through a gravity pass. Remembered cluster
    /// positions stay where the cluster was.
    pub fn remap_for_gravity(&mut self, moves: &[(Position, Position)]) {
        if moves.is_empty() {
            return;
        }
        let follow = |set: &BTreeSet<Position>| -> BTreeSet<Position> {
            set.iter()
                .map(|&pos| {
                    moves
                        .iter()
                        .find(|&&(from, _)| from == pos)
                        .map(|&(_, to)| to)
                        .unwrap_or(pos)
                })
                .collect()
        };
        self.landed_this_drop = follow(&self.landed_this_drop);
        self.spawned_this_cascade = follow(&self.spawned_this_cascade);
    }

    /// A live explosivo wild may fire iff it landed this drop or was
    /// collected by a cluster, and was not spawned within this cascade.
    pub fn is_eligible(&self, pos: Position) -> bool {
        if self.spawned_this_cascade.contains(&pos) {
            return false;
        }
        self.landed_this_drop.contains(&pos) || self.in_winning_clusters.contains(&pos)
    }

    /// Explosions are only checked on a step that found no clusters.
    pub fn should_check_explosions(&self, clusters_found: bool) -> bool {
        !clusters_found
    }

    /// Fire every eligible explosivo wild simultaneously.
    ///
    /// The blast areas are unioned before anything is destroyed, so each
    /// cell is destroyed at most once. Live wilds that fired are consumed
    /// and counted as collected unless a cluster already collected them.
    /// Returns `None` when the step changed nothing.
    pub fn execute_explosions(&mut self, grid: &mut Grid) -> Option<ExplosionEvent> {
        let mut origins: BTreeSet<Position> = self.in_winning_clusters.clone();
        for pos in grid.positions_of(Symbol::ExplosivoWild) {
            if self.is_eligible(pos) {
                origins.insert(pos);
            }
        }
        if origins.is_empty() {
            return None;
        }

        let mut blast: BTreeSet<Position> = BTreeSet::new();
        for &origin in &origins {
            for pos in blast_area(origin) {
                blast.insert(pos);
            }
        }

        let destroyed: Vec<Position> = blast
            .into_iter()
            .filter(|&pos| grid.symbol_at(pos).destructible_by_explosion())
            .collect();
        for &pos in &destroyed {
            grid.set_symbol(pos, Symbol::Empty);
        }

        let consumed_ews: Vec<Position> = origins
            .iter()
            .copied()
            .filter(|&pos| grid.symbol_at(pos).is_explosivo_wild() && self.is_eligible(pos))
            .collect();
        for &pos in &consumed_ews {
            grid.set_symbol(pos, Symbol::Empty);
            self.landed_this_drop.remove(&pos);
            if !self.in_winning_clusters.contains(&pos) {
                self.collected += 1;
            }
        }

        if destroyed.is_empty() && consumed_ews.is_empty() {
            return None;
        }

        log::debug!(
            "{} explosions destroyed {} symbols",
            origins.len(),
            destroyed.len()
        );
        Some(ExplosionEvent {
            origins: origins.into_iter().collect(),
            destroyed,
            consumed_ews,
        })
    }

    /// Clear all cascade tracking. Collected totals survive.
    pub fn reset_cascade_state(&mut self) {
        self.landed_this_drop.clear();
        self.in_winning_clusters.clear();
        self.spawned_this_cascade.clear();
    }

    /// Explosivo wilds collected so far (cluster removals + consumed
    /// blasts).
    pub fn collected_count(&self) -> u32 {
        self.collected
    }
}

/// The 3×3 area around `origin`, clipped to the grid.
fn blast_area(origin: Position) -> Vec<Position> {
    let (row, col) = origin;
    let mut area = Vec::with_capacity(9);
    for r in row.saturating_sub(1)..=(row + 1).min(ROWS - 1) {
        for c in col.saturating_sub(1)..=(col + 1).min(COLS - 1) {
            area.push((r, c));
        }
    }
    area
}
