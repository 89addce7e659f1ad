//! Cluster detection
//!
//! Cluster pays: five or more same-kind paying symbols connected
//! horizontally/vertically win, with wilds standing in for any paying
//! symbol. Detection runs in two phases so a single wild can participate in
//! several differently-colored clusters at once:
//!
//! 1. union-find over same-kind paying adjacency, giving the non-wild core
//!    of every candidate cluster;
//! 2. each core is extended with every wild reachable from it through a
//!    chain of 4-adjacent wilds. Same-kind cores whose wild closures touch
//!    are one cluster (a wild bridge must not pay the same symbols twice);
//!    different-kind cores sharing a wild stay separate clusters.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::{MAX_PAY_SIZE, MIN_CLUSTER_SIZE};
use crate::grid::{Grid, Position, CELLS, COLS, ROWS};
use crate::symbols::{symbols_match_for_cluster, Symbol};

/// Disjoint-set over grid cells with path compression and union by rank.
#[derive(Debug)]
pub struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl UnionFind {
    pub fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    /// Root of the set containing `x`, compressing the path walked.
    pub fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cursor = x;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    /// Merge the sets containing `x` and `y`. Returns false if they were
    /// already one set.
    pub fn union(&mut self, x: usize, y: usize) -> bool {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x == root_y {
            return false;
        }
        match self.rank[root_x].cmp(&self.rank[root_y]) {
            std::cmp::Ordering::Less => self.parent[root_x] = root_y,
            std::cmp::Ordering::Greater => self.parent[root_y] = root_x,
            std::cmp::Ordering::Equal => {
                self.parent[root_y] = root_x;
                self.rank[root_x] += 1;
            }
        }
        true
    }

    /// Restore every element to its own singleton set.
    pub fn reset(&mut self) {
        for (i, slot) in self.parent.iter_mut().enumerate() {
            *slot = i;
        }
        self.rank.fill(0);
    }
}

/// A winning cluster: one paying symbol kind plus every wild it reaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// The paying symbol this cluster pays as (never a wild or scatter).
    pub symbol: Symbol,
    /// Every member cell, wilds included, sorted row-major.
    pub positions: Vec<Position>,
    /// True size clamped into the paytable band for lookup.
    pub payout_size: usize,
}

impl Cluster {
    /// Actual member count (may exceed `payout_size`).
    pub fn size(&self) -> usize {
        self.positions.len()
    }
}

fn cell_index(pos: Position) -> usize {
    pos.0 * COLS + pos.1
}

fn neighbors(pos: Position) -> impl Iterator<Item = Position> {
    let (row, col) = pos;
    let mut out = Vec::with_capacity(4);
    if row > 0 {
        out.push((row - 1, col));
    }
    if row + 1 < ROWS {
        out.push((row + 1, col));
    }
    if col > 0 {
        out.push((row, col - 1));
    }
    if col + 1 < COLS {
        out.push((row, col + 1));
    }
    out.into_iter()
}

struct Candidate {
    symbol: Symbol,
    core: Vec<Position>,
    wilds: BTreeSet<Position>,
}

/// Finds every winning cluster on a grid snapshot.
#[derive(Debug)]
pub struct ClusterDetector {
    uf: UnionFind,
}

impl ClusterDetector {
    pub fn new() -> Self {
        Self {
            uf: UnionFind::new(CELLS),
        }
    }

    /// All winning clusters, sorted by (symbol, first position) so callers
    /// process them in a reproducible order.
    pub fn find_clusters(&mut self, grid: &Grid) -> Vec<Cluster> {
        self.uf.reset();

        // Phase 1: union adjacent matching paying cells (right and down
        // only; every edge is visited once). Wild neighbours are skipped
        // here; phase 2 resolves them per component.
        for row in 0..ROWS {
            for col in 0..COLS {
                let symbol = grid.symbol_at((row, col));
                if !symbol.is_paying() {
                    continue;
                }
                if col + 1 < COLS {
                    let right = grid.symbol_at((row, col + 1));
                    if !right.is_wild() && symbols_match_for_cluster(symbol, right) {
                        self.uf.union(cell_index((row, col)), cell_index((row, col + 1)));
                    }
                }
                if row + 1 < ROWS {
                    let down = grid.symbol_at((row + 1, col));
                    if !down.is_wild() && symbols_match_for_cluster(symbol, down) {
                        self.uf.union(cell_index((row, col)), cell_index((row + 1, col)));
                    }
                }
            }
        }

        // Gather the paying cores per component root.
        let mut cores: Vec<(usize, Symbol, Vec<Position>)> = Vec::new();
        for row in 0..ROWS {
            for col in 0..COLS {
                let symbol = grid.symbol_at((row, col));
                if !symbol.is_paying() {
                    continue;
                }
                let root = self.uf.find(cell_index((row, col)));
                match cores.iter_mut().find(|(r, _, _)| *r == root) {
                    Some((_, _, positions)) => positions.push((row, col)),
                    None => cores.push((root, symbol, vec![(row, col)])),
                }
            }
        }

        // Phase 2: extend each core with its transitive wild closure.
        let mut candidates: Vec<Candidate> = cores
            .into_iter()
            .map(|(_, symbol, core)| {
                let wilds = wild_closure(grid, &core);
                Candidate { symbol, core, wilds }
            })
            .collect();

        // Same-kind cores bridged by a shared wild form one cluster.
        merge_bridged(&mut candidates);

        let mut clusters: Vec<Cluster> = candidates
            .into_iter()
            .filter(|c| c.core.len() + c.wilds.len() >= MIN_CLUSTER_SIZE)
            .map(|c| {
                let mut positions = c.core;
                positions.extend(c.wilds);
                positions.sort_unstable();
                let payout_size = positions.len().min(MAX_PAY_SIZE);
                Cluster {
                    symbol: c.symbol,
                    positions,
                    payout_size,
                }
            })
            .collect();

        clusters.sort_by_key(|c| (c.symbol, c.positions[0]));
        clusters
    }

    /// Union of all cluster footprints.
    pub fn winning_positions(clusters: &[Cluster]) -> BTreeSet<Position> {
        clusters
            .iter()
            .flat_map(|c| c.positions.iter().copied())
            .collect()
    }
}

impl Default for ClusterDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// Every wild reachable from `core` through a chain of 4-adjacent wilds.
fn wild_closure(grid: &Grid, core: &[Position]) -> BTreeSet<Position> {
    let mut wilds = BTreeSet::new();
    let mut stack: Vec<Position> = core.to_vec();
    while let Some(pos) = stack.pop() {
        let symbol = grid.symbol_at(pos);
        for neighbor in neighbors(pos) {
            let other = grid.symbol_at(neighbor);
            if other.is_wild()
                && symbols_match_for_cluster(symbol, other)
                && wilds.insert(neighbor)
            {
                stack.push(neighbor);
            }
        }
    }
    wilds
}

fn merge_bridged(candidates: &mut Vec<Candidate>) {
    loop {
        let mut merge_pair = None;
        'scan: for i in 0..candidates.len() {
            for j in (i + 1)..candidates.len() {
                if candidates[i].symbol == candidates[j].symbol
                    && candidates[i]
                        .wilds
                        .intersection(&candidates[j].wilds)
                        .next()
                        .is_some()
                {
                    merge_pair = Some((i, j));
                    break 'scan;
                }
            }
        }
        let Some((i, j)) = merge_pair else { break };
        let absorbed = candidates.swap_remove(j);
        candidates[i].core.extend(absorbed.core);
        candidates[i].wilds.extend(absorbed.wilds);
    }
}
