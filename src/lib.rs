//! # calavera-engine — Deterministic Cluster-Pays Avalanche Slot Engine
//!
//! Simulation core for a 5×5 cluster-pays slot with cascading avalanches,
//! guaranteed wild spawning, area-of-effect explosivo wilds, a progressive
//! multiplier trail and a free-spins feature with persistent upgrades.
//!
//! ## Features
//!
//! - **Cluster Pays**: 5+ connected symbols win, wilds join every cluster
//!   they can reach
//! - **Avalanches**: winning symbols clear, the grid collapses and refills
//! - **Wild Spawning**: every win leaves a wild behind in its footprint
//! - **Explosivo Wilds**: 3×3 blasts that clear low pays and bank upgrades
//! - **Free Spins**: enhanced multiplier trail with per-session upgrades
//! - **Deterministic**: one pinned RNG stream, bit-identical replays
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      GameConfig                         │
//! │  (weights, paytable, awards, cap — validated once)      │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                     RoundEngine                         │
//! │                                                         │
//! │  ┌──────────┐ ┌─────────────────┐ ┌─────────────────┐  │
//! │  │   Grid   │ │ ClusterDetector │ │   WildSpawner   │  │
//! │  └──────────┘ └─────────────────┘ └─────────────────┘  │
//! │  ┌─────────────────┐ ┌───────────────────────────────┐ │
//! │  │ ExplosionEngine │ │       FreeSpinsSession        │ │
//! │  └─────────────────┘ └───────────────────────────────┘ │
//! └────────────────────────┬────────────────────────────────┘
//!                          │
//!                          ▼
//!                  SpinRng → RoundResult
//! ```
//!
//! The engine is strictly single-threaded per round; parallel drivers run
//! independent rounds on worker streams (`SpinRng::for_worker`) and may
//! share the immutable [`GameConfig`] by reference.

pub mod clusters;
pub mod config;
pub mod engine;
pub mod explosions;
pub mod features;
pub mod grid;
pub mod rng;
pub mod spawning;
pub mod stats;
pub mod symbols;

pub use clusters::{Cluster, ClusterDetector, UnionFind};
pub use config::{
    BetPlus, BetPlusModifier, ConfigError, GameConfig, Paytable, ScatterAwards, SpinMode,
    WeightTable, WildSpawnWeights,
};
pub use engine::{
    play_round, CascadeStep, ClusterWin, RoundMode, RoundOptions, RoundOptionError, RoundResult,
};
pub use explosions::{ExplosionEngine, ExplosionEvent};
pub use features::{FreeSpinSummary, FreeSpinsResult, FreeSpinsState, RetriggerAward};
pub use grid::{Grid, Position, CELLS, COLS, ROWS};
pub use rng::SpinRng;
pub use spawning::{SpawnAttempt, SpawnStats, WildSpawner};
pub use stats::SessionStats;
pub use symbols::{Symbol, DRAWABLE_SYMBOLS, PAYING_SYMBOLS};
