//! Round engine
//!
//! Drives one paid round through the cascade state machine:
//!
//! ```text
//! REEL_DROP → CHECK_SCATTERS → CHECK_CLUSTERS ─┬─ clusters ──→ PROCESS_WINS ─┐
//!      ▲                                       └─ none ─────→ CHECK_EXPLOSIONS
//!      │                                                            │
//!      └──────────── wins this step, or explosions fired ───────────┤
//!                                                                   ▼
//!                                                          SEQUENCE_COMPLETE
//! ```
//!
//! A winning step clears its clusters, spawns wilds, applies gravity and
//! advances the multiplier trail; a no-cluster step gives eligible
//! explosivo wilds their one chance to fire. The sequence ends on a step
//! with neither. A scatter trigger latched along the way hands the round to
//! the free-spins session after the base cascade settles.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clusters::{Cluster, ClusterDetector};
use crate::config::{BetPlus, DrawTable, GameConfig, SpinMode};
use crate::explosions::{ExplosionEngine, ExplosionEvent};
use crate::features::free_spins::{run_session, FreeSpinsResult, SessionEntry};
use crate::grid::{Grid, Position, COLS, ROWS};
use crate::rng::SpinRng;
use crate::spawning::{SpawnAttempt, WildSpawner};
use crate::symbols::Symbol;

/// How the round is bought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundMode {
    /// Normal paid spin.
    BaseGame,
    /// Direct free-spins entry; the buy price is debited by the driver.
    FeatureBuy,
}

/// Caller-supplied options for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundOptions {
    pub mode: RoundMode,
    /// Base bet in currency units.
    pub base_bet: f64,
    /// Optional bet-plus tier (base game only).
    pub bet_plus: Option<BetPlus>,
    /// Debug/demo switch: overwrite one opening-drop cell with an explosivo
    /// wild (base game only).
    pub force_opening_ew: bool,
}

impl RoundOptions {
    pub fn base_game(base_bet: f64) -> Self {
        Self {
            mode: RoundMode::BaseGame,
            base_bet,
            bet_plus: None,
            force_opening_ew: false,
        }
    }

    pub fn feature_buy(base_bet: f64) -> Self {
        Self {
            mode: RoundMode::FeatureBuy,
            base_bet,
            bet_plus: None,
            force_opening_ew: false,
        }
    }

    fn validate(&self, config: &GameConfig) -> Result<(), RoundOptionError> {
        if !(self.base_bet > 0.0) || !self.base_bet.is_finite() {
            return Err(RoundOptionError::InvalidBet(self.base_bet));
        }
        if let Some(tier) = self.bet_plus {
            if self.mode == RoundMode::FeatureBuy {
                return Err(RoundOptionError::InvalidOptions(
                    "bet-plus cannot combine with a feature buy",
                ));
            }
            if !config.bet_plus_modifiers.contains_key(&tier) {
                return Err(RoundOptionError::UnknownBetPlus(tier));
            }
        }
        if self.force_opening_ew && self.mode == RoundMode::FeatureBuy {
            return Err(RoundOptionError::InvalidOptions(
                "a forced opening wild applies to base-game rounds only",
            ));
        }
        Ok(())
    }
}

/// Rejected round options.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RoundOptionError {
    #[error("base bet must be a positive amount, got {0}")]
    InvalidBet(f64),
    #[error("bet-plus tier {0:?} is not offered by this configuration")]
    UnknownBetPlus(BetPlus),
    #[error("invalid option combination: {0}")]
    InvalidOptions(&'static str),
}

/// One cluster's payout within a cascade step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterWin {
    pub symbol: Symbol,
    /// Full footprint, wilds included.
    pub positions: Vec<Position>,
    /// True member count.
    pub size: usize,
    /// Size the paytable was consulted with.
    pub payout_size: usize,
    /// Win in currency units (multiplier applied).
    pub payout: f64,
}

/// Everything that happened in one cascade step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeStep {
    pub index: u32,
    /// Trail multiplier in force during this step.
    pub multiplier: u32,
    /// Scatters visible after this step's refill.
    pub scatters_on_grid: u8,
    pub cluster_wins: Vec<ClusterWin>,
    /// Spawn attempts, forfeits included.
    pub spawns: Vec<SpawnAttempt>,
    pub explosion: Option<ExplosionEvent>,
    /// Win credited by this step.
    pub win: f64,
}

/// Structured outcome of one paid round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    /// Total round win in currency units, capped at the max-win multiple.
    pub total_win: f64,
    /// Base-game cascade steps in order.
    pub cascades: Vec<CascadeStep>,
    /// Trail multiplier of each winning or exploding base-game step.
    pub multiplier_progression: Vec<u32>,
    /// Scatter count that latched the free-spins trigger, if any.
    pub scatters_triggering: Option<u8>,
    /// Free-spins session, when entered.
    pub free_spins: Option<FreeSpinsResult>,
    pub max_win_hit: bool,
}

/// Play one round. `config` must already be validated; `rng` is the round's
/// seeded stream.
pub fn play_round(
    config: &GameConfig,
    rng: &mut SpinRng,
    options: &RoundOptions,
) -> Result<RoundResult, RoundOptionError> {
    options.validate(config)?;
    let bet = options.base_bet;
    let cap_units = config.max_win_multiple * bet;

    match options.mode {
        RoundMode::BaseGame => {
            let draw = config.draw_table(SpinMode::BaseGame, options.bet_plus);
            let ctx = CascadeContext {
                draw: &draw,
                trail: &config.multiplier_trail,
                bet,
                cap_units,
                carry_in: 0.0,
                scatter_trigger: config.scatter_awards.trigger_count,
                force_opening_ew: options.force_opening_ew,
                opening_grid: None,
            };
            let outcome = run_spin(config, rng, ctx);

            let mut total_win = outcome.win;
            let mut max_win_hit = outcome.max_win_hit;
            let free_spins = match (max_win_hit, outcome.scatter_latch) {
                (false, Some(scatters)) => {
                    log::info!("free spins triggered by {scatters} scatters");
                    let session = run_session(
                        config,
                        rng,
                        bet,
                        total_win,
                        SessionEntry::ScatterTrigger(scatters),
                    );
                    total_win += session.session_win;
                    max_win_hit |= session.max_win_hit;
                    Some(session)
                }
                _ => None,
            };

            Ok(RoundResult {
                total_win,
                cascades: outcome.steps,
                multiplier_progression: outcome.multiplier_progression,
                scatters_triggering: outcome.scatter_latch,
                free_spins,
                max_win_hit,
            })
        }
        RoundMode::FeatureBuy => {
            let session = run_session(config, rng, bet, 0.0, SessionEntry::FeatureBuy);
            Ok(RoundResult {
                total_win: session.session_win,
                cascades: Vec::new(),
                multiplier_progression: Vec::new(),
                scatters_triggering: None,
                max_win_hit: session.max_win_hit,
                free_spins: Some(session),
            })
        }
    }
}

// ─── cascade runner ─────────────────────────────────────────────────────────

/// Parameters for one spin's cascade sequence (base game or one free spin).
pub(crate) struct CascadeContext<'a> {
    pub draw: &'a DrawTable,
    pub trail: &'a [u32; 6],
    pub bet: f64,
    /// Absolute win ceiling in currency units.
    pub cap_units: f64,
    /// Win already accumulated toward the ceiling before this spin.
    pub carry_in: f64,
    /// Scatter count that latches a trigger (3 base game, 2 retrigger).
    pub scatter_trigger: u8,
    pub force_opening_ew: bool,
    /// Test seam: preset opening grid instead of the first refill.
    pub opening_grid: Option<Grid>,
}

/// Outcome of one spin's cascade sequence.
pub(crate) struct SpinOutcome {
    pub win: f64,
    pub steps: Vec<CascadeStep>,
    pub multiplier_progression: Vec<u32>,
    pub scatter_latch: Option<u8>,
    pub ew_collected: u32,
    pub max_win_hit: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpinState {
    ReelDrop,
    CheckScatters,
    CheckClusters,
    ProcessWins,
    CheckExplosions,
    SequenceComplete,
}

pub(crate) fn run_spin(
    config: &GameConfig,
    rng: &mut SpinRng,
    mut ctx: CascadeContext<'_>,
) -> SpinOutcome {
    let mut grid = Grid::new();
    let mut detector = ClusterDetector::new();
    let spawner = WildSpawner::new(config.wild_spawn_probabilities);
    let mut explosions = ExplosionEngine::new();

    let mut state = SpinState::ReelDrop;
    let mut initial_drop = true;
    let mut trail_pos = 0usize;
    let mut step_index = 0u32;
    let mut win = 0.0f64;
    let mut max_win_hit = false;
    let mut scatter_latch: Option<u8> = None;
    let mut scatters_on_grid = 0u8;
    let mut steps: Vec<CascadeStep> = Vec::new();
    let mut multiplier_progression: Vec<u32> = Vec::new();
    let mut pending_clusters: Vec<Cluster> = Vec::new();
    let mut clusters_found_this_step = false;

    while state != SpinState::SequenceComplete {
        match state {
            SpinState::ReelDrop => {
                explosions.begin_drop();
                match (initial_drop, ctx.opening_grid.take()) {
                    (true, Some(preset)) => grid = preset,
                    _ => {
                        grid.refill(ctx.draw, rng);
                    }
                }
                if initial_drop && ctx.force_opening_ew {
                    let row = rng.bounded(ROWS);
                    let col = rng.bounded(COLS);
                    grid.set_symbol((row, col), Symbol::ExplosivoWild);
                    log::debug!("forced opening explosivo wild at ({row}, {col})");
                }
                initial_drop = false;
                explosions.track_landed(&grid);
                state = SpinState::CheckScatters;
            }

            SpinState::CheckScatters => {
                scatters_on_grid = grid.count(Symbol::Scatter) as u8;
                if scatter_latch.is_none() && scatters_on_grid >= ctx.scatter_trigger {
                    scatter_latch = Some(scatters_on_grid);
                    log::debug!("scatter trigger latched at {scatters_on_grid}");
                }
                state = SpinState::CheckClusters;
            }

            SpinState::CheckClusters => {
                pending_clusters = detector.find_clusters(&grid);
                clusters_found_this_step = !pending_clusters.is_empty();
                state = if clusters_found_this_step {
                    SpinState::ProcessWins
                } else {
                    SpinState::CheckExplosions
                };
            }

            SpinState::ProcessWins => {
                let multiplier = ctx.trail[trail_pos];
                let clusters = std::mem::take(&mut pending_clusters);

                let mut cluster_wins = Vec::with_capacity(clusters.len());
                let mut step_win = 0.0f64;
                for cluster in &clusters {
                    debug_assert!(cluster.size() >= crate::config::MIN_CLUSTER_SIZE);
                    let payout = config.paytable.payout(cluster.symbol, cluster.payout_size)
                        * multiplier as f64
                        * ctx.bet;
                    step_win += payout;
                    cluster_wins.push(ClusterWin {
                        symbol: cluster.symbol,
                        positions: cluster.positions.clone(),
                        size: cluster.size(),
                        payout_size: cluster.payout_size,
                        payout,
                    });
                }
                win += step_win;

                if ctx.carry_in + win >= ctx.cap_units {
                    win = ctx.cap_units - ctx.carry_in;
                    max_win_hit = true;
                    log::info!(
                        "max win reached at {}x",
                        ctx.cap_units / ctx.bet
                    );
                    steps.push(CascadeStep {
                        index: step_index,
                        multiplier,
                        scatters_on_grid,
                        cluster_wins,
                        spawns: Vec::new(),
                        explosion: None,
                        win: step_win,
                    });
                    multiplier_progression.push(multiplier);
                    state = SpinState::SequenceComplete;
                    continue;
                }

                explosions.track_cluster_ews(&clusters, &grid);

                let footprint: Vec<Position> =
                    ClusterDetector::winning_positions(&clusters).into_iter().collect();
                grid.remove(&footprint);

                let spawns = spawner.spawn_for_clusters(&mut grid, &clusters, rng);
                for spawn in &spawns {
                    if spawn.wild_type.is_explosivo_wild() {
                        if let Some(pos) = spawn.position {
                            explosions.track_spawned(pos);
                        }
                    }
                }

                let moves = grid.apply_gravity();
                explosions.remap_for_gravity(&moves);

                steps.push(CascadeStep {
                    index: step_index,
                    multiplier,
                    scatters_on_grid,
                    cluster_wins,
                    spawns,
                    explosion: None,
                    win: step_win,
                });
                multiplier_progression.push(multiplier);
                trail_pos = (trail_pos + 1).min(ctx.trail.len() - 1);
                step_index += 1;
                state = SpinState::CheckExplosions;
            }

            SpinState::CheckExplosions => {
                if !explosions.should_check_explosions(clusters_found_this_step) {
                    // A winning step always cascades into a fresh drop.
                    state = SpinState::ReelDrop;
                } else if let Some(event) = explosions.execute_explosions(&mut grid) {
                    let multiplier = ctx.trail[trail_pos];
                    grid.apply_gravity();
                    explosions.reset_cascade_state();
                    steps.push(CascadeStep {
                        index: step_index,
                        multiplier,
                        scatters_on_grid,
                        cluster_wins: Vec::new(),
                        spawns: Vec::new(),
                        explosion: Some(event),
                        win: 0.0,
                    });
                    multiplier_progression.push(multiplier);
                    trail_pos = (trail_pos + 1).min(ctx.trail.len() - 1);
                    step_index += 1;
                    state = SpinState::ReelDrop;
                } else {
                    state = SpinState::SequenceComplete;
                }
            }

            SpinState::SequenceComplete => unreachable!(),
        }
    }

    SpinOutcome {
        win,
        steps,
        multiplier_progression,
        scatter_latch,
        ew_collected: explosions.collected_count(),
        max_win_hit,
    }
}
