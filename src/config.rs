//! Game configuration
//!
//! [`GameConfig`] is an immutable snapshot of everything the round engine
//! needs: symbol weight tables for both modes, the cluster paytable, wild
//! spawn probabilities, scatter awards, multiplier trail and the max-win
//! cap. Validation runs once at construction (or import) so a round never
//! has to re-check the math it plays against.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::rng::SpinRng;
use crate::symbols::{Symbol, DRAWABLE_SYMBOLS, PAYING_SYMBOLS};

/// Smallest cluster that pays.
pub const MIN_CLUSTER_SIZE: usize = 5;
/// Cluster sizes at or above this all pay the top tier.
pub const MAX_PAY_SIZE: usize = 15;

/// Configuration problems detected at construction time. Fatal before any
/// round runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("base-game and free-spins weight tables list different symbols")]
    WeightSetMismatch,
    #[error("{0:?} cannot carry a draw weight")]
    UndrawableSymbol(Symbol),
    #[error("non-positive weight for {0:?}")]
    NonPositiveWeight(Symbol),
    #[error("wild spawn probabilities sum to {0}, expected 1.0")]
    SpawnProbabilitySum(f64),
    #[error("paytable for {symbol:?} decreases after size {size}")]
    NonMonotonicPaytable { symbol: Symbol, size: usize },
    #[error("{symbol:?} pays at least as much as the high-pay symbol at size {size}")]
    HighPayNotDominant { symbol: Symbol, size: usize },
    #[error("invalid config JSON: {0}")]
    Parse(String),
}

/// Which weight table a refill draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpinMode {
    BaseGame,
    FreeSpins,
}

/// Optional bet modifier purchased alongside a base-game spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BetPlus {
    X1_5,
    X2,
    X3,
}

/// Effect of one bet-plus tier: what it costs and how it skews the
/// base-game draw weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetPlusModifier {
    /// Total bet cost as a multiple of the base bet (debited by the driver).
    pub cost_multiple: f64,
    /// Multiplier applied to the scatter draw weight.
    pub scatter_weight_mult: f64,
    /// Multiplier applied to both wild draw weights.
    pub wild_weight_mult: f64,
}

/// Symbol draw weights for one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTable(BTreeMap<Symbol, f64>);

impl WeightTable {
    pub fn new(entries: impl IntoIterator<Item = (Symbol, f64)>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Weight for `symbol`, zero if absent.
    pub fn weight(&self, symbol: Symbol) -> f64 {
        self.0.get(&symbol).copied().unwrap_or(0.0)
    }

    /// Symbols carrying a weight, in canonical order.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn entries(&self) -> impl Iterator<Item = (Symbol, f64)> + '_ {
        self.0.iter().map(|(&s, &w)| (s, w))
    }
}

/// Denormalized weight table ready for repeated draws: symbols and weights
/// in canonical order, with any bet-plus skew already applied.
#[derive(Debug, Clone)]
pub struct DrawTable {
    symbols: Vec<Symbol>,
    weights: Vec<f64>,
}

impl DrawTable {
    fn from_table(table: &WeightTable, modifier: Option<&BetPlusModifier>) -> Self {
        let mut symbols = Vec::with_capacity(table.len());
        let mut weights = Vec::with_capacity(table.len());
        for (symbol, mut weight) in table.entries() {
            if let Some(m) = modifier {
                if symbol.is_scatter() {
                    weight *= m.scatter_weight_mult;
                }
                if symbol.is_wild() {
                    weight *= m.wild_weight_mult;
                }
            }
            symbols.push(symbol);
            weights.push(weight);
        }
        Self { symbols, weights }
    }

    /// Draw one symbol.
    pub fn draw(&self, rng: &mut SpinRng) -> Symbol {
        self.symbols[rng.weighted(&self.weights)]
    }
}

/// Cluster payout table: base-bet multiples by paying symbol and clamped
/// cluster size (5..=15).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paytable(BTreeMap<Symbol, [f64; 11]>);

impl Paytable {
    pub fn new(entries: impl IntoIterator<Item = (Symbol, [f64; 11])>) -> Self {
        Self(entries.into_iter().collect())
    }

    /// Payout multiple for a cluster of `size`, clamped to the 5..=15 band.
    /// Sub-minimum sizes and non-paying symbols pay nothing.
    pub fn payout(&self, symbol: Symbol, size: usize) -> f64 {
        if size < MIN_CLUSTER_SIZE {
            return 0.0;
        }
        let idx = size.min(MAX_PAY_SIZE) - MIN_CLUSTER_SIZE;
        self.0.get(&symbol).map(|row| row[idx]).unwrap_or(0.0)
    }

    fn row(&self, symbol: Symbol) -> Option<&[f64; 11]> {
        self.0.get(&symbol)
    }
}

/// Wild spawn type distribution. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WildSpawnWeights {
    pub wild: f64,
    pub explosivo: f64,
}

/// Free-spin award schedule for scatter triggers and retriggers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterAwards {
    /// Scatters needed to enter free spins from the base game.
    pub trigger_count: u8,
    /// Spins awarded at exactly `trigger_count` scatters.
    pub base_spins: u32,
    /// Extra spins per scatter beyond the trigger count.
    pub extra_per_scatter: u32,
    /// Scatters needed to retrigger inside free spins.
    pub retrigger_count: u8,
    /// Retrigger awards for 2, 3 and 4 scatters.
    pub retrigger_spins: [u32; 3],
    /// Extra retrigger spins per scatter beyond 4.
    pub retrigger_extra_per_scatter: u32,
}

impl ScatterAwards {
    /// Spins awarded when `scatters` trigger entry from the base game.
    pub fn initial_spins(&self, scatters: u8) -> u32 {
        if scatters < self.trigger_count {
            return 0;
        }
        self.base_spins + u32::from(scatters - self.trigger_count) * self.extra_per_scatter
    }

    /// Spins awarded by a retrigger at `scatters` scatters, zero below the
    /// retrigger threshold.
    pub fn retrigger_award(&self, scatters: u8) -> u32 {
        if scatters < self.retrigger_count {
            return 0;
        }
        let idx = usize::from(scatters - self.retrigger_count).min(2);
        let beyond = u32::from(scatters.saturating_sub(4));
        self.retrigger_spins[idx] + beyond * self.retrigger_extra_per_scatter
    }
}

/// Immutable game math snapshot consumed by the round engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// Draw weights in the base game.
    pub weights_base_game: WeightTable,
    /// Draw weights during free spins (wilds enriched).
    pub weights_free_spins: WeightTable,
    /// Cluster payout table.
    pub paytable: Paytable,
    /// Win cap as a multiple of the base bet.
    pub max_win_multiple: f64,
    /// Wild-type split for post-win spawning.
    pub wild_spawn_probabilities: WildSpawnWeights,
    /// Free-spin entry and retrigger schedule.
    pub scatter_awards: ScatterAwards,
    /// Base-game multiplier trail; also the table of free-spin base levels.
    pub multiplier_trail: [u32; 6],
    /// Ceiling for the enhanced free-spin trail.
    pub free_spins_multiplier_cap: u32,
    /// Explosivo wilds consumed per multiplier upgrade in free spins.
    pub ew_upgrade_threshold: u32,
    /// Bet-plus tiers offered with this math.
    pub bet_plus_modifiers: BTreeMap<BetPlus, BetPlusModifier>,
    /// Feature-buy price as a multiple of the base bet (debited externally).
    pub feature_buy_cost: f64,
    /// Published RTP targets, informational only.
    pub target_rtp_base: f64,
    pub target_rtp_feature_buy: f64,
}

impl GameConfig {
    /// The published game math.
    pub fn standard() -> Self {
        let weights_base_game = WeightTable::new([
            (Symbol::Lady, 3.0),
            (Symbol::Pink, 14.0),
            (Symbol::Green, 16.0),
            (Symbol::Blue, 18.0),
            (Symbol::Orange, 20.0),
            (Symbol::Cyan, 22.0),
            (Symbol::Wild, 12.0),
            (Symbol::ExplosivoWild, 8.0),
            (Symbol::Scatter, 7.0),
        ]);
        // Wilds enriched ×1.5 / ×2 over base; scatters thinned so the
        // two-scatter retrigger stays an event instead of the norm, and the
        // low pays rebalanced so the table total stays at 120.
        let weights_free_spins = WeightTable::new([
            (Symbol::Lady, 3.0),
            (Symbol::Pink, 13.0),
            (Symbol::Green, 14.0),
            (Symbol::Blue, 16.0),
            (Symbol::Orange, 18.0),
            (Symbol::Cyan, 20.0),
            (Symbol::Wild, 18.0),
            (Symbol::ExplosivoWild, 16.0),
            (Symbol::Scatter, 2.0),
        ]);

        let paytable = Paytable::new([
            (
                Symbol::Lady,
                [1.0, 1.5, 2.5, 5.0, 5.0, 7.5, 7.5, 25.0, 25.0, 25.0, 150.0],
            ),
            (
                Symbol::Pink,
                [0.5, 0.7, 1.0, 1.7, 1.7, 2.5, 2.5, 7.5, 7.5, 7.5, 50.0],
            ),
            (
                Symbol::Green,
                [0.4, 0.7, 0.8, 1.4, 1.4, 2.0, 2.0, 6.0, 6.0, 6.0, 40.0],
            ),
            (
                Symbol::Blue,
                [0.3, 0.5, 0.6, 1.0, 1.0, 1.5, 1.5, 5.0, 5.0, 5.0, 30.0],
            ),
            (
                Symbol::Orange,
                [0.3, 0.4, 0.5, 0.8, 0.8, 1.2, 1.2, 4.0, 4.0, 4.0, 25.0],
            ),
            (
                Symbol::Cyan,
                [0.2, 0.3, 0.4, 0.6, 0.6, 1.0, 1.0, 3.0, 3.0, 3.0, 20.0],
            ),
        ]);

        let bet_plus_modifiers = BTreeMap::from([
            (
                BetPlus::X1_5,
                BetPlusModifier {
                    cost_multiple: 1.5,
                    scatter_weight_mult: 2.0,
                    wild_weight_mult: 1.0,
                },
            ),
            (
                BetPlus::X2,
                BetPlusModifier {
                    cost_multiple: 2.0,
                    scatter_weight_mult: 1.0,
                    wild_weight_mult: 2.0,
                },
            ),
            (
                BetPlus::X3,
                BetPlusModifier {
                    cost_multiple: 3.0,
                    scatter_weight_mult: 2.0,
                    wild_weight_mult: 2.0,
                },
            ),
        ]);

        let config = Self {
            weights_base_game,
            weights_free_spins,
            paytable,
            max_win_multiple: 7500.0,
            wild_spawn_probabilities: WildSpawnWeights {
                wild: 0.5,
                explosivo: 0.5,
            },
            scatter_awards: ScatterAwards {
                trigger_count: 3,
                base_spins: 10,
                extra_per_scatter: 2,
                retrigger_count: 2,
                retrigger_spins: [3, 5, 7],
                retrigger_extra_per_scatter: 2,
            },
            multiplier_trail: [1, 2, 4, 8, 16, 32],
            free_spins_multiplier_cap: 1024,
            ew_upgrade_threshold: 3,
            bet_plus_modifiers,
            feature_buy_cost: 75.0,
            target_rtp_base: 94.22,
            target_rtp_feature_buy: 94.40,
        };
        debug_assert!(config.validate().is_ok());
        config
    }

    /// Validate the snapshot. Called by the import paths; custom builders
    /// must call it before handing the config to the engine.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base: Vec<Symbol> = self.weights_base_game.symbols().collect();
        let free: Vec<Symbol> = self.weights_free_spins.symbols().collect();
        if base != free {
            return Err(ConfigError::WeightSetMismatch);
        }

        for table in [&self.weights_base_game, &self.weights_free_spins] {
            for (symbol, weight) in table.entries() {
                if !DRAWABLE_SYMBOLS.contains(&symbol) {
                    return Err(ConfigError::UndrawableSymbol(symbol));
                }
                if !(weight > 0.0) {
                    return Err(ConfigError::NonPositiveWeight(symbol));
                }
            }
        }

        let spawn_sum =
            self.wild_spawn_probabilities.wild + self.wild_spawn_probabilities.explosivo;
        if (spawn_sum - 1.0).abs() > 1e-9 {
            return Err(ConfigError::SpawnProbabilitySum(spawn_sum));
        }

        for symbol in PAYING_SYMBOLS {
            let Some(row) = self.paytable.row(symbol) else {
                continue;
            };
            for i in 1..row.len() {
                if row[i] < row[i - 1] {
                    return Err(ConfigError::NonMonotonicPaytable {
                        symbol,
                        size: MIN_CLUSTER_SIZE + i - 1,
                    });
                }
            }
        }

        if let Some(lady) = self.paytable.row(Symbol::Lady) {
            for symbol in PAYING_SYMBOLS.into_iter().filter(|s| s.is_low_pay()) {
                if let Some(row) = self.paytable.row(symbol) {
                    for i in 0..row.len() {
                        if row[i] >= lady[i] {
                            return Err(ConfigError::HighPayNotDominant {
                                symbol,
                                size: MIN_CLUSTER_SIZE + i,
                            });
                        }
                    }
                }
            }
        }

        Ok(())
    }

    /// Draw table for `mode`, with `bet_plus` skew applied in the base game.
    pub fn draw_table(&self, mode: SpinMode, bet_plus: Option<BetPlus>) -> DrawTable {
        match mode {
            SpinMode::BaseGame => {
                let modifier = bet_plus.and_then(|tier| self.bet_plus_modifiers.get(&tier));
                DrawTable::from_table(&self.weights_base_game, modifier)
            }
            SpinMode::FreeSpins => DrawTable::from_table(&self.weights_free_spins, None),
        }
    }

    /// Free-spin multiplier base level for `level_index` (0..=5).
    pub fn base_level(&self, level_index: usize) -> u32 {
        self.multiplier_trail[level_index.min(self.multiplier_trail.len() - 1)]
    }

    /// Enhanced trail for a free-spin base level: six doublings of the base
    /// level, saturating at the configured cap.
    pub fn free_spins_trail(&self, level_index: usize) -> [u32; 6] {
        let base = self.base_level(level_index);
        let mut trail = [0u32; 6];
        for (i, slot) in trail.iter_mut().enumerate() {
            *slot = (base << i).min(self.free_spins_multiplier_cap);
        }
        trail
    }

    /// Export as pretty JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    /// Import from JSON, validating before returning.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_config_is_valid() {
        assert!(GameConfig::standard().validate().is_ok());
    }

    #[test]
    fn test_payout_clamps_size() {
        let config = GameConfig::standard();
        assert_eq!(config.paytable.payout(Symbol::Pink, 4), 0.0);
        assert_eq!(config.paytable.payout(Symbol::Pink, 5), 0.5);
        assert_eq!(config.paytable.payout(Symbol::Pink, 15), 50.0);
        assert_eq!(config.paytable.payout(Symbol::Pink, 23), 50.0);
        assert_eq!(config.paytable.payout(Symbol::Wild, 8), 0.0);
    }

    #[test]
    fn test_weight_set_mismatch_rejected() {
        let mut config = GameConfig::standard();
        config.weights_free_spins = WeightTable::new([(Symbol::Pink, 1.0)]);
        assert_eq!(config.validate(), Err(ConfigError::WeightSetMismatch));
    }

    #[test]
    fn test_non_positive_weight_rejected() {
        let mut config = GameConfig::standard();
        let mut entries: Vec<(Symbol, f64)> = config.weights_base_game.entries().collect();
        let mut fs_entries = entries.clone();
        entries[0].1 = 0.0;
        fs_entries[0].1 = 0.0;
        config.weights_base_game = WeightTable::new(entries);
        config.weights_free_spins = WeightTable::new(fs_entries);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonPositiveWeight(_))
        ));
    }

    #[test]
    fn test_spawn_probability_sum_rejected() {
        let mut config = GameConfig::standard();
        config.wild_spawn_probabilities = WildSpawnWeights {
            wild: 0.6,
            explosivo: 0.6,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SpawnProbabilitySum(_))
        ));
    }

    #[test]
    fn test_non_monotonic_paytable_rejected() {
        let mut config = GameConfig::standard();
        config.paytable = Paytable::new([
            (
                Symbol::Lady,
                [1.0, 1.5, 2.5, 5.0, 5.0, 7.5, 7.5, 25.0, 25.0, 25.0, 150.0],
            ),
            (
                Symbol::Pink,
                [0.5, 0.4, 1.0, 1.7, 1.7, 2.5, 2.5, 7.5, 7.5, 7.5, 50.0],
            ),
        ]);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonMonotonicPaytable {
                symbol: Symbol::Pink,
                size: 5
            })
        ));
    }

    #[test]
    fn test_scatter_awards() {
        let awards = GameConfig::standard().scatter_awards;
        assert_eq!(awards.initial_spins(2), 0);
        assert_eq!(awards.initial_spins(3), 10);
        assert_eq!(awards.initial_spins(4), 12);
        assert_eq!(awards.initial_spins(6), 16);
        assert_eq!(awards.retrigger_award(1), 0);
        assert_eq!(awards.retrigger_award(2), 3);
        assert_eq!(awards.retrigger_award(3), 5);
        assert_eq!(awards.retrigger_award(4), 7);
        assert_eq!(awards.retrigger_award(5), 9);
        assert_eq!(awards.retrigger_award(6), 11);
    }

    #[test]
    fn test_free_spins_trail_saturates() {
        let config = GameConfig::standard();
        assert_eq!(config.free_spins_trail(0), [1, 2, 4, 8, 16, 32]);
        assert_eq!(config.free_spins_trail(2), [4, 8, 16, 32, 64, 128]);
        assert_eq!(config.free_spins_trail(5), [32, 64, 128, 256, 512, 1024]);
    }

    #[test]
    fn test_json_round_trip() {
        let config = GameConfig::standard();
        let json = config.to_json();
        let restored = GameConfig::from_json(&json).unwrap();
        assert_eq!(config, restored);
    }

    #[test]
    fn test_bet_plus_skews_draw_weights() {
        let config = GameConfig::standard();
        let mut rng = SpinRng::new(3);
        // Smoke: boosted table still draws valid symbols.
        let table = config.draw_table(SpinMode::BaseGame, Some(BetPlus::X3));
        for _ in 0..100 {
            assert!(DRAWABLE_SYMBOLS.contains(&table.draw(&mut rng)));
        }
    }
}
