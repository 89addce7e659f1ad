//! Cross-round session statistics

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;
use crate::engine::{RoundMode, RoundOptions, RoundResult};

/// Accumulates outcomes across rounds for RTP and hit-rate tracking.
///
/// The engine itself never mutates these; batch drivers feed each
/// [`RoundResult`] through [`SessionStats::record`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    pub rounds: u64,
    /// Total amount staked, bet-plus and feature-buy costs included.
    pub total_bet: f64,
    pub total_win: f64,
    pub wins: u64,
    pub losses: u64,
    pub free_spin_sessions: u64,
    pub feature_buys: u64,
    pub retriggers: u64,
    pub max_wins: u64,
    /// Largest single-round win as a multiple of its base bet.
    pub best_win_ratio: f64,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one round into the totals.
    pub fn record(&mut self, config: &GameConfig, options: &RoundOptions, result: &RoundResult) {
        let cost_multiple = match options.mode {
            RoundMode::FeatureBuy => config.feature_buy_cost,
            RoundMode::BaseGame => options
                .bet_plus
                .and_then(|tier| config.bet_plus_modifiers.get(&tier))
                .map(|m| m.cost_multiple)
                .unwrap_or(1.0),
        };

        self.rounds += 1;
        self.total_bet += options.base_bet * cost_multiple;
        self.total_win += result.total_win;

        if result.total_win > 0.0 {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        if let Some(session) = &result.free_spins {
            self.free_spin_sessions += 1;
            self.retriggers += u64::from(session.retriggers);
        }
        if options.mode == RoundMode::FeatureBuy {
            self.feature_buys += 1;
        }
        if result.max_win_hit {
            self.max_wins += 1;
        }

        let ratio = result.total_win / options.base_bet;
        if ratio > self.best_win_ratio {
            self.best_win_ratio = ratio;
        }
    }

    /// Return to player, percent.
    pub fn rtp(&self) -> f64 {
        if self.total_bet > 0.0 {
            (self.total_win / self.total_bet) * 100.0
        } else {
            0.0
        }
    }

    /// Share of rounds that paid anything, percent.
    pub fn hit_rate(&self) -> f64 {
        if self.rounds > 0 {
            (self.wins as f64 / self.rounds as f64) * 100.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::play_round;
    use crate::rng::SpinRng;

    #[test]
    fn test_stats_accumulate() {
        let config = GameConfig::standard();
        let options = RoundOptions::base_game(1.0);
        let mut stats = SessionStats::new();

        for seed in 0..50u64 {
            let mut rng = SpinRng::new(seed);
            let result = play_round(&config, &mut rng, &options).unwrap();
            stats.record(&config, &options, &result);
        }

        assert_eq!(stats.rounds, 50);
        assert_eq!(stats.wins + stats.losses, 50);
        assert_eq!(stats.total_bet, 50.0);
        assert!(stats.rtp() >= 0.0);
        assert!(stats.hit_rate() <= 100.0);
    }

    #[test]
    fn test_feature_buy_costs_buy_price() {
        let config = GameConfig::standard();
        let options = RoundOptions::feature_buy(2.0);
        let mut stats = SessionStats::new();
        let mut rng = SpinRng::new(8);
        let result = play_round(&config, &mut rng, &options).unwrap();
        stats.record(&config, &options, &result);

        assert_eq!(stats.feature_buys, 1);
        assert_eq!(stats.total_bet, 2.0 * config.feature_buy_cost);
        assert_eq!(stats.free_spin_sessions, 1);
    }
}
