//! Free spins session
//!
//! The feature plays the same cascade loop as the base game, but with the
//! enriched free-spins weight table and a persistent per-session ledger:
//! every third explosivo wild collected banks one *upgrade*. Upgrades apply
//! at the start of the next spin, never mid-spin; each raises the session's
//! multiplier base level one step and adds one spin. The
//! spin's trail is the base level doubled five times, capped at 1024.
//! Scatters retrigger from two symbols up, with no retrigger cap.

use serde::{Deserialize, Serialize};

use crate::config::{GameConfig, SpinMode};
use crate::engine::{run_spin, CascadeContext, SpinOutcome};
use crate::rng::SpinRng;

/// Live session ledger.
///
/// `ew_collected_total` only ever grows; the upgrade ledger consumes from
/// the separate `ew_bank`, so the totals always satisfy
/// `ew_collected_total == threshold * upgrades_granted + ew_bank`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinsState {
    pub spins_remaining: u32,
    /// Index into the base-level table (0..=5).
    pub base_level_index: usize,
    /// Explosivo wilds collected across the whole session.
    pub ew_collected_total: u32,
    /// Collected wilds not yet converted into an upgrade (0..threshold).
    pub ew_bank: u32,
    /// Upgrades earned but not yet applied; applied at the next spin start.
    pub pending_upgrades: u32,
    /// Feature win so far, excluding base-game carryover.
    pub session_win: f64,
    /// Final trail index of the most recent spin.
    pub trail_position: usize,
}

/// A retrigger that landed during one free spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetriggerAward {
    pub scatters: u8,
    pub extra_spins: u32,
}

/// Per-spin record within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinSummary {
    /// 1-based spin number.
    pub index: u32,
    /// Multiplier base level the spin played at.
    pub base_level: u32,
    /// Upgrades applied at this spin's start.
    pub upgrades_applied: u32,
    pub win: f64,
    pub ew_collected: u32,
    pub retrigger: Option<RetriggerAward>,
    pub cascade_steps: u32,
}

/// Complete outcome of one free-spins session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeSpinsResult {
    /// Scatter count that opened the session, `None` for a feature buy.
    pub entry_scatters: Option<u8>,
    /// Spins awarded at entry.
    pub initial_spins: u32,
    pub spins_played: u32,
    pub retriggers: u32,
    /// Upgrades actually applied across the session.
    pub upgrades_applied: u32,
    /// Base level in force when the session ended.
    pub final_base_level: u32,
    /// Feature win, excluding base-game carryover.
    pub session_win: f64,
    pub ew_collected_total: u32,
    pub max_win_hit: bool,
    pub spins: Vec<FreeSpinSummary>,
}

/// How the session was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionEntry {
    ScatterTrigger(u8),
    FeatureBuy,
}

/// Bank collected wilds into pending upgrades. Returns how many upgrades
/// were banked.
fn bank_upgrades(state: &mut FreeSpinsState, threshold: u32) -> u32 {
    let mut banked = 0;
    while state.ew_bank >= threshold {
        state.ew_bank -= threshold;
        state.pending_upgrades += 1;
        banked += 1;
    }
    banked
}

/// Apply pending upgrades at a spin boundary: each raises the base level
/// one step (saturating) and adds one spin. Returns how many were applied.
fn apply_pending_upgrades(state: &mut FreeSpinsState, max_level_index: usize) -> u32 {
    let applied = state.pending_upgrades;
    for _ in 0..applied {
        state.base_level_index = (state.base_level_index + 1).min(max_level_index);
        state.spins_remaining += 1;
    }
    state.pending_upgrades = 0;
    applied
}

/// Run a full session. `carry_in` is the base-game win already counted
/// toward the max-win cap.
pub(crate) fn run_session(
    config: &GameConfig,
    rng: &mut SpinRng,
    bet: f64,
    carry_in: f64,
    entry: SessionEntry,
) -> FreeSpinsResult {
    run_session_with(config, rng, bet, carry_in, entry, run_spin)
}

/// Session loop with the spin runner injected. Production passes
/// [`run_spin`]; tests drive the same loop with scripted outcomes.
fn run_session_with<F>(
    config: &GameConfig,
    rng: &mut SpinRng,
    bet: f64,
    carry_in: f64,
    entry: SessionEntry,
    mut spin: F,
) -> FreeSpinsResult
where
    F: FnMut(&GameConfig, &mut SpinRng, CascadeContext<'_>) -> SpinOutcome,
{
    let (entry_scatters, initial_spins) = match entry {
        SessionEntry::ScatterTrigger(scatters) => (
            Some(scatters),
            config.scatter_awards.initial_spins(scatters),
        ),
        SessionEntry::FeatureBuy => (None, config.scatter_awards.base_spins),
    };

    let mut state = FreeSpinsState {
        spins_remaining: initial_spins,
        base_level_index: 0,
        ew_collected_total: 0,
        ew_bank: 0,
        pending_upgrades: 0,
        session_win: 0.0,
        trail_position: 0,
    };

    let draw = config.draw_table(SpinMode::FreeSpins, None);
    let cap_units = config.max_win_multiple * bet;
    let max_level_index = config.multiplier_trail.len() - 1;

    let mut spins: Vec<FreeSpinSummary> = Vec::new();
    let mut retriggers = 0u32;
    let mut upgrades_applied_total = 0u32;
    let mut max_win_hit = false;

    // Upgrades banked on the final spin still grant their extra spin, so
    // the loop also re-enters on pending upgrades alone.
    while (state.spins_remaining > 0 || state.pending_upgrades > 0) && !max_win_hit {
        let upgrades_applied = apply_pending_upgrades(&mut state, max_level_index);
        upgrades_applied_total += upgrades_applied;
        if upgrades_applied > 0 {
            log::info!(
                "applied {upgrades_applied} multiplier upgrades, base level now {}x",
                config.base_level(state.base_level_index)
            );
        }

        let trail = config.free_spins_trail(state.base_level_index);
        state.trail_position = 0;

        let ctx = CascadeContext {
            draw: &draw,
            trail: &trail,
            bet,
            cap_units,
            carry_in: carry_in + state.session_win,
            scatter_trigger: config.scatter_awards.retrigger_count,
            force_opening_ew: false,
            opening_grid: None,
        };
        let outcome = spin(config, rng, ctx);

        state.session_win += outcome.win;
        state.ew_collected_total += outcome.ew_collected;
        state.ew_bank += outcome.ew_collected;
        state.trail_position = outcome
            .multiplier_progression
            .len()
            .min(max_level_index);
        bank_upgrades(&mut state, config.ew_upgrade_threshold);

        let retrigger = outcome.scatter_latch.map(|scatters| {
            let extra_spins = config.scatter_awards.retrigger_award(scatters);
            state.spins_remaining += extra_spins;
            retriggers += 1;
            log::info!("retrigger: {scatters} scatters award {extra_spins} extra spins");
            RetriggerAward {
                scatters,
                extra_spins,
            }
        });

        if outcome.max_win_hit {
            max_win_hit = true;
            // Max win cancels everything still pending.
            state.pending_upgrades = 0;
        }

        spins.push(FreeSpinSummary {
            index: spins.len() as u32 + 1,
            base_level: config.base_level(state.base_level_index),
            upgrades_applied,
            win: outcome.win,
            ew_collected: outcome.ew_collected,
            retrigger,
            cascade_steps: outcome.steps.len() as u32,
        });

        state.spins_remaining -= 1;
    }

    FreeSpinsResult {
        entry_scatters,
        initial_spins,
        spins_played: spins.len() as u32,
        retriggers,
        upgrades_applied: upgrades_applied_total,
        final_base_level: config.base_level(state.base_level_index),
        session_win: state.session_win,
        ew_collected_total: state.ew_collected_total,
        max_win_hit,
        spins,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> FreeSpinsState {
        FreeSpinsState {
            spins_remaining: 10,
            base_level_index: 0,
            ew_collected_total: 0,
            ew_bank: 0,
            pending_upgrades: 0,
            session_win: 0.0,
            trail_position: 0,
        }
    }

    #[test]
    fn test_bank_converts_three_wilds_per_upgrade() {
        let mut s = state();
        s.ew_collected_total = 7;
        s.ew_bank = 7;
        let banked = bank_upgrades(&mut s, 3);
        assert_eq!(banked, 2);
        assert_eq!(s.pending_upgrades, 2);
        assert_eq!(s.ew_bank, 1);
        // The running total is untouched by banking.
        assert_eq!(s.ew_collected_total, 7);
    }

    #[test]
    fn test_upgrades_apply_at_spin_start() {
        let mut s = state();
        s.pending_upgrades = 2;
        let applied = apply_pending_upgrades(&mut s, 5);
        assert_eq!(applied, 2);
        assert_eq!(s.base_level_index, 2);
        assert_eq!(s.spins_remaining, 12);
        assert_eq!(s.pending_upgrades, 0);
    }

    #[test]
    fn test_base_level_saturates_at_top() {
        let mut s = state();
        s.base_level_index = 4;
        s.pending_upgrades = 4;
        apply_pending_upgrades(&mut s, 5);
        assert_eq!(s.base_level_index, 5);
        // Extra spins are still granted even past the level cap.
        assert_eq!(s.spins_remaining, 14);
    }

    #[test]
    fn test_session_runs_and_keeps_ledger_consistent() {
        let config = crate::config::GameConfig::standard();
        for seed in 0..20u64 {
            let mut rng = SpinRng::new(seed);
            let result = run_session(&config, &mut rng, 1.0, 0.0, SessionEntry::FeatureBuy);

            assert!(result.spins_played >= 1);
            assert_eq!(result.initial_spins, 10);
            assert!(result.entry_scatters.is_none());
            // Upgrade ledger: total = 3 * upgrades_granted + remainder. The
            // granted count is what was applied plus anything cancelled at
            // max win or left pending at session end.
            let granted = result.ew_collected_total / config.ew_upgrade_threshold;
            assert!(result.upgrades_applied <= granted);
            if !result.max_win_hit {
                // Without a max-win cut, every spin ran; spins played covers
                // the initial award, upgrades and retriggers.
                let expected: u32 = result.initial_spins
                    + result.upgrades_applied
                    + result
                        .spins
                        .iter()
                        .filter_map(|s| s.retrigger.map(|r| r.extra_spins))
                        .sum::<u32>();
                assert_eq!(result.spins_played, expected);
            }
            // Effective multiplier can never leave the configured range.
            assert!(result.final_base_level <= 32);
            assert!(result.session_win <= config.max_win_multiple);
        }
    }

    #[test]
    fn test_scatter_entry_awards() {
        let config = crate::config::GameConfig::standard();
        let mut rng = SpinRng::new(3);
        let result = run_session(&config, &mut rng, 1.0, 0.0, SessionEntry::ScatterTrigger(4));
        assert_eq!(result.entry_scatters, Some(4));
        assert_eq!(result.initial_spins, 12);
    }

    fn scripted_outcome(ew_collected: u32, scatter_latch: Option<u8>) -> SpinOutcome {
        SpinOutcome {
            win: 0.0,
            steps: Vec::new(),
            multiplier_progression: Vec::new(),
            scatter_latch,
            ew_collected,
            max_win_hit: false,
        }
    }

    /// A three-scatter session collects six explosivo wilds on its second
    /// spin and retriggers with three scatters on its third, all settled
    /// at spin boundaries: two upgrades move the base level from 1× to 4×
    /// at the start of spin three, the retrigger adds five spins, and each
    /// upgrade adds one.
    #[test]
    fn test_upgrade_and_retrigger_settle_at_spin_boundaries() {
        let config = crate::config::GameConfig::standard();
        let mut rng = SpinRng::new(0);
        let mut trail_bases: Vec<u32> = Vec::new();
        let mut spin_no = 0usize;

        let result = run_session_with(
            &config,
            &mut rng,
            1.0,
            0.0,
            SessionEntry::ScatterTrigger(3),
            |_config: &GameConfig, _rng: &mut SpinRng, ctx: CascadeContext<'_>| {
                trail_bases.push(ctx.trail[0]);
                spin_no += 1;
                match spin_no {
                    2 => scripted_outcome(6, None),
                    3 => scripted_outcome(0, Some(3)),
                    _ => scripted_outcome(0, None),
                }
            },
        );

        // Three scatters opened with ten spins; two upgrades and a
        // five-spin retrigger stretch the session to seventeen.
        assert_eq!(result.initial_spins, 10);
        assert_eq!(result.spins_played, 17);
        assert_eq!(result.ew_collected_total, 6);
        assert_eq!(result.upgrades_applied, 2);
        assert_eq!(result.retriggers, 1);
        assert_eq!(result.final_base_level, 4);
        assert!(!result.max_win_hit);

        // The collecting spin still played at 1×; both upgrades landed
        // together at the next spin start.
        assert_eq!(result.spins[1].base_level, 1);
        assert_eq!(result.spins[1].upgrades_applied, 0);
        assert_eq!(result.spins[1].ew_collected, 6);
        assert_eq!(result.spins[2].upgrades_applied, 2);
        assert_eq!(result.spins[2].base_level, 4);
        assert_eq!(
            result.spins[2].retrigger,
            Some(RetriggerAward {
                scatters: 3,
                extra_spins: 5
            })
        );

        // The trail handed to each spin follows the same boundaries: 1×
        // until the upgrades apply, 4× from spin three on.
        assert_eq!(trail_bases.len(), 17);
        assert_eq!(&trail_bases[..3], &[1, 1, 4]);
        assert!(trail_bases[3..].iter().all(|&base| base == 4));
    }
}
