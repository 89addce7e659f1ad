//! Bonus features layered on top of the base cascade loop

pub mod free_spins;

pub use free_spins::{FreeSpinSummary, FreeSpinsResult, FreeSpinsState, RetriggerAward};
