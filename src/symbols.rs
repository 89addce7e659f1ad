//! Symbol catalog and classification predicates

use serde::{Deserialize, Serialize};

/// All symbols that can occupy a grid cell.
///
/// The discriminant order is the canonical sort order used whenever clusters
/// or draw tables need a deterministic symbol ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Symbol {
    /// Unoccupied cell; only present transiently between removal and refill
    Empty = 0,
    /// Lady Calavera — the single high-pay symbol
    Lady = 1,
    Pink = 2,
    Green = 3,
    Blue = 4,
    Orange = 5,
    Cyan = 6,
    /// Regular wild — substitutes for every paying symbol
    Wild = 7,
    /// Explosivo wild — substitutes like a wild and detonates a 3×3 area
    ExplosivoWild = 8,
    /// Scatter — triggers free spins, never part of a cluster
    Scatter = 9,
}

/// Paying symbols in canonical order (high pay first).
pub const PAYING_SYMBOLS: [Symbol; 6] = [
    Symbol::Lady,
    Symbol::Pink,
    Symbol::Green,
    Symbol::Blue,
    Symbol::Orange,
    Symbol::Cyan,
];

/// Every symbol a refill can produce, in canonical order.
pub const DRAWABLE_SYMBOLS: [Symbol; 9] = [
    Symbol::Lady,
    Symbol::Pink,
    Symbol::Green,
    Symbol::Blue,
    Symbol::Orange,
    Symbol::Cyan,
    Symbol::Wild,
    Symbol::ExplosivoWild,
    Symbol::Scatter,
];

impl Symbol {
    /// Cell holds no symbol.
    pub fn is_empty(self) -> bool {
        self == Symbol::Empty
    }

    /// High-pay symbol (survives explosions).
    pub fn is_high_pay(self) -> bool {
        self == Symbol::Lady
    }

    /// Low-pay symbol (the only kind an explosion destroys).
    pub fn is_low_pay(self) -> bool {
        matches!(
            self,
            Symbol::Pink | Symbol::Green | Symbol::Blue | Symbol::Orange | Symbol::Cyan
        )
    }

    /// Any symbol that can anchor a cluster payout.
    pub fn is_paying(self) -> bool {
        self.is_high_pay() || self.is_low_pay()
    }

    /// Either wild variant.
    pub fn is_wild(self) -> bool {
        matches!(self, Symbol::Wild | Symbol::ExplosivoWild)
    }

    /// Explosivo wild specifically.
    pub fn is_explosivo_wild(self) -> bool {
        self == Symbol::ExplosivoWild
    }

    pub fn is_scatter(self) -> bool {
        self == Symbol::Scatter
    }

    /// Explosions destroy low-pay symbols only.
    pub fn destructible_by_explosion(self) -> bool {
        self.is_low_pay()
    }

    /// Three-character label used by the grid renderer.
    pub fn display_code(self) -> &'static str {
        match self {
            Symbol::Empty => "   ",
            Symbol::Lady => "LDY",
            Symbol::Pink => "PNK",
            Symbol::Green => "GRN",
            Symbol::Blue => "BLU",
            Symbol::Orange => "ORG",
            Symbol::Cyan => "CYN",
            Symbol::Wild => "WLD",
            Symbol::ExplosivoWild => "EW ",
            Symbol::Scatter => "SCR",
        }
    }
}

/// Whether two adjacent cells can sit in the same cluster.
///
/// Same-kind paying symbols match; wilds match paying symbols and each
/// other; scatters and empty cells match nothing.
pub fn symbols_match_for_cluster(a: Symbol, b: Symbol) -> bool {
    if a.is_empty() || b.is_empty() || a.is_scatter() || b.is_scatter() {
        return false;
    }
    if a.is_wild() || b.is_wild() {
        return true;
    }
    a == b
}
