//! 5×5 game grid: weighted refill, gravity, removal and queries

use serde::{Deserialize, Serialize};

use crate::config::DrawTable;
use crate::rng::SpinRng;
use crate::symbols::Symbol;

/// Grid height. Row 0 is the top; gravity pulls toward higher rows.
pub const ROWS: usize = 5;
/// Grid width.
pub const COLS: usize = 5;
/// Total cell count.
pub const CELLS: usize = ROWS * COLS;

/// A `(row, col)` cell address. Tuple ordering is row-major, which is the
/// deterministic iteration order used throughout the engine.
pub type Position = (usize, usize);

/// The 5×5 playfield.
///
/// Every cell always holds exactly one [`Symbol`]; `Empty` only appears
/// between a removal and the refill that follows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    cells: [Symbol; CELLS],
}

fn index(pos: Position) -> usize {
    debug_assert!(pos.0 < ROWS && pos.1 < COLS, "position out of bounds");
    pos.0 * COLS + pos.1
}

impl Grid {
    /// An all-empty grid, the state before a round's opening drop.
    pub fn new() -> Self {
        Self {
            cells: [Symbol::Empty; CELLS],
        }
    }

    pub fn symbol_at(&self, pos: Position) -> Symbol {
        self.cells[index(pos)]
    }

    pub fn set_symbol(&mut self, pos: Position, symbol: Symbol) {
        self.cells[index(pos)] = symbol;
    }

    pub fn is_empty(&self, pos: Position) -> bool {
        self.symbol_at(pos).is_empty()
    }

    /// Replace every empty cell with a fresh draw.
    ///
    /// Cells fill in row-major order (top row first, left to right), which
    /// fixes the RNG draw that lands in each cell. Returns how many cells
    /// were filled.
    pub fn refill(&mut self, table: &DrawTable, rng: &mut SpinRng) -> usize {
        let mut filled = 0;
        for row in 0..ROWS {
            for col in 0..COLS {
                if self.is_empty((row, col)) {
                    self.set_symbol((row, col), table.draw(rng));
                    filled += 1;
                }
            }
        }
        log::debug!("refilled {filled} cells");
        filled
    }

    /// Compact each column downward, preserving top-to-bottom symbol order.
    ///
    /// Returns the `(from, to)` moves performed so trackers holding cell
    /// addresses can follow their symbols. Symbols never change column.
    pub fn apply_gravity(&mut self) -> Vec<(Position, Position)> {
        let mut moves = Vec::new();
        for col in 0..COLS {
            // Walk bottom-up, sliding each symbol onto the lowest free row.
            let mut target = ROWS;
            for row in (0..ROWS).rev() {
                if !self.is_empty((row, col)) {
                    target -= 1;
                    if target != row {
                        let symbol = self.symbol_at((row, col));
                        self.set_symbol((target, col), symbol);
                        self.set_symbol((row, col), Symbol::Empty);
                        moves.push(((row, col), (target, col)));
                    }
                }
            }
        }
        moves
    }

    /// Clear the listed cells.
    pub fn remove(&mut self, positions: &[Position]) {
        for &pos in positions {
            self.set_symbol(pos, Symbol::Empty);
        }
    }

    /// Number of cells holding `symbol`.
    pub fn count(&self, symbol: Symbol) -> usize {
        self.cells.iter().filter(|&&s| s == symbol).count()
    }

    /// Cells holding `symbol`, in row-major order.
    pub fn positions_of(&self, symbol: Symbol) -> Vec<Position> {
        self.cells_matching(|s| s == symbol)
    }

    /// Cells whose symbol satisfies `predicate`, in row-major order.
    pub fn cells_matching(&self, predicate: impl Fn(Symbol) -> bool) -> Vec<Position> {
        let mut positions = Vec::new();
        for row in 0..ROWS {
            for col in 0..COLS {
                if predicate(self.symbol_at((row, col))) {
                    positions.push((row, col));
                }
            }
        }
        positions
    }

    /// One column, top to bottom.
    pub fn column(&self, col: usize) -> [Symbol; ROWS] {
        let mut out = [Symbol::Empty; ROWS];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = self.symbol_at((row, col));
        }
        out
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "┌─────{}┐", "┬─────".repeat(COLS - 1))?;
        for row in 0..ROWS {
            for col in 0..COLS {
                write!(f, "│ {} ", self.symbol_at((row, col)).display_code())?;
            }
            writeln!(f, "│")?;
            if row < ROWS - 1 {
                writeln!(f, "├─────{}┤", "┼─────".repeat(COLS - 1))?;
            }
        }
        write!(f, "└─────{}┘", "┴─────".repeat(COLS - 1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, SpinMode};

    fn full_refill() -> Grid {
        let config = GameConfig::standard();
        let table = config.draw_table(SpinMode::BaseGame, None);
        let mut rng = SpinRng::new(1234);
        let mut grid = Grid::new();
        grid.refill(&table, &mut rng);
        grid
    }

    #[test]
    fn test_refill_leaves_no_empty_cells() {
        let grid = full_refill();
        assert_eq!(grid.count(Symbol::Empty), 0);
    }

    #[test]
    fn test_refill_only_touches_empty_cells() {
        let config = GameConfig::standard();
        let table = config.draw_table(SpinMode::BaseGame, None);
        let mut rng = SpinRng::new(99);
        let mut grid = Grid::new();
        grid.refill(&table, &mut rng);
        let before = grid.clone();
        grid.remove(&[(0, 0), (4, 4)]);
        let filled = grid.refill(&table, &mut rng);
        assert_eq!(filled, 2);
        for row in 0..ROWS {
            for col in 0..COLS {
                if (row, col) != (0, 0) && (row, col) != (4, 4) {
                    assert_eq!(grid.symbol_at((row, col)), before.symbol_at((row, col)));
                }
            }
        }
    }

    #[test]
    fn test_gravity_compacts_and_preserves_order() {
        let mut grid = Grid::new();
        grid.set_symbol((0, 2), Symbol::Lady);
        grid.set_symbol((2, 2), Symbol::Pink);
        grid.set_symbol((4, 2), Symbol::Blue);

        let moves = grid.apply_gravity();

        assert_eq!(grid.symbol_at((2, 2)), Symbol::Lady);
        assert_eq!(grid.symbol_at((3, 2)), Symbol::Pink);
        assert_eq!(grid.symbol_at((4, 2)), Symbol::Blue);
        assert_eq!(grid.symbol_at((0, 2)), Symbol::Empty);
        assert_eq!(grid.symbol_at((1, 2)), Symbol::Empty);
        assert!(moves.contains(&((0, 2), (2, 2))));
        assert!(moves.contains(&((2, 2), (3, 2))));
        assert!(!moves.iter().any(|&(from, _)| from == (4, 2)));
    }

    #[test]
    fn test_gravity_preserves_column_multisets() {
        let mut grid = full_refill();
        grid.remove(&[(1, 0), (3, 0), (2, 3), (0, 4), (4, 4)]);

        let mut before: Vec<Vec<Symbol>> = Vec::new();
        for col in 0..COLS {
            let mut symbols: Vec<Symbol> = grid
                .column(col)
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect();
            symbols.sort();
            before.push(symbols);
        }

        grid.apply_gravity();

        for col in 0..COLS {
            let mut symbols: Vec<Symbol> = grid
                .column(col)
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect();
            symbols.sort();
            assert_eq!(symbols, before[col]);
            // After gravity every empty cell sits above every symbol.
            let column = grid.column(col);
            let first_symbol = column.iter().position(|s| !s.is_empty()).unwrap_or(ROWS);
            assert!(column[first_symbol..].iter().all(|s| !s.is_empty()));
        }
    }

    #[test]
    fn test_queries() {
        let mut grid = Grid::new();
        grid.set_symbol((1, 1), Symbol::Scatter);
        grid.set_symbol((3, 2), Symbol::Scatter);
        assert_eq!(grid.count(Symbol::Scatter), 2);
        assert_eq!(grid.positions_of(Symbol::Scatter), vec![(1, 1), (3, 2)]);
        assert_eq!(grid.cells_matching(|s| s.is_scatter()).len(), 2);
    }

    #[test]
    fn test_display_renders_board() {
        let grid = Grid::new();
        let text = grid.to_string();
        assert!(text.contains('┌'));
        assert_eq!(text.lines().count(), 2 * ROWS + 1);
    }
}
