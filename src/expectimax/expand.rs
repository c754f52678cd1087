//! Child generation for both node kinds.

use crate::engine::{Board, Cell, Move, MoveOption};

/// Spawned tile values and their probabilities.
pub const TILE_ODDS: [(u32, f64); 2] = [(2, 0.9), (4, 0.1)];

/// Legal moves in the order the decision layer explores them.
///
/// The base order Up, Down, Left, Right gets a single adjacent swap that
/// pushes Down one slot later, approximating Up-Left-Down-Right. Trying the
/// usually stronger moves first lets the early exit trigger sooner.
pub fn preferred_moves(board: &Board) -> Vec<MoveOption> {
    let mut moves = board.available_moves();
    demote_down(&mut moves, |opt| opt.dir);
    moves
}

/// Swap the first `Down` with its successor, if it has one.
pub(crate) fn demote_down<T>(seq: &mut [T], dir: impl Fn(&T) -> Move) {
    if let Some(i) = seq.iter().position(|item| dir(item) == Move::Down) {
        if i + 1 < seq.len() {
            seq.swap(i, i + 1);
        }
    }
}

/// One possible tile placement at a chance node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChanceOutcome {
    pub cell: Cell,
    pub value: u32,
    /// `p(value) / empty_cells`
    pub weight: f64,
}

/// Every (cell, value) placement on `board`, all 2s first, then all 4s.
///
/// Weights sum to 1 whenever the board has an empty cell; a full board
/// yields no outcomes.
pub fn chance_outcomes(board: &Board) -> Vec<ChanceOutcome> {
    let cells = board.available_cells();
    if cells.is_empty() {
        return Vec::new();
    }
    let uniform = 1.0 / cells.len() as f64;
    TILE_ODDS
        .iter()
        .flat_map(|&(value, p)| {
            cells.iter().map(move |&cell| ChanceOutcome { cell, value, weight: uniform * p })
        })
        .collect()
}
