//! Positional heuristic used at the depth cutoff.
//!
//! Five terms are gathered over every cell and its in-bounds axis neighbours:
//! open cells, merge potential, roughness, a directional monotonicity
//! penalty and tile magnitude. The weights were tuned empirically and are
//! kept as-is, including the asymmetric parts.

use crate::engine::Board;

const OPEN_WEIGHT: f64 = 2.0;
const ROUGHNESS_WEIGHT: f64 = 2.0;
// Empirical normalisation, not the 2x double counting.
const ROUGHNESS_DIVISOR: f64 = 3.0;
const MAGNITUDE_BASE: f64 = 1.01;
// 1.01^v overflows f64 from v ~ 71_300; keep the sum far enough below f64::MAX
// that chance-node weighted sums stay finite too.
const MAGNITUDE_CAP: f64 = f64::MAX / 64.0;

/// Raw heuristic terms of a board, already normalised.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HeuristicTerms {
    /// Number of empty cells.
    pub open: f64,
    /// Sum of log2(value) over equal adjacent pairs, each adjacency counted once.
    pub merges: f64,
    /// Sum of log2(|a - b|) over differing neighbours, divided by 3.
    pub roughness: f64,
    /// Sum of log2(n - v) where the down or right neighbour n exceeds v.
    pub monotonicity: f64,
    /// Sum of 1.01^value over tiles, saturating well below `f64::MAX`.
    pub magnitude: f64,
}

impl HeuristicTerms {
    pub fn of(board: &Board) -> Self {
        let size = board.size();
        let mut terms = HeuristicTerms::default();
        let mut merges = 0.0;
        let mut roughness = 0.0;

        for (idx, &cur) in board.cells().iter().enumerate() {
            let (row, col) = (idx / size, idx % size);
            let down = board.cell(row + 1, col);
            let up = row.checked_sub(1).and_then(|r| board.cell(r, col));
            let right = board.cell(row, col + 1);
            let left = col.checked_sub(1).and_then(|c| board.cell(row, c));

            if cur == 0 {
                terms.open += 1.0;
            } else {
                terms.magnitude = (terms.magnitude + MAGNITUDE_BASE.powf(cur as f64)).min(MAGNITUDE_CAP);
            }

            // Only larger tiles below or to the right are penalised; up/left
            // are never checked. Unclear whether that was intended, kept as tuned.
            for n in [down, right].into_iter().flatten() {
                if n > cur {
                    terms.monotonicity += ((n - cur) as f64).log2();
                }
            }

            for n in [down, up, right, left].into_iter().flatten() {
                if n == cur && cur != 0 {
                    merges += (cur as f64).log2();
                }
                let diff = n.abs_diff(cur);
                if diff != 0 {
                    roughness += (diff as f64).log2();
                }
            }
        }

        // each adjacency was seen from both ends
        terms.merges = merges / 2.0;
        terms.roughness = roughness / ROUGHNESS_DIVISOR;
        terms
    }

    /// Rewarded part: `2*open + merges + magnitude`.
    #[inline]
    pub fn dividends(&self) -> f64 { OPEN_WEIGHT * self.open + self.merges + self.magnitude }

    /// Penalised part: `2*roughness + monotonicity`.
    #[inline]
    pub fn penalties(&self) -> f64 { ROUGHNESS_WEIGHT * self.roughness + self.monotonicity }

    #[inline]
    pub fn score(&self) -> f64 { self.dividends() - self.penalties() }
}

/// Utility of a board for the player; larger is better.
///
/// ```
/// use ai_2048_agent::engine::Board;
/// use ai_2048_agent::expectimax::heuristic;
/// let b = Board::from_rows(&[[2, 2], [0, 0]]).unwrap();
/// assert!((heuristic::score(&b) - 4.3735).abs() < 1e-3);
/// ```
#[inline]
pub fn score(board: &Board) -> f64 { HeuristicTerms::of(board).score() }

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-3;

    #[test]
    fn worked_two_by_two_example() {
        let b = Board::from_rows(&[[2, 2], [0, 0]]).unwrap();
        let t = HeuristicTerms::of(&b);
        assert_eq!(t.open, 2.0);
        assert!((t.merges - 1.0).abs() < EPS);
        assert!((t.roughness - 4.0 / 3.0).abs() < EPS);
        assert_eq!(t.monotonicity, 0.0);
        assert!((t.magnitude - 2.0402).abs() < EPS);
        assert!((t.dividends() - 7.0402).abs() < EPS);
        assert!((t.penalties() - 8.0 / 3.0).abs() < EPS);
        assert!((score(&b) - 4.3735).abs() < EPS);
    }

    #[test]
    fn empty_board_scores_open_cells_only() {
        let t = HeuristicTerms::of(&Board::new(4));
        assert_eq!(t, HeuristicTerms { open: 16.0, ..Default::default() });
        assert_eq!(score(&Board::new(4)), 32.0);
    }

    #[test]
    fn score_is_pure() {
        let b = Board::from_rows(&[[2, 4, 8, 16], [0, 2, 0, 4], [128, 0, 0, 2], [2, 2, 4, 0]]).unwrap();
        let copy = b.clone();
        assert_eq!(score(&b).to_bits(), score(&copy).to_bits());
        assert_eq!(score(&b).to_bits(), score(&b).to_bits());
    }

    #[test]
    fn monotonicity_checks_down_and_right_only() {
        let rising = Board::from_rows(&[[2, 8], [0, 0]]).unwrap();
        assert!((HeuristicTerms::of(&rising).monotonicity - 6f64.log2()).abs() < EPS);
        let falling = Board::from_rows(&[[8, 2], [0, 0]]).unwrap();
        assert_eq!(HeuristicTerms::of(&falling).monotonicity, 0.0);
        let below = Board::from_rows(&[[0, 0], [4, 0]]).unwrap();
        assert!((HeuristicTerms::of(&below).monotonicity - 2.0).abs() < EPS);
    }

    #[test]
    fn clearing_isolated_small_tile_raises_dividends() {
        let rows = [[2, 4, 8, 16], [0, 32, 0, 4], [64, 0, 2, 8], [4, 16, 4, 2]];
        let before = Board::from_rows(&rows).unwrap();
        let mut cleared = rows;
        cleared[2][2] = 0;
        let after = Board::from_rows(&cleared).unwrap();
        let (tb, ta) = (HeuristicTerms::of(&before), HeuristicTerms::of(&after));
        assert_eq!(ta.open, tb.open + 1.0);
        assert_eq!(ta.merges, tb.merges);
        assert!(ta.dividends() > tb.dividends());
    }

    #[test]
    fn no_log_of_zero_on_uniform_board() {
        let b = Board::from_rows(&[[4, 4], [4, 4]]).unwrap();
        let t = HeuristicTerms::of(&b);
        assert_eq!(t.roughness, 0.0);
        assert_eq!(t.monotonicity, 0.0);
        assert!((t.merges - 8.0).abs() < EPS);
        assert!(score(&b).is_finite());
    }

    #[test]
    fn huge_tiles_keep_score_finite() {
        let b = Board::from_rows(&[[131072, 4], [8, 0]]).unwrap();
        let t = HeuristicTerms::of(&b);
        assert_eq!(t.magnitude, MAGNITUDE_CAP);
        assert!(score(&b).is_finite());

        let two = Board::from_rows(&[[131072, 131072], [131072, 131072]]).unwrap();
        assert_eq!(HeuristicTerms::of(&two).magnitude, MAGNITUDE_CAP);
        assert!(score(&two).is_finite());
    }
}
