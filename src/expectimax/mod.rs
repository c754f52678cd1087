//! Time-bounded expectimax policy for 2048.
//!
//! The search alternates two node kinds:
//! - decision nodes, where the player picks the move with the highest
//!   backed-up utility (with an alpha/beta style early exit), and
//! - chance nodes, where the utility is the expectation over every empty
//!   cell receiving a 2 (p = 0.9) or a 4 (p = 0.1).
//!
//! [`Expectimax::best_move`] runs this search with iterative deepening
//! under a wall-clock budget and keeps the decision of the deepest fully
//! completed depth. A depth that runs out of budget is discarded entirely.
//!
//! Quick start
//! ```
//! use std::time::Duration;
//! use ai_2048_agent::engine::Board;
//! use ai_2048_agent::expectimax::{Expectimax, SearchConfig};
//!
//! let board = Board::from_rows(&[[2, 0, 0, 0], [0, 0, 0, 0], [0, 4, 0, 0], [0, 0, 0, 2]]).unwrap();
//! let cfg = SearchConfig { time_allowance: Duration::from_millis(20), ..Default::default() };
//! let mut ex = Expectimax::with_config(cfg);
//! let m = ex.best_move(&board);
//! assert!(m.is_some());
//! assert!(ex.last_stats().completed_depth <= 7);
//! ```

use std::time::Duration;

use crate::engine::Move;

pub mod expand;
pub mod heuristic;
mod search;

pub use search::Expectimax;

/// Configurable knobs for the search. Defaults match the tuned agent.
///
/// - `time_allowance` / `budget_fraction`: the search may spend
///   `time_allowance * budget_fraction`; the remainder absorbs scheduling jitter.
/// - `max_depth`: iterative deepening stops after this depth limit.
/// - `use_pruning`: enable the early exit at decision nodes.
/// - `max_nodes`: optional node budget, exhausted exactly like the time budget.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Wall-clock allowance per decision.
    pub time_allowance: Duration,
    /// Share of `time_allowance` the search itself may use.
    pub budget_fraction: f64,
    /// Safety cap on the iterative deepening depth limit.
    pub max_depth: u32,
    /// Stop exploring moves at a decision node once its best utility reaches beta.
    pub use_pruning: bool,
    /// Optional cap on visited nodes per decision.
    pub max_nodes: Option<u64>,
}

impl SearchConfig {
    /// Time the search may spend before it aborts.
    #[inline]
    pub fn budget(&self) -> Duration { self.time_allowance.mul_f64(self.budget_fraction) }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_allowance: Duration::from_millis(200),
            budget_fraction: 0.9,
            max_depth: 7,
            use_pruning: true,
            max_nodes: None,
        }
    }
}

/// Result of evaluating one search node.
///
/// `Abort` is not a utility: it is propagated unchanged up to the root and
/// never folded into a sum or a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    /// Backed-up or heuristic utility of a subtree.
    Utility(f64),
    /// Chosen move; only produced by the root decision node.
    Move(Move),
    /// The budget ran out before the subtree was fully evaluated.
    Abort,
}

/// Statistics for the last decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStats {
    /// Decision and chance nodes visited, including the discarded depth.
    pub nodes: u64,
    /// Deepest depth limit whose decision was committed (0 = fallback move).
    pub completed_depth: u32,
    /// True when the budget stopped the deepening before `max_depth`.
    pub aborted: bool,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}
