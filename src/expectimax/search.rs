use std::time::{Duration, Instant};

use log::{debug, trace};

use crate::engine::{Board, Move};

use super::expand::{chance_outcomes, preferred_moves};
use super::{heuristic, Outcome, SearchConfig, SearchStats};

/// Single-threaded, time-bounded expectimax policy.
///
/// Holds only configuration and the stats of the last call; each decision
/// runs in its own search session, so independent `Expectimax` values can be
/// used from different threads at once.
pub struct Expectimax {
    cfg: SearchConfig,
    stats: SearchStats,
    peak_nodes: u64,
}

impl Expectimax {
    pub fn new() -> Self { Self::with_config(SearchConfig::default()) }

    pub fn with_config(cfg: SearchConfig) -> Self {
        Self { cfg, stats: SearchStats::default(), peak_nodes: 0 }
    }

    #[inline]
    pub fn config(&self) -> &SearchConfig { &self.cfg }

    /// Alias of [`Self::best_move`].
    #[inline]
    pub fn get_next_move(&mut self, board: &Board) -> Option<Move> { self.best_move(board) }

    /// Pick a move with iterative deepening under the configured budget.
    ///
    /// Returns `None` only when `board` has no legal move. Otherwise the
    /// result is the decision of the deepest completed depth, or the first
    /// preferred move if not even depth 1 finished in time.
    ///
    /// Example
    /// ```
    /// use std::time::Duration;
    /// use ai_2048_agent::engine::Board;
    /// use ai_2048_agent::expectimax::{Expectimax, SearchConfig};
    /// let b = Board::from_rows(&[[2, 2], [0, 0]]).unwrap();
    /// let cfg = SearchConfig { time_allowance: Duration::from_millis(10), ..Default::default() };
    /// let mut ex = Expectimax::with_config(cfg);
    /// assert!(ex.best_move(&b).is_some());
    /// assert!(ex.best_move(&Board::from_rows(&[[2, 4], [4, 2]]).unwrap()).is_none());
    /// ```
    pub fn best_move(&mut self, board: &Board) -> Option<Move> {
        let fallback = preferred_moves(board).first()?.dir;
        let mut session = Session::new(&self.cfg);
        let mut best = fallback;
        let mut completed_depth = 0;
        let mut aborted = false;

        for depth_limit in 1..=self.cfg.max_depth {
            if session.exhausted() {
                aborted = true;
                break;
            }
            session.depth_limit = depth_limit;
            match session.maximize(board, 1, f64::NEG_INFINITY, f64::INFINITY) {
                Outcome::Move(m) => {
                    best = m;
                    completed_depth = depth_limit;
                    trace!("depth {depth_limit} -> {m} ({} nodes)", session.nodes);
                }
                Outcome::Abort => {
                    aborted = true;
                    debug!("depth {depth_limit} aborted after {:?}, keeping {best}", session.start.elapsed());
                    break;
                }
                // the root always has a legal move here
                Outcome::Utility(_) => break,
            }
        }

        self.stats = SearchStats {
            nodes: session.nodes,
            completed_depth,
            aborted,
            elapsed: session.start.elapsed(),
        };
        self.peak_nodes = self.peak_nodes.max(session.nodes);
        debug!(
            "chose {best} at depth {completed_depth} ({} nodes, {:?})",
            self.stats.nodes, self.stats.elapsed
        );
        Some(best)
    }

    /// Statistics collected from the last call to [`Self::best_move`].
    #[inline]
    pub fn last_stats(&self) -> SearchStats { self.stats }

    /// Largest node count of any decision since construction or the last reset.
    #[inline]
    pub fn peak_nodes(&self) -> u64 { self.peak_nodes }

    /// Reset accumulated stats to zero.
    #[inline]
    pub fn reset_stats(&mut self) {
        self.stats = SearchStats::default();
        self.peak_nodes = 0;
    }
}

impl Default for Expectimax { fn default() -> Self { Self::new() } }

/// State of one decision request, threaded through the recursion.
struct Session {
    start: Instant,
    budget: Duration,
    max_nodes: Option<u64>,
    use_pruning: bool,
    depth_limit: u32,
    nodes: u64,
}

impl Session {
    fn new(cfg: &SearchConfig) -> Self {
        Self {
            start: Instant::now(),
            budget: cfg.budget(),
            max_nodes: cfg.max_nodes,
            use_pruning: cfg.use_pruning,
            depth_limit: 0,
            nodes: 0,
        }
    }

    #[inline]
    fn exhausted(&self) -> bool {
        if let Some(cap) = self.max_nodes {
            if self.nodes >= cap {
                return true;
            }
        }
        self.start.elapsed() > self.budget
    }

    /// Decision node. Yields `Move` at depth 1, `Utility` deeper, or `Abort`.
    fn maximize(&mut self, board: &Board, depth: u32, mut alpha: f64, beta: f64) -> Outcome {
        if self.exhausted() {
            return Outcome::Abort;
        }
        self.nodes += 1;
        if depth > self.depth_limit {
            return Outcome::Utility(heuristic::score(board));
        }

        let options = preferred_moves(board);
        let Some(first) = options.first() else {
            return Outcome::Utility(f64::NEG_INFINITY);
        };

        let mut best_move = first.dir;
        let mut best_utility = f64::NEG_INFINITY;
        for opt in &options {
            let utility = match self.expect(&opt.board, depth + 1, alpha, beta) {
                Outcome::Utility(u) => u,
                abort => return abort,
            };
            if utility > best_utility {
                best_utility = utility;
                best_move = opt.dir;
            }
            if self.use_pruning {
                // The parent is a chance node, so this cutoff is an
                // approximation rather than a sound alpha-beta bound.
                if best_utility >= beta {
                    break;
                }
                if best_utility > alpha {
                    alpha = best_utility;
                }
            }
        }

        if depth == 1 {
            // a root decision reached past the budget is not trusted
            if self.exhausted() {
                return Outcome::Abort;
            }
            return Outcome::Move(best_move);
        }
        Outcome::Utility(best_utility)
    }

    /// Chance node. Yields the expected utility over all tile placements, or `Abort`.
    fn expect(&mut self, board: &Board, depth: u32, alpha: f64, beta: f64) -> Outcome {
        self.nodes += 1;
        let outcomes = chance_outcomes(board);
        if outcomes.is_empty() {
            return Outcome::Utility(f64::NEG_INFINITY);
        }
        if depth > self.depth_limit {
            return Outcome::Utility(heuristic::score(board));
        }

        let mut expected = 0.0;
        for o in outcomes {
            let mut child = board.clone();
            child.insert_tile(o.cell, o.value);
            match self.maximize(&child, depth + 1, alpha, beta) {
                Outcome::Utility(u) => expected += u * o.weight,
                abort => return abort,
            }
        }
        Outcome::Utility(expected)
    }
}
