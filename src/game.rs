//! Game loop driving a policy against random tile spawns.

use std::time::Instant;

use log::{debug, warn};
use rand::Rng;
use serde::Serialize;

use crate::engine::{Board, Move};
use crate::expectimax::Expectimax;
use crate::trace;

/// Anything that can choose the next move for a board.
pub trait Policy {
    /// `None` means the policy has no move to offer.
    fn next_move(&mut self, board: &Board) -> Option<Move>;
}

impl Policy for Expectimax {
    #[inline]
    fn next_move(&mut self, board: &Board) -> Option<Move> { self.best_move(board) }
}

/// Optional early-stop conditions for a game.
#[derive(Debug, Clone, Copy, Default)]
pub struct GameLimits {
    /// Stop after this many moves.
    pub max_steps: Option<u64>,
    /// Stop once the highest tile reaches this value.
    pub stop_tile: Option<u32>,
}

/// Outcome of one played game.
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub steps: u32,
    pub score: u64,
    pub highest_tile: u32,
    pub start_unix_s: u64,
    pub elapsed_s: f64,
    pub game_over: bool,
    /// Board before the first move and after every move (`steps + 1` entries).
    #[serde(skip)]
    pub states: Vec<Board>,
    #[serde(skip)]
    pub moves: Vec<Move>,
}

/// A fresh board with two random tiles.
pub fn new_board<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Board {
    Board::new(size).with_random_tile(rng).with_random_tile(rng)
}

/// Play from `start` until the game is over, the policy gives up or a limit is hit.
///
/// ```
/// use ai_2048_agent::engine::{Board, Move};
/// use ai_2048_agent::game::{play_game, GameLimits, Policy};
/// use rand::{rngs::StdRng, SeedableRng};
///
/// struct FirstLegal;
/// impl Policy for FirstLegal {
///     fn next_move(&mut self, b: &Board) -> Option<Move> { b.available_moves().first().map(|o| o.dir) }
/// }
///
/// let mut rng = StdRng::seed_from_u64(1);
/// let limits = GameLimits { max_steps: Some(5), ..Default::default() };
/// let summary = play_game(&mut FirstLegal, Board::new(4).with_random_tile(&mut rng), &mut rng, limits);
/// assert!(summary.steps <= 5);
/// assert_eq!(summary.states.len(), summary.steps as usize + 1);
/// ```
pub fn play_game<P, R>(policy: &mut P, start: Board, rng: &mut R, limits: GameLimits) -> GameSummary
where
    P: Policy + ?Sized,
    R: Rng + ?Sized,
{
    let started = Instant::now();
    let start_unix_s = trace::now_unix_seconds();
    let mut board = start;
    let mut score = 0u64;
    let mut states = vec![board.clone()];
    let mut moves = Vec::new();

    while !board.is_game_over() {
        let Some(dir) = policy.next_move(&board) else { break };
        let (moved, reward) = board.shift_with_reward(dir);
        if moved == board {
            warn!("policy chose no-op move {dir}; stopping");
            break;
        }
        score += reward;
        board = moved.with_random_tile(rng);
        states.push(board.clone());
        moves.push(dir);

        if limits.max_steps.is_some_and(|limit| moves.len() as u64 >= limit) {
            break;
        }
        if limits.stop_tile.is_some_and(|tile| board.highest_tile() >= tile) {
            break;
        }
    }

    let summary = GameSummary {
        steps: moves.len() as u32,
        score,
        highest_tile: board.highest_tile(),
        start_unix_s,
        elapsed_s: started.elapsed().as_secs_f64(),
        game_over: board.is_game_over(),
        states,
        moves,
    };
    debug!(
        "game finished: {} moves, score {}, highest tile {}",
        summary.steps, summary.score, summary.highest_tile
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use std::time::Duration;

    use crate::expectimax::SearchConfig;

    struct Scripted(Vec<Move>);

    impl Policy for Scripted {
        fn next_move(&mut self, _board: &Board) -> Option<Move> {
            if self.0.is_empty() { None } else { Some(self.0.remove(0)) }
        }
    }

    #[test]
    fn scores_merges_and_records_states() {
        let mut rng = StdRng::seed_from_u64(3);
        let start = Board::from_rows(&[[2, 2, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [4, 4, 0, 0]]).unwrap();
        let summary = play_game(&mut Scripted(vec![Move::Left]), start.clone(), &mut rng, GameLimits::default());
        assert_eq!(summary.steps, 1);
        assert_eq!(summary.score, 4 + 8);
        assert_eq!(summary.moves, vec![Move::Left]);
        assert_eq!(summary.states[0], start);
        assert_eq!(summary.states[1].count_empty(), 13);
        assert_eq!(summary.highest_tile, 8);
        assert!(!summary.game_over);
    }

    #[test]
    fn stops_on_noop_move() {
        let mut rng = StdRng::seed_from_u64(3);
        let start = Board::from_rows(&[[2, 0], [0, 0]]).unwrap();
        let summary = play_game(&mut Scripted(vec![Move::Up, Move::Right]), start, &mut rng, GameLimits::default());
        assert_eq!(summary.steps, 0);
        assert_eq!(summary.states.len(), 1);
    }

    #[test]
    fn respects_step_limit() {
        let mut rng = StdRng::seed_from_u64(9);
        let cfg = SearchConfig { time_allowance: Duration::from_millis(5), max_depth: 2, ..Default::default() };
        let mut policy = Expectimax::with_config(cfg);
        let limits = GameLimits { max_steps: Some(6), ..Default::default() };
        let summary = play_game(&mut policy, new_board(4, &mut rng), &mut rng, limits);
        assert_eq!(summary.steps, 6);
        assert_eq!(summary.moves.len(), 6);
        assert_eq!(summary.states.len(), 7);
    }

    #[test]
    fn stops_at_target_tile() {
        let mut rng = StdRng::seed_from_u64(4);
        let start = Board::from_rows(&[[8, 8], [0, 0]]).unwrap();
        let limits = GameLimits { stop_tile: Some(16), ..Default::default() };
        let summary = play_game(&mut Scripted(vec![Move::Left, Move::Down]), start, &mut rng, limits);
        assert_eq!(summary.steps, 1);
        assert_eq!(summary.highest_tile, 16);
    }

    #[test]
    fn plays_small_board_to_the_end() {
        let mut rng = StdRng::seed_from_u64(12);
        let cfg = SearchConfig { time_allowance: Duration::from_millis(2), max_depth: 2, ..Default::default() };
        let mut policy = Expectimax::with_config(cfg);
        let summary = play_game(&mut policy, new_board(2, &mut rng), &mut rng, GameLimits::default());
        assert!(summary.game_over);
        assert!(summary.states.last().is_some_and(|b| b.is_game_over()));
    }
}
