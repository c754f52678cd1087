//! ai-2048-agent: a time-bounded expectimax player for 2048
//!
//! This crate provides:
//! - A square `Board` of any size with the usual 2048 mechanics (`engine` module)
//! - An iterative-deepening Expectimax policy that answers within a fixed
//!   wall-clock budget (`expectimax` module)
//! - A game loop that drives any `Policy` against random tile spawns (`game` module)
//! - A binary trace format for played games (`trace` module)
//!
//! Quick start:
//! ```
//! use std::time::Duration;
//! use ai_2048_agent::engine::{Board, Move};
//! use ai_2048_agent::expectimax::{Expectimax, SearchConfig};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! // Deterministic board initialization with a seeded RNG
//! let mut rng = StdRng::seed_from_u64(42);
//! let b0 = Board::new(4).with_random_tile(&mut rng).with_random_tile(&mut rng);
//!
//! // Short budget to keep doctests fast; the default is 90% of 200 ms.
//! let cfg = SearchConfig { time_allowance: Duration::from_millis(20), ..Default::default() };
//! let mut ex = Expectimax::with_config(cfg);
//! let dir: Move = ex.best_move(&b0).unwrap();
//! let b1 = b0.make_move(dir, &mut rng);
//! assert_ne!(b0, b1);
//! ```
//!
//! Full loop
//! ```
//! use std::time::Duration;
//! use ai_2048_agent::expectimax::{Expectimax, SearchConfig};
//! use ai_2048_agent::game::{new_board, play_game, GameLimits};
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let mut rng = StdRng::seed_from_u64(123);
//! let cfg = SearchConfig { time_allowance: Duration::from_millis(5), ..Default::default() };
//! let mut policy = Expectimax::with_config(cfg);
//! let limits = GameLimits { max_steps: Some(4), ..Default::default() };
//! let summary = play_game(&mut policy, new_board(4, &mut rng), &mut rng, limits);
//! assert_eq!(summary.steps, 4);
//! ```
//!
pub mod engine;
pub mod expectimax;
pub mod game;
pub mod trace;
