use std::time::Duration;

use ai_2048_agent::engine::{Board, Move};
use ai_2048_agent::expectimax::{Expectimax, SearchConfig};
use ai_2048_agent::game::{new_board, play_game, GameLimits, Policy};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "ai-2048-agent", about = "Play one game of 2048 with the expectimax agent")]
struct Args {
    /// Board dimension
    #[arg(long, default_value_t = 4)]
    size: usize,

    /// Wall-clock allowance per move in milliseconds (90% is used for search)
    #[arg(long, default_value_t = 200)]
    time_ms: u64,
}

/// Prints every board the agent is asked about and sums the depths it reached.
struct Narrated {
    inner: Expectimax,
    depth_total: u64,
}

impl Policy for Narrated {
    fn next_move(&mut self, board: &Board) -> Option<Move> {
        println!("{}", board);
        let dir = self.inner.best_move(board)?;
        self.depth_total += self.inner.last_stats().completed_depth as u64;
        Some(dir)
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    anyhow::ensure!(args.size >= 2, "board size must be at least 2");

    let cfg = SearchConfig { time_allowance: Duration::from_millis(args.time_ms), ..Default::default() };
    let mut agent = Narrated { inner: Expectimax::with_config(cfg), depth_total: 0 };
    let mut rng = rand::thread_rng();
    let start = new_board(args.size, &mut rng);

    let summary = play_game(&mut agent, start, &mut rng, GameLimits::default());
    if let Some(last) = summary.states.last() {
        println!("{}", last);
    }
    println!(
        "Moves made: {}, Score: {}, Highest tile: {}, Mean depth: {:.2}, Max states considered for a move: {}",
        summary.steps,
        summary.score,
        summary.highest_tile,
        agent.depth_total as f64 / summary.steps.max(1) as f64,
        agent.inner.peak_nodes()
    );
    Ok(())
}
