use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use ai_2048_agent::expectimax::{Expectimax, SearchConfig};
use ai_2048_agent::game::{new_board, play_game, GameLimits, GameSummary};
use ai_2048_agent::trace;
use anyhow::Context;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::{rngs::StdRng, SeedableRng};
use rayon::prelude::*;

#[derive(Debug, Parser)]
#[command(name = "parallel", about = "Run independent 2048 expectimax games in parallel")]
struct Args {
    /// Number of games to play
    #[arg(long, default_value_t = 8)]
    games: u64,

    /// Board dimension
    #[arg(long, default_value_t = 4)]
    size: usize,

    /// Wall-clock allowance per move in milliseconds (90% is used for search)
    #[arg(long, default_value_t = 200)]
    time_ms: u64,

    /// Iterative deepening depth cap
    #[arg(long, default_value_t = 7)]
    max_depth: u32,

    /// Seed of the first game; game i uses seed + i
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Per game: stop after this many moves
    #[arg(long)]
    steps: Option<u64>,

    /// Per game: stop once the highest tile reaches this value
    #[arg(long)]
    stop_tile: Option<u32>,

    /// Write one binary trace per game into this directory
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Print one JSON summary line per game
    #[arg(long)]
    json: bool,

    /// Suppress the progress bar
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    anyhow::ensure!(args.size >= 2, "board size must be at least 2");

    if let Some(dir) = &args.out_dir {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let cfg = SearchConfig {
        time_allowance: Duration::from_millis(args.time_ms),
        max_depth: args.max_depth,
        ..Default::default()
    };
    let limits = GameLimits { max_steps: args.steps, stop_tile: args.stop_tile };

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(args.games);
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} [{bar:30}] {pos}/{len} games | {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let start = Instant::now();
    let results: Vec<(u64, GameSummary)> = (0..args.games)
        .into_par_iter()
        .map(|i| -> anyhow::Result<(u64, GameSummary)> {
            // each game owns its policy and search session; nothing is shared
            let mut rng = StdRng::seed_from_u64(args.seed + i);
            let mut policy = Expectimax::with_config(cfg.clone());
            let summary = play_game(&mut policy, new_board(args.size, &mut rng), &mut rng, limits);
            if let Some(dir) = &args.out_dir {
                let path = dir.join(format!("game-{:05}.a2g", args.seed + i));
                trace::write_summary_to_path(&path, &summary, Some(format!("expectimax d{}", args.max_depth)))
                    .with_context(|| format!("writing {}", path.display()))?;
            }
            pb.inc(1);
            pb.set_message(format!("last score {}", summary.score));
            Ok((args.seed + i, summary))
        })
        .collect::<anyhow::Result<_>>()?;
    pb.finish_and_clear();

    let mut tiles: BTreeMap<u32, u32> = BTreeMap::new();
    for (seed, summary) in &results {
        *tiles.entry(summary.highest_tile).or_default() += 1;
        if args.json {
            println!("{}", serde_json::to_string(&summary)?);
        } else if !args.quiet {
            println!(
                "seed {:>5} | moves {:>6} | score {:>8} | highest tile {:>6}",
                seed, summary.steps, summary.score, summary.highest_tile
            );
        }
    }

    let games = results.len().max(1) as f64;
    let mean_score = results.iter().map(|(_, s)| s.score as f64).sum::<f64>() / games;
    let total_moves: u64 = results.iter().map(|(_, s)| s.steps as u64).sum();
    info!(
        "{} games in {:.1}s | mean score {:.1} | moves {}",
        results.len(),
        start.elapsed().as_secs_f64(),
        mean_score,
        total_moves
    );
    for (tile, count) in tiles.iter().rev() {
        info!("highest tile {:>6}: {} games", tile, count);
    }
    Ok(())
}
