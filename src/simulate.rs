//! Batch simulation: many seeded games in parallel
//!
//! Each game derives its own seeds from the batch seed, so a batch is
//! reproducible as a whole and any single game out of it can be re-run
//! alone. The determinism check replays every game a second time and
//! compares command histories and final state hashes.

use crate::game::agent::RandomAgent;
use crate::game::command::Command;
use crate::game::logger::VerbosityLevel;
use crate::game::processor::CommandProcessor;
use crate::game::runner::MatchRunner;
use crate::game::state::GameConfig;
use crate::game::state_hash::compute_state_hash;
use crate::loader::game_init::{init_game, PlayerSetup};
use crate::Result;
use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Batch parameters
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub games: usize,
    pub base_seed: u64,
    /// Per-game command budget passed to the runner
    pub command_budget: usize,
    /// Play every game twice and compare histories and state hashes
    pub check_determinism: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            games: 100,
            base_seed: 0,
            command_budget: 1000,
            check_determinism: false,
        }
    }
}

/// Aggregate results of a batch
#[derive(Debug, Default)]
pub struct SimulationReport {
    pub games_played: usize,
    /// Wins by seat (index 0 is the starting player's seat)
    pub seat_wins: [usize; 2],
    pub draws: usize,
    /// Games that hit the command budget before finishing
    pub incomplete: usize,
    /// Games that failed with an engine error
    pub failures: usize,
    pub determinism_mismatches: usize,
    pub total_turns: u64,
    pub total_commands: u64,
    pub elapsed: Duration,
}

impl SimulationReport {
    pub fn average_turns(&self) -> f64 {
        let finished = self.games_played - self.failures;
        if finished == 0 {
            return 0.0;
        }
        self.total_turns as f64 / finished as f64
    }
}

struct GameRecord {
    winner_seat: Option<usize>,
    completed: bool,
    turns: u32,
    commands: usize,
    history: Vec<Command>,
    state_hash: u64,
}

/// Play game `index` of the batch once
fn play_one(
    config: &SimulationConfig,
    setups: &[PlayerSetup; 2],
    index: usize,
) -> Result<GameRecord> {
    // Decorrelate neighboring indices before drawing the three seeds.
    let mut seeder = Xoshiro256PlusPlus::seed_from_u64(
        config
            .base_seed
            .wrapping_add((index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)),
    );
    let game_seed = seeder.next_u64();
    let seed_a = seeder.next_u64();
    let seed_b = seeder.next_u64();

    let mut game = init_game(
        GameConfig {
            seed: game_seed,
            ..GameConfig::default()
        },
        setups.clone(),
    )?;
    // Batch games run silently; per-game narration would interleave
    // across worker threads anyway.
    game.logger.set_verbosity(VerbosityLevel::Silent);

    let mut runner = MatchRunner::new(
        CommandProcessor::new(game),
        [
            Box::new(RandomAgent::with_seed(seed_a)),
            Box::new(RandomAgent::with_seed(seed_b)),
        ],
    )
    .with_command_budget(config.command_budget);

    let outcome = runner.run()?;
    let processor = runner.into_processor();
    let ids = processor.game().player_ids();

    Ok(GameRecord {
        winner_seat: outcome
            .winner
            .and_then(|w| ids.iter().position(|&id| id == w)),
        completed: outcome.completed,
        turns: outcome.turns,
        commands: outcome.commands,
        history: processor.history().to_vec(),
        state_hash: compute_state_hash(processor.game()),
    })
}

/// Run the batch in parallel and aggregate the results
pub fn run_simulation(
    config: &SimulationConfig,
    setups: &[PlayerSetup; 2],
) -> Result<SimulationReport> {
    let start = Instant::now();
    let report = Arc::new(Mutex::new(SimulationReport::default()));

    (0..config.games).into_par_iter().for_each(|index| {
        let result = play_one(config, setups, index);

        let rerun_matches = if config.check_determinism {
            match (&result, play_one(config, setups, index)) {
                (Ok(first), Ok(second)) => {
                    first.history == second.history && first.state_hash == second.state_hash
                }
                _ => false,
            }
        } else {
            true
        };

        let mut report = report.lock().unwrap();
        report.games_played += 1;
        if !rerun_matches {
            report.determinism_mismatches += 1;
        }
        match result {
            Ok(record) => {
                match record.winner_seat {
                    Some(seat) => report.seat_wins[seat] += 1,
                    None if record.completed => report.draws += 1,
                    None => report.incomplete += 1,
                }
                report.total_turns += record.turns as u64;
                report.total_commands += record.commands as u64;
            }
            Err(e) => {
                report.failures += 1;
                eprintln!("Warning: game {} failed: {}", index, e);
            }
        }
    });

    let mut report = Arc::try_unwrap(report)
        .map_err(|_| crate::EngineError::CorruptState("simulation workers leaked".to_string()))?
        .into_inner()
        .unwrap();
    report.elapsed = start.elapsed();
    Ok(report)
}

/// Render a report the way the CLI shows it
pub fn print_report(report: &SimulationReport, setups: &[PlayerSetup; 2]) {
    println!("=== Simulation Complete ===");
    println!("Games played: {}", report.games_played);
    println!("Elapsed time: {:.2}s", report.elapsed.as_secs_f64());
    if report.elapsed.as_secs_f64() > 0.0 {
        println!(
            "Games per second: {:.2}",
            report.games_played as f64 / report.elapsed.as_secs_f64()
        );
    }
    println!();

    let decided = report.seat_wins[0] + report.seat_wins[1] + report.draws;
    for (seat, setup) in setups.iter().enumerate() {
        let wins = report.seat_wins[seat];
        let pct = if decided > 0 {
            100.0 * wins as f64 / decided as f64
        } else {
            0.0
        };
        println!("{} wins: {} ({:.1}%)", setup.name, wins, pct);
    }
    println!("Draws: {}", report.draws);
    println!("Hit command budget: {}", report.incomplete);
    if report.failures > 0 {
        println!("Failed games: {}", report.failures);
    }
    println!("Average turns: {:.1}", report.average_turns());
    if report.determinism_mismatches > 0 {
        println!(
            "DETERMINISM MISMATCHES: {}",
            report.determinism_mismatches
        );
    }
}
