//! Chainforge - Main Binary
//!
//! Command line driver: single matches, replays, and batch simulation

use chainforge::{
    game::{
        agent::{Agent, RandomAgent, ScriptedAgent},
        processor::CommandProcessor,
        runner::MatchRunner,
        state::GameConfig,
        state_hash::{compute_state_hash, format_hash},
        VerbosityLevel,
    },
    loader::{init_game, DeckLoader, MatchRecord, PlayerSetup},
    simulate::{print_report, run_simulation, SimulationConfig},
    Result,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Agent type for the two seats
#[derive(Debug, Clone, Copy, ValueEnum)]
enum AgentType {
    /// Makes seeded random choices
    Random,
    /// Always takes the neutral action (pass priority, end turn)
    Pass,
}

#[derive(Parser)]
#[command(name = "chainforge")]
#[command(about = "Chainforge - deterministic card battler engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one match between two agents
    Run {
        /// Deck file for player 1
        #[arg(value_name = "PLAYER1_DECK")]
        deck1: PathBuf,

        /// Deck file for player 2
        #[arg(value_name = "PLAYER2_DECK")]
        deck2: PathBuf,

        /// Hero blueprint id for player 1
        #[arg(long, default_value = "pyre_warden")]
        hero1: String,

        /// Hero blueprint id for player 2
        #[arg(long, default_value = "tide_caller")]
        hero2: String,

        /// Player 1 agent type
        #[arg(long, value_enum, default_value = "random")]
        p1: AgentType,

        /// Player 2 agent type
        #[arg(long, value_enum, default_value = "random")]
        p2: AgentType,

        /// Player 1 name
        #[arg(long, default_value = "Player 1")]
        p1_name: String,

        /// Player 2 name
        #[arg(long, default_value = "Player 2")]
        p2_name: String,

        /// Game seed; agent seeds derive from it
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Command budget before the match is abandoned
        #[arg(long, default_value_t = 1000)]
        budget: usize,

        /// Verbosity level (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, short = 'v', default_value = "normal")]
        verbosity: VerbosityLevel,

        /// Write a replayable match record to this file
        #[arg(long, value_name = "FILE")]
        record_out: Option<PathBuf>,

        /// Write the per-viewer snapshot update stream to this file
        #[arg(long, value_name = "FILE")]
        snapshots_out: Option<PathBuf>,
    },

    /// Replay a recorded match and verify the final state
    Replay {
        /// Match record produced by `run --record-out`
        #[arg(value_name = "RECORD_FILE")]
        record: PathBuf,

        /// Verbosity level (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, short = 'v', default_value = "minimal")]
        verbosity: VerbosityLevel,

        /// Echo the state hash to stderr after every replayed command,
        /// for bisecting a divergent record
        #[arg(long)]
        trace_hashes: bool,
    },

    /// Run many seeded games and report aggregate statistics
    Simulate {
        /// Deck file for seat 1
        #[arg(value_name = "PLAYER1_DECK")]
        deck1: PathBuf,

        /// Deck file for seat 2
        #[arg(value_name = "PLAYER2_DECK")]
        deck2: PathBuf,

        /// Hero blueprint id for seat 1
        #[arg(long, default_value = "pyre_warden")]
        hero1: String,

        /// Hero blueprint id for seat 2
        #[arg(long, default_value = "tide_caller")]
        hero2: String,

        /// Number of games to run
        #[arg(long, short = 'g', default_value_t = 100)]
        games: usize,

        /// Batch seed; per-game seeds derive from it
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Per-game command budget
        #[arg(long, default_value_t = 1000)]
        budget: usize,

        /// Play every game twice and flag any divergence
        #[arg(long)]
        check_determinism: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            deck1,
            deck2,
            hero1,
            hero2,
            p1,
            p2,
            p1_name,
            p2_name,
            seed,
            budget,
            verbosity,
            record_out,
            snapshots_out,
        } => run_match(RunArgs {
            deck1,
            deck2,
            hero1,
            hero2,
            p1,
            p2,
            p1_name,
            p2_name,
            seed,
            budget,
            verbosity,
            record_out,
            snapshots_out,
        }),
        Commands::Replay {
            record,
            verbosity,
            trace_hashes,
        } => replay_match(record, verbosity, trace_hashes),
        Commands::Simulate {
            deck1,
            deck2,
            hero1,
            hero2,
            games,
            seed,
            budget,
            check_determinism,
        } => simulate_batch(
            deck1,
            deck2,
            hero1,
            hero2,
            games,
            seed,
            budget,
            check_determinism,
        ),
    }
}

struct RunArgs {
    deck1: PathBuf,
    deck2: PathBuf,
    hero1: String,
    hero2: String,
    p1: AgentType,
    p2: AgentType,
    p1_name: String,
    p2_name: String,
    seed: u64,
    budget: usize,
    verbosity: VerbosityLevel,
    record_out: Option<PathBuf>,
    snapshots_out: Option<PathBuf>,
}

fn make_agent(kind: AgentType, seed: u64) -> Box<dyn Agent> {
    match kind {
        AgentType::Random => Box::new(RandomAgent::with_seed(seed)),
        AgentType::Pass => Box::new(ScriptedAgent::new("pass", Vec::new())),
    }
}

fn run_match(args: RunArgs) -> Result<()> {
    let setups = [
        PlayerSetup::new(
            args.p1_name,
            args.hero1,
            DeckLoader::load_from_file(&args.deck1)?,
        ),
        PlayerSetup::new(
            args.p2_name,
            args.hero2,
            DeckLoader::load_from_file(&args.deck2)?,
        ),
    ];
    let config = GameConfig {
        seed: args.seed,
        ..GameConfig::default()
    };

    let mut game = init_game(config.clone(), setups.clone())?;
    game.logger.set_verbosity(args.verbosity);

    let seed_a = args.seed.wrapping_add(0x1234_5678_9ABC_DEF0);
    let seed_b = args.seed.wrapping_add(0xFEDC_BA98_7654_3210);
    let mut runner = MatchRunner::new(
        CommandProcessor::new(game),
        [make_agent(args.p1, seed_a), make_agent(args.p2, seed_b)],
    )
    .with_command_budget(args.budget);

    let outcome = runner.run()?;
    let processor = runner.into_processor();

    println!();
    println!("=== Match Complete ===");
    match outcome.winner {
        Some(id) => println!("Winner: {}", processor.game().player(id)?.name),
        None if outcome.completed => println!("Winner: none (draw)"),
        None => println!("Winner: none (command budget reached)"),
    }
    println!("Turns: {}", outcome.turns);
    println!("Commands: {}", outcome.commands);
    println!(
        "Final state hash: {}",
        format_hash(compute_state_hash(processor.game()))
    );

    let record = MatchRecord {
        config,
        players: setups,
        commands: processor.history().to_vec(),
    };
    if let Some(path) = args.record_out {
        record.save_to_file(&path)?;
        println!("Match record written to {}", path.display());
    }
    if let Some(path) = args.snapshots_out {
        let count = write_snapshot_stream(&record, &path)?;
        println!("{} snapshot updates written to {}", count, path.display());
    }
    Ok(())
}

/// Re-execute a record silently and collect every snapshot update the
/// transport layer would have sent.
fn write_snapshot_stream(record: &MatchRecord, path: &PathBuf) -> Result<usize> {
    let mut game = record.rebuild()?;
    game.logger.set_verbosity(VerbosityLevel::Silent);

    let mut processor = CommandProcessor::new(game);
    let mut updates = processor.sync()?;
    for command in &record.commands {
        updates.extend(processor.submit(command.clone())?);
    }

    let json = serde_json::to_string_pretty(&updates)?;
    std::fs::write(path, json)?;
    Ok(updates.len())
}

fn replay_match(path: PathBuf, verbosity: VerbosityLevel, trace_hashes: bool) -> Result<()> {
    let record = MatchRecord::load_from_file(&path)?;
    let mut game = record.rebuild()?;
    game.logger.set_verbosity(verbosity);
    game.logger.set_debug_trace(trace_hashes);

    let processor = CommandProcessor::initialize(game, record.commands.clone())?;

    println!("=== Replay Complete ===");
    println!("Commands replayed: {}", record.commands.len());
    println!("Turns: {}", processor.game().turn.turn_number);
    match processor.game().winner() {
        Some(id) => println!("Winner: {}", processor.game().player(id)?.name),
        None => println!("Winner: none"),
    }
    println!(
        "Final state hash: {}",
        format_hash(compute_state_hash(processor.game()))
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn simulate_batch(
    deck1: PathBuf,
    deck2: PathBuf,
    hero1: String,
    hero2: String,
    games: usize,
    seed: u64,
    budget: usize,
    check_determinism: bool,
) -> Result<()> {
    let setups = [
        PlayerSetup::new("Player 1", hero1, DeckLoader::load_from_file(&deck1)?),
        PlayerSetup::new("Player 2", hero2, DeckLoader::load_from_file(&deck2)?),
    ];
    let config = SimulationConfig {
        games,
        base_seed: seed,
        command_budget: budget,
        check_determinism,
    };

    println!("Running {} games (seed {})...", games, seed);
    let report = run_simulation(&config, &setups)?;
    println!();
    print_report(&report, &setups);

    if report.determinism_mismatches > 0 {
        return Err(chainforge::EngineError::CorruptState(format!(
            "{} games diverged on re-run",
            report.determinism_mismatches
        )));
    }
    Ok(())
}
