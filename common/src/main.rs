use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use minesweeper_ai::*;
use tracing_subscriber::EnvFilter;

/// Autonomous Minesweeper bot: plays proven-safe cells, guesses otherwise.
#[derive(Parser, Debug)]
#[command(name = "minesweeper-bot", version, about, long_about = None)]
struct Args {
    /// Board height
    #[arg(long, default_value_t = 8)]
    height: usize,

    /// Board width
    #[arg(long, default_value_t = 8)]
    width: usize,

    /// Number of mines
    #[arg(long, short = 'm', default_value_t = 8)]
    mines: usize,

    /// Seed for the layout and the guesses
    #[arg(long, short = 's')]
    seed: Option<u64>,

    /// Number of games to play
    #[arg(long, short = 'g', default_value_t = 1)]
    games: usize,

    /// Pause between moves, in milliseconds
    #[arg(long, default_value_t = 0)]
    delay_ms: u64,

    /// Check every deduction against the SAT solver after each move
    #[arg(long)]
    audit: bool,

    /// Log inference details
    #[arg(long, short = 'v')]
    verbose: bool,
}

impl Args {
    fn config(&self) -> GameConfig {
        let config = GameConfig::new(self.height, self.width, self.mines);
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = args.config();
    config.validate().context("invalid board configuration")?;
    let mut rng = config.rng();

    let mut wins = 0;
    for round in 1..=args.games {
        let mut game = Game::from_config(&config, &mut rng)?;
        let show = args.games == 1;

        if show {
            println!("--- Minesweeper Bot ---");
            println!("Strategy: play cells proven safe, guess randomly otherwise.");
            println!("{}", game.field().render());
        }

        let mut move_count = 0;
        while game.state() == GameState::Playing {
            move_count += 1;
            let step = game.step(&mut rng)?;

            if show {
                let how = match step.kind {
                    MoveKind::Safe => "safe",
                    MoveKind::Random => "guess",
                };
                println!(
                    "\n--- Move #{move_count}: ({}, {}) [{how}] ---",
                    step.cell.row, step.cell.col
                );
                print_board(&game);
            }

            if args.audit {
                let unsound = game.audit().context("audit failed")?;
                anyhow::ensure!(unsound.is_empty(), "unsound deductions: {unsound:?}");
            }

            if args.delay_ms > 0 {
                thread::sleep(Duration::from_millis(args.delay_ms));
            }
        }

        if game.state() == GameState::Won {
            wins += 1;
        }
        tracing::info!(round, moves = move_count, state = ?game.state(), "game over");
    }

    println!("\n--- Result ---");
    println!("won {wins} of {} games", args.games);
    Ok(())
}

fn print_board(game: &Game) {
    let size = game.field().size();
    let agent = game.agent();

    print!("   ");
    for col in 0..size.width {
        print!("{:^3}", col);
    }
    println!("\n  +{}", "---".repeat(size.width));

    for row in 0..size.height {
        print!("{:^2}|", row);
        for col in 0..size.width {
            let cell = Cell::new(row, col);
            let display = match game.revealed().get(&cell) {
                Some(0) => " . ".to_string(),
                Some(n) => format!(" {} ", n),
                None if agent.mines().contains(&cell) => " F ".to_string(),
                None if game.field().is_mine(cell) && game.state() == GameState::Lost => {
                    " X ".to_string()
                }
                None => " ■ ".to_string(),
            };
            print!("{}", display);
        }
        println!();
    }
}
