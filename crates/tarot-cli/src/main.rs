//! Terminal frontend for the tarot reader.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use tarot_core::{CoreError, Locale};

#[derive(Parser)]
#[command(
    name = "tarot",
    about = "Tarot reader: draw cards by number and receive an AI interpretation",
    version,
    propagate_version = true
)]
struct Cli {
    /// Display language (zh-TW or en)
    #[arg(short, long, global = true, default_value = "zh-TW", value_parser = parse_locale)]
    lang: Locale,

    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive reading
    Read {
        /// Seed for deterministic shuffles
        #[arg(short, long)]
        seed: Option<u64>,

        /// Per-call timeout for the interpretation engine, in seconds
        #[arg(short, long, default_value_t = 120)]
        timeout: u64,

        /// Use the built-in offline engine instead of Gemini
        #[arg(long)]
        offline: bool,

        /// Directory where summary cards and transcripts are written
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// List the 78 cards of the canonical deck
    Deck {
        /// Only list the Major Arcana
        #[arg(short, long)]
        major: bool,

        /// Output format (table or json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// List the available spreads and their positions
    Spreads,

    /// Shuffle and resolve draw numbers without contacting any engine
    Draw {
        /// Spread to draw for (single, three, celtic)
        #[arg(short = 'p', long, default_value = "three")]
        spread: String,

        /// Seed for a deterministic shuffle
        #[arg(short, long)]
        seed: Option<u64>,

        /// One number between 1 and 78 per spread position
        numbers: Vec<String>,
    },
}

fn parse_locale(s: &str) -> Result<Locale, String> {
    Locale::parse(s).ok_or_else(|| CoreError::UnknownLocale(s.to_string()).to_string())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    tracing::debug!(verbose = cli.verbose, lang = %cli.lang, "tarot started");

    let result = match cli.command {
        Commands::Read {
            seed,
            timeout,
            offline,
            out_dir,
        } => commands::read::run(commands::read::ReadOptions {
            locale: cli.lang,
            seed,
            timeout,
            offline,
            out_dir,
        }),
        Commands::Deck { major, format } => commands::deck::run(cli.lang, major, &format),
        Commands::Spreads => commands::spreads::run(cli.lang),
        Commands::Draw {
            spread,
            seed,
            numbers,
        } => commands::draw::run(cli.lang, &spread, seed, &numbers),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
