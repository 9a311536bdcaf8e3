//! LitePub CLI for talking to ActivityPub servers.
//!
//! This tool provides commands for:
//! - Resolving `name@domain` identifiers through webfinger
//! - Fetching actors, notes, following lists and outboxes
//! - Generating RSA key pairs for signing
//! - Delivering signed activities to remote inboxes

use clap::{Parser, Subcommand};
use litepub_common::fetch::ObjectFetcher;
use litepub_common::http_client::UreqClient;
use litepub_common::logging::init_logging;
use log::LevelFilter;
use std::path::{Path, PathBuf};

mod config;
mod deliver;
mod error;
mod keys;
mod lookup;

use error::CliError;

#[derive(Parser)]
#[command(name = "lpcli")]
#[command(about = "LitePub CLI for federated actor lookups and signed delivery")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML configuration file (defaults to the built-in settings)
    #[arg(long, short, global = true, env = "LITEPUB_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve name@domain to an actor URL via webfinger
    Resolve {
        /// Identifier such as alice@social.example
        identifier: String,
    },

    /// Fetch and print an actor
    Actor {
        /// Actor URL or name@domain
        target: String,
    },

    /// Fetch and print a note
    Note {
        /// Note URL
        url: String,
    },

    /// List the actors someone follows
    Following {
        /// Actor URL or name@domain
        target: String,
    },

    /// List an actor's recent notes
    Notes {
        /// Actor URL or name@domain
        target: String,
    },

    /// Generate an RSA key pair
    Keygen {
        /// Derive the key from an 8-hex-digit seed (testing only)
        #[arg(long)]
        seed: Option<String>,

        /// Write the private key here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// POST a signed activity to an inbox
    Deliver {
        /// Inbox URL or name@domain of the recipient
        #[arg(long, short)]
        target: String,

        /// Path to the activity JSON
        #[arg(long, short)]
        activity: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Path to the TOML configuration file
        #[arg(long, short)]
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    if let Err(e) = init_logging(level) {
        eprintln!("Warning: {:?}", e);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Keygen { seed, output } => keys::generate(seed, output),
        Commands::Validate { file } => config::validate(file),
        command => run_remote(command, cli.config.as_deref()),
    }
}

fn run_remote(command: Commands, config_file: Option<&Path>) -> Result<(), CliError> {
    let settings = config::load_settings(config_file)?;
    let client = UreqClient::from_settings(&settings.http);
    let fetcher = ObjectFetcher::new(&client);

    match command {
        Commands::Resolve { identifier } => lookup::resolve(&client, &identifier),
        Commands::Actor { target } => lookup::show_actor(&fetcher, &target),
        Commands::Note { url } => lookup::show_note(&fetcher, &url),
        Commands::Following { target } => lookup::following(&fetcher, &target),
        Commands::Notes { target } => lookup::notes(&fetcher, &target),
        Commands::Deliver { target, activity } => {
            deliver::deliver(&fetcher, &settings, &target, activity)
        }
        Commands::Keygen { .. } | Commands::Validate { .. } => Ok(()),
    }
}
