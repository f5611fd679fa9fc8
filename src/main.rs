//! takedeck - terminal player for arrangements of alternate takes.
//!
//! An arrangement lists sections (songs), each made of track slots holding one
//! or two alternate recordings. Every build draws one take per slot, lays the
//! takes end to end with a short overlap and plays the section as one
//! continuous timeline. When the last section finishes, fresh takes are drawn
//! and playback starts over.

use clap::{CommandFactory, Parser, Subcommand, builder::PossibleValuesParser};
use clap_complete::{Generator, Shell, generate};
use std::error::Error;
use std::io;
use takedeck::config::SETTABLE_KEYS;

mod cli;

#[derive(Parser)]
#[command(name = "takedeck")]
#[command(about = "Play arrangements of alternate takes as continuous timelines")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Show or change the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Generate shell completions
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Play an arrangement file
    Play {
        /// Arrangement TOML file
        arrangement: String,
        /// Keep time without opening an audio device
        #[arg(short, long)]
        silent: bool,
        /// Seed for take selection, for repeatable draws
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Print RMS waveforms for audio files
    Analyze {
        /// WAV or FLAC files
        #[arg(required = true)]
        files: Vec<String>,
        /// RMS frames per second (defaults to the configured value)
        #[arg(short, long)]
        rate: Option<f64>,
        /// Columns used to draw each waveform
        #[arg(short, long, default_value_t = 72)]
        width: usize,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// View current configuration
    View,
    /// Set a configuration value
    Set {
        /// Configuration key
        #[arg(value_parser = PossibleValuesParser::new(SETTABLE_KEYS))]
        key: String,
        /// Configuration value
        value: String,
    },
    /// Edit configuration file in your editor
    Edit,
}

fn print_completions<G: Generator>(generator: G, cmd: &mut clap::Command) {
    generate(
        generator,
        cmd,
        cmd.get_name().to_string(),
        &mut io::stdout(),
    );
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            cli::init::handle_init()?;
        }
        Commands::Config { action } => match action {
            ConfigAction::View => {
                cli::config::handle_config_view()?;
            }
            ConfigAction::Set { key, value } => {
                cli::config::handle_config_set(&key, &value)?;
            }
            ConfigAction::Edit => {
                cli::config::handle_config_edit()?;
            }
        },
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            print_completions(shell, &mut cmd);
        }
        Commands::Play {
            arrangement,
            silent,
            seed,
        } => {
            cli::play::handle_play(&arrangement, silent, seed)?;
        }
        Commands::Analyze { files, rate, width } => {
            cli::analyze::handle_analyze(&files, rate, width)?;
        }
    }

    Ok(())
}
