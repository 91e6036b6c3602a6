use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the subtitle table
    Show {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Show the resolved prompt configuration
    Prompt {
        /// Prompt configuration file (overrides the configured path)
        #[arg(short, long)]
        prompt_file: Option<PathBuf>,
    },

    /// Translate a single row
    Translate {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Row to translate (1-based, as printed by `show`)
        #[arg(short, long)]
        row: usize,

        /// Write the translated subtitles to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Prompt configuration file (overrides the configured path)
        #[arg(short, long)]
        prompt_file: Option<PathBuf>,
    },

    /// Review a subtitle file interactively, translating rows on request
    Review {
        /// Input subtitle file
        #[arg(short, long)]
        input: PathBuf,

        /// Prompt configuration file (overrides the configured path)
        #[arg(short, long)]
        prompt_file: Option<PathBuf>,
    },
}
