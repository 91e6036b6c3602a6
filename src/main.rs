//! srt-translator - Subtitle review with on-demand LLM translation
//!
//! Entry point: parses arguments, sets up logging, loads configuration and
//! dispatches to the review commands.

use std::path::PathBuf;
use std::sync::Arc;
use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tracing_appender::{non_blocking, rolling};

use srt_translator::cli::{Args, Commands};
use srt_translator::config::Config;
use srt_translator::credentials::StdinPrompt;
use srt_translator::prompt::PromptPreview;
use srt_translator::review::Reviewer;
use srt_translator::session::Session;
use srt_translator::subtitle::load_srt;
use srt_translator::table::{render_row, render_table};
use srt_translator::translate::openai::OpenAiClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if std::path::Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Show { input } => {
            let session = Session::new(load_srt(&input).await?);
            println!("{}", render_table(&session));
        }
        Commands::Prompt { prompt_file } => {
            let path = prompt_file.unwrap_or(config.review.prompt_path);
            println!("{}", PromptPreview::from_file(&path).render());
        }
        Commands::Translate { input, row, output, prompt_file } => {
            override_prompt_path(&mut config, prompt_file);
            let client = Arc::new(OpenAiClient::new(&config.translate));
            let mut reviewer = Reviewer::new(config, client);
            reviewer.load_file(&input).await?;

            let Some(index) = row.checked_sub(1) else {
                anyhow::bail!("Rows are numbered from 1");
            };
            let written = reviewer.translate(index, &mut StdinPrompt).await?;
            for index in written {
                if let Some(line) = render_row(reviewer.session(), index) {
                    println!("{}", line);
                }
            }

            if let Some(output) = output {
                reviewer.export(&output).await?;
                info!("Translated subtitles written to {}", output.display());
            }
        }
        Commands::Review { input, prompt_file } => {
            override_prompt_path(&mut config, prompt_file);
            info!("Reviewing subtitle file: {}", input.display());
            let client = Arc::new(OpenAiClient::new(&config.translate));
            let mut reviewer = Reviewer::new(config, client);
            reviewer.load_file(&input).await?;

            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            reviewer.run_interactive(stdin).await?;
        }
    }

    Ok(())
}

fn override_prompt_path(config: &mut Config, prompt_file: Option<PathBuf>) {
    if let Some(path) = prompt_file {
        config.review.prompt_path = path;
    }
}

/// Setup logging to stderr and a daily rolling file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".srt-translator").join("log");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = rolling::daily(&log_dir, "srt-translator.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);
    // The guard flushes on drop; it has to live as long as the process
    std::mem::forget(guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    // stdout carries the table
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_file(verbose)
        .with_line_number(verbose);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("srt-translator.log").display());

    Ok(())
}
