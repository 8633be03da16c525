//! # asksage - model picker and prompt client
//!
//! Pick a model from the provider, send a prompt, read the completion. Credentials and
//! the model list are kept between runs.
//!
//! ## Modes
//! - Single prompt mode with `-p` or `--prompt`
//! - Interactive prompt loop (default)
//! - `config`, `models`, `completions` subcommands

mod cli;
mod core;
mod run;

use clap::{CommandFactory, Parser};
use dotenv::dotenv;

use cli::{Args, Commands, ConfigAction};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv().ok();

    let args = Args::parse();
    run::init_logger(&args);

    let config = core::config::load();
    log::debug!("{} {} (endpoint {})", core::app::NAME, core::app::VERSION, config.base_url);

    if let Some(cmd) = &args.command {
        match cmd {
            Commands::Config { action: None } => core::cli::run_config(&config),
            Commands::Config {
                action: Some(ConfigAction::Set { token, account }),
            } => core::cli::run_config_set(token.clone(), account.clone()),
            Commands::Models { query, refresh } => {
                core::cli::run_models(&config, query.as_deref(), *refresh).await
            }
            Commands::Completions { shell } => {
                let mut cmd = Args::command();
                cli::generate(*shell, &mut cmd, core::app::NAME, &mut std::io::stdout());
            }
        }
        return Ok(());
    }

    if args.prompt.is_some() {
        return run::run_single_prompt(&args, config).await;
    }

    run::run_interactive(&args, config).await
}
