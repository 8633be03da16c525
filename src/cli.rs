//! CLI definitions: argument parsing, subcommands, and help text.

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

pub use clap_complete::generate;

const AFTER_HELP: &str = "\
EXAMPLES:
  asksage                           Interactive prompt loop
  asksage -p \"explain X\"            Single prompt, print the response
  asksage -p - -m gpt-4o            Read prompt from stdin, pick the model
  asksage config                    Show settings paths and status
  asksage config set --account me@example.com
                                    Save credentials (token read from stdin)
  asksage models --refresh          Re-fetch and list available models
  asksage completions bash          Generate bash completions
";

/// Command-line arguments for the application.
#[derive(Parser)]
#[command(
    author,
    version,
    about = "Pick a model, send a prompt, read the completion",
    after_help = AFTER_HELP
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Send a single prompt then exit
    #[arg(
        short = 'p',
        long,
        help = "Provide a prompt to get an immediate response (use '-' to read from stdin)"
    )]
    pub prompt: Option<String>,

    /// Override the default model selection
    #[arg(short = 'm', long, help = "Model ID (e.g. gpt-4o-mini)")]
    pub model: Option<String>,

    /// Increase log verbosity (use multiple times for debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Reduce log output (errors only)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show settings paths, endpoint, and credential status
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// List available models
    Models {
        /// Filter models by id
        #[arg(long)]
        query: Option<String>,
        /// Fetch from the server even if the cache is fresh
        #[arg(long)]
        refresh: bool,
    },
    /// Generate shell completion script
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        #[arg(value_parser = clap::value_parser!(Shell))]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Save the access token and account
    Set {
        /// Access token (read from stdin when omitted)
        #[arg(long)]
        token: Option<String>,
        /// Account email
        #[arg(long)]
        account: Option<String>,
    },
}

impl Args {
    /// Log level based on -v/-q flags: error, warn, info, or debug.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose >= 2 {
            "debug"
        } else if self.verbose >= 1 {
            "info"
        } else {
            "warn"
        }
    }
}
