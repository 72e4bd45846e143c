mod api;
mod app;
mod commands;
mod config;
mod errors;
mod export;
mod format;
mod logging;
mod output;
mod parse;
mod prompts;
mod spinner;
mod typing;
mod views;

use clap::{Parser, Subcommand};

use crate::app::Runtime;
use crate::commands::chat::ChatArgs;
use crate::commands::config::ConfigCommand;
use crate::commands::quiz::QuizArgs;
use crate::commands::rewrite::RewriteArgs;
use crate::commands::summarize::SummarizeArgs;
use crate::errors::CliError;
use crate::output::{OutputMode, print_error};

#[derive(Debug, Parser)]
#[command(
    name = "intellistudy",
    version,
    about = "IntelliStudy study assistant: summarize, rewrite, quiz and chat from the terminal."
)]
struct Cli {
    #[arg(long, global = true)]
    profile: Option<String>,
    #[arg(long = "api-url", global = true)]
    api_url: Option<String>,
    /// Model name sent with every request
    #[arg(long, global = true)]
    model: Option<String>,
    #[arg(long, global = true)]
    json: bool,
    #[arg(long, global = true)]
    quiet: bool,
    /// Request timeout in milliseconds; 0 waits indefinitely
    #[arg(long, global = true, default_value_t = 0)]
    timeout: u64,
    /// Ask for one complete response instead of an event stream
    #[arg(long = "no-stream", global = true)]
    no_stream: bool,
    #[arg(long, global = true)]
    verbose: bool,
    #[arg(long, global = true)]
    debug: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Condense text into its key points
    Summarize(SummarizeArgs),
    /// Rephrase text in another style
    Rewrite(RewriteArgs),
    /// Generate a multiple-choice quiz and take it
    Quiz(QuizArgs),
    /// Talk to the study assistant
    Chat(ChatArgs),
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let output = OutputMode {
        json: cli.json,
        quiet: cli.quiet,
        verbose: cli.verbose,
        debug: cli.debug,
    };
    logging::init(&output);

    let result = run(cli, output.clone()).await;
    if let Err(err) = result {
        print_error(&err, &output);
        std::process::exit(err.exit_code());
    }
}

async fn run(cli: Cli, output: OutputMode) -> Result<(), CliError> {
    let config = config::load_config()?;
    let config_path = config::config_path()?;

    let mut runtime = Runtime {
        output,
        config,
        config_path,
        profile_override: cli.profile,
        api_url_override: cli.api_url,
        model_override: cli.model,
        timeout_ms: cli.timeout,
        stream: !cli.no_stream,
    };

    match cli.command {
        Commands::Summarize(args) => commands::summarize::handle(&runtime, args).await,
        Commands::Rewrite(args) => commands::rewrite::handle(&runtime, args).await,
        Commands::Quiz(args) => commands::quiz::handle(&runtime, args).await,
        Commands::Chat(args) => commands::chat::handle(&runtime, args).await,
        Commands::Config { command } => commands::config::handle(&mut runtime, command).await,
    }
}
