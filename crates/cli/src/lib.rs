pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "aqibot",
    about = "aqibot operator CLI",
    long_about = "Inspect aqibot configuration, check readiness, debug command resolution, and post readings to a Slack webhook.",
    after_help = "Examples:\n  aqibot doctor --json\n  aqibot config\n  aqibot resolve 'city \"Salt Lake City\" Utah USA'\n  aqibot post 'cigarettes nyc'"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, signing secret, provider key, and webhook readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Show how slash-command text resolves, without fetching anything")]
    Resolve {
        #[arg(help = "Command text as typed after the slash command")]
        text: String,
        #[arg(long, default_value = commands::CLI_USER_ID, help = "Slack user id to resolve as")]
        user: String,
    },
    #[command(about = "Resolve text, fetch the reading, and post it to slack.webhook_url")]
    Post {
        #[arg(help = "Command text as typed after the slash command")]
        text: String,
        #[arg(long, default_value = commands::CLI_USER_ID, help = "Slack user id to resolve as")]
        user: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Resolve { text, user } => commands::resolve::run(&text, &user),
        Command::Post { text, user } => commands::post::run(&text, &user),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
