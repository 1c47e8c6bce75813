use clap::{Parser, Subcommand};

/// Veno — quizzes, streaks, and study presence from the terminal.
#[derive(Parser, Debug)]
#[command(name = "veno", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the resolved configuration as JSON.
    Config,

    /// Connect to the realtime service and stream who is online.
    Presence {
        /// User id to present as.
        #[arg(long)]
        user_id: String,

        /// Email used to derive the display username.
        #[arg(long)]
        email: Option<String>,
    },

    /// Run a quiz from a JSON question file.
    Quiz {
        /// Path to a JSON array of questions.
        file: String,

        /// Time limit in seconds (defaults to the configured duration).
        #[arg(long)]
        duration: Option<u64>,
    },
}

pub fn parse() -> Args {
    Args::parse()
}
