use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "rrqueue",
    about = "Dispatch queue operations across connections in round-robin order",
    version = env!("CARGO_PKG_VERSION"),
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, env = "RRQUEUE_CONFIG", help = "Path to the JSON config file")]
    pub config: Option<PathBuf>,

    #[arg(short, long, default_value = "info", help = "Log level when RUST_LOG is unset")]
    pub log_level: String,
}

#[derive(Args, Debug, Clone)]
pub struct Target {
    #[arg(long, help = "Connection name (defaults to queue.default)")]
    pub connection: Option<String>,

    #[arg(long, help = "Queue name on the connection")]
    pub queue: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(about = "Push a job")]
    Push {
        #[arg(help = "Job name")]
        job: String,

        #[arg(long, help = "Job payload as JSON (plain strings are accepted)")]
        payload: Option<String>,

        #[arg(long, default_value_t = 1, help = "Push the job this many times")]
        repeat: u32,

        #[command(flatten)]
        target: Target,
    },

    #[command(about = "Push a raw payload")]
    PushRaw {
        #[arg(help = "Raw payload string")]
        payload: String,

        #[arg(long, help = "Push options as a JSON object")]
        options: Option<String>,

        #[command(flatten)]
        target: Target,
    },

    #[command(about = "Push a job that becomes available after a delay")]
    Later {
        #[arg(help = "Delay in seconds")]
        delay: u64,

        #[arg(help = "Job name")]
        job: String,

        #[arg(long, help = "Job payload as JSON (plain strings are accepted)")]
        payload: Option<String>,

        #[command(flatten)]
        target: Target,
    },

    #[command(about = "Number of jobs on a queue")]
    Size {
        #[command(flatten)]
        target: Target,
    },

    #[command(about = "Pop the next available job")]
    Pop {
        #[command(flatten)]
        target: Target,
    },

    #[command(about = "Show rotation order and the next target of a round-robin connection")]
    Status {
        #[arg(long, help = "Connection name (defaults to queue.default)")]
        connection: Option<String>,
    },

    #[command(about = "Write an example config file")]
    Init {
        #[arg(long, help = "Overwrite an existing file")]
        force: bool,
    },
}
