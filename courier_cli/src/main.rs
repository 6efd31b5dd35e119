use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

use crate::{optimize::OptimizeArgs, status::StatusArgs};

mod file_utils;
mod optimize;
mod parsers;
mod status;
mod tables;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Plans the day's routes and saves them
    #[command(visible_alias = "o")]
    Optimize {
        #[command(flatten)]
        args: OptimizeArgs,
    },
    /// Replays a saved route and reports package and truck status at a time of day
    #[command(visible_alias = "s")]
    Status {
        #[command(flatten)]
        args: StatusArgs,
    },
}

fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Commands::Optimize { args } => optimize::run(args)?,
        Commands::Status { args } => status::run(args)?,
    }

    Ok(())
}
