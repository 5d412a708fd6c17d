//! laneboard CLI - Client lanes and priorities from the command line.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "laneboard")]
#[command(author, version, about = "Client lane and priority board")]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "human")]
    format: output::OutputFormat,

    /// Config file (defaults to ./laneboard.yml when present)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides the config file)
    #[arg(long, short = 'd', global = true, env = "LANEBOARD_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and write a default config file
    Init,

    /// Add a client at the bottom of a lane
    Add {
        /// Client name
        name: String,

        /// Lane to add the client to
        #[arg(long, short = 's', default_value = "backlog")]
        status: String,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// List clients
    #[command(alias = "ls")]
    List {
        /// Only show one lane
        #[arg(long, short = 's')]
        status: Option<String>,
    },

    /// Show a client by id
    Get {
        /// Client id
        id: i64,
    },

    /// Move a client to another priority and/or lane
    #[command(alias = "mv")]
    Move {
        /// Client id
        id: i64,

        /// Target lane
        #[arg(long, short = 's')]
        status: Option<String>,

        /// Target priority (1 is most urgent)
        #[arg(long, short = 'p', allow_negative_numbers = true)]
        priority: Option<i64>,
    },

    /// Verify every lane is ranked 1..n without gaps or duplicates
    Check,

    /// Start the HTTP API
    Serve {
        /// Port to listen on (overrides the config file)
        #[arg(long, short = 'p')]
        port: Option<u16>,

        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = commands::Settings::resolve(cli.config.as_deref(), cli.database)?;

    match cli.command {
        Commands::Init => commands::init(&settings, cli.format),
        Commands::Add {
            name,
            status,
            description,
        } => commands::add(&settings, &name, &status, description.as_deref(), cli.format),
        Commands::List { status } => commands::list(&settings, status.as_deref(), cli.format),
        Commands::Get { id } => commands::get(&settings, id, cli.format),
        Commands::Move {
            id,
            status,
            priority,
        } => commands::move_client(&settings, id, status.as_deref(), priority, cli.format),
        Commands::Check => commands::check(&settings, cli.format),
        Commands::Serve { port, host } => commands::serve(settings, host, port),
    }
}
