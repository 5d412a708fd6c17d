//! CLI command implementations.

use crate::output::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use laneboard_core::{Lane, Priority, Reassignment};
use laneboard_store::{config::CONFIG_FILE, BoardConfig, ClientStore, StoreError};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;

/// Effective configuration after layering flags over the config file.
#[derive(Debug)]
pub struct Settings {
    /// Config file that was read, or would be written by `init`.
    pub config_path: PathBuf,
    pub board: BoardConfig,
}

impl Settings {
    /// Load the config file (if any) and apply command-line overrides.
    pub fn resolve(config: Option<&Path>, database: Option<PathBuf>) -> Result<Self> {
        let config_path = config.map_or_else(|| PathBuf::from(CONFIG_FILE), Path::to_path_buf);

        let mut board = match BoardConfig::discover(config) {
            Ok(board) => board,
            // `init` creates the file, so a missing one only means defaults.
            Err(StoreError::ConfigNotFound(_)) => BoardConfig::default(),
            Err(err) => return Err(err).context("Failed to load config"),
        };

        if let Some(database) = database {
            board.database.path = database;
        }

        Ok(Self { config_path, board })
    }

    fn open_store(&self) -> Result<ClientStore> {
        ClientStore::open(&self.board.database.path).with_context(|| {
            format!(
                "Failed to open database at {}",
                self.board.database.path.display()
            )
        })
    }
}

/// Create the database and write the config file if it is missing.
pub fn init(settings: &Settings, format: OutputFormat) -> Result<()> {
    if !settings.config_path.exists() {
        std::fs::write(&settings.config_path, settings.board.to_yaml()?)
            .with_context(|| format!("Failed to write {}", settings.config_path.display()))?;
        info!(path = %settings.config_path.display(), "Wrote config");
    }

    settings.open_store()?.close()?;
    output::print_success(
        &format!(
            "Initialized board at {}",
            settings.board.database.path.display()
        ),
        format,
    )
}

/// Add a client at the bottom of a lane.
pub fn add(
    settings: &Settings,
    name: &str,
    status: &str,
    description: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let lane: Lane = status.parse()?;
    let mut store = settings.open_store()?;

    let client = store
        .create(name, description, lane)
        .context("Failed to add client")?;
    store.close()?;

    output::print(&client, format)
}

/// List clients, optionally limited to one lane.
pub fn list(settings: &Settings, status: Option<&str>, format: OutputFormat) -> Result<()> {
    let lane = status.map(str::parse::<Lane>).transpose()?;
    let clients = settings.open_store()?.list(lane)?;
    output::print_board(&clients, format)
}

/// Show a single client.
pub fn get(settings: &Settings, id: i64, format: OutputFormat) -> Result<()> {
    let client = settings
        .open_store()?
        .get(id)
        .context("Failed to get client")?;
    output::print(&client, format)
}

/// Move a client and print the reordered board.
pub fn move_client(
    settings: &Settings,
    id: i64,
    status: Option<&str>,
    priority: Option<i64>,
    format: OutputFormat,
) -> Result<()> {
    let lane = status.map(str::parse::<Lane>).transpose()?;
    let priority = priority.map(Priority::new).transpose()?;
    let request = Reassignment::new(id, lane, priority);

    let mut store = settings.open_store()?;
    let clients = store
        .reassign(&request)
        .with_context(|| format!("Failed to move client {id}"))?;
    store.close()?;

    output::print_board(&clients, format)
}

/// Report lanes that are not densely ranked; fails if any are found.
pub fn check(settings: &Settings, format: OutputFormat) -> Result<()> {
    let gaps = settings.open_store()?.check()?;
    output::print_gaps(&gaps, format)?;

    if !gaps.is_empty() {
        bail!("{} lane(s) are not densely ranked", gaps.len());
    }
    Ok(())
}

/// Run the HTTP API until Ctrl-C or SIGTERM.
pub fn serve(settings: Settings, host: Option<String>, port: Option<u16>) -> Result<()> {
    let host = host.unwrap_or_else(|| settings.board.server.host.clone());
    let port = port.unwrap_or(settings.board.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("Invalid listen address {host}:{port}"))?;

    let store = settings.open_store()?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        laneboard_server::serve(store, addr, laneboard_server::shutdown_signal()).await
    })
}
