//! Client table and the `LaneStore` adapter over it.

use crate::error::{Result, StoreError};
use laneboard_core::{
    density_violations, engine, Client, ClientId, CoreError, Lane, LaneGap, LaneStore, RankShift,
    Reassignment, ShiftDirection,
};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SCHEMA: &str = r"
    PRAGMA journal_mode=WAL;
    PRAGMA synchronous=NORMAL;

    CREATE TABLE IF NOT EXISTS clients (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      name TEXT NOT NULL,
      description TEXT,
      status TEXT NOT NULL CHECK (status IN ('backlog', 'in-progress', 'complete')),
      priority INTEGER NOT NULL CHECK (priority >= 1)
    );

    CREATE INDEX IF NOT EXISTS clients_status_priority ON clients(status, priority);
";

const SELECT_CLIENT: &str = "SELECT id, name, description, status, priority FROM clients";

/// Owns the single long-lived connection to the board database.
#[derive(Debug)]
pub struct ClientStore {
    /// Database file, or `None` for an in-memory store.
    path: Option<PathBuf>,
    conn: Connection,
}

impl ClientStore {
    /// Open (creating if needed) the database at `path`.
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or the schema cannot be created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(&path)?;
        let store = Self {
            path: Some(path),
            conn,
        };
        store.bootstrap()?;

        info!(path = %store.display_path(), "Opened client store");
        Ok(store)
    }

    /// Open a throwaway in-memory database.
    ///
    /// # Errors
    /// Returns error if the schema cannot be created.
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            path: None,
            conn: Connection::open_in_memory()?,
        };
        store.bootstrap()?;
        Ok(store)
    }

    fn bootstrap(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Database file backing this store.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn display_path(&self) -> String {
        self.path
            .as_ref()
            .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string())
    }

    /// List clients ordered by lane then priority, optionally limited to one lane.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn list(&self, lane: Option<Lane>) -> Result<Vec<Client>> {
        let lanes = SqlLanes::new(&self.conn);
        let mut clients = match lane {
            Some(lane) => lanes.get_by_lane(lane)?,
            None => lanes.get_all()?,
        };
        sort_board(&mut clients);
        Ok(clients)
    }

    /// Fetch one client.
    ///
    /// # Errors
    /// Returns `NotFound` if no client has this id.
    pub fn get(&self, id: ClientId) -> Result<Client> {
        SqlLanes::new(&self.conn)
            .get_by_id(id)?
            .ok_or(StoreError::NotFound(id))
    }

    /// Add a client at the bottom of `lane`.
    ///
    /// # Errors
    /// Returns `RankOverflow` if the lane's tail is already at `u32::MAX`,
    /// or error if the insert fails.
    pub fn create(
        &mut self,
        name: &str,
        description: Option<&str>,
        lane: Lane,
    ) -> Result<Client> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let priority = SqlLanes::new(&tx)
            .max_priority(lane)?
            .unwrap_or(0)
            .checked_add(1)
            .ok_or(CoreError::RankOverflow(lane))?;
        tx.execute(
            "INSERT INTO clients (name, description, status, priority) VALUES (?1, ?2, ?3, ?4)",
            params![name, description, lane.as_str(), priority],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        info!(id, lane = %lane, priority, "Created client");

        let mut client = Client::new(id, name, lane, priority);
        client.description = description.map(str::to_string);
        Ok(client)
    }

    /// Move a client and return the whole board, ordered by lane then priority.
    ///
    /// The read, every shift and the point update run in one immediate
    /// transaction; any error rolls all of them back.
    ///
    /// # Errors
    /// Returns `NotFound` for an unknown id, or a storage error.
    pub fn reassign(&mut self, request: &Reassignment) -> Result<Vec<Client>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut lanes = SqlLanes::new(&tx);
        let mut clients = match engine::reassign(&mut lanes, request) {
            Ok(clients) => clients,
            Err(CoreError::NotFound(id)) => return Err(StoreError::NotFound(id)),
            Err(err) => return Err(err.into()),
        };
        tx.commit()?;

        sort_board(&mut clients);
        Ok(clients)
    }

    /// Lanes whose priorities are not densely ranked.
    ///
    /// # Errors
    /// Returns error if the query fails.
    pub fn check(&self) -> Result<Vec<LaneGap>> {
        let clients = SqlLanes::new(&self.conn).get_all()?;
        Ok(density_violations(&clients))
    }

    /// Close the connection, surfacing any error SQLite reports on close.
    ///
    /// # Errors
    /// Returns error if SQLite fails to close cleanly.
    pub fn close(self) -> Result<()> {
        let path = self.display_path();
        self.conn.close().map_err(|(_, err)| StoreError::Sql(err))?;
        info!(path = %path, "Closed client store");
        Ok(())
    }
}

fn sort_board(clients: &mut [Client]) {
    clients.sort_by_key(|c| (c.status, c.priority, c.id));
}

fn storage_error(err: impl Display) -> CoreError {
    CoreError::Storage(err.to_string())
}

/// [`LaneStore`] over a borrowed connection or transaction.
pub struct SqlLanes<'c> {
    conn: &'c Connection,
}

impl<'c> SqlLanes<'c> {
    /// Wrap a connection; pass a `&Transaction` to make writes atomic.
    #[must_use]
    pub const fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    fn query(&self, sql: &str, params: impl rusqlite::Params) -> laneboard_core::Result<Vec<Client>> {
        let mut stmt = self.conn.prepare(sql).map_err(storage_error)?;
        let rows = stmt.query_map(params, read_row).map_err(storage_error)?;

        rows.map(|row| row.map_err(storage_error).and_then(to_client))
            .collect()
    }
}

/// Raw column values of one `clients` row.
struct ClientRow {
    id: ClientId,
    name: String,
    description: Option<String>,
    status: String,
    priority: i64,
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<ClientRow> {
    Ok(ClientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        priority: row.get(4)?,
    })
}

fn to_client(row: ClientRow) -> laneboard_core::Result<Client> {
    let corrupt = |reason: String| {
        storage_error(StoreError::CorruptRow {
            id: row.id,
            reason,
        })
    };

    let status = row
        .status
        .parse::<Lane>()
        .map_err(|err| corrupt(err.to_string()))?;
    let priority = u32::try_from(row.priority)
        .map_err(|_| corrupt(format!("priority {} out of range", row.priority)))?;

    Ok(Client {
        id: row.id,
        name: row.name,
        description: row.description,
        status,
        priority,
    })
}

impl LaneStore for SqlLanes<'_> {
    fn get_by_id(&self, id: ClientId) -> laneboard_core::Result<Option<Client>> {
        self.conn
            .query_row(&format!("{SELECT_CLIENT} WHERE id = ?1"), params![id], read_row)
            .optional()
            .map_err(storage_error)?
            .map(to_client)
            .transpose()
    }

    fn get_all(&self) -> laneboard_core::Result<Vec<Client>> {
        self.query(SELECT_CLIENT, [])
    }

    fn get_by_lane(&self, lane: Lane) -> laneboard_core::Result<Vec<Client>> {
        self.query(
            &format!("{SELECT_CLIENT} WHERE status = ?1"),
            params![lane.as_str()],
        )
    }

    fn apply_shift(&mut self, shift: &RankShift) -> laneboard_core::Result<()> {
        let sql = match shift.direction {
            ShiftDirection::Down => {
                "UPDATE clients SET priority = priority - 1
                 WHERE status = ?1 AND priority > ?2 AND (?3 IS NULL OR priority <= ?3)"
            }
            ShiftDirection::Up => {
                "UPDATE clients SET priority = priority + 1
                 WHERE status = ?1 AND priority >= ?2 AND (?3 IS NULL OR priority < ?3)"
            }
        };

        let changed = self
            .conn
            .execute(
                sql,
                params![shift.lane.as_str(), shift.low, shift.high],
            )
            .map_err(storage_error)?;

        debug!(lane = %shift.lane, direction = ?shift.direction, changed, "Shifted priorities");
        Ok(())
    }

    fn set_item(&mut self, id: ClientId, lane: Lane, priority: u32) -> laneboard_core::Result<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE clients SET status = ?2, priority = ?3 WHERE id = ?1",
                params![id, lane.as_str(), priority],
            )
            .map_err(storage_error)?;

        if changed == 0 {
            return Err(CoreError::NotFound(id));
        }
        Ok(())
    }

    fn max_priority(&self, lane: Lane) -> laneboard_core::Result<Option<u32>> {
        let max: Option<i64> = self
            .conn
            .query_row(
                "SELECT MAX(priority) FROM clients WHERE status = ?1",
                params![lane.as_str()],
                |row| row.get(0),
            )
            .map_err(storage_error)?;

        max.map(|p| u32::try_from(p).map_err(storage_error))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use laneboard_core::Priority;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn setup() -> ClientStore {
        let mut store = ClientStore::in_memory().unwrap();
        for name in ["Acme", "Birch", "Cobalt"] {
            store.create(name, None, Lane::Backlog).unwrap();
        }
        for name in ["Dune", "Ember"] {
            store.create(name, None, Lane::InProgress).unwrap();
        }
        store
    }

    fn placements(store: &ClientStore) -> BTreeMap<String, (Lane, u32)> {
        store
            .list(None)
            .unwrap()
            .into_iter()
            .map(|c| (c.name, (c.status, c.priority)))
            .collect()
    }

    fn id_of(store: &ClientStore, name: &str) -> ClientId {
        store
            .list(None)
            .unwrap()
            .into_iter()
            .find(|c| c.name == name)
            .unwrap()
            .id
    }

    #[test]
    fn test_create_appends_to_lane() {
        let store = setup();

        let backlog = store.list(Some(Lane::Backlog)).unwrap();
        let ranks: Vec<_> = backlog.iter().map(|c| (c.name.as_str(), c.priority)).collect();
        assert_eq!(ranks, vec![("Acme", 1), ("Birch", 2), ("Cobalt", 3)]);
        assert!(store.check().unwrap().is_empty());
    }

    #[test]
    fn test_get_unknown_client() {
        let store = setup();
        assert!(matches!(store.get(404), Err(StoreError::NotFound(404))));
    }

    #[test]
    fn test_reassign_within_lane() {
        let mut store = setup();
        let birch = id_of(&store, "Birch");

        let request = Reassignment::new(birch, None, Some(Priority::new(1).unwrap()));
        let board = store.reassign(&request).unwrap();

        assert_eq!(board.len(), 5);
        let placed = placements(&store);
        assert_eq!(placed["Acme"], (Lane::Backlog, 2));
        assert_eq!(placed["Birch"], (Lane::Backlog, 1));
        assert_eq!(placed["Cobalt"], (Lane::Backlog, 3));
    }

    #[test]
    fn test_reassign_across_lanes() {
        let mut store = setup();
        let acme = id_of(&store, "Acme");

        store
            .reassign(&Reassignment::new(acme, Some(Lane::InProgress), None))
            .unwrap();
        let placed = placements(&store);
        assert_eq!(placed["Acme"], (Lane::InProgress, 3));
        assert_eq!(placed["Birch"], (Lane::Backlog, 1));
        assert_eq!(placed["Cobalt"], (Lane::Backlog, 2));

        let request = Reassignment::parse(acme, Some("complete"), Some(&json!("1"))).unwrap();
        store.reassign(&request).unwrap();
        assert_eq!(placements(&store)["Acme"], (Lane::Complete, 1));
        assert!(store.check().unwrap().is_empty());
    }

    #[test]
    fn test_failed_reassign_leaves_board_untouched() {
        let mut store = setup();
        let before = placements(&store);

        let result = store.reassign(&Reassignment::new(999, Some(Lane::Complete), None));
        assert!(matches!(result, Err(StoreError::NotFound(999))));
        assert_eq!(placements(&store), before);
    }

    #[test]
    fn test_largest_priority_keeps_board_usable() {
        let mut store = setup();
        let acme = id_of(&store, "Acme");
        let dune = id_of(&store, "Dune");
        let ember = id_of(&store, "Ember");
        let top = Priority::new(i64::from(Priority::MAX)).unwrap();

        store.reassign(&Reassignment::new(acme, None, Some(top))).unwrap();
        store
            .reassign(&Reassignment::new(dune, Some(Lane::Backlog), None))
            .unwrap();
        store
            .reassign(&Reassignment::new(ember, Some(Lane::Backlog), Some(Priority::new(1).unwrap())))
            .unwrap();

        let placed = placements(&store);
        assert_eq!(placed["Ember"], (Lane::Backlog, 1));
        assert_eq!(placed["Birch"], (Lane::Backlog, 2));
        assert_eq!(placed["Cobalt"], (Lane::Backlog, 3));
        assert_eq!(placed["Acme"], (Lane::Backlog, Priority::MAX + 1));
        assert_eq!(placed["Dune"], (Lane::Backlog, Priority::MAX + 2));

        let added = store.create("Fable", None, Lane::Backlog).unwrap();
        assert_eq!(added.priority, Priority::MAX + 3);
    }

    #[test]
    fn test_create_refuses_rank_past_u32() {
        let mut store = setup();
        store
            .conn
            .execute(
                "UPDATE clients SET priority = ?1 WHERE name = 'Cobalt'",
                params![u32::MAX],
            )
            .unwrap();

        let result = store.create("Fable", None, Lane::Backlog);
        assert!(matches!(
            result,
            Err(StoreError::Core(CoreError::RankOverflow(Lane::Backlog)))
        ));
        assert_eq!(store.list(Some(Lane::Backlog)).unwrap().len(), 3);
    }

    #[test]
    fn test_board_persists_across_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("data/board.db");

        let mut store = ClientStore::open(&path).unwrap();
        let first = store.create("Acme", Some("first client"), Lane::Backlog).unwrap();
        store.create("Birch", None, Lane::Backlog).unwrap();
        store
            .reassign(&Reassignment::new(first.id, None, Some(Priority::new(2).unwrap())))
            .unwrap();
        store.close().unwrap();

        let store = ClientStore::open(&path).unwrap();
        let acme = store.get(first.id).unwrap();
        assert_eq!(acme.priority, 2);
        assert_eq!(acme.description.as_deref(), Some("first client"));
        assert_eq!(store.path(), Some(path.as_path()));
    }

    #[test]
    fn test_check_reports_damaged_lane() {
        let store = setup();
        store
            .conn
            .execute("UPDATE clients SET priority = 7 WHERE name = 'Cobalt'", [])
            .unwrap();

        let gaps = store.check().unwrap();
        assert_eq!(gaps.len(), 1);
        assert_eq!(gaps[0].lane, Lane::Backlog);
        assert_eq!(gaps[0].missing(), vec![3]);
    }
}
