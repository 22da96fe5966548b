use std::path::Path;

use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags, Row};
use tracing::debug;

use crate::error::{Error, Result};
use crate::network::{FacilityFlags, NetworkStore, Page, PageRequest, RawEdge, RawNode};

const NODES_TABLE: &str = "walking_nodes";
const LINKS_TABLE: &str = "walking_links";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS walking_nodes (
    node_id      TEXT NOT NULL,
    latitude     REAL NOT NULL,
    longitude    REAL NOT NULL,
    district     TEXT NOT NULL DEFAULT '',
    is_park      INTEGER NOT NULL DEFAULT 0,
    is_overpass  INTEGER NOT NULL DEFAULT 0,
    is_tunnel    INTEGER NOT NULL DEFAULT 0,
    is_building  INTEGER NOT NULL DEFAULT 0,
    is_bridge    INTEGER NOT NULL DEFAULT 0,
    is_crosswalk INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS walking_links (
    link_id         TEXT NOT NULL,
    start_node_id   TEXT,
    end_node_id     TEXT,
    distance_meters REAL,
    is_park         INTEGER NOT NULL DEFAULT 0,
    is_overpass     INTEGER NOT NULL DEFAULT 0,
    is_tunnel       INTEGER NOT NULL DEFAULT 0,
    is_building     INTEGER NOT NULL DEFAULT 0,
    is_bridge       INTEGER NOT NULL DEFAULT 0,
    is_crosswalk    INTEGER NOT NULL DEFAULT 0
);
";

const FLAG_COLUMNS: &str = "is_park, is_overpass, is_tunnel, is_building, is_bridge, is_crosswalk";

/// Network catalog stored in a SQLite database.
///
/// Identifier columns are read with dynamic typing: catalogs written by older
/// ingestion runs store ids as REAL, newer ones as INTEGER or TEXT. Every value
/// is rendered to text here and normalized by the graph builder.
#[derive(Debug)]
pub struct SqliteStore {
    connection: Mutex<Connection>,
}

impl SqliteStore {
    /// Open an existing catalog read-only and verify that both tables exist.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::DatabaseNotFound {
                path: path.to_path_buf(),
            });
        }

        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        for table in [NODES_TABLE, LINKS_TABLE] {
            if !table_exists(&connection, table)? {
                return Err(Error::UnsupportedSchema {
                    missing: table.to_string(),
                });
            }
        }

        debug!(path = %path.display(), "opened network catalog");
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Open (or create) a writable catalog and make sure the schema exists.
    pub fn initialize(path: &Path) -> Result<Self> {
        let connection = Connection::open(path)?;
        connection.execute_batch(SCHEMA)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    /// Wrap an already-open connection without schema checks.
    pub fn from_connection(connection: Connection) -> Self {
        Self {
            connection: Mutex::new(connection),
        }
    }

    /// Append nodes in a single transaction.
    pub fn insert_nodes(&self, nodes: &[RawNode]) -> Result<()> {
        let mut connection = self.connection.lock();
        let tx = connection.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {NODES_TABLE} (node_id, latitude, longitude, district, {FLAG_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ))?;
            for node in nodes {
                let f = node.flags;
                stmt.execute(params![
                    node.id,
                    node.latitude,
                    node.longitude,
                    node.district,
                    f.park,
                    f.overpass,
                    f.tunnel,
                    f.building,
                    f.bridge,
                    f.crosswalk
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Append links in a single transaction.
    pub fn insert_edges(&self, edges: &[RawEdge]) -> Result<()> {
        let mut connection = self.connection.lock();
        let tx = connection.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {LINKS_TABLE} (link_id, start_node_id, end_node_id, distance_meters, {FLAG_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
            ))?;
            for edge in edges {
                let f = edge.flags;
                stmt.execute(params![
                    edge.id,
                    edge.start_node_id,
                    edge.end_node_id,
                    edge.distance_meters,
                    f.park,
                    f.overpass,
                    f.tunnel,
                    f.building,
                    f.bridge,
                    f.crosswalk
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

impl NetworkStore for SqliteStore {
    fn node_page(&self, request: PageRequest) -> Result<Page<RawNode>> {
        let sql = format!(
            "SELECT node_id, latitude, longitude, district, {FLAG_COLUMNS} \
             FROM {NODES_TABLE} ORDER BY rowid LIMIT ?1 OFFSET ?2"
        );
        fetch_page(&self.connection.lock(), &sql, request, row_to_node)
    }

    fn edge_page(&self, request: PageRequest) -> Result<Page<RawEdge>> {
        let sql = format!(
            "SELECT link_id, start_node_id, end_node_id, distance_meters, {FLAG_COLUMNS} \
             FROM {LINKS_TABLE} ORDER BY rowid LIMIT ?1 OFFSET ?2"
        );
        fetch_page(&self.connection.lock(), &sql, request, row_to_edge)
    }
}

fn fetch_page<T>(
    connection: &Connection,
    sql: &str,
    request: PageRequest,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Page<T>> {
    // One extra row tells us whether another page follows.
    let limit = (request.size + 1) as i64;
    let offset = request.offset() as i64;

    let mut stmt = connection.prepare_cached(sql)?;
    let rows = stmt.query_map(params![limit, offset], map)?;

    let mut items = Vec::with_capacity(request.size);
    for row in rows {
        items.push(row?);
    }

    let has_next = items.len() > request.size;
    items.truncate(request.size);
    Ok(Page { items, has_next })
}

fn row_to_node(row: &Row<'_>) -> rusqlite::Result<RawNode> {
    Ok(RawNode {
        id: value_to_text(row.get(0)?),
        latitude: row.get(1)?,
        longitude: row.get(2)?,
        district: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        flags: flags_from_row(row, 4)?,
    })
}

fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<RawEdge> {
    Ok(RawEdge {
        id: value_to_text(row.get(0)?),
        start_node_id: value_to_text(row.get(1)?),
        end_node_id: value_to_text(row.get(2)?),
        distance_meters: row.get(3)?,
        flags: flags_from_row(row, 4)?,
    })
}

fn flags_from_row(row: &Row<'_>, first: usize) -> rusqlite::Result<FacilityFlags> {
    let flag = |offset: usize| -> rusqlite::Result<bool> {
        Ok(row.get::<_, Option<bool>>(first + offset)?.unwrap_or(false))
    };
    Ok(FacilityFlags {
        park: flag(0)?,
        overpass: flag(1)?,
        tunnel: flag(2)?,
        building: flag(3)?,
        bridge: flag(4)?,
        crosswalk: flag(5)?,
    })
}

fn value_to_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(v) => v.to_string(),
        Value::Real(v) => v.to_string(),
        Value::Text(v) => v,
        Value::Blob(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
    }
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let mut stmt = connection
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}
