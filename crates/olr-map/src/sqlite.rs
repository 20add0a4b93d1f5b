//! SQLite road store.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE lines (
//!     id TEXT PRIMARY KEY, fow INTEGER, frc INTEGER, direction INTEGER,
//!     start_id TEXT, end_id TEXT, length REAL,
//!     geom TEXT,                        -- JSON [[x, y], ...]
//!     min_lon REAL, min_lat REAL, max_lon REAL, max_lat REAL
//! );
//! CREATE TABLE nodes (id TEXT PRIMARY KEY, lon REAL, lat REAL);
//! ```
//!
//! Table names and the CRS of the stored coordinates come from
//! [`StoreConfig`]; the `lon`/`lat` columns hold Web Mercator x/y for an
//! EPSG:3857 database.  Proximity queries use the per-row bounding-box
//! columns and their index.

use std::path::Path;

use geo::Rect;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};

use olr_core::{Coordinates, Fow, Frc};
use olr_geo::Crs;

use crate::store::{Direction, IntersectionRow, RoadRow, RoadStore};
use crate::{MapError, MapResult};

/// Table names and CRS used by [`SqliteStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StoreConfig {
    pub lines_table: String,
    pub nodes_table: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub crs:         Crs,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { lines_table: "lines".into(), nodes_table: "nodes".into(), crs: Crs::Wgs84 }
    }
}

/// Columns selected for every road query, in [`road_from_row`] order.
const ROAD_COLUMNS: &str = "id, fow, frc, direction, start_id, end_id, length, geom";

/// A [`RoadStore`] backed by an SQLite database.
pub struct SqliteStore {
    conn:   Connection,
    config: StoreConfig,
}

impl SqliteStore {
    /// Open an existing database read-only.
    pub fn open(path: &Path, config: StoreConfig) -> MapResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn, config })
    }

    /// Wrap an already open connection.
    pub fn from_connection(conn: Connection, config: StoreConfig) -> Self {
        Self { conn, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Create both tables and their indexes if they do not exist.
    pub fn create_schema(conn: &Connection, config: &StoreConfig) -> MapResult<()> {
        let (lines, nodes) = (&config.lines_table, &config.nodes_table);
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS \"{lines}\" (
                 id        TEXT PRIMARY KEY,
                 fow       INTEGER NOT NULL,
                 frc       INTEGER NOT NULL,
                 direction INTEGER NOT NULL,
                 start_id  TEXT NOT NULL,
                 end_id    TEXT NOT NULL,
                 length    REAL NOT NULL,
                 geom      TEXT NOT NULL,
                 min_lon   REAL NOT NULL,
                 min_lat   REAL NOT NULL,
                 max_lon   REAL NOT NULL,
                 max_lat   REAL NOT NULL
             );
             CREATE INDEX IF NOT EXISTS \"{lines}_bbox\"  ON \"{lines}\" (min_lon, max_lon, min_lat, max_lat);
             CREATE INDEX IF NOT EXISTS \"{lines}_start\" ON \"{lines}\" (start_id);
             CREATE INDEX IF NOT EXISTS \"{lines}_end\"   ON \"{lines}\" (end_id);
             CREATE TABLE IF NOT EXISTS \"{nodes}\" (
                 id  TEXT PRIMARY KEY,
                 lon REAL NOT NULL,
                 lat REAL NOT NULL
             );
             CREATE INDEX IF NOT EXISTS \"{nodes}_pos\" ON \"{nodes}\" (lon, lat);"
        ))?;
        Ok(())
    }

    /// Insert road rows in one transaction.
    pub fn insert_roads<'r>(
        conn: &Connection,
        config: &StoreConfig,
        rows: impl IntoIterator<Item = &'r RoadRow>,
    ) -> MapResult<()> {
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO \"{}\" \
                 (id, fow, frc, direction, start_id, end_id, length, geom, \
                  min_lon, min_lat, max_lon, max_lat) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                config.lines_table
            ))?;
            for row in rows {
                row.validate()?;
                let rect = row.bounding_rect();
                let geom: Vec<[f64; 2]> = row.geometry.iter().map(|c| [c.lon, c.lat]).collect();
                stmt.execute(params![
                    row.id,
                    row.fow.code(),
                    row.frc.code(),
                    row.direction.code(),
                    row.start_id,
                    row.end_id,
                    row.length_m,
                    serde_json::to_string(&geom)?,
                    rect.min().x,
                    rect.min().y,
                    rect.max().x,
                    rect.max().y,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Insert intersection rows in one transaction.
    pub fn insert_intersections<'r>(
        conn: &Connection,
        config: &StoreConfig,
        rows: impl IntoIterator<Item = &'r IntersectionRow>,
    ) -> MapResult<()> {
        let tx = conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO \"{}\" (id, lon, lat) VALUES (?1, ?2, ?3)",
                config.nodes_table
            ))?;
            for row in rows {
                stmt.execute(params![row.id, row.coord.lon, row.coord.lat])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn query_roads(&self, where_clause: &str, args: impl rusqlite::Params) -> MapResult<Vec<RoadRow>> {
        let sql = format!(
            "SELECT {ROAD_COLUMNS} FROM \"{}\" {where_clause} ORDER BY rowid",
            self.config.lines_table
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let raw = stmt
            .query_map(args, RawRoad::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(RawRoad::into_road).collect()
    }

    fn query_nodes(&self, where_clause: &str, args: impl rusqlite::Params) -> MapResult<Vec<IntersectionRow>> {
        let sql = format!(
            "SELECT id, lon, lat FROM \"{}\" {where_clause} ORDER BY rowid",
            self.config.nodes_table
        );
        let mut stmt = self.conn.prepare_cached(&sql)?;
        let rows = stmt
            .query_map(args, node_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self, sql: &str) -> MapResult<usize> {
        let n: i64 = self.conn.query_row(sql, [], |r| r.get(0))?;
        Ok(n.max(0) as usize)
    }
}

impl RoadStore for SqliteStore {
    fn crs(&self) -> Crs {
        self.config.crs
    }

    fn road(&self, id: &str) -> MapResult<Option<RoadRow>> {
        Ok(self.query_roads("WHERE id = ?1", params![id])?.into_iter().next())
    }

    fn roads(&self) -> MapResult<Vec<RoadRow>> {
        self.query_roads("", [])
    }

    fn roads_in_bbox(&self, rect: Rect<f64>) -> MapResult<Vec<RoadRow>> {
        self.query_roads(
            "WHERE max_lon >= ?1 AND min_lon <= ?3 AND max_lat >= ?2 AND min_lat <= ?4",
            params![rect.min().x, rect.min().y, rect.max().x, rect.max().y],
        )
    }

    fn roads_at_node(&self, node_id: &str) -> MapResult<Vec<RoadRow>> {
        self.query_roads("WHERE start_id = ?1 OR end_id = ?1", params![node_id])
    }

    fn intersection(&self, id: &str) -> MapResult<Option<IntersectionRow>> {
        let sql = format!("SELECT id, lon, lat FROM \"{}\" WHERE id = ?1", self.config.nodes_table);
        Ok(self.conn.query_row(&sql, params![id], node_from_row).optional()?)
    }

    fn intersections(&self) -> MapResult<Vec<IntersectionRow>> {
        self.query_nodes("", [])
    }

    fn intersections_in_bbox(&self, rect: Rect<f64>) -> MapResult<Vec<IntersectionRow>> {
        self.query_nodes(
            "WHERE lon >= ?1 AND lon <= ?3 AND lat >= ?2 AND lat <= ?4",
            params![rect.min().x, rect.min().y, rect.max().x, rect.max().y],
        )
    }

    fn road_count(&self) -> MapResult<usize> {
        self.count(&format!("SELECT count(*) FROM \"{}\"", self.config.lines_table))
    }

    fn intersection_count(&self) -> MapResult<usize> {
        self.count(&format!("SELECT count(*) FROM \"{}\"", self.config.nodes_table))
    }

    fn directed_line_count(&self) -> MapResult<usize> {
        self.count(&format!(
            "SELECT coalesce(sum(CASE direction WHEN 1 THEN 2 ELSE 1 END), 0) FROM \"{}\"",
            self.config.lines_table
        ))
    }

    fn extent(&self) -> MapResult<Option<Rect<f64>>> {
        let sql = format!(
            "SELECT min(min_lon), min(min_lat), max(max_lon), max(max_lat) FROM \"{}\"",
            self.config.lines_table
        );
        let bounds: (Option<f64>, Option<f64>, Option<f64>, Option<f64>) = self
            .conn
            .query_row(&sql, [], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))?;
        Ok(match bounds {
            (Some(x0), Some(y0), Some(x1), Some(y1)) => Some(Rect::new((x0, y0), (x1, y1))),
            _ => None,
        })
    }
}

// ── Row mapping ───────────────────────────────────────────────────────────────

/// Column values as read, before validation.
struct RawRoad {
    id:        String,
    fow:       i64,
    frc:       i64,
    direction: i64,
    start_id:  String,
    end_id:    String,
    length_m:  f64,
    geom:      String,
}

impl RawRoad {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<RawRoad> {
        Ok(RawRoad {
            id:        r.get(0)?,
            fow:       r.get(1)?,
            frc:       r.get(2)?,
            direction: r.get(3)?,
            start_id:  r.get(4)?,
            end_id:    r.get(5)?,
            length_m:  r.get(6)?,
            geom:      r.get(7)?,
        })
    }

    fn into_road(self) -> MapResult<RoadRow> {
        let invalid = |reason: String| MapError::InvalidRow { id: self.id.clone(), reason };
        let direction = Direction::from_code(self.direction)
            .ok_or_else(|| invalid(format!("direction code {}", self.direction)))?;
        if !(0..8).contains(&self.fow) || !(0..8).contains(&self.frc) {
            return Err(invalid(format!("fow {} / frc {} out of range", self.fow, self.frc)));
        }
        let coords: Vec<[f64; 2]> = serde_json::from_str(&self.geom)?;
        let row = RoadRow {
            fow: Fow::from_code(self.fow as u8),
            frc: Frc::from_code(self.frc as u8),
            direction,
            start_id: self.start_id,
            end_id: self.end_id,
            length_m: self.length_m,
            geometry: coords.into_iter().map(|[lon, lat]| Coordinates::new(lon, lat)).collect(),
            id: self.id,
        };
        row.validate()?;
        Ok(row)
    }
}

fn node_from_row(r: &Row<'_>) -> rusqlite::Result<IntersectionRow> {
    Ok(IntersectionRow {
        id:    r.get(0)?,
        coord: Coordinates::new(r.get(1)?, r.get(2)?),
    })
}
