use anyhow::Result;
use rusqlite::{Connection, Row};
use riverlog_types::api::{CreateRiverInput, ListQuery, UpdateRiverInput};

use super::links::{self, Association};
use super::{OptionalExt, like_pattern, page_bounds};
use crate::Database;
use crate::models::{RiverRow, WriteOutcome};

const RIVER_COLUMNS: &str = "id, name, longitude, latitude, stocked, regulation, size, brush";

impl Database {
    /// Rivers whose name, regulation or size contains the query, sorted by name.
    pub fn list_rivers(&self, list: &ListQuery) -> Result<Vec<RiverRow>> {
        self.with_conn(|conn| {
            let (limit, offset) = page_bounds(list);
            let sql = format!(
                "SELECT {RIVER_COLUMNS} FROM rivers
                 WHERE fold(name) LIKE ?1 ESCAPE '\\'
                    OR fold(COALESCE(regulation, '')) LIKE ?1 ESCAPE '\\'
                    OR fold(COALESCE(size, '')) LIKE ?1 ESCAPE '\\'
                 ORDER BY name {}
                 LIMIT ?2 OFFSET ?3",
                list.order.as_sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map((like_pattern(&list.query), limit, offset), map_river)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_river(&self, id: i64) -> Result<Option<RiverRow>> {
        self.with_conn(|conn| query_river_by_id(conn, id))
    }

    /// Insert a river and its fish/fly links in one transaction.
    pub fn create_river(&self, input: &CreateRiverInput) -> Result<RiverRow> {
        self.with_tx(|tx| {
            let sql = format!(
                "INSERT INTO rivers (name, longitude, latitude, stocked, regulation, size, brush)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {RIVER_COLUMNS}"
            );
            let river = tx.query_row(
                &sql,
                (
                    &input.name,
                    input.longitude,
                    input.latitude,
                    input.stocked.unwrap_or(false),
                    &input.regulation,
                    &input.size,
                    &input.brush,
                ),
                map_river,
            )?;

            links::replace(tx, Association::RiverFish, river.id, &input.fish)?;
            links::replace(tx, Association::RiverFly, river.id, &input.flies)?;
            Ok(river)
        })
    }

    /// Partial update. A supplied `fish`/`flies` list replaces that link set;
    /// an omitted one is left alone.
    pub fn update_river(&self, id: i64, input: &UpdateRiverInput) -> Result<WriteOutcome<RiverRow>> {
        self.with_tx(|tx| {
            let sql = format!(
                "UPDATE rivers SET
                    name = COALESCE(?2, name),
                    longitude = COALESCE(?3, longitude),
                    latitude = COALESCE(?4, latitude),
                    stocked = COALESCE(?5, stocked),
                    regulation = COALESCE(?6, regulation),
                    size = COALESCE(?7, size),
                    brush = COALESCE(?8, brush)
                 WHERE id = ?1
                 RETURNING {RIVER_COLUMNS}"
            );
            let Some(river) = tx
                .query_row(
                    &sql,
                    (
                        id,
                        &input.name,
                        input.longitude,
                        input.latitude,
                        input.stocked,
                        &input.regulation,
                        &input.size,
                        &input.brush,
                    ),
                    map_river,
                )
                .optional()?
            else {
                return Ok(WriteOutcome::Missing);
            };

            if let Some(fish) = &input.fish {
                links::replace(tx, Association::RiverFish, id, fish)?;
            }
            if let Some(flies) = &input.flies {
                links::replace(tx, Association::RiverFly, id, flies)?;
            }

            Ok(WriteOutcome::Done(river))
        })
    }

    /// Delete a river with all of its links. Trips fished on it keep their
    /// row but lose the river reference.
    pub fn delete_river(&self, id: i64) -> Result<WriteOutcome<RiverRow>> {
        self.with_tx(|tx| {
            let Some(river) = query_river_by_id(tx, id)? else {
                return Ok(WriteOutcome::Missing);
            };

            links::clear_parent(tx, Association::RiverFish, id)?;
            links::clear_parent(tx, Association::RiverFly, id)?;
            tx.execute("UPDATE trips SET river_id = NULL WHERE river_id = ?1", [id])?;
            tx.execute("DELETE FROM rivers WHERE id = ?1", [id])?;
            Ok(WriteOutcome::Done(river))
        })
    }
}

fn query_river_by_id(conn: &Connection, id: i64) -> Result<Option<RiverRow>> {
    let sql = format!("SELECT {RIVER_COLUMNS} FROM rivers WHERE id = ?1");
    conn.query_row(&sql, [id], map_river).optional()
}

fn map_river(row: &Row<'_>) -> rusqlite::Result<RiverRow> {
    Ok(RiverRow {
        id: row.get(0)?,
        name: row.get(1)?,
        longitude: row.get(2)?,
        latitude: row.get(3)?,
        stocked: row.get(4)?,
        regulation: row.get(5)?,
        size: row.get(6)?,
        brush: row.get(7)?,
    })
}
