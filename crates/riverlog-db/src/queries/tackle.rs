use anyhow::Result;
use rusqlite::{Connection, Row};
use riverlog_types::api::{CreateTackleInput, ListQuery, UpdateTackleInput};

use super::links::{self, Association};
use super::{OptionalExt, like_pattern, page_bounds};
use crate::Database;
use crate::models::{TackleRow, WriteOutcome};

const TACKLE_COLUMNS: &str = "id, rod_name, rod_weight, rod_length_ft, rod_length_in, user_id";

impl Database {
    /// Tackle whose rod name or weight contains the query, sorted by rod name.
    /// `owner` narrows the search to one user's tackle.
    pub fn list_tackle(&self, list: &ListQuery, owner: Option<i64>) -> Result<Vec<TackleRow>> {
        self.with_conn(|conn| {
            let (limit, offset) = page_bounds(list);
            let sql = format!(
                "SELECT {TACKLE_COLUMNS} FROM tackle
                 WHERE (?4 IS NULL OR user_id = ?4)
                   AND (fold(rod_name) LIKE ?1 ESCAPE '\\' OR fold(COALESCE(rod_weight, '')) LIKE ?1 ESCAPE '\\')
                 ORDER BY rod_name {}
                 LIMIT ?2 OFFSET ?3",
                list.order.as_sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map((like_pattern(&list.query), limit, offset, owner), map_tackle)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_tackle(&self, id: i64) -> Result<Option<TackleRow>> {
        self.with_conn(|conn| query_owned_tackle(conn, id, None))
    }

    pub fn tackle_for_user(&self, user_id: i64) -> Result<Vec<TackleRow>> {
        self.list_tackle(&ListQuery::default(), Some(user_id))
    }

    pub fn tackle_for_trip(&self, trip_id: i64) -> Result<Vec<TackleRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.id, t.rod_name, t.rod_weight, t.rod_length_ft, t.rod_length_in, t.user_id
                 FROM tackle t
                 JOIN trip_tackle l ON l.tackle_id = t.id
                 WHERE l.trip_id = ?1
                 ORDER BY t.rod_name",
            )?;
            let rows = stmt
                .query_map([trip_id], map_tackle)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// `Conflict` when the owner already has an identical rod.
    pub fn create_tackle(&self, user_id: i64, input: &CreateTackleInput) -> Result<WriteOutcome<TackleRow>> {
        self.with_tx(|tx| {
            let existing: Option<i64> = tx
                .query_row(
                    "SELECT id FROM tackle
                     WHERE user_id = ?1 AND rod_name = ?2 AND rod_weight IS ?3
                       AND rod_length_ft IS ?4 AND rod_length_in IS ?5",
                    (
                        user_id,
                        &input.rod_name,
                        &input.rod_weight,
                        input.rod_length_ft,
                        input.rod_length_in,
                    ),
                    |row| row.get(0),
                )
                .optional()?;
            if existing.is_some() {
                return Ok(WriteOutcome::Conflict);
            }

            let sql = format!(
                "INSERT INTO tackle (rod_name, rod_weight, rod_length_ft, rod_length_in, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 RETURNING {TACKLE_COLUMNS}"
            );
            let row = tx.query_row(
                &sql,
                (
                    &input.rod_name,
                    &input.rod_weight,
                    input.rod_length_ft,
                    input.rod_length_in,
                    user_id,
                ),
                map_tackle,
            )?;
            Ok(WriteOutcome::Done(row))
        })
    }

    /// Partial update of tackle owned by `user_id`.
    pub fn update_tackle(
        &self,
        id: i64,
        user_id: i64,
        input: &UpdateTackleInput,
    ) -> Result<WriteOutcome<TackleRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE tackle SET
                    rod_name = COALESCE(?3, rod_name),
                    rod_weight = COALESCE(?4, rod_weight),
                    rod_length_ft = COALESCE(?5, rod_length_ft),
                    rod_length_in = COALESCE(?6, rod_length_in)
                 WHERE id = ?1 AND user_id = ?2
                 RETURNING {TACKLE_COLUMNS}"
            );
            let row = conn
                .query_row(
                    &sql,
                    (
                        id,
                        user_id,
                        &input.rod_name,
                        &input.rod_weight,
                        input.rod_length_ft,
                        input.rod_length_in,
                    ),
                    map_tackle,
                )
                .optional()?;
            Ok(row.map_or(WriteOutcome::Missing, WriteOutcome::Done))
        })
    }

    /// Delete tackle owned by `user_id`, unlinking it from every trip.
    pub fn delete_tackle(&self, id: i64, user_id: i64) -> Result<WriteOutcome<TackleRow>> {
        self.with_tx(|tx| {
            let Some(tackle) = query_owned_tackle(tx, id, Some(user_id))? else {
                return Ok(WriteOutcome::Missing);
            };

            links::clear_child(tx, Association::TripTackle, id)?;
            tx.execute("DELETE FROM tackle WHERE id = ?1", [id])?;
            Ok(WriteOutcome::Done(tackle))
        })
    }
}

fn query_owned_tackle(conn: &Connection, id: i64, owner: Option<i64>) -> Result<Option<TackleRow>> {
    let sql = format!(
        "SELECT {TACKLE_COLUMNS} FROM tackle WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)"
    );
    conn.query_row(&sql, (id, owner), map_tackle).optional()
}

fn map_tackle(row: &Row<'_>) -> rusqlite::Result<TackleRow> {
    Ok(TackleRow {
        id: row.get(0)?,
        rod_name: row.get(1)?,
        rod_weight: row.get(2)?,
        rod_length_ft: row.get(3)?,
        rod_length_in: row.get(4)?,
        user_id: row.get(5)?,
    })
}
