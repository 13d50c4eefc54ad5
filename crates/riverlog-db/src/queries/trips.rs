use anyhow::Result;
use rusqlite::{Connection, Row};
use riverlog_types::api::{CreateTripInput, ListQuery, UpdateTripInput};

use super::links::{self, Association};
use super::{OptionalExt, page_bounds};
use crate::Database;
use crate::models::{TripRow, WriteOutcome};

const TRIP_COLUMNS: &str =
    "id, date, time_spent, amount_caught, average_size, largest_size, river_id, user_id";

impl Database {
    /// Trips sorted by date, optionally narrowed to one owner. Trips have no
    /// text filter; `list.query` is ignored.
    pub fn list_trips(&self, list: &ListQuery, owner: Option<i64>) -> Result<Vec<TripRow>> {
        self.with_conn(|conn| {
            let (limit, offset) = page_bounds(list);
            let sql = format!(
                "SELECT {TRIP_COLUMNS} FROM trips
                 WHERE (?3 IS NULL OR user_id = ?3)
                 ORDER BY date {}, id
                 LIMIT ?1 OFFSET ?2",
                list.order.as_sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map((limit, offset, owner), map_trip)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_trip(&self, id: i64) -> Result<Option<TripRow>> {
        self.with_conn(|conn| query_owned_trip(conn, id, None))
    }

    pub fn trips_for_user(&self, user_id: i64) -> Result<Vec<TripRow>> {
        self.list_trips(&ListQuery::default(), Some(user_id))
    }

    /// Insert a trip and its fish/fly/tackle links in one transaction.
    pub fn create_trip(&self, user_id: i64, input: &CreateTripInput) -> Result<TripRow> {
        self.with_tx(|tx| {
            let sql = format!(
                "INSERT INTO trips (date, time_spent, amount_caught, average_size, largest_size, river_id, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 RETURNING {TRIP_COLUMNS}"
            );
            let trip = tx.query_row(
                &sql,
                (
                    input.date,
                    input.time_spent,
                    input.amount_caught,
                    input.average_size,
                    input.largest_size,
                    input.river,
                    user_id,
                ),
                map_trip,
            )?;

            links::replace(tx, Association::TripFish, trip.id, &input.fish)?;
            links::replace(tx, Association::TripFly, trip.id, &input.flies)?;
            links::replace(tx, Association::TripTackle, trip.id, &input.tackle)?;
            Ok(trip)
        })
    }

    /// Partial update of a trip owned by `user_id`. Each supplied link list
    /// replaces that set; omitted lists are untouched. An omitted river keeps
    /// the current one, so a trip cannot be detached from its river here.
    pub fn update_trip(
        &self,
        id: i64,
        user_id: i64,
        input: &UpdateTripInput,
    ) -> Result<WriteOutcome<TripRow>> {
        self.with_tx(|tx| {
            let sql = format!(
                "UPDATE trips SET
                    date = COALESCE(?3, date),
                    time_spent = COALESCE(?4, time_spent),
                    amount_caught = COALESCE(?5, amount_caught),
                    average_size = COALESCE(?6, average_size),
                    largest_size = COALESCE(?7, largest_size),
                    river_id = COALESCE(?8, river_id)
                 WHERE id = ?1 AND user_id = ?2
                 RETURNING {TRIP_COLUMNS}"
            );
            let Some(trip) = tx
                .query_row(
                    &sql,
                    (
                        id,
                        user_id,
                        input.date,
                        input.time_spent,
                        input.amount_caught,
                        input.average_size,
                        input.largest_size,
                        input.river,
                    ),
                    map_trip,
                )
                .optional()?
            else {
                return Ok(WriteOutcome::Missing);
            };

            if let Some(fish) = &input.fish {
                links::replace(tx, Association::TripFish, id, fish)?;
            }
            if let Some(flies) = &input.flies {
                links::replace(tx, Association::TripFly, id, flies)?;
            }
            if let Some(tackle) = &input.tackle {
                links::replace(tx, Association::TripTackle, id, tackle)?;
            }

            Ok(WriteOutcome::Done(trip))
        })
    }

    /// Delete a trip owned by `user_id` together with all of its links.
    pub fn delete_trip(&self, id: i64, user_id: i64) -> Result<WriteOutcome<TripRow>> {
        self.with_tx(|tx| {
            let Some(trip) = query_owned_trip(tx, id, Some(user_id))? else {
                return Ok(WriteOutcome::Missing);
            };

            links::clear_parent(tx, Association::TripFish, id)?;
            links::clear_parent(tx, Association::TripFly, id)?;
            links::clear_parent(tx, Association::TripTackle, id)?;
            tx.execute("DELETE FROM trips WHERE id = ?1", [id])?;
            Ok(WriteOutcome::Done(trip))
        })
    }
}

fn query_owned_trip(conn: &Connection, id: i64, owner: Option<i64>) -> Result<Option<TripRow>> {
    let sql =
        format!("SELECT {TRIP_COLUMNS} FROM trips WHERE id = ?1 AND (?2 IS NULL OR user_id = ?2)");
    conn.query_row(&sql, (id, owner), map_trip).optional()
}

fn map_trip(row: &Row<'_>) -> rusqlite::Result<TripRow> {
    Ok(TripRow {
        id: row.get(0)?,
        date: row.get(1)?,
        time_spent: row.get(2)?,
        amount_caught: row.get(3)?,
        average_size: row.get(4)?,
        largest_size: row.get(5)?,
        river_id: row.get(6)?,
        user_id: row.get(7)?,
    })
}
