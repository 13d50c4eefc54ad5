//! Reference entities: fish species and flies. Both are unique by their
//! natural key, which callers title-case before it reaches the store.

use anyhow::Result;
use rusqlite::{Connection, Row};
use riverlog_types::api::ListQuery;

use super::links::{self, Association};
use super::{OptionalExt, like_pattern, page_bounds};
use crate::Database;
use crate::models::{FishRow, FlyRow, WriteOutcome};

const FISH_COLUMNS: &str = "id, species";
const FLY_COLUMNS: &str = "id, type, name, color";

impl Database {
    // -- Fish --

    pub fn list_fish(&self, list: &ListQuery) -> Result<Vec<FishRow>> {
        self.with_conn(|conn| {
            let (limit, offset) = page_bounds(list);
            let sql = format!(
                "SELECT {FISH_COLUMNS} FROM fish
                 WHERE fold(species) LIKE ?1 ESCAPE '\\'
                 ORDER BY species {}
                 LIMIT ?2 OFFSET ?3",
                list.order.as_sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map((like_pattern(&list.query), limit, offset), map_fish)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_fish(&self, id: i64) -> Result<Option<FishRow>> {
        self.with_conn(|conn| query_fish_by_id(conn, id))
    }

    pub fn create_fish(&self, species: &str) -> Result<WriteOutcome<FishRow>> {
        self.with_tx(|tx| {
            if fish_id_by_species(tx, species)?.is_some() {
                return Ok(WriteOutcome::Conflict);
            }

            let sql = format!("INSERT INTO fish (species) VALUES (?1) RETURNING {FISH_COLUMNS}");
            Ok(WriteOutcome::Done(tx.query_row(&sql, [species], map_fish)?))
        })
    }

    /// Rename a species. Renaming onto another row's species is a `Conflict`.
    pub fn update_fish(&self, id: i64, species: Option<&str>) -> Result<WriteOutcome<FishRow>> {
        self.with_tx(|tx| {
            let Some(current) = query_fish_by_id(tx, id)? else {
                return Ok(WriteOutcome::Missing);
            };

            let Some(species) = species else {
                return Ok(WriteOutcome::Done(current));
            };

            if fish_id_by_species(tx, species)?.is_some_and(|other| other != id) {
                return Ok(WriteOutcome::Conflict);
            }

            let sql = format!("UPDATE fish SET species = ?2 WHERE id = ?1 RETURNING {FISH_COLUMNS}");
            Ok(WriteOutcome::Done(tx.query_row(&sql, (id, species), map_fish)?))
        })
    }

    /// Delete a species and every river/trip link that references it.
    pub fn delete_fish(&self, id: i64) -> Result<WriteOutcome<FishRow>> {
        self.with_tx(|tx| {
            let Some(fish) = query_fish_by_id(tx, id)? else {
                return Ok(WriteOutcome::Missing);
            };

            links::clear_child(tx, Association::RiverFish, id)?;
            links::clear_child(tx, Association::TripFish, id)?;
            tx.execute("DELETE FROM fish WHERE id = ?1", [id])?;
            Ok(WriteOutcome::Done(fish))
        })
    }

    pub fn fish_for_river(&self, river_id: i64) -> Result<Vec<FishRow>> {
        self.with_conn(|conn| query_linked_fish(conn, Association::RiverFish, river_id))
    }

    pub fn fish_for_trip(&self, trip_id: i64) -> Result<Vec<FishRow>> {
        self.with_conn(|conn| query_linked_fish(conn, Association::TripFish, trip_id))
    }

    // -- Flies --

    /// Flies whose name, color or type contains the query, sorted by name.
    pub fn list_flies(&self, list: &ListQuery) -> Result<Vec<FlyRow>> {
        self.with_conn(|conn| {
            let (limit, offset) = page_bounds(list);
            let sql = format!(
                "SELECT {FLY_COLUMNS} FROM flies
                 WHERE fold(name) LIKE ?1 ESCAPE '\\' OR fold(color) LIKE ?1 ESCAPE '\\' OR fold(type) LIKE ?1 ESCAPE '\\'
                 ORDER BY name {}
                 LIMIT ?2 OFFSET ?3",
                list.order.as_sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map((like_pattern(&list.query), limit, offset), map_fly)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_fly(&self, id: i64) -> Result<Option<FlyRow>> {
        self.with_conn(|conn| query_fly_by_id(conn, id))
    }

    pub fn create_fly(&self, fly_type: &str, name: &str, color: &str) -> Result<WriteOutcome<FlyRow>> {
        self.with_tx(|tx| {
            if fly_id_by_key(tx, fly_type, name, color)?.is_some() {
                return Ok(WriteOutcome::Conflict);
            }

            let sql = format!(
                "INSERT INTO flies (type, name, color) VALUES (?1, ?2, ?3) RETURNING {FLY_COLUMNS}"
            );
            Ok(WriteOutcome::Done(tx.query_row(&sql, (fly_type, name, color), map_fly)?))
        })
    }

    /// Partial update. The merged (type, name, color) must not collide with another fly.
    pub fn update_fly(
        &self,
        id: i64,
        fly_type: Option<&str>,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<WriteOutcome<FlyRow>> {
        self.with_tx(|tx| {
            let Some(current) = query_fly_by_id(tx, id)? else {
                return Ok(WriteOutcome::Missing);
            };

            let fly_type = fly_type.unwrap_or(&current.fly_type);
            let name = name.unwrap_or(&current.name);
            let color = color.unwrap_or(&current.color);

            if fly_id_by_key(tx, fly_type, name, color)?.is_some_and(|other| other != id) {
                return Ok(WriteOutcome::Conflict);
            }

            let sql = format!(
                "UPDATE flies SET type = ?2, name = ?3, color = ?4 WHERE id = ?1 RETURNING {FLY_COLUMNS}"
            );
            Ok(WriteOutcome::Done(tx.query_row(&sql, (id, fly_type, name, color), map_fly)?))
        })
    }

    pub fn delete_fly(&self, id: i64) -> Result<WriteOutcome<FlyRow>> {
        self.with_tx(|tx| {
            let Some(fly) = query_fly_by_id(tx, id)? else {
                return Ok(WriteOutcome::Missing);
            };

            links::clear_child(tx, Association::RiverFly, id)?;
            links::clear_child(tx, Association::TripFly, id)?;
            tx.execute("DELETE FROM flies WHERE id = ?1", [id])?;
            Ok(WriteOutcome::Done(fly))
        })
    }

    pub fn flies_for_river(&self, river_id: i64) -> Result<Vec<FlyRow>> {
        self.with_conn(|conn| query_linked_flies(conn, Association::RiverFly, river_id))
    }

    pub fn flies_for_trip(&self, trip_id: i64) -> Result<Vec<FlyRow>> {
        self.with_conn(|conn| query_linked_flies(conn, Association::TripFly, trip_id))
    }
}

fn query_fish_by_id(conn: &Connection, id: i64) -> Result<Option<FishRow>> {
    let sql = format!("SELECT {FISH_COLUMNS} FROM fish WHERE id = ?1");
    conn.query_row(&sql, [id], map_fish).optional()
}

fn fish_id_by_species(conn: &Connection, species: &str) -> Result<Option<i64>> {
    conn.query_row("SELECT id FROM fish WHERE species = ?1", [species], |row| row.get(0))
        .optional()
}

fn query_linked_fish(conn: &Connection, assoc: Association, parent_id: i64) -> Result<Vec<FishRow>> {
    let sql = format!(
        "SELECT f.id, f.species FROM fish f
         JOIN {table} l ON l.fish_id = f.id
         WHERE l.{parent} = ?1
         ORDER BY f.species",
        table = assoc.table(),
        parent = assoc.parent_column()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([parent_id], map_fish)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn query_fly_by_id(conn: &Connection, id: i64) -> Result<Option<FlyRow>> {
    let sql = format!("SELECT {FLY_COLUMNS} FROM flies WHERE id = ?1");
    conn.query_row(&sql, [id], map_fly).optional()
}

fn fly_id_by_key(conn: &Connection, fly_type: &str, name: &str, color: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT id FROM flies WHERE type = ?1 AND name = ?2 AND color = ?3",
        (fly_type, name, color),
        |row| row.get(0),
    )
    .optional()
}

fn query_linked_flies(conn: &Connection, assoc: Association, parent_id: i64) -> Result<Vec<FlyRow>> {
    let sql = format!(
        "SELECT f.id, f.type, f.name, f.color FROM flies f
         JOIN {table} l ON l.fly_id = f.id
         WHERE l.{parent} = ?1
         ORDER BY f.name",
        table = assoc.table(),
        parent = assoc.parent_column()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([parent_id], map_fly)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn map_fish(row: &Row<'_>) -> rusqlite::Result<FishRow> {
    Ok(FishRow {
        id: row.get(0)?,
        species: row.get(1)?,
    })
}

fn map_fly(row: &Row<'_>) -> rusqlite::Result<FlyRow> {
    Ok(FlyRow {
        id: row.get(0)?,
        fly_type: row.get(1)?,
        name: row.get(2)?,
        color: row.get(3)?,
    })
}
