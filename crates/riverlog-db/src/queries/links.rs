use anyhow::Result;
use rusqlite::Connection;

#[cfg(test)]
use crate::Database;

/// Many-to-many join tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association {
    RiverFish,
    RiverFly,
    TripFish,
    TripFly,
    TripTackle,
}

impl Association {
    pub fn table(self) -> &'static str {
        match self {
            Self::RiverFish => "river_fish",
            Self::RiverFly => "river_flies",
            Self::TripFish => "trip_fish",
            Self::TripFly => "trip_flies",
            Self::TripTackle => "trip_tackle",
        }
    }

    pub fn parent_column(self) -> &'static str {
        match self {
            Self::RiverFish | Self::RiverFly => "river_id",
            Self::TripFish | Self::TripFly | Self::TripTackle => "trip_id",
        }
    }

    pub fn child_column(self) -> &'static str {
        match self {
            Self::RiverFish | Self::TripFish => "fish_id",
            Self::RiverFly | Self::TripFly => "fly_id",
            Self::TripTackle => "tackle_id",
        }
    }
}

/// Replace the parent's whole association set. Callers run this inside the
/// same transaction as the parent write, so readers never see a partial set.
pub(crate) fn replace(
    conn: &Connection,
    assoc: Association,
    parent_id: i64,
    child_ids: &[i64],
) -> Result<()> {
    clear_parent(conn, assoc, parent_id)?;

    let sql = format!(
        "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
        assoc.table(),
        assoc.parent_column(),
        assoc.child_column()
    );
    let mut stmt = conn.prepare(&sql)?;
    for child_id in child_ids {
        stmt.execute((parent_id, child_id))?;
    }

    Ok(())
}

pub(crate) fn clear_parent(conn: &Connection, assoc: Association, parent_id: i64) -> Result<usize> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", assoc.table(), assoc.parent_column());
    Ok(conn.execute(&sql, [parent_id])?)
}

pub(crate) fn clear_child(conn: &Connection, assoc: Association, child_id: i64) -> Result<usize> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", assoc.table(), assoc.child_column());
    Ok(conn.execute(&sql, [child_id])?)
}

#[cfg(test)]
impl Database {
    /// Child ids currently linked to `parent_id`, ascending.
    pub fn linked_ids(&self, assoc: Association, parent_id: i64) -> Result<Vec<i64>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM {} WHERE {} = ?1 ORDER BY 1",
                assoc.child_column(),
                assoc.table(),
                assoc.parent_column()
            );
            let mut stmt = conn.prepare(&sql)?;
            let ids = stmt
                .query_map([parent_id], |row| row.get(0))?
                .collect::<std::result::Result<Vec<i64>, _>>()?;
            Ok(ids)
        })
    }

    /// Number of join rows in `assoc` that reference `parent_id`.
    pub fn count_links(&self, assoc: Association, parent_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT COUNT(*) FROM {} WHERE {} = ?1",
                assoc.table(),
                assoc.parent_column()
            );
            Ok(conn.query_row(&sql, [parent_id], |row| row.get(0))?)
        })
    }
}
