use anyhow::Result;
use rusqlite::{Connection, Row};
use riverlog_types::api::{ListQuery, ProfileInput};

use super::{OptionalExt, like_pattern, page_bounds};
use crate::Database;
use crate::models::{ProfileRow, WriteOutcome};

const PROFILE_COLUMNS: &str = "id, bio, location, user_id";

impl Database {
    /// Profiles whose location contains the query.
    pub fn list_profiles(&self, list: &ListQuery) -> Result<Vec<ProfileRow>> {
        self.with_conn(|conn| {
            let (limit, offset) = page_bounds(list);
            let sql = format!(
                "SELECT {PROFILE_COLUMNS} FROM profiles
                 WHERE fold(COALESCE(location, '')) LIKE ?1 ESCAPE '\\'
                 ORDER BY id {}
                 LIMIT ?2 OFFSET ?3",
                list.order.as_sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map((like_pattern(&list.query), limit, offset), map_profile)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_profile_by_user(&self, user_id: i64) -> Result<Option<ProfileRow>> {
        self.with_conn(|conn| query_profile_by_user(conn, user_id))
    }

    /// One profile per user: `Conflict` if the user already has one.
    pub fn create_profile(&self, user_id: i64, input: &ProfileInput) -> Result<WriteOutcome<ProfileRow>> {
        self.with_tx(|tx| {
            if query_profile_by_user(tx, user_id)?.is_some() {
                return Ok(WriteOutcome::Conflict);
            }

            let sql = format!(
                "INSERT INTO profiles (bio, location, user_id) VALUES (?1, ?2, ?3) RETURNING {PROFILE_COLUMNS}"
            );
            let row = tx.query_row(&sql, (&input.bio, &input.location, user_id), map_profile)?;
            Ok(WriteOutcome::Done(row))
        })
    }

    pub fn update_profile(&self, user_id: i64, input: &ProfileInput) -> Result<WriteOutcome<ProfileRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE profiles SET
                    bio = COALESCE(?2, bio),
                    location = COALESCE(?3, location)
                 WHERE user_id = ?1
                 RETURNING {PROFILE_COLUMNS}"
            );
            let row = conn
                .query_row(&sql, (user_id, &input.bio, &input.location), map_profile)
                .optional()?;
            Ok(row.map_or(WriteOutcome::Missing, WriteOutcome::Done))
        })
    }

    pub fn delete_profile(&self, user_id: i64) -> Result<WriteOutcome<ProfileRow>> {
        self.with_tx(|tx| {
            let Some(profile) = query_profile_by_user(tx, user_id)? else {
                return Ok(WriteOutcome::Missing);
            };

            tx.execute("DELETE FROM profiles WHERE id = ?1", [profile.id])?;
            Ok(WriteOutcome::Done(profile))
        })
    }
}

fn query_profile_by_user(conn: &Connection, user_id: i64) -> Result<Option<ProfileRow>> {
    let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = ?1");
    conn.query_row(&sql, [user_id], map_profile).optional()
}

fn map_profile(row: &Row<'_>) -> rusqlite::Result<ProfileRow> {
    Ok(ProfileRow {
        id: row.get(0)?,
        bio: row.get(1)?,
        location: row.get(2)?,
        user_id: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::fixtures;

    #[test]
    fn one_profile_per_user() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "p@x.com");
        let input = ProfileInput { bio: Some("Dry fly purist".into()), location: Some("Montana".into()) };

        assert!(matches!(db.create_profile(user.id, &input).unwrap(), WriteOutcome::Done(_)));
        assert_eq!(db.create_profile(user.id, &input).unwrap(), WriteOutcome::Conflict);
    }

    #[test]
    fn update_profile_is_partial() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "p@x.com");
        let input = ProfileInput { bio: Some("Nymphing".into()), location: Some("Idaho".into()) };
        db.create_profile(user.id, &input).unwrap();

        let changes = ProfileInput { bio: None, location: Some("Oregon".into()) };
        let profile = db.update_profile(user.id, &changes).unwrap().done().unwrap();
        assert_eq!(profile.bio.as_deref(), Some("Nymphing"));
        assert_eq!(profile.location.as_deref(), Some("Oregon"));
    }

    #[test]
    fn profiles_without_location_match_empty_query() {
        let db = fixtures::db();
        let a = fixtures::user(&db, "a@x.com");
        let b = fixtures::user(&db, "b@x.com");
        db.create_profile(a.id, &ProfileInput::default()).unwrap();
        db.create_profile(b.id, &ProfileInput { bio: None, location: Some("Yellowstone".into()) })
            .unwrap();

        assert_eq!(db.list_profiles(&ListQuery::default()).unwrap().len(), 2);

        let list = ListQuery { query: "stone".into(), ..Default::default() };
        let found = db.list_profiles(&list).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].user_id, b.id);
    }

    #[test]
    fn deleting_missing_profile() {
        let db = fixtures::db();
        let user = fixtures::user(&db, "p@x.com");
        assert_eq!(db.delete_profile(user.id).unwrap(), WriteOutcome::Missing);
    }
}
