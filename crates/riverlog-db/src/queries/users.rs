use anyhow::{Result, anyhow};
use rusqlite::{Connection, Row};
use riverlog_types::api::ListQuery;

use super::{OptionalExt, like_pattern, page_bounds};
use crate::Database;
use crate::models::{UserRow, WriteOutcome};

const USER_COLUMNS: &str = "id, name, email, password, reset_token, reset_token_expiry, created_at";

impl Database {
    pub fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<UserRow> {
        self.with_conn(|conn| {
            let sql = format!(
                "INSERT INTO users (name, email, password) VALUES (?1, ?2, ?3) RETURNING {USER_COLUMNS}"
            );
            Ok(conn.query_row(&sql, (name, email, password_hash), map_user)?)
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1");
            conn.query_row(&sql, [email], map_user).optional()
        })
    }

    /// Users whose name or email contains the query, sorted by name.
    pub fn list_users(&self, list: &ListQuery) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let (limit, offset) = page_bounds(list);
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users
                 WHERE fold(name) LIKE ?1 ESCAPE '\\' OR fold(email) LIKE ?1 ESCAPE '\\'
                 ORDER BY name {}
                 LIMIT ?2 OFFSET ?3",
                list.order.as_sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map((like_pattern(&list.query), limit, offset), map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Partial update: `None` leaves the column as it is.
    pub fn update_user(
        &self,
        id: i64,
        name: Option<&str>,
        email: Option<&str>,
        password_hash: Option<&str>,
    ) -> Result<WriteOutcome<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "UPDATE users SET
                    name = COALESCE(?2, name),
                    email = COALESCE(?3, email),
                    password = COALESCE(?4, password)
                 WHERE id = ?1
                 RETURNING {USER_COLUMNS}"
            );
            let row = conn.query_row(&sql, (id, name, email, password_hash), map_user).optional()?;
            Ok(row.map_or(WriteOutcome::Missing, WriteOutcome::Done))
        })
    }

    /// Delete a user together with everything they own (profile, tackle,
    /// trips and the trips' links cascade from the foreign keys).
    pub fn delete_user(&self, id: i64) -> Result<WriteOutcome<UserRow>> {
        self.with_tx(|tx| {
            let Some(user) = query_user_by_id(tx, id)? else {
                return Ok(WriteOutcome::Missing);
            };

            tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(WriteOutcome::Done(user))
        })
    }

    // -- Password reset --

    /// Store a reset token for `email`. Returns the number of accounts touched
    /// (0 when no user has that email).
    pub fn set_reset_token(&self, email: &str, token: &str, expiry_ms: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET reset_token = ?2, reset_token_expiry = ?3 WHERE email = ?1",
                (email, token, expiry_ms),
            )?;
            Ok(changed)
        })
    }

    /// Swap in a new password if `token` matches and has not expired at
    /// `now_ms`. Clears the token on success. Returns whether a row matched.
    pub fn consume_reset_token(
        &self,
        email: &str,
        token: &str,
        now_ms: i64,
        password_hash: &str,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?4, reset_token = NULL, reset_token_expiry = NULL
                 WHERE email = ?1 AND reset_token = ?2 AND reset_token_expiry > ?3",
                (email, token, now_ms, password_hash),
            )?;
            match changed {
                0 => Ok(false),
                1 => Ok(true),
                n => Err(anyhow!("Reset token matched {} users for {}", n, email)),
            }
        })
    }
}

pub(crate) fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<UserRow>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    conn.query_row(&sql, [id], map_user).optional()
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        reset_token: row.get(4)?,
        reset_token_expiry: row.get(5)?,
        created_at: row.get(6)?,
    })
}
