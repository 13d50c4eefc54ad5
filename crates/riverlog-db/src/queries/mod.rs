pub mod catalog;
pub mod links;
pub mod profiles;
pub mod rivers;
pub mod tackle;
pub mod trips;
pub mod users;

use anyhow::Result;
use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;
use riverlog_types::api::ListQuery;

/// Register `fold(text)`, a Unicode lowercase. SQLite's own LIKE and
/// `lower()` only fold ASCII, so text filters compare `fold(column)`
/// against a pattern from [`like_pattern`].
pub(crate) fn register_functions(conn: &Connection) -> Result<()> {
    conn.create_scalar_function(
        "fold",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let value: Option<String> = ctx.get(0)?;
            Ok(value.map(|v| v.to_lowercase()))
        },
    )?;
    Ok(())
}

/// Turn a free-text query into a lowercased LIKE pattern that matches it as
/// a literal substring of a `fold`ed column.
pub(crate) fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// LIMIT/OFFSET values for a list query. SQLite treats a negative LIMIT as "no limit".
pub(crate) fn page_bounds(list: &ListQuery) -> (i64, i64) {
    let limit = list.limit.filter(|l| *l >= 0).unwrap_or(-1);
    let offset = list.offset.unwrap_or(0).max(0);
    (limit, offset)
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::Database;
    use crate::models::UserRow;

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub fn user(db: &Database, email: &str) -> UserRow {
        db.create_user("Test Angler", email, "not-a-real-hash").unwrap()
    }
}
