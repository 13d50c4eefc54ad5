//! Database row types. These map directly to SQLite rows.
//! Distinct from the GraphQL objects in riverlog-api to keep the DB layer independent.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileRow {
    pub id: i64,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FishRow {
    pub id: i64,
    pub species: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlyRow {
    pub id: i64,
    pub fly_type: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiverRow {
    pub id: i64,
    pub name: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub stocked: bool,
    pub regulation: Option<String>,
    pub size: Option<String>,
    pub brush: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TackleRow {
    pub id: i64,
    pub rod_name: String,
    pub rod_weight: Option<String>,
    pub rod_length_ft: Option<i32>,
    pub rod_length_in: Option<i32>,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripRow {
    pub id: i64,
    pub date: NaiveDate,
    pub time_spent: Option<f64>,
    pub amount_caught: Option<i32>,
    pub average_size: Option<f64>,
    pub largest_size: Option<f64>,
    pub river_id: Option<i64>,
    pub user_id: i64,
}

/// Result of a guarded write. The precondition checks run in the same
/// transaction as the write itself.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<T> {
    /// The write happened; carries the re-fetched row (or the pre-delete snapshot).
    Done(T),
    /// No row matched the id (and owner, where ownership applies).
    Missing,
    /// A row with the same natural key already exists.
    Conflict,
}

impl<T> WriteOutcome<T> {
    pub fn done(self) -> Option<T> {
        match self {
            Self::Done(row) => Some(row),
            _ => None,
        }
    }
}
