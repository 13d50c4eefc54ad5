use async_graphql::{Enum, InputObject};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// JWT claims issued by `login` and decoded from the `Authorization` header.
/// Canonical definition lives here so the API crate and the server agree on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub exp: usize,
}

// -- Listing --

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Enum)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Arguments shared by every list query: substring filter, paging, sort direction.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub query: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub order: SortOrder,
}

// -- Auth --

#[derive(Debug, Clone, InputObject)]
pub struct SignupInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, InputObject)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct ResetPasswordInput {
    pub email: String,
    pub reset_token: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

// -- Profiles --

#[derive(Debug, Clone, Default, InputObject)]
pub struct ProfileInput {
    pub bio: Option<String>,
    pub location: Option<String>,
}

// -- Fish --

#[derive(Debug, Clone, InputObject)]
pub struct CreateFishInput {
    pub species: String,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct UpdateFishInput {
    pub species: Option<String>,
}

// -- Flies --

#[derive(Debug, Clone, InputObject)]
pub struct CreateFlyInput {
    #[graphql(name = "type")]
    pub fly_type: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct UpdateFlyInput {
    #[graphql(name = "type")]
    pub fly_type: Option<String>,
    pub name: Option<String>,
    pub color: Option<String>,
}

// -- Rivers --

#[derive(Debug, Clone, Default, InputObject)]
pub struct CreateRiverInput {
    pub name: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub stocked: Option<bool>,
    pub regulation: Option<String>,
    pub size: Option<String>,
    pub brush: Option<String>,
    /// Fish ids to associate with the river.
    #[graphql(default)]
    pub fish: Vec<i64>,
    /// Fly ids to associate with the river.
    #[graphql(default)]
    pub flies: Vec<i64>,
}

/// Omitted association lists keep their current links; a supplied list
/// replaces them wholesale.
#[derive(Debug, Clone, Default, InputObject)]
pub struct UpdateRiverInput {
    pub name: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub stocked: Option<bool>,
    pub regulation: Option<String>,
    pub size: Option<String>,
    pub brush: Option<String>,
    pub fish: Option<Vec<i64>>,
    pub flies: Option<Vec<i64>>,
}

// -- Tackle --

#[derive(Debug, Clone, Default, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct CreateTackleInput {
    pub rod_name: String,
    pub rod_weight: Option<String>,
    pub rod_length_ft: Option<i32>,
    pub rod_length_in: Option<i32>,
}

#[derive(Debug, Clone, Default, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct UpdateTackleInput {
    pub rod_name: Option<String>,
    pub rod_weight: Option<String>,
    pub rod_length_ft: Option<i32>,
    pub rod_length_in: Option<i32>,
}

// -- Trips --

#[derive(Debug, Clone, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct CreateTripInput {
    pub date: NaiveDate,
    pub time_spent: Option<f64>,
    pub amount_caught: Option<i32>,
    pub average_size: Option<f64>,
    pub largest_size: Option<f64>,
    /// River id the trip was fished on.
    pub river: Option<i64>,
    #[graphql(default)]
    pub fish: Vec<i64>,
    #[graphql(default)]
    pub flies: Vec<i64>,
    #[graphql(default)]
    pub tackle: Vec<i64>,
}

#[derive(Debug, Clone, Default, InputObject)]
#[graphql(rename_fields = "snake_case")]
pub struct UpdateTripInput {
    pub date: Option<NaiveDate>,
    pub time_spent: Option<f64>,
    pub amount_caught: Option<i32>,
    pub average_size: Option<f64>,
    pub largest_size: Option<f64>,
    pub river: Option<i64>,
    pub fish: Option<Vec<i64>>,
    pub flies: Option<Vec<i64>>,
    pub tackle: Option<Vec<i64>>,
}
