//! GraphQL output types. Relations (a river's fish, a trip's tackle, ...)
//! are resolved lazily as fields, so every mutation can return the plain
//! re-fetched row and callers still get the associations they ask for.

use async_graphql::{ComplexObject, Context, OutputType, Result, SimpleObject};
use chrono::NaiveDate;

use riverlog_db::models::{FishRow, FlyRow, ProfileRow, RiverRow, TackleRow, TripRow, UserRow};
use riverlog_types::events::{MutationKind, Topic};

use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, SimpleObject)]
#[graphql(complex)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
}

#[ComplexObject]
impl User {
    async fn profile(&self, ctx: &Context<'_>) -> Result<Option<Profile>> {
        let state = ctx.data::<AppState>()?;
        let user_id = self.id;
        let row = state.store(move |db| db.get_profile_by_user(user_id)).await?;
        Ok(row.map(Profile::from))
    }

    async fn tackle(&self, ctx: &Context<'_>) -> Result<Vec<Tackle>> {
        let state = ctx.data::<AppState>()?;
        let user_id = self.id;
        let rows = state.store(move |db| db.tackle_for_user(user_id)).await?;
        Ok(rows.into_iter().map(Tackle::from).collect())
    }

    async fn trips(&self, ctx: &Context<'_>) -> Result<Vec<Trip>> {
        let state = ctx.data::<AppState>()?;
        let user_id = self.id;
        let rows = state.store(move |db| db.trips_for_user(user_id)).await?;
        Ok(rows.into_iter().map(Trip::from).collect())
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
        }
    }
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
#[graphql(complex)]
pub struct Profile {
    pub id: i64,
    pub bio: Option<String>,
    pub location: Option<String>,
    #[graphql(skip)]
    pub user_id: i64,
}

#[ComplexObject]
impl Profile {
    async fn user(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        owner(ctx, self.user_id).await
    }
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            bio: row.bio,
            location: row.location,
            user_id: row.user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct Fish {
    pub id: i64,
    pub species: String,
}

impl From<FishRow> for Fish {
    fn from(row: FishRow) -> Self {
        Self {
            id: row.id,
            species: row.species,
        }
    }
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct Fly {
    pub id: i64,
    #[graphql(name = "type")]
    pub fly_type: String,
    pub name: String,
    pub color: String,
}

impl From<FlyRow> for Fly {
    fn from(row: FlyRow) -> Self {
        Self {
            id: row.id,
            fly_type: row.fly_type,
            name: row.name,
            color: row.color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
#[graphql(complex)]
pub struct River {
    pub id: i64,
    pub name: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub stocked: bool,
    pub regulation: Option<String>,
    pub size: Option<String>,
    pub brush: Option<String>,
}

#[ComplexObject]
impl River {
    async fn fish(&self, ctx: &Context<'_>) -> Result<Vec<Fish>> {
        let state = ctx.data::<AppState>()?;
        let id = self.id;
        let rows = state.store(move |db| db.fish_for_river(id)).await?;
        Ok(rows.into_iter().map(Fish::from).collect())
    }

    async fn flies(&self, ctx: &Context<'_>) -> Result<Vec<Fly>> {
        let state = ctx.data::<AppState>()?;
        let id = self.id;
        let rows = state.store(move |db| db.flies_for_river(id)).await?;
        Ok(rows.into_iter().map(Fly::from).collect())
    }
}

impl From<RiverRow> for River {
    fn from(row: RiverRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            longitude: row.longitude,
            latitude: row.latitude,
            stocked: row.stocked,
            regulation: row.regulation,
            size: row.size,
            brush: row.brush,
        }
    }
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct Tackle {
    pub id: i64,
    pub rod_name: String,
    pub rod_weight: Option<String>,
    pub rod_length_ft: Option<i32>,
    pub rod_length_in: Option<i32>,
    #[graphql(skip)]
    pub user_id: i64,
}

#[ComplexObject]
impl Tackle {
    async fn user(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        owner(ctx, self.user_id).await
    }
}

impl From<TackleRow> for Tackle {
    fn from(row: TackleRow) -> Self {
        Self {
            id: row.id,
            rod_name: row.rod_name,
            rod_weight: row.rod_weight,
            rod_length_ft: row.rod_length_ft,
            rod_length_in: row.rod_length_in,
            user_id: row.user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
#[graphql(complex, rename_fields = "snake_case")]
pub struct Trip {
    pub id: i64,
    pub date: NaiveDate,
    pub time_spent: Option<f64>,
    pub amount_caught: Option<i32>,
    pub average_size: Option<f64>,
    pub largest_size: Option<f64>,
    #[graphql(skip)]
    pub river_id: Option<i64>,
    #[graphql(skip)]
    pub user_id: i64,
}

#[ComplexObject]
impl Trip {
    async fn user(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        owner(ctx, self.user_id).await
    }

    async fn river(&self, ctx: &Context<'_>) -> Result<Option<River>> {
        let Some(river_id) = self.river_id else {
            return Ok(None);
        };
        let state = ctx.data::<AppState>()?;
        let row = state.store(move |db| db.get_river(river_id)).await?;
        Ok(row.map(River::from))
    }

    async fn fish(&self, ctx: &Context<'_>) -> Result<Vec<Fish>> {
        let state = ctx.data::<AppState>()?;
        let id = self.id;
        let rows = state.store(move |db| db.fish_for_trip(id)).await?;
        Ok(rows.into_iter().map(Fish::from).collect())
    }

    async fn flies(&self, ctx: &Context<'_>) -> Result<Vec<Fly>> {
        let state = ctx.data::<AppState>()?;
        let id = self.id;
        let rows = state.store(move |db| db.flies_for_trip(id)).await?;
        Ok(rows.into_iter().map(Fly::from).collect())
    }

    async fn tackle(&self, ctx: &Context<'_>) -> Result<Vec<Tackle>> {
        let state = ctx.data::<AppState>()?;
        let id = self.id;
        let rows = state.store(move |db| db.tackle_for_trip(id)).await?;
        Ok(rows.into_iter().map(Tackle::from).collect())
    }
}

impl From<TripRow> for Trip {
    fn from(row: TripRow) -> Self {
        Self {
            id: row.id,
            date: row.date,
            time_spent: row.time_spent,
            amount_caught: row.amount_caught,
            average_size: row.average_size,
            largest_size: row.largest_size,
            river_id: row.river_id,
            user_id: row.user_id,
        }
    }
}

async fn owner(ctx: &Context<'_>, user_id: i64) -> Result<Option<User>> {
    let state = ctx.data::<AppState>()?;
    let row = state.store(move |db| db.get_user_by_id(user_id)).await?;
    Ok(row.map(User::from))
}

/// Returned by `login`.
#[derive(Debug, Clone, SimpleObject)]
pub struct AuthPayload {
    pub user: User,
    pub token: String,
}

// -- Change events --

/// Payload of every subscription: what happened and the record it happened to.
#[derive(Debug, Clone, SimpleObject)]
#[graphql(
    concrete(name = "UserEvent", params(User)),
    concrete(name = "ProfileEvent", params(Profile)),
    concrete(name = "FishEvent", params(Fish)),
    concrete(name = "FlyEvent", params(Fly)),
    concrete(name = "RiverEvent", params(River)),
    concrete(name = "TackleEvent", params(Tackle)),
    concrete(name = "TripEvent", params(Trip))
)]
pub struct ChangeEvent<T: OutputType> {
    pub mutation: MutationKind,
    pub data: T,
}

/// Event carried on the bus. One bus serves every topic, so the record is
/// type-erased into [`Record`] and recovered per topic by [`TopicRecord`].
#[derive(Debug, Clone)]
pub struct Change {
    pub mutation: MutationKind,
    pub record: Record,
}

/// An entity type that has its own bus topic.
pub trait TopicRecord: Sized {
    const TOPIC: Topic;

    fn into_record(self) -> Record;

    fn from_record(record: Record) -> Option<Self>;
}

macro_rules! topic_records {
    ($($ty:ident => $topic:ident),* $(,)?) => {
        #[derive(Debug, Clone)]
        pub enum Record {
            $($ty($ty),)*
        }

        $(
            impl TopicRecord for $ty {
                const TOPIC: Topic = Topic::$topic;

                fn into_record(self) -> Record {
                    Record::$ty(self)
                }

                fn from_record(record: Record) -> Option<Self> {
                    match record {
                        Record::$ty(value) => Some(value),
                        _ => None,
                    }
                }
            }
        )*
    };
}

topic_records! {
    User => User,
    Profile => Profile,
    Fish => Fish,
    Fly => Fly,
    River => River,
    Tackle => Tackle,
    Trip => Trip,
}
