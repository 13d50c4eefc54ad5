//! Query, Mutation and Subscription roots. Resolvers only unpack arguments,
//! resolve the caller, and hand off to the service modules.

use async_graphql::{Context, Object, OutputType, Result, Schema, Subscription};
use futures_util::StreamExt;
use futures_util::future::ready;
use futures_util::stream::BoxStream;
use tracing::debug;

use riverlog_types::api::{
    CreateFishInput, CreateFlyInput, CreateRiverInput, CreateTackleInput, CreateTripInput,
    ListQuery, LoginInput, ProfileInput, ResetPasswordInput, SignupInput, SortOrder,
    UpdateFishInput, UpdateFlyInput, UpdateRiverInput, UpdateTackleInput, UpdateTripInput,
    UpdateUserInput,
};

use crate::auth::{self, Identity};
use crate::middleware::Credential;
use crate::objects::{
    AuthPayload, ChangeEvent, Fish, Fly, Profile, River, Tackle, TopicRecord, Trip, User,
};
use crate::state::AppState;
use crate::{fish, flies, profiles, rivers, tackle, trips, users};

pub type RiverlogSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

pub fn build_schema(state: AppState) -> RiverlogSchema {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(state)
        .finish()
}

fn app<'a>(ctx: &Context<'a>) -> Result<&'a AppState> {
    ctx.data::<AppState>()
}

/// Decode the request's bearer credential, failing with
/// `Authentication required` when there is none or it does not verify.
fn caller(ctx: &Context<'_>) -> Result<Identity> {
    let state = app(ctx)?;
    let token = ctx.data_opt::<Credential>().and_then(Credential::token);
    Ok(auth::identify(&state.jwt_secret, token)?)
}

fn list_args(
    query: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
    order_by: Option<SortOrder>,
) -> ListQuery {
    ListQuery {
        query: query.unwrap_or_default(),
        limit,
        offset,
        order: order_by.unwrap_or_default(),
    }
}

// -- Query --

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    async fn fish(
        &self,
        ctx: &Context<'_>,
        query: Option<String>,
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<SortOrder>,
    ) -> Result<Vec<Fish>> {
        Ok(fish::list_fish(app(ctx)?, list_args(query, limit, offset, order_by)).await?)
    }

    async fn flies(
        &self,
        ctx: &Context<'_>,
        query: Option<String>,
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<SortOrder>,
    ) -> Result<Vec<Fly>> {
        Ok(flies::list_flies(app(ctx)?, list_args(query, limit, offset, order_by)).await?)
    }

    async fn profile(
        &self,
        ctx: &Context<'_>,
        query: Option<String>,
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<SortOrder>,
    ) -> Result<Vec<Profile>> {
        Ok(profiles::list_profiles(app(ctx)?, list_args(query, limit, offset, order_by)).await?)
    }

    async fn river(
        &self,
        ctx: &Context<'_>,
        query: Option<String>,
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<SortOrder>,
    ) -> Result<Vec<River>> {
        Ok(rivers::list_rivers(app(ctx)?, list_args(query, limit, offset, order_by)).await?)
    }

    async fn tackle(
        &self,
        ctx: &Context<'_>,
        query: Option<String>,
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<SortOrder>,
    ) -> Result<Vec<Tackle>> {
        Ok(tackle::list_tackle(app(ctx)?, list_args(query, limit, offset, order_by)).await?)
    }

    async fn my_tackle(
        &self,
        ctx: &Context<'_>,
        query: Option<String>,
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<SortOrder>,
    ) -> Result<Vec<Tackle>> {
        let identity = caller(ctx)?;
        let list = list_args(query, limit, offset, order_by);
        Ok(tackle::my_tackle(app(ctx)?, &identity, list).await?)
    }

    async fn trip(
        &self,
        ctx: &Context<'_>,
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<SortOrder>,
    ) -> Result<Vec<Trip>> {
        Ok(trips::list_trips(app(ctx)?, list_args(None, limit, offset, order_by)).await?)
    }

    async fn my_trips(
        &self,
        ctx: &Context<'_>,
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<SortOrder>,
    ) -> Result<Vec<Trip>> {
        let identity = caller(ctx)?;
        let list = list_args(None, limit, offset, order_by);
        Ok(trips::my_trips(app(ctx)?, &identity, list).await?)
    }

    async fn user(
        &self,
        ctx: &Context<'_>,
        query: Option<String>,
        limit: Option<i64>,
        offset: Option<i64>,
        order_by: Option<SortOrder>,
    ) -> Result<Vec<User>> {
        Ok(users::list_users(app(ctx)?, list_args(query, limit, offset, order_by)).await?)
    }

    async fn me(&self, ctx: &Context<'_>) -> Result<Option<User>> {
        let identity = caller(ctx)?;
        Ok(users::me(app(ctx)?, &identity).await?)
    }

    async fn my_profile(&self, ctx: &Context<'_>) -> Result<Option<Profile>> {
        let identity = caller(ctx)?;
        Ok(profiles::my_profile(app(ctx)?, &identity).await?)
    }
}

// -- Mutation --

pub struct MutationRoot;

#[Object(rename_fields = "snake_case")]
impl MutationRoot {
    async fn signup(&self, ctx: &Context<'_>, data: SignupInput) -> Result<User> {
        Ok(auth::signup(app(ctx)?, data).await?)
    }

    async fn login(&self, ctx: &Context<'_>, data: LoginInput) -> Result<AuthPayload> {
        Ok(auth::login(app(ctx)?, data).await?)
    }

    async fn request_reset_password(&self, ctx: &Context<'_>, email: String) -> Result<bool> {
        Ok(auth::request_reset_password(app(ctx)?, email).await?)
    }

    async fn reset_password(&self, ctx: &Context<'_>, data: ResetPasswordInput) -> Result<bool> {
        Ok(auth::reset_password(app(ctx)?, data).await?)
    }

    async fn update_user(&self, ctx: &Context<'_>, data: UpdateUserInput) -> Result<User> {
        let identity = caller(ctx)?;
        Ok(users::update_user(app(ctx)?, &identity, data).await?)
    }

    async fn delete_user(&self, ctx: &Context<'_>) -> Result<User> {
        let identity = caller(ctx)?;
        Ok(users::delete_user(app(ctx)?, &identity).await?)
    }

    async fn create_profile(&self, ctx: &Context<'_>, data: ProfileInput) -> Result<Profile> {
        let identity = caller(ctx)?;
        Ok(profiles::create_profile(app(ctx)?, &identity, data).await?)
    }

    async fn update_profile(&self, ctx: &Context<'_>, data: ProfileInput) -> Result<Profile> {
        let identity = caller(ctx)?;
        Ok(profiles::update_profile(app(ctx)?, &identity, data).await?)
    }

    async fn delete_profile(&self, ctx: &Context<'_>) -> Result<Profile> {
        let identity = caller(ctx)?;
        Ok(profiles::delete_profile(app(ctx)?, &identity).await?)
    }

    async fn create_fish(&self, ctx: &Context<'_>, data: CreateFishInput) -> Result<Fish> {
        let identity = caller(ctx)?;
        Ok(fish::create_fish(app(ctx)?, &identity, data).await?)
    }

    async fn update_fish(&self, ctx: &Context<'_>, id: i64, data: UpdateFishInput) -> Result<Fish> {
        let identity = caller(ctx)?;
        Ok(fish::update_fish(app(ctx)?, &identity, id, data).await?)
    }

    async fn delete_fish(&self, ctx: &Context<'_>, id: i64) -> Result<Fish> {
        let identity = caller(ctx)?;
        Ok(fish::delete_fish(app(ctx)?, &identity, id).await?)
    }

    async fn create_fly(&self, ctx: &Context<'_>, data: CreateFlyInput) -> Result<Fly> {
        let identity = caller(ctx)?;
        Ok(flies::create_fly(app(ctx)?, &identity, data).await?)
    }

    async fn update_fly(&self, ctx: &Context<'_>, id: i64, data: UpdateFlyInput) -> Result<Fly> {
        let identity = caller(ctx)?;
        Ok(flies::update_fly(app(ctx)?, &identity, id, data).await?)
    }

    async fn delete_fly(&self, ctx: &Context<'_>, id: i64) -> Result<Fly> {
        let identity = caller(ctx)?;
        Ok(flies::delete_fly(app(ctx)?, &identity, id).await?)
    }

    async fn create_river(&self, ctx: &Context<'_>, data: CreateRiverInput) -> Result<River> {
        let identity = caller(ctx)?;
        Ok(rivers::create_river(app(ctx)?, &identity, data).await?)
    }

    async fn update_river(&self, ctx: &Context<'_>, id: i64, data: UpdateRiverInput) -> Result<River> {
        let identity = caller(ctx)?;
        Ok(rivers::update_river(app(ctx)?, &identity, id, data).await?)
    }

    async fn delete_river(&self, ctx: &Context<'_>, id: i64) -> Result<River> {
        let identity = caller(ctx)?;
        Ok(rivers::delete_river(app(ctx)?, &identity, id).await?)
    }

    async fn create_tackle(&self, ctx: &Context<'_>, data: CreateTackleInput) -> Result<Tackle> {
        let identity = caller(ctx)?;
        Ok(tackle::create_tackle(app(ctx)?, &identity, data).await?)
    }

    async fn update_tackle(&self, ctx: &Context<'_>, id: i64, data: UpdateTackleInput) -> Result<Tackle> {
        let identity = caller(ctx)?;
        Ok(tackle::update_tackle(app(ctx)?, &identity, id, data).await?)
    }

    async fn delete_tackle(&self, ctx: &Context<'_>, id: i64) -> Result<Tackle> {
        let identity = caller(ctx)?;
        Ok(tackle::delete_tackle(app(ctx)?, &identity, id).await?)
    }

    async fn create_trip(&self, ctx: &Context<'_>, data: CreateTripInput) -> Result<Trip> {
        let identity = caller(ctx)?;
        Ok(trips::create_trip(app(ctx)?, &identity, data).await?)
    }

    async fn update_trip(&self, ctx: &Context<'_>, id: i64, data: UpdateTripInput) -> Result<Trip> {
        let identity = caller(ctx)?;
        Ok(trips::update_trip(app(ctx)?, &identity, id, data).await?)
    }

    async fn delete_trip(&self, ctx: &Context<'_>, id: i64) -> Result<Trip> {
        let identity = caller(ctx)?;
        Ok(trips::delete_trip(app(ctx)?, &identity, id).await?)
    }
}

// -- Subscription --

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    async fn user(&self, ctx: &Context<'_>) -> Result<BoxStream<'static, ChangeEvent<User>>> {
        watch(ctx).await
    }

    async fn profile(&self, ctx: &Context<'_>) -> Result<BoxStream<'static, ChangeEvent<Profile>>> {
        watch(ctx).await
    }

    async fn fish(&self, ctx: &Context<'_>) -> Result<BoxStream<'static, ChangeEvent<Fish>>> {
        watch(ctx).await
    }

    async fn fly(&self, ctx: &Context<'_>) -> Result<BoxStream<'static, ChangeEvent<Fly>>> {
        watch(ctx).await
    }

    async fn river(&self, ctx: &Context<'_>) -> Result<BoxStream<'static, ChangeEvent<River>>> {
        watch(ctx).await
    }

    async fn tackle(&self, ctx: &Context<'_>) -> Result<BoxStream<'static, ChangeEvent<Tackle>>> {
        watch(ctx).await
    }

    async fn trip(&self, ctx: &Context<'_>) -> Result<BoxStream<'static, ChangeEvent<Trip>>> {
        watch(ctx).await
    }
}

/// Attach to the bus topic for `T` and keep only that topic's records.
async fn watch<T>(ctx: &Context<'_>) -> Result<BoxStream<'static, ChangeEvent<T>>>
where
    T: TopicRecord + OutputType + Send + 'static,
{
    let subscription = app(ctx)?.bus.subscribe(T::TOPIC).await;
    debug!("Subscriber {} attached to {}", subscription.id(), subscription.topic());

    Ok(subscription
        .filter_map(|change| {
            let mutation = change.mutation;
            ready(T::from_record(change.record).map(|data| ChangeEvent { mutation, data }))
        })
        .boxed())
}
