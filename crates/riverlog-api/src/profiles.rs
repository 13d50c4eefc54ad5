//! A user has at most one profile, so every write addresses the caller's
//! own profile and takes no id.

use tracing::info;

use riverlog_types::api::{ListQuery, ProfileInput};
use riverlog_types::events::MutationKind;

use crate::auth::Identity;
use crate::error::{ApiResult, settle};
use crate::objects::Profile;
use crate::state::AppStateInner;

const PROFILE_EXISTS: &str = "You already have a profile! Care to update it?";
const PROFILE_MISSING: &str = "You don't have a profile! Care to create one?";

pub async fn list_profiles(state: &AppStateInner, list: ListQuery) -> ApiResult<Vec<Profile>> {
    let rows = state.store(move |db| db.list_profiles(&list)).await?;
    Ok(rows.into_iter().map(Profile::from).collect())
}

pub async fn my_profile(state: &AppStateInner, identity: &Identity) -> ApiResult<Option<Profile>> {
    let user_id = identity.user_id;
    let row = state.store(move |db| db.get_profile_by_user(user_id)).await?;
    Ok(row.map(Profile::from))
}

pub async fn create_profile(
    state: &AppStateInner,
    identity: &Identity,
    input: ProfileInput,
) -> ApiResult<Profile> {
    let user_id = identity.user_id;
    let outcome = state.store(move |db| db.create_profile(user_id, &input)).await?;
    let profile = Profile::from(settle(outcome, PROFILE_MISSING, PROFILE_EXISTS)?);

    info!("User {} created profile {}", user_id, profile.id);
    state.publish(MutationKind::Created, profile.clone()).await;
    Ok(profile)
}

pub async fn update_profile(
    state: &AppStateInner,
    identity: &Identity,
    input: ProfileInput,
) -> ApiResult<Profile> {
    let user_id = identity.user_id;
    let outcome = state.store(move |db| db.update_profile(user_id, &input)).await?;
    let profile = Profile::from(settle(outcome, PROFILE_MISSING, PROFILE_EXISTS)?);

    info!("User {} updated profile {}", user_id, profile.id);
    state.publish(MutationKind::Updated, profile.clone()).await;
    Ok(profile)
}

pub async fn delete_profile(state: &AppStateInner, identity: &Identity) -> ApiResult<Profile> {
    let user_id = identity.user_id;
    let outcome = state.store(move |db| db.delete_profile(user_id)).await?;
    let profile = Profile::from(settle(outcome, PROFILE_MISSING, PROFILE_EXISTS)?);

    info!("User {} deleted profile {}", user_id, profile.id);
    state.publish(MutationKind::Deleted, profile.clone()).await;
    Ok(profile)
}
