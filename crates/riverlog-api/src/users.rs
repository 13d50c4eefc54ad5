use tracing::info;

use riverlog_types::api::{ListQuery, UpdateUserInput};
use riverlog_types::events::MutationKind;

use crate::auth::{Identity, hash_password};
use crate::error::{ApiError, ApiResult};
use crate::objects::User;
use crate::state::AppStateInner;
use crate::text::to_title_case;

const USER_MISSING_ON_UPDATE: &str = "User doesn't exist. Care to create an account?";
const USER_MISSING_ON_DELETE: &str = "User doesn't exist.";

/// Filtered on name and email, sorted by name.
pub async fn list_users(state: &AppStateInner, list: ListQuery) -> ApiResult<Vec<User>> {
    let rows = state.store(move |db| db.list_users(&list)).await?;
    Ok(rows.into_iter().map(User::from).collect())
}

pub async fn me(state: &AppStateInner, identity: &Identity) -> ApiResult<Option<User>> {
    let user_id = identity.user_id;
    let row = state.store(move |db| db.get_user_by_id(user_id)).await?;
    Ok(row.map(User::from))
}

pub async fn update_user(
    state: &AppStateInner,
    identity: &Identity,
    input: UpdateUserInput,
) -> ApiResult<User> {
    let name = input.name.as_deref().map(to_title_case);
    let hash = input.password.as_deref().map(hash_password).transpose()?;
    let email = input.email;
    let user_id = identity.user_id;

    let outcome = state
        .store(move |db| db.update_user(user_id, name.as_deref(), email.as_deref(), hash.as_deref()))
        .await?;
    let user = User::from(
        outcome
            .done()
            .ok_or_else(|| ApiError::not_found(USER_MISSING_ON_UPDATE))?,
    );

    info!("User {} updated their account", user.id);
    state.publish(MutationKind::Updated, user.clone()).await;
    Ok(user)
}

/// Remove the caller's account along with their profile, tackle and trips.
pub async fn delete_user(state: &AppStateInner, identity: &Identity) -> ApiResult<User> {
    let user_id = identity.user_id;
    let outcome = state.store(move |db| db.delete_user(user_id)).await?;
    let user = User::from(
        outcome
            .done()
            .ok_or_else(|| ApiError::not_found(USER_MISSING_ON_DELETE))?,
    );

    info!("User {} deleted their account", user.id);
    state.publish(MutationKind::Deleted, user.clone()).await;
    Ok(user)
}
