use tracing::info;

use riverlog_types::api::{CreateTackleInput, ListQuery, UpdateTackleInput};
use riverlog_types::events::MutationKind;

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult, settle};
use crate::objects::Tackle;
use crate::state::AppStateInner;
use crate::text::to_title_case;

const TACKLE_EXISTS: &str = "Tackle already exists. Care to add another?";
const TACKLE_MISSING: &str = "Tackle doesn't exist! Care to add one?";
const TACKLE_UNDELETABLE: &str = "Cannot delete tackle.";

/// Everyone's tackle, filtered on rod name and weight.
pub async fn list_tackle(state: &AppStateInner, list: ListQuery) -> ApiResult<Vec<Tackle>> {
    let rows = state.store(move |db| db.list_tackle(&list, None)).await?;
    Ok(rows.into_iter().map(Tackle::from).collect())
}

pub async fn my_tackle(
    state: &AppStateInner,
    identity: &Identity,
    list: ListQuery,
) -> ApiResult<Vec<Tackle>> {
    let owner = identity.user_id;
    let rows = state.store(move |db| db.list_tackle(&list, Some(owner))).await?;
    Ok(rows.into_iter().map(Tackle::from).collect())
}

pub async fn create_tackle(
    state: &AppStateInner,
    identity: &Identity,
    mut input: CreateTackleInput,
) -> ApiResult<Tackle> {
    input.rod_name = to_title_case(&input.rod_name);
    let user_id = identity.user_id;

    let outcome = state.store(move |db| db.create_tackle(user_id, &input)).await?;
    let tackle = Tackle::from(settle(outcome, TACKLE_MISSING, TACKLE_EXISTS)?);

    info!("User {} added tackle {} ({})", user_id, tackle.id, tackle.rod_name);
    state.publish(MutationKind::Created, tackle.clone()).await;
    Ok(tackle)
}

pub async fn update_tackle(
    state: &AppStateInner,
    identity: &Identity,
    id: i64,
    mut input: UpdateTackleInput,
) -> ApiResult<Tackle> {
    input.rod_name = input.rod_name.as_deref().map(to_title_case);
    let user_id = identity.user_id;

    let outcome = state.store(move |db| db.update_tackle(id, user_id, &input)).await?;
    let tackle = Tackle::from(settle(outcome, TACKLE_MISSING, TACKLE_EXISTS)?);

    info!("User {} updated tackle {}", user_id, tackle.id);
    state.publish(MutationKind::Updated, tackle.clone()).await;
    Ok(tackle)
}

/// Delete the caller's tackle and unlink it from their trips.
pub async fn delete_tackle(state: &AppStateInner, identity: &Identity, id: i64) -> ApiResult<Tackle> {
    let user_id = identity.user_id;
    let outcome = state.store(move |db| db.delete_tackle(id, user_id)).await?;
    let tackle = Tackle::from(outcome.done().ok_or_else(|| ApiError::not_found(TACKLE_UNDELETABLE))?);

    info!("User {} deleted tackle {}", user_id, tackle.id);
    state.publish(MutationKind::Deleted, tackle.clone()).await;
    Ok(tackle)
}
