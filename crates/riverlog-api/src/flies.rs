use tracing::info;

use riverlog_types::api::{CreateFlyInput, ListQuery, UpdateFlyInput};
use riverlog_types::events::MutationKind;

use crate::auth::Identity;
use crate::error::{ApiResult, settle};
use crate::objects::Fly;
use crate::state::AppStateInner;
use crate::text::to_title_case;

const FLY_EXISTS: &str = "Fly already exists! Care to add a new one?";
const FLY_MISSING: &str = "Fly doesn't exist! Care to add one to the database?";

/// Filtered on name, color and type, sorted by name.
pub async fn list_flies(state: &AppStateInner, list: ListQuery) -> ApiResult<Vec<Fly>> {
    let rows = state.store(move |db| db.list_flies(&list)).await?;
    Ok(rows.into_iter().map(Fly::from).collect())
}

pub async fn create_fly(
    state: &AppStateInner,
    identity: &Identity,
    input: CreateFlyInput,
) -> ApiResult<Fly> {
    let fly_type = to_title_case(&input.fly_type);
    let name = to_title_case(&input.name);
    let color = to_title_case(&input.color);

    let outcome = state
        .store(move |db| db.create_fly(&fly_type, &name, &color))
        .await?;
    let fly = Fly::from(settle(outcome, FLY_MISSING, FLY_EXISTS)?);

    info!("User {} added fly {} ({} {} {})", identity.user_id, fly.id, fly.color, fly.name, fly.fly_type);
    state.publish(MutationKind::Created, fly.clone()).await;
    Ok(fly)
}

pub async fn update_fly(
    state: &AppStateInner,
    identity: &Identity,
    id: i64,
    input: UpdateFlyInput,
) -> ApiResult<Fly> {
    let fly_type = input.fly_type.as_deref().map(to_title_case);
    let name = input.name.as_deref().map(to_title_case);
    let color = input.color.as_deref().map(to_title_case);

    let outcome = state
        .store(move |db| db.update_fly(id, fly_type.as_deref(), name.as_deref(), color.as_deref()))
        .await?;
    let fly = Fly::from(settle(outcome, FLY_MISSING, FLY_EXISTS)?);

    info!("User {} updated fly {}", identity.user_id, fly.id);
    state.publish(MutationKind::Updated, fly.clone()).await;
    Ok(fly)
}

pub async fn delete_fly(state: &AppStateInner, identity: &Identity, id: i64) -> ApiResult<Fly> {
    let outcome = state.store(move |db| db.delete_fly(id)).await?;
    let fly = Fly::from(settle(outcome, FLY_MISSING, FLY_EXISTS)?);

    info!("User {} deleted fly {}", identity.user_id, fly.id);
    state.publish(MutationKind::Deleted, fly.clone()).await;
    Ok(fly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_support;

    fn fly(fly_type: &str, name: &str, color: &str) -> CreateFlyInput {
        CreateFlyInput {
            fly_type: fly_type.into(),
            name: name.into(),
            color: color.into(),
        }
    }

    #[tokio::test]
    async fn duplicate_triple_ignores_case() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");

        let adams = create_fly(&state, &me, fly("dry", "parachute adams", "gray")).await.unwrap();
        assert_eq!(adams.name, "Parachute Adams");

        let err = create_fly(&state, &me, fly("DRY", "Parachute ADAMS", "GRAY")).await.unwrap_err();
        assert!(matches!(err, ApiError::Duplicate(_)));
        assert_eq!(err.to_string(), FLY_EXISTS);

        // a different color is a different fly
        create_fly(&state, &me, fly("dry", "parachute adams", "purple")).await.unwrap();
    }

    #[tokio::test]
    async fn update_merges_and_checks_the_new_key() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        create_fly(&state, &me, fly("nymph", "pheasant tail", "natural")).await.unwrap();
        let bead = create_fly(&state, &me, fly("nymph", "pheasant tail", "copper")).await.unwrap();

        let clash = UpdateFlyInput { color: Some("NATURAL".into()), ..Default::default() };
        let err = update_fly(&state, &me, bead.id, clash).await.unwrap_err();
        assert!(matches!(err, ApiError::Duplicate(_)));

        let recolor = UpdateFlyInput { color: Some("red".into()), ..Default::default() };
        let updated = update_fly(&state, &me, bead.id, recolor).await.unwrap();
        assert_eq!(updated.color, "Red");
        assert_eq!(updated.name, "Pheasant Tail");
        assert_eq!(updated.fly_type, "Nymph");
    }

    #[tokio::test]
    async fn missing_fly_is_not_found() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");

        let err = delete_fly(&state, &me, 7).await.unwrap_err();
        assert_eq!(err.to_string(), FLY_MISSING);
    }
}
