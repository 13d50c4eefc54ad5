use tracing::info;

use riverlog_types::api::{CreateFishInput, ListQuery, UpdateFishInput};
use riverlog_types::events::MutationKind;

use crate::auth::Identity;
use crate::error::{ApiResult, settle};
use crate::objects::Fish;
use crate::state::AppStateInner;
use crate::text::to_title_case;

const FISH_EXISTS: &str = "Fish already exists!";
const FISH_MISSING: &str = "Fish doesn't exist! Care to add it to our database?";

pub async fn list_fish(state: &AppStateInner, list: ListQuery) -> ApiResult<Vec<Fish>> {
    let rows = state.store(move |db| db.list_fish(&list)).await?;
    Ok(rows.into_iter().map(Fish::from).collect())
}

pub async fn create_fish(
    state: &AppStateInner,
    identity: &Identity,
    input: CreateFishInput,
) -> ApiResult<Fish> {
    let species = to_title_case(&input.species);
    let outcome = state.store(move |db| db.create_fish(&species)).await?;
    let fish = Fish::from(settle(outcome, FISH_MISSING, FISH_EXISTS)?);

    info!("User {} added fish {} ({})", identity.user_id, fish.id, fish.species);
    state.publish(MutationKind::Created, fish.clone()).await;
    Ok(fish)
}

pub async fn update_fish(
    state: &AppStateInner,
    identity: &Identity,
    id: i64,
    input: UpdateFishInput,
) -> ApiResult<Fish> {
    let species = input.species.as_deref().map(to_title_case);
    let outcome = state
        .store(move |db| db.update_fish(id, species.as_deref()))
        .await?;
    let fish = Fish::from(settle(outcome, FISH_MISSING, FISH_EXISTS)?);

    info!("User {} updated fish {}", identity.user_id, fish.id);
    state.publish(MutationKind::Updated, fish.clone()).await;
    Ok(fish)
}

/// Removing a species also drops it from every river and trip.
pub async fn delete_fish(state: &AppStateInner, identity: &Identity, id: i64) -> ApiResult<Fish> {
    let outcome = state.store(move |db| db.delete_fish(id)).await?;
    let fish = Fish::from(settle(outcome, FISH_MISSING, FISH_EXISTS)?);

    info!("User {} deleted fish {}", identity.user_id, fish.id);
    state.publish(MutationKind::Deleted, fish.clone()).await;
    Ok(fish)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::test_support;
    use futures_util::{FutureExt, StreamExt};
    use riverlog_types::events::Topic;

    fn species(name: &str) -> CreateFishInput {
        CreateFishInput { species: name.into() }
    }

    #[tokio::test]
    async fn duplicate_species_ignores_case() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");

        let trout = create_fish(&state, &me, species("trout")).await.unwrap();
        assert_eq!(trout.species, "Trout");

        let err = create_fish(&state, &me, species("TROUT")).await.unwrap_err();
        assert!(matches!(err, ApiError::Duplicate(_)));
        assert_eq!(err.to_string(), FISH_EXISTS);
    }

    #[tokio::test]
    async fn rename_onto_existing_species_conflicts() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        create_fish(&state, &me, species("brown trout")).await.unwrap();
        let pike = create_fish(&state, &me, species("pike")).await.unwrap();

        let rename = UpdateFishInput { species: Some("BROWN TROUT".into()) };
        let err = update_fish(&state, &me, pike.id, rename).await.unwrap_err();
        assert!(matches!(err, ApiError::Duplicate(_)));

        let unchanged = update_fish(&state, &me, pike.id, UpdateFishInput::default()).await.unwrap();
        assert_eq!(unchanged, pike);
    }

    #[tokio::test]
    async fn missing_fish_is_not_found() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");

        let err = delete_fish(&state, &me, 42).await.unwrap_err();
        assert_eq!(err.to_string(), FISH_MISSING);
        let err = update_fish(&state, &me, 42, UpdateFishInput::default()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn mutations_publish_on_the_fish_topic_only() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        let mut fish_events = state.bus.subscribe(Topic::Fish).await;
        let mut fly_events = state.bus.subscribe(Topic::Fly).await;

        let grayling = create_fish(&state, &me, species("grayling")).await.unwrap();
        delete_fish(&state, &me, grayling.id).await.unwrap();

        let kinds: Vec<MutationKind> = (&mut fish_events).take(2).map(|c| c.mutation).collect().await;
        assert_eq!(kinds, [MutationKind::Created, MutationKind::Deleted]);
        assert!(fly_events.next().now_or_never().is_none());
    }

    #[tokio::test]
    async fn list_sorts_by_species() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        for name in ["walleye", "brook trout", "rainbow trout"] {
            create_fish(&state, &me, species(name)).await.unwrap();
        }

        let list = ListQuery {
            query: "trout".into(),
            order: riverlog_types::api::SortOrder::Desc,
            ..Default::default()
        };
        let names: Vec<String> = list_fish(&state, list).await.unwrap().into_iter().map(|f| f.species).collect();
        assert_eq!(names, ["Rainbow Trout", "Brook Trout"]);
    }
}
