use tracing::info;

use riverlog_types::api::{CreateRiverInput, ListQuery, UpdateRiverInput};
use riverlog_types::events::MutationKind;

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::objects::River;
use crate::state::AppStateInner;
use crate::text::to_title_case;

const RIVER_MISSING: &str = "River doesn't exist! Care to add one to the database?";

/// Filtered on name, regulation and size, sorted by name.
pub async fn list_rivers(state: &AppStateInner, list: ListQuery) -> ApiResult<Vec<River>> {
    let rows = state.store(move |db| db.list_rivers(&list)).await?;
    Ok(rows.into_iter().map(River::from).collect())
}

/// Rivers are not natural-keyed: two rivers may share a name.
pub async fn create_river(
    state: &AppStateInner,
    identity: &Identity,
    mut input: CreateRiverInput,
) -> ApiResult<River> {
    input.name = to_title_case(&input.name);

    let river = River::from(state.store(move |db| db.create_river(&input)).await?);

    info!("User {} added river {} ({})", identity.user_id, river.id, river.name);
    state.publish(MutationKind::Created, river.clone()).await;
    Ok(river)
}

pub async fn update_river(
    state: &AppStateInner,
    identity: &Identity,
    id: i64,
    mut input: UpdateRiverInput,
) -> ApiResult<River> {
    input.name = input.name.as_deref().map(to_title_case);

    let outcome = state.store(move |db| db.update_river(id, &input)).await?;
    let river = River::from(outcome.done().ok_or_else(|| ApiError::not_found(RIVER_MISSING))?);

    info!("User {} updated river {}", identity.user_id, river.id);
    state.publish(MutationKind::Updated, river.clone()).await;
    Ok(river)
}

pub async fn delete_river(state: &AppStateInner, identity: &Identity, id: i64) -> ApiResult<River> {
    let outcome = state.store(move |db| db.delete_river(id)).await?;
    let river = River::from(outcome.done().ok_or_else(|| ApiError::not_found(RIVER_MISSING))?);

    info!("User {} deleted river {}", identity.user_id, river.id);
    state.publish(MutationKind::Deleted, river.clone()).await;
    Ok(river)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    /// Linked fish and fly ids for a river, each ascending.
    fn links(state: &AppStateInner, river_id: i64) -> (Vec<i64>, Vec<i64>) {
        let mut fish: Vec<i64> = state.db.fish_for_river(river_id).unwrap().iter().map(|f| f.id).collect();
        let mut flies: Vec<i64> = state.db.flies_for_river(river_id).unwrap().iter().map(|f| f.id).collect();
        fish.sort_unstable();
        flies.sort_unstable();
        (fish, flies)
    }

    fn fish(state: &AppStateInner, species: &str) -> i64 {
        state.db.create_fish(species).unwrap().done().unwrap().id
    }

    fn fly(state: &AppStateInner, name: &str) -> i64 {
        state.db.create_fly("Dry", name, "Gray").unwrap().done().unwrap().id
    }

    #[tokio::test]
    async fn create_links_fish_and_flies() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        let trout = fish(&state, "Trout");
        let adams = fly(&state, "Adams");

        let input = CreateRiverInput {
            name: "madison river".into(),
            stocked: Some(true),
            fish: vec![trout],
            flies: vec![adams],
            ..Default::default()
        };
        let river = create_river(&state, &me, input).await.unwrap();

        assert_eq!(river.name, "Madison River");
        assert!(river.stocked);
        assert_eq!(links(&state, river.id), (vec![trout], vec![adams]));
    }

    #[tokio::test]
    async fn update_replaces_only_supplied_lists() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        let (trout, pike) = (fish(&state, "Trout"), fish(&state, "Pike"));
        let adams = fly(&state, "Adams");

        let input = CreateRiverInput {
            name: "Gallatin".into(),
            regulation: Some("Catch and release".into()),
            fish: vec![trout],
            flies: vec![adams],
            ..Default::default()
        };
        let river = create_river(&state, &me, input).await.unwrap();

        let update = UpdateRiverInput {
            size: Some("Medium".into()),
            fish: Some(vec![pike]),
            ..Default::default()
        };
        let updated = update_river(&state, &me, river.id, update).await.unwrap();

        assert_eq!(updated.name, "Gallatin");
        assert_eq!(updated.regulation.as_deref(), Some("Catch and release"));
        assert_eq!(updated.size.as_deref(), Some("Medium"));
        assert_eq!(links(&state, river.id), (vec![pike], vec![adams]));
    }

    #[tokio::test]
    async fn delete_leaves_no_links() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        let input = CreateRiverInput {
            name: "Yellowstone".into(),
            fish: vec![fish(&state, "Trout")],
            flies: vec![fly(&state, "Adams")],
            ..Default::default()
        };
        let river = create_river(&state, &me, input).await.unwrap();

        let deleted = delete_river(&state, &me, river.id).await.unwrap();
        assert_eq!(deleted, river);
        assert_eq!(links(&state, river.id), (vec![], vec![]));

        let err = delete_river(&state, &me, river.id).await.unwrap_err();
        assert_eq!(err.to_string(), RIVER_MISSING);
    }

    #[tokio::test]
    async fn unknown_fish_id_fails_without_creating_the_river() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        let input = CreateRiverInput {
            name: "Nowhere".into(),
            fish: vec![404],
            ..Default::default()
        };

        let err = create_river(&state, &me, input).await.unwrap_err();
        assert!(matches!(err, ApiError::Store(_)));
        assert!(list_rivers(&state, ListQuery::default()).await.unwrap().is_empty());
    }
}
