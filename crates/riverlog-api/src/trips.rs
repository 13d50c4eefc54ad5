use tracing::info;

use riverlog_types::api::{CreateTripInput, ListQuery, UpdateTripInput};
use riverlog_types::events::MutationKind;

use crate::auth::Identity;
use crate::error::{ApiError, ApiResult};
use crate::objects::Trip;
use crate::state::AppStateInner;

const TRIP_MISSING: &str = "Trip doesn't exist! Care to add one?";

/// Everyone's trips, newest or oldest first by `list.order`.
pub async fn list_trips(state: &AppStateInner, list: ListQuery) -> ApiResult<Vec<Trip>> {
    let rows = state.store(move |db| db.list_trips(&list, None)).await?;
    Ok(rows.into_iter().map(Trip::from).collect())
}

pub async fn my_trips(
    state: &AppStateInner,
    identity: &Identity,
    list: ListQuery,
) -> ApiResult<Vec<Trip>> {
    let owner = identity.user_id;
    let rows = state.store(move |db| db.list_trips(&list, Some(owner))).await?;
    Ok(rows.into_iter().map(Trip::from).collect())
}

pub async fn create_trip(
    state: &AppStateInner,
    identity: &Identity,
    input: CreateTripInput,
) -> ApiResult<Trip> {
    let user_id = identity.user_id;
    let trip = Trip::from(state.store(move |db| db.create_trip(user_id, &input)).await?);

    info!("User {} logged trip {} on {}", user_id, trip.id, trip.date);
    state.publish(MutationKind::Created, trip.clone()).await;
    Ok(trip)
}

pub async fn update_trip(
    state: &AppStateInner,
    identity: &Identity,
    id: i64,
    input: UpdateTripInput,
) -> ApiResult<Trip> {
    let user_id = identity.user_id;
    let outcome = state.store(move |db| db.update_trip(id, user_id, &input)).await?;
    let trip = Trip::from(outcome.done().ok_or_else(|| ApiError::not_found(TRIP_MISSING))?);

    info!("User {} updated trip {}", user_id, trip.id);
    state.publish(MutationKind::Updated, trip.clone()).await;
    Ok(trip)
}

pub async fn delete_trip(state: &AppStateInner, identity: &Identity, id: i64) -> ApiResult<Trip> {
    let user_id = identity.user_id;
    let outcome = state.store(move |db| db.delete_trip(id, user_id)).await?;
    let trip = Trip::from(outcome.done().ok_or_else(|| ApiError::not_found(TRIP_MISSING))?);

    info!("User {} deleted trip {}", user_id, trip.id);
    state.publish(MutationKind::Deleted, trip.clone()).await;
    Ok(trip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use chrono::NaiveDate;
    use riverlog_types::api::CreateTackleInput;

    #[derive(Debug, Default, PartialEq)]
    struct Gear {
        fish: Vec<i64>,
        flies: Vec<i64>,
        tackle: Vec<i64>,
    }

    /// Five fish, one fly and one rod owned by `owner`.
    fn gear(state: &AppStateInner, owner: &Identity) -> Gear {
        let fish = ["Brook", "Brown", "Cutthroat", "Rainbow", "Tiger"]
            .into_iter()
            .map(|s| state.db.create_fish(s).unwrap().done().unwrap().id)
            .collect();
        let fly = state.db.create_fly("Streamer", "Woolly Bugger", "Olive").unwrap().done().unwrap();
        let rod = CreateTackleInput { rod_name: "Sage X".into(), ..Default::default() };
        let tackle = state.db.create_tackle(owner.user_id, &rod).unwrap().done().unwrap();
        Gear {
            fish,
            flies: vec![fly.id],
            tackle: vec![tackle.id],
        }
    }

    /// What a trip is linked to right now, ids ascending.
    fn linked(state: &AppStateInner, trip_id: i64) -> Gear {
        let ids = |mut ids: Vec<i64>| {
            ids.sort_unstable();
            ids
        };
        Gear {
            fish: ids(state.db.fish_for_trip(trip_id).unwrap().iter().map(|f| f.id).collect()),
            flies: ids(state.db.flies_for_trip(trip_id).unwrap().iter().map(|f| f.id).collect()),
            tackle: ids(state.db.tackle_for_trip(trip_id).unwrap().iter().map(|t| t.id).collect()),
        }
    }

    fn trip_on(date: &str) -> CreateTripInput {
        CreateTripInput {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time_spent: Some(4.5),
            amount_caught: Some(3),
            average_size: None,
            largest_size: Some(18.0),
            river: None,
            fish: Vec::new(),
            flies: Vec::new(),
            tackle: Vec::new(),
        }
    }

    #[tokio::test]
    async fn replacing_fish_leaves_other_links_alone() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        let gear = gear(&state, &me);

        let input = CreateTripInput {
            fish: gear.fish[..2].to_vec(),
            flies: gear.flies.clone(),
            tackle: gear.tackle.clone(),
            ..trip_on("2024-06-01")
        };
        let trip = create_trip(&state, &me, input).await.unwrap();
        let before = linked(&state, trip.id);
        assert_eq!(before.fish, gear.fish[..2]);
        assert_eq!(before.flies, gear.flies);
        assert_eq!(before.tackle, gear.tackle);

        let update = UpdateTripInput {
            fish: Some(vec![gear.fish[4]]),
            ..Default::default()
        };
        let updated = update_trip(&state, &me, trip.id, update).await.unwrap();
        assert_eq!(updated.amount_caught, Some(3));
        let after = linked(&state, trip.id);
        assert_eq!(after.fish, [gear.fish[4]]);
        assert_eq!(after.flies, gear.flies);
        assert_eq!(after.tackle, gear.tackle);
    }

    #[tokio::test]
    async fn delete_leaves_no_links() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        let gear = gear(&state, &me);
        let input = CreateTripInput {
            fish: gear.fish.clone(),
            flies: gear.flies,
            tackle: gear.tackle,
            ..trip_on("2024-06-02")
        };
        let trip = create_trip(&state, &me, input).await.unwrap();

        let deleted = delete_trip(&state, &me, trip.id).await.unwrap();
        assert_eq!(deleted, trip);
        assert_eq!(linked(&state, trip.id), Gear::default());
    }

    #[tokio::test]
    async fn writes_are_scoped_to_the_owner() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        let other = test_support::angler(&state, "other@x.com");
        let theirs = create_trip(&state, &other, trip_on("2024-05-01")).await.unwrap();

        let err = update_trip(&state, &me, theirs.id, UpdateTripInput::default()).await.unwrap_err();
        assert_eq!(err.to_string(), TRIP_MISSING);
        let err = delete_trip(&state, &me, theirs.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn my_trips_sorts_by_date() {
        let (state, _mail) = test_support::state();
        let me = test_support::angler(&state, "me@x.com");
        let other = test_support::angler(&state, "other@x.com");
        for date in ["2024-07-04", "2024-03-15", "2024-05-20"] {
            create_trip(&state, &me, trip_on(date)).await.unwrap();
        }
        create_trip(&state, &other, trip_on("2024-01-01")).await.unwrap();

        let list = ListQuery {
            order: riverlog_types::api::SortOrder::Desc,
            ..Default::default()
        };
        let dates: Vec<String> = my_trips(&state, &me, list)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.date.to_string())
            .collect();
        assert_eq!(dates, ["2024-07-04", "2024-05-20", "2024-03-15"]);

        assert_eq!(list_trips(&state, ListQuery::default()).await.unwrap().len(), 4);
    }
}
