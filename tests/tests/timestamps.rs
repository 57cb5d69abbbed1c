use chrono::{DateTime, Duration, SubsecRound, Utc};
use strata::{stmt::Direction, Query, Record};
use tests::{models, models::*, tests, DbTest};

fn at(secs: i64, nanos: u32) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, nanos).unwrap()
}

async fn timestamps_keep_microseconds(test: &mut DbTest) {
    let store = test.setup_db(models!(EVENTS)).await;

    let happened_at = at(1_700_000_000, 123_456_789);
    let mut event = Event::new("launch", happened_at);
    store.insert(&mut event).await.unwrap();
    assert!(event.persisted());

    let mut query = Query::new(EVENTS.clone());
    query.filter(EVENTS.id_column().eq(event.id));

    let loaded: Event = store.find_one(&query).await.unwrap();
    assert_eq!(loaded.name, "launch");
    assert_eq!(loaded.happened_at, happened_at.trunc_subsecs(6));
    assert_eq!(loaded.happened_at.timestamp_subsec_nanos(), 123_456_000);
    assert_eq!(loaded.ended_at, None);
}

async fn nullable_timestamp_updates(test: &mut DbTest) {
    let store = test.setup_db(models!(EVENTS)).await;

    let mut event = Event::new("launch", at(1_700_000_000, 0));
    store.insert(&mut event).await.unwrap();

    let ended_at = event.happened_at + Duration::milliseconds(1500);
    event.ended_at = Some(ended_at);
    store.update(&mut event, &["ended_at"]).await.unwrap();

    let loaded: Event = store
        .find_one(&Query::new(EVENTS.clone()))
        .await
        .unwrap();
    assert_eq!(loaded.ended_at, Some(ended_at));
    assert_eq!(loaded.happened_at, event.happened_at);
}

async fn timestamps_filter_and_order(test: &mut DbTest) {
    let store = test.setup_db(models!(EVENTS)).await;

    for (name, secs) in [("b", 200), ("a", 100), ("c", 300)] {
        store
            .insert(&mut Event::new(name, at(secs, 0)))
            .await
            .unwrap();
    }

    let mut query = Query::new(EVENTS.clone());
    query
        .filter(EVENTS.column("happened_at").gt(at(150, 0)))
        .order_by(EVENTS.column("happened_at"), Direction::Desc);

    let names = store
        .all::<Event>(&query)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap()
        .into_iter()
        .map(|event| event.name)
        .collect::<Vec<_>>();
    assert_eq!(names, ["c", "b"]);
}

tests!(
    timestamps_keep_microseconds,
    nullable_timestamp_updates,
    timestamps_filter_and_order,
);
