use strata::{
    stmt::{Direction, Value},
    Query, Record, Store,
};
use tests::{models, models::*, tests, DbTest};

async fn seed_families(store: &Store, parents: usize) -> Vec<Parent> {
    let mut seeded = vec![];
    for i in 0..parents {
        let mut parent = Parent::new(format!("parent {i}"));
        parent.children = (0..4).map(|n| Child::new(n.to_string())).collect();
        store.insert(&mut parent).await.unwrap();
        seeded.push(parent);
    }
    seeded
}

async fn insert_cascades_to_children(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;

    let mut parent = Parent::new("root");
    parent.children = vec![Child::new("a"), Child::new("b")];
    store.insert(&mut parent).await.unwrap();

    assert!(parent.persisted());
    assert!(!parent.id.is_unset());

    for child in &parent.children {
        assert!(child.persisted());
        assert_eq!(child.parent_id(), Some(&parent.id.to_value()));
    }

    let children = store
        .all::<Child>(&Query::new(CHILDREN.clone()))
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(children.len(), 2);
    assert!(children
        .iter()
        .all(|child| child.parent_id() == Some(&parent.id.to_value())));
}

async fn filtered_children_with_limit(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;
    seed_families(&store, 10).await;
    test.log().clear();

    let mut query = Query::new(PARENTS.clone());
    query.limit(5).batch_size(2).with_many(
        "children",
        CHILDREN.clone(),
        Some(CHILDREN.column("n").eq("1")),
    );

    let parents = store
        .all::<Parent>(&query)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(parents.len(), 5);
    for (i, parent) in parents.iter().enumerate() {
        assert_eq!(parent.name, format!("parent {i}"));
        assert_eq!(parent.children.len(), 1);
        assert_eq!(parent.children[0].n, "1");
        assert_eq!(parent.children[0].parent_id(), Some(&parent.id.to_value()));
        assert!(parent.persisted());
        assert!(!parent.writable());
    }

    // Pages of 2, 2 and 1 parents, each followed by one children query.
    assert_eq!(test.log().selects_on("parents"), 3);
    assert_eq!(test.log().selects_on("children"), 3);
}

async fn small_result_loads_in_one_round_trip(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;
    seed_families(&store, 4).await;
    test.log().clear();

    let mut query = Query::new(PARENTS.clone());
    query
        .limit(6)
        .with_many("children", CHILDREN.clone(), None);

    let parents = store
        .all::<Parent>(&query)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(parents.len(), 4);
    for parent in &parents {
        assert_eq!(parent.children.len(), 4);
        assert!(parent.writable());
        let ns = parent
            .children
            .iter()
            .map(|child| child.n.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ns, ["0", "1", "2", "3"]);
    }

    assert_eq!(test.log().selects_on("parents"), 1);
    assert_eq!(test.log().selects_on("children"), 1);
    assert_eq!(test.log().operations().len(), 2);
}

async fn batched_results_match_plain_query(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;
    seed_families(&store, 7).await;

    let mut plain = Query::new(PARENTS.clone());
    plain
        .order_by(PARENTS.column("name"), Direction::Desc)
        .offset(1)
        .limit(5);

    let mut batched = plain.copy();
    batched
        .batch_size(2)
        .with_many("children", CHILDREN.clone(), None);
    assert!(batched.is_batched());

    let expected = store
        .all::<Parent>(&plain)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap()
        .into_iter()
        .map(|parent| parent.name)
        .collect::<Vec<_>>();

    let actual = store
        .all::<Parent>(&batched)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap()
        .into_iter()
        .map(|parent| parent.name)
        .collect::<Vec<_>>();

    assert_eq!(
        expected,
        ["parent 5", "parent 4", "parent 3", "parent 2", "parent 1"]
    );
    assert_eq!(actual, expected);
}

async fn parents_without_children_get_empty_lists(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;
    let mut lonely = Parent::new("lonely");
    store.insert(&mut lonely).await.unwrap();

    let mut query = Query::new(PARENTS.clone());
    query.with_many("children", CHILDREN.clone(), None);

    let parent: Parent = store.find_one(&query).await.unwrap();
    assert_eq!(parent.name, "lonely");
    assert!(parent.children.is_empty());
}

async fn save_updates_loaded_children(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;
    seed_families(&store, 1).await;

    let mut query = Query::new(PARENTS.clone());
    query.with_many("children", CHILDREN.clone(), None);

    let mut parent: Parent = store.find_one(&query).await.unwrap();
    parent.name = "renamed".to_string();
    parent.children[0].n = "zero".to_string();
    assert!(store.save(&mut parent).await.unwrap());

    let reloaded: Parent = store.find_one(&query).await.unwrap();
    assert_eq!(reloaded.name, "renamed");
    assert_eq!(reloaded.children[0].n, "zero");
    assert_eq!(reloaded.children.len(), 4);
}

async fn filtered_parents_refuse_updates(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;
    seed_families(&store, 1).await;

    let mut query = Query::new(PARENTS.clone());
    query.with_many(
        "children",
        CHILDREN.clone(),
        Some(CHILDREN.column("n").eq("3")),
    );

    let mut parent: Parent = store.find_one(&query).await.unwrap();
    parent.name = "changed".to_string();

    let err = store.update(&mut parent, &[]).await.unwrap_err();
    assert!(err.is_not_writable());
}

async fn update_named_columns(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;
    let mut parent = Parent::new("before");
    store.insert(&mut parent).await.unwrap();

    parent.name = "after".to_string();
    store.update(&mut parent, &["name"]).await.unwrap();

    let err = store.update(&mut parent, &["nope"]).await.unwrap_err();
    assert!(err.is_unknown_column());

    let mut fresh = Parent::new("fresh");
    let err = store.update(&mut fresh, &[]).await.unwrap_err();
    assert!(err.is_not_persisted());

    let loaded: Parent = store
        .find_one(&Query::new(PARENTS.clone()))
        .await
        .unwrap();
    assert_eq!(loaded.name, "after");
}

async fn relationship_must_be_declared(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;

    let mut query = Query::new(PARENTS.clone());
    query.with_one("children", CHILDREN.clone());

    let err = store.find(&query).await.unwrap_err();
    assert!(err.is_invalid_relation());

    let mut query = Query::new(CHILDREN.clone());
    query.with_many("siblings", CHILDREN.clone(), None);
    assert!(query.validate().unwrap_err().is_invalid_relation());
}

async fn children_keyed_by_parent_id(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;
    let seeded = seed_families(&store, 3).await;

    let mut query = Query::new(CHILDREN.clone());
    query.filter(CHILDREN.column("parent_id").eq(seeded[1].id));

    let count = store.count(&query).await.unwrap();
    assert_eq!(count, 4);

    let children = store
        .all::<Child>(&query)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert!(children
        .iter()
        .all(|child| child.parent_id() == Some(&Value::from(seeded[1].id))));
}

async fn failed_children_query_keeps_failing(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;
    seed_families(&store, 3).await;
    test.log().clear();

    let mut query = Query::new(PARENTS.clone());
    query.with_many(
        "children",
        CHILDREN.clone(),
        Some(CHILDREN.column("nope").eq("x")),
    );

    // The parent page is short, but its children query fails; the stream
    // must not report a clean end afterwards.
    let mut records = store.find(&query).await.unwrap();
    assert!(records.next().await.is_err());
    assert!(records.next().await.is_err());
    assert_eq!(test.log().selects_on("parents"), 1);
}

async fn batched_stream_closes_once(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;
    seed_families(&store, 2).await;

    let mut query = Query::new(PARENTS.clone());
    query.with_many("children", CHILDREN.clone(), None);

    let mut records = store.find(&query).await.unwrap();
    assert!(records.is_batched());
    assert!(records.next().await.unwrap());

    records.close().unwrap();
    assert!(records.close().unwrap_err().is_already_closed());
    assert!(records.next().await.unwrap_err().is_already_closed());
}

tests!(
    insert_cascades_to_children,
    filtered_children_with_limit,
    small_result_loads_in_one_round_trip,
    batched_results_match_plain_query,
    parents_without_children_get_empty_lists,
    save_updates_loaded_children,
    filtered_parents_refuse_updates,
    update_named_columns,
    relationship_must_be_declared,
    children_keyed_by_parent_id,
    failed_children_query_keeps_failing,
    batched_stream_closes_once,
);
