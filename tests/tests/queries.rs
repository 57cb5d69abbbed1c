use pretty_assertions::assert_eq;
use strata::{
    schema::JsonCast,
    stmt::{Assignment, Condition, Direction, Json, Value},
    Query, Record, RecordStream, Store,
};
use tests::{models, models::*, sql, tests, DbTest};

async fn seed_people(store: &Store) -> Vec<Person> {
    let mut people = vec![];
    for (name, age, tags, city) in [
        ("ann", 30, vec!["rust", "sql"], "Oslo"),
        ("bob", 20, vec!["go"], "Lima"),
        ("cy", 40, vec!["rust"], "Oslo"),
    ] {
        let mut person = Person::new(name);
        person.age = Some(age);
        person.tags = tags.into_iter().map(String::from).collect();
        person.profile = Some(Json(Profile {
            city: city.to_string(),
            score: age as i64 * 10,
        }));
        store.insert(&mut person).await.unwrap();
        people.push(person);
    }
    people
}

async fn names(store: &Store, query: &Query) -> Vec<String> {
    store
        .all::<Person>(query)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap()
        .into_iter()
        .map(|person| person.name)
        .collect()
}

async fn insert_then_read_back(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;

    let mut person = Person::new("ann");
    person.age = Some(31);
    person.tags = vec!["a".to_string(), "b".to_string()];
    person.profile = Some(Json(Profile {
        city: "Oslo".to_string(),
        score: 7,
    }));
    store.insert(&mut person).await.unwrap();
    assert!(person.persisted());

    let mut query = Query::new(PEOPLE.clone());
    query.filter(PEOPLE.id_column().eq(person.id));

    let loaded: Person = store.find_one(&query).await.unwrap();
    assert_eq!(loaded.id, person.id);
    assert_eq!(loaded.name, person.name);
    assert_eq!(loaded.age, person.age);
    assert_eq!(loaded.tags, person.tags);
    assert_eq!(loaded.profile, person.profile);
    assert!(loaded.persisted());
    assert!(loaded.writable());
}

async fn nullable_columns_round_trip_as_none(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;

    let mut person = Person::new("nobody");
    store.insert(&mut person).await.unwrap();

    let loaded: Person = store
        .find_one(&Query::new(PEOPLE.clone()))
        .await
        .unwrap();
    assert_eq!(loaded.age, None);
    assert_eq!(loaded.profile, None);

    let mut query = Query::new(PEOPLE.clone());
    query.filter(PEOPLE.column("age").is_null());
    assert_eq!(store.count(&query).await.unwrap(), 1);
}

async fn projected_records_are_read_only(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    seed_people(&store).await;
    test.log().clear();

    let mut query = Query::new(PEOPLE.clone());
    query.select(["name"]);
    assert!(query.is_projected());

    let mut person: Person = store.find_one(&query).await.unwrap();
    assert_eq!(person.name, "ann");
    assert!(!person.id.is_unset());
    assert_eq!(person.age, None);
    assert!(!person.writable());

    person.name = "changed".to_string();
    let err = store.update(&mut person, &[]).await.unwrap_err();
    assert!(err.is_not_writable());

    let select = test.log().statements().remove(0);
    assert_eq!(sql(&select), "SELECT p.id, p.name FROM people AS p LIMIT 1");
}

async fn excluded_columns_are_not_selected(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    seed_people(&store).await;
    test.log().clear();

    let mut query = Query::new(PEOPLE.clone());
    query.select_not(["tags", "profile"]);

    let people = store
        .all::<Person>(&query)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();
    assert_eq!(people.len(), 3);
    assert!(people.iter().all(|person| person.tags.is_empty()));
    assert!(people.iter().all(|person| !person.writable()));

    let select = test.log().pop();
    assert_eq!(
        sql(select.as_query().unwrap()),
        "SELECT p.id, p.name, p.age FROM people AS p"
    );
}

async fn empty_in_list_matches_nothing(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    seed_people(&store).await;
    test.log().clear();

    let mut query = Query::new(PEOPLE.clone());
    query.filter(PEOPLE.column("name").in_list(Vec::<String>::new()));

    assert!(names(&store, &query).await.is_empty());

    let select = test.log().pop();
    assert_eq!(
        sql(select.as_query().unwrap()),
        "SELECT p.id, p.name, p.age, p.tags, p.profile FROM people AS p WHERE 1=0"
    );

    let mut query = Query::new(PEOPLE.clone());
    query.filter(PEOPLE.column("name").not_in_list(Vec::<String>::new()));
    assert_eq!(names(&store, &query).await.len(), 3);
}

async fn order_offset_and_limit(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    seed_people(&store).await;

    let mut query = Query::new(PEOPLE.clone());
    query.order_by(PEOPLE.column("age"), Direction::Desc);
    assert_eq!(names(&store, &query).await, ["cy", "ann", "bob"]);

    query.offset(1).limit(1);
    assert_eq!(names(&store, &query).await, ["ann"]);

    // The window does not apply to counts.
    assert_eq!(store.count(&query).await.unwrap(), 3);
}

async fn combined_conditions(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    seed_people(&store).await;

    let mut query = Query::new(PEOPLE.clone());
    query.filter(Condition::or([
        PEOPLE.column("age").lt(25),
        Condition::and([
            PEOPLE.column("age").gt_or_eq(35),
            PEOPLE.column("name").like("c%"),
        ]),
    ]));
    assert_eq!(names(&store, &query).await, ["bob", "cy"]);

    let mut query = Query::new(PEOPLE.clone());
    query
        .filter(Condition::not(PEOPLE.column("name").eq("ann")))
        .filter(PEOPLE.column("name").ilike("B%"));
    assert_eq!(names(&store, &query).await, ["bob"]);
}

async fn array_and_json_conditions(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    seed_people(&store).await;

    let mut query = Query::new(PEOPLE.clone());
    query.filter(PEOPLE.column("tags").contains(["rust"]));
    assert_eq!(names(&store, &query).await, ["ann", "cy"]);

    let mut query = Query::new(PEOPLE.clone());
    query.filter(PEOPLE.column("tags").overlaps(["go", "sql"]));
    assert_eq!(names(&store, &query).await, ["ann", "bob"]);

    let mut query = Query::new(PEOPLE.clone());
    query.filter(
        PEOPLE
            .column("profile")
            .json_path(["city"], JsonCast::Text)
            .eq("Oslo"),
    );
    assert_eq!(names(&store, &query).await, ["ann", "cy"]);

    let mut query = Query::new(PEOPLE.clone());
    query.filter(
        PEOPLE
            .column("profile")
            .json_path(["score"], JsonCast::Int)
            .gt(250),
    );
    assert_eq!(names(&store, &query).await, ["ann", "cy"]);
}

async fn find_one_without_match(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;

    let err = store
        .find_one::<Person>(&Query::new(PEOPLE.clone()))
        .await
        .unwrap_err();
    assert!(err.is_record_not_found());
    assert_eq!(err.to_string(), "record not found: table=people");
}

async fn result_set_closes_once(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    seed_people(&store).await;

    let mut records = store.find(&Query::new(PEOPLE.clone())).await.unwrap();
    assert!(!records.is_batched());

    assert!(records.next().await.unwrap());
    let first = records.get().unwrap();
    assert_eq!(first.downcast_ref::<Person>().unwrap().name, "ann");

    records.close().unwrap();
    assert!(records.close().unwrap_err().is_already_closed());
    assert!(records.next().await.unwrap_err().is_already_closed());

    let RecordStream::Plain(mut rows) = store.find(&Query::new(PEOPLE.clone())).await.unwrap()
    else {
        panic!("expected a plain result set");
    };
    while rows.next().await.unwrap() {}
    assert!(!rows.is_closed());
    assert!(!rows.next().await.unwrap());
    rows.close().unwrap();
    assert!(rows.is_closed());
}

async fn reload_reads_current_row(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    let mut people = seed_people(&store).await;

    let mut query = Query::new(PEOPLE.clone());
    query.filter(PEOPLE.column("name").eq("bob"));
    let mut bob: Person = store.find_one(&query).await.unwrap();
    bob.age = Some(21);
    store.save(&mut bob).await.unwrap();

    let stale = &mut people[1];
    assert_eq!(stale.age, Some(20));
    store.reload(stale).await.unwrap();
    assert_eq!(stale.age, Some(21));

    let mut unsaved = Person::new("ghost");
    assert!(store.reload(&mut unsaved).await.unwrap_err().is_not_persisted());
}

async fn delete_record(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    let mut people = seed_people(&store).await;

    store.delete(&mut people[0]).await.unwrap();
    assert!(!people[0].persisted());
    assert_eq!(
        store.count(&Query::new(PEOPLE.clone())).await.unwrap(),
        2
    );

    let err = store.delete(&mut people[0]).await.unwrap_err();
    assert!(err.is_not_persisted());

    let mut twin = Person::new("ann");
    twin.set_id(people[1].id);
    twin.set_persisted();
    store.delete(&mut people[1]).await.unwrap();
    assert!(store.delete(&mut twin).await.unwrap_err().is_record_not_found());
}

async fn insert_twice_fails(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;

    let mut person = Person::new("ann");
    store.insert(&mut person).await.unwrap();
    assert!(store.insert(&mut person).await.unwrap_err().is_already_persisted());

    person.name = "anne".to_string();
    assert!(store.save(&mut person).await.unwrap());
}

async fn bulk_writes(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    seed_people(&store).await;

    let updated = store
        .update_where(
            &PEOPLE,
            vec![Assignment::new("age", Value::from(99))],
            PEOPLE.column("tags").contains(["rust"]),
        )
        .await
        .unwrap();
    assert_eq!(updated, 2);

    let mut query = Query::new(PEOPLE.clone());
    query.filter(PEOPLE.column("age").eq(99));
    assert_eq!(names(&store, &query).await, ["ann", "cy"]);

    let deleted = store
        .delete_where(&PEOPLE, PEOPLE.column("name").eq("ann"))
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(names(&store, &query).await, ["cy"]);
}

async fn unfiltered_bulk_writes_are_rejected(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;
    seed_people(&store).await;
    test.log().clear();

    let err = store
        .delete_where(&PEOPLE, Condition::TRUE)
        .await
        .unwrap_err();
    assert!(err.is_empty_raw_query());

    let err = store
        .update_where(&PEOPLE, vec![Assignment::new("age", 1)], Condition::TRUE)
        .await
        .unwrap_err();
    assert!(err.is_empty_raw_query());

    let err = store.raw_exec("  ", vec![]).await.unwrap_err();
    assert!(err.is_empty_raw_query());

    assert!(test.log().is_empty());
    assert_eq!(
        store.count(&Query::new(PEOPLE.clone())).await.unwrap(),
        3
    );
}

tests!(
    insert_then_read_back,
    nullable_columns_round_trip_as_none,
    projected_records_are_read_only,
    excluded_columns_are_not_selected,
    empty_in_list_matches_nothing,
    order_offset_and_limit,
    combined_conditions,
    array_and_json_conditions,
    find_one_without_match,
    result_set_closes_once,
    reload_reads_current_row,
    delete_record,
    insert_twice_fails,
    bulk_writes,
    unfiltered_bulk_writes_are_rejected,
);
