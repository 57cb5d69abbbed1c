use std::time::Duration;
use strata::{
    driver::operation::{IsolationLevel, Operation, Transaction},
    Query, Record, Store,
};
use tests::{models, models::*, tests, DbTest};

fn count_tx(test: &DbTest, kind: fn(&Transaction) -> bool) -> usize {
    test.log().transactions(kind)
}

fn starts(tx: &Transaction) -> bool {
    matches!(tx, Transaction::Start { .. })
}

fn commits(tx: &Transaction) -> bool {
    matches!(tx, Transaction::Commit)
}

fn rollbacks(tx: &Transaction) -> bool {
    matches!(tx, Transaction::Rollback)
}

async fn people(store: &Store) -> u64 {
    store.count(&Query::new(PEOPLE.clone())).await.unwrap()
}

async fn begin_and_commit(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;

    let tx = store.begin().await.unwrap();
    assert!(tx.in_transaction());
    assert!(!tx.is_nested());

    let mut person = Person::new("ann");
    tx.insert(&mut person).await.unwrap();
    tx.commit().await.unwrap();

    assert!(person.persisted());
    assert_eq!(people(&store).await, 1);

    let ops = test.log().operations();
    assert!(matches!(ops[0], Operation::Transaction(Transaction::Start { .. })));
    assert!(matches!(ops[1], Operation::Query(_)));
    assert!(matches!(ops[2], Operation::Transaction(Transaction::Commit)));
}

async fn begin_and_rollback(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;

    let tx = store.begin().await.unwrap();
    let mut person = Person::new("ann");
    tx.insert(&mut person).await.unwrap();
    assert_eq!(people(&tx).await, 1);
    tx.rollback().await.unwrap();

    assert_eq!(people(&store).await, 0);
    assert_eq!(count_tx(test, rollbacks), 1);
}

async fn begin_with_isolation(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;

    let tx = store
        .begin_with(IsolationLevel::Serializable)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let first = test.log().pop();
    assert!(matches!(
        first,
        Operation::Transaction(Transaction::Start {
            isolation: Some(IsolationLevel::Serializable),
            read_only: false,
        })
    ));
}

async fn closure_commits_on_ok(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;

    let mut person = Person::new("ann");
    let id = store
        .transaction(async |store: &Store| {
            store.insert(&mut person).await?;
            Ok(person.id)
        })
        .await
        .unwrap();

    assert!(!id.is_unset());
    assert_eq!(people(&store).await, 1);
    assert_eq!(count_tx(test, commits), 1);
}

async fn closure_rolls_back_on_err(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;

    let res = store
        .transaction(async |store: &Store| {
            store.insert(&mut Person::new("ann")).await?;
            store.insert(&mut Person::new("bob")).await?;
            Err::<(), _>(strata::err!("changed my mind"))
        })
        .await;

    assert_eq!(res.unwrap_err().to_string(), "changed my mind");
    assert_eq!(people(&store).await, 0);
    assert_eq!(count_tx(test, rollbacks), 1);
    assert_eq!(count_tx(test, commits), 0);
}

async fn nested_transactions_share_the_outer_one(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;

    store
        .transaction(async |outer: &Store| {
            let inner = outer.begin().await?;
            assert!(inner.is_nested());

            let mut parent = Parent::new("root");
            parent.children = vec![Child::new("a")];
            inner.insert(&mut parent).await?;
            inner.commit().await?;

            outer
                .transaction(async |again: &Store| {
                    again.insert(&mut Parent::new("second")).await
                })
                .await
        })
        .await
        .unwrap();

    assert_eq!(count_tx(test, starts), 1);
    assert_eq!(count_tx(test, commits), 1);
    assert_eq!(
        store.count(&Query::new(PARENTS.clone())).await.unwrap(),
        2
    );
}

async fn store_outliving_its_transaction(test: &mut DbTest) {
    let store = test.setup_db(models!(PEOPLE)).await;

    let tx = store.begin().await.unwrap();
    let bound = tx.store().clone();
    tx.commit().await.unwrap();

    let err = bound.insert(&mut Person::new("late")).await.unwrap_err();
    assert!(err.is_invalid_tx_callback());
    assert_eq!(people(&store).await, 0);
}

async fn slow_transaction_times_out(test: &mut DbTest) {
    let mut builder = models!(PEOPLE);
    builder.transaction_timeout(Duration::from_millis(20));
    let store = test.setup_db(builder).await;

    let mut person = Person::new("slow");
    let err = store
        .transaction(async |store: &Store| {
            store.insert(&mut person).await?;
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();

    assert!(err.is_transaction_timed_out());
    assert_eq!(count_tx(test, rollbacks), 1);
    assert_eq!(people(&store).await, 0);
}

async fn failed_child_insert_leaves_parent_unsaved(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;

    let mut parent = Parent::new("root");
    let mut child = Child::new("dup");
    child.set_persisted();
    parent.children = vec![child];

    // The child claims to be persisted but has no row, so its update fails.
    let err = store.insert(&mut parent).await.unwrap_err();
    assert!(err.is_record_not_found());
    assert!(!parent.persisted());
    assert_eq!(
        store.count(&Query::new(PARENTS.clone())).await.unwrap(),
        0
    );
}

async fn failed_child_insert_resets_saved_siblings(test: &mut DbTest) {
    let store = test.setup_db(models!(PARENTS, CHILDREN)).await;

    let mut existing = Parent::new("existing");
    existing.children = vec![Child::new("a")];
    store.insert(&mut existing).await.unwrap();

    let mut dup = Child::new("dup");
    dup.id = existing.children[0].id;

    let mut parent = Parent::new("root");
    parent.children = vec![Child::new("ok"), dup];

    // "ok" is written before the duplicate key fails the transaction.
    store.insert(&mut parent).await.unwrap_err();
    assert_eq!(count_tx(test, rollbacks), 1);

    assert!(!parent.persisted());
    assert!(parent.id.is_unset());

    let ok = &parent.children[0];
    assert!(!ok.persisted());
    assert!(ok.id.is_unset());
    assert_eq!(ok.parent_id(), None);

    let dup = &parent.children[1];
    assert!(!dup.persisted());
    assert_eq!(dup.id, existing.children[0].id);

    assert_eq!(
        store.count(&Query::new(PARENTS.clone())).await.unwrap(),
        1
    );
    assert_eq!(
        store.count(&Query::new(CHILDREN.clone())).await.unwrap(),
        1
    );
}

tests!(
    begin_and_commit,
    begin_and_rollback,
    begin_with_isolation,
    closure_commits_on_ok,
    closure_rolls_back_on_err,
    nested_transactions_share_the_outer_one,
    store_outliving_its_transaction,
    slow_transaction_times_out,
    failed_child_insert_leaves_parent_unsaved,
    failed_child_insert_resets_saved_siblings,
);
