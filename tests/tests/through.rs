use strata::{
    stmt::{Direction, Identifier},
    Query, Record, Store,
};
use tests::{models, models::*, sql, tests, DbTest};
use uuid::Uuid;

/// Users `a` and `b`, linked through the join table to posts 1-3 and 4-6.
/// Posts 2 and 5 are pinned.
async fn seed(store: &Store) -> (User, User, Vec<Post>) {
    let mut a = User::new("a");
    let mut b = User::new("b");
    store.insert(&mut a).await.unwrap();
    store.insert(&mut b).await.unwrap();

    let mut posts = vec![];
    for i in 1..=6 {
        let mut post = Post::new(format!("p{i}"));
        store.insert(&mut post).await.unwrap();
        posts.push(post);
    }

    for (user, range) in [(&a, 0..3), (&b, 3..6)] {
        for (offset, post) in posts[range].iter().enumerate() {
            let mut link = UserPost::new(uuid(user.id), int(post.id));
            link.pinned = Some(offset == 1);
            store.insert(&mut link).await.unwrap();
        }
    }

    (a, b, posts)
}

fn uuid(id: Identifier) -> Uuid {
    match id {
        Identifier::Uuid(id) => id,
        id => panic!("expected a UUID key, got {id:?}"),
    }
}

fn int(id: Identifier) -> i64 {
    match id {
        Identifier::Int(id) => id,
        id => panic!("expected an integer key, got {id:?}"),
    }
}

fn titles(user: &User) -> Vec<&str> {
    user.posts.iter().map(|post| post.title.as_str()).collect()
}

async fn uuid_keys_are_generated(test: &mut DbTest) {
    let store = test.setup_db(models!(USERS, POSTS, USER_POSTS)).await;

    let mut user = User::new("someone");
    store.insert(&mut user).await.unwrap();
    assert!(matches!(user.id, Identifier::Uuid(_)));

    let insert = test.log().statements().pop().unwrap();
    assert!(!sql(&insert).contains("RETURNING"));
}

async fn load_through_join_table(test: &mut DbTest) {
    let store = test.setup_db(models!(USERS, POSTS, USER_POSTS)).await;
    let (a, b, _) = seed(&store).await;
    test.log().clear();

    let mut query = Query::new(USERS.clone());
    query
        .order_by(USERS.column("name"), Direction::Asc)
        .with_through("posts", POSTS.clone(), USER_POSTS.clone(), None, None);

    let users = store
        .all::<User>(&query)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, a.id);
    assert_eq!(users[1].id, b.id);
    assert_eq!(titles(&users[0]), ["p1", "p2", "p3"]);
    assert_eq!(titles(&users[1]), ["p4", "p5", "p6"]);
    assert!(users.iter().all(|user| user.writable()));
    assert!(users[0].posts.iter().all(|post| post.persisted()));

    assert_eq!(test.log().selects_on("users"), 1);
    assert_eq!(test.log().selects_on("posts"), 1);

    let side = test
        .log()
        .statements()
        .into_iter()
        .find(|stmt| stmt.table() == "posts")
        .unwrap();
    assert!(sql(&side).starts_with("SELECT po.id, po.title, up.user_id FROM posts AS po"));
    assert!(sql(&side)
        .contains("INNER JOIN user_posts AS up ON up.post_id = po.id AND up.user_id IN ($1, $2)"));
}

async fn intermediate_filter_limits_children(test: &mut DbTest) {
    let store = test.setup_db(models!(USERS, POSTS, USER_POSTS)).await;
    seed(&store).await;

    let mut query = Query::new(USERS.clone());
    query
        .order_by(USERS.column("name"), Direction::Asc)
        .with_through(
            "posts",
            POSTS.clone(),
            USER_POSTS.clone(),
            None,
            Some(USER_POSTS.column("pinned").eq(true)),
        );

    let users = store
        .all::<User>(&query)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(titles(&users[0]), ["p2"]);
    assert_eq!(titles(&users[1]), ["p5"]);
    assert!(users.iter().all(|user| !user.writable()));
}

async fn child_filter_limits_children(test: &mut DbTest) {
    let store = test.setup_db(models!(USERS, POSTS, USER_POSTS)).await;
    seed(&store).await;

    let mut query = Query::new(USERS.clone());
    query
        .order_by(USERS.column("name"), Direction::Asc)
        .with_through(
            "posts",
            POSTS.clone(),
            USER_POSTS.clone(),
            Some(POSTS.column("title").in_list(["p1", "p6"])),
            None,
        );

    let users = store
        .all::<User>(&query)
        .await
        .unwrap()
        .collect()
        .await
        .unwrap();

    assert_eq!(titles(&users[0]), ["p1"]);
    assert_eq!(titles(&users[1]), ["p6"]);
    assert!(users.iter().all(|user| !user.writable()));
}

async fn through_children_are_not_saved(test: &mut DbTest) {
    let store = test.setup_db(models!(USERS, POSTS, USER_POSTS)).await;

    let mut user = User::new("writer");
    user.posts = vec![Post::new("draft")];
    store.insert(&mut user).await.unwrap();

    assert!(!user.posts[0].persisted());
    assert_eq!(test.log().selects_on("posts"), 0);
    assert_eq!(
        store.count(&Query::new(POSTS.clone())).await.unwrap(),
        0
    );
}

tests!(
    uuid_keys_are_generated,
    load_through_join_table,
    intermediate_filter_limits_children,
    child_filter_limits_children,
    through_children_are_not_saved,
);
