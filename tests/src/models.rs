//! Record types written the way the code generator emits them: a schema
//! constant, one `match` arm per column and one per relationship field.

use chrono::{DateTime, Utc};
use std::sync::LazyLock;
use strata::{
    record::{ColumnAddress, HookSet, Hooks, Related, RecordState},
    schema::db::ColumnType,
    stmt::{IdKind, Identifier, Json, Value},
    Error, Record, Result, Schema,
};
use uuid::Uuid;

pub static PARENTS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("parents", "pa", || Box::new(Parent::default()))
        .column("name", ColumnType::Text)
        .one_to_many("children", "parent_id")
        .build()
});

pub static CHILDREN: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("children", "ch", || Box::new(Child::default()))
        .column("n", ColumnType::Text)
        .virtual_column("parent_id", ColumnType::BigInt)
        .references("parent_id", "parents")
        .build()
});

pub static PEOPLE: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("people", "p", || Box::new(Person::default()))
        .column("name", ColumnType::Text)
        .nullable_column("age", ColumnType::Integer)
        .nullable_column("tags", ColumnType::Array(Box::new(ColumnType::Text)))
        .nullable_column("profile", ColumnType::Jsonb)
        .build()
});

pub static CARS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("cars", "c", || Box::new(Car::default()))
        .column("model", ColumnType::Text)
        .virtual_column("owner_id", ColumnType::BigInt)
        .references("owner_id", "people")
        .one_to_one_inverse("owner", "owner_id")
        .build()
});

pub static USERS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("users", "u", || Box::new(User::default()))
        .id("id", IdKind::Uuid)
        .column("name", ColumnType::Text)
        .through("posts", "user_id", "post_id")
        .build()
});

pub static POSTS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("posts", "po", || Box::new(Post::default()))
        .column("title", ColumnType::Text)
        .build()
});

pub static USER_POSTS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("user_posts", "up", || Box::new(UserPost::default()))
        .column("user_id", ColumnType::Uuid)
        .column("post_id", ColumnType::BigInt)
        .nullable_column("pinned", ColumnType::Boolean)
        .references("user_id", "users")
        .references("post_id", "posts")
        .build()
});

pub static EVENTS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("events", "ev", || Box::new(Event::default()))
        .column("name", ColumnType::Text)
        .column("happened_at", ColumnType::Timestamptz)
        .nullable_column("ended_at", ColumnType::Timestamptz)
        .build()
});

pub static JOURNALS: LazyLock<Schema> = LazyLock::new(|| {
    Schema::builder("journals", "j", || Box::new(Journal::default()))
        .id("id", IdKind::Ulid)
        .column("title", ColumnType::Text)
        .hooks(
            HookSet::BEFORE_SAVE
                | HookSet::AFTER_INSERT
                | HookSet::AFTER_UPDATE
                | HookSet::BEFORE_DELETE
                | HookSet::AFTER_DELETE,
        )
        .build()
});

/// Same table as [`JOURNALS`], declaring every hook. Rejected by the
/// registry, but usable for writes against a table created through
/// [`JOURNALS`].
pub static JOURNALS_ALL_HOOKS: LazyLock<Schema> = LazyLock::new(|| {
    let all = HookSet::BEFORE_SAVE
        | HookSet::BEFORE_INSERT
        | HookSet::BEFORE_UPDATE
        | HookSet::BEFORE_DELETE
        | HookSet::AFTER_SAVE
        | HookSet::AFTER_INSERT
        | HookSet::AFTER_UPDATE
        | HookSet::AFTER_DELETE;

    Schema::builder("journals", "j", || Box::new(Journal::default()))
        .id("id", IdKind::Ulid)
        .column("title", ColumnType::Text)
        .hooks(all)
        .build()
});

#[derive(Debug, Default)]
pub struct Parent {
    pub id: Identifier,
    pub name: String,
    pub children: Vec<Child>,
    state: RecordState,
}

#[derive(Debug, Default)]
pub struct Child {
    pub id: Identifier,
    pub n: String,
    state: RecordState,
}

#[derive(Debug, Default, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Profile {
    pub city: String,
    pub score: i64,
}

#[derive(Debug, Default)]
pub struct Person {
    pub id: Identifier,
    pub name: String,
    pub age: Option<i32>,
    pub tags: Vec<String>,
    pub profile: Option<Json<Profile>>,
    state: RecordState,
}

#[derive(Debug, Default)]
pub struct Car {
    pub id: Identifier,
    pub model: String,
    pub owner: Option<Person>,
    state: RecordState,
}

#[derive(Debug, Default)]
pub struct User {
    pub id: Identifier,
    pub name: String,
    pub posts: Vec<Post>,
    state: RecordState,
}

#[derive(Debug, Default)]
pub struct Post {
    pub id: Identifier,
    pub title: String,
    state: RecordState,
}

#[derive(Debug, Default)]
pub struct UserPost {
    pub id: Identifier,
    pub user_id: Uuid,
    pub post_id: i64,
    pub pinned: Option<bool>,
    state: RecordState,
}

#[derive(Debug, Default)]
pub struct Event {
    pub id: Identifier,
    pub name: String,
    pub happened_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    state: RecordState,
}

/// Records every hook it receives, failing on `fail_on`.
#[derive(Debug, Default)]
pub struct Journal {
    pub id: Identifier,
    pub title: String,
    pub calls: Vec<&'static str>,
    pub fail_on: Option<&'static str>,
    pub all_hooks: bool,
    state: RecordState,
}

impl Parent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Child {
    pub fn new(n: impl Into<String>) -> Self {
        Self {
            n: n.into(),
            ..Default::default()
        }
    }

    /// The key of the parent this child was saved or loaded with.
    pub fn parent_id(&self) -> Option<&Value> {
        self.virtual_column("parent_id")
    }
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Car {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }
}

impl User {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

impl Post {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

impl UserPost {
    pub fn new(user_id: Uuid, post_id: i64) -> Self {
        Self {
            user_id,
            post_id,
            ..Default::default()
        }
    }
}

impl Journal {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    fn call(&mut self, name: &'static str) -> Result<()> {
        self.calls.push(name);
        match self.fail_on {
            Some(fail) if fail == name => Err(strata::err!("{name} failed")),
            _ => Ok(()),
        }
    }
}

/// Implements the accessors every record shares.
macro_rules! record_state {
    ($schema:expr) => {
        fn schema(&self) -> Schema {
            $schema.clone()
        }

        fn id(&self) -> Identifier {
            self.id
        }

        fn set_id(&mut self, id: Identifier) {
            self.id = id;
        }

        fn state(&self) -> &RecordState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut RecordState {
            &mut self.state
        }
    };
}

impl Record for Parent {
    record_state!(PARENTS);

    fn column_address(&mut self, name: &str) -> Result<ColumnAddress<'_>> {
        match name {
            "name" => Ok(ColumnAddress::new(&mut self.name)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn value(&self, name: &str) -> Result<Value> {
        match name {
            "name" => Ok(Value::from(&self.name)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn new_relationship_record(&self, field: &str) -> Result<Box<dyn Record>> {
        match field {
            "children" => Ok(Box::new(Child::default())),
            _ => Err(Error::no_such_relationship(field)),
        }
    }

    fn set_relationship(&mut self, field: &str, value: Related) -> Result<()> {
        match field {
            "children" => {
                self.children = value.into_many(field)?;
                Ok(())
            }
            _ => Err(Error::no_such_relationship(field)),
        }
    }

    fn relationship_records(&mut self, field: &str) -> Result<Vec<&mut dyn Record>> {
        match field {
            "children" => Ok(self
                .children
                .iter_mut()
                .map(|child| child as &mut dyn Record)
                .collect()),
            _ => Err(Error::no_such_relationship(field)),
        }
    }
}

impl Record for Child {
    record_state!(CHILDREN);

    fn column_address(&mut self, name: &str) -> Result<ColumnAddress<'_>> {
        match name {
            "n" => Ok(ColumnAddress::new(&mut self.n)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn value(&self, name: &str) -> Result<Value> {
        match name {
            "n" => Ok(Value::from(&self.n)),
            _ => Err(Error::unknown_column(name)),
        }
    }
}

impl Record for Person {
    record_state!(PEOPLE);

    fn column_address(&mut self, name: &str) -> Result<ColumnAddress<'_>> {
        match name {
            "name" => Ok(ColumnAddress::new(&mut self.name)),
            "age" => Ok(ColumnAddress::new(&mut self.age)),
            "tags" => Ok(ColumnAddress::new(&mut self.tags)),
            "profile" => Ok(ColumnAddress::new(&mut self.profile)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn value(&self, name: &str) -> Result<Value> {
        match name {
            "name" => Ok(Value::from(&self.name)),
            "age" => Ok(Value::from(self.age)),
            "tags" => Ok(Value::from(self.tags.clone())),
            "profile" => Ok(self.profile.as_ref().map(Value::from).unwrap_or_default()),
            _ => Err(Error::unknown_column(name)),
        }
    }
}

impl Record for Car {
    record_state!(CARS);

    fn column_address(&mut self, name: &str) -> Result<ColumnAddress<'_>> {
        match name {
            "model" => Ok(ColumnAddress::new(&mut self.model)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn value(&self, name: &str) -> Result<Value> {
        match name {
            "model" => Ok(Value::from(&self.model)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn new_relationship_record(&self, field: &str) -> Result<Box<dyn Record>> {
        match field {
            "owner" => Ok(Box::new(Person::default())),
            _ => Err(Error::no_such_relationship(field)),
        }
    }

    fn set_relationship(&mut self, field: &str, value: Related) -> Result<()> {
        match field {
            "owner" => {
                self.owner = value.into_one(field)?;
                Ok(())
            }
            _ => Err(Error::no_such_relationship(field)),
        }
    }

    fn relationship_records(&mut self, field: &str) -> Result<Vec<&mut dyn Record>> {
        match field {
            "owner" => Ok(self
                .owner
                .iter_mut()
                .map(|owner| owner as &mut dyn Record)
                .collect()),
            _ => Err(Error::no_such_relationship(field)),
        }
    }
}

impl Record for User {
    record_state!(USERS);

    fn column_address(&mut self, name: &str) -> Result<ColumnAddress<'_>> {
        match name {
            "name" => Ok(ColumnAddress::new(&mut self.name)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn value(&self, name: &str) -> Result<Value> {
        match name {
            "name" => Ok(Value::from(&self.name)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn new_relationship_record(&self, field: &str) -> Result<Box<dyn Record>> {
        match field {
            "posts" => Ok(Box::new(Post::default())),
            _ => Err(Error::no_such_relationship(field)),
        }
    }

    fn set_relationship(&mut self, field: &str, value: Related) -> Result<()> {
        match field {
            "posts" => {
                self.posts = value.into_many(field)?;
                Ok(())
            }
            _ => Err(Error::no_such_relationship(field)),
        }
    }
}

impl Event {
    pub fn new(name: impl Into<String>, happened_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            happened_at,
            ..Default::default()
        }
    }
}

impl Record for Event {
    record_state!(EVENTS);

    fn column_address(&mut self, name: &str) -> Result<ColumnAddress<'_>> {
        match name {
            "name" => Ok(ColumnAddress::new(&mut self.name)),
            "happened_at" => Ok(ColumnAddress::new(&mut self.happened_at)),
            "ended_at" => Ok(ColumnAddress::new(&mut self.ended_at)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn value(&self, name: &str) -> Result<Value> {
        match name {
            "name" => Ok(Value::from(&self.name)),
            "happened_at" => Ok(Value::from(self.happened_at)),
            "ended_at" => Ok(Value::from(self.ended_at)),
            _ => Err(Error::unknown_column(name)),
        }
    }
}

impl Record for Post {
    record_state!(POSTS);

    fn column_address(&mut self, name: &str) -> Result<ColumnAddress<'_>> {
        match name {
            "title" => Ok(ColumnAddress::new(&mut self.title)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn value(&self, name: &str) -> Result<Value> {
        match name {
            "title" => Ok(Value::from(&self.title)),
            _ => Err(Error::unknown_column(name)),
        }
    }
}

impl Record for UserPost {
    record_state!(USER_POSTS);

    fn column_address(&mut self, name: &str) -> Result<ColumnAddress<'_>> {
        match name {
            "user_id" => Ok(ColumnAddress::new(&mut self.user_id)),
            "post_id" => Ok(ColumnAddress::new(&mut self.post_id)),
            "pinned" => Ok(ColumnAddress::new(&mut self.pinned)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn value(&self, name: &str) -> Result<Value> {
        match name {
            "user_id" => Ok(Value::from(self.user_id)),
            "post_id" => Ok(Value::from(self.post_id)),
            "pinned" => Ok(Value::from(self.pinned)),
            _ => Err(Error::unknown_column(name)),
        }
    }
}

impl Hooks for Journal {
    fn before_save(&mut self) -> Result<()> {
        self.call("before_save")
    }

    fn before_insert(&mut self) -> Result<()> {
        self.call("before_insert")
    }

    fn before_update(&mut self) -> Result<()> {
        self.call("before_update")
    }

    fn before_delete(&mut self) -> Result<()> {
        self.call("before_delete")
    }

    fn after_save(&mut self) -> Result<()> {
        self.call("after_save")
    }

    fn after_insert(&mut self) -> Result<()> {
        self.call("after_insert")
    }

    fn after_update(&mut self) -> Result<()> {
        self.call("after_update")
    }

    fn after_delete(&mut self) -> Result<()> {
        self.call("after_delete")
    }
}

impl Record for Journal {
    fn schema(&self) -> Schema {
        if self.all_hooks {
            JOURNALS_ALL_HOOKS.clone()
        } else {
            JOURNALS.clone()
        }
    }

    fn id(&self) -> Identifier {
        self.id
    }

    fn set_id(&mut self, id: Identifier) {
        self.id = id;
    }

    fn state(&self) -> &RecordState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RecordState {
        &mut self.state
    }

    fn column_address(&mut self, name: &str) -> Result<ColumnAddress<'_>> {
        match name {
            "title" => Ok(ColumnAddress::new(&mut self.title)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn value(&self, name: &str) -> Result<Value> {
        match name {
            "title" => Ok(Value::from(&self.title)),
            _ => Err(Error::unknown_column(name)),
        }
    }

    fn hooks(&mut self) -> Option<&mut dyn Hooks> {
        Some(self)
    }
}
