use strata_core::{
    schema::{RelationKind, Schema},
    stmt::{ColumnRef, Condition, Direction, OrderBy},
    Error, Result,
};

/// A mutable plan for reading records of one schema.
///
/// Builder methods take `&mut self` and return it so calls can be chained.
/// [`Query::copy`] returns an independent plan.
///
/// ```ignore
/// let mut query = Query::new(people.clone());
/// query
///     .filter(people.column("age").gt(21))
///     .order_by(people.column("name"), Direction::Asc)
///     .limit(10)
///     .with_many("cars", cars.clone(), None);
/// ```
#[derive(Debug, Clone)]
pub struct Query {
    schema: Schema,
    selected: Vec<String>,
    excluded: Vec<String>,
    filter: Condition,
    order_by: Vec<OrderBy>,
    offset: u64,
    limit: u64,
    batch_size: u64,
    relationships: Vec<Relationship>,

    /// First relationship declaration that did not match the schema,
    /// reported when the query runs.
    error: Option<Error>,
}

/// An eager load declared on a query.
#[derive(Debug, Clone)]
pub struct Relationship {
    pub field: String,
    pub kind: RelationKind,
    pub schema: Schema,
    pub filter: Option<Condition>,

    /// The join table of a Through relationship.
    pub through: Option<Intermediate>,
}

#[derive(Debug, Clone)]
pub struct Intermediate {
    pub schema: Schema,
    pub filter: Option<Condition>,
}

impl Query {
    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            selected: vec![],
            excluded: vec![],
            filter: Condition::TRUE,
            order_by: vec![],
            offset: 0,
            limit: 0,
            batch_size: 0,
            relationships: vec![],
            error: None,
        }
    }

    /// Returns an independent copy of this query.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Restricts the projection to the named columns. Records loaded this
    /// way are not writable.
    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            let column = column.into();
            self.excluded.retain(|name| *name != column);
            if !self.selected.contains(&column) {
                self.selected.push(column);
            }
        }
        self
    }

    /// Removes the named columns from the projection. Records loaded this
    /// way are not writable.
    pub fn select_not<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for column in columns {
            let column = column.into();
            self.selected.retain(|name| *name != column);
            if !self.excluded.contains(&column) {
                self.excluded.push(column);
            }
        }
        self
    }

    /// Adds a predicate, conjoined with any predicate already set.
    pub fn filter(&mut self, condition: Condition) -> &mut Self {
        let filter = std::mem::take(&mut self.filter);
        self.filter = filter.and_also(condition);
        self
    }

    /// Appends an ordering term. Ordering on a column already present
    /// replaces its direction and keeps its position.
    pub fn order_by(&mut self, column: ColumnRef, direction: Direction) -> &mut Self {
        match self.order_by.iter_mut().find(|order| order.column == column) {
            Some(order) => order.direction = direction,
            None => self.order_by.push(OrderBy { column, direction }),
        }
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.offset = offset;
        self
    }

    /// Caps the number of records returned. Zero means no limit.
    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.limit = limit;
        self
    }

    /// Number of parent rows fetched per round trip when the query eager
    /// loads OneToMany or Through relationships. Zero uses the store's
    /// default.
    pub fn batch_size(&mut self, batch_size: u64) -> &mut Self {
        self.batch_size = batch_size;
        self
    }

    /// Eager loads a OneToOne relationship through a `LEFT JOIN`.
    pub fn with_one(&mut self, field: &str, schema: Schema) -> &mut Self {
        self.with_one_filtered(field, schema, None)
    }

    /// Eager loads a OneToOne relationship, only attaching related records
    /// matching `filter`.
    pub fn with_one_filtered(
        &mut self,
        field: &str,
        schema: Schema,
        filter: Option<Condition>,
    ) -> &mut Self {
        self.relate(Relationship {
            field: field.to_string(),
            kind: RelationKind::OneToOne,
            schema,
            filter,
            through: None,
        })
    }

    /// Eager loads a OneToMany relationship. Parents loaded with a filtered
    /// relationship are not writable.
    pub fn with_many(
        &mut self,
        field: &str,
        schema: Schema,
        filter: Option<Condition>,
    ) -> &mut Self {
        self.relate(Relationship {
            field: field.to_string(),
            kind: RelationKind::OneToMany,
            schema,
            filter,
            through: None,
        })
    }

    /// Eager loads a many-to-many relationship resolved through the
    /// `intermediate` join table.
    pub fn with_through(
        &mut self,
        field: &str,
        schema: Schema,
        intermediate: Schema,
        filter: Option<Condition>,
        intermediate_filter: Option<Condition>,
    ) -> &mut Self {
        self.relate(Relationship {
            field: field.to_string(),
            kind: RelationKind::Through,
            schema,
            filter,
            through: Some(Intermediate {
                schema: intermediate,
                filter: intermediate_filter,
            }),
        })
    }

    /// Declares an eager load, checking it against the relationships the
    /// schema declares.
    ///
    /// A mismatch is recorded and returned as `InvalidRelation` when the query
    /// runs, so that chains stay infallible.
    pub fn relate(&mut self, relationship: Relationship) -> &mut Self {
        if let Err(err) = self.check_relationship(&relationship) {
            self.error.get_or_insert(err);
            return self;
        }

        self.relationships
            .retain(|existing| existing.field != relationship.field);
        self.relationships.push(relationship);
        self
    }

    fn check_relationship(&self, relationship: &Relationship) -> Result<()> {
        let field = &relationship.field;

        let Some(declared) = self.schema.relationship(field) else {
            return Err(Error::invalid_relation(
                field,
                format!("`{}` declares no such relationship", self.schema.table()),
            ));
        };

        if declared.kind() != relationship.kind {
            return Err(Error::invalid_relation(
                field,
                format!(
                    "declared as {}, loaded as {}",
                    declared.kind(),
                    relationship.kind
                ),
            ));
        }

        if relationship.kind == RelationKind::Through && relationship.through.is_none() {
            return Err(Error::invalid_relation(field, "missing intermediate schema"));
        }

        Ok(())
    }

    /// Returns the error recorded by an invalid relationship declaration.
    pub fn validate(&self) -> Result<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn excluded(&self) -> &[String] {
        &self.excluded
    }

    /// True when the projection was narrowed with `select` or `select_not`.
    pub fn is_projected(&self) -> bool {
        !self.selected.is_empty() || !self.excluded.is_empty()
    }

    pub fn get_filter(&self) -> &Condition {
        &self.filter
    }

    pub fn get_order_by(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn get_offset(&self) -> u64 {
        self.offset
    }

    pub fn get_limit(&self) -> u64 {
        self.limit
    }

    pub fn get_batch_size(&self) -> u64 {
        self.batch_size
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// True when any declared relationship is loaded by side queries.
    pub fn is_batched(&self) -> bool {
        self.relationships
            .iter()
            .any(|relationship| relationship.kind.is_batched())
    }
}
