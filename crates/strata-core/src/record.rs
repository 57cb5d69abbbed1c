mod address;
pub use address::{ColumnAddress, Scan};

mod hooks;
pub use hooks::{HookEvent, HookSet, Hooks};

mod related;
pub use related::Related;

mod state;
pub use state::RecordState;

use crate::{
    schema::{Column, Schema},
    stmt::{Identifier, Value},
    Error, Result,
};

use std::any::Any;
use std::fmt::Debug;

/// The capability surface the engine needs from a user record.
///
/// Implementations are normally generated from the record declaration: one
/// `match` arm per column in [`Record::column_address`] and
/// [`Record::value`], one per relationship field in the relationship
/// methods.
pub trait Record: AsAny + Debug + Send + Sync {
    /// The record type's schema.
    fn schema(&self) -> Schema;

    fn id(&self) -> Identifier;

    fn set_id(&mut self, id: Identifier);

    fn state(&self) -> &RecordState;

    fn state_mut(&mut self) -> &mut RecordState;

    /// Returns a scan target for the named column.
    ///
    /// Fails with `UnknownColumn` for columns the record does not own as a
    /// field. Virtual columns are handled by [`Record::scan_column`].
    fn column_address(&mut self, name: &str) -> Result<ColumnAddress<'_>>;

    /// Returns the value of the named field for parameter binding.
    fn value(&self, name: &str) -> Result<Value>;

    /// Builds a blank record of the type held by a relationship field.
    fn new_relationship_record(&self, field: &str) -> Result<Box<dyn Record>> {
        Err(Error::no_such_relationship(field))
    }

    /// Stores loaded records into a relationship field.
    fn set_relationship(&mut self, field: &str, _value: Related) -> Result<()> {
        Err(Error::no_such_relationship(field))
    }

    /// Borrows the records currently held by a relationship field, used when
    /// saving children along with their parent.
    fn relationship_records(&mut self, field: &str) -> Result<Vec<&mut dyn Record>> {
        Err(Error::no_such_relationship(field))
    }

    /// Returns the record's lifecycle hooks, if it has any.
    fn hooks(&mut self) -> Option<&mut dyn Hooks> {
        None
    }

    fn persisted(&self) -> bool {
        self.state().persisted
    }

    fn set_persisted(&mut self) {
        self.state_mut().persisted = true;
    }

    fn writable(&self) -> bool {
        self.state().writable
    }

    fn set_writable(&mut self, writable: bool) {
        self.state_mut().writable = writable;
    }

    fn virtual_column(&self, name: &str) -> Option<&Value> {
        self.state().virtual_columns.get(name)
    }

    fn add_virtual_column(&mut self, name: &str, value: Value) {
        self.state_mut()
            .virtual_columns
            .insert(name.to_string(), value);
    }

    fn clear_virtual_columns(&mut self) {
        self.state_mut().virtual_columns.clear();
    }

    /// Scans `value` into the storage backing `column`.
    fn scan_column(&mut self, column: &Column, value: Value) -> Result<()> {
        if column.is_virtual {
            self.add_virtual_column(&column.name, value);
            return Ok(());
        }

        if column.name == self.schema().id_field().name {
            let id = self.schema().id_field().kind.scan(value)?;
            self.set_id(id);
            return Ok(());
        }

        self.column_address(&column.name)?.scan(value)
    }

    /// Reads the value bound for `column` on insert and update.
    fn column_value(&self, column: &Column) -> Result<Value> {
        if column.is_virtual {
            return Ok(self
                .virtual_column(&column.name)
                .cloned()
                .unwrap_or_default());
        }

        if column.name == self.schema().id_field().name {
            return Ok(self.id().to_value());
        }

        match self.value(&column.name) {
            Err(err) if err.is_unknown_column() => match self.virtual_column(&column.name) {
                Some(value) => Ok(value.clone()),
                None => Err(err),
            },
            res => res,
        }
    }
}

/// Downcasting support for records handed around as trait objects.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl dyn Record {
    /// Returns the record as `T` if it is one.
    pub fn downcast_ref<T: Record>(&self) -> Option<&T> {
        AsAny::as_any(self).downcast_ref()
    }

    pub fn downcast_mut<T: Record>(&mut self) -> Option<&mut T> {
        AsAny::as_any_mut(self).downcast_mut()
    }

    /// Converts a boxed record into `T`, or `None` if it is another type.
    pub fn downcast<T: Record>(self: Box<Self>) -> Option<Box<T>> {
        AsAny::into_any(self).downcast().ok()
    }
}
