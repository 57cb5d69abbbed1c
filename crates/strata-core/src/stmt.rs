mod column_ref;
pub use column_ref::ColumnRef;

mod condition;
pub use condition::{ArrayOp, BinaryOp, Condition, JsonOp, RegexOp};

mod convert;
pub use convert::{FromValue, Json, ToValue};

mod delete;
pub use delete::Delete;

mod direction;
pub use direction::Direction;

mod identifier;
pub use identifier::{IdKind, Identifier, RawId};

mod insert;
pub use insert::Insert;

mod row_stream;
pub use row_stream::RowStream;

mod select;
pub use select::{Join, JoinKind, OrderBy, Projection, Select, TableRef};

mod statement;
pub use statement::Statement;

mod update;
pub use update::{Assignment, Update};

mod value;
pub use value::Value;
