//! Change-sets between two model schemas and their rendering to SQL.
//!
//! Additive and subtractive changes (tables and columns) are rendered
//! automatically. Type, primary-key, nullability and foreign-key changes
//! are reported as [`Change::ManualChange`] and left to the developer.

mod lock_file;
pub use lock_file::LockFile;

use crate::Serializer;

use serde::{Deserialize, Serialize};
use strata_core::schema::db::{ColumnDef, ModelSchema, TableDef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Change {
    CreateTable { table: TableDef },
    DropTable { table: TableDef },
    AddColumn { table: String, column: ColumnDef },
    DropColumn { table: String, column: ColumnDef },
    ManualChange { msg: String },
}

/// The ordered changes turning one model schema into another.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSet {
    pub changes: Vec<Change>,
}

/// Rendered up and down scripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub up: String,
    pub down: String,
}

impl ChangeSet {
    pub fn diff(previous: &ModelSchema, next: &ModelSchema) -> ChangeSet {
        let mut changes = vec![];

        for table in &next.tables {
            match previous.table(&table.name) {
                None => changes.push(Change::CreateTable {
                    table: table.clone(),
                }),
                Some(prev) => diff_columns(prev, table, &mut changes),
            }
        }

        for table in &previous.tables {
            if next.table(&table.name).is_none() {
                changes.push(Change::DropTable {
                    table: table.clone(),
                });
            }
        }

        ChangeSet { changes }
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// True if any change needs to be written by hand.
    pub fn has_manual_changes(&self) -> bool {
        self.changes
            .iter()
            .any(|change| matches!(change, Change::ManualChange { .. }))
    }

    /// Renders the change-set to up and down scripts. Statements are
    /// separated by `;\n`; manual changes become SQL comments.
    pub fn render(&self) -> Migration {
        let serializer = Serializer::postgresql();
        let mut up = vec![];
        let mut down = vec![];

        for change in &self.changes {
            match change {
                Change::CreateTable { table } => {
                    up.push(serializer.create_table(table));
                    down.push(serializer.drop_table(&table.name, false));
                }
                Change::DropTable { table } => {
                    up.push(serializer.drop_table(&table.name, false));
                    down.push(serializer.create_table(table));
                }
                Change::AddColumn { table, column } => {
                    up.push(serializer.add_column(table, column));
                    down.push(serializer.drop_column(table, &column.name));
                }
                Change::DropColumn { table, column } => {
                    up.push(serializer.drop_column(table, &column.name));
                    down.push(serializer.add_column(table, column));
                }
                Change::ManualChange { msg } => {
                    up.push(format!("-- MANUAL CHANGE REQUIRED: {msg}"));
                    down.push(format!("-- MANUAL CHANGE REQUIRED: {msg}"));
                }
            }
        }

        // Undo in reverse order so dependent objects go first.
        down.reverse();

        Migration {
            up: join_statements(&up),
            down: join_statements(&down),
        }
    }
}

fn diff_columns(previous: &TableDef, next: &TableDef, changes: &mut Vec<Change>) {
    for column in &next.columns {
        let Some(prev) = previous.column(&column.name) else {
            changes.push(Change::AddColumn {
                table: next.name.clone(),
                column: column.clone(),
            });
            continue;
        };

        let target = format!("{}.{}", next.name, column.name);

        if prev.ty != column.ty {
            changes.push(Change::ManualChange {
                msg: format!("{target}: type changed from {} to {}", prev.ty, column.ty),
            });
        }

        if prev.primary_key != column.primary_key {
            changes.push(Change::ManualChange {
                msg: format!("{target}: primary key changed"),
            });
        }

        if prev.nullable != column.nullable {
            let (from, to) = if column.nullable {
                ("NOT NULL", "NULL")
            } else {
                ("NULL", "NOT NULL")
            };
            changes.push(Change::ManualChange {
                msg: format!("{target}: changed from {from} to {to}"),
            });
        }

        if prev.references != column.references {
            changes.push(Change::ManualChange {
                msg: format!("{target}: foreign key changed"),
            });
        }
    }

    for column in &previous.columns {
        if next.column(&column.name).is_none() {
            changes.push(Change::DropColumn {
                table: next.name.clone(),
                column: column.clone(),
            });
        }
    }
}

fn join_statements(statements: &[String]) -> String {
    let mut out = String::new();
    for statement in statements {
        out.push_str(statement);
        if !statement.starts_with("--") {
            out.push(';');
        }
        out.push('\n');
    }
    out
}
