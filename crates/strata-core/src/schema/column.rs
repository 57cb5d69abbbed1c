use super::db::ColumnType;

use std::borrow::Cow;

const RESERVED: &[&str] = &[
    "all", "and", "any", "array", "as", "asc", "both", "case", "cast", "check", "column",
    "constraint", "create", "default", "desc", "distinct", "do", "else", "end", "false", "for",
    "foreign", "from", "grant", "group", "having", "in", "into", "is", "join", "leading",
    "limit", "not", "null", "offset", "on", "only", "or", "order", "primary", "references",
    "select", "table", "then", "to", "true", "union", "unique", "user", "using", "when", "where",
    "with",
];

/// Renders an identifier, double-quoting it when it is not a plain lowercase
/// name or collides with a reserved word.
pub fn ident(name: &str) -> Cow<'_, str> {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        && !RESERVED.contains(&name);

    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}

/// Describes one column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    pub nullable: bool,

    /// The record stores this column among its virtual columns instead of a
    /// user field. Foreign keys injected by a parent relationship are
    /// virtual.
    pub is_virtual: bool,

    /// Set when the reference addresses a key path inside a JSON column.
    pub json: Option<JsonPath>,
}

/// A key path into a JSON column, rendered with `#>>` or `#>`.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    pub keys: Vec<String>,
    pub cast: JsonCast,
}

/// How a JSON path is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonCast {
    /// `#>>`, the element as text.
    Text,
    /// `CAST(#>> AS bigint)`
    Int,
    /// `CAST(#>> AS float8)`
    Float,
    /// `CAST(#>> AS bool)`
    Bool,
    /// `#>`, the element as an opaque JSON document.
    Any,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            nullable: false,
            is_virtual: false,
            json: None,
        }
    }

    /// A column known only by name.
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    /// Renders `alias.name`, or the bare name when `alias` is empty, wrapped
    /// in the JSON path operators when the column addresses a JSON key path.
    pub fn qualified_name(&self, alias: &str) -> String {
        let mut base = String::new();
        if !alias.is_empty() {
            base.push_str(&ident(alias));
            base.push('.');
        }
        base.push_str(&ident(&self.name));

        let Some(path) = &self.json else {
            return base;
        };

        let literal = path.literal();
        match path.cast {
            JsonCast::Any => format!("{base} #>'{literal}'"),
            JsonCast::Text => format!("{base} #>>'{literal}'"),
            cast => format!(
                "CAST({base} #>>'{literal}' AS {})",
                cast.sql_type().unwrap_or("text")
            ),
        }
    }
}

impl JsonPath {
    /// The path as a PostgreSQL text-array literal, with single quotes
    /// doubled so it can be embedded in a quoted SQL string.
    pub fn literal(&self) -> String {
        let mut out = String::from("{");

        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }

            let needs_quotes = key.is_empty()
                || key
                    .chars()
                    .any(|c| matches!(c, ',' | '{' | '}' | '"' | '\\') || c.is_whitespace());

            if needs_quotes {
                out.push('"');
                for c in key.chars() {
                    if matches!(c, '"' | '\\') {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push('"');
            } else {
                out.push_str(key);
            }
        }

        out.push('}');
        out.replace('\'', "''")
    }
}

impl JsonCast {
    pub fn sql_type(self) -> Option<&'static str> {
        match self {
            JsonCast::Int => Some("bigint"),
            JsonCast::Float => Some("float8"),
            JsonCast::Bool => Some("bool"),
            JsonCast::Text | JsonCast::Any => None,
        }
    }
}
