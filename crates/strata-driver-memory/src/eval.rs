use crate::database::Row;

use regex::{Regex, RegexBuilder};
use serde_json::Value as Json;
use std::cmp::Ordering;
use strata_core::{
    schema::JsonCast,
    stmt::{ArrayOp, BinaryOp, ColumnRef, Condition, Direction, JsonOp, Value},
    Result,
};
use uuid::Uuid;

/// The rows visible while evaluating one candidate result row, keyed by
/// table alias. A `None` row is the null side of an unmatched `LEFT JOIN`.
#[derive(Debug, Clone)]
pub(crate) struct Scope<'a> {
    tables: Vec<(&'a str, Option<&'a Row>)>,
}

impl<'a> Scope<'a> {
    pub(crate) fn new(alias: &'a str, row: Option<&'a Row>) -> Self {
        Self {
            tables: vec![(alias, row)],
        }
    }

    pub(crate) fn with(&self, alias: &'a str, row: Option<&'a Row>) -> Self {
        let mut tables = self.tables.clone();
        tables.push((alias, row));
        Self { tables }
    }

    /// Reads the value a column reference denotes in this scope.
    pub(crate) fn resolve(&self, column: &ColumnRef) -> Result<Value> {
        let value = if column.table_alias.is_empty() {
            // Unqualified references bind to the first table that has the
            // column, the same as an unambiguous name in SQL.
            let found = self
                .tables
                .iter()
                .find_map(|(_, row)| row.and_then(|row| row.get(column.name())));
            match found {
                Some(value) => value.clone(),
                None if self.tables.iter().any(|(_, row)| row.is_none()) => Value::Null,
                None => strata_core::bail!("column \"{}\" does not exist", column.name()),
            }
        } else {
            let Some((_, row)) = self
                .tables
                .iter()
                .find(|(alias, _)| *alias == column.table_alias)
            else {
                strata_core::bail!(
                    "missing FROM-clause entry for table \"{}\"",
                    column.table_alias
                );
            };

            match row {
                None => Value::Null,
                Some(row) => match row.get(column.name()) {
                    Some(value) => value.clone(),
                    None => strata_core::bail!(
                        "column {}.{} does not exist",
                        column.table_alias,
                        column.name()
                    ),
                },
            }
        };

        match &column.column.json {
            None => Ok(value),
            Some(path) => json_path(value, &path.keys, path.cast),
        }
    }
}

fn json_path(value: Value, keys: &[String], cast: JsonCast) -> Result<Value> {
    let doc = match value {
        Value::Null => return Ok(Value::Null),
        Value::Json(doc) => doc,
        Value::String(text) => serde_json::from_str(&text)?,
        other => strata_core::bail!("cannot apply a JSON path to a {} value", other.kind_name()),
    };

    let mut node = &doc;
    for key in keys {
        let next = match node {
            Json::Object(map) => map.get(key),
            Json::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };
        match next {
            Some(next) => node = next,
            None => return Ok(Value::Null),
        }
    }

    if node.is_null() {
        return Ok(Value::Null);
    }

    let text = match node {
        Json::String(s) => s.clone(),
        other => other.to_string(),
    };

    Ok(match cast {
        JsonCast::Any => Value::Json(node.clone()),
        JsonCast::Text => Value::String(text),
        JsonCast::Int => match text.trim().parse::<i64>() {
            Ok(v) => Value::I64(v),
            Err(_) => strata_core::bail!("invalid input syntax for type bigint: \"{text}\""),
        },
        JsonCast::Float => match text.trim().parse::<f64>() {
            Ok(v) => Value::F64(v),
            Err(_) => strata_core::bail!("invalid input syntax for type double: \"{text}\""),
        },
        JsonCast::Bool => match text.trim() {
            "true" | "t" => Value::Bool(true),
            "false" | "f" => Value::Bool(false),
            _ => strata_core::bail!("invalid input syntax for type boolean: \"{text}\""),
        },
    })
}

/// Evaluates a condition with SQL's three-valued logic. `None` is unknown.
pub(crate) fn condition(cond: &Condition, scope: &Scope<'_>) -> Result<Option<bool>> {
    Ok(match cond {
        Condition::Binary(op, column, Value::Null) => {
            let value = scope.resolve(column)?;
            match op {
                BinaryOp::Eq => Some(value.is_null()),
                BinaryOp::Ne => Some(!value.is_null()),
                _ => None,
            }
        }
        Condition::Binary(op, column, rhs) => {
            let lhs = scope.resolve(column)?;
            compare(&lhs, rhs).map(|ord| binary(*op, ord))
        }
        Condition::In(column, values) => in_list(&scope.resolve(column)?, values),
        Condition::NotIn(column, values) => in_list(&scope.resolve(column)?, values).map(|b| !b),
        Condition::IsNull(column) => Some(scope.resolve(column)?.is_null()),
        Condition::IsNotNull(column) => Some(!scope.resolve(column)?.is_null()),
        Condition::Like {
            column,
            pattern,
            case_insensitive,
        } => match scope.resolve(column)? {
            Value::Null => None,
            value => {
                let re = like_regex(pattern, *case_insensitive)?;
                Some(re.is_match(&text(&value)))
            }
        },
        Condition::And(clauses) => {
            let mut result = Some(true);
            for clause in clauses {
                match condition(clause, scope)? {
                    Some(false) => return Ok(Some(false)),
                    None => result = None,
                    Some(true) => {}
                }
            }
            result
        }
        Condition::Or(clauses) => {
            let mut result = Some(false);
            for clause in clauses {
                match condition(clause, scope)? {
                    Some(true) => return Ok(Some(true)),
                    None => result = None,
                    Some(false) => {}
                }
            }
            result
        }
        Condition::Not(inner) => condition(inner, scope)?.map(|b| !b),
        Condition::Array(op, column, values) => match scope.resolve(column)? {
            Value::Null => None,
            Value::Array(items) => array(*op, &items, values),
            other => strata_core::bail!(
                "operator {} requires an array column, found {}",
                op.sql_op(),
                other.kind_name()
            ),
        },
        Condition::Regex(op, column, pattern) => match scope.resolve(column)? {
            Value::Null => None,
            value => {
                let re = RegexBuilder::new(pattern)
                    .case_insensitive(op.is_case_insensitive())
                    .build()
                    .map_err(|err| strata_core::err!("invalid regular expression: {err}"))?;
                Some(re.is_match(&text(&value)) != op.is_negated())
            }
        },
        Condition::Json(op, column, rhs) => match scope.resolve(column)? {
            Value::Null => None,
            lhs => json(*op, &to_json(&lhs), rhs)?,
        },
    })
}

fn binary(op: BinaryOp, ord: Ordering) -> bool {
    match op {
        BinaryOp::Eq => ord.is_eq(),
        BinaryOp::Ne => ord.is_ne(),
        BinaryOp::Lt => ord.is_lt(),
        BinaryOp::Gt => ord.is_gt(),
        BinaryOp::Le => ord.is_le(),
        BinaryOp::Ge => ord.is_ge(),
    }
}

fn in_list(value: &Value, values: &[Value]) -> Option<bool> {
    if value.is_null() {
        return if values.is_empty() { Some(false) } else { None };
    }

    let mut unknown = false;
    for candidate in values {
        match compare(value, candidate) {
            Some(Ordering::Equal) => return Some(true),
            None => unknown = true,
            Some(_) => {}
        }
    }

    if unknown {
        None
    } else {
        Some(false)
    }
}

fn array(op: ArrayOp, lhs: &[Value], rhs: &[Value]) -> Option<bool> {
    let contains = |haystack: &[Value], needle: &Value| {
        haystack
            .iter()
            .any(|item| compare(item, needle) == Some(Ordering::Equal))
    };

    let ordering = || compare_arrays(lhs, rhs);

    Some(match op {
        ArrayOp::Eq => ordering().is_eq(),
        ArrayOp::Ne => ordering().is_ne(),
        ArrayOp::Lt => ordering().is_lt(),
        ArrayOp::Gt => ordering().is_gt(),
        ArrayOp::Le => ordering().is_le(),
        ArrayOp::Ge => ordering().is_ge(),
        ArrayOp::Contains => rhs.iter().all(|v| contains(lhs, v)),
        ArrayOp::ContainedBy => lhs.iter().all(|v| contains(rhs, v)),
        ArrayOp::Overlap => rhs.iter().any(|v| contains(lhs, v)),
    })
}

/// Element-wise comparison. Null elements sort after every other element and
/// equal to each other, and a proper prefix sorts first.
fn compare_arrays(lhs: &[Value], rhs: &[Value]) -> Ordering {
    for (a, b) in lhs.iter().zip(rhs) {
        let ord = match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => compare(a, b).unwrap_or(Ordering::Equal),
        };
        if ord.is_ne() {
            return ord;
        }
    }
    lhs.len().cmp(&rhs.len())
}

fn json(op: JsonOp, lhs: &Json, rhs: &Value) -> Result<Option<bool>> {
    Ok(Some(match op {
        JsonOp::Contains => json_contains(lhs, &json_operand(rhs)?, true),
        JsonOp::ContainedBy => json_contains(&json_operand(rhs)?, lhs, true),
        JsonOp::HasKey => match rhs {
            Value::String(key) => has_key(lhs, key),
            other => strata_core::bail!("operator ? requires a text key, found {}", other.kind_name()),
        },
        JsonOp::HasAnyKey => keys(rhs)?.iter().any(|key| has_key(lhs, key)),
        JsonOp::HasAllKeys => keys(rhs)?.iter().all(|key| has_key(lhs, key)),
    }))
}

fn json_operand(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::String(text) => serde_json::from_str(text)?,
        other => to_json(other),
    })
}

fn keys(value: &Value) -> Result<Vec<&str>> {
    let Value::Array(items) = value else {
        strata_core::bail!("expected an array of keys, found {}", value.kind_name());
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(key) => Ok(key.as_str()),
            other => Err(strata_core::err!(
                "expected a text key, found {}",
                other.kind_name()
            )),
        })
        .collect()
}

/// Top-level strings of an array count as keys, like PostgreSQL's `?`.
fn has_key(doc: &Json, key: &str) -> bool {
    match doc {
        Json::Object(map) => map.contains_key(key),
        Json::Array(items) => items.iter().any(|item| item.as_str() == Some(key)),
        Json::String(s) => s == key,
        _ => false,
    }
}

/// `lhs @> rhs` with `jsonb` semantics. A top-level array may contain a bare
/// scalar.
fn json_contains(lhs: &Json, rhs: &Json, top_level: bool) -> bool {
    match (lhs, rhs) {
        (Json::Object(lhs), Json::Object(rhs)) => rhs.iter().all(|(key, value)| {
            lhs.get(key)
                .is_some_and(|inner| json_contains(inner, value, false))
        }),
        (Json::Array(lhs), Json::Array(rhs)) => rhs.iter().all(|needle| {
            lhs.iter().any(|item| match (item, needle) {
                (Json::Array(_), Json::Array(_)) | (Json::Object(_), Json::Object(_)) => {
                    json_contains(item, needle, false)
                }
                _ => item == needle,
            })
        }),
        (Json::Array(lhs), scalar) if top_level && !scalar.is_object() => {
            lhs.iter().any(|item| item == scalar)
        }
        (Json::Number(a), Json::Number(b)) => a.as_f64() == b.as_f64(),
        _ => lhs == rhs,
    }
}

pub(crate) fn to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Bool(v) => Json::Bool(*v),
        Value::I32(v) => Json::from(*v),
        Value::I64(v) => Json::from(*v),
        Value::F64(v) => Json::from(*v),
        Value::String(v) => Json::String(v.clone()),
        Value::Uuid(v) => Json::String(v.to_string()),
        Value::Timestamp(v) => Json::String(v.to_rfc3339()),
        Value::Json(v) => v.clone(),
        Value::Array(items) => Json::Array(items.iter().map(to_json).collect()),
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::String(v) => v.clone(),
        Value::Json(Json::String(v)) => v.clone(),
        Value::Json(v) => v.to_string(),
        Value::Uuid(v) => v.to_string(),
        Value::Timestamp(v) => v.to_rfc3339(),
        Value::Bool(v) => v.to_string(),
        Value::I32(v) => v.to_string(),
        Value::I64(v) => v.to_string(),
        Value::F64(v) => v.to_string(),
        Value::Array(_) | Value::Null => String::new(),
    }
}

/// Translates a `LIKE` pattern to an anchored regular expression. `%` matches
/// any run of characters, `_` any single character and `\` escapes the next
/// character.
pub(crate) fn like_regex(pattern: &str, case_insensitive: bool) -> Result<Regex> {
    let mut re = String::from("^");
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        match c {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            '\\' => {
                if let Some(escaped) = chars.next() {
                    re.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
                }
            }
            c => re.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
        }
    }
    re.push('$');

    RegexBuilder::new(&re)
        .case_insensitive(case_insensitive)
        .dot_matches_new_line(true)
        .build()
        .map_err(|err| strata_core::err!("invalid LIKE pattern `{pattern}`: {err}"))
}

/// Compares two non-null values. Returns `None` when either side is null or
/// the values are not comparable.
pub(crate) fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::F64(a), b) => as_f64(b).and_then(|b| a.partial_cmp(&b)),
        (a, Value::F64(b)) => as_f64(a).and_then(|a| a.partial_cmp(b)),
        (Value::I32(_) | Value::I64(_), Value::I32(_) | Value::I64(_)) => {
            Some(lhs.as_i64()?.cmp(&rhs.as_i64()?))
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
        (Value::Uuid(a), Value::String(b)) => b.parse::<Uuid>().ok().map(|b| a.cmp(&b)),
        (Value::String(a), Value::Uuid(b)) => a.parse::<Uuid>().ok().map(|a| a.cmp(b)),
        (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
        (Value::Json(a), Value::Json(b)) => Some(if a == b {
            Ordering::Equal
        } else {
            a.to_string().cmp(&b.to_string())
        }),
        (Value::Array(a), Value::Array(b)) => Some(compare_arrays(a, b)),
        _ => None,
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match *value {
        Value::F64(v) => Some(v),
        Value::I32(v) => Some(v as f64),
        Value::I64(v) => Some(v as f64),
        _ => None,
    }
}

/// `ORDER BY` ordering: nulls sort last ascending and first descending.
pub(crate) fn sort_order(lhs: &Value, rhs: &Value, direction: Direction) -> Ordering {
    let ord = match (lhs.is_null(), rhs.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(lhs, rhs).unwrap_or(Ordering::Equal),
    };

    match direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}
