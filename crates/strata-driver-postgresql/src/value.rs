use chrono::{DateTime, NaiveDateTime, Utc};
use postgres_types::{to_sql_checked, FromSql, IsNull, Kind, ToSql, Type};
use strata_core::{stmt, Error, Result};
use tokio_postgres::{types::private::BytesMut, Row};
use uuid::Uuid;

/// A statement parameter bound through `tokio-postgres`.
///
/// The server infers each placeholder's type from the statement, so integer
/// values are narrowed or widened to the inferred width.
#[derive(Debug)]
pub(crate) struct Value(pub(crate) stmt::Value);

type BoxError = Box<dyn std::error::Error + Sync + Send>;

impl From<stmt::Value> for Value {
    fn from(value: stmt::Value) -> Self {
        Self(value)
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
        match &self.0 {
            stmt::Value::Null => Ok(IsNull::Yes),
            stmt::Value::Bool(value) => value.to_sql_checked(ty, out),
            stmt::Value::I32(value) => match *ty {
                Type::INT2 => i16::try_from(*value)?.to_sql(ty, out),
                Type::INT8 => i64::from(*value).to_sql(ty, out),
                Type::FLOAT8 => f64::from(*value).to_sql(ty, out),
                _ => value.to_sql_checked(ty, out),
            },
            stmt::Value::I64(value) => match *ty {
                Type::INT2 => i16::try_from(*value)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*value)?.to_sql(ty, out),
                Type::FLOAT8 => (*value as f64).to_sql(ty, out),
                _ => value.to_sql_checked(ty, out),
            },
            stmt::Value::F64(value) => match *ty {
                Type::FLOAT4 => (*value as f32).to_sql(ty, out),
                _ => value.to_sql_checked(ty, out),
            },
            stmt::Value::String(value) => match *ty {
                Type::UUID => Uuid::parse_str(value)?.to_sql(ty, out),
                _ => value.to_sql_checked(ty, out),
            },
            stmt::Value::Uuid(value) => match *ty {
                Type::TEXT | Type::VARCHAR => value.to_string().to_sql(ty, out),
                _ => value.to_sql_checked(ty, out),
            },
            stmt::Value::Timestamp(value) => match *ty {
                Type::TIMESTAMP => value.naive_utc().to_sql(ty, out),
                _ => value.to_sql_checked(ty, out),
            },
            stmt::Value::Json(value) => value.to_sql_checked(ty, out),
            stmt::Value::Array(values) => {
                let Kind::Array(_) = ty.kind() else {
                    return Err(format!("cannot bind an array to `{ty}`").into());
                };
                let values: Vec<Value> = values.iter().cloned().map(Value).collect();
                values.to_sql(ty, out)
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Reads every column of a row.
pub(crate) fn row_to_values(row: &Row) -> Result<Vec<stmt::Value>> {
    (0..row.len())
        .map(|index| column_to_value(row, index))
        .collect()
}

fn column_to_value(row: &Row, index: usize) -> Result<stmt::Value> {
    let ty = row.columns()[index].type_().clone();

    if let Kind::Array(member) = ty.kind() {
        return array_to_value(row, index, member);
    }

    let value = match ty {
        Type::BOOL => get::<bool>(row, index)?.into(),
        Type::INT2 => get::<i16>(row, index)?.map(i32::from).into(),
        Type::INT4 => get::<i32>(row, index)?.into(),
        Type::INT8 => get::<i64>(row, index)?.into(),
        Type::FLOAT4 => get::<f32>(row, index)?.map(f64::from).into(),
        Type::FLOAT8 => get::<f64>(row, index)?.into(),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => {
            get::<String>(row, index)?.into()
        }
        Type::UUID => get::<Uuid>(row, index)?.into(),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, index)?.into(),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, index)?
            .map(|value| value.and_utc())
            .into(),
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, index)?.into(),
        _ => {
            return Err(Error::invalid_result(format!(
                "unsupported column type `{ty}`; column={}",
                row.columns()[index].name()
            )))
        }
    };

    Ok(value)
}

fn array_to_value(row: &Row, index: usize, member: &Type) -> Result<stmt::Value> {
    fn items<T>(row: &Row, index: usize) -> Result<stmt::Value>
    where
        T: for<'a> FromSql<'a> + Into<stmt::Value>,
    {
        Ok(match get::<Vec<Option<T>>>(row, index)? {
            Some(items) => stmt::Value::Array(items.into_iter().map(stmt::Value::from).collect()),
            None => stmt::Value::Null,
        })
    }

    match *member {
        Type::BOOL => items::<bool>(row, index),
        Type::INT4 => items::<i32>(row, index),
        Type::INT8 => items::<i64>(row, index),
        Type::FLOAT8 => items::<f64>(row, index),
        Type::TEXT | Type::VARCHAR => items::<String>(row, index),
        Type::UUID => items::<Uuid>(row, index),
        Type::TIMESTAMPTZ => items::<DateTime<Utc>>(row, index),
        Type::JSON | Type::JSONB => items::<serde_json::Value>(row, index),
        _ => Err(Error::invalid_result(format!(
            "unsupported array element type `{member}`; column={}",
            row.columns()[index].name()
        ))),
    }
}

fn get<T>(row: &Row, index: usize) -> Result<Option<T>>
where
    T: for<'a> FromSql<'a>,
{
    row.try_get::<usize, Option<T>>(index).map_err(Error::driver)
}
