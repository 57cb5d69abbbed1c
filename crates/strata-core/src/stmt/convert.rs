use super::{Identifier, Value};
use crate::{Error, Result};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;

/// Converts a database value into a Rust value.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self>;
}

/// Converts a Rust value into a database value for parameter binding.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(Error::type_conversion(other, "bool")),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::I32(v) => Ok(v),
            Value::I64(v) => {
                i32::try_from(v).map_err(|_| Error::type_conversion(Value::I64(v), "i32"))
            }
            other => Err(Error::type_conversion(other, "i32")),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::I32(v) => Ok(v as i64),
            Value::I64(v) => Ok(v),
            other => Err(Error::type_conversion(other, "i64")),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::F64(v) => Ok(v),
            Value::I32(v) => Ok(v as f64),
            Value::I64(v) => Ok(v as f64),
            other => Err(Error::type_conversion(other, "f64")),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(Error::type_conversion(other, "String")),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(v) => Ok(v),
            Value::String(v) => Ok(v.parse()?),
            other => Err(Error::type_conversion(other, "Uuid")),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(v) => Ok(v),
            other => Err(Error::type_conversion(other, "DateTime<Utc>")),
        }
    }
}

impl FromValue for serde_json::Value {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Json(v) => Ok(v),
            Value::Null => Ok(serde_json::Value::Null),
            other => Err(Error::type_conversion(other, "serde_json::Value")),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self> {
        Ok(value)
    }
}

impl FromValue for Identifier {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Identifier::Unset),
            Value::I32(v) => Ok(Identifier::Int(v as i64)),
            Value::I64(v) => Ok(Identifier::Int(v)),
            Value::Uuid(v) => Ok(Identifier::Uuid(v)),
            Value::String(v) => Ok(Identifier::Uuid(v.parse()?)),
            other => Err(Error::type_conversion(other, "Identifier")),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items.into_iter().map(T::from_value).collect(),
            Value::Null => Ok(vec![]),
            other => Err(Error::type_conversion(other, "Vec")),
        }
    }
}

impl<T: Into<Value> + Clone> ToValue for T {
    fn to_value(&self) -> Value {
        self.clone().into()
    }
}

/// Stores any serde type as a JSON document.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned> FromValue for Json<T> {
    fn from_value(value: Value) -> Result<Self> {
        let value = match value {
            Value::Json(value) => serde_json::from_value(value)?,
            Value::String(text) => serde_json::from_str(&text)?,
            other => return Err(Error::type_conversion(other, "Json")),
        };
        Ok(Json(value))
    }
}

impl<T: Serialize> From<Json<T>> for Value {
    fn from(value: Json<T>) -> Self {
        Value::from(&value)
    }
}

impl<T: Serialize> From<&Json<T>> for Value {
    fn from(value: &Json<T>) -> Self {
        // Serializing plain data into `serde_json::Value` only fails for maps
        // with non-string keys; those are stored as null.
        serde_json::to_value(&value.0)
            .map(Value::Json)
            .unwrap_or(Value::Null)
    }
}

impl<T> core::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> core::ops::DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}
