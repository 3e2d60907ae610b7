use crate::{Error, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::{any, fmt};
use uuid::Uuid;

/// Dynamically typed value moving between entity fields, the transformer and the store.
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Int64(i64),
    Float64(f64),
    Varchar(String),
    Uuid(Uuid),
    Json(serde_json::Value),
    Blob(Box<[u8]>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// JavaScript like truthiness, used when reading boolean columns.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(v) => *v,
            Value::Int64(v) => *v != 0,
            Value::Float64(v) => *v != 0.0 && !v.is_nan(),
            Value::Varchar(v) => !v.is_empty(),
            Value::Json(serde_json::Value::Null) => false,
            Value::Uuid(..) | Value::Json(..) | Value::Blob(..) => true,
        }
    }

    /// Textual form of the value, `None` for `Null`.
    pub fn to_text(&self) -> Option<String> {
        Some(match self {
            Value::Null => return None,
            Value::Boolean(v) => v.to_string(),
            Value::Int64(v) => v.to_string(),
            Value::Float64(v) => v.to_string(),
            Value::Varchar(v) => v.clone(),
            Value::Uuid(v) => v.to_string(),
            Value::Json(serde_json::Value::String(v)) => v.clone(),
            Value::Json(v) => v.to_string(),
            Value::Blob(v) => String::from_utf8_lossy(v).into_owned(),
        })
    }

    pub fn into_json(self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(v) => v.into(),
            Value::Int64(v) => v.into(),
            Value::Float64(v) => serde_json::Number::from_f64(v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Varchar(v) => v.into(),
            Value::Uuid(v) => v.to_string().into(),
            Value::Json(v) => v,
            Value::Blob(v) => v.iter().copied().collect::<Vec<u8>>().into(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            v => Value::Json(v),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(v) => f.write_str(&v),
            None => f.write_str("null"),
        }
    }
}

/// Serialize any field into a `Value::Json`, a failing serialization yields `Null`.
pub fn json_to_value<T: Serialize + ?Sized>(value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(v) => v.into(),
        Err(e) => {
            log::debug!(
                "Cannot serialize {} as json, storing null: {:#}",
                any::type_name::<T>(),
                e
            );
            Value::Null
        }
    }
}

/// Rebuild a serde type out of a value produced by [`json_to_value`] or read from the store.
pub fn json_from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    let json = match value {
        Value::Varchar(v) => match serde_json::from_str(&v) {
            Ok(v) => v,
            Err(..) => serde_json::Value::String(v),
        },
        v => v.into_json(),
    };
    serde_json::from_value(json).map_err(|e| {
        Error::new(e).context(format!("Cannot convert json into {}", any::type_name::<T>()))
    })
}
