use crate::{Cipher, ColumnType, Error, Result, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Default, Debug, Clone)]
pub struct TransformOptions {
    /// Secret of the encrypted columns.
    pub secret: String,
    /// Deterministic encryption, equal plaintexts give equal storage values.
    pub disable_salts: bool,
}

/// Converts entity values into their storage representation and back.
///
/// Encoding is strict: a value that cannot be represented in a column is an
/// error. Decoding is lenient: unreadable input becomes `Value::Null` (or the
/// raw stored text for encrypted columns) and is logged at debug level.
#[derive(Debug, Clone)]
pub struct ValueTransformer {
    cipher: Cipher,
}

impl ValueTransformer {
    pub fn new(options: TransformOptions) -> Self {
        Self {
            cipher: Cipher::new(&options.secret, options.disable_salts),
        }
    }

    pub fn encode(&self, value: &Value, column_type: ColumnType) -> Result<Value> {
        Ok(match column_type {
            ColumnType::Number | ColumnType::LegacyInt | ColumnType::Timestamp => {
                encode_number(value)
            }
            ColumnType::Uuid | ColumnType::TimeUuid => match value {
                Value::Null | Value::Uuid(..) | Value::Varchar(..) => value.clone(),
                v => v.to_text().map(Value::Varchar).unwrap_or_default(),
            },
            ColumnType::Boolean | ColumnType::LegacyBoolean => match value {
                Value::Null => Value::Boolean(false),
                Value::Boolean(v) => Value::Boolean(*v),
                Value::Int64(v) => Value::Boolean(*v != 0),
                Value::Float64(v) if v.fract() == 0.0 => Value::Boolean(*v != 0.0),
                v => {
                    let error = Error::msg(format!("'{v}' is not a boolean"));
                    log::debug!("{:#}", error);
                    return Err(error);
                }
            },
            ColumnType::EncodedString => match value.to_text() {
                None => Value::Null,
                Some(v) => Value::Varchar(self.cipher.encrypt(&v)?),
            },
            ColumnType::EncodedJson => {
                Value::Varchar(self.cipher.encrypt(&json_text(value))?)
            }
            ColumnType::String => Value::Varchar(value.to_text().unwrap_or_default()),
            ColumnType::Json => match value {
                Value::Null => Value::Varchar(String::new()),
                v => Value::Varchar(json_text(v)),
            },
            ColumnType::Blob | ColumnType::Counter => {
                let error = Error::msg(format!(
                    "Not implemented yet: cannot write a `{column_type}` column"
                ));
                log::error!("{:#}", error);
                return Err(error);
            }
        })
    }

    pub fn decode(&self, value: Value, column_type: ColumnType) -> Value {
        match column_type {
            ColumnType::Timestamp => decode_timestamp(value),
            ColumnType::EncodedString | ColumnType::EncodedJson => {
                let Value::Varchar(stored) = value else {
                    return value;
                };
                if stored.trim().is_empty() {
                    return Value::Varchar(stored);
                }
                let text = match self.cipher.decrypt(&stored) {
                    Ok(v) => v,
                    Err(e) => {
                        log::debug!("Keeping the stored value, cannot decrypt it: {:#}", e);
                        stored
                    }
                };
                if column_type == ColumnType::EncodedJson {
                    parse_json(&text)
                } else {
                    Value::Varchar(text)
                }
            }
            ColumnType::Boolean | ColumnType::LegacyBoolean => {
                Value::Boolean(match &value {
                    Value::Varchar(v) => !matches!(v.as_str(), "" | "false" | "f" | "0"),
                    v => v.is_truthy(),
                })
            }
            ColumnType::Json => match value {
                Value::Varchar(v) => parse_json(&v),
                v => v,
            },
            ColumnType::Uuid | ColumnType::TimeUuid => match value {
                Value::Varchar(v) if v.is_empty() => Value::Null,
                Value::Varchar(v) => match uuid::Uuid::parse_str(&v) {
                    Ok(v) => Value::Uuid(v),
                    Err(..) => Value::Varchar(v),
                },
                v => v,
            },
            ColumnType::Number | ColumnType::LegacyInt | ColumnType::Counter => match value {
                Value::Null | Value::Int64(..) | Value::Float64(..) => value,
                Value::Boolean(v) => Value::Int64(v as i64),
                Value::Varchar(v) => parse_number(v.trim()),
                v => {
                    log::debug!("Cannot read {v:?} as a number");
                    Value::Null
                }
            },
            ColumnType::String => match value {
                Value::Null | Value::Varchar(..) | Value::Blob(..) => value,
                v => v.to_text().map(Value::Varchar).unwrap_or_default(),
            },
            ColumnType::Blob => value,
        }
    }
}

fn encode_number(value: &Value) -> Value {
    match value {
        Value::Int64(..) => value.clone(),
        Value::Float64(v) if v.is_finite() => Value::Int64(v.trunc() as i64),
        Value::Boolean(v) => Value::Int64(*v as i64),
        Value::Varchar(v) => leading_integer(v)
            .map(Value::Int64)
            .unwrap_or_default(),
        _ => Value::Null,
    }
}

/// Integer prefix of a text, after optional whitespace and sign.
fn leading_integer(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let digits = text
        .char_indices()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    text[..digits].parse().ok()
}

fn parse_number(text: &str) -> Value {
    if let Ok(v) = text.parse::<i64>() {
        return Value::Int64(v);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Value::Float64(v),
        _ => {
            log::debug!("Cannot read `{text}` as a number");
            Value::Null
        }
    }
}

fn json_text(value: &Value) -> String {
    match value {
        Value::Json(v) => v.to_string(),
        v => v.clone().into_json().to_string(),
    }
}

fn parse_json(text: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(v) => v.into(),
        Err(e) => {
            log::debug!("Cannot parse the stored json, reading null: {:#}", e);
            Value::Null
        }
    }
}

fn decode_timestamp(value: Value) -> Value {
    match value {
        Value::Int64(..) | Value::Null => value,
        Value::Float64(v) => Value::Int64(v as i64),
        Value::Varchar(v) => {
            let v = v.trim();
            if let Ok(v) = v.parse::<i64>() {
                return Value::Int64(v);
            }
            match OffsetDateTime::parse(v, &Rfc3339) {
                Ok(v) => Value::Int64((v.unix_timestamp_nanos() / 1_000_000) as i64),
                Err(e) => {
                    log::debug!("Cannot read `{v}` as a timestamp: {:#}", e);
                    Value::Null
                }
            }
        }
        v => {
            log::debug!("Cannot read {v:?} as a timestamp");
            Value::Null
        }
    }
}
