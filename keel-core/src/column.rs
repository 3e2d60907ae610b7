use crate::{Error, Result, Value};
use proc_macro2::TokenStream;
use quote::{ToTokens, TokenStreamExt, quote};
use std::{fmt, str::FromStr};
use syn::{GenericArgument, Path, PathArguments, Type};

/// Logical storage type of a column, it decides how values are encoded and which physical type backs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    EncodedString,
    Json,
    EncodedJson,
    Number,
    Uuid,
    TimeUuid,
    Boolean,
    Counter,
    Blob,
    /// Behaves as `Boolean`.
    LegacyBoolean,
    /// Behaves as `Number`.
    LegacyInt,
    /// Datetime stored as a 64 bit integer, read back as epoch milliseconds.
    Timestamp,
}

impl ColumnType {
    pub const ALL: [ColumnType; 13] = [
        ColumnType::String,
        ColumnType::EncodedString,
        ColumnType::Json,
        ColumnType::EncodedJson,
        ColumnType::Number,
        ColumnType::Uuid,
        ColumnType::TimeUuid,
        ColumnType::Boolean,
        ColumnType::Counter,
        ColumnType::Blob,
        ColumnType::LegacyBoolean,
        ColumnType::LegacyInt,
        ColumnType::Timestamp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::EncodedString => "encoded_string",
            ColumnType::Json => "json",
            ColumnType::EncodedJson => "encoded_json",
            ColumnType::Number => "number",
            ColumnType::Uuid => "uuid",
            ColumnType::TimeUuid => "timeuuid",
            ColumnType::Boolean => "boolean",
            ColumnType::Counter => "counter",
            ColumnType::Blob => "blob",
            ColumnType::LegacyBoolean => "legacy_boolean",
            ColumnType::LegacyInt => "legacy_int",
            ColumnType::Timestamp => "timestamp",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Number | ColumnType::LegacyInt | ColumnType::Counter | ColumnType::Timestamp
        )
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, ColumnType::Boolean | ColumnType::LegacyBoolean)
    }

    pub fn is_uuid(&self) -> bool {
        matches!(self, ColumnType::Uuid | ColumnType::TimeUuid)
    }

    pub fn is_encrypted(&self) -> bool {
        matches!(self, ColumnType::EncodedString | ColumnType::EncodedJson)
    }

    /// Holds serialized JSON text once encoded.
    pub fn is_json(&self) -> bool {
        matches!(self, ColumnType::Json | ColumnType::EncodedJson)
    }

    /// Infer the column type of a field from its Rust type, `Option<T>` is looked through.
    ///
    /// Returns `None` when the type does not map unambiguously, the field then needs an explicit `type`.
    pub fn from_rust_type(ty: &Type) -> Option<ColumnType> {
        let ty = option_inner(ty).unwrap_or(ty);
        let Type::Path(path) = ty else {
            return None;
        };
        if path.qself.is_some() {
            return None;
        }
        let path = &path.path;
        let ident = path.segments.last()?.ident.to_string();
        Some(match ident.as_str() {
            "bool" => ColumnType::Boolean,
            "i8" | "i16" | "i32" | "i64" | "isize" | "u8" | "u16" | "u32" | "u64" | "usize"
            | "f32" | "f64" => ColumnType::Number,
            "String" | "str" | "Cow" => ColumnType::String,
            "Uuid" => ColumnType::Uuid,
            "Value" if matches_path(path, &["serde_json", "Value"]) => ColumnType::Json,
            "Vec" if is_bytes(path) => ColumnType::Blob,
            _ => return None,
        })
    }
}

/// Inner type of `Option<T>`, `None` for any other type.
pub fn option_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let last = path.path.segments.last()?;
    if last.ident != "Option" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

fn matches_path(path: &Path, expect: &[&str]) -> bool {
    let len = path.segments.len().min(expect.len());
    path.segments
        .iter()
        .rev()
        .take(len)
        .map(|v| &v.ident)
        .eq(expect.iter().rev().take(len))
}

fn is_bytes(path: &Path) -> bool {
    let Some(last) = path.segments.last() else {
        return false;
    };
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return false;
    };
    matches!(
        args.args.first(),
        Some(GenericArgument::Type(Type::Path(inner))) if inner.path.is_ident("u8")
    )
}

impl FromStr for ColumnType {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        ColumnType::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| Error::msg(format!("Unknown column type `{s}`")))
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToTokens for ColumnType {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        use ColumnType::*;
        tokens.append_all(match self {
            String => quote!(::keel::ColumnType::String),
            EncodedString => quote!(::keel::ColumnType::EncodedString),
            Json => quote!(::keel::ColumnType::Json),
            EncodedJson => quote!(::keel::ColumnType::EncodedJson),
            Number => quote!(::keel::ColumnType::Number),
            Uuid => quote!(::keel::ColumnType::Uuid),
            TimeUuid => quote!(::keel::ColumnType::TimeUuid),
            Boolean => quote!(::keel::ColumnType::Boolean),
            Counter => quote!(::keel::ColumnType::Counter),
            Blob => quote!(::keel::ColumnType::Blob),
            LegacyBoolean => quote!(::keel::ColumnType::LegacyBoolean),
            LegacyInt => quote!(::keel::ColumnType::LegacyInt),
            Timestamp => quote!(::keel::ColumnType::Timestamp),
        });
    }
}

/// Value assigned to an undefined primary key column on persist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    Uuid,
    TimeUuid,
    Number,
    /// Empty string.
    Empty,
}

impl Generator {
    /// The generator a column falls back to when none is declared.
    pub fn for_type(column_type: ColumnType) -> Generator {
        match column_type {
            ColumnType::Uuid => Generator::Uuid,
            ColumnType::TimeUuid => Generator::TimeUuid,
            ColumnType::Number => Generator::Number,
            _ => Generator::Empty,
        }
    }

    pub fn generate(&self) -> Value {
        match self {
            Generator::Uuid => Value::Uuid(uuid::Uuid::new_v4()),
            Generator::TimeUuid => {
                let node: [u8; 6] = rand::random();
                Value::Uuid(uuid::Uuid::now_v1(&node))
            }
            Generator::Number => Value::Int64(0),
            Generator::Empty => Value::Varchar(String::new()),
        }
    }
}

impl FromStr for Generator {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "uuid" => Generator::Uuid,
            "timeuuid" => Generator::TimeUuid,
            "number" => Generator::Number,
            "" | "empty" => Generator::Empty,
            _ => return Err(Error::msg(format!("Unknown generator `{s}`"))),
        })
    }
}

impl ToTokens for Generator {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(match self {
            Generator::Uuid => quote!(::keel::Generator::Uuid),
            Generator::TimeUuid => quote!(::keel::Generator::TimeUuid),
            Generator::Number => quote!(::keel::Generator::Number),
            Generator::Empty => quote!(::keel::Generator::Empty),
        });
    }
}

/// Preferred sort order of a clustering column.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

impl Order {
    pub fn reversed(self) -> Order {
        match self {
            Order::Asc => Order::Desc,
            Order::Desc => Order::Asc,
        }
    }
    pub fn as_sql(&self) -> &'static str {
        match self {
            Order::Asc => "ASC",
            Order::Desc => "DESC",
        }
    }
}

impl FromStr for Order {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(Order::Asc),
            "DESC" => Ok(Order::Desc),
            _ => Err(Error::msg(format!("Unknown order `{s}`, expected ASC or DESC"))),
        }
    }
}

impl ToTokens for Order {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        tokens.append_all(match self {
            Order::Asc => quote!(::keel::Order::Asc),
            Order::Desc => quote!(::keel::Order::Desc),
        });
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct ColumnOptions {
    pub generator: Option<Generator>,
    /// Applied to the column value every time the entity is persisted.
    pub on_upsert: Option<fn(Value) -> Value>,
    pub order: Order,
}

/// Declarative description of an entity column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    /// Storage column name.
    pub name: &'static str,
    /// Rust field name.
    pub field: &'static str,
    pub column_type: ColumnType,
    pub options: ColumnOptions,
}

impl ColumnDef {
    pub fn generator(&self) -> Generator {
        self.options
            .generator
            .unwrap_or_else(|| Generator::for_type(self.column_type))
    }
}
