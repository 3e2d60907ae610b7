use bytes::BytesMut;
use keel_core::Value;
use postgres_types::{FromSql, IsNull, Kind, ToSql, Type, to_sql_checked};
use std::error::Error;
use time::{OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

/// Carries a `keel::Value` across the Postgres wire in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueHolder(pub Value);

impl From<Value> for ValueHolder {
    fn from(value: Value) -> Self {
        ValueHolder(value)
    }
}

impl From<ValueHolder> for Value {
    fn from(value: ValueHolder) -> Self {
        value.0
    }
}

fn epoch_millis(v: OffsetDateTime) -> i64 {
    (v.unix_timestamp_nanos() / 1_000_000) as i64
}

impl<'a> FromSql<'a> for ValueHolder {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Self::from_sql_nullable(ty, Some(raw))
    }

    fn from_sql_null(ty: &Type) -> Result<Self, Box<dyn Error + Sync + Send>> {
        Self::from_sql_nullable(ty, None)
    }

    fn from_sql_nullable(
        ty: &Type,
        raw: Option<&'a [u8]>,
    ) -> Result<Self, Box<dyn Error + Sync + Send>> {
        let Some(raw) = raw else {
            return Ok(ValueHolder(Value::Null));
        };
        if let Kind::Domain(inner) = ty.kind() {
            return Self::from_sql(inner, raw);
        }
        let value = match *ty {
            Type::BOOL => Value::Boolean(bool::from_sql(ty, raw)?),
            Type::INT2 => Value::Int64(i16::from_sql(ty, raw)?.into()),
            Type::INT4 => Value::Int64(i32::from_sql(ty, raw)?.into()),
            Type::INT8 => Value::Int64(i64::from_sql(ty, raw)?),
            Type::OID => Value::Int64(u32::from_sql(ty, raw)?.into()),
            Type::FLOAT4 => Value::Float64(f32::from_sql(ty, raw)?.into()),
            Type::FLOAT8 => Value::Float64(f64::from_sql(ty, raw)?),
            Type::VARCHAR | Type::TEXT | Type::NAME | Type::BPCHAR | Type::UNKNOWN => {
                Value::Varchar(String::from_sql(ty, raw)?)
            }
            Type::JSON | Type::JSONB => Value::Json(serde_json::Value::from_sql(ty, raw)?),
            Type::BYTEA => Value::Blob(Vec::<u8>::from_sql(ty, raw)?.into()),
            Type::UUID => Value::Uuid(Uuid::from_sql(ty, raw)?),
            Type::TIMESTAMP => {
                Value::Int64(epoch_millis(PrimitiveDateTime::from_sql(ty, raw)?.assume_utc()))
            }
            Type::TIMESTAMPTZ => Value::Int64(epoch_millis(OffsetDateTime::from_sql(ty, raw)?)),
            _ => {
                return Err(keel_core::Error::msg(format!(
                    "Cannot decode sql type: `{}`, value: `{}`",
                    ty,
                    String::from_utf8_lossy(raw)
                ))
                .into());
            }
        };
        Ok(ValueHolder(value))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

impl ToSql for ValueHolder {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>>
    where
        Self: Sized,
    {
        if let Kind::Domain(inner) = ty.kind() {
            return self.to_sql(inner, out);
        }
        match (&self.0, ty) {
            (Value::Null, ..) => Ok(IsNull::Yes),
            (Value::Boolean(v), &Type::BOOL) => v.to_sql(ty, out),
            (Value::Boolean(v), &Type::INT2 | &Type::INT4 | &Type::INT8) => {
                ValueHolder(Value::Int64(*v as i64)).to_sql(ty, out)
            }
            (Value::Int64(v), &Type::INT2) => i16::try_from(*v)?.to_sql(ty, out),
            (Value::Int64(v), &Type::INT4) => i32::try_from(*v)?.to_sql(ty, out),
            (Value::Int64(v), &Type::INT8) => v.to_sql(ty, out),
            (Value::Int64(v), &Type::FLOAT4 | &Type::FLOAT8) => {
                ValueHolder(Value::Float64(*v as f64)).to_sql(ty, out)
            }
            (Value::Int64(v), &Type::BOOL) => (*v != 0).to_sql(ty, out),
            (Value::Float64(v), &Type::FLOAT4) => (*v as f32).to_sql(ty, out),
            (Value::Float64(v), &Type::FLOAT8) => v.to_sql(ty, out),
            (Value::Float64(v), &Type::INT2 | &Type::INT4 | &Type::INT8) if v.fract() == 0.0 => {
                ValueHolder(Value::Int64(*v as i64)).to_sql(ty, out)
            }
            (Value::Varchar(v), &Type::UUID) => Uuid::parse_str(v)?.to_sql(ty, out),
            (Value::Varchar(v), &Type::INT2 | &Type::INT4 | &Type::INT8) => {
                ValueHolder(Value::Int64(v.trim().parse()?)).to_sql(ty, out)
            }
            (Value::Varchar(v), &Type::FLOAT4 | &Type::FLOAT8) => {
                ValueHolder(Value::Float64(v.trim().parse()?)).to_sql(ty, out)
            }
            (Value::Varchar(v), &Type::BOOL) => {
                matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "t" | "1").to_sql(ty, out)
            }
            (Value::Varchar(v), &Type::JSON | &Type::JSONB) => {
                serde_json::from_str::<serde_json::Value>(v)?.to_sql(ty, out)
            }
            (Value::Varchar(v), &Type::BYTEA) => v.as_bytes().to_sql(ty, out),
            (Value::Uuid(v), &Type::UUID) => v.to_sql(ty, out),
            (Value::Json(v), &Type::JSON | &Type::JSONB) => v.to_sql(ty, out),
            (Value::Blob(v), &Type::BYTEA) => (&v[..]).to_sql(ty, out),
            (Value::Blob(v), ..) => String::from_utf8(v.to_vec())?.to_sql(ty, out),
            (v, ..) => match v.to_text() {
                Some(text) => text.to_sql(ty, out),
                None => Ok(IsNull::Yes),
            },
        }
    }

    fn accepts(_ty: &Type) -> bool
    where
        Self: Sized,
    {
        true
    }

    to_sql_checked!();
}

#[cfg(test)]
mod tests {
    use super::ValueHolder;
    use bytes::BytesMut;
    use keel_core::Value;
    use postgres_types::{FromSql, IsNull, ToSql, Type};
    use uuid::Uuid;

    fn encode(value: Value, ty: &Type) -> BytesMut {
        let mut out = BytesMut::new();
        let is_null = ValueHolder(value)
            .to_sql(ty, &mut out)
            .expect("Could not encode the value");
        assert!(matches!(is_null, IsNull::No));
        out
    }

    #[test]
    fn binds_by_target_type() {
        assert_eq!(&encode(Value::Int64(42), &Type::INT8)[..], &42i64.to_be_bytes());
        assert_eq!(&encode(Value::Int64(42), &Type::INT4)[..], &42i32.to_be_bytes());
        assert_eq!(
            &encode(Value::Varchar("17".into()), &Type::INT8)[..],
            &17i64.to_be_bytes()
        );
        let id = Uuid::new_v4();
        assert_eq!(
            &encode(Value::Varchar(id.to_string()), &Type::UUID)[..],
            id.as_bytes()
        );
        assert_eq!(&encode(Value::Boolean(true), &Type::BOOL)[..], &[1u8]);
        assert_eq!(&encode(Value::Uuid(id), &Type::TEXT)[..], id.to_string().as_bytes());
    }

    #[test]
    fn null_and_overflow() {
        let mut out = BytesMut::new();
        let is_null = ValueHolder(Value::Null)
            .to_sql(&Type::UUID, &mut out)
            .expect("Null is always accepted");
        assert!(matches!(is_null, IsNull::Yes));
        assert!(
            ValueHolder(Value::Int64(i64::MAX))
                .to_sql(&Type::INT2, &mut BytesMut::new())
                .is_err()
        );
    }

    #[test]
    fn reads_wire_values() {
        let value = ValueHolder::from_sql(&Type::INT4, &7i32.to_be_bytes()).expect("Integer");
        assert_eq!(value.0, Value::Int64(7));
        let value = ValueHolder::from_sql(&Type::TEXT, b"hello").expect("Text");
        assert_eq!(value.0, Value::Varchar("hello".into()));
        let value = ValueHolder::from_sql_null(&Type::UUID).expect("Null");
        assert_eq!(value.0, Value::Null);
        assert!(ValueHolder::from_sql(&Type::POINT, b"(1,2)").is_err());
    }
}
