use keel_core::{ColumnType, SqlWriter};

#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresSqlWriter {}

impl SqlWriter for PostgresSqlWriter {
    fn write_column_type(&self, out: &mut String, column_type: ColumnType) {
        out.push_str(match column_type {
            ColumnType::String
            | ColumnType::EncodedString
            | ColumnType::Json
            | ColumnType::EncodedJson => "TEXT",
            ColumnType::Number
            | ColumnType::LegacyInt
            | ColumnType::Timestamp
            | ColumnType::Counter => "BIGINT",
            ColumnType::Uuid | ColumnType::TimeUuid => "UUID",
            ColumnType::Boolean | ColumnType::LegacyBoolean => "BOOLEAN",
            ColumnType::Blob => "BYTEA",
        });
    }
}

#[cfg(test)]
mod tests {
    use super::PostgresSqlWriter;
    use keel_core::{ColumnType, SqlWriter};

    #[test]
    fn blob_is_bytea() {
        let mut out = String::new();
        PostgresSqlWriter {}.write_column_type(&mut out, ColumnType::Blob);
        assert_eq!(out, "BYTEA");
        out.clear();
        PostgresSqlWriter {}.write_column_type(&mut out, ColumnType::EncodedJson);
        assert_eq!(out, "TEXT");
    }
}
