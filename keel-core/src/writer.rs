use crate::{
    ColumnDef, ColumnType, Entity, Error, Filter, Filters, FindOptions, Query, Result,
    ValueTransformer, Window, Value, separated_by,
};
use std::fmt::Write;

fn column_of<E: Entity>(name: &str) -> Result<&'static ColumnDef> {
    E::column(name).ok_or_else(|| {
        Error::msg(format!(
            "Column `{}` is not declared by entity `{}`",
            name,
            E::definition().name
        ))
    })
}

/// Dialect printer, every statement the connector sends is produced here.
///
/// Values never appear in the SQL text: each one is pushed into
/// [`Query::params`] and referenced by its positional `$n` placeholder, so the
/// placeholder index always equals the parameter position.
pub trait SqlWriter: Send + Sync {
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        self.write_escaped(out, value, '\'', "''");
        out.push('\'');
    }

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
            ColumnType::Blob => "BLOB",
        });
    }

    fn write_placeholder(&self, out: &mut String, index: usize) {
        let _ = write!(out, "${}", index);
    }

    /// Bind `value` and print its placeholder.
    fn write_param(&self, query: &mut Query, value: Value) {
        let index = query.push_param(value);
        self.write_placeholder(&mut query.sql, index);
    }

    fn write_column_definition(&self, out: &mut String, column: &ColumnDef) {
        self.write_identifier_quoted(out, column.name);
        out.push(' ');
        self.write_column_type(out, column.column_type);
    }

    fn write_create_table<E: Entity>(&self, out: &mut String)
    where
        Self: Sized,
    {
        out.push_str("CREATE TABLE IF NOT EXISTS ");
        self.write_identifier_quoted(out, E::definition().name);
        out.push_str(" (\n");
        separated_by(
            out,
            E::columns(),
            |out, v| self.write_column_definition(out, v),
            ",\n",
        );
        out.push_str("\n);");
    }

    /// One `ADD COLUMN` clause per column, comma joined in the order given.
    fn write_alter_table_add_columns<'a, E, It>(&self, out: &mut String, columns: It)
    where
        Self: Sized,
        E: Entity,
        It: IntoIterator<Item = &'a ColumnDef>,
    {
        out.push_str("ALTER TABLE ");
        self.write_identifier_quoted(out, E::definition().name);
        out.push('\n');
        separated_by(
            out,
            columns,
            |out, v| {
                out.push_str("ADD COLUMN ");
                self.write_column_definition(out, v);
            },
            ",\n",
        );
        out.push(';');
    }

    fn write_add_primary_key<E: Entity>(&self, out: &mut String)
    where
        Self: Sized,
    {
        out.push_str("ALTER TABLE ");
        self.write_identifier_quoted(out, E::definition().name);
        out.push_str(" ADD PRIMARY KEY (");
        separated_by(
            out,
            E::definition().unwrap_primary_key(),
            |out, v| self.write_identifier_quoted(out, v),
            ", ",
        );
        out.push_str(");");
    }

    fn write_create_index<E: Entity>(&self, out: &mut String, columns: &[&str])
    where
        Self: Sized,
    {
        let entity = E::definition();
        out.push_str("CREATE INDEX IF NOT EXISTS ");
        self.write_identifier_quoted(out, &entity.index_name(columns));
        out.push_str(" ON ");
        self.write_identifier_quoted(out, entity.name);
        out.push_str(" (");
        separated_by(
            out,
            columns,
            |out, v| self.write_identifier_quoted(out, v),
            ", ",
        );
        out.push_str(");");
    }

    /// Catalog query returning `(table_name, column_name, data_type)` of a table.
    fn write_table_definition(&self, query: &mut Query, table: &str) {
        query
            .sql
            .push_str("SELECT table_name, column_name, data_type\nFROM information_schema.columns\nWHERE table_name = ");
        self.write_param(query, Value::Varchar(table.into()));
        query.sql.push(';');
    }

    fn write_list_tables(&self, out: &mut String) {
        out.push_str(
            "SELECT table_name\nFROM information_schema.tables\nWHERE table_schema = current_schema() AND table_type = 'BASE TABLE';",
        );
    }

    fn write_drop_table(&self, out: &mut String, table: &str) {
        out.push_str("DROP TABLE IF EXISTS ");
        self.write_identifier_quoted(out, table);
        out.push_str(" CASCADE;");
    }

    fn write_healthcheck(&self, out: &mut String) {
        out.push_str("SELECT NOW();");
    }

    /// Filtered, ordered and paginated `SELECT`, returns the row window requested.
    fn write_select<E: Entity>(
        &self,
        query: &mut Query,
        filters: &Filters,
        options: &FindOptions,
        transformer: &ValueTransformer,
    ) -> Result<Window>
    where
        Self: Sized,
    {
        let window = options.window()?;
        query.sql.push_str("SELECT * FROM ");
        self.write_identifier_quoted(&mut query.sql, E::definition().name);
        query.sql.push_str("\nWHERE ");
        let len = query.sql.len();
        self.write_select_predicates::<E>(query, filters, options, transformer)?;
        if query.sql.len() == len {
            query.sql.truncate(len - "\nWHERE ".len());
        }
        let clustering = E::definition().primary_key.clustering;
        if !clustering.is_empty() {
            query.sql.push_str("\nORDER BY ");
            separated_by(
                &mut query.sql,
                clustering,
                |out, v| {
                    let order = E::column(v).map(|c| c.options.order).unwrap_or_default();
                    self.write_identifier_quoted(out, v);
                    out.push(' ');
                    out.push_str(order.reversed().as_sql());
                },
                ", ",
            );
        }
        let _ = write!(
            query.sql,
            "\nLIMIT {} OFFSET {};",
            window.limit, window.offset
        );
        Ok(window)
    }

    /// Every predicate of a `find`, joined by `AND`. Writes nothing without predicates.
    fn write_select_predicates<E: Entity>(
        &self,
        query: &mut Query,
        filters: &Filters,
        options: &FindOptions,
        transformer: &ValueTransformer,
    ) -> Result<()>
    where
        Self: Sized,
    {
        const AND: &str = " AND ";
        for (name, filter) in filters.defined() {
            let column = column_of::<E>(name)?;
            self.write_identifier_quoted(&mut query.sql, column.name);
            match filter {
                Filter::Equal(value) => {
                    query.sql.push_str(" = ");
                    let value = transformer.encode(value, column.column_type)?;
                    self.write_param(query, value);
                }
                Filter::In(values) => {
                    query.sql.push_str(" IN (");
                    for (i, value) in values.iter().enumerate() {
                        if i > 0 {
                            query.sql.push_str(", ");
                        }
                        let value = transformer.encode(value, column.column_type)?;
                        self.write_param(query, value);
                    }
                    query.sql.push(')');
                }
            }
            query.sql.push_str(AND);
        }
        for (op, comparisons) in [
            ("<", &options.lt),
            ("<=", &options.lte),
            (">", &options.gt),
            (">=", &options.gte),
        ] {
            for (name, value) in comparisons {
                let column = column_of::<E>(name)?;
                self.write_identifier_quoted(&mut query.sql, column.name);
                let _ = write!(query.sql, " {} ", op);
                let value = transformer.encode(value, column.column_type)?;
                self.write_param(query, value);
                query.sql.push_str(AND);
            }
        }
        for (name, values) in options.r#in.iter().filter(|(_, v)| !v.is_empty()) {
            self.write_identifier_quoted(&mut query.sql, name);
            query.sql.push_str(" IN (");
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    query.sql.push_str(", ");
                }
                self.write_param(query, value.clone());
            }
            query.sql.push(')');
            query.sql.push_str(AND);
        }
        for (name, value) in &options.like {
            self.write_identifier_quoted(&mut query.sql, name);
            query.sql.push_str(" LIKE ");
            self.write_param(query, Value::Varchar(format!("%{}%", value)));
            query.sql.push_str(AND);
        }
        if query.sql.ends_with(AND) {
            query.sql.truncate(query.sql.len() - AND.len());
        }
        Ok(())
    }

    /// `INSERT` listing only the columns with a defined value.
    fn write_insert<E: Entity>(
        &self,
        query: &mut Query,
        entity: &E,
        transformer: &ValueTransformer,
    ) -> Result<()>
    where
        Self: Sized,
    {
        let fields = E::columns()
            .iter()
            .filter_map(|c| entity.get(c.name).map(|v| (c, v)))
            .collect::<Vec<_>>();
        let mut values = Vec::with_capacity(fields.len());
        for (column, value) in &fields {
            values.push(
                transformer
                    .encode(value, column.column_type)
                    .with_context_column(column)?,
            );
        }
        query.sql.push_str("INSERT INTO ");
        self.write_identifier_quoted(&mut query.sql, E::definition().name);
        query.sql.push_str(" (");
        separated_by(
            &mut query.sql,
            &fields,
            |out, (c, _)| self.write_identifier_quoted(out, c.name),
            ", ",
        );
        query.sql.push_str(") VALUES\n(");
        for (i, value) in values.into_iter().enumerate() {
            if i > 0 {
                query.sql.push_str(", ");
            }
            self.write_param(query, value);
        }
        query.sql.push_str(");");
        Ok(())
    }

    /// `UPDATE` of the defined non key columns, matched by primary key.
    ///
    /// Returns `false` and writes nothing when there is no column to set.
    fn write_update<E: Entity>(
        &self,
        query: &mut Query,
        entity: &E,
        transformer: &ValueTransformer,
    ) -> Result<bool>
    where
        Self: Sized,
    {
        let definition = E::definition();
        let mut set = Vec::new();
        for column in E::columns()
            .iter()
            .filter(|c| !definition.is_primary_key(c.name))
        {
            if let Some(value) = entity.get(column.name) {
                set.push((
                    column,
                    transformer
                        .encode(&value, column.column_type)
                        .with_context_column(column)?,
                ));
            }
        }
        if set.is_empty() {
            return Ok(false);
        }
        query.sql.push_str("UPDATE ");
        self.write_identifier_quoted(&mut query.sql, definition.name);
        query.sql.push_str("\nSET ");
        for (i, (column, value)) in set.into_iter().enumerate() {
            if i > 0 {
                query.sql.push_str(", ");
            }
            self.write_identifier_quoted(&mut query.sql, column.name);
            query.sql.push_str(" = ");
            self.write_param(query, value);
        }
        query.sql.push_str("\nWHERE ");
        self.write_primary_key_condition(query, entity, transformer)?;
        query.sql.push(';');
        Ok(true)
    }

    fn write_delete<E: Entity>(
        &self,
        query: &mut Query,
        entity: &E,
        transformer: &ValueTransformer,
    ) -> Result<()>
    where
        Self: Sized,
    {
        query.sql.push_str("DELETE FROM ");
        self.write_identifier_quoted(&mut query.sql, E::definition().name);
        query.sql.push_str("\nWHERE ");
        self.write_primary_key_condition(query, entity, transformer)?;
        query.sql.push(';');
        Ok(())
    }

    /// `pk1 = $n AND pk2 = $n+1 ..` in primary key order.
    fn write_primary_key_condition<E: Entity>(
        &self,
        query: &mut Query,
        entity: &E,
        transformer: &ValueTransformer,
    ) -> Result<()>
    where
        Self: Sized,
    {
        for (i, (name, value)) in entity.primary_key_values().into_iter().enumerate() {
            let column = column_of::<E>(name)?;
            let Some(value) = value.filter(|v| !v.is_null()) else {
                return Err(Error::msg(format!(
                    "Primary key column `{}` of `{}` has no value",
                    name,
                    E::definition().name
                )));
            };
            if i > 0 {
                query.sql.push_str(" AND ");
            }
            self.write_identifier_quoted(&mut query.sql, name);
            query.sql.push_str(" = ");
            let value = transformer
                .encode(&value, column.column_type)
                .with_context_column(column)?;
            self.write_param(query, value);
        }
        Ok(())
    }
}

trait ColumnContext<T> {
    fn with_context_column(self, column: &ColumnDef) -> Result<T>;
}

impl<T> ColumnContext<T> for Result<T> {
    fn with_context_column(self, column: &ColumnDef) -> Result<T> {
        self.map_err(|e| e.context(format!("While encoding column `{}`", column.name)))
    }
}

#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    pub fn new() -> Self {
        Self {}
    }
}

impl SqlWriter for GenericSqlWriter {}
