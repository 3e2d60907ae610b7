use crate::{ColumnDef, EntityDef, Error, Result, Value};

/// A typed record mapped to a storage table.
///
/// Implemented by `#[derive(Entity)]`, the implementation carries the static
/// table and column descriptors so nothing has to be discovered at runtime.
/// Column values are read and written through storage column names; a `None`
/// from [`Entity::get`] means the field is undefined (an unset optional
/// field), which is different from a defined `Value::Null`.
pub trait Entity: Default + Clone + PartialEq + Send + Sync + 'static {
    fn definition() -> &'static EntityDef;
    fn columns() -> &'static [ColumnDef];

    /// Current value of a column, `None` when undefined or unknown.
    fn get(&self, column: &str) -> Option<Value>;
    /// Assign a decoded value to a column. `Value::Null` resets optional fields.
    fn set(&mut self, column: &str, value: Value) -> Result<()>;

    /// Column descriptor by storage name.
    fn column(name: &str) -> Option<&'static ColumnDef> {
        Self::columns().iter().find(|v| v.name == name)
    }

    fn metadata() -> EntityMetadata {
        EntityMetadata {
            columns: Self::columns(),
            entity: Self::definition(),
        }
    }

    /// Primary key column names with their current values, in key order.
    fn primary_key_values(&self) -> Vec<(&'static str, Option<Value>)> {
        Self::definition()
            .unwrap_primary_key()
            .map(|name| (name, self.get(name)))
            .collect()
    }

    /// True when every primary key column carries a value.
    fn has_primary_key(&self) -> bool {
        self.primary_key_values()
            .iter()
            .all(|(_, v)| !is_missing(v.as_ref()))
    }
}

/// A key value that still has to be generated: undefined, null or an empty string.
pub fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Varchar(v)) => v.is_empty(),
        Some(..) => false,
    }
}

/// Resolved metadata of an entity type.
#[derive(Debug, Clone, Copy)]
pub struct EntityMetadata {
    pub columns: &'static [ColumnDef],
    pub entity: &'static EntityDef,
}

impl EntityMetadata {
    pub fn column(&self, name: &str) -> Option<&'static ColumnDef> {
        self.columns.iter().find(|v| v.name == name)
    }
}

pub fn metadata<E: Entity>() -> EntityMetadata {
    E::metadata()
}

/// Validate that every primary key and index column is declared.
pub fn check_entity<E: Entity>() -> Result<()> {
    let metadata = E::metadata();
    let entity = metadata.entity;
    if entity.primary_key.is_empty() {
        return Err(Error::msg(format!(
            "Entity `{}` does not declare a primary key",
            entity.name
        )));
    }
    for name in entity
        .unwrap_primary_key()
        .chain(entity.global_indexes.iter().flat_map(|v| v.iter().copied()))
    {
        if metadata.column(name).is_none() {
            return Err(Error::msg(format!(
                "Entity `{}` references the undeclared column `{}`",
                entity.name, name
            )));
        }
    }
    Ok(())
}
