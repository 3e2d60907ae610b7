use std::iter;

/// Primary key declaration: the partition group followed by the clustering columns.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrimaryKey {
    pub partition: &'static [&'static str],
    pub clustering: &'static [&'static str],
}

impl PrimaryKey {
    pub fn len(&self) -> usize {
        self.partition.len() + self.clustering.len()
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Table level descriptor of an entity.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityDef {
    /// Table name.
    pub name: &'static str,
    /// Type tag reported alongside query results.
    pub kind: &'static str,
    pub primary_key: PrimaryKey,
    pub global_indexes: &'static [&'static [&'static str]],
}

impl EntityDef {
    /// Storage names of the primary key columns, partition group first.
    ///
    /// Every statement that targets a single row builds its `WHERE` clause in this order.
    pub fn unwrap_primary_key(&self) -> impl ExactSizeIterator<Item = &'static str> + Clone {
        self.primary_key
            .partition
            .iter()
            .chain(self.primary_key.clustering.iter())
            .copied()
            .collect::<Vec<_>>()
            .into_iter()
    }

    pub fn is_primary_key(&self, column: &str) -> bool {
        self.unwrap_primary_key().any(|v| v == column)
    }

    /// Deterministic name of a global index, `index_<table>_<columns joined by _>`.
    pub fn index_name(&self, columns: &[&str]) -> String {
        iter::once("index")
            .chain(iter::once(self.name))
            .chain(columns.iter().copied())
            .collect::<Vec<_>>()
            .join("_")
    }
}
