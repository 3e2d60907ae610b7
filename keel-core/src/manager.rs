use crate::{
    Connection, Connector, Entity, Result, UpsertAction, Value, check_entity, is_missing,
};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

/// Change notification published by [`EntityManager::flush`].
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseEvent<E> {
    EntitiesSaved(Vec<E>),
    EntitiesRemoved(Vec<E>),
}

/// Per entity outcome of each flush stage, in staging order.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct FlushReport {
    pub inserted: Vec<bool>,
    pub updated: Vec<bool>,
    pub removed: Vec<bool>,
}

impl FlushReport {
    pub fn is_success(&self) -> bool {
        self.inserted
            .iter()
            .chain(&self.updated)
            .chain(&self.removed)
            .all(|v| *v)
    }
}

/// Unit of work: stages inserts, updates and removals and flushes them together.
///
/// Staged entities are snapshots, later changes to the caller's value do not
/// affect a pending write until it is persisted again. Nothing is atomic across
/// statements, the [`FlushReport`] tells which writes succeeded.
pub struct EntityManager<'c, E: Entity, C: Connection> {
    connector: &'c Connector<C>,
    to_insert: Vec<E>,
    to_update: Vec<E>,
    to_remove: Vec<E>,
    subscribers: Vec<UnboundedSender<DatabaseEvent<E>>>,
}

impl<'c, E: Entity, C: Connection> EntityManager<'c, E, C> {
    pub fn new(connector: &'c Connector<C>) -> Self {
        Self {
            connector,
            to_insert: Vec::new(),
            to_update: Vec::new(),
            to_remove: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn connector(&self) -> &'c Connector<C> {
        self.connector
    }

    /// Receive the change notifications of every following flush.
    pub fn subscribe(&mut self) -> UnboundedReceiver<DatabaseEvent<E>> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Staged entities: inserts, updates and removals.
    pub fn pending(&self) -> (&[E], &[E], &[E]) {
        (&self.to_insert, &self.to_update, &self.to_remove)
    }

    /// Stage `entity` for writing.
    ///
    /// The `on_upsert` hooks are applied first. When a primary key column is
    /// missing, every missing one gets a generated value (written back into
    /// `entity`) and the entity is staged as an insert, otherwise as an update.
    /// An entity whose key matches a pending insert replaces that insert, unless
    /// the key holds an empty value.
    pub fn persist(&mut self, entity: &mut E) -> Result<&mut Self> {
        check_entity::<E>()?;
        for column in E::columns() {
            if let Some(hook) = column.options.on_upsert {
                let value = hook(entity.get(column.name).unwrap_or(Value::Null));
                entity.set(column.name, value)?;
            }
        }
        let missing = E::definition()
            .unwrap_primary_key()
            .filter(|name| is_missing(entity.get(name).as_ref()))
            .collect::<Vec<_>>();
        if missing.is_empty() {
            let key = key_of(entity);
            if let Some(pos) = self.to_insert.iter().position(|v| key_of(v) == key) {
                self.to_insert[pos] = entity.clone();
            } else {
                self.to_update.retain(|v| key_of(v) != key);
                self.to_update.push(entity.clone());
            }
        } else {
            for name in missing {
                let Some(column) = E::column(name) else {
                    continue;
                };
                let value = column.generator().generate();
                log::trace!("Generated {:?} for `{}`", value, name);
                entity.set(name, value)?;
            }
            // Empty generated keys do not identify an entity
            let key = key_of(entity);
            if !key.iter().any(|v| is_missing(v.as_ref())) {
                self.to_insert.retain(|v| key_of(v) != key);
            }
            self.to_insert.push(entity.clone());
        }
        Ok(self)
    }

    /// Stage `entity` for deletion.
    pub fn remove(&mut self, entity: &E) -> Result<&mut Self> {
        check_entity::<E>()?;
        if !self.to_remove.contains(entity) {
            self.to_remove.push(entity.clone());
        }
        Ok(self)
    }

    /// Stage a deletion from a partial set of column values merged onto a default entity.
    pub fn remove_partial<I, K>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut entity = E::default();
        for (column, value) in values {
            entity.set(column.as_ref(), value)?;
        }
        self.remove(&entity)
    }

    /// Publish the change events and write every staged entity.
    ///
    /// Stages run in sequence (inserts, updates, removals) and a failing stage
    /// does not prevent the following ones. The staged sets are kept, use
    /// [`EntityManager::reset`] to discard them.
    pub async fn flush(&mut self) -> Result<FlushReport> {
        dedup(&mut self.to_insert);
        dedup(&mut self.to_update);
        dedup(&mut self.to_remove);
        self.publish(DatabaseEvent::EntitiesSaved(self.to_insert.clone()));
        self.publish(DatabaseEvent::EntitiesSaved(self.to_update.clone()));
        self.publish(DatabaseEvent::EntitiesRemoved(self.to_remove.clone()));
        log::debug!(
            "Flushing `{}`: {} inserts, {} updates, {} removals",
            E::definition().name,
            self.to_insert.len(),
            self.to_update.len(),
            self.to_remove.len()
        );
        let inserted = self
            .connector
            .upsert(&self.to_insert, UpsertAction::Insert)
            .await;
        let updated = self
            .connector
            .upsert(&self.to_update, UpsertAction::Update)
            .await;
        let removed = self.connector.remove(&self.to_remove).await;
        Ok(FlushReport {
            inserted: inserted?,
            updated: updated?,
            removed: removed?,
        })
    }

    /// Discard every staged entity.
    pub fn reset(&mut self) {
        self.to_insert.clear();
        self.to_update.clear();
        self.to_remove.clear();
    }

    fn publish(&mut self, event: DatabaseEvent<E>) {
        self.subscribers.retain(|tx| match tx.send(event.clone()) {
            Ok(..) => true,
            Err(..) => {
                log::debug!("Dropping a closed change subscriber");
                false
            }
        });
    }
}

fn key_of<E: Entity>(entity: &E) -> Vec<Option<Value>> {
    entity
        .primary_key_values()
        .into_iter()
        .map(|(_, v)| v)
        .collect()
}

fn dedup<E: PartialEq>(entities: &mut Vec<E>) {
    let mut i = 0;
    while i < entities.len() {
        if entities[..i].contains(&entities[i]) {
            entities.remove(i);
        } else {
            i += 1;
        }
    }
}
