use crate::{
    Connection, ConnectorConfig, Context, Driver, Entity, Error, Executor, Filters, FindOptions,
    ListResult, Query, Result, RowLabeled, SqlWriter, ValueTransformer, future::join_all,
    truncate_long,
};
use std::{fmt, mem, str::FromStr};

/// Kind of statement issued by [`Connector::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertAction {
    Insert,
    Update,
}

impl FromStr for UpsertAction {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "INSERT" => Ok(UpsertAction::Insert),
            "UPDATE" => Ok(UpsertAction::Update),
            _ => {
                let error = Error::msg(format!("Can't perform unknown operation `{s}`"));
                log::error!("{:#}", error);
                Err(error)
            }
        }
    }
}

impl fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UpsertAction::Insert => "INSERT",
            UpsertAction::Update => "UPDATE",
        })
    }
}

/// Outcome of the global index creation, every index is attempted.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct IndexReport {
    /// Names of the indexes created (or already present).
    pub created: Vec<String>,
    /// Names of the indexes that failed.
    pub failed: Vec<String>,
}

impl IndexReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub enum ConnectorState<C> {
    Disconnected,
    Connecting,
    Connected(C),
}

impl<C> fmt::Debug for ConnectorState<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectorState::Disconnected => "Disconnected",
            ConnectorState::Connecting => "Connecting",
            ConnectorState::Connected(..) => "Connected",
        })
    }
}

/// Owns the connection to a store and runs every statement of the ORM on it.
///
/// Schema maintenance (`create_table` and the `alter_table*` family) reports
/// failures as `false` after logging them, while per entity writes report a
/// boolean for each entity. Statement errors never abort a batch: callers must
/// look at the returned booleans to detect partial failures.
pub struct Connector<C: Connection> {
    config: ConnectorConfig,
    transformer: ValueTransformer,
    state: ConnectorState<C>,
}

impl<C: Connection> Connector<C> {
    pub fn new(config: ConnectorConfig) -> Self {
        Self {
            transformer: ValueTransformer::new(config.transform_options()),
            config,
            state: ConnectorState::Disconnected,
        }
    }

    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self::new(ConnectorConfig::from_url(url)?))
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    pub fn transformer(&self) -> &ValueTransformer {
        &self.transformer
    }

    pub fn state(&self) -> &ConnectorState<C> {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectorState::Connected(..))
    }

    /// The live connection.
    pub fn connection(&self) -> Result<&C> {
        match &self.state {
            ConnectorState::Connected(connection) => Ok(connection),
            state => Err(Error::msg(format!(
                "The connector is not connected (state: {:?})",
                state
            ))),
        }
    }

    fn writer(&self) -> Result<<C::Driver as Driver>::SqlWriter> {
        Ok(self.connection()?.driver().sql_writer())
    }

    /// Open the connection and check it, no-op when already connected.
    pub async fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        log::info!("Connecting to {}", <C::Driver as Driver>::NAME);
        self.state = ConnectorState::Connecting;
        let connection = match C::connect(&self.config.url).await {
            Ok(v) => v,
            Err(e) => {
                self.state = ConnectorState::Disconnected;
                let e = e.context(format!(
                    "While connecting to {}",
                    <C::Driver as Driver>::NAME
                ));
                log::error!("{:#}", e);
                return Err(e);
            }
        };
        self.attach(connection).await
    }

    pub async fn init(&mut self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        self.connect().await
    }

    /// Adopt an already open connection, it must pass the healthcheck.
    pub async fn attach(&mut self, connection: C) -> Result<()> {
        self.state = ConnectorState::Connecting;
        if let Err(e) = Self::check(&connection).await {
            self.state = ConnectorState::Disconnected;
            log::error!("{:#}", e);
            return Err(e);
        }
        log::info!("Connection to {} is healthy", <C::Driver as Driver>::NAME);
        self.state = ConnectorState::Connected(connection);
        Ok(())
    }

    /// Close the connection, the connector can be connected again afterwards.
    pub async fn disconnect(&mut self) -> Result<()> {
        match mem::replace(&mut self.state, ConnectorState::Disconnected) {
            ConnectorState::Connected(connection) => connection.disconnect().await,
            _ => Ok(()),
        }
    }

    /// Trivial round trip that must return exactly one row.
    pub async fn healthcheck(&self) -> Result<()> {
        Self::check(self.connection()?).await
    }

    async fn check(connection: &C) -> Result<()> {
        let mut sql = String::new();
        connection.driver().sql_writer().write_healthcheck(&mut sql);
        let rows = connection
            .fetch_all(sql.into())
            .await
            .context("The healthcheck query failed")?;
        if rows.len() != 1 {
            return Err(Error::msg(format!(
                "Connection error: the healthcheck returned {} rows instead of 1",
                rows.len()
            )));
        }
        Ok(())
    }

    /// Create the table of `E` and reconcile it with the declaration.
    ///
    /// Returns `Ok(false)` when the table could not be created, a column could
    /// not be added or an index failed. Introspection failures are errors.
    pub async fn create_table<E: Entity>(&self) -> Result<bool> {
        let connection = self.connection()?;
        let name = E::definition().name;
        let mut sql = String::new();
        self.writer()?.write_create_table::<E>(&mut sql);
        log::debug!("Creating table `{}`:\n{}", name, truncate_long!(sql));
        if let Err(e) = connection.execute(sql.into()).await {
            log::warn!("Cannot create the table `{}`: {:#}", name, e);
            return Ok(false);
        }
        let altered = self.alter_table::<E>().await?;
        self.alter_table_primary_key::<E>().await;
        let indexes = self.alter_table_indexes::<E>().await;
        Ok(altered && indexes.is_complete())
    }

    /// Add the declared columns missing from the live table, in declaration order.
    pub async fn alter_table<E: Entity>(&self) -> Result<bool> {
        let name = E::definition().name;
        let existing = self.get_table_definition(name).await?;
        if existing.is_empty() {
            return Ok(true);
        }
        let missing = E::columns()
            .iter()
            .filter(|c| !existing.iter().any(|v| v == c.name))
            .collect::<Vec<_>>();
        if missing.is_empty() {
            return Ok(true);
        }
        let mut sql = String::new();
        self.writer()?
            .write_alter_table_add_columns::<E, _>(&mut sql, missing);
        log::debug!("Altering table `{}`:\n{}", name, truncate_long!(sql));
        match self.connection()?.execute(sql.into()).await {
            Ok(..) => {
                log::info!("Table `{}` is altered", name);
                Ok(true)
            }
            Err(e) => {
                log::warn!("Cannot alter the table `{}`: {:#}", name, e);
                Ok(false)
            }
        }
    }

    /// Add the primary key constraint, failures (usually an existing key) are only logged.
    pub async fn alter_table_primary_key<E: Entity>(&self) -> bool {
        let name = E::definition().name;
        let result = async {
            let mut sql = String::new();
            self.writer()?.write_add_primary_key::<E>(&mut sql);
            log::debug!("{}", truncate_long!(sql));
            self.connection()?.execute(sql.into()).await
        }
        .await;
        match result {
            Ok(..) => true,
            Err(e) => {
                log::warn!("Cannot create the primary key of `{}`: {:#}", name, e);
                false
            }
        }
    }

    /// Create every global index, a failure does not stop the following ones.
    pub async fn alter_table_indexes<E: Entity>(&self) -> IndexReport {
        let definition = E::definition();
        let mut report = IndexReport::default();
        for columns in definition.global_indexes {
            let index = definition.index_name(columns);
            let result = async {
                let mut sql = String::new();
                self.writer()?.write_create_index::<E>(&mut sql, columns);
                log::debug!("Creating index `{}`:\n{}", index, truncate_long!(sql));
                self.connection()?.execute(sql.into()).await
            }
            .await;
            match result {
                Ok(..) => report.created.push(index),
                Err(e) => {
                    log::warn!("Cannot create the index `{}`: {:#}", index, e);
                    report.failed.push(index);
                }
            }
        }
        report
    }

    /// Storage column names of a live table, empty when the table does not exist.
    pub async fn get_table_definition(&self, name: &str) -> Result<Vec<String>> {
        let result = async {
            let mut query = Query::new();
            self.writer()?.write_table_definition(&mut query, name);
            let rows = self.connection()?.fetch_all(query).await?;
            rows.into_iter()
                .map(|row| match row.get_column("column_name") {
                    Some(v) => v
                        .to_text()
                        .ok_or_else(|| Error::msg("Unexpected null column_name")),
                    None => Err(Error::msg("The catalog row has no column_name")),
                })
                .collect::<Result<Vec<_>>>()
        }
        .await;
        result.map_err(|e| {
            let e = e.context(format!("While querying the definition of `{}`", name));
            log::warn!("{:#}", e);
            e
        })
    }

    /// One page of entities matching `filters` and `options`.
    pub async fn find<E: Entity>(
        &self,
        filters: &Filters,
        options: &FindOptions,
    ) -> Result<ListResult<E>> {
        let connection = self.connection()?;
        let mut query = Query::new();
        let window = self
            .writer()?
            .write_select::<E>(&mut query, filters, options, &self.transformer)?;
        log::debug!("{}", query);
        let context = format!("While fetching `{}`:\n{}", E::definition().name, query);
        let rows = connection.fetch_all(query).await.with_context(|| context.clone())?;
        let entities = rows
            .into_iter()
            .map(|row| self.row_to_entity::<E>(row))
            .collect::<Result<Vec<_>>>()
            .with_context(|| context.clone())?;
        Ok(ListResult {
            kind: E::definition().kind,
            next_page: window.next_page(entities.len()),
            entities,
        })
    }

    /// Materialize a result row, labels without a declared column are ignored.
    ///
    /// A stored value that does not fit its field leaves the field at its default.
    pub fn row_to_entity<E: Entity>(&self, row: RowLabeled) -> Result<E> {
        let mut entity = E::default();
        for (label, value) in row.labels.iter().zip(row.values.into_vec()) {
            let Some(column) = E::column(label) else {
                continue;
            };
            let value = self.transformer.decode(value, column.column_type);
            if let Err(e) = entity.set(column.name, value) {
                log::debug!(
                    "Keeping the default of `{}` in `{}`: {:#}",
                    column.name,
                    E::definition().name,
                    e
                );
            }
        }
        Ok(entity)
    }

    /// Delete each entity by primary key, `true` when at least one row was removed.
    pub async fn remove<E: Entity>(&self, entities: &[E]) -> Result<Vec<bool>> {
        let connection = self.connection()?;
        let writer = self.writer()?;
        let mut queries = Vec::with_capacity(entities.len());
        for entity in entities {
            let mut query = Query::new();
            writer.write_delete(&mut query, entity, &self.transformer)?;
            queries.push(query);
        }
        Ok(join_all(queries.into_iter().map(|query| async move {
            log::debug!("{}", query);
            let context = format!("While deleting:\n{}", query);
            match connection.execute(query).await {
                Ok(v) => v.rows_affected >= 1,
                Err(e) => {
                    log::error!("{:#}", e.context(context));
                    false
                }
            }
        }))
        .await)
    }

    /// Insert or update each entity with its own statement, concurrently.
    ///
    /// Encoding errors abort the call; statement failures become `false`.
    pub async fn upsert<E: Entity>(
        &self,
        entities: &[E],
        action: UpsertAction,
    ) -> Result<Vec<bool>> {
        if let [entity] = entities {
            return Ok(vec![self.upsert_one(entity, action).await?]);
        }
        join_all(entities.iter().map(|e| self.upsert_one(e, action)))
            .await
            .into_iter()
            .collect()
    }

    async fn upsert_one<E: Entity>(&self, entity: &E, action: UpsertAction) -> Result<bool> {
        let connection = self.connection()?;
        let writer = self.writer()?;
        let mut query = Query::new();
        match action {
            UpsertAction::Insert => writer.write_insert(&mut query, entity, &self.transformer)?,
            UpsertAction::Update => {
                if !writer.write_update(&mut query, entity, &self.transformer)? {
                    log::warn!(
                        "Nothing to update in `{}`, the entity only has primary key values",
                        E::definition().name
                    );
                    return Ok(false);
                }
            }
        }
        log::debug!("{}", query);
        let context = format!("While running {}:\n{}", action, query);
        Ok(match connection.execute(query).await {
            Ok(v) => v.rows_affected == 1,
            Err(e) => {
                log::error!("{:#}", e.context(context));
                false
            }
        })
    }

    /// Drop every table of the current schema. Destructive, meant for tests and resets.
    pub async fn drop(&self) -> Result<()> {
        let connection = self.connection()?;
        let writer = self.writer()?;
        let mut sql = String::new();
        writer.write_list_tables(&mut sql);
        let tables = connection
            .fetch_all(sql.into())
            .await
            .context("While listing the tables to drop")?;
        for row in tables {
            let Some(table) = row.get_column("table_name").and_then(|v| v.to_text()) else {
                continue;
            };
            let mut sql = String::new();
            writer.write_drop_table(&mut sql, &table);
            log::debug!("{}", sql);
            connection
                .execute(sql.into())
                .await
                .with_context(|| format!("While dropping the table `{}`", table))?;
        }
        Ok(())
    }
}
