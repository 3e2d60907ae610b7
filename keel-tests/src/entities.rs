use keel::Entity;
use uuid::Uuid;

/// Tenant scoped record with a composite key, two global indexes and an encrypted column.
#[derive(Entity, Default, Clone, PartialEq, Debug)]
#[keel(
    name = "test_table",
    kind = "test_entity",
    primary_key = ((company_id), id),
    global_index = (company_id, parent_id),
    global_index = (company_id, is_in_trash)
)]
pub struct TestEntity {
    pub company_id: Option<Uuid>,
    #[keel(generator = "uuid")]
    pub id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub is_in_trash: bool,
    #[keel(type = "encoded_json")]
    pub tags: Vec<String>,
    pub added: Option<i64>,
}

/// Columns stored through the legacy logical types, keyed by a time based uuid.
#[derive(Entity, Default, Clone, PartialEq, Debug)]
#[keel(name = "legacy_record", primary_key = (id))]
pub struct LegacyRecord {
    #[keel(type = "timeuuid")]
    pub id: Option<Uuid>,
    #[keel(type = "legacy_boolean")]
    pub archived: bool,
    #[keel(type = "legacy_int")]
    pub revision: Option<i64>,
    #[keel(type = "timestamp", on_upsert = touch)]
    pub updated_at: Option<i64>,
    #[keel(type = "encoded_string")]
    pub note: Option<String>,
    #[keel(type = "json")]
    pub payload: Option<serde_json::Value>,
}

/// Stamps the current time in epoch milliseconds.
pub fn touch(_value: keel::Value) -> keel::Value {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|v| v.as_millis() as i64)
        .unwrap_or_default();
    keel::Value::Int64(now)
}

/// First revision of a table that later gains columns.
#[derive(Entity, Default, Clone, PartialEq, Debug)]
#[keel(name = "evolving_table", primary_key = (id))]
pub struct EvolvingV1 {
    #[keel(generator = "uuid")]
    pub id: Option<Uuid>,
    pub title: Option<String>,
}

/// Second revision of `evolving_table`.
#[derive(Entity, Default, Clone, PartialEq, Debug)]
#[keel(name = "evolving_table", primary_key = (id))]
pub struct EvolvingV2 {
    #[keel(generator = "uuid")]
    pub id: Option<Uuid>,
    pub title: Option<String>,
    pub score: Option<i64>,
    pub published: bool,
}
