#[cfg(test)]
mod tests {
    use keel::{
        ColumnType, Entity, Generator, Order, Value, check_entity, json_to_value, metadata,
    };
    use serde_json::json;
    use std::borrow::Cow;
    use uuid::Uuid;

    fn lowercase(value: Value) -> Value {
        match value {
            Value::Varchar(v) => Value::Varchar(v.to_lowercase()),
            v => v,
        }
    }

    #[derive(Entity, Default, Clone, PartialEq, Debug)]
    #[keel(
        name = "documents",
        primary_key = ((tenant, "region"), created, id),
        global_index = (tenant, status)
    )]
    struct Document {
        tenant: Option<Uuid>,
        #[keel(name = "region")]
        _region: String,
        #[keel(type = "timeuuid", order = "DESC")]
        created: Option<Uuid>,
        #[keel(generator = "number")]
        id: Option<i64>,
        #[keel(on_upsert = lowercase)]
        status: Cow<'static, str>,
        #[keel(type = "encoded_string")]
        secret: Option<String>,
        metadata: Option<serde_json::Value>,
        #[keel(type = "encoded_json")]
        labels: Vec<String>,
        archived: bool,
        score: f64,
        #[keel(ignore)]
        cache: Vec<u32>,
    }

    #[derive(Entity, Default, Clone, PartialEq, Debug)]
    #[keel(primary_key = (id))]
    struct UserProfile {
        id: Option<Uuid>,
        #[keel(type = "legacy_boolean")]
        active: bool,
    }

    #[test]
    fn table_definition() {
        let definition = Document::definition();
        assert_eq!(definition.name, "documents");
        assert_eq!(definition.kind, "Document");
        assert_eq!(definition.primary_key.partition, ["tenant", "region"]);
        assert_eq!(definition.primary_key.clustering, ["created", "id"]);
        assert_eq!(
            definition.unwrap_primary_key().collect::<Vec<_>>(),
            ["tenant", "region", "created", "id"]
        );
        assert_eq!(definition.global_indexes, [&["tenant", "status"][..]]);
        assert_eq!(
            definition.index_name(definition.global_indexes[0]),
            "index_documents_tenant_status"
        );
        assert!(check_entity::<Document>().is_ok());

        let definition = UserProfile::definition();
        assert_eq!(definition.name, "user_profile");
        assert_eq!(definition.kind, "UserProfile");
        assert!(definition.global_indexes.is_empty());
    }

    #[test]
    fn column_definitions() {
        let columns = Document::columns();
        assert_eq!(
            columns.iter().map(|c| c.name).collect::<Vec<_>>(),
            [
                "tenant", "region", "created", "id", "status", "secret", "metadata", "labels",
                "archived", "score"
            ]
        );
        assert_eq!(
            columns.iter().map(|c| c.column_type).collect::<Vec<_>>(),
            [
                ColumnType::Uuid,
                ColumnType::String,
                ColumnType::TimeUuid,
                ColumnType::Number,
                ColumnType::String,
                ColumnType::EncodedString,
                ColumnType::Json,
                ColumnType::EncodedJson,
                ColumnType::Boolean,
                ColumnType::Number,
            ]
        );
        let region = Document::column("region").expect("region");
        assert_eq!(region.field, "_region");
        let created = Document::column("created").expect("created");
        assert_eq!(created.options.order, Order::Desc);
        assert_eq!(created.generator(), Generator::TimeUuid);
        assert_eq!(Document::column("id").expect("id").generator(), Generator::Number);
        assert_eq!(
            Document::column("tenant").expect("tenant").generator(),
            Generator::Uuid
        );
        assert_eq!(region.generator(), Generator::Empty);
        assert!(Document::column("status").expect("status").options.on_upsert.is_some());
        assert!(Document::column("cache").is_none());
        assert_eq!(
            UserProfile::column("active").expect("active").column_type,
            ColumnType::LegacyBoolean
        );

        let metadata = metadata::<Document>();
        assert_eq!(metadata.columns.len(), 10);
        assert_eq!(metadata.entity.name, "documents");
        assert!(metadata.column("labels").is_some());
    }

    #[test]
    fn get_and_set() {
        let tenant = Uuid::new_v4();
        let mut document = Document {
            tenant: Some(tenant),
            _region: "eu".into(),
            status: "Draft".into(),
            labels: vec!["a".into(), "b".into()],
            metadata: Some(json!({ "pages": 3 })),
            archived: true,
            score: 1.5,
            ..Default::default()
        };
        assert_eq!(document.get("tenant"), Some(Value::Uuid(tenant)));
        assert_eq!(document.get("region"), Some(Value::Varchar("eu".into())));
        assert_eq!(document.get("created"), None);
        assert_eq!(document.get("secret"), None);
        assert_eq!(document.get("labels"), Some(json_to_value(&["a", "b"])));
        assert_eq!(document.get("metadata"), Some(Value::Json(json!({ "pages": 3 }))));
        assert_eq!(document.get("archived"), Some(Value::Boolean(true)));
        assert_eq!(document.get("score"), Some(Value::Float64(1.5)));
        assert_eq!(document.get("cache"), None);
        assert!(!document.has_primary_key());

        document.set("id", Value::Int64(9)).expect("Set id");
        document
            .set("created", Value::Varchar(tenant.to_string()))
            .expect("Set created");
        document
            .set("labels", Value::Varchar(r#"["c"]"#.into()))
            .expect("Set labels");
        assert_eq!(document.id, Some(9));
        assert_eq!(document.created, Some(tenant));
        assert_eq!(document.labels, ["c"]);
        assert!(document.has_primary_key());

        // Null resets optional fields and leaves required ones untouched
        document.set("id", Value::Null).expect("Set id");
        document.set("region", Value::Null).expect("Set region");
        assert_eq!(document.id, None);
        assert_eq!(document._region, "eu");

        assert!(document.set("cache", Value::Null).is_err());
        assert!(document.set("archived", Value::Varchar("maybe".into())).is_err());
        assert_eq!(
            document.primary_key_values(),
            [
                ("tenant", Some(Value::Uuid(tenant))),
                ("region", Some(Value::Varchar("eu".into()))),
                ("created", Some(Value::Uuid(tenant))),
                ("id", None),
            ]
        );
    }
}
