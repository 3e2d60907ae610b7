#[cfg(test)]
mod tests {
    use indoc::indoc;
    use keel::{
        Entity, Filters, FindOptions, GenericSqlWriter, Pagination, Query, SqlWriter,
        TransformOptions, Value, ValueTransformer,
    };
    use uuid::Uuid;

    const WRITER: GenericSqlWriter = GenericSqlWriter;

    fn transformer() -> ValueTransformer {
        ValueTransformer::new(TransformOptions {
            secret: "sql-secret".into(),
            disable_salts: false,
        })
    }

    #[derive(Entity, Default, Clone, PartialEq, Debug)]
    #[keel(name = "my \"events\"", primary_key = ((stream), position))]
    struct Event {
        stream: String,
        #[keel(order = "DESC")]
        position: Option<i64>,
        #[keel(name = "payload data", type = "json")]
        payload: Option<serde_json::Value>,
        #[keel(type = "encoded_string")]
        author: Option<String>,
        #[keel(type = "blob")]
        raw: Option<Vec<u8>>,
    }

    #[derive(Entity, Default, Clone, PartialEq, Debug)]
    #[keel(primary_key = (id), global_index = (owner, id))]
    struct Flat {
        id: Option<Uuid>,
        owner: Option<String>,
        #[keel(type = "counter")]
        visits: Option<i64>,
    }

    #[test]
    fn escaping() {
        let mut out = String::new();
        WRITER.write_identifier_quoted(&mut out, r#"a"b""c"#);
        assert_eq!(out, r#""a""b""""c""#);
        out.clear();
        WRITER.write_value_string(&mut out, "it's");
        assert_eq!(out, "'it''s'");
        out.clear();
        WRITER.write_escaped(&mut out, "naïve", 'ï', "i");
        assert_eq!(out, "naive");
    }

    #[test]
    fn schema_statements() {
        let mut out = String::new();
        WRITER.write_create_table::<Event>(&mut out);
        assert_eq!(
            out,
            indoc! {r#"
                CREATE TABLE IF NOT EXISTS "my ""events""" (
                "stream" TEXT,
                "position" BIGINT,
                "payload data" TEXT,
                "author" TEXT,
                "raw" BLOB
                );
            "#}
            .trim()
        );

        out.clear();
        WRITER.write_alter_table_add_columns::<Event, _>(&mut out, &Event::columns()[3..]);
        assert_eq!(
            out,
            indoc! {r#"
                ALTER TABLE "my ""events"""
                ADD COLUMN "author" TEXT,
                ADD COLUMN "raw" BLOB;
            "#}
            .trim()
        );

        out.clear();
        WRITER.write_add_primary_key::<Event>(&mut out);
        assert_eq!(
            out,
            r#"ALTER TABLE "my ""events""" ADD PRIMARY KEY ("stream", "position");"#
        );

        out.clear();
        WRITER.write_create_index::<Flat>(&mut out, Flat::definition().global_indexes[0]);
        assert_eq!(
            out,
            r#"CREATE INDEX IF NOT EXISTS "index_flat_owner_id" ON "flat" ("owner", "id");"#
        );

        out.clear();
        WRITER.write_drop_table(&mut out, "flat");
        assert_eq!(out, r#"DROP TABLE IF EXISTS "flat" CASCADE;"#);

        out.clear();
        WRITER.write_healthcheck(&mut out);
        assert_eq!(out, "SELECT NOW();");
    }

    #[test]
    fn select_ordering() {
        let transformer = transformer();
        let mut query = Query::new();
        let window = WRITER
            .write_select::<Event>(
                &mut query,
                &Filters::new().eq("stream", "orders"),
                &FindOptions::new().paginate(Pagination::new(25).with_token("50")),
                &transformer,
            )
            .expect("Could not write the select");
        assert_eq!(window.limit, 25);
        assert_eq!(window.offset, 50);
        assert_eq!(window.next_page(25).as_deref(), Some("75"));
        assert_eq!(window.next_page(24), None);
        assert_eq!(
            query.sql,
            indoc! {r#"
                SELECT * FROM "my ""events"""
                WHERE "stream" = $1
                ORDER BY "position" ASC
                LIMIT 25 OFFSET 50;
            "#}
            .trim()
        );
        assert_eq!(query.params, [Value::Varchar("orders".into())]);

        let mut query = Query::new();
        WRITER
            .write_select::<Flat>(
                &mut query,
                &Filters::new().is_in("owner", Vec::<String>::new()),
                &FindOptions::new().is_in("visits", Vec::<i64>::new()),
                &transformer,
            )
            .expect("Could not write the select");
        assert_eq!(
            query.sql,
            indoc! {r#"
                SELECT * FROM "flat"
                LIMIT 100 OFFSET 0;
            "#}
            .trim()
        );
        assert!(query.params.is_empty());
    }

    #[test]
    fn write_statements() {
        let transformer = transformer();
        let event = Event {
            stream: "orders".into(),
            position: Some(12),
            payload: Some(serde_json::json!({ "total": 10 })),
            author: Some("mara".into()),
            raw: None,
        };

        let mut query = Query::new();
        WRITER
            .write_insert(&mut query, &event, &transformer)
            .expect("Could not write the insert");
        assert_eq!(
            query.sql,
            indoc! {r#"
                INSERT INTO "my ""events""" ("stream", "position", "payload data", "author") VALUES
                ($1, $2, $3, $4);
            "#}
            .trim()
        );
        assert_eq!(query.params[1], Value::Int64(12));
        assert_eq!(query.params[2], Value::Varchar(r#"{"total":10}"#.into()));
        assert_ne!(query.params[3], Value::Varchar("mara".into()));

        let mut query = Query::new();
        assert!(
            WRITER
                .write_update(&mut query, &event, &transformer)
                .expect("Could not write the update")
        );
        assert_eq!(
            query.sql,
            indoc! {r#"
                UPDATE "my ""events"""
                SET "payload data" = $1, "author" = $2
                WHERE "stream" = $3 AND "position" = $4;
            "#}
            .trim()
        );

        // Nothing but the key
        let mut query = Query::new();
        let keys = Event {
            stream: "orders".into(),
            position: Some(12),
            ..Default::default()
        };
        assert!(
            !WRITER
                .write_update(&mut query, &keys, &transformer)
                .expect("Could not write the update")
        );
        assert!(query.is_empty());

        let mut query = Query::new();
        WRITER
            .write_delete(&mut query, &keys, &transformer)
            .expect("Could not write the delete");
        assert_eq!(
            query.sql,
            indoc! {r#"
                DELETE FROM "my ""events"""
                WHERE "stream" = $1 AND "position" = $2;
            "#}
            .trim()
        );
        assert_eq!(
            query.params,
            [Value::Varchar("orders".into()), Value::Int64(12)]
        );
    }

    #[test]
    fn unsupported_columns() {
        let transformer = transformer();
        let event = Event {
            stream: "orders".into(),
            position: Some(1),
            raw: Some(vec![1, 2, 3]),
            ..Default::default()
        };
        assert!(
            WRITER
                .write_insert(&mut Query::new(), &event, &transformer)
                .is_err()
        );
        let flat = Flat {
            id: Some(Uuid::new_v4()),
            visits: Some(3),
            ..Default::default()
        };
        assert!(
            WRITER
                .write_update(&mut Query::new(), &flat, &transformer)
                .is_err()
        );
        let keyless = Flat::default();
        assert!(
            WRITER
                .write_delete(&mut Query::new(), &keyless, &transformer)
                .is_err()
        );
    }
}
