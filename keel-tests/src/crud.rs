use crate::{LegacyRecord, TestEntity};
use keel::{
    Connection, Connector, Executor, Filters, FindOptions, Pagination, Query, UpsertAction, Value,
};
use uuid::Uuid;

pub async fn crud<C: Connection>(connector: &Connector<C>) {
    let company = Uuid::new_v4();
    let parent = Uuid::new_v4();
    let entities = (0..5)
        .map(|i| TestEntity {
            company_id: Some(company),
            id: Some(Uuid::new_v4()),
            parent_id: (i % 2 == 0).then_some(parent),
            is_in_trash: i == 4,
            tags: vec![format!("tag{i}"), "shared".into()],
            added: Some(1_000 + i),
        })
        .collect::<Vec<_>>();

    // Insert
    let result = connector
        .upsert(&entities, UpsertAction::Insert)
        .await
        .expect("Could not insert the entities");
    assert_eq!(result, [true; 5]);

    // Inserting an existing key fails only for that entity
    let fresh = TestEntity {
        company_id: Some(company),
        id: Some(Uuid::new_v4()),
        ..Default::default()
    };
    let result = connector
        .upsert(&[fresh.clone(), entities[0].clone()], UpsertAction::Insert)
        .await
        .expect("Could not insert the entities");
    assert_eq!(result, [true, false]);
    assert_eq!(
        connector
            .remove(&[fresh])
            .await
            .expect("Could not remove the fresh entity"),
        [true]
    );

    // Find by equality, encrypted tags come back decrypted
    let found = connector
        .find::<TestEntity>(
            &Filters::new().eq("company_id", company).eq("id", entities[3].id),
            &FindOptions::new(),
        )
        .await
        .expect("Could not find the entity");
    assert_eq!(found.kind, "test_entity");
    assert_eq!(found.entities, [entities[3].clone()]);
    assert_eq!(found.next_page, None);

    // Tags are not stored in clear
    let rows = connector
        .connection()
        .expect("Connected")
        .fetch_all(Query::from("SELECT tags FROM test_table"))
        .await
        .expect("Could not read the raw tags");
    assert_eq!(rows.len(), 5);
    for row in rows {
        let stored = row
            .get_column("tags")
            .and_then(Value::to_text)
            .expect("Stored tags");
        assert!(!stored.contains("shared"), "Tags stored in clear: {stored}");
    }

    // Undefined filters do not restrict the query
    let found = connector
        .find::<TestEntity>(
            &Filters::new()
                .eq("company_id", company)
                .optional("parent_id", None::<Uuid>),
            &FindOptions::new(),
        )
        .await
        .expect("Could not find the entities");
    assert_eq!(found.entities.len(), 5);

    // IN and boolean filters
    let found = connector
        .find::<TestEntity>(
            &Filters::new()
                .eq("company_id", company)
                .is_in("id", [entities[0].id, entities[1].id, entities[4].id])
                .eq("is_in_trash", false),
            &FindOptions::new(),
        )
        .await
        .expect("Could not find the entities");
    assert_eq!(found.entities.len(), 2);
    assert!(found.entities.iter().all(|v| !v.is_in_trash));

    // Comparisons
    let found = connector
        .find::<TestEntity>(
            &Filters::new().eq("company_id", company),
            &FindOptions::new().gte("added", 1_001).lt("added", 1_003),
        )
        .await
        .expect("Could not find the entities");
    let mut added = found
        .entities
        .iter()
        .filter_map(|v| v.added)
        .collect::<Vec<_>>();
    added.sort();
    assert_eq!(added, [1_001, 1_002]);

    // Pagination, clustering columns come back in descending order
    let mut ids = entities.iter().filter_map(|v| v.id).collect::<Vec<_>>();
    ids.sort();
    ids.reverse();
    let mut token = None;
    let mut pages = Vec::new();
    loop {
        let mut pagination = Pagination::new(2);
        if let Some(token) = token.take() {
            pagination = pagination.with_token(token);
        }
        let page = connector
            .find::<TestEntity>(
                &Filters::new().eq("company_id", company),
                &FindOptions::new().paginate(pagination),
            )
            .await
            .expect("Could not read the page");
        pages.push(page.entities.iter().filter_map(|v| v.id).collect::<Vec<_>>());
        match page.next_page {
            Some(v) => token = Some(v),
            None => break,
        }
    }
    assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), [2, 2, 1]);
    assert_eq!(pages.concat(), ids);

    // Invalid pagination is rejected before reaching the store
    assert!(
        connector
            .find::<TestEntity>(
                &Filters::new(),
                &FindOptions::new().paginate(Pagination::new(0)),
            )
            .await
            .is_err()
    );

    // Update
    let mut changed = entities[1].clone();
    changed.is_in_trash = true;
    changed.tags = vec!["changed".into()];
    let result = connector
        .upsert(&[changed.clone()], UpsertAction::Update)
        .await
        .expect("Could not update the entity");
    assert_eq!(result, [true]);
    let found = connector
        .find::<TestEntity>(
            &Filters::new().eq("company_id", company).eq("id", changed.id),
            &FindOptions::new(),
        )
        .await
        .expect("Could not find the updated entity");
    assert_eq!(found.entities, [changed]);

    // Updating a missing row reports false
    let ghost = TestEntity {
        company_id: Some(company),
        id: Some(Uuid::new_v4()),
        added: Some(1),
        ..Default::default()
    };
    assert_eq!(
        connector
            .upsert(&[ghost.clone()], UpsertAction::Update)
            .await
            .expect("Could not run the update"),
        [false]
    );

    // Remove
    let result = connector
        .remove(&[entities[0].clone(), ghost])
        .await
        .expect("Could not remove the entities");
    assert_eq!(result, [true, false]);
    let found = connector
        .find::<TestEntity>(&Filters::new().eq("company_id", company), &FindOptions::new())
        .await
        .expect("Could not find the entities");
    assert_eq!(found.entities.len(), 4);

    // Legacy types
    let record = LegacyRecord {
        id: Some(Uuid::now_v1(&[1, 2, 3, 4, 5, 6])),
        archived: true,
        revision: Some(7),
        updated_at: Some(1_700_000_000_000),
        note: Some("confidential".into()),
        payload: Some(serde_json::json!({ "a": [1, 2, 3] })),
    };
    assert_eq!(
        connector
            .upsert(&[record.clone()], UpsertAction::Insert)
            .await
            .expect("Could not insert the legacy record"),
        [true]
    );
    let found = connector
        .find::<LegacyRecord>(&Filters::new().eq("id", record.id), &FindOptions::new())
        .await
        .expect("Could not find the legacy record");
    assert_eq!(found.entities, [record]);
}
