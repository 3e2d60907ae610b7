use crate::{LegacyRecord, TestEntity};
use keel::{Connection, Connector, DatabaseEvent, EntityManager, Filters, FindOptions, Value};
use uuid::Uuid;

pub async fn unit_of_work<C: Connection>(connector: &Connector<C>) {
    let company = Uuid::new_v4();
    let mut manager = EntityManager::<TestEntity, C>::new(connector);
    let mut events = manager.subscribe();

    // Keys are generated on persist
    let mut first = TestEntity {
        company_id: Some(company),
        tags: vec!["first".into()],
        ..Default::default()
    };
    let mut second = TestEntity {
        company_id: Some(company),
        added: Some(2),
        ..Default::default()
    };
    manager
        .persist(&mut first)
        .expect("Could not persist the first entity")
        .persist(&mut second)
        .expect("Could not persist the second entity");
    assert!(first.id.is_some());
    assert!(second.id.is_some());
    let report = manager.flush().await.expect("Could not flush");
    assert!(report.is_success());
    assert_eq!(report.inserted, [true, true]);
    assert_eq!(
        events.try_recv().expect("Saved inserts event"),
        DatabaseEvent::EntitiesSaved(vec![first.clone(), second.clone()])
    );
    assert_eq!(
        events.try_recv().expect("Saved updates event"),
        DatabaseEvent::EntitiesSaved(vec![])
    );
    assert_eq!(
        events.try_recv().expect("Removed event"),
        DatabaseEvent::EntitiesRemoved(vec![])
    );
    manager.reset();

    // Entities with a full key are updated
    first.is_in_trash = true;
    manager
        .persist(&mut first)
        .expect("Could not persist the first entity");
    let report = manager.flush().await.expect("Could not flush");
    assert_eq!(report.updated, [true]);
    manager.reset();
    let found = connector
        .find::<TestEntity>(
            &Filters::new().eq("company_id", company).eq("is_in_trash", true),
            &FindOptions::new(),
        )
        .await
        .expect("Could not find the trashed entity");
    assert_eq!(found.entities, [first.clone()]);

    // Partial removal by key
    manager
        .remove_partial([
            ("company_id", Value::Uuid(company)),
            ("id", second.id.map(Value::Uuid).unwrap_or_default()),
        ])
        .expect("Could not stage the removal");
    manager.remove(&first).expect("Could not stage the removal");
    let report = manager.flush().await.expect("Could not flush");
    assert_eq!(report.removed, [true, true]);
    manager.reset();
    let found = connector
        .find::<TestEntity>(&Filters::new().eq("company_id", company), &FindOptions::new())
        .await
        .expect("Could not find the entities");
    assert!(found.is_empty());

    // Hooks run on persist
    let mut records = EntityManager::<LegacyRecord, C>::new(connector);
    let mut record = LegacyRecord {
        note: Some("hooked".into()),
        ..Default::default()
    };
    records
        .persist(&mut record)
        .expect("Could not persist the record");
    assert!(record.id.is_some());
    assert!(record.updated_at.is_some_and(|v| v > 0));
    let report = records.flush().await.expect("Could not flush");
    assert!(report.is_success());
    let found = connector
        .find::<LegacyRecord>(&Filters::new().eq("id", record.id), &FindOptions::new())
        .await
        .expect("Could not find the record");
    assert_eq!(found.entities, [record]);
}
