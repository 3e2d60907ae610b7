use crate::{EvolvingV1, EvolvingV2, LegacyRecord, TestEntity};
use keel::{Connection, Connector, Entity};

pub async fn schema<C: Connection>(connector: &Connector<C>) {
    // Fresh tables
    assert!(
        connector
            .create_table::<TestEntity>()
            .await
            .expect("Could not create test_table"),
        "Creating test_table should fully succeed"
    );
    assert!(
        connector
            .create_table::<LegacyRecord>()
            .await
            .expect("Could not create legacy_record")
    );
    let columns = connector
        .get_table_definition(TestEntity::definition().name)
        .await
        .expect("Could not read the definition of test_table");
    for column in TestEntity::columns() {
        assert!(
            columns.iter().any(|v| v == column.name),
            "Column `{}` is missing from the live table",
            column.name
        );
    }

    // Creating again is idempotent
    assert!(
        connector
            .create_table::<TestEntity>()
            .await
            .expect("Could not create test_table twice")
    );
    let report = connector.alter_table_indexes::<TestEntity>().await;
    assert!(report.is_complete());
    assert_eq!(
        report.created,
        [
            "index_test_table_company_id_parent_id",
            "index_test_table_company_id_is_in_trash"
        ]
    );

    // A later revision adds its new columns to the existing table
    assert!(
        connector
            .create_table::<EvolvingV1>()
            .await
            .expect("Could not create evolving_table")
    );
    let columns = connector
        .get_table_definition("evolving_table")
        .await
        .expect("Could not read the definition of evolving_table");
    assert_eq!(columns.len(), 2);
    assert!(
        connector
            .create_table::<EvolvingV2>()
            .await
            .expect("Could not evolve evolving_table")
    );
    let mut columns = connector
        .get_table_definition("evolving_table")
        .await
        .expect("Could not read the definition of evolving_table");
    columns.sort();
    assert_eq!(columns, ["id", "published", "score", "title"]);

    // Unknown tables have no columns
    assert!(
        connector
            .get_table_definition("this_table_does_not_exist")
            .await
            .expect("Could not query the catalog")
            .is_empty()
    );
}
