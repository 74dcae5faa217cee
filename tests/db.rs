use diesel::connection::SimpleConnection;

mod common;

#[test]
fn test_creates_and_removes_db_files() {
    let path = {
        let test_db = common::TestDb::new("test_creates_and_removes_db_files.db");
        let conn = test_db.pool().get();
        assert!(conn.is_ok());
        assert!(test_db.path().exists());
        test_db.path().clone()
    };
    assert!(!path.exists());
}

#[test]
fn test_foreign_keys_are_enforced() {
    let test_db = common::TestDb::new("test_foreign_keys_are_enforced.db");
    let mut conn = test_db.pool().get().unwrap();

    let result = conn.batch_execute(
        "INSERT INTO clients (tenant_id, name, is_active, created_at, updated_at)
         VALUES (999, 'Orphan', 1, '2025-01-01 00:00:00', '2025-01-01 00:00:00');",
    );

    assert!(result.is_err());
}
