use larabasex::db::ping;

mod common;

#[test]
fn test_creates_and_migrates_db_file() {
    let test_db = common::TestDb::new("test_creates_and_migrates_db_file.db");
    assert!(test_db.pool().get().is_ok());
    assert!(test_db.path().exists());
    assert_eq!(ping(&test_db.pool()), Ok(()));
}
