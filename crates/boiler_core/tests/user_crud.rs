use boiler_core::db::open_db_in_memory;
use boiler_core::{
    Context, EmailRepository, RepoError, SqliteStorage, Storage, UserRepository, UsersFilter,
    FILTER_DEFAULT_LIMIT,
};

fn add_users(storage: &SqliteStorage<'_>, names: &[&str]) -> Vec<i64> {
    let ctx = Context::background();
    let tx = storage.begin().unwrap();
    let ids = names
        .iter()
        .map(|name| storage.add_user(&ctx, &tx, name).unwrap())
        .collect();
    tx.commit().unwrap();
    ids
}

#[test]
fn add_then_fetch_returns_stamped_user() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    let ctx = Context::background();

    let ids = add_users(&storage, &["ada"]);
    let users = storage.fetch_users(&ctx, &ids).unwrap();

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].id, ids[0]);
    assert_eq!(users[0].name, "ada");
    assert!(users[0].created_at > 0);
    assert!(users[0].updated_at > 0);
}

#[test]
fn add_user_is_invisible_after_rollback() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    let ctx = Context::background();

    let tx = storage.begin().unwrap();
    let user_id = storage.add_user(&ctx, &tx, "ghost").unwrap();
    tx.rollback().unwrap();

    assert!(storage.fetch_users(&ctx, &[user_id]).unwrap().is_empty());
}

#[test]
fn delete_user_succeeds_once_then_not_found() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    let ctx = Context::background();
    let ids = add_users(&storage, &["ada"]);

    let tx = storage.begin().unwrap();
    storage.delete_user(&ctx, &tx, ids[0]).unwrap();
    let err = storage.delete_user(&ctx, &tx, ids[0]).unwrap_err();
    tx.commit().unwrap();

    assert!(matches!(err, RepoError::NotFound { op: "delete_user" }));
}

#[test]
fn delete_missing_user_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    let ctx = Context::background();

    let tx = storage.begin().unwrap();
    let err = storage.delete_user(&ctx, &tx, 404).unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn fetch_users_with_no_ids_skips_the_store() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    // Any statement against the dropped tables would fail.
    conn.execute_batch("DROP TABLE emails; DROP TABLE users;")
        .unwrap();

    let users = storage.fetch_users(&Context::background(), &[]).unwrap();

    assert!(users.is_empty());
}

#[test]
fn fetch_users_follows_requested_id_order() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    let ids = add_users(&storage, &["a", "b", "c"]);

    let requested = [ids[2], 999, ids[0], ids[1]];
    let users = storage
        .fetch_users(&Context::background(), &requested)
        .unwrap();

    let names: Vec<_> = users.iter().map(|user| user.name.as_str()).collect();
    assert_eq!(names, vec!["c", "a", "b"]);
}

#[test]
fn fetch_users_fails_whole_call_on_malformed_row() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    let ids = add_users(&storage, &["good", "bad"]);
    conn.execute(
        "UPDATE users SET created_at = 'yesterday' WHERE id = ?1;",
        [ids[1]],
    )
    .unwrap();

    let err = storage
        .fetch_users(&Context::background(), &ids)
        .unwrap_err();

    assert!(matches!(err, RepoError::Scan { op: "fetch_users", .. }));
    assert!(err.to_string().contains("created_at"));
}

#[test]
fn filter_users_bounded_scan_respects_limit_and_default() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    let ctx = Context::background();
    let names: Vec<String> = (0..150).map(|n| format!("user-{n}")).collect();
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let ids = add_users(&storage, &names);

    let limited = storage
        .filter_users_id(&ctx, &UsersFilter::with_limit(3))
        .unwrap();
    assert_eq!(limited, ids[..3].to_vec());

    let defaulted = storage
        .filter_users_id(&ctx, &UsersFilter::default())
        .unwrap();
    assert_eq!(defaulted.len(), FILTER_DEFAULT_LIMIT as usize);
    assert_eq!(defaulted, ids[..100].to_vec());
}

#[test]
fn filter_users_with_empty_email_falls_back_to_scan() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    let ids = add_users(&storage, &["a", "b", "c"]);

    let filter = UsersFilter {
        email: Some(String::new()),
        limit: None,
    };
    let found = storage
        .filter_users_id(&Context::background(), &filter)
        .unwrap();

    assert_eq!(found, ids);
}

#[test]
fn fetch_users_accepts_large_id_lists() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    add_users(&storage, &["a", "b", "c"]);

    let requested: Vec<i64> = (1..=20_000).rev().collect();
    let users = storage
        .fetch_users(&Context::background(), &requested)
        .unwrap();

    let names: Vec<_> = users.iter().map(|user| user.name.as_str()).collect();
    assert_eq!(names, vec!["c", "b", "a"]);
}

#[test]
fn filter_users_by_email_returns_owner_only() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    let ctx = Context::background();
    let ids = add_users(&storage, &["ada", "bob"]);

    let tx = storage.begin().unwrap();
    storage
        .add_email(&ctx, &tx, ids[1], "bob@example.com")
        .unwrap();
    tx.commit().unwrap();

    let owners = storage
        .filter_users_id(&ctx, &UsersFilter::by_email("bob@example.com"))
        .unwrap();
    assert_eq!(owners, vec![ids[1]]);

    let nobody = storage
        .filter_users_id(&ctx, &UsersFilter::by_email("nobody@example.com"))
        .unwrap();
    assert!(nobody.is_empty());
}

#[test]
fn cancelled_context_blocks_writes_and_reads() {
    let conn = open_db_in_memory().unwrap();
    let storage = SqliteStorage::try_new(&conn).unwrap();
    let ctx = Context::background();
    ctx.cancel();

    let tx = storage.begin().unwrap();
    let write_err = storage.add_user(&ctx, &tx, "ada").unwrap_err();
    assert!(matches!(write_err, RepoError::Cancelled { op: "add_user", .. }));
    tx.rollback().unwrap();

    let read_err = storage
        .filter_users_id(&ctx, &UsersFilter::default())
        .unwrap_err();
    assert!(matches!(read_err, RepoError::Cancelled { .. }));
}
