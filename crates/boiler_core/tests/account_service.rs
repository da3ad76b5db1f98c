use boiler_core::db::open_db_in_memory;
use boiler_core::{
    AccountService, Context, EmailsFilter, ErrorKind, RepoError, ServiceError, SqliteStorage,
    UsersFilter,
};
use rusqlite::Connection;

fn service(conn: &Connection) -> AccountService<SqliteStorage<'_>> {
    AccountService::new(SqliteStorage::try_new(conn).unwrap())
}

#[test]
fn add_user_trims_name_and_commits() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = Context::background();

    let user_id = service.add_user(&ctx, "  ada  ").unwrap();
    let user = service.get_user(&ctx, user_id).unwrap();

    assert_eq!(user.name, "ada");
    assert!(conn.is_autocommit());
}

#[test]
fn add_user_rejects_blank_name_without_touching_store() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = Context::background();

    let err = service.add_user(&ctx, "   ").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(err.public_message(), "empty name");
    assert!(service
        .filter_users(&ctx, &UsersFilter::default())
        .unwrap()
        .is_empty());
}

#[test]
fn get_user_maps_missing_and_invalid_ids() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = Context::background();

    let missing = service.get_user(&ctx, 7).unwrap_err();
    assert!(matches!(missing, ServiceError::UserNotFound(7)));
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let invalid = service.get_user(&ctx, 0).unwrap_err();
    assert_eq!(invalid.kind(), ErrorKind::InvalidInput);
}

#[test]
fn filter_users_resolves_ids_to_entities() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = Context::background();
    for name in ["a", "b", "c"] {
        service.add_user(&ctx, name).unwrap();
    }

    let users = service
        .filter_users(&ctx, &UsersFilter::with_limit(2))
        .unwrap();
    let names: Vec<_> = users.into_iter().map(|user| user.name).collect();
    assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn get_user_by_email_finds_owner() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = Context::background();
    let user_id = service.add_user(&ctx, "ada").unwrap();
    service.add_email(&ctx, user_id, "ada@example.com").unwrap();

    let owner = service
        .get_user_by_email(&ctx, " ada@example.com ")
        .unwrap();
    assert_eq!(owner.id, user_id);

    let err = service
        .get_user_by_email(&ctx, "bob@example.com")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn delete_user_twice_reports_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = Context::background();
    let user_id = service.add_user(&ctx, "ada").unwrap();

    service.delete_user(&ctx, user_id).unwrap();
    let err = service.delete_user(&ctx, user_id).unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Repo(RepoError::NotFound { op: "delete_user" })
    ));
    assert_eq!(err.public_message(), "not found");
    assert!(conn.is_autocommit());
}

#[test]
fn add_email_validates_address_and_owner() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = Context::background();
    let user_id = service.add_user(&ctx, "ada").unwrap();

    let bad_address = service.add_email(&ctx, user_id, "not-an-address").unwrap_err();
    assert_eq!(bad_address.public_message(), "invalid email address");

    let bad_owner = service.add_email(&ctx, 0, "ada@example.com").unwrap_err();
    assert_eq!(bad_owner.public_message(), "invalid user ID");

    let unknown_owner = service.add_email(&ctx, 99, "ada@example.com").unwrap_err();
    assert_eq!(unknown_owner.kind(), ErrorKind::Internal);
    assert_eq!(unknown_owner.public_message(), "service failed");
    assert!(conn.is_autocommit());
}

#[test]
fn duplicate_email_is_already_exists() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = Context::background();
    let ada = service.add_user(&ctx, "ada").unwrap();
    let bob = service.add_user(&ctx, "bob").unwrap();
    service.add_email(&ctx, ada, "ada@example.com").unwrap();

    let err = service.add_email(&ctx, bob, "ada@example.com").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    assert_eq!(err.public_message(), "already exists");
    let bob_emails = service
        .filter_emails(&ctx, &EmailsFilter::by_user(bob))
        .unwrap();
    assert!(bob_emails.is_empty());
}

#[test]
fn email_lifecycle_through_service() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = Context::background();
    let user_id = service.add_user(&ctx, "ada").unwrap();
    let email_id = service.add_email(&ctx, user_id, "ada@example.com").unwrap();

    let email = service.get_email(&ctx, email_id).unwrap();
    assert_eq!(email.user_id, user_id);

    service.delete_email(&ctx, email_id).unwrap();
    let err = service.get_email(&ctx, email_id).unwrap_err();
    assert!(matches!(err, ServiceError::EmailNotFound(id) if id == email_id));

    let again = service.delete_email(&ctx, email_id).unwrap_err();
    assert_eq!(again.kind(), ErrorKind::NotFound);
}

#[test]
fn cancelled_context_rolls_back_and_reports_cancelled() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = Context::background();
    ctx.cancel();

    let err = service.add_user(&ctx, "ada").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Cancelled);
    assert!(conn.is_autocommit());
    assert!(service
        .filter_users(&Context::background(), &UsersFilter::default())
        .unwrap()
        .is_empty());
}
