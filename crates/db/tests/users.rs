use roadsign_db::models::user::CreateUser;
use roadsign_db::repositories::UserRepo;
use roadsign_db::DbPool;

fn new_user(username: &str) -> CreateUser {
    CreateUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_hash: "hash".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_and_find_user(pool: DbPool) {
    let created = UserRepo::create(&pool, &new_user("erin")).await.unwrap();
    assert_eq!(created.username, "erin");
    assert_eq!(created.created_at, created.updated_at);

    let by_id = UserRepo::find_by_id(&pool, created.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "erin@example.com");

    let by_name = UserRepo::find_by_username(&pool, "erin").await.unwrap().unwrap();
    assert_eq!(by_name.id, created.id);

    assert!(UserRepo::find_by_username(&pool, "Erin").await.unwrap().is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_username_is_rejected(pool: DbPool) {
    UserRepo::create(&pool, &new_user("frank")).await.unwrap();

    let err = UserRepo::create(&pool, &new_user("frank")).await.unwrap_err();
    let db_err = err.as_database_error().expect("should be a database error");
    assert!(db_err.is_unique_violation());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_missing_user_returns_false(pool: DbPool) {
    assert!(!UserRepo::delete(&pool, 42).await.unwrap());
}
