use sqlx::error::ErrorKind;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::models::User;
use crate::DbPool;

pub async fn create(user: &User, pool: &DbPool) -> Result<(), ApiError> {
    let res = sqlx::query(
        "INSERT INTO users (id, username, email, password_hash, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.created_at)
    .execute(pool)
    .await;

    match res {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(db_err))
            if matches!(db_err.kind(), ErrorKind::UniqueViolation) =>
        {
            Err(ApiError::DuplicateCredential)
        }
        Err(err) => Err(ApiError::Storage(format!("insert user: {err}"))),
    }
}

pub async fn find_by_id(id: Uuid, pool: &DbPool) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound)
}

pub async fn find_by_email(email: &str, pool: &DbPool) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound)
}

pub async fn list_all(pool: &DbPool) -> Result<Vec<User>, ApiError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, created_at FROM users ORDER BY created_at ASC",
    )
    .fetch_all(pool)
    .await?;
    Ok(users)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::db;

    fn sample_user(username: &str, email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "0FA2".to_string(),
            created_at: Utc::now(),
        }
    }

    #[actix_rt::test]
    async fn duplicate_email_is_rejected_and_first_user_survives() {
        let pool = db::init_db_pool("sqlite::memory:").await.unwrap();
        let first = sample_user("alice", "alice@example.com");
        create(&first, &pool).await.unwrap();

        let second = sample_user("alice2", "alice@example.com");
        let err = create(&second, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::DuplicateCredential));

        let found = find_by_email("alice@example.com", &pool).await.unwrap();
        assert_eq!(found.id, first.id);
        assert_eq!(found.username, "alice");
    }

    #[actix_rt::test]
    async fn duplicate_username_is_rejected() {
        let pool = db::init_db_pool("sqlite::memory:").await.unwrap();
        create(&sample_user("bob", "bob@example.com"), &pool)
            .await
            .unwrap();
        let err = create(&sample_user("bob", "bob2@example.com"), &pool)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicateCredential));
    }

    #[actix_rt::test]
    async fn unknown_email_is_not_found() {
        let pool = db::init_db_pool("sqlite::memory:").await.unwrap();
        let err = find_by_email("ghost@example.com", &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[actix_rt::test]
    async fn list_all_returns_every_user() {
        let pool = db::init_db_pool("sqlite::memory:").await.unwrap();
        create(&sample_user("carol", "carol@example.com"), &pool)
            .await
            .unwrap();
        create(&sample_user("dave", "dave@example.com"), &pool)
            .await
            .unwrap();

        let users = list_all(&pool).await.unwrap();
        assert_eq!(users.len(), 2);
    }
}
