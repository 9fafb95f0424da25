use chrono::Utc;
use uuid::Uuid;

use crate::db;
use crate::dto::{LoginUserRequest, RegisterUserRequest};
use crate::errors::ApiError;
use crate::models::{User, UserPublic};
use crate::service::{auth, crypto};
use crate::DbPool;

pub async fn register(req: RegisterUserRequest, pool: &DbPool) -> Result<UserPublic, ApiError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();
    if username.is_empty() {
        return Err(ApiError::validation("username is required"));
    }
    if email.is_empty() {
        return Err(ApiError::validation("email is required"));
    }
    if req.password.is_empty() {
        return Err(ApiError::validation("password is required"));
    }

    let user = User {
        id: Uuid::new_v4(),
        username,
        email,
        password_hash: crypto::hash_password(&req.password),
        created_at: Utc::now(),
    };
    db::user::create(&user, pool).await?;
    Ok(user.into())
}

/// An unknown email and a wrong password yield the same error so the login
/// endpoint cannot be used to enumerate accounts.
pub async fn login(
    req: LoginUserRequest,
    jwt_secret: &str,
    pool: &DbPool,
) -> Result<String, ApiError> {
    let user = db::user::find_by_email(&req.email, pool)
        .await
        .map_err(|err| match err {
            ApiError::NotFound => ApiError::Unauthenticated,
            other => other,
        })?;
    if !crypto::verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::Unauthenticated);
    }
    auth::jwt::issue(user.id, jwt_secret)
}

pub async fn list_all(pool: &DbPool) -> Result<Vec<UserPublic>, ApiError> {
    let users = db::user::list_all(pool).await?;
    Ok(users.into_iter().map(UserPublic::from).collect())
}
