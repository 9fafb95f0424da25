use actix_web::{web, HttpResponse};

use crate::config::Config;
use crate::dto::{LoginUserRequest, RegisterUserRequest, TokenResponse};
use crate::errors::ApiError;
use crate::service;
use crate::DbPool;

pub async fn register(
    body: web::Json<RegisterUserRequest>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let user = service::user::register(body.into_inner(), pool.get_ref()).await?;
    Ok(HttpResponse::Created().json(user))
}

pub async fn login(
    body: web::Json<LoginUserRequest>,
    pool: web::Data<DbPool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, ApiError> {
    let token =
        service::user::login(body.into_inner(), &config.jwt_secret, pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(TokenResponse { token }))
}

pub async fn list_all(pool: web::Data<DbPool>) -> Result<HttpResponse, ApiError> {
    let users = service::user::list_all(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(users))
}
