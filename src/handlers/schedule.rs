use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use uuid::Uuid;

use crate::dto::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::errors::ApiError;
use crate::service;
use crate::service::auth::AuthenticatedUser;
use crate::DbPool;

fn authenticated_user(req: &HttpRequest) -> Result<AuthenticatedUser, ApiError> {
    req.extensions()
        .get::<AuthenticatedUser>()
        .copied()
        .ok_or(ApiError::Unauthenticated)
}

pub async fn create(
    req: HttpRequest,
    body: web::Json<CreateScheduleRequest>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = authenticated_user(&req)?;
    let schedule = service::schedule::create(body.into_inner(), auth.user_id, pool.get_ref()).await?;
    Ok(HttpResponse::Created().json(schedule))
}

pub async fn get_by_id(
    schedule_id: web::Path<Uuid>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let schedule = service::schedule::get_by_id(schedule_id.into_inner(), pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(schedule))
}

pub async fn list_by_owner(
    owner_id: web::Path<Uuid>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let schedules = service::schedule::list_by_owner(owner_id.into_inner(), pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(schedules))
}

pub async fn update(
    req: HttpRequest,
    schedule_id: web::Path<Uuid>,
    body: web::Json<UpdateScheduleRequest>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = authenticated_user(&req)?;
    let schedule = service::schedule::update(
        schedule_id.into_inner(),
        body.into_inner(),
        auth.user_id,
        pool.get_ref(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(schedule))
}

pub async fn delete(
    req: HttpRequest,
    schedule_id: web::Path<Uuid>,
    pool: web::Data<DbPool>,
) -> Result<HttpResponse, ApiError> {
    let auth = authenticated_user(&req)?;
    service::schedule::delete(schedule_id.into_inner(), auth.user_id, pool.get_ref()).await?;
    Ok(HttpResponse::NoContent().finish())
}
