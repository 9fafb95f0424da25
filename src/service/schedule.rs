use uuid::Uuid;

use crate::db;
use crate::dto::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::errors::ApiError;
use crate::models::Schedule;
use crate::DbPool;

pub async fn create(
    mut req: CreateScheduleRequest,
    creator_id: Uuid,
    pool: &DbPool,
) -> Result<Schedule, ApiError> {
    req.title = req.title.trim().to_string();
    if req.title.is_empty() {
        return Err(ApiError::validation("title is required"));
    }
    db::schedule::create(&req, creator_id, pool).await
}

pub async fn get_by_id(id: Uuid, pool: &DbPool) -> Result<Schedule, ApiError> {
    db::schedule::find_by_id(id, pool).await
}

pub async fn list_by_owner(owner_id: Uuid, pool: &DbPool) -> Result<Vec<Schedule>, ApiError> {
    db::schedule::find_by_owner(owner_id, pool).await
}

pub async fn update(
    id: Uuid,
    req: UpdateScheduleRequest,
    user_id: Uuid,
    pool: &DbPool,
) -> Result<Schedule, ApiError> {
    db::schedule::update(id, &req, user_id, pool).await
}

pub async fn delete(id: Uuid, user_id: Uuid, pool: &DbPool) -> Result<(), ApiError> {
    db::schedule::delete(id, user_id, pool).await
}
