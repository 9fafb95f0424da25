use chrono::Utc;
use log::error;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::dto::{CreateScheduleRequest, UpdateScheduleRequest};
use crate::errors::ApiError;
use crate::models::{Schedule, UserPublic};
use crate::DbPool;

/// Inserts the schedule row and one participation row per requested
/// participant inside a single transaction; any failure (including a
/// foreign-key violation on a bogus owner or participant) rolls the whole
/// operation back. Returns the re-read schedule with resolved participants.
pub async fn create(
    req: &CreateScheduleRequest,
    creator_id: Uuid,
    pool: &DbPool,
) -> Result<Schedule, ApiError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|err| ApiError::Storage(format!("begin create transaction: {err}")))?;

    let id = Uuid::new_v4();
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO schedules
             (id, title, start_time, end_time, description, location,
              owner_id, creator_id, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(&req.title)
    .bind(req.start_time)
    .bind(req.end_time)
    .bind(&req.description)
    .bind(&req.location)
    .bind(req.owner_id)
    .bind(creator_id)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(|err| ApiError::Storage(format!("insert schedule: {err}")))?;

    for user_id in &req.participant_ids {
        sqlx::query("INSERT INTO schedule_participants (schedule_id, user_id) VALUES (?, ?)")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| ApiError::Storage(format!("insert participant {user_id}: {err}")))?;
    }

    tx.commit()
        .await
        .map_err(|err| ApiError::Storage(format!("commit create transaction: {err}")))?;

    find_by_id(id, pool).await
}

pub async fn find_by_id(id: Uuid, pool: &DbPool) -> Result<Schedule, ApiError> {
    let mut schedule = sqlx::query_as::<_, Schedule>(
        "SELECT id, title, start_time, end_time, description, location,
                owner_id, creator_id, created_at, updated_at
         FROM schedules WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(ApiError::NotFound)?;

    schedule.participants = find_participants(id, pool).await?;
    Ok(schedule)
}

/// All schedules filed under the owner's calendar, ascending by start time.
/// Participant resolution is best-effort per schedule: a failure is logged
/// and the affected schedule is returned with an empty participant list
/// rather than aborting the whole listing.
pub async fn find_by_owner(owner_id: Uuid, pool: &DbPool) -> Result<Vec<Schedule>, ApiError> {
    let mut schedules = sqlx::query_as::<_, Schedule>(
        "SELECT id, title, start_time, end_time, description, location,
                owner_id, creator_id, created_at, updated_at
         FROM schedules WHERE owner_id = ? ORDER BY start_time ASC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;

    for schedule in &mut schedules {
        match find_participants(schedule.id, pool).await {
            Ok(participants) => schedule.participants = participants,
            Err(err) => {
                error!(
                    "could not fetch participants for schedule {}: {err}",
                    schedule.id
                );
            }
        }
    }
    Ok(schedules)
}

async fn find_participants(schedule_id: Uuid, pool: &DbPool) -> Result<Vec<UserPublic>, ApiError> {
    let participants = sqlx::query_as::<_, UserPublic>(
        "SELECT u.id, u.username, u.email, u.created_at
         FROM users u
         JOIN schedule_participants sp ON sp.user_id = u.id
         WHERE sp.schedule_id = ?
         ORDER BY u.created_at ASC",
    )
    .bind(schedule_id)
    .fetch_all(pool)
    .await?;
    Ok(participants)
}

/// Applies only the fields present in the request. The creator check, the
/// dynamic column update and the full participant replacement all run in one
/// transaction; `updated_at` is bumped whenever a scalar field is present.
/// A request carrying nothing is a no-op that still succeeds.
pub async fn update(
    id: Uuid,
    req: &UpdateScheduleRequest,
    user_id: Uuid,
    pool: &DbPool,
) -> Result<Schedule, ApiError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|err| ApiError::Storage(format!("begin update transaction: {err}")))?;

    let creator_id: Uuid = sqlx::query_scalar("SELECT creator_id FROM schedules WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| ApiError::Storage(format!("query creator for update: {err}")))?
        .ok_or(ApiError::NotFound)?;
    if creator_id != user_id {
        // Dropping the transaction rolls it back.
        return Err(ApiError::NotAuthorized);
    }

    if req.has_scalar_fields() {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE schedules SET ");
        let mut fields = builder.separated(", ");
        if let Some(title) = &req.title {
            fields.push("title = ");
            fields.push_bind_unseparated(title.clone());
        }
        if let Some(start_time) = req.start_time {
            fields.push("start_time = ");
            fields.push_bind_unseparated(start_time);
        }
        if let Some(end_time) = req.end_time {
            fields.push("end_time = ");
            fields.push_bind_unseparated(end_time);
        }
        if let Some(description) = &req.description {
            fields.push("description = ");
            fields.push_bind_unseparated(description.clone());
        }
        if let Some(location) = &req.location {
            fields.push("location = ");
            fields.push_bind_unseparated(location.clone());
        }
        fields.push("updated_at = ");
        fields.push_bind_unseparated(Utc::now());
        builder.push(" WHERE id = ");
        builder.push_bind(id);

        builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|err| ApiError::Storage(format!("update schedule: {err}")))?;
    }

    // Present participant set (even an empty one) replaces the previous
    // associations wholesale; an absent set leaves them untouched.
    if let Some(participant_ids) = &req.participant_ids {
        sqlx::query("DELETE FROM schedule_participants WHERE schedule_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|err| ApiError::Storage(format!("clear participants: {err}")))?;
        for user_id in participant_ids {
            sqlx::query("INSERT INTO schedule_participants (schedule_id, user_id) VALUES (?, ?)")
                .bind(id)
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|err| {
                    ApiError::Storage(format!("insert participant {user_id} for update: {err}"))
                })?;
        }
    }

    tx.commit()
        .await
        .map_err(|err| ApiError::Storage(format!("commit update transaction: {err}")))?;

    find_by_id(id, pool).await
}

/// Creator-only delete; removes the participation rows and the schedule row
/// in one transaction. Zero rows affected after the authorization check means
/// a concurrent delete won the race, reported as `NotFound`.
pub async fn delete(id: Uuid, user_id: Uuid, pool: &DbPool) -> Result<(), ApiError> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|err| ApiError::Storage(format!("begin delete transaction: {err}")))?;

    let creator_id: Uuid = sqlx::query_scalar("SELECT creator_id FROM schedules WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|err| ApiError::Storage(format!("query creator for delete: {err}")))?
        .ok_or(ApiError::NotFound)?;
    if creator_id != user_id {
        return Err(ApiError::NotAuthorized);
    }

    sqlx::query("DELETE FROM schedule_participants WHERE schedule_id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|err| ApiError::Storage(format!("delete participants: {err}")))?;

    let result = sqlx::query("DELETE FROM schedules WHERE id = ?")
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|err| ApiError::Storage(format!("delete schedule: {err}")))?;
    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound);
    }

    tx.commit()
        .await
        .map_err(|err| ApiError::Storage(format!("commit delete transaction: {err}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::db;
    use crate::models::User;

    async fn test_pool() -> DbPool {
        db::init_db_pool("sqlite::memory:").await.unwrap()
    }

    async fn insert_user(pool: &DbPool, username: &str) -> Uuid {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "AB12".to_string(),
            created_at: Utc::now(),
        };
        db::user::create(&user, pool).await.unwrap();
        user.id
    }

    fn create_request(owner_id: Uuid, participant_ids: Vec<Uuid>) -> CreateScheduleRequest {
        let start = Utc::now() + Duration::hours(1);
        CreateScheduleRequest {
            title: "Team sync".to_string(),
            start_time: start,
            end_time: start + Duration::hours(1),
            description: Some("weekly".to_string()),
            location: Some("room 4".to_string()),
            owner_id,
            participant_ids,
        }
    }

    #[actix_rt::test]
    async fn create_resolves_participants_to_full_identity() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;
        let owner = insert_user(&pool, "owner").await;
        let guest = insert_user(&pool, "guest").await;

        let schedule = create(&create_request(owner, vec![owner, guest]), creator, &pool)
            .await
            .unwrap();

        assert_eq!(schedule.creator_id, creator);
        assert_eq!(schedule.owner_id, owner);
        assert_eq!(schedule.participants.len(), 2);
        let usernames: Vec<&str> = schedule
            .participants
            .iter()
            .map(|p| p.username.as_str())
            .collect();
        assert!(usernames.contains(&"owner"));
        assert!(usernames.contains(&"guest"));
        for participant in &schedule.participants {
            assert!(!participant.email.is_empty());
        }
    }

    #[actix_rt::test]
    async fn create_with_unknown_participant_leaves_nothing_behind() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;
        let owner = insert_user(&pool, "owner").await;

        let bogus = Uuid::new_v4();
        let err = create(&create_request(owner, vec![bogus]), creator, &pool)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Storage(_)));

        let schedules = find_by_owner(owner, &pool).await.unwrap();
        assert!(schedules.is_empty());
    }

    #[actix_rt::test]
    async fn find_by_id_without_participants_returns_empty_list() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;

        let created = create(&create_request(creator, vec![]), creator, &pool)
            .await
            .unwrap();
        let fetched = find_by_id(created.id, &pool).await.unwrap();
        assert!(fetched.participants.is_empty());
    }

    #[actix_rt::test]
    async fn find_by_owner_orders_by_start_time() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;

        let mut late = create_request(creator, vec![]);
        late.title = "late".to_string();
        late.start_time = Utc::now() + Duration::days(2);
        let mut early = create_request(creator, vec![]);
        early.title = "early".to_string();
        early.start_time = Utc::now() + Duration::hours(1);

        create(&late, creator, &pool).await.unwrap();
        create(&early, creator, &pool).await.unwrap();

        let schedules = find_by_owner(creator, &pool).await.unwrap();
        let titles: Vec<&str> = schedules.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["early", "late"]);
    }

    #[actix_rt::test]
    async fn find_by_owner_survives_participant_resolution_failure() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;
        let guest = insert_user(&pool, "guest").await;

        create(&create_request(creator, vec![guest]), creator, &pool)
            .await
            .unwrap();

        // Break participant resolution out from under the listing.
        sqlx::query("DROP TABLE schedule_participants")
            .execute(&pool)
            .await
            .unwrap();

        let schedules = find_by_owner(creator, &pool).await.unwrap();
        assert_eq!(schedules.len(), 1);
        assert!(schedules[0].participants.is_empty());
    }

    #[actix_rt::test]
    async fn update_title_only_leaves_other_fields_untouched() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;
        let guest = insert_user(&pool, "guest").await;

        let created = create(&create_request(creator, vec![guest]), creator, &pool)
            .await
            .unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        let req = UpdateScheduleRequest {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        let updated = update(created.id, &req, creator, &pool).await.unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.start_time, created.start_time);
        assert_eq!(updated.end_time, created.end_time);
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.location, created.location);
        assert_eq!(updated.owner_id, created.owner_id);
        assert_eq!(updated.participants, created.participants);
        assert!(updated.updated_at > created.updated_at);
    }

    #[actix_rt::test]
    async fn empty_participant_list_clears_associations() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;
        let guest = insert_user(&pool, "guest").await;

        let created = create(&create_request(creator, vec![guest]), creator, &pool)
            .await
            .unwrap();
        assert_eq!(created.participants.len(), 1);

        let req = UpdateScheduleRequest {
            participant_ids: Some(vec![]),
            ..Default::default()
        };
        let updated = update(created.id, &req, creator, &pool).await.unwrap();
        assert!(updated.participants.is_empty());
    }

    #[actix_rt::test]
    async fn present_participant_list_replaces_rather_than_merges() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;
        let first = insert_user(&pool, "first").await;
        let second = insert_user(&pool, "second").await;

        let created = create(&create_request(creator, vec![first]), creator, &pool)
            .await
            .unwrap();

        let req = UpdateScheduleRequest {
            participant_ids: Some(vec![second]),
            ..Default::default()
        };
        let updated = update(created.id, &req, creator, &pool).await.unwrap();
        assert_eq!(updated.participants.len(), 1);
        assert_eq!(updated.participants[0].id, second);
    }

    #[actix_rt::test]
    async fn empty_update_is_a_successful_no_op() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;

        let created = create(&create_request(creator, vec![]), creator, &pool)
            .await
            .unwrap();
        let updated = update(created.id, &UpdateScheduleRequest::default(), creator, &pool)
            .await
            .unwrap();

        assert_eq!(updated.title, created.title);
        assert_eq!(updated.updated_at, created.updated_at);
    }

    #[actix_rt::test]
    async fn non_creator_cannot_update_even_as_owner_and_participant() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;
        let owner = insert_user(&pool, "owner").await;

        let created = create(&create_request(owner, vec![owner]), creator, &pool)
            .await
            .unwrap();

        let req = UpdateScheduleRequest {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };
        let err = update(created.id, &req, owner, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthorized));

        let unchanged = find_by_id(created.id, &pool).await.unwrap();
        assert_eq!(unchanged.title, created.title);
    }

    #[actix_rt::test]
    async fn non_creator_cannot_delete() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;
        let owner = insert_user(&pool, "owner").await;

        let created = create(&create_request(owner, vec![]), creator, &pool)
            .await
            .unwrap();
        let err = delete(created.id, owner, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::NotAuthorized));
        assert!(find_by_id(created.id, &pool).await.is_ok());
    }

    #[actix_rt::test]
    async fn delete_removes_schedule_and_participations() {
        let pool = test_pool().await;
        let creator = insert_user(&pool, "creator").await;
        let guest = insert_user(&pool, "guest").await;

        let created = create(&create_request(creator, vec![guest]), creator, &pool)
            .await
            .unwrap();
        delete(created.id, creator, &pool).await.unwrap();

        let err = find_by_id(created.id, &pool).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));

        let orphaned: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM schedule_participants WHERE schedule_id = ?")
                .bind(created.id)
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(orphaned, 0);
    }

    #[actix_rt::test]
    async fn operations_on_missing_schedule_return_not_found() {
        let pool = test_pool().await;
        let user = insert_user(&pool, "user").await;
        let missing = Uuid::new_v4();

        assert!(matches!(
            find_by_id(missing, &pool).await.unwrap_err(),
            ApiError::NotFound
        ));
        assert!(matches!(
            update(missing, &UpdateScheduleRequest::default(), user, &pool)
                .await
                .unwrap_err(),
            ApiError::NotFound
        ));
        assert!(matches!(
            delete(missing, user, &pool).await.unwrap_err(),
            ApiError::NotFound
        ));
    }
}
