use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize, Clone)]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoginUserRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CreateScheduleRequest {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub owner_id: Uuid,
    #[serde(default)]
    pub participant_ids: Vec<Uuid>,
}

/// Partial update. `None` means "leave untouched"; a present field (even an
/// empty string or an empty participant list) is applied as given.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct UpdateScheduleRequest {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub participant_ids: Option<Vec<Uuid>>,
}

impl UpdateScheduleRequest {
    /// True when at least one schedule column (not the participant set)
    /// is present in the request.
    pub fn has_scalar_fields(&self) -> bool {
        self.title.is_some()
            || self.start_time.is_some()
            || self.end_time.is_some()
            || self.description.is_some()
            || self.location.is_some()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: Uuid,
    pub exp: usize,
}

impl Claims {
    pub fn new(user_id: Uuid, exp: usize) -> Self {
        Self { user_id, exp }
    }
}
