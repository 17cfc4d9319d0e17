use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::validate;
use crate::errors::AppError;

/// A poll opened by the board during a meeting. Ended events carry `deleted_at`.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VotingEvent {
    pub id: i64,
    pub meeting_id: i64,
    pub name: String,
    pub vote_type: String,
    pub deleted_at: Option<DateTime<Utc>>,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl VotingEvent {
    pub fn is_open(&self) -> bool {
        self.deleted_at.is_none()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VotingRecord {
    pub id: i64,
    pub voting_event_id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub result: String,
    pub updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Number of votes cast for one distinct result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct ResultCount {
    pub result: String,
    pub count: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotingEventPayload {
    pub meeting_id: i64,
    pub name: String,
    pub vote_type: String,
}

impl VotingEventPayload {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut errors = Vec::new();
        errors.extend(validate::validate_required(&self.name, "Name", 500));
        errors.extend(validate::validate_required(&self.vote_type, "Vote type", 32));
        if self.meeting_id <= 0 {
            errors.push("meetingId must be a positive integer".to_string());
        }
        validate::into_result(errors)
    }
}

/// Body for casting a vote. Board members may record a vote on behalf of
/// `userId`; everyone else votes as themselves.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VotePayload {
    #[serde(default)]
    pub user_id: Option<i64>,
    pub result: String,
}

impl VotePayload {
    pub fn validate(&self) -> Result<(), AppError> {
        validate::into_result(
            validate::validate_required(&self.result, "Result", 500)
                .into_iter()
                .collect(),
        )
    }
}
