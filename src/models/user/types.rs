use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::role::Role;

/// A member of the organization, as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub nuid: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated data for inserting or replacing a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub nuid: String,
    pub role: Role,
}

/// Create/update user request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub external_id: String,
    pub email: String,
    pub name: String,
    pub nuid: String,
    #[serde(default)]
    pub role: Option<String>,
}
