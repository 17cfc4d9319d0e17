//! Shared test infrastructure.
//!
//! Database-backed tests run under `#[sqlx::test]`, which reads `DATABASE_URL`,
//! creates a scratch database per test, applies `./migrations` and drops the
//! database afterwards. Call `seed_roles` first so users can be inserted.

#![allow(dead_code)]

use sqlx::PgPool;

use roster::db;
use roster::models::meeting::{self, MeetingType, NewMeeting};
use roster::models::role::Role;
use roster::models::user::{self, NewUser};

pub async fn seed_roles(pool: &PgPool) {
    db::seed_roles(pool).await.expect("seed roles");
}

pub async fn insert_user(pool: &PgPool, handle: &str, role: Role) -> i64 {
    let new_user = NewUser {
        external_id: format!("ext_{handle}"),
        email: format!("{handle}@example.edu"),
        name: handle.to_string(),
        nuid: "001234567".to_string(),
        role,
    };
    user::create(pool, &new_user).await.expect("create user")
}

pub async fn insert_meeting(
    pool: &PgPool,
    name: &str,
    date: &str,
    start_time: &str,
    meeting_type: MeetingType,
) -> i64 {
    let new_meeting = NewMeeting {
        name: name.to_string(),
        date: date.to_string(),
        start_time: start_time.to_string(),
        end_time: "23:59".to_string(),
        notes: String::new(),
        meeting_type,
    };
    meeting::create(pool, &new_meeting).await.expect("create meeting")
}

/// Attendance id for a (user, meeting) pair created by meeting scheduling.
pub async fn attendance_id(pool: &PgPool, user_id: i64, meeting_id: i64) -> i64 {
    let (id,): (i64,) =
        sqlx::query_as("SELECT id FROM attendance WHERE user_id = $1 AND meeting_id = $2")
            .bind(user_id)
            .bind(meeting_id)
            .fetch_one(pool)
            .await
            .expect("attendance row");
    id
}
