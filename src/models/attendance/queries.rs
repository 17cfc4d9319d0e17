use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::types::{Attendance, AttendanceFilter, AttendanceStatus};
use crate::errors::AppError;
use crate::models::meeting::MeetingType;

const SELECT_ATTENDANCE: &str = "\
    SELECT a.id, a.user_id, a.meeting_id, a.status, \
           u.name AS user_name, m.name AS meeting_name, m.date AS meeting_date, \
           m.meeting_type, (r.id IS NOT NULL) AS has_request, a.updated_at \
    FROM attendance a \
    JOIN users u ON u.id = a.user_id \
    JOIN meetings m ON m.id = a.meeting_id \
    LEFT JOIN requests r ON r.attendance_id = a.id";

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    user_id: i64,
    meeting_id: i64,
    status: String,
    user_name: String,
    meeting_name: String,
    meeting_date: String,
    meeting_type: String,
    has_request: bool,
    updated_at: DateTime<Utc>,
}

impl TryFrom<Row> for Attendance {
    type Error = AppError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let status = row.status.parse().map_err(|_| {
            AppError::Parse(format!("attendance {} has unknown status '{}'", row.id, row.status))
        })?;
        let meeting_type = row.meeting_type.parse().map_err(|_| {
            AppError::Parse(format!(
                "meeting {} has unknown type '{}'",
                row.meeting_id, row.meeting_type
            ))
        })?;
        Ok(Attendance {
            id: row.id,
            user_id: row.user_id,
            meeting_id: row.meeting_id,
            status,
            user_name: row.user_name,
            meeting_name: row.meeting_name,
            meeting_date: row.meeting_date,
            meeting_type,
            has_request: row.has_request,
            updated_at: row.updated_at,
        })
    }
}

pub async fn find_all(pool: &PgPool, filter: AttendanceFilter) -> Result<Vec<Attendance>, AppError> {
    let sql = format!(
        "{SELECT_ATTENDANCE} \
         WHERE ($1::BIGINT IS NULL OR a.user_id = $1) \
           AND ($2::BIGINT IS NULL OR a.meeting_id = $2) \
         ORDER BY m.date DESC, m.start_time DESC, u.name"
    );
    let rows = sqlx::query_as::<_, Row>(&sql)
        .bind(filter.user_id)
        .bind(filter.meeting_id)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(Attendance::try_from).collect()
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Attendance>, AppError> {
    let sql = format!("{SELECT_ATTENDANCE} WHERE a.id = $1");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Attendance::try_from).transpose()
}

/// Set the status for a (user, meeting) pair, creating the row if needed.
/// Returns the attendance id.
pub async fn upsert(
    pool: &PgPool,
    user_id: i64,
    meeting_id: i64,
    status: AttendanceStatus,
) -> Result<i64, AppError> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO attendance (user_id, meeting_id, status) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, meeting_id) \
         DO UPDATE SET status = EXCLUDED.status, updated_at = now() \
         RETURNING id",
    )
    .bind(user_id)
    .bind(meeting_id)
    .bind(status.as_str())
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn update_status(pool: &PgPool, id: i64, status: AttendanceStatus) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE attendance SET status = $1, updated_at = now() WHERE id = $2")
        .bind(status.as_str())
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("attendance {id}")));
    }
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM attendance WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("attendance {id}")));
    }
    Ok(())
}

/// Meeting category of every `UNEXCUSED_ABSENCE` row for a user.
pub async fn unexcused_meeting_types(pool: &PgPool, user_id: i64) -> Result<Vec<MeetingType>, AppError> {
    let rows: Vec<(String,)> = sqlx::query_as(
        "SELECT m.meeting_type \
         FROM attendance a \
         JOIN meetings m ON m.id = a.meeting_id \
         WHERE a.user_id = $1 AND a.status = $2",
    )
    .bind(user_id)
    .bind(AttendanceStatus::UnexcusedAbsence.as_str())
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|(t,)| {
            t.parse()
                .map_err(|_| AppError::Parse(format!("unknown meeting type '{t}'")))
        })
        .collect()
}
