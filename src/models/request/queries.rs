use chrono::{DateTime, FixedOffset, Utc};
use sqlx::PgPool;

use super::lateness;
use super::types::{Decision, Request, RequestFields};
use crate::errors::AppError;

const SELECT_REQUEST: &str = "\
    SELECT r.id, r.attendance_id, a.user_id, u.name AS user_name, \
           a.meeting_id, m.name AS meeting_name, m.date AS meeting_date, \
           r.reason, r.attendance_mode, r.time_adjustment, r.is_late, \
           a.status, r.created_at, r.updated_at \
    FROM requests r \
    JOIN attendance a ON a.id = r.attendance_id \
    JOIN users u ON u.id = a.user_id \
    JOIN meetings m ON m.id = a.meeting_id";

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    attendance_id: i64,
    user_id: i64,
    user_name: String,
    meeting_id: i64,
    meeting_name: String,
    meeting_date: String,
    reason: String,
    attendance_mode: String,
    time_adjustment: Option<String>,
    is_late: bool,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<Row> for Request {
    type Error = AppError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let corrupt = |field: &str, value: &str| {
            AppError::Parse(format!("request {} has unknown {field} '{value}'", row.id))
        };
        let attendance_mode = row
            .attendance_mode
            .parse()
            .map_err(|_| corrupt("attendance mode", &row.attendance_mode))?;
        let time_adjustment = row
            .time_adjustment
            .as_deref()
            .map(|s| s.parse().map_err(|_| corrupt("time adjustment", s)))
            .transpose()?;
        let status = row.status.parse().map_err(|_| corrupt("status", &row.status))?;

        Ok(Request {
            id: row.id,
            attendance_id: row.attendance_id,
            user_id: row.user_id,
            user_name: row.user_name,
            meeting_id: row.meeting_id,
            meeting_name: row.meeting_name,
            meeting_date: row.meeting_date,
            reason: row.reason,
            attendance_mode,
            time_adjustment,
            is_late: row.is_late,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Optional list filters; `None` means "any".
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFilter {
    pub user_id: Option<i64>,
    pub meeting_id: Option<i64>,
}

pub async fn find_all(pool: &PgPool, filter: RequestFilter) -> Result<Vec<Request>, AppError> {
    let sql = format!(
        "{SELECT_REQUEST} \
         WHERE ($1::BIGINT IS NULL OR a.user_id = $1) \
           AND ($2::BIGINT IS NULL OR a.meeting_id = $2) \
         ORDER BY r.created_at DESC, r.id DESC"
    );
    let rows = sqlx::query_as::<_, Row>(&sql)
        .bind(filter.user_id)
        .bind(filter.meeting_id)
        .fetch_all(pool)
        .await?;
    rows.into_iter().map(Request::try_from).collect()
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Request>, AppError> {
    let sql = format!("{SELECT_REQUEST} WHERE r.id = $1");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Request::try_from).transpose()
}

/// File a request against an attendance row, fixing `is_late` at `now`.
///
/// Fails with `NotFound` if the attendance row (or its meeting) is missing,
/// `Parse` if the meeting schedule is unreadable and `Conflict` if the row
/// already has a request.
pub async fn create(
    pool: &PgPool,
    attendance_id: i64,
    fields: &RequestFields,
    offset: FixedOffset,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let linked: Option<(Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT m.date, m.start_time \
         FROM attendance a \
         LEFT JOIN meetings m ON m.id = a.meeting_id \
         WHERE a.id = $1",
    )
    .bind(attendance_id)
    .fetch_optional(pool)
    .await?;

    let (date, start_time) =
        linked.ok_or_else(|| AppError::NotFound(format!("attendance {attendance_id}")))?;
    let meeting = date.as_deref().zip(start_time.as_deref());
    let is_late = lateness::evaluate(attendance_id, meeting, offset, now)?;

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO requests (attendance_id, reason, attendance_mode, time_adjustment, is_late) \
         VALUES ($1, $2, $3, $4, $5) RETURNING id",
    )
    .bind(attendance_id)
    .bind(&fields.reason)
    .bind(fields.attendance_mode.as_str())
    .bind(fields.time_adjustment.map(|t| t.as_str()))
    .bind(is_late)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, fields: &RequestFields) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE requests SET reason = $1, attendance_mode = $2, time_adjustment = $3, \
             updated_at = now() \
         WHERE id = $4",
    )
    .bind(&fields.reason)
    .bind(fields.attendance_mode.as_str())
    .bind(fields.time_adjustment.map(|t| t.as_str()))
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("request {id}")));
    }
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM requests WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("request {id}")));
    }
    Ok(())
}

/// Resolve a request by writing the decision onto its attendance row.
pub async fn decide(pool: &PgPool, id: i64, decision: Decision) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE attendance SET status = $1, updated_at = now() \
         WHERE id = (SELECT attendance_id FROM requests WHERE id = $2)",
    )
    .bind(decision.outcome().as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("request {id}")));
    }
    Ok(())
}
