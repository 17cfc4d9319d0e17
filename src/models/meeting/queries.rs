use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::types::{Meeting, NewMeeting};
use crate::errors::AppError;

const SELECT_MEETING: &str = "\
    SELECT id, name, date, start_time, end_time, notes, meeting_type, created_at, updated_at \
    FROM meetings";

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    name: String,
    date: String,
    start_time: String,
    end_time: String,
    notes: String,
    meeting_type: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<Row> for Meeting {
    type Error = AppError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let meeting_type = row.meeting_type.parse().map_err(|_| {
            AppError::Parse(format!("meeting {} has unknown type '{}'", row.id, row.meeting_type))
        })?;
        Ok(Meeting {
            id: row.id,
            name: row.name,
            date: row.date,
            start_time: row.start_time,
            end_time: row.end_time,
            notes: row.notes,
            meeting_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn find_all(pool: &PgPool) -> Result<Vec<Meeting>, AppError> {
    let sql = format!("{SELECT_MEETING} ORDER BY date, start_time, id");
    let rows = sqlx::query_as::<_, Row>(&sql).fetch_all(pool).await?;
    rows.into_iter().map(Meeting::try_from).collect()
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Meeting>, AppError> {
    let sql = format!("{SELECT_MEETING} WHERE id = $1");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(Meeting::try_from).transpose()
}

/// Create a meeting and schedule it for every existing user with a `PENDING`
/// attendance row. Both happen in one transaction.
pub async fn create(pool: &PgPool, meeting: &NewMeeting) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO meetings (name, date, start_time, end_time, notes, meeting_type) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
    )
    .bind(&meeting.name)
    .bind(&meeting.date)
    .bind(&meeting.start_time)
    .bind(&meeting.end_time)
    .bind(&meeting.notes)
    .bind(meeting.meeting_type.as_str())
    .fetch_one(&mut *tx)
    .await?;

    let scheduled = sqlx::query(
        "INSERT INTO attendance (user_id, meeting_id, status) \
         SELECT u.id, $1, 'PENDING' FROM users u \
         ON CONFLICT (user_id, meeting_id) DO NOTHING",
    )
    .bind(id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    log::info!(
        "Meeting {} created, scheduled for {} user(s)",
        id,
        scheduled.rows_affected()
    );
    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, meeting: &NewMeeting) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE meetings SET name = $1, date = $2, start_time = $3, end_time = $4, \
             notes = $5, meeting_type = $6, updated_at = now() \
         WHERE id = $7",
    )
    .bind(&meeting.name)
    .bind(&meeting.date)
    .bind(&meeting.start_time)
    .bind(&meeting.end_time)
    .bind(&meeting.notes)
    .bind(meeting.meeting_type.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("meeting {id}")));
    }
    Ok(())
}

pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM meetings WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("meeting {id}")));
    }
    Ok(())
}
