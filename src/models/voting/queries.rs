use sqlx::PgPool;

use super::types::{ResultCount, VotingEvent, VotingRecord};
use crate::errors::AppError;

const SELECT_EVENT: &str = "\
    SELECT id, meeting_id, name, vote_type, deleted_at, updated_by, created_at \
    FROM voting_events";

/// Events for a meeting, oldest first. Ended events only when `include_ended`.
pub async fn find_events_for_meeting(
    pool: &PgPool,
    meeting_id: i64,
    include_ended: bool,
) -> Result<Vec<VotingEvent>, AppError> {
    let sql = format!(
        "{SELECT_EVENT} WHERE meeting_id = $1 AND ($2 OR deleted_at IS NULL) \
         ORDER BY created_at, id"
    );
    let events = sqlx::query_as::<_, VotingEvent>(&sql)
        .bind(meeting_id)
        .bind(include_ended)
        .fetch_all(pool)
        .await?;
    Ok(events)
}

pub async fn find_event_by_id(pool: &PgPool, id: i64) -> Result<Option<VotingEvent>, AppError> {
    let sql = format!("{SELECT_EVENT} WHERE id = $1");
    let event = sqlx::query_as::<_, VotingEvent>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(event)
}

/// Open a vote. An unknown meeting surfaces as `NotFound`.
pub async fn create_event(
    pool: &PgPool,
    meeting_id: i64,
    name: &str,
    vote_type: &str,
    updated_by: i64,
) -> Result<i64, AppError> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO voting_events (meeting_id, name, vote_type, updated_by) \
         VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(meeting_id)
    .bind(name.trim())
    .bind(vote_type.trim())
    .bind(updated_by)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

/// End a vote by stamping `deleted_at`. Ending twice is a `Conflict`.
pub async fn end_event(pool: &PgPool, id: i64, updated_by: i64) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE voting_events SET deleted_at = clock_timestamp(), updated_by = $1 \
         WHERE id = $2 AND deleted_at IS NULL",
    )
    .bind(updated_by)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(closed_or_missing(pool, id).await?);
    }
    Ok(())
}

/// Record one vote. Only open events accept votes, one per user.
///
/// The open check and the insert are one statement. `FOR SHARE` holds the
/// event row until the vote commits, so a concurrent `end_event` either waits
/// for it or wins and the insert selects nothing.
pub async fn cast(
    pool: &PgPool,
    event_id: i64,
    user_id: i64,
    result: &str,
    updated_by: i64,
) -> Result<i64, AppError> {
    let inserted: Option<(i64,)> = sqlx::query_as(
        "INSERT INTO voting_records (voting_event_id, user_id, result, updated_by) \
         SELECT id, $2, $3, $4 FROM voting_events \
         WHERE id = $1 AND deleted_at IS NULL \
         FOR SHARE \
         RETURNING id",
    )
    .bind(event_id)
    .bind(user_id)
    .bind(result.trim())
    .bind(updated_by)
    .fetch_optional(pool)
    .await?;

    match inserted {
        Some((id,)) => Ok(id),
        None => Err(closed_or_missing(pool, event_id).await?),
    }
}

async fn closed_or_missing(pool: &PgPool, id: i64) -> Result<AppError, AppError> {
    Ok(match find_event_by_id(pool, id).await? {
        Some(_) => AppError::Conflict(format!("voting event {id} has ended")),
        None => AppError::NotFound(format!("voting event {id}")),
    })
}

pub async fn find_records(pool: &PgPool, event_id: i64) -> Result<Vec<VotingRecord>, AppError> {
    let records = sqlx::query_as::<_, VotingRecord>(
        "SELECT vr.id, vr.voting_event_id, vr.user_id, u.name AS user_name, \
                vr.result, vr.updated_by, vr.created_at \
         FROM voting_records vr \
         JOIN users u ON u.id = vr.user_id \
         WHERE vr.voting_event_id = $1 \
         ORDER BY vr.created_at, vr.id",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(records)
}

/// Count votes per distinct result, most votes first.
pub async fn tally(pool: &PgPool, event_id: i64) -> Result<Vec<ResultCount>, AppError> {
    let counts = sqlx::query_as::<_, ResultCount>(
        "SELECT result, COUNT(*) AS count \
         FROM voting_records \
         WHERE voting_event_id = $1 \
         GROUP BY result \
         ORDER BY count DESC, result",
    )
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(counts)
}

/// Remove every record for an event. Returns how many were deleted.
pub async fn delete_records(pool: &PgPool, event_id: i64) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM voting_records WHERE voting_event_id = $1")
        .bind(event_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
