use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::auth::session::{current_user, require_admin};
use crate::errors::AppError;
use crate::models::voting::{self, ResultCount, VotePayload, VotingEvent, VotingEventPayload};

async fn load_event(pool: &PgPool, event_id: i64) -> Result<VotingEvent, AppError> {
    voting::find_event_by_id(pool, event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("voting event {event_id}")))
}

/// GET /api/meetings/{id}/voting-events - Open events; `includeEnded=true` for all.
pub async fn list_for_meeting(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    current_user(&session)?;
    let include_ended = match query.get("includeEnded").map(String::as_str) {
        None | Some("false") => false,
        Some("true") => true,
        Some(other) => {
            return Err(AppError::InvalidArgument(format!(
                "includeEnded must be true or false, got '{other}'"
            )));
        }
    };

    let events = voting::find_events_for_meeting(&pool, path.into_inner(), include_ended).await?;
    Ok(HttpResponse::Ok().json(events))
}

/// POST /api/voting-events - Open a vote (board only).
pub async fn create_event(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<VotingEventPayload>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    body.validate()?;

    let event_id =
        voting::create_event(&pool, body.meeting_id, &body.name, &body.vote_type, admin.id).await?;
    log::info!("Voting event {event_id} opened on meeting {}", body.meeting_id);

    Ok(HttpResponse::Created().json(load_event(&pool, event_id).await?))
}

/// GET /api/voting-events/{id}
pub async fn read_event(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    current_user(&session)?;
    Ok(HttpResponse::Ok().json(load_event(&pool, path.into_inner()).await?))
}

/// POST /api/voting-events/{id}/end - Close a vote (board only).
pub async fn end_event(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    let event_id = path.into_inner();
    voting::end_event(&pool, event_id, admin.id).await?;
    log::info!("Voting event {event_id} ended by {}", admin.id);
    Ok(HttpResponse::Ok().json(load_event(&pool, event_id).await?))
}

/// GET /api/voting-events/{id}/records - Individual votes (board only).
pub async fn list_records(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let event_id = path.into_inner();
    load_event(&pool, event_id).await?;
    Ok(HttpResponse::Ok().json(voting::find_records(&pool, event_id).await?))
}

/// POST /api/voting-events/{id}/records - Cast a vote.
pub async fn cast(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<VotePayload>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&session)?;
    body.validate()?;
    let voter = body.user_id.unwrap_or(current.id);
    current.require_self_or_admin(voter)?;

    let event_id = path.into_inner();
    let record_id = voting::cast(&pool, event_id, voter, &body.result, current.id).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "id": record_id,
        "votingEventId": event_id,
        "userId": voter,
    })))
}

/// DELETE /api/voting-events/{id}/records - Remove all votes for an event (board only).
pub async fn delete_records(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    let event_id = path.into_inner();
    load_event(&pool, event_id).await?;

    let removed = voting::delete_records(&pool, event_id).await?;
    log::info!("Removed {removed} vote(s) from event {event_id} by {}", admin.id);
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Results {
    event: VotingEvent,
    total: i64,
    results: Vec<ResultCount>,
}

/// GET /api/voting-events/{id}/results - Vote counts per result.
pub async fn results(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    current_user(&session)?;
    let event_id = path.into_inner();
    let event = load_event(&pool, event_id).await?;
    let results = voting::tally(&pool, event_id).await?;
    let total = results.iter().map(|r| r.count).sum();

    Ok(HttpResponse::Ok().json(Results { event, total, results }))
}
