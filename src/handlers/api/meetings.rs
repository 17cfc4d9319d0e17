use actix_session::Session;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::session::{current_user, require_admin};
use crate::errors::AppError;
use crate::models::meeting::{self, MeetingPayload};

/// GET /api/meetings - All meetings, earliest first.
pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    current_user(&session)?;
    let meetings = meeting::find_all(&pool).await?;
    Ok(HttpResponse::Ok().json(meetings))
}

/// GET /api/meetings/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    current_user(&session)?;
    let meeting_id = path.into_inner();
    let found = meeting::find_by_id(&pool, meeting_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("meeting {meeting_id}")))?;
    Ok(HttpResponse::Ok().json(found))
}

/// POST /api/meetings - Schedule a meeting for every member (board only).
pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<MeetingPayload>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    let new_meeting = body.validate()?;

    let created_id = meeting::create(&pool, &new_meeting).await?;
    log::info!("Meeting {created_id} created by {}", admin.id);

    let created = meeting::find_by_id(&pool, created_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("meeting {created_id}")))?;
    Ok(HttpResponse::Created().json(created))
}

/// PUT /api/meetings/{id} (board only)
pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<MeetingPayload>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let meeting_id = path.into_inner();
    let fields = body.validate()?;

    meeting::update(&pool, meeting_id, &fields).await?;

    let updated = meeting::find_by_id(&pool, meeting_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("meeting {meeting_id}")))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/meetings/{id} (board only). Attendance, requests and votes go with it.
pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    let meeting_id = path.into_inner();
    meeting::delete(&pool, meeting_id).await?;
    log::info!("Meeting {meeting_id} deleted by {}", admin.id);
    Ok(HttpResponse::NoContent().finish())
}
