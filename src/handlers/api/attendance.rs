use actix_session::Session;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use std::collections::HashMap;

use super::optional_id;
use crate::auth::session::{current_user, require_admin};
use crate::auth::validate;
use crate::errors::AppError;
use crate::models::attendance::{
    self, allowance, AttendanceFilter, AttendanceStatus, PairStatusPayload, StatusPayload,
};

/// GET /api/attendance - Filter by `userId` and/or `meetingId`.
/// Members only ever see their own rows.
pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&session)?;
    let mut filter = AttendanceFilter {
        user_id: optional_id(&query, "userId")?,
        meeting_id: optional_id(&query, "meetingId")?,
    };
    if !current.is_admin() {
        if let Some(uid) = filter.user_id {
            current.require_self_or_admin(uid)?;
        }
        filter.user_id = Some(current.id);
    }

    let rows = attendance::find_all(&pool, filter).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/attendance/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&session)?;
    let attendance_id = path.into_inner();
    let found = attendance::find_by_id(&pool, attendance_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("attendance {attendance_id}")))?;
    current.require_self_or_admin(found.user_id)?;
    Ok(HttpResponse::Ok().json(found))
}

/// PATCH /api/attendance/{id} - Set the status of one row (board only).
pub async fn update_status(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<StatusPayload>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let status: AttendanceStatus = body.status.parse()?;
    let attendance_id = path.into_inner();

    attendance::update_status(&pool, attendance_id, status).await?;

    let updated = attendance::find_by_id(&pool, attendance_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("attendance {attendance_id}")))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// PUT /api/attendance/status - Upsert the status for a (user, meeting) pair (board only).
pub async fn set_pair_status(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<PairStatusPayload>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let status: AttendanceStatus = body.status.parse()?;

    let attendance_id = attendance::upsert(&pool, body.user_id, body.meeting_id, status).await?;

    let row = attendance::find_by_id(&pool, attendance_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("attendance {attendance_id}")))?;
    Ok(HttpResponse::Ok().json(row))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub user_id: i64,
}

/// POST /api/meetings/{id}/check-in - Mark a user present (board only).
pub async fn check_in(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<CheckInRequest>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    let meeting_id = path.into_inner();

    let attendance_id =
        attendance::upsert(&pool, body.user_id, meeting_id, AttendanceStatus::Present).await?;
    log::info!(
        "User {} checked in to meeting {meeting_id} by {}",
        body.user_id,
        admin.id
    );

    let row = attendance::find_by_id(&pool, attendance_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("attendance {attendance_id}")))?;
    Ok(HttpResponse::Ok().json(row))
}

/// DELETE /api/attendance/{id} (board only)
pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    attendance::delete(&pool, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/attendance/user/{userId}/remaining-absences
pub async fn remaining_absences(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&session)?;
    let raw_id = path.into_inner();
    if !current.is_admin() {
        let user_id = validate::parse_id(&raw_id, "userId")?;
        current.require_self_or_admin(user_id)?;
    }

    let remaining = allowance::remaining_absences(&pool, &raw_id).await?;
    Ok(HttpResponse::Ok().json(remaining))
}
