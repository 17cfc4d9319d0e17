use actix_session::Session;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;

use super::optional_id;
use crate::auth::session::{current_user, require_admin};
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::attendance;
use crate::models::request::{self, Decision, DecisionPayload, RequestFilter, RequestPayload};

async fn load(pool: &PgPool, request_id: i64) -> Result<request::Request, AppError> {
    request::find_by_id(pool, request_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("request {request_id}")))
}

/// POST /api/attendance/{attendanceId}/requests - File an absence request.
///
/// Members may only file for their own attendance. Lateness is decided now
/// and never recomputed.
pub async fn create(
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<RequestPayload>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&session)?;
    let fields = body.validate()?;
    let attendance_id = path.into_inner();

    let row = attendance::find_by_id(&pool, attendance_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("attendance {attendance_id}")))?;
    current.require_self_or_admin(row.user_id)?;

    let created_id =
        request::create(&pool, attendance_id, &fields, config.meeting_offset, Utc::now()).await?;
    let created = load(&pool, created_id).await?;
    if created.is_late {
        log::info!("Late request {created_id} filed for attendance {attendance_id}");
    }
    Ok(HttpResponse::Created().json(created))
}

/// GET /api/requests - Optional `meetingId` / `userId` filters.
/// Members only ever see their own requests.
pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
    query: web::Query<HashMap<String, String>>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&session)?;
    let mut filter = RequestFilter {
        user_id: optional_id(&query, "userId")?,
        meeting_id: optional_id(&query, "meetingId")?,
    };
    if !current.is_admin() {
        if let Some(uid) = filter.user_id {
            current.require_self_or_admin(uid)?;
        }
        filter.user_id = Some(current.id);
    }

    let requests = request::find_all(&pool, filter).await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// GET /api/requests/{id}
pub async fn read(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&session)?;
    let found = load(&pool, path.into_inner()).await?;
    current.require_self_or_admin(found.user_id)?;
    Ok(HttpResponse::Ok().json(found))
}

/// PATCH /api/requests/{id} - Edit reason, mode and time adjustment (owner only).
pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<RequestPayload>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&session)?;
    let fields = body.validate()?;
    let request_id = path.into_inner();

    let existing = load(&pool, request_id).await?;
    if existing.user_id != current.id {
        return Err(AppError::PermissionDenied(format!(
            "request {request_id} belongs to another user"
        )));
    }

    request::update(&pool, request_id, &fields).await?;
    Ok(HttpResponse::Ok().json(load(&pool, request_id).await?))
}

/// DELETE /api/requests/{id} - Withdraw (owner) or clean up (board).
pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&session)?;
    let request_id = path.into_inner();

    let existing = load(&pool, request_id).await?;
    current.require_self_or_admin(existing.user_id)?;

    request::delete(&pool, request_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/requests/{id}/decision - Approve or reject (board only).
/// The outcome is written to the linked attendance row.
pub async fn decide(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<DecisionPayload>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    let request_id = path.into_inner();
    let decision = Decision::from_approve(body.approve);

    request::decide(&pool, request_id, decision).await?;
    log::info!(
        "Request {request_id} resolved as {} by {}",
        decision.outcome(),
        admin.id
    );

    Ok(HttpResponse::Ok().json(load(&pool, request_id).await?))
}
