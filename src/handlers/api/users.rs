use actix_session::Session;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

use crate::auth::session::{current_user, require_admin};
use crate::auth::validate;
use crate::errors::AppError;
use crate::models::role::Role;
use crate::models::user::{self, NewUser, UserPayload};

fn validate_payload(body: &UserPayload) -> Result<NewUser, AppError> {
    let mut errors = Vec::new();
    errors.extend(validate::validate_required(&body.name, "Name", 100));
    errors.extend(validate::validate_email(&body.email));
    errors.extend(validate::validate_nuid(&body.nuid));
    errors.extend(validate::validate_required(&body.external_id, "externalId", 255));

    let role = match body.role.as_deref() {
        None => Some(Role::Member),
        Some(r) => r.parse::<Role>().map_err(|e| errors.push(e.to_string())).ok(),
    };

    validate::into_result(errors)?;
    let role = role.ok_or_else(|| AppError::InvalidArgument("role is required".to_string()))?;

    Ok(NewUser {
        external_id: body.external_id.trim().to_string(),
        email: body.email.trim().to_string(),
        name: body.name.trim().to_string(),
        nuid: body.nuid.trim().to_string(),
        role,
    })
}

/// GET /api/users - List all users (board only).
pub async fn list(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let users = user::find_all(&pool).await?;
    Ok(HttpResponse::Ok().json(users))
}

/// GET /api/users/{id} - Get a single user (self or board).
pub async fn read(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    current_user(&session)?.require_self_or_admin(user_id)?;

    let found = user::find_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
    Ok(HttpResponse::Ok().json(found))
}

/// POST /api/users - Create a user (board only). Role defaults to MEMBER.
pub async fn create(
    pool: web::Data<PgPool>,
    session: Session,
    body: web::Json<UserPayload>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    let new_user = validate_payload(&body)?;

    let created_id = user::create(&pool, &new_user).await?;
    log::info!("User {created_id} created by {}", admin.id);

    let created = user::find_by_id(&pool, created_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {created_id}")))?;
    Ok(HttpResponse::Created().json(created))
}

/// PUT /api/users/{id} - Replace a user's fields (board only).
pub async fn update(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
    body: web::Json<UserPayload>,
) -> Result<HttpResponse, AppError> {
    require_admin(&session)?;
    let user_id = path.into_inner();
    let fields = validate_payload(&body)?;

    user::update(&pool, user_id, &fields).await?;

    let updated = user::find_by_id(&pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {user_id}")))?;
    Ok(HttpResponse::Ok().json(updated))
}

/// DELETE /api/users/{id} - Delete a user (board only, not yourself).
pub async fn delete(
    pool: web::Data<PgPool>,
    session: Session,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let admin = require_admin(&session)?;
    let user_id = path.into_inner();
    if admin.id == user_id {
        return Err(AppError::InvalidArgument("cannot delete your own account".to_string()));
    }

    user::delete(&pool, user_id).await?;
    log::info!("User {user_id} deleted by {}", admin.id);

    Ok(HttpResponse::NoContent().finish())
}
