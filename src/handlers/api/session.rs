use actix_session::Session;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

use crate::auth::provider;
use crate::auth::session::{current_user, sign_in as start_session};
use crate::auth::validate;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::models::user;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub external_id: String,
}

/// POST /api/session - Bind the session to the local user for an
/// already-authenticated external identity. The caller must present the
/// auth provider secret.
pub async fn sign_in(
    req: HttpRequest,
    pool: web::Data<PgPool>,
    config: web::Data<AppConfig>,
    session: Session,
    body: web::Json<SignInRequest>,
) -> Result<HttpResponse, AppError> {
    provider::verify(&req, &config)?;
    validate::into_result(
        validate::validate_required(&body.external_id, "externalId", 255)
            .into_iter()
            .collect(),
    )?;

    let found = user::find_by_external_id(&pool, body.external_id.trim())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user for external id '{}'", body.external_id.trim())))?;

    start_session(&session, &found)?;
    log::info!("User {} signed in as {}", found.id, found.role);

    Ok(HttpResponse::Ok().json(found))
}

/// GET /api/session - The signed-in user.
pub async fn me(
    pool: web::Data<PgPool>,
    session: Session,
) -> Result<HttpResponse, AppError> {
    let current = current_user(&session)?;
    let found = user::find_by_id(&pool, current.id).await?.ok_or_else(|| {
        session.purge();
        AppError::Session("Signed-in user no longer exists".to_string())
    })?;
    Ok(HttpResponse::Ok().json(found))
}

/// DELETE /api/session - Sign out.
pub async fn sign_out(session: Session) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}
