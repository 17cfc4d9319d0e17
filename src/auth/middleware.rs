use actix_session::SessionExt;
use actix_web::{
    Error, HttpResponse,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
};

use crate::errors::ApiErrorResponse;

/// Middleware function that checks for an authenticated session.
/// Responds 401 with a JSON error body if there is none.
pub async fn require_auth(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let session = req.get_session();
    let has_user = session.get::<i64>("user_id").unwrap_or(None).is_some();

    if !has_user {
        let response = HttpResponse::Unauthorized().json(ApiErrorResponse {
            error: "Not authenticated".to_string(),
            details: None,
        });
        return Ok(req.into_response(response).map_into_right_body());
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}

/// CSRF protection for JSON mutation endpoints.
///
/// Rejects POST/PUT/PATCH/DELETE requests without `Content-Type: application/json`.
/// Browsers cannot send cross-origin JSON with cookies via a simple form post,
/// so the content-type check stands in for CSRF tokens.
pub async fn require_json_content_type(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    use actix_web::http::Method;

    let method = req.method().clone();
    if method == Method::POST
        || method == Method::PUT
        || method == Method::PATCH
        || method == Method::DELETE
    {
        let content_type = req
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if !content_type.starts_with("application/json") {
            let response = HttpResponse::BadRequest().json(ApiErrorResponse {
                error: "Invalid argument".to_string(),
                details: Some(
                    "Content-Type must be application/json for mutation requests".to_string(),
                ),
            });
            return Ok(req.into_response(response).map_into_right_body());
        }
    }

    next.call(req).await.map(|res| res.map_into_left_body())
}
