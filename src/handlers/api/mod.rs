//! JSON API consumed by the web UI, mounted under `/api`.

pub mod attendance;
pub mod meetings;
pub mod requests;
pub mod session;
pub mod users;
pub mod voting;

use actix_web::web;
use std::collections::HashMap;

use crate::auth::{middleware, validate};
use crate::errors::AppError;

/// Configure all API routes. Literal segments are registered before `{id}`
/// segments on the same prefix.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::InvalidArgument(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::InvalidArgument(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::InvalidArgument(err.to_string()).into()),
    );

    cfg.service(
        web::scope("/api")
            .wrap(actix_web::middleware::from_fn(middleware::require_json_content_type))
            .service(
                web::resource("/session")
                    .route(web::post().to(session::sign_in))
                    .route(web::get().to(session::me))
                    .route(web::delete().to(session::sign_out)),
            )
            .service(
                web::scope("")
                    .wrap(actix_web::middleware::from_fn(middleware::require_auth))
                    .service(
                        web::scope("/users")
                            .route("", web::get().to(users::list))
                            .route("", web::post().to(users::create))
                            .route("/{id}", web::get().to(users::read))
                            .route("/{id}", web::put().to(users::update))
                            .route("/{id}", web::delete().to(users::delete)),
                    )
                    .service(
                        web::scope("/meetings")
                            .route("", web::get().to(meetings::list))
                            .route("", web::post().to(meetings::create))
                            .route("/{id}", web::get().to(meetings::read))
                            .route("/{id}", web::put().to(meetings::update))
                            .route("/{id}", web::delete().to(meetings::delete))
                            .route("/{id}/check-in", web::post().to(attendance::check_in))
                            .route("/{id}/voting-events", web::get().to(voting::list_for_meeting)),
                    )
                    .service(
                        web::scope("/attendance")
                            .route("", web::get().to(attendance::list))
                            .route("/status", web::put().to(attendance::set_pair_status))
                            .route(
                                "/user/{user_id}/remaining-absences",
                                web::get().to(attendance::remaining_absences),
                            )
                            .route("/{id}", web::get().to(attendance::read))
                            .route("/{id}", web::patch().to(attendance::update_status))
                            .route("/{id}", web::delete().to(attendance::delete))
                            .route("/{id}/requests", web::post().to(requests::create)),
                    )
                    .service(
                        web::scope("/requests")
                            .route("", web::get().to(requests::list))
                            .route("/{id}", web::get().to(requests::read))
                            .route("/{id}", web::patch().to(requests::update))
                            .route("/{id}", web::delete().to(requests::delete))
                            .route("/{id}/decision", web::post().to(requests::decide)),
                    )
                    .service(
                        web::scope("/voting-events")
                            .route("", web::post().to(voting::create_event))
                            .route("/{id}", web::get().to(voting::read_event))
                            .route("/{id}/end", web::post().to(voting::end_event))
                            .route("/{id}/records", web::get().to(voting::list_records))
                            .route("/{id}/records", web::post().to(voting::cast))
                            .route("/{id}/records", web::delete().to(voting::delete_records))
                            .route("/{id}/results", web::get().to(voting::results)),
                    ),
            ),
    );
}

/// Optional id-valued query parameter; present-but-malformed is `InvalidArgument`.
pub(crate) fn optional_id(
    query: &HashMap<String, String>,
    key: &str,
) -> Result<Option<i64>, AppError> {
    query
        .get(key)
        .map(|v| validate::parse_id(v, key))
        .transpose()
}
