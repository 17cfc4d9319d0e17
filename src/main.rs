use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, middleware, web};

use roster::{config::AppConfig, db, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = AppConfig::from_env().map_err(|e| {
        log::error!("Configuration error: {e}");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let pool = db::init_pool(&config).await.map_err(|e| {
        log::error!("Failed to connect to database: {e}");
        std::io::Error::other(e)
    })?;
    db::run_migrations(&pool).await.map_err(|e| {
        log::error!("Failed to run migrations: {e}");
        std::io::Error::other(e)
    })?;
    db::seed_roles(&pool).await.map_err(|e| {
        log::error!("Failed to seed roles: {e}");
        std::io::Error::other(e)
    })?;

    let secret_key = config.session_key();
    let bind_addr = config.bind_addr.clone();
    let config = web::Data::new(config);

    log::info!("Starting server at http://{bind_addr}");

    HttpServer::new(move || {
        let session_mw = SessionMiddleware::builder(
            CookieSessionStore::default(),
            secret_key.clone(),
        )
        .cookie_secure(false)
        .cookie_http_only(true)
        .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(config.clone())
            .configure(handlers::api::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
