use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::config::AppConfig;
use crate::models::role::Role;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn init_pool(config: &AppConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await?;
    log::info!("Database migrations complete");
    Ok(())
}

/// Insert the fixed role rows if they are missing. Safe to run on every start.
pub async fn seed_roles(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut created = 0;
    for role in Role::ALL {
        let result = sqlx::query("INSERT INTO roles (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(role.as_str())
            .execute(pool)
            .await?;
        created += result.rows_affected();
    }
    if created > 0 {
        log::info!("Seeded {created} role(s)");
    } else {
        log::info!("Roles already seeded, skipping");
    }
    Ok(())
}
