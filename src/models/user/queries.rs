use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::types::{NewUser, User};
use crate::errors::AppError;

const SELECT_USER: &str = "\
    SELECT u.id, u.external_id, u.email, u.name, u.nuid, \
           r.name AS role, u.created_at, u.updated_at \
    FROM users u \
    JOIN roles r ON r.id = u.role_id";

#[derive(sqlx::FromRow)]
struct Row {
    id: i64,
    external_id: String,
    email: String,
    name: String,
    nuid: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<Row> for User {
    type Error = AppError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse()
            .map_err(|_| AppError::Parse(format!("user {} has unknown role '{}'", row.id, row.role)))?;
        Ok(User {
            id: row.id,
            external_id: row.external_id,
            email: row.email,
            name: row.name,
            nuid: row.nuid,
            role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn find_all(pool: &PgPool) -> Result<Vec<User>, AppError> {
    let sql = format!("{SELECT_USER} ORDER BY u.name, u.id");
    let rows = sqlx::query_as::<_, Row>(&sql).fetch_all(pool).await?;
    rows.into_iter().map(User::try_from).collect()
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
    let sql = format!("{SELECT_USER} WHERE u.id = $1");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    row.map(User::try_from).transpose()
}

/// Look up the local user bound to an external auth identity.
pub async fn find_by_external_id(pool: &PgPool, external_id: &str) -> Result<Option<User>, AppError> {
    let sql = format!("{SELECT_USER} WHERE u.external_id = $1");
    let row = sqlx::query_as::<_, Row>(&sql)
        .bind(external_id)
        .fetch_optional(pool)
        .await?;
    row.map(User::try_from).transpose()
}

/// Insert a user and return the new id. Duplicate email or external id is a `Conflict`.
pub async fn create(pool: &PgPool, user: &NewUser) -> Result<i64, AppError> {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO users (external_id, email, name, nuid, role_id) \
         SELECT $1, $2, $3, $4, r.id FROM roles r WHERE r.name = $5 \
         RETURNING id",
    )
    .bind(&user.external_id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.nuid)
    .bind(user.role.as_str())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("role {}", user.role)))?;

    Ok(id)
}

pub async fn update(pool: &PgPool, id: i64, user: &NewUser) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE users SET external_id = $1, email = $2, name = $3, nuid = $4, \
             role_id = (SELECT id FROM roles WHERE name = $5), updated_at = now() \
         WHERE id = $6",
    )
    .bind(&user.external_id)
    .bind(&user.email)
    .bind(&user.name)
    .bind(&user.nuid)
    .bind(user.role.as_str())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("user {id}")));
    }
    Ok(())
}

/// Delete a user. Their attendance, requests and votes go with them.
pub async fn delete(pool: &PgPool, id: i64) -> Result<(), AppError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("user {id}")));
    }
    Ok(())
}
