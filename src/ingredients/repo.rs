use serde::Serialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::error::{is_unique_violation, ApiError};

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
}

/// Connect-or-create by the unique name key, inside the caller's transaction.
/// Same contract as `categories::repo::ensure`.
pub async fn ensure(conn: &mut PgConnection, name: &str) -> Result<Uuid, ApiError> {
    for _ in 0..3 {
        if let Some(id) =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM ingredients WHERE name = $1")
                .bind(name)
                .fetch_optional(&mut *conn)
                .await?
        {
            return Ok(id);
        }

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO ingredients (id, name)
            VALUES ($1, $2)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(id) = inserted {
            return Ok(id);
        }
    }
    Err(ApiError::conflict("Concurrent write conflict, please retry"))
}

pub async fn list(db: &PgPool) -> sqlx::Result<Vec<Ingredient>> {
    sqlx::query_as::<_, Ingredient>("SELECT id, name FROM ingredients ORDER BY name ASC")
        .fetch_all(db)
        .await
}

pub async fn create(db: &PgPool, name: &str) -> Result<Ingredient, ApiError> {
    match sqlx::query_as::<_, Ingredient>(
        "INSERT INTO ingredients (id, name) VALUES ($1, $2) RETURNING id, name",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .fetch_one(db)
    .await
    {
        Ok(row) => Ok(row),
        Err(e) if is_unique_violation(&e) => Err(ApiError::conflict("Ingredient already exists")),
        Err(e) => Err(e.into()),
    }
}

pub async fn rename(db: &PgPool, id: Uuid, name: &str) -> Result<Ingredient, ApiError> {
    match sqlx::query_as::<_, Ingredient>(
        "UPDATE ingredients SET name = $2 WHERE id = $1 RETURNING id, name",
    )
    .bind(id)
    .bind(name)
    .fetch_optional(db)
    .await
    {
        Ok(Some(row)) => Ok(row),
        Ok(None) => Err(ApiError::not_found("Ingredient not found")),
        Err(e) if is_unique_violation(&e) => {
            Err(ApiError::conflict("Ingredient name already exists"))
        }
        Err(e) => Err(e.into()),
    }
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let res = sqlx::query("DELETE FROM ingredients WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(ApiError::not_found("Ingredient not found"));
    }
    Ok(())
}
