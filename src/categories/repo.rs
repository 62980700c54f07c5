use serde::Serialize;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
}

/// Connect-or-create by the unique name key, inside the caller's transaction.
/// A lost creation race reads back the winner's row instead of failing;
/// `ON CONFLICT DO NOTHING` keeps the transaction usable after the race.
pub async fn ensure(conn: &mut PgConnection, name: &str) -> Result<Uuid, ApiError> {
    for _ in 0..3 {
        if let Some(id) = sqlx::query_scalar::<_, Uuid>("SELECT id FROM categories WHERE name = $1")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await?
        {
            return Ok(id);
        }

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO categories (id, name)
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
        // Raced with a concurrent writer; loop back to the lookup.
    }
    Err(ApiError::conflict("Concurrent write conflict, please retry"))
}
