use std::collections::HashMap;

use sqlx::{FromRow, PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::{ItemResponse, ShoppingListResponse};
use super::validate::ValidList;
use crate::error::ApiError;
use crate::ingredients;

#[derive(Debug, FromRow)]
pub struct ShoppingListRow {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct ItemRow {
    pub id: Uuid,
    pub shopping_list_id: Uuid,
    pub quantity: f64,
    pub unit: String,
    pub purchased: bool,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
}

// Every query here is scoped by user_id; a list that exists but belongs to
// someone else looks exactly like one that does not exist.

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
) -> Result<Vec<ShoppingListResponse>, ApiError> {
    let rows = sqlx::query_as::<_, ShoppingListRow>(
        r#"
        SELECT id, name, user_id, created_at
        FROM shopping_lists
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    let mut conn = db.acquire().await?;
    assemble(&mut conn, rows).await
}

pub async fn get(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<ShoppingListResponse>, ApiError> {
    let mut conn = db.acquire().await?;
    fetch_aggregate(&mut conn, user_id, id).await
}

pub async fn create(
    db: &PgPool,
    user_id: Uuid,
    input: &ValidList,
) -> Result<ShoppingListResponse, ApiError> {
    let mut tx = db.begin().await?;
    let list_id = Uuid::new_v4();
    sqlx::query("INSERT INTO shopping_lists (id, name, user_id) VALUES ($1, $2, $3)")
        .bind(list_id)
        .bind(&input.name)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    insert_items(&mut tx, list_id, input).await?;

    let list = fetch_aggregate(&mut tx, user_id, list_id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("created list not readable")))?;
    tx.commit().await?;
    Ok(list)
}

/// Replace-all-children update, serialized by a lock on the list row.
pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    input: &ValidList,
) -> Result<ShoppingListResponse, ApiError> {
    let mut tx = db.begin().await?;

    let owned = sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM shopping_lists WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;
    if owned.is_none() {
        return Err(ApiError::not_found("Shopping list not found"));
    }

    sqlx::query("DELETE FROM shopping_list_items WHERE shopping_list_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE shopping_lists SET name = $2 WHERE id = $1")
        .bind(id)
        .bind(&input.name)
        .execute(&mut *tx)
        .await?;

    insert_items(&mut tx, id, input).await?;

    let list = fetch_aggregate(&mut tx, user_id, id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("updated list not readable")))?;
    tx.commit().await?;
    Ok(list)
}

pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> Result<(), ApiError> {
    // Items follow via ON DELETE CASCADE.
    let res = sqlx::query("DELETE FROM shopping_lists WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?;
    if res.rows_affected() == 0 {
        return Err(ApiError::not_found("Shopping list not found"));
    }
    Ok(())
}

/// Partial update of one flag. The item is addressed through its list so a
/// foreign item can never be toggled, only missed.
pub async fn set_purchased(
    db: &PgPool,
    user_id: Uuid,
    list_id: Uuid,
    item_id: Uuid,
    purchased: bool,
) -> Result<ItemResponse, ApiError> {
    let owned =
        sqlx::query_scalar::<_, Uuid>("SELECT id FROM shopping_lists WHERE id = $1 AND user_id = $2")
            .bind(list_id)
            .bind(user_id)
            .fetch_optional(db)
            .await?;
    if owned.is_none() {
        return Err(ApiError::not_found("Shopping list not found"));
    }

    let row = sqlx::query_as::<_, ItemRow>(
        r#"
        UPDATE shopping_list_items AS li
        SET purchased = $3
        FROM ingredients AS i
        WHERE li.id = $1 AND li.shopping_list_id = $2 AND i.id = li.ingredient_id
        RETURNING li.id, li.shopping_list_id, li.quantity, li.unit, li.purchased,
                  i.id AS ingredient_id, i.name AS ingredient_name
        "#,
    )
    .bind(item_id)
    .bind(list_id)
    .bind(purchased)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| ApiError::not_found("Item not found"))?;

    Ok(row.into())
}

async fn insert_items(
    conn: &mut PgConnection,
    list_id: Uuid,
    input: &ValidList,
) -> Result<(), ApiError> {
    for item in &input.items {
        let ingredient_id = ingredients::repo::ensure(conn, &item.ingredient_name).await?;
        sqlx::query(
            r#"
            INSERT INTO shopping_list_items
                (id, shopping_list_id, ingredient_id, quantity, unit, purchased)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(list_id)
        .bind(ingredient_id)
        .bind(item.quantity)
        .bind(item.unit.as_str())
        .bind(item.purchased)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_aggregate(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<ShoppingListResponse>, ApiError> {
    let Some(row) = sqlx::query_as::<_, ShoppingListRow>(
        r#"
        SELECT id, name, user_id, created_at
        FROM shopping_lists
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };
    let mut lists = assemble(conn, vec![row]).await?;
    Ok(lists.pop())
}

async fn assemble(
    conn: &mut PgConnection,
    rows: Vec<ShoppingListRow>,
) -> Result<Vec<ShoppingListResponse>, ApiError> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let item_rows = sqlx::query_as::<_, ItemRow>(
        r#"
        SELECT li.id, li.shopping_list_id, li.quantity, li.unit, li.purchased,
               i.id AS ingredient_id, i.name AS ingredient_name
        FROM shopping_list_items li
        JOIN ingredients i ON i.id = li.ingredient_id
        WHERE li.shopping_list_id = ANY($1)
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut items_by_list: HashMap<Uuid, Vec<ItemRow>> = HashMap::new();
    for r in item_rows {
        items_by_list.entry(r.shopping_list_id).or_default().push(r);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            ShoppingListResponse::from_rows(row, items_by_list.remove(&id).unwrap_or_default())
        })
        .collect())
}
