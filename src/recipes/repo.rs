use std::collections::HashMap;

use sqlx::{FromRow, PgConnection, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::dto::RecipeResponse;
use super::query::{escape_like, ListParams};
use super::validate::ValidRecipe;
use crate::error::ApiError;
use crate::{categories, ingredients};

#[derive(Debug, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub image_url: Option<String>,
    pub user_id: Option<Uuid>,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, FromRow)]
pub struct RecipeIngredientRow {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub quantity: f64,
    pub unit: String,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
}

#[derive(Debug, FromRow)]
pub struct RecipeCategoryRow {
    pub id: Uuid,
    pub recipe_id: Uuid,
    pub category_id: Uuid,
    pub category_name: String,
}

// Both filters are optional; a NULL bind disables its predicate so one
// statement covers all four combinations. Search is case-insensitive
// substring containment over title and description.
const LIST_WHERE: &str = r#"
    ($1::TEXT IS NULL OR title ILIKE $1 OR description ILIKE $1)
    AND ($2::TEXT IS NULL OR EXISTS (
        SELECT 1
        FROM recipe_categories rc
        JOIN categories c ON c.id = rc.category_id
        WHERE rc.recipe_id = recipes.id AND c.name = $2))
"#;

/// One page of fully nested aggregates plus the unpaginated match count.
pub async fn list(
    db: &PgPool,
    params: &ListParams,
) -> Result<(Vec<RecipeResponse>, i64), ApiError> {
    let pattern = params
        .search
        .as_deref()
        .map(|s| format!("%{}%", escape_like(s)));

    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        r#"
        SELECT id, title, description, instructions, image_url, user_id, created_at
        FROM recipes
        WHERE {LIST_WHERE}
        ORDER BY created_at DESC, id DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(&pattern)
    .bind(&params.category)
    .bind(params.limit)
    .bind(params.offset())
    .fetch_all(db)
    .await?;

    let total = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM recipes WHERE {LIST_WHERE}"
    ))
    .bind(&pattern)
    .bind(&params.category)
    .fetch_one(db)
    .await?;

    let mut conn = db.acquire().await?;
    let recipes = assemble(&mut conn, rows).await?;
    Ok((recipes, total))
}

pub async fn get(db: &PgPool, id: Uuid) -> Result<Option<RecipeResponse>, ApiError> {
    let mut conn = db.acquire().await?;
    fetch_aggregate(&mut conn, id).await
}

pub async fn create(
    db: &PgPool,
    user_id: Option<Uuid>,
    input: &ValidRecipe,
) -> Result<RecipeResponse, ApiError> {
    let mut tx = db.begin().await?;
    let recipe_id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO recipes (id, title, description, instructions, image_url, user_id)
        VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(recipe_id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.instructions)
    .bind(&input.image_url)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    insert_children(&mut tx, recipe_id, input).await?;

    let recipe = fetch_aggregate(&mut tx, recipe_id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("created recipe not readable")))?;
    tx.commit().await?;
    Ok(recipe)
}

/// Replace-all-children update. The row lock serializes interleaved full
/// replacements, so readers only ever see one complete aggregate.
pub async fn update(
    db: &PgPool,
    id: Uuid,
    input: &ValidRecipe,
) -> Result<RecipeResponse, ApiError> {
    let mut tx = db.begin().await?;

    let existing = sqlx::query_scalar::<_, Uuid>("SELECT id FROM recipes WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    if existing.is_none() {
        return Err(ApiError::not_found("Recipe not found"));
    }

    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM recipe_categories WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        UPDATE recipes
        SET title = $2, description = $3, instructions = $4, image_url = $5
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(&input.title)
    .bind(&input.description)
    .bind(&input.instructions)
    .bind(&input.image_url)
    .execute(&mut *tx)
    .await?;

    insert_children(&mut tx, id, input).await?;

    let recipe = fetch_aggregate(&mut tx, id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("updated recipe not readable")))?;
    tx.commit().await?;
    Ok(recipe)
}

/// Removes the aggregate: join rows and the recipe row, never the shared
/// ingredient/category rows.
pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let mut tx = db.begin().await?;
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM recipe_categories WHERE recipe_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    let res = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if res.rows_affected() == 0 {
        return Err(ApiError::not_found("Recipe not found"));
    }
    tx.commit().await?;
    Ok(())
}

/// Upserts every referenced name and recreates the join rows. Duplicate
/// (recipe, ingredient) pairs are intentionally left alone.
async fn insert_children(
    conn: &mut PgConnection,
    recipe_id: Uuid,
    input: &ValidRecipe,
) -> Result<(), ApiError> {
    for ing in &input.ingredients {
        let ingredient_id = ingredients::repo::ensure(conn, &ing.name).await?;
        sqlx::query(
            r#"
            INSERT INTO recipe_ingredients (id, recipe_id, ingredient_id, quantity, unit)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recipe_id)
        .bind(ingredient_id)
        .bind(ing.quantity)
        .bind(&ing.unit)
        .execute(&mut *conn)
        .await?;
    }
    for name in &input.categories {
        let category_id = categories::repo::ensure(conn, name).await?;
        sqlx::query(
            r#"
            INSERT INTO recipe_categories (id, recipe_id, category_id)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(recipe_id)
        .bind(category_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn fetch_aggregate(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<RecipeResponse>, ApiError> {
    let Some(row) = sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT id, title, description, instructions, image_url, user_id, created_at
        FROM recipes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    else {
        return Ok(None);
    };
    let mut recipes = assemble(conn, vec![row]).await?;
    Ok(recipes.pop())
}

/// Two batch child loads, grouped in memory, in page order.
async fn assemble(
    conn: &mut PgConnection,
    rows: Vec<RecipeRow>,
) -> Result<Vec<RecipeResponse>, ApiError> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();

    let ingredient_rows = sqlx::query_as::<_, RecipeIngredientRow>(
        r#"
        SELECT ri.id, ri.recipe_id, ri.quantity, ri.unit,
               i.id AS ingredient_id, i.name AS ingredient_name
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ANY($1)
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let category_rows = sqlx::query_as::<_, RecipeCategoryRow>(
        r#"
        SELECT rc.id, rc.recipe_id, c.id AS category_id, c.name AS category_name
        FROM recipe_categories rc
        JOIN categories c ON c.id = rc.category_id
        WHERE rc.recipe_id = ANY($1)
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut ingredients_by_recipe: HashMap<Uuid, Vec<RecipeIngredientRow>> = HashMap::new();
    for r in ingredient_rows {
        ingredients_by_recipe.entry(r.recipe_id).or_default().push(r);
    }
    let mut categories_by_recipe: HashMap<Uuid, Vec<RecipeCategoryRow>> = HashMap::new();
    for r in category_rows {
        categories_by_recipe.entry(r.recipe_id).or_default().push(r);
    }

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.id;
            RecipeResponse::from_rows(
                row,
                ingredients_by_recipe.remove(&id).unwrap_or_default(),
                categories_by_recipe.remove(&id).unwrap_or_default(),
            )
        })
        .collect())
}
