use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{dto::IngredientPayload, repo};
use crate::{
    auth::AuthUser,
    error::{ApiError, FieldError},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ingredients", get(list_ingredients).post(create_ingredient))
        .route(
            "/ingredients/:id",
            put(update_ingredient).delete(delete_ingredient),
        )
}

fn require_name(payload: &IngredientPayload) -> Result<&str, ApiError> {
    let name = payload.name.trim();
    if name.is_empty() {
        return Err(ApiError::validation(
            "Invalid ingredient data",
            vec![FieldError::new("name", "Name is required")],
        ));
    }
    Ok(name)
}

#[instrument(skip(state))]
pub async fn list_ingredients(
    State(state): State<AppState>,
) -> Result<Json<Vec<repo::Ingredient>>, ApiError> {
    let rows = repo::list(&state.db).await?;
    Ok(Json(rows))
}

#[instrument(skip(state, payload))]
pub async fn create_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<IngredientPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<repo::Ingredient>), ApiError> {
    let Json(payload) = payload?;
    let name = require_name(&payload)?;
    let row = repo::create(&state.db, name).await?;
    info!(user_id = %user_id, ingredient = %row.name, "ingredient created");
    Ok((StatusCode::CREATED, Json(row)))
}

#[instrument(skip(state, payload))]
pub async fn update_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<IngredientPayload>, JsonRejection>,
) -> Result<Json<repo::Ingredient>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("Ingredient not found"))?;
    let Json(payload) = payload?;
    let name = require_name(&payload)?;
    let row = repo::rename(&state.db, id, name).await?;
    info!(user_id = %user_id, ingredient_id = %id, "ingredient renamed");
    Ok(Json(row))
}

#[instrument(skip(state))]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("Ingredient not found"))?;
    repo::delete(&state.db, id).await?;
    info!(user_id = %user_id, ingredient_id = %id, "ingredient deleted");
    Ok(StatusCode::NO_CONTENT)
}
