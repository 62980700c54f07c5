use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{Pagination, RecipeListResponse, RecipePayload, RecipeResponse};
use super::query::{page_count, parse_params, RawListParams};
use super::{repo, validate::validate_recipe};
use crate::{auth::AuthUser, error::ApiError, state::AppState};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/recipes", get(list_recipes).post(create_recipe))
        .route(
            "/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
}

// Path ids are opaque to callers; anything that is not one of ours is a miss.
fn parse_recipe_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Recipe not found"))
}

#[instrument(skip(state))]
pub async fn list_recipes(
    State(state): State<AppState>,
    Query(raw): Query<RawListParams>,
) -> Result<Json<RecipeListResponse>, ApiError> {
    let params = parse_params(raw)?;
    let (recipes, total) = repo::list(&state.db, &params).await?;
    Ok(Json(RecipeListResponse {
        recipes,
        pagination: Pagination {
            total,
            pages: page_count(total, params.limit),
            current_page: params.page,
            limit: params.limit,
        },
    }))
}

#[instrument(skip(state))]
pub async fn get_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let id = parse_recipe_id(&id)?;
    let recipe = repo::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Recipe not found"))?;
    Ok(Json(recipe))
}

#[instrument(skip(state, payload))]
pub async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeResponse>), ApiError> {
    let Json(payload) = payload?;
    let input = validate_recipe(payload)?;
    let recipe = repo::create(&state.db, Some(user_id), &input).await?;
    info!(user_id = %user_id, recipe_id = %recipe.id, title = %recipe.title, "recipe created");
    Ok((StatusCode::CREATED, Json(recipe)))
}

#[instrument(skip(state, payload))]
pub async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<Json<RecipeResponse>, ApiError> {
    let id = parse_recipe_id(&id)?;
    let Json(payload) = payload?;
    let input = validate_recipe(payload)?;
    let recipe = repo::update(&state.db, id, &input).await?;
    info!(user_id = %user_id, recipe_id = %id, "recipe updated");
    Ok(Json(recipe))
}

#[instrument(skip(state))]
pub async fn delete_recipe(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_recipe_id(&id)?;
    repo::delete(&state.db, id).await?;
    info!(recipe_id = %id, "recipe deleted");
    Ok(StatusCode::NO_CONTENT)
}
