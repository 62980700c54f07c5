use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{ItemResponse, PurchasedPayload, ShoppingListPayload, ShoppingListResponse};
use super::{repo, validate::validate_list};
use crate::{
    auth::AuthUser,
    error::{ApiError, FieldError},
    state::AppState,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/shopping-lists", get(list_lists).post(create_list))
        .route(
            "/shopping-lists/:id",
            get(get_list).put(update_list).delete(delete_list),
        )
        .route(
            "/shopping-lists/:list_id/items/:item_id",
            patch(set_item_purchased),
        )
}

fn parse_list_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found("Shopping list not found"))
}

#[instrument(skip(state))]
pub async fn list_lists(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<ShoppingListResponse>>, ApiError> {
    let lists = repo::list_by_user(&state.db, user_id).await?;
    Ok(Json(lists))
}

#[instrument(skip(state))]
pub async fn get_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ShoppingListResponse>, ApiError> {
    let id = parse_list_id(&id)?;
    let list = repo::get(&state.db, user_id, id)
        .await?
        .ok_or_else(|| ApiError::not_found("Shopping list not found"))?;
    Ok(Json(list))
}

#[instrument(skip(state, payload))]
pub async fn create_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ShoppingListPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<ShoppingListResponse>), ApiError> {
    let Json(payload) = payload?;
    let input = validate_list(payload)?;
    let list = repo::create(&state.db, user_id, &input).await?;
    info!(user_id = %user_id, list_id = %list.id, "shopping list created");
    Ok((StatusCode::CREATED, Json(list)))
}

#[instrument(skip(state, payload))]
pub async fn update_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<ShoppingListPayload>, JsonRejection>,
) -> Result<Json<ShoppingListResponse>, ApiError> {
    let id = parse_list_id(&id)?;
    let Json(payload) = payload?;
    let input = validate_list(payload)?;
    let list = repo::update(&state.db, user_id, id, &input).await?;
    info!(user_id = %user_id, list_id = %id, "shopping list updated");
    Ok(Json(list))
}

#[instrument(skip(state))]
pub async fn delete_list(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_list_id(&id)?;
    repo::delete(&state.db, user_id, id).await?;
    info!(user_id = %user_id, list_id = %id, "shopping list deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, payload))]
pub async fn set_item_purchased(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((list_id, item_id)): Path<(String, String)>,
    payload: Result<Json<PurchasedPayload>, JsonRejection>,
) -> Result<Json<ItemResponse>, ApiError> {
    let list_id = parse_list_id(&list_id)?;
    let item_id = Uuid::parse_str(&item_id).map_err(|_| ApiError::not_found("Item not found"))?;
    let Json(payload) = payload?;
    let purchased = payload.purchased.ok_or_else(|| {
        ApiError::validation(
            "Invalid item data",
            vec![FieldError::new("purchased", "Purchased is required")],
        )
    })?;
    let item = repo::set_purchased(&state.db, user_id, list_id, item_id, purchased).await?;
    info!(user_id = %user_id, list_id = %list_id, item_id = %item_id, purchased, "item toggled");
    Ok(Json(item))
}
