use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{RecipeCategoryRow, RecipeIngredientRow, RecipeRow};
use crate::categories::repo::Category;
use crate::ingredients::repo::Ingredient;

// Requests deserialize into Options so a missing field becomes a field-level
// validation message instead of a serde rejection.

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipePayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub instructions: Option<String>,
    pub image_url: Option<String>,
    pub ingredients: Option<Vec<IngredientEntry>>,
    pub categories: Option<Vec<CategoryEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct IngredientEntry {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub ingredient: Option<NameRef>,
}

#[derive(Debug, Deserialize)]
pub struct CategoryEntry {
    pub category: Option<NameRef>,
}

#[derive(Debug, Deserialize)]
pub struct NameRef {
    pub name: Option<String>,
}

/// Canonical nested wire shape, both for single recipes and page items.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub image_url: Option<String>,
    pub user_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub ingredients: Vec<RecipeIngredientResponse>,
    pub categories: Vec<RecipeCategoryResponse>,
}

#[derive(Debug, Serialize)]
pub struct RecipeIngredientResponse {
    pub id: Uuid,
    pub quantity: f64,
    pub unit: String,
    pub ingredient: Ingredient,
}

#[derive(Debug, Serialize)]
pub struct RecipeCategoryResponse {
    pub id: Uuid,
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct RecipeListResponse {
    pub recipes: Vec<RecipeResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub pages: i64,
    pub current_page: i64,
    pub limit: i64,
}

impl RecipeResponse {
    pub fn from_rows(
        recipe: RecipeRow,
        ingredients: Vec<RecipeIngredientRow>,
        categories: Vec<RecipeCategoryRow>,
    ) -> Self {
        Self {
            id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            instructions: recipe.instructions,
            image_url: recipe.image_url,
            user_id: recipe.user_id,
            created_at: recipe.created_at,
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<RecipeIngredientRow> for RecipeIngredientResponse {
    fn from(r: RecipeIngredientRow) -> Self {
        Self {
            id: r.id,
            quantity: r.quantity,
            unit: r.unit,
            ingredient: Ingredient {
                id: r.ingredient_id,
                name: r.ingredient_name,
            },
        }
    }
}

impl From<RecipeCategoryRow> for RecipeCategoryResponse {
    fn from(r: RecipeCategoryRow) -> Self {
        Self {
            id: r.id,
            category: Category {
                id: r.category_id,
                name: r.category_name,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_serializes_the_nested_camel_case_shape() {
        let recipe_id = Uuid::new_v4();
        let created_at = OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap();
        let response = RecipeResponse::from_rows(
            RecipeRow {
                id: recipe_id,
                title: "Garlic Bread".into(),
                description: None,
                instructions: "Slice.\nToast.".into(),
                image_url: Some("https://example.com/bread.jpg".into()),
                user_id: None,
                created_at,
            },
            vec![RecipeIngredientRow {
                id: Uuid::new_v4(),
                recipe_id,
                quantity: 2.0,
                unit: "clove".into(),
                ingredient_id: Uuid::new_v4(),
                ingredient_name: "Garlic".into(),
            }],
            vec![RecipeCategoryRow {
                id: Uuid::new_v4(),
                recipe_id,
                category_id: Uuid::new_v4(),
                category_name: "Snack".into(),
            }],
        );

        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["imageUrl"], "https://example.com/bread.jpg");
        assert!(json["description"].is_null());
        assert_eq!(json["createdAt"], "2023-11-14T22:13:20Z");
        assert_eq!(json["ingredients"][0]["quantity"], 2.0);
        assert_eq!(json["ingredients"][0]["unit"], "clove");
        assert_eq!(json["ingredients"][0]["ingredient"]["name"], "Garlic");
        assert_eq!(json["categories"][0]["category"]["name"], "Snack");
    }

    #[test]
    fn empty_list_response_serializes_the_documented_body() {
        let json = serde_json::to_value(RecipeListResponse {
            recipes: vec![],
            pagination: Pagination {
                total: 0,
                pages: 0,
                current_page: 1,
                limit: 9,
            },
        })
        .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "recipes": [],
                "pagination": {"total": 0, "pages": 0, "currentPage": 1, "limit": 9}
            })
        );
    }

    #[test]
    fn payload_tolerates_missing_fields() {
        let payload: RecipePayload = serde_json::from_str("{}").expect("empty object parses");
        assert!(payload.title.is_none());
        assert!(payload.ingredients.is_none());
        assert!(payload.categories.is_none());
    }
}
