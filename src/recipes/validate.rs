use url::Url;

use super::dto::RecipePayload;
use crate::error::{ApiError, FieldError};

/// A recipe payload after validation, with every field present and trimmed.
/// This is the only shape the repo accepts, so nothing unvalidated can reach
/// a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecipe {
    pub title: String,
    pub description: Option<String>,
    pub instructions: String,
    pub image_url: Option<String>,
    pub ingredients: Vec<ValidRecipeIngredient>,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidRecipeIngredient {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
}

/// Checks the whole payload and accumulates every violation, addressed with
/// the dotted paths the client form uses (`ingredients.2.quantity`).
pub fn validate_recipe(payload: RecipePayload) -> Result<ValidRecipe, ApiError> {
    let mut details = Vec::new();

    let title = required_text(payload.title, "title", "Title is required", &mut details);
    let instructions = required_text(
        payload.instructions,
        "instructions",
        "Instructions are required",
        &mut details,
    );

    // An empty string means "no image"; anything else must parse as a URL.
    let image_url = match payload.image_url.filter(|u| !u.is_empty()) {
        Some(u) => {
            if Url::parse(&u).is_err() {
                details.push(FieldError::new("imageUrl", "Invalid URL format"));
            }
            Some(u)
        }
        None => None,
    };

    let mut ingredients = Vec::new();
    match payload.ingredients {
        Some(entries) if !entries.is_empty() => {
            for (i, entry) in entries.into_iter().enumerate() {
                let name = required_text(
                    entry.ingredient.and_then(|r| r.name),
                    &format!("ingredients.{i}.ingredient.name"),
                    "Ingredient name is required",
                    &mut details,
                );
                let unit = required_text(
                    entry.unit,
                    &format!("ingredients.{i}.unit"),
                    "Unit is required",
                    &mut details,
                );
                let quantity = match entry.quantity {
                    Some(q) if q >= 0.0 => q,
                    Some(_) => {
                        details.push(FieldError::new(
                            format!("ingredients.{i}.quantity"),
                            "Quantity must be positive",
                        ));
                        0.0
                    }
                    None => {
                        details.push(FieldError::new(
                            format!("ingredients.{i}.quantity"),
                            "Quantity is required",
                        ));
                        0.0
                    }
                };
                ingredients.push(ValidRecipeIngredient {
                    name,
                    quantity,
                    unit,
                });
            }
        }
        _ => details.push(FieldError::new(
            "ingredients",
            "At least one ingredient is required",
        )),
    }

    let mut categories = Vec::new();
    match payload.categories {
        Some(entries) if !entries.is_empty() => {
            for (i, entry) in entries.into_iter().enumerate() {
                categories.push(required_text(
                    entry.category.and_then(|r| r.name),
                    &format!("categories.{i}.category.name"),
                    "Category name is required",
                    &mut details,
                ));
            }
        }
        _ => details.push(FieldError::new(
            "categories",
            "At least one category is required",
        )),
    }

    if !details.is_empty() {
        return Err(ApiError::validation("Invalid recipe data", details));
    }

    Ok(ValidRecipe {
        title,
        description: payload.description,
        instructions,
        image_url,
        ingredients,
        categories,
    })
}

fn required_text(
    value: Option<String>,
    field: &str,
    message: &str,
    details: &mut Vec<FieldError>,
) -> String {
    let trimmed = value.as_deref().unwrap_or("").trim();
    if trimmed.is_empty() {
        details.push(FieldError::new(field, message));
    }
    trimmed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: serde_json::Value) -> RecipePayload {
        serde_json::from_value(json).expect("payload parses")
    }

    fn fields_of(err: ApiError) -> Vec<String> {
        match err {
            ApiError::Validation { details, .. } => {
                details.into_iter().map(|d| d.field).collect()
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn full_payload() -> serde_json::Value {
        serde_json::json!({
            "title": "Garlic Butter Pasta",
            "description": "Weeknight staple.",
            "instructions": "Boil pasta.\nMelt butter with garlic.\nToss.",
            "imageUrl": "https://example.com/pasta.jpg",
            "ingredients": [
                {"quantity": 200.0, "unit": "g", "ingredient": {"name": "Spaghetti"}},
                {"quantity": 3.0, "unit": "clove", "ingredient": {"name": "Garlic"}}
            ],
            "categories": [{"category": {"name": "Dinner"}}]
        })
    }

    #[test]
    fn complete_payload_passes() {
        let valid = validate_recipe(payload(full_payload())).expect("valid payload");
        assert_eq!(valid.title, "Garlic Butter Pasta");
        assert_eq!(valid.ingredients.len(), 2);
        assert_eq!(valid.ingredients[1].name, "Garlic");
        assert_eq!(valid.categories, vec!["Dinner".to_string()]);
        assert_eq!(
            valid.image_url.as_deref(),
            Some("https://example.com/pasta.jpg")
        );
    }

    #[test]
    fn empty_object_reports_every_top_level_field() {
        let fields = fields_of(validate_recipe(payload(serde_json::json!({}))).unwrap_err());
        assert_eq!(
            fields,
            vec!["title", "instructions", "ingredients", "categories"]
        );
    }

    #[test]
    fn nested_failures_use_dotted_paths() {
        let mut body = full_payload();
        body["ingredients"][1]["quantity"] = serde_json::json!(-1.0);
        body["ingredients"][1]["unit"] = serde_json::json!("");
        let fields = fields_of(validate_recipe(payload(body)).unwrap_err());
        assert!(fields.contains(&"ingredients.1.quantity".to_string()));
        assert!(fields.contains(&"ingredients.1.unit".to_string()));
    }

    #[test]
    fn missing_ingredient_name_is_addressed_through_the_wrapper() {
        let mut body = full_payload();
        body["ingredients"][0]["ingredient"] = serde_json::json!({});
        let fields = fields_of(validate_recipe(payload(body)).unwrap_err());
        assert_eq!(fields, vec!["ingredients.0.ingredient.name"]);
    }

    #[test]
    fn empty_child_arrays_are_rejected() {
        let mut body = full_payload();
        body["ingredients"] = serde_json::json!([]);
        body["categories"] = serde_json::json!([]);
        let fields = fields_of(validate_recipe(payload(body)).unwrap_err());
        assert_eq!(fields, vec!["ingredients", "categories"]);
    }

    #[test]
    fn zero_quantity_is_allowed() {
        let mut body = full_payload();
        body["ingredients"][0]["quantity"] = serde_json::json!(0.0);
        assert!(validate_recipe(payload(body)).is_ok());
    }

    #[test]
    fn bad_image_url_is_rejected_but_empty_means_none() {
        let mut body = full_payload();
        body["imageUrl"] = serde_json::json!("not a url");
        let fields = fields_of(validate_recipe(payload(body)).unwrap_err());
        assert_eq!(fields, vec!["imageUrl"]);

        let mut body = full_payload();
        body["imageUrl"] = serde_json::json!("");
        let valid = validate_recipe(payload(body)).expect("empty url is none");
        assert_eq!(valid.image_url, None);
    }
}
