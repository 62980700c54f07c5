use super::dto::ShoppingListPayload;
use crate::error::{ApiError, FieldError};

#[derive(Debug, Clone, PartialEq)]
pub struct ValidList {
    pub name: String,
    pub items: Vec<ValidItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidItem {
    pub ingredient_name: String,
    pub quantity: f64,
    pub unit: String,
    pub purchased: bool,
}

/// Same accumulation style as the recipe rules; an empty items array is
/// legal (a list starts out blank).
pub fn validate_list(payload: ShoppingListPayload) -> Result<ValidList, ApiError> {
    let mut details = Vec::new();

    let name = payload.name.as_deref().unwrap_or("").trim().to_string();
    if name.is_empty() {
        details.push(FieldError::new("name", "Name is required"));
    }

    let mut items = Vec::new();
    for (i, item) in payload.items.unwrap_or_default().into_iter().enumerate() {
        let ingredient_name = item
            .ingredient_name
            .as_deref()
            .unwrap_or("")
            .trim()
            .to_string();
        if ingredient_name.is_empty() {
            details.push(FieldError::new(
                format!("items.{i}.ingredientName"),
                "Ingredient name is required",
            ));
        }
        let unit = item.unit.as_deref().unwrap_or("").trim().to_string();
        if unit.is_empty() {
            details.push(FieldError::new(format!("items.{i}.unit"), "Unit is required"));
        }
        let quantity = match item.quantity {
            Some(q) if q >= 0.0 => q,
            Some(_) => {
                details.push(FieldError::new(
                    format!("items.{i}.quantity"),
                    "Quantity must be positive",
                ));
                0.0
            }
            None => {
                details.push(FieldError::new(
                    format!("items.{i}.quantity"),
                    "Quantity is required",
                ));
                0.0
            }
        };
        items.push(ValidItem {
            ingredient_name,
            quantity,
            unit,
            purchased: item.purchased.unwrap_or(false),
        });
    }

    if !details.is_empty() {
        return Err(ApiError::validation("Invalid shopping list data", details));
    }
    Ok(ValidList { name, items })
}
