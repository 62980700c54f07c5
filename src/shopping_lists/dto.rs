use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{ItemRow, ShoppingListRow};
use crate::ingredients::repo::Ingredient;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListPayload {
    pub name: Option<String>,
    pub items: Option<Vec<ItemPayload>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub ingredient_name: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub purchased: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct PurchasedPayload {
    pub purchased: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListResponse {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub items: Vec<ItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub quantity: f64,
    pub unit: String,
    pub purchased: bool,
    pub ingredient: Ingredient,
}

impl ShoppingListResponse {
    pub fn from_rows(list: ShoppingListRow, items: Vec<ItemRow>) -> Self {
        Self {
            id: list.id,
            name: list.name,
            user_id: list.user_id,
            created_at: list.created_at,
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ItemRow> for ItemResponse {
    fn from(r: ItemRow) -> Self {
        Self {
            id: r.id,
            quantity: r.quantity,
            unit: r.unit,
            purchased: r.purchased,
            ingredient: Ingredient {
                id: r.ingredient_id,
                name: r.ingredient_name,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_nests_the_ingredient() {
        let list_id = Uuid::new_v4();
        let response = ShoppingListResponse::from_rows(
            ShoppingListRow {
                id: list_id,
                name: "Weekend".into(),
                user_id: Uuid::new_v4(),
                created_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).unwrap(),
            },
            vec![ItemRow {
                id: Uuid::new_v4(),
                shopping_list_id: list_id,
                quantity: 6.0,
                unit: "pcs".into(),
                purchased: false,
                ingredient_id: Uuid::new_v4(),
                ingredient_name: "Eggs".into(),
            }],
        );
        let json = serde_json::to_value(&response).expect("serialize");
        assert_eq!(json["name"], "Weekend");
        assert_eq!(json["items"][0]["purchased"], false);
        assert_eq!(json["items"][0]["ingredient"]["name"], "Eggs");
        assert!(json["userId"].is_string());
    }

    #[test]
    fn item_payload_reads_camel_case_keys() {
        let item: ItemPayload =
            serde_json::from_str(r#"{"ingredientName": "Milk", "quantity": 1, "unit": "l"}"#)
                .expect("parses");
        assert_eq!(item.ingredient_name.as_deref(), Some("Milk"));
        assert_eq!(item.purchased, None);
    }
}
