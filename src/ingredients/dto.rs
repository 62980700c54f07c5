use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct IngredientPayload {
    #[serde(default)]
    pub name: String,
}
