//! Seeds a demo user, the starter registries, and one sample recipe.
//! Safe to run repeatedly; everything is keyed by natural keys.

use anyhow::Context;

use pantry::auth::password::hash_password;
use pantry::auth::repo::User;
use pantry::recipes::repo as recipes;
use pantry::recipes::validate::{ValidRecipe, ValidRecipeIngredient};
use pantry::state::AppState;
use pantry::{categories, ingredients};

const DEMO_EMAIL: &str = "demo@pantry.dev";
const DEMO_PASSWORD: &str = "demopass123";

const STARTER_CATEGORIES: &[&str] = &["Breakfast", "Lunch", "Dinner", "Dessert", "Vegetarian"];
const STARTER_INGREDIENTS: &[&str] = &[
    "Salt", "Pepper", "Olive Oil", "Garlic", "Onion", "Butter", "Flour", "Sugar", "Eggs", "Milk",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let state = AppState::init().await?;
    sqlx::migrate!("./migrations")
        .run(&state.db)
        .await
        .context("run migrations")?;

    let user = match User::find_by_email(&state.db, DEMO_EMAIL).await? {
        Some(u) => u,
        None => {
            let hash = hash_password(DEMO_PASSWORD)?;
            User::create(&state.db, DEMO_EMAIL, &hash, Some("Demo Cook")).await?
        }
    };
    tracing::info!(user_id = %user.id, email = %user.email, "demo user ready");

    let mut conn = state.db.acquire().await?;
    for name in STARTER_CATEGORIES {
        categories::repo::ensure(&mut conn, name).await?;
    }
    for name in STARTER_INGREDIENTS {
        ingredients::repo::ensure(&mut conn, name).await?;
    }
    drop(conn);
    tracing::info!(
        categories = STARTER_CATEGORIES.len(),
        ingredients = STARTER_INGREDIENTS.len(),
        "registries seeded"
    );

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
        .fetch_one(&state.db)
        .await?;
    if existing > 0 {
        tracing::info!(recipes = existing, "recipes already present; skipping sample");
        return Ok(());
    }

    let sample = ValidRecipe {
        title: "Garlic Butter Pasta".into(),
        description: Some("A weeknight staple with pantry basics.".into()),
        instructions: "Boil the pasta until al dente.\n\
                       Melt butter and soften the garlic in it.\n\
                       Toss the pasta in the garlic butter and season."
            .into(),
        image_url: None,
        ingredients: vec![
            ValidRecipeIngredient {
                name: "Garlic".into(),
                quantity: 3.0,
                unit: "clove".into(),
            },
            ValidRecipeIngredient {
                name: "Butter".into(),
                quantity: 50.0,
                unit: "g".into(),
            },
            ValidRecipeIngredient {
                name: "Salt".into(),
                quantity: 1.0,
                unit: "pinch".into(),
            },
        ],
        categories: vec!["Dinner".into(), "Vegetarian".into()],
    };
    let recipe = recipes::create(&state.db, Some(user.id), &sample).await?;
    tracing::info!(recipe_id = %recipe.id, title = %recipe.title, "sample recipe created");

    Ok(())
}
