pub mod app;
pub mod auth;
pub mod categories;
pub mod config;
pub mod error;
pub mod ingredients;
pub mod recipes;
pub mod shopping_lists;
pub mod state;
