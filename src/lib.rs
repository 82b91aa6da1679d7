//! LabelLens backend: product lookup against Open Food Facts, optional USDA
//! nutrient detail, derived health flags, and per-user list preferences.

pub mod app;
pub mod auth;
pub mod cache;
pub mod config;
pub mod errors;
pub mod external;
pub mod meta;
pub mod products;
pub mod state;
