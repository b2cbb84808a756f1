//! Meal calorie estimation service.
//!
//! A free-text meal description goes through [`pipeline::MealPipeline`],
//! which asks a language model to split it into dishes and ingredients, sizes
//! each ingredient, and prices it from a food-composition database with
//! model and heuristic fallbacks. Completed estimates land in an in-memory
//! [`services::MealLog`] served over the HTTP API in [`api`].

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod models;
pub mod nutrition;
pub mod pipeline;
pub mod rate_limit;
pub mod services;
