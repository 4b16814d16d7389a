//! Recipes, macro nutrients and the nutritional targets a plan must meet

pub mod constraints;
pub mod recipe;
