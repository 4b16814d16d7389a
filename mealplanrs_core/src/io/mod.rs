//! Module for reading recipe corpora and constraints, and writing plans
pub mod json;

use thiserror::Error;

use crate::nutrition::constraints::ConstraintsError;
use crate::nutrition::recipe::RecipeError;

#[derive(Error, Debug)]
pub enum IoError {
    #[error("Unable to read file due to {0}")]
    UnableToRead(String),
    #[error("Unable to parse json due to {0}")]
    UnableToParse(String),
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(#[from] RecipeError),
    #[error("Invalid constraints: {0}")]
    InvalidConstraints(#[from] ConstraintsError),
    #[error("Serde json error")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Unable to write to file")]
    UnableToWrite(#[from] std::io::Error),
}
