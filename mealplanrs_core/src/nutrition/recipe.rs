//! This module provides the recipe and meal slot vocabulary the planner works with
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use derive_builder::Builder;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// A candidate recipe, as supplied by the recipe corpus
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(setter(into))]
pub struct Recipe {
    /// Used to identify the recipe
    pub id: String,
    /// Human-readable title
    #[builder(default = "String::new()")]
    #[serde(default)]
    pub title: String,
    /// Meal types the recipe is suitable for
    ///
    /// An empty set, or a set with three or more entries, means the recipe suits any slot
    #[builder(default = "BTreeSet::new()")]
    #[serde(default)]
    pub meal_types: BTreeSet<MealType>,
    /// Nutrition of a single serving
    #[builder(default = "MacroProfile::default()")]
    #[serde(flatten)]
    pub macros: MacroProfile,
    /// Preparation time in minutes
    #[builder(default = "0.")]
    #[serde(default)]
    pub prep_time_minutes: f64,
}

impl Recipe {
    /// Whether the recipe is treated as suitable for every slot
    pub fn is_unrestricted(&self) -> bool {
        self.meal_types.is_empty() || self.meal_types.len() >= 3
    }
}

impl Display for Recipe {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.title.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.title, self.id)
        }
    }
}

/// Macro nutrients of a serving (or of a sum of servings)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacroProfile {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub fiber_g: f64,
}

impl MacroProfile {
    pub fn new(calories: f64, protein_g: f64, carbs_g: f64, fat_g: f64, fiber_g: f64) -> Self {
        MacroProfile {
            calories,
            protein_g,
            carbs_g,
            fat_g,
            fiber_g,
        }
    }

    /// Value of a single nutrient
    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein_g,
            Nutrient::Carbs => self.carbs_g,
            Nutrient::Fat => self.fat_g,
            Nutrient::Fiber => self.fiber_g,
        }
    }

    /// Divide every nutrient by `n`, zero when `n` is zero
    pub fn averaged_over(&self, n: usize) -> MacroProfile {
        if n == 0 {
            return MacroProfile::default();
        }
        let n = n as f64;
        MacroProfile::new(
            self.calories / n,
            self.protein_g / n,
            self.carbs_g / n,
            self.fat_g / n,
            self.fiber_g / n,
        )
    }
}

impl Add for MacroProfile {
    type Output = MacroProfile;

    fn add(self, rhs: Self) -> Self::Output {
        MacroProfile::new(
            self.calories + rhs.calories,
            self.protein_g + rhs.protein_g,
            self.carbs_g + rhs.carbs_g,
            self.fat_g + rhs.fat_g,
            self.fiber_g + rhs.fiber_g,
        )
    }
}

impl AddAssign for MacroProfile {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// A nutrient tracked in [`MacroProfile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nutrient {
    Calories,
    Protein,
    Carbs,
    Fat,
    Fiber,
}

impl Display for Nutrient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Nutrient::Calories => "calories",
            Nutrient::Protein => "protein",
            Nutrient::Carbs => "carbs",
            Nutrient::Fat => "fat",
            Nutrient::Fiber => "fiber",
        };
        write!(f, "{}", name)
    }
}

/// Named meal types, in slot order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    /// Named part of the slot vocabulary, slot `i` of a day is `VOCABULARY[i]`
    pub const VOCABULARY: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    /// Named meal type of a slot, None past the named vocabulary
    pub fn for_slot(slot_index: usize) -> Option<MealType> {
        Self::VOCABULARY.get(slot_index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MealType::Breakfast => "breakfast",
            MealType::Lunch => "lunch",
            MealType::Dinner => "dinner",
            MealType::Snack => "snack",
        }
    }
}

impl Display for MealType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MealType {
    type Err = RecipeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(MealType::Breakfast),
            "lunch" => Ok(MealType::Lunch),
            "dinner" => Ok(MealType::Dinner),
            "snack" => Ok(MealType::Snack),
            other => Err(RecipeError::UnknownMealType(other.to_string())),
        }
    }
}

/// Type of a slot within a day: a named meal, or an extra meal past the vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SlotType {
    Named(MealType),
    /// Slot index past the named vocabulary, displayed as `meal_{index}`
    Extra(usize),
}

impl SlotType {
    pub fn for_slot(slot_index: usize) -> SlotType {
        match MealType::for_slot(slot_index) {
            Some(meal_type) => SlotType::Named(meal_type),
            None => SlotType::Extra(slot_index),
        }
    }
}

impl Display for SlotType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SlotType::Named(meal_type) => write!(f, "{}", meal_type),
            SlotType::Extra(index) => write!(f, "meal_{}", index),
        }
    }
}

impl Serialize for SlotType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecipeError {
    #[error("Unknown meal type {0}")]
    UnknownMealType(String),
    #[error("Recipe {id} is tagged with unknown meal type {meal_type}")]
    UnknownRecipeMealType { id: String, meal_type: String },
    #[error("Recipe {id} has a negative or non-finite {nutrient} value")]
    InvalidNutrient { id: String, nutrient: Nutrient },
    #[error("Recipe {id} has a negative or non-finite prep time")]
    InvalidPrepTime { id: String },
}

/// Check that every nutrient and the prep time of a recipe is finite and non-negative
pub fn validate_recipe(recipe: &Recipe) -> Result<(), RecipeError> {
    let nutrients = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Carbs,
        Nutrient::Fat,
        Nutrient::Fiber,
    ];
    for nutrient in nutrients {
        let value = recipe.macros.get(nutrient);
        if value < 0. || !value.is_finite() {
            return Err(RecipeError::InvalidNutrient {
                id: recipe.id.clone(),
                nutrient,
            });
        }
    }
    if recipe.prep_time_minutes < 0. || !recipe.prep_time_minutes.is_finite() {
        return Err(RecipeError::InvalidPrepTime {
            id: recipe.id.clone(),
        });
    }
    Ok(())
}
