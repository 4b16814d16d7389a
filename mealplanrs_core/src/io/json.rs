//! JSON IO for recipe corpora, constraints and finished plans
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::IoError;
use crate::nutrition::constraints::OptimizationConstraints;
use crate::nutrition::recipe::{validate_recipe, MacroProfile, MealType, Recipe, RecipeError};
use crate::planner::extract::WeekPlan;

// region JSON Recipe
/// A recipe as a corpus provider serializes it
///
/// Meal types are free strings here and are checked against the vocabulary on conversion.
#[derive(Serialize, Deserialize)]
struct JsonRecipe {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    meal_types: Vec<String>,
    #[serde(default)]
    calories: f64,
    #[serde(default)]
    protein_g: f64,
    #[serde(default)]
    carbs_g: f64,
    #[serde(default)]
    fat_g: f64,
    #[serde(default)]
    fiber_g: f64,
    #[serde(default)]
    prep_time_minutes: Option<f64>,
}
// endregion JSON Recipe

// region Conversions
impl TryFrom<JsonRecipe> for Recipe {
    type Error = IoError;

    fn try_from(r: JsonRecipe) -> Result<Self, Self::Error> {
        let meal_types = r
            .meal_types
            .iter()
            .map(|m| {
                m.parse::<MealType>()
                    .map_err(|_| RecipeError::UnknownRecipeMealType {
                        id: r.id.clone(),
                        meal_type: m.clone(),
                    })
            })
            .collect::<Result<_, _>>()?;
        let recipe = Recipe {
            id: r.id,
            title: r.title.unwrap_or_default(),
            meal_types,
            macros: MacroProfile::new(r.calories, r.protein_g, r.carbs_g, r.fat_g, r.fiber_g),
            prep_time_minutes: r.prep_time_minutes.unwrap_or_default(),
        };
        validate_recipe(&recipe)?;
        Ok(recipe)
    }
}
// endregion Conversions

/// Read an array of recipe objects
///
/// The corpus is read all or nothing: a single recipe with an unknown meal type tag, a
/// negative or non-finite value, or a negative prep time rejects the whole corpus, and the
/// error names the offending recipe. Dropping an unknown tag instead would silently widen
/// the slots a recipe may fill.
pub fn read_recipes_from_str(data: &str) -> Result<Vec<Recipe>, IoError> {
    let json_recipes = match serde_json::from_str::<Vec<JsonRecipe>>(data) {
        Ok(recipes) => recipes,
        Err(err) => return Err(IoError::UnableToParse(format!("{:?}", err))),
    };
    json_recipes.into_iter().map(Recipe::try_from).collect()
}

pub fn read_recipes_from_file<P: AsRef<Path>>(path: P) -> Result<Vec<Recipe>, IoError> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) => return Err(IoError::UnableToRead(format!("{:?}", err))),
    };
    read_recipes_from_str(&data)
}

/// Read constraints, missing fields take their default value
pub fn read_constraints_from_str(data: &str) -> Result<OptimizationConstraints, IoError> {
    let constraints = match serde_json::from_str::<OptimizationConstraints>(data) {
        Ok(constraints) => constraints,
        Err(err) => return Err(IoError::UnableToParse(format!("{:?}", err))),
    };
    constraints.validate()?;
    Ok(constraints)
}

pub fn write_plan_to_string(plan: &WeekPlan) -> Result<String, IoError> {
    Ok(serde_json::to_string_pretty(plan)?)
}

pub fn write_plan_to_file<P: AsRef<Path>>(plan: &WeekPlan, path: P) -> Result<(), IoError> {
    fs::write(path, write_plan_to_string(plan)?)?;
    Ok(())
}

#[cfg(test)]
mod json_tests {
    use super::*;
    use std::path::PathBuf;

    const CORPUS: &str = r#"[
        {
            "id": "oats",
            "title": "Overnight oats",
            "meal_types": ["Breakfast"],
            "calories": 450.0,
            "protein_g": 25.0,
            "carbs_g": 60.0,
            "fat_g": 12.0,
            "fiber_g": 8.0,
            "prep_time_minutes": 5.0
        },
        {
            "id": "stew",
            "meal_types": ["lunch", "dinner"],
            "calories": 700.0,
            "protein_g": 45.0
        },
        {
            "id": "trail_mix",
            "calories": 300.0
        }
    ]"#;

    #[test]
    fn json_recipes() {
        let recipes = read_recipes_from_str(CORPUS).unwrap();
        assert_eq!(recipes.len(), 3);
        assert_eq!(recipes[0].title, "Overnight oats");
        assert!(recipes[0].meal_types.contains(&MealType::Breakfast));
        assert_eq!(recipes[0].macros.fiber_g, 8.);
        assert_eq!(recipes[1].meal_types.len(), 2);
        assert_eq!(recipes[1].macros.carbs_g, 0.);
        assert_eq!(recipes[1].prep_time_minutes, 0.);
        assert!(recipes[2].is_unrestricted());
    }

    #[test]
    fn json_recipe_errors() {
        // One bad tag rejects the corpus, and the error points at the recipe
        let unknown = r#"[
            {"id": "oats", "meal_types": ["breakfast"]},
            {"id": "x", "meal_types": ["lunch", "brunch"]}
        ]"#;
        match read_recipes_from_str(unknown) {
            Err(IoError::InvalidRecipe(RecipeError::UnknownRecipeMealType { id, meal_type })) => {
                assert_eq!(id, "x");
                assert_eq!(meal_type, "brunch");
            }
            other => panic!("Unexpected result {:?}", other),
        }
        let negative = r#"[{"id": "x", "calories": -5.0}]"#;
        assert!(matches!(
            read_recipes_from_str(negative),
            Err(IoError::InvalidRecipe(RecipeError::InvalidNutrient { .. }))
        ));
        let slow = r#"[{"id": "x", "calories": 300.0, "prep_time_minutes": -5.0}]"#;
        assert!(matches!(
            read_recipes_from_str(slow),
            Err(IoError::InvalidRecipe(RecipeError::InvalidPrepTime { .. }))
        ));
        assert!(matches!(
            read_recipes_from_str("{not json"),
            Err(IoError::UnableToParse(_))
        ));
        let missing = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("no_such_corpus.json");
        assert!(matches!(
            read_recipes_from_file(missing),
            Err(IoError::UnableToRead(_))
        ));
    }

    #[test]
    fn json_constraints() {
        let constraints = read_constraints_from_str(
            r#"{"daily_calories_min": 2000, "daily_calories_max": 2500, "daily_protein_min": 150}"#,
        )
        .unwrap();
        assert_eq!(constraints.daily_calories_max, Some(2500.));
        assert_eq!(constraints.meals_per_day, 3);
        assert_eq!(constraints.max_recipe_repeat_in_days, 2);

        assert!(matches!(
            read_constraints_from_str(r#"{"daily_calories_min": 2600, "daily_calories_max": 2500}"#),
            Err(IoError::InvalidConstraints(_))
        ));
    }
}
