//! Caller supplied nutritional targets and planning rules
use std::collections::BTreeSet;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Targets and rules for a meal plan
///
/// Unset optional bounds are unbounded. `dietary_restrictions` and `allergens` are applied
/// by whoever assembles the candidate recipes, the planner carries them but does not
/// filter on them.
#[derive(Builder, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct OptimizationConstraints {
    #[builder(default = "0.")]
    pub daily_calories_min: f64,
    #[builder(default = "None", setter(strip_option))]
    pub daily_calories_max: Option<f64>,
    #[builder(default = "0.")]
    pub daily_protein_min: f64,
    #[builder(default = "None", setter(strip_option))]
    pub daily_carbs_min: Option<f64>,
    #[builder(default = "None", setter(strip_option))]
    pub daily_carbs_max: Option<f64>,
    #[builder(default = "None", setter(strip_option))]
    pub daily_fat_min: Option<f64>,
    #[builder(default = "None", setter(strip_option))]
    pub daily_fat_max: Option<f64>,
    #[builder(default = "None", setter(strip_option))]
    pub daily_fiber_min: Option<f64>,
    #[builder(default = "3")]
    pub meals_per_day: usize,
    /// Size of the sliding window of days in which a recipe may appear at most once
    #[builder(default = "2")]
    pub max_recipe_repeat_in_days: usize,
    #[builder(default = "None", setter(strip_option))]
    pub max_prep_time_minutes: Option<f64>,
    #[builder(default = "BTreeSet::new()")]
    pub dietary_restrictions: BTreeSet<String>,
    #[builder(default = "BTreeSet::new()")]
    pub allergens: BTreeSet<String>,
}

impl Default for OptimizationConstraints {
    fn default() -> Self {
        OptimizationConstraints {
            daily_calories_min: 0.,
            daily_calories_max: None,
            daily_protein_min: 0.,
            daily_carbs_min: None,
            daily_carbs_max: None,
            daily_fat_min: None,
            daily_fat_max: None,
            daily_fiber_min: None,
            meals_per_day: 3,
            max_recipe_repeat_in_days: 2,
            max_prep_time_minutes: None,
            dietary_restrictions: BTreeSet::new(),
            allergens: BTreeSet::new(),
        }
    }
}

impl OptimizationConstraints {
    /// Upper daily calorie bound, infinite when unset
    pub fn calories_max(&self) -> f64 {
        self.daily_calories_max.unwrap_or(f64::INFINITY)
    }

    /// Smallest candidate pool the planner accepts
    pub fn minimum_candidates(&self) -> usize {
        self.meals_per_day * 2
    }

    /// Check the invariants of the constraints
    pub fn validate(&self) -> Result<(), ConstraintsError> {
        if self.meals_per_day == 0 {
            return Err(ConstraintsError::NoMeals);
        }
        let named = [
            ("daily_calories_min", Some(self.daily_calories_min)),
            ("daily_calories_max", self.daily_calories_max),
            ("daily_protein_min", Some(self.daily_protein_min)),
            ("daily_carbs_min", self.daily_carbs_min),
            ("daily_carbs_max", self.daily_carbs_max),
            ("daily_fat_min", self.daily_fat_min),
            ("daily_fat_max", self.daily_fat_max),
            ("daily_fiber_min", self.daily_fiber_min),
            ("max_prep_time_minutes", self.max_prep_time_minutes),
        ];
        for (name, value) in named {
            if let Some(value) = value {
                if value < 0. || value.is_nan() {
                    return Err(ConstraintsError::NegativeBound(name));
                }
            }
        }
        let pairs = [
            ("daily_calories", Some(self.daily_calories_min), self.daily_calories_max),
            ("daily_carbs", self.daily_carbs_min, self.daily_carbs_max),
            ("daily_fat", self.daily_fat_min, self.daily_fat_max),
        ];
        for (name, min, max) in pairs {
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(ConstraintsError::InvertedBounds(name));
                }
            }
        }
        Ok(())
    }
}

impl OptimizationConstraintsBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.meals_per_day == Some(0) {
            return Err(ConstraintsError::NoMeals.to_string());
        }
        Ok(())
    }
}

/// Violations of the [`OptimizationConstraints`] invariants
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintsError {
    #[error("meals_per_day must be at least 1")]
    NoMeals,
    #[error("{0} must not be negative")]
    NegativeBound(&'static str),
    #[error("{0}_min is greater than {0}_max")]
    InvertedBounds(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let constraints = OptimizationConstraintsBuilder::default()
            .daily_calories_min(2000.)
            .daily_calories_max(2400.)
            .build()
            .unwrap();
        assert_eq!(constraints.meals_per_day, 3);
        assert_eq!(constraints.max_recipe_repeat_in_days, 2);
        assert_eq!(constraints.calories_max(), 2400.);
        assert_eq!(constraints.minimum_candidates(), 6);
        assert!(constraints.validate().is_ok());
    }

    #[test]
    fn unset_max_is_unbounded() {
        let constraints = OptimizationConstraints::default();
        assert!(constraints.calories_max().is_infinite());
        assert!(constraints.daily_carbs_max.is_none());
    }

    #[test]
    fn invariants() {
        assert!(OptimizationConstraintsBuilder::default()
            .meals_per_day(0usize)
            .build()
            .is_err());

        let constraints = OptimizationConstraints {
            daily_calories_min: 2500.,
            daily_calories_max: Some(2000.),
            ..Default::default()
        };
        assert_eq!(
            constraints.validate(),
            Err(ConstraintsError::InvertedBounds("daily_calories"))
        );

        let constraints = OptimizationConstraints {
            daily_fat_min: Some(-1.),
            ..Default::default()
        };
        assert_eq!(
            constraints.validate(),
            Err(ConstraintsError::NegativeBound("daily_fat_min"))
        );
    }

    #[test]
    fn deserialize_partial() {
        let constraints: OptimizationConstraints = serde_json::from_str(
            r#"{"daily_calories_min": 1800, "daily_calories_max": 2200, "meals_per_day": 4}"#,
        )
        .unwrap();
        assert_eq!(constraints.meals_per_day, 4);
        assert_eq!(constraints.daily_calories_max, Some(2200.));
        assert_eq!(constraints.max_recipe_repeat_in_days, 2);
    }
}
