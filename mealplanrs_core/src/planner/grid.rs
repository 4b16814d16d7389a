//! The sparse grid of binary assignment variables `x[recipe][day][slot]`
//!
//! A variable only exists for a triple whose recipe is eligible for the slot, so the
//! problem stays small when most recipes only fit one meal.
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use tracing::debug;

use crate::errors::PlannerError;
use crate::nutrition::constraints::OptimizationConstraints;
use crate::nutrition::recipe::{Recipe, SlotType};
use crate::optimize::problem::{Problem, ProblemError};
use crate::planner::eligibility::is_eligible;

/// A `(day, slot)` coordinate of the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MealSlot {
    pub day: usize,
    pub slot: usize,
}

impl MealSlot {
    pub fn slot_type(&self) -> SlotType {
        SlotType::for_slot(self.slot)
    }
}

impl Display for MealSlot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "day {} {}", self.day, self.slot_type())
    }
}

/// Key of a decision variable, `recipe` is the position in the candidate pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridKey {
    pub recipe: usize,
    pub day: usize,
    pub slot: usize,
}

impl GridKey {
    /// Id of the variable in the optimization problem
    pub fn variable_id(&self) -> String {
        format!("x_{}_{}_{}", self.recipe, self.day, self.slot)
    }

    pub fn meal_slot(&self) -> MealSlot {
        MealSlot {
            day: self.day,
            slot: self.slot,
        }
    }
}

/// The decision variables of one solve pass, with lookups by recipe, day and slot
#[derive(Debug, Clone)]
pub struct DecisionGrid<'a> {
    candidates: Vec<&'a Recipe>,
    days: usize,
    meals_per_day: usize,
    /// Variable ids keyed by triple, in creation order
    variables: IndexMap<GridKey, String>,
    by_slot: IndexMap<MealSlot, Vec<GridKey>>,
    by_recipe: Vec<Vec<GridKey>>,
    by_day: Vec<Vec<GridKey>>,
}

impl<'a> DecisionGrid<'a> {
    /// Build the grid for `days` days
    ///
    /// Recipes over the prep time limit are dropped from the pool first. Fails with
    /// [`PlannerError::InsufficientCandidates`] when the remaining pool is smaller than
    /// twice the number of meals per day.
    pub fn build(
        recipes: &'a [Recipe],
        constraints: &OptimizationConstraints,
        days: usize,
    ) -> Result<Self, PlannerError> {
        let candidates = candidate_pool(recipes, constraints);
        let required = constraints.minimum_candidates();
        if candidates.len() < required {
            return Err(PlannerError::InsufficientCandidates {
                available: candidates.len(),
                required,
            });
        }

        let meals_per_day = constraints.meals_per_day;
        let mut grid = DecisionGrid {
            by_recipe: vec![Vec::new(); candidates.len()],
            by_day: vec![Vec::new(); days],
            by_slot: IndexMap::with_capacity(days * meals_per_day),
            variables: IndexMap::new(),
            candidates,
            days,
            meals_per_day,
        };
        for day in 0..days {
            for slot in 0..meals_per_day {
                // Every coordinate gets an entry, even if nothing is eligible for it
                let entry = grid.by_slot.entry(MealSlot { day, slot }).or_default();
                for (recipe, candidate) in grid.candidates.iter().enumerate() {
                    if !is_eligible(candidate, slot) {
                        continue;
                    }
                    let key = GridKey { recipe, day, slot };
                    entry.push(key);
                    grid.by_recipe[recipe].push(key);
                    grid.by_day[day].push(key);
                    grid.variables.insert(key, key.variable_id());
                }
            }
        }
        debug!(
            candidates = grid.candidates.len(),
            variables = grid.variables.len(),
            days,
            meals_per_day,
            "Built decision variable grid"
        );
        Ok(grid)
    }

    /// Add one binary variable per grid entry to the problem
    pub fn register(&self, problem: &mut Problem) -> Result<(), ProblemError> {
        self.variables
            .values()
            .try_for_each(|id| problem.add_new_binary_variable(id))
    }

    pub fn days(&self) -> usize {
        self.days
    }

    pub fn meals_per_day(&self) -> usize {
        self.meals_per_day
    }

    pub fn candidates(&self) -> &[&'a Recipe] {
        &self.candidates
    }

    pub fn recipe(&self, position: usize) -> &'a Recipe {
        self.candidates[position]
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Variable id of a triple, None when the recipe is not eligible for the slot
    pub fn variable(&self, key: &GridKey) -> Option<&str> {
        self.variables.get(key).map(String::as_str)
    }

    /// Every `(key, variable id)` pair
    pub fn iter(&self) -> impl Iterator<Item = (&GridKey, &str)> {
        self.variables.iter().map(|(k, v)| (k, v.as_str()))
    }

    /// Every coordinate of the plan, day major
    pub fn slots(&self) -> impl Iterator<Item = MealSlot> + '_ {
        self.by_slot.keys().copied()
    }

    pub fn at_slot(&self, slot: MealSlot) -> &[GridKey] {
        self.by_slot.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn on_day(&self, day: usize) -> &[GridKey] {
        self.by_day.get(day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn for_recipe(&self, recipe: usize) -> &[GridKey] {
        self.by_recipe.get(recipe).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Recipes that can be planned at all under the constraints
fn candidate_pool<'a>(recipes: &'a [Recipe], constraints: &OptimizationConstraints) -> Vec<&'a Recipe> {
    recipes
        .iter()
        .filter(|r| match constraints.max_prep_time_minutes {
            Some(limit) => r.prep_time_minutes <= limit,
            None => true,
        })
        .collect()
}
