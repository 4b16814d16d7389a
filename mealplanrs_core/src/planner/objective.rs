//! Scoring of recipes for the planner's objective
//!
//! Each decision variable gets a constant cost, so the objective stays linear whatever
//! strategy computes the cost. Lower is better.
use serde::{Deserialize, Serialize};

use crate::nutrition::constraints::OptimizationConstraints;
use crate::nutrition::recipe::{Recipe, SlotType};
use crate::optimize::problem::{Problem, ProblemError};
use crate::planner::grid::DecisionGrid;

/// Computes the cost of assigning a recipe to a slot
pub trait CostStrategy: Send + Sync {
    fn cost(&self, recipe: &Recipe, slot: SlotType, constraints: &OptimizationConstraints) -> f64;
}

/// The built in cost strategies, selectable from configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ObjectiveStrategy {
    /// `100 - protein`, favours high protein recipes
    #[default]
    ProteinProxy,
    /// Weighted sum of several nutrition signals, see [`ObjectiveWeights`]
    WeightedMacro(ObjectiveWeights),
}

impl CostStrategy for ObjectiveStrategy {
    fn cost(&self, recipe: &Recipe, slot: SlotType, constraints: &OptimizationConstraints) -> f64 {
        match self {
            ObjectiveStrategy::ProteinProxy => ProteinProxy.cost(recipe, slot, constraints),
            ObjectiveStrategy::WeightedMacro(weights) => weights.cost(recipe, slot, constraints),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ProteinProxy;

impl CostStrategy for ProteinProxy {
    fn cost(&self, recipe: &Recipe, _slot: SlotType, _constraints: &OptimizationConstraints) -> f64 {
        100. - recipe.macros.protein_g
    }
}

/// Weights of the multi term cost
///
/// `cost = calorie_deviation * |calories - per meal target|
///       - protein * protein_g - fiber * fiber_g + prep_time * prep_time_minutes`
///
/// The per meal calorie target is the middle of the daily calorie range split evenly over
/// the meals of a day, the deviation term is dropped when there is no calorie target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveWeights {
    pub protein: f64,
    pub calorie_deviation: f64,
    pub fiber: f64,
    pub prep_time: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        ObjectiveWeights {
            protein: 1.,
            calorie_deviation: 0.1,
            fiber: 0.5,
            prep_time: 0.05,
        }
    }
}

impl CostStrategy for ObjectiveWeights {
    fn cost(&self, recipe: &Recipe, _slot: SlotType, constraints: &OptimizationConstraints) -> f64 {
        let macros = &recipe.macros;
        let deviation = per_meal_calorie_target(constraints)
            .map(|target| (macros.calories - target).abs())
            .unwrap_or(0.);
        self.calorie_deviation * deviation - self.protein * macros.protein_g
            - self.fiber * macros.fiber_g
            + self.prep_time * recipe.prep_time_minutes
    }
}

fn per_meal_calorie_target(constraints: &OptimizationConstraints) -> Option<f64> {
    let min = constraints.daily_calories_min;
    let daily = match constraints.daily_calories_max {
        Some(max) => (min + max) / 2.,
        None if min > 0. => min,
        None => return None,
    };
    Some(daily / constraints.meals_per_day.max(1) as f64)
}

/// Add `cost * x` for every variable of the grid to the problem's objective
pub fn build_objective(
    grid: &DecisionGrid,
    strategy: &dyn CostStrategy,
    constraints: &OptimizationConstraints,
    problem: &mut Problem,
) -> Result<(), ProblemError> {
    for (key, variable_id) in grid.iter() {
        let cost = strategy.cost(grid.recipe(key.recipe), key.meal_slot().slot_type(), constraints);
        problem.add_new_linear_objective_term(variable_id, cost)?;
    }
    Ok(())
}
