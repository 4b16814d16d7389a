//! Explains why no plan could be found
//!
//! The solvers only report "infeasible", so the likely culprit is guessed from cheap
//! necessary conditions on the candidate pool. The checks ignore interactions between
//! families, a pool can pass all of them and still be infeasible.
use serde::Serialize;

use crate::errors::PassFailure;
use crate::nutrition::constraints::OptimizationConstraints;
use crate::nutrition::recipe::Nutrient;
use crate::planner::constraints::{SolvePass, ToleranceBand};
use crate::planner::grid::{DecisionGrid, MealSlot};

/// Constraint family most likely responsible for infeasibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingFamily {
    MealAssignment,
    NutritionBounds,
    Variety,
    Undetermined,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassReport {
    pub pass: SolvePass,
    pub failure: PassFailure,
}

/// Attached to a `NoSolution` outcome
#[derive(Debug, Clone, PartialEq)]
pub struct FailureDiagnostics {
    /// The failure of each pass that ran, in order
    pub passes: Vec<PassReport>,
    pub likely_binding: BindingFamily,
    /// Human-readable findings of the checks
    pub notes: Vec<String>,
}

impl FailureDiagnostics {
    /// Inspect the pool after every pass failed
    pub fn diagnose(
        grid: &DecisionGrid,
        constraints: &OptimizationConstraints,
        passes: Vec<PassReport>,
    ) -> Self {
        let mut notes = Vec::new();
        let likely_binding = if let Some(slot_failure) = passes
            .iter()
            .find(|p| matches!(p.failure, PassFailure::UnsatisfiableSlot { .. }))
        {
            notes.push(slot_failure.failure.to_string());
            BindingFamily::MealAssignment
        } else if check_nutrition(grid, constraints, &mut notes) {
            BindingFamily::NutritionBounds
        } else if check_variety(grid, constraints, &mut notes) {
            BindingFamily::Variety
        } else {
            BindingFamily::Undetermined
        };
        FailureDiagnostics {
            passes,
            likely_binding,
            notes,
        }
    }

    /// Whether any pass ran out of time rather than proving infeasibility
    pub fn timed_out(&self) -> bool {
        self.passes
            .iter()
            .any(|p| p.failure == PassFailure::TimeLimit)
    }
}

/// Daily nutrient range reachable by picking any eligible recipe per slot, variety ignored
fn reachable_range(grid: &DecisionGrid, day: usize, nutrient: Nutrient) -> (f64, f64) {
    (0..grid.meals_per_day())
        .map(|slot| {
            grid.at_slot(MealSlot { day, slot })
                .iter()
                .map(|k| grid.recipe(k.recipe).macros.get(nutrient))
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(low, high), v| {
                    (low.min(v), high.max(v))
                })
        })
        .fold((0., 0.), |(low, high), (slot_low, slot_high)| {
            (low + slot_low, high + slot_high)
        })
}

/// True when some nutrient range of the relaxed band is out of reach on some day
fn check_nutrition(
    grid: &DecisionGrid,
    constraints: &OptimizationConstraints,
    notes: &mut Vec<String>,
) -> bool {
    let mut unreachable = false;
    for (nutrient, low, high) in ToleranceBand::RELAXED.daily_ranges(constraints) {
        // Every day offers the same recipes, so day 0 stands for all of them
        let (reach_low, reach_high) = reachable_range(grid, 0, nutrient);
        if reach_high < low {
            notes.push(format!(
                "At most {:.0} {} a day is reachable, the relaxed floor is {:.0}",
                reach_high, nutrient, low
            ));
            unreachable = true;
        } else if reach_low > high {
            notes.push(format!(
                "At least {:.0} {} a day is unavoidable, the relaxed ceiling is {:.0}",
                reach_low, nutrient, high
            ));
            unreachable = true;
        }
    }
    unreachable
}

/// True when there are too few recipes to fill a variety window without repeats
fn check_variety(
    grid: &DecisionGrid,
    constraints: &OptimizationConstraints,
    notes: &mut Vec<String>,
) -> bool {
    let window = constraints.max_recipe_repeat_in_days.min(grid.days());
    if window == 0 {
        return false;
    }
    let mut short = false;
    let needed = grid.meals_per_day() * window;
    if grid.candidates().len() < needed {
        notes.push(format!(
            "{} distinct recipes are needed to cover a {} day window, only {} are available",
            needed,
            window,
            grid.candidates().len()
        ));
        short = true;
    }
    for slot in 0..grid.meals_per_day() {
        let meal_slot = MealSlot { day: 0, slot };
        let eligible = grid.at_slot(meal_slot).len();
        if eligible < window {
            notes.push(format!(
                "Only {} recipes fit the {} slot, a {} day window needs {}",
                eligible,
                meal_slot.slot_type(),
                window,
                window
            ));
            short = true;
        }
    }
    short
}
