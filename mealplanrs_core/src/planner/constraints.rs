//! Generates the meal assignment, nutrition and variety constraints of a solve pass
use serde::Serialize;
use tracing::debug;

use crate::errors::PassFailure;
use crate::nutrition::constraints::OptimizationConstraints;
use crate::nutrition::recipe::Nutrient;
use crate::optimize::problem::Problem;
use crate::planner::grid::DecisionGrid;

/// Which of the two solve passes is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvePass {
    Strict,
    Relaxed,
}

impl SolvePass {
    pub fn band(&self) -> ToleranceBand {
        match self {
            SolvePass::Strict => ToleranceBand::STRICT,
            SolvePass::Relaxed => ToleranceBand::RELAXED,
        }
    }
}

/// Multipliers widening the daily nutrition targets
///
/// A day's total of a nutrient must lie in `[min * lower, max * upper]`, protein only has
/// the lower bound `min * protein`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceBand {
    pub lower: f64,
    pub upper: f64,
    pub protein: f64,
}

impl ToleranceBand {
    pub const STRICT: ToleranceBand = ToleranceBand {
        lower: 0.85,
        upper: 1.15,
        protein: 0.9,
    };
    pub const RELAXED: ToleranceBand = ToleranceBand {
        lower: 0.70,
        upper: 1.30,
        protein: 0.8,
    };

    /// Allowed daily range for a `(min, max)` target pair, unset bounds are open
    pub fn range(&self, min: Option<f64>, max: Option<f64>) -> (f64, f64) {
        (
            min.map(|m| m * self.lower).unwrap_or(0.),
            max.map(|m| m * self.upper).unwrap_or(f64::INFINITY),
        )
    }

    /// Allowed daily range of each constrained nutrient
    pub fn daily_ranges(&self, constraints: &OptimizationConstraints) -> Vec<(Nutrient, f64, f64)> {
        let mut ranges = Vec::with_capacity(5);
        let (low, high) = self.range(
            Some(constraints.daily_calories_min),
            constraints.daily_calories_max,
        );
        ranges.push((Nutrient::Calories, low, high));
        ranges.push((
            Nutrient::Protein,
            constraints.daily_protein_min * self.protein,
            f64::INFINITY,
        ));
        let (low, high) = self.range(constraints.daily_carbs_min, constraints.daily_carbs_max);
        ranges.push((Nutrient::Carbs, low, high));
        let (low, high) = self.range(constraints.daily_fat_min, constraints.daily_fat_max);
        ranges.push((Nutrient::Fat, low, high));
        let (low, high) = self.range(constraints.daily_fiber_min, None);
        ranges.push((Nutrient::Fiber, low, high));
        // A [0, inf) range can't bind, no row needed
        ranges.retain(|(_, low, high)| *low > 0. || high.is_finite());
        ranges
    }

    /// Whether a day's totals fall inside the band
    pub fn contains(&self, constraints: &OptimizationConstraints, value_of: impl Fn(Nutrient) -> f64) -> bool {
        self.daily_ranges(constraints)
            .into_iter()
            .all(|(nutrient, low, high)| {
                let value = value_of(nutrient);
                value >= low - 1e-6 && value <= high + 1e-6
            })
    }
}

/// Number of rows generated per family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstraintCounts {
    pub meal_assignment: usize,
    pub nutrition: usize,
    pub variety: usize,
}

/// Add every constraint family for the given band to the problem
pub fn generate_constraints(
    grid: &DecisionGrid,
    constraints: &OptimizationConstraints,
    band: ToleranceBand,
    problem: &mut Problem,
) -> Result<ConstraintCounts, PassFailure> {
    let counts = ConstraintCounts {
        meal_assignment: add_meal_assignment(grid, problem)?,
        nutrition: add_nutrition_bounds(grid, constraints, band, problem)?,
        variety: add_variety(grid, constraints.max_recipe_repeat_in_days, problem)?,
    };
    debug!(
        meal_assignment = counts.meal_assignment,
        nutrition = counts.nutrition,
        variety = counts.variety,
        "Generated constraints"
    );
    Ok(counts)
}

/// Exactly one recipe per `(day, slot)`
fn add_meal_assignment(grid: &DecisionGrid, problem: &mut Problem) -> Result<usize, PassFailure> {
    let mut count = 0;
    for slot in grid.slots() {
        let keys = grid.at_slot(slot);
        if keys.is_empty() {
            return Err(PassFailure::UnsatisfiableSlot {
                day: slot.day,
                slot: slot.slot_type(),
            });
        }
        let variables = variable_ids(grid, keys.iter());
        let coefficients = vec![1.; variables.len()];
        problem.add_new_equality_constraint(
            &format!("assign_d{}_s{}", slot.day, slot.slot),
            &variables,
            &coefficients,
            1.,
        )?;
        count += 1;
    }
    Ok(count)
}

/// Per day totals of each constrained nutrient within the band
fn add_nutrition_bounds(
    grid: &DecisionGrid,
    constraints: &OptimizationConstraints,
    band: ToleranceBand,
    problem: &mut Problem,
) -> Result<usize, PassFailure> {
    let ranges = band.daily_ranges(constraints);
    let mut count = 0;
    for day in 0..grid.days() {
        let keys = grid.on_day(day);
        let variables = variable_ids(grid, keys.iter());
        for (nutrient, low, high) in &ranges {
            let coefficients = keys
                .iter()
                .map(|k| grid.recipe(k.recipe).macros.get(*nutrient))
                .collect::<Vec<_>>();
            problem.add_new_inequality_constraint(
                &format!("{}_d{}", nutrient, day),
                &variables,
                &coefficients,
                *low,
                *high,
            )?;
            count += 1;
        }
    }
    Ok(count)
}

/// A recipe appears at most once in every window of `window` consecutive days
///
/// Windows longer than the horizon are clamped to it, a window of 0 disables the family.
fn add_variety(grid: &DecisionGrid, window: usize, problem: &mut Problem) -> Result<usize, PassFailure> {
    let window = window.min(grid.days());
    if window == 0 {
        return Ok(0);
    }
    let mut count = 0;
    for recipe in 0..grid.candidates().len() {
        let keys = grid.for_recipe(recipe);
        for start in 0..=(grid.days() - window) {
            let in_window = keys
                .iter()
                .filter(|k| k.day >= start && k.day < start + window);
            let variables = variable_ids(grid, in_window);
            // One variable can't exceed 1 anyway
            if variables.len() <= 1 {
                continue;
            }
            let coefficients = vec![1.; variables.len()];
            problem.add_new_inequality_constraint(
                &format!("variety_r{}_d{}", recipe, start),
                &variables,
                &coefficients,
                0.,
                1.,
            )?;
            count += 1;
        }
    }
    Ok(count)
}

fn variable_ids<'g, I>(grid: &'g DecisionGrid, keys: I) -> Vec<&'g str>
where
    I: Iterator<Item = &'g crate::planner::grid::GridKey>,
{
    keys.filter_map(|k| grid.variable(k)).collect()
}
