//! Turns an optimal solve into a [`WeekPlan`]
use std::collections::BTreeMap;

use serde::Serialize;

use crate::configuration::ASSIGNMENT_THRESHOLD;
use crate::errors::PassFailure;
use crate::nutrition::constraints::OptimizationConstraints;
use crate::nutrition::recipe::{MacroProfile, Recipe, SlotType};
use crate::optimize::ProblemSolution;
use crate::planner::constraints::{SolvePass, ToleranceBand};
use crate::planner::grid::DecisionGrid;

/// A complete plan: one recipe for every slot of every day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekPlan {
    /// Recipes by day index, then slot type
    pub days: BTreeMap<usize, BTreeMap<SlotType, Recipe>>,
    /// Calories over the whole horizon
    pub total_calories: f64,
    /// Protein, carbs and fat per day, averaged over the horizon
    pub avg_macros: AverageMacros,
    /// Macro totals of each day
    pub day_summaries: Vec<DaySummary>,
    /// Which pass produced the plan
    pub pass: SolvePass,
    pub objective_value: f64,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AverageMacros {
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DaySummary {
    pub day: usize,
    pub totals: MacroProfile,
}

impl WeekPlan {
    pub fn num_days(&self) -> usize {
        self.days.len()
    }

    /// Recipe assigned to slot `slot_index` of `day`
    pub fn recipe_at(&self, day: usize, slot_index: usize) -> Option<&Recipe> {
        self.days
            .get(&day)
            .and_then(|slots| slots.get(&SlotType::for_slot(slot_index)))
    }

    /// Every `(day, slot type, recipe)` assignment, day major
    pub fn assignments(&self) -> impl Iterator<Item = (usize, SlotType, &Recipe)> {
        self.days
            .iter()
            .flat_map(|(day, slots)| slots.iter().map(move |(slot, recipe)| (*day, *slot, recipe)))
    }
}

/// Read the assignment of every slot from an optimal solution
pub fn extract_plan(
    grid: &DecisionGrid,
    solution: &ProblemSolution,
    constraints: &OptimizationConstraints,
    pass: SolvePass,
) -> Result<WeekPlan, PassFailure> {
    let mut days: BTreeMap<usize, BTreeMap<SlotType, Recipe>> = BTreeMap::new();
    let mut day_totals = vec![MacroProfile::default(); grid.days()];

    for slot in grid.slots() {
        let mut chosen = grid.at_slot(slot).iter().filter(|key| {
            grid.variable(key)
                .and_then(|id| solution.value(id))
                .is_some_and(|value| value > ASSIGNMENT_THRESHOLD)
        });
        let key = match (chosen.next(), chosen.next()) {
            (Some(key), None) => key,
            (None, _) => {
                return Err(PassFailure::Solver(format!("solution leaves {} empty", slot)))
            }
            (Some(_), Some(_)) => {
                return Err(PassFailure::Solver(format!(
                    "solution assigns several recipes to {}",
                    slot
                )))
            }
        };
        let recipe = grid.recipe(key.recipe);
        day_totals[slot.day] += recipe.macros;
        days.entry(slot.day)
            .or_default()
            .insert(slot.slot_type(), recipe.clone());
    }

    let total = day_totals
        .iter()
        .fold(MacroProfile::default(), |acc, day| acc + *day);
    let average = total.averaged_over(grid.days());
    let day_summaries = day_totals
        .into_iter()
        .enumerate()
        .map(|(day, totals)| DaySummary { day, totals })
        .collect::<Vec<_>>();

    Ok(WeekPlan {
        days,
        total_calories: total.calories,
        avg_macros: AverageMacros {
            protein_g: average.protein_g,
            carbs_g: average.carbs_g,
            fat_g: average.fat_g,
        },
        warnings: warnings_for(pass, &day_summaries, constraints),
        day_summaries,
        pass,
        objective_value: solution.objective_value.unwrap_or_default(),
    })
}

fn warnings_for(
    pass: SolvePass,
    day_summaries: &[DaySummary],
    constraints: &OptimizationConstraints,
) -> Vec<String> {
    if pass == SolvePass::Strict {
        return Vec::new();
    }
    let mut warnings =
        vec!["No plan met the regular nutrition tolerances, targets were relaxed".to_string()];
    let strict = ToleranceBand::STRICT;
    for summary in day_summaries {
        for (nutrient, low, high) in strict.daily_ranges(constraints) {
            let value = summary.totals.get(nutrient);
            if value < low - 1e-6 || value > high + 1e-6 {
                warnings.push(format!(
                    "Day {}: {:.0} {} is outside the regular range [{:.0}, {:.0}]",
                    summary.day, value, nutrient, low, high
                ));
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nutrition::recipe::{MealType, RecipeBuilder};
    use indexmap::IndexMap;
    use std::collections::BTreeSet;

    fn pool() -> Vec<Recipe> {
        [MealType::Breakfast, MealType::Lunch]
            .into_iter()
            .flat_map(|meal_type| {
                (0..2).map(move |i| {
                    RecipeBuilder::default()
                        .id(format!("{}_{}", meal_type, i))
                        .meal_types([meal_type].into_iter().collect::<BTreeSet<_>>())
                        .macros(MacroProfile::new(500. + 100. * i as f64, 30., 50., 10., 5.))
                        .build()
                        .unwrap()
                })
            })
            .collect()
    }

    /// Assign candidate `pick(day, slot)` to every slot
    fn solution_for(grid: &DecisionGrid, pick: impl Fn(usize, usize) -> usize) -> ProblemSolution {
        let values: IndexMap<String, f64> = grid
            .iter()
            .map(|(key, id)| {
                let chosen = key.recipe == pick(key.day, key.slot);
                (id.to_string(), if chosen { 1. } else { 0. })
            })
            .collect();
        ProblemSolution::optimal(0., values)
    }

    fn constraints() -> OptimizationConstraints {
        OptimizationConstraints {
            meals_per_day: 2,
            daily_calories_min: 1200.,
            daily_calories_max: Some(1400.),
            ..Default::default()
        }
    }

    #[test]
    fn extracts_full_plan() {
        let recipes = pool();
        let constraints = constraints();
        let grid = DecisionGrid::build(&recipes, &constraints, 2).unwrap();
        // breakfasts are candidates 0, 1 and lunches 2, 3
        let solution = solution_for(&grid, |day, slot| slot * 2 + day);
        let plan = extract_plan(&grid, &solution, &constraints, SolvePass::Strict).unwrap();

        assert_eq!(plan.num_days(), 2);
        assert_eq!(plan.assignments().count(), 4);
        assert_eq!(plan.recipe_at(0, 0).unwrap().id, "breakfast_0");
        assert_eq!(plan.recipe_at(1, 1).unwrap().id, "lunch_1");
        // day 0: 500 + 500, day 1: 600 + 600
        assert!((plan.total_calories - 2200.).abs() < 1e-9);
        assert!((plan.day_summaries[1].totals.calories - 1200.).abs() < 1e-9);
        assert!((plan.avg_macros.protein_g - 60.).abs() < 1e-9);
        assert!((plan.avg_macros.carbs_g - 100.).abs() < 1e-9);
        assert!(plan.warnings.is_empty());
    }

    #[test]
    fn relaxed_plan_warns() {
        let recipes = pool();
        let constraints = constraints();
        let grid = DecisionGrid::build(&recipes, &constraints, 2).unwrap();
        let solution = solution_for(&grid, |_, slot| slot * 2);
        let plan = extract_plan(&grid, &solution, &constraints, SolvePass::Relaxed).unwrap();
        assert_eq!(plan.pass, SolvePass::Relaxed);
        // 1000 kcal a day is under the regular floor of 1020
        assert_eq!(plan.warnings.len(), 3);
        assert!(plan.warnings[1].starts_with("Day 0: 1000 calories"));
    }

    #[test]
    fn incomplete_solution_is_rejected() {
        let recipes = pool();
        let constraints = constraints();
        let grid = DecisionGrid::build(&recipes, &constraints, 1).unwrap();
        let solution = ProblemSolution::optimal(0., IndexMap::new());
        assert!(matches!(
            extract_plan(&grid, &solution, &constraints, SolvePass::Strict),
            Err(PassFailure::Solver(_))
        ));
    }

    #[test]
    fn plan_serializes_with_slot_names() {
        let recipes = pool();
        let constraints = constraints();
        let grid = DecisionGrid::build(&recipes, &constraints, 1).unwrap();
        let plan = extract_plan(
            &grid,
            &solution_for(&grid, |_, slot| slot * 2),
            &constraints,
            SolvePass::Strict,
        )
        .unwrap();
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["days"]["0"]["breakfast"]["id"], "breakfast_0");
        assert_eq!(json["days"]["0"]["lunch"]["id"], "lunch_0");
        assert_eq!(json["pass"], "strict");
    }
}
