//! Weekly meal plan optimization
//!
//! [`MealPlanner::optimize`] builds a binary assignment problem over the candidate
//! recipes, solves it with the regular nutrition tolerances and, if that fails, retries
//! exactly once with widened tolerances. Each pass builds its own grid, objective and
//! constraints, nothing is shared between calls.
pub mod constraints;
pub mod diagnostics;
pub mod driver;
pub mod eligibility;
pub mod extract;
pub mod grid;
pub mod objective;

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::configuration::PlannerConfiguration;
use crate::errors::{PassFailure, PlannerError};
use crate::nutrition::constraints::OptimizationConstraints;
use crate::nutrition::recipe::{validate_recipe, Recipe};
use crate::optimize::problem::Problem;
use crate::planner::constraints::{generate_constraints, SolvePass};
use crate::planner::diagnostics::{FailureDiagnostics, PassReport};
use crate::planner::driver::run_solver;
use crate::planner::extract::{extract_plan, WeekPlan};
use crate::planner::grid::DecisionGrid;
use crate::planner::objective::{build_objective, CostStrategy};

/// Result of a planning call that got as far as solving
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    Planned(WeekPlan),
    /// Neither pass found a plan
    NoSolution(FailureDiagnostics),
}

impl PlanOutcome {
    pub fn is_planned(&self) -> bool {
        matches!(self, PlanOutcome::Planned(_))
    }

    pub fn plan(&self) -> Option<&WeekPlan> {
        match self {
            PlanOutcome::Planned(plan) => Some(plan),
            PlanOutcome::NoSolution(_) => None,
        }
    }

    pub fn into_plan(self) -> Option<WeekPlan> {
        match self {
            PlanOutcome::Planned(plan) => Some(plan),
            PlanOutcome::NoSolution(_) => None,
        }
    }

    pub fn diagnostics(&self) -> Option<&FailureDiagnostics> {
        match self {
            PlanOutcome::Planned(_) => None,
            PlanOutcome::NoSolution(diagnostics) => Some(diagnostics),
        }
    }
}

/// Entry point of the optimizer
///
/// Holds only immutable configuration, so one planner can serve concurrent callers.
#[derive(Clone)]
pub struct MealPlanner {
    configuration: PlannerConfiguration,
    cost_strategy: Arc<dyn CostStrategy>,
}

impl std::fmt::Debug for MealPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MealPlanner")
            .field("configuration", &self.configuration)
            .finish_non_exhaustive()
    }
}

impl MealPlanner {
    /// Create a planner, failing if the configured solver backend is not compiled in
    pub fn new(configuration: PlannerConfiguration) -> Result<Self, PlannerError> {
        configuration.solver.create()?;
        Ok(MealPlanner {
            cost_strategy: Arc::new(configuration.objective.clone()),
            configuration,
        })
    }

    /// Replace the configured objective with a custom cost strategy
    pub fn with_cost_strategy(mut self, strategy: impl CostStrategy + 'static) -> Self {
        self.cost_strategy = Arc::new(strategy);
        self
    }

    pub fn configuration(&self) -> &PlannerConfiguration {
        &self.configuration
    }

    /// Plan over the configured horizon
    pub fn optimize_week(
        &self,
        recipes: &[Recipe],
        constraints: &OptimizationConstraints,
    ) -> Result<PlanOutcome, PlannerError> {
        self.optimize(recipes, constraints, self.configuration.horizon_days)
    }

    /// Plan `days` days from the candidate `recipes`
    ///
    /// Infeasibility is not an error: it is reported as [`PlanOutcome::NoSolution`]. Errors
    /// are invalid input, a candidate pool smaller than twice the meals per day (detected
    /// before any solve) and internal model inconsistencies.
    pub fn optimize(
        &self,
        recipes: &[Recipe],
        constraints: &OptimizationConstraints,
        days: usize,
    ) -> Result<PlanOutcome, PlannerError> {
        constraints.validate()?;
        if days == 0 {
            return Err(PlannerError::EmptyHorizon);
        }
        recipes.iter().try_for_each(validate_recipe)?;
        // Checks the pool size before anything is solved
        let grid = DecisionGrid::build(recipes, constraints, days)?;
        info!(
            recipes = recipes.len(),
            candidates = grid.candidates().len(),
            days,
            meals_per_day = constraints.meals_per_day,
            "Planning meals"
        );

        let mut reports = Vec::with_capacity(2);
        for pass in [SolvePass::Strict, SolvePass::Relaxed] {
            match self.run_pass(recipes, constraints, days, pass) {
                Ok(plan) => {
                    info!(
                        pass = ?pass,
                        objective = plan.objective_value,
                        total_calories = plan.total_calories,
                        "Plan found"
                    );
                    return Ok(PlanOutcome::Planned(plan));
                }
                Err(PassFailure::Model(e)) => return Err(PlannerError::Model(e)),
                Err(failure) => {
                    warn!(pass = ?pass, reason = %failure, "Solve pass failed");
                    reports.push(PassReport { pass, failure });
                }
            }
        }

        let diagnostics = FailureDiagnostics::diagnose(&grid, constraints, reports);
        warn!(
            likely_binding = ?diagnostics.likely_binding,
            "No plan satisfies the constraints"
        );
        Ok(PlanOutcome::NoSolution(diagnostics))
    }

    fn run_pass(
        &self,
        recipes: &[Recipe],
        constraints: &OptimizationConstraints,
        days: usize,
        pass: SolvePass,
    ) -> Result<WeekPlan, PassFailure> {
        let grid = DecisionGrid::build(recipes, constraints, days)
            .map_err(|e| PassFailure::Solver(e.to_string()))?;
        let mut problem = Problem::new_minimization();
        grid.register(&mut problem)?;
        build_objective(&grid, self.cost_strategy.as_ref(), constraints, &mut problem)?;
        let counts = generate_constraints(&grid, constraints, pass.band(), &mut problem)?;
        debug!(
            pass = ?pass,
            variables = problem.num_variables(),
            constraints = problem.num_constraints(),
            variety = counts.variety,
            "Assembled problem"
        );
        let solution = run_solver(&problem, self.configuration.solver, self.time_limit(pass))?;
        extract_plan(&grid, &solution, constraints, pass)
    }

    fn time_limit(&self, pass: SolvePass) -> Duration {
        match pass {
            SolvePass::Strict => self.configuration.strict_time_limit(),
            SolvePass::Relaxed => self.configuration.relaxed_time_limit(),
        }
    }
}
