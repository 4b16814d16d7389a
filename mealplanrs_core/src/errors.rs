//! Error types of the planner
use thiserror::Error;

use crate::nutrition::constraints::ConstraintsError;
use crate::nutrition::recipe::{RecipeError, SlotType};
use crate::optimize::problem::ProblemError;
use crate::optimize::solvers::SolverError;

/// Errors surfaced to callers of [`crate::planner::MealPlanner`]
///
/// A plan that could not be found is not an error, see [`crate::planner::PlanOutcome`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlannerError {
    /// Fewer candidate recipes than twice the number of meals per day
    #[error("{available} candidate recipes available, at least {required} are required")]
    InsufficientCandidates { available: usize, required: usize },
    #[error("Invalid constraints: {0}")]
    InvalidConstraints(#[from] ConstraintsError),
    #[error("Invalid recipe: {0}")]
    InvalidRecipe(#[from] RecipeError),
    #[error("The planning horizon must contain at least one day")]
    EmptyHorizon,
    /// The planner built an inconsistent optimization problem
    #[error("Failed to build the optimization problem: {0}")]
    Model(#[from] ProblemError),
    /// The configured solver backend can't be used
    #[error(transparent)]
    Solver(#[from] SolverError),
}

/// Why a single solve pass did not produce a plan
///
/// These never reach the caller directly: a failed strict pass is retried once with relaxed
/// bounds, and the failures of both passes end up in the
/// [`crate::planner::diagnostics::FailureDiagnostics`] of a `NoSolution` outcome.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PassFailure {
    /// No recipe is eligible for a slot, so the slot can never be filled
    #[error("No eligible recipe for the {slot} slot of day {day}")]
    UnsatisfiableSlot { day: usize, slot: SlotType },
    #[error("The solver proved the problem infeasible")]
    Infeasible,
    #[error("The solver hit its time limit without an optimal plan")]
    TimeLimit,
    /// Any other solver outcome, treated like infeasibility
    #[error("Solver failure: {0}")]
    Solver(String),
    #[error(transparent)]
    Model(#[from] ProblemError),
}
