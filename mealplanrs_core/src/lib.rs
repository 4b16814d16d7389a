//! Core rust implementation of mealplan.rs, a crate for planning a week of meals as a
//! mixed integer linear program.

pub mod configuration;
pub mod errors;
pub mod io;
pub mod nutrition;
pub mod optimize;
pub mod planner;

pub use configuration::{PlannerConfiguration, SolverBackend};
pub use errors::PlannerError;
pub use nutrition::constraints::OptimizationConstraints;
pub use nutrition::recipe::{MacroProfile, MealType, Recipe};
pub use planner::extract::WeekPlan;
pub use planner::{MealPlanner, PlanOutcome};
