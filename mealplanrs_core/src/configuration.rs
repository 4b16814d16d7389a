//! Planner configuration
//!
//! Configuration is passed explicitly to each [`crate::planner::MealPlanner`], nothing is
//! shared between planners.
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::optimize::solvers::{Solver, SolverError};
use crate::planner::objective::ObjectiveStrategy;

/// Values closer than this to 1 are read as an assignment
pub const ASSIGNMENT_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfiguration {
    /// Backend used for both the strict and the relaxed pass
    pub solver: SolverBackend,
    /// Wall clock budget of the strict pass, in seconds
    pub strict_time_limit_secs: f64,
    /// Wall clock budget of the relaxed pass, in seconds
    pub relaxed_time_limit_secs: f64,
    /// Horizon used by [`crate::planner::MealPlanner::optimize_week`]
    pub horizon_days: usize,
    /// How recipes are scored in the objective
    pub objective: ObjectiveStrategy,
}

impl Default for PlannerConfiguration {
    fn default() -> Self {
        PlannerConfiguration {
            solver: SolverBackend::default(),
            strict_time_limit_secs: 10.,
            relaxed_time_limit_secs: 5.,
            horizon_days: 7,
            objective: ObjectiveStrategy::default(),
        }
    }
}

impl PlannerConfiguration {
    /// Read a configuration from JSON, missing fields take their default value
    pub fn from_json_str(data: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(data)
    }

    pub fn strict_time_limit(&self) -> Duration {
        limit_from_secs(self.strict_time_limit_secs)
    }

    pub fn relaxed_time_limit(&self) -> Duration {
        limit_from_secs(self.relaxed_time_limit_secs)
    }
}

/// At least a millisecond, limits too large for a [`Duration`] saturate to [`Duration::MAX`]
fn limit_from_secs(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.max(0.001)).unwrap_or(Duration::MAX)
}

/// Enum used to specify which solver to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverBackend {
    /// Use the pure rust microlp solver, requires the microlp feature (on by default)
    Microlp,
    /// Use the HiGHS solver, requires the highs feature to be enabled
    Highs,
}

impl Default for SolverBackend {
    fn default() -> Self {
        cfg_if::cfg_if! {
            if #[cfg(feature = "microlp")] {
                SolverBackend::Microlp
            } else {
                SolverBackend::Highs
            }
        }
    }
}

impl SolverBackend {
    /// Create a fresh solver instance for this backend
    pub fn create(&self) -> Result<Box<dyn Solver>, SolverError> {
        match self {
            SolverBackend::Microlp => {
                cfg_if::cfg_if! {
                    if #[cfg(feature = "microlp")] {
                        Ok(Box::new(crate::optimize::solvers::microlp::MicrolpSolver::new()))
                    } else {
                        Err(SolverError::Unavailable("microlp"))
                    }
                }
            }
            SolverBackend::Highs => {
                cfg_if::cfg_if! {
                    if #[cfg(feature = "highs")] {
                        Ok(Box::new(crate::optimize::solvers::highs::HighsSolver::new()))
                    } else {
                        Err(SolverError::Unavailable("highs"))
                    }
                }
            }
        }
    }
}
