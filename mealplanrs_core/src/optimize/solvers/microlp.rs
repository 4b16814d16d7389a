//! Solver interface for the pure rust microlp solver
//!
//! microlp has no notion of a time limit, so the solve runs on a dedicated worker thread
//! and the caller waits on a channel for at most the configured limit. A worker that
//! misses the deadline is detached, its result is dropped when it eventually finishes.
use std::sync::mpsc::{channel, RecvTimeoutError};
use std::thread;

use ::microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};
use tracing::{debug, warn};

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::solvers::{ModelBuffer, Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Outcome reported back by the worker thread, the objective and values in staging order
type WorkerResult = Result<(f64, Vec<f64>), ::microlp::Error>;

#[derive(Clone, Debug, Default)]
pub struct MicrolpSolver {
    model: ModelBuffer,
}

impl MicrolpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate the staged model into a microlp problem
    fn build_problem(&self) -> (Problem, Vec<Variable>) {
        let direction = match self.model.sense {
            ObjectiveSense::Minimize => OptimizationDirection::Minimize,
            ObjectiveSense::Maximize => OptimizationDirection::Maximize,
        };
        let mut problem = Problem::new(direction);
        let variables = self
            .model
            .variables
            .values()
            .map(|objective| problem.add_integer_var(*objective, (0, 1)))
            .collect::<Vec<_>>();

        for row in &self.model.rows {
            let expr = row
                .terms
                .iter()
                .map(|(position, coef)| (variables[*position], *coef))
                .collect::<Vec<_>>();
            if row.lower_bound == row.upper_bound {
                problem.add_constraint(expr, ComparisonOp::Eq, row.lower_bound);
                continue;
            }
            if row.lower_bound.is_finite() {
                problem.add_constraint(expr.clone(), ComparisonOp::Ge, row.lower_bound);
            }
            if row.upper_bound.is_finite() {
                problem.add_constraint(expr, ComparisonOp::Le, row.upper_bound);
            }
        }
        (problem, variables)
    }
}

impl Solver for MicrolpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn model_mut(&mut self) -> &mut ModelBuffer {
        &mut self.model
    }

    fn solve(&mut self) -> Result<ProblemSolution, SolverError> {
        let (problem, variables) = self.build_problem();
        debug!(
            variables = variables.len(),
            rows = self.model.rows.len(),
            "Starting microlp solve"
        );

        let (tx, rx) = channel::<WorkerResult>();
        thread::Builder::new()
            .name("microlp-worker".into())
            .spawn(move || {
                let result = problem.solve().map(|solution| {
                    let values = variables.iter().map(|v| solution[*v]).collect();
                    (solution.objective(), values)
                });
                // The receiver is gone if the caller already timed out
                let _ = tx.send(result);
            })
            .map_err(|e| SolverError::WorkerFailed(e.to_string()))?;

        let received = match self.model.time_limit {
            Some(limit) => rx.recv_timeout(limit),
            None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Ok((objective, values))) => Ok(ProblemSolution::optimal(
                objective,
                self.model.label_values(values),
            )),
            Ok(Err(::microlp::Error::Infeasible)) => {
                Ok(ProblemSolution::without_values(OptimizationStatus::Infeasible))
            }
            Ok(Err(::microlp::Error::Unbounded)) => {
                Ok(ProblemSolution::without_values(OptimizationStatus::Unbounded))
            }
            Ok(Err(other)) => {
                warn!("microlp failed: {}", other);
                Ok(ProblemSolution::without_values(
                    OptimizationStatus::NumericalError,
                ))
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "microlp did not finish within {:?}, abandoning the worker",
                    self.model.time_limit
                );
                Ok(ProblemSolution::without_values(
                    OptimizationStatus::SolverHalted,
                ))
            }
            Err(RecvTimeoutError::Disconnected) => Err(SolverError::WorkerFailed(
                "worker exited without reporting a result".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn solves_small_assignment() {
        // Pick exactly one of x, y, z, cheapest wins
        let mut solver = MicrolpSolver::new();
        for id in ["x", "y", "z"] {
            solver.add_binary_variable(id).unwrap();
        }
        solver
            .add_equality_constraint("one", vec!["x", "y", "z"], vec![1., 1., 1.], 1.)
            .unwrap();
        solver.add_linear_objective_term("x", 3.).unwrap();
        solver.add_linear_objective_term("y", 1.).unwrap();
        solver.add_linear_objective_term("z", 2.).unwrap();
        solver.set_time_limit(Duration::from_secs(5)).unwrap();

        let solution = solver.solve().unwrap();
        assert_eq!(solution.status, OptimizationStatus::Optimal);
        assert!(solution.value("y").unwrap() > 0.5);
        assert!(solution.value("x").unwrap() < 0.5);
        assert!((solution.objective_value.unwrap() - 1.).abs() < 1e-6);
    }

    #[test]
    fn reports_infeasible() {
        let mut solver = MicrolpSolver::new();
        solver.add_binary_variable("x").unwrap();
        solver.add_binary_variable("y").unwrap();
        solver
            .add_inequality_constraint("at_least_three", vec!["x", "y"], vec![1., 1.], 3., f64::INFINITY)
            .unwrap();
        let solution = solver.solve().unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.variable_values.is_none());
    }

    #[test]
    fn ranged_rows_are_respected() {
        // At least two and at most three of five, maximizing picks exactly three
        let ids = ["a", "b", "c", "d", "e"];
        let mut solver = MicrolpSolver::new();
        for id in ids {
            solver.add_binary_variable(id).unwrap();
            solver.add_linear_objective_term(id, 1.).unwrap();
        }
        solver
            .add_inequality_constraint("range", ids.to_vec(), vec![1.; 5], 2., 3.)
            .unwrap();
        solver.set_objective_sense(ObjectiveSense::Maximize).unwrap();
        let solution = solver.solve().unwrap();
        assert!((solution.objective_value.unwrap() - 3.).abs() < 1e-6);

        let mut solver = MicrolpSolver::new();
        for id in ids {
            solver.add_binary_variable(id).unwrap();
            solver.add_linear_objective_term(id, 1.).unwrap();
        }
        solver
            .add_inequality_constraint("range", ids.to_vec(), vec![1.; 5], 2., 3.)
            .unwrap();
        let solution = solver.solve().unwrap();
        assert!((solution.objective_value.unwrap() - 2.).abs() < 1e-6);
    }
}
