//! Runs one solve of an assembled problem and interprets the outcome
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::configuration::SolverBackend;
use crate::errors::PassFailure;
use crate::optimize::problem::Problem;
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Solve `problem` on a fresh solver of `backend` within `time_limit`
///
/// Only an optimal solve is returned as `Ok`, every other outcome is a [`PassFailure`].
pub fn run_solver(
    problem: &Problem,
    backend: SolverBackend,
    time_limit: Duration,
) -> Result<ProblemSolution, PassFailure> {
    let mut solver = backend
        .create()
        .map_err(|e| PassFailure::Solver(e.to_string()))?;
    let started = Instant::now();
    let solution = problem
        .solve_with(solver.as_mut(), Some(time_limit))
        .map_err(|e| PassFailure::Solver(e.to_string()))?;
    info!(
        solver = solver.name(),
        status = ?solution.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Solver finished"
    );
    interpret(solution)
}

fn interpret(solution: ProblemSolution) -> Result<ProblemSolution, PassFailure> {
    match solution.status {
        OptimizationStatus::Optimal => {
            debug!(objective = ?solution.objective_value, "Optimal plan found");
            Ok(solution)
        }
        OptimizationStatus::Infeasible => Err(PassFailure::Infeasible),
        OptimizationStatus::SolverHalted => Err(PassFailure::TimeLimit),
        other => Err(PassFailure::Solver(format!("solver ended with status {:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_optimal_passes() {
        assert_eq!(
            interpret(ProblemSolution::without_values(OptimizationStatus::Infeasible)).err(),
            Some(PassFailure::Infeasible)
        );
        assert_eq!(
            interpret(ProblemSolution::without_values(OptimizationStatus::SolverHalted)).err(),
            Some(PassFailure::TimeLimit)
        );
        assert!(matches!(
            interpret(ProblemSolution::without_values(OptimizationStatus::NumericalError)),
            Err(PassFailure::Solver(_))
        ));
        assert!(interpret(ProblemSolution::optimal(1., Default::default())).is_ok());
    }

    #[cfg(feature = "microlp")]
    #[test]
    fn solves_with_default_backend() {
        let mut problem = Problem::new_minimization();
        problem.add_new_binary_variable("a").unwrap();
        problem.add_new_binary_variable("b").unwrap();
        problem
            .add_new_equality_constraint("pick", &["a", "b"], &[1., 1.], 1.)
            .unwrap();
        problem.add_new_linear_objective_term("a", 5.).unwrap();
        problem.add_new_linear_objective_term("b", 2.).unwrap();

        let solution =
            run_solver(&problem, SolverBackend::Microlp, Duration::from_secs(5)).unwrap();
        assert!(solution.value("b").unwrap() > 0.5);
        assert!(solution.value("a").unwrap() < 0.5);
    }
}
