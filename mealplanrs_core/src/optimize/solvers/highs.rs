//! Solver interface for the HiGHS solver, requires the `highs` feature
use ::highs::{Col, HighsModelStatus, RowProblem, Sense};
use tracing::debug;

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::solvers::{ModelBuffer, Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

#[derive(Clone, Debug, Default)]
pub struct HighsSolver {
    model: ModelBuffer,
}

impl HighsSolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn build_problem(&self) -> RowProblem {
        let mut problem = RowProblem::default();
        let columns = self
            .model
            .variables
            .values()
            .map(|objective| problem.add_integer_column(*objective, 0.0..=1.0))
            .collect::<Vec<Col>>();
        for row in &self.model.rows {
            problem.add_row(
                row.lower_bound..=row.upper_bound,
                row.terms
                    .iter()
                    .map(|(position, coef)| (columns[*position], *coef)),
            );
        }
        problem
    }
}

impl Solver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn model_mut(&mut self) -> &mut ModelBuffer {
        &mut self.model
    }

    fn solve(&mut self) -> Result<ProblemSolution, SolverError> {
        let sense = match self.model.sense {
            ObjectiveSense::Minimize => Sense::Minimise,
            ObjectiveSense::Maximize => Sense::Maximise,
        };
        let mut model = self.build_problem().optimise(sense);
        model.make_quiet();
        if let Some(limit) = self.model.time_limit {
            model.set_option("time_limit", limit.as_secs_f64());
        }
        let solved = model.solve();
        let status = solved.status();
        debug!("HiGHS finished with status {:?}", status);

        let status = match status {
            HighsModelStatus::Optimal => {
                let values = solved.get_solution().columns().to_vec();
                return Ok(ProblemSolution::optimal(
                    self.model.objective_value(&values),
                    self.model.label_values(values),
                ));
            }
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                OptimizationStatus::Infeasible
            }
            HighsModelStatus::Unbounded => OptimizationStatus::Unbounded,
            HighsModelStatus::ReachedTimeLimit | HighsModelStatus::ReachedIterationLimit => {
                OptimizationStatus::SolverHalted
            }
            _ => OptimizationStatus::NumericalError,
        };
        Ok(ProblemSolution::without_values(status))
    }
}
