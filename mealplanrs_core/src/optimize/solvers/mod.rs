//! Solver interfaces
//!
//! A [`Solver`] receives binary variables, constraints and objective terms one at a time (by id),
//! and is then asked to [`Solver::solve`]. The bundled backends stage everything in a
//! [`ModelBuffer`] and only build the native problem when solving, so a solver instance
//! is single use.
use std::time::Duration;

use indexmap::IndexMap;
use thiserror::Error;

use crate::optimize::objective::ObjectiveSense;
use crate::optimize::ProblemSolution;

#[cfg(feature = "highs")]
pub mod highs;
#[cfg(feature = "microlp")]
pub mod microlp;

/// Interface implemented by every solver backend
pub trait Solver {
    /// Name of the backend, used in logs
    fn name(&self) -> &'static str;

    /// Staging area for the problem, see [`ModelBuffer`]
    fn model_mut(&mut self) -> &mut ModelBuffer;

    /// Solve the staged problem
    ///
    /// Infeasible, unbounded and timed out problems are reported through the status of the
    /// returned [`ProblemSolution`], an `Err` means the backend itself failed.
    fn solve(&mut self) -> Result<ProblemSolution, SolverError>;

    /// Add a 0-1 variable
    fn add_binary_variable(&mut self, id: &str) -> Result<(), SolverError> {
        self.model_mut().add_variable(id)
    }

    fn add_equality_constraint(
        &mut self,
        id: &str,
        variables: Vec<&str>,
        coefficients: Vec<f64>,
        equals: f64,
    ) -> Result<(), SolverError> {
        self.model_mut()
            .add_row(id, &variables, &coefficients, equals, equals)
    }

    fn add_inequality_constraint(
        &mut self,
        id: &str,
        variables: Vec<&str>,
        coefficients: Vec<f64>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), SolverError> {
        self.model_mut()
            .add_row(id, &variables, &coefficients, lower_bound, upper_bound)
    }

    fn add_linear_objective_term(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), SolverError> {
        self.model_mut().add_objective_term(variable_id, coefficient)
    }

    fn set_objective_sense(&mut self, objective_sense: ObjectiveSense) -> Result<(), SolverError> {
        self.model_mut().sense = objective_sense;
        Ok(())
    }

    /// Bound the wall clock time the solve may take
    fn set_time_limit(&mut self, limit: Duration) -> Result<(), SolverError> {
        if limit.is_zero() {
            return Err(SolverError::InvalidTimeLimit);
        }
        self.model_mut().time_limit = Some(limit);
        Ok(())
    }
}

/// A constraint row staged in a [`ModelBuffer`], `lower_bound <= terms <= upper_bound`
#[derive(Debug, Clone, PartialEq)]
pub struct StagedRow {
    pub id: String,
    /// (variable position, coefficient), each variable appears at most once
    pub terms: Vec<(usize, f64)>,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Backend independent staging of a 0-1 linear problem
#[derive(Debug, Clone)]
pub struct ModelBuffer {
    /// Objective coefficient of each binary variable, in staging order
    pub variables: IndexMap<String, f64>,
    pub rows: Vec<StagedRow>,
    pub sense: ObjectiveSense,
    pub time_limit: Option<Duration>,
}

impl Default for ModelBuffer {
    fn default() -> Self {
        ModelBuffer {
            variables: IndexMap::new(),
            rows: Vec::new(),
            sense: ObjectiveSense::Minimize,
            time_limit: None,
        }
    }
}

impl ModelBuffer {
    fn add_variable(&mut self, id: &str) -> Result<(), SolverError> {
        if self.variables.contains_key(id) {
            return Err(SolverError::DuplicateVariable(id.to_string()));
        }
        self.variables.insert(id.to_string(), 0.);
        Ok(())
    }

    fn add_row(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), SolverError> {
        if variables.len() != coefficients.len() {
            return Err(SolverError::MismatchedTerms(id.to_string()));
        }
        // Merge repeated variables, both backends reject duplicate entries in a row
        let mut merged: IndexMap<usize, f64> = IndexMap::with_capacity(variables.len());
        for (var, coef) in variables.iter().zip(coefficients) {
            let position = self
                .variables
                .get_index_of(*var)
                .ok_or_else(|| SolverError::UnknownVariable(var.to_string()))?;
            *merged.entry(position).or_insert(0.) += *coef;
        }
        self.rows.push(StagedRow {
            id: id.to_string(),
            terms: merged.into_iter().collect(),
            lower_bound,
            upper_bound,
        });
        Ok(())
    }

    fn add_objective_term(&mut self, variable_id: &str, coefficient: f64) -> Result<(), SolverError> {
        let objective = self
            .variables
            .get_mut(variable_id)
            .ok_or_else(|| SolverError::UnknownVariable(variable_id.to_string()))?;
        *objective += coefficient;
        Ok(())
    }

    /// Objective value of a full assignment, in staging order
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.variables
            .values()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Pair staged variable ids with solved values, in staging order
    pub fn label_values(&self, values: impl IntoIterator<Item = f64>) -> IndexMap<String, f64> {
        self.variables.keys().cloned().zip(values).collect()
    }
}

/// Errors raised by solver backends
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Variable ids must be unique
    #[error("Tried to add variable {0} twice")]
    DuplicateVariable(String),
    /// Constraint or objective term referenced a variable never added
    #[error("Variable {0} has not been added to the solver")]
    UnknownVariable(String),
    /// Constraint received a different number of variables and coefficients
    #[error("Constraint {0} has a different number of variables and coefficients")]
    MismatchedTerms(String),
    /// The time limit must be positive
    #[error("Time limit must be greater than zero")]
    InvalidTimeLimit,
    /// The requested backend was not compiled in
    #[error("Solver backend {0} is not available, enable its cargo feature")]
    Unavailable(&'static str),
    /// The worker running the solve stopped without reporting a result
    #[error("Solver worker failed: {0}")]
    WorkerFailed(String),
}
