//! Provides struct representing a 0-1 optimization problem
use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{Objective, ObjectiveSense, ObjectiveTerm};
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::ProblemSolution;
use indexmap::{IndexMap, IndexSet};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// An optimization problem over binary variables
#[derive(Debug, Clone)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Ids of the binary variables, in insertion order
    variables: IndexSet<String>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexSet::new(),
            constraints: IndexMap::new(),
        }
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    // region Accessors
    pub fn constraints(&self) -> &IndexMap<String, Constraint> {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
    // endregion Accessors

    // region Adding Variables
    /// Add a binary variable to the problem
    pub fn add_new_binary_variable(&mut self, id: &str) -> Result<(), ProblemError> {
        if !self.variables.insert(id.to_string()) {
            return Err(ProblemError::VariableIdAlreadyExists);
        }
        Ok(())
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ProblemError> {
        self.validate_constraint(&constraint)?;
        self.constraints
            .insert(constraint.get_id().to_string(), constraint);
        Ok(())
    }

    /// Create a new equality constraint using variable ids, and add it to the model
    pub fn add_new_equality_constraint(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new_equality(id, variables, coefficients, equals))
    }

    /// Create a new inequality constraint using variable ids, and add it to the model
    pub fn add_new_inequality_constraint(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        self.add_constraint(Constraint::new_inequality(
            id,
            variables,
            coefficients,
            lower_bound,
            upper_bound,
        ))
    }
    // endregion Adding Constraints

    // region Adding Objective Terms
    /// Add a new linear term to the objective using the variable id
    pub fn add_new_linear_objective_term(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        if !self.variables.contains(variable_id) {
            return Err(ProblemError::NonExistentVariablesInObjective);
        }
        self.objective
            .add_term(ObjectiveTerm::new_linear(variable_id, coefficient));
        Ok(())
    }
    // endregion Adding Objective Terms

    // region Solve
    /// Hand the problem to a solver and solve it
    ///
    /// The problem itself is left untouched, so it can be handed to another solver
    /// afterwards.
    pub fn solve_with<S: Solver + ?Sized>(
        &self,
        solver: &mut S,
        time_limit: Option<Duration>,
    ) -> Result<ProblemSolution, SolverError> {
        debug!(
            solver = solver.name(),
            variables = self.num_variables(),
            constraints = self.num_constraints(),
            "Loading problem into solver"
        );
        for id in &self.variables {
            solver.add_binary_variable(id)?;
        }
        for constraint in self.constraints.values() {
            let variables = constraint.get_variables().collect::<Vec<_>>();
            let coefficients = constraint
                .get_terms()
                .iter()
                .map(|t| t.coefficient)
                .collect::<Vec<_>>();
            match constraint {
                Constraint::Equality { id, equals, .. } => {
                    solver.add_equality_constraint(id, variables, coefficients, *equals)?
                }
                Constraint::Inequality {
                    id,
                    lower_bound,
                    upper_bound,
                    ..
                } => solver.add_inequality_constraint(
                    id,
                    variables,
                    coefficients,
                    *lower_bound,
                    *upper_bound,
                )?,
            }
        }
        for term in self.objective.terms() {
            solver.add_linear_objective_term(&term.var, term.coef)?;
        }
        solver.set_objective_sense(self.objective.sense())?;
        if let Some(limit) = time_limit {
            solver.set_time_limit(limit)?;
        }
        solver.solve()
    }
    // endregion Solve

    // region Validation Functions
    /// Check that a constraint to be added is valid to add to this Problem
    fn validate_constraint(&self, constraint: &Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(constraint.get_id()) {
            return Err(ProblemError::ConstraintAlreadyExists);
        }
        let (lower_bound, upper_bound) = constraint.bounds();
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidConstraintBounds);
        }
        // Check that the variables in this constraint are in the model
        if constraint
            .get_variables()
            .any(|id| !self.variables.contains(id))
        {
            return Err(ProblemError::NonExistentVariablesInConstraint);
        }
        Ok(())
    }
    // endregion Validation Functions
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add a variable with the same id as an existing variable")]
    VariableIdAlreadyExists,
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add a constraint with the same id as an existing constraint")]
    ConstraintAlreadyExists,
    /// Error when trying to add a constraint with invalid bounds
    #[error("Tried to add an inequality constraint with lower_bound > upper_bound")]
    InvalidConstraintBounds,
    /// Error when trying to add a constraint that contains variables not in the model
    #[error("Tried to add a constraint with variables not in the model")]
    NonExistentVariablesInConstraint,
    /// Error when trying to add an objective term which includes variables not in the model
    #[error("Tried adding an objective term with variables not in the model")]
    NonExistentVariablesInObjective,
}
