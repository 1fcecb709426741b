//! Provides struct representing an optimization problem
use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A mixed binary/continuous optimization problem with linear constraints.
///
/// Variables and constraint terms are index-based so the whole problem is
/// plain data: it clones cheaply for per-target instantiation, crosses
/// thread boundaries, and serializes as part of a cached skeleton. Solver
/// backends read it through the accessors and translate it into their own
/// representation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Problem {
    /// Variables of the optimization problem, keyed by id
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem, keyed by id
    constraints: IndexMap<String, Constraint>,
    /// Linear objective to optimize
    objective: Objective,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
            objective: Objective::new(objective_sense),
        }
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }
    // endregion Creation Functions

    // region Adding Variables
    /// Create a new variable and add it to the optimization problem,
    /// returning its index
    pub fn add_new_variable(
        &mut self,
        id: &str,
        variable_type: VariableType,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<usize, ProblemError> {
        if self.variables.contains_key(id) {
            return Err(ProblemError::VariableIdAlreadyExists);
        }
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        let index = self.variables.len();
        self.variables.insert(
            id.to_string(),
            Variable {
                id: id.to_string(),
                variable_type,
                lower_bound,
                upper_bound,
                index,
            },
        );
        Ok(index)
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Create a new inequality constraint and add it to the problem
    ///
    /// `lower_bound`/`upper_bound` of `None` leave that side unbounded.
    pub fn add_new_inequality_constraint(
        &mut self,
        id: &str,
        terms: &[(usize, f64)],
        lower_bound: Option<f64>,
        upper_bound: Option<f64>,
    ) -> Result<(), ProblemError> {
        if let (Some(lb), Some(ub)) = (lower_bound, upper_bound) {
            if lb > ub {
                return Err(ProblemError::InvalidConstraintBounds);
            }
        }
        let constraint = Constraint::Inequality {
            terms: self.zip_into_terms(terms)?,
            lower_bound,
            upper_bound,
        };
        self.insert_constraint(id, constraint)
    }

    /// Create a new equality constraint and add it to the problem
    pub fn add_new_equality_constraint(
        &mut self,
        id: &str,
        terms: &[(usize, f64)],
        equals: f64,
    ) -> Result<(), ProblemError> {
        let constraint = Constraint::Equality {
            terms: self.zip_into_terms(terms)?,
            equals,
        };
        self.insert_constraint(id, constraint)
    }

    fn insert_constraint(&mut self, id: &str, constraint: Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(id) {
            return Err(ProblemError::ConstraintAlreadyExists);
        }
        self.constraints.insert(id.to_string(), constraint);
        Ok(())
    }

    /// Take a slice of (variable index, coefficient) pairs and zip them into
    /// constraint terms, validating that the variables exist
    fn zip_into_terms(&self, terms: &[(usize, f64)]) -> Result<Vec<ConstraintTerm>, ProblemError> {
        terms
            .iter()
            .map(|&(variable, coefficient)| {
                if variable >= self.variables.len() {
                    return Err(ProblemError::NonExistentVariablesInConstraint);
                }
                Ok(ConstraintTerm {
                    variable,
                    coefficient,
                })
            })
            .collect()
    }
    // endregion Adding Constraints

    // region Updating Bounds
    /// Update the bounds of a variable
    pub fn update_variable_bounds(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds);
        }
        match self.variables.get_mut(id) {
            Some(var) => {
                var.lower_bound = lower_bound;
                var.upper_bound = upper_bound;
                Ok(())
            }
            None => Err(ProblemError::NonExistentVariable),
        }
    }

    /// Update the bounds of an inequality constraint
    pub fn update_inequality_bounds(
        &mut self,
        id: &str,
        lower_bound: Option<f64>,
        upper_bound: Option<f64>,
    ) -> Result<(), ProblemError> {
        if let (Some(lb), Some(ub)) = (lower_bound, upper_bound) {
            if lb > ub {
                return Err(ProblemError::InvalidConstraintBounds);
            }
        }
        match self.constraints.get_mut(id) {
            Some(Constraint::Inequality {
                lower_bound: lb,
                upper_bound: ub,
                ..
            }) => {
                *lb = lower_bound;
                *ub = upper_bound;
                Ok(())
            }
            Some(Constraint::Equality { .. }) => Err(ProblemError::NotAnInequalityConstraint),
            None => Err(ProblemError::NonExistentConstraint),
        }
    }
    // endregion Updating Bounds

    // region Objective
    /// Add a new linear term to the objective
    pub fn add_new_linear_objective_term(
        &mut self,
        variable: usize,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        if variable >= self.variables.len() {
            return Err(ProblemError::NonExistentVariablesInObjective);
        }
        self.objective.terms.push(ObjectiveTerm {
            variable,
            coefficient,
        });
        Ok(())
    }

    /// Remove all terms from the objective
    pub fn clear_objective(&mut self) {
        self.objective.terms.clear();
    }
    // endregion Objective

    // region Accessors
    /// Look up a variable's index by id
    pub fn variable_index(&self, id: &str) -> Option<usize> {
        self.variables.get(id).map(|v| v.index)
    }

    /// Iterate the variables in index order
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// Iterate the constraints in insertion order
    pub fn constraints(&self) -> impl Iterator<Item = (&String, &Constraint)> {
        self.constraints.iter()
    }

    /// Objective coefficient per variable index (variables without a term
    /// are absent)
    pub fn objective_coefficients(&self) -> IndexMap<usize, f64> {
        let mut coefficients: IndexMap<usize, f64> = IndexMap::new();
        for term in &self.objective.terms {
            *coefficients.entry(term.variable).or_insert(0.0) += term.coefficient;
        }
        coefficients
    }

    /// Sense of the objective
    pub fn objective_sense(&self) -> ObjectiveSense {
        self.objective.sense
    }

    /// Current number of variables in the problem
    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    /// Current number of constraints in the problem
    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
    // endregion Accessors
}

/// A variable in an optimization problem
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Variable {
    /// Used to identify the variable
    pub id: String,
    /// Type of the variable (see [`VariableType`])
    pub variable_type: VariableType,
    /// Lowest value the variable can take
    pub lower_bound: f64,
    /// Highest value the variable can take
    pub upper_bound: f64,
    /// Position of the variable in the problem
    pub index: usize,
}

/// Represents the type of variable in an optimization problem
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VariableType {
    /// Continuous variable
    Continuous,
    /// Binary variable
    Binary,
}

impl Display for VariableType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableType::Continuous => write!(f, "CONTINUOUS"),
            VariableType::Binary => write!(f, "BINARY"),
        }
    }
}

/// Represents a linear constraint in an optimization problem
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum Constraint {
    /// Represents an equality constraint, where `terms` = `equals`
    Equality {
        /// Linear terms which are added together
        terms: Vec<ConstraintTerm>,
        /// The right hand side of the equality constraint
        equals: f64,
    },
    /// Represents an inequality constraint; a `None` bound leaves that side
    /// unbounded
    Inequality {
        /// Linear terms which are added together
        terms: Vec<ConstraintTerm>,
        /// The lowest value the sum of the terms can take
        lower_bound: Option<f64>,
        /// The highest value the sum of the terms can take
        upper_bound: Option<f64>,
    },
}

/// Represents a single term in a constraint, specifically the multiplication
/// of the variable at `variable` by `coefficient`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConstraintTerm {
    /// Index of the variable in the problem
    pub variable: usize,
    /// The coefficient for the variable
    pub coefficient: f64,
}

/// Represents the linear objective of an optimization problem
#[derive(Clone, Debug, Serialize, Deserialize)]
struct Objective {
    /// Terms included in the objective
    terms: Vec<ObjectiveTerm>,
    /// Sense of the objective (maximize, or minimize)
    sense: ObjectiveSense,
}

impl Objective {
    fn new(sense: ObjectiveSense) -> Self {
        Objective {
            terms: Vec::new(),
            sense,
        }
    }
}

/// A linear term in the objective
#[derive(Clone, Debug, Serialize, Deserialize)]
struct ObjectiveTerm {
    variable: usize,
    coefficient: f64,
}

/// Represents the sense of the objective, whether it should be maximized or
/// minimized
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add a variable with the same id as an existing variable")]
    VariableIdAlreadyExists,
    /// Error when trying to add variable with invalid bounds
    #[error("Tried to add a variable with lower_bound>upper_bound")]
    InvalidVariableBounds,
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
    /// Error when trying to perform an update on a variable that doesn't exist
    #[error("Tried to access a variable that doesn't exist")]
    NonExistentVariable,
    /// Error when trying to perform an update on a constraint that doesn't exist
    #[error("Tried to access a constraint that doesn't exist")]
    NonExistentConstraint,
    /// Error when trying to update the bounds of an equality constraint
    #[error("Tried to update inequality bounds on an equality constraint")]
    NotAnInequalityConstraint,
}
