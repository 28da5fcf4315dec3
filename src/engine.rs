//! SAT solver trait and implementations

pub mod rustsat_adapter;

pub use rustsat_adapter::RustSatAdapter;

/// Outcome of one oracle call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// A model exists and can be read through `value_of`
    Sat,
    /// No model exists
    Unsat,
    /// The backend gave up (interrupted, out of resources or failed)
    Unknown,
}

/// Core SAT solver trait
///
/// This trait defines the interface that all SAT solver backends must implement.
/// Variables are 1-indexed, and literals are represented as signed integers
/// (positive for true, negative for false).
pub trait SATSolver {
    /// Adds the given number of variables to the solver
    fn add_variables(&mut self, num_vars: u32);

    /// Adds a clause to the solver
    ///
    /// Returns false if the backend rejected the clause
    fn add_clause(&mut self, lits: &[i32]) -> bool;

    /// Solves the current formula
    fn solve(&mut self) -> Verdict;

    /// Returns the assignment of a variable in the model
    ///
    /// Only meaningful after solve() returned `Verdict::Sat`.
    /// Variables are 1-indexed.
    fn value_of(&self, var: u32) -> bool;

    /// Returns the number of variables in the solver
    fn num_variables(&self) -> u32;

    /// Returns the number of clauses added
    fn num_clauses(&self) -> u32;
}

/// A mock SAT solver for testing
///
/// Does not search: it records variables and clauses and answers with a fixed
/// verdict and a fixed model. Useful for driving the pipeline into the
/// Unknown and Unsat branches deterministically.
pub struct MockSolver {
    num_vars: u32,
    clauses: Vec<Vec<i32>>,
    verdict: Verdict,
    model: Vec<bool>,
}

impl MockSolver {
    /// Creates a mock solver that answers `Verdict::Unknown`
    pub fn new() -> Self {
        Self::with_verdict(Verdict::Unknown)
    }

    /// Creates a mock solver that answers `verdict`
    pub fn with_verdict(verdict: Verdict) -> Self {
        Self {
            num_vars: 0,
            clauses: Vec::new(),
            verdict,
            model: Vec::new(),
        }
    }

    /// Sets the variables reported true by `value_of`
    pub fn set_true(&mut self, vars: &[u32]) {
        for &var in vars {
            if let Some(slot) = var.checked_sub(1).and_then(|i| self.model.get_mut(i as usize)) {
                *slot = true;
            }
        }
    }

    /// Clauses received so far
    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }
}

impl Default for MockSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SATSolver for MockSolver {
    fn add_variables(&mut self, num_vars: u32) {
        self.num_vars += num_vars;
        self.model.resize(self.num_vars as usize, false);
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        self.clauses.push(lits.to_vec());
        true
    }

    fn solve(&mut self) -> Verdict {
        self.verdict
    }

    fn value_of(&self, var: u32) -> bool {
        if var == 0 || var > self.num_vars {
            false
        } else {
            self.model[(var - 1) as usize]
        }
    }

    fn num_variables(&self) -> u32 {
        self.num_vars
    }

    fn num_clauses(&self) -> u32 {
        self.clauses.len() as u32
    }
}
