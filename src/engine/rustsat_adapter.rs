//! Adapter for rustsat solver backends
//!
//! Any solver implementing `rustsat::solvers::Solve` can serve as the oracle.
//! The crate ships with batsat (`rustsat_batsat::BasicSolver`).

use super::{SATSolver, Verdict};
use rustsat::solvers::{Solve, SolverResult};
use rustsat::types::{Assignment, Clause, Lit, TernaryVal, Var};
use tracing::warn;

/// Adapter that wraps rustsat solvers to implement our SATSolver trait
///
/// # Example
///
/// ```ignore
/// use rustsat_batsat::BasicSolver;
/// let solver = RustSatAdapter::new(BasicSolver::default());
/// ```
pub struct RustSatAdapter<S> {
    solver: S,
    num_vars: u32,
    num_clauses: u32,
    max_var: u32,
    model: Option<Assignment>,
}

impl<S> RustSatAdapter<S> {
    /// Creates a new adapter wrapping the given solver
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            num_vars: 0,
            num_clauses: 0,
            max_var: 0,
            model: None,
        }
    }
}

impl<S: Solve> SATSolver for RustSatAdapter<S> {
    fn add_variables(&mut self, num_vars: u32) {
        // rustsat creates variables on first use; only the count is tracked
        self.num_vars += num_vars;
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        let lits: Vec<Lit> = lits
            .iter()
            .map(|&lit| {
                let var = lit.unsigned_abs();
                self.max_var = self.max_var.max(var);
                let var = Var::new(var - 1);
                if lit > 0 { var.pos_lit() } else { var.neg_lit() }
            })
            .collect();

        self.num_clauses += 1;
        self.solver.add_clause(Clause::from(&lits[..])).is_ok()
    }

    fn solve(&mut self) -> Verdict {
        self.model = None;
        match self.solver.solve() {
            Ok(SolverResult::Sat) => {
                if self.max_var == 0 {
                    // no clause mentioned a variable: every value reads false
                    return Verdict::Sat;
                }
                match self.solver.solution(Var::new(self.max_var - 1)) {
                    Ok(model) => {
                        self.model = Some(model);
                        Verdict::Sat
                    }
                    Err(err) => {
                        warn!(%err, "backend reported SAT without a readable model");
                        Verdict::Unknown
                    }
                }
            }
            Ok(SolverResult::Unsat) => Verdict::Unsat,
            Ok(_) => Verdict::Unknown,
            Err(err) => {
                warn!(%err, "backend failed");
                Verdict::Unknown
            }
        }
    }

    fn value_of(&self, var: u32) -> bool {
        if var == 0 || var > self.max_var {
            return false;
        }
        match &self.model {
            Some(model) => matches!(model.var_value(Var::new(var - 1)), TernaryVal::True),
            None => false,
        }
    }

    fn num_variables(&self) -> u32 {
        self.num_vars.max(self.max_var)
    }

    fn num_clauses(&self) -> u32 {
        self.num_clauses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustsat_batsat::BasicSolver;

    #[test]
    fn test_batsat_adapter_basic() {
        let mut solver = RustSatAdapter::new(BasicSolver::default());

        solver.add_variables(2);
        assert_eq!(solver.num_variables(), 2);

        assert!(solver.add_clause(&[1, 2]));
        assert_eq!(solver.num_clauses(), 1);

        assert_eq!(solver.solve(), Verdict::Sat);
    }

    #[test]
    fn test_batsat_adapter_unsat() {
        let mut solver = RustSatAdapter::new(BasicSolver::default());

        solver.add_variables(1);
        solver.add_clause(&[1]);
        solver.add_clause(&[-1]);

        assert_eq!(solver.solve(), Verdict::Unsat);
    }

    #[test]
    fn test_batsat_adapter_solution() {
        let mut solver = RustSatAdapter::new(BasicSolver::default());

        solver.add_variables(3);
        solver.add_clause(&[1]);
        solver.add_clause(&[-2]);
        solver.add_clause(&[-1, 3]);

        assert_eq!(solver.solve(), Verdict::Sat);
        assert!(solver.value_of(1));
        assert!(!solver.value_of(2));
        assert!(solver.value_of(3));
    }
}
