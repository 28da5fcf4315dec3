//! Boolean circuit to CNF translation
//!
//! Converts boolean gates to CNF clauses using Tseitin transformation. Gate
//! labels are reused as the Tseitin output variables, so a model of the CNF
//! can be read back through the labels of the state variables directly.

use crate::bool::{BoolValue, BooleanFormula, FormulaKind};
use rustc_hash::FxHashSet;

/// CNF representation
#[derive(Debug, Clone, Default)]
pub struct CNF {
    /// Number of variables
    pub num_variables: u32,
    /// CNF clauses (each clause is a vec of literals, negative = negated)
    pub clauses: Vec<Vec<i32>>,
}

impl CNF {
    /// Creates a new empty CNF
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a clause to the CNF
    pub fn add_clause(&mut self, clause: Vec<i32>) {
        for &lit in &clause {
            let var = lit.unsigned_abs();
            if var > self.num_variables {
                self.num_variables = var;
            }
        }
        self.clauses.push(clause);
    }

    /// Number of clauses
    pub fn num_clauses(&self) -> usize {
        self.clauses.len()
    }

    /// True if the CNF contains the empty clause
    pub fn is_trivially_unsat(&self) -> bool {
        self.clauses.iter().any(|c| c.is_empty())
    }
}

/// Translates boolean circuits to CNF
pub struct CNFTranslator {
    cnf: CNF,
    /// Gates already translated (by label)
    visited: FxHashSet<i32>,
}

impl CNFTranslator {
    /// Creates a translator for a circuit whose labels go up to `num_labels`
    ///
    /// Every label is declared even if no clause mentions it, so unconstrained
    /// state variables still have a value in the model.
    pub fn new(num_labels: u32) -> Self {
        Self {
            cnf: CNF { num_variables: num_labels, clauses: Vec::new() },
            visited: FxHashSet::default(),
        }
    }

    /// Translates a root value and asserts it
    ///
    /// Top-level conjuncts are asserted one by one instead of through an AND
    /// gate. A TRUE root yields no clauses, a FALSE root the empty clause.
    pub fn translate(mut self, root: BoolValue<'_>) -> CNF {
        let mut pending = vec![root];
        while let Some(value) = pending.pop() {
            match value {
                BoolValue::Constant(c) => {
                    if !c.boolean_value() {
                        self.cnf.add_clause(Vec::new());
                    }
                }
                BoolValue::Formula(f) => match f.kind() {
                    FormulaKind::And(inputs) => pending.extend(inputs.iter().copied()),
                    FormulaKind::Or(inputs) => {
                        let clause = inputs.iter().map(|v| self.translate_value(*v)).collect();
                        self.cnf.add_clause(clause);
                    }
                    _ => {
                        let label = self.translate_value(value);
                        self.cnf.add_clause(vec![label]);
                    }
                },
                BoolValue::Variable(v) => self.cnf.add_clause(vec![v.label()]),
            }
        }
        self.cnf
    }

    /// Translates a boolean value and returns its label
    ///
    /// Only called on non-constant values: the factory folds constants out of
    /// every gate.
    fn translate_value(&mut self, value: BoolValue<'_>) -> i32 {
        match value {
            BoolValue::Constant(c) => {
                debug_assert!(false, "constant {c:?} inside a gate");
                c.label()
            }
            BoolValue::Variable(v) => v.label(),
            BoolValue::Formula(f) => self.translate_formula(f),
        }
    }

    /// Translates a boolean formula using Tseitin transformation
    fn translate_formula(&mut self, formula: &BooleanFormula<'_>) -> i32 {
        let output = formula.label();
        if !self.visited.insert(output) {
            return output;
        }

        match *formula.kind() {
            FormulaKind::And(inputs) => self.translate_and(output, inputs),
            FormulaKind::Or(inputs) => self.translate_or(output, inputs),
            FormulaKind::Not(input) => self.translate_not(output, input),
            FormulaKind::Ite { condition, then_val, else_val } => {
                self.translate_ite(output, condition, then_val, else_val)
            }
        }

        output
    }

    /// Translates AND gate: output = a1 ∧ a2 ∧ ... ∧ an
    ///
    /// - (¬a1 ∨ ¬a2 ∨ ... ∨ ¬an ∨ output)
    /// - (ai ∨ ¬output) for each i
    fn translate_and(&mut self, output: i32, inputs: &[BoolValue<'_>]) {
        let input_labels: Vec<i32> = inputs.iter().map(|v| self.translate_value(*v)).collect();

        let mut clause: Vec<i32> = input_labels.iter().map(|&l| -l).collect();
        clause.push(output);
        self.cnf.add_clause(clause);

        for &input in &input_labels {
            self.cnf.add_clause(vec![input, -output]);
        }
    }

    /// Translates OR gate: output = a1 ∨ a2 ∨ ... ∨ an
    ///
    /// - (a1 ∨ a2 ∨ ... ∨ an ∨ ¬output)
    /// - (¬ai ∨ output) for each i
    fn translate_or(&mut self, output: i32, inputs: &[BoolValue<'_>]) {
        let input_labels: Vec<i32> = inputs.iter().map(|v| self.translate_value(*v)).collect();

        let mut clause = input_labels.clone();
        clause.push(-output);
        self.cnf.add_clause(clause);

        for &input in &input_labels {
            self.cnf.add_clause(vec![-input, output]);
        }
    }

    /// Translates NOT gate: output = ¬input
    fn translate_not(&mut self, output: i32, input: BoolValue<'_>) {
        let input_label = self.translate_value(input);
        self.cnf.add_clause(vec![input_label, output]);
        self.cnf.add_clause(vec![-input_label, -output]);
    }

    /// Translates ITE gate: output = if cond then then_val else else_val
    fn translate_ite(&mut self, output: i32, condition: BoolValue<'_>, then_val: BoolValue<'_>, else_val: BoolValue<'_>) {
        let cond = self.translate_value(condition);
        let then_label = self.translate_value(then_val);
        let else_label = self.translate_value(else_val);

        self.cnf.add_clause(vec![-cond, -then_label, output]);
        self.cnf.add_clause(vec![-cond, then_label, -output]);
        self.cnf.add_clause(vec![cond, -else_label, output]);
        self.cnf.add_clause(vec![cond, else_label, -output]);
        // redundant, helps propagation when both branches agree
        self.cnf.add_clause(vec![-then_label, -else_label, output]);
        self.cnf.add_clause(vec![then_label, else_label, -output]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool::{BooleanFactory, GateArena, Options};

    #[test]
    fn test_cnf_add_clause() {
        let mut cnf = CNF::new();
        cnf.add_clause(vec![1, -2, 3]);
        assert_eq!(cnf.num_variables, 3);
        assert_eq!(cnf.num_clauses(), 1);
    }

    #[test]
    fn test_translate_constants() {
        let cnf = CNFTranslator::new(0).translate(BoolValue::TRUE);
        assert_eq!(cnf.num_clauses(), 0);

        let cnf = CNFTranslator::new(0).translate(BoolValue::FALSE);
        assert!(cnf.is_trivially_unsat());
    }

    #[test]
    fn test_unused_labels_are_declared() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let vars = factory.variables(4);
        let cnf = CNFTranslator::new(factory.num_labels()).translate(vars[0]);
        assert_eq!(cnf.num_variables, 4);
        assert_eq!(cnf.clauses, vec![vec![1]]);
    }

    #[test]
    fn test_top_level_conjunction_is_split() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let v = factory.variables(3);
        let root = factory.and_multi(vec![v[0], factory.or(v[1], v[2])]);

        let cnf = CNFTranslator::new(factory.num_labels()).translate(root);
        // unit clause for v0 and one plain clause for the disjunction
        assert_eq!(cnf.num_clauses(), 2);
        assert!(cnf.clauses.contains(&vec![1]));
        assert!(cnf.clauses.contains(&vec![2, 3]));
    }

    #[test]
    fn test_shared_subexpressions_translated_once() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let v = factory.variables(3);
        let and = factory.and(v[0], v[1]);
        let left = factory.or(and, v[2]);
        let right = factory.or(and, factory.not(v[2]));
        let root = factory.and(left, right);

        let cnf = CNFTranslator::new(factory.num_labels()).translate(root);
        // AND gate: 3 clauses, NOT gate: 2 clauses, two top-level ORs: 2 clauses
        assert_eq!(cnf.num_clauses(), 7);
    }
}
