//! Boolean factory with gate caching
//!
//! The factory creates boolean values and gates, with constant folding and
//! deduplication. Uses interior mutability (Cell/RefCell) to avoid &mut self
//! everywhere, so rule encoders can hold a shared reference.

use super::{BoolValue, BooleanFormula, BooleanVariable, FormulaKind, GateArena};
use rustc_hash::FxHashMap;
use std::cell::{Cell, RefCell};

/// Options for boolean factory
#[derive(Debug, Clone)]
pub struct Options {
    /// Enable sharing of structurally equal gates (default: true)
    pub sharing: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self { sharing: true }
    }
}

/// Boolean circuit factory with caching
///
/// Variables and gates draw their labels from one counter starting at 1, so
/// every non-constant value has a distinct positive label and the number of
/// labels handed out is the number of CNF variables.
pub struct BooleanFactory<'arena> {
    arena: &'arena GateArena,
    next_label: Cell<i32>,
    options: Options,
    // Key: (kind, sorted input labels) -> gate
    cache: RefCell<FxHashMap<CacheKey, BoolValue<'arena>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    And(Vec<i32>),
    Or(Vec<i32>),
    Not(i32),
    Ite(i32, i32, i32),
}

impl<'arena> BooleanFactory<'arena> {
    /// Creates a new boolean factory that stores its gates in `arena`
    pub fn new(arena: &'arena GateArena, options: Options) -> Self {
        Self {
            arena,
            next_label: Cell::new(1),
            options,
            cache: RefCell::new(FxHashMap::default()),
        }
    }

    /// Number of labels handed out so far (variables and gates)
    pub fn num_labels(&self) -> u32 {
        (self.next_label.get() - 1) as u32
    }

    /// Number of distinct gates held in the sharing cache
    pub fn num_cached_gates(&self) -> usize {
        self.cache.borrow().len()
    }

    /// Creates a fresh boolean variable
    pub fn variable(&self) -> BoolValue<'arena> {
        BoolValue::Variable(BooleanVariable::new(self.allocate_label()))
    }

    /// Creates `count` fresh variables
    pub fn variables(&self, count: usize) -> Vec<BoolValue<'arena>> {
        (0..count).map(|_| self.variable()).collect()
    }

    /// Creates a constant
    pub fn constant(&self, value: bool) -> BoolValue<'arena> {
        BoolValue::from(value)
    }

    /// Creates an AND gate
    pub fn and(&self, left: BoolValue<'arena>, right: BoolValue<'arena>) -> BoolValue<'arena> {
        self.and_multi(vec![left, right])
    }

    /// Creates a multi-input AND gate
    pub fn and_multi(&self, inputs: Vec<BoolValue<'arena>>) -> BoolValue<'arena> {
        match self.normalize(inputs, false) {
            Normalized::Folded(value) => value,
            Normalized::Inputs(inputs) => self.gate(inputs, false),
        }
    }

    /// Creates an OR gate
    pub fn or(&self, left: BoolValue<'arena>, right: BoolValue<'arena>) -> BoolValue<'arena> {
        self.or_multi(vec![left, right])
    }

    /// Creates a multi-input OR gate
    pub fn or_multi(&self, inputs: Vec<BoolValue<'arena>>) -> BoolValue<'arena> {
        match self.normalize(inputs, true) {
            Normalized::Folded(value) => value,
            Normalized::Inputs(inputs) => self.gate(inputs, true),
        }
    }

    /// Creates a NOT gate
    pub fn not(&self, input: BoolValue<'arena>) -> BoolValue<'arena> {
        match input {
            BoolValue::Constant(c) => return self.constant(!c.boolean_value()),
            BoolValue::Formula(f) => {
                if let FormulaKind::Not(inner) = f.kind() {
                    return *inner;
                }
            }
            BoolValue::Variable(_) => {}
        }

        let key = CacheKey::Not(input.label());
        self.cached(key, || FormulaKind::Not(input))
    }

    /// Creates an if-then-else gate
    pub fn ite(
        &self,
        condition: BoolValue<'arena>,
        then_val: BoolValue<'arena>,
        else_val: BoolValue<'arena>,
    ) -> BoolValue<'arena> {
        if let BoolValue::Constant(c) = condition {
            return if c.boolean_value() { then_val } else { else_val };
        }
        if then_val == else_val {
            return then_val;
        }
        match (then_val, else_val) {
            (BoolValue::Constant(t), BoolValue::Constant(_)) => {
                // branches differ, so this is either c or !c
                return if t.boolean_value() { condition } else { self.not(condition) };
            }
            (BoolValue::Constant(t), _) => {
                return if t.boolean_value() {
                    self.or(condition, else_val)
                } else {
                    self.and(self.not(condition), else_val)
                };
            }
            (_, BoolValue::Constant(e)) => {
                return if e.boolean_value() {
                    self.or(self.not(condition), then_val)
                } else {
                    self.and(condition, then_val)
                };
            }
            _ => {}
        }

        let key = CacheKey::Ite(condition.label(), then_val.label(), else_val.label());
        self.cached(key, || FormulaKind::Ite { condition, then_val, else_val })
    }

    /// IFF: a IFF b = if a then b else NOT b
    pub fn iff(&self, a: BoolValue<'arena>, b: BoolValue<'arena>) -> BoolValue<'arena> {
        self.ite(a, b, self.not(b))
    }

    /// IMPLIES: a IMPLIES b = NOT a OR b
    pub fn implies(&self, a: BoolValue<'arena>, b: BoolValue<'arena>) -> BoolValue<'arena> {
        self.or(self.not(a), b)
    }

    /// At most one of `inputs` holds (pairwise encoding)
    pub fn at_most_one(&self, inputs: &[BoolValue<'arena>]) -> BoolValue<'arena> {
        let mut pairs = Vec::new();
        for (i, &a) in inputs.iter().enumerate() {
            for &b in &inputs[i + 1..] {
                pairs.push(self.not(self.and(a, b)));
            }
        }
        self.and_multi(pairs)
    }

    /// Exactly one of `inputs` holds
    pub fn exactly_one(&self, inputs: &[BoolValue<'arena>]) -> BoolValue<'arena> {
        let some = self.or_multi(inputs.to_vec());
        self.and(some, self.at_most_one(inputs))
    }

    /// None of `inputs` holds
    pub fn none_of(&self, inputs: &[BoolValue<'arena>]) -> BoolValue<'arena> {
        self.not(self.or_multi(inputs.to_vec()))
    }

    /// Pointwise equality of two equally long vectors
    pub fn all_equal(&self, left: &[BoolValue<'arena>], right: &[BoolValue<'arena>]) -> BoolValue<'arena> {
        debug_assert_eq!(left.len(), right.len());
        self.and_multi(left.iter().zip(right).map(|(&l, &r)| self.iff(l, r)).collect())
    }

    /// Drops neutral constants, sorts and dedups the inputs and detects
    /// absorbing constants and complementary pairs.
    ///
    /// `disjunction` selects OR semantics (absorbing TRUE) over AND semantics
    /// (absorbing FALSE).
    fn normalize(&self, inputs: Vec<BoolValue<'arena>>, disjunction: bool) -> Normalized<'arena> {
        let absorbing = self.constant(disjunction);
        let mut kept = Vec::with_capacity(inputs.len());
        for input in inputs {
            match input {
                BoolValue::Constant(c) if c.boolean_value() == disjunction => {
                    return Normalized::Folded(absorbing);
                }
                BoolValue::Constant(_) => {}
                _ => kept.push(input),
            }
        }

        kept.sort_unstable_by_key(|v| v.label());
        kept.dedup();

        for input in &kept {
            if let BoolValue::Formula(f) = input {
                if let FormulaKind::Not(inner) = f.kind() {
                    if kept.binary_search_by_key(&inner.label(), |v| v.label()).is_ok() {
                        return Normalized::Folded(absorbing);
                    }
                }
            }
        }

        match kept.len() {
            0 => Normalized::Folded(self.constant(!disjunction)),
            1 => Normalized::Folded(kept[0]),
            _ => Normalized::Inputs(kept),
        }
    }

    fn gate(&self, inputs: Vec<BoolValue<'arena>>, disjunction: bool) -> BoolValue<'arena> {
        let labels: Vec<i32> = inputs.iter().map(|v| v.label()).collect();
        let key = if disjunction { CacheKey::Or(labels) } else { CacheKey::And(labels) };
        self.cached(key, || {
            let slice = self.arena.alloc_slice(&inputs);
            if disjunction { FormulaKind::Or(slice) } else { FormulaKind::And(slice) }
        })
    }

    fn cached(&self, key: CacheKey, kind: impl FnOnce() -> FormulaKind<'arena>) -> BoolValue<'arena> {
        if self.options.sharing {
            if let Some(&cached) = self.cache.borrow().get(&key) {
                return cached;
            }
        }

        let label = self.allocate_label();
        let formula = self.arena.alloc(BooleanFormula::new(label, kind()));
        let value = BoolValue::Formula(formula);
        if self.options.sharing {
            self.cache.borrow_mut().insert(key, value);
        }
        value
    }

    fn allocate_label(&self) -> i32 {
        let label = self.next_label.get();
        self.next_label.set(label + 1);
        label
    }
}

enum Normalized<'arena> {
    Folded(BoolValue<'arena>),
    Inputs(Vec<BoolValue<'arena>>),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_factory(f: impl FnOnce(&BooleanFactory<'_>)) {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        f(&factory);
    }

    #[test]
    fn test_variables_get_fresh_labels() {
        with_factory(|factory| {
            let v1 = factory.variable();
            let v2 = factory.variable();
            assert_eq!(v1.label(), 1);
            assert_eq!(v2.label(), 2);
            assert_ne!(v1, v2);
            assert_eq!(factory.num_labels(), 2);
        });
    }

    #[test]
    fn test_gate_deduplication() {
        with_factory(|factory| {
            let v1 = factory.variable();
            let v2 = factory.variable();

            let and1 = factory.and(v1, v2);
            let and2 = factory.and(v2, v1);
            assert_eq!(and1.label(), and2.label());
            assert_eq!(factory.num_cached_gates(), 1);
        });
    }

    #[test]
    fn test_sharing_can_be_disabled() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options { sharing: false });
        let v1 = factory.variable();
        let v2 = factory.variable();
        assert_ne!(factory.and(v1, v2), factory.and(v1, v2));
    }

    #[test]
    fn test_and_or_simplification() {
        with_factory(|factory| {
            let v1 = factory.variable();
            assert!(factory.and(factory.constant(true), factory.constant(false)).is_false());
            assert_eq!(factory.and(factory.constant(true), v1), v1);
            assert!(factory.or(factory.constant(true), v1).is_true());
            assert_eq!(factory.or(factory.constant(false), v1), v1);
            assert!(factory.and_multi(vec![]).is_true());
            assert!(factory.or_multi(vec![]).is_false());
        });
    }

    #[test]
    fn test_complementary_inputs_fold() {
        with_factory(|factory| {
            let v1 = factory.variable();
            let v2 = factory.variable();
            assert!(factory.and_multi(vec![v1, v2, factory.not(v1)]).is_false());
            assert!(factory.or(factory.not(v2), v2).is_true());
        });
    }

    #[test]
    fn test_double_negation() {
        with_factory(|factory| {
            let v1 = factory.variable();
            assert_eq!(factory.not(factory.not(v1)), v1);
            assert!(factory.not(factory.constant(true)).is_false());
        });
    }

    #[test]
    fn test_ite_simplification() {
        with_factory(|factory| {
            let v1 = factory.variable();
            let v2 = factory.variable();
            assert_eq!(factory.ite(factory.constant(true), v1, v2), v1);
            assert_eq!(factory.ite(factory.constant(false), v1, v2), v2);
            assert_eq!(factory.ite(v1, v2, v2), v2);
            assert_eq!(factory.ite(v1, factory.constant(true), factory.constant(false)), v1);
        });
    }

    #[test]
    fn test_one_hot_helpers() {
        with_factory(|factory| {
            let vars = factory.variables(3);
            let labels: Vec<i32> = vars.iter().map(|v| v.label()).collect();
            let exactly = factory.exactly_one(&vars);
            let assign = |on: &[bool]| {
                let labels = labels.clone();
                let on = on.to_vec();
                move |label: i32| labels.iter().position(|&l| l == label).map(|i| on[i]).unwrap_or(false)
            };
            assert!(exactly.evaluate(&assign(&[false, true, false])));
            assert!(!exactly.evaluate(&assign(&[true, true, false])));
            assert!(!exactly.evaluate(&assign(&[false, false, false])));
            assert!(factory.at_most_one(&vars).evaluate(&assign(&[false, false, false])));
        });
    }
}
