//! Boolean circuit representation
//!
//! The boolean layer is the intermediate representation between the game
//! rules and CNF. Every rule of the model is built as a gate over the state
//! and move variables; the CNF translator then turns the root gate into
//! clauses for the oracle.
//!
//! Key types:
//! - `BooleanConstant`: TRUE (label 0) or FALSE (label -1)
//! - `BooleanVariable`: free variable with a positive label
//! - `BooleanFormula`: AND, OR, NOT and ITE gates, labelled like variables
//! - `BoolValue<'arena>`: any of the above, `Copy`, compared by label
//! - `BooleanFactory`: builds gates with constant folding and sharing

mod factory;
pub mod arena;

pub use arena::GateArena;
pub use factory::{BooleanFactory, Options};

use std::hash::{Hash, Hasher};

/// Boolean constant (TRUE or FALSE)
///
/// Constants have special labels:
/// - TRUE has label 0
/// - FALSE has label -1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BooleanConstant {
    /// TRUE constant (label 0)
    TRUE,
    /// FALSE constant (label -1)
    FALSE,
}

impl BooleanConstant {
    /// Returns the label for this constant
    pub fn label(&self) -> i32 {
        match self {
            BooleanConstant::TRUE => 0,
            BooleanConstant::FALSE => -1,
        }
    }

    /// Returns the boolean value of this constant
    pub fn boolean_value(&self) -> bool {
        *self == BooleanConstant::TRUE
    }
}

impl From<bool> for BooleanConstant {
    fn from(value: bool) -> Self {
        if value {
            BooleanConstant::TRUE
        } else {
            BooleanConstant::FALSE
        }
    }
}

/// Boolean variable with a positive integer label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BooleanVariable {
    label: i32,
}

impl BooleanVariable {
    /// Creates a new boolean variable with the given label.
    ///
    /// # Panics
    /// Panics if label is not positive (must be > 0).
    pub fn new(label: i32) -> Self {
        assert!(label > 0, "Variable labels must be positive");
        Self { label }
    }

    /// Returns the label for this variable
    pub fn label(&self) -> i32 {
        self.label
    }
}

/// Boolean gate
///
/// The label doubles as the gate's output variable in the CNF. Labels come
/// from the same counter as variables, so a label identifies a value.
#[derive(Debug)]
pub struct BooleanFormula<'arena> {
    label: i32,
    kind: FormulaKind<'arena>,
}

impl<'arena> BooleanFormula<'arena> {
    pub(crate) fn new(label: i32, kind: FormulaKind<'arena>) -> Self {
        Self { label, kind }
    }

    /// Returns the label for this formula
    pub fn label(&self) -> i32 {
        self.label
    }

    /// Returns the kind of this formula
    pub fn kind(&self) -> &FormulaKind<'arena> {
        &self.kind
    }
}

/// Gate kind
///
/// Inputs never contain constants; the factory folds them away.
#[derive(Debug, Clone, Copy)]
pub enum FormulaKind<'arena> {
    /// Multi-input AND gate
    And(&'arena [BoolValue<'arena>]),
    /// Multi-input OR gate
    Or(&'arena [BoolValue<'arena>]),
    /// NOT gate
    Not(BoolValue<'arena>),
    /// If-then-else gate
    Ite {
        /// Condition
        condition: BoolValue<'arena>,
        /// Then branch
        then_val: BoolValue<'arena>,
        /// Else branch
        else_val: BoolValue<'arena>,
    },
}

/// Unified boolean value type
///
/// Cheap to copy. Equality and hashing go through the label, which is
/// unique per value within one factory.
#[derive(Debug, Clone, Copy)]
pub enum BoolValue<'arena> {
    /// Constant (TRUE or FALSE)
    Constant(BooleanConstant),
    /// Variable
    Variable(BooleanVariable),
    /// Gate stored in the arena
    Formula(&'arena BooleanFormula<'arena>),
}

impl<'arena> BoolValue<'arena> {
    /// TRUE
    pub const TRUE: BoolValue<'static> = BoolValue::Constant(BooleanConstant::TRUE);
    /// FALSE
    pub const FALSE: BoolValue<'static> = BoolValue::Constant(BooleanConstant::FALSE);

    /// Returns the label for this value
    pub fn label(&self) -> i32 {
        match self {
            BoolValue::Constant(c) => c.label(),
            BoolValue::Variable(v) => v.label(),
            BoolValue::Formula(f) => f.label(),
        }
    }

    /// Returns true if this is the TRUE constant
    pub fn is_true(&self) -> bool {
        matches!(self, BoolValue::Constant(BooleanConstant::TRUE))
    }

    /// Returns true if this is the FALSE constant
    pub fn is_false(&self) -> bool {
        matches!(self, BoolValue::Constant(BooleanConstant::FALSE))
    }

    /// Returns true if this is a formula
    pub fn is_formula(&self) -> bool {
        matches!(self, BoolValue::Formula(_))
    }

    /// Evaluates this value under an assignment of variable labels
    ///
    /// Used by the extractor to read derived predicates back out of a model.
    pub fn evaluate(&self, value_of: &impl Fn(i32) -> bool) -> bool {
        match self {
            BoolValue::Constant(c) => c.boolean_value(),
            BoolValue::Variable(v) => value_of(v.label()),
            BoolValue::Formula(f) => match f.kind() {
                FormulaKind::And(inputs) => inputs.iter().all(|i| i.evaluate(value_of)),
                FormulaKind::Or(inputs) => inputs.iter().any(|i| i.evaluate(value_of)),
                FormulaKind::Not(input) => !input.evaluate(value_of),
                FormulaKind::Ite { condition, then_val, else_val } => {
                    if condition.evaluate(value_of) {
                        then_val.evaluate(value_of)
                    } else {
                        else_val.evaluate(value_of)
                    }
                }
            },
        }
    }
}

impl PartialEq for BoolValue<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.label() == other.label()
    }
}

impl Eq for BoolValue<'_> {}

impl Hash for BoolValue<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.label().hash(state);
    }
}

impl From<BooleanConstant> for BoolValue<'_> {
    fn from(c: BooleanConstant) -> Self {
        BoolValue::Constant(c)
    }
}

impl From<BooleanVariable> for BoolValue<'_> {
    fn from(v: BooleanVariable) -> Self {
        BoolValue::Variable(v)
    }
}

impl From<bool> for BoolValue<'_> {
    fn from(value: bool) -> Self {
        BoolValue::Constant(BooleanConstant::from(value))
    }
}
