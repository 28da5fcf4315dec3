//! Game rules as constraints
//!
//! [`RuleEncoder`] turns a [`StateVars`] into the set of lines that are legal
//! games from the setup. The encoder is split by concern:
//! - this module: initial binding, frame constraints and shared helpers
//! - [`movement`]: turn alternation, movement and drop legality, capture and
//!   promotion transitions
//! - [`victory`]: attack maps, victory predicates, the game-end constraint
//!   and the chick-drop-mate prohibition
//!
//! The encoder holds no state across calls other than a cache of attack
//! maps, which lives and dies with the encoder.

pub mod movement;
pub mod victory;

use crate::bool::{BoolValue, BooleanFactory};
use crate::domain::{PieceKind, Player, Setup, Square, NUM_SQUARES};
use crate::state::StateVars;
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// Rule toggles
#[derive(Debug, Clone)]
pub struct Rules {
    /// Forbid dropping a Chick to give immediate checkmate (default: true)
    pub chick_drop_mate: bool,
}

impl Default for Rules {
    fn default() -> Self {
        Self { chick_drop_mate: true }
    }
}

/// Per-slot, per-square attack map of one player at one position
type AttackMap<'a> = Rc<Vec<[BoolValue<'a>; NUM_SQUARES]>>;

/// Builds rule constraints over one set of state variables
pub struct RuleEncoder<'a, 'v> {
    factory: &'v BooleanFactory<'a>,
    vars: &'v StateVars<'a>,
    setup: &'v Setup,
    rules: Rules,
    attacks: RefCell<FxHashMap<(usize, Player), AttackMap<'a>>>,
}

impl<'a, 'v> RuleEncoder<'a, 'v> {
    /// Creates an encoder; `vars` must have been declared for `setup`
    pub fn new(factory: &'v BooleanFactory<'a>, vars: &'v StateVars<'a>, setup: &'v Setup, rules: Rules) -> Self {
        debug_assert_eq!(vars.num_pieces(), setup.len());
        Self {
            factory,
            vars,
            setup,
            rules,
            attacks: RefCell::new(FxHashMap::default()),
        }
    }

    /// The factory gates are built with
    pub fn factory(&self) -> &'v BooleanFactory<'a> {
        self.factory
    }

    /// The state variables
    pub fn vars(&self) -> &'v StateVars<'a> {
        self.vars
    }

    /// The setup
    pub fn setup(&self) -> &'v Setup {
        self.setup
    }

    /// Number of plies N
    pub fn horizon(&self) -> usize {
        self.vars.horizon()
    }

    /// Conjunction of every rule of the game
    pub fn constraints(&self) -> BoolValue<'a> {
        self.constraints_with(|t| self.game_not_over(t))
    }

    /// Every rule of the game, with the game-end rule before ply `t` given
    /// by `play_continues(t)` instead of [`RuleEncoder::game_not_over`]
    pub fn constraints_with(&self, play_continues: impl Fn(usize) -> BoolValue<'a>) -> BoolValue<'a> {
        let horizon = self.horizon();
        let mut all = vec![self.initial_position()];
        for t in 0..=horizon {
            all.push(self.frame(t));
        }
        for t in 0..horizon {
            all.push(self.ply(t));
            all.push(play_continues(t));
            if self.rules.chick_drop_mate {
                all.push(self.no_chick_drop_mate(t));
            }
        }
        let rules = self.factory.and_multi(all);
        debug!(horizon, labels = self.factory.num_labels(), "encoded rules");
        rules
    }

    /// Binds every variable of position 0 to the setup
    pub fn initial_position(&self) -> BoolValue<'a> {
        let f = self.factory;
        let mut all = Vec::new();
        for (slot, seed) in self.setup.pieces().iter().enumerate() {
            let vars = self.vars.piece(0, slot);
            let in_hand = seed.location.square().is_none();
            all.push(self.literal(vars.owner, seed.owner == Player::Gote));
            all.push(self.literal(vars.captured, in_hand));
            all.push(self.literal(vars.promoted, seed.promoted));
            for player in Player::ALL {
                all.push(self.literal(vars.in_hand[player.index()], in_hand && seed.owner == player));
            }
            for square in Square::all() {
                let here = seed.location.square() == Some(square);
                all.push(self.literal(vars.square[square.index()], here));
            }
        }
        f.and_multi(all)
    }

    /// Consistency of one position
    ///
    /// A piece is captured exactly when it has no square, in hand of exactly
    /// its owner when captured, never shares a square, and only Chicks are
    /// ever promoted.
    pub fn frame(&self, t: usize) -> BoolValue<'a> {
        let f = self.factory;
        let position = self.vars.position(t);
        let mut all = Vec::new();
        for (slot, vars) in position.iter().enumerate() {
            all.push(f.iff(vars.captured, f.none_of(&vars.square)));
            for player in Player::ALL {
                let held = f.and(vars.captured, vars.owned_by(f, player));
                all.push(f.iff(vars.in_hand[player.index()], held));
            }
            if self.kind(slot) != PieceKind::Chick {
                all.push(f.not(vars.promoted));
            }
        }
        for square in 0..NUM_SQUARES {
            let column: Vec<_> = position.iter().map(|vars| vars.square[square]).collect();
            all.push(f.at_most_one(&column));
        }
        f.and_multi(all)
    }

    /// Static kind of a slot
    pub fn kind(&self, slot: usize) -> PieceKind {
        self.setup.pieces()[slot].kind
    }

    /// Some piece stands on `square` at position `t`
    pub fn occupied(&self, t: usize, square: Square) -> BoolValue<'a> {
        let squares = self.vars.position(t).iter().map(|vars| vars.square[square.index()]).collect();
        self.factory.or_multi(squares)
    }

    /// A piece of `player` stands on `square` at position `t`
    pub fn occupied_by(&self, t: usize, player: Player, square: Square) -> BoolValue<'a> {
        let f = self.factory;
        let pieces = self
            .vars
            .position(t)
            .iter()
            .map(|vars| f.and(vars.square[square.index()], vars.owned_by(f, player)))
            .collect();
        f.or_multi(pieces)
    }

    /// Slot `slot` stands on `square` at position `t`
    pub fn on_square(&self, t: usize, slot: usize, square: Square) -> BoolValue<'a> {
        self.vars.piece(t, slot).square[square.index()]
    }

    fn literal(&self, value: BoolValue<'a>, expected: bool) -> BoolValue<'a> {
        if expected {
            value
        } else {
            self.factory.not(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool::{GateArena, Options};
    use crate::cnf::CNFTranslator;
    use crate::engine::{RustSatAdapter, SATSolver, Verdict};
    use rustsat_batsat::BasicSolver;

    fn satisfiable(root: BoolValue<'_>, labels: u32) -> bool {
        let cnf = CNFTranslator::new(labels).translate(root);
        let mut solver = RustSatAdapter::new(BasicSolver::default());
        solver.add_variables(cnf.num_variables);
        for clause in &cnf.clauses {
            solver.add_clause(clause);
        }
        solver.solve() == Verdict::Sat
    }

    #[test]
    fn test_initial_position_satisfies_frame() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let setup = Setup::default();
        let (vars, shape) = StateVars::declare(&factory, 1, &setup).unwrap();
        let encoder = RuleEncoder::new(&factory, &vars, &setup, Rules::default());

        let root = factory.and_multi(vec![shape, encoder.initial_position(), encoder.frame(0)]);
        assert!(satisfiable(root, factory.num_labels()));
    }

    #[test]
    fn test_frame_forbids_shared_squares() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let setup = Setup::default();
        let (vars, shape) = StateVars::declare(&factory, 1, &setup).unwrap();
        let encoder = RuleEncoder::new(&factory, &vars, &setup, Rules::default());

        let b2 = Square::new(1, 1).unwrap();
        let root = factory.and_multi(vec![
            shape,
            encoder.frame(1),
            encoder.on_square(1, 0, b2),
            encoder.on_square(1, 4, b2),
        ]);
        assert!(!satisfiable(root, factory.num_labels()));
    }

    #[test]
    fn test_full_rules_are_satisfiable_from_the_start() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let setup = Setup::default();
        let (vars, shape) = StateVars::declare(&factory, 2, &setup).unwrap();
        let encoder = RuleEncoder::new(&factory, &vars, &setup, Rules::default());

        let root = factory.and(shape, encoder.constraints());
        assert!(satisfiable(root, factory.num_labels()));
    }
}
