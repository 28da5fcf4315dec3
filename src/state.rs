//! Per-ply symbolic variables
//!
//! For a horizon of N plies there are N+1 positions (t = 0..=N) and N moves
//! (t = 0..N); move t leads from position t to position t+1. Every piece slot
//! gets one [`PieceVars`] per position and every ply one [`MoveVars`].
//! Nothing in this module knows the rules: [`StateVars::declare`] only adds
//! the shape constraints of the encoding (one-hot fields stay one-hot).

use crate::bool::{BoolValue, BooleanFactory};
use crate::domain::{Player, Setup, NUM_SQUARES};
use crate::error::{DobutsuError, Result};
use tracing::debug;

/// State of one piece at one position
#[derive(Debug, Clone, Copy)]
pub struct PieceVars<'a> {
    /// Current owner, true for Gote
    pub owner: BoolValue<'a>,
    /// Square one-hot; all false while in hand
    pub square: [BoolValue<'a>; NUM_SQUARES],
    /// Off the board
    pub captured: BoolValue<'a>,
    /// Promoted (Hen)
    pub promoted: BoolValue<'a>,
    /// Held by Sente / by Gote, indexed by `Player::index`
    pub in_hand: [BoolValue<'a>; 2],
}

/// One ply
#[derive(Debug, Clone)]
pub struct MoveVars<'a> {
    /// Moving piece, one-hot over slots
    pub actor: Vec<BoolValue<'a>>,
    /// The ply puts a piece from hand onto the board
    pub is_drop: BoolValue<'a>,
    /// Origin square one-hot; all false for drops
    pub from: [BoolValue<'a>; NUM_SQUARES],
    /// Destination square one-hot
    pub to: [BoolValue<'a>; NUM_SQUARES],
}

/// All variables of one encoding
pub struct StateVars<'a> {
    horizon: usize,
    pieces: usize,
    // indexed by t * pieces + slot
    states: Vec<PieceVars<'a>>,
    moves: Vec<MoveVars<'a>>,
}

impl<'a> StateVars<'a> {
    /// Allocates the variables for `setup` over `max_moves` plies
    ///
    /// Returns the variables together with the shape constraints: at most one
    /// square and at most one holder per piece, exactly one actor and one
    /// destination and at most one origin per ply.
    pub fn declare(
        factory: &BooleanFactory<'a>,
        max_moves: usize,
        setup: &Setup,
    ) -> Result<(Self, BoolValue<'a>)> {
        if max_moves < 1 {
            return Err(DobutsuError::InvalidHorizon(max_moves));
        }
        let pieces = setup.len();

        let mut states = Vec::with_capacity((max_moves + 1) * pieces);
        for _ in 0..=max_moves {
            for _ in 0..pieces {
                states.push(PieceVars {
                    owner: factory.variable(),
                    square: std::array::from_fn(|_| factory.variable()),
                    captured: factory.variable(),
                    promoted: factory.variable(),
                    in_hand: std::array::from_fn(|_| factory.variable()),
                });
            }
        }

        let moves: Vec<MoveVars<'a>> = (0..max_moves)
            .map(|_| MoveVars {
                actor: factory.variables(pieces),
                is_drop: factory.variable(),
                from: std::array::from_fn(|_| factory.variable()),
                to: std::array::from_fn(|_| factory.variable()),
            })
            .collect();

        let mut shape = Vec::new();
        for vars in &states {
            shape.push(factory.at_most_one(&vars.square));
            shape.push(factory.at_most_one(&vars.in_hand));
        }
        for mv in &moves {
            shape.push(factory.exactly_one(&mv.actor));
            shape.push(factory.exactly_one(&mv.to));
            shape.push(factory.at_most_one(&mv.from));
        }

        debug!(
            horizon = max_moves,
            pieces,
            labels = factory.num_labels(),
            "declared state variables"
        );

        let vars = Self { horizon: max_moves, pieces, states, moves };
        Ok((vars, factory.and_multi(shape)))
    }

    /// Number of plies N
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    /// Number of piece slots
    pub fn num_pieces(&self) -> usize {
        self.pieces
    }

    /// State of `slot` at position `t` (0..=N)
    pub fn piece(&self, t: usize, slot: usize) -> &PieceVars<'a> {
        &self.states[t * self.pieces + slot]
    }

    /// All piece states at position `t`
    pub fn position(&self, t: usize) -> &[PieceVars<'a>] {
        &self.states[t * self.pieces..(t + 1) * self.pieces]
    }

    /// Move record of ply `t` (0..N)
    pub fn moves(&self, t: usize) -> &MoveVars<'a> {
        &self.moves[t]
    }
}

impl<'a> PieceVars<'a> {
    /// The piece belongs to `player`
    pub fn owned_by(&self, factory: &BooleanFactory<'a>, player: Player) -> BoolValue<'a> {
        match player {
            Player::Gote => self.owner,
            Player::Sente => factory.not(self.owner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool::{GateArena, Options};

    #[test]
    fn test_zero_horizon_is_rejected() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let result = StateVars::declare(&factory, 0, &Setup::default());
        assert!(matches!(result, Err(DobutsuError::InvalidHorizon(0))));
    }

    #[test]
    fn test_variable_layout() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let (vars, shape) = StateVars::declare(&factory, 2, &Setup::default()).unwrap();

        assert_eq!(vars.horizon(), 2);
        assert_eq!(vars.num_pieces(), 8);
        assert_eq!(vars.position(1).len(), 8);
        assert_eq!(vars.moves(1).actor.len(), 8);
        assert!(shape.is_formula());

        // 3 positions * 8 pieces * 17 variables + 2 moves * (8 + 1 + 24)
        let declared = 3 * 8 * 17 + 2 * 33;
        assert!(factory.num_labels() as usize > declared);
        assert_eq!(vars.piece(0, 0).owner.label(), 1);
        assert_ne!(vars.piece(1, 0).owner, vars.piece(0, 0).owner);
    }
}
