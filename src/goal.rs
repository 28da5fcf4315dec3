//! Goal predicates for composed puzzles
//!
//! A [`Goal`] is a small temporal formula over one line of play. Facts about
//! pieces are read at a position; facts about moves are read from the ply
//! that *led to* the position, so `Goal::moves(p).at(2)` means "the second
//! ply moved p" and nothing is ever true of a move at position 0.
//!
//! Without a time wrapper a goal is read at the last position of the line.
//!
//! ```
//! use dobutsu_rs::domain::{PieceId, Player, Square};
//! use dobutsu_rs::goal::Goal;
//!
//! # fn main() -> dobutsu_rs::Result<()> {
//! let chick = PieceId::new(3)?;
//! // take Gote's chick and promote our own, in either order
//! let goal = Goal::captured(PieceId::new(7)?).and(Goal::promoted(chick)).sometime();
//! assert!(matches!(goal, Goal::Sometime(_)));
//! # Ok(())
//! # }
//! ```

use crate::bool::BoolValue;
use crate::domain::{PieceId, Player, Square};
use crate::error::{DobutsuError, Result};
use crate::rules::RuleEncoder;
use std::ops::Not;

/// Temporal predicate over a line of play
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Goal {
    /// The piece stands on the square
    OnSquare {
        /// Piece
        piece: PieceId,
        /// Square
        square: Square,
    },
    /// The piece is off the board
    Captured(PieceId),
    /// The piece is in the hand of the player
    InHandOf {
        /// Piece
        piece: PieceId,
        /// Holder
        player: Player,
    },
    /// The piece is a Hen
    Promoted(PieceId),
    /// The piece belongs to the player
    OwnedBy {
        /// Piece
        piece: PieceId,
        /// Owner
        player: Player,
    },
    /// The last ply moved or dropped the piece
    Moves(PieceId),
    /// The last ply dropped the piece
    Drops(PieceId),
    /// The last ply captured the piece
    Captures(PieceId),
    /// The last ply ended on the square
    LandsOn(Square),
    /// The player has won
    Victory(Player),
    /// Always true
    True,
    /// Negation
    Not(Box<Goal>),
    /// Conjunction; empty is true
    All(Vec<Goal>),
    /// Disjunction; empty is false
    Any(Vec<Goal>),
    /// Read the inner goal at a fixed position
    At {
        /// Position, 0..=N
        ply: usize,
        /// Inner goal
        goal: Box<Goal>,
    },
    /// Read the inner goal at the last position
    AtEnd(Box<Goal>),
    /// The inner goal holds at some position
    Sometime(Box<Goal>),
    /// The inner goal holds at every position
    Always(Box<Goal>),
}

impl Goal {
    /// `piece` on `square`
    pub fn on_square(piece: PieceId, square: Square) -> Self {
        Goal::OnSquare { piece, square }
    }

    /// `piece` off the board
    pub fn captured(piece: PieceId) -> Self {
        Goal::Captured(piece)
    }

    /// `piece` held by `player`
    pub fn in_hand_of(piece: PieceId, player: Player) -> Self {
        Goal::InHandOf { piece, player }
    }

    /// `piece` promoted
    pub fn promoted(piece: PieceId) -> Self {
        Goal::Promoted(piece)
    }

    /// `piece` owned by `player`
    pub fn owned_by(piece: PieceId, player: Player) -> Self {
        Goal::OwnedBy { piece, player }
    }

    /// The last ply moved `piece`
    pub fn moves(piece: PieceId) -> Self {
        Goal::Moves(piece)
    }

    /// The last ply dropped `piece`
    pub fn drops(piece: PieceId) -> Self {
        Goal::Drops(piece)
    }

    /// The last ply captured `piece`
    pub fn captures(piece: PieceId) -> Self {
        Goal::Captures(piece)
    }

    /// The last ply landed on `square`
    pub fn lands_on(square: Square) -> Self {
        Goal::LandsOn(square)
    }

    /// `player` has won
    pub fn victory(player: Player) -> Self {
        Goal::Victory(player)
    }

    /// Both goals
    pub fn and(self, other: Goal) -> Self {
        match self {
            Goal::All(mut goals) => {
                goals.push(other);
                Goal::All(goals)
            }
            goal => Goal::All(vec![goal, other]),
        }
    }

    /// Either goal
    pub fn or(self, other: Goal) -> Self {
        match self {
            Goal::Any(mut goals) => {
                goals.push(other);
                Goal::Any(goals)
            }
            goal => Goal::Any(vec![goal, other]),
        }
    }

    /// If `self` then `other`
    pub fn implies(self, other: Goal) -> Self {
        Goal::Any(vec![!self, other])
    }

    /// Read at position `ply`
    pub fn at(self, ply: usize) -> Self {
        Goal::At { ply, goal: Box::new(self) }
    }

    /// Read at the last position
    pub fn at_end(self) -> Self {
        Goal::AtEnd(Box::new(self))
    }

    /// Holds at some position
    pub fn sometime(self) -> Self {
        Goal::Sometime(Box::new(self))
    }

    /// Holds at every position
    pub fn always(self) -> Self {
        Goal::Always(Box::new(self))
    }

    /// Checks piece ids and plies against a setup and horizon without
    /// building anything
    pub fn validate(&self, encoder: &RuleEncoder<'_, '_>) -> Result<()> {
        let horizon = encoder.horizon();
        match self {
            Goal::OnSquare { piece, .. }
            | Goal::Captured(piece)
            | Goal::InHandOf { piece, .. }
            | Goal::Promoted(piece)
            | Goal::OwnedBy { piece, .. }
            | Goal::Moves(piece)
            | Goal::Drops(piece)
            | Goal::Captures(piece) => encoder.setup().require_slot(*piece).map(|_| ()),
            Goal::LandsOn(_) | Goal::Victory(_) | Goal::True => Ok(()),
            Goal::Not(goal) | Goal::AtEnd(goal) | Goal::Sometime(goal) | Goal::Always(goal) => {
                goal.validate(encoder)
            }
            Goal::All(goals) | Goal::Any(goals) => goals.iter().try_for_each(|g| g.validate(encoder)),
            Goal::At { ply, goal } => {
                if *ply > horizon {
                    return Err(DobutsuError::InvalidGoal(format!(
                        "ply {ply} is beyond the horizon of {horizon} plies"
                    )));
                }
                goal.validate(encoder)
            }
        }
    }

    /// Builds the goal's circuit, read at the last position
    pub fn encode<'a>(&self, encoder: &RuleEncoder<'a, '_>) -> Result<BoolValue<'a>> {
        self.validate(encoder)?;
        Ok(self.encode_at(encoder, encoder.horizon()))
    }

    fn encode_at<'a>(&self, encoder: &RuleEncoder<'a, '_>, t: usize) -> BoolValue<'a> {
        let f = encoder.factory();
        let vars = encoder.vars();
        let setup = encoder.setup();
        // validated before encoding
        let slot = |piece: &PieceId| setup.slot_of(*piece).unwrap_or_default();
        let last_ply = t.checked_sub(1).map(|ply| vars.moves(ply));

        match self {
            Goal::OnSquare { piece, square } => encoder.on_square(t, slot(piece), *square),
            Goal::Captured(piece) => vars.piece(t, slot(piece)).captured,
            Goal::InHandOf { piece, player } => vars.piece(t, slot(piece)).in_hand[player.index()],
            Goal::Promoted(piece) => vars.piece(t, slot(piece)).promoted,
            Goal::OwnedBy { piece, player } => vars.piece(t, slot(piece)).owned_by(f, *player),
            Goal::Moves(piece) => last_ply.map_or(BoolValue::FALSE, |mv| mv.actor[slot(piece)]),
            Goal::Drops(piece) => {
                last_ply.map_or(BoolValue::FALSE, |mv| f.and(mv.is_drop, mv.actor[slot(piece)]))
            }
            Goal::Captures(piece) => match last_ply {
                Some(_) => {
                    let before = vars.piece(t - 1, slot(piece));
                    let after = vars.piece(t, slot(piece));
                    f.and(f.not(before.captured), after.captured)
                }
                None => BoolValue::FALSE,
            },
            Goal::LandsOn(square) => last_ply.map_or(BoolValue::FALSE, |mv| mv.to[square.index()]),
            Goal::Victory(player) => encoder.victory(*player, t),
            Goal::True => BoolValue::TRUE,
            Goal::Not(goal) => f.not(goal.encode_at(encoder, t)),
            Goal::All(goals) => f.and_multi(goals.iter().map(|g| g.encode_at(encoder, t)).collect()),
            Goal::Any(goals) => f.or_multi(goals.iter().map(|g| g.encode_at(encoder, t)).collect()),
            Goal::At { ply, goal } => goal.encode_at(encoder, *ply),
            Goal::AtEnd(goal) => goal.encode_at(encoder, encoder.horizon()),
            Goal::Sometime(goal) => {
                f.or_multi((0..=encoder.horizon()).map(|u| goal.encode_at(encoder, u)).collect())
            }
            Goal::Always(goal) => {
                f.and_multi((0..=encoder.horizon()).map(|u| goal.encode_at(encoder, u)).collect())
            }
        }
    }
}

impl Not for Goal {
    type Output = Goal;

    fn not(self) -> Goal {
        match self {
            Goal::Not(inner) => *inner,
            goal => Goal::Not(Box::new(goal)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bool::{BooleanFactory, GateArena, Options};
    use crate::domain::Setup;
    use crate::rules::Rules;
    use crate::state::StateVars;

    fn id(n: u8) -> PieceId {
        PieceId::new(n).unwrap()
    }

    #[test]
    fn test_combinators_flatten() {
        let goal = Goal::captured(id(7)).and(Goal::promoted(id(3))).and(Goal::True);
        assert!(matches!(&goal, Goal::All(goals) if goals.len() == 3));
        assert_eq!(!!Goal::captured(id(1)), Goal::captured(id(1)));
    }

    #[test]
    fn test_goals_are_checked_against_setup_and_horizon() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let setup = Setup::new(vec![Setup::default().pieces()[1], Setup::default().pieces()[5]]).unwrap();
        let (vars, _) = StateVars::declare(&factory, 2, &setup).unwrap();
        let encoder = RuleEncoder::new(&factory, &vars, &setup, Rules::default());

        assert_eq!(
            Goal::captured(id(3)).sometime().encode(&encoder),
            Err(DobutsuError::UnknownPiece(id(3)))
        );
        assert!(matches!(
            Goal::captured(id(5)).at(3).encode(&encoder),
            Err(DobutsuError::InvalidGoal(_))
        ));
        assert!(Goal::captured(id(5)).at(2).encode(&encoder).is_ok());
    }

    #[test]
    fn test_move_facts_are_false_before_the_first_ply() {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let setup = Setup::default();
        let (vars, _) = StateVars::declare(&factory, 1, &setup).unwrap();
        let encoder = RuleEncoder::new(&factory, &vars, &setup, Rules::default());

        let at_start = Goal::moves(id(3)).at(0).encode(&encoder).unwrap();
        assert!(at_start.is_false());
        let last = Goal::moves(id(3)).encode(&encoder).unwrap();
        assert_eq!(last, vars.moves(0).actor[3]);
    }
}
