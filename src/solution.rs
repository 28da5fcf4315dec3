//! Decoded lines and typed solutions
//!
//! [`Line::decode`] reads every position and every ply back out of a model
//! and replays each ply against the position before it. The rule encoding
//! should make that replay a formality; any disagreement is reported as
//! [`DobutsuError::EncodingInconsistency`] instead of producing a line that
//! is not a legal game.

use crate::bool::BoolValue;
use crate::domain::{Location, PieceId, PieceKind, Player, Setup, Square};
use crate::error::{DobutsuError, Result};
use crate::goal::Goal;
use crate::state::StateVars;
use std::fmt;

/// One piece in a decoded position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceState {
    /// Identity
    pub id: PieceId,
    /// Static kind
    pub kind: PieceKind,
    /// Current owner
    pub owner: Player,
    /// Board square or hand
    pub location: Location,
    /// Hen
    pub promoted: bool,
}

/// A decoded position; position k is the one after ply k
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    ply: usize,
    pieces: Vec<PieceState>,
}

impl Position {
    /// Index of the position, 0 for the setup
    pub fn ply(&self) -> usize {
        self.ply
    }

    /// All pieces in slot order
    pub fn pieces(&self) -> &[PieceState] {
        &self.pieces
    }

    /// State of a piece
    pub fn piece(&self, id: PieceId) -> Option<&PieceState> {
        self.pieces.iter().find(|p| p.id == id)
    }

    /// Piece on a square
    pub fn at(&self, square: Square) -> Option<&PieceState> {
        self.pieces.iter().find(|p| p.location == Location::Board(square))
    }

    /// Pieces held by `player`
    pub fn hand(&self, player: Player) -> impl Iterator<Item = &PieceState> {
        self.pieces
            .iter()
            .filter(move |p| p.location == Location::Hand && p.owner == player)
    }
}

/// Where a move started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A board move from this square
    Board(Square),
    /// A drop from hand
    Hand,
}

/// One decoded ply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    /// Ply number, 1 for the first move
    pub ply: usize,
    /// Side that moved
    pub player: Player,
    /// Piece moved or dropped
    pub piece: PieceId,
    /// Its kind
    pub kind: PieceKind,
    /// The piece moved as a Hen
    pub promoted: bool,
    /// Board square or hand
    pub origin: Origin,
    /// Destination
    pub to: Square,
    /// Piece taken on the destination
    pub captured: Option<PieceId>,
    /// The move turned a Chick into a Hen
    pub promotes: bool,
}

impl Move {
    /// True for drops
    pub fn is_drop(&self) -> bool {
        self.origin == Origin::Hand
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {} {}", self.ply, self.player, self.kind.symbol(self.promoted))?;
        match self.origin {
            Origin::Hand => write!(f, "*{}", self.to)?,
            Origin::Board(from) => {
                let sep = if self.captured.is_some() { 'x' } else { '-' };
                write!(f, "{from}{sep}{}", self.to)?;
            }
        }
        if self.promotes {
            write!(f, "+")?;
        }
        Ok(())
    }
}

/// A line of play: N moves and the N+1 positions around them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    moves: Vec<Move>,
    positions: Vec<Position>,
}

impl Line {
    /// The moves in order
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Positions 0..=len
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    /// Number of plies
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// True for a line without moves
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// The last position
    pub fn final_position(&self) -> &Position {
        // a line always has its starting position
        &self.positions[self.positions.len() - 1]
    }

    /// The first `plies` moves of the line
    pub fn truncated(mut self, plies: usize) -> Line {
        self.moves.truncate(plies);
        self.positions.truncate(plies + 1);
        self
    }

    /// Reads a line out of a model
    ///
    /// `value_of` maps a variable label to its value in the model.
    pub fn decode<'a>(vars: &StateVars<'a>, setup: &Setup, value_of: &impl Fn(i32) -> bool) -> Result<Line> {
        let read = |value: BoolValue<'a>| value.evaluate(value_of);

        let positions = (0..=vars.horizon())
            .map(|t| decode_position(vars, setup, t, &read))
            .collect::<Result<Vec<_>>>()?;

        let mut moves = Vec::with_capacity(vars.horizon());
        for t in 0..vars.horizon() {
            let mut mv = decode_move(vars, setup, t, &read, &positions[t])?;
            mv.promotes = replay(setup, &mv, &positions[t], &positions[t + 1])?;
            moves.push(mv);
        }

        Ok(Line { moves, positions })
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mv) in self.moves.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{mv}")?;
        }
        Ok(())
    }
}

fn inconsistent(ply: usize, detail: impl Into<String>) -> DobutsuError {
    DobutsuError::EncodingInconsistency { ply, detail: detail.into() }
}

fn one_hot<'a>(ply: usize, what: &str, bits: &[BoolValue<'a>], read: &impl Fn(BoolValue<'a>) -> bool) -> Result<Option<usize>> {
    let mut set = bits.iter().enumerate().filter(|(_, b)| read(**b)).map(|(i, _)| i);
    let first = set.next();
    if set.next().is_some() {
        return Err(inconsistent(ply, format!("{what} has more than one value")));
    }
    Ok(first)
}

fn decode_position<'a>(
    vars: &StateVars<'a>,
    setup: &Setup,
    t: usize,
    read: &impl Fn(BoolValue<'a>) -> bool,
) -> Result<Position> {
    let mut pieces = Vec::with_capacity(setup.len());
    for (slot, seed) in setup.pieces().iter().enumerate() {
        let v = vars.piece(t, slot);
        let square = one_hot(t, "square", &v.square, read)?.and_then(Square::from_index);
        let captured = read(v.captured);
        if captured == square.is_some() {
            return Err(inconsistent(t, format!("piece {} is both on and off the board", seed.id)));
        }
        let owner = if read(v.owner) { Player::Gote } else { Player::Sente };
        if captured && !read(v.in_hand[owner.index()]) {
            return Err(inconsistent(t, format!("piece {} is captured but not in {owner}'s hand", seed.id)));
        }
        pieces.push(PieceState {
            id: seed.id,
            kind: seed.kind,
            owner,
            location: square.map_or(Location::Hand, Location::Board),
            promoted: read(v.promoted),
        });
    }

    for (i, piece) in pieces.iter().enumerate() {
        if let Location::Board(square) = piece.location {
            if pieces[i + 1..].iter().any(|other| other.location == piece.location) {
                return Err(inconsistent(t, format!("two pieces on {square}")));
            }
        }
    }

    Ok(Position { ply: t, pieces })
}

fn decode_move<'a>(
    vars: &StateVars<'a>,
    setup: &Setup,
    t: usize,
    read: &impl Fn(BoolValue<'a>) -> bool,
    before: &Position,
) -> Result<Move> {
    let ply = t + 1;
    let mv = vars.moves(t);
    let slot = one_hot(ply, "actor", &mv.actor, read)?.ok_or_else(|| inconsistent(ply, "no piece moved"))?;
    let to = one_hot(ply, "destination", &mv.to, read)?
        .and_then(Square::from_index)
        .ok_or_else(|| inconsistent(ply, "no destination"))?;
    let from = one_hot(ply, "origin", &mv.from, read)?.and_then(Square::from_index);
    let is_drop = read(mv.is_drop);

    let origin = match (is_drop, from) {
        (true, None) => Origin::Hand,
        (false, Some(square)) => Origin::Board(square),
        _ => return Err(inconsistent(ply, "drop flag disagrees with the origin")),
    };

    let seed = &setup.pieces()[slot];
    let captured = before.at(to).filter(|p| p.id != seed.id).map(|p| p.id);
    let promoted = before.piece(seed.id).is_some_and(|p| p.promoted);

    Ok(Move {
        ply,
        player: setup.mover_at(t),
        piece: seed.id,
        kind: seed.kind,
        promoted,
        origin,
        to,
        captured,
        promotes: false,
    })
}

/// Checks that `after` is `before` with `mv` applied; returns whether the
/// move promoted its piece
fn replay(setup: &Setup, mv: &Move, before: &Position, after: &Position) -> Result<bool> {
    let ply = mv.ply;
    let fail = |detail: String| Err(inconsistent(ply, detail));
    let mut promotes = false;

    for (old, new) in before.pieces().iter().zip(after.pieces()) {
        if old.id == mv.piece {
            if old.owner != mv.player {
                return fail(format!("{} moved {}'s piece {}", mv.player, old.owner, old.id));
            }
            match mv.origin {
                Origin::Hand => {
                    if old.location != Location::Hand || !old.kind.droppable() {
                        return fail(format!("piece {} cannot be dropped", old.id));
                    }
                }
                Origin::Board(from) => {
                    if old.location != Location::Board(from) {
                        return fail(format!("piece {} did not start on {from}", old.id));
                    }
                    if !old.kind.destinations(mv.player, old.promoted, from).contains(&mv.to) {
                        return fail(format!("piece {} cannot step from {from} to {}", old.id, mv.to));
                    }
                }
            }
            if new.location != Location::Board(mv.to) || new.owner != mv.player {
                return fail(format!("piece {} did not land on {}", old.id, mv.to));
            }
            let far = mv.player.far_row();
            let promotes_now = old.kind == PieceKind::Chick
                && !mv.is_drop()
                && (old.promoted
                    || mv.to.row() == far
                    || matches!(mv.origin, Origin::Board(from) if from.row() == far));
            if new.promoted != promotes_now {
                return fail(format!("promotion of piece {} is wrong", old.id));
            }
            promotes = new.promoted && !old.promoted;
        } else if Some(old.id) == mv.captured {
            if old.owner == mv.player {
                return fail(format!("{} captured its own piece {}", mv.player, old.id));
            }
            if new.location != Location::Hand || new.owner != mv.player || new.promoted {
                return fail(format!("captured piece {} did not go to {}'s hand", old.id, mv.player));
            }
        } else if old != new {
            return fail(format!("piece {} changed without moving", old.id));
        }
    }

    if mv.is_drop() && mv.captured.is_some() {
        return fail(format!("drop onto occupied square {}", mv.to));
    }
    if setup.mover_at(ply - 1) != mv.player {
        return fail(format!("{} moved out of turn", mv.player));
    }
    Ok(promotes)
}

/// How a checkmate was won
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VictoryKind {
    /// The enemy Lion was captured
    LionCapture,
    /// The Lion reached the far row and survived
    Try,
}

/// A solved problem
#[derive(Debug, Clone, PartialEq)]
pub enum Solution {
    /// A winning line of exactly `mate_in` plies
    Checkmate {
        /// The line
        line: Line,
        /// Winner
        winner: Player,
        /// Plies until victory
        mate_in: usize,
        /// Lion capture or try
        victory: VictoryKind,
    },
    /// A line that brings `piece` to `reached`, cut at the first arrival
    Reachability {
        /// The line, up to and including the arrival
        line: Line,
        /// Piece
        piece: PieceId,
        /// Target square
        reached: Square,
        /// First position with the piece on the target
        reached_at: usize,
    },
    /// A line satisfying a goal
    Tsume {
        /// The line
        line: Line,
        /// The goal it satisfies
        goal: Goal,
    },
}

impl Solution {
    /// The line of play
    pub fn line(&self) -> &Line {
        match self {
            Solution::Checkmate { line, .. } | Solution::Reachability { line, .. } | Solution::Tsume { line, .. } => {
                line
            }
        }
    }

    /// Consumes the solution, keeping the line
    pub fn into_line(self) -> Line {
        match self {
            Solution::Checkmate { line, .. } | Solution::Reachability { line, .. } | Solution::Tsume { line, .. } => {
                line
            }
        }
    }

    /// Moves of the line
    pub fn moves(&self) -> &[Move] {
        self.line().moves()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: usize, col: usize) -> Square {
        Square::new(row, col).unwrap()
    }

    #[test]
    fn test_move_notation() {
        let mut mv = Move {
            ply: 1,
            player: Player::Sente,
            piece: PieceId::new(3).unwrap(),
            kind: PieceKind::Chick,
            promoted: false,
            origin: Origin::Board(sq(1, 1)),
            to: sq(2, 1),
            captured: PieceId::new(7).ok(),
            promotes: false,
        };
        assert_eq!(mv.to_string(), "1. Sente Cb2xb3");

        mv.origin = Origin::Hand;
        mv.captured = None;
        mv.to = sq(3, 0);
        assert_eq!(mv.to_string(), "1. Sente C*a4");

        mv.origin = Origin::Board(sq(2, 0));
        mv.promotes = true;
        assert_eq!(mv.to_string(), "1. Sente Ca3-a4+");

        mv.origin = Origin::Board(sq(3, 0));
        mv.to = sq(2, 0);
        mv.promoted = true;
        mv.promotes = false;
        assert_eq!(mv.to_string(), "1. Sente Ha4-a3");
    }

    #[test]
    fn test_replay_rejects_teleports() {
        let setup = Setup::default();
        let start = Position {
            ply: 0,
            pieces: setup
                .pieces()
                .iter()
                .map(|s| PieceState {
                    id: s.id,
                    kind: s.kind,
                    owner: s.owner,
                    location: s.location,
                    promoted: false,
                })
                .collect(),
        };
        let mut after = start.clone();
        after.ply = 1;
        after.pieces[1].location = Location::Board(sq(2, 1));

        let mv = Move {
            ply: 1,
            player: Player::Sente,
            piece: PieceId::new(1).unwrap(),
            kind: PieceKind::Lion,
            promoted: false,
            origin: Origin::Board(sq(0, 1)),
            to: sq(2, 1),
            captured: None,
            promotes: false,
        };
        let err = replay(&setup, &mv, &start, &after).unwrap_err();
        assert!(matches!(err, DobutsuError::EncodingInconsistency { ply: 1, .. }));
    }
}
