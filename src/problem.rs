//! Problem variants and their goal circuits
//!
//! A [`Problem`] is a pure description. Each variant has a matching solver
//! type (`CheckmateSolver`, `ReachabilitySolver`, `TsumeSolver`) that knows
//! which goal to add to the rules and how to turn a decoded line into a
//! [`Solution`].

use crate::bool::BoolValue;
use crate::domain::{Location, PieceId, PieceKind, Player, Setup, Square};
use crate::engine::SATSolver;
use crate::error::{DobutsuError, Result};
use crate::goal::Goal;
use crate::rules::RuleEncoder;
use crate::solution::{Line, Solution, VictoryKind};
use crate::solver::{Outcome, ProblemSolver, Solver};

/// A question about a setup, bounded to `max_moves` plies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    /// `winner` wins at ply `max_moves` and not before
    Checkmate {
        /// Starting position
        setup: Setup,
        /// Side that should win
        winner: Player,
        /// Exact length of the line
        max_moves: usize,
    },
    /// `piece`, still owned by its side, stands on `target` at some position
    /// up to `max_moves`
    Reachability {
        /// Starting position
        setup: Setup,
        /// Piece to move
        piece: PieceId,
        /// Square to reach
        target: Square,
        /// Longest line considered
        max_moves: usize,
    },
    /// A line of `max_moves` plies satisfies `goal`
    Tsume {
        /// Starting position
        setup: Setup,
        /// Goal predicate
        goal: Goal,
        /// Length of the line
        max_moves: usize,
    },
}

impl Problem {
    /// Checkmate in exactly `max_moves` plies
    pub fn checkmate(setup: Setup, winner: Player, max_moves: usize) -> Self {
        Problem::Checkmate { setup, winner, max_moves }
    }

    /// Reachability within `max_moves` plies
    pub fn reachability(setup: Setup, piece: PieceId, target: Square, max_moves: usize) -> Self {
        Problem::Reachability { setup, piece, target, max_moves }
    }

    /// Composed puzzle over `max_moves` plies
    pub fn tsume(setup: Setup, goal: Goal, max_moves: usize) -> Self {
        Problem::Tsume { setup, goal, max_moves }
    }

    /// The starting position
    pub fn setup(&self) -> &Setup {
        match self {
            Problem::Checkmate { setup, .. } | Problem::Reachability { setup, .. } | Problem::Tsume { setup, .. } => {
                setup
            }
        }
    }

    /// The horizon N
    pub fn max_moves(&self) -> usize {
        match self {
            Problem::Checkmate { max_moves, .. }
            | Problem::Reachability { max_moves, .. }
            | Problem::Tsume { max_moves, .. } => *max_moves,
        }
    }

    /// The same question at another horizon
    pub fn with_horizon(&self, horizon: usize) -> Problem {
        let mut problem = self.clone();
        match &mut problem {
            Problem::Checkmate { max_moves, .. }
            | Problem::Reachability { max_moves, .. }
            | Problem::Tsume { max_moves, .. } => *max_moves = horizon,
        }
        problem
    }
}

/// Encoding side of a per-variant solver
pub(crate) trait Formulation {
    fn setup(&self) -> &Setup;

    fn horizon(&self) -> usize;

    /// Goal circuit added to the rules
    fn goal<'a>(&self, encoder: &RuleEncoder<'a, '_>) -> Result<BoolValue<'a>>;

    /// Condition for ply `t` to be played at all
    fn play_continues<'a>(&self, encoder: &RuleEncoder<'a, '_>, t: usize) -> BoolValue<'a> {
        encoder.game_not_over(t)
    }

    /// Typed solution from the decoded line
    fn solution(&self, line: Line) -> Result<Solution>;
}

/// Checkmate in exactly N plies
#[derive(Debug, Clone, Copy)]
pub struct CheckmateSolver<'p> {
    /// Starting position
    pub setup: &'p Setup,
    /// Side that should win
    pub winner: Player,
    /// Exact length of the line
    pub max_moves: usize,
}

impl Formulation for CheckmateSolver<'_> {
    fn setup(&self) -> &Setup {
        self.setup
    }

    fn horizon(&self) -> usize {
        self.max_moves
    }

    fn goal<'a>(&self, encoder: &RuleEncoder<'a, '_>) -> Result<BoolValue<'a>> {
        let f = encoder.factory();
        let mut all = vec![encoder.victory(self.winner, self.max_moves)];
        for t in 0..self.max_moves {
            all.push(f.not(encoder.victory(self.winner, t)));
        }
        Ok(f.and_multi(all))
    }

    fn solution(&self, line: Line) -> Result<Solution> {
        let lion_taken = line
            .final_position()
            .pieces()
            .iter()
            .any(|p| p.kind == PieceKind::Lion && p.location == Location::Hand && p.owner == self.winner);
        let victory = if lion_taken { VictoryKind::LionCapture } else { VictoryKind::Try };
        Ok(Solution::Checkmate { line, winner: self.winner, mate_in: self.max_moves, victory })
    }
}

impl ProblemSolver for CheckmateSolver<'_> {
    fn solve_with(&self, driver: &Solver, oracle: &mut dyn SATSolver) -> Result<Outcome> {
        driver.run(self, oracle)
    }
}

/// Some position up to N has the piece on the target
#[derive(Debug, Clone, Copy)]
pub struct ReachabilitySolver<'p> {
    /// Starting position
    pub setup: &'p Setup,
    /// Piece to move
    pub piece: PieceId,
    /// Square to reach
    pub target: Square,
    /// Longest line considered
    pub max_moves: usize,
}

impl ReachabilitySolver<'_> {
    /// The piece stands on the target at position `t`, still owned by its
    /// side in the setup
    fn arrival<'a>(&self, encoder: &RuleEncoder<'a, '_>, slot: usize, t: usize) -> BoolValue<'a> {
        let f = encoder.factory();
        let owner = self.setup.pieces()[slot].owner;
        f.and(encoder.on_square(t, slot, self.target), encoder.vars().piece(t, slot).owned_by(f, owner))
    }
}

impl Formulation for ReachabilitySolver<'_> {
    fn setup(&self) -> &Setup {
        self.setup
    }

    fn horizon(&self) -> usize {
        self.max_moves
    }

    fn goal<'a>(&self, encoder: &RuleEncoder<'a, '_>) -> Result<BoolValue<'a>> {
        let slot = self.setup.require_slot(self.piece)?;
        let arrivals = (0..=self.max_moves).map(|t| self.arrival(encoder, slot, t)).collect();
        Ok(encoder.factory().or_multi(arrivals))
    }

    /// Once the piece has arrived the rest of the line only pads it to N
    /// plies, so play may go on past a decided position
    fn play_continues<'a>(&self, encoder: &RuleEncoder<'a, '_>, t: usize) -> BoolValue<'a> {
        let Some(slot) = self.setup.slot_of(self.piece) else {
            return encoder.game_not_over(t);
        };
        let f = encoder.factory();
        let arrived = f.or_multi((0..=t).map(|u| self.arrival(encoder, slot, u)).collect());
        f.or(encoder.game_not_over(t), arrived)
    }

    fn solution(&self, line: Line) -> Result<Solution> {
        let arrived = Location::Board(self.target);
        let owner = self.setup.seed(self.piece).map(|seed| seed.owner);
        let reached_at = line
            .positions()
            .iter()
            .position(|pos| {
                pos.piece(self.piece)
                    .is_some_and(|p| p.location == arrived && Some(p.owner) == owner)
            })
            .ok_or_else(|| DobutsuError::EncodingInconsistency {
                ply: self.max_moves,
                detail: format!("piece {} never reaches {}", self.piece, self.target),
            })?;
        Ok(Solution::Reachability {
            line: line.truncated(reached_at),
            piece: self.piece,
            reached: self.target,
            reached_at,
        })
    }
}

impl ProblemSolver for ReachabilitySolver<'_> {
    fn solve_with(&self, driver: &Solver, oracle: &mut dyn SATSolver) -> Result<Outcome> {
        driver.run(self, oracle)
    }
}

/// A line of N plies satisfying a goal
#[derive(Debug, Clone, Copy)]
pub struct TsumeSolver<'p> {
    /// Starting position
    pub setup: &'p Setup,
    /// Goal predicate
    pub goal: &'p Goal,
    /// Length of the line
    pub max_moves: usize,
}

impl Formulation for TsumeSolver<'_> {
    fn setup(&self) -> &Setup {
        self.setup
    }

    fn horizon(&self) -> usize {
        self.max_moves
    }

    fn goal<'a>(&self, encoder: &RuleEncoder<'a, '_>) -> Result<BoolValue<'a>> {
        self.goal.encode(encoder)
    }

    fn solution(&self, line: Line) -> Result<Solution> {
        Ok(Solution::Tsume { line, goal: self.goal.clone() })
    }
}

impl ProblemSolver for TsumeSolver<'_> {
    fn solve_with(&self, driver: &Solver, oracle: &mut dyn SATSolver) -> Result<Outcome> {
        driver.run(self, oracle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_horizon_keeps_the_question() {
        let chick = PieceId::new(3).unwrap();
        let target = Square::new(2, 1).unwrap();
        let problem = Problem::reachability(Setup::default(), chick, target, 1);
        let longer = problem.with_horizon(4);

        assert_eq!(longer.max_moves(), 4);
        assert_eq!(problem.max_moves(), 1);
        assert!(matches!(longer, Problem::Reachability { piece, .. } if piece == chick));
        assert_eq!(longer.setup(), problem.setup());
    }
}
