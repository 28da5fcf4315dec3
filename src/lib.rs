//! # dobutsu-rs
//!
//! A bounded SAT model of Dōbutsu Shōgi.
//!
//! The rules of the game (a 4×3 board, four piece kinds per side, captures,
//! drops and promotion) are encoded as a boolean circuit over per-ply state
//! variables. Adding a goal to that circuit turns it into one of three
//! questions: can a side win in exactly N plies, can a piece reach a square
//! within N plies, or does a line of N plies satisfy an arbitrary goal. A SAT
//! solver answers the question and a satisfying assignment is decoded back
//! into a move list.
//!
//! ## Example
//!
//! ```rust,no_run
//! use dobutsu_rs::domain::{Player, Setup};
//! use dobutsu_rs::solver::{Options, Solver};
//! use dobutsu_rs::problem::Problem;
//!
//! let problem = Problem::checkmate(Setup::default(), Player::Sente, 5);
//! let solver = Solver::new(Options::default());
//! let deepening = solver.solve_shortest(&problem, 5)?;
//!
//! if let Some(solution) = deepening.outcome.solution() {
//!     for mv in solution.line().moves() {
//!         println!("{mv}");
//!     }
//! }
//! # Ok::<(), dobutsu_rs::DobutsuError>(())
//! ```

#![warn(missing_docs)]
#![warn(rust_2024_compatibility)]

/// Boolean circuit representation
pub mod bool;

/// Boolean circuit to CNF translation
pub mod cnf;

/// SAT oracle seam and backends
pub mod engine;

/// Players, pieces, squares and setups
pub mod domain;

/// Per-ply symbolic variables
pub mod state;

/// Game rules as constraints
pub mod rules;

/// Goal predicates for composed puzzles
pub mod goal;

/// Problem variants and their goal circuits
pub mod problem;

/// Decoded lines and typed solutions
pub mod solution;

/// Search driver
pub mod solver;

/// Error types
pub mod error {
    //! Error types for dobutsu-rs

    use crate::domain::{PieceId, Square};
    use thiserror::Error;

    /// Errors raised while building or decoding a model
    ///
    /// An unsatisfiable or undecided query is not an error; it is reported as
    /// `solver::NotFound`.
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum DobutsuError {
        /// Horizon below one ply
        #[error("horizon must be at least 1 ply, got {0}")]
        InvalidHorizon(usize),

        /// Two seeds share an id
        #[error("duplicate piece {0}")]
        DuplicatePiece(PieceId),

        /// Piece id outside 0..=7
        #[error("piece id {0} out of range (0..=7)")]
        PieceIdOutOfRange(u8),

        /// Coordinates outside the 4×3 board
        #[error("square ({row}, {col}) is off the board")]
        SquareOffBoard {
            /// Row
            row: i32,
            /// Column
            col: i32,
        },

        /// Two seeds on one square
        #[error("square {0} is occupied twice")]
        SquareOccupied(Square),

        /// Any other setup rule violated
        #[error("invalid setup: {0}")]
        InvalidSetup(String),

        /// A problem or goal names a piece that is not in the setup
        #[error("unknown piece {0}")]
        UnknownPiece(PieceId),

        /// Malformed goal predicate
        #[error("invalid goal: {0}")]
        InvalidGoal(String),

        /// A model disagreed with the rules while being decoded
        #[error("inconsistent model at ply {ply}: {detail}")]
        EncodingInconsistency {
            /// Ply of the offending move
            ply: usize,
            /// What disagreed
            detail: String,
        },
    }

    /// Result type for dobutsu-rs operations
    pub type Result<T> = std::result::Result<T, DobutsuError>;
}

pub use domain::{Location, PieceId, PieceKind, PieceSeed, Player, Setup, Square};
pub use error::{DobutsuError, Result};
pub use goal::Goal;
pub use problem::Problem;
pub use solution::{Line, Move, Solution};
pub use solver::{can_reach, find_checkmate, find_shortest_mate, find_shortest_path, Deepening, NotFound, Options, Outcome, Solver};
