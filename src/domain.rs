//! Players, pieces, squares and setups
//!
//! Everything here is a plain value type. The only behaviour is geometry
//! (movement vectors and board offsets) and the validation of a setup.

use crate::error::{DobutsuError, Result};
use std::fmt;

/// Number of ranks
pub const ROWS: usize = 4;
/// Number of files
pub const COLS: usize = 3;
/// Number of squares
pub const NUM_SQUARES: usize = ROWS * COLS;
/// Largest number of pieces in a game
pub const MAX_PIECES: usize = 8;

/// One of the two sides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Player {
    /// First player by default; advances toward row 3
    Sente,
    /// Second player by default; advances toward row 0
    Gote,
}

impl Player {
    /// Both players, Sente first
    pub const ALL: [Player; 2] = [Player::Sente, Player::Gote];

    /// The other side
    pub fn opponent(self) -> Player {
        match self {
            Player::Sente => Player::Gote,
            Player::Gote => Player::Sente,
        }
    }

    /// 0 for Sente, 1 for Gote
    pub fn index(self) -> usize {
        match self {
            Player::Sente => 0,
            Player::Gote => 1,
        }
    }

    /// The opponent's back rank
    pub fn far_row(self) -> usize {
        match self {
            Player::Sente => ROWS - 1,
            Player::Gote => 0,
        }
    }

    /// Row delta of one step forward
    pub fn forward(self) -> i32 {
        match self {
            Player::Sente => 1,
            Player::Gote => -1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::Sente => write!(f, "Sente"),
            Player::Gote => write!(f, "Gote"),
        }
    }
}

/// Static piece kind; a promoted Chick (Hen) is a Chick with a flag set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PieceKind {
    /// Moves one step in any direction
    Lion,
    /// Moves one step diagonally
    Elephant,
    /// Moves one step orthogonally
    Giraffe,
    /// Moves one step forward, or like a Hen once promoted
    Chick,
}

const KING_STEPS: &[(i32, i32)] = &[(1, -1), (1, 0), (1, 1), (0, -1), (0, 1), (-1, -1), (-1, 0), (-1, 1)];
const DIAGONAL_STEPS: &[(i32, i32)] = &[(1, -1), (1, 1), (-1, -1), (-1, 1)];
const ORTHOGONAL_STEPS: &[(i32, i32)] = &[(1, 0), (0, -1), (0, 1), (-1, 0)];
const CHICK_STEPS: &[(i32, i32)] = &[(1, 0)];
const HEN_STEPS: &[(i32, i32)] = &[(1, -1), (1, 0), (1, 1), (0, -1), (0, 1), (-1, 0)];

impl PieceKind {
    /// All kinds
    pub const ALL: [PieceKind; 4] = [PieceKind::Lion, PieceKind::Elephant, PieceKind::Giraffe, PieceKind::Chick];

    /// Movement vectors as (forward, sideways) offsets
    ///
    /// The forward component is flipped for Gote by the caller; see
    /// [`PieceKind::destinations`].
    pub fn steps(self, promoted: bool) -> &'static [(i32, i32)] {
        match (self, promoted) {
            (PieceKind::Lion, _) => KING_STEPS,
            (PieceKind::Elephant, _) => DIAGONAL_STEPS,
            (PieceKind::Giraffe, _) => ORTHOGONAL_STEPS,
            (PieceKind::Chick, false) => CHICK_STEPS,
            (PieceKind::Chick, true) => HEN_STEPS,
        }
    }

    /// Squares reachable in one step from `from` when owned by `owner`
    pub fn destinations(self, owner: Player, promoted: bool, from: Square) -> Vec<Square> {
        self.steps(promoted)
            .iter()
            .filter_map(|&(forward, side)| from.offset(forward * owner.forward(), side))
            .collect()
    }

    /// Whether the piece may be put back on the board from hand
    pub fn droppable(self) -> bool {
        self != PieceKind::Lion
    }

    /// Single-letter symbol
    pub fn symbol(self, promoted: bool) -> char {
        match (self, promoted) {
            (PieceKind::Lion, _) => 'L',
            (PieceKind::Elephant, _) => 'E',
            (PieceKind::Giraffe, _) => 'G',
            (PieceKind::Chick, false) => 'C',
            (PieceKind::Chick, true) => 'H',
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Lion => "Lion",
            PieceKind::Elephant => "Elephant",
            PieceKind::Giraffe => "Giraffe",
            PieceKind::Chick => "Chick",
        };
        f.write_str(name)
    }
}

/// A board square; row 0 is Sente's back rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    /// Creates a square, rejecting coordinates off the board
    pub fn new(row: usize, col: usize) -> Result<Self> {
        if row >= ROWS || col >= COLS {
            return Err(DobutsuError::SquareOffBoard { row: row as i32, col: col as i32 });
        }
        Ok(Self { row: row as u8, col: col as u8 })
    }

    /// Square with row-major index `index`
    pub fn from_index(index: usize) -> Option<Self> {
        (index < NUM_SQUARES).then(|| Self { row: (index / COLS) as u8, col: (index % COLS) as u8 })
    }

    /// All twelve squares in index order
    pub fn all() -> impl Iterator<Item = Square> {
        (0..NUM_SQUARES).filter_map(Square::from_index)
    }

    /// Row-major index (`row * 3 + col`)
    pub fn index(self) -> usize {
        self.row as usize * COLS + self.col as usize
    }

    /// Row (rank)
    pub fn row(self) -> usize {
        self.row as usize
    }

    /// Column (file)
    pub fn col(self) -> usize {
        self.col as usize
    }

    /// Square at a signed offset, if still on the board
    pub fn offset(self, rows: i32, cols: i32) -> Option<Square> {
        let row = self.row as i32 + rows;
        let col = self.col as i32 + cols;
        if (0..ROWS as i32).contains(&row) && (0..COLS as i32).contains(&col) {
            Some(Self { row: row as u8, col: col as u8 })
        } else {
            None
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", (b'a' + self.col) as char, self.row + 1)
    }
}

/// Stable piece identity, 0..=7
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PieceId(u8);

impl PieceId {
    /// Creates an id, rejecting values above 7
    pub fn new(id: u8) -> Result<Self> {
        if (id as usize) < MAX_PIECES {
            Ok(Self(id))
        } else {
            Err(DobutsuError::PieceIdOutOfRange(id))
        }
    }

    /// The id as an index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PieceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Where a piece is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// On the board
    Board(Square),
    /// In its owner's hand
    Hand,
}

impl Location {
    /// The square, if on the board
    pub fn square(self) -> Option<Square> {
        match self {
            Location::Board(square) => Some(square),
            Location::Hand => None,
        }
    }
}

/// Initial state of one piece
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceSeed {
    /// Identity
    pub id: PieceId,
    /// Static kind
    pub kind: PieceKind,
    /// Owner at setup (the holder, for a piece in hand)
    pub owner: Player,
    /// Starting location
    pub location: Location,
    /// Starts as a Hen
    pub promoted: bool,
}

impl PieceSeed {
    /// A piece on the board
    pub fn on_board(id: PieceId, kind: PieceKind, owner: Player, square: Square) -> Self {
        Self { id, kind, owner, location: Location::Board(square), promoted: false }
    }

    /// A piece in `owner`'s hand
    pub fn in_hand(id: PieceId, kind: PieceKind, owner: Player) -> Self {
        Self { id, kind, owner, location: Location::Hand, promoted: false }
    }

    /// The same seed, promoted
    pub fn promoted(mut self) -> Self {
        self.promoted = true;
        self
    }
}

/// A validated starting position
///
/// Seeds are kept sorted by id; a seed's index in that order is its slot in
/// the symbolic state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setup {
    seeds: Vec<PieceSeed>,
    first_mover: Player,
}

impl Setup {
    /// Validates `seeds` and builds a setup where Sente moves first
    pub fn new(seeds: Vec<PieceSeed>) -> Result<Self> {
        let mut seeds = seeds;
        if seeds.is_empty() || seeds.len() > MAX_PIECES {
            return Err(DobutsuError::InvalidSetup(format!(
                "expected 1..={} pieces, got {}",
                MAX_PIECES,
                seeds.len()
            )));
        }
        seeds.sort_by_key(|seed| seed.id);

        let mut occupied = [false; NUM_SQUARES];
        let mut lions = [0usize; 2];
        for (i, seed) in seeds.iter().enumerate() {
            if i > 0 && seeds[i - 1].id == seed.id {
                return Err(DobutsuError::DuplicatePiece(seed.id));
            }
            if let Location::Board(square) = seed.location {
                if occupied[square.index()] {
                    return Err(DobutsuError::SquareOccupied(square));
                }
                occupied[square.index()] = true;
            }
            if seed.kind == PieceKind::Lion {
                lions[seed.owner.index()] += 1;
                if seed.location == Location::Hand {
                    return Err(DobutsuError::InvalidSetup(format!("lion {} cannot start in hand", seed.id)));
                }
            }
            if seed.promoted && (seed.kind != PieceKind::Chick || seed.location == Location::Hand) {
                return Err(DobutsuError::InvalidSetup(format!(
                    "piece {} cannot start promoted: only a chick on the board can",
                    seed.id
                )));
            }
        }
        if let Some(player) = Player::ALL.into_iter().find(|p| lions[p.index()] > 1) {
            return Err(DobutsuError::InvalidSetup(format!("{player} has more than one lion")));
        }

        Ok(Self { seeds, first_mover: Player::Sente })
    }

    /// The same setup with another side to move first
    pub fn with_first_mover(mut self, player: Player) -> Self {
        self.first_mover = player;
        self
    }

    /// Side to move at ply 0
    pub fn first_mover(&self) -> Player {
        self.first_mover
    }

    /// Side to move at ply `t`
    pub fn mover_at(&self, t: usize) -> Player {
        if t % 2 == 0 {
            self.first_mover
        } else {
            self.first_mover.opponent()
        }
    }

    /// Seeds in slot order
    pub fn pieces(&self) -> &[PieceSeed] {
        &self.seeds
    }

    /// Number of pieces
    pub fn len(&self) -> usize {
        self.seeds.len()
    }

    /// Always false; a setup holds at least one piece
    pub fn is_empty(&self) -> bool {
        self.seeds.is_empty()
    }

    /// Slot of a piece id
    pub fn slot_of(&self, id: PieceId) -> Option<usize> {
        self.seeds.binary_search_by_key(&id, |seed| seed.id).ok()
    }

    /// Seed of a piece id
    pub fn seed(&self, id: PieceId) -> Option<&PieceSeed> {
        self.slot_of(id).map(|slot| &self.seeds[slot])
    }

    /// Slot of a piece id, or `UnknownPiece`
    pub fn require_slot(&self, id: PieceId) -> Result<usize> {
        self.slot_of(id).ok_or(DobutsuError::UnknownPiece(id))
    }

    /// Slot of `player`'s Lion
    pub fn lion_of(&self, player: Player) -> Option<usize> {
        self.seeds
            .iter()
            .position(|seed| seed.kind == PieceKind::Lion && seed.owner == player)
    }

    /// Seed on `square`
    pub fn piece_at(&self, square: Square) -> Option<&PieceSeed> {
        self.seeds.iter().find(|seed| seed.location == Location::Board(square))
    }

    /// Side that has already won in this position, by a Lion on its far row
    /// that is to move or cannot be taken
    ///
    /// Such a setup admits no ply, so the solver rejects it.
    pub fn decided(&self) -> Option<Player> {
        Player::ALL.into_iter().find(|&player| {
            let Some(Location::Board(square)) = self.lion_of(player).map(|slot| self.seeds[slot].location) else {
                return false;
            };
            square.row() == player.far_row()
                && (self.first_mover == player || !self.attacks(player.opponent(), square))
        })
    }

    /// Some board piece of `player` can step onto `square`
    fn attacks(&self, player: Player, square: Square) -> bool {
        self.seeds.iter().filter(|seed| seed.owner == player).any(|seed| match seed.location {
            Location::Board(from) => seed.kind.destinations(player, seed.promoted, from).contains(&square),
            Location::Hand => false,
        })
    }
}

impl Default for Setup {
    /// The standard starting position
    fn default() -> Self {
        use PieceKind::*;
        use Player::*;
        let layout = [
            (Elephant, Sente, 0, 0),
            (Lion, Sente, 0, 1),
            (Giraffe, Sente, 0, 2),
            (Chick, Sente, 1, 1),
            (Giraffe, Gote, 3, 0),
            (Lion, Gote, 3, 1),
            (Elephant, Gote, 3, 2),
            (Chick, Gote, 2, 1),
        ];
        let seeds = layout
            .iter()
            .enumerate()
            .map(|(id, &(kind, owner, row, col))| PieceSeed {
                id: PieceId(id as u8),
                kind,
                owner,
                location: Location::Board(Square { row, col }),
                promoted: false,
            })
            .collect();
        Self { seeds, first_mover: Sente }
    }
}
