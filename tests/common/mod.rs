//! Helpers shared by the integration tests

#![allow(dead_code)]

use dobutsu_rs::solution::Line;
use dobutsu_rs::{Location, PieceId, PieceKind, PieceSeed, Player, Setup, Square};
use tracing_subscriber::EnvFilter;

/// Routes solver logs to the test output; `RUST_LOG=dobutsu_rs=debug` to see them
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn sq(row: usize, col: usize) -> Square {
    Square::new(row, col).expect("square on the board")
}

pub fn id(n: u8) -> PieceId {
    PieceId::new(n).expect("piece id in range")
}

pub fn on_board(n: u8, kind: PieceKind, owner: Player, row: usize, col: usize) -> PieceSeed {
    PieceSeed::on_board(id(n), kind, owner, sq(row, col))
}

/// Sente Lion on b2 facing the Gote Lion on b3, Sente to move
pub fn two_lions() -> Setup {
    Setup::new(vec![
        on_board(0, PieceKind::Lion, Player::Sente, 1, 1),
        on_board(1, PieceKind::Lion, Player::Gote, 2, 1),
    ])
    .expect("valid setup")
}

/// No position of the line has two pieces on one square
pub fn assert_squares_unshared(line: &Line) {
    for position in line.positions() {
        let mut seen = Vec::new();
        for piece in position.pieces() {
            if let Location::Board(square) = piece.location {
                assert!(!seen.contains(&square), "two pieces on {square} at {}", position.ply());
                seen.push(square);
            }
        }
    }
}

/// Each newly captured piece went to the captor's hand, unpromoted
pub fn assert_captures_demote(line: &Line) {
    for (mv, window) in line.moves().iter().zip(line.positions().windows(2)) {
        if let Some(victim) = mv.captured {
            let before = window[0].piece(victim).expect("victim in position");
            let after = window[1].piece(victim).expect("victim in position");
            assert!(before.location != Location::Hand);
            assert_eq!(after.location, Location::Hand);
            assert_eq!(after.owner, mv.player);
            assert!(!after.promoted);
        }
    }
}
