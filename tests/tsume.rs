//! Composed goals, rule toggles and input errors

mod common;

use common::*;
use dobutsu_rs::rules::Rules;
use dobutsu_rs::solver::NotFound;
use dobutsu_rs::{DobutsuError, Goal, Options, PieceKind, PieceSeed, Player, Problem, Setup, Solver};

/// Gote Lion cornered on a4; a Sente chick dropped on a3 would mate it
fn drop_mate_setup() -> Setup {
    Setup::new(vec![
        on_board(0, PieceKind::Lion, Player::Sente, 1, 0),
        on_board(1, PieceKind::Elephant, Player::Sente, 2, 2),
        PieceSeed::in_hand(id(2), PieceKind::Chick, Player::Sente),
        on_board(3, PieceKind::Lion, Player::Gote, 3, 0),
    ])
    .expect("valid setup")
}

fn solve(problem: &Problem) -> dobutsu_rs::Outcome {
    Solver::new(Options::default()).solve(problem).expect("solve")
}

#[test]
fn test_capture_then_promote() {
    init_tracing();
    let goal = Goal::captured(id(7)).sometime().and(Goal::promoted(id(3)));
    assert!(!solve(&Problem::tsume(Setup::default(), goal.clone(), 2)).is_found());

    let outcome = solve(&Problem::tsume(Setup::default(), goal, 3));
    let line = outcome.solution().expect("line").line();
    assert!(line.final_position().piece(id(3)).expect("chick").promoted);
    assert!(line.positions().iter().any(|p| p.piece(id(7)).is_some_and(|c| c.owner == Player::Sente)));
    assert_squares_unshared(line);
    assert_captures_demote(line);
}

#[test]
fn test_move_facts_read_the_ply_before() {
    let moved_first = Goal::moves(id(3)).at(1).and(Goal::captures(id(7)).at(1));
    let outcome = solve(&Problem::tsume(Setup::default(), moved_first, 1));
    assert_eq!(outcome.solution().expect("line").moves()[0].piece, id(3));

    let nothing_before_start = Goal::moves(id(1)).at(0);
    let outcome = solve(&Problem::tsume(Setup::default(), nothing_before_start, 1));
    assert_eq!(outcome.not_found(), Some(NotFound::Unsatisfiable { horizon: 1 }));
}

#[test]
fn test_gote_answers_in_kind() {
    // both chicks are taken within two plies
    let goal = Goal::captured(id(7)).and(Goal::captured(id(3)));
    let outcome = solve(&Problem::tsume(Setup::default(), goal, 2));
    let line = outcome.solution().expect("line").line();
    assert_eq!(line.moves()[1].player, Player::Gote);
    assert_eq!(line.moves()[1].captured, Some(id(3)));
    assert_eq!(line.final_position().hand(Player::Gote).count(), 1);
}

#[test]
fn test_chick_drop_mate_is_forbidden() {
    let goal = Goal::drops(id(2)).and(Goal::lands_on(sq(2, 0)));
    let outcome = solve(&Problem::tsume(drop_mate_setup(), goal.clone(), 1));
    assert_eq!(outcome.not_found(), Some(NotFound::Unsatisfiable { horizon: 1 }));

    let lenient = Solver::new(Options { rules: Rules { chick_drop_mate: false }, ..Options::default() });
    let outcome = lenient.solve(&Problem::tsume(drop_mate_setup(), goal, 1)).expect("solve");
    let mv = outcome.solution().expect("the drop").moves()[0];
    assert!(mv.is_drop());
    assert_eq!(mv.to_string(), "1. Sente C*a3");
}

#[test]
fn test_other_chick_drops_stay_legal() {
    let goal = Goal::drops(id(2)).and(Goal::lands_on(sq(2, 1)));
    assert!(solve(&Problem::tsume(drop_mate_setup(), goal, 1)).is_found());
}

#[test]
fn test_play_stops_once_a_lion_falls() {
    let taken = Goal::captured(id(1)).at(1);
    assert!(solve(&Problem::tsume(two_lions(), taken.clone(), 1)).is_found());
    // a second ply after the capture is not a legal game
    let outcome = solve(&Problem::tsume(two_lions(), taken, 2));
    assert_eq!(outcome.not_found(), Some(NotFound::Unsatisfiable { horizon: 2 }));
}

#[test]
fn test_malformed_inputs_are_errors() {
    let solver = Solver::new(Options::default());

    let zero = Problem::reachability(Setup::default(), id(3), sq(2, 1), 0);
    assert_eq!(solver.solve(&zero).unwrap_err(), DobutsuError::InvalidHorizon(0));

    let stranger = Problem::reachability(two_lions(), id(6), sq(2, 1), 1);
    assert_eq!(solver.solve(&stranger).unwrap_err(), DobutsuError::UnknownPiece(id(6)));

    let late = Problem::tsume(Setup::default(), Goal::True.at(3), 2);
    assert!(matches!(solver.solve(&late), Err(DobutsuError::InvalidGoal(_))));

    // Sente's Lion already stands safe on its far row
    let won = Setup::new(vec![
        on_board(0, PieceKind::Lion, Player::Sente, 3, 0),
        on_board(1, PieceKind::Lion, Player::Gote, 1, 2),
    ])
    .expect("valid setup");
    let unrelated = Problem::reachability(won, id(1), sq(1, 1), 1);
    assert!(matches!(solver.solve(&unrelated), Err(DobutsuError::InvalidSetup(_))));

    let crowded = Setup::new(vec![
        on_board(0, PieceKind::Lion, Player::Sente, 0, 1),
        on_board(1, PieceKind::Chick, Player::Gote, 0, 1),
    ]);
    assert_eq!(crowded, Err(DobutsuError::SquareOccupied(sq(0, 1))));
}
