//! Move legality and position transitions

use super::RuleEncoder;
use crate::bool::BoolValue;
use crate::domain::{PieceKind, Player, Square, COLS};

impl<'a, 'v> RuleEncoder<'a, 'v> {
    /// Everything ply `t` must satisfy: the right side moves a piece it owns,
    /// along a legal vector or as a drop, and position t+1 is position t with
    /// that move applied.
    pub fn ply(&self, t: usize) -> BoolValue<'a> {
        let f = self.factory;
        let mover = self.setup.mover_at(t);
        let mv = self.vars.moves(t);
        let before = self.vars.position(t);
        let mut all = Vec::new();

        all.push(f.implies(mv.is_drop, f.none_of(&mv.from)));

        for square in Square::all() {
            let to = mv.to[square.index()];
            all.push(f.implies(to, f.not(self.occupied_by(t, mover, square))));
            all.push(f.implies(f.and(mv.is_drop, to), f.not(self.occupied(t, square))));
        }

        for (slot, vars) in before.iter().enumerate() {
            let actor = mv.actor[slot];
            let board_move = f.and(actor, f.not(mv.is_drop));

            all.push(f.implies(actor, vars.owned_by(f, mover)));
            all.push(f.implies(actor, f.iff(mv.is_drop, vars.captured)));
            all.push(f.implies(board_move, f.all_equal(&mv.from, &vars.square)));
            all.push(f.implies(board_move, self.step_legal(t, slot, mover)));
            if !self.kind(slot).droppable() {
                all.push(f.implies(actor, f.not(mv.is_drop)));
            }
        }

        all.push(self.transition(t));
        f.and_multi(all)
    }

    /// The destination of ply `t` is one step away from wherever `slot` stands
    fn step_legal(&self, t: usize, slot: usize, mover: Player) -> BoolValue<'a> {
        let f = self.factory;
        let vars = self.vars.piece(t, slot);
        let to = &self.vars.moves(t).to;
        let kind = self.kind(slot);

        let reach = |promoted: bool, from: Square| {
            let targets = kind.destinations(mover, promoted, from).into_iter().map(|sq| to[sq.index()]).collect();
            f.or_multi(targets)
        };

        let mut all = Vec::new();
        for from in Square::all() {
            let mut legal = reach(false, from);
            if kind == PieceKind::Chick {
                legal = f.or(legal, f.and(vars.promoted, reach(true, from)));
            }
            all.push(f.implies(vars.square[from.index()], legal));
        }
        f.and_multi(all)
    }

    /// Position t+1 from position t and move t
    ///
    /// The actor lands on `to`; a piece already on `to` is captured: it leaves
    /// the board, changes sides and loses its promotion. Everything else is
    /// carried over. Hand membership follows from the frame of position t+1.
    fn transition(&self, t: usize) -> BoolValue<'a> {
        let f = self.factory;
        let mover = self.setup.mover_at(t);
        let mv = self.vars.moves(t);
        let promotes_here = |squares: &[BoolValue<'a>]| {
            let far = mover.far_row();
            f.or_multi((0..COLS).map(|col| squares[far * COLS + col]).collect())
        };
        let reaches_far_row = f.or(promotes_here(&mv.from[..]), promotes_here(&mv.to[..]));

        let mut all = Vec::new();
        for slot in 0..self.vars.num_pieces() {
            let before = self.vars.piece(t, slot);
            let after = self.vars.piece(t + 1, slot);
            let actor = mv.actor[slot];
            let victim = f.or_multi(
                Square::all()
                    .map(|sq| f.and(mv.to[sq.index()], before.square[sq.index()]))
                    .collect(),
            );
            let stays = f.and(f.not(victim), f.not(actor));

            for square in 0..before.square.len() {
                let lands = f.and(actor, mv.to[square]);
                let kept = f.and(stays, before.square[square]);
                all.push(f.iff(after.square[square], f.or(lands, kept)));
            }

            let captor = f.constant(mover == Player::Gote);
            all.push(f.iff(after.owner, f.ite(victim, captor, before.owner)));

            if self.kind(slot) == PieceKind::Chick {
                let moved = f.and(f.not(mv.is_drop), f.or(before.promoted, reaches_far_row));
                let carried = f.and(f.not(victim), before.promoted);
                all.push(f.iff(after.promoted, f.ite(actor, moved, carried)));
            }
        }
        f.and_multi(all)
    }

    /// Ply `t` drops a Chick
    pub fn chick_drop(&self, t: usize) -> BoolValue<'a> {
        let f = self.factory;
        let mv = self.vars.moves(t);
        let chicks = (0..self.vars.num_pieces())
            .filter(|&slot| self.kind(slot) == PieceKind::Chick)
            .map(|slot| mv.actor[slot])
            .collect();
        f.and(mv.is_drop, f.or_multi(chicks))
    }
}

#[cfg(test)]
mod tests {
    use crate::bool::{BooleanFactory, GateArena, Options};
    use crate::cnf::CNFTranslator;
    use crate::domain::{PieceId, PieceKind, PieceSeed, Player, Setup, Square};
    use crate::engine::{RustSatAdapter, SATSolver, Verdict};
    use crate::rules::{RuleEncoder, Rules};
    use crate::state::StateVars;
    use rustsat_batsat::BasicSolver;

    fn sq(row: usize, col: usize) -> Square {
        Square::new(row, col).unwrap()
    }

    /// Runs one ply from `setup` with an extra requirement on it
    fn one_ply_possible<F>(setup: &Setup, extra: F) -> bool
    where
        F: for<'a, 'v> Fn(&RuleEncoder<'a, 'v>) -> crate::bool::BoolValue<'a>,
    {
        let arena = GateArena::new();
        let factory = BooleanFactory::new(&arena, Options::default());
        let (vars, shape) = StateVars::declare(&factory, 1, setup).unwrap();
        let encoder = RuleEncoder::new(&factory, &vars, setup, Rules::default());
        let root = factory.and_multi(vec![shape, encoder.constraints(), extra(&encoder)]);

        let cnf = CNFTranslator::new(factory.num_labels()).translate(root);
        let mut solver = RustSatAdapter::new(BasicSolver::default());
        solver.add_variables(cnf.num_variables);
        for clause in &cnf.clauses {
            solver.add_clause(clause);
        }
        solver.solve() == Verdict::Sat
    }

    fn lions_and(extra: PieceSeed) -> Setup {
        Setup::new(vec![
            PieceSeed::on_board(PieceId::new(1).unwrap(), PieceKind::Lion, Player::Sente, sq(0, 0)),
            PieceSeed::on_board(PieceId::new(5).unwrap(), PieceKind::Lion, Player::Gote, sq(3, 2)),
            extra,
        ])
        .unwrap()
    }

    #[test]
    fn test_chick_only_steps_forward() {
        let chick = PieceSeed::on_board(PieceId::new(7).unwrap(), PieceKind::Chick, Player::Sente, sq(1, 1));
        let setup = lions_and(chick);
        assert!(one_ply_possible(&setup, |e| e.on_square(1, 2, sq(2, 1))));
        assert!(!one_ply_possible(&setup, |e| e.on_square(1, 2, sq(2, 0))));
        assert!(!one_ply_possible(&setup, |e| e.on_square(1, 2, sq(0, 1))));
    }

    #[test]
    fn test_gote_cannot_move_first() {
        let setup = Setup::default();
        assert!(!one_ply_possible(&setup, |e| e.vars().moves(0).actor[7]));
        let gote_first = Setup::default().with_first_mover(Player::Gote);
        assert!(one_ply_possible(&gote_first, |e| e.vars().moves(0).actor[7]));
    }

    #[test]
    fn test_capture_sends_piece_to_hand() {
        let setup = Setup::default();
        // Sente's chick takes Gote's chick on b3
        assert!(one_ply_possible(&setup, |e| {
            let f = e.factory();
            let taken = e.vars().piece(1, 7);
            f.and_multi(vec![
                e.on_square(1, 3, sq(2, 1)),
                taken.captured,
                taken.in_hand[Player::Sente.index()],
            ])
        }));
        // and Gote keeps nothing of it
        assert!(!one_ply_possible(&setup, |e| {
            let f = e.factory();
            f.and(e.on_square(1, 3, sq(2, 1)), e.vars().piece(1, 7).owner)
        }));
    }

    #[test]
    fn test_hen_moves_sideways_but_chick_does_not() {
        let chick = PieceSeed::on_board(PieceId::new(7).unwrap(), PieceKind::Chick, Player::Sente, sq(2, 1));
        assert!(!one_ply_possible(&lions_and(chick), |e| e.on_square(1, 2, sq(2, 0))));
        assert!(one_ply_possible(&lions_and(chick.promoted()), |e| e.on_square(1, 2, sq(2, 0))));
    }

    #[test]
    fn test_chick_promotes_on_far_row() {
        let chick = PieceSeed::on_board(PieceId::new(7).unwrap(), PieceKind::Chick, Player::Sente, sq(2, 1));
        let setup = lions_and(chick);
        assert!(one_ply_possible(&setup, |e| e.on_square(1, 2, sq(3, 1))));
        assert!(!one_ply_possible(&setup, |e| {
            let f = e.factory();
            f.and(e.on_square(1, 2, sq(3, 1)), f.not(e.vars().piece(1, 2).promoted))
        }));
    }

    #[test]
    fn test_gote_chick_promotes_on_row_zero() {
        let chick = PieceSeed::on_board(PieceId::new(7).unwrap(), PieceKind::Chick, Player::Gote, sq(1, 1));
        let setup = lions_and(chick).with_first_mover(Player::Gote);
        assert!(one_ply_possible(&setup, |e| e.on_square(1, 2, sq(0, 1))));
        assert!(!one_ply_possible(&setup, |e| {
            let f = e.factory();
            f.and(e.on_square(1, 2, sq(0, 1)), f.not(e.vars().piece(1, 2).promoted))
        }));
        assert!(!one_ply_possible(&setup, |e| e.on_square(1, 2, sq(2, 1))));
    }

    #[test]
    fn test_captured_hen_is_demoted() {
        let hen = PieceSeed::on_board(PieceId::new(7).unwrap(), PieceKind::Chick, Player::Gote, sq(1, 0)).promoted();
        let setup = lions_and(hen);
        assert!(one_ply_possible(&setup, |e| {
            let f = e.factory();
            let taken = e.vars().piece(1, 2);
            f.and_multi(vec![taken.captured, taken.in_hand[Player::Sente.index()], f.not(taken.promoted)])
        }));
        assert!(!one_ply_possible(&setup, |e| {
            let f = e.factory();
            let taken = e.vars().piece(1, 2);
            f.and(taken.captured, taken.promoted)
        }));
    }

    #[test]
    fn test_drops_land_on_empty_squares_only() {
        let held = PieceSeed::in_hand(PieceId::new(6).unwrap(), PieceKind::Giraffe, Player::Sente);
        let setup = lions_and(held);
        assert!(one_ply_possible(&setup, |e| e.on_square(1, 2, sq(2, 1))));
        assert!(!one_ply_possible(&setup, |e| e.on_square(1, 2, sq(3, 2))));
        assert!(!one_ply_possible(&setup, |e| e.on_square(1, 2, sq(0, 0))));
    }
}
