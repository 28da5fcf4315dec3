//! Attack maps, victory predicates and the rules built on them
//!
//! Every piece moves a single step, so an attack can never be blocked and a
//! drop can never parry one. Escapes from check are therefore exactly the
//! board moves that take the Lion off attacked squares, capture the attacker,
//! or capture the enemy Lion.

use super::{AttackMap, RuleEncoder};
use crate::bool::BoolValue;
use crate::domain::{PieceKind, Player, Square, COLS, NUM_SQUARES};
use std::rc::Rc;

impl<'a, 'v> RuleEncoder<'a, 'v> {
    /// For each slot and square: the slot is a piece of `player` at position
    /// `t` that could step onto the square (ignoring who stands there)
    pub(crate) fn attack_map(&self, t: usize, player: Player) -> AttackMap<'a> {
        if let Some(map) = self.attacks.borrow().get(&(t, player)) {
            return Rc::clone(map);
        }

        let f = self.factory;
        let map: Vec<[BoolValue<'a>; NUM_SQUARES]> = self
            .vars
            .position(t)
            .iter()
            .enumerate()
            .map(|(slot, vars)| {
                let kind = self.kind(slot);
                let mut sources: Vec<Vec<BoolValue<'a>>> = vec![Vec::new(); NUM_SQUARES];
                for from in Square::all() {
                    let here = vars.square[from.index()];
                    for to in kind.destinations(player, false, from) {
                        sources[to.index()].push(here);
                    }
                    if kind == PieceKind::Chick {
                        let as_hen = f.and(here, vars.promoted);
                        for to in kind.destinations(player, true, from) {
                            sources[to.index()].push(as_hen);
                        }
                    }
                }
                let owned = vars.owned_by(f, player);
                let mut row = [BoolValue::FALSE; NUM_SQUARES];
                for (square, from) in sources.into_iter().enumerate() {
                    row[square] = f.and(owned, f.or_multi(from));
                }
                row
            })
            .collect();

        let map = Rc::new(map);
        self.attacks.borrow_mut().insert((t, player), Rc::clone(&map));
        map
    }

    /// Some piece of `player` attacks `square` at position `t`
    pub fn attacked_by(&self, t: usize, player: Player, square: Square) -> BoolValue<'a> {
        let map = self.attack_map(t, player);
        self.factory.or_multi(map.iter().map(|row| row[square.index()]).collect())
    }

    /// `player`'s Lion has been captured by position `t`
    pub fn lion_captured(&self, player: Player, t: usize) -> BoolValue<'a> {
        match self.setup.lion_of(player) {
            Some(lion) => self.vars.piece(t, lion).captured,
            None => BoolValue::FALSE,
        }
    }

    /// `player`'s Lion stands on the far row at position `t` and, if the
    /// opponent is to move there, no opponent piece can take it
    pub fn try_win(&self, player: Player, t: usize) -> BoolValue<'a> {
        let f = self.factory;
        let Some(lion) = self.setup.lion_of(player) else {
            return BoolValue::FALSE;
        };
        let opponent = player.opponent();
        let must_survive = self.setup.mover_at(t) == opponent;
        let far = player.far_row();

        let arrivals = (0..COLS)
            .filter_map(|col| Square::new(far, col).ok())
            .map(|square| {
                let there = self.on_square(t, lion, square);
                if must_survive {
                    f.and(there, f.not(self.attacked_by(t, opponent, square)))
                } else {
                    there
                }
            })
            .collect();
        f.or_multi(arrivals)
    }

    /// `player` has won at position `t`
    pub fn victory(&self, player: Player, t: usize) -> BoolValue<'a> {
        self.factory.or(self.lion_captured(player.opponent(), t), self.try_win(player, t))
    }

    /// `player`'s Lion is attacked at position `t`
    pub fn in_check(&self, player: Player, t: usize) -> BoolValue<'a> {
        let f = self.factory;
        let Some(lion) = self.setup.lion_of(player) else {
            return BoolValue::FALSE;
        };
        let opponent = player.opponent();
        let threatened = Square::all()
            .map(|square| f.and(self.on_square(t, lion, square), self.attacked_by(t, opponent, square)))
            .collect();
        f.or_multi(threatened)
    }

    /// `defender`, to move at position `t`, is in check and every board move
    /// leaves its Lion attacked without taking the enemy Lion
    pub fn checkmated(&self, defender: Player, t: usize) -> BoolValue<'a> {
        let f = self.factory;
        let Some(lion) = self.setup.lion_of(defender) else {
            return BoolValue::FALSE;
        };
        let attacker = defender.opponent();
        let enemy_lion = self.setup.lion_of(attacker);
        let mine = self.attack_map(t, defender);
        let theirs = self.attack_map(t, attacker);
        let position = self.vars.position(t);

        let mut escapes = Vec::new();
        for target in Square::all() {
            let y = target.index();
            let free = f.not(self.occupied_by(t, defender, target));
            let takes_lion = enemy_lion.map_or(BoolValue::FALSE, |slot| position[slot].square[y]);

            let lion_safe = f.or(takes_lion, f.not(self.attacked_by(t, attacker, target)));
            let lion_escape = f.and(mine[lion][y], lion_safe);

            // another piece moves to `target`, capturing whatever stands there
            let still_attacked = f.or_multi(
                Square::all()
                    .map(|square| {
                        let s = square.index();
                        let attackers = theirs
                            .iter()
                            .zip(position)
                            .map(|(row, vars)| f.and(row[s], f.not(vars.square[y])))
                            .collect();
                        f.and(position[lion].square[s], f.or_multi(attackers))
                    })
                    .collect(),
            );
            let helpers = mine
                .iter()
                .enumerate()
                .filter(|&(slot, _)| slot != lion)
                .map(|(_, row)| row[y])
                .collect();
            let helper_escape = f.and(f.or_multi(helpers), f.or(takes_lion, f.not(still_attacked)));

            escapes.push(f.and(free, f.or(lion_escape, helper_escape)));
        }

        f.and(self.in_check(defender, t), f.not(f.or_multi(escapes)))
    }

    /// No ply is played from a position where the game is already decided
    pub fn game_not_over(&self, t: usize) -> BoolValue<'a> {
        let f = self.factory;
        f.and(f.not(self.victory(Player::Sente, t)), f.not(self.victory(Player::Gote, t)))
    }

    /// Ply `t` does not drop a Chick that mates
    pub fn no_chick_drop_mate(&self, t: usize) -> BoolValue<'a> {
        let defender = self.setup.mover_at(t + 1);
        self.factory.implies(self.chick_drop(t), self.factory.not(self.checkmated(defender, t + 1)))
    }
}
