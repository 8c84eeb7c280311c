// Copyright 2026 Tobin Edwards
//
//    Licensed under the Apache License, Version 2.0 (the "License");
//    you may not use this file except in compliance with the License.
//    You may obtain a copy of the License at
//
//        http://www.apache.org/licenses/LICENSE-2.0
//
//    Unless required by applicable law or agreed to in writing, software
//    distributed under the License is distributed on an "AS IS" BASIS,
//    WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//    See the License for the specific language governing permissions and
//    limitations under the License.

//! Reversible deltas of the non-board game state. Each move records two
//! streams: `local` changes (check status, attackers) that belong to the
//! position and are replayed on any navigation, and `global` changes
//! (en passant, special rights, move-rule counter) that belong to the
//! game and are only touched by a real make or unmake.

use serde::{Deserialize, Serialize};

use super::coords::Coord;
use super::GameState;

/// The en passant opportunity created by a double pawn push: the square a
/// capturer lands on and the square of the pawn that gets taken.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct EnPassant {
    pub square: Coord,
    pub pawn: Coord,
}

/// One piece currently attacking a royal. `slid` separates sliding
/// attacks, which can be blocked, from jump attacks, which cannot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attacker {
    pub coords: Coord,
    pub slid: bool,
}

/// A single reversible state delta, storing both sides of the edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateChange {
    EnPassant {
        prior: Option<EnPassant>,
        next: Option<EnPassant>,
    },
    SpecialRight {
        coords: Coord,
        prior: bool,
        next: bool,
    },
    MoveRule {
        prior: u32,
        next: u32,
    },
    Check {
        prior: Vec<Coord>,
        next: Vec<Coord>,
    },
    Attackers {
        prior: Vec<Attacker>,
        next: Vec<Attacker>,
    },
}

/// The two state-change streams recorded on a move.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateJournal {
    pub local: Vec<StateChange>,
    pub global: Vec<StateChange>,
}

impl StateJournal {
    pub fn queue_enpassant(&mut self, prior: Option<EnPassant>, next: Option<EnPassant>) {
        self.global.push(StateChange::EnPassant { prior, next });
    }

    pub fn queue_special_right(&mut self, coords: Coord, prior: bool, next: bool) {
        self.global.push(StateChange::SpecialRight { coords, prior, next });
    }

    pub fn queue_move_rule(&mut self, prior: u32, next: u32) {
        self.global.push(StateChange::MoveRule { prior, next });
    }

    pub fn queue_check(&mut self, prior: Vec<Coord>, next: Vec<Coord>) {
        self.local.push(StateChange::Check { prior, next });
    }

    pub fn queue_attackers(&mut self, prior: Vec<Attacker>, next: Vec<Attacker>) {
        self.local.push(StateChange::Attackers { prior, next });
    }
}

/// Apply or revert a move's state journal. Local deltas always run;
/// global deltas are skipped when `global_change` is false, which is how
/// pure simulation keeps its hands off the persistent game fields.
pub fn apply_state_changes(
    state: &mut GameState,
    journal: &StateJournal,
    forward: bool,
    global_change: bool,
) {
    for change in &journal.local {
        apply_one(state, change, forward);
    }
    if global_change {
        for change in &journal.global {
            apply_one(state, change, forward);
        }
    }
}

fn apply_one(state: &mut GameState, change: &StateChange, forward: bool) {
    match change {
        StateChange::EnPassant { prior, next } => {
            state.global.enpassant = if forward { next.clone() } else { prior.clone() };
        }
        StateChange::SpecialRight { coords, prior, next } => {
            let has = if forward { *next } else { *prior };
            if has {
                state.global.special_rights.insert(coords.clone());
            } else {
                state.global.special_rights.remove(coords);
            }
        }
        StateChange::MoveRule { prior, next } => {
            if let Some(counter) = state.global.move_rule_state.as_mut() {
                *counter = if forward { *next } else { *prior };
            }
        }
        StateChange::Check { prior, next } => {
            state.local.in_check = if forward { next.clone() } else { prior.clone() };
        }
        StateChange::Attackers { prior, next } => {
            state.local.attackers = if forward { next.clone() } else { prior.clone() };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::GameState;

    #[test]
    fn test_enpassant_round_trip() {
        let mut state = GameState::default();
        let mut journal = StateJournal::default();
        let created = EnPassant {
            square: Coord::at(5, 3),
            pawn: Coord::at(5, 4),
        };
        journal.queue_enpassant(None, Some(created.clone()));
        apply_state_changes(&mut state, &journal, true, true);
        assert_eq!(state.global.enpassant, Some(created));
        apply_state_changes(&mut state, &journal, false, true);
        assert_eq!(state.global.enpassant, None);
    }

    #[test]
    fn test_special_right_round_trip() {
        let mut state = GameState::default();
        state.global.special_rights.insert(Coord::at(8, 1));
        let mut journal = StateJournal::default();
        journal.queue_special_right(Coord::at(8, 1), true, false);
        apply_state_changes(&mut state, &journal, true, true);
        assert!(!state.global.special_rights.contains(&Coord::at(8, 1)));
        apply_state_changes(&mut state, &journal, false, true);
        assert!(state.global.special_rights.contains(&Coord::at(8, 1)));
    }

    #[test]
    fn test_global_skipped_in_simulation() {
        let mut state = GameState::default();
        state.global.move_rule_state = Some(4);
        let mut journal = StateJournal::default();
        journal.queue_move_rule(4, 5);
        journal.queue_check(Vec::new(), vec![Coord::at(5, 1)]);
        apply_state_changes(&mut state, &journal, true, false);
        assert_eq!(state.global.move_rule_state, Some(4));
        assert_eq!(state.local.in_check, vec![Coord::at(5, 1)]);
    }
}
