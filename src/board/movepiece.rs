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

//! Move lifecycle: a `MoveDraft` names intent, `generate_move` expands it
//! into a `Move` carrying its full change journal and state deltas,
//! `make_move` commits it and evaluates check for the new side to move,
//! `rewind_move` reverses it exactly. `go_to_move` walks the history for
//! review without touching game-scoped state, and `simulate_move` brackets
//! any probe between a make and an unmake.

use anyhow::{anyhow, bail, ensure, Result};
use num_traits::Signed;
use std::collections::HashSet;

use super::changes::{
    apply_changes, queue_capture, queue_move_piece, was_a_capture, Change,
};
use super::check::detect_check;
use super::coords::Coord;
use super::material::Material;
use super::moveset::SpecialFlags;
use super::notation;
use super::special;
use super::state::{apply_state_changes, StateJournal};
use super::terminal::get_game_conclusion;
use super::validation::is_engines_move_legal;
use super::{Board, Game};

/// A move as named by a player or an engine: endpoints, an optional
/// promotion, and the special flags the legality pipeline re-derives.
/// Flags arriving on untrusted drafts are never taken at face value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDraft {
    pub start: Coord,
    pub end: Coord,
    pub promotion: Option<Material>,
    pub flags: SpecialFlags,
}

impl MoveDraft {
    pub fn new(start: Coord, end: Coord) -> Self {
        Self {
            start,
            end,
            promotion: None,
            flags: SpecialFlags::default(),
        }
    }

    pub fn with_flags(start: Coord, end: Coord, flags: SpecialFlags) -> Self {
        Self {
            start,
            end,
            promotion: None,
            flags,
        }
    }

    pub fn promoting(mut self, material: Material) -> Self {
        self.promotion = Some(material);
        self
    }

    /// Fill in a default promotion when the destination triggers one and
    /// none was chosen; simulation needs every draft executable.
    pub fn auto_promoted(mut self, game: &Game) -> Self {
        if self.flags.promote_trigger && self.promotion.is_none() {
            if let Some(piece) = game.board.pieces.piece_at(&self.start) {
                if let Some(&raw) = game.rules.promotions_allowed.first() {
                    self.promotion = Some(Material::new(piece.material.player(), raw));
                }
            }
        }
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveFlags {
    pub check: bool,
    pub mate: bool,
    pub capture: bool,
}

/// A fully generated move: the draft plus everything needed to apply,
/// reverse, display and transmit it.
#[derive(Debug, Clone)]
pub struct Move {
    pub draft: MoveDraft,
    pub material: Material,
    /// Move-count the board must show before this move applies forward.
    pub generate_index: usize,
    pub changes: Vec<Change>,
    pub state: StateJournal,
    pub flags: MoveFlags,
    pub compact: String,
    pub clock_stamp: Option<u64>,
}

/// Expand a draft into a full move against the current position. The
/// board is not touched. Fails only when the start square is empty.
pub fn generate_move(game: &Game, draft: &MoveDraft) -> Result<Move> {
    let board = &game.board;
    let mover = board
        .pieces
        .piece_at(&draft.start)
        .ok_or_else(|| anyhow!("generate_move: no piece at {}", draft.start))?;

    let mut changes: Vec<Change> = Vec::new();
    let mut journal = StateJournal::default();

    // Every move clears en passant; a double push recreates it through
    // its flag.
    journal.queue_enpassant(
        board.state.global.enpassant.clone(),
        draft.flags.enpassant_create.clone(),
    );

    let handled = special::special_handler(mover.material.raw())
        .map(|handler| handler(game, draft, &mut changes))
        .unwrap_or(false);
    if !handled {
        if let Some(victim) = board.pieces.piece_at(&draft.end) {
            queue_capture(&mut changes, victim, -1, false);
        }
        queue_move_piece(
            &mut changes,
            mover.clone(),
            draft.end.clone(),
            draft.flags.path.clone(),
            true,
        );
    }

    let capture = was_a_capture(&changes);
    queue_rights_revocations(game, &changes, &mut journal);

    if let Some(current) = board.state.global.move_rule_state {
        let next = if capture || mover.material.raw().is_pawn() {
            0
        } else {
            current + 1
        };
        journal.queue_move_rule(current, next);
    }

    Ok(Move {
        compact: notation::compact_from_draft(draft),
        draft: draft.clone(),
        material: mover.material,
        generate_index: game.move_count(),
        changes,
        state: journal,
        flags: MoveFlags {
            capture,
            ..MoveFlags::default()
        },
        clock_stamp: None,
    })
}

/// Revoke the special right of every coordinate a change uses as source,
/// capture or delete, then cascade: on each touched rank, any non-pawn
/// right-holder left without a qualifying castling partner (opposite
/// royal role, same color, non-pawn, distance at least three, right
/// intact) loses its right too, to a fixpoint.
fn queue_rights_revocations(game: &Game, changes: &[Change], journal: &mut StateJournal) {
    let board = &game.board;
    let rights = &board.state.global.special_rights;
    let mut removed: Vec<Coord> = Vec::new();
    for change in changes {
        let coord = match change {
            Change::Move { piece, .. }
            | Change::Capture { piece, .. }
            | Change::Delete { piece, .. } => &piece.coords,
            Change::Add { .. } => continue,
        };
        if rights.contains(coord) && !removed.contains(coord) {
            removed.push(coord.clone());
        }
    }
    if removed.is_empty() {
        return;
    }
    for coord in &removed {
        journal.queue_special_right(coord.clone(), true, false);
    }

    let mut working: HashSet<Coord> = rights
        .iter()
        .filter(|coord| !removed.contains(coord))
        .cloned()
        .collect();
    let affected_ranks: HashSet<_> = removed.iter().map(|coord| coord.y.clone()).collect();
    loop {
        let mut revoked: Vec<Coord> = Vec::new();
        for coord in &working {
            if !affected_ranks.contains(&coord.y) {
                continue;
            }
            let Some(holder) = board.pieces.piece_at(coord) else {
                continue;
            };
            let raw = holder.material.raw();
            if raw.is_pawn() {
                continue;
            }
            let has_partner = working.iter().any(|other| {
                if other == coord || other.y != coord.y {
                    return false;
                }
                let Some(partner) = board.pieces.piece_at(other) else {
                    return false;
                };
                let partner_raw = partner.material.raw();
                partner.material.player() == holder.material.player()
                    && !partner_raw.is_pawn()
                    && ((raw.is_jumping_royal() && !partner_raw.is_royal())
                        || (!raw.is_royal() && partner_raw.is_jumping_royal()))
                    && (&other.x - &coord.x).abs() >= num_bigint::BigInt::from(3)
            });
            if !has_partner {
                revoked.push(coord.clone());
            }
        }
        if revoked.is_empty() {
            break;
        }
        for coord in revoked {
            working.remove(&coord);
            journal.queue_special_right(coord.clone(), true, false);
        }
    }
}

/// Run a move's journals against the board. Forward asserts the board
/// shows the move-count the move was generated at; backward asserts the
/// count just after it. A mismatch is a bug, not an input error.
pub fn apply_move(board: &mut Board, mv: &mut Move, forward: bool, global: bool) {
    if forward {
        assert_eq!(
            board.state.local.move_count, mv.generate_index,
            "apply_move: board is not at the move's generate index"
        );
        apply_changes(&mut board.pieces, &mut mv.changes, true);
        apply_state_changes(&mut board.state, &mv.state, true, global);
        board.state.local.move_count += 1;
    } else {
        assert_eq!(
            board.state.local.move_count,
            mv.generate_index + 1,
            "apply_move: board is not just past the move's generate index"
        );
        apply_state_changes(&mut board.state, &mv.state, false, global);
        apply_changes(&mut board.pieces, &mut mv.changes, false);
        board.state.local.move_count -= 1;
    }
}

/// Commit a generated move: apply it, record it, advance the turn and
/// evaluate check for the new side to move. Check status and attackers
/// are appended to the move's local state stream so any later rewind or
/// replay restores them.
pub fn make_move(game: &mut Game, mv: Move) {
    debug_assert!(
        game.at_latest_move(),
        "make_move: board is not at the latest position"
    );
    let mut mv = mv;
    apply_move(&mut game.board, &mut mv, true, true);
    game.moves.push(mv);
    game.whos_turn = game.rules.player_at(game.moves.len());

    let result = detect_check(game, game.whos_turn, true);
    let prior_check = game.board.state.local.in_check.clone();
    let prior_attackers = game.board.state.local.attackers.clone();
    let mv = game.moves.last_mut().expect("make_move: move vanished");
    mv.state
        .queue_check(prior_check, result.royals_in_check.clone());
    mv.state
        .queue_attackers(prior_attackers, result.attackers.clone());
    if result.check {
        mv.flags.check = true;
    }
    game.board.state.local.in_check = result.royals_in_check;
    game.board.state.local.attackers = result.attackers;
}

/// Undo the last move of the game, restoring board and state exactly.
pub fn rewind_move(game: &mut Game) {
    let mut mv = game.moves.pop().expect("rewind_move: no moves to rewind");
    apply_move(&mut game.board, &mut mv, false, true);
    game.whos_turn = game.rules.player_at(game.moves.len());
}

/// Step the board to `target` applied moves, one move at a time,
/// handing each straddled move to `callback`. Navigation only: global
/// state stays put, so the game itself is unchanged when the board
/// returns to the latest move.
pub fn go_to_move(game: &mut Game, target: usize, mut callback: impl FnMut(&Move)) {
    assert!(
        target <= game.moves.len(),
        "go_to_move: target {target} outside the move list"
    );
    while game.move_count() < target {
        let index = game.board.state.local.move_count;
        let Game { board, moves, .. } = game;
        let mv = &mut moves[index];
        callback(mv);
        apply_move(board, mv, true, false);
    }
    while game.move_count() > target {
        let index = game.board.state.local.move_count - 1;
        let Game { board, moves, .. } = game;
        let mv = &mut moves[index];
        callback(mv);
        apply_move(board, mv, false, false);
    }
}

/// Generate, apply, probe, revert. Global state is never touched, so
/// the probe sees the post-move board while the game keeps its
/// persistent fields. Panics if the draft names an empty start square.
pub fn simulate_move<R>(
    game: &mut Game,
    draft: &MoveDraft,
    action: impl FnOnce(&mut Game) -> R,
) -> R {
    let mut mv =
        generate_move(game, draft).expect("simulate_move: draft names an empty square");
    apply_move(&mut game.board, &mut mv, true, false);
    let result = action(game);
    apply_move(&mut game.board, &mut mv, false, false);
    result
}

/// Rebuild a game from compact move strings. Special flags are
/// re-derived from the legal-move machinery, never trusted from the
/// wire. With `validate_moves` every move is checked for legality and
/// the game must not already be concluded.
pub fn make_all_moves_in_game(
    game: &mut Game,
    compact_moves: &[&str],
    validate_moves: bool,
) -> Result<()> {
    ensure!(
        game.moves.is_empty(),
        "make_all_moves_in_game: the game already has moves"
    );
    for compact in compact_moves {
        if validate_moves {
            if get_game_conclusion(game).is_some() {
                bail!("move {compact} comes after the game has concluded");
            }
            is_engines_move_legal(game, compact).map_err(|reason| anyhow!("{reason}"))?;
        }
        let mut draft = notation::parse_compact_move(compact)?;
        attach_special_flags(game, &mut draft)?;
        let mv = generate_move(game, &draft)?;
        make_move(game, mv);
    }
    Ok(())
}

/// Re-derive the special flags of a draft by matching its destination
/// against the mover's special-move output for the current position.
pub fn attach_special_flags(game: &Game, draft: &mut MoveDraft) -> Result<()> {
    let piece = game
        .board
        .pieces
        .piece_at(&draft.start)
        .ok_or_else(|| anyhow!("attach_special_flags: no piece at {}", draft.start))?;
    let Some(moveset) = game.board.moveset_of(piece.material.raw()) else {
        return Ok(());
    };
    if let Some(special) = moveset.special {
        let dests = special(game, &piece.coords, piece.material.player(), false);
        if let Some(dest) = dests.into_iter().find(|dest| dest.coords == draft.end) {
            draft.flags = dest.flags;
        }
    }
    Ok(())
}
