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

//! The board-change journal. Every move carries an ordered list of
//! `Change` records (add, delete, move, capture) applied FIFO going
//! forward and in reverse order with inverse actions going backward.
//! Reversing a list restores the organized store exactly, which is what
//! make/unmake, simulation and navigation are built on.

use super::coords::Coord;
use super::organized::{OrganizedPieces, Piece};

/// One reversible board mutation. `main` marks the change carrying the
/// primary moved piece. The embedded `Piece` snapshots material, original
/// coordinates and relative index, which is all the inverse action needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// A piece comes into existence (promotion, editor placement). The
    /// piece's index is assigned when the change is first applied.
    Add { piece: Piece, main: bool },
    /// A piece is removed without anybody capturing it.
    Delete { piece: Piece, main: bool },
    /// The piece travels from `piece.coords` to `end_coords`. `path` is
    /// animation metadata for curved movers and never affects the board.
    Move {
        piece: Piece,
        end_coords: Coord,
        path: Option<Vec<Coord>>,
        main: bool,
    },
    /// A piece is captured. `order` tells the animation at which step
    /// along the mover's path the capture happened; `-1` is terminal.
    Capture { piece: Piece, order: i32, main: bool },
}

impl Change {
    pub fn piece(&self) -> &Piece {
        match self {
            Change::Add { piece, .. }
            | Change::Delete { piece, .. }
            | Change::Move { piece, .. }
            | Change::Capture { piece, .. } => piece,
        }
    }

    pub fn is_main(&self) -> bool {
        match self {
            Change::Add { main, .. }
            | Change::Delete { main, .. }
            | Change::Move { main, .. }
            | Change::Capture { main, .. } => *main,
        }
    }
}

pub fn queue_add_piece(changes: &mut Vec<Change>, piece: Piece, main: bool) {
    changes.push(Change::Add { piece, main });
}

pub fn queue_delete_piece(changes: &mut Vec<Change>, piece: Piece, main: bool) {
    changes.push(Change::Delete { piece, main });
}

pub fn queue_move_piece(
    changes: &mut Vec<Change>,
    piece: Piece,
    end_coords: Coord,
    path: Option<Vec<Coord>>,
    main: bool,
) {
    changes.push(Change::Move {
        piece,
        end_coords,
        path,
        main,
    });
}

pub fn queue_capture(changes: &mut Vec<Change>, piece: Piece, order: i32, main: bool) {
    changes.push(Change::Capture { piece, order, main });
}

/// True iff the journal contains a capture. Only meaningful once the
/// move's changes have been generated.
pub fn was_a_capture(changes: &[Change]) -> bool {
    changes
        .iter()
        .any(|change| matches!(change, Change::Capture { .. }))
}

/// Apply a journal to the piece store, forward in queue order or backward
/// in reverse order with each action inverted.
pub fn apply_changes(pieces: &mut OrganizedPieces, changes: &mut [Change], forward: bool) {
    if forward {
        for change in changes.iter_mut() {
            apply_forward(pieces, change);
        }
    } else {
        for change in changes.iter_mut().rev() {
            apply_backward(pieces, change);
        }
    }
}

fn apply_forward(pieces: &mut OrganizedPieces, change: &mut Change) {
    match change {
        Change::Add { piece, .. } => {
            let abs = pieces.acquire_index(piece.material);
            let range = pieces
                .type_range(piece.material)
                .expect("add: unknown material");
            piece.index = abs - range.start;
            pieces.set_position(abs, &piece.coords);
            pieces.register_piece_in_space(abs);
        }
        Change::Delete { piece, .. } | Change::Capture { piece, .. } => {
            let abs = pieces.absolute_index(piece);
            pieces.remove_piece_from_space(abs);
            pieces.zero_position(abs);
            pieces.release_index(piece.material, abs);
        }
        Change::Move {
            piece, end_coords, ..
        } => {
            let abs = pieces.absolute_index(piece);
            pieces.remove_piece_from_space(abs);
            pieces.set_position(abs, end_coords);
            pieces.register_piece_in_space(abs);
        }
    }
}

fn apply_backward(pieces: &mut OrganizedPieces, change: &mut Change) {
    match change {
        Change::Add { piece, .. } => {
            let abs = pieces.absolute_index(piece);
            pieces.remove_piece_from_space(abs);
            pieces.zero_position(abs);
            pieces.release_index(piece.material, abs);
        }
        Change::Delete { piece, .. } | Change::Capture { piece, .. } => {
            let abs = pieces.absolute_index(piece);
            pieces.reclaim_index(piece.material, abs);
            pieces.set_position(abs, &piece.coords);
            pieces.register_piece_in_space(abs);
        }
        Change::Move { piece, .. } => {
            let abs = pieces.absolute_index(piece);
            pieces.remove_piece_from_space(abs);
            pieces.set_position(abs, &piece.coords);
            pieces.register_piece_in_space(abs);
        }
    }
}
