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

//! Special-move machinery. Discovery hooks contribute extra destinations
//! with flags (pawn pushes and captures, en passant, promotion triggers,
//! castling, Rose spirals); execution handlers turn a flagged draft into
//! its change journal when the default capture-then-move shape does not
//! fit.

use num_bigint::BigInt;
use std::collections::{HashMap, HashSet};

use super::changes::{
    queue_add_piece, queue_capture, queue_delete_piece, queue_move_piece, Change,
};
use super::check;
use super::coords::{Coord, Offset};
use super::legal::{test_square_validity, SquareValidity};
use super::material::{Material, Player, RawType};
use super::movepiece::MoveDraft;
use super::moveset::{Castle, Dest, SpecialFlags};
use super::organized::Piece;
use super::state::EnPassant;
use super::Game;

/// Executes a fully flagged draft by queuing its changes. Returns true
/// iff the move was handled; false falls back to the default
/// capture-then-move journal.
pub type SpecialHandler = fn(&Game, &MoveDraft, &mut Vec<Change>) -> bool;

pub fn special_handler(raw: RawType) -> Option<SpecialHandler> {
    match raw {
        RawType::Pawn => Some(pawn_mover),
        RawType::King | RawType::RoyalCentaur => Some(castle_mover),
        _ => None,
    }
}

/// Pawn destinations: single and double pushes, diagonal captures, en
/// passant, with promotion triggers attached on the mover's promotion
/// ranks.
pub fn pawn_special(game: &Game, coords: &Coord, color: Player, premove: bool) -> Vec<Dest> {
    let forward: i64 = match color {
        Player::White => 1,
        Player::Black => -1,
        Player::Neutral => return Vec::new(),
    };
    let board = &game.board;
    let mut dests = Vec::new();

    let push = coords + Offset::new(0, forward);
    let push_open =
        test_square_validity(board, &push, color, premove, false) == SquareValidity::Open;
    if push_open {
        dests.push(Dest::plain(push.clone()));

        if board.has_special_right(coords) {
            let double = coords + Offset::new(0, 2 * forward);
            if test_square_validity(board, &double, color, premove, false) == SquareValidity::Open {
                let flags = SpecialFlags {
                    enpassant_create: Some(EnPassant {
                        square: push.clone(),
                        pawn: double.clone(),
                    }),
                    ..SpecialFlags::default()
                };
                dests.push(Dest {
                    coords: double,
                    flags,
                });
            }
        }
    }

    for dx in [-1i64, 1] {
        let diag = coords + Offset::new(dx, forward);
        if premove {
            // Pre-captures are speculative; anything in bounds that is
            // not a void can be targeted.
            if test_square_validity(board, &diag, color, true, false) != SquareValidity::Blocked {
                dests.push(Dest::plain(diag));
            }
            continue;
        }
        match test_square_validity(board, &diag, color, false, true) {
            SquareValidity::Capture => dests.push(Dest::plain(diag)),
            SquareValidity::Blocked | SquareValidity::Open => {
                let Some(enpassant) = &board.state.global.enpassant else {
                    continue;
                };
                if enpassant.square != diag {
                    continue;
                }
                let Some(victim) = board.pieces.piece_at(&enpassant.pawn) else {
                    continue;
                };
                if victim.material.player() != color && victim.material.raw().is_pawn() {
                    let flags = SpecialFlags {
                        enpassant: true,
                        ..SpecialFlags::default()
                    };
                    dests.push(Dest {
                        coords: diag,
                        flags,
                    });
                }
            }
        }
    }

    let ranks = game.rules.promotion_ranks_of(color);
    if !ranks.is_empty() {
        for dest in &mut dests {
            if ranks.contains(&dest.coords.y) {
                dest.flags.promote_trigger = true;
            }
        }
    }
    dests
}

/// Castling discovery: for each horizontal direction, the nearest piece
/// on the king's rank must be a qualifying partner: same color, not a
/// pawn, not a jumping royal, at least three squares away, holding its
/// special right. The king lands two squares toward it.
pub fn castle_special(game: &Game, coords: &Coord, color: Player, premove: bool) -> Vec<Dest> {
    let board = &game.board;
    if !board.has_special_right(coords) {
        return Vec::new();
    }
    let in_check = !premove && check::in_check_now(game, color);
    if in_check {
        return Vec::new();
    }

    let mut dests = Vec::new();
    let three = BigInt::from(3);
    for dir in [-1i64, 1] {
        let mut nearest: Option<(BigInt, Piece)> = None;
        if let Some(bucket) = board.pieces.line_bucket(super::coords::Vector::RIGHT, coords) {
            for &abs in bucket {
                let other = board.pieces.piece_at_index(abs);
                let steps = coords
                    .steps_to(&other.coords, super::coords::Vector::RIGHT)
                    .expect("castle: rank bucket member off the rank");
                if (dir > 0) != (steps > BigInt::from(0)) || steps == BigInt::from(0) {
                    continue;
                }
                let magnitude = if dir > 0 { steps.clone() } else { -steps.clone() };
                match &nearest {
                    Some((best, _)) if *best <= magnitude => {}
                    _ => nearest = Some((magnitude, other)),
                }
            }
        }
        let Some((distance, partner)) = nearest else {
            continue;
        };
        let raw = partner.material.raw();
        if partner.material.player() != color
            || raw.is_pawn()
            || raw.is_jumping_royal()
            || distance < three
            || !board.has_special_right(&partner.coords)
        {
            continue;
        }
        let transit = coords + Offset::new(dir, 0);
        let dest = coords + Offset::new(2 * dir, 0);
        if !board.is_in_bounds(&dest) {
            continue;
        }
        if !premove && check::square_attacked_by(game, &transit, !color) {
            continue;
        }
        let flags = SpecialFlags {
            castle: Some(Castle {
                dir: dir as i8,
                coord: partner.coords.clone(),
            }),
            ..SpecialFlags::default()
        };
        dests.push(Dest {
            coords: dest,
            flags,
        });
    }
    dests
}

/// The eight knight vectors in circular order; a Rose walks the ring.
const ROSE_RING: [Offset; 8] = [
    Offset::new(1, 2),
    Offset::new(2, 1),
    Offset::new(2, -1),
    Offset::new(1, -2),
    Offset::new(-1, -2),
    Offset::new(-2, -1),
    Offset::new(-2, 1),
    Offset::new(-1, 2),
];

/// Rose spirals: from each starting knight vector, in both rotations,
/// curve one ring slot per step for up to seven steps, stopping at
/// blockers and capturing on enemies. Every reachable square carries its
/// spiral as a path for animation; when several spirals reach one square
/// the shorter path wins, then the one bending toward the starting
/// position's bounding-box center.
pub fn rose_special(game: &Game, coords: &Coord, color: Player, premove: bool) -> Vec<Dest> {
    struct Candidate {
        dest: Dest,
        len: usize,
        dot: BigInt,
    }

    let board = &game.board;
    let center2 = start_box_center_doubled(game);
    let toward_center = (
        &center2.0 - BigInt::from(2) * &coords.x,
        &center2.1 - BigInt::from(2) * &coords.y,
    );

    let mut best: HashMap<Coord, Candidate> = HashMap::new();
    for start_slot in 0..8i64 {
        for rotation in [1i64, -1] {
            let mut pos = coords.clone();
            let mut path = vec![coords.clone()];
            let mut slot = start_slot;
            for _ in 0..7 {
                pos = &pos + ROSE_RING[slot.rem_euclid(8) as usize];
                let validity = test_square_validity(board, &pos, color, premove, false);
                if validity == SquareValidity::Blocked {
                    break;
                }
                path.push(pos.clone());
                offer_candidate(&mut best, coords, &toward_center, &pos, &path);
                if validity == SquareValidity::Capture {
                    break;
                }
                slot += rotation;
            }
        }
    }

    fn offer_candidate(
        best: &mut HashMap<Coord, Candidate>,
        start: &Coord,
        toward_center: &(BigInt, BigInt),
        pos: &Coord,
        path: &[Coord],
    ) {
        let mut sum = (BigInt::from(0), BigInt::from(0));
        for point in &path[1..] {
            sum.0 += &point.x - &start.x;
            sum.1 += &point.y - &start.y;
        }
        let dot = &sum.0 * &toward_center.0 + &sum.1 * &toward_center.1;
        let candidate = Candidate {
            dest: Dest {
                coords: pos.clone(),
                flags: SpecialFlags {
                    path: Some(path.to_vec()),
                    ..SpecialFlags::default()
                },
            },
            len: path.len(),
            dot,
        };
        match best.get(pos) {
            None => {
                best.insert(pos.clone(), candidate);
            }
            Some(current) => {
                let replace = if candidate.len != current.len {
                    candidate.len < current.len
                } else if candidate.dot != current.dot {
                    candidate.dot > current.dot
                } else {
                    coin_flip()
                };
                if replace {
                    best.insert(pos.clone(), candidate);
                }
            }
        }
    }

    let mut dests: Vec<Dest> = best.into_values().map(|c| c.dest).collect();
    dests.sort_by(|a, b| a.coords.cmp(&b.coords));
    dests
}

#[cfg(feature = "random")]
fn coin_flip() -> bool {
    rand::random()
}

/// Without the `random` feature spiral ties keep the first spiral found,
/// so tests are reproducible.
#[cfg(not(feature = "random"))]
fn coin_flip() -> bool {
    false
}

/// Center of the starting position's bounding box, doubled to stay in
/// integers. Editor boards have no snapshot and use the live position.
fn start_box_center_doubled(game: &Game) -> (BigInt, BigInt) {
    let mut min_x: Option<BigInt> = None;
    let mut max_x: Option<BigInt> = None;
    let mut min_y: Option<BigInt> = None;
    let mut max_y: Option<BigInt> = None;
    let mut consider = |coord: &Coord| {
        if min_x.as_ref().map_or(true, |v| coord.x < *v) {
            min_x = Some(coord.x.clone());
        }
        if max_x.as_ref().map_or(true, |v| coord.x > *v) {
            max_x = Some(coord.x.clone());
        }
        if min_y.as_ref().map_or(true, |v| coord.y < *v) {
            min_y = Some(coord.y.clone());
        }
        if max_y.as_ref().map_or(true, |v| coord.y > *v) {
            max_y = Some(coord.y.clone());
        }
    };
    match game.board.start_snapshot() {
        Some(snapshot) => {
            for coord in snapshot.position.keys() {
                consider(coord);
            }
        }
        None => {
            for piece in game.board.pieces.iter_pieces() {
                consider(&piece.coords);
            }
        }
    }
    match (min_x, max_x, min_y, max_y) {
        (Some(min_x), Some(max_x), Some(min_y), Some(max_y)) => (min_x + max_x, min_y + max_y),
        _ => (BigInt::from(0), BigInt::from(0)),
    }
}

/// Whether a Rose on `piece` threatens `target` through some spiral.
pub fn rose_threatens(game: &Game, piece: &Piece, target: &Coord) -> bool {
    rose_special(game, &piece.coords, piece.material.player(), false)
        .iter()
        .any(|dest| dest.coords == *target)
}

/// Offsets from which a piece's special moves could capture, keyed like
/// the jump vicinity. Only capturing specials matter: castling cannot
/// take anything.
pub fn build_special_vicinity(existing: &HashSet<RawType>) -> HashMap<Offset, Vec<RawType>> {
    let mut vicinity: HashMap<Offset, Vec<RawType>> = HashMap::new();
    if existing.contains(&RawType::Pawn) {
        for offset in [
            Offset::new(-1, -1),
            Offset::new(1, -1),
            Offset::new(-1, 1),
            Offset::new(1, 1),
        ] {
            vicinity.entry(offset).or_default().push(RawType::Pawn);
        }
    }
    if existing.contains(&RawType::Rose) {
        for offset in rose_reach_offsets() {
            let entry = vicinity.entry(offset).or_default();
            if !entry.contains(&RawType::Rose) {
                entry.push(RawType::Rose);
            }
        }
    }
    for types in vicinity.values_mut() {
        types.sort();
    }
    vicinity
}

/// Every offset a Rose spiral can reach on an open board, negated to
/// point from the attacked square back at the Rose. The set is symmetric
/// so the negation is a formality.
fn rose_reach_offsets() -> HashSet<Offset> {
    let mut offsets = HashSet::new();
    for start_slot in 0..8i64 {
        for rotation in [1i64, -1] {
            let (mut x, mut y) = (0i64, 0i64);
            let mut slot = start_slot;
            for _ in 0..7 {
                let step = ROSE_RING[slot.rem_euclid(8) as usize];
                x += step.x;
                y += step.y;
                if (x, y) != (0, 0) {
                    offsets.insert(Offset::new(-x, -y));
                }
                slot += rotation;
            }
        }
    }
    offsets
}

fn pawn_mover(game: &Game, draft: &MoveDraft, changes: &mut Vec<Change>) -> bool {
    let board = &game.board;
    let pawn = board
        .pieces
        .piece_at(&draft.start)
        .expect("pawn_mover: no pawn at start");

    if draft.flags.enpassant {
        let enpassant = board
            .state
            .global
            .enpassant
            .as_ref()
            .expect("pawn_mover: en passant flag without state");
        let victim = board
            .pieces
            .piece_at(&enpassant.pawn)
            .expect("pawn_mover: en passant pawn missing");
        queue_capture(changes, victim, -1, false);
        queue_move_piece(changes, pawn, draft.end.clone(), None, true);
        return true;
    }

    if let Some(promotion) = draft.promotion {
        if let Some(victim) = board.pieces.piece_at(&draft.end) {
            queue_capture(changes, victim, -1, false);
        }
        queue_delete_piece(changes, pawn, true);
        let promoted = Piece {
            material: promotion,
            coords: draft.end.clone(),
            index: 0,
        };
        queue_add_piece(changes, promoted, true);
        return true;
    }

    false
}

fn castle_mover(game: &Game, draft: &MoveDraft, changes: &mut Vec<Change>) -> bool {
    let Some(castle) = &draft.flags.castle else {
        return false;
    };
    let board = &game.board;
    let king = board
        .pieces
        .piece_at(&draft.start)
        .expect("castle_mover: no royal at start");
    let partner = board
        .pieces
        .piece_at(&castle.coord)
        .expect("castle_mover: castling partner missing");
    queue_move_piece(changes, king, draft.end.clone(), None, true);
    let partner_dest = Coord::new(
        &draft.start.x + BigInt::from(castle.dir),
        draft.start.y.clone(),
    );
    queue_move_piece(changes, partner, partner_dest, None, false);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Game, GameRules, Setup};
    use std::collections::HashMap as Map;

    fn game_with(pieces: &[(i64, i64, Material)], rights: &[(i64, i64)]) -> Game {
        let position: Map<Coord, Material> = pieces
            .iter()
            .map(|(x, y, material)| (Coord::at(*x, *y), *material))
            .collect();
        let mut setup = Setup::new(position, GameRules::default());
        setup.special_rights = rights.iter().map(|(x, y)| Coord::at(*x, *y)).collect();
        Game::new(setup)
    }

    fn dest<'a>(dests: &'a [Dest], x: i64, y: i64) -> Option<&'a Dest> {
        dests.iter().find(|d| d.coords == Coord::at(x, y))
    }

    #[test]
    fn test_pawn_single_and_double_push() {
        let game = game_with(
            &[
                (5, 2, Material::WP),
                (1, 1, Material::WK),
                (1, 8, Material::BK),
            ],
            &[(5, 2)],
        );
        let dests = pawn_special(&game, &Coord::at(5, 2), Player::White, false);
        assert!(dest(&dests, 5, 3).is_some());
        let double = dest(&dests, 5, 4).expect("double push");
        let created = double.flags.enpassant_create.as_ref().unwrap();
        assert_eq!(created.square, Coord::at(5, 3));
        assert_eq!(created.pawn, Coord::at(5, 4));
    }

    #[test]
    fn test_pawn_double_needs_right_and_clear_path() {
        let game = game_with(
            &[
                (5, 2, Material::WP),
                (1, 1, Material::WK),
                (1, 8, Material::BK),
            ],
            &[],
        );
        let dests = pawn_special(&game, &Coord::at(5, 2), Player::White, false);
        assert!(dest(&dests, 5, 4).is_none());

        let game = game_with(
            &[
                (5, 2, Material::WP),
                (5, 3, Material::BN),
                (1, 1, Material::WK),
                (1, 8, Material::BK),
            ],
            &[(5, 2)],
        );
        let dests = pawn_special(&game, &Coord::at(5, 2), Player::White, false);
        assert!(dest(&dests, 5, 3).is_none());
        assert!(dest(&dests, 5, 4).is_none());
    }

    #[test]
    fn test_pawn_captures_only_enemies() {
        let game = game_with(
            &[
                (5, 2, Material::WP),
                (4, 3, Material::BN),
                (6, 3, Material::WN),
                (1, 1, Material::WK),
                (1, 8, Material::BK),
            ],
            &[],
        );
        let dests = pawn_special(&game, &Coord::at(5, 2), Player::White, false);
        assert!(dest(&dests, 4, 3).is_some());
        assert!(dest(&dests, 6, 3).is_none());
    }

    #[test]
    fn test_pawn_en_passant_flagged() {
        let mut game = game_with(
            &[
                (4, 4, Material::BP),
                (5, 4, Material::WP),
                (1, 1, Material::WK),
                (1, 8, Material::BK),
            ],
            &[],
        );
        game.board.state.global.enpassant = Some(EnPassant {
            square: Coord::at(5, 3),
            pawn: Coord::at(5, 4),
        });
        let dests = pawn_special(&game, &Coord::at(4, 4), Player::Black, false);
        let ep = dest(&dests, 5, 3).expect("en passant destination");
        assert!(ep.flags.enpassant);
    }

    #[test]
    fn test_promotion_trigger_on_rank() {
        let game = game_with(
            &[
                (3, 7, Material::WP),
                (1, 1, Material::WK),
                (8, 8, Material::BK),
            ],
            &[],
        );
        let dests = pawn_special(&game, &Coord::at(3, 7), Player::White, false);
        let push = dest(&dests, 3, 8).unwrap();
        assert!(push.flags.promote_trigger);
    }

    #[test]
    fn test_castle_discovery() {
        let game = game_with(
            &[
                (5, 1, Material::WK),
                (8, 1, Material::WR),
                (1, 1, Material::WR),
                (5, 8, Material::BK),
            ],
            &[(5, 1), (8, 1), (1, 1)],
        );
        let dests = castle_special(&game, &Coord::at(5, 1), Player::White, false);
        let short = dest(&dests, 7, 1).expect("short castle");
        let castle = short.flags.castle.as_ref().unwrap();
        assert_eq!(castle.dir, 1);
        assert_eq!(castle.coord, Coord::at(8, 1));
        let long = dest(&dests, 3, 1).expect("long castle");
        assert_eq!(long.flags.castle.as_ref().unwrap().coord, Coord::at(1, 1));
    }

    #[test]
    fn test_castle_blocked_by_near_piece() {
        let game = game_with(
            &[
                (5, 1, Material::WK),
                (8, 1, Material::WR),
                (6, 1, Material::WB),
                (5, 8, Material::BK),
            ],
            &[(5, 1), (8, 1)],
        );
        let dests = castle_special(&game, &Coord::at(5, 1), Player::White, false);
        assert!(dest(&dests, 7, 1).is_none());
    }

    #[test]
    fn test_castle_requires_rights_and_distance() {
        // Partner without its right.
        let game = game_with(
            &[
                (5, 1, Material::WK),
                (8, 1, Material::WR),
                (5, 8, Material::BK),
            ],
            &[(5, 1)],
        );
        assert!(castle_special(&game, &Coord::at(5, 1), Player::White, false).is_empty());
        // Partner too close.
        let game = game_with(
            &[
                (5, 1, Material::WK),
                (7, 1, Material::WR),
                (5, 8, Material::BK),
            ],
            &[(5, 1), (7, 1)],
        );
        assert!(castle_special(&game, &Coord::at(5, 1), Player::White, false).is_empty());
    }

    #[test]
    fn test_castle_transit_attack_blocks() {
        let game = game_with(
            &[
                (5, 1, Material::WK),
                (8, 1, Material::WR),
                (6, 8, Material::BR),
                (5, 8, Material::BK),
            ],
            &[(5, 1), (8, 1)],
        );
        let dests = castle_special(&game, &Coord::at(5, 1), Player::White, false);
        assert!(dest(&dests, 7, 1).is_none());
    }

    #[test]
    fn test_castle_at_long_distance() {
        let game = game_with(
            &[
                (5, 1, Material::WK),
                (40, 1, Material::WR),
                (5, 8, Material::BK),
            ],
            &[(5, 1), (40, 1)],
        );
        let dests = castle_special(&game, &Coord::at(5, 1), Player::White, false);
        let short = dest(&dests, 7, 1).expect("distant partner still castles");
        assert_eq!(short.flags.castle.as_ref().unwrap().coord, Coord::at(40, 1));
    }

    #[test]
    fn test_rose_open_board_reach() {
        let game = game_with(
            &[
                (0, 0, Material::white(RawType::Rose)),
                (50, 50, Material::WK),
                (-50, 50, Material::BK),
            ],
            &[],
        );
        let dests = rose_special(&game, &Coord::at(0, 0), Player::White, false);
        // First step of every spiral is a plain knight move.
        for step in ROSE_RING {
            assert!(
                dests.iter().any(|d| d.coords == &Coord::at(0, 0) + step),
                "missing ring start {step:?}"
            );
        }
        // A full curl lands far from the start with a seven-square path.
        let with_paths = dests
            .iter()
            .filter(|d| d.flags.path.as_ref().unwrap().len() == 8)
            .count();
        assert!(with_paths > 0);
    }

    #[test]
    fn test_rose_blocked_by_friendly() {
        let game = game_with(
            &[
                (0, 0, Material::white(RawType::Rose)),
                (1, 2, Material::WP),
                (50, 50, Material::WK),
                (-50, 50, Material::BK),
            ],
            &[],
        );
        let dests = rose_special(&game, &Coord::at(0, 0), Player::White, false);
        assert!(dest(&dests, 1, 2).is_none());
    }

    #[test]
    fn test_rose_capture_ends_spiral() {
        let game = game_with(
            &[
                (0, 0, Material::white(RawType::Rose)),
                (1, 2, Material::BP),
                (50, 50, Material::WK),
                (-50, 50, Material::BK),
            ],
            &[],
        );
        let dests = rose_special(&game, &Coord::at(0, 0), Player::White, false);
        let capture = dest(&dests, 1, 2).expect("capture destination");
        // Any spiral reaching (1,2) had to stop there, so the winning
        // path is the one-step spiral.
        assert_eq!(capture.flags.path.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_special_vicinity_contents() {
        let existing = HashSet::from([RawType::Pawn, RawType::Rose, RawType::King]);
        let vicinity = build_special_vicinity(&existing);
        assert_eq!(vicinity[&Offset::new(1, 1)], vec![RawType::Pawn]);
        assert!(vicinity[&Offset::new(-2, -1)].contains(&RawType::Rose));
        // Castling captures nothing, so kings never appear.
        assert!(vicinity.values().all(|types| !types.contains(&RawType::King)));
    }
}
