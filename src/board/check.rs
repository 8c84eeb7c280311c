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

//! Check detection and resolution. Detection asks, for each royal,
//! whether any enemy could capture it next move: jump attacks through
//! the vicinity table, capturing specials through the special vicinity,
//! sliding attacks by casting a ray down every active slide direction to
//! the nearest piece. Resolution prunes a piece's legal moves to those
//! that leave its own side out of check, by simulation for finite sets
//! and by exact line intersection for slide-blocking candidates.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, Zero};

use super::coords::{Coord, Vector};
use super::legal::{test_square_validity, LegalMoves, SquareValidity};
use super::material::{Player, RawType};
use super::movepiece::{self, MoveDraft};
use super::moveset::{Dest, SpecialFlags};
use super::organized::Piece;
use super::state::Attacker;
use super::Game;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub check: bool,
    pub royals_in_check: Vec<Coord>,
    pub attackers: Vec<Attacker>,
}

/// Whether any royal of `color` is attacked, with the attacked squares
/// and, when `track_attackers` is set, every distinct attacker.
pub fn detect_check(game: &Game, color: Player, track_attackers: bool) -> CheckResult {
    let mut royals_in_check = Vec::new();
    let mut attackers: Vec<Attacker> = Vec::new();
    for royal in game.board.pieces.royals_of(color) {
        let found = square_attackers(game, &royal.coords, !color, track_attackers);
        if !found.is_empty() {
            royals_in_check.push(royal.coords.clone());
            for attacker in found {
                if !attackers.contains(&attacker) {
                    attackers.push(attacker);
                }
            }
        }
    }
    CheckResult {
        check: !royals_in_check.is_empty(),
        royals_in_check,
        attackers,
    }
}

pub fn square_attacked_by(game: &Game, target: &Coord, by: Player) -> bool {
    !square_attackers(game, target, by, false).is_empty()
}

/// Whether `color` currently stands in check: answered from the recorded
/// local state when `color` is to move in this position, freshly
/// otherwise.
pub fn in_check_now(game: &Game, color: Player) -> bool {
    if game.rules.player_at(game.move_count()) == color {
        !game.board.state.local.in_check.is_empty()
    } else {
        detect_check(game, color, false).check
    }
}

fn check_status(game: &Game, color: Player) -> (Vec<Coord>, Vec<Attacker>) {
    if game.rules.player_at(game.move_count()) == color {
        (
            game.board.state.local.in_check.clone(),
            game.board.state.local.attackers.clone(),
        )
    } else {
        let result = detect_check(game, color, true);
        (result.royals_in_check, result.attackers)
    }
}

fn square_attackers(game: &Game, target: &Coord, by: Player, collect_all: bool) -> Vec<Attacker> {
    let board = &game.board;
    let mut found: Vec<Attacker> = Vec::new();

    for (offset, types) in board.vicinity() {
        let source = target + *offset;
        let Some(piece) = board.pieces.piece_at(&source) else {
            continue;
        };
        if piece.material.player() == by && types.contains(&piece.material.raw()) {
            found.push(Attacker {
                coords: source,
                slid: false,
            });
            if !collect_all {
                return found;
            }
        }
    }

    for (offset, types) in board.special_vicinity() {
        let source = target + *offset;
        let Some(piece) = board.pieces.piece_at(&source) else {
            continue;
        };
        if piece.material.player() != by {
            continue;
        }
        let raw = piece.material.raw();
        if !types.contains(&raw) {
            continue;
        }
        let attacks = match raw {
            RawType::Pawn => pawn_attacks_square(&piece, target),
            RawType::Rose => super::special::rose_threatens(game, &piece, target),
            _ => false,
        };
        if attacks {
            let attacker = Attacker {
                coords: source,
                slid: false,
            };
            if !found.contains(&attacker) {
                found.push(attacker);
            }
            if !collect_all {
                return found;
            }
        }
    }

    for &vector in board.pieces.slides() {
        let Some(bucket) = board.pieces.line_bucket(vector, target) else {
            continue;
        };
        let mut nearest_pos: Option<(BigInt, usize)> = None;
        let mut nearest_neg: Option<(BigInt, usize)> = None;
        for &abs in bucket {
            let coords = board.pieces.coord_at(abs);
            let steps = target
                .steps_to(&coords, vector)
                .expect("square_attackers: bucket member off the line");
            if steps.is_zero() {
                continue;
            }
            if steps.is_positive() {
                match &nearest_pos {
                    Some((best, _)) if *best <= steps => {}
                    _ => nearest_pos = Some((steps, abs)),
                }
            } else {
                match &nearest_neg {
                    Some((best, _)) if *best >= steps => {}
                    _ => nearest_neg = Some((steps, abs)),
                }
            }
        }
        for candidate in [&nearest_pos, &nearest_neg] {
            let Some((steps, abs)) = candidate else {
                continue;
            };
            let piece = board.pieces.piece_at_index(*abs);
            if piece.material.player() != by {
                continue;
            }
            let Some(moveset) = board.moveset_of(piece.material.raw()) else {
                continue;
            };
            let Some(bounds) = moveset.sliding.get(&vector) else {
                continue;
            };
            // The attacker must cover the distance back to the target.
            let back = -steps;
            let within = if back.is_positive() {
                bounds.max.as_ref().map_or(true, |max| back <= *max)
            } else {
                bounds.min.as_ref().map_or(true, |min| back >= *min)
            };
            if !within {
                continue;
            }
            if !(moveset.ignore)(&piece.coords, target) {
                continue;
            }
            let attacker = Attacker {
                coords: piece.coords.clone(),
                slid: true,
            };
            if !found.contains(&attacker) {
                found.push(attacker);
            }
            if !collect_all {
                return found;
            }
        }
    }

    found
}

fn pawn_attacks_square(pawn: &Piece, target: &Coord) -> bool {
    let forward = match pawn.material.player() {
        Player::White => 1,
        Player::Black => -1,
        Player::Neutral => return false,
    };
    if &pawn.coords.y + BigInt::from(forward) != target.y {
        return false;
    }
    let dx = &target.x - &pawn.coords.x;
    dx.abs() == BigInt::from(1)
}

/// Drop every move that would leave the mover's side in check.
///
/// Royals have their finite destinations simulated one by one. A
/// non-royal in single check keeps only moves that capture the attacker
/// or land on the check ray, found by intersecting each of its slide
/// lines with the ray; in double check it has nothing. Out of check,
/// pins restrict slides to the pin line. Colinear movesets and the
/// Royal Queen get the `brute` flag instead: their sets stay
/// pseudo-legal and every candidate is simulated on demand.
pub fn remove_check_invalid_moves(game: &mut Game, piece: &Piece, legal: &mut LegalMoves) {
    let color = piece.material.player();
    if color == Player::Neutral {
        return;
    }
    let raw = piece.material.raw();
    let colinear = game
        .board
        .moveset_of(raw)
        .is_some_and(|moveset| moveset.is_colinear());
    if colinear || raw == RawType::RoyalQueen {
        legal.brute = true;
        return;
    }

    if piece.material.is_royal() {
        let kept: Vec<Dest> = legal
            .individual
            .drain(..)
            .filter(|dest| move_survives(game, piece, &dest.coords, &dest.flags))
            .collect();
        legal.individual = kept;
        return;
    }

    let (royals_in_check, attackers) = check_status(game, color);
    if !attackers.is_empty() {
        if attackers.len() >= 2 {
            // Two attackers cannot both be captured or blocked.
            legal.individual.clear();
            legal.sliding.clear();
            return;
        }
        let attacker = attackers[0].clone();
        let mut candidates: Vec<Dest> = Vec::new();
        let drained: Vec<Dest> = legal.individual.drain(..).collect();
        for dest in drained {
            if move_survives(game, piece, &dest.coords, &dest.flags) {
                candidates.push(dest);
            }
        }
        capture_candidate(game, piece, legal, &attacker.coords, &mut candidates);
        if attacker.slid {
            for royal in &royals_in_check {
                blocking_candidates(game, piece, legal, &attacker.coords, royal, &mut candidates);
            }
        }
        legal.individual = candidates;
        legal.sliding.clear();
        return;
    }

    let pins = detect_pins(game, piece, color);
    if pins.is_empty() {
        // Ordinary moves of an unpinned piece cannot expose its royal;
        // en passant can, by removing a second piece from the board.
        let kept: Vec<Dest> = legal
            .individual
            .drain(..)
            .filter(|dest| {
                !dest.flags.enpassant || move_survives(game, piece, &dest.coords, &dest.flags)
            })
            .collect();
        legal.individual = kept;
    } else {
        legal
            .sliding
            .retain(|vector, _| pins.iter().all(|pin| pin == vector));
        let kept: Vec<Dest> = legal
            .individual
            .drain(..)
            .filter(|dest| move_survives(game, piece, &dest.coords, &dest.flags))
            .collect();
        legal.individual = kept;
    }
}

/// If a slide of the mover reaches `square`, offer it as a simulated
/// candidate (capturing the attacker).
fn capture_candidate(
    game: &mut Game,
    piece: &Piece,
    legal: &LegalMoves,
    square: &Coord,
    candidates: &mut Vec<Dest>,
) {
    if candidates.iter().any(|dest| dest.coords == *square) {
        return;
    }
    for vector in legal.sliding.keys() {
        let Some(steps) = piece.coords.steps_to(square, *vector) else {
            continue;
        };
        if !legal.slide_reaches(*vector, &steps) {
            continue;
        }
        if !(legal.ignore)(&piece.coords, square) {
            continue;
        }
        if move_survives(game, piece, square, &SpecialFlags::default()) {
            candidates.push(Dest::plain(square.clone()));
        }
        return;
    }
}

/// Blocking candidates: the mover's slide lines each cross the check ray
/// in at most one point. Solve the crossing exactly, keep lattice points
/// strictly between attacker and royal that the slide reaches, and let
/// simulation have the final word.
fn blocking_candidates(
    game: &mut Game,
    piece: &Piece,
    legal: &LegalMoves,
    attacker: &Coord,
    royal: &Coord,
    candidates: &mut Vec<Dest>,
) {
    // The attack ray runs along some active slide vector.
    let Some((ray, ray_steps)) = game.board.pieces.slides().iter().find_map(|&w| {
        attacker.steps_to(royal, w).map(|steps| (w, steps))
    }) else {
        return;
    };

    let delta_x = &attacker.x - &piece.coords.x;
    let delta_y = &attacker.y - &piece.coords.y;
    for &vector in legal.sliding.keys().collect::<Vec<_>>() {
        let v_dx = BigInt::from(vector.dx);
        let v_dy = BigInt::from(vector.dy);
        let w_dx = BigInt::from(ray.dx);
        let w_dy = BigInt::from(ray.dy);
        let det = &w_dx * &v_dy - &v_dx * &w_dy;
        if det.is_zero() {
            continue;
        }
        // piece + t·v == attacker + u·w, by Cramer's rule.
        let t_num = &w_dx * &delta_y - &w_dy * &delta_x;
        let u_num = &v_dx * &delta_y - &v_dy * &delta_x;
        let (t, t_rem) = t_num.div_rem(&det);
        let (u, u_rem) = u_num.div_rem(&det);
        if !t_rem.is_zero() || !u_rem.is_zero() {
            continue;
        }
        if t.is_zero() {
            continue;
        }
        let strictly_between = if ray_steps.is_positive() {
            u.is_positive() && u < ray_steps
        } else {
            u.is_negative() && u > ray_steps
        };
        if !strictly_between {
            continue;
        }
        if !legal.slide_reaches(vector, &t) {
            continue;
        }
        let square = piece.coords.step_by(vector, &t);
        if !(legal.ignore)(&piece.coords, &square) {
            continue;
        }
        if candidates.iter().any(|dest| dest.coords == square) {
            continue;
        }
        if test_square_validity(&game.board, &square, piece.material.player(), false, false)
            == SquareValidity::Blocked
        {
            continue;
        }
        if move_survives(game, piece, &square, &SpecialFlags::default()) {
            candidates.push(Dest::plain(square));
        }
    }
}

/// Directions along which `piece` is pinned: a friendly royal is the
/// nearest piece one way down the line, an enemy slider that covers the
/// distance to that royal is the nearest the other way.
fn detect_pins(game: &Game, piece: &Piece, color: Player) -> Vec<Vector> {
    let board = &game.board;
    let mut pins = Vec::new();
    for &vector in board.pieces.slides() {
        let Some(bucket) = board.pieces.line_bucket(vector, &piece.coords) else {
            continue;
        };
        let mut nearest_pos: Option<(BigInt, Piece)> = None;
        let mut nearest_neg: Option<(BigInt, Piece)> = None;
        for &abs in bucket {
            let other = board.pieces.piece_at_index(abs);
            let steps = piece
                .coords
                .steps_to(&other.coords, vector)
                .expect("detect_pins: bucket member off the line");
            if steps.is_zero() {
                continue;
            }
            if steps.is_positive() {
                match &nearest_pos {
                    Some((best, _)) if *best <= steps => {}
                    _ => nearest_pos = Some((steps, other)),
                }
            } else {
                match &nearest_neg {
                    Some((best, _)) if *best >= steps => {}
                    _ => nearest_neg = Some((steps, other)),
                }
            }
        }
        let sides = [
            (&nearest_pos, &nearest_neg),
            (&nearest_neg, &nearest_pos),
        ];
        for (royal_side, attacker_side) in sides {
            let (Some((_, royal)), Some((_, attacker))) = (royal_side, attacker_side) else {
                continue;
            };
            if !royal.material.is_royal() || royal.material.player() != color {
                continue;
            }
            let owner = attacker.material.player();
            if owner == color || owner == Player::Neutral {
                continue;
            }
            let Some(moveset) = board.moveset_of(attacker.material.raw()) else {
                continue;
            };
            let Some(bounds) = moveset.sliding.get(&vector) else {
                continue;
            };
            let Some(reach) = attacker.coords.steps_to(&royal.coords, vector) else {
                continue;
            };
            let within = if reach.is_positive() {
                bounds.max.as_ref().map_or(true, |max| reach <= *max)
            } else {
                bounds.min.as_ref().map_or(true, |min| reach >= *min)
            };
            if !within {
                continue;
            }
            if !(moveset.ignore)(&attacker.coords, &royal.coords) {
                continue;
            }
            pins.push(vector);
            break;
        }
    }
    pins
}

/// Simulate `draft` and report whether `color` would stand in check in
/// the resulting position. The board is restored exactly.
pub fn get_simulated_check(game: &mut Game, draft: &MoveDraft, color: Player) -> bool {
    movepiece::simulate_move(game, draft, |sim| detect_check(sim, color, false).check)
}

/// Whether moving `piece` to `end` leaves its own side out of check.
pub(crate) fn move_survives(
    game: &mut Game,
    piece: &Piece,
    end: &Coord,
    flags: &SpecialFlags,
) -> bool {
    let draft = MoveDraft::with_flags(piece.coords.clone(), end.clone(), flags.clone())
        .auto_promoted(game);
    !get_simulated_check(game, &draft, piece.material.player())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::legal::calculate_all;
    use crate::board::material::Material;
    use crate::board::{Coord, GameRules, Setup};
    use std::collections::HashMap as Map;

    fn game_with(pieces: &[(i64, i64, Material)]) -> Game {
        let position: Map<Coord, Material> = pieces
            .iter()
            .map(|(x, y, material)| (Coord::at(*x, *y), *material))
            .collect();
        Game::new(Setup::new(position, GameRules::default()))
    }

    #[test]
    fn test_rook_check_down_a_long_file() {
        let game = game_with(&[
            (5, 1, Material::WK),
            (5, 90000, Material::BR),
            (50, 50, Material::BK),
        ]);
        let result = detect_check(&game, Player::White, true);
        assert!(result.check);
        assert_eq!(result.royals_in_check, vec![Coord::at(5, 1)]);
        assert_eq!(
            result.attackers,
            vec![Attacker {
                coords: Coord::at(5, 90000),
                slid: true
            }]
        );
    }

    #[test]
    fn test_interposed_piece_stops_the_ray() {
        let game = game_with(&[
            (5, 1, Material::WK),
            (5, 90000, Material::BR),
            (5, 40, Material::WN),
            (50, 50, Material::BK),
        ]);
        assert!(!detect_check(&game, Player::White, false).check);
    }

    #[test]
    fn test_knight_check_via_vicinity() {
        let game = game_with(&[
            (5, 1, Material::WK),
            (6, 3, Material::BN),
            (50, 50, Material::BK),
        ]);
        let result = detect_check(&game, Player::White, true);
        assert!(result.check);
        assert!(!result.attackers[0].slid);
    }

    #[test]
    fn test_pawn_check_via_special_vicinity() {
        let game = game_with(&[
            (5, 5, Material::WK),
            (6, 6, Material::BP),
            (50, 50, Material::BK),
        ]);
        assert!(detect_check(&game, Player::White, false).check);
        // A pawn never checks straight ahead.
        let game = game_with(&[
            (5, 5, Material::WK),
            (5, 6, Material::BP),
            (50, 50, Material::BK),
        ]);
        assert!(!detect_check(&game, Player::White, false).check);
    }

    #[test]
    fn test_huygen_checks_only_at_prime_distance() {
        let game = game_with(&[
            (0, 0, Material::WK),
            (7, 0, Material::black(RawType::Huygen)),
            (50, 50, Material::BK),
        ]);
        assert!(detect_check(&game, Player::White, false).check);
        let game = game_with(&[
            (0, 0, Material::WK),
            (8, 0, Material::black(RawType::Huygen)),
            (50, 50, Material::BK),
        ]);
        assert!(!detect_check(&game, Player::White, false).check);
    }

    #[test]
    fn test_pinned_rook_keeps_only_the_pin_line() {
        let mut game = game_with(&[
            (5, 1, Material::WK),
            (5, 4, Material::WR),
            (5, 900, Material::BR),
            (50, 50, Material::BK),
        ]);
        let rook = game.board.pieces.piece_at(&Coord::at(5, 4)).unwrap();
        let legal = calculate_all(&mut game, &rook);
        assert!(legal.sliding.contains_key(&Vector::UP));
        assert!(!legal.sliding.contains_key(&Vector::RIGHT));
    }

    #[test]
    fn test_checked_side_must_resolve() {
        // White king on e1 checked by a rook on e8; the white rook on
        // a4 can block on e4 or nothing else.
        let mut game = game_with(&[
            (5, 1, Material::WK),
            (5, 8, Material::BR),
            (1, 4, Material::WR),
            (50, 50, Material::BK),
        ]);
        game.board.state.local.in_check = vec![Coord::at(5, 1)];
        game.board.state.local.attackers = vec![Attacker {
            coords: Coord::at(5, 8),
            slid: true,
        }];
        let rook = game.board.pieces.piece_at(&Coord::at(1, 4)).unwrap();
        let legal = calculate_all(&mut game, &rook);
        assert!(legal.sliding.is_empty());
        let coords: Vec<&Coord> = legal.individual.iter().map(|d| &d.coords).collect();
        assert_eq!(coords, vec![&Coord::at(5, 4)]);
    }

    #[test]
    fn test_capture_resolves_check() {
        let mut game = game_with(&[
            (5, 1, Material::WK),
            (5, 8, Material::BR),
            (1, 8, Material::WR),
            (50, 50, Material::BK),
        ]);
        game.board.state.local.in_check = vec![Coord::at(5, 1)];
        game.board.state.local.attackers = vec![Attacker {
            coords: Coord::at(5, 8),
            slid: true,
        }];
        let rook = game.board.pieces.piece_at(&Coord::at(1, 8)).unwrap();
        let legal = calculate_all(&mut game, &rook);
        let coords: Vec<&Coord> = legal.individual.iter().map(|d| &d.coords).collect();
        assert_eq!(coords, vec![&Coord::at(5, 8)]);
    }

    #[test]
    fn test_double_check_only_royal_moves() {
        let mut game = game_with(&[
            (5, 1, Material::WK),
            (5, 8, Material::BR),
            (1, 1, Material::BR),
            (3, 3, Material::WQ),
            (50, 50, Material::BK),
        ]);
        game.board.state.local.in_check = vec![Coord::at(5, 1)];
        game.board.state.local.attackers = vec![
            Attacker {
                coords: Coord::at(5, 8),
                slid: true,
            },
            Attacker {
                coords: Coord::at(1, 1),
                slid: true,
            },
        ];
        let queen = game.board.pieces.piece_at(&Coord::at(3, 3)).unwrap();
        let legal = calculate_all(&mut game, &queen);
        assert!(legal.individual.is_empty());
        assert!(legal.sliding.is_empty());
    }

    #[test]
    fn test_simulated_check_restores_board() {
        let mut game = game_with(&[
            (5, 1, Material::WK),
            (5, 4, Material::WR),
            (5, 900, Material::BR),
            (50, 50, Material::BK),
        ]);
        let before: Vec<_> = game
            .board
            .pieces
            .iter_pieces()
            .map(|p| (p.material, p.coords))
            .collect();
        let draft = MoveDraft::new(Coord::at(5, 4), Coord::at(8, 4));
        // Moving the rook off the file exposes the king.
        assert!(get_simulated_check(&mut game, &draft, Player::White));
        let after: Vec<_> = game
            .board
            .pieces
            .iter_pieces()
            .map(|p| (p.material, p.coords))
            .collect();
        assert_eq!(before, after);
        assert_eq!(game.move_count(), 0);
    }

    #[test]
    fn test_brute_flag_for_colinear_and_royal_queen() {
        let mut game = game_with(&[
            (0, 0, Material::white(RawType::Knightrider)),
            (30, 1, Material::WK),
            (50, 50, Material::BK),
        ]);
        let rider = game.board.pieces.piece_at(&Coord::at(0, 0)).unwrap();
        let legal = calculate_all(&mut game, &rider);
        assert!(legal.brute);

        let mut game = game_with(&[
            (0, 0, Material::white(RawType::RoyalQueen)),
            (50, 50, Material::BK),
        ]);
        let royal_queen = game.board.pieces.piece_at(&Coord::at(0, 0)).unwrap();
        let legal = calculate_all(&mut game, &royal_queen);
        assert!(legal.brute);
    }
}
