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

//! The legal-move pipeline: expand the mover's moveset, cut slides down
//! to their unobstructed extent, append special moves, then hand the set
//! to the check resolver. A piece's legal moves are a finite list of
//! individual destinations plus per-direction slide bounds; on an
//! unbounded board the bounds are the only honest representation of a
//! slide.

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use std::collections::HashMap;

use super::check;
use super::coords::{Coord, Vector};
use super::material::Player;
use super::moveset::{default_ignore, Blocking, Dest, IgnoreFn, SlideBounds, SpecialFlags};
use super::organized::Piece;
use super::{Board, Game};

/// Outcome of probing one square as a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareValidity {
    /// May move here.
    Open,
    /// May move here, capturing.
    Capture,
    /// May not move here.
    Blocked,
}

/// The computed legal moves of one piece. `sliding` bounds are already
/// obstruction- and border-clamped. When `brute` is set the set is only
/// pseudo-legal and every candidate destination must be simulated before
/// being trusted.
#[derive(Debug, Clone)]
pub struct LegalMoves {
    pub individual: Vec<Dest>,
    pub sliding: HashMap<Vector, SlideBounds>,
    pub ignore: IgnoreFn,
    pub brute: bool,
}

impl LegalMoves {
    pub fn empty() -> Self {
        Self {
            individual: Vec::new(),
            sliding: HashMap::new(),
            ignore: default_ignore,
            brute: false,
        }
    }

    pub fn individual_dest(&self, coord: &Coord) -> Option<&Dest> {
        self.individual.iter().find(|dest| dest.coords == *coord)
    }

    /// Whether `steps` lies inside a slide's clamped bounds.
    pub fn slide_reaches(&self, vector: Vector, steps: &BigInt) -> bool {
        let Some(bounds) = self.sliding.get(&vector) else {
            return false;
        };
        if steps.is_zero() {
            return false;
        }
        if steps.is_positive() {
            bounds.max.as_ref().map_or(true, |max| steps <= max)
        } else {
            bounds.min.as_ref().map_or(true, |min| steps >= min)
        }
    }
}

/// Probe `coord` as a destination for a piece of `friendly` color.
/// Out-of-border and voids are walls; friendlies and neutral pieces
/// cannot be entered; enemies are captures unless premoving, where every
/// occupied-but-not-void square reads as open.
pub fn test_square_validity(
    board: &Board,
    coord: &Coord,
    friendly: Player,
    premove: bool,
    capturing: bool,
) -> SquareValidity {
    if !board.is_in_bounds(coord) {
        return SquareValidity::Blocked;
    }
    let Some(piece) = board.pieces.piece_at(coord) else {
        return if capturing {
            SquareValidity::Blocked
        } else {
            SquareValidity::Open
        };
    };
    if piece.material.is_void() {
        return SquareValidity::Blocked;
    }
    if premove {
        return SquareValidity::Open;
    }
    let owner = piece.material.player();
    if owner == Player::Neutral || owner == friendly {
        SquareValidity::Blocked
    } else {
        SquareValidity::Capture
    }
}

/// Steps 1–4 of the pipeline: moveset expansion, obstruction filtering
/// and special-move appending, without check pruning. This is the set
/// premoves use directly and validation probes before deciding between
/// "invalid destination" and "puts self in check".
pub fn calculate_pseudo(game: &Game, piece: &Piece, premove: bool) -> LegalMoves {
    let color = piece.material.player();
    if color == Player::Neutral {
        return LegalMoves::empty();
    }
    let Some(moveset) = game.board.moveset_of(piece.material.raw()) else {
        return LegalMoves::empty();
    };

    let mut legal = LegalMoves {
        individual: Vec::new(),
        sliding: HashMap::new(),
        ignore: moveset.ignore,
        brute: false,
    };

    for offset in &moveset.individual {
        let dest = &piece.coords + *offset;
        if test_square_validity(&game.board, &dest, color, premove, false) != SquareValidity::Blocked
        {
            legal.individual.push(Dest::plain(dest));
        }
    }

    for (vector, bounds) in &moveset.sliding {
        let clamped = slide_limit(game, piece, *vector, bounds, premove);
        legal.sliding.insert(*vector, clamped);
    }

    if let Some(special) = moveset.special {
        legal
            .individual
            .extend(special(game, &piece.coords, color, premove));
    }

    legal
}

/// The full pipeline: pseudo-legal expansion followed by check pruning.
/// The board is borrowed mutably because pruning simulates candidate
/// moves; it is restored exactly before returning.
pub fn calculate_all(game: &mut Game, piece: &Piece) -> LegalMoves {
    let mut legal = calculate_pseudo(game, piece, false);
    check::remove_check_invalid_moves(game, piece, &mut legal);
    legal
}

/// Clamp one slide direction of `piece` to the nearest blockers in its
/// line bucket, then to the world border. The mover's blocking hook
/// decides per piece whether it blocks on or before its square, or not
/// at all.
fn slide_limit(
    game: &Game,
    piece: &Piece,
    vector: Vector,
    bounds: &SlideBounds,
    premove: bool,
) -> SlideBounds {
    let color = piece.material.player();
    let moveset = game
        .board
        .moveset_of(piece.material.raw())
        .expect("slide_limit: mover has a moveset");
    let mut neg = bounds.min.clone();
    let mut pos = bounds.max.clone();

    if let Some(bucket) = game.board.pieces.line_bucket(vector, &piece.coords) {
        for &abs in bucket {
            let other = game.board.pieces.piece_at_index(abs);
            let steps = piece
                .coords
                .steps_to(&other.coords, vector)
                .expect("slide_limit: bucket member off the line");
            if steps.is_zero() {
                continue;
            }
            let blocking = (moveset.blocking)(color, &other, &piece.coords, premove);
            match blocking {
                Blocking::None => {}
                Blocking::OnSquare => {
                    if steps.is_positive() {
                        tighten_max(&mut pos, steps);
                    } else {
                        tighten_min(&mut neg, steps);
                    }
                }
                Blocking::BeforeSquare => {
                    if steps.is_positive() {
                        tighten_max(&mut pos, steps - BigInt::one());
                    } else {
                        tighten_min(&mut neg, steps + BigInt::one());
                    }
                }
            }
        }
    }

    if let Some(region) = game.board.playable_region() {
        if region.contains(&piece.coords) {
            tighten_max(&mut pos, region.steps_to_border(&piece.coords, vector, 1));
            tighten_min(&mut neg, -region.steps_to_border(&piece.coords, vector, -1));
        } else {
            pos = Some(BigInt::zero());
            neg = Some(BigInt::zero());
        }
    }

    SlideBounds { min: neg, max: pos }
}

fn tighten_max(limit: &mut Option<BigInt>, candidate: BigInt) {
    match limit {
        Some(current) if *current <= candidate => {}
        _ => *limit = Some(candidate),
    }
}

fn tighten_min(limit: &mut Option<BigInt>, candidate: BigInt) {
    match limit {
        Some(current) if *current >= candidate => {}
        _ => *limit = Some(candidate),
    }
}

/// Decide whether `end` is a member of the computed legal-move set,
/// returning the destination's special flags so the caller can transfer
/// them onto a draft. Under `brute` each hit is additionally simulated
/// and rejected if the mover's side ends up in check.
pub fn check_if_move_legal(
    game: &mut Game,
    legal: &LegalMoves,
    piece: &Piece,
    end: &Coord,
) -> Option<SpecialFlags> {
    if let Some(dest) = legal.individual_dest(end) {
        let flags = dest.flags.clone();
        if legal.brute && !survives_simulation(game, piece, end, &flags) {
            return None;
        }
        return Some(flags);
    }
    for vector in legal.sliding.keys() {
        let Some(steps) = piece.coords.steps_to(end, *vector) else {
            continue;
        };
        if !legal.slide_reaches(*vector, &steps) {
            continue;
        }
        if !(legal.ignore)(&piece.coords, end) {
            continue;
        }
        let flags = SpecialFlags::default();
        if legal.brute && !survives_simulation(game, piece, end, &flags) {
            return None;
        }
        return Some(flags);
    }
    None
}

/// True when the legal-move set is non-empty. Plain sets answer from
/// shape alone: any individual destination, or any slide with positive
/// width. Brute sets simulate candidates: every individual destination
/// plus a bounded sample of slide steps honoring the ignore hook.
pub fn has_atleast_1_move(game: &mut Game, piece: &Piece, legal: &LegalMoves) -> bool {
    if !legal.brute {
        if !legal.individual.is_empty() {
            return true;
        }
        return legal.sliding.values().any(slide_has_width);
    }
    for dest in &legal.individual {
        if survives_simulation(game, piece, &dest.coords, &dest.flags) {
            return true;
        }
    }
    for (vector, bounds) in &legal.sliding {
        for sign in [1i64, -1] {
            for magnitude in 1i64..=7 {
                let steps = BigInt::from(sign * magnitude);
                if steps.is_positive() {
                    if bounds.max.as_ref().is_some_and(|max| steps > *max) {
                        break;
                    }
                } else if bounds.min.as_ref().is_some_and(|min| steps < *min) {
                    break;
                }
                let end = piece.coords.step_by(*vector, &steps);
                if !(legal.ignore)(&piece.coords, &end) {
                    continue;
                }
                if survives_simulation(game, piece, &end, &SpecialFlags::default()) {
                    return true;
                }
            }
        }
    }
    false
}

fn slide_has_width(bounds: &SlideBounds) -> bool {
    let positive = bounds.max.as_ref().map_or(true, |max| max.is_positive());
    let negative = bounds.min.as_ref().map_or(true, |min| min.is_negative());
    positive || negative
}

fn survives_simulation(game: &mut Game, piece: &Piece, end: &Coord, flags: &SpecialFlags) -> bool {
    check::move_survives(game, piece, end, flags)
}
