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

//! Piece behavior as data. Every raw type owns one `PieceMoveset` record:
//! jump offsets, a sliding table with per-direction step bounds, and up to
//! three function hooks (blocking, ignore, special). New pieces are added
//! by registering a record, never by subclassing.

use num_bigint::BigInt;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use super::coords::{is_prime, Coord, Offset, Vector};
use super::material::{Player, RawType};
use super::organized::Piece;
use super::Game;
use super::special;
use super::state::EnPassant;

/// What a piece sitting on a slide line does to a slide passing over it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocking {
    /// Transparent; the slide continues as if the square were empty.
    None,
    /// Blocks on the square itself; the square is a capture destination.
    OnSquare,
    /// Blocks before the square; the square cannot be entered.
    BeforeSquare,
}

pub type BlockingFn = fn(Player, &Piece, &Coord, bool) -> Blocking;
pub type IgnoreFn = fn(&Coord, &Coord) -> bool;
pub type SpecialFn = fn(&Game, &Coord, Player, bool) -> Vec<Dest>;

/// Inclusive step bounds of one sliding direction: `min` ≤ 0 steps against
/// the vector's orientation, `max` ≥ 0 steps with it. `None` is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SlideBounds {
    pub min: Option<BigInt>,
    pub max: Option<BigInt>,
}

impl SlideBounds {
    pub const UNBOUNDED: SlideBounds = SlideBounds { min: None, max: None };
}

/// Castling intent attached to a king destination: which horizontal
/// direction, and where the discovered partner stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Castle {
    pub dir: i8,
    pub coord: Coord,
}

/// Flags a special-move hook attaches to a destination. They ride along
/// the draft and steer move generation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecialFlags {
    pub enpassant_create: Option<EnPassant>,
    pub enpassant: bool,
    pub promote_trigger: bool,
    pub castle: Option<Castle>,
    pub path: Option<Vec<Coord>>,
}

/// One destination square together with its special flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dest {
    pub coords: Coord,
    pub flags: SpecialFlags,
}

impl Dest {
    pub fn plain(coords: Coord) -> Self {
        Self {
            coords,
            flags: SpecialFlags::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PieceMoveset {
    pub individual: Vec<Offset>,
    pub sliding: HashMap<Vector, SlideBounds>,
    pub blocking: BlockingFn,
    pub ignore: IgnoreFn,
    pub special: Option<SpecialFn>,
    custom_hooks: bool,
}

impl PieceMoveset {
    fn new() -> Self {
        Self {
            individual: Vec::new(),
            sliding: HashMap::new(),
            blocking: default_blocking,
            ignore: default_ignore,
            special: None,
            custom_hooks: false,
        }
    }

    fn with_jumps(mut self, jumps: &[(i64, i64)]) -> Self {
        self.individual
            .extend(jumps.iter().map(|&(x, y)| Offset::new(x, y)));
        self
    }

    fn with_slides(mut self, vectors: &[Vector]) -> Self {
        for &v in vectors {
            debug_assert!(v.is_canonical());
            self.sliding.insert(v, SlideBounds::UNBOUNDED);
        }
        self
    }

    fn with_blocking(mut self, f: BlockingFn) -> Self {
        self.blocking = f;
        self.custom_hooks = true;
        self
    }

    fn with_ignore(mut self, f: IgnoreFn) -> Self {
        self.ignore = f;
        self.custom_hooks = true;
        self
    }

    fn with_special(mut self, f: SpecialFn) -> Self {
        self.special = Some(f);
        self
    }

    /// A colinear moveset slides along non-unit vectors or filters its
    /// lines through custom hooks; either way parallel lines with equal
    /// slope stop being interchangeable and check pruning must fall back
    /// to per-destination simulation.
    pub fn is_colinear(&self) -> bool {
        self.custom_hooks || self.sliding.keys().any(|v| !v.is_unit())
    }

    pub fn has_moves(&self) -> bool {
        !self.individual.is_empty() || !self.sliding.is_empty() || self.special.is_some()
    }
}

/// Default blocking: voids and neutral pieces are walls, friendlies block
/// before their square, enemies block on it. Premoves see every non-void
/// piece as transparent.
pub fn default_blocking(
    friendly: Player,
    piece: &Piece,
    _start: &Coord,
    premove: bool,
) -> Blocking {
    if piece.material.is_void() {
        return Blocking::BeforeSquare;
    }
    if premove {
        return Blocking::None;
    }
    let owner = piece.material.player();
    if owner == Player::Neutral || owner == friendly {
        Blocking::BeforeSquare
    } else {
        Blocking::OnSquare
    }
}

pub fn default_ignore(_start: &Coord, _end: &Coord) -> bool {
    true
}

/// Huygen blocking: only squares at prime Chebyshev distance from the
/// start exist for the slide; everything else, voids included, is
/// transparent.
fn huygen_blocking(friendly: Player, piece: &Piece, start: &Coord, premove: bool) -> Blocking {
    if !is_prime(&start.chebyshev(&piece.coords)) {
        return Blocking::None;
    }
    default_blocking(friendly, piece, start, premove)
}

fn huygen_ignore(start: &Coord, end: &Coord) -> bool {
    is_prime(&start.chebyshev(end))
}

const KING_JUMPS: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const KNIGHT_JUMPS: [(i64, i64); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

const HAWK_JUMPS: [(i64, i64); 16] = [
    (-2, 0),
    (2, 0),
    (0, -2),
    (0, 2),
    (-3, 0),
    (3, 0),
    (0, -3),
    (0, 3),
    (-2, -2),
    (-2, 2),
    (2, -2),
    (2, 2),
    (-3, -3),
    (-3, 3),
    (3, -3),
    (3, 3),
];

const ROOK_SLIDES: [Vector; 2] = [Vector::RIGHT, Vector::UP];
const BISHOP_SLIDES: [Vector; 2] = [Vector::DIAG_UP, Vector::DIAG_DOWN];
const QUEEN_SLIDES: [Vector; 4] = [
    Vector::RIGHT,
    Vector::UP,
    Vector::DIAG_UP,
    Vector::DIAG_DOWN,
];
const KNIGHTRIDER_SLIDES: [Vector; 4] = [
    Vector::new(1, 2),
    Vector::new(2, 1),
    Vector::new(1, -2),
    Vector::new(2, -1),
];

static REGISTRY: Lazy<HashMap<RawType, PieceMoveset>> = Lazy::new(|| {
    use RawType::*;
    let mut registry = HashMap::new();
    registry.insert(
        Pawn,
        PieceMoveset::new().with_special(special::pawn_special as SpecialFn),
    );
    registry.insert(Knight, PieceMoveset::new().with_jumps(&KNIGHT_JUMPS));
    registry.insert(Hawk, PieceMoveset::new().with_jumps(&HAWK_JUMPS));
    registry.insert(
        King,
        PieceMoveset::new()
            .with_jumps(&KING_JUMPS)
            .with_special(special::castle_special as SpecialFn),
    );
    registry.insert(Guard, PieceMoveset::new().with_jumps(&KING_JUMPS));
    registry.insert(Rook, PieceMoveset::new().with_slides(&ROOK_SLIDES));
    registry.insert(Bishop, PieceMoveset::new().with_slides(&BISHOP_SLIDES));
    registry.insert(Queen, PieceMoveset::new().with_slides(&QUEEN_SLIDES));
    registry.insert(RoyalQueen, PieceMoveset::new().with_slides(&QUEEN_SLIDES));
    registry.insert(
        Chancellor,
        PieceMoveset::new()
            .with_jumps(&KNIGHT_JUMPS)
            .with_slides(&ROOK_SLIDES),
    );
    registry.insert(
        Archbishop,
        PieceMoveset::new()
            .with_jumps(&KNIGHT_JUMPS)
            .with_slides(&BISHOP_SLIDES),
    );
    registry.insert(
        Amazon,
        PieceMoveset::new()
            .with_jumps(&KNIGHT_JUMPS)
            .with_slides(&QUEEN_SLIDES),
    );
    registry.insert(
        Centaur,
        PieceMoveset::new()
            .with_jumps(&KING_JUMPS)
            .with_jumps(&KNIGHT_JUMPS),
    );
    registry.insert(
        RoyalCentaur,
        PieceMoveset::new()
            .with_jumps(&KING_JUMPS)
            .with_jumps(&KNIGHT_JUMPS)
            .with_special(special::castle_special as SpecialFn),
    );
    registry.insert(
        Knightrider,
        PieceMoveset::new().with_slides(&KNIGHTRIDER_SLIDES),
    );
    registry.insert(
        Huygen,
        PieceMoveset::new()
            .with_slides(&ROOK_SLIDES)
            .with_blocking(huygen_blocking as BlockingFn)
            .with_ignore(huygen_ignore as IgnoreFn),
    );
    registry.insert(
        Rose,
        PieceMoveset::new().with_special(special::rose_special as SpecialFn),
    );
    registry.insert(Obstacle, PieceMoveset::new());
    registry.insert(Void, PieceMoveset::new());
    registry
});

/// The full moveset registry. Games hold a trimmed copy; the registry
/// itself is read-only configuration.
pub fn registry() -> &'static HashMap<RawType, PieceMoveset> {
    &REGISTRY
}

/// Movesets restricted to the raw types actually present in a game
/// (including its promotion options).
pub fn trimmed(existing: &HashSet<RawType>) -> HashMap<RawType, PieceMoveset> {
    REGISTRY
        .iter()
        .filter(|(raw, _)| existing.contains(raw))
        .map(|(raw, moveset)| (*raw, moveset.clone()))
        .collect()
}

/// Union of every slide vector in the given movesets, sorted for
/// deterministic iteration. These are the only directions rays are ever
/// cast along.
pub fn slides_in(movesets: &HashMap<RawType, PieceMoveset>) -> Vec<Vector> {
    let mut slides: Vec<Vector> = movesets
        .values()
        .flat_map(|m| m.sliding.keys().copied())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    slides.sort();
    slides
}

/// Which raw types could deliver a jump capture from each relative offset.
/// Offsets are measured from the attacked square to the attacker.
pub fn build_vicinity(movesets: &HashMap<RawType, PieceMoveset>) -> HashMap<Offset, Vec<RawType>> {
    let mut vicinity: HashMap<Offset, Vec<RawType>> = HashMap::new();
    for (raw, moveset) in movesets {
        for offset in &moveset.individual {
            let entry = vicinity.entry(offset.negated()).or_default();
            if !entry.contains(raw) {
                entry.push(*raw);
            }
        }
    }
    for types in vicinity.values_mut() {
        types.sort();
    }
    vicinity
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::material::Material;

    #[test]
    fn test_registry_covers_every_raw_type() {
        use strum::IntoEnumIterator;
        for raw in RawType::iter() {
            assert!(registry().contains_key(&raw), "missing moveset for {raw}");
        }
    }

    #[test]
    fn test_colinear_classification() {
        assert!(registry()[&RawType::Knightrider].is_colinear());
        assert!(registry()[&RawType::Huygen].is_colinear());
        assert!(!registry()[&RawType::Queen].is_colinear());
        assert!(!registry()[&RawType::Knight].is_colinear());
    }

    #[test]
    fn test_trimmed_drops_absent_types() {
        let existing = HashSet::from([RawType::Pawn, RawType::King]);
        let trimmed = trimmed(&existing);
        assert_eq!(trimmed.len(), 2);
        assert!(trimmed.contains_key(&RawType::Pawn));
        assert!(!trimmed.contains_key(&RawType::Queen));
    }

    #[test]
    fn test_slides_union() {
        let existing = HashSet::from([RawType::Rook, RawType::Bishop, RawType::Knightrider]);
        let slides = slides_in(&trimmed(&existing));
        assert_eq!(slides.len(), 8);
        assert!(slides.contains(&Vector::new(2, 1)));
        assert!(slides.contains(&Vector::RIGHT));
    }

    #[test]
    fn test_vicinity_contains_knight_offsets() {
        let existing = HashSet::from([RawType::Knight, RawType::Guard]);
        let vicinity = build_vicinity(&trimmed(&existing));
        assert_eq!(
            vicinity[&Offset::new(2, 1)],
            vec![RawType::Knight],
        );
        assert_eq!(
            vicinity[&Offset::new(1, 1)],
            vec![RawType::Guard],
        );
    }

    #[test]
    fn test_default_blocking_rules() {
        let enemy = Piece {
            material: Material::BQ,
            coords: Coord::at(3, 3),
            index: 0,
        };
        let friend = Piece {
            material: Material::WN,
            coords: Coord::at(4, 4),
            index: 0,
        };
        let start = Coord::at(0, 0);
        assert_eq!(
            default_blocking(Player::White, &enemy, &start, false),
            Blocking::OnSquare
        );
        assert_eq!(
            default_blocking(Player::White, &friend, &start, false),
            Blocking::BeforeSquare
        );
        // Premoves pass through pieces but never through voids.
        assert_eq!(
            default_blocking(Player::White, &enemy, &start, true),
            Blocking::None
        );
        let void = Piece {
            material: Material::neutral(RawType::Void),
            coords: Coord::at(5, 5),
            index: 0,
        };
        assert_eq!(
            default_blocking(Player::White, &void, &start, true),
            Blocking::BeforeSquare
        );
    }

    #[test]
    fn test_huygen_hooks() {
        let start = Coord::at(0, 0);
        assert!(huygen_ignore(&start, &Coord::at(5, 0)));
        assert!(!huygen_ignore(&start, &Coord::at(4, 0)));
        let not_prime_away = Piece {
            material: Material::BR,
            coords: Coord::at(4, 0),
            index: 0,
        };
        assert_eq!(
            huygen_blocking(Player::White, &not_prime_away, &start, false),
            Blocking::None
        );
        let prime_away = Piece {
            material: Material::BR,
            coords: Coord::at(5, 0),
            index: 0,
        };
        assert_eq!(
            huygen_blocking(Player::White, &prime_away, &start, false),
            Blocking::OnSquare
        );
    }
}
