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

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// A square on the unbounded board. Coordinates are arbitrary-precision
/// signed integers; `Coord` is `Eq + Hash` and is used directly as the key
/// of the coordinate map and the special-rights set. The canonical text
/// form is `"x,y"`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub x: BigInt,
    pub y: BigInt,
}

impl Coord {
    #[inline]
    pub fn new(x: BigInt, y: BigInt) -> Self {
        Self { x, y }
    }

    /// Convenience constructor from machine integers.
    #[inline]
    pub fn at(x: i64, y: i64) -> Self {
        Self::new(BigInt::from(x), BigInt::from(y))
    }

    #[inline]
    pub fn from_string(name: &str) -> Self {
        Self::try_from_string(name).expect("Coord::from_string: invalid format")
    }

    pub fn try_from_string(name: &str) -> Option<Self> {
        let (x, y) = name.split_once(',')?;
        let x = BigInt::from_str(x.trim()).ok()?;
        let y = BigInt::from_str(y.trim()).ok()?;
        Some(Self::new(x, y))
    }

    /// The square `steps` slide steps away along `vector`.
    pub fn step_by(&self, vector: Vector, steps: &BigInt) -> Self {
        Self::new(
            &self.x + steps * BigInt::from(vector.dx),
            &self.y + steps * BigInt::from(vector.dy),
        )
    }

    /// Number of slide steps along `vector` carrying `self` onto `other`,
    /// if such an integral count exists.
    pub fn steps_to(&self, other: &Coord, vector: Vector) -> Option<BigInt> {
        let ddx = &other.x - &self.x;
        let ddy = &other.y - &self.y;
        if vector.dx != 0 {
            let dx = BigInt::from(vector.dx);
            let (steps, rem) = ddx.div_rem(&dx);
            if !rem.is_zero() {
                return None;
            }
            if ddy == &steps * BigInt::from(vector.dy) {
                return Some(steps);
            }
            None
        } else {
            if !ddx.is_zero() {
                return None;
            }
            let dy = BigInt::from(vector.dy);
            let (steps, rem) = ddy.div_rem(&dy);
            if rem.is_zero() {
                Some(steps)
            } else {
                None
            }
        }
    }

    /// Chebyshev (king-move) distance to `other`.
    pub fn chebyshev(&self, other: &Coord) -> BigInt {
        let dx = (&other.x - &self.x).abs();
        let dy = (&other.y - &self.y).abs();
        if dx >= dy {
            dx
        } else {
            dy
        }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

impl Add<Offset> for &Coord {
    type Output = Coord;
    fn add(self, rhs: Offset) -> Self::Output {
        Coord::new(
            &self.x + BigInt::from(rhs.x),
            &self.y + BigInt::from(rhs.y),
        )
    }
}

impl Add<Vector> for &Coord {
    type Output = Coord;
    fn add(self, rhs: Vector) -> Self::Output {
        Coord::new(
            &self.x + BigInt::from(rhs.dx),
            &self.y + BigInt::from(rhs.dy),
        )
    }
}

impl Sub for &Coord {
    type Output = (BigInt, BigInt);
    fn sub(self, rhs: &Coord) -> Self::Output {
        (&self.x - &rhs.x, &self.y - &rhs.y)
    }
}

/// A jump offset relative to a piece, as listed in a moveset's
/// `individual` table.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Offset {
    pub x: i64,
    pub y: i64,
}

impl Offset {
    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    #[inline]
    pub const fn negated(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

/// A slide direction. Stored in canonical orientation (`dx > 0`, or
/// `dx == 0 && dy > 0`) so that a direction and its opposite share one
/// sliding-table entry; steps along the vector are signed.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vector {
    pub dx: i64,
    pub dy: i64,
}

impl Vector {
    pub const fn new(dx: i64, dy: i64) -> Self {
        Self { dx, dy }
    }

    pub const RIGHT: Vector = Vector::new(1, 0);
    pub const UP: Vector = Vector::new(0, 1);
    pub const DIAG_UP: Vector = Vector::new(1, 1);
    pub const DIAG_DOWN: Vector = Vector::new(1, -1);

    #[inline]
    pub const fn is_canonical(&self) -> bool {
        self.dx > 0 || (self.dx == 0 && self.dy > 0)
    }

    /// Canonical orientation plus whether the input had to be flipped.
    pub const fn canonical(self) -> (Self, bool) {
        if self.is_canonical() {
            (self, false)
        } else {
            (Self::new(-self.dx, -self.dy), true)
        }
    }

    /// A vector is a unit direction when each component is at most one
    /// square. Slides along anything longer can leap over pieces that sit
    /// on the same geometric line but a different step lattice.
    #[inline]
    pub const fn is_unit(&self) -> bool {
        self.dx.abs() <= 1 && self.dy.abs() <= 1
    }

    #[inline]
    pub const fn is_horizontal(&self) -> bool {
        self.dy == 0
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.dx, self.dy)
    }
}

/// Identifies one slide line under a given vector. `c` is the line
/// constant `dy·x − dx·y`, shared by every point on the geometric line;
/// `r` is the residue of the coordinate along the major axis, which keeps
/// apart the disjoint step lattices a non-unit vector carves out of one
/// geometric line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    c: BigInt,
    r: i64,
}

impl LineKey {
    /// Line key for the line through `point` with slope `vector`.
    /// Two points get equal keys under the same vector iff one is
    /// reachable from the other by whole steps of that vector.
    pub fn from_line(vector: Vector, point: &Coord) -> Self {
        let dx = BigInt::from(vector.dx);
        let dy = BigInt::from(vector.dy);
        let c = &dy * &point.x - &dx * &point.y;
        let r = if vector.dx != 0 {
            point.x.mod_floor(&dx)
        } else {
            point.y.mod_floor(&dy)
        };
        // Residue of a BigInt by a small modulus always fits.
        let r = r.to_i64().expect("LineKey residue out of range");
        Self { c, r }
    }
}

/// Axis-aligned playable region. Boards without a world border have no
/// region and every square is playable.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Region {
    pub left: BigInt,
    pub right: BigInt,
    pub bottom: BigInt,
    pub top: BigInt,
}

impl Region {
    pub fn new(left: i64, right: i64, bottom: i64, top: i64) -> Self {
        Self {
            left: BigInt::from(left),
            right: BigInt::from(right),
            bottom: BigInt::from(bottom),
            top: BigInt::from(top),
        }
    }

    pub fn contains(&self, coord: &Coord) -> bool {
        coord.x >= self.left && coord.x <= self.right && coord.y >= self.bottom && coord.y <= self.top
    }

    /// Whole slide steps from `origin` (inside the region) along
    /// `vector`, orientation `sign` (+1/−1), before the border is crossed.
    /// The intersection of the ray with the border is exact: each axis
    /// contributes `⌊axis distance / |component|⌋` and the nearer border
    /// wins.
    pub fn steps_to_border(&self, origin: &Coord, vector: Vector, sign: i64) -> BigInt {
        debug_assert!(self.contains(origin));
        debug_assert!(sign == 1 || sign == -1);
        let mut limit: Option<BigInt> = None;
        let dx = vector.dx * sign;
        let dy = vector.dy * sign;
        if dx > 0 {
            Self::tighten(&mut limit, (&self.right - &origin.x).div_floor(&BigInt::from(dx)));
        } else if dx < 0 {
            Self::tighten(&mut limit, (&origin.x - &self.left).div_floor(&BigInt::from(-dx)));
        }
        if dy > 0 {
            Self::tighten(&mut limit, (&self.top - &origin.y).div_floor(&BigInt::from(dy)));
        } else if dy < 0 {
            Self::tighten(&mut limit, (&origin.y - &self.bottom).div_floor(&BigInt::from(-dy)));
        }
        limit.expect("steps_to_border: zero vector")
    }

    fn tighten(limit: &mut Option<BigInt>, candidate: BigInt) {
        match limit {
            Some(current) if *current <= candidate => {}
            _ => *limit = Some(candidate),
        }
    }
}

/// Miller–Rabin primality test, deterministic for every input below
/// 3.3·10²³ and overwhelmingly accurate beyond. The Huygen's movement
/// hooks call this on Chebyshev distances.
pub fn is_prime(n: &BigInt) -> bool {
    const WITNESSES: [u32; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    let two = BigInt::from(2);
    if n < &two {
        return false;
    }
    for w in WITNESSES {
        let w = BigInt::from(w);
        if *n == w {
            return true;
        }
        if (n % &w).is_zero() {
            return false;
        }
    }
    // n − 1 = d · 2^s with d odd
    let n_minus_one = n - BigInt::one();
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }
    'witness: for w in WITNESSES {
        let mut x = BigInt::from(w).modpow(&d, n);
        if x.is_one() || x == n_minus_one {
            continue;
        }
        for _ in 1..s {
            x = x.modpow(&two, n);
            if x == n_minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_round_trip() {
        let coord = Coord::at(-12, 345);
        let parsed = Coord::try_from_string(&coord.to_string()).unwrap();
        assert_eq!(parsed, coord);
    }

    #[test]
    fn test_coord_parse_huge() {
        let text = "123456789012345678901234567890,-9876543210987654321";
        let coord = Coord::try_from_string(text).unwrap();
        assert_eq!(coord.to_string(), text);
    }

    #[test]
    fn test_coord_parse_invalid() {
        assert!(Coord::try_from_string("5").is_none());
        assert!(Coord::try_from_string("a,b").is_none());
        assert!(Coord::try_from_string("").is_none());
    }

    #[test]
    fn test_steps_to_along_diagonal() {
        let from = Coord::at(2, 2);
        let to = Coord::at(7, 7);
        assert_eq!(from.steps_to(&to, Vector::DIAG_UP), Some(BigInt::from(5)));
        assert_eq!(to.steps_to(&from, Vector::DIAG_UP), Some(BigInt::from(-5)));
    }

    #[test]
    fn test_steps_to_off_line() {
        let from = Coord::at(0, 0);
        assert_eq!(from.steps_to(&Coord::at(3, 4), Vector::DIAG_UP), None);
        assert_eq!(from.steps_to(&Coord::at(1, 0), Vector::new(2, 1)), None);
    }

    #[test]
    fn test_steps_to_knightrider_vector() {
        let from = Coord::at(0, 0);
        let v = Vector::new(2, 1);
        assert_eq!(from.steps_to(&Coord::at(6, 3), v), Some(BigInt::from(3)));
        assert_eq!(from.steps_to(&Coord::at(4, 3), v), None);
    }

    #[test]
    fn test_canonical_vector() {
        assert_eq!(Vector::new(-1, 0).canonical(), (Vector::new(1, 0), true));
        assert_eq!(Vector::new(0, -1).canonical(), (Vector::new(0, 1), true));
        assert_eq!(Vector::new(1, -1).canonical(), (Vector::new(1, -1), false));
        assert_eq!(Vector::new(-2, -1).canonical(), (Vector::new(2, 1), true));
    }

    #[test]
    fn test_line_key_equal_for_collinear() {
        let v = Vector::DIAG_UP;
        let a = LineKey::from_line(v, &Coord::at(3, 5));
        let b = LineKey::from_line(v, &Coord::at(-100, -98));
        assert_eq!(a, b);
    }

    #[test]
    fn test_line_key_distinguishes_parallels() {
        let v = Vector::RIGHT;
        let a = LineKey::from_line(v, &Coord::at(4, 1));
        let b = LineKey::from_line(v, &Coord::at(4, 2));
        assert_ne!(a, b);
    }

    #[test]
    fn test_line_key_splits_step_lattices() {
        // (2,0) slides on y = 0 come in two interleaved lattices; a piece
        // on one can never land on the other.
        let v = Vector::new(2, 0);
        let even = LineKey::from_line(v, &Coord::at(0, 0));
        let also_even = LineKey::from_line(v, &Coord::at(6, 0));
        let odd = LineKey::from_line(v, &Coord::at(3, 0));
        assert_eq!(even, also_even);
        assert_ne!(even, odd);
    }

    #[test]
    fn test_line_key_negative_coordinates() {
        let v = Vector::new(2, 1);
        let a = LineKey::from_line(v, &Coord::at(-4, -2));
        let b = LineKey::from_line(v, &Coord::at(2, 1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_region_steps_to_border() {
        let region = Region::new(-10, 10, -10, 10);
        let origin = Coord::at(4, 0);
        assert_eq!(
            region.steps_to_border(&origin, Vector::RIGHT, 1),
            BigInt::from(6)
        );
        assert_eq!(
            region.steps_to_border(&origin, Vector::RIGHT, -1),
            BigInt::from(14)
        );
        assert_eq!(
            region.steps_to_border(&origin, Vector::new(2, 1), 1),
            BigInt::from(3)
        );
    }

    #[test]
    fn test_is_prime_small() {
        let primes = [2i64, 3, 5, 7, 11, 13, 101, 7919];
        let composites = [0i64, 1, 4, 6, 8, 9, 100, 7917];
        for p in primes {
            assert!(is_prime(&BigInt::from(p)), "{p} should be prime");
        }
        for c in composites {
            assert!(!is_prime(&BigInt::from(c)), "{c} should not be prime");
        }
    }

    #[test]
    fn test_is_prime_large() {
        // 2^61 − 1 is a Mersenne prime.
        let p = (BigInt::from(1) << 61) - 1;
        assert!(is_prime(&p));
        assert!(!is_prime(&(p + 1)));
    }
}
