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

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Not;
use strum_macros::Display;
use strum_macros::EnumIter;

/// A piece of a specific player: the packed (player, raw type) pair every
/// square, change record and moveset lookup speaks in.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Material {
    player: Player,
    raw: RawType,
}

impl Material {
    pub const WK: Self = Self::white(RawType::King);
    pub const WQ: Self = Self::white(RawType::Queen);
    pub const WR: Self = Self::white(RawType::Rook);
    pub const WB: Self = Self::white(RawType::Bishop);
    pub const WN: Self = Self::white(RawType::Knight);
    pub const WP: Self = Self::white(RawType::Pawn);

    pub const BK: Self = Self::black(RawType::King);
    pub const BQ: Self = Self::black(RawType::Queen);
    pub const BR: Self = Self::black(RawType::Rook);
    pub const BB: Self = Self::black(RawType::Bishop);
    pub const BN: Self = Self::black(RawType::Knight);
    pub const BP: Self = Self::black(RawType::Pawn);

    #[inline]
    pub const fn new(player: Player, raw: RawType) -> Self {
        Self { player, raw }
    }

    #[inline]
    pub const fn white(raw: RawType) -> Self {
        Self::new(Player::White, raw)
    }

    #[inline]
    pub const fn black(raw: RawType) -> Self {
        Self::new(Player::Black, raw)
    }

    #[inline]
    pub const fn neutral(raw: RawType) -> Self {
        Self::new(Player::Neutral, raw)
    }

    #[inline]
    pub fn player(&self) -> Player {
        self.player
    }

    #[inline]
    pub fn raw(&self) -> RawType {
        self.raw
    }

    #[inline]
    pub fn is_royal(&self) -> bool {
        self.raw.is_royal()
    }

    #[inline]
    pub fn is_void(&self) -> bool {
        self.raw == RawType::Void
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.player {
            Player::White => write!(f, "{}", self.raw.abbrev()),
            Player::Black => write!(f, "{}", self.raw.abbrev().to_lowercase()),
            Player::Neutral => write!(f, "~{}", self.raw.abbrev().to_lowercase()),
        }
    }
}

use Player::{Black, Neutral, White};

#[derive(
    Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter,
)]
pub enum Player {
    White,
    Black,
    Neutral,
}

impl Player {
    /// Numeric form used by conclusion strings: `1` / `2`, draws are `0`.
    pub const fn number(&self) -> u8 {
        match self {
            White => 1,
            Black => 2,
            Neutral => 0,
        }
    }

    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(White),
            2 => Some(Black),
            _ => None,
        }
    }
}

impl Not for Player {
    type Output = Self;

    /// The opposing player. Neutral has no opponent and maps to itself.
    #[inline]
    fn not(self) -> Self {
        match self {
            White => Black,
            Black => White,
            Neutral => Neutral,
        }
    }
}

#[derive(
    Debug, Serialize, Deserialize, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter,
)]
pub enum RawType {
    Pawn,
    Knight,
    Hawk,
    King,
    Guard,
    Rook,
    Bishop,
    Queen,
    RoyalQueen,
    Chancellor,
    Archbishop,
    Amazon,
    Centaur,
    RoyalCentaur,
    Knightrider,
    Huygen,
    Rose,
    Obstacle,
    Void,
}

use RawType::*;

impl RawType {
    /// Capturing a royal is a win condition; royals are what check is
    /// measured against.
    #[inline]
    pub const fn is_royal(&self) -> bool {
        matches!(*self, King | RoyalQueen | RoyalCentaur)
    }

    /// Royals that move by finite jumps. Castling partners attach to
    /// these; the Royal Queen slides and is excluded.
    #[inline]
    pub const fn is_jumping_royal(&self) -> bool {
        matches!(*self, King | RoyalCentaur)
    }

    #[inline]
    pub const fn is_pawn(&self) -> bool {
        matches!(*self, Pawn)
    }

    /// Notation abbreviation, upper case. Single letters follow algebraic
    /// convention; fairy pieces use two letters.
    pub const fn abbrev(&self) -> &'static str {
        match *self {
            Pawn => "P",
            Knight => "N",
            Hawk => "HA",
            King => "K",
            Guard => "GU",
            Rook => "R",
            Bishop => "B",
            Queen => "Q",
            RoyalQueen => "RQ",
            Chancellor => "CH",
            Archbishop => "AR",
            Amazon => "AM",
            Centaur => "CE",
            RoyalCentaur => "RC",
            Knightrider => "NR",
            Huygen => "HU",
            Rose => "RO",
            Obstacle => "OB",
            Void => "VO",
        }
    }

    pub fn from_abbrev(s: &str) -> Option<Self> {
        let upper = s.to_ascii_uppercase();
        let raw = match upper.as_str() {
            "P" => Pawn,
            "N" => Knight,
            "HA" => Hawk,
            "K" => King,
            "GU" => Guard,
            "R" => Rook,
            "B" => Bishop,
            "Q" => Queen,
            "RQ" => RoyalQueen,
            "CH" => Chancellor,
            "AR" => Archbishop,
            "AM" => Amazon,
            "CE" => Centaur,
            "RC" => RoyalCentaur,
            "NR" => Knightrider,
            "HU" => Huygen,
            "RO" => Rose,
            "OB" => Obstacle,
            "VO" => Void,
            _ => return None,
        };
        Some(raw)
    }
}
