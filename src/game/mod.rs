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

#[cfg(feature = "random")]
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::board::Player;

mod clock;
pub use clock::*;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct GameId(u64);

impl GameId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }
    #[cfg(feature = "random")]
    pub fn random() -> Self {
        Self(thread_rng().gen())
    }
}

/// How a game ended. The core produces and verifies the first five; the
/// rest come from the server (resignation, time, abort, agreement) and
/// pass through as opaque strings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Conclusion {
    Checkmate(Player),
    RoyalCapture(Player),
    Stalemate,
    InsufficientMaterial,
    MoveRule,
    Server(String),
}

impl Conclusion {
    /// Parse a conclusion string: a player number (0 for draws) and a
    /// reason word.
    pub fn parse(text: &str) -> Option<Self> {
        let (number, reason) = text.split_once(' ')?;
        let number: u8 = number.parse().ok()?;
        let conclusion = match reason {
            "checkmate" => Conclusion::Checkmate(Player::from_number(number)?),
            "royalcapture" => Conclusion::RoyalCapture(Player::from_number(number)?),
            "stalemate" => Conclusion::Stalemate,
            "insuffmat" => Conclusion::InsufficientMaterial,
            "moverule" => Conclusion::MoveRule,
            _ => Conclusion::Server(text.to_string()),
        };
        Some(conclusion)
    }

    /// Decisive conclusions are dictated by the position and must be
    /// verifiable by replaying the move; the server-side ones are not.
    pub fn is_decisive(&self) -> bool {
        !matches!(self, Conclusion::Server(_))
    }

    pub fn winner(&self) -> Option<Player> {
        match self {
            Conclusion::Checkmate(player) | Conclusion::RoyalCapture(player) => Some(*player),
            _ => None,
        }
    }
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conclusion::Checkmate(player) => write!(f, "{} checkmate", player.number()),
            Conclusion::RoyalCapture(player) => write!(f, "{} royalcapture", player.number()),
            Conclusion::Stalemate => write!(f, "0 stalemate"),
            Conclusion::InsufficientMaterial => write!(f, "0 insuffmat"),
            Conclusion::MoveRule => write!(f, "0 moverule"),
            Conclusion::Server(text) => write!(f, "{text}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_core_conclusions() {
        assert_eq!(
            Conclusion::parse("1 checkmate"),
            Some(Conclusion::Checkmate(Player::White))
        );
        assert_eq!(Conclusion::parse("0 stalemate"), Some(Conclusion::Stalemate));
        assert_eq!(
            Conclusion::parse("0 insuffmat"),
            Some(Conclusion::InsufficientMaterial)
        );
        assert_eq!(Conclusion::parse("2 checkmate").unwrap().winner(), Some(Player::Black));
    }

    #[test]
    fn test_server_conclusions_are_opaque() {
        let resignation = Conclusion::parse("2 resignation").unwrap();
        assert!(!resignation.is_decisive());
        assert_eq!(resignation.to_string(), "2 resignation");
    }

    #[test]
    fn test_round_trip() {
        for text in ["1 checkmate", "2 royalcapture", "0 stalemate", "0 moverule"] {
            let conclusion = Conclusion::parse(text).unwrap();
            assert_eq!(conclusion.to_string(), *text);
            assert!(conclusion.is_decisive());
        }
    }
}
