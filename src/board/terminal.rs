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

//! Terminal-state detection: checkmate and stalemate by exhausting the
//! side to move, insufficient material by scenario lookup, and the
//! move-rule draw. Checkmate detection declines to answer when Huygens
//! interact with the check, since their leaps over non-prime squares break
//! the blocking analysis, and a wrong "mate" is worse than no answer.

use num_integer::Integer;
use num_traits::Zero;
use once_cell::sync::Lazy;
use std::collections::HashMap;

use super::legal::{calculate_all, has_atleast_1_move};
use super::material::{Player, RawType};
use super::organized::Piece;
use super::{Game, WinCondition};

/// Beyond these piece or royal counts, callers are expected to swap the
/// `checkmate` win condition for `royalcapture`; exhausting every move
/// of an army this size is not practical.
pub const PIECE_COUNT_TO_DISABLE_CHECKMATE: usize = 50_000;
pub const ROYAL_COUNT_TO_DISABLE_CHECKMATE: usize = 2;

/// Whether the side to move is checkmated or stalemated. `None` means
/// the game is not over by this rule, including the Huygen positions
/// the algorithm cannot conclude safely.
pub fn detect_checkmate_or_stalemate(game: &mut Game) -> Option<String> {
    let color = game.whos_turn;

    if game.board.colinears_present() && game.is_in_check() && huygens_confound_check(game, color)
    {
        return None;
    }

    let pieces: Vec<Piece> = game.board.pieces.pieces_of(color).collect();
    for piece in pieces {
        let legal = calculate_all(game, &piece);
        if has_atleast_1_move(game, &piece, &legal) {
            return None;
        }
    }

    if game.is_in_check() && game.rules.can_win_by(!color, WinCondition::Checkmate) {
        Some(format!("{} checkmate", (!color).number()))
    } else {
        Some("0 stalemate".to_string())
    }
}

/// A Huygen attacker, or a friendly Huygen sitting on an attacker-royal
/// ray, can leap into or out of the blocking analysis at prime
/// distances the resolver does not model.
fn huygens_confound_check(game: &Game, color: Player) -> bool {
    let attackers = &game.board.state.local.attackers;
    for attacker in attackers {
        if let Some(piece) = game.board.pieces.piece_at(&attacker.coords) {
            if piece.material.raw() == RawType::Huygen {
                return true;
            }
        }
    }
    let huygens: Vec<Piece> = game
        .board
        .pieces
        .pieces_of(color)
        .filter(|piece| piece.material.raw() == RawType::Huygen)
        .collect();
    if huygens.is_empty() {
        return false;
    }
    for attacker in attackers.iter().filter(|attacker| attacker.slid) {
        for royal in &game.board.state.local.in_check {
            let Some(ray) = game
                .board
                .pieces
                .slides()
                .iter()
                .copied()
                .find(|&vector| attacker.coords.steps_to(royal, vector).is_some())
            else {
                continue;
            };
            for huygen in &huygens {
                if attacker.coords.steps_to(&huygen.coords, ray).is_some() {
                    return true;
                }
            }
        }
    }
    false
}

/// Census key of one non-royal piece; bishops split by square parity
/// because same-parity bishops never meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CensusKey {
    Raw(RawType),
    LightBishop,
    DarkBishop,
}

type Scenario = HashMap<CensusKey, u32>;

const ANY: u32 = u32::MAX;

/// Armies that cannot force mate against a lone king on the open plane.
/// Without an edge to drive the king against, a single major piece (and
/// most single fairy pieces) can check forever but never finish.
static INSUFFICIENT_VS_LONE_ROYAL_OPEN: Lazy<Vec<Scenario>> = Lazy::new(|| {
    use CensusKey::*;
    use RawType::*;
    vec![
        HashMap::from([(Raw(Knight), 2)]),
        HashMap::from([(LightBishop, ANY)]),
        HashMap::from([(DarkBishop, ANY)]),
        HashMap::from([(LightBishop, 1), (DarkBishop, 1)]),
        HashMap::from([(Raw(Knight), 1), (LightBishop, 1)]),
        HashMap::from([(Raw(Knight), 1), (DarkBishop, 1)]),
        HashMap::from([(Raw(Rook), 1)]),
        HashMap::from([(Raw(Queen), 1)]),
        HashMap::from([(Raw(Hawk), 1)]),
        HashMap::from([(Raw(Rose), 1)]),
        HashMap::from([(Raw(Knightrider), 1)]),
        HashMap::from([(Raw(Huygen), 1)]),
        HashMap::from([(Raw(Guard), 1)]),
        HashMap::from([(Raw(Archbishop), 1)]),
        HashMap::from([(Raw(Chancellor), 1)]),
        HashMap::from([(Raw(Centaur), 1)]),
    ]
});

/// The classical table for worlds with a border: the corner exists, so a
/// lone rook or queen mates again and only the familiar minor-piece
/// endings stay dead.
static INSUFFICIENT_VS_LONE_ROYAL_BORDERED: Lazy<Vec<Scenario>> = Lazy::new(|| {
    use CensusKey::*;
    use RawType::*;
    vec![
        HashMap::from([(Raw(Knight), 2)]),
        HashMap::from([(LightBishop, ANY)]),
        HashMap::from([(DarkBishop, ANY)]),
    ]
});

/// Draw by insufficient material, as `"0 insuffmat"`. Only answered for
/// two-royal checkmate games; promotion potential short-circuits.
pub fn detect_insufficient_material(game: &Game) -> Option<String> {
    let rules = &game.rules;
    for player in [Player::White, Player::Black] {
        if !rules.can_win_by(player, WinCondition::Checkmate) {
            return None;
        }
    }
    if game.board.pieces.royals_of(Player::White).len() != 1
        || game.board.pieces.royals_of(Player::Black).len() != 1
    {
        return None;
    }
    if !rules.promotions_allowed.is_empty() {
        let any_pawn = game
            .board
            .pieces
            .iter_pieces()
            .any(|piece| piece.material.raw().is_pawn());
        if any_pawn {
            return None;
        }
    }

    let bordered = game.board.playable_region().is_some();
    let white = census(game, Player::White);
    let black = census(game, Player::Black);
    let insufficient = match (white.is_empty(), black.is_empty()) {
        (true, true) => true,
        (false, true) => covered_by_any(&white, bordered),
        (true, false) => covered_by_any(&black, bordered),
        (false, false) => lone_minor(&white) && lone_minor(&black),
    };
    insufficient.then(|| "0 insuffmat".to_string())
}

fn census(game: &Game, player: Player) -> Scenario {
    let mut counts: Scenario = HashMap::new();
    for piece in game.board.pieces.pieces_of(player) {
        if piece.material.is_royal() {
            continue;
        }
        let key = match piece.material.raw() {
            RawType::Bishop => {
                if (&piece.coords.x + &piece.coords.y).mod_floor(&2.into()).is_zero() {
                    CensusKey::LightBishop
                } else {
                    CensusKey::DarkBishop
                }
            }
            raw => CensusKey::Raw(raw),
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

fn covered_by_any(counts: &Scenario, bordered: bool) -> bool {
    let table = if bordered {
        &INSUFFICIENT_VS_LONE_ROYAL_BORDERED
    } else {
        &INSUFFICIENT_VS_LONE_ROYAL_OPEN
    };
    table.iter().any(|scenario| covered_by(counts, scenario))
}

fn covered_by(counts: &Scenario, scenario: &Scenario) -> bool {
    counts
        .iter()
        .all(|(key, count)| *count <= scenario.get(key).copied().unwrap_or(0))
}

fn lone_minor(counts: &Scenario) -> bool {
    let total: u32 = counts.values().sum();
    total <= 1
        && counts.keys().all(|key| {
            matches!(
                key,
                CensusKey::Raw(RawType::Knight) | CensusKey::LightBishop | CensusKey::DarkBishop
            )
        })
}

/// The conclusion the position itself dictates, if any: royal capture,
/// checkmate, stalemate, insufficient material, then the move rule.
/// Server-side conclusions (time, resignation, abort) live upstream.
pub fn get_game_conclusion(game: &mut Game) -> Option<String> {
    let color = game.whos_turn;
    if game.board.pieces.royals_of(color).is_empty()
        && game.rules.can_win_by(!color, WinCondition::RoyalCapture)
    {
        return Some(format!("{} royalcapture", (!color).number()));
    }
    if let Some(conclusion) = detect_checkmate_or_stalemate(game) {
        return Some(conclusion);
    }
    if let Some(conclusion) = detect_insufficient_material(game) {
        return Some(conclusion);
    }
    if let (Some(limit), Some(state)) = (
        game.rules.move_rule,
        game.board.state.global.move_rule_state,
    ) {
        if state >= limit {
            return Some("0 moverule".to_string());
        }
    }
    None
}
