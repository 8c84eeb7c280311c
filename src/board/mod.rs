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

//! Board core for chess on an unbounded plane.
//!
//! A _game_ owns a board, its rules and its move list, and provides the
//! mechanisms to generate, validate, play and unwind moves. Supported:
//!
//! [x] Arbitrary-precision coordinates; play anywhere on the plane
//! [x] Fairy pieces (Hawk, Huygen, Rose, Amazon, Knightrider, ...)
//! [x] Data-driven movesets with blocking/ignore/special hooks
//! [x] Optional world borders clamping every slide
//! [x] Castling with discovered partners at any distance
//! [x] En passant, promotion to any allowed type
//! [x] Reversible change journal; make/unmake and history navigation
//! [x] Check, checkmate, stalemate and insufficient-material detection
//! [x] Configurable move rule and two-player clocks
//! [ ] Repetition draws (positions repeat rarely on an infinite board)
//! [ ] Zero-knowledge puzzle legality
//!
//! Some of the key abstractions:
//!
//! * A `Coord` is a pair of big integers naming one square. There is no
//!   edge to fall off; a `Region`, when a variant sets one, is the only
//!   boundary.
//!
//! * `OrganizedPieces` stores every piece in columnar arrays with two
//!   indices over them: a map from square to piece, and per slide vector
//!   a bucket of the pieces sharing each slide line. All legality
//!   questions reduce to point lookups plus bucket scans.
//!
//! * A `PieceMoveset` describes how a raw type moves: jump offsets, a
//!   sliding table with per-direction bounds, and optional blocking,
//!   ignore and special-move hooks. Pieces are data; nothing subclasses.
//!
//! * A `Move` is a draft (start, end, promotion) fleshed out with a
//!   journal of `Change`s and state deltas. Applying the journal forward
//!   makes the move; applying it backward unmakes it exactly. Check
//!   status and attackers are recorded as local state so navigation
//!   restores them without recomputation.
//!
//! * `Game` is the ownership root: board, rules, move list, whose turn.
//!   Nothing is shared between games and nothing at module level is
//!   mutable.

use num_bigint::BigInt;
use std::collections::{HashMap, HashSet};

mod changes;
mod check;
mod coords;
mod legal;
mod material;
mod movepiece;
mod moveset;
mod notation;
mod organized;
mod special;
mod state;
mod terminal;
mod validation;

pub use changes::*;
pub use check::*;
pub use coords::*;
pub use legal::*;
pub use material::*;
pub use movepiece::*;
pub use moveset::*;
pub use notation::*;
pub use organized::*;
pub use special::*;
pub use state::*;
pub use terminal::*;
pub use validation::*;

use material::RawType::*;

/// Ways a player can win. A player's set lists the conditions their
/// opponent can be beaten by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WinCondition {
    Checkmate,
    RoyalCapture,
}

/// Variant configuration, fixed for the lifetime of a game.
#[derive(Debug, Clone)]
pub struct GameRules {
    pub turn_order: Vec<Player>,
    pub promotion_ranks: HashMap<Player, Vec<BigInt>>,
    pub promotions_allowed: Vec<RawType>,
    pub win_conditions: HashMap<Player, HashSet<WinCondition>>,
    /// Halfmove limit of the move rule, if the variant has one.
    pub move_rule: Option<u32>,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            turn_order: vec![Player::White, Player::Black],
            promotion_ranks: HashMap::from([
                (Player::White, vec![BigInt::from(8)]),
                (Player::Black, vec![BigInt::from(1)]),
            ]),
            promotions_allowed: vec![Queen, Rook, Bishop, Knight],
            win_conditions: HashMap::from([
                (Player::White, HashSet::from([WinCondition::Checkmate])),
                (Player::Black, HashSet::from([WinCondition::Checkmate])),
            ]),
            move_rule: Some(100),
        }
    }
}

impl GameRules {
    /// The player to move once `move_count` moves have been played.
    pub fn player_at(&self, move_count: usize) -> Player {
        self.turn_order[move_count % self.turn_order.len()]
    }

    pub fn promotion_ranks_of(&self, player: Player) -> &[BigInt] {
        self.promotion_ranks
            .get(&player)
            .map(|ranks| ranks.as_slice())
            .unwrap_or(&[])
    }

    pub fn can_win_by(&self, player: Player, condition: WinCondition) -> bool {
        self.win_conditions
            .get(&player)
            .is_some_and(|set| set.contains(&condition))
    }
}

/// Position-scoped state: rebuilt or journal-restored on every step
/// through the move list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalState {
    /// Number of moves currently applied to the board.
    pub move_count: usize,
    /// Squares of the side-to-move's royals under attack; empty when not
    /// in check.
    pub in_check: Vec<Coord>,
    pub attackers: Vec<Attacker>,
}

/// Game-scoped state: survives navigation, mutated only through global
/// state changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalState {
    pub enpassant: Option<EnPassant>,
    pub special_rights: HashSet<Coord>,
    pub move_rule_state: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameState {
    pub local: LocalState,
    pub global: GlobalState,
}

/// The starting position and global state, kept pristine for replay and
/// notation. Not recorded in editor mode.
#[derive(Debug, Clone)]
pub struct StartSnapshot {
    pub position: HashMap<Coord, Material>,
    pub global: GlobalState,
}

/// Everything needed to open a game. `standard()` is classical chess on
/// the unbounded plane.
#[derive(Debug, Clone)]
pub struct Setup {
    pub position: HashMap<Coord, Material>,
    pub rules: GameRules,
    pub special_rights: HashSet<Coord>,
    pub enpassant: Option<EnPassant>,
    pub move_rule_state: Option<u32>,
    pub playable_region: Option<Region>,
    pub editor: bool,
}

impl Setup {
    pub fn new(position: HashMap<Coord, Material>, rules: GameRules) -> Self {
        Self {
            position,
            rules,
            special_rights: HashSet::new(),
            enpassant: None,
            move_rule_state: Some(0),
            playable_region: None,
            editor: false,
        }
    }

    /// The classical starting position: back ranks on 1 and 8, pawns on
    /// 2 and 7, every pawn, corner rook and king holding its special
    /// right.
    pub fn standard() -> Self {
        let mut position = HashMap::new();
        let mut special_rights = HashSet::new();
        let back: [RawType; 8] = [Rook, Knight, Bishop, Queen, King, Bishop, Knight, Rook];
        for (i, raw) in back.iter().enumerate() {
            let x = i as i64 + 1;
            position.insert(Coord::at(x, 1), Material::white(*raw));
            position.insert(Coord::at(x, 8), Material::black(*raw));
            position.insert(Coord::at(x, 2), Material::WP);
            position.insert(Coord::at(x, 7), Material::BP);
            special_rights.insert(Coord::at(x, 2));
            special_rights.insert(Coord::at(x, 7));
        }
        for x in [1i64, 8] {
            special_rights.insert(Coord::at(x, 1));
            special_rights.insert(Coord::at(x, 8));
        }
        special_rights.insert(Coord::at(5, 1));
        special_rights.insert(Coord::at(5, 8));
        let mut setup = Self::new(position, GameRules::default());
        setup.special_rights = special_rights;
        setup
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.playable_region = Some(region);
        self
    }
}

/// The board: the organized piece store plus every read-only table the
/// legality pipeline consults, and the game state the journals mutate.
#[derive(Debug, Clone)]
pub struct Board {
    pub pieces: OrganizedPieces,
    pub state: GameState,
    movesets: HashMap<RawType, PieceMoveset>,
    vicinity: HashMap<Offset, Vec<RawType>>,
    special_vicinity: HashMap<Offset, Vec<RawType>>,
    colinears_present: bool,
    existing_types: HashSet<Material>,
    existing_raw_types: HashSet<RawType>,
    playable_region: Option<Region>,
    editor: bool,
    start_snapshot: Option<StartSnapshot>,
}

impl Board {
    pub fn moveset_of(&self, raw: RawType) -> Option<&PieceMoveset> {
        self.movesets.get(&raw)
    }

    pub fn movesets(&self) -> &HashMap<RawType, PieceMoveset> {
        &self.movesets
    }

    pub fn vicinity(&self) -> &HashMap<Offset, Vec<RawType>> {
        &self.vicinity
    }

    pub fn special_vicinity(&self) -> &HashMap<Offset, Vec<RawType>> {
        &self.special_vicinity
    }

    #[inline]
    pub fn colinears_present(&self) -> bool {
        self.colinears_present
    }

    pub fn existing_types(&self) -> &HashSet<Material> {
        &self.existing_types
    }

    pub fn existing_raw_types(&self) -> &HashSet<RawType> {
        &self.existing_raw_types
    }

    pub fn playable_region(&self) -> Option<&Region> {
        self.playable_region.as_ref()
    }

    #[inline]
    pub fn editor(&self) -> bool {
        self.editor
    }

    pub fn start_snapshot(&self) -> Option<&StartSnapshot> {
        self.start_snapshot.as_ref()
    }

    /// A square is playable when no world border excludes it.
    pub fn is_in_bounds(&self, coord: &Coord) -> bool {
        self.playable_region
            .as_ref()
            .map_or(true, |region| region.contains(coord))
    }

    pub fn has_special_right(&self, coord: &Coord) -> bool {
        self.state.global.special_rights.contains(coord)
    }
}

/// The ownership root of one game.
#[derive(Debug, Clone)]
pub struct Game {
    pub board: Board,
    pub rules: GameRules,
    pub moves: Vec<Move>,
    pub whos_turn: Player,
}

impl Game {
    pub fn new(setup: Setup) -> Self {
        let Setup {
            position,
            rules,
            special_rights,
            enpassant,
            move_rule_state,
            playable_region,
            editor,
        } = setup;

        let mut existing_types: HashSet<Material> = position.values().copied().collect();
        for player in &rules.turn_order {
            for raw in &rules.promotions_allowed {
                existing_types.insert(Material::new(*player, *raw));
            }
        }
        let mut existing_raw_types: HashSet<RawType> =
            position.values().map(|material| material.raw()).collect();
        existing_raw_types.extend(rules.promotions_allowed.iter().copied());

        let movesets = moveset::trimmed(&existing_raw_types);
        let slides = moveset::slides_in(&movesets);
        let colinears_present = movesets.values().any(|moveset| moveset.is_colinear());
        let vicinity = moveset::build_vicinity(&movesets);
        let special_vicinity = special::build_special_vicinity(&existing_raw_types);

        let mut growable: HashSet<Material> = HashSet::new();
        if editor {
            growable.extend(position.values().copied());
        }
        for player in &rules.turn_order {
            for raw in &rules.promotions_allowed {
                growable.insert(Material::new(*player, *raw));
            }
        }

        let pieces =
            OrganizedPieces::process_initial_position(&position, slides, growable);

        let global = GlobalState {
            enpassant,
            special_rights,
            move_rule_state: rules.move_rule.and(move_rule_state),
        };
        let start_snapshot = (!editor).then(|| StartSnapshot {
            position,
            global: global.clone(),
        });

        let whos_turn = rules.player_at(0);
        let mut game = Self {
            board: Board {
                pieces,
                state: GameState {
                    local: LocalState::default(),
                    global,
                },
                movesets,
                vicinity,
                special_vicinity,
                colinears_present,
                existing_types,
                existing_raw_types,
                playable_region,
                editor,
                start_snapshot,
            },
            rules,
            moves: Vec::new(),
            whos_turn,
        };
        // Loaded positions may already stand in check.
        let result = check::detect_check(&game, whos_turn, true);
        game.board.state.local.in_check = result.royals_in_check;
        game.board.state.local.attackers = result.attackers;
        game
    }

    pub fn standard() -> Self {
        Self::new(Setup::standard())
    }

    #[inline]
    pub fn move_count(&self) -> usize {
        self.board.state.local.move_count
    }

    /// Whether the board currently shows the latest position.
    #[inline]
    pub fn at_latest_move(&self) -> bool {
        self.move_count() == self.moves.len()
    }

    pub fn is_in_check(&self) -> bool {
        !self.board.state.local.in_check.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_setup_counts() {
        let game = Game::standard();
        assert_eq!(game.board.pieces.piece_count(), 32);
        assert_eq!(game.whos_turn, Player::White);
        assert!(game.board.has_special_right(&Coord::at(5, 1)));
        assert!(game.board.has_special_right(&Coord::at(4, 2)));
        assert!(!game.board.has_special_right(&Coord::at(4, 1)));
    }

    #[test]
    fn test_standard_has_no_colinears() {
        let game = Game::standard();
        assert!(!game.board.colinears_present());
        assert_eq!(game.board.pieces.slides().len(), 4);
    }

    #[test]
    fn test_colinears_flagged_when_knightrider_present() {
        let mut setup = Setup::standard();
        setup
            .position
            .insert(Coord::at(12, 12), Material::white(Knightrider));
        let game = Game::new(setup);
        assert!(game.board.colinears_present());
        assert!(game
            .board
            .pieces
            .slides()
            .contains(&Vector::new(2, 1)));
    }

    #[test]
    fn test_turn_order_cycles() {
        let rules = GameRules::default();
        assert_eq!(rules.player_at(0), Player::White);
        assert_eq!(rules.player_at(1), Player::Black);
        assert_eq!(rules.player_at(2), Player::White);
    }

    #[test]
    fn test_bounds() {
        let setup = Setup::standard().with_region(Region::new(-20, 20, -20, 20));
        let game = Game::new(setup);
        assert!(game.board.is_in_bounds(&Coord::at(20, -20)));
        assert!(!game.board.is_in_bounds(&Coord::at(21, 0)));
    }
}
