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

//! Validation of untrusted moves. Both entry points fast-forward the
//! board to the present, re-derive every special flag from the current
//! legal-move computation, and put the board back at whatever move the
//! caller was viewing. Rejections are typed; their display strings are
//! the reasons surfaced to clients.

use thiserror::Error;

use super::check::remove_check_invalid_moves;
use super::legal::{calculate_pseudo, check_if_move_legal};
use super::movepiece::{generate_move, go_to_move, make_move, rewind_move, MoveDraft};
use super::notation::parse_compact_move;
use super::terminal::get_game_conclusion;
use super::Game;
use crate::game::Conclusion;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("Incorrect format.")]
    IncorrectFormat,
    #[error("No piece at start coords.")]
    NoPieceAtStart,
    #[error("Incorrect color.")]
    IncorrectColor,
    #[error("Did not promote.")]
    DidNotPromote,
    #[error("Illegal promotion type.")]
    IllegalPromotionType,
    #[error("Invalid destination coords.")]
    InvalidDestination,
    #[error("Puts self in check.")]
    PutsSelfInCheck,
    #[error("Wrong conclusion.")]
    WrongConclusion,
}

/// Validate an opponent's compact move, and when they claim the move
/// ends the game decisively, verify the claim by playing the move out.
/// The caller's view position is restored before returning.
pub fn is_opponents_move_legal(
    game: &mut Game,
    compact: &str,
    claimed_conclusion: Option<&str>,
) -> Result<(), MoveRejection> {
    let viewed = game.move_count();
    go_to_move(game, game.moves.len(), |_| {});
    let verdict = (|| {
        let mut draft =
            parse_compact_move(compact).map_err(|_| MoveRejection::IncorrectFormat)?;
        validate_move(game, &mut draft)?;
        if let Some(claim) = claimed_conclusion {
            validate_conclusion(game, &draft, claim)?;
        }
        Ok(())
    })();
    go_to_move(game, viewed, |_| {});
    verdict
}

/// Validate a compact move from an engine. Format errors and legality
/// failures share the rejection type; the engine gets the reason string.
pub fn is_engines_move_legal(game: &mut Game, compact: &str) -> Result<(), MoveRejection> {
    let viewed = game.move_count();
    go_to_move(game, game.moves.len(), |_| {});
    let verdict = (|| {
        let mut draft =
            parse_compact_move(compact).map_err(|_| MoveRejection::IncorrectFormat)?;
        validate_move(game, &mut draft)
    })();
    go_to_move(game, viewed, |_| {});
    verdict
}

/// Syntactic and semantic legality of a draft against the latest
/// position. On success the draft's special flags have been re-derived
/// from the legal-move pipeline. Testing membership before and after
/// check pruning separates "never a destination" from "a destination
/// that leaves you in check".
pub fn validate_move(game: &mut Game, draft: &mut MoveDraft) -> Result<(), MoveRejection> {
    debug_assert!(
        game.at_latest_move(),
        "validate_move: board is not at the latest position"
    );
    let piece = game
        .board
        .pieces
        .piece_at(&draft.start)
        .ok_or(MoveRejection::NoPieceAtStart)?;
    let color = piece.material.player();
    if color != game.whos_turn {
        return Err(MoveRejection::IncorrectColor);
    }

    let on_promotion_rank = game
        .rules
        .promotion_ranks_of(color)
        .contains(&draft.end.y);
    if let Some(promotion) = draft.promotion {
        let well_formed = piece.material.raw().is_pawn()
            && on_promotion_rank
            && promotion.player() == color
            && game.rules.promotions_allowed.contains(&promotion.raw());
        if !well_formed {
            return Err(MoveRejection::IllegalPromotionType);
        }
    } else if piece.material.raw().is_pawn() && on_promotion_rank {
        return Err(MoveRejection::DidNotPromote);
    }

    let mut legal = calculate_pseudo(game, &piece, false);
    let Some(flags) = check_if_move_legal(game, &legal, &piece, &draft.end) else {
        return Err(MoveRejection::InvalidDestination);
    };
    draft.flags = flags;

    remove_check_invalid_moves(game, &piece, &mut legal);
    if check_if_move_legal(game, &legal, &piece, &draft.end).is_none() {
        return Err(MoveRejection::PutsSelfInCheck);
    }
    Ok(())
}

/// A decisive claim must match what the position actually concludes to
/// after the move; resignations, timeouts and aborts are the server's
/// business and pass through unverified.
fn validate_conclusion(
    game: &mut Game,
    draft: &MoveDraft,
    claim: &str,
) -> Result<(), MoveRejection> {
    let decisive = Conclusion::parse(claim).is_some_and(|conclusion| conclusion.is_decisive());
    if !decisive {
        return Ok(());
    }
    let mv = generate_move(game, draft).map_err(|_| MoveRejection::NoPieceAtStart)?;
    make_move(game, mv);
    let actual = get_game_conclusion(game);
    rewind_move(game);
    if actual.as_deref() == Some(claim) {
        Ok(())
    } else {
        Err(MoveRejection::WrongConclusion)
    }
}
