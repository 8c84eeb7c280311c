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

//! The compact move notation: `"x,y>x,y"` with an optional `=T`
//! promotion suffix, coordinates as arbitrary-precision signed decimals
//! and piece abbreviations cased by color. Special moves carry marker
//! suffixes after the promotion, each introduced by `+`:
//!
//! * `+c<x>,<y>` castling, naming the discovered partner's square;
//! * `+ep` an en passant capture;
//! * `+p<x>,<y>;<x>,<y>;...` the traveled path of a curved mover
//!   (the Rose), start and destination included.
//!
//! Parsed suffixes land on the draft's flags but are informational on
//! untrusted input: validation re-derives every flag from the position
//! before anything is trusted.

use anyhow::Result;
use thiserror::Error;

use super::coords::Coord;
use super::material::{Material, Player, RawType};
use super::movepiece::MoveDraft;
use super::moveset::Castle;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotationError {
    #[error("Incorrect format.")]
    IncorrectFormat,
}

/// Parse a compact move string into a draft. Suffixes populate the
/// draft's flags; the legality pipeline has the final word on them.
pub fn parse_compact_move(compact: &str) -> Result<MoveDraft> {
    let (body, suffixes) = match compact.split_once('+') {
        Some((body, rest)) => (body, Some(rest)),
        None => (compact, None),
    };
    let (body, promotion) = match body.split_once('=') {
        Some((body, suffix)) => (body, Some(suffix)),
        None => (body, None),
    };
    let (from, to) = body.split_once('>').ok_or(NotationError::IncorrectFormat)?;
    let start = Coord::try_from_string(from).ok_or(NotationError::IncorrectFormat)?;
    let end = Coord::try_from_string(to).ok_or(NotationError::IncorrectFormat)?;
    let mut draft = MoveDraft::new(start, end);
    if let Some(abbrev) = promotion {
        if abbrev.is_empty() {
            return Err(NotationError::IncorrectFormat.into());
        }
        let raw = RawType::from_abbrev(abbrev).ok_or(NotationError::IncorrectFormat)?;
        let player = if abbrev.chars().next().is_some_and(|c| c.is_ascii_uppercase()) {
            Player::White
        } else {
            Player::Black
        };
        draft.promotion = Some(Material::new(player, raw));
    }
    if let Some(suffixes) = suffixes {
        for suffix in suffixes.split('+') {
            parse_suffix(&mut draft, suffix)?;
        }
    }
    Ok(draft)
}

fn parse_suffix(draft: &mut MoveDraft, suffix: &str) -> Result<()> {
    if suffix == "ep" {
        draft.flags.enpassant = true;
        return Ok(());
    }
    if let Some(partner) = suffix.strip_prefix('c') {
        let coord = Coord::try_from_string(partner).ok_or(NotationError::IncorrectFormat)?;
        // The castling direction is the direction of travel.
        let dir = if draft.end.x > draft.start.x { 1 } else { -1 };
        draft.flags.castle = Some(Castle { dir, coord });
        return Ok(());
    }
    if let Some(waypoints) = suffix.strip_prefix('p') {
        let path = waypoints
            .split(';')
            .map(Coord::try_from_string)
            .collect::<Option<Vec<Coord>>>()
            .ok_or(NotationError::IncorrectFormat)?;
        if path.is_empty() {
            return Err(NotationError::IncorrectFormat.into());
        }
        draft.flags.path = Some(path);
        return Ok(());
    }
    Err(NotationError::IncorrectFormat.into())
}

/// Render a draft in compact form: endpoints, promotion, then the
/// special-move suffixes in fixed order (castle, en passant, path).
/// Inverse of `parse_compact_move` for every field the notation carries.
pub fn compact_from_draft(draft: &MoveDraft) -> String {
    let mut compact = format!("{}>{}", draft.start, draft.end);
    if let Some(promotion) = draft.promotion {
        compact.push('=');
        let abbrev = promotion.raw().abbrev();
        match promotion.player() {
            Player::Black => compact.push_str(&abbrev.to_lowercase()),
            _ => compact.push_str(abbrev),
        }
    }
    if let Some(castle) = &draft.flags.castle {
        compact.push_str("+c");
        compact.push_str(&castle.coord.to_string());
    }
    if draft.flags.enpassant {
        compact.push_str("+ep");
    }
    if let Some(path) = &draft.flags.path {
        compact.push_str("+p");
        let waypoints: Vec<String> = path.iter().map(Coord::to_string).collect();
        compact.push_str(&waypoints.join(";"));
    }
    compact
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_move() {
        let draft = parse_compact_move("5,2>5,4").unwrap();
        assert_eq!(draft.start, Coord::at(5, 2));
        assert_eq!(draft.end, Coord::at(5, 4));
        assert_eq!(draft.promotion, None);
    }

    #[test]
    fn test_parse_negative_and_huge_coordinates() {
        let draft = parse_compact_move("-3,-77>123456789012345678901234567890,0").unwrap();
        assert_eq!(draft.start, Coord::at(-3, -77));
        assert_eq!(
            draft.end.x.to_string(),
            "123456789012345678901234567890"
        );
    }

    #[test]
    fn test_parse_promotion_cases() {
        let white = parse_compact_move("3,7>3,8=Q").unwrap();
        assert_eq!(white.promotion, Some(Material::WQ));
        let black = parse_compact_move("3,2>3,1=q").unwrap();
        assert_eq!(black.promotion, Some(Material::BQ));
        let fairy = parse_compact_move("3,7>3,8=NR").unwrap();
        assert_eq!(
            fairy.promotion,
            Some(Material::white(RawType::Knightrider))
        );
    }

    #[test]
    fn test_parse_castle_suffix() {
        let draft = parse_compact_move("5,1>7,1+c8,1").unwrap();
        let castle = draft.flags.castle.as_ref().unwrap();
        assert_eq!(castle.dir, 1);
        assert_eq!(castle.coord, Coord::at(8, 1));
        let draft = parse_compact_move("5,1>3,1+c1,1").unwrap();
        assert_eq!(draft.flags.castle.as_ref().unwrap().dir, -1);
    }

    #[test]
    fn test_parse_en_passant_suffix() {
        let draft = parse_compact_move("4,4>3,3+ep").unwrap();
        assert!(draft.flags.enpassant);
    }

    #[test]
    fn test_parse_path_suffix() {
        let draft = parse_compact_move("0,0>3,3+p0,0;1,2;3,3").unwrap();
        assert_eq!(
            draft.flags.path,
            Some(vec![Coord::at(0, 0), Coord::at(1, 2), Coord::at(3, 3)])
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_compact_move("e2e4").is_err());
        assert!(parse_compact_move("5,2").is_err());
        assert!(parse_compact_move("5,2>").is_err());
        assert!(parse_compact_move(">5,4").is_err());
        assert!(parse_compact_move("5,2>5,4=").is_err());
        assert!(parse_compact_move("5,2>5,4=Z").is_err());
        assert!(parse_compact_move("5,2>5,4+x").is_err());
        assert!(parse_compact_move("5,2>5,4+c").is_err());
        assert!(parse_compact_move("5,2>5,4+p").is_err());
        assert!(parse_compact_move("5,2>5,4+p1,2;a").is_err());
        assert!(parse_compact_move("").is_err());
    }

    #[test]
    fn test_round_trip() {
        for compact in [
            "5,2>5,4",
            "-10,0>-10,900",
            "3,7>3,8=Q",
            "3,2>3,1=nr",
            "5,1>7,1+c8,1",
            "4,4>3,3+ep",
            "0,0>3,3+p0,0;1,2;3,3",
            "3,7>3,8=Q+ep",
        ] {
            let draft = parse_compact_move(compact).unwrap();
            assert_eq!(compact_from_draft(&draft), *compact);
        }
    }

    #[test]
    fn test_untrusted_suffixes_reach_the_flags_only() {
        // Suffixes are carried, not believed: the draft records them and
        // validation recomputes them from the position.
        let draft = parse_compact_move("5,2>5,3+ep").unwrap();
        assert!(draft.flags.enpassant);
        assert_eq!(draft.promotion, None);
    }
}
