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

//! Two-player clock accounting in milliseconds. The clock never reads
//! wall time itself (every entry point takes `now`), so the core stays
//! deterministic and the server stays authoritative. Server payloads
//! carry an absolute flag-fall timestamp from which remaining time is
//! reconstructed.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::board::Player;

/// Clock payload exchanged with the server.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ClockValues {
    /// Remaining milliseconds per player.
    pub clocks: HashMap<Player, i64>,
    pub color_ticking: Option<Player>,
    /// Absolute epoch-millis at which the ticking color flags; the
    /// receiver reconstructs remaining time as `loses_at − now`.
    pub time_color_ticking_loses_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clock {
    current: HashMap<Player, i64>,
    increment_millis: i64,
    color_ticking: Option<Player>,
    time_at_turn_start: Option<u64>,
    untimed: bool,
}

impl Clock {
    pub fn new(start_millis: i64, increment_millis: i64, players: &[Player]) -> Self {
        Self {
            current: players.iter().map(|&p| (p, start_millis)).collect(),
            increment_millis,
            color_ticking: None,
            time_at_turn_start: None,
            untimed: false,
        }
    }

    pub fn untimed() -> Self {
        Self {
            current: HashMap::new(),
            increment_millis: 0,
            color_ticking: None,
            time_at_turn_start: None,
            untimed: true,
        }
    }

    #[inline]
    pub fn is_untimed(&self) -> bool {
        self.untimed
    }

    #[inline]
    pub fn color_ticking(&self) -> Option<Player> {
        self.color_ticking
    }

    /// Remaining time of `player` at `now`.
    pub fn remaining(&self, player: Player, now: u64) -> Option<i64> {
        let base = *self.current.get(&player)?;
        if self.color_ticking == Some(player) {
            let started = self.time_at_turn_start?;
            Some(base - now.saturating_sub(started) as i64)
        } else {
            Some(base)
        }
    }

    /// Start the first ticking period. Until this is called no time is
    /// deducted from anyone (untimed pre-game moves).
    pub fn start_ticking(&mut self, color: Player, now: u64) {
        if self.untimed {
            return;
        }
        self.color_ticking = Some(color);
        self.time_at_turn_start = Some(now);
    }

    /// A turn was pushed: deduct the elapsed period from the mover, add
    /// their increment, hand the ticker to `next_color` and stamp the
    /// new turn start.
    pub fn push(&mut self, now: u64, next_color: Player) {
        if self.untimed {
            return;
        }
        if let (Some(mover), Some(started)) = (self.color_ticking, self.time_at_turn_start) {
            let elapsed = now.saturating_sub(started) as i64;
            if let Some(time) = self.current.get_mut(&mover) {
                *time -= elapsed;
                *time += self.increment_millis;
            }
        }
        self.color_ticking = Some(next_color);
        self.time_at_turn_start = Some(now);
    }

    /// Accept server-authoritative values. When a flag-fall timestamp is
    /// included, the ticking color's remaining time is reconstructed
    /// from it rather than trusted from the relative clock.
    pub fn edit(&mut self, values: &ClockValues, now: u64) {
        if self.untimed {
            return;
        }
        for (&player, &millis) in &values.clocks {
            self.current.insert(player, millis);
        }
        self.color_ticking = values.color_ticking;
        self.time_at_turn_start = Some(now);
        if let (Some(ticking), Some(loses_at)) =
            (values.color_ticking, values.time_color_ticking_loses_at)
        {
            let remaining = loses_at as i64 - now as i64;
            self.current.insert(ticking, remaining);
        }
    }

    /// Check for a flag fall at `now`; returns the winner if the ticking
    /// clock has run out.
    pub fn update(&mut self, now: u64) -> Option<Player> {
        if self.untimed {
            return None;
        }
        let ticking = self.color_ticking?;
        let remaining = self.remaining(ticking, now)?;
        if remaining <= 0 {
            self.current.insert(ticking, 0);
            Some(!ticking)
        } else {
            None
        }
    }

    /// Snapshot for transmission, including the absolute flag-fall time
    /// the receiving side needs.
    pub fn values(&self, now: u64) -> ClockValues {
        let mut clocks = HashMap::new();
        for (&player, _) in &self.current {
            if let Some(remaining) = self.remaining(player, now) {
                clocks.insert(player, remaining);
            }
        }
        let time_color_ticking_loses_at = self.color_ticking.and_then(|ticking| {
            let remaining = self.remaining(ticking, now)?;
            Some(now.saturating_add(remaining.max(0) as u64))
        });
        ClockValues {
            clocks,
            color_ticking: self.color_ticking,
            time_color_ticking_loses_at,
        }
    }
}
