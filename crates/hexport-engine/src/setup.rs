//! Snake-draft bookkeeping for the initial placement round.
//!
//! Setup runs `player_count * 4` placements: settlement then road per seat,
//! forward through the seats, then the same again in reverse. The progress
//! record is the single source of truth for whose placement it is and what
//! is being placed; the state machine derives its phase from it.

use crate::board::PlayerId;
use crate::hex::Vertex;
use serde::{Deserialize, Serialize};

/// What the current setup placement is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupPlacing {
    Settlement,
    Road,
}

/// Progress through the snake draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetupProgress {
    /// Placements completed so far (settlements and roads both count).
    pub placement_index: u32,
    /// The settlement just placed, anchoring the next road.
    pub pending_road_anchor: Option<Vertex>,
}

impl SetupProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placements the draft needs in total.
    pub fn total(player_count: u8) -> u32 {
        player_count as u32 * 4
    }

    pub fn is_complete(&self, player_count: u8) -> bool {
        self.placement_index >= Self::total(player_count)
    }

    /// Seat whose placement the current index is: forward pass through the
    /// seats, then the reverse pass.
    pub fn seat(&self, player_count: u8) -> PlayerId {
        let n = self.placement_index / 2;
        let count = player_count as u32;
        let pair = if n < count { n } else { 2 * count - 1 - n };
        pair as PlayerId
    }

    /// What the current index places.
    pub fn placing(&self) -> SetupPlacing {
        if self.placement_index % 2 == 0 {
            SetupPlacing::Settlement
        } else {
            SetupPlacing::Road
        }
    }

    /// Draft round: 1 on the forward pass, 2 on the reverse pass.
    pub fn round(&self, player_count: u8) -> u8 {
        if self.placement_index / 2 < player_count as u32 {
            1
        } else {
            2
        }
    }

    /// Whether the current placement belongs to the reverse pass, whose
    /// settlements receive starting resources.
    pub fn grants_resources(&self, player_count: u8) -> bool {
        self.round(player_count) == 2
    }

    pub fn advance(&mut self) {
        self.placement_index += 1;
    }
}
