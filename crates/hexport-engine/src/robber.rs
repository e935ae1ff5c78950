//! Robber placement and theft.
//!
//! Placement legality (including the optional friendly-robber rule) and
//! victim selection live here; the card actually stolen is drawn by the
//! state machine from the victim's hand through the game RNG.

use crate::board::{Board, PlayerId, TileKind};
use crate::error::GameError;
use crate::hex::Hex;
use crate::player::Player;

/// Estimated score below which the friendly robber shields a player.
pub const FRIENDLY_ROBBER_MIN_VP: u32 = 3;

/// Tiles the robber may move to: any land tile other than where it stands
/// (water and fog are never targets).
///
/// With the friendly robber enabled, a tile is additionally excluded when
/// it has at least one occupant other than the active player and *every*
/// such occupant sits below [`FRIENDLY_ROBBER_MIN_VP`] estimated points
/// (settlement = 1, city = 2). Tiles occupied only by the active player,
/// or by nobody, stay eligible.
pub fn robber_targets(board: &Board, active: PlayerId, friendly: bool) -> Vec<Hex> {
    let mut targets: Vec<Hex> = board
        .tiles()
        .filter(|t| !matches!(t.kind, TileKind::Water | TileKind::Fog))
        .map(|t| t.coord)
        .filter(|coord| *coord != board.robber())
        .filter(|coord| !friendly || !shielded(board, *coord, active))
        .collect();
    targets.sort();
    targets
}

fn shielded(board: &Board, hex: Hex, active: PlayerId) -> bool {
    let others: Vec<PlayerId> = board
        .occupants_of(hex)
        .into_iter()
        .filter(|p| *p != active)
        .collect();
    !others.is_empty()
        && others
            .iter()
            .all(|p| board.building_points(*p) < FRIENDLY_ROBBER_MIN_VP)
}

/// Validate a robber destination.
pub fn check_robber_target(
    board: &Board,
    hex: Hex,
    active: PlayerId,
    friendly: bool,
) -> Result<(), GameError> {
    if robber_targets(board, active, friendly).contains(&hex) {
        Ok(())
    } else {
        Err(GameError::InvalidRobberTarget)
    }
}

/// Players who can be stolen from after the robber lands on `hex`: anyone
/// else with a building on the tile and at least one card in hand.
pub fn steal_candidates(board: &Board, players: &[Player], hex: Hex, active: PlayerId) -> Vec<PlayerId> {
    let mut victims: Vec<PlayerId> = board
        .occupants_of(hex)
        .into_iter()
        .filter(|p| *p != active)
        .filter(|p| {
            players
                .get(*p as usize)
                .is_some_and(|pl| !pl.resources.is_empty())
        })
        .collect();
    victims.sort();
    victims
}
