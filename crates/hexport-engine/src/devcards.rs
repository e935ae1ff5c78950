//! Development card deck and the Largest Army award.
//!
//! Card *effects* are phase transitions and therefore live in the state
//! machine; this module owns the deck composition, per-card bookkeeping,
//! and the holder policy for Largest Army.

use crate::board::PlayerId;
use crate::rng::GameRng;
use serde::{Deserialize, Serialize};

/// Minimum army size to qualify for Largest Army.
pub const MIN_LARGEST_ARMY: u32 = 3;

/// The five development card kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DevCardKind {
    /// Move the robber and steal; counts toward Largest Army.
    Knight,
    /// Worth 1 VP, hidden until a win reveals it.
    VictoryPoint,
    /// Place up to two roads for free.
    RoadBuilding,
    /// Take any two resources from the bank.
    YearOfPlenty,
    /// Drain one resource type from every other player.
    Monopoly,
}

/// A card in a player's possession.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevCard {
    pub kind: DevCardKind,
    /// Turn counter value at purchase; a card is unplayable that turn.
    pub bought_on_turn: u32,
    pub played: bool,
}

impl DevCard {
    pub fn bought(kind: DevCardKind, turn: u32) -> Self {
        Self {
            kind,
            bought_on_turn: turn,
            played: false,
        }
    }
}

/// The fixed 25-card deck: 14 knights, 5 victory points, 2 road building,
/// 2 year of plenty, 2 monopoly. Shuffled by the game's CSPRNG; cards are
/// drawn from the back.
pub fn standard_deck(rng: &mut GameRng) -> Vec<DevCardKind> {
    let mut deck = Vec::with_capacity(25);
    deck.extend(std::iter::repeat(DevCardKind::Knight).take(14));
    deck.extend(std::iter::repeat(DevCardKind::VictoryPoint).take(5));
    deck.extend(std::iter::repeat(DevCardKind::RoadBuilding).take(2));
    deck.extend(std::iter::repeat(DevCardKind::YearOfPlenty).take(2));
    deck.extend(std::iter::repeat(DevCardKind::Monopoly).take(2));
    rng.shuffle(&mut deck);
    deck
}

/// Resolve the Largest Army holder from `(player, army size)` pairs.
///
/// Mirrors the Longest Road policy: the title goes to the unique maximum
/// at or above [`MIN_LARGEST_ARMY`]; a tie at the maximum awards nobody,
/// stripping the current holder if they are among the tied. An army merely
/// equal to the holder's therefore vacates the title rather than keeping
/// it.
pub fn largest_army_holder(armies: &[(PlayerId, u32)]) -> Option<PlayerId> {
    crate::longest_road::unique_max_holder(armies, MIN_LARGEST_ARMY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deck_composition() {
        let mut rng = GameRng::new(1);
        let deck = standard_deck(&mut rng);
        assert_eq!(deck.len(), 25);

        let count = |kind: DevCardKind| deck.iter().filter(|c| **c == kind).count();
        assert_eq!(count(DevCardKind::Knight), 14);
        assert_eq!(count(DevCardKind::VictoryPoint), 5);
        assert_eq!(count(DevCardKind::RoadBuilding), 2);
        assert_eq!(count(DevCardKind::YearOfPlenty), 2);
        assert_eq!(count(DevCardKind::Monopoly), 2);
    }

    #[test]
    fn deck_shuffle_is_seed_deterministic() {
        let a = standard_deck(&mut GameRng::new(12));
        let b = standard_deck(&mut GameRng::new(12));
        assert_eq!(a, b);
    }

    #[test]
    fn nobody_below_minimum() {
        assert_eq!(largest_army_holder(&[(0, 2), (1, 2)]), None);
    }

    #[test]
    fn first_to_three_takes_the_title() {
        assert_eq!(largest_army_holder(&[(0, 3), (1, 1)]), Some(0));
    }

    #[test]
    fn strictly_greater_overtakes() {
        assert_eq!(largest_army_holder(&[(0, 3), (1, 4)]), Some(1));
    }

    #[test]
    fn tie_at_maximum_awards_nobody() {
        assert_eq!(largest_army_holder(&[(0, 3), (1, 3)]), None);
        // And a third player below the tie does not inherit it.
        assert_eq!(largest_army_holder(&[(0, 4), (1, 4), (2, 3)]), None);
    }
}
