//! Bank rates and the player-to-player trade protocol.
//!
//! The trade book tracks every offer made during the current turn. Offers
//! are immutable once opened: accepting settles and retires one, declining
//! accumulates until no eligible recipient remains, and a counter is a
//! brand-new offer aimed back at the original proposer. Settlement of the
//! resource transfer itself happens in the state machine so both hands and
//! the bank mutate in one place.

use crate::board::{Board, PlayerId, PortKind, Resource};
use crate::error::GameError;
use crate::player::ResourceHand;
use serde::{Deserialize, Serialize};

pub type OfferId = u32;

/// Default bank exchange rate without any port.
pub const BASE_BANK_RATE: u32 = 4;

/// The bank rate for one resource: best of 4:1, 3:1 with a generic port,
/// 2:1 with that resource's own port. Evaluated independently per resource.
pub fn bank_rate(board: &Board, player: PlayerId, resource: Resource) -> u32 {
    let ports = board.ports_of(player);
    if ports.contains(&PortKind::Specific(resource)) {
        2
    } else if ports.contains(&PortKind::Generic) {
        3
    } else {
        BASE_BANK_RATE
    }
}

/// A single player-to-player offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeOffer {
    pub id: OfferId,
    pub from: PlayerId,
    /// Specific recipient, or `None` for a broadcast to the table.
    pub to: Option<PlayerId>,
    pub offering: ResourceHand,
    pub requesting: ResourceHand,
    pub declined_by: Vec<PlayerId>,
    pub active: bool,
}

impl TradeOffer {
    /// Whether `player` may respond to this offer.
    pub fn is_eligible(&self, player: PlayerId, player_count: u8) -> bool {
        if player == self.from || player >= player_count {
            return false;
        }
        match self.to {
            Some(target) => target == player,
            None => true,
        }
    }

    fn eligible_recipients(&self, player_count: u8) -> Vec<PlayerId> {
        (0..player_count)
            .filter(|p| self.is_eligible(*p, player_count))
            .collect()
    }
}

/// All offers of the current turn plus the id counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeBook {
    offers: Vec<TradeOffer>,
    next_id: OfferId,
}

impl TradeBook {
    /// Open a new offer. Both sides must be non-empty and the proposer
    /// cannot target themselves.
    pub fn open(
        &mut self,
        from: PlayerId,
        to: Option<PlayerId>,
        offering: ResourceHand,
        requesting: ResourceHand,
    ) -> Result<OfferId, GameError> {
        if offering.is_empty() || requesting.is_empty() || to == Some(from) {
            return Err(GameError::InvalidOffer);
        }
        let id = self.next_id;
        self.next_id += 1;
        self.offers.push(TradeOffer {
            id,
            from,
            to,
            offering,
            requesting,
            declined_by: Vec::new(),
            active: true,
        });
        Ok(id)
    }

    pub fn get(&self, id: OfferId) -> Option<&TradeOffer> {
        self.offers.iter().find(|o| o.id == id)
    }

    fn get_mut(&mut self, id: OfferId) -> Option<&mut TradeOffer> {
        self.offers.iter_mut().find(|o| o.id == id)
    }

    /// Offers still open for responses.
    pub fn active_offers(&self) -> impl Iterator<Item = &TradeOffer> {
        self.offers.iter().filter(|o| o.active)
    }

    /// Look up an offer for acceptance: it must exist, still be active and
    /// the responder must be eligible. First committer wins: once settled
    /// the offer goes inactive and later accepts land here with
    /// [`GameError::OfferNotActive`].
    pub fn check_acceptable(
        &self,
        id: OfferId,
        by: PlayerId,
        player_count: u8,
    ) -> Result<&TradeOffer, GameError> {
        let offer = self.get(id).ok_or(GameError::OfferNotFound)?;
        if !offer.active {
            return Err(GameError::OfferNotActive);
        }
        if !offer.is_eligible(by, player_count) {
            return Err(GameError::NotEligible);
        }
        Ok(offer)
    }

    /// Retire a settled offer.
    pub fn settle(&mut self, id: OfferId) {
        if let Some(offer) = self.get_mut(id) {
            offer.active = false;
        }
    }

    /// Record a decline. The offer deactivates once every eligible
    /// recipient has declined; returns whether that happened.
    pub fn decline(
        &mut self,
        id: OfferId,
        by: PlayerId,
        player_count: u8,
    ) -> Result<bool, GameError> {
        let offer = self.get_mut(id).ok_or(GameError::OfferNotFound)?;
        if !offer.active {
            return Err(GameError::OfferNotActive);
        }
        if !offer.is_eligible(by, player_count) {
            return Err(GameError::NotEligible);
        }
        if !offer.declined_by.contains(&by) {
            offer.declined_by.push(by);
        }
        let everyone_declined = offer
            .eligible_recipients(player_count)
            .iter()
            .all(|p| offer.declined_by.contains(p));
        if everyone_declined {
            offer.active = false;
        }
        Ok(everyone_declined)
    }

    /// Withdraw one's own offer.
    pub fn cancel(&mut self, id: OfferId, by: PlayerId) -> Result<(), GameError> {
        let offer = self.get_mut(id).ok_or(GameError::OfferNotFound)?;
        if offer.from != by {
            return Err(GameError::NotEligible);
        }
        if !offer.active {
            return Err(GameError::OfferNotActive);
        }
        offer.active = false;
        Ok(())
    }

    /// End of turn: every remaining offer dies with the turn.
    pub fn retire_all(&mut self) {
        for offer in &mut self.offers {
            offer.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Port, Terrain, Tile};
    use crate::hex::{Corner, Hex, Vertex};

    fn hand(brick: u32, grain: u32) -> ResourceHand {
        ResourceHand::with(brick, 0, 0, grain, 0)
    }

    #[test]
    fn open_rejects_degenerate_offers() {
        let mut book = TradeBook::default();
        assert_eq!(
            book.open(0, None, ResourceHand::new(), hand(1, 0)),
            Err(GameError::InvalidOffer)
        );
        assert_eq!(
            book.open(0, Some(0), hand(1, 0), hand(0, 1)),
            Err(GameError::InvalidOffer)
        );
        assert!(book.open(0, Some(1), hand(1, 0), hand(0, 1)).is_ok());
    }

    #[test]
    fn ids_are_unique_and_lookup_works() {
        let mut book = TradeBook::default();
        let a = book.open(0, None, hand(1, 0), hand(0, 1)).unwrap();
        let b = book.open(0, None, hand(2, 0), hand(0, 2)).unwrap();
        assert_ne!(a, b);
        assert_eq!(book.get(a).unwrap().offering, hand(1, 0));
        assert_eq!(book.get(b).unwrap().offering, hand(2, 0));
    }

    #[test]
    fn settle_then_second_accept_fails() {
        let mut book = TradeBook::default();
        let id = book.open(0, None, hand(1, 0), hand(0, 1)).unwrap();

        assert!(book.check_acceptable(id, 1, 3).is_ok());
        book.settle(id);
        assert_eq!(
            book.check_acceptable(id, 2, 3),
            Err(GameError::OfferNotActive),
            "first committer wins; the race loser sees an inactive offer"
        );
    }

    #[test]
    fn proposer_cannot_accept_own_offer() {
        let mut book = TradeBook::default();
        let id = book.open(0, None, hand(1, 0), hand(0, 1)).unwrap();
        assert_eq!(book.check_acceptable(id, 0, 3), Err(GameError::NotEligible));
    }

    #[test]
    fn targeted_offer_only_for_target() {
        let mut book = TradeBook::default();
        let id = book.open(0, Some(2), hand(1, 0), hand(0, 1)).unwrap();
        assert_eq!(book.check_acceptable(id, 1, 3), Err(GameError::NotEligible));
        assert!(book.check_acceptable(id, 2, 3).is_ok());
    }

    #[test]
    fn broadcast_deactivates_after_all_decline() {
        let mut book = TradeBook::default();
        let id = book.open(0, None, hand(1, 0), hand(0, 1)).unwrap();

        assert!(!book.decline(id, 1, 3).unwrap());
        assert!(book.get(id).unwrap().active);
        assert!(book.decline(id, 2, 3).unwrap());
        assert!(!book.get(id).unwrap().active);
    }

    #[test]
    fn targeted_decline_deactivates_immediately() {
        let mut book = TradeBook::default();
        let id = book.open(0, Some(1), hand(1, 0), hand(0, 1)).unwrap();
        assert!(book.decline(id, 1, 4).unwrap());
        assert!(!book.get(id).unwrap().active);
    }

    #[test]
    fn cancel_is_proposer_only() {
        let mut book = TradeBook::default();
        let id = book.open(0, None, hand(1, 0), hand(0, 1)).unwrap();
        assert_eq!(book.cancel(id, 1), Err(GameError::NotEligible));
        assert!(book.cancel(id, 0).is_ok());
        assert_eq!(book.cancel(id, 0), Err(GameError::OfferNotActive));
    }

    #[test]
    fn retire_all_closes_the_book() {
        let mut book = TradeBook::default();
        let a = book.open(0, None, hand(1, 0), hand(0, 1)).unwrap();
        let b = book.open(1, Some(0), hand(0, 1), hand(1, 0)).unwrap();
        book.retire_all();
        assert!(book.active_offers().next().is_none());
        assert!(!book.get(a).unwrap().active);
        assert!(!book.get(b).unwrap().active);
    }

    #[test]
    fn bank_rate_prefers_best_port() {
        let center = Hex::new(0, 0);
        let vertex = Vertex::new(center, Corner::Top);
        let edge = vertex.touching_edges()[0];
        let mut tiles = vec![Tile::terrain(center, Terrain::Fields, 5)];
        tiles.push(Tile::desert(Hex::new(1, 0)));
        for h in Hex::disc(2) {
            if !tiles.iter().any(|t| t.coord == h) {
                tiles.push(Tile::water(h));
            }
        }
        let ports = vec![
            Port {
                kind: PortKind::Generic,
                vertices: edge.endpoints(),
            },
            Port {
                kind: PortKind::Specific(Resource::Grain),
                vertices: edge.endpoints(),
            },
        ];
        let mut board = Board::assemble(tiles, ports, Hex::new(1, 0));

        // No building yet: default rate everywhere.
        assert_eq!(bank_rate(&board, 0, Resource::Grain), 4);

        board.put_settlement(vertex, 0);
        assert_eq!(bank_rate(&board, 0, Resource::Grain), 2);
        assert_eq!(
            bank_rate(&board, 0, Resource::Ore),
            3,
            "generic port covers resources without a specific port"
        );
        assert_eq!(bank_rate(&board, 1, Resource::Grain), 4);
    }
}
