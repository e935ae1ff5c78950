//! Player state: resource hand, piece stock, development cards, counters.

use crate::board::{PlayerId, Resource};
use crate::devcards::{DevCard, DevCardKind};
use crate::rng::GameRng;
use serde::{Deserialize, Serialize};

/// Seat colors, assigned by seat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerColor {
    Red,
    Blue,
    Orange,
    White,
    Green,
    Purple,
}

impl PlayerColor {
    pub fn for_seat(id: PlayerId) -> Self {
        match id % 6 {
            0 => PlayerColor::Red,
            1 => PlayerColor::Blue,
            2 => PlayerColor::Orange,
            3 => PlayerColor::White,
            4 => PlayerColor::Green,
            _ => PlayerColor::Purple,
        }
    }
}

/// A bundle of resource cards; doubles as a cost and a hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub brick: u32,
    pub lumber: u32,
    pub ore: u32,
    pub grain: u32,
    pub wool: u32,
}

impl ResourceHand {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with(brick: u32, lumber: u32, ore: u32, grain: u32, wool: u32) -> Self {
        Self {
            brick,
            lumber,
            ore,
            grain,
            wool,
        }
    }

    /// A bundle holding `amount` of one resource.
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Equal stock of every resource; the bank's starting shape.
    pub const fn uniform(amount: u32) -> Self {
        Self::with(amount, amount, amount, amount, amount)
    }

    pub fn total(&self) -> u32 {
        self.brick + self.lumber + self.ore + self.grain + self.wool
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Brick => self.brick,
            Resource::Lumber => self.lumber,
            Resource::Ore => self.ore,
            Resource::Grain => self.grain,
            Resource::Wool => self.wool,
        }
    }

    pub fn set(&mut self, resource: Resource, count: u32) {
        match resource {
            Resource::Brick => self.brick = count,
            Resource::Lumber => self.lumber = count,
            Resource::Ore => self.ore = count,
            Resource::Grain => self.grain = count,
            Resource::Wool => self.wool = count,
        }
    }

    pub fn add(&mut self, resource: Resource, amount: u32) {
        self.set(resource, self.get(resource) + amount);
    }

    pub fn add_all(&mut self, other: &ResourceHand) {
        for r in Resource::ALL {
            self.add(r, other.get(r));
        }
    }

    pub fn covers(&self, cost: &ResourceHand) -> bool {
        Resource::ALL.iter().all(|r| self.get(*r) >= cost.get(*r))
    }

    /// Remove `cost`, failing without mutation if the hand cannot cover it.
    pub fn remove(&mut self, cost: &ResourceHand) -> bool {
        if !self.covers(cost) {
            return false;
        }
        for r in Resource::ALL {
            self.set(r, self.get(r) - cost.get(r));
        }
        true
    }

    /// Remove one card drawn uniformly among the individual cards, so a
    /// victim holding more of one resource is proportionally more likely
    /// to lose it.
    pub fn take_random_card(&mut self, rng: &mut GameRng) -> Option<Resource> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let mut pick = rng.index(total as usize) as u32;
        for r in Resource::ALL {
            let n = self.get(r);
            if pick < n {
                self.set(r, n - 1);
                return Some(r);
            }
            pick -= n;
        }
        unreachable!("pick index within total card count")
    }

    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL.into_iter().map(|r| (r, self.get(r)))
    }
}

/// Build costs.
pub mod costs {
    use super::ResourceHand;

    /// Road: 1 brick, 1 lumber.
    pub const ROAD: ResourceHand = ResourceHand::with(1, 1, 0, 0, 0);
    /// Settlement: 1 brick, 1 lumber, 1 grain, 1 wool.
    pub const SETTLEMENT: ResourceHand = ResourceHand::with(1, 1, 0, 1, 1);
    /// City upgrade: 3 ore, 2 grain.
    pub const CITY: ResourceHand = ResourceHand::with(0, 0, 3, 2, 0);
    /// Development card: 1 ore, 1 grain, 1 wool.
    pub const DEV_CARD: ResourceHand = ResourceHand::with(0, 0, 1, 1, 1);
}

/// Per-seat piece stock limits.
pub const ROAD_PIECES: u32 = 15;
pub const SETTLEMENT_PIECES: u32 = 5;
pub const CITY_PIECES: u32 = 4;

/// One seat's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub resources: ResourceHand,
    /// Every card ever bought, in draw order; played cards stay here with
    /// their flag set so the log keeps full history.
    pub dev_cards: Vec<DevCard>,
    pub roads_remaining: u32,
    pub settlements_remaining: u32,
    pub cities_remaining: u32,
    /// Knights played, for Largest Army.
    pub army_size: u32,
    /// Cached result of the last longest-road recomputation.
    pub longest_road_len: u32,
    pub trades_completed: u32,
    pub robberies_committed: u32,
}

impl Player {
    pub fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name,
            color: PlayerColor::for_seat(id),
            resources: ResourceHand::new(),
            dev_cards: Vec::new(),
            roads_remaining: ROAD_PIECES,
            settlements_remaining: SETTLEMENT_PIECES,
            cities_remaining: CITY_PIECES,
            army_size: 0,
            longest_road_len: 0,
            trades_completed: 0,
            robberies_committed: 0,
        }
    }

    /// Unplayed victory-point cards in hand (revealed only at a win).
    pub fn victory_card_points(&self) -> u32 {
        self.dev_cards
            .iter()
            .filter(|c| c.kind == DevCardKind::VictoryPoint && !c.played)
            .count() as u32
    }

    /// Whether a card of this kind can be played on `turn`: unplayed and
    /// not bought this very turn.
    pub fn has_playable_card(&self, kind: DevCardKind, turn: u32) -> bool {
        self.playable_card_index(kind, turn).is_some()
    }

    /// Index of the first playable card of the given kind.
    pub fn playable_card_index(&self, kind: DevCardKind, turn: u32) -> Option<usize> {
        if kind == DevCardKind::VictoryPoint {
            return None;
        }
        self.dev_cards
            .iter()
            .position(|c| c.kind == kind && !c.played && c.bought_on_turn < turn)
    }

    /// Mark the first playable card of this kind as played. Knights grow
    /// the army.
    pub fn play_card(&mut self, kind: DevCardKind, turn: u32) -> bool {
        let Some(idx) = self.playable_card_index(kind, turn) else {
            return false;
        };
        self.dev_cards[idx].played = true;
        if kind == DevCardKind::Knight {
            self.army_size += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn hand_total_and_get() {
        let hand = ResourceHand::with(1, 2, 3, 4, 5);
        assert_eq!(hand.total(), 15);
        assert_eq!(hand.get(Resource::Ore), 3);
    }

    #[test]
    fn remove_refuses_uncovered_cost() {
        let mut hand = ResourceHand::with(1, 0, 0, 0, 0);
        let before = hand;
        assert!(!hand.remove(&ResourceHand::with(2, 0, 0, 0, 0)));
        assert_eq!(hand, before, "failed remove must not mutate");

        assert!(hand.remove(&ResourceHand::with(1, 0, 0, 0, 0)));
        assert!(hand.is_empty());
    }

    #[test]
    fn build_costs() {
        assert_eq!(costs::ROAD.total(), 2);
        assert_eq!(costs::SETTLEMENT.total(), 4);
        assert_eq!(costs::CITY.total(), 5);
        assert_eq!(costs::DEV_CARD.total(), 3);
    }

    #[test]
    fn take_random_card_is_weighted_by_holdings() {
        // With a single card the draw is forced.
        let mut hand = ResourceHand::single(Resource::Grain, 1);
        let mut rng = GameRng::new(3);
        assert_eq!(hand.take_random_card(&mut rng), Some(Resource::Grain));
        assert!(hand.is_empty());
        assert_eq!(hand.take_random_card(&mut rng), None);
    }

    #[test]
    fn take_random_card_conserves_total() {
        let mut hand = ResourceHand::with(3, 1, 4, 1, 5);
        let mut rng = GameRng::new(8);
        let before = hand.total();
        let taken = hand.take_random_card(&mut rng).unwrap();
        assert_eq!(hand.total(), before - 1);
        // The drawn card came out of the matching pile.
        assert_eq!(
            ResourceHand::with(3, 1, 4, 1, 5).get(taken),
            hand.get(taken) + 1
        );
    }

    #[test]
    fn card_bought_this_turn_is_not_playable() {
        let mut player = Player::new(0, "Ada".into());
        player.dev_cards.push(DevCard::bought(DevCardKind::Knight, 4));

        assert!(!player.has_playable_card(DevCardKind::Knight, 4));
        assert!(player.has_playable_card(DevCardKind::Knight, 5));
    }

    #[test]
    fn playing_knight_grows_army() {
        let mut player = Player::new(0, "Ada".into());
        player.dev_cards.push(DevCard::bought(DevCardKind::Knight, 1));

        assert!(player.play_card(DevCardKind::Knight, 2));
        assert_eq!(player.army_size, 1);
        // The single knight is spent now.
        assert!(!player.play_card(DevCardKind::Knight, 2));
    }

    #[test]
    fn victory_cards_are_never_playable() {
        let mut player = Player::new(1, "Bo".into());
        player
            .dev_cards
            .push(DevCard::bought(DevCardKind::VictoryPoint, 1));

        assert!(!player.has_playable_card(DevCardKind::VictoryPoint, 10));
        assert_eq!(player.victory_card_points(), 1);
    }
}
