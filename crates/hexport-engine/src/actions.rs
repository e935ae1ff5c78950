//! The action union players dispatch and the events the engine emits.
//!
//! Actions are requests; the state machine validates them against the
//! current phase. Events are the record of what actually happened; the
//! rebroadcast/log layer serializes them after every successful action.

use crate::board::{PlayerId, Resource};
use crate::hex::{Edge, Hex, Vertex};
use crate::player::ResourceHand;
use crate::trade::{OfferId, TradeOffer};
use serde::{Deserialize, Serialize};

/// Everything a player can ask the engine to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Lobby & setup ====================
    /// Leave the lobby and begin the setup draft.
    StartGame,
    /// Place a settlement during the setup draft.
    PlaceSetupSettlement(Vertex),
    /// Place the road attached to the settlement just placed.
    PlaceSetupRoad(Edge),

    // ==================== Turn flow ====================
    /// Roll the dice to open a turn.
    RollDice,
    /// Hand the listed cards to the bank after a seven.
    DiscardResources(ResourceHand),
    /// Timeout path: the engine picks the discard hand (largest piles
    /// first).
    AutoDiscard,
    /// End the turn.
    EndTurn,

    // ==================== Robber ====================
    /// Move the robber after a seven or a knight.
    MoveRobber(Hex),
    /// Steal one random card from an adjacent victim.
    StealFrom(PlayerId),
    /// Decline to steal.
    SkipSteal,

    // ==================== Building ====================
    BuildRoad(Edge),
    BuildSettlement(Vertex),
    BuildCity(Vertex),

    // ==================== Development cards ====================
    BuyDevCard,
    PlayKnight,
    PlayRoadBuilding,
    PlayYearOfPlenty,
    /// Resolve year of plenty with the two chosen bank resources.
    PickYearOfPlenty(Resource, Resource),
    PlayMonopoly,
    /// Resolve monopoly with the chosen resource.
    PickMonopoly(Resource),

    // ==================== Trading ====================
    /// Trade with the bank at the best port rate.
    BankTrade { give: Resource, receive: Resource },
    /// Open an offer, broadcast (`to: None`) or targeted.
    ProposeTrade {
        to: Option<PlayerId>,
        offering: ResourceHand,
        requesting: ResourceHand,
    },
    AcceptTrade { offer: OfferId },
    DeclineTrade { offer: OfferId },
    /// Respond with a brand-new offer aimed back at the proposer.
    CounterTrade {
        offer: OfferId,
        offering: ResourceHand,
        requesting: ResourceHand,
    },
    CancelTrade { offer: OfferId },
}

/// What a successful action did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    GameStarted {
        first_player: PlayerId,
    },

    SettlementPlaced {
        player: PlayerId,
        vertex: Vertex,
        during_setup: bool,
    },

    RoadPlaced {
        player: PlayerId,
        edge: Edge,
        /// Setup and road-building placements cost nothing.
        free: bool,
    },

    CityBuilt {
        player: PlayerId,
        vertex: Vertex,
    },

    StartingResourcesGranted {
        player: PlayerId,
        grant: ResourceHand,
    },

    DiceRolled {
        player: PlayerId,
        dice: (u8, u8),
        total: u8,
    },

    ResourcesDistributed {
        grants: Vec<(PlayerId, ResourceHand)>,
        /// Resource types withheld under the bank-shortage rule.
        withheld: Vec<Resource>,
    },

    ResourcesDiscarded {
        player: PlayerId,
        discarded: ResourceHand,
    },

    RobberMoved {
        player: PlayerId,
        from: Hex,
        to: Hex,
    },

    ResourceStolen {
        thief: PlayerId,
        victim: PlayerId,
        /// Hidden from the table by the presentation layer.
        resource: Resource,
    },

    StealSkipped {
        player: PlayerId,
    },

    DevCardBought {
        player: PlayerId,
        cards_left_in_deck: u32,
    },

    KnightPlayed {
        player: PlayerId,
        army_size: u32,
    },

    RoadBuildingPlayed {
        player: PlayerId,
        placements: u8,
    },

    YearOfPlentyResolved {
        player: PlayerId,
        first: Resource,
        second: Resource,
    },

    MonopolyResolved {
        player: PlayerId,
        resource: Resource,
        collected: u32,
    },

    BankTraded {
        player: PlayerId,
        gave: Resource,
        gave_count: u32,
        received: Resource,
    },

    TradeOpened {
        offer: TradeOffer,
    },

    TradeSettled {
        offer: OfferId,
        proposer: PlayerId,
        acceptor: PlayerId,
    },

    TradeDeclined {
        offer: OfferId,
        player: PlayerId,
        /// Whether this decline retired the offer.
        retired: bool,
    },

    TradeCancelled {
        offer: OfferId,
    },

    LongestRoadChanged {
        previous: Option<PlayerId>,
        current: Option<PlayerId>,
        length: u32,
    },

    LargestArmyChanged {
        previous: Option<PlayerId>,
        current: Option<PlayerId>,
        size: u32,
    },

    TurnEnded {
        player: PlayerId,
        next: PlayerId,
    },

    GameWon {
        player: PlayerId,
        points: u32,
        revealed_victory_cards: u32,
    },
}
