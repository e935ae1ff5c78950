//! Hexport - rules engine for a settlement-and-trade hex board game.
//!
//! The engine owns every game-legality decision: which actions are legal
//! in the current phase, how the board mutates, and when the game ends.
//! It is a pure state machine: [`process_action`] takes a state snapshot
//! plus one action and returns a new snapshot, performing no I/O and
//! holding no global state. Rendering, transport, persistence and timers
//! are collaborator concerns.
//!
//! # Modules
//!
//! - [`hex`]: axial coordinates and vertex/edge addressing
//! - [`board`]: tiles, buildings, roads, ports, robber
//! - [`generator`]: board generation under the 6/8 non-adjacency rule
//! - [`ledger`]: bank stock and dice-roll production with the shortage rule
//! - [`placement`]: building legality and the build-cost flow
//! - [`longest_road`]: route search and the achievement tie policy
//! - [`devcards`]: development deck and Largest Army
//! - [`robber`]: robber placement and theft
//! - [`trade`]: bank rates and the offer/accept/decline/counter protocol
//! - [`setup`]: snake-draft bookkeeping
//! - [`game`]: the phase state machine and [`process_action`]

pub mod actions;
pub mod board;
pub mod devcards;
pub mod error;
pub mod game;
pub mod generator;
pub mod hex;
pub mod ledger;
pub mod longest_road;
pub mod placement;
pub mod player;
pub mod rng;
pub mod robber;
pub mod setup;
pub mod trade;

// Re-export the types most callers need.
pub use actions::{GameAction, GameEvent};
pub use board::{
    Board, BoardQuery, Building, BuildingKind, PlayerId, Port, PortKind, Resource, Road, Terrain,
    Tile, TileKind,
};
pub use devcards::{DevCard, DevCardKind};
pub use error::GameError;
pub use game::{
    initialize_game, process_action, ActionOutcome, GamePhase, GameSettings, GameSnapshot,
    GameState, NewGameError,
};
pub use generator::{generate_board, BoardGenError};
pub use hex::{Corner, Edge, Hex, Side, Vertex};
pub use ledger::{plan_roll_payout, Bank};
pub use longest_road::{longest_route, RoadRoute};
pub use player::{Player, PlayerColor, ResourceHand};
pub use rng::GameRng;
pub use setup::{SetupPlacing, SetupProgress};
pub use trade::{bank_rate, OfferId, TradeBook, TradeOffer};
