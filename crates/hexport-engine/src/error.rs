//! Rule-violation errors returned by the state machine.
//!
//! These are expected, non-fatal outcomes: the caller shows the reason and
//! lets the player retry. The one exception is [`GameError::UnknownPlayer`],
//! which means the caller handed us an id outside the seat list: an
//! engine or integration bug, logged at error level before being returned.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why an action was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("not your turn")]
    NotYourTurn,

    #[error("action is not legal in the current phase")]
    WrongPhase,

    #[error("the game is over")]
    GameOver,

    #[error("that spot is not on land")]
    NotOnLand,

    #[error("that vertex is already occupied")]
    VertexOccupied,

    #[error("too close to another settlement")]
    DistanceRuleViolated,

    #[error("that edge already carries a road")]
    EdgeOccupied,

    #[error("not connected to your network")]
    NotConnected,

    #[error("no settlement of yours at that vertex")]
    NotYourSettlement,

    #[error("you cannot afford that")]
    InsufficientResources,

    #[error("the bank cannot supply that")]
    BankShort,

    #[error("no pieces of that kind remaining")]
    NoPiecesRemaining,

    #[error("the development deck is empty")]
    DeckEmpty,

    #[error("no playable card of that kind")]
    CardUnavailable,

    #[error("already played a development card this turn")]
    DevCardAlreadyPlayed,

    #[error("no legal placement available")]
    NoLegalPlacement,

    #[error("discard selection does not match what is required")]
    InvalidDiscard,

    #[error("that player cannot be robbed")]
    NotAVictim,

    #[error("the robber cannot go there")]
    InvalidRobberTarget,

    #[error("trade offer is malformed")]
    InvalidOffer,

    #[error("no such trade offer")]
    OfferNotFound,

    #[error("offer no longer active")]
    OfferNotActive,

    #[error("you are not an eligible recipient of that offer")]
    NotEligible,

    #[error("referenced player does not exist")]
    UnknownPlayer,
}
