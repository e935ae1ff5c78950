//! The turn/phase state machine: the engine's single mutation entry point.
//!
//! [`process_action`] consumes a state snapshot plus one action and returns
//! a fresh snapshot; the input is never mutated. All legality decisions
//! funnel through here: phase gating, per-rule placement checks, resource
//! movement against the bank, achievement recomputation and the victory
//! check after every successful action.

use crate::actions::{GameAction, GameEvent};
use crate::board::{Board, BoardSnapshot, PlayerId, Resource};
use crate::devcards::{self, DevCard, DevCardKind};
use crate::error::GameError;
use crate::generator::{generate_board, BoardGenError};
use crate::hex::{Edge, Hex, Vertex};
use crate::ledger::{plan_roll_payout, Bank};
use crate::longest_road::{self, longest_route};
use crate::placement;
use crate::player::{costs, Player, ResourceHand};
use crate::rng::GameRng;
use crate::robber;
use crate::setup::{SetupPlacing, SetupProgress};
use crate::trade::{bank_rate, OfferId, TradeBook};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

/// Immutable per-game configuration, supplied once by the lobby.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSettings {
    /// Points needed to win.
    pub victory_target: u32,
    /// Advisory turn timer for the collaborators running clocks; the
    /// engine itself never waits on it.
    pub turn_timer_secs: Option<u32>,
    /// Hand size above which a seven forces a discard.
    pub discard_limit: u32,
    /// Shield low-scoring players from the robber.
    pub friendly_robber: bool,
    /// Map size: 2 is the 19-tile base board, 3 the 37-tile extension.
    pub ring_count: u8,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            victory_target: 10,
            turn_timer_secs: None,
            discard_limit: 7,
            friendly_robber: false,
            ring_count: 2,
        }
    }
}

/// Failures creating a game.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NewGameError {
    #[error("player count {0} out of range (2-6)")]
    PlayerCount(usize),

    #[error(transparent)]
    BoardGeneration(#[from] BoardGenError),
}

/// The phases of a game. Transitions follow a fixed graph; no phase is
/// ever skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Seats are filled but the draft has not begun.
    Lobby,
    /// The snake draft: four sub-states (round 1/2 x settlement/road).
    Setup { round: u8, placing: SetupPlacing },
    /// Turn opens; the dice have not been rolled.
    Roll,
    /// A seven was rolled; the listed players still owe a discard.
    Discard { remaining: Vec<PlayerId> },
    /// The robber must be moved.
    RobberMove,
    /// The robber landed; pick a victim or skip.
    RobberSteal { victims: Vec<PlayerId> },
    /// Build, trade, play cards, end the turn.
    Main,
    /// Road-building card: free placements left.
    RoadBuilding { remaining: u8 },
    /// Year-of-plenty card: waiting for the two bank picks.
    YearOfPlenty,
    /// Monopoly card: waiting for the resource pick.
    Monopoly,
    /// Terminal.
    Ended { winner: PlayerId },
}

/// The aggregate root. Value semantics throughout: cloning is cheap at
/// board scale and `process_action` never aliases its input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub settings: GameSettings,
    pub board: Board,
    pub players: Vec<Player>,
    pub bank: Bank,
    /// Undrawn development cards; the top of the deck is the back.
    pub dev_deck: Vec<DevCardKind>,
    pub phase: GamePhase,
    pub current_player: PlayerId,
    /// Turn counter; 0 during lobby/setup, then 1-based.
    pub turn: u32,
    /// Bumped by every successful action.
    pub version: u64,
    pub dice: Option<(u8, u8)>,
    pub dev_card_played_this_turn: bool,
    pub longest_road_holder: Option<PlayerId>,
    pub largest_army_holder: Option<PlayerId>,
    pub trades: TradeBook,
    pub setup: SetupProgress,
    pub rng: GameRng,
}

/// Result of [`process_action`]. On failure `state` is the unchanged
/// input; callers must adopt `state` either way.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub error: Option<GameError>,
}

impl ActionOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Create a game in the lobby phase.
pub fn initialize_game(
    settings: GameSettings,
    player_names: Vec<String>,
    seed: u64,
) -> Result<GameState, NewGameError> {
    let count = player_names.len();
    if !(2..=6).contains(&count) {
        return Err(NewGameError::PlayerCount(count));
    }

    let mut rng = GameRng::new(seed);
    let board = generate_board(settings.ring_count, count as u8, &mut rng)?;
    let dev_deck = devcards::standard_deck(&mut rng);
    let players = player_names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Player::new(i as PlayerId, name))
        .collect();

    Ok(GameState {
        settings,
        board,
        players,
        bank: Bank::standard(),
        dev_deck,
        phase: GamePhase::Lobby,
        current_player: 0,
        turn: 0,
        version: 0,
        dice: None,
        dev_card_played_this_turn: false,
        longest_road_holder: None,
        largest_army_holder: None,
        trades: TradeBook::default(),
        setup: SetupProgress::new(),
        rng,
    })
}

/// Apply one action to a snapshot, producing the next snapshot.
///
/// Rule violations come back as `error` with the input state untouched;
/// there is no path that publishes a half-mutated state.
pub fn process_action(state: &GameState, player: PlayerId, action: GameAction) -> ActionOutcome {
    let mut next = state.clone();
    match next.apply(player, action) {
        Ok(events) => {
            next.version += 1;
            ActionOutcome {
                state: next,
                events,
                error: None,
            }
        }
        Err(err) => ActionOutcome {
            state: state.clone(),
            events: Vec::new(),
            error: Some(err),
        },
    }
}

impl GameState {
    pub fn player_count(&self) -> u8 {
        self.players.len() as u8
    }

    /// Total victory points, including unrevealed victory cards.
    pub fn victory_points(&self, player: PlayerId) -> u32 {
        let mut points = self.board.building_points(player);
        if self.longest_road_holder == Some(player) {
            points += 2;
        }
        if self.largest_army_holder == Some(player) {
            points += 2;
        }
        if let Some(p) = self.players.get(player as usize) {
            points += p.victory_card_points();
        }
        points
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            GamePhase::Ended { winner } => Some(winner),
            _ => None,
        }
    }

    // ==================== Guards ====================

    fn ensure_player(&self, player: PlayerId) -> Result<(), GameError> {
        if (player as usize) < self.players.len() {
            Ok(())
        } else {
            error!(
                player = player,
                seats = self.players.len(),
                "action referenced an unknown player"
            );
            Err(GameError::UnknownPlayer)
        }
    }

    fn ensure_turn(&self, player: PlayerId) -> Result<(), GameError> {
        if player == self.current_player {
            Ok(())
        } else {
            Err(GameError::NotYourTurn)
        }
    }

    // ==================== Action dispatch ====================

    fn apply(&mut self, player: PlayerId, action: GameAction) -> Result<Vec<GameEvent>, GameError> {
        if matches!(self.phase, GamePhase::Ended { .. }) {
            return Err(GameError::GameOver);
        }
        self.ensure_player(player)?;

        let mut events = Vec::new();
        match action {
            GameAction::StartGame => self.start_game(player, &mut events)?,
            GameAction::PlaceSetupSettlement(v) => self.place_setup_settlement(player, v, &mut events)?,
            GameAction::PlaceSetupRoad(e) => self.place_setup_road(player, e, &mut events)?,
            GameAction::RollDice => self.roll_dice(player, &mut events)?,
            GameAction::DiscardResources(hand) => self.discard(player, hand, &mut events)?,
            GameAction::AutoDiscard => self.auto_discard(player, &mut events)?,
            GameAction::EndTurn => self.end_turn(player, &mut events)?,
            GameAction::MoveRobber(hex) => self.move_robber(player, hex, &mut events)?,
            GameAction::StealFrom(victim) => self.steal_from(player, victim, &mut events)?,
            GameAction::SkipSteal => self.skip_steal(player, &mut events)?,
            GameAction::BuildRoad(e) => self.build_road(player, e, &mut events)?,
            GameAction::BuildSettlement(v) => self.build_settlement(player, v, &mut events)?,
            GameAction::BuildCity(v) => self.build_city(player, v, &mut events)?,
            GameAction::BuyDevCard => self.buy_dev_card(player, &mut events)?,
            GameAction::PlayKnight => self.play_knight(player, &mut events)?,
            GameAction::PlayRoadBuilding => self.play_road_building(player, &mut events)?,
            GameAction::PlayYearOfPlenty => self.play_year_of_plenty(player, &mut events)?,
            GameAction::PickYearOfPlenty(a, b) => self.pick_year_of_plenty(player, a, b, &mut events)?,
            GameAction::PlayMonopoly => self.play_monopoly(player, &mut events)?,
            GameAction::PickMonopoly(r) => self.pick_monopoly(player, r, &mut events)?,
            GameAction::BankTrade { give, receive } => self.bank_trade(player, give, receive, &mut events)?,
            GameAction::ProposeTrade {
                to,
                offering,
                requesting,
            } => self.propose_trade(player, to, offering, requesting, &mut events)?,
            GameAction::AcceptTrade { offer } => self.accept_trade(player, offer, &mut events)?,
            GameAction::DeclineTrade { offer } => self.decline_trade(player, offer, &mut events)?,
            GameAction::CounterTrade {
                offer,
                offering,
                requesting,
            } => self.counter_trade(player, offer, offering, requesting, &mut events)?,
            GameAction::CancelTrade { offer } => self.cancel_trade(player, offer, &mut events)?,
        }

        self.check_victory(&mut events);
        Ok(events)
    }

    // ==================== Lobby & setup ====================

    fn start_game(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        if self.phase != GamePhase::Lobby {
            return Err(GameError::WrongPhase);
        }
        let _ = player; // any seated player may start
        self.current_player = self.setup.seat(self.player_count());
        self.phase = GamePhase::Setup {
            round: 1,
            placing: SetupPlacing::Settlement,
        };
        events.push(GameEvent::GameStarted {
            first_player: self.current_player,
        });
        Ok(())
    }

    fn place_setup_settlement(
        &mut self,
        player: PlayerId,
        vertex: Vertex,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if !matches!(
            self.phase,
            GamePhase::Setup {
                placing: SetupPlacing::Settlement,
                ..
            }
        ) {
            return Err(GameError::WrongPhase);
        }
        placement::check_settlement_site(&self.board, vertex, player, true)?;

        let seat = player as usize;
        if self.players[seat].settlements_remaining == 0 {
            return Err(GameError::NoPiecesRemaining);
        }
        self.board.put_settlement(vertex, player);
        self.players[seat].settlements_remaining -= 1;
        events.push(GameEvent::SettlementPlaced {
            player,
            vertex,
            during_setup: true,
        });

        // Second-pass settlements come with their starting resources: one
        // card per adjacent producing tile, duplicates and all.
        if self.setup.grants_resources(self.player_count()) {
            let wanted = placement::setup_grant(&self.board, vertex);
            let mut granted = ResourceHand::new();
            for (resource, want) in wanted.iter() {
                if want > 0 {
                    granted.add(resource, self.bank.withdraw_up_to(resource, want));
                }
            }
            if !granted.is_empty() {
                self.players[seat].resources.add_all(&granted);
                events.push(GameEvent::StartingResourcesGranted {
                    player,
                    grant: granted,
                });
            }
        }

        self.setup.pending_road_anchor = Some(vertex);
        self.setup.advance();
        self.phase = GamePhase::Setup {
            round: self.setup.round(self.player_count()),
            placing: SetupPlacing::Road,
        };
        Ok(())
    }

    fn place_setup_road(
        &mut self,
        player: PlayerId,
        edge: Edge,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if !matches!(
            self.phase,
            GamePhase::Setup {
                placing: SetupPlacing::Road,
                ..
            }
        ) {
            return Err(GameError::WrongPhase);
        }
        let anchor = self.setup.pending_road_anchor.ok_or(GameError::WrongPhase)?;
        placement::check_road_site(&self.board, edge, player, Some(anchor))?;

        let seat = player as usize;
        if self.players[seat].roads_remaining == 0 {
            return Err(GameError::NoPiecesRemaining);
        }
        self.board.put_road(edge, player);
        self.players[seat].roads_remaining -= 1;
        self.setup.pending_road_anchor = None;
        events.push(GameEvent::RoadPlaced {
            player,
            edge,
            free: true,
        });

        self.setup.advance();
        let count = self.player_count();
        if self.setup.is_complete(count) {
            self.current_player = 0;
            self.turn = 1;
            self.phase = GamePhase::Roll;
        } else {
            self.current_player = self.setup.seat(count);
            self.phase = GamePhase::Setup {
                round: self.setup.round(count),
                placing: SetupPlacing::Settlement,
            };
        }
        self.refresh_longest_road(events);
        Ok(())
    }

    // ==================== Turn flow ====================

    fn roll_dice(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::Roll {
            return Err(GameError::WrongPhase);
        }

        let dice = (self.rng.roll_die(), self.rng.roll_die());
        let total = dice.0 + dice.1;
        self.dice = Some(dice);
        events.push(GameEvent::DiceRolled {
            player,
            dice,
            total,
        });

        if total == 7 {
            let limit = self.settings.discard_limit;
            let remaining: Vec<PlayerId> = self
                .players
                .iter()
                .filter(|p| p.resources.total() > limit)
                .map(|p| p.id)
                .collect();
            self.phase = if remaining.is_empty() {
                GamePhase::RobberMove
            } else {
                GamePhase::Discard { remaining }
            };
            return Ok(());
        }

        let payout = plan_roll_payout(&self.board, &self.bank, total);
        for (pid, grant) in &payout.grants {
            if self.bank.withdraw(grant) {
                self.players[*pid as usize].resources.add_all(grant);
            } else {
                error!(player = *pid, "planned payout exceeded bank stock");
            }
        }
        if !payout.grants.is_empty() || !payout.withheld.is_empty() {
            events.push(GameEvent::ResourcesDistributed {
                grants: payout.grants,
                withheld: payout.withheld,
            });
        }
        self.phase = GamePhase::Main;
        Ok(())
    }

    fn discard(
        &mut self,
        player: PlayerId,
        hand: ResourceHand,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        let GamePhase::Discard { remaining } = &self.phase else {
            return Err(GameError::WrongPhase);
        };
        if !remaining.contains(&player) {
            return Err(GameError::NotYourTurn);
        }

        let seat = player as usize;
        let required = self.players[seat].resources.total() / 2;
        if hand.total() != required || !self.players[seat].resources.covers(&hand) {
            return Err(GameError::InvalidDiscard);
        }

        self.players[seat].resources.remove(&hand);
        self.bank.deposit(&hand);
        events.push(GameEvent::ResourcesDiscarded {
            player,
            discarded: hand,
        });

        if let GamePhase::Discard { remaining } = &mut self.phase {
            remaining.retain(|p| *p != player);
            if remaining.is_empty() {
                self.phase = GamePhase::RobberMove;
            }
        }
        Ok(())
    }

    fn auto_discard(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        let GamePhase::Discard { remaining } = &self.phase else {
            return Err(GameError::WrongPhase);
        };
        if !remaining.contains(&player) {
            return Err(GameError::NotYourTurn);
        }
        let hand = self.players[player as usize].resources;
        let pick = greedy_discard(&hand, hand.total() / 2);
        self.discard(player, pick, events)
    }

    fn end_turn(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }

        self.trades.retire_all();
        self.dice = None;
        self.dev_card_played_this_turn = false;

        let next = ((self.current_player as usize + 1) % self.players.len()) as PlayerId;
        events.push(GameEvent::TurnEnded { player, next });
        self.current_player = next;
        self.turn += 1;
        self.phase = GamePhase::Roll;
        Ok(())
    }

    // ==================== Robber ====================

    fn move_robber(&mut self, player: PlayerId, hex: Hex, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::RobberMove {
            return Err(GameError::WrongPhase);
        }
        robber::check_robber_target(&self.board, hex, player, self.settings.friendly_robber)?;

        let from = self.board.robber();
        self.board.move_robber(hex);
        events.push(GameEvent::RobberMoved {
            player,
            from,
            to: hex,
        });

        let victims = robber::steal_candidates(&self.board, &self.players, hex, player);
        self.phase = if victims.is_empty() {
            GamePhase::Main
        } else {
            GamePhase::RobberSteal { victims }
        };
        Ok(())
    }

    fn steal_from(
        &mut self,
        player: PlayerId,
        victim: PlayerId,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        let GamePhase::RobberSteal { victims } = &self.phase else {
            return Err(GameError::WrongPhase);
        };
        if !victims.contains(&victim) {
            return Err(GameError::NotAVictim);
        }

        match self.players[victim as usize]
            .resources
            .take_random_card(&mut self.rng)
        {
            Some(resource) => {
                self.players[player as usize].resources.add(resource, 1);
                self.players[player as usize].robberies_committed += 1;
                events.push(GameEvent::ResourceStolen {
                    thief: player,
                    victim,
                    resource,
                });
            }
            None => events.push(GameEvent::StealSkipped { player }),
        }
        self.phase = GamePhase::Main;
        Ok(())
    }

    fn skip_steal(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if !matches!(self.phase, GamePhase::RobberSteal { .. }) {
            return Err(GameError::WrongPhase);
        }
        events.push(GameEvent::StealSkipped { player });
        self.phase = GamePhase::Main;
        Ok(())
    }

    // ==================== Building ====================

    fn build_road(&mut self, player: PlayerId, edge: Edge, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        let free = matches!(self.phase, GamePhase::RoadBuilding { .. });
        if !free && self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }
        placement::check_road_site(&self.board, edge, player, None)?;

        let seat = player as usize;
        if self.players[seat].roads_remaining == 0 {
            return Err(GameError::NoPiecesRemaining);
        }
        if !free {
            placement::pay(&mut self.players[seat], &mut self.bank, &costs::ROAD)?;
        }
        self.board.put_road(edge, player);
        self.players[seat].roads_remaining -= 1;
        events.push(GameEvent::RoadPlaced { player, edge, free });

        if let GamePhase::RoadBuilding { remaining } = &mut self.phase {
            *remaining -= 1;
            let spent = *remaining == 0;
            if spent
                || self.players[seat].roads_remaining == 0
                || placement::road_sites(&self.board, player).is_empty()
            {
                self.phase = GamePhase::Main;
            }
        }
        self.refresh_longest_road(events);
        Ok(())
    }

    fn build_settlement(
        &mut self,
        player: PlayerId,
        vertex: Vertex,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }
        placement::check_settlement_site(&self.board, vertex, player, false)?;

        let seat = player as usize;
        if self.players[seat].settlements_remaining == 0 {
            return Err(GameError::NoPiecesRemaining);
        }
        placement::pay(&mut self.players[seat], &mut self.bank, &costs::SETTLEMENT)?;
        self.board.put_settlement(vertex, player);
        self.players[seat].settlements_remaining -= 1;
        events.push(GameEvent::SettlementPlaced {
            player,
            vertex,
            during_setup: false,
        });

        // A new settlement can sever an opponent's route.
        self.refresh_longest_road(events);
        Ok(())
    }

    fn build_city(&mut self, player: PlayerId, vertex: Vertex, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }
        placement::check_city_site(&self.board, vertex, player)?;

        let seat = player as usize;
        if self.players[seat].cities_remaining == 0 {
            return Err(GameError::NoPiecesRemaining);
        }
        placement::pay(&mut self.players[seat], &mut self.bank, &costs::CITY)?;
        self.board.promote_to_city(vertex, player);
        self.players[seat].cities_remaining -= 1;
        // The settlement piece goes back into the player's stock.
        self.players[seat].settlements_remaining += 1;
        events.push(GameEvent::CityBuilt { player, vertex });
        Ok(())
    }

    // ==================== Development cards ====================

    fn buy_dev_card(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }
        if self.dev_deck.is_empty() {
            return Err(GameError::DeckEmpty);
        }

        let seat = player as usize;
        placement::pay(&mut self.players[seat], &mut self.bank, &costs::DEV_CARD)?;
        let Some(kind) = self.dev_deck.pop() else {
            return Err(GameError::DeckEmpty);
        };
        self.players[seat]
            .dev_cards
            .push(DevCard::bought(kind, self.turn));
        events.push(GameEvent::DevCardBought {
            player,
            cards_left_in_deck: self.dev_deck.len() as u32,
        });
        Ok(())
    }

    fn ensure_card_playable(&self, player: PlayerId, kind: DevCardKind) -> Result<(), GameError> {
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }
        if self.dev_card_played_this_turn {
            return Err(GameError::DevCardAlreadyPlayed);
        }
        if !self.players[player as usize].has_playable_card(kind, self.turn) {
            return Err(GameError::CardUnavailable);
        }
        Ok(())
    }

    fn play_knight(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        self.ensure_card_playable(player, DevCardKind::Knight)?;

        let seat = player as usize;
        self.players[seat].play_card(DevCardKind::Knight, self.turn);
        self.dev_card_played_this_turn = true;
        events.push(GameEvent::KnightPlayed {
            player,
            army_size: self.players[seat].army_size,
        });
        self.refresh_largest_army(events);
        self.phase = GamePhase::RobberMove;
        Ok(())
    }

    fn play_road_building(&mut self, player: PlayerId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        self.ensure_card_playable(player, DevCardKind::RoadBuilding)?;

        let seat = player as usize;
        let pieces = self.players[seat].roads_remaining;
        if pieces == 0 {
            return Err(GameError::NoPiecesRemaining);
        }
        if placement::road_sites(&self.board, player).is_empty() {
            return Err(GameError::NoLegalPlacement);
        }

        self.players[seat].play_card(DevCardKind::RoadBuilding, self.turn);
        self.dev_card_played_this_turn = true;
        let placements = pieces.min(2) as u8;
        self.phase = GamePhase::RoadBuilding {
            remaining: placements,
        };
        events.push(GameEvent::RoadBuildingPlayed { player, placements });
        Ok(())
    }

    fn play_year_of_plenty(&mut self, player: PlayerId, _events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        self.ensure_card_playable(player, DevCardKind::YearOfPlenty)?;

        self.players[player as usize].play_card(DevCardKind::YearOfPlenty, self.turn);
        self.dev_card_played_this_turn = true;
        self.phase = GamePhase::YearOfPlenty;
        Ok(())
    }

    fn pick_year_of_plenty(
        &mut self,
        player: PlayerId,
        first: Resource,
        second: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::YearOfPlenty {
            return Err(GameError::WrongPhase);
        }

        let mut picks = ResourceHand::new();
        picks.add(first, 1);
        picks.add(second, 1);
        if !self.bank.withdraw(&picks) {
            return Err(GameError::BankShort);
        }
        self.players[player as usize].resources.add_all(&picks);
        events.push(GameEvent::YearOfPlentyResolved {
            player,
            first,
            second,
        });
        self.phase = GamePhase::Main;
        Ok(())
    }

    fn play_monopoly(&mut self, player: PlayerId, _events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        self.ensure_card_playable(player, DevCardKind::Monopoly)?;

        self.players[player as usize].play_card(DevCardKind::Monopoly, self.turn);
        self.dev_card_played_this_turn = true;
        self.phase = GamePhase::Monopoly;
        Ok(())
    }

    fn pick_monopoly(
        &mut self,
        player: PlayerId,
        resource: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::Monopoly {
            return Err(GameError::WrongPhase);
        }

        let mut collected = 0;
        for other in &mut self.players {
            if other.id != player {
                let held = other.resources.get(resource);
                other.resources.set(resource, 0);
                collected += held;
            }
        }
        self.players[player as usize].resources.add(resource, collected);
        events.push(GameEvent::MonopolyResolved {
            player,
            resource,
            collected,
        });
        self.phase = GamePhase::Main;
        Ok(())
    }

    // ==================== Trading ====================

    fn bank_trade(
        &mut self,
        player: PlayerId,
        give: Resource,
        receive: Resource,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }
        if give == receive {
            return Err(GameError::InvalidOffer);
        }

        let rate = bank_rate(&self.board, player, give);
        let seat = player as usize;
        let paid = ResourceHand::single(give, rate);
        if !self.players[seat].resources.covers(&paid) {
            return Err(GameError::InsufficientResources);
        }
        if self.bank.stock.get(receive) == 0 {
            return Err(GameError::BankShort);
        }

        self.players[seat].resources.remove(&paid);
        self.bank.deposit(&paid);
        let received = ResourceHand::single(receive, 1);
        if self.bank.withdraw(&received) {
            self.players[seat].resources.add(receive, 1);
        } else {
            error!(player = player, "bank stock changed mid-trade");
        }
        events.push(GameEvent::BankTraded {
            player,
            gave: give,
            gave_count: rate,
            received: receive,
        });
        Ok(())
    }

    fn propose_trade(
        &mut self,
        player: PlayerId,
        to: Option<PlayerId>,
        offering: ResourceHand,
        requesting: ResourceHand,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }
        if let Some(target) = to {
            self.ensure_player(target)?;
        }
        if !self.players[player as usize].resources.covers(&offering) {
            return Err(GameError::InsufficientResources);
        }

        let id = self.trades.open(player, to, offering, requesting)?;
        if let Some(offer) = self.trades.get(id) {
            events.push(GameEvent::TradeOpened {
                offer: offer.clone(),
            });
        }
        Ok(())
    }

    fn accept_trade(&mut self, player: PlayerId, offer_id: OfferId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }

        let (proposer, offering, requesting) = {
            let offer = self
                .trades
                .check_acceptable(offer_id, player, self.player_count())?;
            (offer.from, offer.offering, offer.requesting)
        };
        self.ensure_player(proposer)?;

        // Hands may have changed since the offer was opened; both sides
        // must still be able to deliver for the settlement to be atomic.
        let from_seat = proposer as usize;
        let to_seat = player as usize;
        if !self.players[from_seat].resources.covers(&offering)
            || !self.players[to_seat].resources.covers(&requesting)
        {
            return Err(GameError::InsufficientResources);
        }

        self.players[from_seat].resources.remove(&offering);
        self.players[to_seat].resources.add_all(&offering);
        self.players[to_seat].resources.remove(&requesting);
        self.players[from_seat].resources.add_all(&requesting);
        self.players[from_seat].trades_completed += 1;
        self.players[to_seat].trades_completed += 1;
        self.trades.settle(offer_id);
        events.push(GameEvent::TradeSettled {
            offer: offer_id,
            proposer,
            acceptor: player,
        });
        Ok(())
    }

    fn decline_trade(&mut self, player: PlayerId, offer_id: OfferId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }
        let retired = self.trades.decline(offer_id, player, self.player_count())?;
        events.push(GameEvent::TradeDeclined {
            offer: offer_id,
            player,
            retired,
        });
        Ok(())
    }

    fn counter_trade(
        &mut self,
        player: PlayerId,
        offer_id: OfferId,
        offering: ResourceHand,
        requesting: ResourceHand,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), GameError> {
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }

        let original_proposer = {
            let original = self.trades.get(offer_id).ok_or(GameError::OfferNotFound)?;
            if !original.active {
                return Err(GameError::OfferNotActive);
            }
            if !original.is_eligible(player, self.player_count()) {
                return Err(GameError::NotEligible);
            }
            original.from
        };
        if !self.players[player as usize].resources.covers(&offering) {
            return Err(GameError::InsufficientResources);
        }

        // A counter is a brand-new offer aimed back at the proposer; the
        // original stays open until answered or retired.
        let id = self
            .trades
            .open(player, Some(original_proposer), offering, requesting)?;
        if let Some(offer) = self.trades.get(id) {
            events.push(GameEvent::TradeOpened {
                offer: offer.clone(),
            });
        }
        Ok(())
    }

    fn cancel_trade(&mut self, player: PlayerId, offer_id: OfferId, events: &mut Vec<GameEvent>) -> Result<(), GameError> {
        if self.phase != GamePhase::Main {
            return Err(GameError::WrongPhase);
        }
        self.trades.cancel(offer_id, player)?;
        events.push(GameEvent::TradeCancelled { offer: offer_id });
        Ok(())
    }

    // ==================== Achievements & victory ====================

    fn refresh_longest_road(&mut self, events: &mut Vec<GameEvent>) {
        let lengths: Vec<(PlayerId, u32)> = self
            .players
            .iter()
            .map(|p| (p.id, longest_route(&self.board, p.id).length))
            .collect();
        for (seat, (_, len)) in lengths.iter().enumerate() {
            self.players[seat].longest_road_len = *len;
        }

        let holder = longest_road::longest_road_holder(&lengths);
        if holder != self.longest_road_holder {
            events.push(GameEvent::LongestRoadChanged {
                previous: self.longest_road_holder,
                current: holder,
                length: lengths.iter().map(|(_, l)| *l).max().unwrap_or(0),
            });
            self.longest_road_holder = holder;
        }
    }

    fn refresh_largest_army(&mut self, events: &mut Vec<GameEvent>) {
        let armies: Vec<(PlayerId, u32)> = self.players.iter().map(|p| (p.id, p.army_size)).collect();
        let holder = devcards::largest_army_holder(&armies);
        if holder != self.largest_army_holder {
            events.push(GameEvent::LargestArmyChanged {
                previous: self.largest_army_holder,
                current: holder,
                size: armies.iter().map(|(_, n)| *n).max().unwrap_or(0),
            });
            self.largest_army_holder = holder;
        }
    }

    /// Victory is evaluated for the turn owner after every successful
    /// action; a mid-turn build, knight or road can end the game on the
    /// spot without waiting for end-of-turn.
    fn check_victory(&mut self, events: &mut Vec<GameEvent>) {
        if self.turn == 0
            || matches!(
                self.phase,
                GamePhase::Lobby | GamePhase::Setup { .. } | GamePhase::Ended { .. }
            )
        {
            return;
        }
        let winner = self.current_player;
        let points = self.victory_points(winner);
        if points >= self.settings.victory_target {
            let revealed = self.players[winner as usize].victory_card_points();
            self.phase = GamePhase::Ended { winner };
            events.push(GameEvent::GameWon {
                player: winner,
                points,
                revealed_victory_cards: revealed,
            });
        }
    }

    // ==================== Legal-action enumeration ====================

    /// Every action `player` could legally take right now. The canonical
    /// source for what a UI may offer. Free-form hands are represented
    /// canonically: one greedy discard per player in the discard phase;
    /// counter-offers are never enumerated.
    pub fn valid_actions(&self, player: PlayerId) -> Vec<GameAction> {
        let mut actions = Vec::new();
        let seat = player as usize;
        if seat >= self.players.len() {
            return actions;
        }
        let is_turn = player == self.current_player;

        match &self.phase {
            GamePhase::Lobby => actions.push(GameAction::StartGame),

            GamePhase::Setup { placing, .. } => {
                if is_turn {
                    match placing {
                        SetupPlacing::Settlement => {
                            for v in placement::settlement_sites(&self.board, player, true) {
                                actions.push(GameAction::PlaceSetupSettlement(v));
                            }
                        }
                        SetupPlacing::Road => {
                            if let Some(anchor) = self.setup.pending_road_anchor {
                                for e in placement::setup_road_sites(&self.board, anchor) {
                                    actions.push(GameAction::PlaceSetupRoad(e));
                                }
                            }
                        }
                    }
                }
            }

            GamePhase::Roll => {
                if is_turn {
                    actions.push(GameAction::RollDice);
                }
            }

            GamePhase::Discard { remaining } => {
                if remaining.contains(&player) {
                    let hand = self.players[seat].resources;
                    actions.push(GameAction::DiscardResources(greedy_discard(
                        &hand,
                        hand.total() / 2,
                    )));
                    actions.push(GameAction::AutoDiscard);
                }
            }

            GamePhase::RobberMove => {
                if is_turn {
                    for hex in
                        robber::robber_targets(&self.board, player, self.settings.friendly_robber)
                    {
                        actions.push(GameAction::MoveRobber(hex));
                    }
                }
            }

            GamePhase::RobberSteal { victims } => {
                if is_turn {
                    for victim in victims {
                        actions.push(GameAction::StealFrom(*victim));
                    }
                    actions.push(GameAction::SkipSteal);
                }
            }

            GamePhase::RoadBuilding { .. } => {
                if is_turn && self.players[seat].roads_remaining > 0 {
                    for e in placement::road_sites(&self.board, player) {
                        actions.push(GameAction::BuildRoad(e));
                    }
                }
            }

            GamePhase::YearOfPlenty => {
                if is_turn {
                    for (i, first) in Resource::ALL.into_iter().enumerate() {
                        for second in Resource::ALL.into_iter().skip(i) {
                            let mut picks = ResourceHand::new();
                            picks.add(first, 1);
                            picks.add(second, 1);
                            if self.bank.stock.covers(&picks) {
                                actions.push(GameAction::PickYearOfPlenty(first, second));
                            }
                        }
                    }
                }
            }

            GamePhase::Monopoly => {
                if is_turn {
                    for r in Resource::ALL {
                        actions.push(GameAction::PickMonopoly(r));
                    }
                }
            }

            GamePhase::Main => {
                if is_turn {
                    actions.push(GameAction::EndTurn);
                    let p = &self.players[seat];

                    if p.roads_remaining > 0 && p.resources.covers(&costs::ROAD) {
                        for e in placement::road_sites(&self.board, player) {
                            actions.push(GameAction::BuildRoad(e));
                        }
                    }
                    if p.settlements_remaining > 0 && p.resources.covers(&costs::SETTLEMENT) {
                        for v in placement::settlement_sites(&self.board, player, false) {
                            actions.push(GameAction::BuildSettlement(v));
                        }
                    }
                    if p.cities_remaining > 0 && p.resources.covers(&costs::CITY) {
                        for v in placement::city_sites(&self.board, player) {
                            actions.push(GameAction::BuildCity(v));
                        }
                    }
                    if !self.dev_deck.is_empty() && p.resources.covers(&costs::DEV_CARD) {
                        actions.push(GameAction::BuyDevCard);
                    }

                    if !self.dev_card_played_this_turn {
                        if p.has_playable_card(DevCardKind::Knight, self.turn) {
                            actions.push(GameAction::PlayKnight);
                        }
                        if p.has_playable_card(DevCardKind::RoadBuilding, self.turn)
                            && p.roads_remaining > 0
                            && !placement::road_sites(&self.board, player).is_empty()
                        {
                            actions.push(GameAction::PlayRoadBuilding);
                        }
                        if p.has_playable_card(DevCardKind::YearOfPlenty, self.turn) {
                            actions.push(GameAction::PlayYearOfPlenty);
                        }
                        if p.has_playable_card(DevCardKind::Monopoly, self.turn) {
                            actions.push(GameAction::PlayMonopoly);
                        }
                    }

                    for give in Resource::ALL {
                        let rate = bank_rate(&self.board, player, give);
                        if self.players[seat].resources.get(give) < rate {
                            continue;
                        }
                        for receive in Resource::ALL {
                            if receive != give && self.bank.stock.get(receive) > 0 {
                                actions.push(GameAction::BankTrade { give, receive });
                            }
                        }
                    }
                }

                // Trade responses are open to every eligible seat, turn or
                // not; counters are free-form and left out of enumeration.
                for offer in self.trades.active_offers() {
                    if offer.is_eligible(player, self.player_count()) {
                        actions.push(GameAction::AcceptTrade { offer: offer.id });
                        actions.push(GameAction::DeclineTrade { offer: offer.id });
                    }
                    if offer.from == player {
                        actions.push(GameAction::CancelTrade { offer: offer.id });
                    }
                }
            }

            GamePhase::Ended { .. } => {}
        }

        actions
    }

    // ==================== Snapshot ====================

    /// Flat, JSON-safe mirror for the rebroadcast/persistence collaborators.
    /// Deck order and the RNG stream stay engine-private.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            version: self.version,
            turn: self.turn,
            phase: self.phase.clone(),
            current_player: self.current_player,
            board: self.board.snapshot(),
            bank: self.bank.stock,
            players: self.players.clone(),
            dev_deck_remaining: self.dev_deck.len() as u32,
            dice: self.dice,
            longest_road_holder: self.longest_road_holder,
            largest_army_holder: self.largest_army_holder,
            settings: self.settings.clone(),
        }
    }
}

/// Pick a discard hand for a player: largest piles first until the
/// required count is met. Deterministic, so timeouts are reproducible.
fn greedy_discard(hand: &ResourceHand, count: u32) -> ResourceHand {
    let mut pool = *hand;
    let mut out = ResourceHand::new();
    for _ in 0..count {
        let Some((resource, held)) = Resource::ALL
            .iter()
            .map(|r| (*r, pool.get(*r)))
            .max_by_key(|(_, n)| *n)
        else {
            break;
        };
        if held == 0 {
            break;
        }
        pool.set(resource, held - 1);
        out.add(resource, 1);
    }
    out
}

/// Wire-format state mirror; see [`GameState::snapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub version: u64,
    pub turn: u32,
    pub phase: GamePhase,
    pub current_player: PlayerId,
    pub board: BoardSnapshot,
    pub bank: ResourceHand,
    pub players: Vec<Player>,
    pub dev_deck_remaining: u32,
    pub dice: Option<(u8, u8)>,
    pub longest_road_holder: Option<PlayerId>,
    pub largest_army_holder: Option<PlayerId>,
    pub settings: GameSettings,
}
