//! Bank bookkeeping and dice-roll production.
//!
//! The bank holds 19 cards of each resource; together with the players'
//! hands that total is conserved through every reachable state. Roll
//! payouts are *planned* against the bank first so the shortage policy can
//! be applied per resource type before anything moves.

use crate::board::{Board, PlayerId, Resource};
use crate::player::ResourceHand;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Bank stock per resource at game start.
pub const BANK_STOCK: u32 = 19;

/// Resource-supply capability the payout planner is written against.
pub trait Ledger {
    fn available(&self, resource: Resource) -> u32;
}

/// The bank's resource stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub stock: ResourceHand,
}

impl Bank {
    pub fn standard() -> Self {
        Self {
            stock: ResourceHand::uniform(BANK_STOCK),
        }
    }

    /// Take a bundle out of the bank; fails without mutation when the
    /// stock cannot cover it.
    pub fn withdraw(&mut self, bundle: &ResourceHand) -> bool {
        self.stock.remove(bundle)
    }

    /// Return a bundle to the bank.
    pub fn deposit(&mut self, bundle: &ResourceHand) {
        self.stock.add_all(bundle);
    }

    /// Take up to `want` of one resource, returning what was actually
    /// available.
    pub fn withdraw_up_to(&mut self, resource: Resource, want: u32) -> u32 {
        let got = want.min(self.stock.get(resource));
        self.stock.set(resource, self.stock.get(resource) - got);
        got
    }
}

impl Ledger for Bank {
    fn available(&self, resource: Resource) -> u32 {
        self.stock.get(resource)
    }
}

/// Outcome of planning a roll's production against the bank.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollPayout {
    /// Per-player grants, in seat order.
    pub grants: Vec<(PlayerId, ResourceHand)>,
    /// Resource types withheld entirely because two or more claimants
    /// outstripped the stock.
    pub withheld: Vec<Resource>,
}

impl RollPayout {
    /// Total cards granted across all players.
    pub fn total(&self) -> u32 {
        self.grants.iter().map(|(_, hand)| hand.total()).sum()
    }
}

/// Compute who is owed what for a dice roll, then reconcile each resource
/// type against the bank independently:
///
/// - demand covered by stock: paid in full;
/// - a single claimant: paid whatever remains (partial allowed);
/// - two or more claimants the stock cannot cover: that resource type is
///   withheld from everyone this roll.
pub fn plan_roll_payout<L: Ledger>(board: &Board, ledger: &L, roll: u8) -> RollPayout {
    // Raw demand, before bank limits. BTreeMap keeps seat order stable.
    let mut demand: BTreeMap<PlayerId, ResourceHand> = BTreeMap::new();
    for tile in board.land_tiles() {
        if !tile.produces_on(roll) {
            continue;
        }
        let resource = match tile.resource() {
            Some(r) => r,
            None => continue,
        };
        for vertex in tile.coord.vertices() {
            if let Some(building) = board.building_at(vertex) {
                demand
                    .entry(building.owner)
                    .or_default()
                    .add(resource, building.kind.yield_multiplier());
            }
        }
    }

    let mut withheld = Vec::new();
    for resource in Resource::ALL {
        let claimants: Vec<PlayerId> = demand
            .iter()
            .filter(|(_, hand)| hand.get(resource) > 0)
            .map(|(p, _)| *p)
            .collect();
        if claimants.is_empty() {
            continue;
        }

        let total: u32 = demand.values().map(|hand| hand.get(resource)).sum();
        let stock = ledger.available(resource);

        if total <= stock {
            continue; // full payment
        }
        if claimants.len() == 1 {
            // Sole claimant drains the remaining stock.
            demand.get_mut(&claimants[0]).unwrap().set(resource, stock);
            if stock == 0 {
                withheld.push(resource);
            }
        } else {
            for hand in demand.values_mut() {
                hand.set(resource, 0);
            }
            withheld.push(resource);
        }
    }

    RollPayout {
        grants: demand
            .into_iter()
            .filter(|(_, hand)| !hand.is_empty())
            .collect(),
        withheld,
    }
}
