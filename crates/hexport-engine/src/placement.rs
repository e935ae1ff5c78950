//! Placement legality and the build-cost flow.
//!
//! Validity is a composition of small predicates, each rejecting with the
//! specific rule that failed; the state machine strings them together with
//! `?`. Payment always moves cards between a player's hand and the bank so
//! the per-resource conservation invariant cannot drift.

use crate::board::{Board, BuildingKind, PlayerId};
use crate::error::GameError;
use crate::hex::{Edge, Vertex};
use crate::ledger::Bank;
use crate::player::{Player, ResourceHand};

/// A settlement site must be on land, vacant, clear of the distance rule
/// and, outside setup, reached by one of the player's roads.
pub fn check_settlement_site(
    board: &Board,
    vertex: Vertex,
    player: PlayerId,
    during_setup: bool,
) -> Result<(), GameError> {
    if !board.is_land_vertex(vertex) {
        return Err(GameError::NotOnLand);
    }
    if board.building_at(vertex).is_some() {
        return Err(GameError::VertexOccupied);
    }
    if !board.distance_rule_ok(vertex) {
        return Err(GameError::DistanceRuleViolated);
    }
    if !during_setup && !board.road_reaches(vertex, player) {
        return Err(GameError::NotConnected);
    }
    Ok(())
}

/// A road site must be on land, vacant and attached to the player's
/// network; during setup it must instead touch the settlement just placed.
pub fn check_road_site(
    board: &Board,
    edge: Edge,
    player: PlayerId,
    setup_anchor: Option<Vertex>,
) -> Result<(), GameError> {
    if !board.is_land_edge(edge) {
        return Err(GameError::NotOnLand);
    }
    if board.road_owner(edge).is_some() {
        return Err(GameError::EdgeOccupied);
    }
    match setup_anchor {
        Some(anchor) => {
            if !anchor.touching_edges().contains(&edge) {
                return Err(GameError::NotConnected);
            }
        }
        None => {
            if !board.connects_to_network(edge, player) {
                return Err(GameError::NotConnected);
            }
        }
    }
    Ok(())
}

/// A city can only replace the player's own settlement.
pub fn check_city_site(board: &Board, vertex: Vertex, player: PlayerId) -> Result<(), GameError> {
    match board.building_at(vertex) {
        Some(b) if b.owner == player && b.kind == BuildingKind::Settlement => Ok(()),
        _ => Err(GameError::NotYourSettlement),
    }
}

/// Move a build cost from the player's hand into the bank.
pub fn pay(player: &mut Player, bank: &mut Bank, cost: &ResourceHand) -> Result<(), GameError> {
    if !player.resources.covers(cost) {
        return Err(GameError::InsufficientResources);
    }
    player.resources.remove(cost);
    bank.deposit(cost);
    Ok(())
}

// ==================== Site enumeration ====================

/// All vertices where the player could legally settle right now.
pub fn settlement_sites(board: &Board, player: PlayerId, during_setup: bool) -> Vec<Vertex> {
    let mut sites: Vec<Vertex> = board
        .land_vertices()
        .into_iter()
        .filter(|v| check_settlement_site(board, *v, player, during_setup).is_ok())
        .collect();
    sites.sort();
    sites
}

/// All edges where the player could legally build a road right now.
pub fn road_sites(board: &Board, player: PlayerId) -> Vec<Edge> {
    let mut sites: Vec<Edge> = board
        .land_edges()
        .into_iter()
        .filter(|e| check_road_site(board, *e, player, None).is_ok())
        .collect();
    sites.sort();
    sites
}

/// Road sites for the setup phase: the edges around the just-placed
/// settlement.
pub fn setup_road_sites(board: &Board, anchor: Vertex) -> Vec<Edge> {
    anchor
        .touching_edges()
        .into_iter()
        .filter(|e| check_road_site(board, *e, 0, Some(anchor)).is_ok())
        .collect()
}

/// The player's settlements, i.e. legal city upgrades.
pub fn city_sites(board: &Board, player: PlayerId) -> Vec<Vertex> {
    let mut sites: Vec<Vertex> = board
        .buildings()
        .filter(|(_, b)| b.owner == player && b.kind == BuildingKind::Settlement)
        .map(|(v, _)| v)
        .collect();
    sites.sort();
    sites
}

/// Starting resources for a second setup settlement: one card per adjacent
/// producing tile. Two adjacent tiles of the same terrain grant two cards;
/// tiles are counted individually, never merged by terrain.
pub fn setup_grant(board: &Board, vertex: Vertex) -> ResourceHand {
    let mut grant = ResourceHand::new();
    for tile in board.tiles_at_vertex(vertex) {
        if let Some(resource) = tile.resource() {
            grant.add(resource, 1);
        }
    }
    grant
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Terrain, Tile};
    use crate::hex::{Corner, Hex};

    fn land_board() -> Board {
        let mut tiles: Vec<Tile> = Hex::disc(1)
            .into_iter()
            .map(|h| Tile::terrain(h, Terrain::Fields, 5))
            .collect();
        let robber = Hex::new(0, 0);
        for h in Hex::disc(2) {
            if !tiles.iter().any(|t| t.coord == h) {
                tiles.push(Tile::water(h));
            }
        }
        Board::assemble(tiles, Vec::new(), robber)
    }

    #[test]
    fn settlement_rejections_name_the_rule() {
        let mut board = land_board();
        let v = Vertex::new(Hex::new(0, 0), Corner::Top);

        // Deep water is not land.
        let wet = Vertex::new(Hex::new(4, 0), Corner::Top);
        assert_eq!(
            check_settlement_site(&board, wet, 0, true),
            Err(GameError::NotOnLand)
        );

        board.put_settlement(v, 1);
        assert_eq!(
            check_settlement_site(&board, v, 0, true),
            Err(GameError::VertexOccupied)
        );
        assert_eq!(
            check_settlement_site(&board, v.adjacent_vertices()[0], 0, true),
            Err(GameError::DistanceRuleViolated)
        );
    }

    #[test]
    fn settlement_outside_setup_needs_a_road() {
        let mut board = land_board();
        let v = Vertex::new(Hex::new(0, 0), Corner::Top);

        assert_eq!(
            check_settlement_site(&board, v, 0, false),
            Err(GameError::NotConnected)
        );
        assert!(check_settlement_site(&board, v, 0, true).is_ok());

        board.put_road(v.touching_edges()[0], 0);
        assert!(check_settlement_site(&board, v, 0, false).is_ok());
    }

    #[test]
    fn road_site_rules() {
        let mut board = land_board();
        let v = Vertex::new(Hex::new(0, 0), Corner::Top);
        let e = v.touching_edges()[0];

        assert_eq!(
            check_road_site(&board, e, 0, None),
            Err(GameError::NotConnected)
        );

        board.put_settlement(v, 0);
        assert!(check_road_site(&board, e, 0, None).is_ok());

        board.put_road(e, 0);
        assert_eq!(
            check_road_site(&board, e, 0, None),
            Err(GameError::EdgeOccupied)
        );
    }

    #[test]
    fn setup_road_must_touch_anchor() {
        let board = land_board();
        let anchor = Vertex::new(Hex::new(0, 0), Corner::Top);
        let near = anchor.touching_edges()[0];
        let far = Vertex::new(Hex::new(0, 1), Corner::Bottom).touching_edges()[0];

        assert!(check_road_site(&board, near, 0, Some(anchor)).is_ok());
        assert_eq!(
            check_road_site(&board, far, 0, Some(anchor)),
            Err(GameError::NotConnected)
        );
    }

    #[test]
    fn city_requires_own_settlement() {
        let mut board = land_board();
        let v = Vertex::new(Hex::new(0, 0), Corner::Top);

        assert_eq!(
            check_city_site(&board, v, 0),
            Err(GameError::NotYourSettlement)
        );
        board.put_settlement(v, 1);
        assert_eq!(
            check_city_site(&board, v, 0),
            Err(GameError::NotYourSettlement)
        );
        assert!(check_city_site(&board, v, 1).is_ok());

        board.promote_to_city(v, 1);
        assert_eq!(
            check_city_site(&board, v, 1),
            Err(GameError::NotYourSettlement),
            "a city cannot be upgraded again"
        );
    }

    #[test]
    fn pay_moves_cost_into_bank() {
        let mut player = Player::new(0, "Ada".into());
        let mut bank = Bank::standard();
        player.resources = ResourceHand::with(1, 1, 0, 0, 0);

        pay(&mut player, &mut bank, &crate::player::costs::ROAD).unwrap();
        assert!(player.resources.is_empty());
        assert_eq!(bank.stock.brick, crate::ledger::BANK_STOCK + 1);

        assert_eq!(
            pay(&mut player, &mut bank, &crate::player::costs::ROAD),
            Err(GameError::InsufficientResources)
        );
    }

    #[test]
    fn grant_counts_duplicate_terrain_per_tile() {
        // All tiles are Fields, so a corner touching three land tiles
        // grants three grain, not one.
        let board = land_board();
        let v = Vertex::new(Hex::new(0, 0), Corner::Top);
        let grant = setup_grant(&board, v);
        assert_eq!(grant, ResourceHand::with(0, 0, 0, 3, 0));
    }

    #[test]
    fn grant_skips_non_producing_tiles() {
        let mut tiles = vec![
            Tile::desert(Hex::new(0, 0)),
            Tile::terrain(Hex::new(0, -1), Terrain::Forest, 8),
            Tile::terrain(Hex::new(1, -1), Terrain::Forest, 4),
        ];
        for h in Hex::disc(2) {
            if !tiles.iter().any(|t| t.coord == h) {
                tiles.push(Tile::water(h));
            }
        }
        let board = Board::assemble(tiles, Vec::new(), Hex::new(0, 0));

        // Corner between the desert and the two forests.
        let v = Vertex::new(Hex::new(0, 0), Corner::Top);
        let grant = setup_grant(&board, v);
        assert_eq!(
            grant,
            ResourceHand::with(0, 2, 0, 0, 0),
            "two forests each grant; the desert grants nothing"
        );
    }
}
