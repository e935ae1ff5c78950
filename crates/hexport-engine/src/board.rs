//! Game board representation: tiles, buildings, roads, ports, robber.
//!
//! The board is a value type. Pieces are stored as flat maps keyed by
//! canonical coordinates; anything graph-shaped (the road network) is
//! rebuilt on demand from the flat lists, which keeps the whole struct
//! trivially serializable and cheap to clone at board scale.

use crate::hex::{Edge, Hex, Vertex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Player identifier (seat index, 0-based).
pub type PlayerId = u8;

/// The five tradeable resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Brick,
    Lumber,
    Ore,
    Grain,
    Wool,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Lumber,
        Resource::Ore,
        Resource::Grain,
        Resource::Wool,
    ];
}

/// Producing terrain types, each mapped to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Hills,
    Forest,
    Mountains,
    Fields,
    Pasture,
}

impl Terrain {
    pub const ALL: [Terrain; 5] = [
        Terrain::Hills,
        Terrain::Forest,
        Terrain::Mountains,
        Terrain::Fields,
        Terrain::Pasture,
    ];

    /// The resource this terrain produces.
    pub const fn resource(self) -> Resource {
        match self {
            Terrain::Hills => Resource::Brick,
            Terrain::Forest => Resource::Lumber,
            Terrain::Mountains => Resource::Ore,
            Terrain::Fields => Resource::Grain,
            Terrain::Pasture => Resource::Wool,
        }
    }
}

/// What a tile is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileKind {
    /// Produces its terrain's resource when its number is rolled.
    Terrain(Terrain),
    /// No production; the robber's starting tile.
    Desert,
    /// Surrounds the playable area; nothing can be built here.
    Water,
    /// Unrevealed tile on fog maps; not buildable, not a robber target.
    Fog,
}

/// A single hex tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub coord: Hex,
    pub kind: TileKind,
    /// Production number (2-12, never 7); None for non-producing tiles.
    pub token: Option<u8>,
    pub has_robber: bool,
}

impl Tile {
    pub fn terrain(coord: Hex, terrain: Terrain, token: u8) -> Self {
        Self {
            coord,
            kind: TileKind::Terrain(terrain),
            token: Some(token),
            has_robber: false,
        }
    }

    pub fn desert(coord: Hex) -> Self {
        Self {
            coord,
            kind: TileKind::Desert,
            token: None,
            has_robber: false,
        }
    }

    pub fn water(coord: Hex) -> Self {
        Self {
            coord,
            kind: TileKind::Water,
            token: None,
            has_robber: false,
        }
    }

    /// Buildable ground (terrain or desert).
    pub fn is_land(&self) -> bool {
        matches!(self.kind, TileKind::Terrain(_) | TileKind::Desert)
    }

    /// The resource this tile would produce, robber or not.
    pub fn resource(&self) -> Option<Resource> {
        match self.kind {
            TileKind::Terrain(t) => Some(t.resource()),
            _ => None,
        }
    }

    /// Whether a roll of `roll` makes this tile pay out.
    pub fn produces_on(&self, roll: u8) -> bool {
        self.token == Some(roll) && !self.has_robber && self.resource().is_some()
    }
}

/// Building kind on a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingKind {
    Settlement,
    City,
}

impl BuildingKind {
    pub const fn victory_points(self) -> u32 {
        match self {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }

    /// Cards received per adjacent production event.
    pub const fn yield_multiplier(self) -> u32 {
        match self {
            BuildingKind::Settlement => 1,
            BuildingKind::City => 2,
        }
    }
}

/// A settlement or city, keyed by its vertex in [`Board::buildings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub kind: BuildingKind,
    pub owner: PlayerId,
}

/// A road, keyed by its edge in [`Board::roads`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Road {
    pub owner: PlayerId,
}

/// Port trade kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortKind {
    /// 3:1, any resource.
    Generic,
    /// 2:1 for the named resource.
    Specific(Resource),
}

impl PortKind {
    pub const fn rate(self) -> u32 {
        match self {
            PortKind::Generic => 3,
            PortKind::Specific(_) => 2,
        }
    }
}

/// A port and the two vertices that grant access to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub kind: PortKind,
    pub vertices: [Vertex; 2],
}

/// Read access to the board, the seam the rules engines are written
/// against so they can be exercised on synthetic fixtures.
pub trait BoardQuery {
    fn tile(&self, coord: Hex) -> Option<&Tile>;
    fn building_at(&self, vertex: Vertex) -> Option<Building>;
    fn road_owner(&self, edge: Edge) -> Option<PlayerId>;
    fn roads_of(&self, player: PlayerId) -> Vec<Edge>;
    fn ports(&self) -> &[Port];
}

/// The complete game board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    tiles: HashMap<Hex, Tile>,
    buildings: HashMap<Vertex, Building>,
    roads: HashMap<Edge, Road>,
    ports: Vec<Port>,
    robber: Hex,
}

impl Board {
    /// Assemble a board from generated parts. The robber flag on the
    /// starting tile is set here.
    pub fn assemble(tiles: Vec<Tile>, ports: Vec<Port>, robber: Hex) -> Self {
        let mut map: HashMap<Hex, Tile> = tiles.into_iter().map(|t| (t.coord, t)).collect();
        if let Some(tile) = map.get_mut(&robber) {
            tile.has_robber = true;
        }
        Self {
            tiles: map,
            buildings: HashMap::new(),
            roads: HashMap::new(),
            ports,
            robber,
        }
    }

    // ==================== Queries ====================

    pub fn robber(&self) -> Hex {
        self.robber
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Land tiles only (terrain + desert).
    pub fn land_tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values().filter(|t| t.is_land())
    }

    pub fn buildings(&self) -> impl Iterator<Item = (Vertex, Building)> + '_ {
        self.buildings.iter().map(|(v, b)| (*v, *b))
    }

    pub fn roads(&self) -> impl Iterator<Item = (Edge, Road)> + '_ {
        self.roads.iter().map(|(e, r)| (*e, *r))
    }

    /// Vertices touching at least one land tile.
    pub fn land_vertices(&self) -> HashSet<Vertex> {
        let mut out = HashSet::new();
        for tile in self.land_tiles() {
            out.extend(tile.coord.vertices());
        }
        out
    }

    /// Edges touching at least one land tile.
    pub fn land_edges(&self) -> HashSet<Edge> {
        let mut out = HashSet::new();
        for tile in self.land_tiles() {
            out.extend(tile.coord.edges());
        }
        out
    }

    pub fn is_land_vertex(&self, vertex: Vertex) -> bool {
        vertex
            .touching_hexes()
            .iter()
            .any(|h| self.tiles.get(h).is_some_and(Tile::is_land))
    }

    pub fn is_land_edge(&self, edge: Edge) -> bool {
        edge.touching_hexes()
            .iter()
            .any(|h| self.tiles.get(h).is_some_and(Tile::is_land))
    }

    /// Land tiles adjacent to a vertex.
    pub fn tiles_at_vertex(&self, vertex: Vertex) -> Vec<&Tile> {
        vertex
            .touching_hexes()
            .iter()
            .filter_map(|h| self.tiles.get(h))
            .filter(|t| t.is_land())
            .collect()
    }

    /// No settlement or city on this vertex or any adjacent vertex.
    pub fn distance_rule_ok(&self, vertex: Vertex) -> bool {
        if self.buildings.contains_key(&vertex) {
            return false;
        }
        vertex
            .adjacent_vertices()
            .iter()
            .all(|adj| !self.buildings.contains_key(adj))
    }

    /// Whether one of the player's roads reaches this vertex.
    pub fn road_reaches(&self, vertex: Vertex, player: PlayerId) -> bool {
        vertex
            .touching_edges()
            .iter()
            .any(|e| self.road_owner(*e) == Some(player))
    }

    /// Whether an edge connects to the player's network: an owned building
    /// at an endpoint, or an owned road through an endpoint that is not
    /// blocked by an opposing building.
    pub fn connects_to_network(&self, edge: Edge, player: PlayerId) -> bool {
        for endpoint in edge.endpoints() {
            match self.building_at(endpoint) {
                Some(b) if b.owner == player => return true,
                Some(_) => continue, // opposing building blocks through-traffic
                None => {}
            }
            for adj in endpoint.touching_edges() {
                if adj != edge && self.road_owner(adj) == Some(player) {
                    return true;
                }
            }
        }
        false
    }

    /// Players owning a building adjacent to the given hex.
    pub fn occupants_of(&self, hex: Hex) -> HashSet<PlayerId> {
        let mut out = HashSet::new();
        if self.tiles.contains_key(&hex) {
            for vertex in hex.vertices() {
                if let Some(b) = self.building_at(vertex) {
                    out.insert(b.owner);
                }
            }
        }
        out
    }

    /// Port kinds the player has settled access to.
    pub fn ports_of(&self, player: PlayerId) -> Vec<PortKind> {
        let mut out = Vec::new();
        for port in &self.ports {
            let reached = port
                .vertices
                .iter()
                .any(|v| self.building_at(*v).is_some_and(|b| b.owner == player));
            if reached {
                out.push(port.kind);
            }
        }
        out
    }

    pub fn settlement_count(&self, player: PlayerId) -> u32 {
        self.count_buildings(player, BuildingKind::Settlement)
    }

    pub fn city_count(&self, player: PlayerId) -> u32 {
        self.count_buildings(player, BuildingKind::City)
    }

    fn count_buildings(&self, player: PlayerId, kind: BuildingKind) -> u32 {
        self.buildings
            .values()
            .filter(|b| b.owner == player && b.kind == kind)
            .count() as u32
    }

    /// Public victory points from pieces on the board.
    pub fn building_points(&self, player: PlayerId) -> u32 {
        self.buildings
            .values()
            .filter(|b| b.owner == player)
            .map(|b| b.kind.victory_points())
            .sum()
    }

    // ==================== Mutations ====================
    //
    // Callers are expected to have validated through `placement`; these
    // only keep the flat maps and the robber flag coherent.

    pub fn put_settlement(&mut self, vertex: Vertex, owner: PlayerId) {
        self.buildings.insert(
            vertex,
            Building {
                kind: BuildingKind::Settlement,
                owner,
            },
        );
    }

    pub fn promote_to_city(&mut self, vertex: Vertex, owner: PlayerId) {
        self.buildings.insert(
            vertex,
            Building {
                kind: BuildingKind::City,
                owner,
            },
        );
    }

    pub fn put_road(&mut self, edge: Edge, owner: PlayerId) {
        self.roads.insert(edge, Road { owner });
    }

    pub fn move_robber(&mut self, to: Hex) {
        if let Some(tile) = self.tiles.get_mut(&self.robber) {
            tile.has_robber = false;
        }
        if let Some(tile) = self.tiles.get_mut(&to) {
            tile.has_robber = true;
        }
        self.robber = to;
    }

    // ==================== Snapshot ====================

    /// Flat, array-based mirror for JSON serialization (structured map
    /// keys do not survive serde_json).
    pub fn snapshot(&self) -> BoardSnapshot {
        let mut tiles: Vec<TileSnapshot> = self
            .tiles
            .values()
            .map(|t| TileSnapshot {
                hex: t.coord.to_string(),
                kind: t.kind,
                token: t.token,
                has_robber: t.has_robber,
            })
            .collect();
        tiles.sort_by(|a, b| a.hex.cmp(&b.hex));

        let mut buildings: Vec<BuildingSnapshot> = self
            .buildings
            .iter()
            .map(|(v, b)| BuildingSnapshot {
                vertex: v.to_string(),
                kind: b.kind,
                owner: b.owner,
            })
            .collect();
        buildings.sort_by(|a, b| a.vertex.cmp(&b.vertex));

        let mut roads: Vec<RoadSnapshot> = self
            .roads
            .iter()
            .map(|(e, r)| RoadSnapshot {
                edge: e.to_string(),
                owner: r.owner,
            })
            .collect();
        roads.sort_by(|a, b| a.edge.cmp(&b.edge));

        BoardSnapshot {
            tiles,
            buildings,
            roads,
            ports: self
                .ports
                .iter()
                .map(|p| PortSnapshot {
                    kind: p.kind,
                    vertices: [p.vertices[0].to_string(), p.vertices[1].to_string()],
                })
                .collect(),
            robber: self.robber.to_string(),
        }
    }
}

impl BoardQuery for Board {
    fn tile(&self, coord: Hex) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    fn building_at(&self, vertex: Vertex) -> Option<Building> {
        self.buildings.get(&vertex).copied()
    }

    fn road_owner(&self, edge: Edge) -> Option<PlayerId> {
        self.roads.get(&edge).map(|r| r.owner)
    }

    fn roads_of(&self, player: PlayerId) -> Vec<Edge> {
        self.roads
            .iter()
            .filter(|(_, r)| r.owner == player)
            .map(|(e, _)| *e)
            .collect()
    }

    fn ports(&self) -> &[Port] {
        &self.ports
    }
}

// Convenience forwarding so `Board` users don't need the trait in scope.
impl Board {
    pub fn tile(&self, coord: Hex) -> Option<&Tile> {
        self.tiles.get(&coord)
    }

    pub fn building_at(&self, vertex: Vertex) -> Option<Building> {
        self.buildings.get(&vertex).copied()
    }

    pub fn road_owner(&self, edge: Edge) -> Option<PlayerId> {
        self.roads.get(&edge).map(|r| r.owner)
    }

    pub fn roads_of(&self, player: PlayerId) -> Vec<Edge> {
        BoardQuery::roads_of(self, player)
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }
}

/// JSON-friendly board mirror; coordinates become canonical string keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSnapshot {
    pub tiles: Vec<TileSnapshot>,
    pub buildings: Vec<BuildingSnapshot>,
    pub roads: Vec<RoadSnapshot>,
    pub ports: Vec<PortSnapshot>,
    pub robber: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub hex: String,
    pub kind: TileKind,
    pub token: Option<u8>,
    pub has_robber: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingSnapshot {
    pub vertex: String,
    pub kind: BuildingKind,
    pub owner: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoadSnapshot {
    pub edge: String,
    pub owner: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortSnapshot {
    pub kind: PortKind,
    pub vertices: [String; 2],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::Corner;

    fn tiny_board() -> Board {
        // One desert in the middle of a water ring.
        let center = Hex::new(0, 0);
        let mut tiles = vec![Tile::desert(center)];
        tiles.push(Tile::terrain(Hex::new(1, 0), Terrain::Forest, 6));
        tiles.push(Tile::terrain(Hex::new(0, 1), Terrain::Hills, 5));
        for h in Hex::disc(2) {
            if !tiles.iter().any(|t| t.coord == h) {
                tiles.push(Tile::water(h));
            }
        }
        Board::assemble(tiles, Vec::new(), center)
    }

    #[test]
    fn robber_flag_set_on_assembly() {
        let board = tiny_board();
        assert!(board.tile(board.robber()).unwrap().has_robber);
    }

    #[test]
    fn robber_blocks_production() {
        let mut board = tiny_board();
        let forest = Hex::new(1, 0);
        assert!(board.tile(forest).unwrap().produces_on(6));

        board.move_robber(forest);
        assert!(!board.tile(forest).unwrap().produces_on(6));
        assert!(!board.tile(Hex::new(0, 0)).unwrap().has_robber);
    }

    #[test]
    fn distance_rule_blocks_neighbors() {
        let mut board = tiny_board();
        let v = Vertex::new(Hex::new(0, 0), Corner::Top);
        assert!(board.distance_rule_ok(v));

        board.put_settlement(v, 0);
        assert!(!board.distance_rule_ok(v));
        for adj in v.adjacent_vertices() {
            assert!(
                !board.distance_rule_ok(adj),
                "vertex one edge from a settlement must fail the distance rule"
            );
        }
    }

    #[test]
    fn network_connectivity_through_roads() {
        let mut board = tiny_board();
        let v = Vertex::new(Hex::new(0, 0), Corner::Top);
        board.put_settlement(v, 1);

        let edges = v.touching_edges();
        assert!(board.connects_to_network(edges[0], 1));
        assert!(!board.connects_to_network(edges[0], 0));

        board.put_road(edges[0], 1);
        let far = edges[0]
            .endpoints()
            .into_iter()
            .find(|e| *e != v)
            .unwrap();
        for next in far.touching_edges() {
            if next != edges[0] {
                assert!(board.connects_to_network(next, 1));
            }
        }
    }

    #[test]
    fn opposing_building_blocks_network_extension() {
        let mut board = tiny_board();
        let v = Vertex::new(Hex::new(0, 0), Corner::Top);
        let edge = v.touching_edges()[0];
        board.put_road(edge, 1);

        // Opponent settles on the far endpoint; player 1 cannot extend
        // through it.
        let far = edge.endpoints().into_iter().find(|e| *e != v).unwrap();
        board.put_settlement(far, 0);

        for next in far.touching_edges() {
            if next != edge {
                assert!(
                    !board.connects_to_network(next, 1),
                    "road may not continue through an opposing settlement"
                );
            }
        }
    }

    #[test]
    fn occupants_of_hex() {
        let mut board = tiny_board();
        let hex = Hex::new(1, 0);
        board.put_settlement(hex.vertices()[0], 2);
        board.put_settlement(hex.vertices()[3], 1);

        let occupants = board.occupants_of(hex);
        assert!(occupants.contains(&1));
        assert!(occupants.contains(&2));
        assert_eq!(occupants.len(), 2);
    }

    #[test]
    fn ports_require_a_building_on_their_vertices() {
        let center = Hex::new(0, 0);
        let vertex = Vertex::new(center, Corner::Top);
        let edge = vertex.touching_edges()[0];
        let port = Port {
            kind: PortKind::Specific(Resource::Ore),
            vertices: edge.endpoints(),
        };
        let mut tiles = vec![Tile::desert(center)];
        for h in Hex::disc(1) {
            if h != center {
                tiles.push(Tile::water(h));
            }
        }
        let mut board = Board::assemble(tiles, vec![port], center);

        assert!(board.ports_of(3).is_empty());
        board.put_settlement(vertex, 3);
        assert_eq!(board.ports_of(3), vec![PortKind::Specific(Resource::Ore)]);
    }

    #[test]
    fn snapshot_is_flat_and_json_safe() {
        let mut board = tiny_board();
        board.put_settlement(Vertex::new(Hex::new(0, 0), Corner::Top), 0);
        board.put_road(Edge::new(Hex::new(0, 0), crate::hex::Side::NorthEast), 0);

        let snap = board.snapshot();
        assert_eq!(snap.buildings.len(), 1);
        assert_eq!(snap.roads.len(), 1);
        // Must serialize through serde_json without structured-key errors.
        let json = serde_json::to_string(&snap).unwrap();
        assert!(json.contains("robber"));
    }
}
