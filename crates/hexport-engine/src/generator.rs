//! Board generation: terrain layout, number tokens, ports.
//!
//! Token placement is shuffle-and-check against the 6/8 non-adjacency rule
//! with a fixed retry bound. Exhausting the bound is a reported failure for
//! the caller to retry, never a silent fallback onto an invalid layout.

use crate::board::{Board, Port, PortKind, Resource, Terrain, Tile, TileKind};
use crate::hex::{Edge, Hex};
use crate::rng::GameRng;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Retry bound for token placement.
pub const TOKEN_LAYOUT_ATTEMPTS: u32 = 100;

/// Board generation failures, surfaced from `initialize_game`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum BoardGenError {
    #[error("no valid number-token layout found in {attempts} attempts")]
    TokenLayout { attempts: u32 },

    #[error("unsupported ring count {0} (expected 2 or 3)")]
    UnsupportedRingCount(u8),

    #[error("{players} players do not fit a ring-{ring_count} board")]
    TooManyPlayers { players: u8, ring_count: u8 },
}

/// Generate a full board for the given map size and seat count.
pub fn generate_board(
    ring_count: u8,
    player_count: u8,
    rng: &mut GameRng,
) -> Result<Board, BoardGenError> {
    let max_players = match ring_count {
        2 => 4,
        3 => 6,
        other => return Err(BoardGenError::UnsupportedRingCount(other)),
    };
    if player_count > max_players {
        return Err(BoardGenError::TooManyPlayers {
            players: player_count,
            ring_count,
        });
    }

    let land_coords = Hex::disc(ring_count as u32);

    // Shuffled terrain pool, one entry per land tile.
    let mut pool = terrain_pool(land_coords.len());
    rng.shuffle(&mut pool);

    // Number tokens go on producing tiles only.
    let producing: Vec<Hex> = land_coords
        .iter()
        .zip(&pool)
        .filter(|(_, t)| t.is_some())
        .map(|(h, _)| *h)
        .collect();
    let tokens = assign_tokens(&producing, rng)?;

    let mut tiles = Vec::with_capacity(land_coords.len() * 2);
    let mut deserts = Vec::new();
    let mut token_iter = tokens.into_iter();
    for (coord, slot) in land_coords.iter().zip(&pool) {
        match slot {
            Some(terrain) => {
                let token = token_iter.next().expect("one token per producing tile");
                tiles.push(Tile::terrain(*coord, *terrain, token));
            }
            None => {
                deserts.push(*coord);
                tiles.push(Tile::desert(*coord));
            }
        }
    }

    // Water ring around the land.
    let land_set: HashSet<Hex> = land_coords.iter().copied().collect();
    let mut water = HashSet::new();
    for coord in &land_coords {
        for n in coord.neighbors() {
            if !land_set.contains(&n) {
                water.insert(n);
            }
        }
    }
    tiles.extend(water.into_iter().map(Tile::water));

    // The robber starts on a desert; the pool always contains at least one.
    let robber = deserts[0];

    let ports = place_ports(&tiles, ring_count, rng);

    Ok(Board::assemble(tiles, ports, robber))
}

/// Terrain distribution for a land area of `count` tiles.
///
/// The base 19-tile pool is 3 hills / 4 forest / 3 mountains / 4 fields /
/// 4 pasture / 1 desert; larger maps cycle through the same pool.
fn terrain_pool(count: usize) -> Vec<Option<Terrain>> {
    const BASE: [Option<Terrain>; 19] = [
        Some(Terrain::Hills),
        Some(Terrain::Hills),
        Some(Terrain::Hills),
        Some(Terrain::Forest),
        Some(Terrain::Forest),
        Some(Terrain::Forest),
        Some(Terrain::Forest),
        Some(Terrain::Mountains),
        Some(Terrain::Mountains),
        Some(Terrain::Mountains),
        Some(Terrain::Fields),
        Some(Terrain::Fields),
        Some(Terrain::Fields),
        Some(Terrain::Fields),
        Some(Terrain::Pasture),
        Some(Terrain::Pasture),
        Some(Terrain::Pasture),
        Some(Terrain::Pasture),
        None, // desert
    ];
    BASE.iter().copied().cycle().take(count).collect()
}

/// Number-token distribution for `count` producing tiles (no 7s; 2 and 12
/// appear half as often as the rest).
fn token_pool(count: usize) -> Vec<u8> {
    const BASE: [u8; 18] = [2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12];
    BASE.iter().copied().cycle().take(count).collect()
}

/// Shuffle tokens until no two red numbers (6 or 8) sit on adjacent tiles,
/// within the retry bound.
fn assign_tokens(producing: &[Hex], rng: &mut GameRng) -> Result<Vec<u8>, BoardGenError> {
    let mut tokens = token_pool(producing.len());
    for _ in 0..TOKEN_LAYOUT_ATTEMPTS {
        rng.shuffle(&mut tokens);
        if red_tokens_separated(producing, &tokens) {
            return Ok(tokens);
        }
    }
    Err(BoardGenError::TokenLayout {
        attempts: TOKEN_LAYOUT_ATTEMPTS,
    })
}

fn red_tokens_separated(producing: &[Hex], tokens: &[u8]) -> bool {
    let by_coord: HashMap<Hex, u8> = producing.iter().copied().zip(tokens.iter().copied()).collect();
    for (coord, token) in &by_coord {
        if *token != 6 && *token != 8 {
            continue;
        }
        for n in coord.neighbors() {
            if let Some(other) = by_coord.get(&n) {
                if *other == 6 || *other == 8 {
                    return false;
                }
            }
        }
    }
    true
}

/// Port pool for a map size: the base board carries 4 generic and 5
/// resource-specific ports; ring-3 maps add two more generic ones.
fn port_pool(ring_count: u8) -> Vec<PortKind> {
    let generic = if ring_count >= 3 { 6 } else { 4 };
    let mut pool = vec![PortKind::Generic; generic];
    pool.extend(Resource::ALL.map(PortKind::Specific));
    pool
}

/// Spread ports along the coast: shuffle the kinds, then greedily pick
/// coastal edges maximizing the minimum distance to those already chosen.
fn place_ports(tiles: &[Tile], ring_count: u8, rng: &mut GameRng) -> Vec<Port> {
    let mut kinds = port_pool(ring_count);
    rng.shuffle(&mut kinds);

    let coastal = coastal_edges(tiles);
    let mut available = coastal;
    rng.shuffle(&mut available);

    let mut chosen: Vec<Edge> = Vec::new();
    while chosen.len() < kinds.len() && !available.is_empty() {
        let (idx, _) = available
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let spread = chosen
                    .iter()
                    .map(|c| edge_spread(*e, *c))
                    .min()
                    .unwrap_or(u32::MAX);
                (i, spread)
            })
            .max_by_key(|(_, spread)| *spread)
            .expect("available is non-empty");
        chosen.push(available.swap_remove(idx));
    }

    chosen
        .into_iter()
        .zip(kinds)
        .map(|(edge, kind)| Port {
            kind,
            vertices: edge.endpoints(),
        })
        .collect()
}

/// Edges between a land tile and water (or the void beyond the map).
fn coastal_edges(tiles: &[Tile]) -> Vec<Edge> {
    let by_coord: HashMap<Hex, &Tile> = tiles.iter().map(|t| (t.coord, t)).collect();
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for tile in tiles.iter().filter(|t| t.is_land()) {
        for edge in tile.coord.edges() {
            if !seen.insert(edge) {
                continue;
            }
            let wet = edge.touching_hexes().iter().any(|h| {
                by_coord
                    .get(h)
                    .map_or(true, |t| matches!(t.kind, TileKind::Water))
            });
            if wet {
                out.push(edge);
            }
        }
    }
    out.sort();
    out
}

/// Coarse separation measure between two edges.
fn edge_spread(a: Edge, b: Edge) -> u32 {
    let [a1, a2] = a.touching_hexes();
    let [b1, b2] = b.touching_hexes();
    let d = |x: Hex, y: Hex| x.distance(y);
    d(a1, b1).min(d(a1, b2)).min(d(a2, b1)).min(d(a2, b2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BuildingKind;

    #[test]
    fn base_board_tile_counts() {
        let mut rng = GameRng::new(21);
        let board = generate_board(2, 4, &mut rng).unwrap();

        assert_eq!(board.land_tiles().count(), 19);

        let mut hills = 0;
        let mut forest = 0;
        let mut mountains = 0;
        let mut fields = 0;
        let mut pasture = 0;
        let mut desert = 0;
        for tile in board.land_tiles() {
            match tile.kind {
                TileKind::Terrain(Terrain::Hills) => hills += 1,
                TileKind::Terrain(Terrain::Forest) => forest += 1,
                TileKind::Terrain(Terrain::Mountains) => mountains += 1,
                TileKind::Terrain(Terrain::Fields) => fields += 1,
                TileKind::Terrain(Terrain::Pasture) => pasture += 1,
                TileKind::Desert => desert += 1,
                _ => {}
            }
        }
        assert_eq!((hills, forest, mountains), (3, 4, 3));
        assert_eq!((fields, pasture, desert), (4, 4, 1));
    }

    #[test]
    fn base_board_token_counts() {
        let mut rng = GameRng::new(22);
        let board = generate_board(2, 3, &mut rng).unwrap();

        let mut counts: HashMap<u8, u32> = HashMap::new();
        for tile in board.land_tiles() {
            if let Some(t) = tile.token {
                *counts.entry(t).or_insert(0) += 1;
            }
        }
        assert_eq!(counts.get(&2), Some(&1));
        assert_eq!(counts.get(&7), None);
        assert_eq!(counts.get(&12), Some(&1));
        for n in [3u8, 4, 5, 6, 8, 9, 10, 11] {
            assert_eq!(counts.get(&n), Some(&2), "expected two {n} tokens");
        }
    }

    #[test]
    fn red_tokens_never_adjacent() {
        for seed in 0..20 {
            let mut rng = GameRng::new(seed);
            let board = generate_board(2, 4, &mut rng).unwrap();

            let tokens: HashMap<Hex, u8> = board
                .land_tiles()
                .filter_map(|t| t.token.map(|n| (t.coord, n)))
                .collect();
            for (coord, token) in &tokens {
                if *token != 6 && *token != 8 {
                    continue;
                }
                for n in coord.neighbors() {
                    if let Some(other) = tokens.get(&n) {
                        assert!(
                            *other != 6 && *other != 8,
                            "seed {seed}: {token} at {coord} adjacent to {other}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn robber_starts_on_desert() {
        let mut rng = GameRng::new(5);
        let board = generate_board(2, 4, &mut rng).unwrap();
        let tile = board.tile(board.robber()).unwrap();
        assert_eq!(tile.kind, TileKind::Desert);
        assert!(tile.has_robber);
    }

    #[test]
    fn base_board_port_distribution() {
        let mut rng = GameRng::new(9);
        let board = generate_board(2, 4, &mut rng).unwrap();
        let ports = board.ports();

        assert_eq!(ports.len(), 9);
        let generic = ports
            .iter()
            .filter(|p| p.kind == PortKind::Generic)
            .count();
        assert_eq!(generic, 4);
        for resource in Resource::ALL {
            assert!(
                ports.iter().any(|p| p.kind == PortKind::Specific(resource)),
                "missing 2:1 port for {resource:?}"
            );
        }
    }

    #[test]
    fn ports_sit_on_the_coast() {
        let mut rng = GameRng::new(14);
        let board = generate_board(2, 4, &mut rng).unwrap();
        let land_verts = board.land_vertices();
        for port in board.ports() {
            for v in port.vertices {
                assert!(
                    land_verts.contains(&v),
                    "port vertex {v} must be buildable land"
                );
            }
        }
    }

    #[test]
    fn ring_three_board_scales_up() {
        let mut rng = GameRng::new(2);
        let board = generate_board(3, 6, &mut rng).unwrap();
        assert_eq!(board.land_tiles().count(), 37);
        assert_eq!(board.ports().len(), 11);
    }

    #[test]
    fn invalid_configs_are_reported() {
        let mut rng = GameRng::new(1);
        assert!(matches!(
            generate_board(5, 4, &mut rng),
            Err(BoardGenError::UnsupportedRingCount(5))
        ));
        assert!(matches!(
            generate_board(2, 6, &mut rng),
            Err(BoardGenError::TooManyPlayers {
                players: 6,
                ring_count: 2
            })
        ));
    }

    #[test]
    fn generation_is_seed_deterministic() {
        let a = generate_board(2, 4, &mut GameRng::new(77)).unwrap();
        let b = generate_board(2, 4, &mut GameRng::new(77)).unwrap();
        assert_eq!(
            serde_json::to_string(&a.snapshot()).unwrap(),
            serde_json::to_string(&b.snapshot()).unwrap()
        );
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_board(2, 4, &mut GameRng::new(1)).unwrap();
        let mut found_different = false;
        for seed in 2..12 {
            let b = generate_board(2, 4, &mut GameRng::new(seed)).unwrap();
            if serde_json::to_string(&a.snapshot()).unwrap()
                != serde_json::to_string(&b.snapshot()).unwrap()
            {
                found_different = true;
                break;
            }
        }
        assert!(found_different);
    }

    #[test]
    fn generated_board_starts_empty() {
        let mut rng = GameRng::new(4);
        let board = generate_board(2, 2, &mut rng).unwrap();
        assert_eq!(board.buildings().count(), 0);
        assert_eq!(board.roads().count(), 0);
        assert!(!board
            .buildings()
            .any(|(_, b)| b.kind == BuildingKind::City));
    }
}
