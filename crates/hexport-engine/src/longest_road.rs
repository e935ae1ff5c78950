//! Longest-road search and the achievement holder policy.
//!
//! The road network is rebuilt on demand as a vertex-keyed adjacency list
//! over one player's edges; no pointer graph is kept in the state. The
//! search is a depth-first walk from every vertex the player's roads touch,
//! which is exponential in branching in the worst case but comfortably fast
//! at board scale (at most 15 roads per player). If maps ever grow past
//! that, memoizing per connected component is the known next step.

use crate::board::{BoardQuery, PlayerId};
use crate::hex::{Edge, Vertex};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Minimum route length to qualify for Longest Road.
pub const MIN_LONGEST_ROAD: u32 = 5;

/// The best route found for a player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadRoute {
    pub length: u32,
    pub edges: Vec<Edge>,
}

/// Compute the player's longest contiguous road.
///
/// A vertex occupied by an *opposing* building cannot be passed through:
/// it ends the route on arrival, but edges on its far side still form
/// their own segments (and a route may begin there).
pub fn longest_route<B: BoardQuery>(board: &B, player: PlayerId) -> RoadRoute {
    let edges = board.roads_of(player);
    if edges.is_empty() {
        return RoadRoute::default();
    }

    let mut adjacency: HashMap<Vertex, Vec<Edge>> = HashMap::new();
    for edge in &edges {
        for endpoint in edge.endpoints() {
            adjacency.entry(endpoint).or_default().push(*edge);
        }
    }

    let blocked: HashSet<Vertex> = adjacency
        .keys()
        .filter(|v| {
            board
                .building_at(**v)
                .is_some_and(|b| b.owner != player)
        })
        .copied()
        .collect();

    let mut best: Vec<Edge> = Vec::new();
    let mut starts: Vec<Vertex> = adjacency.keys().copied().collect();
    starts.sort();
    for start in starts {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        walk(start, &adjacency, &blocked, &mut visited, &mut path, &mut best);
    }

    RoadRoute {
        length: best.len() as u32,
        edges: best,
    }
}

fn walk(
    at: Vertex,
    adjacency: &HashMap<Vertex, Vec<Edge>>,
    blocked: &HashSet<Vertex>,
    visited: &mut HashSet<Edge>,
    path: &mut Vec<Edge>,
    best: &mut Vec<Edge>,
) {
    if path.len() > best.len() {
        *best = path.clone();
    }
    // A route may start at an opposing building but never pass through one.
    if !path.is_empty() && blocked.contains(&at) {
        return;
    }
    let continuations = adjacency.get(&at).map(Vec::as_slice).unwrap_or(&[]);
    for &edge in continuations {
        if visited.contains(&edge) {
            continue;
        }
        visited.insert(edge);
        path.push(edge);
        let [a, b] = edge.endpoints();
        let next = if a == at { b } else { a };
        walk(next, adjacency, blocked, visited, path, best);
        path.pop();
        visited.remove(&edge);
    }
}

/// Resolve an achievement holder from `(player, score)` pairs: the title
/// goes to the unique maximum at or above `min`; a tie at the maximum
/// awards nobody (stripping the current holder if they are among the tied
/// or have fallen below the minimum).
pub fn unique_max_holder(scores: &[(PlayerId, u32)], min: u32) -> Option<PlayerId> {
    let max = scores.iter().map(|(_, n)| *n).max().unwrap_or(0);
    if max < min {
        return None;
    }
    let mut at_max = scores.iter().filter(|(_, n)| *n == max);
    let first = at_max.next()?;
    if at_max.next().is_some() {
        None
    } else {
        Some(first.0)
    }
}

/// The Longest Road policy applied to cached route lengths.
pub fn longest_road_holder(lengths: &[(PlayerId, u32)]) -> Option<PlayerId> {
    unique_max_holder(lengths, MIN_LONGEST_ROAD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Terrain, Tile};
    use crate::hex::{Corner, Hex};

    fn open_board() -> Board {
        // Enough land that chains never run off the map.
        let mut tiles: Vec<Tile> = Hex::disc(2)
            .into_iter()
            .map(|h| Tile::terrain(h, Terrain::Pasture, 9))
            .collect();
        let robber = tiles[0].coord;
        for h in Hex::disc(3) {
            if !tiles.iter().any(|t| t.coord == h) {
                tiles.push(Tile::water(h));
            }
        }
        Board::assemble(tiles, Vec::new(), robber)
    }

    /// Lay a non-self-intersecting chain of `len` roads from a vertex,
    /// returning the vertices in visit order.
    fn lay_chain(board: &mut Board, player: PlayerId, len: usize) -> Vec<Vertex> {
        let mut at = Vertex::new(Hex::new(0, 0), Corner::Top);
        let mut seen = vec![at];
        for _ in 0..len {
            let step = at
                .touching_edges()
                .into_iter()
                .find_map(|e| {
                    let far = e.endpoints().into_iter().find(|v| *v != at)?;
                    (!seen.contains(&far)).then_some((e, far))
                })
                .expect("open board always offers a fresh continuation");
            board.put_road(step.0, player);
            at = step.1;
            seen.push(at);
        }
        seen
    }

    #[test]
    fn no_roads_no_route() {
        let board = open_board();
        assert_eq!(longest_route(&board, 0), RoadRoute::default());
    }

    #[test]
    fn straight_chain_counts_every_edge() {
        let mut board = open_board();
        lay_chain(&mut board, 0, 5);

        let route = longest_route(&board, 0);
        assert_eq!(route.length, 5);
        assert_eq!(route.edges.len(), 5);
        // Every reported edge belongs to the player.
        for e in &route.edges {
            assert_eq!(board.road_owner(*e), Some(0));
        }
    }

    #[test]
    fn own_building_does_not_break_route() {
        let mut board = open_board();
        let visited = lay_chain(&mut board, 0, 5);
        board.put_settlement(visited[2], 0);

        assert_eq!(longest_route(&board, 0).length, 5);
    }

    #[test]
    fn opposing_building_cuts_interior_vertex() {
        let mut board = open_board();
        let visited = lay_chain(&mut board, 0, 6);

        // Interior vertex after the third edge: segments of 3 and 3 remain.
        board.put_settlement(visited[3], 1);

        let route = longest_route(&board, 0);
        assert!(
            route.length < 6,
            "blocked chain must drop below its unbroken length"
        );
        assert_eq!(route.length, 3);
    }

    #[test]
    fn opposing_building_at_chain_end_changes_nothing() {
        let mut board = open_board();
        let visited = lay_chain(&mut board, 0, 4);
        board.put_settlement(*visited.last().unwrap(), 1);

        assert_eq!(longest_route(&board, 0).length, 4);
    }

    #[test]
    fn branches_pick_the_longer_arm() {
        let mut board = open_board();
        let visited = lay_chain(&mut board, 0, 4);

        // Add a one-edge spur off the second vertex.
        let spur_from = visited[1];
        let spur = spur_from
            .touching_edges()
            .into_iter()
            .find(|e| board.road_owner(*e).is_none())
            .unwrap();
        board.put_road(spur, 0);

        // Chain of 4 with a spur: best is spur + the 3 edges past the
        // junction, or the plain chain of 4; either way length 4 at least.
        let route = longest_route(&board, 0);
        assert!(route.length >= 4);
    }

    #[test]
    fn players_do_not_share_routes() {
        let mut board = open_board();
        let visited = lay_chain(&mut board, 0, 3);
        // Opponent continues from the chain's end; their roads are not ours.
        let tail = *visited.last().unwrap();
        let cont = tail
            .touching_edges()
            .into_iter()
            .find(|e| board.road_owner(*e).is_none())
            .unwrap();
        board.put_road(cont, 1);

        assert_eq!(longest_route(&board, 0).length, 3);
        assert_eq!(longest_route(&board, 1).length, 1);
    }

    #[test]
    fn holder_requires_five() {
        assert_eq!(longest_road_holder(&[(0, 4), (1, 3)]), None);
        assert_eq!(longest_road_holder(&[(0, 5), (1, 3)]), Some(0));
    }

    #[test]
    fn holder_tie_awards_nobody() {
        assert_eq!(longest_road_holder(&[(0, 6), (1, 6)]), None);
        assert_eq!(longest_road_holder(&[(0, 6), (1, 7)]), Some(1));
    }
}
