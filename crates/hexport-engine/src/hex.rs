//! Axial hex coordinates and the derived vertex/edge addressing.
//!
//! Three coordinate types cover the whole board:
//! - [`Hex`]: a tile position in axial (q, r) coordinates
//! - [`Vertex`]: a corner where three hexes meet (settlements/cities)
//! - [`Edge`]: a side shared by two hexes (roads, ports)
//!
//! Every coordinate has exactly one canonical representation, so the types
//! can be used directly as map keys and as stable identities in snapshots.
//! The `Display` impls render the canonical string keys (`"1,-2"`,
//! `"1,-2,T"`, `"1,-2,NE"`) used by logs and the flat snapshot format.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// One of the six sides of a hex, clockwise from the top-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    NorthEast,
    East,
    SouthEast,
    SouthWest,
    West,
    NorthWest,
}

impl Side {
    /// All sides in clockwise order starting from NorthEast.
    pub const ALL: [Side; 6] = [
        Side::NorthEast,
        Side::East,
        Side::SouthEast,
        Side::SouthWest,
        Side::West,
        Side::NorthWest,
    ];

    /// The side as seen from the neighboring hex.
    pub const fn opposite(self) -> Side {
        match self {
            Side::NorthEast => Side::SouthWest,
            Side::East => Side::West,
            Side::SouthEast => Side::NorthWest,
            Side::SouthWest => Side::NorthEast,
            Side::West => Side::East,
            Side::NorthWest => Side::SouthEast,
        }
    }

    /// Short key used in canonical string form.
    pub const fn key(self) -> &'static str {
        match self {
            Side::NorthEast => "NE",
            Side::East => "E",
            Side::SouthEast => "SE",
            Side::SouthWest => "SW",
            Side::West => "W",
            Side::NorthWest => "NW",
        }
    }
}

/// Pole of a hex a corner belongs to.
///
/// With pointy-top hexes every lattice corner is the top corner of exactly
/// one hex or the bottom corner of exactly one hex, never both, so
/// `(hex, corner)` is already a unique name and needs no canonicalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Corner {
    Top,
    Bottom,
}

impl Corner {
    pub const fn key(self) -> &'static str {
        match self {
            Corner::Top => "T",
            Corner::Bottom => "B",
        }
    }
}

/// Axial tile coordinate.
///
/// `q` grows to the east, `r` to the southeast; the implicit cube
/// coordinate `s = -q - r` completes the identity `q + r + s = 0`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third cube coordinate.
    pub const fn s(self) -> i32 {
        -self.q - self.r
    }

    /// Neighbor across the given side.
    pub const fn neighbor(self, side: Side) -> Hex {
        match side {
            Side::NorthEast => Hex::new(self.q + 1, self.r - 1),
            Side::East => Hex::new(self.q + 1, self.r),
            Side::SouthEast => Hex::new(self.q, self.r + 1),
            Side::SouthWest => Hex::new(self.q - 1, self.r + 1),
            Side::West => Hex::new(self.q - 1, self.r),
            Side::NorthWest => Hex::new(self.q, self.r - 1),
        }
    }

    /// The six neighboring hexes.
    pub fn neighbors(self) -> [Hex; 6] {
        Side::ALL.map(|side| self.neighbor(side))
    }

    /// Hex-grid distance in steps.
    pub fn distance(self, other: Hex) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// Ring index of this hex around the origin.
    pub fn ring(self) -> u32 {
        self.distance(Hex::new(0, 0))
    }

    /// The six corners of this hex, clockwise from the top.
    ///
    /// Only Top and Bottom are canonical pole names; the four lateral
    /// corners are the poles of neighboring hexes.
    pub fn vertices(self) -> [Vertex; 6] {
        [
            Vertex::new(self, Corner::Top),
            Vertex::new(self.neighbor(Side::NorthEast), Corner::Bottom),
            Vertex::new(self.neighbor(Side::SouthEast), Corner::Top),
            Vertex::new(self, Corner::Bottom),
            Vertex::new(self.neighbor(Side::SouthWest), Corner::Top),
            Vertex::new(self.neighbor(Side::NorthWest), Corner::Bottom),
        ]
    }

    /// The six edges of this hex, in canonical form.
    pub fn edges(self) -> [Edge; 6] {
        Side::ALL.map(|side| Edge::new(self, side))
    }

    /// All hexes with ring index <= `rings`, ordered center-out.
    pub fn disc(rings: u32) -> Vec<Hex> {
        let n = rings as i32;
        let mut out = Vec::new();
        for q in -n..=n {
            for r in (-n).max(-q - n)..=n.min(-q + n) {
                out.push(Hex::new(q, r));
            }
        }
        out.sort_by_key(|h| (h.ring(), h.q, h.r));
        out
    }
}

impl fmt::Display for Hex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.q, self.r)
    }
}

/// A corner where three hexes meet; the site for settlements and cities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vertex {
    pub hex: Hex,
    pub corner: Corner,
}

impl Vertex {
    pub const fn new(hex: Hex, corner: Corner) -> Self {
        Self { hex, corner }
    }

    /// The three hexes that meet at this corner.
    pub fn touching_hexes(self) -> [Hex; 3] {
        match self.corner {
            Corner::Top => [
                self.hex,
                self.hex.neighbor(Side::NorthWest),
                self.hex.neighbor(Side::NorthEast),
            ],
            Corner::Bottom => [
                self.hex,
                self.hex.neighbor(Side::SouthWest),
                self.hex.neighbor(Side::SouthEast),
            ],
        }
    }

    /// The three edges that meet at this corner.
    pub fn touching_edges(self) -> [Edge; 3] {
        match self.corner {
            Corner::Top => [
                Edge::new(self.hex, Side::NorthWest),
                Edge::new(self.hex, Side::NorthEast),
                Edge::new(self.hex.neighbor(Side::NorthWest), Side::East),
            ],
            Corner::Bottom => [
                Edge::new(self.hex, Side::SouthWest),
                Edge::new(self.hex, Side::SouthEast),
                Edge::new(self.hex.neighbor(Side::SouthWest), Side::East),
            ],
        }
    }

    /// The three corners one edge away; the span the distance rule covers.
    pub fn adjacent_vertices(self) -> [Vertex; 3] {
        self.touching_edges().map(|edge| {
            let [a, b] = edge.endpoints();
            if a == self {
                b
            } else {
                a
            }
        })
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.hex, self.corner.key())
    }
}

/// A side shared by two hexes; the site for roads.
///
/// Each edge can be named from either hex; `new` always resolves to the
/// representation whose hex has the smaller (q, r), so equal edges compare
/// equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub hex: Hex,
    pub side: Side,
}

impl Edge {
    /// Create a canonical edge coordinate.
    pub fn new(hex: Hex, side: Side) -> Self {
        let twin = hex.neighbor(side);
        if (hex.q, hex.r) <= (twin.q, twin.r) {
            Self { hex, side }
        } else {
            Self {
                hex: twin,
                side: side.opposite(),
            }
        }
    }

    /// The two hexes sharing this edge.
    pub fn touching_hexes(self) -> [Hex; 2] {
        [self.hex, self.hex.neighbor(self.side)]
    }

    /// The two corners at the ends of this edge.
    pub fn endpoints(self) -> [Vertex; 2] {
        match self.side {
            Side::NorthEast => [
                Vertex::new(self.hex, Corner::Top),
                Vertex::new(self.hex.neighbor(Side::NorthEast), Corner::Bottom),
            ],
            Side::East => [
                Vertex::new(self.hex.neighbor(Side::NorthEast), Corner::Bottom),
                Vertex::new(self.hex.neighbor(Side::SouthEast), Corner::Top),
            ],
            Side::SouthEast => [
                Vertex::new(self.hex.neighbor(Side::SouthEast), Corner::Top),
                Vertex::new(self.hex, Corner::Bottom),
            ],
            Side::SouthWest => [
                Vertex::new(self.hex, Corner::Bottom),
                Vertex::new(self.hex.neighbor(Side::SouthWest), Corner::Top),
            ],
            Side::West => [
                Vertex::new(self.hex.neighbor(Side::SouthWest), Corner::Top),
                Vertex::new(self.hex.neighbor(Side::NorthWest), Corner::Bottom),
            ],
            Side::NorthWest => [
                Vertex::new(self.hex.neighbor(Side::NorthWest), Corner::Bottom),
                Vertex::new(self.hex, Corner::Top),
            ],
        }
    }

    /// Edges sharing a corner with this one; the road-continuation set.
    pub fn adjacent_edges(self) -> Vec<Edge> {
        let mut out = HashSet::new();
        for vertex in self.endpoints() {
            for edge in vertex.touching_edges() {
                if edge != self {
                    out.insert(edge);
                }
            }
        }
        out.into_iter().collect()
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.hex, self.side.key())
    }
}
