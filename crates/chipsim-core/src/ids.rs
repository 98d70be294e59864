//! Coordinate, axon, and routing-direction identifiers used across the engine

use core::fmt;

/// Coordinate of a core (and its co-located router) in the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreId {
    /// Column in the mesh.
    pub x: i32,
    /// Row in the mesh.
    pub y: i32,
}

impl CoreId {
    /// Create a new core coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another coordinate; the DOR hop count in the
    /// absence of contention (Testable Property 4).
    pub const fn manhattan_distance(&self, other: &CoreId) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Index of a destination axon on a core, as carried by a [`crate::spike::SpikeMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AxonId(pub u32);

impl AxonId {
    /// Create a new axon id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AxonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ax{}", self.0)
    }
}

/// Index of a neuron compartment within its core's compartment bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NeuronIdx(pub u32);

impl NeuronIdx {
    /// Create a new compartment index.
    pub const fn new(idx: u32) -> Self {
        Self(idx)
    }

    /// Get the raw index value.
    pub const fn raw(&self) -> u32 {
        self.0
    }

    /// Use as a `usize` array index.
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NeuronIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// The five router ports, plus the `nop` tag for an undecoded message.
///
/// Order matches the fixed visit order the crossbar and chip wiring use
/// everywhere (§4.2, §4.5 of the design): North, East, South, West, Local.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Not yet decoded.
    Nop,
    /// +y neighbor.
    North,
    /// +x neighbor.
    East,
    /// -y neighbor.
    South,
    /// -x neighbor.
    West,
    /// Co-located core.
    Local,
}

impl Direction {
    /// The four mesh directions plus `Local`, in the fixed visit order used
    /// by the crossbar and by chip wiring.
    pub const PORTS: [Direction; 5] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Local,
    ];

    /// The direction a message must have traveled in to have arrived from
    /// `self`'s perspective, i.e. the port on the far side of a link.
    pub const fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Local => Direction::Local,
            Direction::Nop => Direction::Nop,
        }
    }

    /// Index into the fixed 5-port arrays (`Direction::PORTS` order).
    pub const fn port_index(&self) -> Option<usize> {
        match self {
            Direction::North => Some(0),
            Direction::East => Some(1),
            Direction::South => Some(2),
            Direction::West => Some(3),
            Direction::Local => Some(4),
            Direction::Nop => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::Nop => "nop",
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
            Direction::Local => "local",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance_is_symmetric() {
        let a = CoreId::new(0, 0);
        let b = CoreId::new(3, 2);
        assert_eq!(a.manhattan_distance(&b), 5);
        assert_eq!(b.manhattan_distance(&a), 5);
    }

    #[test]
    fn opposite_is_involutive() {
        for d in Direction::PORTS {
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn display_matches_lowercase_tag() {
        assert_eq!(format!("{}", Direction::North), "north");
        assert_eq!(format!("{}", CoreId::new(1, 2)), "(1, 2)");
    }
}
