//! Typed network model shared by the parser, the layout engine and the
//! backend serializer.

use std::fmt;

use serde::Serialize;

/// Transport mode of an edge or a route hop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Metro = 0,
    Bus = 1,
    Rail = 2,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Metro, Mode::Bus, Mode::Rail];

    /// Mode for a wire code (`0`, `1`, `2`)
    pub fn from_code(code: i64) -> Option<Mode> {
        match code {
            0 => Some(Mode::Metro),
            1 => Some(Mode::Bus),
            2 => Some(Mode::Rail),
            _ => None,
        }
    }

    /// Mode for a route-descriptor name; names are lowercase
    pub fn from_name(name: &str) -> Option<Mode> {
        match name {
            "metro" => Some(Mode::Metro),
            "bus" => Some(Mode::Bus),
            "rail" => Some(Mode::Rail),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Metro => "metro",
            Mode::Bus => "bus",
            Mode::Rail => "rail",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One undirected, mode-tagged connection between two stations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Edge {
    pub u: u32,
    pub v: u32,
    pub mode: Mode,
    pub base_time: f64,
    pub load: f64,
}

impl Edge {
    pub fn is_loop(&self) -> bool {
        self.u == self.v
    }

    /// Endpoints ordered low-high
    pub fn pair(&self) -> (u32, u32) {
        (self.u.min(self.v), self.u.max(self.v))
    }
}

/// Model parameters of a network
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkModel {
    pub node_count: u32,
    pub edge_count: u32,
    /// One weight per mode, indexed by `Mode::code`
    pub sensitivity: [f64; 3],
    /// Mode-to-mode transfer cost, always 3x3
    pub transfer_matrix: [[f64; 3]; 3],
    /// Per-station transfer penalty; `station_transfer[i]` is station `i + 1`
    pub station_transfer: Vec<f64>,
}

/// A validated network: model plus edges in input order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedNetwork {
    pub model: NetworkModel,
    pub edges: Vec<Edge>,
}

impl ParsedNetwork {
    pub fn node_count(&self) -> u32 {
        self.model.node_count
    }

    pub fn contains_station(&self, station: u32) -> bool {
        (1..=self.model.node_count).contains(&station)
    }
}

/// One directed traversal of an edge within a route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteHop {
    pub u: u32,
    pub v: u32,
    pub mode: Mode,
}

impl fmt::Display for RouteHop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-[{}]->{}", self.u, self.mode, self.v)
    }
}
