//! Circular diagram layout with bundled parallel edges
//!
//! Stations sit on a circle, station 1 at the top, going clockwise. Edges
//! sharing an unordered station pair fan out as quadratic curves, offset
//! perpendicular to the chord; self-edges become loops of growing radius.
//! The edge index maps `(min(u,v), max(u,v), mode)` to every rendered edge
//! with that identity, in input order.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

use log::{debug, warn};
use serde::Serialize;

use crate::core::config::LayoutConfig;
use crate::core::model::{Edge, Mode, ParsedNetwork, RouteHop};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Undirected, mode-sensitive identity of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    pub low: u32,
    pub high: u32,
    pub mode: Mode,
}

impl EdgeKey {
    pub fn new(u: u32, v: u32, mode: Mode) -> Self {
        Self { low: u.min(v), high: u.max(v), mode }
    }
}

impl From<&Edge> for EdgeKey {
    fn from(edge: &Edge) -> Self {
        EdgeKey::new(edge.u, edge.v, edge.mode)
    }
}

impl From<&RouteHop> for EdgeKey {
    fn from(hop: &RouteHop) -> Self {
        EdgeKey::new(hop.u, hop.v, hop.mode)
    }
}

/// Index of a rendered edge inside a [`LayoutResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeHandle(pub usize);

/// Drawn shape of an edge
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EdgeGeometry {
    /// Quadratic curve through the offset chord midpoint
    Curve {
        from: Point,
        control: Point,
        to: Point,
        offset: f64,
    },
    /// Full circle touching the station, drawn as two arcs
    Loop { anchor: Point, radius: f64 },
}

impl EdgeGeometry {
    /// SVG path data for the renderer
    pub fn path_data(&self) -> String {
        match self {
            EdgeGeometry::Curve { from, control, to, .. } => format!(
                "M {} {} Q {} {} {} {}",
                from.x, from.y, control.x, control.y, to.x, to.y
            ),
            EdgeGeometry::Loop { anchor, radius: r } => {
                let (x, y) = (anchor.x, anchor.y);
                format!(
                    "M {} {} A {r} {r} 0 1 1 {} {} A {r} {r} 0 1 1 {} {}",
                    x + r,
                    y,
                    x,
                    y - r,
                    x + r,
                    y
                )
            }
        }
    }
}

/// An edge as placed on the canvas
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedEdge {
    /// Position of the edge in the parsed input
    pub input_index: usize,
    pub edge: Edge,
    pub geometry: EdgeGeometry,
    pub highlighted: bool,
}

/// Node positions, rendered edges and the edge identity index
#[derive(Debug, Clone, Default, Serialize)]
pub struct LayoutResult {
    pub positions: BTreeMap<u32, Point>,
    pub edges: Vec<RenderedEdge>,
    #[serde(skip)]
    index: HashMap<EdgeKey, Vec<EdgeHandle>>,
}

impl LayoutResult {
    /// Rendered edges with this identity, in input order
    pub fn lookup(&self, key: &EdgeKey) -> Option<&[EdgeHandle]> {
        self.index
            .get(key)
            .map(Vec::as_slice)
            .filter(|handles| !handles.is_empty())
    }

    pub fn set_highlighted(&mut self, handle: EdgeHandle, highlighted: bool) {
        if let Some(edge) = self.edges.get_mut(handle.0) {
            edge.highlighted = highlighted;
        }
    }

    pub fn clear_highlights(&mut self) {
        for edge in &mut self.edges {
            edge.highlighted = false;
        }
    }

    pub fn highlighted(&self) -> Vec<EdgeHandle> {
        self.edges
            .iter()
            .enumerate()
            .filter(|(_, edge)| edge.highlighted)
            .map(|(i, _)| EdgeHandle(i))
            .collect()
    }
}

/// Place `node_count` stations evenly on a circle centered on the canvas
pub fn layout_nodes(node_count: u32, config: &LayoutConfig) -> BTreeMap<u32, Point> {
    let cx = config.width / 2.0;
    let cy = config.height / 2.0;
    let radius = config.width.min(config.height) / 2.0 - config.margin;
    let n = f64::from(node_count);

    (1..=node_count)
        .map(|i| {
            let angle = -PI / 2.0 + 2.0 * PI * f64::from(i - 1) / n;
            (
                i,
                Point {
                    x: cx + radius * angle.cos(),
                    y: cy + radius * angle.sin(),
                },
            )
        })
        .collect()
}

/// Rank of every edge within its unordered-pair bundle, and the bundle size
///
/// Modes are ignored here: any edges between the same two stations must not
/// overlap. Ranks follow input order.
pub fn bundle_ranks(edges: &[Edge]) -> Vec<(usize, usize)> {
    let mut sizes: HashMap<(u32, u32), usize> = HashMap::new();
    for edge in edges {
        *sizes.entry(edge.pair()).or_default() += 1;
    }

    let mut seen: HashMap<(u32, u32), usize> = HashMap::new();
    edges
        .iter()
        .map(|edge| {
            let rank = seen.entry(edge.pair()).or_default();
            let current = *rank;
            *rank += 1;
            (current, sizes[&edge.pair()])
        })
        .collect()
}

/// Perpendicular offset of the `rank`-th edge in a bundle of `size`
pub fn bundle_offset(rank: usize, size: usize, spacing: f64) -> f64 {
    if size <= 1 {
        return 0.0;
    }
    (rank as f64 - (size - 1) as f64 / 2.0) * spacing
}

fn edge_geometry(
    edge: &Edge,
    rank: usize,
    size: usize,
    positions: &BTreeMap<u32, Point>,
    config: &LayoutConfig,
) -> Option<EdgeGeometry> {
    let p1 = *positions.get(&edge.u)?;
    let p2 = *positions.get(&edge.v)?;

    if edge.is_loop() {
        return Some(EdgeGeometry::Loop {
            anchor: p1,
            radius: config.loop_base_radius + rank as f64 * config.loop_radius_step,
        });
    }

    let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
    let length = match dx.hypot(dy) {
        l if l > 0.0 => l,
        _ => 1.0,
    };
    let (nx, ny) = (-dy / length, dx / length);
    let offset = bundle_offset(rank, size, config.spacing);

    Some(EdgeGeometry::Curve {
        from: p1,
        control: Point {
            x: (p1.x + p2.x) / 2.0 + nx * offset,
            y: (p1.y + p2.y) / 2.0 + ny * offset,
        },
        to: p2,
        offset,
    })
}

/// Lay out a whole network
///
/// Edges whose endpoints have no position are left out of the result; this
/// cannot happen for a network that came out of the parser.
pub fn layout_network(network: &ParsedNetwork, config: &LayoutConfig) -> LayoutResult {
    let positions = layout_nodes(network.node_count(), config);
    let ranks = bundle_ranks(&network.edges);

    let mut result = LayoutResult {
        positions,
        ..Default::default()
    };

    for (input_index, (edge, (rank, size))) in network.edges.iter().zip(ranks).enumerate() {
        let Some(geometry) = edge_geometry(edge, rank, size, &result.positions, config) else {
            warn!("Skipping edge #{} ({}-{}): endpoint has no position", input_index + 1, edge.u, edge.v);
            continue;
        };

        let handle = EdgeHandle(result.edges.len());
        result.index.entry(EdgeKey::from(edge)).or_default().push(handle);
        result.edges.push(RenderedEdge {
            input_index,
            edge: edge.clone(),
            geometry,
            highlighted: false,
        });
    }

    debug!(
        "Laid out {} stations and {} edges ({} identities)",
        result.positions.len(),
        result.edges.len(),
        result.index.len()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::NetworkModel;

    fn network(node_count: u32, edges: &[(u32, u32, Mode)]) -> ParsedNetwork {
        ParsedNetwork {
            model: NetworkModel {
                node_count,
                edge_count: edges.len() as u32,
                sensitivity: [0.0; 3],
                transfer_matrix: [[0.0; 3]; 3],
                station_transfer: vec![0.0; node_count as usize],
            },
            edges: edges
                .iter()
                .map(|&(u, v, mode)| Edge { u, v, mode, base_time: 1.0, load: 0.0 })
                .collect(),
        }
    }

    #[test]
    fn test_layout_nodes_circle() {
        let config = LayoutConfig::default();
        let positions = layout_nodes(4, &config);
        let radius = 600.0 / 2.0 - 70.0;

        assert_eq!(positions.len(), 4);
        // station 1 at the top, station 2 to the right
        assert!((positions[&1].x - 450.0).abs() < 1e-9);
        assert!((positions[&1].y - (300.0 - radius)).abs() < 1e-9);
        assert!((positions[&2].x - (450.0 + radius)).abs() < 1e-9);
        assert!((positions[&2].y - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_layout_nodes_deterministic() {
        let config = LayoutConfig::with_canvas(812.0, 433.0);
        let first = layout_nodes(17, &config);
        let second = layout_nodes(17, &config);
        for (a, b) in first.values().zip(second.values()) {
            assert_eq!(a.x.to_bits(), b.x.to_bits());
            assert_eq!(a.y.to_bits(), b.y.to_bits());
        }
    }

    #[test]
    fn test_three_parallel_edges_fan_out() {
        let config = LayoutConfig::default();
        let net = network(3, &[(1, 2, Mode::Metro), (2, 1, Mode::Bus), (1, 2, Mode::Metro)]);
        let layout = layout_network(&net, &config);

        let offsets: Vec<f64> = layout
            .edges
            .iter()
            .map(|e| match e.geometry {
                EdgeGeometry::Curve { offset, .. } => offset,
                EdgeGeometry::Loop { .. } => panic!("Expected curve"),
            })
            .collect();
        assert_eq!(offsets, vec![-18.0, 0.0, 18.0]);
    }

    #[test]
    fn test_single_edge_is_straight() {
        let layout = layout_network(&network(2, &[(1, 2, Mode::Rail)]), &LayoutConfig::default());
        match &layout.edges[0].geometry {
            EdgeGeometry::Curve { from, control, to, offset } => {
                assert_eq!(*offset, 0.0);
                assert!((control.x - (from.x + to.x) / 2.0).abs() < 1e-9);
                assert!((control.y - (from.y + to.y) / 2.0).abs() < 1e-9);
            }
            EdgeGeometry::Loop { .. } => panic!("Expected curve"),
        }
    }

    #[test]
    fn test_offset_is_perpendicular_to_chord() {
        let config = LayoutConfig::default();
        let layout = layout_network(&network(2, &[(1, 2, Mode::Bus), (1, 2, Mode::Bus)]), &config);
        let EdgeGeometry::Curve { from, control, to, .. } = layout.edges[0].geometry else {
            panic!("Expected curve");
        };
        let mid = Point { x: (from.x + to.x) / 2.0, y: (from.y + to.y) / 2.0 };
        let (cx, cy) = (control.x - mid.x, control.y - mid.y);
        let dot = cx * (to.x - from.x) + cy * (to.y - from.y);
        assert!(dot.abs() < 1e-6);
        assert!((cx.hypot(cy) - 9.0).abs() < 1e-9);
    }

    #[test]
    fn test_self_loop_radii_grow() {
        let config = LayoutConfig::default();
        let net = network(
            2,
            &[(1, 1, Mode::Metro), (1, 2, Mode::Bus), (1, 1, Mode::Bus), (2, 2, Mode::Rail), (1, 1, Mode::Metro)],
        );
        let layout = layout_network(&net, &config);

        let radii_at = |station: u32| -> Vec<f64> {
            layout
                .edges
                .iter()
                .filter(|e| e.edge.u == station && e.edge.is_loop())
                .map(|e| match e.geometry {
                    EdgeGeometry::Loop { radius, .. } => radius,
                    EdgeGeometry::Curve { .. } => panic!("Expected loop"),
                })
                .collect()
        };
        assert_eq!(radii_at(1), vec![26.0, 34.0, 42.0]);
        assert_eq!(radii_at(2), vec![26.0]);
    }

    #[test]
    fn test_edge_index_is_mode_sensitive_and_undirected() {
        let net = network(3, &[(1, 2, Mode::Metro), (2, 1, Mode::Bus), (2, 1, Mode::Metro)]);
        let layout = layout_network(&net, &LayoutConfig::default());

        assert_eq!(
            layout.lookup(&EdgeKey::new(2, 1, Mode::Metro)),
            Some(&[EdgeHandle(0), EdgeHandle(2)][..])
        );
        assert_eq!(layout.lookup(&EdgeKey::new(1, 2, Mode::Bus)), Some(&[EdgeHandle(1)][..]));
        assert_eq!(layout.lookup(&EdgeKey::new(1, 2, Mode::Rail)), None);
        assert_eq!(layout.lookup(&EdgeKey::new(1, 3, Mode::Metro)), None);
    }

    #[test]
    fn test_edges_without_positions_are_skipped() {
        let mut net = network(2, &[(1, 2, Mode::Metro), (1, 2, Mode::Bus)]);
        net.edges.insert(1, Edge { u: 1, v: 9, mode: Mode::Rail, base_time: 1.0, load: 0.0 });
        let layout = layout_network(&net, &LayoutConfig::default());

        assert_eq!(layout.edges.len(), 2);
        assert_eq!(layout.edges[1].input_index, 2);
        assert_eq!(layout.lookup(&EdgeKey::new(1, 2, Mode::Bus)), Some(&[EdgeHandle(1)][..]));
    }

    #[test]
    fn test_highlight_flags() {
        let mut layout = layout_network(&network(2, &[(1, 2, Mode::Metro), (1, 2, Mode::Bus)]), &LayoutConfig::default());
        layout.set_highlighted(EdgeHandle(1), true);
        assert_eq!(layout.highlighted(), vec![EdgeHandle(1)]);
        layout.clear_highlights();
        assert!(layout.highlighted().is_empty());
    }

    #[test]
    fn test_path_data() {
        let curve = EdgeGeometry::Curve {
            from: Point { x: 0.0, y: 0.0 },
            control: Point { x: 5.0, y: 2.5 },
            to: Point { x: 10.0, y: 0.0 },
            offset: 2.5,
        };
        assert_eq!(curve.path_data(), "M 0 0 Q 5 2.5 10 0");

        let ring = EdgeGeometry::Loop { anchor: Point { x: 100.0, y: 50.0 }, radius: 26.0 };
        assert_eq!(ring.path_data(), "M 126 50 A 26 26 0 1 1 100 24 A 26 26 0 1 1 126 50");
    }
}
