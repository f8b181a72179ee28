//! Backend wire format
//!
//! Outgoing: the network re-emitted line by line, followed by the query
//! block (`Q`, then `start T k t1 .. tT` per query). Incoming: a JSON
//! payload whose `stdout` holds `Path: ...` lines and
//! `ISOLATED ZONES (<mode>)` sections.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::{first_line, BackendError};
use crate::core::model::ParsedNetwork;

/// Route-weight coefficient sent when the caller does not choose one
pub const DEFAULT_K: f64 = 0.0;

/// Zone sections the backend reports, in display order
pub const ZONE_SECTIONS: [&str; 4] = ["metro", "bus", "rail", "all"];

/// One path-finding request appended to the network
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub start: u32,
    pub k: f64,
    pub targets: Vec<u32>,
}

impl Query {
    /// Query for a single target, the only shape the backend is sent today
    pub fn single(start: u32, target: u32, k: f64) -> Self {
        Self { start, k, targets: vec![target] }
    }

    fn line(&self) -> String {
        let mut fields = vec![
            self.start.to_string(),
            self.targets.len().to_string(),
            number(self.k),
        ];
        fields.extend(self.targets.iter().map(u32::to_string));
        fields.join(" ")
    }
}

fn number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        "0".to_string()
    }
}

fn numbers(values: &[f64]) -> String {
    values.iter().map(|v| number(*v)).collect::<Vec<_>>().join(" ")
}

/// Serialize a network (and optional query) in the backend's input format
pub fn serialize_network(network: &ParsedNetwork, query: Option<&Query>) -> String {
    let model = &network.model;
    let mut lines = Vec::with_capacity(network.edges.len() + 8);

    lines.push(format!("{} {}", model.node_count, network.edges.len()));
    lines.push(numbers(&model.sensitivity));
    lines.extend(model.transfer_matrix.iter().map(|row| numbers(row)));
    lines.push(numbers(&model.station_transfer));
    lines.extend(network.edges.iter().map(|edge| {
        format!(
            "{} {} {} {} {}",
            edge.u,
            edge.v,
            edge.mode.code(),
            number(edge.base_time),
            number(edge.load)
        )
    }));

    match query {
        Some(query) => {
            lines.push("1".to_string());
            lines.push(query.line());
        }
        None => lines.push("0".to_string()),
    }

    lines.join("\n")
}

/// Request body posted to the backend
#[derive(Debug, Serialize)]
pub struct BackendRequest<'a> {
    pub input: &'a str,
}

/// Response body of the backend; every field is optional on the wire
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendPayload {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub stdout: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

/// A connected component the backend reports as isolated
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneComponent {
    pub index: u32,
    pub size: u32,
    pub stations: Vec<u32>,
}

/// Content of one `ISOLATED ZONES` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ZoneReport {
    pub components: Vec<ZoneComponent>,
    /// The section said `None` explicitly
    pub none: bool,
}

impl ZoneReport {
    pub fn is_empty(&self) -> bool {
        self.none || self.components.is_empty()
    }
}

/// Zone sections by mode name; sections missing from the output are absent
pub type Zones = BTreeMap<String, ZoneReport>;

/// Parsed result of a successful backend run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendReport {
    pub ok: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub duration_ms: Option<u64>,
    pub zones: Zones,
    /// First reachable `Path:` of the output
    pub route: Option<String>,
}

impl BackendReport {
    /// Build a report from a payload, turning `ok: false` into an error
    pub fn from_payload(payload: BackendPayload) -> Result<Self, BackendError> {
        if !payload.ok {
            let detail = payload
                .error
                .as_deref()
                .filter(|e| !e.is_empty())
                .unwrap_or(payload.stderr.as_str());
            let message = match first_line(detail) {
                line if line.is_empty() => "backend error".to_string(),
                line => line,
            };
            return Err(BackendError::Rejected(message));
        }

        Ok(Self {
            zones: parse_zones(&payload.stdout),
            route: extract_first_route(&payload.stdout),
            ok: payload.ok,
            stdout: payload.stdout,
            stderr: payload.stderr,
            exit_code: payload.exit_code,
            duration_ms: payload.duration_ms,
        })
    }
}

/// First `Path:` value that is not `unreachable`
pub fn extract_first_route(stdout: &str) -> Option<String> {
    const MARKER: &str = "Path:";

    let mut rest = stdout;
    while let Some(found) = rest.find(MARKER) {
        rest = rest[found + MARKER.len()..].trim_start();
        let end = rest.find(['\r', '\n']).unwrap_or(rest.len());
        let path = rest[..end].trim();
        if !path.is_empty() && path != "unreachable" {
            return Some(path.to_string());
        }
        rest = &rest[end..];
    }
    None
}

fn zone_header(line: &str) -> Option<&str> {
    let mode = line.strip_prefix("ISOLATED ZONES (")?.strip_suffix(')')?;
    (!mode.is_empty() && !mode.contains(')')).then_some(mode)
}

/// `<index>. <size> stations: <ids...>`
fn zone_component(line: &str) -> Option<ZoneComponent> {
    let (index, rest) = line.split_once('.')?;
    let index = index.parse().ok()?;

    let rest = rest.strip_prefix(char::is_whitespace)?.trim_start();
    let (size, rest) = rest.split_once(char::is_whitespace)?;
    let size = size.parse().ok()?;

    let stations = rest.trim_start().strip_prefix("stations:")?;
    if !stations.starts_with(char::is_whitespace) || stations.trim().is_empty() {
        return None;
    }

    Some(ZoneComponent {
        index,
        size,
        stations: stations
            .split_whitespace()
            .filter_map(|id| id.parse().ok())
            .collect(),
    })
}

/// Collect every `ISOLATED ZONES (<mode>)` section of the output
///
/// A section ends at a blank line, at `None`, or at the next header.
pub fn parse_zones(stdout: &str) -> Zones {
    let mut zones = Zones::new();
    let mut current: Option<String> = None;

    for line in stdout.lines().map(str::trim) {
        if let Some(mode) = zone_header(line) {
            zones.insert(mode.to_string(), ZoneReport::default());
            current = Some(mode.to_string());
            continue;
        }

        let Some(mode) = current.as_deref() else {
            continue;
        };

        if line.is_empty() {
            current = None;
        } else if line == "None" {
            zones.insert(mode.to_string(), ZoneReport { components: Vec::new(), none: true });
            current = None;
        } else if let Some(component) = zone_component(line) {
            zones.entry(mode.to_string()).or_default().components.push(component);
        }
    }

    zones
}
