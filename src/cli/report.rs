//! Text and JSON views of a session for the terminal

use std::fmt::Write;

use railnav::{LayoutResult, Report, Session, ZoneReport, ZONE_SECTIONS};
use serde::Serialize;

/// Everything `--json` prints
#[derive(Serialize)]
pub struct JsonView<'a> {
    pub status: String,
    pub route: &'a str,
    pub report: &'a Report,
    pub layout: &'a LayoutResult,
}

impl<'a> JsonView<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            status: session.status().to_string(),
            route: session.route_input(),
            report: session.report(),
            layout: session.layout(),
        }
    }
}

pub fn render_json(session: &Session) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonView::new(session))
}

fn zone_lines(out: &mut String, name: &str, zone: Option<&ZoneReport>) {
    match zone {
        None => {
            let _ = writeln!(out, "  {name}: no data");
        }
        Some(zone) if zone.is_empty() => {
            let _ = writeln!(out, "  {name}: none");
        }
        Some(zone) => {
            let _ = writeln!(out, "  {name}:");
            for component in &zone.components {
                let stations = component
                    .stations
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                let _ = writeln!(
                    out,
                    "    {}. {} stations: {stations}",
                    component.index, component.size
                );
            }
        }
    }
}

/// Multi-line summary of the model, layout and zones
pub fn render_text(session: &Session) -> String {
    let mut out = String::new();
    let report = session.report();

    if let Some(model) = &report.model {
        let _ = writeln!(out, "Stations: {}  Edges: {}", model.node_count, model.edge_count);
        let _ = writeln!(
            out,
            "Sensitivity: metro {} bus {} rail {}",
            model.sensitivity[0], model.sensitivity[1], model.sensitivity[2]
        );
    }

    let layout = session.layout();
    if !layout.positions.is_empty() {
        let _ = writeln!(out, "Layout:");
        for (station, point) in &layout.positions {
            let _ = writeln!(out, "  {station:>3} ({:.1}, {:.1})", point.x, point.y);
        }
        for rendered in &layout.edges {
            let edge = &rendered.edge;
            let mark = if rendered.highlighted { '*' } else { ' ' };
            let _ = writeln!(
                out,
                " {mark}{}-[{}]->{}  {}",
                edge.u,
                edge.mode,
                edge.v,
                rendered.geometry.path_data()
            );
        }
    }

    if let Some(error) = &report.backend_error {
        let _ = writeln!(out, "Backend: {error}");
    }
    let _ = writeln!(out, "Isolated zones:");
    for name in ZONE_SECTIONS {
        zone_lines(&mut out, name, report.zones.as_ref().and_then(|zones| zones.get(name)));
    }

    if !session.route_input().is_empty() {
        let _ = writeln!(out, "Route: {}", session.route_input());
    }
    let _ = writeln!(out, "Status: {}", session.status());
    out
}
