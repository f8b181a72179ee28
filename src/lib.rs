//! # Railnav Library
//!
//! Multimodal transit networks (metro, bus, rail) as circular diagrams,
//! synced with a remote path-finding service that reports isolated zones
//! and shortest routes, with routes highlighted hop by hop.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use railnav::{BackendClient, Session, SyncOutcome};
//!
//! # async fn example(text: &str) -> railnav::Result<()> {
//! let mut session = Session::default();
//! let client = BackendClient::new();
//!
//! // Route search from station 1 to station 4
//! if let Some(submission) = session.find_route(text, Some(1), Some(4), None)? {
//!     if let SyncOutcome::Synced { highlighting: true, .. } = session.sync(&client, &submission).await {
//!         while let Some(event) = session.tick() {
//!             println!("{event:?}");
//!         }
//!     }
//! }
//! println!("{}", session.status());
//! # Ok(())
//! # }
//! ```
//!
//! ## Route descriptors
//!
//! ```rust
//! use railnav::{parse_route, Mode};
//!
//! let hops = parse_route("1-[metro]->2 2-[bus]->3").unwrap();
//! assert_eq!(hops[1].mode, Mode::Bus);
//! assert!(parse_route("1-[metro]->2 x 2-[bus]->3").is_err());
//! ```

use std::path::Path;

pub mod core;

pub use crate::core::animator::{drive, AnimatorEvent, AnimatorState, HighlightAnimator};
pub use crate::core::client::BackendClient;
pub use crate::core::config::{AnimationConfig, BackendConfig, LayoutConfig, DEFAULT_ENDPOINT};
pub use crate::core::error::{BackendError, Error, LookupError, ParseError, Result};
pub use crate::core::layout::{
    layout_network, layout_nodes, EdgeGeometry, EdgeHandle, EdgeKey, LayoutResult, Point, RenderedEdge,
};
pub use crate::core::model::{Edge, Mode, NetworkModel, ParsedNetwork, RouteHop};
pub use crate::core::network::parse_network;
pub use crate::core::route::{format_route, parse_route};
pub use crate::core::session::{
    BuildToken, Report, Session, Status, Submission, SubmissionKind, SyncOutcome,
};
pub use crate::core::wire::{
    serialize_network, BackendReport, Query, ZoneComponent, ZoneReport, Zones, DEFAULT_K, ZONE_SECTIONS,
};

/// Read and parse a network description file
pub fn load_network(path: impl AsRef<Path>) -> Result<ParsedNetwork> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_network(&text)?)
}

/// Highlight every hop of `route` on `layout` at once
///
/// Returns the highlighted handles in hop order. Stops at the first hop with
/// no rendered edge, leaving earlier hops highlighted.
pub fn highlight_route(layout: &mut LayoutResult, route: &str) -> Result<Vec<EdgeHandle>> {
    let mut animator = HighlightAnimator::new();
    animator.start(parse_route(route)?, layout)?;

    let mut highlighted = Vec::new();
    while let Some(event) = animator.tick(layout) {
        match event {
            AnimatorEvent::Highlighted { handles, .. } => highlighted.extend(handles),
            AnimatorEvent::Completed => break,
            AnimatorEvent::Failed { error } => return Err(error.into()),
        }
    }
    Ok(highlighted)
}

/// Parse a network and lay it out in one step
pub fn build(text: &str, config: &LayoutConfig) -> Result<(ParsedNetwork, LayoutResult)> {
    let network = parse_network(text)?;
    let layout = layout_network(&network, config);
    Ok((network, layout))
}

/// Send a network to the backend without a query and return its report
pub async fn sync(text: &str, config: &BackendConfig) -> Result<BackendReport> {
    let network = parse_network(text)?;
    let input = serialize_network(&network, None);
    let client = BackendClient::with_config(config.clone());
    Ok(client.run(&input).await?)
}

/// Ask the backend for a route between two stations
///
/// Returns `Ok(None)` when the backend reports the target unreachable.
pub async fn find_route(
    text: &str,
    start: u32,
    target: u32,
    config: &BackendConfig,
) -> Result<Option<Vec<RouteHop>>> {
    let network = parse_network(text)?;
    if !network.contains_station(start) || !network.contains_station(target) {
        return Err(Error::InvalidInput(format!(
            "Start or target out of range (1..={})",
            network.node_count()
        )));
    }

    let query = Query::single(start, target, DEFAULT_K);
    let input = serialize_network(&network, Some(&query));
    let client = BackendClient::with_config(config.clone());
    let report = client.run(&input).await?;

    Ok(report.route.as_deref().map(parse_route).transpose()?)
}
