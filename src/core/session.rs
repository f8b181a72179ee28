//! The current build and everything derived from it
//!
//! A [`Session`] owns the latest parsed network, its layout, the backend
//! report and the highlight animator. Every build bumps a [`BuildToken`];
//! backend replies carry the token of their submission and are dropped
//! unless it is still current, so the last submission always wins.

use std::fmt;

use log::{debug, info, warn};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::core::animator::{drive, AnimatorEvent, AnimatorState, HighlightAnimator};
use crate::core::client::BackendClient;
use crate::core::config::{AnimationConfig, LayoutConfig};
use crate::core::error::{BackendError, ParseError};
use crate::core::layout::{layout_network, LayoutResult};
use crate::core::model::{NetworkModel, ParsedNetwork};
use crate::core::network::parse_network;
use crate::core::route::parse_route;
use crate::core::wire::{serialize_network, BackendReport, Query, Zones, DEFAULT_K};

/// Report note for a backend that could not be reached
pub const UNAVAILABLE_NOTE: &str = "backend unavailable";

/// Identifies one network submission; later builds carry larger tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct BuildToken(pub u64);

impl BuildToken {
    fn next(self) -> Self {
        BuildToken(self.0 + 1)
    }
}

/// Human-readable state of the session
#[derive(Debug, Clone, PartialEq)]
pub enum Status {
    NotBuilt,
    Built,
    BuiltWithRoute,
    BackendOk,
    BackendError(String),
    BackendUnavailable,
    NeedStartAndTarget,
    OutOfRange,
    Searching,
    RouteFound,
    RouteFoundHighlighting,
    RouteNotFound,
    RouteNotInGraph,
    Highlighting,
    HighlightComplete,
    HighlightCleared,
    BuildFirst,
    /// Input text was rejected; holds the parse error message
    Invalid(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::NotBuilt => write!(f, "Graph not built"),
            Status::Built => write!(f, "Graph built"),
            Status::BuiltWithRoute => write!(f, "Graph built (route from backend)"),
            Status::BackendOk => write!(f, "Graph built (backend ok)"),
            Status::BackendError(msg) => write!(f, "Backend error: {msg}"),
            Status::BackendUnavailable => write!(f, "Backend unavailable"),
            Status::NeedStartAndTarget => write!(f, "Enter start and target"),
            Status::OutOfRange => write!(f, "Start or target out of range"),
            Status::Searching => write!(f, "Searching route..."),
            Status::RouteFound => write!(f, "Route found"),
            Status::RouteFoundHighlighting => write!(f, "Route found, starting highlight"),
            Status::RouteNotFound => write!(f, "Route not found"),
            Status::RouteNotInGraph => write!(f, "Route not found in graph"),
            Status::Highlighting => write!(f, "Highlighting route"),
            Status::HighlightComplete => write!(f, "Highlight complete"),
            Status::HighlightCleared => write!(f, "Highlight cleared"),
            Status::BuildFirst => write!(f, "Build the graph first"),
            Status::Invalid(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<&BackendError> for Status {
    fn from(error: &BackendError) -> Self {
        match error {
            BackendError::Unavailable(_) => Status::BackendUnavailable,
            BackendError::Rejected(msg) => Status::BackendError(msg.clone()),
        }
    }
}

/// What the presentation layer shows next to the diagram
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Report {
    pub model: Option<NetworkModel>,
    /// `None` until the backend answers for the current build
    pub zones: Option<Zones>,
    pub backend_error: Option<String>,
}

/// Which flow produced a submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionKind {
    /// Plain build, synced for its zone report
    Build,
    /// Build followed by a route search
    FindRoute,
}

/// Backend input captured together with the token current at submission
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub token: BuildToken,
    pub input: String,
    pub kind: SubmissionKind,
}

/// Effect of applying a backend reply
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// A newer build superseded the submission; nothing changed
    Stale,
    Failed(BackendError),
    Synced {
        route: Option<String>,
        /// The route was copied into the empty route field
        route_adopted: bool,
        /// A highlight animation was started for the route
        highlighting: bool,
    },
}

/// Owned state of the latest build
#[derive(Debug)]
pub struct Session {
    layout_config: LayoutConfig,
    token: BuildToken,
    network: Option<ParsedNetwork>,
    layout: LayoutResult,
    report: Report,
    route_input: String,
    status: Status,
    animator: HighlightAnimator,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl Session {
    pub fn new(layout_config: LayoutConfig) -> Self {
        Self {
            layout_config,
            token: BuildToken::default(),
            network: None,
            layout: LayoutResult::default(),
            report: Report::default(),
            route_input: String::new(),
            status: Status::NotBuilt,
            animator: HighlightAnimator::new(),
        }
    }

    pub fn token(&self) -> BuildToken {
        self.token
    }

    pub fn network(&self) -> Option<&ParsedNetwork> {
        self.network.as_ref()
    }

    pub fn layout(&self) -> &LayoutResult {
        &self.layout
    }

    pub fn layout_config(&self) -> &LayoutConfig {
        &self.layout_config
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn animator_state(&self) -> &AnimatorState {
        self.animator.state()
    }

    /// Text of the route field
    pub fn route_input(&self) -> &str {
        &self.route_input
    }

    pub fn set_route_input(&mut self, route: impl Into<String>) {
        self.route_input = route.into();
    }

    fn parse(&mut self, text: &str) -> Result<ParsedNetwork, ParseError> {
        parse_network(text).inspect_err(|e| {
            warn!("Rejected network: {e}");
            self.status = Status::Invalid(e.to_string());
        })
    }

    /// Replace the current build, invalidating in-flight replies
    fn rebuild(&mut self, network: ParsedNetwork) {
        self.animator.cancel(&mut self.layout);
        self.layout = layout_network(&network, &self.layout_config);
        self.token = self.token.next();
        self.report = Report {
            model: Some(network.model.clone()),
            ..Default::default()
        };
        info!(
            "Built network with {} stations and {} edges ({:?})",
            network.node_count(),
            network.edges.len(),
            self.token
        );
        self.network = Some(network);
        self.status = Status::Built;
    }

    /// Parse and lay out `text`, returning the backend sync to send
    ///
    /// On a parse error only the status changes.
    pub fn build(&mut self, text: &str) -> Result<Submission, ParseError> {
        let network = self.parse(text)?;
        let input = serialize_network(&network, None);
        self.rebuild(network);

        Ok(Submission {
            token: self.token,
            input,
            kind: SubmissionKind::Build,
        })
    }

    /// Rebuild from `text` and prepare a route search between two stations
    ///
    /// Returns `Ok(None)` when start or target is missing or outside the
    /// network; the graph is still rebuilt and the status says why.
    pub fn find_route(
        &mut self,
        text: &str,
        start: Option<u32>,
        target: Option<u32>,
        k: Option<f64>,
    ) -> Result<Option<Submission>, ParseError> {
        let network = self.parse(text)?;

        let query = match (start, target) {
            (Some(start), Some(target)) => {
                if network.contains_station(start) && network.contains_station(target) {
                    Some(Query::single(start, target, k.unwrap_or(DEFAULT_K)))
                } else {
                    None
                }
            }
            _ => None,
        };
        let input = query.as_ref().map(|q| serialize_network(&network, Some(q)));
        self.rebuild(network);

        let Some(input) = input else {
            self.status = if start.is_some() && target.is_some() {
                Status::OutOfRange
            } else {
                Status::NeedStartAndTarget
            };
            return Ok(None);
        };

        self.status = Status::Searching;
        Ok(Some(Submission {
            token: self.token,
            input,
            kind: SubmissionKind::FindRoute,
        }))
    }

    /// Apply a backend reply to the session if its build is still current
    pub fn apply(
        &mut self,
        submission: &Submission,
        result: Result<BackendReport, BackendError>,
    ) -> SyncOutcome {
        if submission.token != self.token {
            debug!(
                "Dropping reply for {:?}, current build is {:?}",
                submission.token, self.token
            );
            return SyncOutcome::Stale;
        }

        let report = match result {
            Ok(report) => report,
            Err(error) => {
                warn!("{error}");
                self.report.zones = None;
                self.report.backend_error = Some(match &error {
                    BackendError::Unavailable(_) => UNAVAILABLE_NOTE.to_string(),
                    BackendError::Rejected(msg) => msg.clone(),
                });
                // a build only reports rejections, and only over its own status
                let show = match submission.kind {
                    SubmissionKind::FindRoute => true,
                    SubmissionKind::Build => {
                        matches!(error, BackendError::Rejected(_)) && self.status == Status::Built
                    }
                };
                if show {
                    self.status = Status::from(&error);
                }
                return SyncOutcome::Failed(error);
            }
        };

        self.report.zones = Some(report.zones);
        self.report.backend_error = None;

        let route = report.route;
        let route_adopted = match &route {
            Some(route) if self.route_input.trim().is_empty() => {
                self.route_input = route.clone();
                true
            }
            _ => false,
        };

        let highlighting = match submission.kind {
            SubmissionKind::Build => {
                if self.status == Status::Built {
                    self.status = if route_adopted {
                        Status::BuiltWithRoute
                    } else {
                        Status::BackendOk
                    };
                }
                false
            }
            SubmissionKind::FindRoute => match route.as_deref().map(parse_route) {
                None => {
                    info!("Backend found no route");
                    self.status = Status::RouteNotFound;
                    false
                }
                Some(Err(e)) => {
                    warn!("Backend route not highlighted: {e}");
                    self.status = Status::RouteFound;
                    false
                }
                Some(Ok(hops)) => match self.animator.start(hops, &mut self.layout) {
                    Ok(()) => {
                        self.status = Status::RouteFoundHighlighting;
                        true
                    }
                    Err(_) => {
                        self.status = Status::RouteFound;
                        false
                    }
                },
            },
        };

        SyncOutcome::Synced {
            route,
            route_adopted,
            highlighting,
        }
    }

    /// Send a submission and apply its reply
    pub async fn sync(&mut self, client: &BackendClient, submission: &Submission) -> SyncOutcome {
        let result = client.run(&submission.input).await;
        self.apply(submission, result)
    }

    /// Start highlighting the route field on the current layout
    ///
    /// Returns `Ok(false)` when no graph has been built yet.
    pub fn start_highlight(&mut self) -> Result<bool, ParseError> {
        if self.network.is_none() {
            self.status = Status::BuildFirst;
            return Ok(false);
        }

        let started = parse_route(&self.route_input)
            .and_then(|hops| self.animator.start(hops, &mut self.layout));
        match started {
            Ok(()) => {
                self.status = Status::Highlighting;
                Ok(true)
            }
            Err(e) => {
                self.status = Status::Invalid(e.to_string());
                Err(e)
            }
        }
    }

    pub fn clear_highlight(&mut self) {
        self.animator.cancel(&mut self.layout);
        self.status = Status::HighlightCleared;
    }

    fn settle(&mut self, state: &AnimatorState) {
        match state {
            AnimatorState::Completed => self.status = Status::HighlightComplete,
            AnimatorState::Failed(_) => self.status = Status::RouteNotInGraph,
            AnimatorState::Idle | AnimatorState::Running { .. } => {}
        }
    }

    /// Advance the highlight animation by one hop
    pub fn tick(&mut self) -> Option<AnimatorEvent> {
        let event = self.animator.tick(&mut self.layout);
        if event.is_some() {
            let state = self.animator.state().clone();
            self.settle(&state);
        }
        event
    }

    /// Run the highlight animation to its end on a fixed interval
    pub async fn animate<F>(
        &mut self,
        config: &AnimationConfig,
        cancel: &CancellationToken,
        on_event: F,
    ) -> AnimatorState
    where
        F: FnMut(&AnimatorEvent),
    {
        if !self.animator.is_running() {
            return self.animator.state().clone();
        }
        let state = drive(&mut self.animator, &mut self.layout, config.interval, cancel, on_event).await;
        if state == AnimatorState::Idle {
            self.status = Status::HighlightCleared;
        }
        self.settle(&state);
        state
    }
}
