//! Highlight animation over the rendered network
//!
//! [`HighlightAnimator`] is a plain state machine advanced one hop per
//! [`tick`](HighlightAnimator::tick). [`drive`] ticks it on a fixed interval
//! until it finishes or its cancellation token fires.

use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::core::error::{LookupError, ParseError};
use crate::core::layout::{EdgeHandle, EdgeKey, LayoutResult};
use crate::core::model::RouteHop;

/// Where the animator is in its run
#[derive(Debug, Clone, PartialEq)]
pub enum AnimatorState {
    Idle,
    /// `next` hops of `total` are already highlighted
    Running { next: usize, total: usize },
    Completed,
    /// Stopped at a hop with no rendered edge; earlier hops stay highlighted
    Failed(LookupError),
}

/// Observable result of one tick
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnimatorEvent {
    Highlighted {
        /// 0-based position of the hop in the route
        step: usize,
        hop: RouteHop,
        handles: Vec<EdgeHandle>,
    },
    Completed,
    Failed {
        #[serde(serialize_with = "serialize_display")]
        error: LookupError,
    },
}

fn serialize_display<S: serde::Serializer>(error: &LookupError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Reveals a route hop by hop on a [`LayoutResult`]
#[derive(Debug, Clone)]
pub struct HighlightAnimator {
    hops: Vec<RouteHop>,
    state: AnimatorState,
}

impl Default for HighlightAnimator {
    fn default() -> Self {
        Self::new()
    }
}

impl HighlightAnimator {
    pub fn new() -> Self {
        Self {
            hops: Vec::new(),
            state: AnimatorState::Idle,
        }
    }

    pub fn state(&self) -> &AnimatorState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, AnimatorState::Running { .. })
    }

    pub fn hops(&self) -> &[RouteHop] {
        &self.hops
    }

    /// Start highlighting `hops`, cancelling any run in progress
    ///
    /// An empty route is rejected before anything is cleared.
    pub fn start(&mut self, hops: Vec<RouteHop>, layout: &mut LayoutResult) -> Result<(), ParseError> {
        if hops.is_empty() {
            return Err(ParseError::EmptyRoute);
        }

        self.cancel(layout);
        info!("Highlighting route with {} hops", hops.len());
        self.state = AnimatorState::Running {
            next: 0,
            total: hops.len(),
        };
        self.hops = hops;
        Ok(())
    }

    /// Clear every highlight and return to idle
    pub fn cancel(&mut self, layout: &mut LayoutResult) {
        if self.is_running() {
            debug!("Cancelling highlight animation");
        }
        layout.clear_highlights();
        self.hops.clear();
        self.state = AnimatorState::Idle;
    }

    /// Advance by one hop
    ///
    /// Returns `None` unless the animator is running. The tick after the
    /// last hop reports completion.
    pub fn tick(&mut self, layout: &mut LayoutResult) -> Option<AnimatorEvent> {
        let AnimatorState::Running { next, total } = self.state else {
            return None;
        };

        let Some(hop) = self.hops.get(next).copied() else {
            info!("Highlight complete after {total} hops");
            self.state = AnimatorState::Completed;
            return Some(AnimatorEvent::Completed);
        };

        match layout.lookup(&EdgeKey::from(&hop)) {
            Some(handles) => {
                let handles = handles.to_vec();
                for handle in &handles {
                    layout.set_highlighted(*handle, true);
                }
                debug!("Highlighted hop {}/{total}: {hop}", next + 1);
                self.state = AnimatorState::Running { next: next + 1, total };
                Some(AnimatorEvent::Highlighted { step: next, hop, handles })
            }
            None => {
                let error = LookupError::EdgeNotInLayout {
                    u: hop.u,
                    v: hop.v,
                    mode: hop.mode,
                };
                warn!("{error}");
                self.state = AnimatorState::Failed(error.clone());
                Some(AnimatorEvent::Failed { error })
            }
        }
    }
}

/// Tick `animator` every `interval` until it stops running
///
/// The first tick fires immediately. Cancelling `cancel` clears the
/// highlights and leaves the animator idle. Returns the final state.
pub async fn drive<F>(
    animator: &mut HighlightAnimator,
    layout: &mut LayoutResult,
    interval: Duration,
    cancel: &CancellationToken,
    mut on_event: F,
) -> AnimatorState
where
    F: FnMut(&AnimatorEvent),
{
    // tokio rejects a zero period
    let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    while animator.is_running() {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                animator.cancel(layout);
            }
            _ = ticker.tick() => {
                if let Some(event) = animator.tick(layout) {
                    on_event(&event);
                }
            }
        }
    }

    animator.state().clone()
}
