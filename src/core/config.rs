//! Configuration for the backend connection, the diagram layout and the
//! highlight animation.

use std::time::Duration;

/// Default endpoint of the path-finding service
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/api/run";

/// Connection settings for the path-finding backend
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// URL that accepts `POST {"input": ...}`
    pub endpoint: String,

    /// Overall request timeout; `None` waits for the backend indefinitely
    pub timeout: Option<Duration>,

    /// Extra attempts after a transport failure
    pub max_retries: u32,

    /// First retry delay, doubled on every further attempt
    pub retry_base_delay: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: None,
            max_retries: 0,
            retry_base_delay: Duration::from_millis(1000),
        }
    }
}

impl BackendConfig {
    /// Default settings against a different endpoint
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }
}

/// Geometry constants of the circular diagram
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub width: f64,
    pub height: f64,
    /// Distance kept between the node circle and the canvas border
    pub margin: f64,
    /// Perpendicular distance between neighbouring parallel edges
    pub spacing: f64,
    /// Radius of the first self-loop at a station
    pub loop_base_radius: f64,
    /// Radius added for every further self-loop at the same station
    pub loop_radius_step: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 900.0,
            height: 600.0,
            margin: 70.0,
            spacing: 18.0,
            loop_base_radius: 26.0,
            loop_radius_step: 8.0,
        }
    }
}

impl LayoutConfig {
    /// Default geometry on a canvas of the given size
    pub fn with_canvas(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }
}

/// Timing of the highlight animation
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    /// Delay between two revealed hops
    pub interval: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(700),
        }
    }
}
