//! Core library modules for railnav
//!
//! Parsing, layout, backend sync and highlight animation. The CLI in
//! `main.rs` only wires these together.

pub mod animator;
pub mod client;
pub mod config;
pub mod error;
pub mod layout;
pub mod model;
pub mod network;
pub mod route;
pub mod session;
pub mod wire;

// Re-export main types for internal use
pub use animator::{AnimatorEvent, AnimatorState, HighlightAnimator};
pub use client::BackendClient;
pub use config::{AnimationConfig, BackendConfig, LayoutConfig};
pub use layout::{layout_network, EdgeHandle, EdgeKey, LayoutResult};
pub use network::parse_network;
pub use route::{format_route, parse_route};
pub use session::{BuildToken, Report, Session, Status, Submission, SyncOutcome};
