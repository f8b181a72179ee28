//! CLI-specific utilities for railnav
//!
//! This module contains code specific to the command-line interface,
//! separate from the core library functionality.

pub mod progress;
pub mod report;

pub use progress::{create_spinner, ProgressManager};
pub use report::render_text;
