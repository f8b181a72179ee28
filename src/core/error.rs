//! Error types for railnav
//!
//! Parse failures, backend failures and layout lookup failures, plus the
//! fuzzy mode-name suggestions attached to malformed routes.

use std::fmt;

use crate::core::model::Mode;

/// Suggest a mode name for a misspelled `-[...]->` label
///
/// Returns `None` for exact matches and for labels too far from every known
/// mode to be a plausible typo.
pub fn suggest_mode(label: &str) -> Option<&'static str> {
    let label_lower = label.to_lowercase();
    if Mode::from_name(&label_lower).is_some() {
        return None;
    }

    // Half the word length, at least 1 and at most 2 edits
    let max_distance = (label.len() / 2).clamp(1, 2);

    Mode::ALL
        .iter()
        .map(|mode| (mode.name(), strsim::levenshtein(&label_lower, mode.name())))
        .filter(|(_, distance)| *distance <= max_distance)
        .min_by_key(|(_, distance)| *distance)
        .map(|(name, _)| name)
}

/// First line of a (possibly multi-line) diagnostic, trimmed
pub fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}

/// Failures while reading network descriptions or route descriptors
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// `n m` missing, non-integral, `n < 1` or `m < 0`
    InvalidHeader,

    /// One of the three sensitivity weights is missing or not numeric
    InvalidSensitivity { index: usize },

    /// Transfer matrix shortfall at the given 0-based cell
    InvalidMatrix { row: usize, col: usize },

    /// Station transfer penalty missing for the 1-based station
    InvalidStationTransfer { station: usize },

    /// Edge record (1-based) has a missing or non-numeric token
    InvalidEdge { edge: usize },

    /// Edge record (1-based) references an unknown station or mode
    EdgeOutOfRange { edge: usize },

    /// Route text holds no hops at all
    EmptyRoute,

    /// Route text has something that is not a hop at `offset` (byte index)
    MalformedRoute {
        offset: usize,
        suggestion: Option<&'static str>,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidHeader => write!(f, "Parse error: invalid N and M"),
            ParseError::InvalidSensitivity { index } => {
                write!(f, "Parse error: sensitivity value #{} is missing or invalid", index + 1)
            }
            ParseError::InvalidMatrix { row, col } => {
                write!(f, "Parse error: transfer matrix 3x3, cell ({}, {})", row + 1, col + 1)
            }
            ParseError::InvalidStationTransfer { station } => {
                write!(f, "Parse error: station_transfer for station {station}")
            }
            ParseError::InvalidEdge { edge } => write!(f, "Parse error: edge #{edge}"),
            ParseError::EdgeOutOfRange { edge } => {
                write!(f, "Parse error: edge #{edge} out of range")
            }
            ParseError::EmptyRoute => write!(f, "Route not recognized: no hops"),
            ParseError::MalformedRoute { offset, suggestion } => {
                write!(f, "Route not recognized at position {offset}")?;
                if let Some(name) = suggestion {
                    write!(f, ". Did you mean '{name}'?")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Failures of the backend round-trip
#[derive(Debug, Clone, PartialEq)]
pub enum BackendError {
    /// Transport failure: the backend could not be reached
    Unavailable(String),

    /// Non-2xx status or an `ok: false` payload
    Rejected(String),
}

impl BackendError {
    /// Message suitable for a one-line status display
    pub fn message(&self) -> &str {
        match self {
            BackendError::Unavailable(msg) | BackendError::Rejected(msg) => msg,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Unavailable(msg) => write!(f, "Backend unavailable: {msg}"),
            BackendError::Rejected(msg) => write!(f, "Backend error: {msg}"),
        }
    }
}

impl std::error::Error for BackendError {}

/// A highlighted hop has no rendered counterpart
#[derive(Debug, Clone, PartialEq)]
pub enum LookupError {
    EdgeNotInLayout { u: u32, v: u32, mode: Mode },
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::EdgeNotInLayout { u, v, mode } => {
                write!(f, "Edge {u}-[{mode}]->{v} is not in the current layout")
            }
        }
    }
}

impl std::error::Error for LookupError {}

/// Main error type for railnav operations
#[derive(Debug)]
pub enum Error {
    /// Invalid network or route text
    Parse(ParseError),

    /// Backend round-trip failure
    Backend(BackendError),

    /// Layout lookup failure during highlighting
    Lookup(LookupError),

    /// File I/O error
    IoError(std::io::Error),

    /// Invalid caller-supplied parameters
    InvalidInput(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(err) => write!(f, "{err}"),
            Error::Backend(err) => write!(f, "{err}"),
            Error::Lookup(err) => write!(f, "{err}"),
            Error::IoError(err) => write!(f, "I/O error: {err}"),
            Error::InvalidInput(msg) => write!(f, "Invalid input: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Backend(err) => Some(err),
            Error::Lookup(err) => Some(err),
            Error::IoError(err) => Some(err),
            Error::InvalidInput(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<ParseError> for Error {
    fn from(err: ParseError) -> Self {
        Error::Parse(err)
    }
}

impl From<BackendError> for Error {
    fn from(err: BackendError) -> Self {
        Error::Backend(err)
    }
}

impl From<LookupError> for Error {
    fn from(err: LookupError) -> Self {
        Error::Lookup(err)
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        let message = first_line(&err.to_string());
        if err.is_connect() || err.is_timeout() || err.is_request() {
            BackendError::Unavailable(message)
        } else {
            BackendError::Rejected(message)
        }
    }
}

/// Convenience result type for railnav operations
pub type Result<T> = std::result::Result<T, Error>;
