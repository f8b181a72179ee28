//! Network description parser
//!
//! The format is whitespace-delimited and strictly ordered:
//!
//! ```text
//! n m
//! s0 s1 s2              sensitivity per mode
//! t00 t01 t02           transfer matrix, 3 rows
//! t10 t11 t12
//! t20 t21 t22
//! p1 .. pn              station transfer penalties
//! u v mode time load    m edge records
//! ```
//!
//! Line breaks carry no meaning and trailing tokens are ignored.

use log::debug;

use crate::core::error::ParseError;
use crate::core::model::{Edge, Mode, NetworkModel, ParsedNetwork};

/// Sequential reader over whitespace-separated numeric tokens
struct Tokens<'a> {
    inner: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self { inner: text.split_whitespace() }
    }

    /// Next token as a finite float; `None` when missing or not numeric
    fn number(&mut self) -> Option<f64> {
        let value: f64 = self.inner.next()?.parse().ok()?;
        value.is_finite().then_some(value)
    }

    /// Next token as an integral value; fractional tokens are rejected
    fn integer(&mut self) -> Option<i64> {
        let value = self.number()?;
        if value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
            return None;
        }
        Some(value as i64)
    }
}

/// Parse a network description into a validated [`ParsedNetwork`]
///
/// Fails with the error of the first stage that cannot be read completely;
/// nothing is zero-filled.
pub fn parse_network(text: &str) -> Result<ParsedNetwork, ParseError> {
    let mut tokens = Tokens::new(text);

    let (n, m) = match (tokens.integer(), tokens.integer()) {
        (Some(n), Some(m)) if n >= 1 && m >= 0 && n <= u32::MAX as i64 && m <= u32::MAX as i64 => {
            (n as u32, m as u32)
        }
        _ => return Err(ParseError::InvalidHeader),
    };

    let mut sensitivity = [0.0; 3];
    for (index, slot) in sensitivity.iter_mut().enumerate() {
        *slot = tokens.number().ok_or(ParseError::InvalidSensitivity { index })?;
    }

    let mut transfer_matrix = [[0.0; 3]; 3];
    for (row, cells) in transfer_matrix.iter_mut().enumerate() {
        for (col, cell) in cells.iter_mut().enumerate() {
            *cell = tokens.number().ok_or(ParseError::InvalidMatrix { row, col })?;
        }
    }

    let station_transfer = (1..=n as usize)
        .map(|station| tokens.number().ok_or(ParseError::InvalidStationTransfer { station }))
        .collect::<Result<Vec<_>, _>>()?;

    let mut edges = Vec::new();
    for edge in 1..=m as usize {
        let record = (
            tokens.integer(),
            tokens.integer(),
            tokens.integer(),
            tokens.number(),
            tokens.number(),
        );
        let (Some(u), Some(v), Some(mode), Some(base_time), Some(load)) = record else {
            return Err(ParseError::InvalidEdge { edge });
        };

        let in_range = |station: i64| (1..=n as i64).contains(&station);
        let mode = match Mode::from_code(mode) {
            Some(mode) if in_range(u) && in_range(v) => mode,
            _ => return Err(ParseError::EdgeOutOfRange { edge }),
        };

        edges.push(Edge { u: u as u32, v: v as u32, mode, base_time, load });
    }

    debug!("Parsed network: {n} stations, {m} edges");

    Ok(ParsedNetwork {
        model: NetworkModel {
            node_count: n,
            edge_count: m,
            sensitivity,
            transfer_matrix,
            station_transfer,
        },
        edges,
    })
}
