//! Route descriptor grammar
//!
//! A route is a whitespace-separated run of hops `<u>-[<mode>]-><v>`, for
//! example `1-[metro]->2 2-[bus]->3`. Whitespace is also allowed between a
//! station number and its arrow. Anything else between, before or after
//! hops rejects the whole route: the text is typed by people and also
//! produced by the backend, and a half-understood route must never be
//! animated.

use crate::core::error::{suggest_mode, ParseError};
use crate::core::model::{Mode, RouteHop};

/// Character scanner over route text; positions are byte offsets
struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn malformed(&self) -> ParseError {
        ParseError::MalformedRoute { offset: self.pos, suggestion: None }
    }

    fn expect(&mut self, literal: &str) -> Result<(), ParseError> {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            Ok(())
        } else {
            Err(self.malformed())
        }
    }

    /// Unsigned decimal station number
    fn station(&mut self) -> Result<u32, ParseError> {
        let digits = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(self.malformed());
        }
        let station = self.rest()[..digits].parse().map_err(|_| self.malformed())?;
        self.pos += digits;
        Ok(station)
    }

    /// Mode name up to the closing bracket
    fn mode(&mut self) -> Result<Mode, ParseError> {
        let name_len = self
            .rest()
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(self.rest().len());
        let name = &self.rest()[..name_len];
        match Mode::from_name(name) {
            Some(mode) => {
                self.pos += name_len;
                Ok(mode)
            }
            None => Err(ParseError::MalformedRoute {
                offset: self.pos,
                suggestion: suggest_mode(name),
            }),
        }
    }

    fn hop(&mut self) -> Result<RouteHop, ParseError> {
        let u = self.station()?;
        self.skip_whitespace();
        self.expect("-[")?;
        let mode = self.mode()?;
        self.expect("]->")?;
        self.skip_whitespace();
        let v = self.station()?;
        Ok(RouteHop { u, v, mode })
    }
}

/// Parse a route descriptor into its ordered hops
pub fn parse_route(text: &str) -> Result<Vec<RouteHop>, ParseError> {
    let mut scanner = Scanner::new(text);
    let mut hops = Vec::new();

    loop {
        scanner.skip_whitespace();
        if scanner.at_end() {
            break;
        }
        hops.push(scanner.hop()?);
    }

    if hops.is_empty() {
        return Err(ParseError::EmptyRoute);
    }
    Ok(hops)
}

/// Canonical text for a hop sequence, accepted back by [`parse_route`]
pub fn format_route(hops: &[RouteHop]) -> String {
    hops.iter().map(RouteHop::to_string).collect::<Vec<_>>().join(" ")
}
