//! Client id range parsing.
//!
//! Tokens are a single id (`7777`) or an inclusive range (`8888-9999`).
//! Stray `,` separators and whitespace around a token are ignored, so
//! `1-5, 8,` parses as two ranges.

use std::fmt;

use crate::cohorts::ValidationError;
use crate::routing::ids::ClientId;

/// Inclusive range of client ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ClientIdRange {
    pub min: u64,
    pub max: u64,
}

impl ClientIdRange {
    pub fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub fn single(id: u64) -> Self {
        Self { min: id, max: id }
    }

    /// Number of ids covered, saturating at `u64::MAX`.
    pub fn count(&self) -> u64 {
        (self.max - self.min).saturating_add(1)
    }

    pub fn ids(&self) -> impl Iterator<Item = ClientId> {
        (self.min..=self.max).map(ClientId)
    }

    /// Parse one token.
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        let trimmed = token.trim_matches(|c: char| c == ',' || c.is_whitespace());
        let malformed = |reason: &str| ValidationError::MalformedRange {
            token: token.to_string(),
            reason: reason.to_string(),
        };

        if trimmed.is_empty() {
            return Err(malformed("empty"));
        }

        let range = match trimmed.split_once('-') {
            Some((min, max)) => {
                let min = parse_id(min).ok_or_else(|| malformed("invalid lower bound"))?;
                let max = parse_id(max).ok_or_else(|| malformed("invalid upper bound"))?;
                ClientIdRange::new(min, max)
            }
            None => ClientIdRange::single(parse_id(trimmed).ok_or_else(|| malformed("not an integer"))?),
        };

        if range.min > range.max {
            return Err(ValidationError::InvertedRange {
                token: token.to_string(),
                min: range.min,
                max: range.max,
            });
        }
        Ok(range)
    }
}

fn parse_id(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Display for ClientIdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// Parse tokens, sort by lower bound and reject overlapping or touching ranges.
pub fn parse_ranges<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<ClientIdRange>, ValidationError> {
    let mut ranges = tokens
        .iter()
        .map(|t| ClientIdRange::parse(t.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    if ranges.is_empty() {
        return Err(ValidationError::NoRanges);
    }

    ranges.sort_by_key(|r| r.min);

    for pair in ranges.windows(2) {
        if pair[0].max >= pair[1].min {
            return Err(ValidationError::OverlappingRanges {
                first: pair[0],
                second: pair[1],
            });
        }
    }

    Ok(ranges)
}

/// Ids covered by all of `ranges`, saturating at `u64::MAX`.
pub fn total_count(ranges: &[ClientIdRange]) -> u64 {
    ranges
        .iter()
        .map(ClientIdRange::count)
        .fold(0, u64::saturating_add)
}
