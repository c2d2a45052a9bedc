//! Decoded ID components

use chrono::{DateTime, Utc};
use quickid_util::{millis_to_datetime, IdField, QuickIdError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::base32::{self, MIN_ID_LEN, SEQ_WIDTH, TIME_WIDTH};

/// The three components encoded in an ID string
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedId {
    /// Milliseconds since the Unix epoch
    pub time: i64,
    /// System tag of the generator that produced the ID
    pub sys: String,
    /// Sequence counter value at generation
    pub seq: u32,
}

impl ParsedId {
    pub fn new(time: i64, sys: impl Into<String>, seq: u32) -> Self {
        Self {
            time,
            sys: sys.into(),
            seq,
        }
    }

    /// Re-encode into the ID string these components came from
    pub fn encode(&self) -> String {
        format_id(self.time, &self.sys, self.seq)
    }

    /// Generation time as a UTC datetime
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.time)
    }
}

impl fmt::Display for ParsedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for ParsedId {
    type Err = QuickIdError;

    fn from_str(s: &str) -> Result<Self> {
        parse_id(s)
    }
}

/// Build an ID string: 9-digit time, the tag verbatim, 4-digit sequence.
///
/// Negative times are clamped to 0.
pub fn format_id(time: i64, system_tag: &str, seq: u32) -> String {
    let mut id = String::with_capacity(MIN_ID_LEN + system_tag.len());
    base32::push_padded(&mut id, time.max(0) as u64, TIME_WIDTH);
    id.push_str(system_tag);
    base32::push_padded(&mut id, seq as u64, SEQ_WIDTH);
    id
}

/// Split an ID string into its components.
///
/// Parsing is structural and needs no generator: the first 9 bytes are the
/// time, the last 4 the sequence, and whatever lies between is the tag.
pub fn parse_id(id: &str) -> Result<ParsedId> {
    if id.len() < MIN_ID_LEN {
        return Err(QuickIdError::malformed(id));
    }

    let seq_start = id.len() - SEQ_WIDTH;
    let time_field = id
        .get(..TIME_WIDTH)
        .ok_or_else(|| QuickIdError::invalid_digit(IdField::Time, prefix_lossy(id)))?;
    let seq_field = id
        .get(seq_start..)
        .ok_or_else(|| QuickIdError::invalid_digit(IdField::Sequence, suffix_lossy(id)))?;
    // Both offsets were just checked as char boundaries
    let sys = &id[TIME_WIDTH..seq_start];

    let time = base32::decode(time_field)
        .and_then(|t| i64::try_from(t).ok())
        .ok_or_else(|| QuickIdError::invalid_digit(IdField::Time, time_field))?;
    let seq = base32::decode(seq_field)
        .map(|s| s as u32)
        .ok_or_else(|| QuickIdError::invalid_digit(IdField::Sequence, seq_field))?;

    Ok(ParsedId {
        time,
        sys: sys.to_string(),
        seq,
    })
}

fn prefix_lossy(id: &str) -> String {
    String::from_utf8_lossy(&id.as_bytes()[..TIME_WIDTH]).into_owned()
}

fn suffix_lossy(id: &str) -> String {
    String::from_utf8_lossy(&id.as_bytes()[id.len() - SEQ_WIDTH..]).into_owned()
}
