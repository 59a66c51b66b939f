// Copyright 2014-2015 Galen Clark Haynes
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! `dateTime.iso8601` text form.
//!
//! XML-RPC writes timestamps without punctuation in the date part,
//! `YYYYMMDDTHH:MM:SS`. A zone suffix is written only when the timestamp
//! carries an offset, and offsets are written to the minute.

use std::fmt::Write;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::error::{Error, Result};

/// A calendar timestamp, with the offset it was written in if it had one.
///
/// The text form holds a four-digit year and an offset to the minute. The
/// encoder rejects years outside `0..=9999`, and `encode_iso8601` drops the
/// seconds of an offset such as `+00:00:30`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DateTime {
    pub datetime: PrimitiveDateTime,
    pub offset: Option<UtcOffset>,
}

impl DateTime {
    /// A timestamp with no zone, read as local time by the peer.
    pub fn naive(datetime: PrimitiveDateTime) -> DateTime {
        DateTime {
            datetime,
            offset: None,
        }
    }

    pub fn with_offset(datetime: PrimitiveDateTime, offset: UtcOffset) -> DateTime {
        DateTime {
            datetime,
            offset: Some(offset),
        }
    }

    /// The absolute instant, when the offset is known.
    pub fn to_offset_datetime(&self) -> Option<OffsetDateTime> {
        self.offset.map(|offset| self.datetime.assume_offset(offset))
    }
}

impl From<OffsetDateTime> for DateTime {
    fn from(v: OffsetDateTime) -> DateTime {
        DateTime::with_offset(PrimitiveDateTime::new(v.date(), v.time()), v.offset())
    }
}

/// Formats `dt` as XML-RPC timestamp text. Sub-second precision is dropped.
pub fn encode_iso8601(dt: &DateTime) -> String {
    let d = dt.datetime;
    let mut out = format!(
        "{:04}{:02}{:02}T{:02}:{:02}:{:02}",
        d.year(),
        u8::from(d.month()),
        d.day(),
        d.hour(),
        d.minute(),
        d.second()
    );
    if let Some(offset) = dt.offset {
        if offset.is_utc() {
            out.push('Z');
        } else {
            let (hours, minutes, _) = offset.as_hms();
            let sign = if offset.is_negative() { '-' } else { '+' };
            // writing into a String cannot fail
            let _ = write!(
                out,
                "{}{:02}:{:02}",
                sign,
                hours.unsigned_abs(),
                minutes.unsigned_abs()
            );
        }
    }
    out
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^(\d{4})-?(\d{2})-?(\d{2})T(\d{2}):?(\d{2}):?(\d{2})(?:[.,](\d+))?(Z|[+-]\d{2}(?::?\d{2})?)?$",
        )
        .expect("timestamp pattern is valid")
    })
}

/// Parses XML-RPC timestamp text.
///
/// Besides the compact form this accepts the dashed date form, fractional
/// seconds, and a `Z` or `+HH:MM` suffix, all of which show up in the wild.
pub fn decode_iso8601(text: &str) -> Result<DateTime> {
    let malformed = || Error::MalformedTimestamp(text.to_string());
    let caps = pattern().captures(text).ok_or_else(malformed)?;

    let year: i32 = number(&caps, 1).ok_or_else(malformed)?;
    let month = Month::try_from(number::<u8>(&caps, 2).ok_or_else(malformed)?)
        .map_err(|_| malformed())?;
    let day: u8 = number(&caps, 3).ok_or_else(malformed)?;
    let date = Date::from_calendar_date(year, month, day).map_err(|_| malformed())?;

    let nanos = match caps.get(7) {
        Some(m) => {
            let digits: String = m.as_str().chars().chain("00000000".chars()).take(9).collect();
            digits.parse::<u32>().map_err(|_| malformed())?
        }
        None => 0,
    };
    let time = Time::from_hms_nano(
        number(&caps, 4).ok_or_else(malformed)?,
        number(&caps, 5).ok_or_else(malformed)?,
        number(&caps, 6).ok_or_else(malformed)?,
        nanos,
    )
    .map_err(|_| malformed())?;

    let offset = match caps.get(8).map(|m| m.as_str()) {
        None => None,
        Some("Z") => Some(UtcOffset::UTC),
        Some(zone) => Some(parse_offset(zone).ok_or_else(malformed)?),
    };

    Ok(DateTime {
        datetime: PrimitiveDateTime::new(date, time),
        offset,
    })
}

fn number<T: std::str::FromStr>(caps: &Captures, idx: usize) -> Option<T> {
    caps.get(idx)?.as_str().parse().ok()
}

// `+HH`, `+HHMM` or `+HH:MM`
fn parse_offset(zone: &str) -> Option<UtcOffset> {
    let sign: i8 = if zone.starts_with('-') { -1 } else { 1 };
    let digits: String = zone[1..].chars().filter(|c| *c != ':').collect();
    let hours: i8 = digits.get(0..2)?.parse().ok()?;
    let minutes: i8 = match digits.get(2..4) {
        Some(m) => m.parse().ok()?,
        None => 0,
    };
    UtcOffset::from_hms(sign * hours, sign * minutes, 0).ok()
}
