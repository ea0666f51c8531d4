//! HTTP-date formatting and the three date grammars accepted in
//! `If-Modified-Since`.

use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};

/// `06 Nov 1994 08:49:37`, after the weekday and before the zone
const RFC1123_FORMAT: &str = "%d %b %Y %H:%M:%S";
/// `Nov  6 08:49:37 1994`, after the weekday
const ASCTIME_FORMAT: &str = "%b %e %H:%M:%S %Y";
/// `06-Nov-94 08:49:37`, after the weekday and before the zone
const RFC850_FORMAT: &str = "%d-%b-%y %H:%M:%S";

/// Formats a time the way the `Date` header carries it (RFC 1123, GMT).
pub fn format_http_date(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Parses an HTTP date in any of the three grammars.
///
/// The grammar is picked from the character at offset 3: a comma means
/// RFC 1123, a space means asctime, anything else RFC 850. The weekday is
/// not checked against the date. Zoned grammars must say `GMT` (or `UTC`);
/// asctime carries no zone and is read as GMT.
pub fn parse_http_date(value: &str) -> Option<SystemTime> {
    let value = value.trim();
    let naive = match value.as_bytes().get(3)? {
        b',' => parse_zoned(&value[4..], RFC1123_FORMAT)?,
        b' ' => NaiveDateTime::parse_from_str(value[4..].trim_start(), ASCTIME_FORMAT).ok()?,
        _ => {
            let (_, rest) = value.split_once(',')?;
            parse_zoned(rest, RFC850_FORMAT)?
        }
    };

    Some(naive.and_utc().into())
}

fn parse_zoned(text: &str, format: &str) -> Option<NaiveDateTime> {
    let (stamp, zone) = text.trim().rsplit_once(' ')?;
    if zone != "GMT" && zone != "UTC" {
        return None;
    }
    NaiveDateTime::parse_from_str(stamp.trim_end(), format).ok()
}
