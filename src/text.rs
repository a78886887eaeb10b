//! Helpers for presenting rendered WordPress text.
//!
//! WordPress titles arrive HTML-escaped (`&#8211;`, `&amp;`), which is fine
//! inside markup but not in `<title>`, alt text or JSON consumers that print
//! them verbatim.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;

/// Longest entity body we try to decode (`&thetasym;` is the longest named one).
const MAX_ENTITY_LEN: usize = 10;

/// Decode the HTML entities WordPress emits in titles and excerpts.
///
/// Unknown or malformed entities are left as they are. Decoding is a single
/// pass, so `&amp;lt;` becomes `&lt;` rather than `<`.
#[must_use]
pub fn decode_html_entities(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        let decoded = tail[1..]
            .find(';')
            .filter(|end| *end > 0 && *end <= MAX_ENTITY_LEN)
            .and_then(|end| decode_entity(&tail[1..=end]).map(|c| (c, end)));

        if let Some((c, end)) = decoded {
            out.push(c);
            rest = &tail[end + 2..];
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }

    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(numeric) = name.strip_prefix('#') {
        let code = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse().ok()?,
        };
        return char::from_u32(code);
    }
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "ldquo" => '\u{201C}',
        "rdquo" => '\u{201D}',
        _ => return None,
    };
    Some(c)
}

/// Two-line date label shown on post cards ("02" over "Jul").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateBadge {
    pub day: String,
    pub month: String,
}

/// Build a [`DateBadge`] from a WordPress date.
///
/// Accepts the site-local `2024-07-02T09:15:00` form, RFC 3339 and bare dates.
#[must_use]
pub fn date_badge(date: &str) -> Option<DateBadge> {
    let date = date.trim();
    let day = NaiveDateTime::parse_from_str(date, "%Y-%m-%dT%H:%M:%S")
        .map(|dt| dt.date())
        .or_else(|_| DateTime::parse_from_rfc3339(date).map(|dt| dt.date_naive()))
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
        .ok()?;

    Some(DateBadge {
        day: day.format("%d").to_string(),
        month: day.format("%b").to_string(),
    })
}
