//! Expiration parsing and Thai date rendering.
//!
//! Stored expiration values arrive in whatever shape the backing table uses
//! (DATETIME, DATE, or free text) and WHOIS/RDAP hand back timestamp strings;
//! this module coerces them to a timestamp and renders the user-facing Thai
//! form: long date in Buddhist Era plus short time, displayed in UTC+7.
//!
//! Everything here degrades to `None` on unparseable input rather than
//! returning errors; "cannot format" is an expected condition, not a fault.

use chrono::{DateTime, Datelike, FixedOffset, Locale, NaiveDate, NaiveDateTime, TimeZone, Utc};

use crate::types::ExpireValue;

/// Display offset for rendered dates (UTC+7, Asia/Bangkok).
const THAILAND_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Years added to the Gregorian year to get the Buddhist Era year.
const BUDDHIST_ERA_OFFSET: i32 = 543;

/// Parse a textual timestamp into a naive UTC timestamp.
///
/// Accepted shapes, in order: RFC 3339, ISO date-time without zone,
/// `YYYY-MM-DD HH:MM:SS`, bare `YYYY-MM-DD`, RFC 2822. Zoned inputs are
/// converted to UTC; naive inputs are taken as already UTC.
pub fn parse_expire_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(parsed);
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(parsed);
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return parsed.and_hms_opt(0, 0, 0);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
        return Some(parsed.naive_utc());
    }

    None
}

/// Coerce a stored expiration value to a naive UTC timestamp.
///
/// Bare dates become midnight UTC; blank text counts as absent.
pub fn expire_to_datetime(value: &ExpireValue) -> Option<NaiveDateTime> {
    match value {
        ExpireValue::DateTime(dt) => Some(*dt),
        ExpireValue::Date(date) => date.and_hms_opt(0, 0, 0),
        ExpireValue::Text(text) => parse_expire_text(text),
    }
}

/// Render a timestamp in Thai convention: `15 มกราคม 2573 เวลา 07:00`.
///
/// The timestamp is interpreted as UTC and shifted to UTC+7 before
/// rendering; the year is Buddhist Era.
pub fn format_thai_datetime(timestamp: NaiveDateTime) -> Option<String> {
    let offset = FixedOffset::east_opt(THAILAND_UTC_OFFSET_SECS)?;
    let local = Utc.from_utc_datetime(&timestamp).with_timezone(&offset);

    let month = local.format_localized("%B", Locale::th_TH).to_string();
    if month.is_empty() {
        return None;
    }

    Some(format!(
        "{} {} {} เวลา {}",
        local.day(),
        month,
        local.year() + BUDDHIST_ERA_OFFSET,
        local.format("%H:%M")
    ))
}

/// Render a stored expiration value in Thai convention.
///
/// Combines [`expire_to_datetime`] and [`format_thai_datetime`]: `None` for
/// absent, blank, or unparseable values.
pub fn format_thailand_date(value: &ExpireValue) -> Option<String> {
    format_thai_datetime(expire_to_datetime(value)?)
}
