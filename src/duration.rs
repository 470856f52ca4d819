//! Elapsed-time and clock-time formatting for itinerary legs.

use chrono::{DateTime, NaiveDateTime};

/// Parses the timestamps the search endpoint hands back.
///
/// Legs usually come as local wall-clock times (`2024-06-01T08:05:00`), but
/// offsets and minute-precision values show up too.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
}

/// Formats the time between two instants as `"<H> hr <M> min"`.
///
/// Hours are floored and minutes are taken modulo 60.
pub fn format_duration(departure: NaiveDateTime, arrival: NaiveDateTime) -> String {
    let minutes = (arrival - departure).num_minutes();
    format!(
        "{} hr {} min",
        minutes.div_euclid(60),
        minutes.rem_euclid(60)
    )
}

/// Formats the elapsed time between two raw leg timestamps.
///
/// Returns `None` when either side does not parse, so callers can render
/// `N/A` instead.
pub fn flight_duration(departure: &str, arrival: &str) -> Option<String> {
    Some(format_duration(
        parse_timestamp(departure)?,
        parse_timestamp(arrival)?,
    ))
}

/// 12-hour clock rendering used in the results table, e.g. `8:05 AM`.
pub fn clock_time(ts: NaiveDateTime) -> String {
    ts.format("%-I:%M %p").to_string()
}

/// True when the arrival lands on a later calendar day than the departure.
pub fn arrives_next_day(departure: NaiveDateTime, arrival: NaiveDateTime) -> bool {
    arrival.date() > departure.date()
}
