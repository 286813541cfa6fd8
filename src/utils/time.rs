use time::format_description::well_known::{Iso8601, Rfc3339};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Parse a timestamp as the assistant service writes it.
///
/// The service emits either RFC 3339 or a naive ISO 8601 local time with no
/// offset; the latter is taken as UTC.
pub fn parse_service_timestamp(s: &str) -> Option<OffsetDateTime> {
    let s = s.trim();
    if let Ok(dt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(dt);
    }
    PrimitiveDateTime::parse(s, &Iso8601::DEFAULT)
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

/// Local wall-clock `HH:MM:SS` for message footers.
///
/// Falls back to UTC when the local offset cannot be determined.
pub fn clock_label(dt: &OffsetDateTime) -> String {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    clock_label_at(dt, offset)
}

fn clock_label_at(dt: &OffsetDateTime, offset: UtcOffset) -> String {
    let local = dt.to_offset(offset);
    format!("{:02}:{:02}:{:02}", local.hour(), local.minute(), local.second())
}
