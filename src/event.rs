use std::fmt::{self, Display, Formatter};

use serde::Serialize;

use crate::{config::NANOS_IN_SEC, error::ParseError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// `+` in the trace
    Alloc,
    /// `-` in the trace
    Dealloc,
}

impl EventKind {
    pub fn symbol(self) -> char {
        match self {
            EventKind::Alloc => '+',
            EventKind::Dealloc => '-',
        }
    }
}

/// One line of a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    /// Nanoseconds since the start of the trace
    pub timestamp: u64,
    pub kind: EventKind,
    /// Address as written in the trace, e.g. `0x1000`
    pub address: String,
    /// Size in bytes
    pub size: u64,
}

impl Event {
    pub fn alloc(timestamp: u64, address: impl Into<String>, size: u64) -> Self {
        Self {
            timestamp,
            kind: EventKind::Alloc,
            address: address.into(),
            size,
        }
    }

    pub fn dealloc(timestamp: u64, address: impl Into<String>, size: u64) -> Self {
        Self {
            timestamp,
            kind: EventKind::Dealloc,
            address: address.into(),
            size,
        }
    }

    /// Parse a single `<secs>:<nanos> <+|-> <address> <size>` line.
    ///
    /// Fields after the fourth are ignored.
    pub fn parse_line(text: &str, line: usize) -> Result<Self, ParseError> {
        let fields: Vec<&str> = text.split_whitespace().collect();
        let [time, kind, address, size, ..] = fields[..] else {
            return Err(ParseError::FieldCount {
                line,
                found: fields.len(),
            });
        };

        let timestamp = parse_timestamp(time).map_err(|e| e.at_line(line))?;
        let kind = match kind {
            "+" => EventKind::Alloc,
            "-" => EventKind::Dealloc,
            other => {
                return Err(ParseError::Kind {
                    line,
                    value: other.to_string(),
                });
            }
        };
        let size = size.parse::<u64>().map_err(|_| ParseError::Size {
            line,
            value: size.to_string(),
        })?;

        Ok(Self {
            timestamp,
            kind,
            address: address.to_string(),
            size,
        })
    }
}

impl Display for Event {
    /// Writes the event back in trace format.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            format_timestamp(self.timestamp),
            self.kind.symbol(),
            self.address,
            self.size
        )
    }
}

/// Convert `"S:N"` into `S * 1_000_000_000 + N` nanoseconds.
///
/// The returned error carries line 0; callers attach the real line number.
pub fn parse_timestamp(value: &str) -> Result<u64, ParseError> {
    let invalid = || ParseError::Timestamp {
        line: 0,
        value: value.to_string(),
    };

    let (secs, nanos) = value.split_once(':').ok_or_else(invalid)?;
    let secs = secs.parse::<u64>().map_err(|_| invalid())?;
    let nanos = nanos.parse::<u64>().map_err(|_| invalid())?;

    secs.checked_mul(NANOS_IN_SEC)
        .and_then(|n| n.checked_add(nanos))
        .ok_or_else(|| ParseError::TimestampOverflow {
            line: 0,
            value: value.to_string(),
        })
}

/// Inverse of [`parse_timestamp`] for whole nanosecond counts.
pub fn format_timestamp(nanos: u64) -> String {
    format!("{}:{}", nanos / NANOS_IN_SEC, nanos % NANOS_IN_SEC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("5:250", 5_250_000_000 ; "seconds and nanos")]
    #[test_case("0:0", 0 ; "zero")]
    #[test_case("0:999999999", 999_999_999 ; "nanos only")]
    #[test_case("2:1500000000", 3_500_000_000 ; "nanos carry over")]
    fn parses_timestamp(value: &str, expected: u64) {
        assert_eq!(parse_timestamp(value).unwrap(), expected);
    }

    #[test_case("5" ; "missing colon")]
    #[test_case("a:1" ; "bad seconds")]
    #[test_case("1:-3" ; "negative nanos")]
    #[test_case(":" ; "empty parts")]
    fn rejects_bad_timestamp(value: &str) {
        assert!(matches!(
            parse_timestamp(value),
            Err(ParseError::Timestamp { .. })
        ));
    }

    #[test]
    fn timestamp_overflow_is_reported() {
        let err = parse_timestamp("18446744073:709551616").unwrap_err();
        assert!(matches!(err, ParseError::TimestampOverflow { .. }));
    }

    #[test]
    fn parses_alloc_line() {
        let event = Event::parse_line("0:500000000 + 0x1000 128", 1).unwrap();
        assert_eq!(event, Event::alloc(500_000_000, "0x1000", 128));
    }

    #[test]
    fn ignores_trailing_fields() {
        let event = Event::parse_line("0:600000000 - 0x1000 128 | src/main.rs:3:5", 1).unwrap();
        assert_eq!(event, Event::dealloc(600_000_000, "0x1000", 128));
    }

    #[test]
    fn reports_line_of_bad_field() {
        let err = Event::parse_line("0:1 + 0x1000", 7).unwrap_err();
        assert_eq!(err, ParseError::FieldCount { line: 7, found: 3 });

        let err = Event::parse_line("x + 0x1000 1", 4).unwrap_err();
        assert_eq!(err.line(), 4);

        let err = Event::parse_line("0:1 * 0x1000 1", 2).unwrap_err();
        assert!(matches!(err, ParseError::Kind { line: 2, .. }));

        let err = Event::parse_line("0:1 + 0x1000 big", 3).unwrap_err();
        assert!(matches!(err, ParseError::Size { line: 3, .. }));
    }

    #[test]
    fn display_writes_trace_format() {
        let event = Event::dealloc(5_250_000_000, "0xa", 64);
        assert_eq!(event.to_string(), "5:250000000 - 0xa 64");
        assert_eq!(Event::parse_line(&event.to_string(), 1).unwrap(), event);
    }
}
