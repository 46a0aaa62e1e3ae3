use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

use crate::{
    error::{Error, ParseError, Result},
    event::Event,
};

/// Earliest and latest event time of a trace, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeBounds {
    pub min: u64,
    pub max: u64,
}

impl TimeBounds {
    /// Widen the bounds outward to multiples of `step`: floor for `min`,
    /// ceiling for `max`.
    ///
    /// Fails for a zero step or when the rounded-up `max` does not fit in
    /// 64 bits.
    pub fn snap(self, step: u64) -> Result<Self> {
        if step == 0 {
            return Err(Error::Config("step must be greater than zero".into()));
        }
        let max = step
            .checked_mul(self.max.div_ceil(step))
            .ok_or(Error::BoundsOverflow {
                max: self.max,
                step,
            })?;
        Ok(Self {
            min: step * (self.min / step),
            max,
        })
    }
}

fn parse_non_blank(line: &str, number: usize) -> Result<Option<Event>, ParseError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    Event::parse_line(line, number).map(Some)
}

/// A parsed allocation trace, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Trace {
    pub events: Vec<Event>,
}

impl Trace {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Parse a trace from any buffered reader. Blank lines are skipped.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut events = Vec::new();
        for (idx, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
            let line = std::str::from_utf8(line)
                .map_err(|_| ParseError::Encoding { line: idx + 1 })?;
            if let Some(event) = parse_non_blank(line, idx + 1)? {
                events.push(event);
            }
        }
        tracing::debug!(events = events.len(), "parsed trace");
        Ok(Self { events })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a trace held in memory.
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let mut events = Vec::new();
        for (idx, line) in text.lines().enumerate() {
            if let Some(event) = parse_non_blank(line, idx + 1)? {
                events.push(event);
            }
        }
        Ok(Self { events })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Raw time bounds over every event, `None` for an empty trace.
    pub fn raw_bounds(&self) -> Option<TimeBounds> {
        self.events.iter().fold(None, |acc, event| {
            let t = event.timestamp;
            Some(match acc {
                None => TimeBounds { min: t, max: t },
                Some(b) => TimeBounds {
                    min: b.min.min(t),
                    max: b.max.max(t),
                },
            })
        })
    }

    /// Time bounds snapped to the `step` grid. An empty trace yields `[0, 0)`.
    pub fn bounds(&self, step: u64) -> Result<TimeBounds> {
        match self.raw_bounds() {
            Some(bounds) => bounds.snap(step),
            None if step == 0 => Err(Error::Config("step must be greater than zero".into())),
            None => Ok(TimeBounds { min: 0, max: 0 }),
        }
    }

    /// Write the trace back in its text format, one event per line.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for event in &self.events {
            writeln!(writer, "{event}")?;
        }
        writer.flush()
    }
}
