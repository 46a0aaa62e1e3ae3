use std::collections::HashMap;

use serde::Serialize;

use crate::{
    config::ReusePolicy,
    error::ConsistencyError,
    event::{Event, EventKind},
};

/// The live range `[start, stop)` of one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interval {
    pub address: String,
    /// Allocated size in bytes
    pub size: u64,
    pub start: u64,
    pub stop: u64,
}

impl Interval {
    /// Half-open containment, `start <= t < stop`.
    pub fn contains(&self, t: u64) -> bool {
        self.start <= t && t < self.stop
    }

    /// Size held at time `t`, zero outside the interval.
    pub fn size_at(&self, t: u64) -> u64 {
        if self.contains(t) { self.size } else { 0 }
    }
}

#[derive(Debug)]
struct Entry {
    interval: Interval,
    open: bool,
}

/// Pairs allocations with their deallocations, one interval per address.
///
/// Intervals keep the order in which their address was first allocated.
#[derive(Debug)]
pub struct IntervalBuilder {
    max_time: u64,
    policy: ReusePolicy,
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    seen: usize,
}

impl IntervalBuilder {
    /// `max_time` closes every interval that is never deallocated.
    pub fn new(max_time: u64, policy: ReusePolicy) -> Self {
        Self {
            max_time,
            policy,
            entries: Vec::new(),
            index: HashMap::new(),
            seen: 0,
        }
    }

    pub fn push(&mut self, event: &Event) -> Result<(), ConsistencyError> {
        self.seen += 1;
        match event.kind {
            EventKind::Alloc => self.allocate(event),
            EventKind::Dealloc => self.deallocate(event),
        }
    }

    fn allocate(&mut self, event: &Event) -> Result<(), ConsistencyError> {
        let interval = Interval {
            address: event.address.clone(),
            size: event.size,
            start: event.timestamp,
            stop: self.max_time,
        };

        let Some(&idx) = self.index.get(&event.address) else {
            self.index.insert(event.address.clone(), self.entries.len());
            self.entries.push(Entry {
                interval,
                open: true,
            });
            return Ok(());
        };

        let entry = &mut self.entries[idx];
        if entry.open {
            if self.policy == ReusePolicy::Reject {
                return Err(ConsistencyError::DoubleAllocation {
                    event_index: self.seen,
                    address: event.address.clone(),
                });
            }
            tracing::warn!(
                address = %event.address,
                previous_start = entry.interval.start,
                "address allocated again while live, replacing interval"
            );
        } else {
            tracing::warn!(
                address = %event.address,
                previous_start = entry.interval.start,
                previous_stop = entry.interval.stop,
                "address reused after free, earlier interval discarded"
            );
        }

        entry.interval = interval;
        entry.open = true;
        Ok(())
    }

    fn deallocate(&mut self, event: &Event) -> Result<(), ConsistencyError> {
        let open = self
            .index
            .get(&event.address)
            .copied()
            .filter(|&idx| self.entries[idx].open);
        let Some(idx) = open else {
            return Err(ConsistencyError::UnmatchedDeallocation {
                event_index: self.seen,
                address: event.address.clone(),
            });
        };

        let entry = &mut self.entries[idx];

        if entry.interval.size != event.size {
            return Err(ConsistencyError::SizeMismatch {
                event_index: self.seen,
                address: event.address.clone(),
                allocated: entry.interval.size,
                freed: event.size,
            });
        }

        entry.interval.stop = event.timestamp;
        entry.open = false;
        Ok(())
    }

    pub fn finish(self) -> Vec<Interval> {
        let open = self.entries.iter().filter(|e| e.open).count();
        tracing::debug!(
            intervals = self.entries.len(),
            open,
            "finished pairing allocations"
        );
        self.entries.into_iter().map(|e| e.interval).collect()
    }
}

/// Build the intervals of a whole event sequence.
pub fn build_intervals<'a, I>(
    events: I,
    max_time: u64,
    policy: ReusePolicy,
) -> Result<Vec<Interval>, ConsistencyError>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut builder = IntervalBuilder::new(max_time, policy);
    for event in events {
        builder.push(event)?;
    }
    Ok(builder.finish())
}
