use std::{
    alloc::{GlobalAlloc, Layout},
    collections::HashSet,
    io::Write,
    sync::{
        OnceLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Instant,
};

use crate::{
    event::{Event, EventKind},
    trace::Trace,
    unsafe_cell::RecordCell,
};

#[derive(Clone, Copy)]
struct Record {
    kind: EventKind,
    nanos: u64,
    address: usize,
    size: usize,
}

impl Record {
    const EMPTY: Record = Record {
        kind: EventKind::Alloc,
        nanos: 0,
        address: 0,
        size: 0,
    };
}

/// A global allocator that records allocations and deallocations in the
/// trace format understood by [`Trace`].
///
/// ```rust,no_run
/// use allocplot::TrackingAllocator;
///
/// const CAPACITY: usize = 1_024 * 10;
/// #[global_allocator]
/// static ALLOCATOR: TrackingAllocator<CAPACITY> = TrackingAllocator::new();
///
/// fn foo() {
///     let _ = String::with_capacity(1024);
/// }
///
/// ALLOCATOR.start_track();
/// foo();
/// ALLOCATOR.stop_track();
///
/// // Safety: it is called after `stop_track`
/// unsafe { ALLOCATOR.write_trace(std::fs::File::create("trace.txt").unwrap()) }.unwrap();
/// ```
pub struct TrackingAllocator<const CAPACITY: usize> {
    is_tracking: AtomicBool,
    alloc: std::alloc::System,
    logs: [RecordCell<Record>; CAPACITY],
    logs_pointer: AtomicUsize,
    dropped: AtomicUsize,
    start: OnceLock<Instant>,
}

impl<const CAPACITY: usize> Default for TrackingAllocator<CAPACITY> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAPACITY: usize> TrackingAllocator<CAPACITY> {
    pub const fn new() -> Self {
        TrackingAllocator {
            is_tracking: AtomicBool::new(false),
            alloc: std::alloc::System,
            logs: [const { RecordCell::new(Record::EMPTY) }; CAPACITY],
            logs_pointer: AtomicUsize::new(0),
            dropped: AtomicUsize::new(0),
            start: OnceLock::new(),
        }
    }

    /// Start recording. Timestamps are relative to the first call.
    pub fn start_track(&self) {
        self.start.get_or_init(Instant::now);
        self.is_tracking.store(true, Ordering::SeqCst);
    }

    /// Stop recording.
    pub fn stop_track(&self) {
        self.is_tracking.store(false, Ordering::SeqCst);
    }

    /// Events that did not fit in the log.
    pub fn dropped_events(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    /// Number of events stored in the log.
    pub fn recorded_events(&self) -> usize {
        self.logs_pointer.load(Ordering::SeqCst).min(CAPACITY)
    }

    fn log(&self, kind: EventKind, ptr: *mut u8, layout: &Layout) {
        let Some(start) = self.start.get() else {
            return;
        };

        let index = self.logs_pointer.fetch_add(1, Ordering::SeqCst);
        if index >= CAPACITY {
            self.dropped.fetch_add(1, Ordering::SeqCst);
            return;
        }

        let nanos = u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        // Safety: `index` was reserved by this call only
        let record = unsafe { &mut *self.logs[index].get() };
        *record = Record {
            kind,
            nanos,
            address: ptr as usize,
            size: layout.size(),
        };
    }

    /// Assemble the recorded events into a trace.
    ///
    /// Deallocations of blocks allocated before tracking started have no
    /// allocation in the log and are left out.
    ///
    /// # Safety
    ///
    /// It is the caller's responsibility to ensure that the allocator is not tracking
    /// allocations when this function is called. Undefined behavior may occur if the allocator
    /// is still tracking allocations.
    pub unsafe fn calculate_trace(&self) -> Trace {
        let count = self.recorded_events();
        let mut live = HashSet::new();
        let mut orphans = 0_usize;
        let mut events = Vec::with_capacity(count);

        for i in 0..count {
            // Safety: no writer is active once tracking stopped
            let record = unsafe { *self.logs[i].get() };
            match record.kind {
                EventKind::Alloc => {
                    live.insert(record.address);
                }
                EventKind::Dealloc => {
                    if !live.remove(&record.address) {
                        orphans += 1;
                        continue;
                    }
                }
            }
            events.push(Event {
                timestamp: record.nanos,
                kind: record.kind,
                address: format!("{:#x}", record.address),
                size: record.size as u64,
            });
        }

        tracing::debug!(
            recorded = count,
            orphans,
            dropped = self.dropped_events(),
            "assembled trace from allocator log"
        );
        if self.dropped_events() > 0 {
            tracing::warn!(
                dropped = self.dropped_events(),
                capacity = CAPACITY,
                "allocator log overflowed, trace is incomplete"
            );
        }

        Trace::new(events)
    }

    /// Write the recorded trace, one event per line.
    ///
    /// # Safety
    ///
    /// Same contract as [`calculate_trace`](Self::calculate_trace).
    pub unsafe fn write_trace<W: Write>(&self, writer: W) -> std::io::Result<()> {
        let trace = unsafe { self.calculate_trace() };
        trace.write_to(writer)
    }
}

unsafe impl<const CAPACITY: usize> GlobalAlloc for TrackingAllocator<CAPACITY> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { self.alloc.alloc(layout) };

        // Don't track allocations if not enabled
        if !ptr.is_null() && self.is_tracking.load(Ordering::SeqCst) {
            self.log(EventKind::Alloc, ptr, &layout);
        }

        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        if self.is_tracking.load(Ordering::SeqCst) {
            self.log(EventKind::Dealloc, ptr, &layout);
        }

        unsafe { self.alloc.dealloc(ptr, layout) }
    }
}
