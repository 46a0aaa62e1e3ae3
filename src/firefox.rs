use std::{collections::HashMap, path::Path, time::SystemTime};

use fxprof_processed_profile::{
    CategoryColor, CategoryPairHandle, Frame as FxFrame, FrameFlags as FxFrameFlags,
    FrameInfo as FxFrameInfo, ProcessHandle, Profile, ReferenceTimestamp, SamplingInterval,
    StackHandle, ThreadHandle, Timestamp,
};
use serde_json::Error as SerdeError;

use crate::{
    event::{Event, EventKind},
    trace::Trace,
};

/// Wrapper around `fxprof_processed_profile::Profile` produced from a trace.
///
/// Every event becomes a native allocation sample whose stack is a single
/// frame labelled with the address, so the profiler groups bytes by address.
#[derive(Debug)]
pub struct FirefoxProfile {
    inner: Profile,
}

impl FirefoxProfile {
    /// Build a Firefox profile from the events of a trace.
    pub fn from_trace(trace: &Trace) -> Self {
        let origin = trace.raw_bounds().map(|b| b.min).unwrap_or(0);
        let mut builder = FirefoxProfileBuilder::new();
        for event in &trace.events {
            builder.add_event(event, origin);
        }
        Self {
            inner: builder.finish(),
        }
    }

    /// Serialize the Firefox profile to the given JSON file path.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let writer = std::io::BufWriter::new(std::fs::File::create(path)?);
        serde_json::to_writer(writer, &self.inner).map_err(std::io::Error::other)
    }

    /// Serialize the profile into a JSON string.
    pub fn to_json_string(&self) -> Result<String, SerdeError> {
        serde_json::to_string(&self.inner)
    }

    /// Access the underlying `fxprof_processed_profile::Profile`.
    pub fn as_profile(&self) -> &Profile {
        &self.inner
    }

    /// Consume the wrapper and return the `Profile`.
    pub fn into_profile(self) -> Profile {
        self.inner
    }
}

struct FirefoxProfileBuilder {
    profile: Profile,
    process: ProcessHandle,
    thread: ThreadHandle,
    category: CategoryPairHandle,
    stacks: HashMap<String, Option<StackHandle>>,
    synthetic_addresses: HashMap<String, u64>,
    last_nanos: u64,
}

impl FirefoxProfileBuilder {
    fn new() -> Self {
        let mut profile = Profile::new(
            "allocplot memory trace",
            ReferenceTimestamp::from(SystemTime::now()),
            SamplingInterval::from_millis(1),
        );
        profile.set_symbolicated(true);

        let process =
            profile.add_process("allocplot", 1, Timestamp::from_millis_since_reference(0.0));
        let thread = profile.add_thread(
            process,
            1,
            Timestamp::from_millis_since_reference(0.0),
            true,
        );
        profile.set_thread_name(thread, "Allocations");
        profile.add_initial_visible_thread(thread);
        profile.add_initial_selected_thread(thread);

        let category = profile
            .add_category("Allocations", CategoryColor::Blue)
            .into();

        Self {
            profile,
            process,
            thread,
            category,
            stacks: HashMap::new(),
            synthetic_addresses: HashMap::new(),
            last_nanos: 0,
        }
    }

    fn add_event(&mut self, event: &Event, origin: u64) {
        if event.size == 0 {
            return;
        }

        let nanos = event.timestamp.saturating_sub(origin);
        self.last_nanos = self.last_nanos.max(nanos);
        let timestamp = Timestamp::from_nanos_since_reference(nanos);

        let stack = self.stack_for(&event.address);
        let address = self.numeric_address(&event.address);
        let size = match event.kind {
            EventKind::Alloc => u64_to_i64(event.size),
            EventKind::Dealloc => -u64_to_i64(event.size),
        };

        self.profile
            .add_allocation_sample(self.thread, timestamp, stack, address, size);
    }

    fn stack_for(&mut self, address: &str) -> Option<StackHandle> {
        if let Some(stack) = self.stacks.get(address) {
            return *stack;
        }

        let label = self.profile.intern_string(address);
        let frame = FxFrameInfo {
            frame: FxFrame::Label(label),
            category_pair: self.category,
            flags: FxFrameFlags::empty(),
        };
        let stack = self
            .profile
            .intern_stack_frames(self.thread, std::iter::once(frame));
        self.stacks.insert(address.to_string(), stack);
        stack
    }

    /// Addresses that are not hex literals get a stable synthetic number.
    fn numeric_address(&mut self, address: &str) -> u64 {
        if let Some(value) = parse_hex_address(address) {
            return value;
        }
        let next = self.synthetic_addresses.len() as u64 + 1;
        *self
            .synthetic_addresses
            .entry(address.to_string())
            .or_insert(next)
    }

    fn finish(mut self) -> Profile {
        let end = Timestamp::from_nanos_since_reference(self.last_nanos);
        self.profile
            .set_process_end_time(self.process, end);
        self.profile
            .set_thread_end_time(self.thread, end);
        self.profile
    }
}

fn parse_hex_address(address: &str) -> Option<u64> {
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))?;
    u64::from_str_radix(digits, 16).ok()
}

fn u64_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
