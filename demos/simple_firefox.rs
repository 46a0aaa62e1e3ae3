use allocplot::{FirefoxProfile, TrackingAllocator};

// Maximum number of events to keep
const CAPACITY: usize = 1_024 * 10;
#[global_allocator]
static ALLOCATOR: TrackingAllocator<CAPACITY> = TrackingAllocator::new();

fn foo() {
    let _ = String::with_capacity(1024);
}

fn main() {
    ALLOCATOR.start_track();
    foo();
    ALLOCATOR.stop_track();

    // Safety: it is called after `stop_track`
    let trace = unsafe { ALLOCATOR.calculate_trace() };
    let profile = FirefoxProfile::from_trace(&trace);

    let file_name = "simple-memory-profile.json";
    let path = std::env::current_dir().unwrap().join(file_name);
    profile.write_json(&path).unwrap();

    println!("Firefox profile saved to {}", path.display());
}
