use allocplot::{MemoryPlot, PlotConfig, StackedAreaChart, TrackingAllocator};

// Maximum number of events to keep
const CAPACITY: usize = 1_024 * 10;
#[global_allocator]
static ALLOCATOR: TrackingAllocator<CAPACITY> = TrackingAllocator::new();

struct Foo {
    a: Vec<u32>,
}

impl Foo {
    fn new() -> Self {
        Foo { a: Vec::new() }
    }

    fn add(&mut self, value: u32) {
        self.a.push(value);
    }
}

fn main() {
    let mut f = Foo::new();
    ALLOCATOR.start_track();
    for i in 0..100 {
        f.add(i);
    }
    f.a.shrink_to_fit();
    let _ = String::with_capacity(1024);
    ALLOCATOR.stop_track();

    // Safety: it is called after `stop_track`
    let trace = unsafe { ALLOCATOR.calculate_trace() };
    trace
        .write_to(std::fs::File::create("simple-trace.txt").unwrap())
        .unwrap();

    let plot = MemoryPlot::build(&trace, &PlotConfig::default().with_step(1_000)).unwrap();
    let chart = StackedAreaChart::from_table(&plot.table(), "simple");

    let file_name = "simple-memory-usage.html";
    let path = std::env::current_dir().unwrap().join(file_name);
    chart.write_html(&path).unwrap();

    println!("Chart saved to {}", path.display());
}
