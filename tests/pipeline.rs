use allocplot::{
    ConsistencyError, Error, MemoryPlot, PlotConfig, StackedAreaChart, Trace, parse_timestamp,
};
use pretty_assertions::assert_eq;

fn plot(text: &str) -> Result<MemoryPlot, Error> {
    let trace = Trace::parse(text)?;
    MemoryPlot::build(&trace, &PlotConfig::default())
}

#[test]
fn single_address_scenario() {
    let plot = plot("0:0 + 0xA 100\n0:300 - 0xA 100\n").unwrap();

    assert_eq!(plot.grid.min, 0);
    assert_eq!(plot.grid.max, 300);

    let rows: Vec<(String, u64, u64)> = plot
        .table()
        .rows
        .into_iter()
        .map(|r| (r.address, r.timestamp, r.size))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("0xA".into(), 0, 100),
            ("0xA".into(), 100, 100),
            ("0xA".into(), 200, 100),
        ]
    );
}

#[test]
fn time_is_seconds_and_nanos() {
    assert_eq!(parse_timestamp("5:250").unwrap(), 5_250_000_000);
}

#[test]
fn mismatched_free_size_aborts() {
    let err = plot("0:0 + 0x10 64\n0:100 - 0x10 32\n").unwrap_err();
    match err {
        Error::Consistency(ConsistencyError::SizeMismatch {
            address,
            allocated,
            freed,
            ..
        }) => {
            assert_eq!(address, "0x10");
            assert_eq!(allocated, 64);
            assert_eq!(freed, 32);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn free_of_unknown_address_aborts() {
    let err = plot("0:0 + 0x10 64\n0:100 - 0x20 64\n").unwrap_err();
    assert!(matches!(
        err,
        Error::Consistency(ConsistencyError::UnmatchedDeallocation { .. })
    ));
}

#[test]
fn malformed_line_aborts() {
    let err = plot("0:0 + 0x10 64\n0:100 - 0x10\n").unwrap_err();
    match err {
        Error::Parse(e) => assert_eq!(e.line(), 2),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn unfreed_allocation_lasts_until_end_of_grid() {
    let plot = plot("1:50 + 0x1 8\n1:120 + 0x2 16\n1:480 - 0x2 16\n").unwrap();

    assert_eq!(plot.grid.min, 1_000_000_000);
    assert_eq!(plot.grid.max, 1_000_000_500);
    assert_eq!(plot.series[0].sizes, vec![0, 8, 8, 8, 8]);
    assert_eq!(plot.series[1].sizes, vec![0, 0, 16, 16, 16]);
}

#[test]
fn reads_trace_from_file_and_renders_chart() {
    let dir = std::env::temp_dir().join(format!("allocplot-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let trace_path = dir.join("trace.txt");
    std::fs::write(
        &trace_path,
        "0:500000000 + 0x1000 128\n0:600000000 - 0x1000 128\n",
    )
    .unwrap();

    let trace = Trace::from_path(&trace_path).unwrap();
    let plot = MemoryPlot::build(&trace, &PlotConfig::default().with_step(10_000_000)).unwrap();
    assert_eq!(plot.grid.len(), 10);
    assert_eq!(plot.series[0].live_steps(), 10);

    let html_path = dir.join("chart.html");
    StackedAreaChart::from_table(&plot.table(), "trace")
        .write_html(&html_path)
        .unwrap();
    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("0x1000"));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn missing_file_is_io_error() {
    let err = Trace::from_path("/definitely/not/here/trace.txt").unwrap_err();
    assert!(matches!(err, Error::Io(_)));
}

#[test]
fn consistency_errors_count_events_not_lines() {
    let err = plot("0:0 + 0x10 64\n\n\n0:100 - 0x10 32\n").unwrap_err();
    match err {
        Error::Consistency(e @ ConsistencyError::SizeMismatch { event_index, .. }) => {
            assert_eq!(event_index, 2);
            assert!(e.to_string().starts_with("event #2:"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
