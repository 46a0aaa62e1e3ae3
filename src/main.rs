use std::{fs::File, io::BufWriter, path::PathBuf};

use allocplot::{FirefoxProfile, MemoryPlot, PlotConfig, ReusePolicy, STEP, StackedAreaChart, Trace};
use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "allocplot", about = "Plot memory usage over time from an allocation trace")]
struct Cli {
    /// Trace file, one `<secs>:<nanos> <+|-> <address> <size>` event per line.
    trace: PathBuf,
    /// Width of a sampling step in nanoseconds.
    #[arg(long, default_value_t = STEP)]
    step: u64,
    /// Replace the interval of an address allocated again while still live
    /// instead of failing.
    #[arg(long)]
    replace_live: bool,
    /// Where to write the stacked area chart.
    #[arg(long, default_value = "memory-usage.html")]
    html: PathBuf,
    /// Also write the sampled table as tab-separated values.
    #[arg(long)]
    tsv: Option<PathBuf>,
    /// Also write a Firefox Profiler profile of the raw events.
    #[arg(long)]
    firefox: Option<PathBuf>,
    /// Print the sampled table to stdout.
    #[arg(long)]
    print: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let reuse = if cli.replace_live {
        ReusePolicy::Replace
    } else {
        ReusePolicy::Reject
    };
    let config = PlotConfig::default()
        .with_step(cli.step)
        .with_reuse(reuse);

    let trace = Trace::from_path(&cli.trace)
        .with_context(|| format!("failed to read trace {}", cli.trace.display()))?;
    let plot = MemoryPlot::build(&trace, &config)
        .with_context(|| format!("failed to plot trace {}", cli.trace.display()))?;

    if let Some((nanos, bytes)) = plot.peak() {
        tracing::info!(nanos, bytes, "peak memory usage");
    }

    let table = plot.table();
    if cli.print {
        print!("{table}");
    }

    if let Some(path) = &cli.tsv {
        let file = File::create(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        table
            .write_tsv(BufWriter::new(file))
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), rows = table.len(), "wrote table");
    }

    if let Some(path) = &cli.firefox {
        FirefoxProfile::from_trace(&trace)
            .write_json(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote firefox profile");
    }

    let title = cli.trace.display().to_string();
    StackedAreaChart::from_table(&table, title)
        .write_html(&cli.html)
        .with_context(|| format!("failed to write chart {}", cli.html.display()))?;

    println!("Chart saved to {}", cli.html.display());

    Ok(())
}
