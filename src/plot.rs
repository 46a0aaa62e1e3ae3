use crate::{
    config::PlotConfig,
    error::Result,
    interval::{Interval, build_intervals},
    resample::{Grid, Series, flatten, resample, totals},
    table::Table,
    trace::Trace,
};

/// Memory usage of a trace, resampled on a uniform grid.
///
/// ```rust
/// use allocplot::{MemoryPlot, PlotConfig, Trace};
///
/// let trace = Trace::parse("0:0 + 0xA 100\n0:300 - 0xA 100\n").unwrap();
/// let plot = MemoryPlot::build(&trace, &PlotConfig::default()).unwrap();
///
/// assert_eq!(plot.grid.len(), 3);
/// assert_eq!(plot.series[0].sizes, vec![100, 100, 100]);
/// ```
#[derive(Debug, Clone)]
pub struct MemoryPlot {
    pub grid: Grid,
    pub intervals: Vec<Interval>,
    pub series: Vec<Series>,
}

impl MemoryPlot {
    /// Run the whole pipeline: bounds, interval pairing and resampling.
    pub fn build(trace: &Trace, config: &PlotConfig) -> Result<Self> {
        config.validate()?;

        let bounds = trace.bounds(config.step)?;
        let grid = Grid::new(bounds, config.step);
        tracing::info!(
            events = trace.len(),
            min_time = grid.min,
            max_time = grid.max,
            step = grid.step,
            "computed trace bounds"
        );

        let intervals = build_intervals(&trace.events, grid.max, config.reuse)?;
        for interval in &intervals {
            tracing::debug!(
                address = %interval.address,
                size = interval.size,
                start = interval.start,
                stop = interval.stop,
                "interval"
            );
        }

        let series = resample(&intervals, &grid);
        tracing::info!(
            addresses = series.len(),
            steps = grid.len(),
            "resampled trace"
        );

        Ok(Self {
            grid,
            intervals,
            series,
        })
    }

    /// Flattened `Address / Nanos / Size` rows.
    pub fn table(&self) -> Table {
        Table::new(flatten(&self.series, &self.grid))
    }

    /// Bytes live across all addresses at each step.
    pub fn totals(&self) -> Vec<u64> {
        totals(&self.series, &self.grid)
    }

    /// Step with the most live bytes as `(timestamp, bytes)`; the earliest wins on ties.
    pub fn peak(&self) -> Option<(u64, u64)> {
        self.grid
            .steps()
            .zip(self.totals())
            .fold(None, |best, (t, bytes)| match best {
                Some((_, max)) if max >= bytes => best,
                _ => Some((t, bytes)),
            })
    }
}
