use serde::Serialize;

use crate::{interval::Interval, trace::TimeBounds};

/// Uniform time grid `[min, max)` with steps of `step` nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Grid {
    pub min: u64,
    pub max: u64,
    pub step: u64,
}

impl Grid {
    /// `step` must be non-zero.
    pub fn new(bounds: TimeBounds, step: u64) -> Self {
        Self {
            min: bounds.min,
            max: bounds.max,
            step,
        }
    }

    /// Number of steps, `ceil((max - min) / step)`.
    pub fn len(&self) -> usize {
        let steps = self.max.saturating_sub(self.min).div_ceil(self.step);
        usize::try_from(steps).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Timestamp of every step, in order.
    pub fn steps(self) -> impl Iterator<Item = u64> {
        let Grid { min, step, .. } = self;
        (0..self.len() as u64).map(move |i| min + i * step)
    }
}

/// The size of one address sampled at every step of a grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Series {
    pub address: String,
    pub sizes: Vec<u64>,
}

impl Series {
    pub fn sample(interval: &Interval, grid: &Grid) -> Self {
        Self {
            address: interval.address.clone(),
            sizes: grid.steps().map(|t| interval.size_at(t)).collect(),
        }
    }

    /// `(timestamp, size)` pairs along the grid.
    pub fn points(&self, grid: Grid) -> impl Iterator<Item = (u64, u64)> {
        grid.steps().zip(self.sizes.iter().copied())
    }

    /// Number of steps at which the address was live.
    pub fn live_steps(&self) -> usize {
        self.sizes.iter().filter(|&&size| size != 0).count()
    }
}

/// One row of the flattened table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sample {
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "Nanos")]
    pub timestamp: u64,
    #[serde(rename = "Size")]
    pub size: u64,
}

/// Sample every interval on the grid, keeping interval order.
pub fn resample(intervals: &[Interval], grid: &Grid) -> Vec<Series> {
    let series: Vec<Series> = intervals
        .iter()
        .map(|interval| Series::sample(interval, grid))
        .collect();
    tracing::debug!(
        addresses = series.len(),
        steps = grid.len(),
        "resampled intervals"
    );
    series
}

/// Flatten per-address series into `(address, timestamp, size)` rows.
pub fn flatten(series: &[Series], grid: &Grid) -> Vec<Sample> {
    series
        .iter()
        .flat_map(|s| {
            s.points(*grid).map(move |(timestamp, size)| Sample {
                address: s.address.clone(),
                timestamp,
                size,
            })
        })
        .collect()
}

/// Total bytes live across all addresses at each step.
pub fn totals(series: &[Series], grid: &Grid) -> Vec<u64> {
    let mut totals = vec![0_u64; grid.len()];
    for s in series {
        for (total, size) in totals.iter_mut().zip(&s.sizes) {
            *total = total.saturating_add(*size);
        }
    }
    totals
}
