//! Transition-preserving downsampling
//!
//! Charts of long recordings are thinned to roughly `max_points` rows, but a
//! downsampled chart must never hide a state change. Selection:
//!
//! 1. the first and last rows;
//! 2. for each tracked column, both rows of every adjacent pair whose values differ;
//! 3. if budget remains, every `ceil(len / remaining)`-th row starting at 0.
//!
//! Because of (2) the result can exceed `max_points` when a series has many changes.

use crate::types::TimeseriesPoint;
use std::collections::{BTreeSet, HashMap};

/// Default point budget for interactive charts
pub const DEFAULT_MAX_POINTS: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Downsampler {
    max_points: usize,
}

impl Default for Downsampler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POINTS)
    }
}

impl Downsampler {
    pub fn new(max_points: usize) -> Self {
        Self { max_points }
    }

    pub fn max_points(&self) -> usize {
        self.max_points
    }

    /// Ascending, deduplicated indices of the rows to keep
    pub fn select_indices(&self, rows: &[TimeseriesPoint], columns: &[String]) -> Vec<usize> {
        let len = rows.len();
        if len <= self.max_points {
            return (0..len).collect();
        }

        let mut keep = BTreeSet::new();
        keep.insert(0);
        keep.insert(len - 1);

        for column in columns {
            for i in 1..len {
                if rows[i - 1].get(column) != rows[i].get(column) {
                    keep.insert(i - 1);
                    keep.insert(i);
                }
            }
        }

        // The stride fill adds at most `remaining` rows
        let remaining = self.max_points.saturating_sub(keep.len());
        if remaining > 0 {
            let stride = len.div_ceil(remaining);
            keep.extend((0..len).step_by(stride.max(1)));
        }

        keep.into_iter().collect()
    }

    /// Downsample and forward-fill the tracked columns
    pub fn apply(&self, rows: &[TimeseriesPoint], columns: &[String]) -> Vec<TimeseriesPoint> {
        if rows.len() <= self.max_points {
            let mut unchanged = rows.to_vec();
            forward_fill(&mut unchanged, columns);
            return unchanged;
        }

        log::info!("Downsampling from {} to ~{} points...", rows.len(), self.max_points);

        let mut sampled: Vec<TimeseriesPoint> = self
            .select_indices(rows, columns)
            .into_iter()
            .map(|i| rows[i].clone())
            .collect();

        log::info!("Downsampled to {} points", sampled.len());

        forward_fill(&mut sampled, columns);
        sampled
    }
}

/// Give every row the last known value of each tracked column
///
/// Rows before a column's first value stay without it.
pub fn forward_fill(rows: &mut [TimeseriesPoint], columns: &[String]) {
    let mut last_known = HashMap::new();

    for row in rows.iter_mut() {
        for column in columns {
            match row.values.get(column) {
                Some(value) => {
                    last_known.insert(column.as_str(), value.clone());
                }
                None => {
                    if let Some(value) = last_known.get(column.as_str()) {
                        row.values.insert(column.clone(), value.clone());
                    }
                }
            }
        }
    }
}
