// From a batch of values, derives (width, signed, precision, numeric kind);
// from timestamps derives regularity/interval/time-width.

use crate::alphabet::Base;
use crate::numeric::{NumericKind, NumericParams};
use crate::precision;
use crate::series::Series;

/// Whether a value stream collapsed to a single repeated value (the value
/// stream is then elided from the frame body).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueSolution {
    Static { value: f64, count: usize },
    Varying { params: NumericParams },
}

/// Whether the time axis has a constant step (the per-row time token is then
/// elided from the frame body).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeSolution {
    Regular { interval: i64 },
    Irregular { params: NumericParams },
}

pub struct FrameParamSolver;

impl FrameParamSolver {
    /// Derives value-stream parameters for `series`, per spec.md §4.4 steps 1-3.
    /// `precision_override` lets a caller serialize an explicit decimal
    /// precision instead of relying on the heuristic in [`precision::probe`].
    pub fn solve_values(series: &Series, base: Base, precision_override: Option<u32>) -> ValueSolution {
        let values: Vec<f64> = series.observations.iter().map(|o| o.v).collect();
        Self::solve_value_list(&values, base, precision_override)
    }

    /// Same derivation as [`Self::solve_values`], but over a bare value list —
    /// used independently per column by the CSV transformer (spec.md §4.7 step 4).
    pub fn solve_value_list(values: &[f64], base: Base, precision_override: Option<u32>) -> ValueSolution {
        let n = values.len();
        let vmin = values.iter().copied().fold(f64::INFINITY, f64::min);
        let vmax = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let smax = precision_override.unwrap_or_else(|| {
            values
                .iter()
                .map(|v| precision::probe(*v).1)
                .max()
                .unwrap_or(0)
        });

        let signed = vmin < 0.0;
        let magnitude = vmax.abs().max(vmin.abs());
        let scale = 10f64.powi(smax as i32);
        let m = magnitude * scale * if signed { 2.0 } else { 1.0 };

        if m == 0.0 {
            return ValueSolution::Static {
                value: vmax,
                count: n,
            };
        }

        let kind = if smax > 0 {
            NumericKind::Float
        } else {
            NumericKind::Int
        };
        let width = NumericParams::min_width(base, m);
        ValueSolution::Varying {
            params: NumericParams {
                kind,
                precision: smax,
                signed,
                width,
                base,
            },
        }
    }

    /// Derives time-axis regularity, per spec.md §4.4 step 4.
    ///
    /// A series with fewer than two observations is regular by convention,
    /// with `interval = 0` (the gap sequence is empty).
    pub fn solve_time(series: &Series, base: Base) -> TimeSolution {
        let times: Vec<i64> = series.observations.iter().map(|o| o.t).collect();
        if times.len() < 2 {
            return TimeSolution::Regular { interval: 0 };
        }

        let gaps: Vec<i64> = times.windows(2).map(|w| w[1] - w[0]).collect();
        let first_gap = gaps[0];
        if gaps.iter().all(|g| *g == first_gap) {
            return TimeSolution::Regular { interval: first_gap };
        }

        let start = times[0];
        let max_offset = times.iter().map(|t| t - start).max().unwrap_or(0);
        let width = NumericParams::min_width(base, max_offset as f64);
        TimeSolution::Irregular {
            params: NumericParams {
                kind: NumericKind::Int,
                precision: 0,
                signed: false,
                width,
                base,
            },
        }
    }
}
