//! Reduction of a trace to baseline, peak and integral, the accept/reject
//! policy of the integral output, and run statistics of the diagnostic
//! output.

use std::fmt;

use crate::acquisition_config::{AcquisitionConfig, RejectionParameters};
use crate::ring_buffer::BUF;
use crate::trace::Trace;

/// Leading samples averaged into the baseline.
pub const BASELINE_SAMPLES: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceReduction {
    /// Sum of the first [`BASELINE_SAMPLES`] samples divided by
    /// [`BASELINE_SAMPLES`], also for shorter traces.
    pub baseline: f64,
    /// Sum of all samples minus `len * baseline`.
    pub integral: f64,
    /// Largest magnitude inside the analysis window minus `|baseline|`.
    pub peak: f64,
    /// Trace index where the peak magnitude was first found.
    pub peak_position: usize,
}

/// Half-open range of trace indices searched for the peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisWindow {
    pub start: usize,
    pub end: usize,
}

impl AnalysisWindow {
    pub fn full(trace_length: usize) -> Self {
        Self {
            start: 0,
            end: trace_length,
        }
    }

    /// `[pretrigger, trace_length)` unless the rejection parameters set an
    /// explicit `[channel_start, channel_end)`.
    pub fn for_rejection(config: &AcquisitionConfig) -> Self {
        let rejection = config.rejection();
        if rejection.window_enabled() {
            Self {
                start: rejection.channel_start.max(0) as usize,
                end: rejection.channel_end.max(0) as usize,
            }
        } else {
            Self {
                start: config.pretrigger_length(),
                end: config.trace_length(),
            }
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        (self.start..self.end).contains(&index)
    }
}

/// Computes baseline, integral and peak of `samples`, searching the peak only
/// inside `window`.
pub fn reduce(samples: &[i32], window: AnalysisWindow) -> TraceReduction {
    #[cfg(feature = "cpu-profiling")]
    let _span = tracy_client::span!("reduce");

    let baseline = samples
        .iter()
        .take(BASELINE_SAMPLES)
        .map(|&s| f64::from(s))
        .sum::<f64>()
        / BASELINE_SAMPLES as f64;

    let mut total = 0.0;
    let mut peak_magnitude = 0;
    let mut peak_position = 0;
    for (i, &sample) in samples.iter().enumerate() {
        total += f64::from(sample);
        if window.contains(i) && sample.abs() > peak_magnitude {
            peak_magnitude = sample.abs();
            peak_position = i;
        }
    }

    TraceReduction {
        baseline,
        integral: total - samples.len() as f64 * baseline,
        peak: f64::from(peak_magnitude) - baseline.abs(),
        peak_position,
    }
}

/// Outcome of the integral/rejection reduction of one trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegralOutcome {
    pub reduction: TraceReduction,
    pub accepted: bool,
}

/// Applies the integral/peak rejection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalAnalyzer {
    window: AnalysisWindow,
    rejection: RejectionParameters,
}

impl SignalAnalyzer {
    pub fn new(window: AnalysisWindow, rejection: RejectionParameters) -> Self {
        Self { window, rejection }
    }

    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self::new(AnalysisWindow::for_rejection(config), *config.rejection())
    }

    pub fn window(&self) -> AnalysisWindow {
        self.window
    }

    pub fn analyze(&self, trace: &Trace) -> IntegralOutcome {
        let reduction = reduce(trace.samples(), self.window);
        let accepted = self.accepts(&reduction);
        log::trace!(
            "Total {} Peak: {} base: {} accepted: {}",
            reduction.integral,
            reduction.peak,
            reduction.baseline,
            accepted
        );
        IntegralOutcome {
            reduction,
            accepted,
        }
    }

    /// Accepts when `min * peak <= |integral| <= max * peak`, or when the peak
    /// is no higher than the curve bend and only the upper bound holds.
    pub fn accepts(&self, reduction: &TraceReduction) -> bool {
        let magnitude = reduction.integral.abs();
        let lower = f64::from(self.rejection.ratio_min) * reduction.peak;
        let upper = f64::from(self.rejection.ratio_max) * reduction.peak;

        if magnitude >= lower && magnitude <= upper {
            return true;
        }
        reduction.peak <= f64::from(self.rejection.curve_bend) && magnitude <= upper
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeakPosition {
    pub position: usize,
    pub count: u32,
}

/// Statistics reported at the end of a diagnostic run.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticReport {
    pub traces: u64,
    pub mean_integral_over_peak: Option<f64>,
    pub most_frequent: [PeakPosition; 3],
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results:")?;
        match self.mean_integral_over_peak {
            Some(mean) => writeln!(f, "Average area/peak: {mean}")?,
            None => writeln!(f, "Average area/peak: n/a (no traces with a peak)")?,
        }
        let labels = ["Most", "Second most", "Third most"];
        for (label, entry) in labels.iter().zip(&self.most_frequent) {
            writeln!(
                f,
                "{} frequent peak position: {} ({} times)",
                label, entry.position, entry.count
            )?;
        }
        Ok(())
    }
}

/// Run-level accumulation of the diagnostic output, owned by one run.
#[derive(Debug, Clone)]
pub struct RunAggregate {
    peak_positions: Vec<u32>,
    integral_over_peak_sum: f64,
    /// Traces with a nonzero peak, the only ones entering the mean ratio.
    ratio_samples: u64,
    observed: u64,
}

impl RunAggregate {
    pub fn new() -> Self {
        Self {
            peak_positions: vec![0; BUF],
            integral_over_peak_sum: 0.0,
            ratio_samples: 0,
            observed: 0,
        }
    }

    /// Reduces `trace` over its full length and records the result.
    pub fn observe(&mut self, trace: &Trace) -> TraceReduction {
        let reduction = reduce(trace.samples(), AnalysisWindow::full(trace.len()));
        self.record(&reduction);
        reduction
    }

    pub fn record(&mut self, reduction: &TraceReduction) {
        if let Some(count) = self.peak_positions.get_mut(reduction.peak_position) {
            *count += 1;
        }
        if reduction.peak != 0.0 {
            self.integral_over_peak_sum += reduction.integral / reduction.peak;
            self.ratio_samples += 1;
        }
        self.observed += 1;
    }

    pub fn observed(&self) -> u64 {
        self.observed
    }

    pub fn count_at(&self, position: usize) -> u32 {
        self.peak_positions.get(position).copied().unwrap_or(0)
    }

    pub fn mean_integral_over_peak(&self) -> Option<f64> {
        if self.ratio_samples == 0 {
            None
        } else {
            Some(self.integral_over_peak_sum / self.ratio_samples as f64)
        }
    }

    /// The three most frequent peak positions. Positions are scanned in
    /// ascending order and only a strictly larger count displaces an entry.
    pub fn most_frequent_positions(&self) -> [PeakPosition; 3] {
        let mut top = [PeakPosition::default(); 3];
        for (position, &count) in self.peak_positions.iter().enumerate() {
            let entry = PeakPosition { position, count };
            if count > top[0].count {
                top[2] = top[1];
                top[1] = top[0];
                top[0] = entry;
            } else if count > top[1].count {
                top[2] = top[1];
                top[1] = entry;
            } else if count > top[2].count {
                top[2] = entry;
            }
        }
        top
    }

    pub fn report(&self) -> DiagnosticReport {
        DiagnosticReport {
            traces: self.observed,
            mean_integral_over_peak: self.mean_integral_over_peak(),
            most_frequent: self.most_frequent_positions(),
        }
    }
}

impl Default for RunAggregate {
    fn default() -> Self {
        Self::new()
    }
}
