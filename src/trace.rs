//! Traces sliced out of a channel ring, and their polars view.

use polars::prelude::*;

use crate::acquisition_config::{AcquisitionConfig, Decimation};
use crate::ring_buffer::{decode, RingIndex, RingWindow, SampleSource};

/// ADC clock before decimation, in samples per second.
pub const BASE_SAMPLE_RATE: f64 = 125_000_000.0;

const TIME_COLUMN_NAME: &str = "time";
const RAW_COLUMN_NAME: &str = "raw";
const SAMPLE_COLUMN_NAME: &str = "sample";

/// One captured trace: the raw ring codes and their signed decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    raw: Vec<u32>,
    samples: Vec<i32>,
    pretrigger_length: usize,
}

impl Trace {
    pub fn from_raw(raw: Vec<u32>, pretrigger_length: usize) -> Self {
        let samples = raw.iter().map(|&code| decode(code)).collect();
        Self {
            raw,
            samples,
            pretrigger_length,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Raw ring-buffer codes, exactly as the hardware stored them.
    pub fn raw(&self) -> &[u32] {
        &self.raw
    }

    /// Signed samples after the two's-complement fold.
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn pretrigger_length(&self) -> usize {
        self.pretrigger_length
    }

    /// The trace as a table with a time column relative to the trigger.
    pub fn to_dataframe(&self, decimation: Decimation) -> Result<DataFrame, PolarsError> {
        self.to_lazyframe(decimation)?.collect()
    }

    pub fn to_lazyframe(&self, decimation: Decimation) -> Result<LazyFrame, PolarsError> {
        #[cfg(feature = "cpu-profiling")]
        let _span = tracy_client::span!("Trace::to_lazyframe");

        let sample_period = f64::from(decimation.factor()) / BASE_SAMPLE_RATE;
        let df = df!(
            RAW_COLUMN_NAME => self.raw.clone(),
            SAMPLE_COLUMN_NAME => self.samples.clone(),
        )?
        .lazy()
        .with_row_index("row_index", Some(0))
        .with_columns([((col("row_index").cast(DataType::Float64)
            - lit(self.pretrigger_length as f64))
            * lit(sample_period))
        .alias(TIME_COLUMN_NAME)])
        .select([
            col(TIME_COLUMN_NAME),
            col(RAW_COLUMN_NAME),
            col(SAMPLE_COLUMN_NAME),
        ]);

        Ok(df)
    }
}

/// Slices fixed-length traces out of a channel ring around the trigger
/// pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceExtractor {
    pretrigger_length: usize,
    trace_length: usize,
}

impl TraceExtractor {
    pub fn new(pretrigger_length: usize, trace_length: usize) -> Self {
        Self {
            pretrigger_length,
            trace_length,
        }
    }

    pub fn from_config(config: &AcquisitionConfig) -> Self {
        Self::new(config.pretrigger_length(), config.trace_length())
    }

    /// Ring position of the first sample of the trace.
    pub fn start_index(&self, trigger_pointer: RingIndex) -> RingIndex {
        trigger_pointer.offset(-(self.pretrigger_length as isize))
    }

    pub fn extract<S: SampleSource + ?Sized>(&self, ring: &S, trigger_pointer: RingIndex) -> Trace {
        let window = RingWindow::new(ring, trigger_pointer);
        let raw = window
            .iter_from(-(self.pretrigger_length as isize), self.trace_length)
            .collect();
        Trace::from_raw(raw, self.pretrigger_length)
    }
}
