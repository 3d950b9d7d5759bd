//! Validated settings of an acquisition run and the builder that checks
//! them before any register is touched.

use std::fmt;
use std::time::Duration;

use crate::registers::Channel;
use crate::ring_buffer::BUF;
use crate::trigger_config::{TriggerMode, TriggerThreshold};

/// Longest trace the hardware can capture after a trigger.
pub const MAX_TRACE_LENGTH: i32 = BUF as i32 - 1;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid decimation {0}. Possible values are 1, 8, 64, 1024, 8192, 65536")]
    InvalidDecimation(u32),

    #[error("Invalid trace length {0}. Traces must be at least 1 value long, and have a maximal length of 16383")]
    TraceLengthOutOfRange(i32),

    #[error("Invalid pretrigger length {pretrigger}. Must be between 0 and the trace length ({trace_length})")]
    PretriggerLengthOutOfRange { pretrigger: i32, trace_length: i32 },

    #[error("Not a valid triggering method: {0} (expected 1 to 7)")]
    InvalidTriggerSelector(i32),

    #[error("Not a valid output method: {0} (expected 0 to 5)")]
    InvalidOutputSelector(i32),

    #[error("Output method {0} has no implementation")]
    UnsupportedOutputFormat(i32),

    #[error("{0} is not allowed as trigger value (-8192 to 8191)")]
    TriggerValueOutOfRange(i32),

    #[error("Trigger voltage {0} V out of range. Trigger voltage should be between -5.0 V and 5.0 V")]
    TriggerVoltageOutOfRange(f32),

    #[error("Invalid peak search window {start}..{end}")]
    InvalidRejectionWindow { start: i32, end: i32 },

    #[error("Invalid measurement length {0} s")]
    InvalidLength(f64),

    #[error("Invalid trigger timeout {0} s")]
    InvalidTimeout(f64),
}

fn duration_from_secs(secs: f64) -> Option<Duration> {
    Duration::try_from_secs_f64(secs.max(0.0)).ok()
}

/// Hardware sample-rate divisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimation(u32);

impl Decimation {
    pub const ALLOWED: [u32; 6] = [1, 8, 64, 1024, 8192, 65536];

    pub fn new(factor: u32) -> Result<Self, ConfigError> {
        if Self::ALLOWED.contains(&factor) {
            Ok(Self(factor))
        } else {
            Err(ConfigError::InvalidDecimation(factor))
        }
    }

    pub fn factor(&self) -> u32 {
        self.0
    }
}

impl Default for Decimation {
    fn default() -> Self {
        Self(1)
    }
}

/// How accepted traces are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    AsciiSingle,
    BinarySingle,
    AsciiIntegral,
    JustCheck,
}

impl OutputFormat {
    /// Maps the numeric selector of the command surface. Selectors 2 and 3
    /// (binary trace / binary multi) exist in the numbering but were never
    /// implemented.
    pub fn from_selector(selector: i32) -> Result<Self, ConfigError> {
        match selector {
            0 => Ok(OutputFormat::AsciiSingle),
            1 => Ok(OutputFormat::BinarySingle),
            2 | 3 => Err(ConfigError::UnsupportedOutputFormat(selector)),
            4 => Ok(OutputFormat::AsciiIntegral),
            5 => Ok(OutputFormat::JustCheck),
            other => Err(ConfigError::InvalidOutputSelector(other)),
        }
    }

    pub fn selector(&self) -> i32 {
        match self {
            OutputFormat::AsciiSingle => 0,
            OutputFormat::BinarySingle => 1,
            OutputFormat::AsciiIntegral => 4,
            OutputFormat::JustCheck => 5,
        }
    }

    /// File extension of the output file, `None` when nothing is written.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            OutputFormat::AsciiSingle | OutputFormat::AsciiIntegral => Some("txt"),
            OutputFormat::BinarySingle => Some("bin"),
            OutputFormat::JustCheck => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OutputFormat::AsciiSingle => "store in ascii file, write every data point separately",
            OutputFormat::BinarySingle => "store in binary file, write every data point separately",
            OutputFormat::AsciiIntegral => "store in ascii file, write integral over peak, baseline subtracted, simple double peak rejection",
            OutputFormat::JustCheck => "no storage, just calculation of values useful for adjusting settings",
        }
    }
}

/// Bounds of the integral/peak rejection policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RejectionParameters {
    pub ratio_min: f32,
    pub ratio_max: f32,
    /// First sample of the peak search window, `-1` to search from the
    /// pretrigger length to the end of the trace.
    pub channel_start: i32,
    pub channel_end: i32,
    /// Peaks at or below this height only need to satisfy the upper bound.
    pub curve_bend: f32,
}

impl RejectionParameters {
    pub const WINDOW_DISABLED: i32 = -1;

    pub fn new(ratio_min: f32, ratio_max: f32, channel_start: i32, channel_end: i32) -> Self {
        Self {
            ratio_min,
            ratio_max,
            channel_start,
            channel_end,
            curve_bend: 0.0,
        }
    }

    pub fn with_curve_bend(mut self, curve_bend: f32) -> Self {
        self.curve_bend = curve_bend;
        self
    }

    pub fn window_enabled(&self) -> bool {
        self.channel_start != Self::WINDOW_DISABLED
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.window_enabled() && (self.channel_start < 0 || self.channel_end < self.channel_start)
        {
            return Err(ConfigError::InvalidRejectionWindow {
                start: self.channel_start,
                end: self.channel_end,
            });
        }
        Ok(())
    }
}

impl Default for RejectionParameters {
    fn default() -> Self {
        Self::new(0.0, 1e6, 0, 8192)
    }
}

/// How long to wait for a trigger and how often to look.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    pub timeout: Duration,
    /// Sleep between two reads of the trigger register. Zero busy-waits.
    pub interval: Duration,
}

impl PollSettings {
    /// Converts a timeout given in seconds. Negative values mean no wait.
    pub fn timeout_from_secs(secs: f64) -> Result<Duration, ConfigError> {
        duration_from_secs(secs).ok_or(ConfigError::InvalidTimeout(secs))
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            interval: Duration::ZERO,
        }
    }
}

/// When a measurement or counting run ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StopCondition {
    Elapsed(Duration),
    TraceCount(u64),
}

impl StopCondition {
    /// Interprets the single length argument of the command surface, either
    /// as seconds or, with `count_traces`, as a number of traces.
    pub fn from_length(length: f64, count_traces: bool) -> Result<Self, ConfigError> {
        if count_traces {
            Ok(StopCondition::TraceCount(length.max(0.0) as u64))
        } else {
            duration_from_secs(length)
                .map(StopCondition::Elapsed)
                .ok_or(ConfigError::InvalidLength(length))
        }
    }

    pub fn is_reached(&self, elapsed: Duration, completed: u64) -> bool {
        match self {
            StopCondition::Elapsed(limit) => elapsed >= *limit,
            StopCondition::TraceCount(limit) => completed >= *limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ThresholdSetting {
    Value(i32),
    Voltage(f32),
}

/// Validated settings of one acquisition run.
#[derive(Debug, Clone, PartialEq)]
pub struct AcquisitionConfig {
    decimation: Decimation,
    trace_length: usize,
    pretrigger_length: usize,
    trigger_mode: TriggerMode,
    trigger_threshold: TriggerThreshold,
    trigger_voltage: f32,
    output_format: OutputFormat,
    rejection: RejectionParameters,
    poll: PollSettings,
}

impl AcquisitionConfig {
    pub fn builder() -> AcquisitionConfigBuilder {
        AcquisitionConfigBuilder::default()
    }

    pub fn decimation(&self) -> Decimation {
        self.decimation
    }

    pub fn trace_length(&self) -> usize {
        self.trace_length
    }

    pub fn pretrigger_length(&self) -> usize {
        self.pretrigger_length
    }

    pub fn trigger_mode(&self) -> TriggerMode {
        self.trigger_mode
    }

    pub fn trigger_threshold(&self) -> TriggerThreshold {
        self.trigger_threshold
    }

    pub fn trigger_voltage(&self) -> f32 {
        self.trigger_voltage
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn rejection(&self) -> &RejectionParameters {
        &self.rejection
    }

    pub fn poll(&self) -> PollSettings {
        self.poll
    }

    /// Channel the traces are read from: the edge-trigger channel, channel A
    /// otherwise.
    pub fn measure_channel(&self) -> Channel {
        self.trigger_mode.threshold_channel().unwrap_or(Channel::A)
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            decimation: Decimation::default(),
            trace_length: 256,
            pretrigger_length: 0,
            trigger_mode: TriggerMode::Immediate,
            trigger_threshold: TriggerThreshold::default(),
            trigger_voltage: 0.0,
            output_format: OutputFormat::default(),
            rejection: RejectionParameters::default(),
            poll: PollSettings::default(),
        }
    }
}

impl fmt::Display for AcquisitionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "*** Sampling Settings")?;
        writeln!(f, "Decimation:               {}", self.decimation.factor())?;
        writeln!(f, "Trace length:             {}", self.trace_length)?;
        writeln!(f, "Pretrigger length:        {}", self.pretrigger_length)?;
        writeln!(f, "Trigger Value:            {}", self.trigger_threshold.code())?;
        writeln!(f, "Triggering on:            {}", self.trigger_mode)?;
        if self.output_format == OutputFormat::AsciiIntegral {
            writeln!(f, "Rejection Parameter <min> {}", self.rejection.ratio_min)?;
            writeln!(f, "Rejection Parameter <max> {}", self.rejection.ratio_max)?;
            writeln!(f, "Rejection Parameter <s>   {}", self.rejection.channel_start)?;
            writeln!(f, "Rejection Parameter <e>   {}", self.rejection.channel_end)?;
            writeln!(f, "Rejection Parameter <b>   {}", self.rejection.curve_bend)?;
        }
        Ok(())
    }
}

/// Collects settings in any order; [`build`](Self::build) validates them.
#[derive(Debug, Clone)]
pub struct AcquisitionConfigBuilder {
    decimation: u32,
    trace_length: i32,
    pretrigger_length: i32,
    trigger_mode: TriggerMode,
    threshold: ThresholdSetting,
    output_format: OutputFormat,
    rejection: RejectionParameters,
    poll: PollSettings,
}

impl Default for AcquisitionConfigBuilder {
    fn default() -> Self {
        Self {
            decimation: 1,
            trace_length: 256,
            pretrigger_length: 0,
            trigger_mode: TriggerMode::Immediate,
            threshold: ThresholdSetting::Value(0),
            output_format: OutputFormat::default(),
            rejection: RejectionParameters::default(),
            poll: PollSettings::default(),
        }
    }
}

impl AcquisitionConfigBuilder {
    pub fn decimation(mut self, factor: u32) -> Self {
        self.decimation = factor;
        self
    }

    pub fn trace_length(mut self, samples: i32) -> Self {
        self.trace_length = samples;
        self
    }

    pub fn pretrigger_length(mut self, samples: i32) -> Self {
        self.pretrigger_length = samples;
        self
    }

    pub fn trigger_mode(mut self, mode: TriggerMode) -> Self {
        self.trigger_mode = mode;
        self
    }

    /// Signed trigger level, -8192..=8191.
    pub fn trigger_value(mut self, value: i32) -> Self {
        self.threshold = ThresholdSetting::Value(value);
        self
    }

    /// Trigger level in volts; only meaningful for edge triggers.
    pub fn trigger_voltage(mut self, volts: f32) -> Self {
        self.threshold = ThresholdSetting::Voltage(volts);
        self
    }

    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn rejection(mut self, rejection: RejectionParameters) -> Self {
        self.rejection = rejection;
        self
    }

    pub fn poll(mut self, poll: PollSettings) -> Self {
        self.poll = poll;
        self
    }

    pub fn trigger_timeout(mut self, timeout: Duration) -> Self {
        self.poll.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<AcquisitionConfig, ConfigError> {
        let decimation = Decimation::new(self.decimation)?;

        if self.trigger_mode == TriggerMode::NoAcquisition {
            return Err(ConfigError::InvalidTriggerSelector(
                self.trigger_mode.register_value() as i32,
            ));
        }

        if !(1..=MAX_TRACE_LENGTH).contains(&self.trace_length) {
            return Err(ConfigError::TraceLengthOutOfRange(self.trace_length));
        }
        if !(0..=self.trace_length).contains(&self.pretrigger_length) {
            return Err(ConfigError::PretriggerLengthOutOfRange {
                pretrigger: self.pretrigger_length,
                trace_length: self.trace_length,
            });
        }
        self.rejection.validate()?;

        let (trigger_threshold, trigger_voltage) = match self.threshold {
            ThresholdSetting::Value(value) => {
                let threshold = TriggerThreshold::from_signed(value)?;
                (threshold, threshold.voltage())
            }
            ThresholdSetting::Voltage(volts) if self.trigger_mode.is_edge() => {
                let threshold = TriggerThreshold::from_voltage(volts)?;
                log::debug!(
                    "Voltage {} V has been converted to trigger value {}",
                    volts,
                    threshold.signed()
                );
                (threshold, volts)
            }
            ThresholdSetting::Voltage(volts) => {
                log::warn!(
                    "Ignoring trigger voltage {} V, triggering on {} does not care about voltage",
                    volts,
                    self.trigger_mode
                );
                (TriggerThreshold::default(), 0.0)
            }
        };

        Ok(AcquisitionConfig {
            decimation,
            trace_length: self.trace_length as usize,
            pretrigger_length: self.pretrigger_length as usize,
            trigger_mode: self.trigger_mode,
            trigger_threshold,
            trigger_voltage,
            output_format: self.output_format,
            rejection: self.rejection,
            poll: self.poll,
        })
    }
}
