//! # Pitaya Scope RS
//!
//! A Rust library for triggered trace acquisition on register-mapped
//! digitizers such as the Red Pitaya oscilloscope FPGA module.
//!
//! The library arms the hardware trigger, waits for it to fire with a bounded
//! timeout, slices traces out of the circular sample buffer around the trigger
//! pointer and reduces them to raw samples or baseline-corrected integrals.
//!
//! ## Features
//!
//! - **Trigger configuration**: Tagged trigger modes carrying their channel, edge builder, raw or voltage thresholds
//! - **Ring buffer extraction**: Wraparound arithmetic confined to one index type
//! - **Pulse integration**: Baseline, peak and integral with a two-branch rejection policy
//! - **Diagnostics**: Peak position histogram and mean integral/peak ratio for tuning settings
//! - **Calibration and counting**: DC offset averaging and a trigger counting mode
//! - **DataFrame output**: Uses `polars` to expose traces with automatic time indexing
//! - **Simulation**: A software scope so every mode runs without hardware
//!
//! ## Examples
//!
//! ### Measurement Against the Simulated Scope
//!
//! ```rust
//! use pitaya_scope_rs::{
//!     AcquisitionConfig, OutputFormat, OutputSink, PitayaScope, SimulatedScope, StopCondition,
//! };
//!
//! let config = AcquisitionConfig::builder()
//!     .trace_length(128)
//!     .pretrigger_length(16)
//!     .output_format(OutputFormat::AsciiSingle)
//!     .build()?;
//!
//! let mut scope = PitayaScope::new(SimulatedScope::new(), config);
//! let mut sink = OutputSink::new(OutputFormat::AsciiSingle, Vec::<u8>::new());
//! let summary = scope.run_measurement(StopCondition::TraceCount(10), &mut sink)?;
//! assert_eq!(summary.traces, 10);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Edge Trigger With a Voltage Threshold
//!
//! ```rust
//! use pitaya_scope_rs::{AcquisitionConfig, Channel, EdgeTriggerBuilder};
//!
//! let config = AcquisitionConfig::builder()
//!     .trigger_mode(EdgeTriggerBuilder::on(Channel::B).falling_edge())
//!     .trigger_voltage(-0.5)
//!     .build()?;
//!
//! println!("{config}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ### Integral Output on Hardware
//!
//! ```rust,no_run
//! # #[cfg(feature = "devmem")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use pitaya_scope_rs::{
//!     AcquisitionConfig, Channel, EdgeTriggerBuilder, OutputFormat, PitayaConnector, PitayaScope,
//!     RejectionParameters, StopCondition,
//! };
//! use std::path::Path;
//!
//! let config = AcquisitionConfig::builder()
//!     .trace_length(1000)
//!     .pretrigger_length(100)
//!     .trigger_mode(EdgeTriggerBuilder::on(Channel::A).rising_edge())
//!     .trigger_value(400)
//!     .output_format(OutputFormat::AsciiIntegral)
//!     .rejection(RejectionParameters::new(0.5, 20.0, -1, 0))
//!     .build()?;
//!
//! let mut scope = PitayaScope::new(PitayaConnector::connect()?, config);
//! let stop = StopCondition::from_length(60.0, false)?;
//! let summary = scope.measure_to_files(stop, Path::new("output"))?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "devmem"))]
//! # fn main() {}
//! ```

pub mod acquisition_config;
pub mod calibration;
pub mod output_sink;
#[cfg(feature = "devmem")]
pub mod pitaya_connector;
pub mod pitaya_scope;
pub mod registers;
pub mod ring_buffer;
pub mod signal_analyzer;
pub mod simulated_scope;
pub mod trace;
pub mod trigger_config;

// Re-export the main types for convenience
pub use acquisition_config::{
    AcquisitionConfig, AcquisitionConfigBuilder, ConfigError, Decimation, OutputFormat,
    PollSettings, RejectionParameters, StopCondition,
};

pub use calibration::{CalibrationReport, Calibrator};

pub use output_sink::{OutputSink, COUNT_FILE_NAME};

#[cfg(feature = "devmem")]
pub use pitaya_connector::{ConnectorError, MappedOscilloscope, PitayaConnector};

pub use pitaya_scope::{AcquisitionError, CountSummary, PitayaScope, RunSummary, StopReason};

pub use registers::{Channel, Register, RegisterInterface};

pub use ring_buffer::{decode, RingIndex, BUF};

pub use signal_analyzer::{DiagnosticReport, RunAggregate, SignalAnalyzer, TraceReduction};

pub use simulated_scope::{PulseShape, SimulatedEvent, SimulatedScope};

pub use trace::{Trace, TraceExtractor};

pub use trigger_config::{Edge, EdgeTriggerBuilder, ExternalPort, TriggerMode, TriggerThreshold};
