//! The acquisition controller: arms the trigger, waits for it with a
//! timeout and routes each captured trace to the configured output.

use std::fmt;
use std::io::{self, Write};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::acquisition_config::{AcquisitionConfig, ConfigError, OutputFormat, StopCondition};
use crate::calibration::{CalibrationReport, Calibrator};
use crate::output_sink::{write_count_file, OutputSink};
use crate::registers::{Channel, Register, RegisterInterface, OSC_RESET_BIT, TRIGGER_ARM_BIT};
use crate::ring_buffer::RingIndex;
use crate::signal_analyzer::{DiagnosticReport, RunAggregate, SignalAnalyzer};
use crate::trace::TraceExtractor;

#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to write output: {0}")]
    Io(#[from] io::Error),
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ConditionReached,
    /// The trigger did not fire within the poll timeout. The whole run was
    /// aborted after `waited`.
    TriggerTimeout { waited: Duration },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub traces: u64,
    pub elapsed: Duration,
    /// Traces dropped by the rejection policy. Only the integral format
    /// rejects.
    pub discarded: Option<u64>,
    pub stop_reason: StopReason,
    pub diagnostic: Option<DiagnosticReport>,
}

impl RunSummary {
    pub fn traces_per_second(&self) -> f64 {
        per_second(self.traces, self.elapsed)
    }

    pub fn timed_out(&self) -> bool {
        matches!(self.stop_reason, StopReason::TriggerTimeout { .. })
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Sampled {} traces in {}ms ({:.1} traces/s).",
            self.traces,
            self.elapsed.as_millis(),
            self.traces_per_second()
        )?;
        if let Some(discarded) = self.discarded {
            write!(
                f,
                "\nDiscarded {discarded} traces because of rejection conditions"
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountSummary {
    pub counts: u64,
    pub elapsed: Duration,
    pub stop_reason: StopReason,
}

impl CountSummary {
    pub fn counts_per_second(&self) -> f64 {
        per_second(self.counts, self.elapsed)
    }
}

impl fmt::Display for CountSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Got {} counts in {}ms ({:.1} counts/s).",
            self.counts,
            self.elapsed.as_millis(),
            self.counts_per_second()
        )
    }
}

fn per_second(events: u64, elapsed: Duration) -> f64 {
    let seconds = elapsed.as_secs_f64();
    if seconds > 0.0 {
        events as f64 / seconds
    } else {
        0.0
    }
}

enum TriggerWait {
    Fired,
    TimedOut(Duration),
}

/// Drives the oscilloscope through repeated arm/poll/extract cycles.
///
/// The scope owns its register interface for as long as it lives; a run has
/// exclusive use of the hardware.
pub struct PitayaScope<R: RegisterInterface> {
    registers: R,
    config: AcquisitionConfig,
}

impl<R: RegisterInterface> PitayaScope<R> {
    pub fn new(registers: R, config: AcquisitionConfig) -> Self {
        log::debug!("Oscilloscope settings:\n{config}");
        Self { registers, config }
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    pub fn registers(&self) -> &R {
        &self.registers
    }

    pub fn registers_mut(&mut self) -> &mut R {
        &mut self.registers
    }

    pub fn into_registers(self) -> R {
        self.registers
    }

    /// Captures traces until `stop` is reached or the trigger times out,
    /// handing each one to `sink` according to the configured output format.
    ///
    /// The sink header is written before the first trace. Finishing the sink
    /// is left to the caller.
    #[tracing::instrument(skip_all, fields(format = ?self.config.output_format()))]
    pub fn run_measurement<W: Write>(
        &mut self,
        stop: StopCondition,
        sink: &mut OutputSink<W>,
    ) -> Result<RunSummary, AcquisitionError> {
        let format = self.config.output_format();
        log::info!("{}", format.description());

        self.prepare_measurement();
        sink.write_header(&self.config)?;

        let extractor = TraceExtractor::from_config(&self.config);
        let analyzer = SignalAnalyzer::from_config(&self.config);
        let channel = self.config.measure_channel();
        let mut aggregate = RunAggregate::new();
        let mut traces = 0;
        let mut discarded = 0;

        log::debug!("Start main loop");
        let started = Instant::now();
        let stop_reason = loop {
            self.arm();
            if let TriggerWait::TimedOut(waited) = self.wait_for_trigger() {
                break Self::trigger_timeout(waited);
            }
            log::trace!("Event triggered");

            #[cfg(feature = "cpu-profiling")]
            let _span = tracy_client::span!("PitayaScope::process_trace");

            let trigger_pointer = self.trigger_pointer();
            let trace = extractor.extract(&self.registers.channel(channel), trigger_pointer);
            match format {
                OutputFormat::BinarySingle | OutputFormat::AsciiSingle => {
                    sink.write_trace(&trace)?;
                }
                OutputFormat::AsciiIntegral => {
                    let outcome = analyzer.analyze(&trace);
                    if outcome.accepted {
                        sink.write_integral(outcome.reduction.integral)?;
                    } else {
                        discarded += 1;
                    }
                }
                OutputFormat::JustCheck => {
                    aggregate.observe(&trace);
                }
            }

            traces += 1;
            if stop.is_reached(started.elapsed(), traces) {
                break StopReason::ConditionReached;
            }
        };

        let summary = RunSummary {
            traces,
            elapsed: started.elapsed(),
            discarded: (format == OutputFormat::AsciiIntegral).then_some(discarded),
            stop_reason,
            diagnostic: (format == OutputFormat::JustCheck).then(|| aggregate.report()),
        };
        log::info!("{summary}");
        Ok(summary)
    }

    /// Runs a measurement into `<stem>.bin` or `<stem>.txt`, or into no file
    /// at all for the just-check format.
    pub fn measure_to_files(
        &mut self,
        stop: StopCondition,
        stem: &Path,
    ) -> Result<RunSummary, AcquisitionError> {
        let mut sink = OutputSink::create(self.config.output_format(), stem)?;
        let summary = self.run_measurement(stop, &mut sink)?;
        sink.finish()?;
        Ok(summary)
    }

    /// Counts trigger events without reading any samples.
    #[tracing::instrument(skip_all)]
    pub fn run_counter(&mut self, stop: StopCondition) -> Result<CountSummary, AcquisitionError> {
        log::info!("Counting trigger events");
        self.registers
            .write_register(Register::PostTriggerTraceLength, 0);
        self.registers
            .set_register_bits(Register::Configuration, OSC_RESET_BIT);
        self.write_threshold();

        let mut counts = 0;
        let started = Instant::now();
        let stop_reason = loop {
            self.arm();
            if let TriggerWait::TimedOut(waited) = self.wait_for_trigger() {
                break Self::trigger_timeout(waited);
            }
            counts += 1;
            if stop.is_reached(started.elapsed(), counts) {
                break StopReason::ConditionReached;
            }
        };

        let summary = CountSummary {
            counts,
            elapsed: started.elapsed(),
            stop_reason,
        };
        log::info!("{summary}");
        Ok(summary)
    }

    /// Counts trigger events and writes the total to `path`.
    pub fn count_to_file(
        &mut self,
        stop: StopCondition,
        path: &Path,
    ) -> Result<CountSummary, AcquisitionError> {
        let summary = self.run_counter(stop)?;
        write_count_file(path, summary.counts)?;
        Ok(summary)
    }

    pub fn measure_calibration(&mut self, channel: Channel) -> i32 {
        Calibrator::new().measure(&mut self.registers, channel)
    }

    pub fn calibrate_both(&mut self) -> CalibrationReport {
        Calibrator::new().measure_both(&mut self.registers)
    }

    fn prepare_measurement(&mut self) {
        self.registers.write_register(
            Register::PostTriggerTraceLength,
            self.config.trace_length() as u32,
        );
        log::debug!("Set tracelength to {}", self.config.trace_length());

        self.registers
            .write_register(Register::Decimation, self.config.decimation().factor());
        log::debug!("Set decimation to {}", self.config.decimation().factor());

        self.registers
            .set_register_bits(Register::Configuration, OSC_RESET_BIT);
        self.write_threshold();
    }

    fn write_threshold(&mut self) {
        if let Some(channel) = self.config.trigger_mode().threshold_channel() {
            let code = self.config.trigger_threshold().code();
            self.registers
                .write_register(channel.threshold_register(), code);
            log::debug!("Set trigger value {code} on channel {}", channel.as_str());
        }
    }

    fn arm(&mut self) {
        self.registers
            .set_register_bits(Register::Configuration, TRIGGER_ARM_BIT);
        self.registers.write_register(
            Register::Trigger,
            self.config.trigger_mode().register_value(),
        );
    }

    fn wait_for_trigger(&mut self) -> TriggerWait {
        let poll = self.config.poll();
        let armed_at = Instant::now();
        while self.registers.read_register(Register::Trigger) != 0 {
            let waited = armed_at.elapsed();
            if waited > poll.timeout {
                return TriggerWait::TimedOut(waited);
            }
            if !poll.interval.is_zero() {
                thread::sleep(poll.interval);
            }
        }
        TriggerWait::Fired
    }

    fn trigger_pointer(&mut self) -> RingIndex {
        RingIndex::from_register(self.registers.read_register(Register::TriggerPointer))
    }

    fn trigger_timeout(waited: Duration) -> StopReason {
        log::error!(
            "Did not trigger for more than {:.1} s, stopping. This could be due to wrong trigger settings.",
            waited.as_secs_f64()
        );
        StopReason::TriggerTimeout { waited }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition_config::{PollSettings, RejectionParameters};
    use crate::output_sink::COUNT_FILE_NAME;
    use crate::ring_buffer::encode;
    use crate::simulated_scope::SimulatedEvent;
    use crate::simulated_scope::SimulatedScope;
    use crate::trigger_config::{EdgeTriggerBuilder, ExternalPort, TriggerMode};

    const SHORT_TIMEOUT: Duration = Duration::from_millis(20);

    fn edge_config(channel: Channel, format: OutputFormat) -> AcquisitionConfig {
        AcquisitionConfig::builder()
            .trace_length(40)
            .pretrigger_length(5)
            .decimation(64)
            .trigger_mode(EdgeTriggerBuilder::on(channel).rising_edge())
            .trigger_value(-100)
            .output_format(format)
            .trigger_timeout(SHORT_TIMEOUT)
            .build()
            .unwrap()
    }

    /// A 40-sample trace starting 5 samples before `pointer`: baseline 100,
    /// one spike at trace index 10.
    fn spike_event(pointer: usize, channel: Channel, spike: i32) -> SimulatedEvent {
        let mut raw = vec![encode(100); 40];
        raw[10] = encode(spike);
        SimulatedEvent::at(pointer).with_samples(channel, -5, raw)
    }

    fn ascii_lines(bytes: Vec<u8>) -> Vec<String> {
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_measurement_programs_registers_in_order() {
        let config = edge_config(Channel::A, OutputFormat::AsciiSingle);
        let scope = SimulatedScope::with_events([spike_event(300, Channel::A, 2000)]);
        let mut pitaya = PitayaScope::new(scope, config);
        let mut sink = OutputSink::new(OutputFormat::AsciiSingle, Vec::<u8>::new());
        pitaya
            .run_measurement(StopCondition::TraceCount(1), &mut sink)
            .unwrap();

        let log = pitaya.registers().write_log().to_vec();
        assert_eq!(
            log,
            vec![
                (Register::PostTriggerTraceLength, 40),
                (Register::Decimation, 64),
                (Register::Configuration, OSC_RESET_BIT),
                (Register::ThresholdA, 16284),
                (Register::Configuration, TRIGGER_ARM_BIT),
                (Register::Trigger, 2),
            ]
        );
    }

    #[test]
    fn test_immediate_trigger_writes_no_threshold() {
        let config = AcquisitionConfig::builder()
            .trace_length(16)
            .output_format(OutputFormat::BinarySingle)
            .build()
            .unwrap();
        let mut pitaya = PitayaScope::new(SimulatedScope::new(), config);
        let mut sink = OutputSink::new(OutputFormat::BinarySingle, Vec::<u8>::new());
        let summary = pitaya
            .run_measurement(StopCondition::TraceCount(3), &mut sink)
            .unwrap();

        assert_eq!(summary.traces, 3);
        assert_eq!(summary.stop_reason, StopReason::ConditionReached);
        assert!(summary.discarded.is_none());
        let scope = pitaya.registers();
        assert!(scope.writes_to(Register::ThresholdA).is_empty());
        assert!(scope.writes_to(Register::ThresholdB).is_empty());
        assert_eq!(scope.writes_to(Register::Trigger), vec![1, 1, 1]);

        let bytes = sink.finish().unwrap().unwrap();
        assert_eq!(bytes.len(), 5 * 4 + 3 * 16 * 4);
    }

    #[test]
    fn test_ascii_single_writes_one_line_per_trace() {
        let config = edge_config(Channel::A, OutputFormat::AsciiSingle);
        let scope = SimulatedScope::with_events([
            spike_event(3, Channel::A, 2000),
            spike_event(9000, Channel::A, -500),
        ]);
        let mut pitaya = PitayaScope::new(scope, config);
        let mut sink = OutputSink::new(OutputFormat::AsciiSingle, Vec::<u8>::new());
        pitaya
            .run_measurement(StopCondition::TraceCount(2), &mut sink)
            .unwrap();

        let lines = ascii_lines(sink.finish().unwrap().unwrap());
        assert_eq!(lines.len(), 6 + 2);
        let first: Vec<i32> = lines[6]
            .split(' ')
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(first.len(), 40);
        assert_eq!(first[10], 2000);
        assert_eq!(first[9], 100);
        let second: Vec<i32> = lines[7]
            .split(' ')
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(second[10], -500);
    }

    #[test]
    fn test_trigger_timeout_aborts_run_with_partial_output() {
        let config = edge_config(Channel::A, OutputFormat::AsciiSingle);
        let scope = SimulatedScope::with_events([
            spike_event(100, Channel::A, 2000),
            spike_event(5000, Channel::A, 2000),
            spike_event(9000, Channel::A, 2000),
        ]);
        let mut pitaya = PitayaScope::new(scope, config);
        let mut sink = OutputSink::new(OutputFormat::AsciiSingle, Vec::<u8>::new());
        let summary = pitaya
            .run_measurement(StopCondition::TraceCount(10), &mut sink)
            .unwrap();

        assert_eq!(summary.traces, 3);
        assert!(summary.timed_out());
        if let StopReason::TriggerTimeout { waited } = summary.stop_reason {
            assert!(waited > SHORT_TIMEOUT);
        }
        assert_eq!(pitaya.registers().arm_count(), 4);

        let lines = ascii_lines(sink.finish().unwrap().unwrap());
        assert_eq!(lines.len(), 6 + 3);
    }

    #[test]
    fn test_elapsed_stop_condition() {
        let config = AcquisitionConfig::builder()
            .trace_length(8)
            .output_format(OutputFormat::JustCheck)
            .build()
            .unwrap();
        let mut pitaya = PitayaScope::new(SimulatedScope::new(), config);
        let mut sink = OutputSink::just_check();
        let summary = pitaya
            .run_measurement(StopCondition::Elapsed(Duration::from_millis(30)), &mut sink)
            .unwrap();

        assert_eq!(summary.stop_reason, StopReason::ConditionReached);
        assert!(summary.elapsed >= Duration::from_millis(30));
        assert!(summary.traces > 0);
    }

    #[test]
    fn test_integral_format_counts_discards() {
        let config = AcquisitionConfig::builder()
            .trace_length(40)
            .pretrigger_length(5)
            .trigger_mode(EdgeTriggerBuilder::on(Channel::A).rising_edge())
            .output_format(OutputFormat::AsciiIntegral)
            .rejection(RejectionParameters::new(0.5, 2.0, -1, 0))
            .trigger_timeout(SHORT_TIMEOUT)
            .build()
            .unwrap();
        // Plateau after the baseline region: integral 1500 against a peak of
        // 100, above 2.0 * peak.
        let mut plateau = vec![encode(100); 40];
        plateau[25..].fill(encode(200));
        let rejected = SimulatedEvent::at(2000).with_samples(Channel::A, -5, plateau);
        // Spike inside the baseline region: baseline 108, peak 192,
        // integral -120.
        let accepted = spike_event(4000, Channel::A, 300);
        let scope = SimulatedScope::with_events([rejected, accepted]);

        let mut pitaya = PitayaScope::new(scope, config);
        let mut sink = OutputSink::new(OutputFormat::AsciiIntegral, Vec::<u8>::new());
        let summary = pitaya
            .run_measurement(StopCondition::TraceCount(2), &mut sink)
            .unwrap();

        assert_eq!(summary.traces, 2);
        assert_eq!(summary.discarded, Some(1));
        let lines = ascii_lines(sink.finish().unwrap().unwrap());
        assert_eq!(lines.len(), 10 + 1);
        assert_eq!(lines[10], "-120.000000");
    }

    #[test]
    fn test_just_check_reports_peak_positions() {
        let config = edge_config(Channel::A, OutputFormat::JustCheck);
        let scope = SimulatedScope::with_events([
            spike_event(10, Channel::A, 3000),
            spike_event(7000, Channel::A, 3000),
        ]);
        let mut pitaya = PitayaScope::new(scope, config);
        let mut sink = OutputSink::just_check();
        let summary = pitaya
            .run_measurement(StopCondition::TraceCount(2), &mut sink)
            .unwrap();

        let report = summary.diagnostic.unwrap();
        assert_eq!(report.traces, 2);
        assert_eq!(report.most_frequent[0].position, 10);
        assert_eq!(report.most_frequent[0].count, 2);
        assert!(sink.finish().unwrap().is_none());
    }

    #[test]
    fn test_channel_b_edge_reads_channel_b_buffer() {
        let config = edge_config(Channel::B, OutputFormat::AsciiSingle);
        let event = spike_event(600, Channel::B, 1234)
            .with_samples(Channel::A, -5, vec![encode(-1); 40]);
        let mut pitaya = PitayaScope::new(SimulatedScope::with_events([event]), config);
        let mut sink = OutputSink::new(OutputFormat::AsciiSingle, Vec::<u8>::new());
        pitaya
            .run_measurement(StopCondition::TraceCount(1), &mut sink)
            .unwrap();

        assert_eq!(
            pitaya.registers().writes_to(Register::ThresholdB),
            vec![16284]
        );
        let lines = ascii_lines(sink.finish().unwrap().unwrap());
        let samples: Vec<i32> = lines[6]
            .split(' ')
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(samples[10], 1234);
        assert_eq!(samples[0], 100);
    }

    #[test]
    fn test_counter_counts_and_writes_file() {
        let config = AcquisitionConfig::builder()
            .trigger_mode(TriggerMode::Immediate)
            .build()
            .unwrap();
        let mut pitaya = PitayaScope::new(SimulatedScope::new(), config);
        let path = std::env::temp_dir().join(format!("pitaya-count-{}.txt", std::process::id()));
        let summary = pitaya
            .count_to_file(StopCondition::TraceCount(25), &path)
            .unwrap();

        assert_eq!(summary.counts, 25);
        assert_eq!(summary.stop_reason, StopReason::ConditionReached);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "25");
        std::fs::remove_file(&path).unwrap();

        let scope = pitaya.registers();
        assert_eq!(scope.writes_to(Register::PostTriggerTraceLength), vec![0]);
        assert!(scope.writes_to(Register::Decimation).is_empty());
    }

    #[test]
    fn test_counter_for_elapsed_time() {
        let config = AcquisitionConfig::default();
        let mut pitaya = PitayaScope::new(SimulatedScope::new(), config);
        let summary = pitaya
            .run_counter(StopCondition::Elapsed(Duration::from_millis(25)))
            .unwrap();
        assert!(summary.counts > 0);
        assert!(summary.elapsed >= Duration::from_millis(25));
    }

    #[test]
    fn test_counter_for_elapsed_time_writes_only_count_file() {
        let dir = std::env::temp_dir().join(format!("pitaya-counter-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut pitaya = PitayaScope::new(SimulatedScope::new(), AcquisitionConfig::default());
        let summary = pitaya
            .count_to_file(
                StopCondition::Elapsed(Duration::from_millis(20)),
                &dir.join(COUNT_FILE_NAME),
            )
            .unwrap();

        assert_eq!(summary.stop_reason, StopReason::ConditionReached);
        assert!(summary.counts > 0);
        let entries: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec![COUNT_FILE_NAME.to_owned()]);
        assert_eq!(
            std::fs::read_to_string(dir.join(COUNT_FILE_NAME)).unwrap(),
            summary.counts.to_string()
        );
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_external_trigger_measures_channel_a_without_threshold() {
        let config = AcquisitionConfig::builder()
            .trace_length(40)
            .pretrigger_length(5)
            .trigger_mode(TriggerMode::External(ExternalPort::Port1))
            .trigger_value(300)
            .trigger_timeout(SHORT_TIMEOUT)
            .build()
            .unwrap();
        let scope = SimulatedScope::with_events([
            spike_event(50, Channel::A, 700),
            spike_event(800, Channel::A, 700),
        ]);
        let mut pitaya = PitayaScope::new(scope, config);
        let mut sink = OutputSink::new(OutputFormat::AsciiSingle, Vec::<u8>::new());
        let summary = pitaya
            .run_measurement(StopCondition::TraceCount(5), &mut sink)
            .unwrap();

        assert_eq!(summary.traces, 2);
        assert!(summary.timed_out());
        let scope = pitaya.registers();
        assert_eq!(scope.writes_to(Register::Trigger), vec![7, 7, 7]);
        assert!(scope.writes_to(Register::ThresholdA).is_empty());
        assert!(scope.writes_to(Register::ThresholdB).is_empty());

        let lines = ascii_lines(sink.finish().unwrap().unwrap());
        assert_eq!(lines.len(), 6 + 2);
        assert!(lines[6].split(' ').nth(10) == Some("700"));
    }

    #[test]
    fn test_counter_stops_on_trigger_timeout() {
        let config = AcquisitionConfig::builder()
            .trigger_mode(EdgeTriggerBuilder::on(Channel::A).falling_edge())
            .trigger_value(50)
            .poll(PollSettings {
                timeout: SHORT_TIMEOUT,
                interval: Duration::from_millis(1),
            })
            .build()
            .unwrap();
        let scope = SimulatedScope::with_events([SimulatedEvent::at(1), SimulatedEvent::at(2)]);
        let mut pitaya = PitayaScope::new(scope, config);
        let summary = pitaya.run_counter(StopCondition::TraceCount(100)).unwrap();

        assert_eq!(summary.counts, 2);
        assert!(matches!(
            summary.stop_reason,
            StopReason::TriggerTimeout { .. }
        ));
        assert_eq!(pitaya.registers().writes_to(Register::ThresholdA), vec![50]);
    }

    #[test]
    fn test_summary_display() {
        let summary = RunSummary {
            traces: 50,
            elapsed: Duration::from_millis(500),
            discarded: Some(4),
            stop_reason: StopReason::ConditionReached,
            diagnostic: None,
        };
        assert_eq!(
            summary.to_string(),
            "Sampled 50 traces in 500ms (100.0 traces/s).\nDiscarded 4 traces because of rejection conditions"
        );
        let counts = CountSummary {
            counts: 10,
            elapsed: Duration::ZERO,
            stop_reason: StopReason::ConditionReached,
        };
        assert_eq!(counts.to_string(), "Got 10 counts in 0ms (0.0 counts/s).");
    }
}
