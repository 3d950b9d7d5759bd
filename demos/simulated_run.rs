// Simulated acquisition walkthrough
//
// Exercises every output method against the simulated scope and shows a
// captured trace as a polars DataFrame.

use pitaya_scope_rs::{
    AcquisitionConfig, Channel, EdgeTriggerBuilder, OutputFormat, OutputSink, PitayaScope,
    PulseShape, RejectionParameters, SimulatedScope, StopCondition, TraceExtractor,
};
use pitaya_scope_rs::{RegisterInterface, RingIndex};
use polars::prelude::*;

fn pulse_scope() -> SimulatedScope {
    SimulatedScope::new().with_pulse_generator(PulseShape {
        channel: Channel::A,
        baseline: 15,
        amplitude: 2400,
        decay_samples: 30.0,
        lead_in: 32,
        length: 512,
    })
}

fn config(format: OutputFormat) -> Result<AcquisitionConfig, Box<dyn std::error::Error>> {
    Ok(AcquisitionConfig::builder()
        .decimation(8)
        .trace_length(512)
        .pretrigger_length(32)
        .trigger_mode(EdgeTriggerBuilder::on(Channel::A).rising_edge())
        .trigger_voltage(0.2)
        .output_format(format)
        .rejection(RejectionParameters::new(5.0, 60.0, -1, 0))
        .build()?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    #[cfg(feature = "cpu-profiling")]
    tracy_client::Client::start();

    println!("Simulated Acquisition Example");
    println!("=============================\n");

    // 1. Ascii traces into memory
    println!("1. Ascii traces");
    let mut scope = PitayaScope::new(pulse_scope(), config(OutputFormat::AsciiSingle)?);
    let mut sink = OutputSink::new(OutputFormat::AsciiSingle, Vec::new());
    let summary = scope.run_measurement(StopCondition::TraceCount(5), &mut sink)?;
    let text = String::from_utf8(sink.finish()?.unwrap_or_default())?;
    println!("   {summary}");
    println!("   {} lines written\n", text.lines().count());

    // 2. Integrals with rejection
    println!("2. Integrals");
    let mut scope = PitayaScope::new(pulse_scope(), config(OutputFormat::AsciiIntegral)?);
    let mut sink = OutputSink::new(OutputFormat::AsciiIntegral, Vec::new());
    let summary = scope.run_measurement(StopCondition::TraceCount(20), &mut sink)?;
    let text = String::from_utf8(sink.finish()?.unwrap_or_default())?;
    println!("   {summary}");
    if let Some(first) = text.lines().nth(10) {
        println!("   First integral: {first}\n");
    }

    // 3. Diagnostics for tuning pretrigger and rejection window
    println!("3. Diagnostics");
    let mut scope = PitayaScope::new(pulse_scope(), config(OutputFormat::JustCheck)?);
    let summary = scope.run_measurement(StopCondition::TraceCount(50), &mut OutputSink::just_check())?;
    if let Some(report) = summary.diagnostic {
        print!("{report}");
    }

    // 4. Last trace as a DataFrame
    println!("\n4. Last trace as a DataFrame");
    let config = scope.config().clone();
    let mut registers = scope.into_registers();
    let pointer = RingIndex::from_register(
        registers.read_register(pitaya_scope_rs::Register::TriggerPointer),
    );
    let trace = TraceExtractor::from_config(&config).extract(&registers.channel(Channel::A), pointer);
    let df = trace.to_dataframe(config.decimation())?;
    println!("{}", df.head(Some(40)).tail(Some(10)));

    let peak = df
        .clone()
        .lazy()
        .select([col("sample").max().alias("peak"), col("time").min().alias("start")])
        .collect()?;
    println!("{peak}");

    Ok(())
}
