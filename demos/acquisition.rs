// Triggered acquisition command line
//
// Runs a measurement, a counting run or a calibration. Without the `devmem`
// feature the runs go against the simulated scope with a repeating pulse.
//
//   cargo run --example acquisition -- -n -t 2 -v 200 -l 512 -p 64 -o 4 1000
//   cargo run --example acquisition --features devmem -- -o 1 -f run1 60

use clap::Parser;
use pitaya_scope_rs::{
    AcquisitionConfig, AcquisitionError, ConfigError, OutputFormat, PitayaScope, PollSettings,
    RegisterInterface, RejectionParameters, StopCondition, StopReason, TriggerMode,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "acquisition",
    about = "Triggered trace acquisition for the oscilloscope FPGA module",
    allow_negative_numbers = true,
    after_help = "Triggering methods:\n  \
                  1   Immediate\n  \
                  2   Channel A, positive edge\n  \
                  3   Channel A, negative edge\n  \
                  4   Channel B, positive edge\n  \
                  5   Channel B, negative edge\n  \
                  6   External trigger, port 0\n  \
                  7   External trigger, port 1\n\n\
                  Output methods:\n  \
                  0   Ascii file, write every data point separately\n  \
                  1   Binary file, write every data point separately\n  \
                  4   Ascii file, write integral over peak, baseline subtracted, simple double rejection\n  \
                  5   No output, just some information on measured data (recommended use with -n)\n\n\
                  Rejection parameters:\n  \
                  With -r <min> <max> <s> <e> a trace is rejected if integral < peak * <min>\n  \
                  or integral > peak * <max>. The peak is searched between <s> and <e>.\n  \
                  -s adds a fifth value: below that peak height only <max> is applied."
)]
struct Args {
    /// Length of the measurement in seconds, or in traces with -n
    #[arg(required_unless_present = "calibrate")]
    length: Option<f64>,

    /// Take the length to be a number of traces
    #[arg(short = 'n')]
    count_traces: bool,

    /// Output file name without extension
    #[arg(short = 'f', default_value = "output")]
    filename: PathBuf,

    /// Decimation (1, 8, 64, 1024, 8192 or 65536)
    #[arg(short = 'd', default_value_t = 1)]
    decimation: u32,

    /// Triggering method, see below
    #[arg(short = 't', default_value_t = 1)]
    trigger: i32,

    /// Trigger threshold as a voltage
    #[arg(short = 'u')]
    trigger_voltage: Option<f32>,

    /// Trigger threshold as an ADC value (-8192 to 8191)
    #[arg(short = 'v')]
    trigger_value: Option<i32>,

    /// Samples recorded before the trigger
    #[arg(short = 'p', default_value_t = 0)]
    pretrigger_length: i32,

    /// Total length of a trace, pretrigger included
    #[arg(short = 'l', default_value_t = 256)]
    trace_length: i32,

    /// Output method, see below
    #[arg(short = 'o', default_value_t = 0)]
    output: i32,

    /// Rejection parameters for integration
    #[arg(short = 'r', num_args = 4, value_names = ["MIN", "MAX", "S", "E"], conflicts_with = "rejection_with_bend")]
    rejection: Option<Vec<f32>>,

    /// Rejection parameters with a curve bend
    #[arg(short = 's', num_args = 5, value_names = ["MIN", "MAX", "S", "E", "BEND"])]
    rejection_with_bend: Option<Vec<f32>>,

    /// Print the calibration averages of both channels and exit
    #[arg(short = 'c')]
    calibrate: bool,

    /// Count trigger events instead of writing traces
    #[arg(short = 'g')]
    counter: bool,

    /// File the counter writes its result to
    #[arg(long, default_value = pitaya_scope_rs::COUNT_FILE_NAME)]
    count_file: PathBuf,

    /// Trigger timeout in seconds
    #[arg(long, default_value_t = 10.0)]
    timeout: f64,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

fn rejection_parameters(args: &Args) -> Option<RejectionParameters> {
    if let Some(values) = &args.rejection_with_bend {
        return Some(
            RejectionParameters::new(values[0], values[1], values[2] as i32, values[3] as i32)
                .with_curve_bend(values[4]),
        );
    }
    args.rejection
        .as_ref()
        .map(|values| RejectionParameters::new(values[0], values[1], values[2] as i32, values[3] as i32))
}

fn build_config(args: &Args) -> Result<AcquisitionConfig, ConfigError> {
    let mut builder = AcquisitionConfig::builder()
        .decimation(args.decimation)
        .trace_length(args.trace_length)
        .pretrigger_length(args.pretrigger_length)
        .trigger_mode(TriggerMode::from_selector(args.trigger)?)
        .output_format(OutputFormat::from_selector(args.output)?)
        .trigger_timeout(PollSettings::timeout_from_secs(args.timeout)?);
    if let Some(volts) = args.trigger_voltage {
        builder = builder.trigger_voltage(volts);
    }
    if let Some(value) = args.trigger_value {
        builder = builder.trigger_value(value);
    }
    if let Some(rejection) = rejection_parameters(args) {
        builder = builder.rejection(rejection);
    }
    builder.build()
}

fn build_settings(args: &Args) -> Result<(AcquisitionConfig, StopCondition), ConfigError> {
    let stop = StopCondition::from_length(args.length.unwrap_or_default(), args.count_traces)?;
    Ok((build_config(args)?, stop))
}

fn run<R: RegisterInterface>(
    registers: R,
    config: AcquisitionConfig,
    stop: StopCondition,
    args: &Args,
) -> Result<(), AcquisitionError> {
    let mut scope = PitayaScope::new(registers, config);

    if args.calibrate {
        let report = scope.calibrate_both();
        println!("Average value for Channel A: {}", report.channel_a);
        println!("Average value for Channel B: {}", report.channel_b);
        return Ok(());
    }

    if args.counter {
        let summary = scope.count_to_file(stop, &args.count_file)?;
        println!("{summary}");
        report_timeout(summary.stop_reason);
    } else {
        println!("{}", scope.config());
        let summary = scope.measure_to_files(stop, &args.filename)?;
        println!("{summary}");
        if let Some(report) = &summary.diagnostic {
            print!("{report}");
        }
        report_timeout(summary.stop_reason);
    }
    Ok(())
}

fn report_timeout(reason: StopReason) {
    if let StopReason::TriggerTimeout { waited } = reason {
        println!(
            "Did not trigger for {:.1} s, stopped early. This could be due to wrong trigger settings.",
            waited.as_secs_f64()
        );
    }
}

#[cfg(feature = "devmem")]
fn run_with_backend(
    config: AcquisitionConfig,
    stop: StopCondition,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    let registers = pitaya_scope_rs::PitayaConnector::connect()?;
    run(registers, config, stop, args)?;
    Ok(())
}

#[cfg(not(feature = "devmem"))]
fn run_with_backend(
    config: AcquisitionConfig,
    stop: StopCondition,
    args: &Args,
) -> Result<(), Box<dyn std::error::Error>> {
    use pitaya_scope_rs::{PulseShape, SimulatedScope};

    println!("Running against the simulated scope (enable the `devmem` feature for hardware)");
    let pulse = PulseShape {
        channel: config.measure_channel(),
        baseline: 20,
        amplitude: 1500,
        decay_samples: 40.0,
        lead_in: config.pretrigger_length(),
        length: config.trace_length(),
    };
    run(SimulatedScope::new().with_pulse_generator(pulse), config, stop, args)?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    #[cfg(feature = "cpu-profiling")]
    tracy_client::Client::start();

    let (config, stop) = match build_settings(&args) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: {e}. Run 'acquisition --help' to see the valid settings.");
            return ExitCode::from(2);
        }
    };

    match run_with_backend(config, stop, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
