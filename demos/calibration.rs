// Channel calibration example
//
// Averages 100 immediate acquisitions per channel and prints the DC level of
// both inputs as raw ADC codes. Leave the inputs open or grounded while this
// runs.

use pitaya_scope_rs::{Calibrator, Channel, RegisterInterface};
use std::io::{self, Write};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    #[cfg(feature = "cpu-profiling")]
    tracy_client::Client::start();

    println!("Oscilloscope Calibration Example");
    println!("================================\n");

    let mut registers = connect()?;

    print!("Ground both inputs, then press Enter to start...");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let calibrator = Calibrator::new();
    println!(
        "Averaging {} acquisitions per channel",
        calibrator.repetitions()
    );

    for channel in [Channel::A, Channel::B] {
        let average = calibrator.measure(&mut registers, channel);
        println!("Average value for Channel {}: {}", channel.as_str(), average);
        if average >= 8192 {
            println!(
                "  Note: codes above 8191 are negative levels ({} after folding)",
                average - 16384
            );
        }
    }

    Ok(())
}

#[cfg(feature = "devmem")]
fn connect() -> Result<impl RegisterInterface, Box<dyn std::error::Error>> {
    Ok(pitaya_scope_rs::PitayaConnector::connect()?)
}

#[cfg(not(feature = "devmem"))]
fn connect() -> Result<impl RegisterInterface, Box<dyn std::error::Error>> {
    use pitaya_scope_rs::SimulatedScope;

    println!("Using the simulated scope (enable the `devmem` feature for hardware)\n");
    let mut scope = SimulatedScope::new();
    scope.fill_channel(Channel::A, 12);
    // A slightly negative offset as the ADC stores it
    scope.fill_channel(Channel::B, 16380);
    Ok(scope)
}
