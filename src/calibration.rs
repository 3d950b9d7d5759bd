//! DC offset measurement of the input channels.

use std::fmt;

use crate::registers::{Channel, Register, RegisterInterface, TRIGGER_ARM_BIT};
use crate::ring_buffer::{RingIndex, RingWindow};
use crate::trigger_config::TriggerMode;

/// Number of immediate acquisitions averaged into one calibration value.
pub const CALIBRATION_REPETITIONS: usize = 100;
/// Samples read from the trigger pointer onwards in each acquisition.
pub const CALIBRATION_WINDOW: usize = 16383;

/// DC offsets of both channels, as raw ADC code averages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationReport {
    pub channel_a: i32,
    pub channel_b: i32,
}

impl fmt::Display for CalibrationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Calibration channel A: {}", self.channel_a)?;
        write!(f, "Calibration channel B: {}", self.channel_b)
    }
}

/// Measures the DC level of a channel by averaging repeated immediate
/// acquisitions.
///
/// The raw slot contents are averaged as stored. No two's-complement fold is
/// applied, so a slightly negative input level reads close to 16384.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calibrator {
    repetitions: usize,
    window: usize,
}

impl Calibrator {
    pub fn new() -> Self {
        Self {
            repetitions: CALIBRATION_REPETITIONS,
            window: CALIBRATION_WINDOW,
        }
    }

    pub fn repetitions(&self) -> usize {
        self.repetitions
    }

    #[tracing::instrument(skip(self, registers))]
    pub fn measure<R: RegisterInterface>(&self, registers: &mut R, channel: Channel) -> i32 {
        log::debug!("Calibrating channel {}", channel.as_str());
        registers.write_register(Register::PostTriggerTraceLength, self.window as u32);

        let mut total = 0.0;
        for _ in 0..self.repetitions {
            let trigger_pointer = Self::acquire_immediate(registers);
            total += self.window_average(&*registers, channel, trigger_pointer);
        }
        let average = total / self.repetitions as f64;
        log::debug!(
            "Channel {} calibration average {average}",
            channel.as_str()
        );
        average as i32
    }

    pub fn measure_both<R: RegisterInterface>(&self, registers: &mut R) -> CalibrationReport {
        CalibrationReport {
            channel_a: self.measure(registers, Channel::A),
            channel_b: self.measure(registers, Channel::B),
        }
    }

    /// Arms an immediate trigger and spins until it has fired. An immediate
    /// trigger cannot stall, so there is no timeout.
    fn acquire_immediate<R: RegisterInterface>(registers: &mut R) -> RingIndex {
        registers.set_register_bits(Register::Configuration, TRIGGER_ARM_BIT);
        registers.write_register(Register::Trigger, TriggerMode::Immediate.register_value());
        while registers.read_register(Register::Trigger) != 0 {
            std::hint::spin_loop();
        }
        RingIndex::from_register(registers.read_register(Register::TriggerPointer))
    }

    fn window_average<R: RegisterInterface>(
        &self,
        registers: &R,
        channel: Channel,
        trigger_pointer: RingIndex,
    ) -> f64 {
        let samples = registers.channel(channel);
        let sum: u64 = RingWindow::new(&samples, trigger_pointer)
            .iter_from(0, self.window)
            .map(u64::from)
            .sum();
        sum as f64 / self.window as f64
    }
}

impl Default for Calibrator {
    fn default() -> Self {
        Self::new()
    }
}
