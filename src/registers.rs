//! Register map of the oscilloscope FPGA module and the surface the
//! acquisition core talks to.

use crate::ring_buffer::{RingIndex, SampleSource};

/// Bit 0 of the configuration register arms the trigger.
pub const TRIGGER_ARM_BIT: u32 = 1;
/// Bit 1 of the configuration register resets the acquisition logic.
pub const OSC_RESET_BIT: u32 = 2;

/// Number of valid bits in one ADC code.
pub const ADC_BITS: u32 = 14;

/// Physical base address of the oscilloscope register page.
pub const OSC_BASE: usize = 0x4010_0000;
/// Size of the mapped oscilloscope page, both channel buffers included.
pub const OSC_BASE_SIZE: usize = 0x3_0000;
/// Offset of the channel A sample buffer from [`OSC_BASE`].
pub const OSC_CHANNEL_A_OFFSET: usize = 0x1_0000;
/// Offset of the channel B sample buffer from [`OSC_BASE`].
pub const OSC_CHANNEL_B_OFFSET: usize = 0x2_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    A,
    B,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::A => "A",
            Channel::B => "B",
        }
    }

    /// Byte offset of this channel's sample buffer inside the register page.
    pub fn buffer_offset(&self) -> usize {
        match self {
            Channel::A => OSC_CHANNEL_A_OFFSET,
            Channel::B => OSC_CHANNEL_B_OFFSET,
        }
    }

    pub fn threshold_register(&self) -> Register {
        match self {
            Channel::A => Register::ThresholdA,
            Channel::B => Register::ThresholdB,
        }
    }
}

/// Scalar registers at the start of the oscilloscope page, in hardware order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Configuration,
    Trigger,
    ThresholdA,
    ThresholdB,
    PostTriggerTraceLength,
    Decimation,
    WritePointer,
    TriggerPointer,
}

impl Register {
    pub const COUNT: usize = 8;

    pub const ALL: [Register; Self::COUNT] = [
        Register::Configuration,
        Register::Trigger,
        Register::ThresholdA,
        Register::ThresholdB,
        Register::PostTriggerTraceLength,
        Register::Decimation,
        Register::WritePointer,
        Register::TriggerPointer,
    ];

    /// Byte offset from the start of the register page.
    pub fn offset(&self) -> usize {
        self.index() * std::mem::size_of::<u32>()
    }

    /// Word index from the start of the register page.
    pub fn index(&self) -> usize {
        match self {
            Register::Configuration => 0,
            Register::Trigger => 1,
            Register::ThresholdA => 2,
            Register::ThresholdB => 3,
            Register::PostTriggerTraceLength => 4,
            Register::Decimation => 5,
            Register::WritePointer => 6,
            Register::TriggerPointer => 7,
        }
    }
}

/// Read/write access to the oscilloscope registers and both circular
/// sample buffers.
///
/// Reads take `&mut self` because polling the trigger register is how the
/// hardware handshake advances; implementations backed by real memory simply
/// perform a volatile load.
pub trait RegisterInterface {
    fn read_register(&mut self, register: Register) -> u32;

    fn write_register(&mut self, register: Register, value: u32);

    /// Raw slot content of `channel`'s ring buffer at `index`.
    fn read_sample(&self, channel: Channel, index: RingIndex) -> u32;

    /// Read-modify-write that ORs `bits` into `register`.
    fn set_register_bits(&mut self, register: Register, bits: u32) {
        let value = self.read_register(register);
        self.write_register(register, value | bits);
    }

    /// A read-only view of one channel's ring buffer.
    fn channel(&self, channel: Channel) -> ChannelSamples<'_, Self>
    where
        Self: Sized,
    {
        ChannelSamples {
            registers: self,
            channel,
        }
    }
}

/// Borrowed view of one channel's sample buffer.
pub struct ChannelSamples<'a, R: ?Sized> {
    registers: &'a R,
    channel: Channel,
}

impl<R: RegisterInterface + ?Sized> SampleSource for ChannelSamples<'_, R> {
    fn raw_at(&self, index: RingIndex) -> u32 {
        self.registers.read_sample(self.channel, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_offsets_follow_hardware_layout() {
        assert_eq!(Register::Configuration.offset(), 0x00);
        assert_eq!(Register::Trigger.offset(), 0x04);
        assert_eq!(Register::ThresholdB.offset(), 0x0c);
        assert_eq!(Register::Decimation.offset(), 0x14);
        assert_eq!(Register::TriggerPointer.offset(), 0x1c);
    }

    #[test]
    fn test_channel_buffers_are_distinct() {
        assert_ne!(Channel::A.buffer_offset(), Channel::B.buffer_offset());
        assert_eq!(Channel::A.threshold_register(), Register::ThresholdA);
        assert_eq!(Channel::B.threshold_register(), Register::ThresholdB);
    }
}
