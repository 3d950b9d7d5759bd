//! Software stand-in for the oscilloscope FPGA module.
//!
//! Each arm of the trigger consumes the next scripted [`SimulatedEvent`]. When
//! the script is exhausted an immediate trigger still fires, an optional
//! [`PulseShape`] generator produces a new pulse, and otherwise the trigger
//! never fires, which is how trigger timeouts are exercised.

use std::collections::VecDeque;

use crate::registers::{Channel, Register, RegisterInterface, OSC_RESET_BIT, TRIGGER_ARM_BIT};
use crate::ring_buffer::{encode, RingIndex, BUF};
use crate::trigger_config::TriggerMode;

/// Distance the simulated trigger pointer advances between two events.
const POINTER_STRIDE: isize = 4099;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedEvent {
    trigger_pointer: RingIndex,
    polls_before_fire: u32,
    writes: Vec<(Channel, isize, Vec<u32>)>,
}

impl SimulatedEvent {
    pub fn at(trigger_pointer: usize) -> Self {
        Self {
            trigger_pointer: RingIndex::new(trigger_pointer),
            polls_before_fire: 0,
            writes: Vec::new(),
        }
    }

    /// Raw codes written into `channel` starting `relative` slots away from
    /// the trigger pointer when the event fires.
    pub fn with_samples(mut self, channel: Channel, relative: isize, raw: Vec<u32>) -> Self {
        self.writes.push((channel, relative, raw));
        self
    }

    /// Number of trigger-register reads that still report "armed" before the
    /// event fires.
    pub fn after_polls(mut self, polls: u32) -> Self {
        self.polls_before_fire = polls;
        self
    }

    pub fn trigger_pointer(&self) -> RingIndex {
        self.trigger_pointer
    }
}

/// Exponentially decaying pulse produced on every edge trigger once the
/// scripted events are used up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseShape {
    pub channel: Channel,
    pub baseline: i32,
    pub amplitude: i32,
    pub decay_samples: f64,
    /// Samples before the pulse onset that are filled with the baseline.
    pub lead_in: usize,
    pub length: usize,
}

impl PulseShape {
    fn render(&self) -> Vec<u32> {
        (0..self.length)
            .map(|i| {
                let value = if i < self.lead_in {
                    f64::from(self.baseline)
                } else {
                    let t = (i - self.lead_in) as f64;
                    f64::from(self.baseline)
                        + f64::from(self.amplitude) * (-t / self.decay_samples).exp()
                };
                encode((value.round() as i32).clamp(-8192, 8191))
            })
            .collect()
    }

    fn event_at(&self, trigger_pointer: RingIndex) -> SimulatedEvent {
        SimulatedEvent::at(trigger_pointer.get()).with_samples(
            self.channel,
            -(self.lead_in as isize),
            self.render(),
        )
    }
}

#[derive(Debug)]
struct Armed {
    event: Option<SimulatedEvent>,
    polls_left: u32,
}

#[derive(Debug)]
pub struct SimulatedScope {
    registers: [u32; Register::COUNT],
    channel_a: Vec<u32>,
    channel_b: Vec<u32>,
    pending: VecDeque<SimulatedEvent>,
    pulse: Option<PulseShape>,
    armed: Option<Armed>,
    next_pointer: RingIndex,
    write_log: Vec<(Register, u32)>,
    arm_count: u64,
    fired: u64,
}

impl SimulatedScope {
    pub fn new() -> Self {
        Self {
            registers: [0; Register::COUNT],
            channel_a: vec![0; BUF],
            channel_b: vec![0; BUF],
            pending: VecDeque::new(),
            pulse: None,
            armed: None,
            next_pointer: RingIndex::default(),
            write_log: Vec::new(),
            arm_count: 0,
            fired: 0,
        }
    }

    pub fn with_events(events: impl IntoIterator<Item = SimulatedEvent>) -> Self {
        let mut scope = Self::new();
        scope.pending.extend(events);
        scope
    }

    pub fn with_pulse_generator(mut self, pulse: PulseShape) -> Self {
        self.pulse = Some(pulse);
        self
    }

    pub fn push_event(&mut self, event: SimulatedEvent) {
        self.pending.push_back(event);
    }

    /// Sets every slot of `channel` to `raw`.
    pub fn fill_channel(&mut self, channel: Channel, raw: u32) {
        self.buffer_mut(channel).fill(raw);
    }

    pub fn buffer(&self, channel: Channel) -> &[u32] {
        match channel {
            Channel::A => &self.channel_a,
            Channel::B => &self.channel_b,
        }
    }

    pub fn buffer_mut(&mut self, channel: Channel) -> &mut [u32] {
        match channel {
            Channel::A => &mut self.channel_a,
            Channel::B => &mut self.channel_b,
        }
    }

    /// Every register write in the order it happened.
    pub fn write_log(&self) -> &[(Register, u32)] {
        &self.write_log
    }

    pub fn writes_to(&self, register: Register) -> Vec<u32> {
        self.write_log
            .iter()
            .filter(|(r, _)| *r == register)
            .map(|(_, value)| *value)
            .collect()
    }

    pub fn register(&self, register: Register) -> u32 {
        self.registers[register.index()]
    }

    pub fn arm_count(&self) -> u64 {
        self.arm_count
    }

    pub fn fired(&self) -> u64 {
        self.fired
    }

    fn arm(&mut self, mode: u32) {
        self.arm_count += 1;
        let event = self.pending.pop_front().or_else(|| {
            if mode == TriggerMode::Immediate.register_value() {
                Some(SimulatedEvent::at(self.next_pointer.get()))
            } else {
                self.pulse.map(|pulse| pulse.event_at(self.next_pointer))
            }
        });
        if event.is_none() {
            log::debug!("Simulated trigger armed with nothing left to fire");
        }
        let polls_left = event.as_ref().map_or(0, |e| e.polls_before_fire);
        self.armed = Some(Armed { event, polls_left });
    }

    fn poll(&mut self) {
        let Some(armed) = self.armed.as_mut() else {
            return;
        };
        if armed.event.is_none() {
            return;
        }
        if armed.polls_left > 0 {
            armed.polls_left -= 1;
            return;
        }
        if let Some(event) = self.armed.take().and_then(|armed| armed.event) {
            self.fire(event);
        }
    }

    fn fire(&mut self, event: SimulatedEvent) {
        for (channel, relative, raw) in &event.writes {
            let start = event.trigger_pointer.offset(*relative);
            let buffer = self.buffer_mut(*channel);
            for (i, code) in raw.iter().enumerate() {
                buffer[start.offset(i as isize).get()] = *code;
            }
        }
        self.registers[Register::TriggerPointer.index()] = event.trigger_pointer.get() as u32;
        self.registers[Register::Trigger.index()] = 0;
        self.registers[Register::Configuration.index()] &= !TRIGGER_ARM_BIT;
        self.next_pointer = event.trigger_pointer.offset(POINTER_STRIDE);
        self.fired += 1;
    }
}

impl Default for SimulatedScope {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterInterface for SimulatedScope {
    fn read_register(&mut self, register: Register) -> u32 {
        if register == Register::Trigger {
            self.poll();
        }
        self.registers[register.index()]
    }

    fn write_register(&mut self, register: Register, value: u32) {
        self.write_log.push((register, value));
        let stored = if register == Register::Configuration {
            // Reset is acknowledged immediately
            value & !OSC_RESET_BIT
        } else {
            value
        };
        self.registers[register.index()] = stored;

        let arm_bit_set = self.registers[Register::Configuration.index()] & TRIGGER_ARM_BIT != 0;
        if register == Register::Trigger && value != 0 && arm_bit_set {
            self.arm(value);
        }
    }

    fn read_sample(&self, channel: Channel, index: RingIndex) -> u32 {
        self.buffer(channel)[index.get()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ring_buffer::decode;

    fn arm(scope: &mut SimulatedScope, mode: u32) {
        scope.set_register_bits(Register::Configuration, TRIGGER_ARM_BIT);
        scope.write_register(Register::Trigger, mode);
    }

    #[test]
    fn test_scripted_event_fires_after_polls() {
        let event = SimulatedEvent::at(100)
            .after_polls(2)
            .with_samples(Channel::A, -1, vec![7, 8, 9]);
        let mut scope = SimulatedScope::with_events([event]);
        arm(&mut scope, 2);

        assert_eq!(scope.read_register(Register::Trigger), 2);
        assert_eq!(scope.read_register(Register::Trigger), 2);
        assert_eq!(scope.read_register(Register::Trigger), 0);
        assert_eq!(scope.read_register(Register::TriggerPointer), 100);
        assert_eq!(scope.buffer(Channel::A)[99..102], [7, 8, 9]);
        assert_eq!(scope.register(Register::Configuration) & TRIGGER_ARM_BIT, 0);
        assert_eq!(scope.fired(), 1);
    }

    #[test]
    fn test_edge_trigger_stalls_without_events() {
        let mut scope = SimulatedScope::new();
        arm(&mut scope, 3);
        for _ in 0..100 {
            assert_eq!(scope.read_register(Register::Trigger), 3);
        }
        assert_eq!(scope.fired(), 0);
    }

    #[test]
    fn test_immediate_trigger_always_fires() {
        let mut scope = SimulatedScope::new();
        for _ in 0..3 {
            arm(&mut scope, 1);
            assert_eq!(scope.read_register(Register::Trigger), 0);
        }
        assert_eq!(scope.fired(), 3);
        assert_eq!(scope.arm_count(), 3);
    }

    #[test]
    fn test_trigger_write_without_arm_bit_does_nothing() {
        let mut scope = SimulatedScope::new();
        scope.write_register(Register::Trigger, 1);
        assert_eq!(scope.arm_count(), 0);
    }

    #[test]
    fn test_event_samples_wrap_around_ring() {
        let event = SimulatedEvent::at(1).with_samples(Channel::B, -2, vec![1, 2, 3, 4]);
        let mut scope = SimulatedScope::with_events([event]);
        arm(&mut scope, 4);
        scope.read_register(Register::Trigger);
        let ring = scope.buffer(Channel::B);
        assert_eq!(ring[BUF - 1], 1);
        assert_eq!(ring[0], 2);
        assert_eq!(ring[1], 3);
        assert_eq!(ring[2], 4);
        assert_eq!(scope.buffer(Channel::A)[0], 0);
    }

    #[test]
    fn test_pulse_generator_renders_decay() {
        let pulse = PulseShape {
            channel: Channel::A,
            baseline: 10,
            amplitude: 1000,
            decay_samples: 5.0,
            lead_in: 4,
            length: 32,
        };
        let mut scope = SimulatedScope::new().with_pulse_generator(pulse);
        arm(&mut scope, 2);
        scope.read_register(Register::Trigger);

        let pointer = RingIndex::from_register(scope.register(Register::TriggerPointer));
        let at = |delta: isize| decode(scope.buffer(Channel::A)[pointer.offset(delta).get()]);
        assert_eq!(at(-4), 10);
        assert_eq!(at(0), 1010);
        assert!(at(1) < at(0));
        assert!(at(20) < 30);
    }

    #[test]
    fn test_reset_bit_is_acknowledged() {
        let mut scope = SimulatedScope::new();
        scope.set_register_bits(Register::Configuration, OSC_RESET_BIT);
        assert_eq!(scope.register(Register::Configuration), 0);
        assert_eq!(
            scope.writes_to(Register::Configuration),
            vec![OSC_RESET_BIT]
        );
    }
}
