//! Circular sample buffer addressing and ADC code decoding.
//!
//! The hardware writes samples into a fixed ring of [`BUF`] slots per channel.
//! All modulo arithmetic on ring positions lives in [`RingIndex`]; nothing
//! else in the crate folds indices by hand.

/// Number of slots in each channel's ring buffer.
pub const BUF: usize = 16 * 1024;

/// Largest code a 14-bit ADC sample can hold.
pub const RAW_CODE_MAX: u32 = (1 << 14) - 1;

const SIGN_THRESHOLD: i32 = 1 << 13;
const CODE_SPAN: i32 = 1 << 14;

/// Position in a ring buffer, always in `0..BUF`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RingIndex(usize);

impl RingIndex {
    /// Folds any position onto the ring.
    pub fn new(position: usize) -> Self {
        Self(position % BUF)
    }

    /// Interprets a register value (for example the trigger pointer) as a
    /// ring position.
    pub fn from_register(value: u32) -> Self {
        Self::new(value as usize)
    }

    pub fn get(self) -> usize {
        self.0
    }

    /// Moves `delta` slots forward (or backward when negative), wrapping
    /// around the ring.
    pub fn offset(self, delta: isize) -> Self {
        let folded = (self.0 as isize + delta).rem_euclid(BUF as isize);
        Self(folded as usize)
    }
}

/// Anything that can hand out the raw slot at a ring position.
pub trait SampleSource {
    fn raw_at(&self, index: RingIndex) -> u32;
}

/// Plain slices act as a ring when they hold exactly [`BUF`] slots. Slots
/// past the end of a shorter slice read as 0.
impl SampleSource for [u32] {
    fn raw_at(&self, index: RingIndex) -> u32 {
        self.get(index.get()).copied().unwrap_or(0)
    }
}

impl SampleSource for Vec<u32> {
    fn raw_at(&self, index: RingIndex) -> u32 {
        self.as_slice().raw_at(index)
    }
}

/// A ring buffer viewed from a fixed origin, usually the trigger pointer.
pub struct RingWindow<'a, S: ?Sized> {
    source: &'a S,
    origin: RingIndex,
}

impl<'a, S: SampleSource + ?Sized> RingWindow<'a, S> {
    pub fn new(source: &'a S, origin: RingIndex) -> Self {
        Self { source, origin }
    }

    pub fn origin(&self) -> RingIndex {
        self.origin
    }

    /// Raw slot `relative` positions away from the origin.
    pub fn read(&self, relative: isize) -> u32 {
        self.source.raw_at(self.origin.offset(relative))
    }

    /// `len` consecutive raw slots starting `start` positions from the origin.
    pub fn iter_from(&self, start: isize, len: usize) -> impl Iterator<Item = u32> + '_ {
        let first = self.origin.offset(start);
        (0..len).map(move |i| self.source.raw_at(first.offset(i as isize)))
    }
}

/// Folds a 14-bit two's-complement ADC code into a signed sample.
///
/// Bits above the 14-bit code are ignored, so the result is always in
/// `-8192..=8191`.
pub fn decode(raw: u32) -> i32 {
    let code = (raw & RAW_CODE_MAX) as i32;
    if code >= SIGN_THRESHOLD {
        code - CODE_SPAN
    } else {
        code
    }
}

/// Inverse of [`decode`] for values in `-8192..=8191`.
pub fn encode(sample: i32) -> u32 {
    if sample < 0 {
        (sample + CODE_SPAN) as u32
    } else {
        sample as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_full_code_range() {
        for raw in 0..=RAW_CODE_MAX {
            let decoded = decode(raw);
            assert!((-8192..=8191).contains(&decoded));
            if raw >= 8192 {
                assert_eq!(decoded, raw as i32 - 16384);
            } else {
                assert_eq!(decoded, raw as i32);
            }
        }
    }

    #[test]
    fn test_decode_known_codes() {
        assert_eq!(decode(0), 0);
        assert_eq!(decode(8191), 8191);
        assert_eq!(decode(8192), -8192);
        assert_eq!(decode(9000), -7384);
        assert_eq!(decode(16383), -1);
    }

    #[test]
    fn test_encode_inverts_decode() {
        assert_eq!(encode(-1), 16383);
        assert_eq!(encode(-8192), 8192);
        assert_eq!(encode(8191), 8191);
        assert_eq!(decode(encode(-7384)), -7384);
    }

    #[test]
    fn test_ring_index_wraps_both_ways() {
        assert_eq!(RingIndex::new(BUF).get(), 0);
        assert_eq!(RingIndex::new(BUF + 5).get(), 5);
        assert_eq!(RingIndex::new(3).offset(-5).get(), BUF - 2);
        assert_eq!(RingIndex::new(BUF - 1).offset(1).get(), 0);
        assert_eq!(RingIndex::new(10).offset(-10).get(), 0);
    }

    #[test]
    fn test_offset_always_on_ring() {
        for pointer in [0, 1, 100, BUF / 2, BUF - 1] {
            for delta in [-(BUF as isize), -16383, -1, 0, 1, 16383] {
                let index = RingIndex::new(pointer).offset(delta);
                assert!(index.get() < BUF);
                let expected = (pointer as isize + delta + 2 * BUF as isize) as usize % BUF;
                assert_eq!(index.get(), expected);
            }
        }
    }

    #[test]
    fn test_window_reads_relative_to_origin() {
        let ring: Vec<u32> = (0..BUF as u32).collect();
        let window = RingWindow::new(&ring, RingIndex::new(2));
        assert_eq!(window.read(0), 2);
        assert_eq!(window.read(-3), (BUF - 1) as u32);
        let wrapped: Vec<u32> = window.iter_from(-4, 4).collect();
        assert_eq!(wrapped, vec![(BUF - 2) as u32, (BUF - 1) as u32, 0, 1]);
    }

    #[test]
    fn test_short_slice_reads_zero_past_its_end() {
        let short = [7u32; 4];
        assert_eq!(short[..].raw_at(RingIndex::new(3)), 7);
        assert_eq!(short[..].raw_at(RingIndex::new(4)), 0);
        assert_eq!(short[..].raw_at(RingIndex::new(BUF - 1)), 0);

        let window = RingWindow::new(&short[..], RingIndex::new(2));
        let read: Vec<u32> = window.iter_from(-4, 8).collect();
        assert_eq!(read, vec![0, 0, 7, 7, 7, 7, 0, 0]);
    }
}
