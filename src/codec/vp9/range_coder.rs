//! VP9 Binary Arithmetic Range Decoder
//!
//! VP9 codes every tile with a boolean range coder: an 8-bit range that is
//! split by an 8-bit probability and renormalized to at least 128 after each
//! symbol. The decoder also keeps track of how many bits it has consumed so a
//! tile can detect over-reads and report where its data ended.

use crate::error::{Error, Result};

/// Range decoder state over one tile's bytes
///
/// The decoder maintains:
/// - An 8-bit range value (starts at 255)
/// - A 16-bit window of the coded value
/// - The number of renormalization shifts performed so far
pub struct RangeDecoder<'a> {
    /// Input data buffer
    data: &'a [u8],
    /// Next byte to load into the window
    pos: usize,
    /// Current range (8-bit, stored as u32 for calculations)
    range: u32,
    /// Current value window
    value: u32,
    /// Number of bits shifted out of the current byte
    bit_count: u32,
    /// Total number of renormalization shifts
    shifts: usize,
}

impl<'a> RangeDecoder<'a> {
    /// Minimum range value before renormalization
    pub const MIN_RANGE: u32 = 128;

    /// Bind a decoder to a tile's bytes and consume the marker bit
    ///
    /// An empty buffer is a truncated tile. A set marker bit means the data
    /// cannot start a valid range-coded partition.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::corrupt_frame(
                "Truncated packet or corrupt tile length",
            ));
        }

        let mut decoder = RangeDecoder {
            data,
            pos: 0,
            range: 255,
            value: 0,
            bit_count: 0,
            shifts: 0,
        };

        // Initialize value from first two bytes
        decoder.value = (decoder.next_byte() << 8) | decoder.next_byte();

        if decoder.read_bit() {
            return Err(Error::memory("Failed to allocate bool decoder"));
        }

        Ok(decoder)
    }

    #[inline]
    fn next_byte(&mut self) -> u32 {
        match self.data.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                b as u32
            }
            None => 0,
        }
    }

    /// Read a single boolean with given probability
    ///
    /// The probability is on a scale of 0-255 where prob represents P(bit == 0).
    #[inline]
    pub fn read_bool(&mut self, prob: u8) -> bool {
        let split = 1 + (((self.range - 1) * prob as u32) >> 8);
        let split_shifted = split << 8;

        let bit = if self.value >= split_shifted {
            self.range -= split;
            self.value -= split_shifted;
            true
        } else {
            self.range = split;
            false
        };

        self.renormalize();

        bit
    }

    /// Read a single bit with probability 128
    #[inline]
    pub fn read_bit(&mut self) -> bool {
        self.read_bool(128)
    }

    /// Read n bits as an unsigned literal value (MSB first)
    #[inline]
    pub fn read_literal(&mut self, n: u8) -> u32 {
        let mut value = 0u32;
        for _ in 0..n {
            value = (value << 1) | (self.read_bit() as u32);
        }
        value
    }

    /// Read a symbol using a binary tree structure
    ///
    /// Tree is encoded as pairs of (bit 0 child, bit 1 child) where:
    /// - Positive values are indices to next node
    /// - Non-positive values are negated leaf symbols
    #[inline]
    pub fn read_tree(&mut self, tree: &[i8], probs: &[u8]) -> u8 {
        let mut node = 0usize;
        loop {
            let prob = probs[node >> 1];
            let bit = self.read_bool(prob) as usize;
            let next = tree[node + bit];
            if next <= 0 {
                return (-next) as u8;
            }
            node = next as usize;
        }
    }

    #[inline]
    fn renormalize(&mut self) {
        while self.range < Self::MIN_RANGE {
            self.range <<= 1;
            self.value <<= 1;
            self.bit_count += 1;
            self.shifts += 1;

            if self.bit_count == 8 {
                self.bit_count = 0;
                self.value |= self.next_byte();
            }
        }
    }

    /// Whether the decoder has read past the end of its data
    ///
    /// The comparison window needs 8 bits beyond every shift, so more than
    /// `8 * len - 8` shifts means bits were invented.
    pub fn has_error(&self) -> bool {
        self.shifts > (8 * self.data.len()).saturating_sub(8)
    }

    /// Byte offset just past the data the decoder has used
    pub fn find_end(&self) -> usize {
        ((self.shifts + 16) / 8).min(self.data.len())
    }

    /// Length of the bound data
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_decoder_creation() {
        let data = [0x00, 0x01, 0x2A, 0x00, 0x00];
        let decoder = RangeDecoder::new(&data).unwrap();
        // The zero marker bit read at p=128 leaves the range at the split
        assert_eq!(decoder.range, 128);
        assert_eq!(decoder.shifts, 0);
        assert!(!decoder.has_error());
    }

    #[test]
    fn test_empty_data_is_corrupt() {
        match RangeDecoder::new(&[]) {
            Err(Error::CorruptFrame(msg)) => {
                assert_eq!(msg, "Truncated packet or corrupt tile length")
            }
            _ => panic!("expected corrupt frame"),
        }
    }

    #[test]
    fn test_marker_bit_rejected() {
        // A leading 1 bit decodes the marker as set
        let data = [0xFF, 0xFF, 0xFF, 0xFF];
        assert!(matches!(
            RangeDecoder::new(&data),
            Err(Error::MemoryError(_))
        ));
    }

    #[test]
    fn test_read_zeros() {
        let data = [0x00; 8];
        let mut decoder = RangeDecoder::new(&data).unwrap();
        assert_eq!(decoder.read_literal(8), 0);
        assert!(!decoder.read_bool(1));
    }

    #[test]
    fn test_over_read_detection() {
        let data = [0x00, 0x00];
        let mut decoder = RangeDecoder::new(&data).unwrap();
        assert!(!decoder.has_error());
        for _ in 0..16 {
            decoder.read_bit();
        }
        assert!(decoder.has_error());
        assert_eq!(decoder.find_end(), 2);
    }

    #[test]
    fn test_read_tree_leaf_zero() {
        let data = [0x00; 4];
        let mut decoder = RangeDecoder::new(&data).unwrap();
        // All-zero data always takes the bit 0 branch
        let tree = [0i8, 2, -1, -2];
        assert_eq!(decoder.read_tree(&tree, &[128, 128]), 0);
    }
}
