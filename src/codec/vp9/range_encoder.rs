//! VP9 Binary Arithmetic Range Encoder
//!
//! The exact inverse of `RangeDecoder`. The tile decoder never writes
//! bitstreams; this encoder exists to author synthetic tiles for tests and
//! benchmarks, so it produces byte-exact output for any symbol sequence the
//! decoder can read back.

/// Range encoder producing one tile's bytes
///
/// The encoder maintains:
/// - A range value that narrows as symbols are encoded
/// - A 24-bit low value representing the bottom of the current range
/// - A bit counter deciding when a byte is complete
/// - Carry propagation into already written bytes
pub struct RangeEncoder {
    /// Current range (starts at 255)
    range: u32,
    /// Current low value (bottom of range)
    low: u32,
    /// Bits pending before the next output byte, biased by -24
    count: i32,
    /// Output buffer
    buffer: Vec<u8>,
}

impl RangeEncoder {
    /// Create a new range encoder and emit the marker bit
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with pre-allocated buffer capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let mut encoder = RangeEncoder {
            range: 255,
            low: 0,
            count: -24,
            buffer: Vec::with_capacity(capacity),
        };
        encoder.write_bit(false);
        encoder
    }

    /// Write a boolean value with given probability
    ///
    /// The probability is on a scale of 0-255 where prob represents P(bit == 0).
    #[inline]
    pub fn write_bool(&mut self, bit: bool, prob: u8) {
        let split = 1 + (((self.range - 1) * prob as u32) >> 8);
        let mut range = split;
        let mut low = self.low;

        if bit {
            low += split;
            range = self.range - split;
        }

        let mut shift = (range.leading_zeros() - 24) as i32;
        range <<= shift;
        self.count += shift;

        if self.count >= 0 {
            let offset = shift - self.count;

            if (low << (offset - 1)) & 0x8000_0000 != 0 {
                self.propagate_carry();
            }

            self.buffer.push(((low >> (24 - offset)) & 0xff) as u8);
            low <<= offset;
            shift = self.count;
            low &= 0xff_ffff;
            self.count -= 8;
        }

        self.low = low << shift;
        self.range = range;
    }

    fn propagate_carry(&mut self) {
        for byte in self.buffer.iter_mut().rev() {
            if *byte == 0xff {
                *byte = 0;
            } else {
                *byte += 1;
                return;
            }
        }
    }

    /// Write a single bit with probability 128
    #[inline]
    pub fn write_bit(&mut self, bit: bool) {
        self.write_bool(bit, 128);
    }

    /// Write n bits as an unsigned literal value (MSB first)
    #[inline]
    pub fn write_literal(&mut self, value: u32, n: u8) {
        for i in (0..n).rev() {
            self.write_bit(((value >> i) & 1) != 0);
        }
    }

    /// Write a symbol using a binary tree structure
    ///
    /// Tree is encoded as pairs of (bit 0 child, bit 1 child) where:
    /// - Positive values are indices to next node
    /// - Non-positive values are negated leaf symbols
    pub fn write_tree(&mut self, tree: &[i8], probs: &[u8], symbol: u8) {
        let symbol = symbol as i8;
        let mut node = 0usize;
        loop {
            let prob = probs[node >> 1];
            let left = tree[node];

            let bit = !Self::symbol_in_subtree(tree, left, symbol);
            self.write_bool(bit, prob);

            let next = tree[node + bit as usize];
            if next <= 0 {
                return;
            }
            node = next as usize;
        }
    }

    /// Check if symbol is in the subtree rooted at node
    fn symbol_in_subtree(tree: &[i8], node: i8, symbol: i8) -> bool {
        if node <= 0 {
            return -node == symbol;
        }

        let idx = node as usize;
        if idx + 1 >= tree.len() {
            return false;
        }

        Self::symbol_in_subtree(tree, tree[idx], symbol)
            || Self::symbol_in_subtree(tree, tree[idx + 1], symbol)
    }

    /// Flush the coder and return the tile bytes
    pub fn finish(mut self) -> Vec<u8> {
        for _ in 0..32 {
            self.write_bit(false);
        }

        // Avoid a trailing byte that looks like a superframe index marker
        if let Some(&last) = self.buffer.last() {
            if last & 0xe0 == 0xc0 {
                self.buffer.push(0);
            }
        }

        self.buffer
    }
}

impl Default for RangeEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::vp9::range_coder::RangeDecoder;
    use crate::codec::vp9::tables::{INTRA_MODE_TREE, MV_CLASS_TREE};

    #[test]
    fn test_bool_sequence_decodes() {
        let probs = [1u8, 10, 128, 200, 255, 77, 3, 250];
        let bits: Vec<bool> = (0..400).map(|i| (i * 7 + i / 3) % 5 < 2).collect();

        let mut encoder = RangeEncoder::new();
        for (i, &bit) in bits.iter().enumerate() {
            encoder.write_bool(bit, probs[i % probs.len()]);
        }
        let data = encoder.finish();

        let mut decoder = RangeDecoder::new(&data).unwrap();
        for (i, &bit) in bits.iter().enumerate() {
            assert_eq!(decoder.read_bool(probs[i % probs.len()]), bit, "bit {}", i);
        }
        assert!(!decoder.has_error());
    }

    #[test]
    fn test_literals_and_trees() {
        let mode_probs = [137u8, 30, 42, 148, 151, 207, 70, 52, 91];
        let class_probs = [224u8, 144, 192, 168, 192, 176, 192, 198, 198, 245];

        let mut encoder = RangeEncoder::new();
        encoder.write_literal(0x2a5, 10);
        for mode in 0..10u8 {
            encoder.write_tree(&INTRA_MODE_TREE, &mode_probs, mode);
        }
        encoder.write_tree(&MV_CLASS_TREE, &class_probs, 10);
        let data = encoder.finish();

        let mut decoder = RangeDecoder::new(&data).unwrap();
        assert_eq!(decoder.read_literal(10), 0x2a5);
        for mode in 0..10u8 {
            assert_eq!(decoder.read_tree(&INTRA_MODE_TREE, &mode_probs), mode);
        }
        assert_eq!(decoder.read_tree(&MV_CLASS_TREE, &class_probs), 10);
    }

    #[test]
    fn test_find_end_within_output() {
        let mut encoder = RangeEncoder::new();
        for i in 0..100 {
            encoder.write_bool(i % 3 == 0, 180);
        }
        let data = encoder.finish();
        let mut decoder = RangeDecoder::new(&data).unwrap();
        for i in 0..100 {
            assert_eq!(decoder.read_bool(180), i % 3 == 0);
        }
        assert!(decoder.find_end() <= data.len());
    }
}
