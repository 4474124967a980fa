//! VP9 Dequantization
//!
//! VP9 uses separate dequantization steps for DC and AC coefficients, with
//! different deltas for luma and chroma planes. Each segment may override
//! the frame's quantizer index, so the decoder keeps one set of steps per
//! segment.

use super::frame::{QuantizationParams, SegmentationParams, MAX_SEGMENTS};
use super::tables::{AC_QLOOKUP, DC_QLOOKUP};

/// Dequantization steps for a single plane type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaneQuantFactors {
    /// DC dequantization factor
    pub dc: i16,
    /// AC dequantization factor
    pub ac: i16,
}

impl PlaneQuantFactors {
    /// Step for the coefficient at scan position `c`
    #[inline]
    pub fn step(&self, c: usize) -> i32 {
        if c == 0 {
            self.dc as i32
        } else {
            self.ac as i32
        }
    }
}

/// Per-segment dequantization steps for a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentDequant {
    /// Y plane factors per segment
    pub y: [PlaneQuantFactors; MAX_SEGMENTS],
    /// UV plane factors per segment
    pub uv: [PlaneQuantFactors; MAX_SEGMENTS],
}

impl SegmentDequant {
    /// Build 8-bit dequantizers from frame parameters
    pub fn from_params(quant: &QuantizationParams, seg: &SegmentationParams) -> Self {
        Self::from_tables(quant, seg, &DC_QLOOKUP, &AC_QLOOKUP)
    }

    /// Build dequantizers from caller-supplied DC and AC step tables
    ///
    /// High bit depth streams use this with their 10-bit or 12-bit tables.
    pub fn from_tables(
        quant: &QuantizationParams,
        seg: &SegmentationParams,
        dc_table: &[i16; 256],
        ac_table: &[i16; 256],
    ) -> Self {
        let mut dequant = SegmentDequant {
            y: [PlaneQuantFactors::default(); MAX_SEGMENTS],
            uv: [PlaneQuantFactors::default(); MAX_SEGMENTS],
        };

        for segment_id in 0..MAX_SEGMENTS {
            let qindex = seg.qindex(segment_id as u8, quant.base_q_idx);
            dequant.y[segment_id] = PlaneQuantFactors {
                dc: lookup(dc_table, qindex, quant.y_dc_delta),
                ac: lookup(ac_table, qindex, 0),
            };
            dequant.uv[segment_id] = PlaneQuantFactors {
                dc: lookup(dc_table, qindex, quant.uv_dc_delta),
                ac: lookup(ac_table, qindex, quant.uv_ac_delta),
            };
        }

        dequant
    }

    /// Factors for a plane (0=Y, 1=U, 2=V) of a segment
    #[inline]
    pub fn for_plane(&self, segment_id: u8, plane: usize) -> &PlaneQuantFactors {
        let segment_id = segment_id as usize & (MAX_SEGMENTS - 1);
        if plane == 0 {
            &self.y[segment_id]
        } else {
            &self.uv[segment_id]
        }
    }
}

#[inline]
fn lookup(table: &[i16; 256], qindex: u8, delta: i8) -> i16 {
    table[(qindex as i32 + delta as i32).clamp(0, 255) as usize]
}
