//! VP9 Coefficient Token Decoding
//!
//! Residual coefficients are coded as a sequence of tokens in scan order.
//! Each token is read with probabilities selected by:
//! - Transform size, plane type and whether the block is inter coded
//! - The coefficient band of the scan position
//! - A context from already decoded neighbours (or, for the first
//!   position, from the above/left transform blocks)
//!
//! Tokens of magnitude two and above are coded through a Pareto model keyed
//! by the ONE-node probability, with extra raw bits for the large categories.

use super::counts::FrameCounts;
use super::probs::{pareto, FrameContext};
use super::quant::PlaneQuantFactors;
use super::range_coder::RangeDecoder;
use super::scan::ScanOrder;
use super::tables::{
    cat6_prob, coef_band, TxSize, CAT1_MIN_VAL, CAT1_PROB, CAT2_MIN_VAL, CAT2_PROB, CAT3_MIN_VAL,
    CAT3_PROB, CAT4_MIN_VAL, CAT4_PROB, CAT5_MIN_VAL, CAT5_PROB, CAT6_MIN_VAL, COEFF_CONTEXTS,
    COEF_BANDS, EOB_MODEL_TOKEN, ONE_TOKEN, TWO_TOKEN, UNCONSTRAINED_NODES, ZERO_TOKEN,
};

const EOB_CONTEXT_NODE: usize = 0;
const ZERO_CONTEXT_NODE: usize = 1;
const ONE_CONTEXT_NODE: usize = 2;
const PIVOT_NODE: usize = 2;

/// Left context entries per plane (one superblock of 4x4 rows)
const LEFT_CONTEXT_SIZE: usize = 16;

/// Above and left "has coefficients" flags per 4x4 column/row and plane
#[derive(Debug, Clone)]
pub struct EntropyContext {
    above: [Vec<u8>; 3],
    left: [[u8; LEFT_CONTEXT_SIZE]; 3],
}

impl EntropyContext {
    /// Context covering a frame `mi_cols` wide
    pub fn new(mi_cols: usize) -> Self {
        // Whole superblocks of 4x4 columns plus room for a 32x32 read
        let cols = ((mi_cols + 7) & !7) * 2 + 16;
        EntropyContext {
            above: [vec![0; cols], vec![0; cols], vec![0; cols]],
            left: [[0; LEFT_CONTEXT_SIZE]; 3],
        }
    }

    pub fn reset_above(&mut self) {
        for plane in self.above.iter_mut() {
            plane.fill(0);
        }
    }

    pub fn reset_left(&mut self) {
        self.left = [[0; LEFT_CONTEXT_SIZE]; 3];
    }

    /// Clear the flags covered by a skipped block
    pub fn reset_block(&mut self, plane: usize, above: usize, left: usize, n4_w: usize, n4_h: usize) {
        self.above[plane][above..above + n4_w].fill(0);
        let end = (left + n4_h).min(LEFT_CONTEXT_SIZE);
        self.left[plane][left..end].fill(0);
    }

    /// Initial token context for a transform block
    pub fn context(&self, plane: usize, above: usize, left: usize, tx_size: TxSize) -> usize {
        let n = tx_size.num_4x4();
        let a = self.above[plane][above..above + n].iter().any(|&v| v != 0);
        let l = self.left[plane][left..(left + n).min(LEFT_CONTEXT_SIZE)]
            .iter()
            .any(|&v| v != 0);
        a as usize + l as usize
    }

    /// Record whether a transform block had coefficients
    ///
    /// Flags past `max_wide`/`max_high` (4x4 units from the block origin,
    /// for blocks crossing the frame edge) are cleared.
    pub fn update(&mut self, plane: usize, block: &TokenBlock, has_coeffs: bool) {
        let n = block.tx_size.num_4x4();
        let value = has_coeffs as u8;
        let (keep_a, keep_l) = if block.tx_size == TxSize::Tx4x4 {
            (n, n)
        } else {
            (
                visible(n, block.x, block.max_blocks_wide),
                visible(n, block.y, block.max_blocks_high),
            )
        };

        let above = &mut self.above[plane][block.above..block.above + n];
        above[..keep_a].fill(value);
        above[keep_a..].fill(0);

        let end = (block.left + n).min(LEFT_CONTEXT_SIZE);
        let left = &mut self.left[plane][block.left..end];
        let keep_l = keep_l.min(left.len());
        left[..keep_l].fill(value);
        left[keep_l..].fill(0);
    }
}

fn visible(n: usize, pos: usize, max: Option<usize>) -> usize {
    match max {
        Some(max) if pos + n > max => max.saturating_sub(pos),
        _ => n,
    }
}

/// Position and limits of one transform block
#[derive(Debug, Clone, Copy)]
pub struct TokenBlock {
    pub tx_size: TxSize,
    /// Index into the plane's above context
    pub above: usize,
    /// Index into the plane's left context
    pub left: usize,
    /// Offset from the block origin in 4x4 units
    pub x: usize,
    pub y: usize,
    /// Visible extent in 4x4 units when the block crosses the frame edge
    pub max_blocks_wide: Option<usize>,
    pub max_blocks_high: Option<usize>,
}

type BandProbs = [[[u8; UNCONSTRAINED_NODES]; COEFF_CONTEXTS]; COEF_BANDS];
type BandCounts = [[[u32; UNCONSTRAINED_NODES + 1]; COEFF_CONTEXTS]; COEF_BANDS];
type BandEobCounts = [[u32; COEFF_CONTEXTS]; COEF_BANDS];

/// Coefficient decoder for one frame
pub struct CoefficientDecoder<'a> {
    fc: &'a FrameContext,
    bit_depth: u8,
}

impl<'a> CoefficientDecoder<'a> {
    pub fn new(fc: &'a FrameContext, bit_depth: u8) -> Self {
        CoefficientDecoder { fc, bit_depth }
    }

    /// Decode one transform block and update the entropy context
    ///
    /// Returns the end of block: the number of scan positions decoded.
    #[allow(clippy::too_many_arguments)]
    pub fn decode_block_tokens(
        &self,
        reader: &mut RangeDecoder,
        ctx: &mut EntropyContext,
        counts: Option<&mut FrameCounts>,
        dqcoeff: &mut [i32],
        plane: usize,
        is_inter: bool,
        scan: &ScanOrder,
        block: &TokenBlock,
        dequant: &PlaneQuantFactors,
    ) -> usize {
        let initial = ctx.context(plane, block.above, block.left, block.tx_size);
        let eob = self.decode_coefs(
            reader,
            counts,
            dqcoeff,
            plane,
            is_inter,
            block.tx_size,
            dequant,
            initial,
            scan,
        );
        ctx.update(plane, block, eob > 0);
        eob
    }

    /// Decode the tokens of one transform block into `dqcoeff`
    #[allow(clippy::too_many_arguments)]
    pub fn decode_coefs(
        &self,
        reader: &mut RangeDecoder,
        counts: Option<&mut FrameCounts>,
        dqcoeff: &mut [i32],
        plane: usize,
        is_inter: bool,
        tx_size: TxSize,
        dequant: &PlaneQuantFactors,
        mut ctx: usize,
        scan: &ScanOrder,
    ) -> usize {
        let tx = tx_size as usize;
        let plane_type = (plane > 0) as usize;
        let ref_type = is_inter as usize;
        let max_eob = tx_size.num_coeffs();
        let probs: &BandProbs = &self.fc.coef_probs[tx][plane_type][ref_type];
        let dq_shift = (tx_size == TxSize::Tx32x32) as u32;
        let cat6 = cat6_prob(self.bit_depth);

        let mut counts: Option<(&mut BandCounts, &mut BandEobCounts)> = counts.map(|c| {
            (
                &mut c.coef[tx][plane_type][ref_type],
                &mut c.eob_branch[tx][plane_type][ref_type],
            )
        });

        let mut token_cache = [0u8; 1024];
        let mut dqv = dequant.dc as i32;
        let mut c = 0usize;

        while c < max_eob {
            let mut band = coef_band(tx_size, c);
            let mut prob = &probs[band][ctx];
            if let Some((_, eob_branch)) = counts.as_mut() {
                eob_branch[band][ctx] += 1;
            }
            if !reader.read_bool(prob[EOB_CONTEXT_NODE]) {
                if let Some((coef, _)) = counts.as_mut() {
                    coef[band][ctx][EOB_MODEL_TOKEN] += 1;
                }
                break;
            }

            while !reader.read_bool(prob[ZERO_CONTEXT_NODE]) {
                if let Some((coef, _)) = counts.as_mut() {
                    coef[band][ctx][ZERO_TOKEN] += 1;
                }
                dqv = dequant.ac as i32;
                token_cache[scan.scan[c] as usize] = 0;
                c += 1;
                if c >= max_eob {
                    // Zero tokens up to the end carry no EOB token
                    return c;
                }
                ctx = coef_context(scan, &token_cache, c);
                band = coef_band(tx_size, c);
                prob = &probs[band][ctx];
            }

            let pos = scan.scan[c] as usize;
            let val;
            if !reader.read_bool(prob[ONE_CONTEXT_NODE]) {
                if let Some((coef, _)) = counts.as_mut() {
                    coef[band][ctx][ONE_TOKEN] += 1;
                }
                token_cache[pos] = 1;
                val = 1;
            } else {
                if let Some((coef, _)) = counts.as_mut() {
                    coef[band][ctx][TWO_TOKEN] += 1;
                }
                let p = pareto(prob[PIVOT_NODE]);
                if reader.read_bool(p[0]) {
                    if reader.read_bool(p[3]) {
                        token_cache[pos] = 5;
                        val = if reader.read_bool(p[5]) {
                            if reader.read_bool(p[7]) {
                                CAT6_MIN_VAL + read_coeff(reader, cat6)
                            } else {
                                CAT5_MIN_VAL + read_coeff(reader, &CAT5_PROB)
                            }
                        } else if reader.read_bool(p[6]) {
                            CAT4_MIN_VAL + read_coeff(reader, &CAT4_PROB)
                        } else {
                            CAT3_MIN_VAL + read_coeff(reader, &CAT3_PROB)
                        };
                    } else {
                        token_cache[pos] = 4;
                        val = if reader.read_bool(p[4]) {
                            CAT2_MIN_VAL + read_coeff(reader, &CAT2_PROB)
                        } else {
                            CAT1_MIN_VAL + read_coeff(reader, &CAT1_PROB)
                        };
                    }
                } else if reader.read_bool(p[1]) {
                    token_cache[pos] = 3;
                    val = 3 + reader.read_bool(p[2]) as i32;
                } else {
                    token_cache[pos] = 2;
                    val = 2;
                }
            }

            let v = (val * dqv) >> dq_shift;
            dqcoeff[pos] = if reader.read_bit() { -v } else { v };

            c += 1;
            ctx = coef_context(scan, &token_cache, c);
            dqv = dequant.ac as i32;
        }

        c
    }
}

/// Context from the two already decoded neighbours of scan position `c`
#[inline]
fn coef_context(scan: &ScanOrder, token_cache: &[u8; 1024], c: usize) -> usize {
    let (a, b) = scan.neighbors_of(c);
    (1 + token_cache[a] as usize + token_cache[b] as usize) >> 1
}

/// Read the extra bits of a category token, most significant first
#[inline]
fn read_coeff(reader: &mut RangeDecoder, probs: &[u8]) -> i32 {
    probs
        .iter()
        .fold(0i32, |val, &p| (val << 1) | reader.read_bool(p) as i32)
}
