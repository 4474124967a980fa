//! Symbol frequency counts
//!
//! Every tile worker owns a private `FrameCounts`. After all tiles of a frame
//! are decoded the orchestrator folds them into one table with plain
//! element-wise addition; backward adaptation consumes the result.

use super::tables::{
    BLOCK_SIZE_GROUPS, COEFF_CONTEXTS, COEF_BANDS, INTER_MODES, INTER_MODE_CONTEXTS, INTRA_MODES,
    MV_CLASSES, MV_CLASS0_SIZE, MV_FP_SIZE, MV_JOINTS, MV_OFFSET_BITS, PARTITION_CONTEXTS,
    PARTITION_TYPES, PLANE_TYPES, REF_TYPES, SWITCHABLE_FILTERS, SWITCHABLE_FILTER_CONTEXTS,
    TX_SIZES, TX_SIZE_CONTEXTS, UNCONSTRAINED_NODES,
};

/// Element-wise addition over nested count arrays
pub trait Accumulate {
    fn accumulate(&mut self, other: &Self);
}

impl Accumulate for u32 {
    #[inline]
    fn accumulate(&mut self, other: &Self) {
        *self = self.wrapping_add(*other);
    }
}

impl<T: Accumulate, const N: usize> Accumulate for [T; N] {
    fn accumulate(&mut self, other: &Self) {
        for (dst, src) in self.iter_mut().zip(other.iter()) {
            dst.accumulate(src);
        }
    }
}

/// Coefficient token counts
/// Indexed by [tx_size][plane_type][ref_type][band][context][token]
pub type CoefCounts = [[[[[[u32; UNCONSTRAINED_NODES + 1]; COEFF_CONTEXTS]; COEF_BANDS];
    REF_TYPES]; PLANE_TYPES]; TX_SIZES];

/// Counts of "more coefficients" checks
/// Indexed by [tx_size][plane_type][ref_type][band][context]
pub type EobBranchCounts =
    [[[[[u32; COEFF_CONTEXTS]; COEF_BANDS]; REF_TYPES]; PLANE_TYPES]; TX_SIZES];

/// Transform size counts, one table per largest allowed size
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxCounts {
    pub p8x8: [[u32; 2]; TX_SIZE_CONTEXTS],
    pub p16x16: [[u32; 3]; TX_SIZE_CONTEXTS],
    pub p32x32: [[u32; 4]; TX_SIZE_CONTEXTS],
}

impl TxCounts {
    /// Record a transform size chosen under `max_tx`
    pub fn record(&mut self, max_tx: usize, ctx: usize, tx_size: usize) {
        match max_tx {
            1 => self.p8x8[ctx][tx_size] += 1,
            2 => self.p16x16[ctx][tx_size] += 1,
            _ => self.p32x32[ctx][tx_size] += 1,
        }
    }
}

impl Accumulate for TxCounts {
    fn accumulate(&mut self, other: &Self) {
        self.p8x8.accumulate(&other.p8x8);
        self.p16x16.accumulate(&other.p16x16);
        self.p32x32.accumulate(&other.p32x32);
    }
}

/// Counts for one motion vector component
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MvComponentCounts {
    pub sign: [u32; 2],
    pub classes: [u32; MV_CLASSES],
    pub class0: [u32; MV_CLASS0_SIZE],
    pub bits: [[u32; 2]; MV_OFFSET_BITS],
    pub class0_fp: [[u32; MV_FP_SIZE]; MV_CLASS0_SIZE],
    pub fp: [u32; MV_FP_SIZE],
    pub class0_hp: [u32; 2],
    pub hp: [u32; 2],
}

impl Accumulate for MvComponentCounts {
    fn accumulate(&mut self, other: &Self) {
        self.sign.accumulate(&other.sign);
        self.classes.accumulate(&other.classes);
        self.class0.accumulate(&other.class0);
        self.bits.accumulate(&other.bits);
        self.class0_fp.accumulate(&other.class0_fp);
        self.fp.accumulate(&other.fp);
        self.class0_hp.accumulate(&other.class0_hp);
        self.hp.accumulate(&other.hp);
    }
}

/// Motion vector counts; component 0 is vertical
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MvCounts {
    pub joints: [u32; MV_JOINTS],
    pub comps: [MvComponentCounts; 2],
}

impl Accumulate for MvCounts {
    fn accumulate(&mut self, other: &Self) {
        self.joints.accumulate(&other.joints);
        for (dst, src) in self.comps.iter_mut().zip(other.comps.iter()) {
            dst.accumulate(src);
        }
    }
}

/// Per-frame symbol frequency table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameCounts {
    pub y_mode: [[u32; INTRA_MODES]; BLOCK_SIZE_GROUPS],
    pub uv_mode: [[u32; INTRA_MODES]; INTRA_MODES],
    pub partition: [[u32; PARTITION_TYPES]; PARTITION_CONTEXTS],
    pub coef: CoefCounts,
    pub eob_branch: EobBranchCounts,
    pub switchable_interp: [[u32; SWITCHABLE_FILTERS]; SWITCHABLE_FILTER_CONTEXTS],
    pub inter_mode: [[u32; INTER_MODES]; INTER_MODE_CONTEXTS],
    pub intra_inter: [[u32; 2]; 4],
    pub comp_inter: [[u32; 2]; 5],
    pub single_ref: [[[u32; 2]; 2]; 5],
    pub comp_ref: [[u32; 2]; 5],
    pub tx: TxCounts,
    pub skip: [[u32; 2]; 3],
    pub mv: MvCounts,
}

impl FrameCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Add another table into this one
    pub fn accumulate(&mut self, other: &FrameCounts) {
        self.y_mode.accumulate(&other.y_mode);
        self.uv_mode.accumulate(&other.uv_mode);
        self.partition.accumulate(&other.partition);
        self.coef.accumulate(&other.coef);
        self.eob_branch.accumulate(&other.eob_branch);
        self.switchable_interp.accumulate(&other.switchable_interp);
        self.inter_mode.accumulate(&other.inter_mode);
        self.intra_inter.accumulate(&other.intra_inter);
        self.comp_inter.accumulate(&other.comp_inter);
        self.single_ref.accumulate(&other.single_ref);
        self.comp_ref.accumulate(&other.comp_ref);
        Accumulate::accumulate(&mut self.tx, &other.tx);
        self.skip.accumulate(&other.skip);
        Accumulate::accumulate(&mut self.mv, &other.mv);
    }

    /// Total number of skip flags recorded with the given value
    pub fn skip_total(&self, skip: bool) -> u32 {
        self.skip.iter().map(|c| c[skip as usize]).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulate_adds_elementwise() {
        let mut a = FrameCounts::new();
        let mut b = FrameCounts::new();
        a.skip[0][1] = 3;
        b.skip[0][1] = 4;
        b.coef[3][1][1][5][5][3] = 7;
        b.mv.comps[1].bits[9][1] = 2;
        b.tx.record(3, 1, 2);

        a.accumulate(&b);
        assert_eq!(a.skip[0][1], 7);
        assert_eq!(a.coef[3][1][1][5][5][3], 7);
        assert_eq!(a.mv.comps[1].bits[9][1], 2);
        assert_eq!(a.tx.p32x32[1][2], 1);
    }

    #[test]
    fn test_accumulate_is_order_independent() {
        let mut x = FrameCounts::new();
        x.y_mode[2][4] = 5;
        x.partition[15][3] = 1;
        let mut y = FrameCounts::new();
        y.y_mode[2][4] = 1;
        y.inter_mode[6][2] = 9;

        let mut xy = x.clone();
        xy.accumulate(&y);
        let mut yx = y.clone();
        yx.accumulate(&x);
        assert_eq!(xy, yx);
    }

    #[test]
    fn test_skip_total() {
        let mut counts = FrameCounts::new();
        counts.skip[0][1] = 2;
        counts.skip[2][1] = 5;
        counts.skip[1][0] = 9;
        assert_eq!(counts.skip_total(true), 7);
        counts.clear();
        assert_eq!(counts.skip_total(false), 0);
    }
}
