//! Probability contexts from the above and left blocks
//!
//! The above block is available from the second mi row of the frame on; the
//! left block only inside the current tile column.

use super::block::ModeInfo;
use super::tables::{BlockSize, RefFrame, SWITCHABLE_FILTERS};

/// The already decoded blocks above and to the left of the current one
#[derive(Debug, Clone, Copy, Default)]
pub struct Neighbours<'a> {
    pub above: Option<&'a ModeInfo>,
    pub left: Option<&'a ModeInfo>,
}

impl<'a> Neighbours<'a> {
    pub fn new(above: Option<&'a ModeInfo>, left: Option<&'a ModeInfo>) -> Self {
        Neighbours { above, left }
    }

    pub fn skip_context(&self) -> usize {
        self.above.map_or(0, |m| m.skip as usize) + self.left.map_or(0, |m| m.skip as usize)
    }

    pub fn seg_id_predicted_context(&self) -> usize {
        self.above.map_or(0, |m| m.seg_id_predicted as usize)
            + self.left.map_or(0, |m| m.seg_id_predicted as usize)
    }

    /// Whether the neighbours' transform sizes exceed the block maximum
    pub fn tx_size_context(&self, block_size: BlockSize) -> usize {
        let max_tx = block_size.max_tx_size() as usize;
        let tx_of = |m: Option<&ModeInfo>| match m {
            Some(m) if !m.skip => m.tx_size as usize,
            _ => max_tx,
        };
        let mut above_ctx = tx_of(self.above);
        let mut left_ctx = tx_of(self.left);
        if self.left.is_none() {
            left_ctx = above_ctx;
        }
        if self.above.is_none() {
            above_ctx = left_ctx;
        }
        (above_ctx + left_ctx > max_tx) as usize
    }

    pub fn intra_inter_context(&self) -> usize {
        match (self.above, self.left) {
            (Some(a), Some(l)) => {
                let above_intra = !a.is_inter_block();
                let left_intra = !l.is_inter_block();
                if above_intra && left_intra {
                    3
                } else {
                    (above_intra || left_intra) as usize
                }
            }
            (Some(m), None) | (None, Some(m)) => 2 * !m.is_inter_block() as usize,
            (None, None) => 0,
        }
    }

    /// Filter context; intra neighbours count as "no filter"
    pub fn switchable_interp_context(&self) -> usize {
        let filter_of = |m: Option<&ModeInfo>| match m {
            Some(m) if m.is_inter_block() => m.interp_filter as usize,
            _ => SWITCHABLE_FILTERS,
        };
        let left_type = filter_of(self.left);
        let above_type = filter_of(self.above);
        if left_type == above_type {
            left_type
        } else if left_type == SWITCHABLE_FILTERS {
            above_type
        } else if above_type == SWITCHABLE_FILTERS {
            left_type
        } else {
            SWITCHABLE_FILTERS
        }
    }

    /// Context of the single/compound choice
    pub fn reference_mode_context(&self, fixed_ref: RefFrame) -> usize {
        match (self.above, self.left) {
            (Some(a), Some(l)) => {
                if !a.has_second_ref() && !l.has_second_ref() {
                    ((a.ref_frame[0] == fixed_ref) ^ (l.ref_frame[0] == fixed_ref)) as usize
                } else if !a.has_second_ref() {
                    2 + (a.ref_frame[0] == fixed_ref || !a.is_inter_block()) as usize
                } else if !l.has_second_ref() {
                    2 + (l.ref_frame[0] == fixed_ref || !l.is_inter_block()) as usize
                } else {
                    4
                }
            }
            (Some(m), None) | (None, Some(m)) => {
                if !m.has_second_ref() {
                    (m.ref_frame[0] == fixed_ref) as usize
                } else {
                    3
                }
            }
            (None, None) => 1,
        }
    }

    /// Context of the compound variable reference bit
    pub fn comp_ref_context(&self, fixed_ref: RefFrame, var_ref: [RefFrame; 2], var_ref_idx: usize) -> usize {
        match (self.above, self.left) {
            (Some(a), Some(l)) => {
                let above_intra = !a.is_inter_block();
                let left_intra = !l.is_inter_block();
                if above_intra && left_intra {
                    2
                } else if above_intra || left_intra {
                    let edge = if above_intra { l } else { a };
                    if !edge.has_second_ref() {
                        1 + 2 * (edge.ref_frame[0] != var_ref[1]) as usize
                    } else {
                        1 + 2 * (edge.ref_frame[var_ref_idx] != var_ref[1]) as usize
                    }
                } else {
                    let l_sg = !l.has_second_ref();
                    let a_sg = !a.has_second_ref();
                    let vrfa = if a_sg { a.ref_frame[0] } else { a.ref_frame[var_ref_idx] };
                    let vrfl = if l_sg { l.ref_frame[0] } else { l.ref_frame[var_ref_idx] };

                    if vrfa == vrfl && var_ref[1] == vrfa {
                        0
                    } else if l_sg && a_sg {
                        if (vrfa == fixed_ref && vrfl == var_ref[0])
                            || (vrfl == fixed_ref && vrfa == var_ref[0])
                        {
                            4
                        } else if vrfa == vrfl {
                            3
                        } else {
                            1
                        }
                    } else if l_sg || a_sg {
                        let vrfc = if l_sg { vrfa } else { vrfl };
                        let rfs = if a_sg { vrfa } else { vrfl };
                        if vrfc == var_ref[1] && rfs != var_ref[1] {
                            1
                        } else if rfs == var_ref[1] && vrfc != var_ref[1] {
                            2
                        } else {
                            4
                        }
                    } else if vrfa == vrfl {
                        4
                    } else {
                        2
                    }
                }
            }
            (Some(m), None) | (None, Some(m)) => {
                if !m.is_inter_block() {
                    2
                } else if m.has_second_ref() {
                    4 * (m.ref_frame[var_ref_idx] != var_ref[1]) as usize
                } else {
                    3 * (m.ref_frame[0] != var_ref[1]) as usize
                }
            }
            (None, None) => 2,
        }
    }

    /// Context of the LAST vs GOLDEN/ALTREF bit
    pub fn single_ref_p1_context(&self) -> usize {
        let last = RefFrame::Last;
        match (self.above, self.left) {
            (Some(a), Some(l)) => {
                let above_intra = !a.is_inter_block();
                let left_intra = !l.is_inter_block();
                if above_intra && left_intra {
                    2
                } else if above_intra || left_intra {
                    let edge = if above_intra { l } else { a };
                    if !edge.has_second_ref() {
                        4 * (edge.ref_frame[0] == last) as usize
                    } else {
                        1 + (edge.ref_frame[0] == last || edge.ref_frame[1] == last) as usize
                    }
                } else {
                    let above_second = a.has_second_ref();
                    let left_second = l.has_second_ref();
                    let [above0, above1] = a.ref_frame;
                    let [left0, left1] = l.ref_frame;
                    if above_second && left_second {
                        1 + (above0 == last || above1 == last || left0 == last || left1 == last) as usize
                    } else if above_second || left_second {
                        let rfs = if !above_second { above0 } else { left0 };
                        let crf1 = if above_second { above0 } else { left0 };
                        let crf2 = if above_second { above1 } else { left1 };
                        if rfs == last {
                            3 + (crf1 == last || crf2 == last) as usize
                        } else {
                            (crf1 == last || crf2 == last) as usize
                        }
                    } else {
                        2 * (above0 == last) as usize + 2 * (left0 == last) as usize
                    }
                }
            }
            (Some(m), None) | (None, Some(m)) => {
                if !m.is_inter_block() {
                    2
                } else if !m.has_second_ref() {
                    4 * (m.ref_frame[0] == last) as usize
                } else {
                    1 + (m.ref_frame[0] == last || m.ref_frame[1] == last) as usize
                }
            }
            (None, None) => 2,
        }
    }

    /// Context of the GOLDEN vs ALTREF bit
    pub fn single_ref_p2_context(&self) -> usize {
        let last = RefFrame::Last;
        let golden = RefFrame::Golden;
        match (self.above, self.left) {
            (Some(a), Some(l)) => {
                let above_intra = !a.is_inter_block();
                let left_intra = !l.is_inter_block();
                if above_intra && left_intra {
                    2
                } else if above_intra || left_intra {
                    let edge = if above_intra { l } else { a };
                    if !edge.has_second_ref() {
                        if edge.ref_frame[0] == last {
                            3
                        } else {
                            4 * (edge.ref_frame[0] == golden) as usize
                        }
                    } else {
                        1 + 2 * (edge.ref_frame[0] == golden || edge.ref_frame[1] == golden) as usize
                    }
                } else {
                    let above_second = a.has_second_ref();
                    let left_second = l.has_second_ref();
                    let [above0, above1] = a.ref_frame;
                    let [left0, left1] = l.ref_frame;
                    if above_second && left_second {
                        if above0 == left0 && above1 == left1 {
                            3 * (above0 == golden
                                || above1 == golden
                                || left0 == golden
                                || left1 == golden) as usize
                        } else {
                            2
                        }
                    } else if above_second || left_second {
                        let rfs = if !above_second { above0 } else { left0 };
                        let crf1 = if above_second { above0 } else { left0 };
                        let crf2 = if above_second { above1 } else { left1 };
                        let crf_golden = (crf1 == golden || crf2 == golden) as usize;
                        if rfs == golden {
                            3 + crf_golden
                        } else if rfs == RefFrame::AltRef {
                            crf_golden
                        } else {
                            1 + 2 * crf_golden
                        }
                    } else if above0 == last && left0 == last {
                        3
                    } else if above0 == last || left0 == last {
                        let edge0 = if above0 == last { left0 } else { above0 };
                        4 * (edge0 == golden) as usize
                    } else {
                        2 * (above0 == golden) as usize + 2 * (left0 == golden) as usize
                    }
                }
            }
            (Some(m), None) | (None, Some(m)) => {
                if !m.is_inter_block() || (m.ref_frame[0] == last && !m.has_second_ref()) {
                    2
                } else if !m.has_second_ref() {
                    4 * (m.ref_frame[0] == golden) as usize
                } else {
                    3 * (m.ref_frame[0] == golden || m.ref_frame[1] == golden) as usize
                }
            }
            (None, None) => 2,
        }
    }
}
