//! VP9 Motion Vector Prediction
//!
//! Candidate vectors for a block come from, in order:
//! 1. Spatial neighbours using the same reference frame
//! 2. The collocated block of the previous frame
//! 3. Neighbours using a different reference, sign-inverted when the sign
//!    biases of the two references differ
//! 4. The previous frame's collocated vectors under the same rule
//!
//! At most two candidates are kept and the second is only searched for when
//! the block codes NEARMV.

use super::block::{BlockEdges, ModeInfo, ModeInfoGrid, MotionVectorMap, MvRef};
use super::tables::{
    MotionVector, PredictionMode, RefFrame, COMPANDED_MVREF_THRESH, COUNTER_TO_CONTEXT,
    IDX_N_COLUMN_TO_SUBBLOCK, MAX_MV_REF_CANDIDATES, MAX_REF_FRAMES, MODE_2_COUNTER, MVREF_NEIGHBOURS,
    MV_BORDER,
};
use super::tile::TileInfo;

/// Neighbour offsets for one block size, (row, col) in mi units
pub type MvRefSearch = [(i32, i32); MVREF_NEIGHBOURS];

/// Candidate list for one reference frame
pub type CandidateList = [MotionVector; MAX_MV_REF_CANDIDATES];

/// Whether a vector is small enough to keep 1/8 pel precision
#[inline]
pub fn use_mv_hp(mv: &MotionVector) -> bool {
    (mv.row as i32).abs() >> 3 < COMPANDED_MVREF_THRESH
        && (mv.col as i32).abs() >> 3 < COMPANDED_MVREF_THRESH
}

/// Round odd components towards zero when 1/8 pel is unavailable
pub fn lower_mv_precision(mv: &mut MotionVector, allow_hp: bool) {
    if allow_hp && use_mv_hp(mv) {
        return;
    }
    if mv.row & 1 != 0 {
        mv.row += if mv.row > 0 { -1 } else { 1 };
    }
    if mv.col & 1 != 0 {
        mv.col += if mv.col > 0 { -1 } else { 1 };
    }
}

/// Clamp a candidate to the frame area expanded by `MV_BORDER`
pub fn clamp_mv_ref(mv: &mut MotionVector, edges: &BlockEdges) {
    let clamp = |v: i16, low: i32, high: i32| -> i16 {
        let v = v as i32;
        (if v < low {
            low
        } else if v > high {
            high
        } else {
            v
        }) as i16
    };
    mv.col = clamp(mv.col, edges.to_left - MV_BORDER, edges.to_right + MV_BORDER);
    mv.row = clamp(mv.row, edges.to_top - MV_BORDER, edges.to_bottom + MV_BORDER);
}

/// Vector of `candidate` facing sub-block `block`, or its block vector
fn sub_block_mv(candidate: &ModeInfo, which: usize, search_col: i32, block: Option<usize>) -> MotionVector {
    match block {
        Some(block) if candidate.sb_type.is_sub8x8() => {
            candidate.bmi[IDX_N_COLUMN_TO_SUBBLOCK[block][(search_col == 0) as usize]].mv[which]
        }
        _ => candidate.mv[which],
    }
}

/// Candidate list under construction
struct Candidates {
    list: CandidateList,
    count: usize,
    early_break: bool,
}

impl Candidates {
    fn new(mode: PredictionMode) -> Self {
        Candidates {
            list: [MotionVector::zero(); MAX_MV_REF_CANDIDATES],
            count: 0,
            early_break: mode != PredictionMode::NearMv,
        }
    }

    /// Add a vector; returns true once the search can stop
    fn add(&mut self, mv: MotionVector) -> bool {
        if self.count > 0 {
            if mv != self.list[0] {
                self.list[self.count] = mv;
                self.count += 1;
                return true;
            }
            false
        } else {
            self.list[0] = mv;
            self.count = 1;
            self.early_break
        }
    }
}

/// Neighbourhood of the block whose vectors are being predicted
pub struct MvRefContext<'a> {
    /// Mode info decoded so far in this frame
    pub grid: &'a ModeInfoGrid,
    /// Vectors of the previous frame when usable
    pub prev_frame_mvs: Option<&'a MotionVectorMap>,
    pub sign_bias: &'a [bool; MAX_REF_FRAMES],
    pub tile: &'a TileInfo,
    pub mi_rows: usize,
    pub mi_row: usize,
    pub mi_col: usize,
    pub edges: BlockEdges,
}

impl<'a> MvRefContext<'a> {
    fn neighbour(&self, offset: (i32, i32)) -> Option<&'a ModeInfo> {
        if self.tile.is_inside(self.mi_row, self.mi_col, self.mi_rows, offset) {
            let row = (self.mi_row as i32 + offset.0) as usize;
            let col = (self.mi_col as i32 + offset.1) as usize;
            Some(self.grid.get(row, col))
        } else {
            None
        }
    }

    fn prev_frame(&self) -> Option<&'a MvRef> {
        self.prev_frame_mvs.map(|m| m.get(self.mi_row, self.mi_col))
    }

    fn scaled(&self, mv: MotionVector, from: RefFrame, to: RefFrame) -> MotionVector {
        if self.sign_bias[from.index()] != self.sign_bias[to.index()] {
            mv.inverted()
        } else {
            mv
        }
    }

    /// Inter mode context from the two nearest neighbours
    pub fn mode_context(&self, search: &MvRefSearch) -> usize {
        let counter: usize = search[..2]
            .iter()
            .filter_map(|&offset| self.neighbour(offset))
            .map(|candidate| MODE_2_COUNTER[candidate.mode as usize] as usize)
            .sum();
        COUNTER_TO_CONTEXT[counter] as usize
    }

    /// Collect up to two candidates for `ref_frame`
    ///
    /// `block` selects the sub-block whose neighbours are read for sub-8x8
    /// searches. Returns the clamped list and the number of valid entries.
    pub fn find_mv_refs(
        &self,
        mode: PredictionMode,
        ref_frame: RefFrame,
        search: &MvRefSearch,
        block: Option<usize>,
    ) -> (CandidateList, usize) {
        let mut candidates = Candidates::new(mode);
        if !self.search(&mut candidates, ref_frame, search, block) {
            // Missing entries stay zero
            candidates.count = if mode == PredictionMode::NearMv {
                MAX_MV_REF_CANDIDATES
            } else {
                1
            };
        }

        for mv in candidates.list[..candidates.count].iter_mut() {
            clamp_mv_ref(mv, &self.edges);
        }
        (candidates.list, candidates.count)
    }

    /// Run the search stages; returns true when a stage filled the list
    fn search(
        &self,
        candidates: &mut Candidates,
        ref_frame: RefFrame,
        search: &MvRefSearch,
        block: Option<usize>,
    ) -> bool {
        let mut different_ref_found = false;
        let mut start = 0;

        if block.is_some() {
            // The nearest two neighbours contribute the sub-block facing us
            for &offset in &search[..2] {
                if let Some(candidate) = self.neighbour(offset) {
                    different_ref_found = true;
                    if candidate.ref_frame[0] == ref_frame {
                        if candidates.add(sub_block_mv(candidate, 0, offset.1, block)) {
                            return true;
                        }
                    } else if candidate.ref_frame[1] == ref_frame
                        && candidates.add(sub_block_mv(candidate, 1, offset.1, block))
                    {
                        return true;
                    }
                }
            }
            start = 2;
        }

        for &offset in &search[start..] {
            if let Some(candidate) = self.neighbour(offset) {
                different_ref_found = true;
                if candidate.ref_frame[0] == ref_frame {
                    if candidates.add(candidate.mv[0]) {
                        return true;
                    }
                } else if candidate.ref_frame[1] == ref_frame && candidates.add(candidate.mv[1]) {
                    return true;
                }
            }
        }

        let prev = self.prev_frame();
        if let Some(prev) = prev {
            if prev.ref_frame[0] == ref_frame {
                if candidates.add(prev.mv[0]) {
                    return true;
                }
            } else if prev.ref_frame[1] == ref_frame && candidates.add(prev.mv[1]) {
                return true;
            }
        }

        if different_ref_found {
            for &offset in search.iter() {
                let Some(candidate) = self.neighbour(offset) else {
                    continue;
                };
                if !candidate.is_inter_block() {
                    continue;
                }
                if candidate.ref_frame[0] != ref_frame
                    && candidates.add(self.scaled(candidate.mv[0], candidate.ref_frame[0], ref_frame))
                {
                    return true;
                }
                if candidate.has_second_ref()
                    && candidate.ref_frame[1] != ref_frame
                    && candidate.mv[1] != candidate.mv[0]
                    && candidates.add(self.scaled(candidate.mv[1], candidate.ref_frame[1], ref_frame))
                {
                    return true;
                }
            }
        }

        if let Some(prev) = prev {
            if prev.ref_frame[0] != ref_frame
                && prev.ref_frame[0].is_inter()
                && candidates.add(self.scaled(prev.mv[0], prev.ref_frame[0], ref_frame))
            {
                return true;
            }
            if prev.ref_frame[1].is_inter()
                && prev.ref_frame[1] != ref_frame
                && prev.mv[1] != prev.mv[0]
                && candidates.add(self.scaled(prev.mv[1], prev.ref_frame[1], ref_frame))
            {
                return true;
            }
        }

        false
    }

    /// Best reference vector for the whole block
    ///
    /// Candidates drop to 1/4 pel unless high precision is allowed and
    /// the vector is small; the last valid candidate wins.
    pub fn best_ref_mv(
        &self,
        mode: PredictionMode,
        ref_frame: RefFrame,
        search: &MvRefSearch,
        allow_hp: bool,
    ) -> MotionVector {
        let (mut list, count) = self.find_mv_refs(mode, ref_frame, search, None);
        let mut best = MotionVector::zero();
        for mv in list[..count].iter_mut() {
            lower_mv_precision(mv, allow_hp);
            best = *mv;
        }
        best
    }

    /// NEARESTMV/NEARMV vector for sub-block `block` of a sub-8x8 block
    ///
    /// `mi` holds the sub-blocks already decoded; earlier sub-block vectors
    /// join the candidates and duplicates of them are skipped.
    pub fn append_sub8x8_mvs_for_idx(
        &self,
        mi: &ModeInfo,
        search: &MvRefSearch,
        b_mode: PredictionMode,
        block: usize,
        which: usize,
    ) -> MotionVector {
        let (list, count) = self.find_mv_refs(b_mode, mi.ref_frame[which], search, Some(block));
        let bmi = &mi.bmi;

        match block {
            0 => list[count - 1],
            1 | 2 => {
                if b_mode == PredictionMode::NearestMv {
                    bmi[0].mv[which]
                } else {
                    list[..count]
                        .iter()
                        .copied()
                        .find(|&mv| mv != bmi[0].mv[which])
                        .unwrap_or_default()
                }
            }
            _ => {
                if b_mode == PredictionMode::NearestMv {
                    bmi[2].mv[which]
                } else {
                    [bmi[1].mv[which], bmi[0].mv[which], list[0], list[1]]
                        .into_iter()
                        .find(|&mv| mv != bmi[2].mv[which])
                        .unwrap_or_default()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::vp9::tables::{BlockSize, MV_REF_BLOCKS};

    struct Fixture {
        grid: ModeInfoGrid,
        tile: TileInfo,
        sign_bias: [bool; MAX_REF_FRAMES],
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                grid: ModeInfoGrid::new(8, 8),
                tile: TileInfo::new(8, 8, 0, 0, 0, 0),
                sign_bias: [false; MAX_REF_FRAMES],
            }
        }

        fn inter(&mut self, row: usize, col: usize, ref_frame: RefFrame, mv: MotionVector) {
            *self.grid.get_mut(row, col) = ModeInfo {
                ref_frame: [ref_frame, RefFrame::None],
                mv: [mv, MotionVector::zero()],
                mode: PredictionMode::NewMv,
                ..Default::default()
            };
        }

        fn context<'a>(&'a self, prev: Option<&'a MotionVectorMap>, row: usize, col: usize) -> MvRefContext<'a> {
            MvRefContext {
                grid: &self.grid,
                prev_frame_mvs: prev,
                sign_bias: &self.sign_bias,
                tile: &self.tile,
                mi_rows: 8,
                mi_row: row,
                mi_col: col,
                edges: BlockEdges::new(row, col, 1, 1, 8, 8),
            }
        }
    }

    const SEARCH_8X8: &MvRefSearch = &MV_REF_BLOCKS[BlockSize::Block8x8 as usize];

    #[test]
    fn test_nearest_stops_at_first_match() {
        let mut f = Fixture::new();
        f.inter(3, 4, RefFrame::Last, MotionVector::new(4, 8));
        f.inter(4, 3, RefFrame::Last, MotionVector::new(-2, 6));

        let ctx = f.context(None, 4, 4);
        let (list, count) = ctx.find_mv_refs(PredictionMode::NearestMv, RefFrame::Last, SEARCH_8X8, None);
        assert_eq!(count, 1);
        assert_eq!(list[0], MotionVector::new(4, 8));
    }

    #[test]
    fn test_near_collects_two_distinct() {
        let mut f = Fixture::new();
        f.inter(3, 4, RefFrame::Last, MotionVector::new(4, 8));
        // Duplicate of the first candidate is skipped
        f.inter(4, 3, RefFrame::Last, MotionVector::new(4, 8));
        f.inter(3, 3, RefFrame::Last, MotionVector::new(-6, 2));

        let ctx = f.context(None, 4, 4);
        let (list, count) = ctx.find_mv_refs(PredictionMode::NearMv, RefFrame::Last, SEARCH_8X8, None);
        assert_eq!(count, 2);
        assert_eq!(list, [MotionVector::new(4, 8), MotionVector::new(-6, 2)]);
    }

    #[test]
    fn test_no_neighbours_gives_zero() {
        let f = Fixture::new();
        let ctx = f.context(None, 0, 0);
        let (list, count) = ctx.find_mv_refs(PredictionMode::NearMv, RefFrame::Golden, SEARCH_8X8, None);
        assert_eq!(count, 2);
        assert_eq!(list, [MotionVector::zero(); 2]);
    }

    #[test]
    fn test_different_ref_sign_inversion() {
        let mut f = Fixture::new();
        f.sign_bias[RefFrame::AltRef.index()] = true;
        f.inter(3, 4, RefFrame::AltRef, MotionVector::new(10, -12));

        let ctx = f.context(None, 4, 4);
        let (list, count) = ctx.find_mv_refs(PredictionMode::NearestMv, RefFrame::Last, SEARCH_8X8, None);
        assert_eq!(count, 1);
        assert_eq!(list[0], MotionVector::new(-10, 12));
    }

    #[test]
    fn test_previous_frame_candidate() {
        let f = Fixture::new();
        let mut prev = MotionVectorMap::new(8, 8);
        *prev.get_mut(4, 4) = MvRef {
            ref_frame: [RefFrame::Last, RefFrame::None],
            mv: [MotionVector::new(12, 14), MotionVector::zero()],
        };

        let ctx = f.context(Some(&prev), 4, 4);
        let (list, _) = ctx.find_mv_refs(PredictionMode::NearestMv, RefFrame::Last, SEARCH_8X8, None);
        assert_eq!(list[0], MotionVector::new(12, 14));
    }

    #[test]
    fn test_candidates_clamped_to_border() {
        let mut f = Fixture::new();
        f.inter(0, 1, RefFrame::Last, MotionVector::new(-4000, -4000));
        let ctx = f.context(None, 1, 1);
        let (list, _) = ctx.find_mv_refs(PredictionMode::NearestMv, RefFrame::Last, SEARCH_8X8, None);
        // One mi unit from the top-left corner: -64 - 128
        assert_eq!(list[0], MotionVector::new(-192, -192));
    }

    #[test]
    fn test_tile_boundary_hides_neighbours() {
        let mut f = Fixture::new();
        f.tile = TileInfo {
            mi_row_start: 0,
            mi_row_end: 8,
            mi_col_start: 4,
            mi_col_end: 8,
        };
        f.inter(4, 3, RefFrame::Last, MotionVector::new(8, 8));
        let ctx = f.context(None, 4, 4);
        let (list, _) = ctx.find_mv_refs(PredictionMode::NearestMv, RefFrame::Last, SEARCH_8X8, None);
        assert_eq!(list[0], MotionVector::zero());
    }

    #[test]
    fn test_lower_precision() {
        let mut mv = MotionVector::new(3, -5);
        lower_mv_precision(&mut mv, true);
        assert_eq!(mv, MotionVector::new(3, -5));

        lower_mv_precision(&mut mv, false);
        assert_eq!(mv, MotionVector::new(2, -4));

        let mut big = MotionVector::new(129, 1);
        lower_mv_precision(&mut big, true);
        assert_eq!(big, MotionVector::new(128, 0));
    }

    #[test]
    fn test_mode_context() {
        let mut f = Fixture::new();
        let ctx = f.context(None, 0, 0);
        // No neighbours available
        assert_eq!(ctx.mode_context(SEARCH_8X8), 2);

        f.inter(3, 4, RefFrame::Last, MotionVector::zero());
        f.grid.get_mut(3, 4).mode = PredictionMode::ZeroMv;
        f.inter(4, 3, RefFrame::Last, MotionVector::zero());
        f.grid.get_mut(4, 3).mode = PredictionMode::ZeroMv;
        let ctx = f.context(None, 4, 4);
        // Two ZEROMV neighbours: counter 6
        assert_eq!(ctx.mode_context(SEARCH_8X8), 0);
    }

    #[test]
    fn test_sub8x8_append_skips_previous() {
        let mut f = Fixture::new();
        f.inter(3, 4, RefFrame::Last, MotionVector::new(2, 2));
        f.inter(4, 3, RefFrame::Last, MotionVector::new(6, 6));
        let ctx = f.context(None, 4, 4);

        let mut mi = ModeInfo {
            sb_type: BlockSize::Block4x4,
            ref_frame: [RefFrame::Last, RefFrame::None],
            ..Default::default()
        };
        let search = &MV_REF_BLOCKS[BlockSize::Block4x4 as usize];
        let first = ctx.append_sub8x8_mvs_for_idx(&mi, search, PredictionMode::NearestMv, 0, 0);
        assert_eq!(first, MotionVector::new(2, 2));

        mi.bmi[0].mv[0] = first;
        let near = ctx.append_sub8x8_mvs_for_idx(&mi, search, PredictionMode::NearMv, 1, 0);
        assert_eq!(near, MotionVector::new(6, 6));
        let nearest = ctx.append_sub8x8_mvs_for_idx(&mi, search, PredictionMode::NearestMv, 1, 0);
        assert_eq!(nearest, first);
    }
}
