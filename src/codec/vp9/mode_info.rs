//! VP9 Mode Info Decoding
//!
//! Reads the per-block syntax that precedes the residual:
//! - Segment id, skip flag and transform size
//! - Intra modes (per 4x4 sub-block for sub-8x8 blocks)
//! - Reference frames, inter modes, interpolation filter and motion vectors
//!
//! Key frames and intra-only frames use fixed mode probabilities keyed by
//! the above and left modes and record no mode counts.

use crate::error::{Error, Result};

use super::block::{BlockEdges, ModeInfo, ModeInfoGrid, MotionVectorMap, SegmentationMap};
use super::counts::{FrameCounts, MvComponentCounts};
use super::frame::{FrameHeader, SegLevelFeature};
use super::mvref::{use_mv_hp, MvRefContext};
use super::pred_context::Neighbours;
use super::probs::{FrameContext, MvComponentProbs};
use super::range_coder::RangeDecoder;
use super::tables::{
    BlockSize, InterpFilter, MotionVector, PredictionMode, RefFrame, ReferenceMode, TxMode, TxSize,
    INTER_MODE_TREE, INTRA_MODE_TREE, MV_CLASS0_SIZE, MV_CLASS_TREE, MV_FP_TREE,
    MV_JOINT_HNZVNZ, MV_JOINT_HNZVZ, MV_JOINT_HZVNZ, MV_JOINT_TREE, MV_LOW, MV_REF_BLOCKS,
    MV_UPP, SEGMENT_TREE, SWITCHABLE_INTERP_TREE,
};
use super::tile::TileInfo;

/// Where a block sits and what it may look at
#[derive(Debug, Clone, Copy)]
pub struct BlockPosition<'g> {
    /// Mode info decoded so far in this frame
    pub grid: &'g ModeInfoGrid,
    pub tile: &'g TileInfo,
    pub mi_row: usize,
    pub mi_col: usize,
    /// Covered mi units inside the frame
    pub x_mis: usize,
    pub y_mis: usize,
    pub edges: BlockEdges,
}

impl<'g> BlockPosition<'g> {
    /// Above and left blocks available for context derivation
    pub fn neighbours(&self) -> Neighbours<'g> {
        let above = (self.mi_row > 0).then(|| self.grid.get(self.mi_row - 1, self.mi_col));
        let left = (self.mi_col > self.tile.mi_col_start).then(|| self.grid.get(self.mi_row, self.mi_col - 1));
        Neighbours::new(above, left)
    }
}

/// Frame-wide inputs of mode info decoding
pub struct ModeInfoReader<'a> {
    header: &'a FrameHeader,
    fc: &'a FrameContext,
    prev_segment_ids: Option<&'a SegmentationMap>,
    prev_frame_mvs: Option<&'a MotionVectorMap>,
    comp_fixed_ref: RefFrame,
    comp_var_ref: [RefFrame; 2],
}

impl<'a> ModeInfoReader<'a> {
    pub fn new(
        header: &'a FrameHeader,
        fc: &'a FrameContext,
        prev_segment_ids: Option<&'a SegmentationMap>,
        prev_frame_mvs: Option<&'a MotionVectorMap>,
    ) -> Self {
        let (comp_fixed_ref, comp_var_ref) = header.compound_refs();
        ModeInfoReader {
            header,
            fc,
            prev_segment_ids,
            prev_frame_mvs: prev_frame_mvs.filter(|_| header.use_prev_frame_mvs),
            comp_fixed_ref,
            comp_var_ref,
        }
    }

    /// Decode the mode info of one block into `mi`
    ///
    /// `mi.sb_type` must already be set. Returns false when a decoded
    /// motion vector is out of range, which marks the tile corrupted.
    pub fn read_mode_info(
        &self,
        r: &mut RangeDecoder,
        counts: Option<&mut FrameCounts>,
        pos: &BlockPosition,
        seg_map: &mut SegmentationMap,
        mi: &mut ModeInfo,
    ) -> Result<bool> {
        if self.header.is_intra_only() {
            self.read_intra_frame_mode_info(r, counts, pos, seg_map, mi);
            Ok(true)
        } else {
            self.read_inter_frame_mode_info(r, counts, pos, seg_map, mi)
        }
    }

    fn read_intra_frame_mode_info(
        &self,
        r: &mut RangeDecoder,
        mut counts: Option<&mut FrameCounts>,
        pos: &BlockPosition,
        seg_map: &mut SegmentationMap,
        mi: &mut ModeInfo,
    ) {
        let neighbours = pos.neighbours();

        mi.segment_id = self.read_intra_segment_id(r, pos, seg_map);
        mi.skip = self.read_skip(r, counts.as_deref_mut(), &neighbours, mi.segment_id);
        mi.tx_size = self.read_tx_size(r, counts.as_deref_mut(), &neighbours, mi.sb_type, true);
        mi.ref_frame = [RefFrame::Intra, RefFrame::None];

        let mut read_kf_mode = |mi: &ModeInfo, block: usize| -> PredictionMode {
            let above = above_block_mode(mi, neighbours.above, block);
            let left = left_block_mode(mi, neighbours.left, block);
            read_intra_mode(r, &self.fc.kf_y_mode_probs[above as usize][left as usize])
        };

        match mi.sb_type {
            BlockSize::Block4x4 => {
                for i in 0..4 {
                    mi.bmi[i].mode = read_kf_mode(mi, i);
                }
                mi.mode = mi.bmi[3].mode;
            }
            BlockSize::Block4x8 => {
                let mode = read_kf_mode(mi, 0);
                mi.bmi[0].mode = mode;
                mi.bmi[2].mode = mode;
                let mode = read_kf_mode(mi, 1);
                mi.bmi[1].mode = mode;
                mi.bmi[3].mode = mode;
                mi.mode = mode;
            }
            BlockSize::Block8x4 => {
                let mode = read_kf_mode(mi, 0);
                mi.bmi[0].mode = mode;
                mi.bmi[1].mode = mode;
                let mode = read_kf_mode(mi, 2);
                mi.bmi[2].mode = mode;
                mi.bmi[3].mode = mode;
                mi.mode = mode;
            }
            _ => mi.mode = read_kf_mode(mi, 0),
        }

        mi.uv_mode = read_intra_mode(r, &self.fc.kf_uv_mode_probs[mi.mode as usize]);
    }

    fn read_inter_frame_mode_info(
        &self,
        r: &mut RangeDecoder,
        mut counts: Option<&mut FrameCounts>,
        pos: &BlockPosition,
        seg_map: &mut SegmentationMap,
        mi: &mut ModeInfo,
    ) -> Result<bool> {
        let neighbours = pos.neighbours();

        mi.segment_id = self.read_inter_segment_id(r, pos, &neighbours, seg_map, mi);
        mi.skip = self.read_skip(r, counts.as_deref_mut(), &neighbours, mi.segment_id);
        let is_inter = self.read_is_inter_block(r, counts.as_deref_mut(), &neighbours, mi.segment_id);
        mi.tx_size = self.read_tx_size(
            r,
            counts.as_deref_mut(),
            &neighbours,
            mi.sb_type,
            !mi.skip || !is_inter,
        );

        if is_inter {
            self.read_inter_block_mode_info(r, counts, pos, &neighbours, mi)
        } else {
            self.read_intra_block_mode_info(r, counts, mi);
            Ok(true)
        }
    }

    // =========================================================================
    // Segment ids, skip, transform size
    // =========================================================================

    fn predicted_segment_id(&self, pos: &BlockPosition) -> u8 {
        self.prev_segment_ids
            .map_or(0, |prev| prev.min_in_block(pos.mi_row, pos.mi_col, pos.x_mis, pos.y_mis))
    }

    fn copy_segment_ids(&self, pos: &BlockPosition, seg_map: &mut SegmentationMap) {
        match self.prev_segment_ids {
            Some(prev) => seg_map.copy_block(prev, pos.mi_row, pos.mi_col, pos.x_mis, pos.y_mis),
            None => seg_map.set_block(pos.mi_row, pos.mi_col, pos.x_mis, pos.y_mis, 0),
        }
    }

    fn read_intra_segment_id(&self, r: &mut RangeDecoder, pos: &BlockPosition, seg_map: &mut SegmentationMap) -> u8 {
        let seg = &self.header.segmentation;
        if !seg.enabled {
            return 0;
        }
        if !seg.update_map {
            self.copy_segment_ids(pos, seg_map);
            return 0;
        }

        let segment_id = r.read_tree(&SEGMENT_TREE, &self.fc.seg_tree_probs);
        seg_map.set_block(pos.mi_row, pos.mi_col, pos.x_mis, pos.y_mis, segment_id);
        segment_id
    }

    fn read_inter_segment_id(
        &self,
        r: &mut RangeDecoder,
        pos: &BlockPosition,
        neighbours: &Neighbours,
        seg_map: &mut SegmentationMap,
        mi: &mut ModeInfo,
    ) -> u8 {
        let seg = &self.header.segmentation;
        if !seg.enabled {
            return 0;
        }

        let predicted = self.predicted_segment_id(pos);
        if !seg.update_map {
            self.copy_segment_ids(pos, seg_map);
            return predicted;
        }

        let segment_id = if seg.temporal_update {
            let prob = self.fc.seg_pred_probs[neighbours.seg_id_predicted_context()];
            mi.seg_id_predicted = r.read_bool(prob);
            if mi.seg_id_predicted {
                predicted
            } else {
                r.read_tree(&SEGMENT_TREE, &self.fc.seg_tree_probs)
            }
        } else {
            r.read_tree(&SEGMENT_TREE, &self.fc.seg_tree_probs)
        };
        seg_map.set_block(pos.mi_row, pos.mi_col, pos.x_mis, pos.y_mis, segment_id);
        segment_id
    }

    fn read_skip(
        &self,
        r: &mut RangeDecoder,
        counts: Option<&mut FrameCounts>,
        neighbours: &Neighbours,
        segment_id: u8,
    ) -> bool {
        if self
            .header
            .segmentation
            .feature_active(segment_id, SegLevelFeature::Skip)
        {
            return true;
        }

        let ctx = neighbours.skip_context();
        let skip = r.read_bool(self.fc.skip_probs[ctx]);
        if let Some(c) = counts {
            c.skip[ctx][skip as usize] += 1;
        }
        skip
    }

    fn read_tx_size(
        &self,
        r: &mut RangeDecoder,
        counts: Option<&mut FrameCounts>,
        neighbours: &Neighbours,
        bsize: BlockSize,
        allow_select: bool,
    ) -> TxSize {
        let tx_mode = self.header.tx_mode;
        let max_tx = bsize.max_tx_size();
        if !(allow_select && tx_mode == TxMode::TxModeSelect && !bsize.is_sub8x8()) {
            return max_tx.min(tx_mode.biggest_tx_size());
        }

        let ctx = neighbours.tx_size_context(bsize);
        let probs = self.fc.tx_probs.for_max_tx(max_tx as usize, ctx);
        let mut tx = r.read_bool(probs[0]) as u8;
        if tx != TxSize::Tx4x4 as u8 && max_tx >= TxSize::Tx16x16 {
            tx += r.read_bool(probs[1]) as u8;
            if tx != TxSize::Tx8x8 as u8 && max_tx >= TxSize::Tx32x32 {
                tx += r.read_bool(probs[2]) as u8;
            }
        }
        if let Some(c) = counts {
            c.tx.record(max_tx as usize, ctx, tx as usize);
        }
        TxSize::from_u8(tx)
    }

    // =========================================================================
    // Intra blocks of inter frames
    // =========================================================================

    fn read_intra_mode_y(&self, r: &mut RangeDecoder, counts: Option<&mut FrameCounts>, size_group: usize) -> PredictionMode {
        let mode = read_intra_mode(r, &self.fc.y_mode_probs[size_group]);
        if let Some(c) = counts {
            c.y_mode[size_group][mode as usize] += 1;
        }
        mode
    }

    fn read_intra_block_mode_info(&self, r: &mut RangeDecoder, mut counts: Option<&mut FrameCounts>, mi: &mut ModeInfo) {
        match mi.sb_type {
            BlockSize::Block4x4 => {
                for i in 0..4 {
                    mi.bmi[i].mode = self.read_intra_mode_y(r, counts.as_deref_mut(), 0);
                }
                mi.mode = mi.bmi[3].mode;
            }
            BlockSize::Block4x8 => {
                let mode = self.read_intra_mode_y(r, counts.as_deref_mut(), 0);
                mi.bmi[0].mode = mode;
                mi.bmi[2].mode = mode;
                let mode = self.read_intra_mode_y(r, counts.as_deref_mut(), 0);
                mi.bmi[1].mode = mode;
                mi.bmi[3].mode = mode;
                mi.mode = mode;
            }
            BlockSize::Block8x4 => {
                let mode = self.read_intra_mode_y(r, counts.as_deref_mut(), 0);
                mi.bmi[0].mode = mode;
                mi.bmi[1].mode = mode;
                let mode = self.read_intra_mode_y(r, counts.as_deref_mut(), 0);
                mi.bmi[2].mode = mode;
                mi.bmi[3].mode = mode;
                mi.mode = mode;
            }
            bsize => mi.mode = self.read_intra_mode_y(r, counts.as_deref_mut(), bsize.size_group()),
        }

        let uv_mode = read_intra_mode(r, &self.fc.uv_mode_probs[mi.mode as usize]);
        if let Some(c) = counts {
            c.uv_mode[mi.mode as usize][uv_mode as usize] += 1;
        }
        mi.uv_mode = uv_mode;
        mi.ref_frame = [RefFrame::Intra, RefFrame::None];
    }

    // =========================================================================
    // Inter blocks
    // =========================================================================

    fn read_is_inter_block(
        &self,
        r: &mut RangeDecoder,
        counts: Option<&mut FrameCounts>,
        neighbours: &Neighbours,
        segment_id: u8,
    ) -> bool {
        let seg = &self.header.segmentation;
        if seg.feature_active(segment_id, SegLevelFeature::RefFrame) {
            return seg.feature_data(segment_id, SegLevelFeature::RefFrame) != RefFrame::Intra as i16;
        }

        let ctx = neighbours.intra_inter_context();
        let is_inter = r.read_bool(self.fc.intra_inter_probs[ctx]);
        if let Some(c) = counts {
            c.intra_inter[ctx][is_inter as usize] += 1;
        }
        is_inter
    }

    fn read_block_reference_mode(
        &self,
        r: &mut RangeDecoder,
        counts: Option<&mut FrameCounts>,
        neighbours: &Neighbours,
    ) -> ReferenceMode {
        if self.header.reference_mode != ReferenceMode::Select {
            return self.header.reference_mode;
        }

        let ctx = neighbours.reference_mode_context(self.comp_fixed_ref);
        let compound = r.read_bool(self.fc.comp_inter_probs[ctx]);
        if let Some(c) = counts {
            c.comp_inter[ctx][compound as usize] += 1;
        }
        if compound {
            ReferenceMode::Compound
        } else {
            ReferenceMode::Single
        }
    }

    fn read_ref_frames(
        &self,
        r: &mut RangeDecoder,
        mut counts: Option<&mut FrameCounts>,
        neighbours: &Neighbours,
        segment_id: u8,
    ) -> [RefFrame; 2] {
        let seg = &self.header.segmentation;
        if seg.feature_active(segment_id, SegLevelFeature::RefFrame) {
            let data = seg.feature_data(segment_id, SegLevelFeature::RefFrame);
            return [RefFrame::from_index(data.max(0) as usize), RefFrame::None];
        }

        match self.read_block_reference_mode(r, counts.as_deref_mut(), neighbours) {
            ReferenceMode::Compound => {
                let fix_ref_idx = self.header.ref_frame_sign_bias[self.comp_fixed_ref.index()] as usize;
                let var_ref_idx = 1 - fix_ref_idx;
                let ctx = neighbours.comp_ref_context(self.comp_fixed_ref, self.comp_var_ref, var_ref_idx);
                let bit = r.read_bool(self.fc.comp_ref_probs[ctx]);
                if let Some(c) = counts {
                    c.comp_ref[ctx][bit as usize] += 1;
                }
                let mut refs = [RefFrame::None; 2];
                refs[fix_ref_idx] = self.comp_fixed_ref;
                refs[var_ref_idx] = self.comp_var_ref[bit as usize];
                refs
            }
            _ => {
                let ctx0 = neighbours.single_ref_p1_context();
                let bit0 = r.read_bool(self.fc.single_ref_probs[ctx0][0]);
                if let Some(c) = counts.as_deref_mut() {
                    c.single_ref[ctx0][0][bit0 as usize] += 1;
                }
                let ref_frame = if bit0 {
                    let ctx1 = neighbours.single_ref_p2_context();
                    let bit1 = r.read_bool(self.fc.single_ref_probs[ctx1][1]);
                    if let Some(c) = counts {
                        c.single_ref[ctx1][1][bit1 as usize] += 1;
                    }
                    if bit1 {
                        RefFrame::AltRef
                    } else {
                        RefFrame::Golden
                    }
                } else {
                    RefFrame::Last
                };
                [ref_frame, RefFrame::None]
            }
        }
    }

    fn read_inter_mode(&self, r: &mut RangeDecoder, counts: Option<&mut FrameCounts>, ctx: usize) -> PredictionMode {
        let offset = r.read_tree(&INTER_MODE_TREE, &self.fc.inter_mode_probs[ctx]);
        if let Some(c) = counts {
            c.inter_mode[ctx][offset as usize] += 1;
        }
        PredictionMode::from_inter_offset(offset)
    }

    fn read_switchable_interp_filter(
        &self,
        r: &mut RangeDecoder,
        counts: Option<&mut FrameCounts>,
        neighbours: &Neighbours,
    ) -> InterpFilter {
        let ctx = neighbours.switchable_interp_context();
        let filter = r.read_tree(&SWITCHABLE_INTERP_TREE, &self.fc.switchable_interp_probs[ctx]);
        if let Some(c) = counts {
            c.switchable_interp[ctx][filter as usize] += 1;
        }
        InterpFilter::from_u8(filter)
    }

    fn read_inter_block_mode_info(
        &self,
        r: &mut RangeDecoder,
        mut counts: Option<&mut FrameCounts>,
        pos: &BlockPosition,
        neighbours: &Neighbours,
        mi: &mut ModeInfo,
    ) -> Result<bool> {
        let bsize = mi.sb_type;
        let allow_hp = self.header.allow_high_precision_mv;
        let search = &MV_REF_BLOCKS[bsize as usize];
        let mvref = MvRefContext {
            grid: pos.grid,
            prev_frame_mvs: self.prev_frame_mvs,
            sign_bias: &self.header.ref_frame_sign_bias,
            tile: pos.tile,
            mi_rows: pos.grid.rows(),
            mi_row: pos.mi_row,
            mi_col: pos.mi_col,
            edges: pos.edges,
        };

        mi.ref_frame = self.read_ref_frames(r, counts.as_deref_mut(), neighbours, mi.segment_id);
        let is_compound = mi.has_second_ref();
        let num_refs = 1 + is_compound as usize;
        let inter_mode_ctx = mvref.mode_context(search);
        let mut best_ref_mvs = [MotionVector::zero(); 2];

        if self
            .header
            .segmentation
            .feature_active(mi.segment_id, SegLevelFeature::Skip)
        {
            mi.mode = PredictionMode::ZeroMv;
            if bsize.is_sub8x8() {
                return Err(Error::unsupported_bitstream(
                    "Invalid usage of segement feature on small blocks",
                ));
            }
        } else {
            mi.mode = if bsize.is_sub8x8() {
                // Sub-blocks reference the nearest vector; the final mode is
                // the one of the last sub-block
                PredictionMode::NearestMv
            } else {
                self.read_inter_mode(r, counts.as_deref_mut(), inter_mode_ctx)
            };

            if mi.mode != PredictionMode::ZeroMv {
                for (i, best) in best_ref_mvs.iter_mut().enumerate().take(num_refs) {
                    *best = mvref.best_ref_mv(mi.mode, mi.ref_frame[i], search, allow_hp);
                }
            }
        }

        mi.interp_filter = if self.header.interp_filter == InterpFilter::Switchable {
            self.read_switchable_interp_filter(r, counts.as_deref_mut(), neighbours)
        } else {
            self.header.interp_filter
        };

        if !bsize.is_sub8x8() {
            let mode = mi.mode;
            return Ok(self.assign_mv(r, counts, mode, &mut mi.mv, &best_ref_mvs, &best_ref_mvs, num_refs, allow_hp));
        }

        let num_4x4_w = bsize.num_4x4_wide();
        let num_4x4_h = bsize.num_4x4_high();
        let mut valid = true;
        let mut b_mode = PredictionMode::NearestMv;
        let mut best_sub8x8 = [MotionVector::zero(); 2];

        for idy in (0..2).step_by(num_4x4_h) {
            for idx in (0..2).step_by(num_4x4_w) {
                let j = idy * 2 + idx;
                b_mode = self.read_inter_mode(r, counts.as_deref_mut(), inter_mode_ctx);

                if b_mode == PredictionMode::NearestMv || b_mode == PredictionMode::NearMv {
                    for (i, best) in best_sub8x8.iter_mut().enumerate().take(num_refs) {
                        *best = mvref.append_sub8x8_mvs_for_idx(mi, search, b_mode, j, i);
                    }
                }

                let mut mv = mi.bmi[j].mv;
                let ok = self.assign_mv(
                    r,
                    counts.as_deref_mut(),
                    b_mode,
                    &mut mv,
                    &best_ref_mvs,
                    &best_sub8x8,
                    num_refs,
                    allow_hp,
                );
                mi.bmi[j].mv = mv;
                mi.bmi[j].mode = b_mode;
                if !ok {
                    valid = false;
                    break;
                }

                if num_4x4_h == 2 {
                    mi.bmi[j + 2] = mi.bmi[j];
                }
                if num_4x4_w == 2 {
                    mi.bmi[j + 1] = mi.bmi[j];
                }
            }
        }

        mi.mode = b_mode;
        mi.mv = mi.bmi[3].mv;
        Ok(valid)
    }

    /// Resolve the vectors of a block or sub-block for its inter mode
    #[allow(clippy::too_many_arguments)]
    fn assign_mv(
        &self,
        r: &mut RangeDecoder,
        mut counts: Option<&mut FrameCounts>,
        mode: PredictionMode,
        mv: &mut [MotionVector; 2],
        ref_mv: &[MotionVector; 2],
        near_nearest_mv: &[MotionVector; 2],
        num_refs: usize,
        allow_hp: bool,
    ) -> bool {
        match mode {
            PredictionMode::NewMv => {
                let mut valid = true;
                for i in 0..num_refs {
                    mv[i] = read_mv(r, counts.as_deref_mut(), &self.fc.mv, &ref_mv[i], allow_hp);
                    valid &= is_mv_valid(&mv[i]);
                }
                valid
            }
            PredictionMode::NearestMv | PredictionMode::NearMv => {
                *mv = *near_nearest_mv;
                true
            }
            PredictionMode::ZeroMv => {
                *mv = [MotionVector::zero(); 2];
                true
            }
            _ => false,
        }
    }
}

#[inline]
fn read_intra_mode(r: &mut RangeDecoder, probs: &[u8]) -> PredictionMode {
    PredictionMode::from_u8(r.read_tree(&INTRA_MODE_TREE, probs))
}

/// Mode of the 4x4 sub-block above sub-block `block`
fn above_block_mode(cur: &ModeInfo, above: Option<&ModeInfo>, block: usize) -> PredictionMode {
    if block == 0 || block == 1 {
        match above {
            Some(a) if !a.is_inter_block() => a.sub_mode(block + 2),
            _ => PredictionMode::DcPred,
        }
    } else {
        cur.bmi[block - 2].mode
    }
}

/// Mode of the 4x4 sub-block left of sub-block `block`
fn left_block_mode(cur: &ModeInfo, left: Option<&ModeInfo>, block: usize) -> PredictionMode {
    if block == 0 || block == 2 {
        match left {
            Some(l) if !l.is_inter_block() => l.sub_mode(block + 1),
            _ => PredictionMode::DcPred,
        }
    } else {
        cur.bmi[block - 1].mode
    }
}

#[inline]
fn is_mv_valid(mv: &MotionVector) -> bool {
    let (row, col) = (mv.row as i32, mv.col as i32);
    row > MV_LOW && row < MV_UPP && col > MV_LOW && col < MV_UPP
}

/// Read a motion vector differential and add it to `ref_mv`
pub fn read_mv(
    r: &mut RangeDecoder,
    counts: Option<&mut FrameCounts>,
    probs: &super::probs::MvProbs,
    ref_mv: &MotionVector,
    allow_hp: bool,
) -> MotionVector {
    let joint = r.read_tree(&MV_JOINT_TREE, &probs.joints) as usize;
    let use_hp = allow_hp && use_mv_hp(ref_mv);
    let mut diff = (0i32, 0i32);

    if joint == MV_JOINT_HZVNZ || joint == MV_JOINT_HNZVNZ {
        diff.0 = read_mv_component(r, &probs.comps[0], use_hp);
    }
    if joint == MV_JOINT_HNZVZ || joint == MV_JOINT_HNZVNZ {
        diff.1 = read_mv_component(r, &probs.comps[1], use_hp);
    }

    if let Some(c) = counts {
        c.mv.joints[joint] += 1;
        if diff.0 != 0 {
            count_mv_component(&mut c.mv.comps[0], diff.0);
        }
        if diff.1 != 0 {
            count_mv_component(&mut c.mv.comps[1], diff.1);
        }
    }

    MotionVector::new(
        (ref_mv.row as i32 + diff.0) as i16,
        (ref_mv.col as i32 + diff.1) as i16,
    )
}

fn read_mv_component(r: &mut RangeDecoder, probs: &MvComponentProbs, use_hp: bool) -> i32 {
    let sign = r.read_bool(probs.sign);
    let class = r.read_tree(&MV_CLASS_TREE, &probs.classes) as usize;
    let class0 = class == 0;

    let (d, mut mag) = if class0 {
        (r.read_bool(probs.class0[0]) as i32, 0)
    } else {
        let n = class;
        let d = (0..n).fold(0i32, |d, i| d | ((r.read_bool(probs.bits[i]) as i32) << i));
        (d, (MV_CLASS0_SIZE as i32) << (class + 2))
    };

    let fr = if class0 {
        r.read_tree(&MV_FP_TREE, &probs.class0_fp[d as usize])
    } else {
        r.read_tree(&MV_FP_TREE, &probs.fp)
    } as i32;

    // Without high precision the bit is implied set
    let hp = if use_hp {
        r.read_bool(if class0 { probs.class0_hp } else { probs.hp }) as i32
    } else {
        1
    };

    mag += ((d << 3) | (fr << 1) | hp) + 1;
    if sign {
        -mag
    } else {
        mag
    }
}

/// Class of a magnitude-minus-one and the offset within the class
fn mv_class(z: i32) -> (usize, i32) {
    let class = if z >= (MV_CLASS0_SIZE as i32) * 4096 {
        10
    } else if z >> 3 == 0 {
        0
    } else {
        (31 - ((z >> 3) as u32).leading_zeros()) as usize
    };
    let base = if class == 0 {
        0
    } else {
        (MV_CLASS0_SIZE as i32) << (class + 2)
    };
    (class, z - base)
}

fn count_mv_component(counts: &mut MvComponentCounts, v: i32) {
    let sign = (v < 0) as usize;
    counts.sign[sign] += 1;
    let z = v.abs() - 1;
    let (class, offset) = mv_class(z);
    counts.classes[class] += 1;

    let d = offset >> 3;
    let f = ((offset >> 1) & 3) as usize;
    let e = (offset & 1) as usize;
    if class == 0 {
        counts.class0[d as usize] += 1;
        counts.class0_fp[d as usize][f] += 1;
        counts.class0_hp[e] += 1;
    } else {
        for i in 0..class {
            counts.bits[i][((d >> i) & 1) as usize] += 1;
        }
        counts.fp[f] += 1;
        counts.hp[e] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::vp9::frame::FrameType;
    use crate::codec::vp9::range_encoder::RangeEncoder;

    struct Fixture {
        header: FrameHeader,
        fc: FrameContext,
        grid: ModeInfoGrid,
        tile: TileInfo,
        seg_map: SegmentationMap,
    }

    impl Fixture {
        fn new(frame_type: FrameType) -> Self {
            let header = FrameHeader {
                frame_type,
                width: 64,
                height: 64,
                ..Default::default()
            };
            Fixture {
                header,
                fc: FrameContext::default(),
                grid: ModeInfoGrid::new(8, 8),
                tile: TileInfo::new(8, 8, 0, 0, 0, 0),
                seg_map: SegmentationMap::new(8, 8),
            }
        }

        fn decode(
            &mut self,
            data: &[u8],
            at: (usize, usize),
            bsize: BlockSize,
            counts: Option<&mut FrameCounts>,
        ) -> (ModeInfo, bool) {
            let reader = ModeInfoReader::new(&self.header, &self.fc, None, None);
            let pos = BlockPosition {
                grid: &self.grid,
                tile: &self.tile,
                mi_row: at.0,
                mi_col: at.1,
                x_mis: 1,
                y_mis: 1,
                edges: BlockEdges::new(at.0, at.1, 1, 1, 8, 8),
            };
            let mut r = RangeDecoder::new(data).unwrap();
            let mut mi = ModeInfo {
                sb_type: bsize,
                ..Default::default()
            };
            let ok = reader
                .read_mode_info(&mut r, counts, &pos, &mut self.seg_map, &mut mi)
                .unwrap();
            (mi, ok)
        }
    }

    #[test]
    fn test_keyframe_dc_block() {
        let mut f = Fixture::new(FrameType::KeyFrame);
        let fc = FrameContext::default();
        let mut enc = RangeEncoder::new();
        // Neither neighbour is skipped, so the skip context is 0
        enc.write_bool(true, fc.skip_probs[0]);
        // Both neighbours are DC; DC is the first leaf of the intra tree
        enc.write_bool(false, fc.kf_y_mode_probs[0][0][0]);
        enc.write_bool(false, fc.kf_uv_mode_probs[0][0]);
        let data = enc.finish();

        let mut counts = FrameCounts::new();
        let (mi, ok) = f.decode(&data, (2, 2), BlockSize::Block16x16, Some(&mut counts));
        assert!(ok);
        assert!(mi.skip);
        assert_eq!(mi.mode, PredictionMode::DcPred);
        assert_eq!(mi.uv_mode, PredictionMode::DcPred);
        assert_eq!(mi.ref_frame, [RefFrame::Intra, RefFrame::None]);
        // Allow32x32 without selection caps at the block maximum
        assert_eq!(mi.tx_size, TxSize::Tx16x16);
        assert_eq!(counts.skip_total(true), 1);
        assert_eq!(counts.y_mode, [[0; 10]; 4]);
    }

    #[test]
    fn test_segment_skip_on_small_block_is_rejected() {
        let mut f = Fixture::new(FrameType::InterFrame);
        f.header.segmentation.enabled = true;
        f.header.segmentation.set_feature(0, SegLevelFeature::Skip, 0);
        f.header.segmentation.set_feature(0, SegLevelFeature::RefFrame, RefFrame::Last as i16);

        let data = RangeEncoder::new().finish();
        let reader = ModeInfoReader::new(&f.header, &f.fc, None, None);
        let pos = BlockPosition {
            grid: &f.grid,
            tile: &f.tile,
            mi_row: 0,
            mi_col: 0,
            x_mis: 1,
            y_mis: 1,
            edges: BlockEdges::new(0, 0, 1, 1, 8, 8),
        };
        let mut r = RangeDecoder::new(&data).unwrap();
        let mut mi = ModeInfo {
            sb_type: BlockSize::Block4x4,
            ..Default::default()
        };
        let err = reader
            .read_mode_info(&mut r, None, &pos, &mut f.seg_map, &mut mi)
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedBitstream(_)));
    }

    #[test]
    fn test_inter_zero_mv_block() {
        let mut f = Fixture::new(FrameType::InterFrame);
        let fc = FrameContext::default();
        let mut enc = RangeEncoder::new();
        enc.write_bool(false, fc.skip_probs[0]);
        enc.write_bool(true, fc.intra_inter_probs[0]);
        // Single reference LAST
        enc.write_bool(false, fc.single_ref_probs[2][0]);
        // No neighbours gives mode context 2; ZEROMV is the first leaf
        enc.write_bool(false, fc.inter_mode_probs[2][0]);
        let data = enc.finish();

        let mut counts = FrameCounts::new();
        let (mi, ok) = f.decode(&data, (0, 0), BlockSize::Block8x8, Some(&mut counts));
        assert!(ok);
        assert!(!mi.skip);
        assert_eq!(mi.ref_frame, [RefFrame::Last, RefFrame::None]);
        assert_eq!(mi.mode, PredictionMode::ZeroMv);
        assert_eq!(mi.mv[0], MotionVector::zero());
        assert_eq!(counts.inter_mode[2][PredictionMode::ZeroMv.inter_offset()], 1);
        assert_eq!(counts.single_ref[2][0][0], 1);
        assert_eq!(counts.intra_inter[0][1], 1);
    }

    #[test]
    fn test_read_new_mv() {
        let fc = FrameContext::default();
        let probs = &fc.mv;
        let mut enc = RangeEncoder::new();
        // Joint: only the row is non-zero
        enc.write_tree(&MV_JOINT_TREE, &probs.joints, MV_JOINT_HZVNZ as u8);
        let comp = &probs.comps[0];
        enc.write_bool(true, comp.sign);
        enc.write_tree(&MV_CLASS_TREE, &comp.classes, 0);
        enc.write_bool(true, comp.class0[0]);
        enc.write_tree(&MV_FP_TREE, &comp.class0_fp[1], 2);
        let data = enc.finish();

        let mut r = RangeDecoder::new(&data).unwrap();
        let mut counts = FrameCounts::new();
        let mv = read_mv(&mut r, Some(&mut counts), probs, &MotionVector::new(10, 4), false);
        // -(((1 << 3) | (2 << 1) | 1) + 1) = -14
        assert_eq!(mv, MotionVector::new(-4, 4));
        assert_eq!(counts.mv.joints[MV_JOINT_HZVNZ], 1);
        assert_eq!(counts.mv.comps[0].sign[1], 1);
        assert_eq!(counts.mv.comps[0].class0[1], 1);
        assert_eq!(counts.mv.comps[0].class0_fp[1][2], 1);
        assert_eq!(counts.mv.comps[1].sign, [0, 0]);
    }

    #[test]
    fn test_mv_class() {
        assert_eq!(mv_class(0), (0, 0));
        assert_eq!(mv_class(15), (0, 15));
        assert_eq!(mv_class(16), (1, 0));
        assert_eq!(mv_class(40), (2, 8));
        assert_eq!(mv_class(8192), (10, 0));
    }

    #[test]
    fn test_sub_block_modes_from_neighbours() {
        let mut above = ModeInfo {
            sb_type: BlockSize::Block4x4,
            ..Default::default()
        };
        above.bmi[2].mode = PredictionMode::VPred;
        above.bmi[3].mode = PredictionMode::HPred;
        let cur = ModeInfo::default();

        assert_eq!(above_block_mode(&cur, Some(&above), 0), PredictionMode::VPred);
        assert_eq!(above_block_mode(&cur, Some(&above), 1), PredictionMode::HPred);
        assert_eq!(above_block_mode(&cur, None, 0), PredictionMode::DcPred);

        let inter = ModeInfo {
            ref_frame: [RefFrame::Last, RefFrame::None],
            ..above
        };
        assert_eq!(left_block_mode(&cur, Some(&inter), 0), PredictionMode::DcPred);
    }
}
