//! VP9 Block Decoding and Reconstruction
//!
//! `TileWorker` holds everything one worker writes while decoding tiles:
//! the reconstructed pixels, the mode info and segment id grids, loop filter
//! levels, entropy contexts and symbol counts. In multi-threaded decoding
//! each worker owns column strips of the frame-wide buffers.
//!
//! A block is decoded in three steps:
//! 1. Mode info
//! 2. Prediction (intra per transform block, inter for the whole block)
//! 3. Residual tokens, dequantization and inverse transform

use crate::error::{Error, Result};

use super::block::{BlockEdges, ModeInfo, ModeInfoGrid, MotionVectorMap, SegmentationMap};
use super::counts::FrameCounts;
use super::entropy::{CoefficientDecoder, EntropyContext, TokenBlock};
use super::filter::{FilterLevelMap, LoopFilterMaskBuilder};
use super::frame::{FrameBuffer, FrameHeader};
use super::inter::{build_inter_predictors_sb, InterRef};
use super::mode_info::{BlockPosition, ModeInfoReader};
use super::prediction::{predict_intra_block, IntraBlock};
use super::probs::FrameContext;
use super::quant::SegmentDequant;
use super::scan::{default_scan, get_scan};
use super::tables::{BlockSize, RefFrame, TxSize, TxType, REFS_PER_FRAME};
use super::tile::{mi_cols_aligned_to_sb, Tile, MI_BLOCK_SIZE};
use super::transform::inverse_transform_add;

/// Frame-wide, read-only inputs shared by every tile worker
pub struct FrameDecodeContext<'a> {
    pub header: &'a FrameHeader,
    pub fc: &'a FrameContext,
    pub modes: ModeInfoReader<'a>,
    pub coefs: CoefficientDecoder<'a>,
    pub dequant: SegmentDequant,
    /// LAST, GOLDEN and ALTREF
    pub refs: [Option<InterRef<'a>>; REFS_PER_FRAME],
    pub mi_rows: usize,
    pub mi_cols: usize,
    pub lossless: bool,
}

impl<'a> FrameDecodeContext<'a> {
    pub fn new(
        header: &'a FrameHeader,
        fc: &'a FrameContext,
        dequant: SegmentDequant,
        refs: [Option<InterRef<'a>>; REFS_PER_FRAME],
        prev_segment_ids: Option<&'a SegmentationMap>,
        prev_frame_mvs: Option<&'a MotionVectorMap>,
    ) -> Self {
        FrameDecodeContext {
            header,
            fc,
            modes: ModeInfoReader::new(header, fc, prev_segment_ids, prev_frame_mvs),
            coefs: CoefficientDecoder::new(fc, header.bit_depth),
            dequant,
            refs,
            mi_rows: header.mi_rows(),
            mi_cols: header.mi_cols(),
            lossless: header.lossless(),
        }
    }

    fn reference(&self, ref_frame: RefFrame) -> Result<&InterRef<'a>> {
        ref_frame
            .index()
            .checked_sub(1)
            .and_then(|i| self.refs.get(i))
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::invalid_input(format!("Reference frame {:?} not supplied", ref_frame)))
    }
}

/// Size of one plane of a block in 4x4 units
#[derive(Debug, Clone, Copy)]
struct PlaneBlock {
    plane: usize,
    ss_x: usize,
    ss_y: usize,
    n4_w: usize,
    n4_h: usize,
    /// Index of the block's first entry in the above and left contexts
    above: usize,
    left: usize,
    max_blocks_wide: Option<usize>,
    max_blocks_high: Option<usize>,
}

impl PlaneBlock {
    fn columns(&self) -> usize {
        self.max_blocks_wide.unwrap_or(self.n4_w)
    }

    fn rows(&self) -> usize {
        self.max_blocks_high.unwrap_or(self.n4_h)
    }

    fn token_block(&self, tx_size: TxSize, row: usize, col: usize) -> TokenBlock {
        TokenBlock {
            tx_size,
            above: self.above + col,
            left: self.left + row,
            x: col,
            y: row,
            max_blocks_wide: self.max_blocks_wide,
            max_blocks_high: self.max_blocks_high,
        }
    }
}

/// 4x4 units of a block that lie inside the frame, `None` when the block
/// does not cross the edge
fn visible_blocks(n4: usize, to_edge: i32, ss: usize) -> Option<usize> {
    (to_edge < 0).then(|| (n4 as i32 + (to_edge >> (5 + ss))).max(0) as usize)
}

/// Mutable decode state of one tile worker
pub struct TileWorker {
    pub frame: FrameBuffer,
    pub grid: ModeInfoGrid,
    pub seg_map: SegmentationMap,
    pub filter: FilterLevelMap,
    pub counts: Option<FrameCounts>,
    /// Set when a tile decoded by this worker was corrupt
    pub corrupted: bool,
    pub(super) entropy: EntropyContext,
    pub(super) above_partition: Vec<u8>,
    pub(super) left_partition: [u8; MI_BLOCK_SIZE],
    dqcoeff: Vec<i32>,
}

impl TileWorker {
    pub fn new(
        frame: FrameBuffer,
        grid: ModeInfoGrid,
        seg_map: SegmentationMap,
        filter: FilterLevelMap,
        counts_enabled: bool,
    ) -> Self {
        let mi_cols = grid.cols();
        TileWorker {
            frame,
            grid,
            seg_map,
            filter,
            counts: counts_enabled.then(FrameCounts::new),
            corrupted: false,
            entropy: EntropyContext::new(mi_cols),
            above_partition: vec![0; ((mi_cols + 7) & !7) + MI_BLOCK_SIZE],
            left_partition: [0; MI_BLOCK_SIZE],
            dqcoeff: vec![0; 32 * 32],
        }
    }

    /// Clear the above contexts before the first tile row
    pub fn reset_above(&mut self) {
        self.entropy.reset_above();
        self.above_partition.fill(0);
    }

    /// A fresh worker owning copies of the mi columns `[mi_col_start, mi_col_end)`
    ///
    /// The strip reaches up to the next superblock boundary so blocks
    /// crossing the right frame edge have room for their pixels.
    pub fn column_strip(&self, mi_col_start: usize, mi_col_end: usize) -> TileWorker {
        let mi_col_end = mi_cols_aligned_to_sb(mi_col_end);
        TileWorker::new(
            self.frame.strip(mi_col_start * 8, mi_col_end * 8),
            self.grid.strip(mi_col_start, mi_col_end),
            self.seg_map.strip(mi_col_start, mi_col_end),
            self.filter.strip(mi_col_start, mi_col_end),
            self.counts.is_some(),
        )
    }

    /// Write back what a column strip worker decoded
    pub fn merge_column_strip(&mut self, strip: &TileWorker) {
        self.frame.merge_strip(&strip.frame);
        self.grid.merge_strip(&strip.grid);
        self.seg_map.merge_strip(&strip.seg_map);
        self.filter.merge_strip(&strip.filter);
        if let (Some(counts), Some(strip_counts)) = (self.counts.as_mut(), strip.counts.as_ref()) {
            counts.accumulate(strip_counts);
        }
        self.corrupted |= strip.corrupted;
    }

    /// Clear the left contexts at the start of a superblock row of a tile
    pub fn reset_left(&mut self) {
        self.entropy.reset_left();
        self.left_partition = [0; MI_BLOCK_SIZE];
    }

    fn plane_blocks(&self, header: &FrameHeader, mi_row: usize, mi_col: usize, bwl: usize, bhl: usize, edges: &BlockEdges) -> [PlaneBlock; 3] {
        let ss = (header.subsampling_x as usize, header.subsampling_y as usize);
        std::array::from_fn(|plane| {
            let (ss_x, ss_y) = if plane == 0 { (0, 0) } else { ss };
            let n4_w = (1 << bwl) >> ss_x;
            let n4_h = (1 << bhl) >> ss_y;
            PlaneBlock {
                plane,
                ss_x,
                ss_y,
                n4_w,
                n4_h,
                above: (mi_col * 2) >> ss_x,
                left: ((mi_row * 2) & 15) >> ss_y,
                max_blocks_wide: visible_blocks(n4_w, edges.to_right, ss_x),
                max_blocks_high: visible_blocks(n4_h, edges.to_bottom, ss_y),
            }
        })
    }

    /// Decode one block of `2^bwl x 2^bhl` 4x4 units at (mi_row, mi_col)
    ///
    /// Sub-8x8 blocks are decoded as 8x8 areas.
    #[allow(clippy::too_many_arguments)]
    pub fn decode_block(
        &mut self,
        fd: &FrameDecodeContext,
        tile: &mut Tile,
        mi_row: usize,
        mi_col: usize,
        bsize: BlockSize,
        bwl: usize,
        bhl: usize,
    ) -> Result<()> {
        let header = fd.header;
        let less8x8 = bsize.is_sub8x8();
        let bw = 1 << (bwl - 1);
        let bh = 1 << (bhl - 1);
        let x_mis = bw.min(fd.mi_cols - mi_col);
        let y_mis = bh.min(fd.mi_rows - mi_row);
        let edges = BlockEdges::new(mi_row, mi_col, bw, bh, fd.mi_rows, fd.mi_cols);

        if !less8x8 && (header.subsampling_x || header.subsampling_y) {
            let uv_size = bsize.subsampled(header.subsampling_x as usize, header.subsampling_y as usize);
            if !uv_size.is_valid() {
                return Err(Error::corrupt_frame("Invalid block size."));
            }
        }

        let mut mi = ModeInfo {
            sb_type: bsize,
            ..Default::default()
        };
        let pos = BlockPosition {
            grid: &self.grid,
            tile: &tile.info,
            mi_row,
            mi_col,
            x_mis,
            y_mis,
            edges,
        };
        let mvs_valid = fd.modes.read_mode_info(
            &mut tile.reader,
            self.counts.as_mut(),
            &pos,
            &mut self.seg_map,
            &mut mi,
        )?;
        self.corrupted |= !mvs_valid;

        let planes = self.plane_blocks(header, mi_row, mi_col, bwl, bhl, &edges);
        if mi.skip {
            for pb in planes.iter() {
                self.entropy.reset_block(pb.plane, pb.above, pb.left, pb.n4_w, pb.n4_h);
            }
        }

        if !mi.is_inter_block() {
            for pb in planes.iter() {
                let tx_size = if pb.plane == 0 {
                    mi.tx_size
                } else {
                    mi.uv_tx_size(pb.ss_x, pb.ss_y)
                };
                let step = tx_size.num_4x4();
                for row in (0..pb.rows()).step_by(step) {
                    for col in (0..pb.columns()).step_by(step) {
                        self.predict_and_reconstruct_intra(fd, tile, &mi, pb, &edges, (mi_row, mi_col), row, col, tx_size);
                    }
                }
            }
        } else {
            let first = fd.reference(mi.ref_frame[0])?;
            let second = if mi.has_second_ref() {
                Some(fd.reference(mi.ref_frame[1])?)
            } else {
                None
            };
            let n4 = planes.map(|pb| (pb.n4_w, pb.n4_h));
            build_inter_predictors_sb(
                &mut self.frame,
                &mi,
                [Some(first), second],
                &edges,
                mi_row,
                mi_col,
                n4,
                header.bit_depth,
            )?;

            if !mi.skip {
                let mut eobtotal = 0;
                for pb in planes.iter() {
                    let tx_size = if pb.plane == 0 {
                        mi.tx_size
                    } else {
                        mi.uv_tx_size(pb.ss_x, pb.ss_y)
                    };
                    let step = tx_size.num_4x4();
                    for row in (0..pb.rows()).step_by(step) {
                        for col in (0..pb.columns()).step_by(step) {
                            eobtotal += self.reconstruct_inter_block(fd, tile, &mi, pb, (mi_row, mi_col), row, col, tx_size);
                        }
                    }
                }
                // A block of 8x8 or larger with no coefficients skips the
                // inner loop filter edges
                if !less8x8 && eobtotal == 0 {
                    mi.skip = true;
                }
            }
        }

        self.corrupted |= tile.reader.has_error();
        self.grid.set_block(mi_row, mi_col, x_mis, y_mis, mi);
        if header.loop_filter.level != 0 {
            self.filter.build_mask(&mi, mi_row, mi_col, x_mis, y_mis);
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn predict_and_reconstruct_intra(
        &mut self,
        fd: &FrameDecodeContext,
        tile: &mut Tile,
        mi: &ModeInfo,
        pb: &PlaneBlock,
        edges: &BlockEdges,
        (mi_row, mi_col): (usize, usize),
        row: usize,
        col: usize,
        tx_size: TxSize,
    ) {
        let bit_depth = fd.header.bit_depth;
        let mode = if pb.plane > 0 {
            mi.uv_mode
        } else if mi.sb_type.is_sub8x8() {
            mi.bmi[(row << 1) + col].mode
        } else {
            mi.mode
        };

        let plane = self.frame.plane_mut(pb.plane);
        let block = IntraBlock {
            x: ((mi_col * 8) >> pb.ss_x) + 4 * col,
            y: ((mi_row * 8) >> pb.ss_y) + 4 * row,
            mode,
            tx_size,
            have_top: row > 0 || mi_row > 0,
            have_left: col > 0 || mi_col > tile.info.mi_col_start,
            have_right: col + tx_size.num_4x4() < pb.n4_w,
            frame_width: plane.width,
            frame_height: plane.height,
            clip_right: edges.to_right < 0,
            clip_bottom: edges.to_bottom < 0,
        };
        predict_intra_block(plane, &block, bit_depth);

        if mi.skip {
            return;
        }

        let (tx_type, scan) = if pb.plane > 0 || fd.lossless {
            (TxType::DctDct, default_scan(tx_size))
        } else {
            let tx_type = mode.tx_type();
            (tx_type, get_scan(tx_size, tx_type))
        };
        let eob = fd.coefs.decode_block_tokens(
            &mut tile.reader,
            &mut self.entropy,
            self.counts.as_mut(),
            &mut self.dqcoeff,
            pb.plane,
            false,
            scan,
            &pb.token_block(tx_size, row, col),
            fd.dequant.for_plane(mi.segment_id, pb.plane),
        );
        if eob > 0 {
            let plane = self.frame.plane_mut(pb.plane);
            let offset = plane.offset(block.x, block.y);
            let stride = plane.stride;
            inverse_transform_add(
                &self.dqcoeff,
                &mut plane.data[offset..],
                stride,
                tx_size,
                tx_type,
                eob,
                fd.lossless,
                bit_depth,
            );
            clear_coefficients(&mut self.dqcoeff, &scan.scan[..eob]);
        }
    }

    /// Decode and add the residual of one transform block; returns its eob
    #[allow(clippy::too_many_arguments)]
    fn reconstruct_inter_block(
        &mut self,
        fd: &FrameDecodeContext,
        tile: &mut Tile,
        mi: &ModeInfo,
        pb: &PlaneBlock,
        (mi_row, mi_col): (usize, usize),
        row: usize,
        col: usize,
        tx_size: TxSize,
    ) -> usize {
        let scan = default_scan(tx_size);
        let eob = fd.coefs.decode_block_tokens(
            &mut tile.reader,
            &mut self.entropy,
            self.counts.as_mut(),
            &mut self.dqcoeff,
            pb.plane,
            true,
            scan,
            &pb.token_block(tx_size, row, col),
            fd.dequant.for_plane(mi.segment_id, pb.plane),
        );
        if eob > 0 {
            let x = ((mi_col * 8) >> pb.ss_x) + 4 * col;
            let y = ((mi_row * 8) >> pb.ss_y) + 4 * row;
            let plane = self.frame.plane_mut(pb.plane);
            let offset = plane.offset(x, y);
            let stride = plane.stride;
            inverse_transform_add(
                &self.dqcoeff,
                &mut plane.data[offset..],
                stride,
                tx_size,
                TxType::DctDct,
                eob,
                fd.lossless,
                fd.header.bit_depth,
            );
            clear_coefficients(&mut self.dqcoeff, &scan.scan[..eob]);
        }
        eob
    }
}

/// Zero the coefficients a transform block wrote
#[inline]
fn clear_coefficients(dqcoeff: &mut [i32], positions: &[u16]) {
    for &rc in positions {
        dqcoeff[rc as usize] = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::vp9::frame::FrameType;
    use crate::codec::vp9::inter::ScaleFactors;
    use crate::codec::vp9::probs::pareto;
    use crate::codec::vp9::range_encoder::RangeEncoder;
    use crate::codec::vp9::tables::{
        MotionVector, PredictionMode, ReferenceMode, EOB_MODEL_TOKEN, INTER_MODE_TREE, MV_CLASS_TREE,
        MV_FP_TREE, MV_JOINT_HZVNZ, MV_JOINT_TREE, TWO_TOKEN,
    };
    use crate::codec::vp9::tile::{TileBuffer, TileInfo};

    fn header(width: u32, height: u32) -> FrameHeader {
        FrameHeader {
            frame_type: FrameType::KeyFrame,
            width,
            height,
            ..Default::default()
        }
    }

    fn worker(header: &FrameHeader) -> TileWorker {
        let (rows, cols) = (header.mi_rows(), header.mi_cols());
        TileWorker::new(
            FrameBuffer::for_header(header),
            ModeInfoGrid::new(rows, cols),
            SegmentationMap::new(rows, cols),
            FilterLevelMap::new(&header.loop_filter, &header.segmentation, rows, cols),
            header.counts_enabled,
        )
    }

    fn inter_header() -> FrameHeader {
        let mut header = header(64, 64);
        header.frame_type = FrameType::InterFrame;
        header.quantization.base_q_idx = 100;
        header
    }

    /// Decode a single block at the top left of a one-tile frame
    fn decode_first_block(
        w: &mut TileWorker,
        fd: &FrameDecodeContext,
        data: &[u8],
        bsize: BlockSize,
        bwl: usize,
        bhl: usize,
    ) -> Result<()> {
        let buffer = TileBuffer {
            data,
            offset: 0,
            col: 0,
        };
        let mut tile = Tile::new(&buffer, TileInfo::new(8, 8, 0, 0, 0, 0))?;
        w.decode_block(fd, &mut tile, 0, 0, bsize, bwl, bhl)?;
        assert!(!tile.reader.has_error());
        Ok(())
    }

    fn gradient(header: &FrameHeader) -> FrameBuffer {
        let mut frame = FrameBuffer::for_header(header);
        for plane in frame.planes.iter_mut() {
            for y in 0..plane.height {
                for x in 0..plane.width {
                    let o = plane.offset(x, y);
                    plane.data[o] = ((x + 2 * y) % 256) as u16;
                }
            }
        }
        frame
    }

    fn flat(header: &FrameHeader, value: u16) -> FrameBuffer {
        let mut frame = FrameBuffer::for_header(header);
        frame.fill(value);
        frame
    }

    /// A row-only motion vector of +16 (two luma pixels down) coded
    /// against a zero reference vector without high precision
    fn write_two_pixels_down(enc: &mut RangeEncoder, fc: &FrameContext) {
        enc.write_tree(&MV_JOINT_TREE, &fc.mv.joints, MV_JOINT_HZVNZ as u8);
        let comp = &fc.mv.comps[0];
        enc.write_bool(false, comp.sign);
        enc.write_tree(&MV_CLASS_TREE, &comp.classes, 0);
        enc.write_bool(true, comp.class0[0]);
        // ((1 << 3) | (3 << 1) | 1) + 1
        enc.write_tree(&MV_FP_TREE, &comp.class0_fp[1], 3);
    }

    #[test]
    fn test_visible_blocks() {
        assert_eq!(visible_blocks(16, 0, 0), None);
        // 64 wide block with 32 pixels past the edge
        assert_eq!(visible_blocks(16, -32 * 8, 0), Some(8));
        assert_eq!(visible_blocks(8, -32 * 8, 1), Some(4));
    }

    #[test]
    fn test_skipped_dc_block() {
        let header = header(64, 64);
        let fc = FrameContext::default();
        let dequant = SegmentDequant::from_params(&header.quantization, &header.segmentation);
        let fd = FrameDecodeContext::new(&header, &fc, dequant, [None; 3], None, None);

        let mut enc = RangeEncoder::new();
        enc.write_bool(true, fc.skip_probs[0]);
        enc.write_bool(false, fc.kf_y_mode_probs[0][0][0]);
        enc.write_bool(false, fc.kf_uv_mode_probs[0][0]);
        let data = enc.finish();
        let buffer = TileBuffer {
            data: &data,
            offset: 0,
            col: 0,
        };

        let mut w = worker(&header);
        w.frame.fill(7);
        let mut tile = Tile::new(&buffer, TileInfo::new(8, 8, 0, 0, 0, 0)).unwrap();
        w.decode_block(&fd, &mut tile, 0, 0, BlockSize::Block16x16, 2, 2)
            .unwrap();

        let mi = *w.grid.get(1, 1);
        assert!(mi.skip);
        assert_eq!(mi.mode, PredictionMode::DcPred);
        assert!(!w.corrupted);
        // No edges: every plane predicts the mid value
        let luma = w.frame.plane(0);
        assert!((0..16).all(|y| (0..16).all(|x| luma.pixel(x, y) == 128)));
        assert_eq!(w.frame.plane(1).pixel(7, 7), 128);
        assert_eq!(luma.pixel(16, 0), 7);
        assert_eq!(w.counts.as_ref().unwrap().skip_total(true), 1);
    }

    #[test]
    fn test_column_strip_merge() {
        let header = header(200, 64);
        let mut w = worker(&header);
        let mut strip = w.column_strip(8, 25);
        assert_eq!(strip.frame.plane(0).x_origin, 64);
        // The last column is padded to the superblock edge
        assert_eq!(strip.frame.plane(0).stride, 192);
        assert_eq!(strip.grid.col_origin(), 8);

        strip.grid.get_mut(3, 20).skip = true;
        strip.seg_map.set_block(0, 8, 2, 2, 5);
        let o = strip.frame.plane(1).offset(40, 2);
        strip.frame.plane_mut(1).data[o] = 9;
        if let Some(counts) = strip.counts.as_mut() {
            counts.skip[1][1] = 4;
        }

        w.merge_column_strip(&strip);
        assert!(w.grid.get(3, 20).skip);
        assert!(!w.grid.get(3, 7).skip);
        assert_eq!(*w.seg_map.get(1, 9), 5);
        assert_eq!(w.frame.plane(1).pixel(40, 2), 9);
        assert_eq!(w.counts.as_ref().unwrap().skip_total(true), 4);
        assert!(!w.corrupted);
    }

    #[test]
    fn test_inter_block_needs_reference() {
        let mut header = header(64, 64);
        header.frame_type = FrameType::InterFrame;
        let fc = FrameContext::default();
        let dequant = SegmentDequant::from_params(&header.quantization, &header.segmentation);
        let fd = FrameDecodeContext::new(&header, &fc, dequant, [None; 3], None, None);

        let mut enc = RangeEncoder::new();
        enc.write_bool(true, fc.skip_probs[0]);
        enc.write_bool(true, fc.intra_inter_probs[0]);
        enc.write_bool(false, fc.single_ref_probs[2][0]);
        enc.write_bool(false, fc.inter_mode_probs[2][0]);
        let data = enc.finish();
        let buffer = TileBuffer {
            data: &data,
            offset: 0,
            col: 0,
        };

        let mut w = worker(&header);
        let mut tile = Tile::new(&buffer, TileInfo::new(8, 8, 0, 0, 0, 0)).unwrap();
        let err = w
            .decode_block(&fd, &mut tile, 0, 0, BlockSize::Block8x8, 1, 1)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_intra_residual_added_to_prediction() {
        let mut header = header(64, 64);
        header.quantization.base_q_idx = 100;
        let fc = FrameContext::default();
        let dequant = SegmentDequant::from_params(&header.quantization, &header.segmentation);
        let fd = FrameDecodeContext::new(&header, &fc, dequant, [None; 3], None, None);
        assert_eq!(fd.dequant.for_plane(0, 0).dc, 93);

        let mut enc = RangeEncoder::new();
        enc.write_bool(false, fc.skip_probs[0]);
        enc.write_bool(false, fc.kf_y_mode_probs[0][0][0]);
        enc.write_bool(false, fc.kf_uv_mode_probs[0][0]);
        // Luma 8x8 transform: a single DC token of value 4
        let luma = &fc.coef_probs[TxSize::Tx8x8 as usize][0][0];
        let p = pareto(luma[0][0][2]);
        enc.write_bool(true, luma[0][0][0]);
        enc.write_bool(true, luma[0][0][1]);
        enc.write_bool(true, luma[0][0][2]);
        enc.write_bool(false, p[0]);
        enc.write_bool(true, p[1]);
        enc.write_bool(true, p[2]);
        enc.write_bit(false);
        // Both neighbours of position 1 are the DC, energy class 3
        enc.write_bool(false, luma[1][3][0]);
        // Chroma 4x4 transforms end at once
        let chroma = &fc.coef_probs[TxSize::Tx4x4 as usize][1][0];
        enc.write_bool(false, chroma[0][0][0]);
        enc.write_bool(false, chroma[0][0][0]);
        let data = enc.finish();

        let mut w = worker(&header);
        decode_first_block(&mut w, &fd, &data, BlockSize::Block8x8, 1, 1).unwrap();

        let mi = *w.grid.get(0, 0);
        assert!(!mi.skip);
        assert_eq!(mi.tx_size, TxSize::Tx8x8);
        // 4 * 93 through the DC-only 8x8 inverse DCT adds 6
        let luma_plane = w.frame.plane(0);
        assert!((0..8).all(|y| (0..8).all(|x| luma_plane.pixel(x, y) == 134)));
        assert_eq!(luma_plane.pixel(8, 0), 0);
        assert!((0..4).all(|y| (0..4).all(|x| w.frame.plane(1).pixel(x, y) == 128)));
        assert!(w.dqcoeff.iter().all(|&c| c == 0));
        assert_eq!(w.entropy.context(0, 0, 0, TxSize::Tx4x4), 2);
        assert_eq!(w.entropy.context(1, 0, 0, TxSize::Tx4x4), 0);

        let counts = w.counts.as_ref().unwrap();
        assert_eq!(counts.coef[1][0][0][0][0][TWO_TOKEN], 1);
        assert_eq!(counts.coef[1][0][0][1][3][EOB_MODEL_TOKEN], 1);
    }

    #[test]
    fn test_immediate_eob_keeps_prediction() {
        let mut header = header(64, 64);
        header.quantization.base_q_idx = 100;
        let fc = FrameContext::default();
        let dequant = SegmentDequant::from_params(&header.quantization, &header.segmentation);
        let fd = FrameDecodeContext::new(&header, &fc, dequant, [None; 3], None, None);

        let mut enc = RangeEncoder::new();
        enc.write_bool(false, fc.skip_probs[0]);
        enc.write_bool(false, fc.kf_y_mode_probs[0][0][0]);
        enc.write_bool(false, fc.kf_uv_mode_probs[0][0]);
        enc.write_bool(false, fc.coef_probs[TxSize::Tx16x16 as usize][0][0][0][0][0]);
        enc.write_bool(false, fc.coef_probs[TxSize::Tx8x8 as usize][1][0][0][0][0]);
        enc.write_bool(false, fc.coef_probs[TxSize::Tx8x8 as usize][1][0][0][0][0]);
        let data = enc.finish();

        let mut w = worker(&header);
        decode_first_block(&mut w, &fd, &data, BlockSize::Block16x16, 2, 2).unwrap();

        // Intra blocks keep their skip flag even without coefficients
        assert!(!w.grid.get(0, 0).skip);
        let luma = w.frame.plane(0);
        assert!((0..16).all(|y| (0..16).all(|x| luma.pixel(x, y) == 128)));
        assert!((0..8).all(|y| (0..8).all(|x| w.frame.plane(2).pixel(x, y) == 128)));
        assert_eq!(w.entropy.context(0, 0, 0, TxSize::Tx16x16), 0);
        let counts = w.counts.as_ref().unwrap();
        assert_eq!(counts.coef[2][0][0][0][0][EOB_MODEL_TOKEN], 1);
        assert_eq!(counts.coef[1][1][0][0][0][EOB_MODEL_TOKEN], 2);
    }

    #[test]
    fn test_inter_block_from_reference() {
        let header = inter_header();
        let fc = FrameContext::default();
        let reference = gradient(&header);
        let last = InterRef {
            frame: &reference,
            scale: ScaleFactors::default(),
        };
        let dequant = SegmentDequant::from_params(&header.quantization, &header.segmentation);
        let fd = FrameDecodeContext::new(&header, &fc, dequant, [Some(last), None, None], None, None);

        let mut enc = RangeEncoder::new();
        enc.write_bool(false, fc.skip_probs[0]);
        enc.write_bool(true, fc.intra_inter_probs[0]);
        enc.write_bool(false, fc.single_ref_probs[2][0]);
        enc.write_tree(&INTER_MODE_TREE, &fc.inter_mode_probs[2], PredictionMode::NewMv.inter_offset() as u8);
        write_two_pixels_down(&mut enc, &fc);
        // Not skipped, but every transform block ends at once
        enc.write_bool(false, fc.coef_probs[TxSize::Tx16x16 as usize][0][1][0][0][0]);
        enc.write_bool(false, fc.coef_probs[TxSize::Tx8x8 as usize][1][1][0][0][0]);
        enc.write_bool(false, fc.coef_probs[TxSize::Tx8x8 as usize][1][1][0][0][0]);
        let data = enc.finish();

        let mut w = worker(&header);
        decode_first_block(&mut w, &fd, &data, BlockSize::Block16x16, 2, 2).unwrap();

        let mi = *w.grid.get(1, 1);
        assert_eq!(mi.ref_frame, [RefFrame::Last, RefFrame::None]);
        assert_eq!(mi.mode, PredictionMode::NewMv);
        assert_eq!(mi.mv[0], MotionVector::new(16, 0));
        // No coefficients in a 16x16 block turns on skip for the loop filter
        assert!(mi.skip);
        assert!(!w.corrupted);

        let (luma, src) = (w.frame.plane(0), reference.plane(0));
        assert!((0..16).all(|y| (0..16).all(|x| luma.pixel(x, y) == src.pixel(x, y + 2))));
        let (u, src_u) = (w.frame.plane(1), reference.plane(1));
        assert!((0..8).all(|y| (0..8).all(|x| u.pixel(x, y) == src_u.pixel(x, y + 1))));
        assert_eq!(w.counts.as_ref().unwrap().mv.joints[MV_JOINT_HZVNZ], 1);
    }

    #[test]
    fn test_compound_block_averages_references() {
        let mut header = inter_header();
        header.reference_mode = ReferenceMode::Compound;
        header.ref_frame_sign_bias[RefFrame::AltRef.index()] = true;
        let fc = FrameContext::default();
        let (last_frame, altref_frame) = (flat(&header, 100), flat(&header, 51));
        let refs = [
            Some(InterRef {
                frame: &last_frame,
                scale: ScaleFactors::default(),
            }),
            None,
            Some(InterRef {
                frame: &altref_frame,
                scale: ScaleFactors::default(),
            }),
        ];
        let dequant = SegmentDequant::from_params(&header.quantization, &header.segmentation);
        let fd = FrameDecodeContext::new(&header, &fc, dequant, refs, None, None);

        let mut enc = RangeEncoder::new();
        enc.write_bool(true, fc.skip_probs[0]);
        enc.write_bool(true, fc.intra_inter_probs[0]);
        // Variable reference LAST
        enc.write_bool(false, fc.comp_ref_probs[2]);
        enc.write_bool(false, fc.inter_mode_probs[2][0]);
        let data = enc.finish();

        let mut w = worker(&header);
        decode_first_block(&mut w, &fd, &data, BlockSize::Block16x16, 2, 2).unwrap();

        let mi = *w.grid.get(0, 0);
        // ALTREF has the opposite sign bias and takes the second slot
        assert_eq!(mi.ref_frame, [RefFrame::Last, RefFrame::AltRef]);
        assert_eq!(mi.mode, PredictionMode::ZeroMv);
        let luma = w.frame.plane(0);
        assert!((0..16).all(|y| (0..16).all(|x| luma.pixel(x, y) == 76)));
        assert_eq!(w.frame.plane(2).pixel(7, 7), 76);
        assert_eq!(luma.pixel(16, 0), 0);
    }

    #[test]
    fn test_compound_block_needs_both_references() {
        let mut header = inter_header();
        header.reference_mode = ReferenceMode::Compound;
        header.ref_frame_sign_bias[RefFrame::AltRef.index()] = true;
        let fc = FrameContext::default();
        let last_frame = flat(&header, 100);
        let last = InterRef {
            frame: &last_frame,
            scale: ScaleFactors::default(),
        };
        let dequant = SegmentDequant::from_params(&header.quantization, &header.segmentation);
        let fd = FrameDecodeContext::new(&header, &fc, dequant, [Some(last), None, None], None, None);

        let mut enc = RangeEncoder::new();
        enc.write_bool(true, fc.skip_probs[0]);
        enc.write_bool(true, fc.intra_inter_probs[0]);
        enc.write_bool(false, fc.comp_ref_probs[2]);
        enc.write_bool(false, fc.inter_mode_probs[2][0]);
        let data = enc.finish();

        let mut w = worker(&header);
        let err = decode_first_block(&mut w, &fd, &data, BlockSize::Block16x16, 2, 2).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_sub8x8_inter_vectors_per_block() {
        let header = inter_header();
        let fc = FrameContext::default();
        let reference = gradient(&header);
        let last = InterRef {
            frame: &reference,
            scale: ScaleFactors::default(),
        };
        let dequant = SegmentDequant::from_params(&header.quantization, &header.segmentation);
        let fd = FrameDecodeContext::new(&header, &fc, dequant, [Some(last), None, None], None, None);

        let mut enc = RangeEncoder::new();
        enc.write_bool(true, fc.skip_probs[0]);
        enc.write_bool(true, fc.intra_inter_probs[0]);
        enc.write_bool(false, fc.single_ref_probs[2][0]);
        // Top left 4x4 moves, the other three stay put
        enc.write_tree(&INTER_MODE_TREE, &fc.inter_mode_probs[2], PredictionMode::NewMv.inter_offset() as u8);
        write_two_pixels_down(&mut enc, &fc);
        for _ in 1..4 {
            enc.write_bool(false, fc.inter_mode_probs[2][0]);
        }
        let data = enc.finish();

        let mut w = worker(&header);
        decode_first_block(&mut w, &fd, &data, BlockSize::Block4x4, 1, 1).unwrap();

        let mi = *w.grid.get(0, 0);
        assert_eq!(mi.sb_type, BlockSize::Block4x4);
        assert_eq!(mi.bmi[0].mode, PredictionMode::NewMv);
        assert_eq!(mi.bmi[0].mv[0], MotionVector::new(16, 0));
        assert!(mi.bmi[1..].iter().all(|b| b.mode == PredictionMode::ZeroMv));
        assert!(mi.bmi[1..].iter().all(|b| b.mv[0] == MotionVector::zero()));
        // The block takes the mode and vector of its last sub-block
        assert_eq!(mi.mode, PredictionMode::ZeroMv);
        assert_eq!(mi.mv[0], MotionVector::zero());

        let (luma, src) = (w.frame.plane(0), reference.plane(0));
        for y in 0..8 {
            for x in 0..8 {
                let dy = if x < 4 && y < 4 { 2 } else { 0 };
                assert_eq!(luma.pixel(x, y), src.pixel(x, y + dy), "pixel ({}, {})", x, y);
            }
        }
    }
}
