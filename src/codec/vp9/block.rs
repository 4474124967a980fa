//! VP9 Block Mode Information
//!
//! Every 8x8 unit of a frame ("mi" unit) carries the mode information of the
//! block covering it:
//! - Leaf blocks up to 64x64 replicate their info into every covered cell
//! - Sub-8x8 blocks additionally carry four 4x4 sub-block modes and vectors
//! - Per-cell maps (segment ids, filter levels, motion vectors) share one
//!   strip-capable container so tile columns can be decoded independently

use super::tables::{
    uv_tx_size, BlockSize, InterpFilter, MotionVector, PredictionMode, RefFrame, TxSize,
};

/// Mode and motion vectors of one 4x4 sub-block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BModeInfo {
    pub mode: PredictionMode,
    pub mv: [MotionVector; 2],
}

/// Mode information for a single block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeInfo {
    /// Block size
    pub sb_type: BlockSize,
    /// Y prediction mode; for sub-8x8 blocks the mode of the last sub-block
    pub mode: PredictionMode,
    /// UV prediction mode
    pub uv_mode: PredictionMode,
    /// Transform size
    pub tx_size: TxSize,
    /// Skip flag (no residual)
    pub skip: bool,
    /// Segment ID (0-7)
    pub segment_id: u8,
    /// Segment id matched the temporal prediction
    pub seg_id_predicted: bool,
    /// Reference frames; `ref_frame[0] == Intra` for intra blocks
    pub ref_frame: [RefFrame; 2],
    /// Motion vectors; for sub-8x8 blocks the vectors of the last sub-block
    pub mv: [MotionVector; 2],
    pub interp_filter: InterpFilter,
    /// Sub-block info, only meaningful for sub-8x8 blocks
    pub bmi: [BModeInfo; 4],
}

impl Default for ModeInfo {
    fn default() -> Self {
        ModeInfo {
            sb_type: BlockSize::Block8x8,
            mode: PredictionMode::DcPred,
            uv_mode: PredictionMode::DcPred,
            tx_size: TxSize::Tx4x4,
            skip: false,
            segment_id: 0,
            seg_id_predicted: false,
            ref_frame: [RefFrame::Intra, RefFrame::None],
            mv: [MotionVector::zero(); 2],
            interp_filter: InterpFilter::EightTap,
            bmi: [BModeInfo::default(); 4],
        }
    }
}

impl ModeInfo {
    pub fn is_inter_block(&self) -> bool {
        self.ref_frame[0].is_inter()
    }

    pub fn has_second_ref(&self) -> bool {
        self.ref_frame[1].is_inter()
    }

    /// Intra mode of sub-block `block`, falling back to the block mode
    pub fn sub_mode(&self, block: usize) -> PredictionMode {
        if self.sb_type.is_sub8x8() {
            self.bmi[block].mode
        } else {
            self.mode
        }
    }

    /// Transform size used by the chroma planes
    pub fn uv_tx_size(&self, ss_x: usize, ss_y: usize) -> TxSize {
        uv_tx_size(self.sb_type, self.tx_size, ss_x, ss_y)
    }
}

/// Distances from a block to the frame edges in 1/8 pel
///
/// Left and top are zero or negative, right and bottom are negative when
/// the block extends past the frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockEdges {
    pub to_left: i32,
    pub to_right: i32,
    pub to_top: i32,
    pub to_bottom: i32,
}

impl BlockEdges {
    /// Edges of a block of `bw x bh` mi units at (mi_row, mi_col)
    pub fn new(
        mi_row: usize,
        mi_col: usize,
        bw: usize,
        bh: usize,
        mi_rows: usize,
        mi_cols: usize,
    ) -> Self {
        BlockEdges {
            to_left: -((mi_col as i32 * 8) * 8),
            to_right: ((mi_cols as i32 - bw as i32 - mi_col as i32) * 8) * 8,
            to_top: -((mi_row as i32 * 8) * 8),
            to_bottom: ((mi_rows as i32 - bh as i32 - mi_row as i32) * 8) * 8,
        }
    }
}

/// A per-mi-unit map that can be split into column strips
///
/// Rows always span the whole frame. A strip keeps only the columns
/// `[col_origin, col_origin + stride)`, so each tile column worker can own
/// the cells it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiMap<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
    col_origin: usize,
    stride: usize,
}

impl<T: Copy + Default> MiMap<T> {
    /// Create a map of `rows x cols` default cells
    pub fn new(rows: usize, cols: usize) -> Self {
        MiMap {
            data: vec![T::default(); rows * cols],
            rows,
            cols,
            col_origin: 0,
            stride: cols,
        }
    }

    /// Frame height in mi units
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Frame width in mi units
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// First column held by this map
    pub fn col_origin(&self) -> usize {
        self.col_origin
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(col >= self.col_origin && col < self.col_origin + self.stride);
        row * self.stride + (col - self.col_origin)
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[self.index(row, col)]
    }

    #[inline]
    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        let idx = self.index(row, col);
        &mut self.data[idx]
    }

    /// Store `value` into the `x_mis x y_mis` cells starting at (row, col)
    pub fn set_block(&mut self, row: usize, col: usize, x_mis: usize, y_mis: usize, value: T) {
        for r in row..row + y_mis {
            let start = self.index(r, col);
            self.data[start..start + x_mis].fill(value);
        }
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Copy the columns `[col_start, col_end)` into a standalone strip
    pub fn strip(&self, col_start: usize, col_end: usize) -> Self {
        let col_end = col_end.min(self.col_origin + self.stride);
        let width = col_end.saturating_sub(col_start);
        let mut data = Vec::with_capacity(width * self.rows);
        for r in 0..self.rows {
            let start = self.index(r, col_start);
            data.extend_from_slice(&self.data[start..start + width]);
        }
        MiMap {
            data,
            rows: self.rows,
            cols: self.cols,
            col_origin: col_start,
            stride: width,
        }
    }

    /// Write a strip back into this map
    pub fn merge_strip(&mut self, strip: &Self) {
        if strip.stride == 0 {
            return;
        }
        for r in 0..self.rows {
            let dst = self.index(r, strip.col_origin);
            let src = r * strip.stride;
            self.data[dst..dst + strip.stride]
                .copy_from_slice(&strip.data[src..src + strip.stride]);
        }
    }
}

/// Mode info for every 8x8 unit of a frame
pub type ModeInfoGrid = MiMap<ModeInfo>;

/// Segment id per 8x8 unit
pub type SegmentationMap = MiMap<u8>;

/// Reference frames and vectors kept per 8x8 unit for the next frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MvRef {
    pub ref_frame: [RefFrame; 2],
    pub mv: [MotionVector; 2],
}

impl Default for MvRef {
    fn default() -> Self {
        MvRef {
            ref_frame: [RefFrame::Intra, RefFrame::None],
            mv: [MotionVector::zero(); 2],
        }
    }
}

/// Motion vectors of a decoded frame, used for temporal candidates
pub type MotionVectorMap = MiMap<MvRef>;

impl MiMap<ModeInfo> {
    /// Motion vector map of the decoded frame
    pub fn motion_vectors(&self) -> MotionVectorMap {
        MiMap {
            data: self
                .data
                .iter()
                .map(|mi| MvRef {
                    ref_frame: mi.ref_frame,
                    mv: mi.mv,
                })
                .collect(),
            rows: self.rows,
            cols: self.cols,
            col_origin: self.col_origin,
            stride: self.stride,
        }
    }
}

impl MiMap<u8> {
    /// Smallest segment id inside a block, used as the temporal prediction
    pub fn min_in_block(&self, row: usize, col: usize, x_mis: usize, y_mis: usize) -> u8 {
        let mut segment_id = u8::MAX;
        for r in row..row + y_mis {
            for c in col..col + x_mis {
                segment_id = segment_id.min(*self.get(r, c));
            }
        }
        if segment_id == u8::MAX {
            0
        } else {
            segment_id
        }
    }

    /// Copy a block's cells from another map
    pub fn copy_block(
        &mut self,
        src: &MiMap<u8>,
        row: usize,
        col: usize,
        x_mis: usize,
        y_mis: usize,
    ) {
        for r in row..row + y_mis {
            for c in col..col + x_mis {
                *self.get_mut(r, c) = *src.get(r, c);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_info_grid() {
        let mut grid = ModeInfoGrid::new(60, 80);
        assert_eq!(grid.cols(), 80);
        assert_eq!(grid.rows(), 60);

        let info = ModeInfo {
            sb_type: BlockSize::Block16x16,
            mode: PredictionMode::VPred,
            ..Default::default()
        };
        grid.set_block(0, 0, 2, 2, info);

        for row in 0..2 {
            for col in 0..2 {
                assert_eq!(grid.get(row, col).mode, PredictionMode::VPred);
            }
        }
        assert_eq!(grid.get(0, 2).mode, PredictionMode::DcPred);
        assert_eq!(grid.get(2, 0).mode, PredictionMode::DcPred);
    }

    #[test]
    fn test_inter_flags() {
        let mut mi = ModeInfo::default();
        assert!(!mi.is_inter_block());
        mi.ref_frame = [RefFrame::Last, RefFrame::AltRef];
        assert!(mi.is_inter_block());
        assert!(mi.has_second_ref());
    }

    #[test]
    fn test_sub_mode() {
        let mut mi = ModeInfo {
            sb_type: BlockSize::Block4x4,
            ..Default::default()
        };
        mi.bmi[2].mode = PredictionMode::TmPred;
        assert_eq!(mi.sub_mode(2), PredictionMode::TmPred);

        mi.sb_type = BlockSize::Block8x8;
        mi.mode = PredictionMode::HPred;
        assert_eq!(mi.sub_mode(2), PredictionMode::HPred);
    }

    #[test]
    fn test_block_edges() {
        let edges = BlockEdges::new(2, 3, 2, 2, 8, 8);
        assert_eq!(edges.to_left, -192);
        assert_eq!(edges.to_top, -128);
        assert_eq!(edges.to_right, 192);
        assert_eq!(edges.to_bottom, 256);

        let edges = BlockEdges::new(0, 6, 8, 8, 8, 8);
        assert_eq!(edges.to_right, -384);
    }

    #[test]
    fn test_strip_round_trip() {
        let mut map = SegmentationMap::new(4, 16);
        let mut strip = map.strip(8, 16);
        assert_eq!(strip.col_origin(), 8);
        strip.set_block(1, 9, 2, 2, 5);
        map.merge_strip(&strip);

        assert_eq!(*map.get(1, 9), 5);
        assert_eq!(*map.get(2, 10), 5);
        assert_eq!(*map.get(1, 8), 0);
    }

    #[test]
    fn test_segment_min_and_copy() {
        let mut prev = SegmentationMap::new(4, 4);
        prev.set_block(0, 0, 2, 2, 6);
        *prev.get_mut(1, 1) = 3;
        assert_eq!(prev.min_in_block(0, 0, 2, 2), 3);

        let mut cur = SegmentationMap::new(4, 4);
        cur.copy_block(&prev, 0, 0, 2, 2);
        assert_eq!(*cur.get(0, 1), 6);
        assert_eq!(*cur.get(1, 1), 3);
    }

    #[test]
    fn test_motion_vector_map() {
        let mut grid = ModeInfoGrid::new(2, 2);
        let mi = ModeInfo {
            ref_frame: [RefFrame::Golden, RefFrame::None],
            mv: [MotionVector::new(4, -8), MotionVector::zero()],
            ..Default::default()
        };
        grid.set_block(1, 1, 1, 1, mi);
        let mvs = grid.motion_vectors();
        assert_eq!(mvs.get(1, 1).ref_frame[0], RefFrame::Golden);
        assert_eq!(mvs.get(1, 1).mv[0], MotionVector::new(4, -8));
        assert_eq!(mvs.get(0, 0).ref_frame[0], RefFrame::Intra);
    }
}
