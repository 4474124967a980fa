//! VP9 Loop Filter Levels
//!
//! The deblocking filter itself runs after the tile decode. While blocks are
//! decoded the core hands every block to a `LoopFilterMaskBuilder`, which
//! records what the filter needs: the block's filter level, transform size
//! and whether its inner edges may be skipped.

use super::block::{MiMap, ModeInfo};
use super::frame::{LoopFilterParams, SegLevelFeature, SegmentationParams, MAX_SEGMENTS};
use super::tables::{BlockSize, PredictionMode, TxSize, MAX_REF_FRAMES};

/// Highest loop filter level
pub const MAX_LOOP_FILTER: i32 = 63;

/// Number of mode deltas (zero motion, other)
pub const MAX_MODE_LF_DELTAS: usize = 2;

/// Receives every decoded block when the frame's filter level is non-zero
pub trait LoopFilterMaskBuilder {
    /// Record a block covering `x_mis x y_mis` in-frame mi units at
    /// (mi_row, mi_col)
    fn build_mask(&mut self, mi: &ModeInfo, mi_row: usize, mi_col: usize, x_mis: usize, y_mis: usize);
}

/// Mode delta slot for a prediction mode
fn mode_lf_lut(mode: PredictionMode) -> usize {
    match mode {
        PredictionMode::NearestMv | PredictionMode::NearMv | PredictionMode::NewMv => 1,
        _ => 0,
    }
}

/// Filter level for every (segment, reference, mode delta) combination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopFilterLevels {
    lvl: [[[u8; MAX_MODE_LF_DELTAS]; MAX_REF_FRAMES]; MAX_SEGMENTS],
}

impl LoopFilterLevels {
    /// Resolve segment overrides and reference/mode deltas
    pub fn new(params: &LoopFilterParams, seg: &SegmentationParams) -> Self {
        let mut lvl = [[[0u8; MAX_MODE_LF_DELTAS]; MAX_REF_FRAMES]; MAX_SEGMENTS];
        let default_level = params.level as i32;
        // Deltas are doubled once the base level reaches 32
        let scale = 1 << (default_level >> 5);

        for (segment_id, seg_lvl) in lvl.iter_mut().enumerate() {
            let mut lvl_seg = default_level;
            if seg.feature_active(segment_id as u8, SegLevelFeature::AltLf) {
                let data = seg.feature_data(segment_id as u8, SegLevelFeature::AltLf) as i32;
                lvl_seg = if seg.abs_delta {
                    data
                } else {
                    default_level + data
                }
                .clamp(0, MAX_LOOP_FILTER);
            }

            if !params.delta_enabled {
                *seg_lvl = [[lvl_seg as u8; MAX_MODE_LF_DELTAS]; MAX_REF_FRAMES];
                continue;
            }

            let intra_lvl = lvl_seg + params.ref_deltas[0] as i32 * scale;
            seg_lvl[0][0] = intra_lvl.clamp(0, MAX_LOOP_FILTER) as u8;
            for (ref_frame, ref_lvl) in seg_lvl.iter_mut().enumerate().skip(1) {
                for (mode, level) in ref_lvl.iter_mut().enumerate() {
                    let inter_lvl = lvl_seg
                        + params.ref_deltas[ref_frame] as i32 * scale
                        + params.mode_deltas[mode] as i32 * scale;
                    *level = inter_lvl.clamp(0, MAX_LOOP_FILTER) as u8;
                }
            }
        }

        LoopFilterLevels { lvl }
    }

    /// Filter level of a decoded block
    pub fn level(&self, mi: &ModeInfo) -> u8 {
        self.lvl[mi.segment_id as usize & (MAX_SEGMENTS - 1)][mi.ref_frame[0].index()]
            [mode_lf_lut(mi.mode)]
    }
}

/// What the deblocking filter needs to know about one 8x8 unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterEntry {
    pub level: u8,
    /// Inner transform edges can be skipped (skipped inter block)
    pub skip_inner: bool,
    pub tx_size: TxSize,
    pub block_size: BlockSize,
}

impl Default for FilterEntry {
    fn default() -> Self {
        FilterEntry {
            level: 0,
            skip_inner: false,
            tx_size: TxSize::Tx4x4,
            block_size: BlockSize::Block8x8,
        }
    }
}

/// Per-8x8 filter information for a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterLevelMap {
    levels: LoopFilterLevels,
    entries: MiMap<FilterEntry>,
}

impl FilterLevelMap {
    pub fn new(params: &LoopFilterParams, seg: &SegmentationParams, mi_rows: usize, mi_cols: usize) -> Self {
        FilterLevelMap {
            levels: LoopFilterLevels::new(params, seg),
            entries: MiMap::new(mi_rows, mi_cols),
        }
    }

    pub fn entry(&self, mi_row: usize, mi_col: usize) -> &FilterEntry {
        self.entries.get(mi_row, mi_col)
    }

    /// Columns `[col_start, col_end)` as a standalone map
    pub fn strip(&self, col_start: usize, col_end: usize) -> Self {
        FilterLevelMap {
            levels: self.levels.clone(),
            entries: self.entries.strip(col_start, col_end),
        }
    }

    pub fn merge_strip(&mut self, strip: &FilterLevelMap) {
        self.entries.merge_strip(&strip.entries);
    }
}

impl LoopFilterMaskBuilder for FilterLevelMap {
    fn build_mask(&mut self, mi: &ModeInfo, mi_row: usize, mi_col: usize, x_mis: usize, y_mis: usize) {
        let entry = FilterEntry {
            level: self.levels.level(mi),
            skip_inner: mi.skip && mi.is_inter_block(),
            tx_size: mi.tx_size,
            block_size: mi.sb_type,
        };
        self.entries.set_block(mi_row, mi_col, x_mis, y_mis, entry);
    }
}
