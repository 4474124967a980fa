//! VP9 Frame State
//!
//! This module holds the per-frame inputs the tile decoder consumes and the
//! pixel storage it writes:
//! - `FrameHeader`: values parsed from the uncompressed and compressed
//!   headers by the caller
//! - Loop filter, quantization and segmentation parameters
//! - `Plane` and `FrameBuffer`: `u16` sample planes for every bit depth,
//!   splittable into column strips for tile-parallel decoding

use crate::error::{Error, Result};

use super::tables::{InterpFilter, RefFrame, ReferenceMode, TxMode, MAX_REF_FRAMES};
use super::tile::tile_cols_log2_range;

/// Frame types in VP9
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    KeyFrame = 0,
    InterFrame = 1,
}

/// Loop filter parameters
#[derive(Debug, Clone, Default)]
pub struct LoopFilterParams {
    /// Filter level (0-63)
    pub level: u8,
    /// Sharpness level (0-7)
    pub sharpness: u8,
    /// Delta values enabled
    pub delta_enabled: bool,
    /// Reference frame deltas (INTRA, LAST, GOLDEN, ALTREF)
    pub ref_deltas: [i8; 4],
    /// Mode deltas (0=zero_mv, 1=non_zero_mv)
    pub mode_deltas: [i8; 2],
}

/// Quantization parameters
#[derive(Debug, Clone, Default)]
pub struct QuantizationParams {
    /// Base quantizer index (0-255)
    pub base_q_idx: u8,
    /// Y DC delta
    pub y_dc_delta: i8,
    /// UV DC delta
    pub uv_dc_delta: i8,
    /// UV AC delta
    pub uv_ac_delta: i8,
}

impl QuantizationParams {
    /// Lossless mode: base index and every delta zero
    pub fn is_lossless(&self) -> bool {
        self.base_q_idx == 0
            && self.y_dc_delta == 0
            && self.uv_dc_delta == 0
            && self.uv_ac_delta == 0
    }
}

/// Segment features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegLevelFeature {
    AltQ = 0,
    AltLf = 1,
    RefFrame = 2,
    Skip = 3,
}

pub const MAX_SEGMENTS: usize = 8;
pub const SEG_LVL_MAX: usize = 4;

/// One segment feature value
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentFeature {
    pub enabled: bool,
    pub value: i16,
}

/// Segmentation parameters
#[derive(Debug, Clone, Default)]
pub struct SegmentationParams {
    /// Segmentation enabled
    pub enabled: bool,
    /// Segment ids are coded this frame
    pub update_map: bool,
    /// Segment ids are predicted from the previous map
    pub temporal_update: bool,
    /// Feature values replace instead of adjust the frame values
    pub abs_delta: bool,
    /// Segment feature data, 8 segments with 4 features each
    pub features: [[SegmentFeature; SEG_LVL_MAX]; MAX_SEGMENTS],
}

impl SegmentationParams {
    /// Whether a feature is active for a segment
    pub fn feature_active(&self, segment_id: u8, feature: SegLevelFeature) -> bool {
        self.enabled && self.features[segment_id as usize][feature as usize].enabled
    }

    pub fn feature_data(&self, segment_id: u8, feature: SegLevelFeature) -> i16 {
        self.features[segment_id as usize][feature as usize].value
    }

    pub fn set_feature(&mut self, segment_id: u8, feature: SegLevelFeature, value: i16) {
        self.features[segment_id as usize][feature as usize] = SegmentFeature {
            enabled: true,
            value,
        };
    }

    /// Quantizer index for a segment
    pub fn qindex(&self, segment_id: u8, base_q_idx: u8) -> u8 {
        if self.feature_active(segment_id, SegLevelFeature::AltQ) {
            let data = self.feature_data(segment_id, SegLevelFeature::AltQ) as i32;
            let q = if self.abs_delta {
                data
            } else {
                base_q_idx as i32 + data
            };
            q.clamp(0, 255) as u8
        } else {
            base_q_idx
        }
    }
}

/// Frame-level values the tile decoder needs
///
/// Everything here comes from the uncompressed and compressed frame headers,
/// which are parsed outside this crate.
#[derive(Debug, Clone)]
pub struct FrameHeader {
    /// Frame type
    pub frame_type: FrameType,
    /// Intra only flag (for non-key frames)
    pub intra_only: bool,
    /// Bit depth (8, 10, or 12)
    pub bit_depth: u8,
    /// Subsampling X (false = 4:4:4, true = 4:2:x)
    pub subsampling_x: bool,
    /// Subsampling Y (false = 4:2:2 or 4:4:4, true = 4:2:0)
    pub subsampling_y: bool,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Reference frame sign bias, indexed by `RefFrame::index`
    pub ref_frame_sign_bias: [bool; MAX_REF_FRAMES],
    /// Allow high precision motion vectors
    pub allow_high_precision_mv: bool,
    /// Interpolation filter
    pub interp_filter: InterpFilter,
    /// Transform size selection mode
    pub tx_mode: TxMode,
    /// Single, compound or per-block reference mode
    pub reference_mode: ReferenceMode,
    /// Use the previous frame's motion vectors as candidates
    pub use_prev_frame_mvs: bool,
    /// Collect symbol counts for backward adaptation
    pub counts_enabled: bool,
    /// Loop filter parameters
    pub loop_filter: LoopFilterParams,
    /// Quantization parameters
    pub quantization: QuantizationParams,
    /// Segmentation parameters
    pub segmentation: SegmentationParams,
    /// Log2 of tile columns
    pub tile_cols_log2: u8,
    /// Log2 of tile rows
    pub tile_rows_log2: u8,
}

impl Default for FrameHeader {
    fn default() -> Self {
        FrameHeader {
            frame_type: FrameType::KeyFrame,
            intra_only: false,
            bit_depth: 8,
            subsampling_x: true,
            subsampling_y: true,
            width: 0,
            height: 0,
            ref_frame_sign_bias: [false; MAX_REF_FRAMES],
            allow_high_precision_mv: false,
            interp_filter: InterpFilter::EightTap,
            tx_mode: TxMode::Allow32x32,
            reference_mode: ReferenceMode::Single,
            use_prev_frame_mvs: false,
            counts_enabled: true,
            loop_filter: LoopFilterParams::default(),
            quantization: QuantizationParams::default(),
            segmentation: SegmentationParams::default(),
            tile_cols_log2: 0,
            tile_rows_log2: 0,
        }
    }
}

impl FrameHeader {
    /// Check basic consistency before decoding
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_input("Frame has zero dimensions"));
        }
        if !matches!(self.bit_depth, 8 | 10 | 12) {
            return Err(Error::unsupported_bitstream(format!(
                "Unsupported bit depth {}",
                self.bit_depth
            )));
        }
        if self.tile_rows_log2 > 2 || self.tile_cols_log2 > 6 {
            return Err(Error::corrupt_frame("Invalid tile layout"));
        }
        let (min_log2, max_log2) = tile_cols_log2_range(self.sb_cols());
        if self.tile_cols_log2 < min_log2 || self.tile_cols_log2 > max_log2 {
            return Err(Error::invalid_input(format!(
                "{} tile columns do not fit a frame {} pixels wide",
                self.tile_cols(),
                self.width
            )));
        }
        Ok(())
    }

    /// Check if this is a key frame
    pub fn is_keyframe(&self) -> bool {
        self.frame_type == FrameType::KeyFrame
    }

    /// Key frames and intra-only frames use the intra mode-info syntax
    pub fn is_intra_only(&self) -> bool {
        self.frame_type == FrameType::KeyFrame || self.intra_only
    }

    pub fn lossless(&self) -> bool {
        self.quantization.is_lossless()
    }

    /// Get number of superblocks in width
    pub fn sb_cols(&self) -> usize {
        ((self.width + 63) / 64) as usize
    }

    /// Get number of superblocks in height
    pub fn sb_rows(&self) -> usize {
        ((self.height + 63) / 64) as usize
    }

    /// Get number of mode info blocks (8x8) in width
    pub fn mi_cols(&self) -> usize {
        ((self.width + 7) / 8) as usize
    }

    /// Get number of mode info blocks (8x8) in height
    pub fn mi_rows(&self) -> usize {
        ((self.height + 7) / 8) as usize
    }

    pub fn tile_cols(&self) -> usize {
        1 << self.tile_cols_log2
    }

    pub fn tile_rows(&self) -> usize {
        1 << self.tile_rows_log2
    }

    /// Fixed and variable references for compound prediction
    ///
    /// The fixed reference is the one whose sign bias differs from the other
    /// two.
    pub fn compound_refs(&self) -> (RefFrame, [RefFrame; 2]) {
        let bias = |r: RefFrame| self.ref_frame_sign_bias[r.index()];
        if bias(RefFrame::Last) == bias(RefFrame::Golden) {
            (RefFrame::AltRef, [RefFrame::Last, RefFrame::Golden])
        } else if bias(RefFrame::Last) == bias(RefFrame::AltRef) {
            (RefFrame::Golden, [RefFrame::Last, RefFrame::AltRef])
        } else {
            (RefFrame::Last, [RefFrame::Golden, RefFrame::AltRef])
        }
    }
}

/// One plane of samples
///
/// A plane may be a column strip of a larger plane: `x_origin` is the plane
/// x of the strip's first column, while `width` and `height` stay the
/// visible size of the full plane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plane {
    pub data: Vec<u16>,
    pub stride: usize,
    /// Visible width of the full plane
    pub width: usize,
    /// Visible height of the full plane
    pub height: usize,
    /// Plane x of column 0 of `data`
    pub x_origin: usize,
}

impl Plane {
    /// Allocate a zeroed plane of `alloc_width x alloc_height` samples
    pub fn new(width: usize, height: usize, alloc_width: usize, alloc_height: usize) -> Self {
        Plane {
            data: vec![0; alloc_width * alloc_height],
            stride: alloc_width,
            width,
            height,
            x_origin: 0,
        }
    }

    /// Number of allocated rows
    pub fn rows(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    /// Index of plane position (x, y) in `data`
    #[inline(always)]
    pub fn offset(&self, x: usize, y: usize) -> usize {
        y * self.stride + (x - self.x_origin)
    }

    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> u16 {
        self.data[self.offset(x, y)]
    }

    /// Copy columns `[x_start, x_end)` into a standalone strip
    pub fn strip(&self, x_start: usize, x_end: usize) -> Plane {
        let x_end = x_end.min(self.x_origin + self.stride);
        let width = x_end.saturating_sub(x_start);
        let rows = self.rows();
        let mut data = Vec::with_capacity(width * rows);
        for row in self.data.chunks(self.stride) {
            let start = x_start - self.x_origin;
            data.extend_from_slice(&row[start..start + width]);
        }
        Plane {
            data,
            stride: width,
            width: self.width,
            height: self.height,
            x_origin: x_start,
        }
    }

    /// Write a strip back into this plane
    pub fn merge_strip(&mut self, strip: &Plane) {
        if strip.stride == 0 {
            return;
        }
        let start = strip.x_origin - self.x_origin;
        let width = strip.stride;
        for (dst, src) in self
            .data
            .chunks_mut(self.stride)
            .zip(strip.data.chunks(strip.stride))
        {
            dst[start..start + width].copy_from_slice(src);
        }
    }
}

/// A picture: three planes with shared geometry
///
/// The default value is an empty placeholder with no samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pub subsampling_x: bool,
    pub subsampling_y: bool,
    pub bit_depth: u8,
    pub planes: [Plane; 3],
}

impl FrameBuffer {
    /// Allocate a frame; planes are padded to whole superblocks so blocks
    /// crossing the visible edge can be written in full
    pub fn new(width: u32, height: u32, subsampling_x: bool, subsampling_y: bool, bit_depth: u8) -> Self {
        let alloc_w = ((width as usize + 63) & !63).max(64);
        let alloc_h = ((height as usize + 63) & !63).max(64);
        let (ssx, ssy) = (subsampling_x as usize, subsampling_y as usize);
        let uv_w = (width as usize + ssx) >> ssx;
        let uv_h = (height as usize + ssy) >> ssy;

        FrameBuffer {
            width,
            height,
            subsampling_x,
            subsampling_y,
            bit_depth,
            planes: [
                Plane::new(width as usize, height as usize, alloc_w, alloc_h),
                Plane::new(uv_w, uv_h, alloc_w >> ssx, alloc_h >> ssy),
                Plane::new(uv_w, uv_h, alloc_w >> ssx, alloc_h >> ssy),
            ],
        }
    }

    /// Allocate a frame matching a header
    pub fn for_header(header: &FrameHeader) -> Self {
        Self::new(
            header.width,
            header.height,
            header.subsampling_x,
            header.subsampling_y,
            header.bit_depth,
        )
    }

    /// Fill every plane with one value
    pub fn fill(&mut self, value: u16) {
        for plane in self.planes.iter_mut() {
            plane.data.fill(value);
        }
    }

    pub fn plane(&self, index: usize) -> &Plane {
        &self.planes[index]
    }

    pub fn plane_mut(&mut self, index: usize) -> &mut Plane {
        &mut self.planes[index]
    }

    /// Subsampling shift of a plane
    pub fn plane_subsampling(&self, index: usize) -> (usize, usize) {
        if index == 0 {
            (0, 0)
        } else {
            (self.subsampling_x as usize, self.subsampling_y as usize)
        }
    }

    /// Copy the luma columns `[x_start, x_end)` and the matching chroma
    /// columns into a strip frame
    pub fn strip(&self, x_start: usize, x_end: usize) -> FrameBuffer {
        let ssx = self.subsampling_x as usize;
        FrameBuffer {
            width: self.width,
            height: self.height,
            subsampling_x: self.subsampling_x,
            subsampling_y: self.subsampling_y,
            bit_depth: self.bit_depth,
            planes: [
                self.planes[0].strip(x_start, x_end),
                self.planes[1].strip(x_start >> ssx, x_end >> ssx),
                self.planes[2].strip(x_start >> ssx, x_end >> ssx),
            ],
        }
    }

    /// Write a strip frame back
    pub fn merge_strip(&mut self, strip: &FrameBuffer) {
        for (plane, src) in self.planes.iter_mut().zip(strip.planes.iter()) {
            plane.merge_strip(src);
        }
    }
}
