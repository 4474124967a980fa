//! VP9 Inter Prediction
//!
//! Motion-compensated prediction from reference frames:
//! - Optional reference scaling when the reference differs in size
//! - Edge emulation when the filter footprint leaves the reference
//! - 8-tap sub-pixel interpolation with step sizes for scaled references
//! - Compound averaging and sub-8x8 chroma vector averaging

use super::block::{BlockEdges, ModeInfo};
use super::frame::{FrameBuffer, Plane};
use super::tables::MotionVector;
use crate::error::{Error, Result};

/// Fractional bits of a q4 position
pub const SUBPEL_BITS: i32 = 4;
pub const SUBPEL_MASK: i32 = (1 << SUBPEL_BITS) - 1;
pub const SUBPEL_SHIFTS: i32 = 1 << SUBPEL_BITS;
pub const SUBPEL_TAPS: usize = 8;
/// Pixels needed past a block edge by the 8-tap filters
pub const INTERP_EXTEND: i32 = 4;

const FILTER_BITS: i32 = 7;
const REF_SCALE_SHIFT: i32 = 14;
const REF_NO_SCALE: i32 = 1 << REF_SCALE_SHIFT;
const REF_INVALID_SCALE: i32 = -1;

/// Fixed-point mapping from current-frame positions to reference positions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleFactors {
    /// Horizontal scale in Q14
    pub x_scale_fp: i32,
    /// Vertical scale in Q14
    pub y_scale_fp: i32,
    /// Horizontal source step per output pixel in q4
    pub x_step_q4: i32,
    /// Vertical source step per output pixel in q4
    pub y_step_q4: i32,
}

impl Default for ScaleFactors {
    fn default() -> Self {
        ScaleFactors {
            x_scale_fp: REF_NO_SCALE,
            y_scale_fp: REF_NO_SCALE,
            x_step_q4: 16,
            y_step_q4: 16,
        }
    }
}

impl ScaleFactors {
    /// Scale factors for predicting a `this_w x this_h` frame from an
    /// `other_w x other_h` reference
    ///
    /// A reference more than twice as large or sixteen times smaller than
    /// the current frame yields invalid factors.
    pub fn new(other_w: u32, other_h: u32, this_w: u32, this_h: u32) -> Self {
        let valid = this_w > 0
            && this_h > 0
            && 2 * this_w >= other_w
            && 2 * this_h >= other_h
            && this_w <= 16 * other_w
            && this_h <= 16 * other_h;
        if !valid {
            return ScaleFactors {
                x_scale_fp: REF_INVALID_SCALE,
                y_scale_fp: REF_INVALID_SCALE,
                x_step_q4: 0,
                y_step_q4: 0,
            };
        }

        let x_scale_fp = ((other_w as i64) << REF_SCALE_SHIFT) / this_w as i64;
        let y_scale_fp = ((other_h as i64) << REF_SCALE_SHIFT) / this_h as i64;
        let mut sf = ScaleFactors {
            x_scale_fp: x_scale_fp as i32,
            y_scale_fp: y_scale_fp as i32,
            x_step_q4: 0,
            y_step_q4: 0,
        };
        sf.x_step_q4 = sf.scale_x(16);
        sf.y_step_q4 = sf.scale_y(16);
        sf
    }

    pub fn is_valid(&self) -> bool {
        self.x_scale_fp != REF_INVALID_SCALE && self.y_scale_fp != REF_INVALID_SCALE
    }

    pub fn is_scaled(&self) -> bool {
        self.is_valid() && (self.x_scale_fp != REF_NO_SCALE || self.y_scale_fp != REF_NO_SCALE)
    }

    #[inline]
    pub fn scale_x(&self, val: i32) -> i32 {
        ((val as i64 * self.x_scale_fp as i64) >> REF_SCALE_SHIFT) as i32
    }

    #[inline]
    pub fn scale_y(&self, val: i32) -> i32 {
        ((val as i64 * self.y_scale_fp as i64) >> REF_SCALE_SHIFT) as i32
    }

    /// Scale a q4 vector anchored at luma position (x, y), keeping the
    /// sub-pel phase of the anchor
    pub fn scale_mv(&self, mv_row: i32, mv_col: i32, x: i32, y: i32) -> (i32, i32) {
        let x_off_q4 = self.scale_x(x << SUBPEL_BITS) & SUBPEL_MASK;
        let y_off_q4 = self.scale_y(y << SUBPEL_BITS) & SUBPEL_MASK;
        (
            self.scale_y(mv_row) + y_off_q4,
            self.scale_x(mv_col) + x_off_q4,
        )
    }
}

/// A reference frame with its scale factors
#[derive(Clone, Copy)]
pub struct InterRef<'a> {
    pub frame: &'a FrameBuffer,
    pub scale: ScaleFactors,
}

/// Clamp a vector so the block stays within the emulated border, returned
/// in q4 units of the plane
pub fn clamp_mv_to_umv_border(
    edges: &BlockEdges,
    mv: MotionVector,
    bw: i32,
    bh: i32,
    ss_x: usize,
    ss_y: usize,
) -> (i32, i32) {
    let spel_left = (INTERP_EXTEND + bw) << SUBPEL_BITS;
    let spel_right = spel_left - SUBPEL_SHIFTS;
    let spel_top = (INTERP_EXTEND + bh) << SUBPEL_BITS;
    let spel_bottom = spel_top - SUBPEL_SHIFTS;

    let row = mv.row as i32 * (1 << (1 - ss_y));
    let col = mv.col as i32 * (1 << (1 - ss_x));

    let min_col = edges.to_left * (1 << (1 - ss_x)) - spel_left;
    let max_col = edges.to_right * (1 << (1 - ss_x)) + spel_right;
    let min_row = edges.to_top * (1 << (1 - ss_y)) - spel_top;
    let max_row = edges.to_bottom * (1 << (1 - ss_y)) + spel_bottom;

    (clamp(row, min_row, max_row), clamp(col, min_col, max_col))
}

#[inline]
fn clamp(value: i32, low: i32, high: i32) -> i32 {
    if value < low {
        low
    } else if value > high {
        high
    } else {
        value
    }
}

fn round_mv_comp_q4(value: i32) -> i16 {
    ((if value < 0 { value - 2 } else { value + 2 }) / 4) as i16
}

fn round_mv_comp_q2(value: i32) -> i16 {
    ((if value < 0 { value - 1 } else { value + 1 }) / 2) as i16
}

/// Vector used by a subsampled plane for the 4x4 unit `block` of a sub-8x8
/// block
pub fn average_split_mvs(mi: &ModeInfo, ss_x: usize, ss_y: usize, reference: usize, block: usize) -> MotionVector {
    let mv = |b: usize| mi.bmi[b.min(3)].mv[reference];
    match (ss_x > 0, ss_y > 0) {
        (false, false) => mv(block),
        (false, true) => {
            let (a, b) = (mv(block), mv(block + 2));
            MotionVector::new(
                round_mv_comp_q2(a.row as i32 + b.row as i32),
                round_mv_comp_q2(a.col as i32 + b.col as i32),
            )
        }
        (true, false) => {
            let (a, b) = (mv(block), mv(block + 1));
            MotionVector::new(
                round_mv_comp_q2(a.row as i32 + b.row as i32),
                round_mv_comp_q2(a.col as i32 + b.col as i32),
            )
        }
        (true, true) => {
            let row: i32 = (0..4).map(|b| mv(b).row as i32).sum();
            let col: i32 = (0..4).map(|b| mv(b).col as i32).sum();
            MotionVector::new(round_mv_comp_q4(row), round_mv_comp_q4(col))
        }
    }
}

/// Copy a `b_w x b_h` window at (x, y) of a reference plane, replicating
/// the nearest edge sample for positions outside `frame_w x frame_h`
pub fn build_mc_border(
    plane: &Plane,
    x: i32,
    y: i32,
    b_w: usize,
    b_h: usize,
    frame_w: i32,
    frame_h: i32,
) -> Vec<u16> {
    let mut out = vec![0u16; b_w * b_h];
    for (r, row) in out.chunks_mut(b_w).enumerate() {
        let ref_y = (y + r as i32).clamp(0, frame_h - 1) as usize;
        let base = ref_y * plane.stride;
        let left = (-x).clamp(0, b_w as i32) as usize;
        let right = (x + b_w as i32 - frame_w).clamp(0, b_w as i32) as usize;
        let copy = b_w - left - right;

        if left > 0 {
            row[..left].fill(plane.data[base]);
        }
        if copy > 0 {
            let start = base + (x + left as i32) as usize;
            row[left..left + copy].copy_from_slice(&plane.data[start..start + copy]);
        }
        if right > 0 {
            row[b_w - right..].fill(plane.data[base + frame_w as usize - 1]);
        }
    }
    out
}

/// Flat view of source samples around the prediction origin
struct Source<'a> {
    data: &'a [u16],
    origin: isize,
    stride: isize,
}

impl Source<'_> {
    /// Sample at (dx, dy) from the origin; reads outside the buffer only
    /// happen under zero filter taps and yield 0
    #[inline(always)]
    fn at(&self, dx: isize, dy: isize) -> i32 {
        let idx = self.origin + dy * self.stride + dx;
        if idx < 0 {
            0
        } else {
            self.data.get(idx as usize).copied().unwrap_or(0) as i32
        }
    }
}

#[inline(always)]
fn clip_pixel(val: i32, bd: u8) -> u16 {
    val.clamp(0, (1 << bd) - 1) as u16
}

#[inline(always)]
fn round_filter(sum: i32) -> i32 {
    (sum + (1 << (FILTER_BITS - 1))) >> FILTER_BITS
}

/// Two-pass 8-tap convolution with q4 steps
///
/// The horizontal pass writes `((h - 1) * y_step + y0) / 16 + 8` rows
/// starting three rows above the origin; the vertical pass then filters
/// those rows. Both passes round and clip to the bit depth.
#[allow(clippy::too_many_arguments)]
fn convolve(
    src: &Source,
    dst: &mut [u16],
    dst_stride: usize,
    kernel: &[[i16; 8]; 16],
    x0_q4: i32,
    x_step_q4: i32,
    y0_q4: i32,
    y_step_q4: i32,
    w: usize,
    h: usize,
    bd: u8,
    average: bool,
) {
    if x0_q4 == 0 && y0_q4 == 0 && x_step_q4 == 16 && y_step_q4 == 16 {
        for r in 0..h {
            let row = &mut dst[r * dst_stride..r * dst_stride + w];
            for (c, out) in row.iter_mut().enumerate() {
                let p = src.at(c as isize, r as isize) as u16;
                *out = if average { ((*out as u32 + p as u32 + 1) >> 1) as u16 } else { p };
            }
        }
        return;
    }

    let taps = SUBPEL_TAPS as isize;
    let half = taps / 2 - 1;
    let intermediate_h = ((((h as i32 - 1) * y_step_q4 + y0_q4) >> SUBPEL_BITS) + SUBPEL_TAPS as i32) as usize;
    let mut temp = vec![0u16; w * intermediate_h];

    for r in 0..intermediate_h {
        let sy = r as isize - half;
        let mut x_q4 = x0_q4;
        for c in 0..w {
            let sx = (x_q4 >> SUBPEL_BITS) as isize - half;
            let filter = &kernel[(x_q4 & SUBPEL_MASK) as usize];
            let mut sum = 0i32;
            for k in 0..taps {
                sum += src.at(sx + k, sy) * filter[k as usize] as i32;
            }
            temp[r * w + c] = clip_pixel(round_filter(sum), bd);
            x_q4 += x_step_q4;
        }
    }

    for c in 0..w {
        let mut y_q4 = y0_q4;
        for r in 0..h {
            let sy = (y_q4 >> SUBPEL_BITS) as usize;
            let filter = &kernel[(y_q4 & SUBPEL_MASK) as usize];
            let mut sum = 0i32;
            for k in 0..SUBPEL_TAPS {
                sum += temp[(sy + k) * w + c] as i32 * filter[k] as i32;
            }
            let p = clip_pixel(round_filter(sum), bd);
            let out = &mut dst[r * dst_stride + c];
            *out = if average { ((*out as u32 + p as u32 + 1) >> 1) as u16 } else { p };
            y_q4 += y_step_q4;
        }
    }
}

/// Geometry of one prediction call inside a block
#[derive(Debug, Clone, Copy)]
pub struct PredictionRegion {
    /// Plane index
    pub plane: usize,
    /// Whole block size in plane pixels
    pub bw: i32,
    pub bh: i32,
    /// Offset of the predicted region inside the block
    pub x: i32,
    pub y: i32,
    /// Predicted region size
    pub w: usize,
    pub h: usize,
    /// Luma pixel position of the block
    pub mi_x: i32,
    pub mi_y: i32,
}

/// Predict one region of one plane from one reference
///
/// `average` blends into the existing destination for the second reference
/// of a compound block.
#[allow(clippy::too_many_arguments)]
pub fn build_inter_predictor(
    dst: &mut Plane,
    reference: &InterRef,
    edges: &BlockEdges,
    region: &PredictionRegion,
    mv: MotionVector,
    kernel: &[[i16; 8]; 16],
    bd: u8,
    average: bool,
) -> Result<()> {
    let sf = &reference.scale;
    if !sf.is_valid() {
        return Err(Error::unsupported_bitstream(
            "Reference frame has invalid dimensions",
        ));
    }

    let (ss_x, ss_y) = reference.frame.plane_subsampling(region.plane);
    let ref_plane = reference.frame.plane(region.plane);
    let frame_w = ref_plane.width as i32;
    let frame_h = ref_plane.height as i32;

    let x_start = -edges.to_left >> (3 + ss_x);
    let y_start = -edges.to_top >> (3 + ss_y);

    let (mut x0, mut y0, mut x0_16, mut y0_16, mv_row, mv_col, xs, ys);
    if sf.is_scaled() {
        let (row_q4, col_q4) =
            clamp_mv_to_umv_border(edges, mv, region.bw, region.bh, ss_x, ss_y);
        let x0_px = x_start + region.x;
        let y0_px = y_start + region.y;
        x0_16 = sf.scale_x(x0_px << SUBPEL_BITS);
        y0_16 = sf.scale_y(y0_px << SUBPEL_BITS);
        x0 = sf.scale_x(x0_px);
        y0 = sf.scale_y(y0_px);
        let (r, c) = sf.scale_mv(row_q4, col_q4, region.mi_x + region.x, region.mi_y + region.y);
        mv_row = r;
        mv_col = c;
        xs = sf.x_step_q4;
        ys = sf.y_step_q4;
    } else {
        x0 = x_start + region.x;
        y0 = y_start + region.y;
        x0_16 = x0 << SUBPEL_BITS;
        y0_16 = y0 << SUBPEL_BITS;
        mv_row = mv.row as i32 * (1 << (1 - ss_y));
        mv_col = mv.col as i32 * (1 << (1 - ss_x));
        xs = 16;
        ys = 16;
    }

    let subpel_x = mv_col & SUBPEL_MASK;
    let subpel_y = mv_row & SUBPEL_MASK;
    x0 += mv_col >> SUBPEL_BITS;
    y0 += mv_row >> SUBPEL_BITS;
    x0_16 += mv_col;
    y0_16 += mv_row;

    let w = region.w as i32;
    let h = region.h as i32;
    let mut x1 = ((x0_16 + (w - 1) * xs) >> SUBPEL_BITS) + 1;
    let mut y1 = ((y0_16 + (h - 1) * ys) >> SUBPEL_BITS) + 1;
    let mut x_pad = 0;
    let mut y_pad = 0;
    let (mut fx0, mut fy0) = (x0, y0);

    if subpel_x != 0 || sf.x_step_q4 != 16 {
        fx0 -= INTERP_EXTEND - 1;
        x1 += INTERP_EXTEND;
        x_pad = 1;
    }
    if subpel_y != 0 || sf.y_step_q4 != 16 {
        fy0 -= INTERP_EXTEND - 1;
        y1 += INTERP_EXTEND;
        y_pad = 1;
    }

    let dst_offset = dst.offset((x_start + region.x) as usize, (y_start + region.y) as usize);
    let dst_stride = dst.stride;
    let out = &mut dst.data[dst_offset..];

    let outside = fx0 < 0 || x1 > frame_w - 1 || fy0 < 0 || y1 > frame_h - 1;
    if outside {
        let b_w = (x1 - fx0 + 1) as usize;
        let b_h = (y1 - fy0 + 1) as usize;
        let border = build_mc_border(ref_plane, fx0, fy0, b_w, b_h, frame_w, frame_h);
        let src = Source {
            data: &border,
            origin: (y_pad * 3 * b_w + x_pad * 3) as isize,
            stride: b_w as isize,
        };
        convolve(
            &src, out, dst_stride, kernel, subpel_x, xs, subpel_y, ys, region.w, region.h, bd,
            average,
        );
    } else {
        let src = Source {
            data: &ref_plane.data,
            origin: (y0 as isize) * ref_plane.stride as isize + x0 as isize,
            stride: ref_plane.stride as isize,
        };
        convolve(
            &src, out, dst_stride, kernel, subpel_x, xs, subpel_y, ys, region.w, region.h, bd,
            average,
        );
    }

    Ok(())
}

/// Build the inter prediction of every plane of a block
///
/// `n4` holds each plane's block size in 4x4 units. Sub-8x8 blocks predict
/// each 4x4 unit with its own (possibly averaged) vector.
#[allow(clippy::too_many_arguments)]
pub fn build_inter_predictors_sb(
    dst: &mut FrameBuffer,
    mi: &ModeInfo,
    refs: [Option<&InterRef>; 2],
    edges: &BlockEdges,
    mi_row: usize,
    mi_col: usize,
    n4: [(usize, usize); 3],
    bd: u8,
) -> Result<()> {
    let kernel = mi.interp_filter.kernel();
    let mi_x = mi_col as i32 * 8;
    let mi_y = mi_row as i32 * 8;
    let sub8x8 = mi.sb_type.is_sub8x8();

    for (reference, inter_ref) in refs.iter().enumerate() {
        let Some(inter_ref) = inter_ref else {
            continue;
        };
        let average = reference == 1;

        for (plane, &(n4w, n4h)) in n4.iter().enumerate() {
            let (ss_x, ss_y) = dst.plane_subsampling(plane);
            let bw = 4 * n4w as i32;
            let bh = 4 * n4h as i32;

            if sub8x8 {
                let mut block = 0;
                for y in 0..n4h as i32 {
                    for x in 0..n4w as i32 {
                        let mv = average_split_mvs(mi, ss_x, ss_y, reference, block);
                        block += 1;
                        let region = PredictionRegion {
                            plane,
                            bw,
                            bh,
                            x: 4 * x,
                            y: 4 * y,
                            w: 4,
                            h: 4,
                            mi_x,
                            mi_y,
                        };
                        build_inter_predictor(
                            dst.plane_mut(plane),
                            inter_ref,
                            edges,
                            &region,
                            mv,
                            kernel,
                            bd,
                            average,
                        )?;
                    }
                }
            } else {
                let region = PredictionRegion {
                    plane,
                    bw,
                    bh,
                    x: 0,
                    y: 0,
                    w: bw as usize,
                    h: bh as usize,
                    mi_x,
                    mi_y,
                };
                build_inter_predictor(
                    dst.plane_mut(plane),
                    inter_ref,
                    edges,
                    &region,
                    mi.mv[reference],
                    kernel,
                    bd,
                    average,
                )?;
            }
        }
    }
    Ok(())
}
