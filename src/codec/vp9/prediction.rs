//! VP9 Intra Prediction
//!
//! VP9 supports 10 intra prediction modes:
//! - DC_PRED: Average of above and left neighbors
//! - V_PRED: Vertical (copy from above)
//! - H_PRED: Horizontal (copy from left)
//! - D45_PRED: 45-degree diagonal (down-left)
//! - D135_PRED: 135-degree diagonal (down-right)
//! - D117_PRED: 117-degree
//! - D153_PRED: 153-degree
//! - D207_PRED: 207-degree (horizontal-up)
//! - D63_PRED: 63-degree (vertical-left)
//! - TM_PRED: True motion (gradient prediction)
//!
//! Prediction works per transform block, reading the reconstructed pixels
//! above and to the left of it in the frame being decoded. Unavailable edges
//! are replaced by `base - 1` (above) and `base + 1` (left) where
//! `base = 128 << (bd - 8)`.

use super::frame::Plane;
use super::tables::{PredictionMode, TxSize};

const NEED_LEFT: u8 = 1 << 1;
const NEED_ABOVE: u8 = 1 << 2;
const NEED_ABOVE_RIGHT: u8 = 1 << 3;

/// Edges each intra mode reads
const EXTEND_MODES: [u8; 10] = [
    NEED_ABOVE | NEED_LEFT, // DC
    NEED_ABOVE,             // V
    NEED_LEFT,              // H
    NEED_ABOVE_RIGHT,       // D45
    NEED_LEFT | NEED_ABOVE, // D135
    NEED_LEFT | NEED_ABOVE, // D117
    NEED_LEFT | NEED_ABOVE, // D153
    NEED_LEFT,              // D207
    NEED_ABOVE_RIGHT,       // D63
    NEED_LEFT | NEED_ABOVE, // TM
];

#[inline(always)]
fn avg2(a: u16, b: u16) -> u16 {
    ((a as u32 + b as u32 + 1) >> 1) as u16
}

#[inline(always)]
fn avg3(a: u16, b: u16, c: u16) -> u16 {
    ((a as u32 + 2 * b as u32 + c as u32 + 2) >> 2) as u16
}

/// Position and neighbourhood of one transform block to predict
#[derive(Debug, Clone, Copy)]
pub struct IntraBlock {
    /// Plane x of the transform block
    pub x: usize,
    /// Plane y of the transform block
    pub y: usize,
    pub mode: PredictionMode,
    pub tx_size: TxSize,
    pub have_top: bool,
    pub have_left: bool,
    /// Above-right pixels belong to the same block
    pub have_right: bool,
    /// Visible plane width
    pub frame_width: usize,
    /// Visible plane height
    pub frame_height: usize,
    /// The enclosing block crosses the right frame edge
    pub clip_right: bool,
    /// The enclosing block crosses the bottom frame edge
    pub clip_bottom: bool,
}

/// Intra predictor with reference samples
pub struct IntraPredictor {
    /// Top-left sample followed by up to 64 above samples
    above: [u16; 65],
    /// Left reference samples
    left: [u16; 32],
    /// Above samples available
    pub have_above: bool,
    /// Left samples available
    pub have_left: bool,
    bit_depth: u8,
}

impl IntraPredictor {
    /// Gather the edges a mode needs from the frame being reconstructed
    pub fn build(plane: &Plane, block: &IntraBlock, bit_depth: u8) -> Self {
        let bs = block.tx_size.size();
        let base = 128u16 << (bit_depth - 8);
        let extend = EXTEND_MODES[block.mode as usize];

        let mut pred = IntraPredictor {
            above: [0; 65],
            left: [0; 32],
            have_above: block.have_top,
            have_left: block.have_left,
            bit_depth,
        };

        if extend & NEED_LEFT != 0 {
            if block.have_left {
                let rows = if block.clip_bottom && block.y + bs > block.frame_height {
                    block.frame_height.saturating_sub(block.y).max(1)
                } else {
                    bs
                };
                for i in 0..bs {
                    let row = block.y + i.min(rows - 1);
                    pred.left[i] = plane.data[plane.offset(block.x - 1, row)];
                }
            } else {
                pred.left[..bs].fill(base + 1);
            }
        }

        if extend & (NEED_ABOVE | NEED_ABOVE_RIGHT) != 0 {
            let width = if extend & NEED_ABOVE_RIGHT != 0 { 2 * bs } else { bs };
            if block.have_top {
                let row = block.y - 1;
                // Real above-right pixels exist only for 4x4 blocks inside
                // the same prediction block
                let mut copy = if width > bs && bs == 4 && block.have_right {
                    width
                } else {
                    bs
                };
                if block.clip_right {
                    copy = copy.min(block.frame_width.saturating_sub(block.x).max(1));
                }
                let start = plane.offset(block.x, row);
                pred.above[1..=copy].copy_from_slice(&plane.data[start..start + copy]);
                let last = pred.above[copy];
                pred.above[copy + 1..=width].fill(last);

                pred.above[0] = if block.have_left {
                    plane.data[plane.offset(block.x - 1, row)]
                } else {
                    base + 1
                };
            } else {
                pred.above[..=width].fill(base - 1);
            }
        }

        pred
    }

    #[inline(always)]
    fn a(&self, i: usize) -> u16 {
        self.above[i + 1]
    }

    #[inline(always)]
    fn top_left(&self) -> u16 {
        self.above[0]
    }

    /// Perform prediction for the given mode
    pub fn predict(&self, mode: PredictionMode, output: &mut [u16], stride: usize, size: usize) {
        match mode {
            PredictionMode::DcPred => self.predict_dc(output, stride, size),
            PredictionMode::VPred => self.predict_v(output, stride, size),
            PredictionMode::HPred => self.predict_h(output, stride, size),
            PredictionMode::D45Pred => self.predict_d45(output, stride, size),
            PredictionMode::D135Pred => self.predict_d135(output, stride, size),
            PredictionMode::D117Pred => self.predict_d117(output, stride, size),
            PredictionMode::D153Pred => self.predict_d153(output, stride, size),
            PredictionMode::D207Pred => self.predict_d207(output, stride, size),
            PredictionMode::D63Pred => self.predict_d63(output, stride, size),
            PredictionMode::TmPred => self.predict_tm(output, stride, size),
            PredictionMode::NearestMv
            | PredictionMode::NearMv
            | PredictionMode::ZeroMv
            | PredictionMode::NewMv => unreachable!("inter mode {:?} in intra prediction", mode),
        }
    }

    fn fill(output: &mut [u16], stride: usize, size: usize, value: u16) {
        for row in output.chunks_mut(stride).take(size) {
            row[..size].fill(value);
        }
    }

    /// DC prediction - average of the available edges
    fn predict_dc(&self, output: &mut [u16], stride: usize, size: usize) {
        let above_sum = || (0..size).map(|i| self.a(i) as u32).sum::<u32>();
        let left_sum = || self.left[..size].iter().map(|&x| x as u32).sum::<u32>();
        let size32 = size as u32;

        let dc = match (self.have_left, self.have_above) {
            (true, true) => (above_sum() + left_sum() + size32) / (2 * size32),
            (false, true) => (above_sum() + size32 / 2) / size32,
            (true, false) => (left_sum() + size32 / 2) / size32,
            (false, false) => 1 << (self.bit_depth - 1),
        };

        Self::fill(output, stride, size, dc as u16);
    }

    /// Vertical prediction - copy from above row
    fn predict_v(&self, output: &mut [u16], stride: usize, size: usize) {
        for row in output.chunks_mut(stride).take(size) {
            row[..size].copy_from_slice(&self.above[1..=size]);
        }
    }

    /// Horizontal prediction - copy from left column
    fn predict_h(&self, output: &mut [u16], stride: usize, size: usize) {
        for (row, &val) in output.chunks_mut(stride).take(size).zip(&self.left) {
            row[..size].fill(val);
        }
    }

    /// True motion prediction - gradient prediction
    fn predict_tm(&self, output: &mut [u16], stride: usize, size: usize) {
        let max = (1i32 << self.bit_depth) - 1;
        let top_left = self.top_left() as i32;
        for (y, row) in output.chunks_mut(stride).take(size).enumerate() {
            let left = self.left[y] as i32;
            for (x, px) in row[..size].iter_mut().enumerate() {
                *px = (left + self.a(x) as i32 - top_left).clamp(0, max) as u16;
            }
        }
    }

    /// D45 prediction - runs down-left from the above row
    fn predict_d45(&self, output: &mut [u16], stride: usize, size: usize) {
        let last = self.a(2 * size - 1);
        for (y, row) in output.chunks_mut(stride).take(size).enumerate() {
            for (x, px) in row[..size].iter_mut().enumerate() {
                let i = x + y;
                *px = if i + 2 < 2 * size {
                    avg3(self.a(i), self.a(i + 1), self.a(i + 2))
                } else {
                    last
                };
            }
        }
    }

    /// D63 prediction - steep diagonal from the above row
    fn predict_d63(&self, output: &mut [u16], stride: usize, size: usize) {
        for (y, row) in output.chunks_mut(stride).take(size).enumerate() {
            for (x, px) in row[..size].iter_mut().enumerate() {
                let i = x + (y >> 1);
                *px = if y & 1 == 0 {
                    avg2(self.a(i), self.a(i + 1))
                } else {
                    avg3(self.a(i), self.a(i + 1), self.a(i + 2))
                };
            }
        }
    }

    /// D207 prediction - shallow diagonal from the left column
    fn predict_d207(&self, output: &mut [u16], stride: usize, size: usize) {
        let l = |i: usize| self.left[i.min(size - 1)];
        for (y, row) in output.chunks_mut(stride).take(size).enumerate() {
            for (x, px) in row[..size].iter_mut().enumerate() {
                let i = y + (x >> 1);
                *px = if x & 1 == 0 {
                    avg2(l(i), l(i + 1))
                } else {
                    avg3(l(i), l(i + 1), l(i + 2))
                };
            }
        }
    }

    /// D135 prediction - runs down-right through the top-left corner
    fn predict_d135(&self, output: &mut [u16], stride: usize, size: usize) {
        // Edge from bottom-left through the corner to top-right
        let mut edge = [0u16; 65];
        for i in 0..size {
            edge[i] = self.left[size - 1 - i];
        }
        edge[size] = self.top_left();
        for i in 0..size {
            edge[size + 1 + i] = self.a(i);
        }

        let mut border = [0u16; 63];
        for j in 0..2 * size - 1 {
            border[j] = avg3(edge[j], edge[j + 1], edge[j + 2]);
        }

        for (y, row) in output.chunks_mut(stride).take(size).enumerate() {
            let start = size - 1 - y;
            row[..size].copy_from_slice(&border[start..start + size]);
        }
    }

    /// D117 prediction
    fn predict_d117(&self, output: &mut [u16], stride: usize, size: usize) {
        let tl = self.top_left();
        let l = &self.left;

        for x in 0..size {
            let left_of = if x == 0 { tl } else { self.a(x - 1) };
            output[x] = avg2(left_of, self.a(x));
        }
        output[stride] = avg3(l[0], tl, self.a(0));
        for x in 1..size {
            let before = if x == 1 { tl } else { self.a(x - 2) };
            output[stride + x] = avg3(before, self.a(x - 1), self.a(x));
        }
        if size > 2 {
            output[2 * stride] = avg3(tl, l[0], l[1]);
        }
        for y in 3..size {
            output[y * stride] = avg3(l[y - 3], l[y - 2], l[y - 1]);
        }
        for y in 2..size {
            for x in 1..size {
                output[y * stride + x] = output[(y - 2) * stride + x - 1];
            }
        }
    }

    /// D153 prediction
    fn predict_d153(&self, output: &mut [u16], stride: usize, size: usize) {
        let tl = self.top_left();
        let l = &self.left;

        output[0] = avg2(tl, l[0]);
        for y in 1..size {
            output[y * stride] = avg2(l[y - 1], l[y]);
        }
        output[1] = avg3(l[0], tl, self.a(0));
        output[stride + 1] = avg3(tl, l[0], l[1]);
        for y in 2..size {
            output[y * stride + 1] = avg3(l[y - 2], l[y - 1], l[y]);
        }
        for x in 2..size {
            let before = if x == 2 { tl } else { self.a(x - 3) };
            output[x] = avg3(before, self.a(x - 2), self.a(x - 1));
        }
        for y in 1..size {
            for x in 2..size {
                output[y * stride + x] = output[(y - 1) * stride + x - 2];
            }
        }
    }
}

/// Predict one transform block in place
pub fn predict_intra_block(plane: &mut Plane, block: &IntraBlock, bit_depth: u8) {
    let predictor = IntraPredictor::build(plane, block, bit_depth);
    let offset = plane.offset(block.x, block.y);
    let stride = plane.stride;
    predictor.predict(
        block.mode,
        &mut plane.data[offset..],
        stride,
        block.tx_size.size(),
    );
}
