//! VP9 Inverse Transforms
//!
//! VP9 uses multiple transform types and sizes:
//! - DCT (Discrete Cosine Transform): 4x4, 8x8, 16x16, 32x32
//! - ADST (Asymmetric Discrete Sine Transform): 4x4, 8x8, 16x16
//! - WHT (Walsh-Hadamard Transform): 4x4 only (lossless mode)
//!
//! All transforms use exact fixed-point arithmetic. Intermediate values wrap
//! to 16 bits for 8-bit content and to `bd + 8` bits for high bit depth, and
//! 8-bit DCT inputs are truncated to 16 bits, so corrupt streams produce the
//! same pixels as any conforming decoder.

use super::tables::{TxSize, TxType};

// =============================================================================
// Fixed-Point Constants
// =============================================================================

// DCT constants (cos values * 16384)
const COSPI_1_64: i64 = 16364;
const COSPI_2_64: i64 = 16305;
const COSPI_3_64: i64 = 16207;
const COSPI_4_64: i64 = 16069;
const COSPI_5_64: i64 = 15893;
const COSPI_6_64: i64 = 15679;
const COSPI_7_64: i64 = 15426;
const COSPI_8_64: i64 = 15137;
const COSPI_9_64: i64 = 14811;
const COSPI_10_64: i64 = 14449;
const COSPI_11_64: i64 = 14053;
const COSPI_12_64: i64 = 13623;
const COSPI_13_64: i64 = 13160;
const COSPI_14_64: i64 = 12665;
const COSPI_15_64: i64 = 12140;
const COSPI_16_64: i64 = 11585;
const COSPI_17_64: i64 = 11003;
const COSPI_18_64: i64 = 10394;
const COSPI_19_64: i64 = 9760;
const COSPI_20_64: i64 = 9102;
const COSPI_21_64: i64 = 8423;
const COSPI_22_64: i64 = 7723;
const COSPI_23_64: i64 = 7005;
const COSPI_24_64: i64 = 6270;
const COSPI_25_64: i64 = 5520;
const COSPI_26_64: i64 = 4756;
const COSPI_27_64: i64 = 3981;
const COSPI_28_64: i64 = 3196;
const COSPI_29_64: i64 = 2404;
const COSPI_30_64: i64 = 1606;
const COSPI_31_64: i64 = 804;

// ADST constants
const SINPI_1_9: i64 = 5283;
const SINPI_2_9: i64 = 9929;
const SINPI_3_9: i64 = 13377;
const SINPI_4_9: i64 = 15212;

/// Largest coefficient magnitude a valid high bit depth stream produces
const HIGHBD_VALID_TXFM_MAGNITUDE: i64 = 1 << 25;

/// Lossless quantizer shift undone by the WHT
const UNIT_QUANT_SHIFT: u32 = 2;

// =============================================================================
// Helpers
// =============================================================================

/// Rounding shift for DCT
#[inline(always)]
fn dct_round_shift(x: i64) -> i64 {
    (x + (1 << 13)) >> 14
}

/// Wrap an intermediate value to the stage width for the bit depth
#[inline(always)]
fn wrap_low(x: i64, bd: u8) -> i64 {
    let shift = 24 - bd as u32;
    (((x as i32) << shift) >> shift) as i64
}

/// 8-bit DCT stages read their inputs as 16-bit values
#[inline(always)]
fn trunc(x: i32, bd: u8) -> i64 {
    if bd == 8 {
        x as i16 as i64
    } else {
        x as i64
    }
}

/// Butterfly: `wrap(round(a * ca + b * cb))`
#[inline(always)]
fn btf(a: i64, ca: i64, b: i64, cb: i64, bd: u8) -> i64 {
    wrap_low(dct_round_shift(a * ca + b * cb), bd)
}

#[inline(always)]
fn round_pow2(x: i64, n: u32) -> i64 {
    (x + (1 << (n - 1))) >> n
}

/// High bit depth inputs outside the valid range zero the whole vector
#[inline]
fn invalid_input(input: &[i32], bd: u8) -> bool {
    bd > 8
        && input
            .iter()
            .any(|&x| (x as i64).abs() >= HIGHBD_VALID_TXFM_MAGNITUDE)
}

/// Add a residual to a pixel and clip to the bit depth
#[inline(always)]
pub fn clip_pixel_add(dest: u16, residual: i64, bd: u8) -> u16 {
    let max = (1i64 << bd) - 1;
    (dest as i64 + wrap_low(residual, bd)).clamp(0, max) as u16
}

fn store(output: &mut [i32], values: &[i64]) {
    for (o, &v) in output.iter_mut().zip(values) {
        *o = v as i32;
    }
}

// =============================================================================
// 4-point Transforms
// =============================================================================

/// 4-point inverse DCT
pub fn idct4(input: &[i32], output: &mut [i32], bd: u8) {
    if invalid_input(&input[..4], bd) {
        output[..4].fill(0);
        return;
    }
    let (i0, i1, i2, i3) = (
        trunc(input[0], bd),
        trunc(input[1], bd),
        trunc(input[2], bd),
        trunc(input[3], bd),
    );

    let s0 = btf(i0, COSPI_16_64, i2, COSPI_16_64, bd);
    let s1 = btf(i0, COSPI_16_64, i2, -COSPI_16_64, bd);
    let s2 = btf(i1, COSPI_24_64, i3, -COSPI_8_64, bd);
    let s3 = btf(i1, COSPI_8_64, i3, COSPI_24_64, bd);

    store(
        output,
        &[
            wrap_low(s0 + s3, bd),
            wrap_low(s1 + s2, bd),
            wrap_low(s1 - s2, bd),
            wrap_low(s0 - s3, bd),
        ],
    );
}

/// 4-point inverse ADST
pub fn iadst4(input: &[i32], output: &mut [i32], bd: u8) {
    if invalid_input(&input[..4], bd) {
        output[..4].fill(0);
        return;
    }
    let (x0, x1, x2, x3) = (
        input[0] as i64,
        input[1] as i64,
        input[2] as i64,
        input[3] as i64,
    );
    if x0 == 0 && x1 == 0 && x2 == 0 && x3 == 0 {
        output[..4].fill(0);
        return;
    }

    let mut s0 = SINPI_1_9 * x0;
    let mut s1 = SINPI_2_9 * x0;
    let mut s2 = SINPI_3_9 * x1;
    let mut s3 = SINPI_4_9 * x2;
    let s4 = SINPI_1_9 * x2;
    let s5 = SINPI_2_9 * x3;
    let s6 = SINPI_4_9 * x3;
    let s7 = wrap_low(x0 - x2 + x3, bd);

    s0 = s0 + s3 + s5;
    s1 = s1 - s4 - s6;
    s3 = s2;
    s2 = SINPI_3_9 * s7;

    store(
        output,
        &[
            wrap_low(dct_round_shift(s0 + s3), bd),
            wrap_low(dct_round_shift(s1 + s3), bd),
            wrap_low(dct_round_shift(s2), bd),
            wrap_low(dct_round_shift(s0 + s1 - s3), bd),
        ],
    );
}

// =============================================================================
// 8-point Transforms
// =============================================================================

/// 8-point inverse DCT
pub fn idct8(input: &[i32], output: &mut [i32], bd: u8) {
    if invalid_input(&input[..8], bd) {
        output[..8].fill(0);
        return;
    }
    let t = |i: usize| trunc(input[i], bd);

    // stage 1
    let mut s1 = [0i64; 8];
    s1[0] = t(0);
    s1[2] = t(4);
    s1[1] = t(2);
    s1[3] = t(6);
    s1[4] = btf(t(1), COSPI_28_64, t(7), -COSPI_4_64, bd);
    s1[7] = btf(t(1), COSPI_4_64, t(7), COSPI_28_64, bd);
    s1[5] = btf(t(5), COSPI_12_64, t(3), -COSPI_20_64, bd);
    s1[6] = btf(t(5), COSPI_20_64, t(3), COSPI_12_64, bd);

    // stage 2
    let mut s2 = [0i64; 8];
    s2[0] = btf(s1[0], COSPI_16_64, s1[2], COSPI_16_64, bd);
    s2[1] = btf(s1[0], COSPI_16_64, s1[2], -COSPI_16_64, bd);
    s2[2] = btf(s1[1], COSPI_24_64, s1[3], -COSPI_8_64, bd);
    s2[3] = btf(s1[1], COSPI_8_64, s1[3], COSPI_24_64, bd);
    s2[4] = wrap_low(s1[4] + s1[5], bd);
    s2[5] = wrap_low(s1[4] - s1[5], bd);
    s2[6] = wrap_low(-s1[6] + s1[7], bd);
    s2[7] = wrap_low(s1[6] + s1[7], bd);

    // stage 3
    s1[0] = wrap_low(s2[0] + s2[3], bd);
    s1[1] = wrap_low(s2[1] + s2[2], bd);
    s1[2] = wrap_low(s2[1] - s2[2], bd);
    s1[3] = wrap_low(s2[0] - s2[3], bd);
    s1[4] = s2[4];
    s1[5] = btf(s2[6], COSPI_16_64, s2[5], -COSPI_16_64, bd);
    s1[6] = btf(s2[5], COSPI_16_64, s2[6], COSPI_16_64, bd);
    s1[7] = s2[7];

    // stage 4
    let mut out = [0i64; 8];
    for k in 0..4 {
        out[k] = wrap_low(s1[k] + s1[7 - k], bd);
        out[7 - k] = wrap_low(s1[k] - s1[7 - k], bd);
    }
    store(output, &out);
}

/// 8-point inverse ADST
pub fn iadst8(input: &[i32], output: &mut [i32], bd: u8) {
    if invalid_input(&input[..8], bd) {
        output[..8].fill(0);
        return;
    }
    let mut x = [
        input[7] as i64,
        input[0] as i64,
        input[5] as i64,
        input[2] as i64,
        input[3] as i64,
        input[4] as i64,
        input[1] as i64,
        input[6] as i64,
    ];
    if x.iter().all(|&v| v == 0) {
        output[..8].fill(0);
        return;
    }

    // stage 1
    let s0 = COSPI_2_64 * x[0] + COSPI_30_64 * x[1];
    let s1 = COSPI_30_64 * x[0] - COSPI_2_64 * x[1];
    let s2 = COSPI_10_64 * x[2] + COSPI_22_64 * x[3];
    let s3 = COSPI_22_64 * x[2] - COSPI_10_64 * x[3];
    let s4 = COSPI_18_64 * x[4] + COSPI_14_64 * x[5];
    let s5 = COSPI_14_64 * x[4] - COSPI_18_64 * x[5];
    let s6 = COSPI_26_64 * x[6] + COSPI_6_64 * x[7];
    let s7 = COSPI_6_64 * x[6] - COSPI_26_64 * x[7];

    x[0] = wrap_low(dct_round_shift(s0 + s4), bd);
    x[1] = wrap_low(dct_round_shift(s1 + s5), bd);
    x[2] = wrap_low(dct_round_shift(s2 + s6), bd);
    x[3] = wrap_low(dct_round_shift(s3 + s7), bd);
    x[4] = wrap_low(dct_round_shift(s0 - s4), bd);
    x[5] = wrap_low(dct_round_shift(s1 - s5), bd);
    x[6] = wrap_low(dct_round_shift(s2 - s6), bd);
    x[7] = wrap_low(dct_round_shift(s3 - s7), bd);

    // stage 2
    let (s0, s1, s2, s3) = (x[0], x[1], x[2], x[3]);
    let s4 = COSPI_8_64 * x[4] + COSPI_24_64 * x[5];
    let s5 = COSPI_24_64 * x[4] - COSPI_8_64 * x[5];
    let s6 = -COSPI_24_64 * x[6] + COSPI_8_64 * x[7];
    let s7 = COSPI_8_64 * x[6] + COSPI_24_64 * x[7];

    x[0] = wrap_low(s0 + s2, bd);
    x[1] = wrap_low(s1 + s3, bd);
    x[2] = wrap_low(s0 - s2, bd);
    x[3] = wrap_low(s1 - s3, bd);
    x[4] = wrap_low(dct_round_shift(s4 + s6), bd);
    x[5] = wrap_low(dct_round_shift(s5 + s7), bd);
    x[6] = wrap_low(dct_round_shift(s4 - s6), bd);
    x[7] = wrap_low(dct_round_shift(s5 - s7), bd);

    // stage 3
    let s2 = COSPI_16_64 * (x[2] + x[3]);
    let s3 = COSPI_16_64 * (x[2] - x[3]);
    let s6 = COSPI_16_64 * (x[6] + x[7]);
    let s7 = COSPI_16_64 * (x[6] - x[7]);
    x[2] = wrap_low(dct_round_shift(s2), bd);
    x[3] = wrap_low(dct_round_shift(s3), bd);
    x[6] = wrap_low(dct_round_shift(s6), bd);
    x[7] = wrap_low(dct_round_shift(s7), bd);

    store(
        output,
        &[
            wrap_low(x[0], bd),
            wrap_low(-x[4], bd),
            wrap_low(x[6], bd),
            wrap_low(-x[2], bd),
            wrap_low(x[3], bd),
            wrap_low(-x[7], bd),
            wrap_low(x[5], bd),
            wrap_low(-x[1], bd),
        ],
    );
}

// =============================================================================
// 16-point Transforms
// =============================================================================

/// 16-point inverse DCT: an 8-point DCT of the even inputs plus an odd half
pub fn idct16(input: &[i32], output: &mut [i32], bd: u8) {
    if invalid_input(&input[..16], bd) {
        output[..16].fill(0);
        return;
    }

    let even_in: [i32; 8] = std::array::from_fn(|k| input[2 * k]);
    let mut even = [0i32; 8];
    idct8(&even_in, &mut even, bd);

    let t = |i: usize| trunc(input[i], bd);
    let mut s1 = [0i64; 16];
    let mut s2 = [0i64; 16];

    // stage 1
    s1[8] = t(1);
    s1[9] = t(9);
    s1[10] = t(5);
    s1[11] = t(13);
    s1[12] = t(3);
    s1[13] = t(11);
    s1[14] = t(7);
    s1[15] = t(15);

    // stage 2
    s2[8] = btf(s1[8], COSPI_30_64, s1[15], -COSPI_2_64, bd);
    s2[15] = btf(s1[8], COSPI_2_64, s1[15], COSPI_30_64, bd);
    s2[9] = btf(s1[9], COSPI_14_64, s1[14], -COSPI_18_64, bd);
    s2[14] = btf(s1[9], COSPI_18_64, s1[14], COSPI_14_64, bd);
    s2[10] = btf(s1[10], COSPI_22_64, s1[13], -COSPI_10_64, bd);
    s2[13] = btf(s1[10], COSPI_10_64, s1[13], COSPI_22_64, bd);
    s2[11] = btf(s1[11], COSPI_6_64, s1[12], -COSPI_26_64, bd);
    s2[12] = btf(s1[11], COSPI_26_64, s1[12], COSPI_6_64, bd);

    // stage 3
    s1[8] = wrap_low(s2[8] + s2[9], bd);
    s1[9] = wrap_low(s2[8] - s2[9], bd);
    s1[10] = wrap_low(-s2[10] + s2[11], bd);
    s1[11] = wrap_low(s2[10] + s2[11], bd);
    s1[12] = wrap_low(s2[12] + s2[13], bd);
    s1[13] = wrap_low(s2[12] - s2[13], bd);
    s1[14] = wrap_low(-s2[14] + s2[15], bd);
    s1[15] = wrap_low(s2[14] + s2[15], bd);

    // stage 4
    s2[8] = s1[8];
    s2[15] = s1[15];
    s2[9] = btf(s1[9], -COSPI_8_64, s1[14], COSPI_24_64, bd);
    s2[14] = btf(s1[9], COSPI_24_64, s1[14], COSPI_8_64, bd);
    s2[10] = btf(s1[10], -COSPI_24_64, s1[13], -COSPI_8_64, bd);
    s2[13] = btf(s1[10], -COSPI_8_64, s1[13], COSPI_24_64, bd);
    s2[11] = s1[11];
    s2[12] = s1[12];

    // stage 5
    s1[8] = wrap_low(s2[8] + s2[11], bd);
    s1[9] = wrap_low(s2[9] + s2[10], bd);
    s1[10] = wrap_low(s2[9] - s2[10], bd);
    s1[11] = wrap_low(s2[8] - s2[11], bd);
    s1[12] = wrap_low(-s2[12] + s2[15], bd);
    s1[13] = wrap_low(-s2[13] + s2[14], bd);
    s1[14] = wrap_low(s2[13] + s2[14], bd);
    s1[15] = wrap_low(s2[12] + s2[15], bd);

    // stage 6
    s2[8] = s1[8];
    s2[9] = s1[9];
    s2[10] = btf(s1[13], COSPI_16_64, s1[10], -COSPI_16_64, bd);
    s2[13] = btf(s1[10], COSPI_16_64, s1[13], COSPI_16_64, bd);
    s2[11] = btf(s1[12], COSPI_16_64, s1[11], -COSPI_16_64, bd);
    s2[12] = btf(s1[11], COSPI_16_64, s1[12], COSPI_16_64, bd);
    s2[14] = s1[14];
    s2[15] = s1[15];

    // stage 7
    let mut out = [0i64; 16];
    for k in 0..8 {
        let e = even[k] as i64;
        out[k] = wrap_low(e + s2[15 - k], bd);
        out[15 - k] = wrap_low(e - s2[15 - k], bd);
    }
    store(output, &out);
}

/// 16-point inverse ADST
pub fn iadst16(input: &[i32], output: &mut [i32], bd: u8) {
    if invalid_input(&input[..16], bd) {
        output[..16].fill(0);
        return;
    }
    const ORDER: [usize; 16] = [15, 0, 13, 2, 11, 4, 9, 6, 7, 8, 5, 10, 3, 12, 1, 14];
    let mut x: [i64; 16] = std::array::from_fn(|k| input[ORDER[k]] as i64);
    if x.iter().all(|&v| v == 0) {
        output[..16].fill(0);
        return;
    }

    // stage 1
    let mut s = [0i64; 16];
    s[0] = x[0] * COSPI_1_64 + x[1] * COSPI_31_64;
    s[1] = x[0] * COSPI_31_64 - x[1] * COSPI_1_64;
    s[2] = x[2] * COSPI_5_64 + x[3] * COSPI_27_64;
    s[3] = x[2] * COSPI_27_64 - x[3] * COSPI_5_64;
    s[4] = x[4] * COSPI_9_64 + x[5] * COSPI_23_64;
    s[5] = x[4] * COSPI_23_64 - x[5] * COSPI_9_64;
    s[6] = x[6] * COSPI_13_64 + x[7] * COSPI_19_64;
    s[7] = x[6] * COSPI_19_64 - x[7] * COSPI_13_64;
    s[8] = x[8] * COSPI_17_64 + x[9] * COSPI_15_64;
    s[9] = x[8] * COSPI_15_64 - x[9] * COSPI_17_64;
    s[10] = x[10] * COSPI_21_64 + x[11] * COSPI_11_64;
    s[11] = x[10] * COSPI_11_64 - x[11] * COSPI_21_64;
    s[12] = x[12] * COSPI_25_64 + x[13] * COSPI_7_64;
    s[13] = x[12] * COSPI_7_64 - x[13] * COSPI_25_64;
    s[14] = x[14] * COSPI_29_64 + x[15] * COSPI_3_64;
    s[15] = x[14] * COSPI_3_64 - x[15] * COSPI_29_64;

    for i in 0..8 {
        x[i] = wrap_low(dct_round_shift(s[i] + s[i + 8]), bd);
        x[i + 8] = wrap_low(dct_round_shift(s[i] - s[i + 8]), bd);
    }

    // stage 2
    s[..8].copy_from_slice(&x[..8]);
    s[8] = x[8] * COSPI_4_64 + x[9] * COSPI_28_64;
    s[9] = x[8] * COSPI_28_64 - x[9] * COSPI_4_64;
    s[10] = x[10] * COSPI_20_64 + x[11] * COSPI_12_64;
    s[11] = x[10] * COSPI_12_64 - x[11] * COSPI_20_64;
    s[12] = -x[12] * COSPI_28_64 + x[13] * COSPI_4_64;
    s[13] = x[12] * COSPI_4_64 + x[13] * COSPI_28_64;
    s[14] = -x[14] * COSPI_12_64 + x[15] * COSPI_20_64;
    s[15] = x[14] * COSPI_20_64 + x[15] * COSPI_12_64;

    for i in 0..4 {
        x[i] = wrap_low(s[i] + s[i + 4], bd);
        x[i + 4] = wrap_low(s[i] - s[i + 4], bd);
        x[i + 8] = wrap_low(dct_round_shift(s[i + 8] + s[i + 12]), bd);
        x[i + 12] = wrap_low(dct_round_shift(s[i + 8] - s[i + 12]), bd);
    }

    // stage 3
    s[..4].copy_from_slice(&x[..4]);
    s[4] = x[4] * COSPI_8_64 + x[5] * COSPI_24_64;
    s[5] = x[4] * COSPI_24_64 - x[5] * COSPI_8_64;
    s[6] = -x[6] * COSPI_24_64 + x[7] * COSPI_8_64;
    s[7] = x[6] * COSPI_8_64 + x[7] * COSPI_24_64;
    s[8..12].copy_from_slice(&x[8..12]);
    s[12] = x[12] * COSPI_8_64 + x[13] * COSPI_24_64;
    s[13] = x[12] * COSPI_24_64 - x[13] * COSPI_8_64;
    s[14] = -x[14] * COSPI_24_64 + x[15] * COSPI_8_64;
    s[15] = x[14] * COSPI_8_64 + x[15] * COSPI_24_64;

    x[0] = wrap_low(s[0] + s[2], bd);
    x[1] = wrap_low(s[1] + s[3], bd);
    x[2] = wrap_low(s[0] - s[2], bd);
    x[3] = wrap_low(s[1] - s[3], bd);
    x[4] = wrap_low(dct_round_shift(s[4] + s[6]), bd);
    x[5] = wrap_low(dct_round_shift(s[5] + s[7]), bd);
    x[6] = wrap_low(dct_round_shift(s[4] - s[6]), bd);
    x[7] = wrap_low(dct_round_shift(s[5] - s[7]), bd);
    x[8] = wrap_low(s[8] + s[10], bd);
    x[9] = wrap_low(s[9] + s[11], bd);
    x[10] = wrap_low(s[8] - s[10], bd);
    x[11] = wrap_low(s[9] - s[11], bd);
    x[12] = wrap_low(dct_round_shift(s[12] + s[14]), bd);
    x[13] = wrap_low(dct_round_shift(s[13] + s[15]), bd);
    x[14] = wrap_low(dct_round_shift(s[12] - s[14]), bd);
    x[15] = wrap_low(dct_round_shift(s[13] - s[15]), bd);

    // stage 4
    let s2 = -COSPI_16_64 * (x[2] + x[3]);
    let s3 = COSPI_16_64 * (x[2] - x[3]);
    let s6 = COSPI_16_64 * (x[6] + x[7]);
    let s7 = COSPI_16_64 * (-x[6] + x[7]);
    let s10 = COSPI_16_64 * (x[10] + x[11]);
    let s11 = COSPI_16_64 * (-x[10] + x[11]);
    let s14 = -COSPI_16_64 * (x[14] + x[15]);
    let s15 = COSPI_16_64 * (x[14] - x[15]);

    x[2] = wrap_low(dct_round_shift(s2), bd);
    x[3] = wrap_low(dct_round_shift(s3), bd);
    x[6] = wrap_low(dct_round_shift(s6), bd);
    x[7] = wrap_low(dct_round_shift(s7), bd);
    x[10] = wrap_low(dct_round_shift(s10), bd);
    x[11] = wrap_low(dct_round_shift(s11), bd);
    x[14] = wrap_low(dct_round_shift(s14), bd);
    x[15] = wrap_low(dct_round_shift(s15), bd);

    store(
        output,
        &[
            wrap_low(x[0], bd),
            wrap_low(-x[8], bd),
            wrap_low(x[12], bd),
            wrap_low(-x[4], bd),
            wrap_low(x[6], bd),
            wrap_low(x[14], bd),
            wrap_low(x[10], bd),
            wrap_low(x[2], bd),
            wrap_low(x[3], bd),
            wrap_low(x[11], bd),
            wrap_low(x[15], bd),
            wrap_low(x[7], bd),
            wrap_low(x[5], bd),
            wrap_low(-x[13], bd),
            wrap_low(x[9], bd),
            wrap_low(-x[1], bd),
        ],
    );
}

// =============================================================================
// 32-point Transform
// =============================================================================

/// 32-point inverse DCT: a 16-point DCT of the even inputs plus an odd half
pub fn idct32(input: &[i32], output: &mut [i32], bd: u8) {
    if invalid_input(&input[..32], bd) {
        output[..32].fill(0);
        return;
    }

    let even_in: [i32; 16] = std::array::from_fn(|k| input[2 * k]);
    let mut even = [0i32; 16];
    idct16(&even_in, &mut even, bd);

    let t = |i: usize| trunc(input[i], bd);
    let mut s1 = [0i64; 32];
    let mut s2 = [0i64; 32];

    // stage 1
    s1[16] = btf(t(1), COSPI_31_64, t(31), -COSPI_1_64, bd);
    s1[31] = btf(t(1), COSPI_1_64, t(31), COSPI_31_64, bd);
    s1[17] = btf(t(17), COSPI_15_64, t(15), -COSPI_17_64, bd);
    s1[30] = btf(t(17), COSPI_17_64, t(15), COSPI_15_64, bd);
    s1[18] = btf(t(9), COSPI_23_64, t(23), -COSPI_9_64, bd);
    s1[29] = btf(t(9), COSPI_9_64, t(23), COSPI_23_64, bd);
    s1[19] = btf(t(25), COSPI_7_64, t(7), -COSPI_25_64, bd);
    s1[28] = btf(t(25), COSPI_25_64, t(7), COSPI_7_64, bd);
    s1[20] = btf(t(5), COSPI_27_64, t(27), -COSPI_5_64, bd);
    s1[27] = btf(t(5), COSPI_5_64, t(27), COSPI_27_64, bd);
    s1[21] = btf(t(21), COSPI_11_64, t(11), -COSPI_21_64, bd);
    s1[26] = btf(t(21), COSPI_21_64, t(11), COSPI_11_64, bd);
    s1[22] = btf(t(13), COSPI_19_64, t(19), -COSPI_13_64, bd);
    s1[25] = btf(t(13), COSPI_13_64, t(19), COSPI_19_64, bd);
    s1[23] = btf(t(29), COSPI_3_64, t(3), -COSPI_29_64, bd);
    s1[24] = btf(t(29), COSPI_29_64, t(3), COSPI_3_64, bd);

    // stage 2
    for base in [16, 20, 24, 28] {
        s2[base] = wrap_low(s1[base] + s1[base + 1], bd);
        s2[base + 1] = wrap_low(s1[base] - s1[base + 1], bd);
        s2[base + 2] = wrap_low(-s1[base + 2] + s1[base + 3], bd);
        s2[base + 3] = wrap_low(s1[base + 2] + s1[base + 3], bd);
    }

    // stage 3
    s1[16] = s2[16];
    s1[31] = s2[31];
    s1[17] = btf(s2[17], -COSPI_4_64, s2[30], COSPI_28_64, bd);
    s1[30] = btf(s2[17], COSPI_28_64, s2[30], COSPI_4_64, bd);
    s1[18] = btf(s2[18], -COSPI_28_64, s2[29], -COSPI_4_64, bd);
    s1[29] = btf(s2[18], -COSPI_4_64, s2[29], COSPI_28_64, bd);
    s1[19] = s2[19];
    s1[20] = s2[20];
    s1[21] = btf(s2[21], -COSPI_20_64, s2[26], COSPI_12_64, bd);
    s1[26] = btf(s2[21], COSPI_12_64, s2[26], COSPI_20_64, bd);
    s1[22] = btf(s2[22], -COSPI_12_64, s2[25], -COSPI_20_64, bd);
    s1[25] = btf(s2[22], -COSPI_20_64, s2[25], COSPI_12_64, bd);
    s1[23] = s2[23];
    s1[24] = s2[24];
    s1[27] = s2[27];
    s1[28] = s2[28];

    // stage 4
    s2[16] = wrap_low(s1[16] + s1[19], bd);
    s2[17] = wrap_low(s1[17] + s1[18], bd);
    s2[18] = wrap_low(s1[17] - s1[18], bd);
    s2[19] = wrap_low(s1[16] - s1[19], bd);
    s2[20] = wrap_low(-s1[20] + s1[23], bd);
    s2[21] = wrap_low(-s1[21] + s1[22], bd);
    s2[22] = wrap_low(s1[21] + s1[22], bd);
    s2[23] = wrap_low(s1[20] + s1[23], bd);
    s2[24] = wrap_low(s1[24] + s1[27], bd);
    s2[25] = wrap_low(s1[25] + s1[26], bd);
    s2[26] = wrap_low(s1[25] - s1[26], bd);
    s2[27] = wrap_low(s1[24] - s1[27], bd);
    s2[28] = wrap_low(-s1[28] + s1[31], bd);
    s2[29] = wrap_low(-s1[29] + s1[30], bd);
    s2[30] = wrap_low(s1[29] + s1[30], bd);
    s2[31] = wrap_low(s1[28] + s1[31], bd);

    // stage 5
    s1[16] = s2[16];
    s1[17] = s2[17];
    s1[18] = btf(s2[18], -COSPI_8_64, s2[29], COSPI_24_64, bd);
    s1[29] = btf(s2[18], COSPI_24_64, s2[29], COSPI_8_64, bd);
    s1[19] = btf(s2[19], -COSPI_8_64, s2[28], COSPI_24_64, bd);
    s1[28] = btf(s2[19], COSPI_24_64, s2[28], COSPI_8_64, bd);
    s1[20] = btf(s2[20], -COSPI_24_64, s2[27], -COSPI_8_64, bd);
    s1[27] = btf(s2[20], -COSPI_8_64, s2[27], COSPI_24_64, bd);
    s1[21] = btf(s2[21], -COSPI_24_64, s2[26], -COSPI_8_64, bd);
    s1[26] = btf(s2[21], -COSPI_8_64, s2[26], COSPI_24_64, bd);
    s1[22] = s2[22];
    s1[23] = s2[23];
    s1[24] = s2[24];
    s1[25] = s2[25];
    s1[30] = s2[30];
    s1[31] = s2[31];

    // stage 6
    for k in 0..4 {
        s2[16 + k] = wrap_low(s1[16 + k] + s1[23 - k], bd);
        s2[23 - k] = wrap_low(s1[16 + k] - s1[23 - k], bd);
        s2[24 + k] = wrap_low(-s1[24 + k] + s1[31 - k], bd);
        s2[31 - k] = wrap_low(s1[24 + k] + s1[31 - k], bd);
    }

    // stage 7
    s1[16..20].copy_from_slice(&s2[16..20]);
    s1[28..32].copy_from_slice(&s2[28..32]);
    for k in 0..4 {
        let lo = 20 + k;
        let hi = 27 - k;
        s1[lo] = btf(s2[hi], COSPI_16_64, s2[lo], -COSPI_16_64, bd);
        s1[hi] = btf(s2[lo], COSPI_16_64, s2[hi], COSPI_16_64, bd);
    }

    // final stage
    let mut out = [0i64; 32];
    for k in 0..16 {
        let e = even[k] as i64;
        out[k] = wrap_low(e + s1[31 - k], bd);
        out[31 - k] = wrap_low(e - s1[31 - k], bd);
    }
    store(output, &out);
}

// =============================================================================
// Walsh-Hadamard (lossless)
// =============================================================================

/// 4x4 inverse WHT added to the destination
pub fn iwht4x4_add(input: &[i32], dest: &mut [u16], stride: usize, bd: u8) {
    let mut tmp = [0i64; 16];

    for i in 0..4 {
        let ip = &input[4 * i..4 * i + 4];
        let mut a1 = (ip[0] >> UNIT_QUANT_SHIFT) as i64;
        let mut c1 = (ip[1] >> UNIT_QUANT_SHIFT) as i64;
        let mut d1 = (ip[2] >> UNIT_QUANT_SHIFT) as i64;
        let mut b1 = (ip[3] >> UNIT_QUANT_SHIFT) as i64;
        a1 += c1;
        d1 -= b1;
        let e1 = (a1 - d1) >> 1;
        b1 = e1 - b1;
        c1 = e1 - c1;
        a1 -= b1;
        d1 += c1;
        tmp[4 * i] = wrap_low(a1, bd);
        tmp[4 * i + 1] = wrap_low(b1, bd);
        tmp[4 * i + 2] = wrap_low(c1, bd);
        tmp[4 * i + 3] = wrap_low(d1, bd);
    }

    for i in 0..4 {
        let mut a1 = tmp[i];
        let mut c1 = tmp[4 + i];
        let mut d1 = tmp[8 + i];
        let mut b1 = tmp[12 + i];
        a1 += c1;
        d1 -= b1;
        let e1 = (a1 - d1) >> 1;
        b1 = e1 - b1;
        c1 = e1 - c1;
        a1 -= b1;
        d1 += c1;
        for (row, v) in [a1, b1, c1, d1].into_iter().enumerate() {
            let px = &mut dest[row * stride + i];
            *px = clip_pixel_add(*px, wrap_low(v, bd), bd);
        }
    }
}

/// 4x4 inverse WHT of a DC-only block
pub fn iwht4x4_dc_add(input: &[i32], dest: &mut [u16], stride: usize, bd: u8) {
    let mut a1 = (input[0] >> UNIT_QUANT_SHIFT) as i64;
    let e1 = a1 >> 1;
    a1 -= e1;
    let tmp = [wrap_low(a1, bd), wrap_low(e1, bd), wrap_low(e1, bd), wrap_low(e1, bd)];

    for (i, &t) in tmp.iter().enumerate() {
        let e1 = t >> 1;
        let a1 = t - e1;
        for (row, v) in [a1, e1, e1, e1].into_iter().enumerate() {
            let px = &mut dest[row * stride + i];
            *px = clip_pixel_add(*px, v, bd);
        }
    }
}

// =============================================================================
// 2-D Inverse Transform
// =============================================================================

type Transform1d = fn(&[i32], &mut [i32], u8);

/// Column and row 1-D transforms for a transform type
fn transform_pair(tx_size: TxSize, tx_type: TxType) -> (Transform1d, Transform1d) {
    let (dct, adst): (Transform1d, Transform1d) = match tx_size {
        TxSize::Tx4x4 => (idct4, iadst4),
        TxSize::Tx8x8 => (idct8, iadst8),
        TxSize::Tx16x16 => (idct16, iadst16),
        TxSize::Tx32x32 => (idct32, idct32),
    };
    match tx_type {
        TxType::DctDct => (dct, dct),
        TxType::AdstDct => (adst, dct),
        TxType::DctAdst => (dct, adst),
        TxType::AdstAdst => (adst, adst),
    }
}

/// Final rounding shift of the column pass per transform size
const fn output_shift(tx_size: TxSize) -> u32 {
    match tx_size {
        TxSize::Tx4x4 => 4,
        TxSize::Tx8x8 => 5,
        TxSize::Tx16x16 | TxSize::Tx32x32 => 6,
    }
}

/// DC-only DCT: one value added to every pixel
fn idct_dc_add(input: &[i32], dest: &mut [u16], stride: usize, tx_size: TxSize, bd: u8) {
    let n = tx_size.size();
    let out = wrap_low(dct_round_shift(trunc(input[0], bd) * COSPI_16_64), bd);
    let out = wrap_low(dct_round_shift(out * COSPI_16_64), bd);
    let a1 = round_pow2(out, output_shift(tx_size));

    for row in dest.chunks_mut(stride).take(n) {
        for px in row[..n].iter_mut() {
            *px = clip_pixel_add(*px, a1, bd);
        }
    }
}

/// Inverse transform `coeffs` (raster order) and add the result to `dest`
///
/// `eob` is the number of coded scan positions. Lossless frames use the WHT
/// for every (4x4) block. 32x32 blocks are always DCT.
pub fn inverse_transform_add(
    coeffs: &[i32],
    dest: &mut [u16],
    stride: usize,
    tx_size: TxSize,
    tx_type: TxType,
    eob: usize,
    lossless: bool,
    bd: u8,
) {
    if eob == 0 {
        return;
    }

    if lossless {
        if eob > 1 {
            iwht4x4_add(coeffs, dest, stride, bd);
        } else {
            iwht4x4_dc_add(coeffs, dest, stride, bd);
        }
        return;
    }

    let tx_type = if tx_size == TxSize::Tx32x32 {
        TxType::DctDct
    } else {
        tx_type
    };

    if eob == 1 && tx_type == TxType::DctDct {
        idct_dc_add(coeffs, dest, stride, tx_size, bd);
        return;
    }

    let n = tx_size.size();
    let (col_tx, row_tx) = transform_pair(tx_size, tx_type);
    let mut intermediate = [0i32; 1024];

    // Rows; an all-zero row transforms to zeros for every kernel
    for (input, output) in coeffs
        .chunks(n)
        .zip(intermediate.chunks_mut(n))
        .take(n)
    {
        if input.iter().any(|&c| c != 0) {
            row_tx(input, output, bd);
        }
    }

    // Columns
    let shift = output_shift(tx_size);
    let mut column = [0i32; 32];
    let mut column_out = [0i32; 32];
    for i in 0..n {
        for j in 0..n {
            column[j] = intermediate[j * n + i];
        }
        col_tx(&column[..n], &mut column_out[..n], bd);
        for (j, &v) in column_out[..n].iter().enumerate() {
            let px = &mut dest[j * stride + i];
            *px = clip_pixel_add(*px, round_pow2(v as i64, shift), bd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_block(n: usize, value: u16) -> Vec<u16> {
        vec![value; n * n]
    }

    #[test]
    fn test_zero_input_is_identity() {
        for tx in [TxSize::Tx4x4, TxSize::Tx8x8, TxSize::Tx16x16, TxSize::Tx32x32] {
            let n = tx.size();
            let coeffs = vec![0i32; n * n];
            let mut dest = flat_block(n, 77);
            inverse_transform_add(&coeffs, &mut dest, n, tx, TxType::AdstAdst, 0, false, 8);
            assert!(dest.iter().all(|&p| p == 77));
        }
    }

    #[test]
    fn test_dc_only_matches_full_transform() {
        for tx in [TxSize::Tx4x4, TxSize::Tx8x8, TxSize::Tx16x16, TxSize::Tx32x32] {
            let n = tx.size();
            for dc in [-900, -35, 1, 64, 1234] {
                let mut coeffs = vec![0i32; n * n];
                coeffs[0] = dc;

                let mut fast = flat_block(n, 128);
                inverse_transform_add(&coeffs, &mut fast, n, tx, TxType::DctDct, 1, false, 8);

                // eob > 1 forces the separable path
                let mut full = flat_block(n, 128);
                inverse_transform_add(&coeffs, &mut full, n, tx, TxType::DctDct, 2, false, 8);

                assert_eq!(fast, full, "tx {:?} dc {}", tx, dc);
            }
        }
    }

    #[test]
    fn test_dc_produces_flat_offset() {
        // DC of 64 in a 4x4: 64 * 11585^2 / 2^28 rounded, then >> 4
        let mut coeffs = [0i32; 16];
        coeffs[0] = 64;
        let mut dest = flat_block(4, 100);
        inverse_transform_add(&coeffs, &mut dest, 4, TxSize::Tx4x4, TxType::DctDct, 1, false, 8);
        assert!(dest.iter().all(|&p| p == 102));
    }

    #[test]
    fn test_clipping() {
        let mut coeffs = [0i32; 64];
        coeffs[0] = 4000;
        let mut dest = flat_block(8, 250);
        inverse_transform_add(&coeffs, &mut dest, 8, TxSize::Tx8x8, TxType::DctDct, 1, false, 8);
        assert!(dest.iter().all(|&p| p == 255));

        let mut dest = flat_block(8, 1000);
        inverse_transform_add(&coeffs, &mut dest, 8, TxSize::Tx8x8, TxType::DctDct, 1, false, 10);
        assert!(dest.iter().all(|&p| p > 1000 && p <= 1023));
    }

    #[test]
    fn test_adst_zero_rows_skipped() {
        let mut coeffs = [0i32; 16];
        coeffs[4] = 50;
        let mut dest = flat_block(4, 128);
        inverse_transform_add(&coeffs, &mut dest, 4, TxSize::Tx4x4, TxType::AdstAdst, 2, false, 8);
        // Only the second row of coefficients is nonzero; the result varies by row
        assert!(dest.iter().any(|&p| p != 128));
    }

    #[test]
    fn test_wht_dc_matches_full() {
        let mut coeffs = [0i32; 16];
        coeffs[0] = 4 * 37;
        let mut dc = flat_block(4, 90);
        iwht4x4_dc_add(&coeffs, &mut dc, 4, 8);
        let mut full = flat_block(4, 90);
        iwht4x4_add(&coeffs, &mut full, 4, 8);
        assert_eq!(dc, full);
    }

    #[test]
    fn test_highbd_invalid_input_zeroes() {
        let mut input = [0i32; 8];
        input[3] = 1 << 26;
        let mut output = [5i32; 8];
        idct8(&input, &mut output, 10);
        assert_eq!(output, [0; 8]);
    }

    #[test]
    fn test_idct4_known_values() {
        let input = [64, 0, 0, 0];
        let mut output = [0i32; 4];
        idct4(&input, &mut output, 8);
        // 64 * 11585 / 16384 = 45.25 -> 45
        assert_eq!(output, [45, 45, 45, 45]);
    }
}
