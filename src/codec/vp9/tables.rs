//! VP9 Tables and Constants
//!
//! This module contains the static data shared by the decode pipeline:
//! - Block size, partition and transform enumerations with their lookups
//! - Prediction modes, reference frames and motion vectors
//! - Symbol trees for every tree-coded syntax element
//! - Interpolation kernels, coefficient band maps and category probabilities
//! - Neighbour tables used for motion vector candidate search

// =============================================================================
// Block Sizes and Partitions
// =============================================================================

/// VP9 block sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u8)]
pub enum BlockSize {
    Block4x4 = 0,
    Block4x8 = 1,
    Block8x4 = 2,
    #[default]
    Block8x8 = 3,
    Block8x16 = 4,
    Block16x8 = 5,
    Block16x16 = 6,
    Block16x32 = 7,
    Block32x16 = 8,
    Block32x32 = 9,
    Block32x64 = 10,
    Block64x32 = 11,
    Block64x64 = 12,
    Invalid = 13,
}

/// Number of valid block sizes
pub const BLOCK_SIZES: usize = 13;

/// log2 of the block width in 4-sample units
const B_WIDTH_LOG2: [u8; BLOCK_SIZES + 1] = [0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3, 4, 4, 0];
/// log2 of the block height in 4-sample units
const B_HEIGHT_LOG2: [u8; BLOCK_SIZES + 1] = [0, 1, 0, 1, 2, 1, 2, 3, 2, 3, 4, 3, 4, 0];
/// log2 of the block width in 8x8 (mi) units
const MI_WIDTH_LOG2: [u8; BLOCK_SIZES + 1] = [0, 0, 0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 0];
/// log2 of the block height in 8x8 (mi) units
const MI_HEIGHT_LOG2: [u8; BLOCK_SIZES + 1] = [0, 0, 0, 0, 1, 0, 1, 2, 1, 2, 3, 2, 3, 0];
/// Y mode probability group for intra blocks in inter frames
const SIZE_GROUP: [u8; BLOCK_SIZES + 1] = [0, 0, 0, 1, 1, 1, 2, 2, 2, 3, 3, 3, 3, 0];

impl BlockSize {
    /// Convert from the raw discriminant
    pub const fn from_u8(v: u8) -> Self {
        match v {
            0 => BlockSize::Block4x4,
            1 => BlockSize::Block4x8,
            2 => BlockSize::Block8x4,
            3 => BlockSize::Block8x8,
            4 => BlockSize::Block8x16,
            5 => BlockSize::Block16x8,
            6 => BlockSize::Block16x16,
            7 => BlockSize::Block16x32,
            8 => BlockSize::Block32x16,
            9 => BlockSize::Block32x32,
            10 => BlockSize::Block32x64,
            11 => BlockSize::Block64x32,
            12 => BlockSize::Block64x64,
            _ => BlockSize::Invalid,
        }
    }

    /// Width in pixels
    pub const fn width(&self) -> usize {
        if self.is_valid() {
            4 << B_WIDTH_LOG2[*self as usize]
        } else {
            0
        }
    }

    /// Height in pixels
    pub const fn height(&self) -> usize {
        if self.is_valid() {
            4 << B_HEIGHT_LOG2[*self as usize]
        } else {
            0
        }
    }

    /// log2 of width in 4x4 units
    pub const fn width_log2(&self) -> usize {
        B_WIDTH_LOG2[*self as usize] as usize
    }

    /// log2 of height in 4x4 units
    pub const fn height_log2(&self) -> usize {
        B_HEIGHT_LOG2[*self as usize] as usize
    }

    /// Width in 4x4 units
    pub const fn num_4x4_wide(&self) -> usize {
        1 << self.width_log2()
    }

    /// Height in 4x4 units
    pub const fn num_4x4_high(&self) -> usize {
        1 << self.height_log2()
    }

    /// Width in 8x8 (mi) units, at least 1
    pub const fn num_8x8_wide(&self) -> usize {
        1 << MI_WIDTH_LOG2[*self as usize]
    }

    /// Height in 8x8 (mi) units, at least 1
    pub const fn num_8x8_high(&self) -> usize {
        1 << MI_HEIGHT_LOG2[*self as usize]
    }

    /// Probability group used for y modes of intra blocks in inter frames
    pub const fn size_group(&self) -> usize {
        SIZE_GROUP[*self as usize] as usize
    }

    pub const fn is_valid(&self) -> bool {
        !matches!(self, BlockSize::Invalid)
    }

    /// Blocks smaller than 8x8 carry per-4x4 sub-block modes
    pub const fn is_sub8x8(&self) -> bool {
        (*self as u8) < (BlockSize::Block8x8 as u8)
    }

    /// Largest transform that fits the block
    pub const fn max_tx_size(&self) -> TxSize {
        match self {
            BlockSize::Block4x4 | BlockSize::Block4x8 | BlockSize::Block8x4 => TxSize::Tx4x4,
            BlockSize::Block8x8 | BlockSize::Block8x16 | BlockSize::Block16x8 => TxSize::Tx8x8,
            BlockSize::Block16x16 | BlockSize::Block16x32 | BlockSize::Block32x16 => {
                TxSize::Tx16x16
            }
            _ => TxSize::Tx32x32,
        }
    }

    /// Block size of a plane with the given subsampling
    pub const fn subsampled(&self, ss_x: usize, ss_y: usize) -> BlockSize {
        if !self.is_valid() || ss_x > 1 || ss_y > 1 {
            return BlockSize::Invalid;
        }
        SS_SIZE_LOOKUP[*self as usize][ss_x][ss_y]
    }
}

/// Plane block size for each (block size, ss_x, ss_y)
const SS_SIZE_LOOKUP: [[[BlockSize; 2]; 2]; BLOCK_SIZES] = {
    use BlockSize::*;
    [
        [[Block4x4, Invalid], [Invalid, Invalid]],
        [[Block4x8, Block4x4], [Invalid, Invalid]],
        [[Block8x4, Invalid], [Block4x4, Invalid]],
        [[Block8x8, Block8x4], [Block4x8, Block4x4]],
        [[Block8x16, Block8x8], [Invalid, Block4x8]],
        [[Block16x8, Invalid], [Block8x8, Block8x4]],
        [[Block16x16, Block16x8], [Block8x16, Block8x8]],
        [[Block16x32, Block16x16], [Invalid, Block8x16]],
        [[Block32x16, Invalid], [Block16x16, Block16x8]],
        [[Block32x32, Block32x16], [Block16x32, Block16x16]],
        [[Block32x64, Block32x32], [Invalid, Block16x32]],
        [[Block64x32, Invalid], [Block32x32, Block32x16]],
        [[Block64x64, Block64x32], [Block32x64, Block32x32]],
    ]
};

/// Partition types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Partition {
    None = 0,       // Use whole block
    Horizontal = 1, // Split into top/bottom
    Vertical = 2,   // Split into left/right
    Split = 3,      // Split into 4 quadrants
}

/// Number of partition types
pub const PARTITION_TYPES: usize = 4;
/// Number of partition contexts
pub const PARTITION_CONTEXTS: usize = 16;

impl Partition {
    pub const fn from_u8(v: u8) -> Self {
        match v {
            0 => Partition::None,
            1 => Partition::Horizontal,
            2 => Partition::Vertical,
            _ => Partition::Split,
        }
    }
}

/// Get subblock size after partition of a square block
pub const fn get_subsize(block_size: BlockSize, partition: Partition) -> BlockSize {
    use BlockSize::*;
    match (block_size, partition) {
        (_, Partition::None) => block_size,
        (Block64x64, Partition::Horizontal) => Block64x32,
        (Block64x64, Partition::Vertical) => Block32x64,
        (Block64x64, Partition::Split) => Block32x32,
        (Block32x32, Partition::Horizontal) => Block32x16,
        (Block32x32, Partition::Vertical) => Block16x32,
        (Block32x32, Partition::Split) => Block16x16,
        (Block16x16, Partition::Horizontal) => Block16x8,
        (Block16x16, Partition::Vertical) => Block8x16,
        (Block16x16, Partition::Split) => Block8x8,
        (Block8x8, Partition::Horizontal) => Block8x4,
        (Block8x8, Partition::Vertical) => Block4x8,
        (Block8x8, Partition::Split) => Block4x4,
        _ => Invalid,
    }
}

/// Above/left partition context fill bytes per block size
pub const PARTITION_CONTEXT_LOOKUP: [(u8, u8); BLOCK_SIZES] = [
    (15, 15), // 4X4
    (15, 14), // 4X8
    (14, 15), // 8X4
    (14, 14), // 8X8
    (14, 12), // 8X16
    (12, 14), // 16X8
    (12, 12), // 16X16
    (12, 8),  // 16X32
    (8, 12),  // 32X16
    (8, 8),   // 32X32
    (8, 0),   // 32X64
    (0, 8),   // 64X32
    (0, 0),   // 64X64
];

// =============================================================================
// Transform Sizes
// =============================================================================

/// Transform sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum TxSize {
    #[default]
    Tx4x4 = 0,
    Tx8x8 = 1,
    Tx16x16 = 2,
    Tx32x32 = 3,
}

/// Number of transform sizes
pub const TX_SIZES: usize = 4;
/// Number of transform size contexts
pub const TX_SIZE_CONTEXTS: usize = 2;

impl TxSize {
    pub const fn from_u8(v: u8) -> Self {
        match v {
            0 => TxSize::Tx4x4,
            1 => TxSize::Tx8x8,
            2 => TxSize::Tx16x16,
            _ => TxSize::Tx32x32,
        }
    }

    pub const fn size(&self) -> usize {
        4 << (*self as usize)
    }

    pub const fn num_coeffs(&self) -> usize {
        16 << (2 * *self as usize)
    }

    /// Width in 4x4 units
    pub const fn num_4x4(&self) -> usize {
        1 << (*self as usize)
    }

    pub const fn min(self, other: TxSize) -> TxSize {
        if (self as u8) < (other as u8) {
            self
        } else {
            other
        }
    }
}

/// Transform size of a chroma block, given the luma block size and transform
pub const fn uv_tx_size(
    block_size: BlockSize,
    tx_size: TxSize,
    ss_x: usize,
    ss_y: usize,
) -> TxSize {
    if block_size.is_sub8x8() {
        return TxSize::Tx4x4;
    }
    let plane_size = block_size.subsampled(ss_x, ss_y);
    if !plane_size.is_valid() {
        return TxSize::Tx4x4;
    }
    tx_size.min(plane_size.max_tx_size())
}

/// Transform type (DCT, ADST combinations)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TxType {
    #[default]
    DctDct = 0, // DCT in both directions
    AdstDct = 1,  // ADST vertical, DCT horizontal
    DctAdst = 2,  // DCT vertical, ADST horizontal
    AdstAdst = 3, // ADST in both directions
}

/// Transform mode from frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum TxMode {
    #[default]
    Only4x4 = 0,
    Allow8x8 = 1,
    Allow16x16 = 2,
    Allow32x32 = 3,
    TxModeSelect = 4, // Per-block selection
}

impl TxMode {
    /// Largest transform allowed by the mode
    pub const fn biggest_tx_size(&self) -> TxSize {
        match self {
            TxMode::Only4x4 => TxSize::Tx4x4,
            TxMode::Allow8x8 => TxSize::Tx8x8,
            TxMode::Allow16x16 => TxSize::Tx16x16,
            TxMode::Allow32x32 | TxMode::TxModeSelect => TxSize::Tx32x32,
        }
    }
}

// =============================================================================
// Prediction Modes
// =============================================================================

/// VP9 prediction modes: ten intra modes followed by four inter modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(u8)]
pub enum PredictionMode {
    #[default]
    DcPred = 0, // DC prediction
    VPred = 1,    // Vertical
    HPred = 2,    // Horizontal
    D45Pred = 3,  // 45-degree diagonal
    D135Pred = 4, // 135-degree diagonal
    D117Pred = 5, // 117-degree
    D153Pred = 6, // 153-degree
    D207Pred = 7, // 207-degree (horizontal-up)
    D63Pred = 8,  // 63-degree (vertical-right)
    TmPred = 9,   // True Motion (gradient)
    NearestMv = 10,
    NearMv = 11,
    ZeroMv = 12,
    NewMv = 13,
}

/// Number of intra modes
pub const INTRA_MODES: usize = 10;
/// Number of inter modes
pub const INTER_MODES: usize = 4;
/// Number of inter mode contexts
pub const INTER_MODE_CONTEXTS: usize = 7;
/// Number of y mode size groups
pub const BLOCK_SIZE_GROUPS: usize = 4;

impl PredictionMode {
    pub const fn from_u8(v: u8) -> Self {
        match v {
            0 => PredictionMode::DcPred,
            1 => PredictionMode::VPred,
            2 => PredictionMode::HPred,
            3 => PredictionMode::D45Pred,
            4 => PredictionMode::D135Pred,
            5 => PredictionMode::D117Pred,
            6 => PredictionMode::D153Pred,
            7 => PredictionMode::D207Pred,
            8 => PredictionMode::D63Pred,
            9 => PredictionMode::TmPred,
            10 => PredictionMode::NearestMv,
            11 => PredictionMode::NearMv,
            12 => PredictionMode::ZeroMv,
            _ => PredictionMode::NewMv,
        }
    }

    /// Inter mode from its tree offset (Nearest = 0)
    pub const fn from_inter_offset(offset: u8) -> Self {
        Self::from_u8(PredictionMode::NearestMv as u8 + offset)
    }

    pub const fn is_inter(&self) -> bool {
        (*self as u8) >= PredictionMode::NearestMv as u8
    }

    /// Index into the inter-mode probability/count arrays
    pub const fn inter_offset(&self) -> usize {
        (*self as usize).saturating_sub(PredictionMode::NearestMv as usize)
    }

    /// Transform type implied by an intra mode for luma blocks
    pub const fn tx_type(&self) -> TxType {
        match self {
            PredictionMode::VPred | PredictionMode::D117Pred | PredictionMode::D63Pred => {
                TxType::AdstDct
            }
            PredictionMode::HPred | PredictionMode::D153Pred | PredictionMode::D207Pred => {
                TxType::DctAdst
            }
            PredictionMode::D135Pred | PredictionMode::TmPred => TxType::AdstAdst,
            _ => TxType::DctDct,
        }
    }
}

// =============================================================================
// Inter Prediction
// =============================================================================

/// Reference frame types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[repr(i8)]
pub enum RefFrame {
    #[default]
    None = -1,
    Intra = 0,
    Last = 1,
    Golden = 2,
    AltRef = 3,
}

/// Number of reference frame slots including intra
pub const MAX_REF_FRAMES: usize = 4;
/// Number of inter references usable by one frame
pub const REFS_PER_FRAME: usize = 3;

impl RefFrame {
    pub const fn from_index(v: usize) -> Self {
        match v {
            0 => RefFrame::Intra,
            1 => RefFrame::Last,
            2 => RefFrame::Golden,
            3 => RefFrame::AltRef,
            _ => RefFrame::None,
        }
    }

    /// Index into per-reference arrays (Intra = 0)
    pub const fn index(&self) -> usize {
        match self {
            RefFrame::None | RefFrame::Intra => 0,
            RefFrame::Last => 1,
            RefFrame::Golden => 2,
            RefFrame::AltRef => 3,
        }
    }

    /// Last, Golden or AltRef
    pub const fn is_inter(&self) -> bool {
        (*self as i8) > RefFrame::Intra as i8
    }
}

/// Motion vector with 1/8-pel precision
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MotionVector {
    pub row: i16, // Vertical component in 1/8-pel units
    pub col: i16, // Horizontal component in 1/8-pel units
}

impl MotionVector {
    pub const fn new(row: i16, col: i16) -> Self {
        MotionVector { row, col }
    }

    pub const fn zero() -> Self {
        MotionVector { row: 0, col: 0 }
    }

    pub const fn is_zero(&self) -> bool {
        self.row == 0 && self.col == 0
    }

    /// Negated vector, used when mixing references of opposite sign bias
    pub const fn inverted(&self) -> Self {
        MotionVector {
            row: self.row.wrapping_neg(),
            col: self.col.wrapping_neg(),
        }
    }
}

/// Interpolation filter types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum InterpFilter {
    #[default]
    EightTap = 0,
    EightTapSmooth = 1,
    EightTapSharp = 2,
    Bilinear = 3,
    Switchable = 4,
}

/// Number of filters selectable per block
pub const SWITCHABLE_FILTERS: usize = 3;
/// Number of switchable interpolation contexts
pub const SWITCHABLE_FILTER_CONTEXTS: usize = SWITCHABLE_FILTERS + 1;

impl InterpFilter {
    pub const fn from_u8(v: u8) -> Self {
        match v {
            0 => InterpFilter::EightTap,
            1 => InterpFilter::EightTapSmooth,
            2 => InterpFilter::EightTapSharp,
            3 => InterpFilter::Bilinear,
            _ => InterpFilter::Switchable,
        }
    }

    /// 8-tap kernel for this filter
    pub fn kernel(&self) -> &'static [[i16; 8]; 16] {
        match self {
            InterpFilter::EightTapSmooth => &SUBPEL_FILTERS_SMOOTH,
            InterpFilter::EightTapSharp => &SUBPEL_FILTERS_SHARP,
            InterpFilter::Bilinear => &BILINEAR_FILTERS,
            _ => &SUBPEL_FILTERS_REGULAR,
        }
    }
}

/// Compound prediction mode from frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum ReferenceMode {
    #[default]
    Single = 0,
    Compound = 1,
    Select = 2,
}

// =============================================================================
// Symbol Trees
// =============================================================================
//
// Trees are stored as pairs of (bit 0, bit 1) children. Positive entries index
// the next pair, non-positive entries are negated leaf symbols.

/// Intra mode tree
pub const INTRA_MODE_TREE: [i8; 18] = [
    -(PredictionMode::DcPred as i8),
    2,
    -(PredictionMode::TmPred as i8),
    4,
    -(PredictionMode::VPred as i8),
    6,
    8,
    12,
    -(PredictionMode::HPred as i8),
    10,
    -(PredictionMode::D135Pred as i8),
    -(PredictionMode::D117Pred as i8),
    -(PredictionMode::D45Pred as i8),
    14,
    -(PredictionMode::D63Pred as i8),
    16,
    -(PredictionMode::D153Pred as i8),
    -(PredictionMode::D207Pred as i8),
];

/// Inter mode tree, leaves are offsets from NearestMv
pub const INTER_MODE_TREE: [i8; 6] = [-2, 2, 0, 4, -1, -3];

/// Partition tree
pub const PARTITION_TREE: [i8; 6] = [0, 2, -1, 4, -2, -3];

/// Switchable interpolation filter tree
pub const SWITCHABLE_INTERP_TREE: [i8; 4] = [0, 2, -1, -2];

/// Segment id tree
pub const SEGMENT_TREE: [i8; 14] = [2, 4, 6, 8, 10, 12, 0, -1, -2, -3, -4, -5, -6, -7];

/// Motion vector joint tree
pub const MV_JOINT_TREE: [i8; 6] = [0, 2, -1, 4, -2, -3];

/// Motion vector class tree
pub const MV_CLASS_TREE: [i8; 20] = [
    0, 2, -1, 4, 6, 8, -2, -3, 10, 12, -4, -5, -6, 14, 16, 18, -7, -8, -9, -10,
];

/// Motion vector fractional part tree
pub const MV_FP_TREE: [i8; 6] = [0, 2, -1, 4, -2, -3];

// =============================================================================
// Motion Vector Constants
// =============================================================================

/// Joint types: which components carry a non-zero differential
pub const MV_JOINT_ZERO: usize = 0;
pub const MV_JOINT_HNZVZ: usize = 1;
pub const MV_JOINT_HZVNZ: usize = 2;
pub const MV_JOINT_HNZVNZ: usize = 3;
pub const MV_JOINTS: usize = 4;

pub const MV_CLASSES: usize = 11;
pub const MV_CLASS0_SIZE: usize = 2;
pub const MV_OFFSET_BITS: usize = 10;
pub const MV_FP_SIZE: usize = 4;

/// Motion vector component range in 1/8 pel
pub const MV_UPP: i32 = (1 << 14) - 1;
pub const MV_LOW: i32 = -(1 << 14);

/// Candidates with either component at or above this (in full pels) drop hp
pub const COMPANDED_MVREF_THRESH: i32 = 8;

/// Border allowed around the frame for candidate clamping, 1/8 pel
pub const MV_BORDER: i32 = 16 << 3;

/// Number of neighbours scanned per block size
pub const MVREF_NEIGHBOURS: usize = 8;

/// Maximum candidates kept per reference
pub const MAX_MV_REF_CANDIDATES: usize = 2;

/// Neighbour offsets as (row, col) in mi units, per block size
pub const MV_REF_BLOCKS: [[(i32, i32); MVREF_NEIGHBOURS]; BLOCK_SIZES] = [
    // 4X4
    [(-1, 0), (0, -1), (-1, -1), (-2, 0), (0, -2), (-2, -1), (-1, -2), (-2, -2)],
    // 4X8
    [(-1, 0), (0, -1), (-1, -1), (-2, 0), (0, -2), (-2, -1), (-1, -2), (-2, -2)],
    // 8X4
    [(-1, 0), (0, -1), (-1, -1), (-2, 0), (0, -2), (-2, -1), (-1, -2), (-2, -2)],
    // 8X8
    [(-1, 0), (0, -1), (-1, -1), (-2, 0), (0, -2), (-2, -1), (-1, -2), (-2, -2)],
    // 8X16
    [(0, -1), (-1, 0), (1, -1), (-1, -1), (0, -2), (-2, 0), (-2, -1), (-1, -2)],
    // 16X8
    [(-1, 0), (0, -1), (-1, 1), (-1, -1), (-2, 0), (0, -2), (-1, -2), (-2, -1)],
    // 16X16
    [(-1, 0), (0, -1), (-1, 1), (1, -1), (-1, -1), (-3, 0), (0, -3), (-3, -3)],
    // 16X32
    [(0, -1), (-1, 0), (2, -1), (-1, -1), (-1, 1), (0, -3), (-3, 0), (-3, -3)],
    // 32X16
    [(-1, 0), (0, -1), (-1, 2), (-1, -1), (1, -1), (-3, 0), (0, -3), (-3, -3)],
    // 32X32
    [(-1, 1), (1, -1), (-1, 2), (2, -1), (-1, -1), (-3, 0), (0, -3), (-3, -3)],
    // 32X64
    [(0, -1), (-1, 0), (4, -1), (-1, 2), (-1, -1), (0, -3), (-3, 0), (2, -1)],
    // 64X32
    [(-1, 0), (0, -1), (-1, 4), (2, -1), (-1, -1), (-3, 0), (0, -3), (-1, 2)],
    // 64X64
    [(-1, 3), (3, -1), (-1, 4), (4, -1), (-1, -1), (-1, 0), (0, -1), (-1, 6)],
];

/// Contribution of each neighbour mode to the inter mode context counter
pub const MODE_2_COUNTER: [u8; INTRA_MODES + INTER_MODES] =
    [9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 0, 0, 3, 1];

/// Mapping from the neighbour counter to an inter mode context
pub const COUNTER_TO_CONTEXT: [u8; 19] =
    [2, 3, 4, 1, 3, 9, 0, 9, 9, 5, 5, 9, 5, 9, 9, 9, 9, 9, 6];

/// Sub-block of a sub-8x8 neighbour facing the current sub-block,
/// indexed by [block][0 = left neighbour, 1 = above neighbour]
pub const IDX_N_COLUMN_TO_SUBBLOCK: [[usize; 2]; 4] = [[1, 2], [1, 3], [3, 2], [3, 3]];

// =============================================================================
// Coefficient Tokens
// =============================================================================

pub const ZERO_TOKEN: usize = 0;
pub const ONE_TOKEN: usize = 1;
pub const TWO_TOKEN: usize = 2;
/// Count slot for "no more coefficients"
pub const EOB_MODEL_TOKEN: usize = 3;

pub const COEF_BANDS: usize = 6;
pub const COEFF_CONTEXTS: usize = 6;
pub const UNCONSTRAINED_NODES: usize = 3;
pub const PLANE_TYPES: usize = 2;
pub const REF_TYPES: usize = 2;

/// Band of each scan position for 4x4 transforms
pub const COEFBAND_4X4: [u8; 16] = [0, 1, 1, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 5, 5, 5];

/// Band of the leading scan positions for 8x8 and larger transforms;
/// positions past the table are band 5
pub const COEFBAND_8X8PLUS: [u8; 15] = [0, 1, 1, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 4];

/// Band for scan position `c` of a transform
#[inline]
pub fn coef_band(tx_size: TxSize, c: usize) -> usize {
    match tx_size {
        TxSize::Tx4x4 => COEFBAND_4X4[c.min(15)] as usize,
        _ => COEFBAND_8X8PLUS.get(c).copied().unwrap_or(5) as usize,
    }
}

/// Energy class of each token, cached to derive the next context
pub const ENERGY_CLASS: [u8; 11] = [0, 1, 2, 3, 3, 4, 4, 5, 5, 5, 5];

pub const CAT1_MIN_VAL: i32 = 5;
pub const CAT2_MIN_VAL: i32 = 7;
pub const CAT3_MIN_VAL: i32 = 11;
pub const CAT4_MIN_VAL: i32 = 19;
pub const CAT5_MIN_VAL: i32 = 35;
pub const CAT6_MIN_VAL: i32 = 67;

pub const CAT1_PROB: [u8; 1] = [159];
pub const CAT2_PROB: [u8; 2] = [165, 145];
pub const CAT3_PROB: [u8; 3] = [173, 148, 140];
pub const CAT4_PROB: [u8; 4] = [176, 155, 140, 135];
pub const CAT5_PROB: [u8; 5] = [180, 157, 141, 134, 130];

/// Category 6 extra-bit probabilities for 12-bit; lower depths use a suffix
const CAT6_PROB_HIGH12: [u8; 18] = [
    255, 255, 255, 255, 254, 254, 254, 252, 249, 243, 230, 196, 177, 153, 140, 133, 130, 129,
];

/// Category 6 extra-bit probabilities for a bit depth (14/16/18 bits)
pub fn cat6_prob(bit_depth: u8) -> &'static [u8] {
    match bit_depth {
        12 => &CAT6_PROB_HIGH12,
        10 => &CAT6_PROB_HIGH12[2..],
        _ => &CAT6_PROB_HIGH12[4..],
    }
}

// =============================================================================
// Interpolation Filters
// =============================================================================

/// 8-tap regular interpolation filter coefficients
/// Indexed by [subpel_position][tap]
pub const SUBPEL_FILTERS_REGULAR: [[i16; 8]; 16] = [
    [0, 0, 0, 128, 0, 0, 0, 0],
    [0, 1, -5, 126, 8, -3, 1, 0],
    [-1, 3, -10, 122, 18, -6, 2, 0],
    [-1, 4, -13, 118, 27, -9, 3, -1],
    [-1, 4, -16, 112, 37, -11, 4, -1],
    [-1, 5, -18, 105, 48, -14, 4, -1],
    [-1, 5, -19, 97, 58, -16, 5, -1],
    [-1, 6, -19, 88, 68, -18, 5, -1],
    [-1, 6, -19, 78, 78, -19, 6, -1],
    [-1, 5, -18, 68, 88, -19, 6, -1],
    [-1, 5, -16, 58, 97, -19, 5, -1],
    [-1, 4, -14, 48, 105, -18, 5, -1],
    [-1, 4, -11, 37, 112, -16, 4, -1],
    [-1, 3, -9, 27, 118, -13, 4, -1],
    [0, 2, -6, 18, 122, -10, 3, -1],
    [0, 1, -3, 8, 126, -5, 1, 0],
];

/// 8-tap smooth interpolation filter
pub const SUBPEL_FILTERS_SMOOTH: [[i16; 8]; 16] = [
    [0, 0, 0, 128, 0, 0, 0, 0],
    [-3, -1, 32, 64, 38, 1, -3, 0],
    [-2, -2, 29, 63, 41, 2, -3, 0],
    [-2, -2, 26, 63, 43, 4, -4, 0],
    [-2, -3, 24, 62, 46, 5, -4, 0],
    [-2, -3, 21, 60, 49, 7, -4, 0],
    [-1, -4, 18, 59, 51, 9, -4, 0],
    [-1, -4, 16, 57, 53, 12, -4, -1],
    [-1, -4, 14, 55, 55, 14, -4, -1],
    [-1, -4, 12, 53, 57, 16, -4, -1],
    [0, -4, 9, 51, 59, 18, -4, -1],
    [0, -4, 7, 49, 60, 21, -3, -2],
    [0, -4, 5, 46, 62, 24, -3, -2],
    [0, -4, 4, 43, 63, 26, -2, -2],
    [0, -3, 2, 41, 63, 29, -2, -2],
    [0, -3, 1, 38, 64, 32, -1, -3],
];

/// 8-tap sharp interpolation filter
pub const SUBPEL_FILTERS_SHARP: [[i16; 8]; 16] = [
    [0, 0, 0, 128, 0, 0, 0, 0],
    [-1, 3, -7, 127, 8, -3, 1, 0],
    [-2, 5, -13, 125, 17, -6, 3, -1],
    [-3, 7, -17, 121, 27, -10, 5, -2],
    [-4, 9, -20, 115, 37, -13, 6, -2],
    [-4, 10, -23, 108, 48, -16, 8, -3],
    [-4, 10, -24, 100, 59, -19, 9, -3],
    [-4, 11, -24, 90, 70, -21, 10, -4],
    [-4, 11, -23, 80, 80, -23, 11, -4],
    [-4, 10, -21, 70, 90, -24, 11, -4],
    [-3, 9, -19, 59, 100, -24, 10, -4],
    [-3, 8, -16, 48, 108, -23, 10, -4],
    [-2, 6, -13, 37, 115, -20, 9, -4],
    [-2, 5, -10, 27, 121, -17, 7, -3],
    [-1, 3, -6, 17, 125, -13, 5, -2],
    [0, 1, -3, 8, 127, -7, 3, -1],
];

/// Bilinear filter expressed as an 8-tap kernel
pub const BILINEAR_FILTERS: [[i16; 8]; 16] = [
    [0, 0, 0, 128, 0, 0, 0, 0],
    [0, 0, 0, 120, 8, 0, 0, 0],
    [0, 0, 0, 112, 16, 0, 0, 0],
    [0, 0, 0, 104, 24, 0, 0, 0],
    [0, 0, 0, 96, 32, 0, 0, 0],
    [0, 0, 0, 88, 40, 0, 0, 0],
    [0, 0, 0, 80, 48, 0, 0, 0],
    [0, 0, 0, 72, 56, 0, 0, 0],
    [0, 0, 0, 64, 64, 0, 0, 0],
    [0, 0, 0, 56, 72, 0, 0, 0],
    [0, 0, 0, 48, 80, 0, 0, 0],
    [0, 0, 0, 40, 88, 0, 0, 0],
    [0, 0, 0, 32, 96, 0, 0, 0],
    [0, 0, 0, 24, 104, 0, 0, 0],
    [0, 0, 0, 16, 112, 0, 0, 0],
    [0, 0, 0, 8, 120, 0, 0, 0],
];

// =============================================================================
// Quantization Tables (8-bit)
// =============================================================================

/// DC quantizer lookup table (8-bit)
pub const DC_QLOOKUP: [i16; 256] = [
    4, 8, 8, 9, 10, 11, 12, 12, 13, 14, 15, 16, 17, 18, 19, 19, 20, 21, 22, 23, 24, 25, 26, 26, 27,
    28, 29, 30, 31, 32, 32, 33, 34, 35, 36, 37, 38, 38, 39, 40, 41, 42, 43, 43, 44, 45, 46, 47, 48,
    48, 49, 50, 51, 52, 53, 53, 54, 55, 56, 57, 57, 58, 59, 60, 61, 62, 62, 63, 64, 65, 66, 66, 67,
    68, 69, 70, 70, 71, 72, 73, 74, 74, 75, 76, 77, 78, 78, 79, 80, 81, 81, 82, 83, 84, 85, 85, 87,
    88, 90, 92, 93, 95, 96, 98, 99, 101, 102, 104, 105, 107, 108, 110, 111, 113, 114, 116, 117,
    118, 120, 121, 123, 125, 127, 129, 131, 134, 136, 138, 140, 142, 144, 146, 148, 150, 152, 154,
    156, 158, 161, 164, 166, 169, 172, 174, 177, 180, 182, 185, 187, 190, 192, 195, 199, 202, 205,
    208, 211, 214, 217, 220, 223, 226, 230, 233, 237, 240, 243, 247, 250, 253, 257, 261, 265, 269,
    272, 276, 280, 284, 288, 292, 296, 300, 304, 309, 313, 317, 322, 326, 330, 335, 340, 344, 349,
    354, 359, 364, 369, 374, 379, 384, 389, 395, 400, 406, 411, 417, 423, 429, 435, 441, 447, 454,
    461, 467, 475, 482, 489, 497, 505, 513, 522, 530, 539, 549, 559, 569, 579, 590, 602, 614, 626,
    640, 654, 668, 684, 700, 717, 736, 755, 775, 796, 819, 843, 869, 896, 925, 955, 988, 1022,
    1058, 1098, 1139, 1184, 1232, 1282, 1336,
];

/// AC quantizer lookup table (8-bit)
pub const AC_QLOOKUP: [i16; 256] = [
    4, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31,
    32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 52, 53, 54, 55,
    56, 57, 58, 59, 60, 61, 62, 63, 64, 65, 66, 67, 68, 69, 70, 71, 72, 73, 74, 75, 76, 77, 78, 79,
    80, 81, 82, 83, 84, 85, 86, 87, 88, 89, 90, 91, 92, 93, 94, 95, 96, 97, 98, 99, 100, 101, 102,
    104, 106, 108, 110, 112, 114, 116, 118, 120, 122, 124, 126, 128, 130, 132, 134, 136, 138, 140,
    142, 144, 146, 148, 150, 152, 155, 158, 161, 164, 167, 170, 173, 176, 179, 182, 185, 188, 191,
    194, 197, 200, 203, 207, 211, 215, 219, 223, 227, 231, 235, 239, 243, 247, 251, 255, 260, 265,
    270, 275, 280, 285, 290, 295, 300, 305, 311, 317, 323, 329, 335, 341, 347, 353, 359, 366, 373,
    380, 387, 394, 401, 408, 416, 424, 432, 440, 448, 456, 465, 474, 483, 492, 501, 510, 520, 530,
    540, 550, 560, 571, 582, 593, 604, 615, 627, 639, 651, 663, 676, 689, 702, 715, 729, 743, 757,
    771, 786, 801, 816, 832, 848, 864, 881, 898, 915, 933, 951, 969, 988, 1007, 1026, 1046, 1066,
    1087, 1108, 1129, 1151, 1173, 1196, 1219, 1243, 1267, 1292, 1317, 1343, 1369, 1396, 1423, 1451,
    1479, 1508, 1537, 1567, 1597, 1628, 1660, 1692, 1725, 1759, 1793, 1828,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_dimensions() {
        assert_eq!(BlockSize::Block64x32.width(), 64);
        assert_eq!(BlockSize::Block64x32.height(), 32);
        assert_eq!(BlockSize::Block4x8.num_8x8_wide(), 1);
        assert_eq!(BlockSize::Block32x64.num_8x8_high(), 8);
        assert_eq!(BlockSize::Block16x16.width_log2(), 2);
        assert!(BlockSize::Block8x4.is_sub8x8());
        assert!(!BlockSize::Block8x8.is_sub8x8());
        assert_eq!(BlockSize::Invalid.width(), 0);
    }

    #[test]
    fn test_subsize() {
        assert_eq!(
            get_subsize(BlockSize::Block64x64, Partition::Split),
            BlockSize::Block32x32
        );
        assert_eq!(
            get_subsize(BlockSize::Block8x8, Partition::Vertical),
            BlockSize::Block4x8
        );
        assert_eq!(
            get_subsize(BlockSize::Block16x8, Partition::Split),
            BlockSize::Invalid
        );
    }

    #[test]
    fn test_subsampled_sizes() {
        assert_eq!(BlockSize::Block16x16.subsampled(1, 1), BlockSize::Block8x8);
        assert_eq!(BlockSize::Block8x16.subsampled(1, 0), BlockSize::Invalid);
        assert_eq!(
            uv_tx_size(BlockSize::Block64x64, TxSize::Tx32x32, 1, 1),
            TxSize::Tx32x32
        );
        assert_eq!(
            uv_tx_size(BlockSize::Block16x16, TxSize::Tx16x16, 1, 1),
            TxSize::Tx8x8
        );
        assert_eq!(
            uv_tx_size(BlockSize::Block4x4, TxSize::Tx4x4, 1, 1),
            TxSize::Tx4x4
        );
    }

    #[test]
    fn test_filters_sum_to_128() {
        for kernel in [
            &SUBPEL_FILTERS_REGULAR,
            &SUBPEL_FILTERS_SMOOTH,
            &SUBPEL_FILTERS_SHARP,
            &BILINEAR_FILTERS,
        ] {
            for taps in kernel.iter() {
                assert_eq!(taps.iter().map(|&t| t as i32).sum::<i32>(), 128);
            }
        }
    }

    #[test]
    fn test_mode_tx_types() {
        assert_eq!(PredictionMode::VPred.tx_type(), TxType::AdstDct);
        assert_eq!(PredictionMode::HPred.tx_type(), TxType::DctAdst);
        assert_eq!(PredictionMode::TmPred.tx_type(), TxType::AdstAdst);
        assert_eq!(PredictionMode::NewMv.tx_type(), TxType::DctDct);
        assert_eq!(PredictionMode::from_inter_offset(2), PredictionMode::ZeroMv);
        assert_eq!(PredictionMode::NewMv.inter_offset(), 3);
    }

    #[test]
    fn test_coef_bands() {
        assert_eq!(coef_band(TxSize::Tx4x4, 15), 5);
        assert_eq!(coef_band(TxSize::Tx8x8, 14), 4);
        assert_eq!(coef_band(TxSize::Tx32x32, 900), 5);
    }

    #[test]
    fn test_cat6_lengths() {
        assert_eq!(cat6_prob(8).len(), 14);
        assert_eq!(cat6_prob(10).len(), 16);
        assert_eq!(cat6_prob(12).len(), 18);
    }

    #[test]
    fn test_quant_tables_monotonic() {
        assert!(DC_QLOOKUP.windows(2).all(|w| w[0] <= w[1]));
        assert!(AC_QLOOKUP.windows(2).all(|w| w[0] <= w[1]));
    }
}
