//! VP9 probability context
//!
//! `FrameContext` holds every forward probability the tile decoder reads.
//! It is read-only for the duration of a frame and shared by all tile
//! workers; adapting it from `FrameCounts` happens outside this crate.

use super::tables::{
    BLOCK_SIZE_GROUPS, COEFF_CONTEXTS, COEF_BANDS, INTER_MODE_CONTEXTS, INTRA_MODES, MV_CLASSES,
    MV_CLASS0_SIZE, MV_FP_SIZE, MV_JOINTS, MV_OFFSET_BITS, PARTITION_CONTEXTS, PLANE_TYPES,
    REF_TYPES, SWITCHABLE_FILTERS, SWITCHABLE_FILTER_CONTEXTS, TX_SIZES, TX_SIZE_CONTEXTS,
    UNCONSTRAINED_NODES,
};

/// Coefficient probabilities
/// Indexed by [tx_size][plane_type][ref_type][band][context][node]
pub type CoefProbs = [[[[[[u8; UNCONSTRAINED_NODES]; COEFF_CONTEXTS]; COEF_BANDS]; REF_TYPES];
    PLANE_TYPES]; TX_SIZES];

/// Number of pivot probabilities covered by the Pareto table
pub const PARETO_ROWS: usize = 255;
/// Tree nodes below the ONE node that the Pareto table models
pub const PARETO_NODES: usize = 8;

// =============================================================================
// Default Probabilities
// =============================================================================

/// Default coefficient probabilities (band 0 has three contexts, padded)
pub const DEFAULT_COEF_PROBS: CoefProbs = [
    // 4x4
    [
        [
            [
                [[195, 29, 183], [84, 49, 136], [8, 42, 71], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[31, 107, 169], [35, 99, 159], [17, 82, 140], [8, 66, 114], [2, 44, 76], [1, 19, 32]],
                [[40, 132, 201], [29, 114, 187], [13, 91, 157], [7, 75, 127], [3, 58, 95], [1, 28, 47]],
                [[69, 142, 221], [42, 122, 201], [15, 91, 159], [6, 67, 121], [1, 42, 77], [1, 17, 31]],
                [[102, 148, 228], [67, 117, 204], [17, 82, 154], [6, 59, 114], [2, 39, 75], [1, 15, 29]],
                [[156, 57, 233], [119, 57, 212], [58, 48, 163], [29, 40, 124], [12, 30, 81], [3, 12, 31]],
            ],
            [
                [[191, 107, 226], [124, 117, 204], [25, 99, 155], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[29, 148, 210], [37, 126, 194], [8, 93, 157], [2, 68, 118], [1, 39, 69], [1, 17, 33]],
                [[41, 151, 213], [27, 123, 193], [3, 82, 144], [1, 58, 105], [1, 32, 60], [1, 13, 26]],
                [[59, 159, 220], [23, 126, 198], [4, 88, 151], [1, 66, 114], [1, 38, 71], [1, 18, 34]],
                [[114, 136, 232], [51, 114, 207], [11, 83, 155], [3, 56, 105], [1, 33, 65], [1, 17, 34]],
                [[149, 65, 234], [121, 57, 215], [61, 49, 166], [28, 36, 114], [12, 25, 76], [3, 16, 42]],
            ],
        ],
        [
            [
                [[214, 49, 220], [132, 63, 188], [42, 65, 137], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[85, 137, 221], [104, 131, 216], [49, 111, 192], [21, 87, 155], [2, 49, 87], [1, 16, 28]],
                [[89, 163, 230], [90, 137, 220], [29, 100, 183], [10, 70, 135], [2, 42, 81], [1, 17, 33]],
                [[108, 167, 237], [55, 133, 222], [15, 97, 179], [4, 72, 135], [1, 45, 85], [1, 19, 38]],
                [[124, 146, 240], [66, 124, 224], [17, 88, 175], [4, 58, 122], [1, 36, 75], [1, 18, 37]],
                [[141, 79, 241], [126, 70, 227], [66, 58, 182], [30, 44, 136], [12, 34, 96], [2, 20, 47]],
            ],
            [
                [[229, 99, 249], [143, 111, 235], [46, 109, 192], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[82, 158, 236], [94, 146, 224], [25, 117, 191], [9, 87, 149], [3, 56, 99], [1, 33, 57]],
                [[83, 167, 237], [68, 145, 222], [10, 103, 177], [2, 72, 131], [1, 41, 79], [1, 20, 39]],
                [[99, 167, 239], [47, 141, 224], [10, 104, 178], [2, 73, 133], [1, 44, 85], [1, 22, 47]],
                [[127, 145, 243], [71, 129, 228], [17, 93, 177], [3, 61, 124], [1, 41, 84], [1, 21, 52]],
                [[157, 78, 244], [140, 72, 231], [69, 58, 184], [31, 44, 137], [14, 38, 105], [8, 23, 61]],
            ],
        ],
    ],
    // 8x8
    [
        [
            [
                [[125, 34, 187], [52, 41, 133], [6, 31, 56], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[37, 109, 153], [51, 102, 147], [23, 87, 128], [8, 67, 101], [1, 41, 63], [1, 19, 29]],
                [[31, 154, 185], [17, 127, 175], [6, 96, 145], [2, 73, 114], [1, 51, 82], [1, 28, 45]],
                [[23, 163, 200], [10, 131, 185], [2, 93, 148], [1, 67, 111], [1, 41, 69], [1, 14, 24]],
                [[29, 176, 217], [12, 145, 201], [3, 101, 156], [1, 69, 111], [1, 39, 63], [1, 14, 23]],
                [[57, 192, 233], [25, 154, 215], [6, 109, 167], [3, 78, 118], [1, 48, 69], [1, 21, 29]],
            ],
            [
                [[202, 105, 245], [108, 106, 216], [18, 90, 144], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[33, 172, 219], [64, 149, 206], [14, 117, 177], [5, 90, 141], [2, 61, 95], [1, 37, 57]],
                [[33, 179, 220], [11, 140, 198], [1, 89, 148], [1, 60, 104], [1, 33, 57], [1, 12, 21]],
                [[30, 181, 221], [8, 141, 198], [1, 87, 145], [1, 58, 100], [1, 31, 55], [1, 12, 20]],
                [[32, 186, 224], [7, 142, 198], [1, 86, 143], [1, 58, 100], [1, 31, 55], [1, 12, 22]],
                [[57, 192, 227], [20, 143, 204], [3, 96, 154], [1, 68, 112], [1, 42, 69], [1, 19, 32]],
            ],
        ],
        [
            [
                [[212, 35, 215], [113, 47, 169], [29, 48, 105], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[74, 129, 203], [106, 120, 203], [49, 107, 178], [19, 84, 144], [4, 50, 84], [1, 15, 25]],
                [[71, 172, 217], [44, 141, 209], [15, 102, 173], [6, 76, 133], [2, 51, 89], [1, 24, 42]],
                [[64, 185, 231], [31, 148, 216], [8, 103, 175], [3, 74, 131], [1, 46, 81], [1, 18, 30]],
                [[65, 196, 235], [25, 157, 221], [5, 105, 174], [1, 67, 120], [1, 38, 69], [1, 15, 30]],
                [[65, 204, 238], [30, 156, 224], [7, 107, 177], [2, 70, 124], [1, 42, 73], [1, 18, 34]],
            ],
            [
                [[225, 86, 251], [144, 104, 235], [42, 99, 181], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[85, 175, 239], [112, 165, 229], [29, 136, 200], [12, 103, 162], [6, 77, 123], [2, 53, 84]],
                [[75, 183, 239], [30, 155, 221], [3, 106, 171], [1, 74, 128], [1, 44, 76], [1, 17, 28]],
                [[73, 185, 240], [27, 159, 222], [2, 107, 172], [1, 75, 127], [1, 42, 73], [1, 17, 29]],
                [[62, 190, 238], [21, 159, 222], [2, 107, 172], [1, 72, 122], [1, 40, 71], [1, 18, 32]],
                [[61, 199, 240], [27, 161, 226], [4, 113, 180], [1, 76, 129], [1, 46, 80], [1, 23, 41]],
            ],
        ],
    ],
    // 16x16
    [
        [
            [
                [[7, 27, 153], [5, 30, 95], [1, 16, 30], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[50, 75, 127], [57, 75, 124], [27, 67, 108], [10, 54, 86], [1, 33, 52], [1, 12, 18]],
                [[43, 125, 151], [26, 108, 148], [7, 83, 122], [2, 59, 89], [1, 38, 60], [1, 17, 27]],
                [[23, 144, 163], [13, 112, 154], [2, 75, 117], [1, 50, 81], [1, 31, 51], [1, 14, 23]],
                [[18, 162, 185], [6, 123, 171], [1, 78, 125], [1, 51, 86], [1, 31, 54], [1, 14, 23]],
                [[15, 199, 227], [3, 150, 204], [1, 91, 146], [1, 55, 95], [1, 30, 53], [1, 11, 20]],
            ],
            [
                [[19, 55, 240], [19, 59, 196], [3, 52, 105], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[41, 166, 207], [104, 153, 199], [31, 123, 181], [14, 101, 152], [5, 72, 106], [1, 36, 52]],
                [[35, 176, 211], [12, 131, 190], [2, 88, 144], [1, 60, 101], [1, 36, 60], [1, 16, 28]],
                [[28, 183, 213], [8, 134, 191], [1, 86, 142], [1, 56, 96], [1, 30, 53], [1, 12, 20]],
                [[20, 190, 215], [4, 135, 192], [1, 84, 139], [1, 53, 91], [1, 28, 49], [1, 11, 20]],
                [[13, 196, 216], [2, 137, 192], [1, 86, 143], [1, 57, 99], [1, 32, 56], [1, 13, 24]],
            ],
        ],
        [
            [
                [[211, 29, 217], [96, 47, 156], [22, 43, 87], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[78, 120, 193], [111, 116, 186], [46, 102, 164], [15, 80, 128], [2, 49, 76], [1, 18, 28]],
                [[71, 161, 203], [42, 132, 192], [10, 98, 150], [3, 69, 109], [1, 44, 70], [1, 18, 29]],
                [[57, 186, 211], [30, 140, 196], [4, 93, 146], [1, 62, 102], [1, 38, 65], [1, 16, 27]],
                [[47, 199, 217], [14, 145, 196], [1, 88, 142], [1, 57, 98], [1, 36, 62], [1, 15, 26]],
                [[26, 219, 229], [5, 155, 207], [1, 94, 151], [1, 60, 104], [1, 36, 62], [1, 16, 28]],
            ],
            [
                [[233, 29, 248], [146, 47, 220], [43, 52, 140], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[100, 163, 232], [179, 161, 222], [63, 142, 204], [37, 113, 174], [26, 89, 137], [18, 68, 97]],
                [[85, 181, 230], [32, 146, 209], [7, 100, 164], [3, 71, 121], [1, 45, 77], [1, 18, 30]],
                [[65, 187, 230], [20, 148, 207], [2, 97, 159], [1, 68, 116], [1, 40, 70], [1, 14, 29]],
                [[40, 194, 227], [8, 147, 204], [1, 94, 155], [1, 65, 112], [1, 39, 66], [1, 14, 26]],
                [[16, 208, 228], [3, 151, 207], [1, 98, 160], [1, 67, 117], [1, 41, 74], [1, 17, 31]],
            ],
        ],
    ],
    // 32x32
    [
        [
            [
                [[17, 38, 140], [7, 34, 80], [1, 17, 29], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[37, 75, 128], [41, 76, 128], [26, 66, 116], [12, 52, 94], [2, 32, 55], [1, 10, 16]],
                [[50, 127, 154], [37, 109, 152], [16, 82, 121], [5, 59, 85], [1, 35, 54], [1, 13, 20]],
                [[40, 142, 167], [17, 110, 157], [2, 71, 112], [1, 44, 72], [1, 27, 45], [1, 11, 17]],
                [[30, 175, 188], [9, 124, 169], [1, 74, 116], [1, 48, 78], [1, 30, 49], [1, 11, 18]],
                [[10, 222, 223], [2, 150, 194], [1, 83, 128], [1, 48, 79], [1, 27, 45], [1, 11, 17]],
            ],
            [
                [[36, 41, 235], [29, 36, 193], [10, 27, 111], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[85, 165, 222], [177, 162, 215], [110, 135, 195], [57, 113, 168], [23, 83, 120], [10, 49, 61]],
                [[85, 190, 223], [36, 139, 200], [5, 90, 146], [1, 60, 103], [1, 38, 65], [1, 18, 30]],
                [[72, 202, 223], [23, 141, 199], [2, 86, 140], [1, 56, 97], [1, 36, 61], [1, 16, 27]],
                [[55, 218, 225], [13, 145, 200], [1, 86, 141], [1, 57, 99], [1, 35, 61], [1, 13, 22]],
                [[15, 235, 212], [1, 132, 184], [1, 84, 139], [1, 57, 97], [1, 34, 56], [1, 14, 23]],
            ],
        ],
        [
            [
                [[181, 21, 201], [61, 37, 123], [10, 38, 71], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[47, 106, 172], [95, 104, 173], [42, 93, 159], [18, 77, 131], [4, 50, 81], [1, 17, 23]],
                [[62, 147, 199], [44, 130, 189], [28, 102, 154], [18, 75, 115], [2, 44, 65], [1, 12, 19]],
                [[55, 153, 210], [24, 130, 194], [3, 93, 146], [1, 61, 97], [1, 31, 50], [1, 10, 16]],
                [[49, 186, 223], [17, 148, 204], [1, 96, 142], [1, 53, 83], [1, 26, 44], [1, 11, 17]],
                [[13, 217, 212], [2, 136, 180], [1, 78, 124], [1, 50, 83], [1, 29, 49], [1, 14, 23]],
            ],
            [
                [[197, 13, 247], [82, 17, 222], [25, 17, 162], [0, 0, 0], [0, 0, 0], [0, 0, 0]],
                [[126, 186, 247], [234, 191, 243], [176, 177, 234], [104, 158, 220], [66, 128, 186], [55, 90, 137]],
                [[111, 197, 242], [46, 158, 219], [9, 104, 171], [2, 65, 125], [1, 44, 80], [1, 17, 91]],
                [[104, 208, 245], [39, 168, 224], [3, 109, 162], [1, 79, 124], [1, 50, 102], [1, 43, 102]],
                [[84, 220, 246], [31, 177, 231], [2, 115, 180], [1, 79, 134], [1, 55, 77], [1, 60, 79]],
                [[43, 243, 240], [8, 180, 217], [1, 115, 166], [1, 84, 121], [1, 51, 67], [1, 16, 6]],
            ],
        ],
    ],
];

/// Default partition probabilities
/// Indexed by [context][node]; contexts 0-3 are 8x8, 12-15 are 64x64
pub const DEFAULT_PARTITION_PROBS: [[u8; 3]; PARTITION_CONTEXTS] = [
    [199, 122, 141], // 8x8 -> 4x4
    [147, 63, 159],
    [148, 133, 118],
    [121, 104, 114],
    [174, 73, 87], // 16x16 -> 8x8
    [92, 41, 83],
    [82, 99, 50],
    [53, 39, 39],
    [177, 58, 59], // 32x32 -> 16x16
    [68, 26, 63],
    [52, 79, 25],
    [17, 14, 12],
    [222, 34, 30], // 64x64 -> 32x32
    [72, 16, 44],
    [58, 32, 12],
    [10, 7, 6],
];

/// Partition probabilities of intra-only frames, never adapted
pub const DEFAULT_KF_PARTITION_PROBS: [[u8; 3]; PARTITION_CONTEXTS] = [
    [158, 97, 94], // 8x8 -> 4x4
    [93, 24, 99],
    [85, 119, 44],
    [62, 59, 67],
    [149, 53, 53], // 16x16 -> 8x8
    [94, 20, 48],
    [83, 53, 24],
    [52, 18, 18],
    [150, 40, 39], // 32x32 -> 16x16
    [78, 12, 26],
    [67, 33, 11],
    [24, 7, 5],
    [174, 35, 49], // 64x64 -> 32x32
    [68, 11, 27],
    [57, 15, 9],
    [12, 3, 3],
];

/// Default skip probabilities
pub const DEFAULT_SKIP_PROBS: [u8; 3] = [192, 128, 64];

/// Default intra/inter probabilities
pub const DEFAULT_INTRA_INTER_PROB: [u8; 4] = [9, 102, 187, 225];

/// Default compound mode probabilities
pub const DEFAULT_COMP_INTER_PROB: [u8; 5] = [239, 183, 119, 96, 41];

/// Default single reference probabilities
pub const DEFAULT_SINGLE_REF_PROB: [[u8; 2]; 5] =
    [[33, 16], [77, 74], [142, 142], [172, 170], [238, 247]];

/// Default compound reference probabilities
pub const DEFAULT_COMP_REF_PROB: [u8; 5] = [50, 126, 123, 221, 226];

/// Default inter mode probabilities
pub const DEFAULT_INTER_MODE_PROBS: [[u8; 3]; INTER_MODE_CONTEXTS] = [
    [2, 173, 34],
    [7, 145, 85],
    [7, 166, 63],
    [7, 94, 66],
    [8, 64, 46],
    [17, 81, 31],
    [25, 29, 30],
];

/// Default switchable interpolation filter probabilities
pub const DEFAULT_SWITCHABLE_INTERP_PROBS: [[u8; SWITCHABLE_FILTERS - 1];
    SWITCHABLE_FILTER_CONTEXTS] = [[235, 162], [36, 255], [34, 3], [149, 144]];

/// Default Y mode probabilities for key frames
/// Indexed by [above_mode][left_mode][node]
pub const DEFAULT_KF_Y_MODE_PROBS: [[[u8; INTRA_MODES - 1]; INTRA_MODES]; INTRA_MODES] = [
    [
        // above = dc
        [137, 30, 42, 148, 151, 207, 70, 52, 91],
        [92, 45, 102, 136, 116, 180, 74, 90, 100],
        [73, 32, 19, 187, 222, 215, 46, 34, 100],
        [91, 30, 32, 116, 121, 186, 93, 86, 94],
        [72, 35, 36, 149, 68, 206, 68, 63, 105],
        [73, 31, 28, 138, 57, 124, 55, 122, 151],
        [67, 23, 21, 140, 126, 197, 40, 37, 171],
        [86, 27, 28, 128, 154, 212, 45, 43, 53],
        [74, 32, 27, 107, 86, 160, 63, 134, 102],
        [59, 67, 44, 140, 161, 202, 78, 67, 119],
    ],
    [
        // above = v
        [63, 36, 126, 146, 123, 158, 60, 90, 96],
        [43, 46, 168, 134, 107, 128, 69, 142, 92],
        [44, 29, 68, 159, 201, 177, 50, 57, 77],
        [58, 38, 76, 114, 97, 172, 78, 133, 92],
        [46, 41, 76, 140, 63, 184, 69, 112, 57],
        [38, 32, 85, 140, 46, 112, 54, 151, 133],
        [39, 27, 61, 131, 110, 175, 44, 75, 136],
        [52, 30, 74, 113, 130, 175, 51, 64, 58],
        [47, 35, 80, 100, 74, 143, 64, 163, 74],
        [36, 61, 116, 114, 128, 162, 80, 125, 82],
    ],
    [
        // above = h
        [82, 26, 26, 171, 208, 204, 44, 32, 105],
        [55, 44, 68, 166, 179, 192, 57, 57, 108],
        [42, 26, 11, 199, 241, 228, 23, 15, 85],
        [68, 42, 19, 131, 160, 199, 55, 52, 83],
        [58, 50, 25, 139, 115, 232, 39, 52, 118],
        [50, 35, 33, 153, 104, 162, 64, 59, 131],
        [44, 24, 16, 150, 177, 202, 33, 19, 156],
        [55, 27, 12, 153, 203, 218, 26, 27, 49],
        [53, 49, 21, 110, 116, 168, 59, 80, 76],
        [38, 72, 19, 168, 203, 212, 50, 50, 107],
    ],
    [
        // above = d45
        [103, 26, 36, 129, 132, 201, 83, 80, 93],
        [59, 38, 83, 112, 103, 162, 98, 136, 90],
        [62, 30, 23, 158, 200, 207, 59, 57, 50],
        [67, 30, 29, 84, 86, 191, 102, 91, 59],
        [60, 32, 33, 112, 71, 220, 64, 89, 104],
        [53, 26, 34, 130, 56, 149, 84, 120, 103],
        [53, 21, 23, 133, 109, 210, 56, 77, 172],
        [77, 19, 29, 112, 142, 228, 55, 66, 36],
        [61, 29, 29, 93, 97, 165, 83, 175, 162],
        [47, 47, 43, 114, 137, 181, 100, 99, 95],
    ],
    [
        // above = d135
        [69, 23, 29, 128, 83, 199, 46, 44, 101],
        [53, 40, 55, 139, 69, 183, 61, 80, 110],
        [40, 29, 19, 161, 180, 207, 43, 24, 91],
        [60, 34, 19, 105, 61, 198, 53, 64, 89],
        [52, 31, 22, 158, 40, 209, 58, 62, 89],
        [44, 31, 29, 147, 46, 158, 56, 102, 198],
        [35, 19, 12, 135, 87, 209, 41, 45, 167],
        [55, 25, 21, 118, 95, 215, 38, 39, 66],
        [51, 38, 25, 113, 58, 164, 70, 93, 97],
        [47, 54, 34, 146, 108, 203, 72, 103, 151],
    ],
    [
        // above = d117
        [64, 19, 37, 156, 66, 138, 49, 95, 133],
        [46, 27, 80, 150, 55, 124, 55, 121, 135],
        [36, 23, 27, 165, 149, 166, 54, 64, 118],
        [53, 21, 36, 131, 63, 163, 60, 109, 81],
        [40, 26, 35, 154, 40, 185, 51, 97, 123],
        [35, 19, 34, 179, 19, 97, 48, 129, 124],
        [36, 20, 26, 136, 62, 164, 33, 77, 154],
        [45, 18, 32, 130, 90, 157, 40, 79, 91],
        [45, 26, 28, 129, 45, 129, 49, 147, 123],
        [38, 44, 51, 136, 74, 162, 57, 97, 121],
    ],
    [
        // above = d153
        [75, 17, 22, 136, 138, 185, 32, 34, 166],
        [56, 39, 58, 133, 117, 173, 48, 53, 187],
        [35, 21, 12, 161, 212, 207, 20, 23, 145],
        [56, 29, 19, 117, 109, 181, 55, 68, 112],
        [47, 29, 17, 153, 64, 220, 59, 51, 114],
        [46, 16, 24, 136, 76, 147, 41, 64, 172],
        [34, 17, 11, 108, 152, 187, 13, 15, 209],
        [51, 24, 14, 115, 133, 209, 32, 26, 104],
        [55, 30, 18, 122, 79, 179, 44, 88, 116],
        [37, 49, 25, 129, 168, 164, 41, 54, 148],
    ],
    [
        // above = d207
        [82, 22, 32, 127, 143, 213, 39, 41, 70],
        [62, 44, 61, 123, 105, 189, 48, 57, 64],
        [47, 25, 17, 175, 222, 220, 24, 30, 86],
        [68, 36, 17, 106, 102, 206, 59, 74, 74],
        [57, 39, 23, 151, 68, 216, 55, 63, 58],
        [49, 30, 35, 141, 70, 168, 82, 40, 115],
        [51, 25, 15, 136, 129, 202, 38, 35, 139],
        [68, 26, 16, 111, 141, 215, 29, 28, 28],
        [59, 39, 19, 114, 75, 180, 77, 104, 42],
        [40, 61, 26, 126, 152, 206, 61, 59, 93],
    ],
    [
        // above = d63
        [78, 23, 39, 111, 117, 170, 74, 124, 94],
        [48, 34, 86, 101, 92, 146, 78, 179, 134],
        [47, 22, 24, 138, 187, 178, 68, 69, 59],
        [56, 25, 33, 105, 112, 187, 95, 177, 129],
        [48, 31, 27, 114, 63, 183, 82, 116, 56],
        [43, 28, 37, 121, 63, 123, 61, 192, 169],
        [42, 17, 24, 109, 97, 177, 56, 76, 122],
        [58, 18, 28, 105, 139, 182, 70, 92, 63],
        [46, 23, 32, 74, 86, 150, 67, 183, 88],
        [36, 38, 48, 92, 122, 165, 88, 137, 91],
    ],
    [
        // above = tm
        [65, 70, 60, 155, 159, 199, 61, 60, 81],
        [44, 78, 115, 132, 119, 173, 71, 112, 93],
        [39, 38, 21, 184, 227, 206, 42, 32, 64],
        [58, 47, 36, 124, 137, 193, 80, 82, 78],
        [49, 50, 35, 144, 95, 205, 63, 78, 59],
        [41, 53, 52, 148, 71, 142, 65, 128, 51],
        [40, 36, 28, 143, 143, 202, 40, 55, 137],
        [52, 34, 29, 129, 183, 227, 42, 35, 43],
        [42, 44, 44, 104, 105, 164, 64, 130, 80],
        [43, 81, 53, 140, 169, 204, 68, 84, 72],
    ],
];

/// Default UV mode probabilities for key frames, indexed by [y_mode]
pub const DEFAULT_KF_UV_MODE_PROBS: [[u8; INTRA_MODES - 1]; INTRA_MODES] = [
    [144, 11, 54, 157, 195, 130, 46, 58, 108],
    [118, 15, 123, 148, 131, 101, 44, 93, 131],
    [113, 12, 23, 188, 226, 142, 26, 32, 125],
    [120, 11, 50, 123, 163, 135, 64, 77, 103],
    [113, 9, 36, 155, 111, 157, 32, 44, 161],
    [116, 9, 55, 176, 76, 96, 37, 61, 149],
    [115, 9, 28, 141, 161, 167, 21, 25, 193],
    [120, 12, 32, 145, 195, 142, 32, 38, 86],
    [116, 12, 64, 120, 140, 125, 49, 115, 121],
    [102, 19, 66, 162, 182, 122, 35, 59, 128],
];

/// Default Y mode probabilities for inter frames, indexed by size group
pub const DEFAULT_IF_Y_MODE_PROBS: [[u8; INTRA_MODES - 1]; BLOCK_SIZE_GROUPS] = [
    [65, 32, 18, 144, 162, 194, 41, 51, 98],
    [132, 68, 18, 165, 217, 196, 45, 40, 78],
    [173, 80, 19, 176, 240, 193, 64, 35, 46],
    [221, 135, 38, 194, 248, 121, 96, 85, 29],
];

/// Default UV mode probabilities for inter frames, indexed by [y_mode]
pub const DEFAULT_IF_UV_MODE_PROBS: [[u8; INTRA_MODES - 1]; INTRA_MODES] = [
    [120, 7, 76, 176, 208, 126, 28, 54, 103],
    [48, 12, 154, 155, 139, 90, 34, 117, 119],
    [67, 6, 25, 204, 243, 158, 13, 21, 96],
    [97, 5, 44, 131, 176, 139, 48, 68, 97],
    [83, 5, 42, 156, 111, 152, 26, 49, 152],
    [80, 5, 58, 178, 74, 83, 33, 62, 145],
    [86, 5, 32, 154, 192, 168, 14, 22, 163],
    [85, 5, 32, 156, 216, 148, 19, 29, 73],
    [77, 7, 64, 116, 132, 122, 37, 126, 120],
    [101, 21, 107, 181, 192, 103, 19, 67, 125],
];

// =============================================================================
// Transform and Motion Vector Probabilities
// =============================================================================

/// Transform size probabilities, indexed by [context][node]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxProbs {
    pub p8x8: [[u8; 1]; TX_SIZE_CONTEXTS],
    pub p16x16: [[u8; 2]; TX_SIZE_CONTEXTS],
    pub p32x32: [[u8; 3]; TX_SIZE_CONTEXTS],
}

impl Default for TxProbs {
    fn default() -> Self {
        TxProbs {
            p8x8: [[100], [66]],
            p16x16: [[20, 152], [15, 101]],
            p32x32: [[3, 136, 37], [5, 52, 13]],
        }
    }
}

impl TxProbs {
    /// Node probabilities for a context and largest allowed transform
    pub fn for_max_tx(&self, max_tx: usize, ctx: usize) -> &[u8] {
        match max_tx {
            1 => &self.p8x8[ctx],
            2 => &self.p16x16[ctx],
            _ => &self.p32x32[ctx],
        }
    }
}

/// Probabilities for one motion vector component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MvComponentProbs {
    pub sign: u8,
    pub classes: [u8; MV_CLASSES - 1],
    pub class0: [u8; MV_CLASS0_SIZE - 1],
    pub bits: [u8; MV_OFFSET_BITS],
    pub class0_fp: [[u8; MV_FP_SIZE - 1]; MV_CLASS0_SIZE],
    pub fp: [u8; MV_FP_SIZE - 1],
    pub class0_hp: u8,
    pub hp: u8,
}

/// Motion vector probabilities; component 0 is vertical
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MvProbs {
    pub joints: [u8; MV_JOINTS - 1],
    pub comps: [MvComponentProbs; 2],
}

impl Default for MvProbs {
    fn default() -> Self {
        MvProbs {
            joints: [32, 64, 96],
            comps: [
                MvComponentProbs {
                    sign: 128,
                    classes: [224, 144, 192, 168, 192, 176, 192, 198, 198, 245],
                    class0: [216],
                    bits: [136, 140, 148, 160, 176, 192, 224, 234, 234, 240],
                    class0_fp: [[128, 128, 64], [96, 112, 64]],
                    fp: [64, 96, 64],
                    class0_hp: 160,
                    hp: 128,
                },
                MvComponentProbs {
                    sign: 128,
                    classes: [216, 128, 176, 160, 176, 176, 192, 198, 198, 208],
                    class0: [208],
                    bits: [136, 140, 148, 160, 176, 192, 224, 234, 234, 240],
                    class0_fp: [[128, 128, 64], [96, 112, 64]],
                    fp: [64, 96, 64],
                    class0_hp: 160,
                    hp: 128,
                },
            ],
        }
    }
}

// =============================================================================
// Frame Context
// =============================================================================

/// Frame probability context
/// Contains all probability tables read while decoding tiles
#[derive(Debug, Clone)]
pub struct FrameContext {
    /// Coefficient token probabilities
    pub coef_probs: CoefProbs,
    /// Partition probabilities [context][node]
    pub partition_probs: [[u8; 3]; PARTITION_CONTEXTS],
    /// Partition probabilities for intra-only frames
    pub kf_partition_probs: [[u8; 3]; PARTITION_CONTEXTS],
    /// Skip probabilities
    pub skip_probs: [u8; 3],
    /// Transform size probabilities
    pub tx_probs: TxProbs,
    /// Y mode probabilities for intra frames [above][left][node]
    pub kf_y_mode_probs: [[[u8; INTRA_MODES - 1]; INTRA_MODES]; INTRA_MODES],
    /// UV mode probabilities for intra frames [y_mode][node]
    pub kf_uv_mode_probs: [[u8; INTRA_MODES - 1]; INTRA_MODES],
    /// Y mode probabilities for inter frames [size_group][node]
    pub y_mode_probs: [[u8; INTRA_MODES - 1]; BLOCK_SIZE_GROUPS],
    /// UV mode probabilities for inter frames [y_mode][node]
    pub uv_mode_probs: [[u8; INTRA_MODES - 1]; INTRA_MODES],
    /// Intra/inter probabilities
    pub intra_inter_probs: [u8; 4],
    /// Compound inter probabilities
    pub comp_inter_probs: [u8; 5],
    /// Single reference probabilities
    pub single_ref_probs: [[u8; 2]; 5],
    /// Compound reference probabilities
    pub comp_ref_probs: [u8; 5],
    /// Inter mode probabilities
    pub inter_mode_probs: [[u8; 3]; INTER_MODE_CONTEXTS],
    /// Switchable interpolation filter probabilities
    pub switchable_interp_probs: [[u8; SWITCHABLE_FILTERS - 1]; SWITCHABLE_FILTER_CONTEXTS],
    /// Segment id tree probabilities
    pub seg_tree_probs: [u8; 7],
    /// Segment id prediction probabilities
    pub seg_pred_probs: [u8; 3],
    /// Motion vector probabilities
    pub mv: MvProbs,
}

impl Default for FrameContext {
    fn default() -> Self {
        FrameContext {
            coef_probs: DEFAULT_COEF_PROBS,
            partition_probs: DEFAULT_PARTITION_PROBS,
            kf_partition_probs: DEFAULT_KF_PARTITION_PROBS,
            skip_probs: DEFAULT_SKIP_PROBS,
            tx_probs: TxProbs::default(),
            kf_y_mode_probs: DEFAULT_KF_Y_MODE_PROBS,
            kf_uv_mode_probs: DEFAULT_KF_UV_MODE_PROBS,
            y_mode_probs: DEFAULT_IF_Y_MODE_PROBS,
            uv_mode_probs: DEFAULT_IF_UV_MODE_PROBS,
            intra_inter_probs: DEFAULT_INTRA_INTER_PROB,
            comp_inter_probs: DEFAULT_COMP_INTER_PROB,
            single_ref_probs: DEFAULT_SINGLE_REF_PROB,
            comp_ref_probs: DEFAULT_COMP_REF_PROB,
            inter_mode_probs: DEFAULT_INTER_MODE_PROBS,
            switchable_interp_probs: DEFAULT_SWITCHABLE_INTERP_PROBS,
            seg_tree_probs: [255; 7],
            seg_pred_probs: [255; 3],
            mv: MvProbs::default(),
        }
    }
}

impl FrameContext {
    /// Reset to default probabilities
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// =============================================================================
// Pareto Token Model
// =============================================================================

/// Token tree node probabilities below ONE, one row per pivot probability
/// (row `p - 1` for pivot `p`)
pub static PARETO_TABLE: [[u8; PARETO_NODES]; PARETO_ROWS] = [
    [3, 86, 128, 6, 86, 23, 88, 29],
    [6, 86, 128, 11, 87, 42, 91, 52],
    [9, 86, 129, 17, 88, 61, 94, 76],
    [12, 86, 129, 22, 88, 77, 97, 93],
    [15, 87, 129, 28, 89, 93, 100, 110],
    [17, 87, 129, 33, 90, 105, 103, 123],
    [20, 88, 130, 38, 91, 118, 106, 136],
    [23, 88, 130, 43, 91, 128, 108, 146],
    [26, 89, 131, 48, 92, 139, 111, 156],
    [28, 89, 131, 53, 93, 147, 114, 163],
    [31, 90, 131, 58, 94, 156, 117, 171],
    [34, 90, 131, 62, 94, 163, 119, 177],
    [37, 90, 132, 66, 95, 171, 122, 184],
    [39, 90, 132, 70, 96, 177, 124, 189],
    [42, 91, 132, 75, 97, 183, 127, 194],
    [44, 91, 132, 79, 97, 188, 129, 198],
    [47, 92, 133, 83, 98, 193, 132, 202],
    [49, 92, 133, 86, 99, 197, 134, 205],
    [52, 93, 133, 90, 100, 201, 137, 208],
    [54, 93, 133, 94, 100, 204, 139, 211],
    [57, 94, 134, 98, 101, 208, 142, 214],
    [59, 94, 134, 101, 102, 211, 144, 216],
    [62, 94, 135, 105, 103, 214, 146, 218],
    [64, 94, 135, 108, 103, 216, 148, 220],
    [66, 95, 135, 111, 104, 219, 151, 222],
    [68, 95, 135, 114, 105, 221, 153, 223],
    [71, 96, 136, 117, 106, 224, 155, 225],
    [73, 96, 136, 120, 106, 225, 157, 226],
    [76, 97, 136, 123, 107, 227, 159, 228],
    [78, 97, 136, 126, 108, 229, 160, 229],
    [80, 98, 137, 129, 109, 231, 162, 231],
    [82, 98, 137, 131, 109, 232, 164, 232],
    [84, 98, 138, 134, 110, 234, 166, 233],
    [86, 98, 138, 137, 111, 235, 168, 234],
    [89, 99, 138, 140, 112, 236, 170, 235],
    [91, 99, 138, 142, 112, 237, 171, 235],
    [93, 100, 139, 145, 113, 238, 173, 236],
    [95, 100, 139, 147, 114, 239, 174, 237],
    [97, 101, 140, 149, 115, 240, 176, 238],
    [99, 101, 140, 151, 115, 241, 177, 238],
    [101, 102, 140, 154, 116, 242, 179, 239],
    [103, 102, 140, 156, 117, 242, 180, 239],
    [105, 103, 141, 158, 118, 243, 182, 240],
    [107, 103, 141, 160, 118, 243, 183, 240],
    [109, 104, 141, 162, 119, 244, 185, 241],
    [111, 104, 141, 164, 119, 244, 186, 241],
    [113, 104, 142, 166, 120, 245, 187, 242],
    [114, 104, 142, 168, 121, 245, 188, 242],
    [116, 105, 143, 170, 122, 246, 190, 243],
    [118, 105, 143, 171, 122, 246, 191, 243],
    [120, 106, 143, 173, 123, 247, 192, 244],
    [121, 106, 143, 175, 124, 247, 193, 244],
    [123, 107, 144, 177, 125, 248, 195, 244],
    [125, 107, 144, 178, 125, 248, 196, 244],
    [127, 108, 145, 180, 126, 249, 197, 245],
    [128, 108, 145, 181, 127, 249, 198, 245],
    [130, 109, 145, 183, 128, 249, 199, 245],
    [132, 109, 145, 184, 128, 249, 200, 245],
    [134, 110, 146, 186, 129, 250, 201, 246],
    [135, 110, 146, 187, 130, 250, 202, 246],
    [137, 111, 147, 189, 131, 251, 203, 246],
    [138, 111, 147, 190, 131, 251, 204, 246],
    [140, 112, 147, 192, 132, 251, 205, 247],
    [141, 112, 147, 193, 132, 251, 206, 247],
    [143, 113, 148, 194, 133, 251, 207, 247],
    [144, 113, 148, 195, 134, 251, 207, 247],
    [146, 114, 149, 197, 135, 252, 208, 248],
    [147, 114, 149, 198, 135, 252, 209, 248],
    [149, 115, 149, 199, 136, 252, 210, 248],
    [150, 115, 149, 200, 137, 252, 210, 248],
    [152, 115, 150, 201, 138, 252, 211, 248],
    [153, 115, 150, 202, 138, 252, 212, 248],
    [155, 116, 151, 204, 139, 253, 213, 249],
    [156, 116, 151, 205, 139, 253, 213, 249],
    [158, 117, 151, 206, 140, 253, 214, 249],
    [159, 117, 151, 207, 141, 253, 215, 249],
    [161, 118, 152, 208, 142, 253, 216, 249],
    [162, 118, 152, 209, 142, 253, 216, 249],
    [163, 119, 153, 210, 143, 253, 217, 249],
    [164, 119, 153, 211, 143, 253, 217, 249],
    [166, 120, 153, 212, 144, 254, 218, 250],
    [167, 120, 153, 212, 145, 254, 219, 250],
    [168, 121, 154, 213, 146, 254, 220, 250],
    [169, 121, 154, 214, 146, 254, 220, 250],
    [171, 122, 155, 215, 147, 254, 221, 250],
    [172, 122, 155, 216, 147, 254, 221, 250],
    [173, 123, 155, 217, 148, 254, 222, 250],
    [174, 123, 155, 217, 149, 254, 222, 250],
    [176, 124, 156, 218, 150, 254, 223, 250],
    [177, 124, 156, 219, 150, 254, 223, 250],
    [178, 125, 157, 220, 151, 254, 224, 251],
    [179, 125, 157, 220, 151, 254, 224, 251],
    [180, 126, 157, 221, 152, 254, 225, 251],
    [181, 126, 157, 221, 152, 254, 225, 251],
    [183, 127, 158, 222, 153, 254, 226, 251],
    [184, 127, 158, 223, 154, 254, 226, 251],
    [185, 128, 159, 224, 155, 255, 227, 251],
    [186, 128, 159, 224, 155, 255, 227, 251],
    [187, 129, 160, 225, 156, 255, 228, 251],
    [188, 130, 160, 225, 156, 255, 228, 251],
    [189, 131, 160, 226, 157, 255, 228, 251],
    [190, 131, 160, 226, 158, 255, 229, 251],
    [191, 132, 161, 227, 159, 255, 229, 251],
    [192, 132, 161, 227, 159, 255, 229, 251],
    [193, 133, 162, 228, 160, 255, 230, 252],
    [194, 133, 162, 229, 160, 255, 230, 252],
    [195, 134, 163, 230, 161, 255, 231, 252],
    [196, 134, 163, 230, 161, 255, 231, 252],
    [197, 135, 163, 231, 162, 255, 231, 252],
    [198, 135, 163, 231, 162, 255, 231, 252],
    [199, 136, 164, 232, 163, 255, 232, 252],
    [200, 136, 164, 232, 164, 255, 232, 252],
    [201, 137, 165, 233, 165, 255, 233, 252],
    [201, 137, 165, 233, 165, 255, 233, 252],
    [202, 138, 166, 233, 166, 255, 233, 252],
    [203, 138, 166, 233, 166, 255, 233, 252],
    [204, 139, 166, 234, 167, 255, 234, 252],
    [205, 139, 166, 234, 167, 255, 234, 252],
    [206, 140, 167, 235, 168, 255, 235, 252],
    [206, 140, 167, 235, 168, 255, 235, 252],
    [207, 141, 168, 236, 169, 255, 235, 252],
    [208, 141, 168, 236, 170, 255, 235, 252],
    [209, 142, 169, 237, 171, 255, 236, 252],
    [209, 143, 169, 237, 171, 255, 236, 252],
    [210, 144, 169, 237, 172, 255, 236, 252],
    [211, 144, 169, 237, 172, 255, 236, 252],
    [212, 145, 170, 238, 173, 255, 237, 252],
    [213, 145, 170, 238, 173, 255, 237, 252],
    [214, 146, 171, 239, 174, 255, 237, 253],
    [214, 146, 171, 239, 174, 255, 237, 253],
    [215, 147, 172, 240, 175, 255, 238, 253],
    [215, 147, 172, 240, 175, 255, 238, 253],
    [216, 148, 173, 240, 176, 255, 238, 253],
    [217, 148, 173, 240, 176, 255, 238, 253],
    [218, 149, 173, 241, 177, 255, 239, 253],
    [218, 149, 173, 241, 178, 255, 239, 253],
    [219, 150, 174, 241, 179, 255, 239, 253],
    [219, 151, 174, 241, 179, 255, 239, 253],
    [220, 152, 175, 242, 180, 255, 240, 253],
    [221, 152, 175, 242, 180, 255, 240, 253],
    [222, 153, 176, 242, 181, 255, 240, 253],
    [222, 153, 176, 242, 181, 255, 240, 253],
    [223, 154, 177, 243, 182, 255, 240, 253],
    [223, 154, 177, 243, 182, 255, 240, 253],
    [224, 155, 178, 244, 183, 255, 241, 253],
    [224, 155, 178, 244, 183, 255, 241, 253],
    [225, 156, 178, 244, 184, 255, 241, 253],
    [225, 157, 178, 244, 184, 255, 241, 253],
    [226, 158, 179, 244, 185, 255, 242, 253],
    [227, 158, 179, 244, 185, 255, 242, 253],
    [228, 159, 180, 245, 186, 255, 242, 253],
    [228, 159, 180, 245, 186, 255, 242, 253],
    [229, 160, 181, 245, 187, 255, 242, 253],
    [229, 160, 181, 245, 187, 255, 242, 253],
    [230, 161, 182, 246, 188, 255, 243, 253],
    [230, 162, 182, 246, 188, 255, 243, 253],
    [231, 163, 183, 246, 189, 255, 243, 253],
    [231, 163, 183, 246, 189, 255, 243, 253],
    [232, 164, 184, 247, 190, 255, 243, 253],
    [232, 164, 184, 247, 190, 255, 243, 253],
    [233, 165, 185, 247, 191, 255, 244, 253],
    [233, 165, 185, 247, 191, 255, 244, 253],
    [234, 166, 185, 247, 192, 255, 244, 253],
    [234, 167, 185, 247, 192, 255, 244, 253],
    [235, 168, 186, 248, 193, 255, 244, 253],
    [235, 168, 186, 248, 193, 255, 244, 253],
    [236, 169, 187, 248, 194, 255, 244, 253],
    [236, 169, 187, 248, 194, 255, 244, 253],
    [236, 170, 188, 248, 195, 255, 245, 253],
    [236, 170, 188, 248, 195, 255, 245, 253],
    [237, 171, 189, 249, 196, 255, 245, 254],
    [237, 172, 189, 249, 196, 255, 245, 254],
    [238, 173, 190, 249, 197, 255, 245, 254],
    [238, 173, 190, 249, 197, 255, 245, 254],
    [239, 174, 191, 249, 198, 255, 245, 254],
    [239, 174, 191, 249, 198, 255, 245, 254],
    [240, 175, 192, 249, 199, 255, 246, 254],
    [240, 176, 192, 249, 199, 255, 246, 254],
    [240, 177, 193, 250, 200, 255, 246, 254],
    [240, 177, 193, 250, 200, 255, 246, 254],
    [241, 178, 194, 250, 201, 255, 246, 254],
    [241, 178, 194, 250, 201, 255, 246, 254],
    [242, 179, 195, 250, 202, 255, 246, 254],
    [242, 180, 195, 250, 202, 255, 246, 254],
    [242, 181, 196, 250, 203, 255, 247, 254],
    [242, 181, 196, 250, 203, 255, 247, 254],
    [243, 182, 197, 251, 204, 255, 247, 254],
    [243, 183, 197, 251, 204, 255, 247, 254],
    [244, 184, 198, 251, 205, 255, 247, 254],
    [244, 184, 198, 251, 205, 255, 247, 254],
    [244, 185, 199, 251, 206, 255, 247, 254],
    [244, 185, 199, 251, 206, 255, 247, 254],
    [245, 186, 200, 251, 207, 255, 247, 254],
    [245, 187, 200, 251, 207, 255, 247, 254],
    [246, 188, 201, 252, 207, 255, 248, 254],
    [246, 188, 201, 252, 207, 255, 248, 254],
    [246, 189, 202, 252, 208, 255, 248, 254],
    [246, 190, 202, 252, 208, 255, 248, 254],
    [247, 191, 203, 252, 209, 255, 248, 254],
    [247, 191, 203, 252, 209, 255, 248, 254],
    [247, 192, 204, 252, 210, 255, 248, 254],
    [247, 193, 204, 252, 210, 255, 248, 254],
    [248, 194, 205, 252, 211, 255, 248, 254],
    [248, 194, 205, 252, 211, 255, 248, 254],
    [248, 195, 206, 252, 212, 255, 249, 254],
    [248, 196, 206, 252, 212, 255, 249, 254],
    [249, 197, 207, 253, 213, 255, 249, 254],
    [249, 197, 207, 253, 213, 255, 249, 254],
    [249, 198, 208, 253, 214, 255, 249, 254],
    [249, 199, 209, 253, 214, 255, 249, 254],
    [250, 200, 210, 253, 215, 255, 249, 254],
    [250, 200, 210, 253, 215, 255, 249, 254],
    [250, 201, 211, 253, 215, 255, 249, 254],
    [250, 202, 211, 253, 215, 255, 249, 254],
    [250, 203, 212, 253, 216, 255, 249, 254],
    [250, 203, 212, 253, 216, 255, 249, 254],
    [251, 204, 213, 253, 217, 255, 250, 254],
    [251, 205, 213, 253, 217, 255, 250, 254],
    [251, 206, 214, 254, 218, 255, 250, 254],
    [251, 206, 215, 254, 218, 255, 250, 254],
    [252, 207, 216, 254, 219, 255, 250, 254],
    [252, 208, 216, 254, 219, 255, 250, 254],
    [252, 209, 217, 254, 220, 255, 250, 254],
    [252, 210, 217, 254, 220, 255, 250, 254],
    [252, 211, 218, 254, 221, 255, 250, 254],
    [252, 212, 218, 254, 221, 255, 250, 254],
    [253, 213, 219, 254, 222, 255, 250, 254],
    [253, 213, 220, 254, 222, 255, 250, 254],
    [253, 214, 221, 254, 223, 255, 250, 254],
    [253, 215, 221, 254, 223, 255, 250, 254],
    [253, 216, 222, 254, 224, 255, 251, 254],
    [253, 217, 223, 254, 224, 255, 251, 254],
    [253, 218, 224, 254, 225, 255, 251, 254],
    [253, 219, 224, 254, 225, 255, 251, 254],
    [254, 220, 225, 254, 226, 255, 251, 254],
    [254, 221, 226, 254, 227, 255, 251, 254],
    [254, 222, 227, 255, 227, 255, 251, 254],
    [254, 223, 227, 255, 228, 255, 251, 254],
    [254, 224, 227, 255, 228, 255, 251, 254],
    [254, 225, 228, 255, 228, 255, 251, 254],
    [254, 226, 229, 255, 228, 255, 251, 254],
    [255, 227, 229, 255, 229, 255, 251, 254],
    [255, 228, 231, 255, 230, 255, 251, 254],
    [255, 229, 232, 255, 230, 255, 252, 254],
    [255, 230, 233, 255, 231, 255, 252, 254],
    [255, 231, 234, 255, 231, 255, 252, 254],
    [255, 232, 235, 255, 232, 255, 252, 254],
    [255, 234, 236, 255, 233, 255, 252, 254],
    [255, 235, 237, 255, 233, 255, 252, 254],
    [255, 236, 238, 255, 234, 255, 252, 254],
    [255, 238, 240, 255, 235, 255, 252, 254],
    [255, 240, 241, 255, 235, 255, 252, 255],
    [255, 241, 243, 255, 236, 255, 252, 255],
    [255, 243, 245, 255, 238, 255, 253, 255],
    [255, 246, 247, 255, 239, 255, 253, 255],
];

/// Probabilities of the token tree nodes below ONE for a pivot probability
#[inline]
pub fn pareto(pivot: u8) -> &'static [u8; PARETO_NODES] {
    &PARETO_TABLE[pivot.max(1) as usize - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_context() {
        let ctx = FrameContext::default();
        assert_eq!(ctx.partition_probs[0], [199, 122, 141]);
        assert_eq!(ctx.kf_y_mode_probs[0][0][0], 137);
        assert_eq!(ctx.kf_y_mode_probs[9][9][8], 72);
        assert_eq!(ctx.mv.joints, [32, 64, 96]);
        assert_eq!(ctx.tx_probs.for_max_tx(3, 1), &[5, 52, 13]);
    }

    #[test]
    fn test_coef_probs_nonzero() {
        let ctx = FrameContext::default();
        for tx in ctx.coef_probs.iter() {
            for plane in tx.iter() {
                for r in plane.iter() {
                    for (band, b) in r.iter().enumerate() {
                        let contexts = if band == 0 { 3 } else { 6 };
                        for probs in b.iter().take(contexts) {
                            assert!(probs.iter().all(|&p| p > 0));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_pareto_rows() {
        assert_eq!(pareto(1), &[3, 86, 128, 6, 86, 23, 88, 29]);
        assert_eq!(pareto(2), &[6, 86, 128, 11, 87, 42, 91, 52]);
        assert_eq!(pareto(255), &[255, 246, 247, 255, 239, 255, 253, 255]);
        // A zero pivot reads the first row
        assert_eq!(pareto(0), pareto(1));

        // Every node grows more confident as ONE becomes likelier
        for pivot in 2..=255u8 {
            let (prev, row) = (pareto(pivot - 1), pareto(pivot));
            assert!(row.iter().zip(prev.iter()).all(|(a, b)| a >= b));
        }
    }

    #[test]
    fn test_reset() {
        let mut ctx = FrameContext::default();
        ctx.skip_probs = [1, 1, 1];
        ctx.reset();
        assert_eq!(ctx.skip_probs, DEFAULT_SKIP_PROBS);
    }
}
