//! Common test utilities for the VP9 tile decoder integration tests
//!
//! Synthetic tile data is authored with `RangeEncoder`, writing the symbols
//! the decoder reads for frames made of equally sized, DC-predicted, skipped
//! intra blocks. Frame sizes must be whole superblocks.

#![allow(dead_code)]

use zvd_vp9::codec::vp9::frame::{FrameHeader, FrameType};
use zvd_vp9::codec::vp9::probs::FrameContext;
use zvd_vp9::codec::vp9::range_encoder::RangeEncoder;
use zvd_vp9::codec::vp9::tables::{
    BlockSize, Partition, PredictionMode, INTRA_MODE_TREE, PARTITION_CONTEXT_LOOKUP,
    PARTITION_TREE,
};
use zvd_vp9::codec::vp9::tile::{TileInfo, MI_BLOCK_SIZE};

// ============================================================================
// Frame Headers
// ============================================================================

/// Key frame header with 4:2:0 8-bit samples
pub fn key_frame_header(width: u32, height: u32, tile_cols_log2: u8) -> FrameHeader {
    FrameHeader {
        frame_type: FrameType::KeyFrame,
        width,
        height,
        tile_cols_log2,
        ..Default::default()
    }
}

/// Non-key frame header; blocks written by the helpers stay intra
pub fn inter_frame_header(width: u32, height: u32, tile_cols_log2: u8) -> FrameHeader {
    FrameHeader {
        frame_type: FrameType::InterFrame,
        ..key_frame_header(width, height, tile_cols_log2)
    }
}

// ============================================================================
// Tile Data
// ============================================================================

/// Square block size covering `1 << n8_log2` mi units
fn square_block(n8_log2: usize) -> BlockSize {
    match n8_log2 {
        0 => BlockSize::Block8x8,
        1 => BlockSize::Block16x16,
        2 => BlockSize::Block32x32,
        _ => BlockSize::Block64x64,
    }
}

/// Writes one tile of flat blocks, tracking the same contexts the decoder
/// derives
struct FlatTileWriter<'a> {
    header: &'a FrameHeader,
    fc: &'a FrameContext,
    tile: TileInfo,
    block_n8_log2: usize,
    above_partition: Vec<u8>,
    left_partition: [u8; MI_BLOCK_SIZE],
    enc: RangeEncoder,
}

impl<'a> FlatTileWriter<'a> {
    fn write_partition(&mut self, mi_row: usize, mi_col: usize, n8_log2: usize) {
        let num_8x8 = 1 << n8_log2;
        let hbs = num_8x8 >> 1;
        let bsize = square_block(n8_log2);

        let above = (self.above_partition[mi_col] >> n8_log2) & 1;
        let left = (self.left_partition[mi_row % MI_BLOCK_SIZE] >> n8_log2) & 1;
        let ctx = (left * 2 + above) as usize + n8_log2 * 4;
        let probs = if self.header.is_intra_only() {
            &self.fc.kf_partition_probs[ctx]
        } else {
            &self.fc.partition_probs[ctx]
        };

        let partition = if n8_log2 > self.block_n8_log2 {
            Partition::Split
        } else {
            Partition::None
        };
        self.enc.write_tree(&PARTITION_TREE, probs, partition as u8);

        if partition == Partition::Split {
            self.write_partition(mi_row, mi_col, n8_log2 - 1);
            self.write_partition(mi_row, mi_col + hbs, n8_log2 - 1);
            self.write_partition(mi_row + hbs, mi_col, n8_log2 - 1);
            self.write_partition(mi_row + hbs, mi_col + hbs, n8_log2 - 1);
        } else {
            self.write_block(mi_row, mi_col, bsize);
            let (above, left) = PARTITION_CONTEXT_LOOKUP[bsize as usize];
            self.above_partition[mi_col..mi_col + num_8x8].fill(above);
            let row = mi_row % MI_BLOCK_SIZE;
            self.left_partition[row..row + num_8x8].fill(left);
        }
    }

    fn write_block(&mut self, mi_row: usize, mi_col: usize, bsize: BlockSize) {
        let dc = PredictionMode::DcPred as u8;
        let has_above = mi_row > 0;
        let has_left = mi_col > self.tile.mi_col_start;

        let skip_ctx = has_above as usize + has_left as usize;
        self.enc.write_bool(true, self.fc.skip_probs[skip_ctx]);

        if self.header.is_intra_only() {
            self.enc
                .write_tree(&INTRA_MODE_TREE, &self.fc.kf_y_mode_probs[0][0], dc);
            self.enc
                .write_tree(&INTRA_MODE_TREE, &self.fc.kf_uv_mode_probs[0], dc);
        } else {
            let intra_inter_ctx = match (has_above, has_left) {
                (true, true) => 3,
                (false, false) => 0,
                _ => 2,
            };
            self.enc
                .write_bool(false, self.fc.intra_inter_probs[intra_inter_ctx]);
            self.enc.write_tree(
                &INTRA_MODE_TREE,
                &self.fc.y_mode_probs[bsize.size_group()],
                dc,
            );
            self.enc
                .write_tree(&INTRA_MODE_TREE, &self.fc.uv_mode_probs[0], dc);
        }
    }
}

/// Encode one tile made of skipped DC blocks of `block` size
pub fn encode_flat_tile(
    header: &FrameHeader,
    fc: &FrameContext,
    tile: TileInfo,
    block: BlockSize,
) -> Vec<u8> {
    let block_n8_log2 = block.num_8x8_wide().trailing_zeros() as usize;
    let mut writer = FlatTileWriter {
        header,
        fc,
        tile,
        block_n8_log2,
        above_partition: vec![0; header.mi_cols() + MI_BLOCK_SIZE],
        left_partition: [0; MI_BLOCK_SIZE],
        enc: RangeEncoder::new(),
    };

    for mi_row in (tile.mi_row_start..tile.mi_row_end).step_by(MI_BLOCK_SIZE) {
        writer.left_partition = [0; MI_BLOCK_SIZE];
        for mi_col in (tile.mi_col_start..tile.mi_col_end).step_by(MI_BLOCK_SIZE) {
            writer.write_partition(mi_row, mi_col, 3);
        }
    }
    writer.enc.finish()
}

/// Encode every tile of a frame, size-prefixing all but the last
pub fn encode_flat_frame(header: &FrameHeader, fc: &FrameContext, block: BlockSize) -> Vec<u8> {
    let (tile_rows, tile_cols) = (header.tile_rows(), header.tile_cols());
    let mut out = Vec::new();
    for row in 0..tile_rows {
        for col in 0..tile_cols {
            let tile = TileInfo::new(
                header.mi_rows(),
                header.mi_cols(),
                row,
                col,
                header.tile_rows_log2,
                header.tile_cols_log2,
            );
            let data = encode_flat_tile(header, fc, tile, block);
            if row + 1 < tile_rows || col + 1 < tile_cols {
                out.extend_from_slice(&(data.len() as u32).to_be_bytes());
            }
            out.extend_from_slice(&data);
        }
    }
    out
}

/// Number of `block` sized blocks in a frame
pub fn block_count(header: &FrameHeader, block: BlockSize) -> u32 {
    let n8 = block.num_8x8_wide();
    ((header.mi_rows() / n8) * (header.mi_cols() / n8)) as u32
}
