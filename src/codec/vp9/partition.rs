//! VP9 Partition Decoding
//!
//! Superblocks (64x64) are split recursively. Each level reads a partition
//! type whose context comes from the above and left partition flags: one
//! byte per mi column/row with a bit per block size level.

use crate::error::Result;

use super::reconstruct::{FrameDecodeContext, TileWorker};
use super::tables::{
    get_subsize, BlockSize, Partition, PARTITION_CONTEXT_LOOKUP, PARTITION_TREE,
};
use super::tile::{Tile, MI_BLOCK_SIZE};

/// Log2 of a superblock's size in 4x4 units
const SB_N4X4_L2: usize = 4;

impl TileWorker {
    /// Decode one superblock row of a tile
    pub fn decode_sb_row(&mut self, fd: &FrameDecodeContext, tile: &mut Tile, mi_row: usize) -> Result<()> {
        self.reset_left();
        let (start, end) = (tile.info.mi_col_start, tile.info.mi_col_end);
        for mi_col in (start..end).step_by(MI_BLOCK_SIZE) {
            self.decode_partition(fd, tile, mi_row, mi_col, BlockSize::Block64x64, SB_N4X4_L2)?;
        }
        Ok(())
    }

    fn partition_context(&self, mi_row: usize, mi_col: usize, bsl: usize) -> usize {
        let above = (self.above_partition[mi_col] >> bsl) & 1;
        let left = (self.left_partition[mi_row & (MI_BLOCK_SIZE - 1)] >> bsl) & 1;
        (left * 2 + above) as usize + bsl * 4
    }

    fn update_partition_context(&mut self, mi_row: usize, mi_col: usize, subsize: BlockSize, bw: usize) {
        let (above, left) = PARTITION_CONTEXT_LOOKUP[subsize as usize];
        self.above_partition[mi_col..mi_col + bw].fill(above);
        let row = mi_row & (MI_BLOCK_SIZE - 1);
        self.left_partition[row..row + bw].fill(left);
    }

    fn read_partition(
        &mut self,
        fd: &FrameDecodeContext,
        tile: &mut Tile,
        mi_row: usize,
        mi_col: usize,
        has_rows: bool,
        has_cols: bool,
        bsl: usize,
    ) -> Partition {
        let ctx = self.partition_context(mi_row, mi_col, bsl);
        let probs = if fd.header.is_intra_only() {
            &fd.fc.kf_partition_probs[ctx]
        } else {
            &fd.fc.partition_probs[ctx]
        };
        let r = &mut tile.reader;

        let partition = match (has_rows, has_cols) {
            (true, true) => Partition::from_u8(r.read_tree(&PARTITION_TREE, probs)),
            (false, true) => {
                if r.read_bool(probs[1]) {
                    Partition::Split
                } else {
                    Partition::Horizontal
                }
            }
            (true, false) => {
                if r.read_bool(probs[2]) {
                    Partition::Split
                } else {
                    Partition::Vertical
                }
            }
            (false, false) => Partition::Split,
        };

        if let Some(counts) = self.counts.as_mut() {
            counts.partition[ctx][partition as usize] += 1;
        }
        partition
    }

    /// Decode the partition tree of a block of `2^n4x4_l2` 4x4 units
    fn decode_partition(
        &mut self,
        fd: &FrameDecodeContext,
        tile: &mut Tile,
        mi_row: usize,
        mi_col: usize,
        bsize: BlockSize,
        n4x4_l2: usize,
    ) -> Result<()> {
        if mi_row >= fd.mi_rows || mi_col >= fd.mi_cols {
            return Ok(());
        }

        let n8x8_l2 = n4x4_l2 - 1;
        let num_8x8_wh = 1 << n8x8_l2;
        let hbs = num_8x8_wh >> 1;
        let has_rows = mi_row + hbs < fd.mi_rows;
        let has_cols = mi_col + hbs < fd.mi_cols;

        let partition = self.read_partition(fd, tile, mi_row, mi_col, has_rows, has_cols, n8x8_l2);
        let subsize = get_subsize(bsize, partition);

        if hbs == 0 {
            // 8x8 level: any partition yields one block with sub-8x8 modes
            self.decode_block(fd, tile, mi_row, mi_col, subsize, 1, 1)?;
        } else {
            match partition {
                Partition::None => {
                    self.decode_block(fd, tile, mi_row, mi_col, subsize, n4x4_l2, n4x4_l2)?;
                }
                Partition::Horizontal => {
                    self.decode_block(fd, tile, mi_row, mi_col, subsize, n4x4_l2, n8x8_l2)?;
                    if has_rows {
                        self.decode_block(fd, tile, mi_row + hbs, mi_col, subsize, n4x4_l2, n8x8_l2)?;
                    }
                }
                Partition::Vertical => {
                    self.decode_block(fd, tile, mi_row, mi_col, subsize, n8x8_l2, n4x4_l2)?;
                    if has_cols {
                        self.decode_block(fd, tile, mi_row, mi_col + hbs, subsize, n8x8_l2, n4x4_l2)?;
                    }
                }
                Partition::Split => {
                    self.decode_partition(fd, tile, mi_row, mi_col, subsize, n8x8_l2)?;
                    self.decode_partition(fd, tile, mi_row, mi_col + hbs, subsize, n8x8_l2)?;
                    self.decode_partition(fd, tile, mi_row + hbs, mi_col, subsize, n8x8_l2)?;
                    self.decode_partition(fd, tile, mi_row + hbs, mi_col + hbs, subsize, n8x8_l2)?;
                }
            }
        }

        if bsize == BlockSize::Block8x8 || partition != Partition::Split {
            self.update_partition_context(mi_row, mi_col, subsize, num_8x8_wh);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::vp9::block::{ModeInfoGrid, SegmentationMap};
    use crate::codec::vp9::filter::FilterLevelMap;
    use crate::codec::vp9::frame::{FrameBuffer, FrameHeader};
    use crate::codec::vp9::probs::FrameContext;
    use crate::codec::vp9::quant::SegmentDequant;
    use crate::codec::vp9::range_encoder::RangeEncoder;
    use crate::codec::vp9::tile::{TileBuffer, TileInfo};

    fn worker(header: &FrameHeader) -> TileWorker {
        let (rows, cols) = (header.mi_rows(), header.mi_cols());
        TileWorker::new(
            FrameBuffer::for_header(header),
            ModeInfoGrid::new(rows, cols),
            SegmentationMap::new(rows, cols),
            FilterLevelMap::new(&header.loop_filter, &header.segmentation, rows, cols),
            true,
        )
    }

    #[test]
    fn test_partition_context_after_none() {
        let header = FrameHeader {
            width: 64,
            height: 64,
            ..Default::default()
        };
        let mut w = worker(&header);
        assert_eq!(w.partition_context(0, 0, 3), 12);

        w.update_partition_context(0, 0, BlockSize::Block32x32, 4);
        // A 32x32 neighbour is smaller than 64x64 but not than 32x32
        assert_eq!(w.partition_context(0, 0, 3), 12 + 3);
        assert_eq!(w.partition_context(0, 0, 2), 8);
        assert_eq!(w.partition_context(0, 4, 3), 12 + 2);
    }

    #[test]
    fn test_whole_superblock_partition() {
        let header = FrameHeader {
            width: 64,
            height: 64,
            ..Default::default()
        };
        let fc = FrameContext::default();
        let dequant = SegmentDequant::from_params(&header.quantization, &header.segmentation);
        let fd = FrameDecodeContext::new(&header, &fc, dequant, [None; 3], None, None);

        let mut enc = RangeEncoder::new();
        enc.write_tree(&PARTITION_TREE, &fc.kf_partition_probs[12], Partition::None as u8);
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
        let mut tile = Tile::new(&buffer, TileInfo::new(8, 8, 0, 0, 0, 0)).unwrap();
        w.decode_sb_row(&fd, &mut tile, 0).unwrap();

        assert!((0..8).all(|r| (0..8).all(|c| w.grid.get(r, c).sb_type == BlockSize::Block64x64)));
        let counts = w.counts.as_ref().unwrap();
        assert_eq!(counts.partition[12][Partition::None as usize], 1);
        assert_eq!(w.above_partition[..8], [0; 8]);
    }

    #[test]
    fn test_update_touches_block_width_only() {
        let header = FrameHeader {
            width: 64,
            height: 64,
            ..Default::default()
        };
        let mut w = worker(&header);
        w.above_partition.fill(0xAA);
        w.left_partition = [0xAA; MI_BLOCK_SIZE];

        w.update_partition_context(10, 4, BlockSize::Block16x16, 2);
        let (above, left) = PARTITION_CONTEXT_LOOKUP[BlockSize::Block16x16 as usize];
        assert_eq!(w.above_partition[..8], [0xAA, 0xAA, 0xAA, 0xAA, above, above, 0xAA, 0xAA]);
        // Row 10 is row 2 of its superblock
        assert_eq!(w.left_partition, [0xAA, 0xAA, left, left, 0xAA, 0xAA, 0xAA, 0xAA]);
    }

    #[test]
    fn test_mixed_partition_tree() {
        let header = FrameHeader {
            width: 64,
            height: 64,
            ..Default::default()
        };
        let fc = FrameContext::default();
        let dequant = SegmentDequant::from_params(&header.quantization, &header.segmentation);
        let fd = FrameDecodeContext::new(&header, &fc, dequant, [None; 3], None, None);

        let mut enc = RangeEncoder::new();
        let partition = |enc: &mut RangeEncoder, ctx: usize, p: Partition| {
            enc.write_tree(&PARTITION_TREE, &fc.kf_partition_probs[ctx], p as u8);
        };
        // Skipped DC block; the skip context counts skipped neighbours
        let block = |enc: &mut RangeEncoder, skip_ctx: usize| {
            enc.write_bool(true, fc.skip_probs[skip_ctx]);
            enc.write_bool(false, fc.kf_y_mode_probs[0][0][0]);
            enc.write_bool(false, fc.kf_uv_mode_probs[0][0]);
        };

        partition(&mut enc, 12, Partition::Split);
        // Top left 32x32: two 32x16 halves
        partition(&mut enc, 8, Partition::Horizontal);
        block(&mut enc, 0);
        block(&mut enc, 1);
        // Top right 32x32: the left flag of the 32x16 halves is set
        partition(&mut enc, 10, Partition::Vertical);
        block(&mut enc, 1);
        block(&mut enc, 1);
        // Bottom left 32x32
        partition(&mut enc, 8, Partition::None);
        block(&mut enc, 1);
        // Bottom right 32x32: the above flag of the 16x32 halves is set
        partition(&mut enc, 9, Partition::Split);
        for _ in 0..4 {
            partition(&mut enc, 4, Partition::None);
            block(&mut enc, 2);
        }
        let data = enc.finish();
        let buffer = TileBuffer {
            data: &data,
            offset: 0,
            col: 0,
        };

        let mut w = worker(&header);
        let mut tile = Tile::new(&buffer, TileInfo::new(8, 8, 0, 0, 0, 0)).unwrap();
        w.decode_sb_row(&fd, &mut tile, 0).unwrap();
        assert!(!w.corrupted);
        assert!(!tile.reader.has_error());

        let sb_type = |r: usize, c: usize| w.grid.get(r, c).sb_type;
        assert_eq!(sb_type(0, 0), BlockSize::Block32x16);
        assert_eq!(sb_type(3, 3), BlockSize::Block32x16);
        assert_eq!(sb_type(0, 4), BlockSize::Block16x32);
        assert_eq!(sb_type(3, 7), BlockSize::Block16x32);
        assert_eq!(sb_type(7, 0), BlockSize::Block32x32);
        assert_eq!(sb_type(4, 4), BlockSize::Block16x16);
        assert_eq!(sb_type(7, 7), BlockSize::Block16x16);
        assert!((0..8).all(|r| (0..8).all(|c| w.grid.get(r, c).skip)));

        let counts = w.counts.as_ref().unwrap();
        assert_eq!(counts.partition[12][Partition::Split as usize], 1);
        assert_eq!(counts.partition[8][Partition::Horizontal as usize], 1);
        assert_eq!(counts.partition[10][Partition::Vertical as usize], 1);
        assert_eq!(counts.partition[8][Partition::None as usize], 1);
        assert_eq!(counts.partition[9][Partition::Split as usize], 1);
        assert_eq!(counts.partition[4][Partition::None as usize], 4);
        assert_eq!(counts.skip_total(true), 9);

        // Split levels leave the flags of their children in place
        assert_eq!(w.above_partition[..8], [8, 8, 8, 8, 12, 12, 12, 12]);
        assert_eq!(w.left_partition, [8, 8, 8, 8, 12, 12, 12, 12]);
    }
}
