//! VP9 Tile Layout
//!
//! A frame is split into a grid of tiles. Tile columns hold whole
//! superblocks, so they can be decoded independently; tile rows share the
//! above context of the column they belong to.
//!
//! Tile data is stored in raster order. Every tile except the very last is
//! prefixed by its size as a 4-byte big-endian integer.

use crate::error::{Error, Result};

use super::range_coder::RangeDecoder;

/// Log2 of the superblock size in mi units
pub const MI_BLOCK_SIZE_LOG2: usize = 3;
/// Superblock size in mi units
pub const MI_BLOCK_SIZE: usize = 1 << MI_BLOCK_SIZE_LOG2;

/// Tile size prefix length in bytes
const TILE_SIZE_BYTES: usize = 4;

const MIN_TILE_WIDTH_B64: usize = 4;
const MAX_TILE_WIDTH_B64: usize = 64;

/// Align an mi count up to whole superblocks
#[inline]
pub fn mi_cols_aligned_to_sb(mi_cols: usize) -> usize {
    (mi_cols + MI_BLOCK_SIZE - 1) & !(MI_BLOCK_SIZE - 1)
}

/// Allowed range of log2 tile columns for a frame `sb_cols` superblocks wide
///
/// Tile columns hold at most 64 and at least 4 superblocks, except that a
/// single column is always allowed.
pub fn tile_cols_log2_range(sb_cols: usize) -> (u8, u8) {
    let mut min_log2 = 0;
    while (MAX_TILE_WIDTH_B64 << min_log2) < sb_cols {
        min_log2 += 1;
    }
    let mut max_log2 = 1;
    while (sb_cols >> max_log2) >= MIN_TILE_WIDTH_B64 {
        max_log2 += 1;
    }
    (min_log2, (max_log2 - 1).max(min_log2))
}

/// First mi column (or row) of tile `idx` out of `1 << log2`
pub fn tile_offset(idx: usize, mis: usize, log2: u8) -> usize {
    let sb_cols = mi_cols_aligned_to_sb(mis) >> MI_BLOCK_SIZE_LOG2;
    let offset = ((idx * sb_cols) >> log2) << MI_BLOCK_SIZE_LOG2;
    offset.min(mis)
}

/// Extent of one tile in mi units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TileInfo {
    pub mi_row_start: usize,
    pub mi_row_end: usize,
    pub mi_col_start: usize,
    pub mi_col_end: usize,
}

impl TileInfo {
    pub fn new(
        mi_rows: usize,
        mi_cols: usize,
        tile_row: usize,
        tile_col: usize,
        tile_rows_log2: u8,
        tile_cols_log2: u8,
    ) -> Self {
        let mut tile = TileInfo::default();
        tile.set_row(mi_rows, tile_row, tile_rows_log2);
        tile.set_col(mi_cols, tile_col, tile_cols_log2);
        tile
    }

    pub fn set_row(&mut self, mi_rows: usize, row: usize, log2: u8) {
        self.mi_row_start = tile_offset(row, mi_rows, log2);
        self.mi_row_end = tile_offset(row + 1, mi_rows, log2);
    }

    pub fn set_col(&mut self, mi_cols: usize, col: usize, log2: u8) {
        self.mi_col_start = tile_offset(col, mi_cols, log2);
        self.mi_col_end = tile_offset(col + 1, mi_cols, log2);
    }

    /// Whether the cell at `offset` (rows, cols) from (mi_row, mi_col) is
    /// available inside this tile column and the frame
    #[inline]
    pub fn is_inside(&self, mi_row: usize, mi_col: usize, mi_rows: usize, offset: (i32, i32)) -> bool {
        let row = mi_row as i64 + offset.0 as i64;
        let col = mi_col as i64 + offset.1 as i64;
        !(row < 0
            || col < self.mi_col_start as i64
            || row >= mi_rows as i64
            || col >= self.mi_col_end as i64)
    }
}

/// Byte range of one tile inside the frame data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBuffer<'a> {
    pub data: &'a [u8],
    /// Offset of `data` from the start of the frame data
    pub offset: usize,
    /// Position of the tile column within the frame
    pub col: usize,
}

impl<'a> TileBuffer<'a> {
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// A tile being decoded: its extent and its symbol reader
pub struct Tile<'d> {
    pub info: TileInfo,
    pub reader: RangeDecoder<'d>,
    /// Offset of the tile data within the frame data
    pub offset: usize,
}

impl<'d> Tile<'d> {
    pub fn new(buffer: &TileBuffer<'d>, info: TileInfo) -> Result<Self> {
        Ok(Tile {
            info,
            reader: RangeDecoder::new(buffer.data)?,
            offset: buffer.offset,
        })
    }

    /// Offset just past the last byte the reader consumed
    pub fn end_offset(&self) -> usize {
        self.offset + self.reader.find_end()
    }
}

/// Split frame data into per-tile buffers, indexed `[row][col]`
pub fn get_tile_buffers(data: &[u8], tile_cols: usize, tile_rows: usize) -> Result<Vec<Vec<TileBuffer<'_>>>> {
    let mut pos = 0usize;
    let mut buffers = Vec::with_capacity(tile_rows);

    for r in 0..tile_rows {
        let mut row = Vec::with_capacity(tile_cols);
        for c in 0..tile_cols {
            let is_last = r == tile_rows - 1 && c == tile_cols - 1;
            let size = if is_last {
                data.len() - pos
            } else {
                let prefix = data
                    .get(pos..pos + TILE_SIZE_BYTES)
                    .ok_or_else(|| Error::corrupt_frame("Truncated packet or corrupt tile length"))?;
                let size = u32::from_be_bytes([prefix[0], prefix[1], prefix[2], prefix[3]]) as usize;
                pos += TILE_SIZE_BYTES;
                if size == 0 || size > data.len() - pos {
                    return Err(Error::corrupt_frame("Truncated packet or corrupt tile size"));
                }
                size
            };

            row.push(TileBuffer {
                data: &data[pos..pos + size],
                offset: pos,
                col: c,
            });
            pos += size;
        }
        buffers.push(row);
    }

    Ok(buffers)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_prefix(payloads: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for (i, p) in payloads.iter().enumerate() {
            if i + 1 < payloads.len() {
                out.extend_from_slice(&(p.len() as u32).to_be_bytes());
            }
            out.extend_from_slice(p);
        }
        out
    }

    #[test]
    fn test_tile_offsets() {
        // 40 mi columns = 5 superblocks over 4 tile columns
        assert_eq!(tile_offset(0, 40, 2), 0);
        assert_eq!(tile_offset(1, 40, 2), 8);
        assert_eq!(tile_offset(2, 40, 2), 16);
        assert_eq!(tile_offset(3, 40, 2), 24);
        assert_eq!(tile_offset(4, 40, 2), 40);

        // Offsets never pass the frame edge
        assert_eq!(tile_offset(1, 5, 0), 5);
    }

    #[test]
    fn test_tile_column_range() {
        assert_eq!(tile_cols_log2_range(1), (0, 0));
        assert_eq!(tile_cols_log2_range(7), (0, 0));
        assert_eq!(tile_cols_log2_range(8), (0, 1));
        assert_eq!(tile_cols_log2_range(30), (0, 2));
        assert_eq!(tile_cols_log2_range(65), (1, 4));
    }

    #[test]
    fn test_is_inside() {
        let tile = TileInfo::new(16, 32, 0, 1, 0, 1);
        assert_eq!(tile.mi_col_start, 16);
        assert_eq!(tile.mi_col_end, 32);
        assert!(tile.is_inside(4, 16, 16, (-1, 0)));
        assert!(!tile.is_inside(4, 16, 16, (0, -1)));
        assert!(!tile.is_inside(0, 20, 16, (-1, 0)));
        assert!(!tile.is_inside(15, 20, 16, (1, -1)));
    }

    #[test]
    fn test_split_two_columns() {
        let data = with_prefix(&[&[1, 2, 3], &[4, 5]]);
        let tiles = get_tile_buffers(&data, 2, 1).unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!(tiles[0][0].data, &[1, 2, 3]);
        assert_eq!(tiles[0][0].offset, 4);
        assert_eq!(tiles[0][1].data, &[4, 5]);
        assert_eq!(tiles[0][1].offset, 7);
        assert_eq!(tiles[0][1].col, 1);
    }

    #[test]
    fn test_rows_and_columns_in_raster_order() {
        let data = with_prefix(&[&[1], &[2], &[3], &[4]]);
        let tiles = get_tile_buffers(&data, 2, 2).unwrap();
        assert_eq!(tiles[1][0].data, &[3]);
        assert_eq!(tiles[1][1].data, &[4]);
    }

    #[test]
    fn test_oversized_length_is_corrupt() {
        let mut data = vec![0, 0, 0, 9];
        data.extend_from_slice(&[1, 2, 3]);
        let err = get_tile_buffers(&data, 2, 1).unwrap_err();
        assert!(matches!(err, Error::CorruptFrame(_)));
    }

    #[test]
    fn test_missing_prefix_is_corrupt() {
        let err = get_tile_buffers(&[0, 1], 2, 1).unwrap_err();
        assert!(matches!(err, Error::CorruptFrame(_)));
    }
}
