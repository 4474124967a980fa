//! VP9 frame tile decoding
//!
//! `Vp9TileDecoder` runs the per-frame decode over every tile of a frame.
//! Single-threaded decoding walks tile rows, then superblock rows, then
//! tile columns with one worker. When threads are available and the frame
//! has several tile columns in a single tile row, columns are grouped over
//! a rayon pool. Each column is decoded into its own strip of the frame
//! buffers and merged back after the join, so workers never share mutable
//! state.

use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

use super::block::{ModeInfoGrid, MotionVectorMap, SegmentationMap};
use super::counts::FrameCounts;
use super::filter::FilterLevelMap;
use super::frame::{FrameBuffer, FrameHeader};
use super::inter::{InterRef, ScaleFactors};
use super::probs::FrameContext;
use super::quant::SegmentDequant;
use super::reconstruct::{FrameDecodeContext, TileWorker};
use super::tables::REFS_PER_FRAME;
use super::tile::{get_tile_buffers, Tile, TileBuffer, TileInfo, MI_BLOCK_SIZE};

/// Tile decoder configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Upper bound on threads used for tile columns; 1 decodes on the
    /// calling thread
    pub max_threads: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig { max_threads: 1 }
    }
}

impl DecoderConfig {
    /// Use every available core
    pub fn multi_threaded() -> Self {
        DecoderConfig {
            max_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}

/// Everything a frame decode reads besides the tile data
#[derive(Clone, Copy)]
pub struct FrameInput<'a> {
    pub header: &'a FrameHeader,
    pub fc: &'a FrameContext,
    /// LAST, GOLDEN and ALTREF pictures
    pub refs: [Option<&'a FrameBuffer>; REFS_PER_FRAME],
    /// Segment ids of the previous frame, for temporal segment prediction
    pub prev_segment_ids: Option<&'a SegmentationMap>,
    /// Motion vectors of the previous frame
    pub prev_frame_mvs: Option<&'a MotionVectorMap>,
    /// Dequantizers for high bit depth frames
    pub dequant: Option<&'a SegmentDequant>,
}

impl<'a> FrameInput<'a> {
    pub fn new(header: &'a FrameHeader, fc: &'a FrameContext) -> Self {
        FrameInput {
            header,
            fc,
            refs: [None; REFS_PER_FRAME],
            prev_segment_ids: None,
            prev_frame_mvs: None,
            dequant: None,
        }
    }

    pub fn with_refs(mut self, refs: [Option<&'a FrameBuffer>; REFS_PER_FRAME]) -> Self {
        self.refs = refs;
        self
    }

    pub fn with_prev_segment_ids(mut self, map: &'a SegmentationMap) -> Self {
        self.prev_segment_ids = Some(map);
        self
    }

    pub fn with_prev_frame_mvs(mut self, mvs: &'a MotionVectorMap) -> Self {
        self.prev_frame_mvs = Some(mvs);
        self
    }

    pub fn with_dequant(mut self, dequant: &'a SegmentDequant) -> Self {
        self.dequant = Some(dequant);
        self
    }
}

/// Per-frame results of a tile decode
#[derive(Debug, Clone)]
pub struct TileDecodeOutput {
    /// Mode info of every 8x8 unit
    pub mode_info: ModeInfoGrid,
    /// Segment id of every 8x8 unit; zero when segmentation is off
    pub segment_ids: SegmentationMap,
    /// Loop filter level and transform size of every 8x8 unit
    pub filter_levels: FilterLevelMap,
    /// Symbol counts for backward adaptation, when the header asked for them
    pub counts: Option<FrameCounts>,
    /// Offset in the frame data just past the last tile's consumed bytes
    pub end_offset: usize,
}

impl TileDecodeOutput {
    /// Reference frames and vectors to use as the next frame's temporal
    /// candidates
    pub fn motion_vectors(&self) -> MotionVectorMap {
        self.mode_info.motion_vectors()
    }
}

/// VP9 frame decoder for the tile data of a frame
pub struct Vp9TileDecoder {
    config: DecoderConfig,
    pool: Option<rayon::ThreadPool>,
    frames_decoded: u64,
}

impl Vp9TileDecoder {
    pub fn new(config: DecoderConfig) -> Result<Self> {
        if config.max_threads == 0 {
            return Err(Error::Config("max_threads must be at least 1".to_string()));
        }

        let pool = if config.max_threads > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.max_threads)
                .thread_name(|i| format!("vp9-tile-{}", i))
                .build()
                .map_err(|e| Error::Init(format!("Failed to build tile thread pool: {}", e)))?;
            Some(pool)
        } else {
            None
        };

        Ok(Vp9TileDecoder {
            config,
            pool,
            frames_decoded: 0,
        })
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Number of frames decoded successfully
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Decode the tile data of one frame into `frame`
    ///
    /// `frame` must match the header's dimensions and format. Any error
    /// leaves it partially written.
    pub fn decode_tiles(
        &mut self,
        input: &FrameInput,
        data: &[u8],
        frame: &mut FrameBuffer,
    ) -> Result<TileDecodeOutput> {
        let header = input.header;
        header.validate()?;
        check_format(header, frame, "Output frame")?;
        if frame.width != header.width || frame.height != header.height {
            return Err(Error::invalid_input(format!(
                "Output frame is {}x{}, header is {}x{}",
                frame.width, frame.height, header.width, header.height
            )));
        }

        let tile_cols = header.tile_cols();
        let tile_rows = header.tile_rows();
        let buffers = get_tile_buffers(data, tile_cols, tile_rows)?;

        let dequant = match input.dequant {
            Some(dequant) => dequant.clone(),
            None if header.bit_depth == 8 => {
                SegmentDequant::from_params(&header.quantization, &header.segmentation)
            }
            None => {
                return Err(Error::invalid_input(format!(
                    "{}-bit frames need dequantization tables",
                    header.bit_depth
                )))
            }
        };
        let refs = scaled_refs(header, &input.refs)?;
        let fd = FrameDecodeContext::new(
            header,
            input.fc,
            dequant,
            refs,
            input.prev_segment_ids,
            input.prev_frame_mvs,
        );

        let (mi_rows, mi_cols) = (fd.mi_rows, fd.mi_cols);
        let mut worker = TileWorker::new(
            std::mem::take(frame),
            ModeInfoGrid::new(mi_rows, mi_cols),
            SegmentationMap::new(mi_rows, mi_cols),
            FilterLevelMap::new(&header.loop_filter, &header.segmentation, mi_rows, mi_cols),
            header.counts_enabled,
        );

        let pool = self
            .pool
            .as_ref()
            .filter(|_| tile_cols > 1 && tile_rows == 1);
        debug!(
            width = header.width,
            height = header.height,
            tile_cols,
            tile_rows,
            multi_threaded = pool.is_some(),
            "Decoding frame tiles"
        );

        let result = match pool {
            Some(pool) => decode_tiles_mt(pool, self.config.max_threads, &fd, &buffers[0], &mut worker),
            None => decode_tiles_st(&fd, &buffers, &mut worker),
        };
        *frame = std::mem::take(&mut worker.frame);
        let end_offset = result?;

        self.frames_decoded += 1;
        Ok(TileDecodeOutput {
            mode_info: worker.grid,
            segment_ids: worker.seg_map,
            filter_levels: worker.filter,
            counts: worker.counts,
            end_offset,
        })
    }
}

fn check_format(header: &FrameHeader, frame: &FrameBuffer, what: &str) -> Result<()> {
    if frame.bit_depth != header.bit_depth
        || frame.subsampling_x != header.subsampling_x
        || frame.subsampling_y != header.subsampling_y
    {
        return Err(Error::invalid_input(format!(
            "{} has an incompatible color format",
            what
        )));
    }
    Ok(())
}

/// Attach scale factors to the supplied reference frames
fn scaled_refs<'a>(
    header: &FrameHeader,
    refs: &[Option<&'a FrameBuffer>; REFS_PER_FRAME],
) -> Result<[Option<InterRef<'a>>; REFS_PER_FRAME]> {
    let mut scaled = [None; REFS_PER_FRAME];
    for (slot, reference) in scaled.iter_mut().zip(refs.iter()) {
        if let Some(frame) = reference {
            check_format(header, frame, "Reference frame")?;
            *slot = Some(InterRef {
                frame,
                scale: ScaleFactors::new(frame.width, frame.height, header.width, header.height),
            });
        }
    }
    Ok(scaled)
}

fn tile_info(fd: &FrameDecodeContext, tile_row: usize, tile_col: usize) -> TileInfo {
    TileInfo::new(
        fd.mi_rows,
        fd.mi_cols,
        tile_row,
        tile_col,
        fd.header.tile_rows_log2,
        fd.header.tile_cols_log2,
    )
}

fn tile_corrupted(tile: &Tile) -> Error {
    warn!(
        mi_col_start = tile.info.mi_col_start,
        mi_row_start = tile.info.mi_row_start,
        "Corrupt tile"
    );
    Error::corrupt_frame("Failed to decode tile data")
}

/// Decode every tile with one worker; returns the end offset of the last tile
fn decode_tiles_st(
    fd: &FrameDecodeContext,
    buffers: &[Vec<TileBuffer>],
    worker: &mut TileWorker,
) -> Result<usize> {
    // Every reader is set up before any block is decoded
    let mut tiles = Vec::with_capacity(buffers.len());
    for (tile_row, row) in buffers.iter().enumerate() {
        let row = row
            .iter()
            .map(|buffer| Tile::new(buffer, tile_info(fd, tile_row, buffer.col)))
            .collect::<Result<Vec<_>>>()?;
        tiles.push(row);
    }

    worker.reset_above();
    for row in tiles.iter_mut() {
        let Some(first) = row.first() else { continue };
        let (row_start, row_end) = (first.info.mi_row_start, first.info.mi_row_end);
        for mi_row in (row_start..row_end).step_by(MI_BLOCK_SIZE) {
            for tile in row.iter_mut() {
                worker.decode_sb_row(fd, tile, mi_row)?;
                if worker.corrupted {
                    return Err(tile_corrupted(tile));
                }
            }
        }
    }

    tiles
        .last()
        .and_then(|row| row.last())
        .map(Tile::end_offset)
        .ok_or_else(|| Error::corrupt_frame("Frame has no tile data"))
}

/// Order tile columns for the worker pool and split them into one
/// contiguous group per worker
///
/// Columns are sorted by size, largest first. When every worker gets one
/// column the largest goes last, otherwise pairs are swapped from both
/// ends so large and small tiles are spread over the workers.
fn assign_tile_columns<'d>(buffers: &[TileBuffer<'d>], num_workers: usize) -> Vec<Vec<TileBuffer<'d>>> {
    let tile_cols = buffers.len();
    let mut order = buffers.to_vec();
    order.sort_by(|a, b| b.size().cmp(&a.size()));

    if num_workers == tile_cols {
        order.rotate_left(1);
    } else if tile_cols >= 2 {
        let (mut start, mut end) = (0, tile_cols - 2);
        while start < end {
            order.swap(start, end);
            start += 2;
            end = end.saturating_sub(2);
        }
    }

    let base = tile_cols / num_workers;
    let remain = tile_cols % num_workers;
    let mut rest = order.as_slice();
    (0..num_workers)
        .map(|n| {
            let count = base + (remain + n) / num_workers;
            let (group, tail) = rest.split_at(count);
            rest = tail;
            group.to_vec()
        })
        .collect()
}

/// Strips decoded by one pool worker
struct ColumnGroup {
    strips: Vec<TileWorker>,
    end_offset: Option<usize>,
}

fn decode_column_group(
    fd: &FrameDecodeContext,
    frame: &TileWorker,
    group: &[TileBuffer],
) -> Result<ColumnGroup> {
    let last_col = fd.header.tile_cols() - 1;
    let mut strips = Vec::with_capacity(group.len());
    let mut end_offset = None;

    for buffer in group {
        let mut tile = Tile::new(buffer, tile_info(fd, 0, buffer.col))?;
        let mut strip = frame.column_strip(tile.info.mi_col_start, tile.info.mi_col_end);
        trace!(col = buffer.col, size = buffer.size(), "Decoding tile column");

        for mi_row in (tile.info.mi_row_start..tile.info.mi_row_end).step_by(MI_BLOCK_SIZE) {
            strip.decode_sb_row(fd, &mut tile, mi_row)?;
        }
        if strip.corrupted {
            return Err(tile_corrupted(&tile));
        }
        if buffer.col == last_col {
            end_offset = Some(tile.end_offset());
        }
        strips.push(strip);
    }

    Ok(ColumnGroup { strips, end_offset })
}

/// Decode tile columns in parallel; returns the end offset of the last column
fn decode_tiles_mt(
    pool: &rayon::ThreadPool,
    max_threads: usize,
    fd: &FrameDecodeContext,
    buffers: &[TileBuffer],
    worker: &mut TileWorker,
) -> Result<usize> {
    let num_workers = max_threads.min(buffers.len());
    let groups = assign_tile_columns(buffers, num_workers);
    debug!(
        workers = num_workers,
        columns = buffers.len(),
        "Distributing tile columns"
    );

    let frame: &TileWorker = worker;
    let results: Vec<Result<ColumnGroup>> = pool.install(|| {
        groups
            .par_iter()
            .map(|group| decode_column_group(fd, frame, group))
            .collect()
    });

    let mut end_offset = None;
    for result in results {
        let group = result?;
        for strip in group.strips.iter() {
            worker.merge_column_strip(strip);
        }
        end_offset = end_offset.or(group.end_offset);
    }

    end_offset.ok_or_else(|| Error::corrupt_frame("Failed to decode tile data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffers(sizes: &[usize]) -> (Vec<u8>, Vec<usize>) {
        let total = sizes.iter().sum();
        (vec![0u8; total], sizes.to_vec())
    }

    fn tile_buffers<'d>(data: &'d [u8], sizes: &[usize]) -> Vec<TileBuffer<'d>> {
        let mut offset = 0;
        sizes
            .iter()
            .enumerate()
            .map(|(col, &size)| {
                let buffer = TileBuffer {
                    data: &data[offset..offset + size],
                    offset,
                    col,
                };
                offset += size;
                buffer
            })
            .collect()
    }

    fn columns(groups: &[Vec<TileBuffer>]) -> Vec<Vec<usize>> {
        groups
            .iter()
            .map(|g| g.iter().map(|b| b.col).collect())
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert_eq!(config.max_threads, 1);
        assert!(DecoderConfig::multi_threaded().max_threads >= 1);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = Vp9TileDecoder::new(DecoderConfig { max_threads: 0 }).err();
        assert!(matches!(err, Some(Error::Config(_))));
    }

    #[test]
    fn test_largest_column_last_with_one_worker_each() {
        let (data, sizes) = buffers(&[10, 40, 20, 30]);
        let groups = assign_tile_columns(&tile_buffers(&data, &sizes), 4);
        // Sorted 1, 3, 2, 0 then the largest moves to the end
        assert_eq!(columns(&groups), vec![vec![3], vec![2], vec![0], vec![1]]);
    }

    #[test]
    fn test_columns_interleaved_over_fewer_workers() {
        let (data, sizes) = buffers(&[10, 40, 20, 30]);
        let groups = assign_tile_columns(&tile_buffers(&data, &sizes), 2);
        // Sorted 1, 3, 2, 0; positions 0 and 2 swap
        assert_eq!(columns(&groups), vec![vec![2, 3], vec![1, 0]]);
    }

    #[test]
    fn test_uneven_group_sizes() {
        let (data, sizes) = buffers(&[5, 4, 3, 2, 1]);
        let groups = assign_tile_columns(&tile_buffers(&data, &sizes), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[1].len(), 3);
        let mut all: Vec<usize> = columns(&groups).concat();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_mismatched_output_frame() {
        let header = FrameHeader {
            width: 64,
            height: 64,
            ..Default::default()
        };
        let fc = FrameContext::default();
        let mut decoder = Vp9TileDecoder::new(DecoderConfig::default()).unwrap();
        let mut frame = FrameBuffer::new(32, 64, true, true, 8);
        let err = decoder
            .decode_tiles(&FrameInput::new(&header, &fc), &[0x80, 0, 0, 0], &mut frame)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(decoder.frames_decoded(), 0);
    }

    #[test]
    fn test_high_bit_depth_needs_tables() {
        let header = FrameHeader {
            width: 64,
            height: 64,
            bit_depth: 10,
            ..Default::default()
        };
        let fc = FrameContext::default();
        let mut decoder = Vp9TileDecoder::new(DecoderConfig::default()).unwrap();
        let mut frame = FrameBuffer::for_header(&header);
        let err = decoder
            .decode_tiles(&FrameInput::new(&header, &fc), &[0x80, 0, 0, 0], &mut frame)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
