//! VP9 frame decode core
//!
//! Decodes the entropy-coded tile data of a VP9 frame into a planar YUV
//! picture, given a frame header and probability context parsed elsewhere.
//!
//! ## Pipeline
//!
//! - `tile`: splits frame data into tiles and tracks tile extents
//! - `partition`: walks the superblock quadtree of each tile
//! - `mode_info`, `mvref`, `pred_context`: block modes, references and
//!   motion vectors
//! - `entropy`, `scan`, `quant`: coefficient tokens and dequantization
//! - `prediction`, `inter`, `transform`: pixel reconstruction
//! - `decoder`: single and multi-threaded orchestration over tiles
//!
//! ## VP9 Profiles
//!
//! - Profile 0: 8-bit, YUV 4:2:0
//! - Profile 1: 8-bit, YUV 4:2:2, 4:4:0, 4:4:4
//! - Profile 2: 10/12-bit, YUV 4:2:0
//! - Profile 3: 10/12-bit, YUV 4:2:2, 4:4:0, 4:4:4
//!
//! All four are handled; high bit depth frames take their dequantization
//! tables from the caller.

pub mod block;
pub mod counts;
pub mod decoder;
pub mod entropy;
pub mod filter;
pub mod frame;
pub mod inter;
pub mod mode_info;
pub mod mvref;
pub mod partition;
pub mod pred_context;
pub mod prediction;
pub mod probs;
pub mod quant;
pub mod range_coder;
pub mod range_encoder;
pub mod reconstruct;
pub mod scan;
pub mod tables;
pub mod tile;
pub mod transform;

pub use block::{ModeInfo, ModeInfoGrid, MotionVectorMap, MvRef, SegmentationMap};
pub use counts::FrameCounts;
pub use decoder::{DecoderConfig, FrameInput, TileDecodeOutput, Vp9TileDecoder};
pub use filter::FilterLevelMap;
pub use frame::{FrameBuffer, FrameHeader, FrameType, Plane};
pub use probs::FrameContext;
pub use quant::SegmentDequant;
pub use tile::{get_tile_buffers, TileBuffer};
