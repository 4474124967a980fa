//! Codec implementations

pub mod vp9;

pub use vp9::{DecoderConfig, FrameInput, TileDecodeOutput, Vp9TileDecoder};
