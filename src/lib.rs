//! zvd-vp9 - the per-frame decode core of a VP9 video decoder
//!
//! The crate turns entropy-coded tile data plus an already-parsed frame
//! header into a reconstructed planar YUV picture. It covers partition
//! recursion, mode info and motion vector decode, coefficient token decode,
//! intra and inter prediction, inverse transforms, and tile-parallel
//! orchestration with symbol count accumulation.
//!
//! # Architecture
//!
//! - `codec::vp9::decoder`: frame/tile orchestration (`Vp9TileDecoder`)
//! - `codec::vp9::partition`, `reconstruct`, `mode_info`: per-superblock decode
//! - `codec::vp9::entropy`, `mvref`: coefficient tokens and motion vector candidates
//! - `codec::vp9::prediction`, `inter`, `transform`: pixel reconstruction
//!
//! Header parsing, backward probability adaptation and the loop filter itself
//! are left to the caller.

pub mod codec;
pub mod error;

pub use error::{Error, Result};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const VERSION_MAJOR: u32 = 0;
pub const VERSION_MINOR: u32 = 1;
pub const VERSION_PATCH: u32 = 0;

/// Library-wide configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of threads for the global rayon pool
    pub max_threads: Option<usize>,
    /// Enable verbose logging
    pub verbose: bool,
    /// Enable debug output
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_threads: None,
            verbose: false,
            debug: false,
        }
    }
}

/// Initialize the library with the given configuration
pub fn init(config: Config) -> Result<()> {
    if let Some(threads) = config.max_threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| Error::Init(format!("Failed to initialize thread pool: {}", e)))?;
    }

    if config.verbose || config.debug {
        let level = if config.debug { "debug" } else { "info" };
        tracing_subscriber::fmt()
            .with_env_filter(level)
            .try_init()
            .map_err(|e| Error::Init(format!("Failed to initialize logging: {}", e)))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION_MAJOR, 0);
        assert_eq!(VERSION_MINOR, 1);
        assert_eq!(VERSION_PATCH, 0);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.max_threads, None);
        assert!(!config.verbose);
        assert!(!config.debug);
    }

    #[test]
    fn test_init() {
        let config = Config::default();
        assert!(init(config).is_ok());
    }
}
