//! Host configuration
//!
//! All tunable limits of the boundary layer live here so that embedders can
//! deserialize them from their own configuration source. Defaults match the
//! reference deployment (40 KiB arena, mruby bytecode container images).

use serde::{Deserialize, Serialize};

/// Default arena capacity in bytes (40 KiB)
pub const DEFAULT_ARENA_SIZE: usize = 40 * 1024;

/// Smallest accepted program image in bytes
pub const MIN_IMAGE_SIZE: usize = 8;

/// Largest accepted program image in bytes (1 MiB)
pub const MAX_IMAGE_SIZE: usize = 1024 * 1024;

/// Magic tag expected at offset 0 of every program image
pub const IMAGE_MAGIC: [u8; 4] = *b"RITE";

/// Longest accepted class or method name in bytes
pub const MAX_NAME_LENGTH: usize = 64;

/// Diagnostic messages are truncated to this many bytes before emission
pub const DIAG_TRUNCATE_AT: usize = 256;

/// Configuration for a [`ScriptHost`](crate::ScriptHost) instance
///
/// Every field has a default, so a partial configuration deserializes
/// cleanly (`#[serde(default)]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Capacity of the fixed memory arena backing the interpreter
    pub arena_size: usize,

    /// Minimum accepted program image length
    pub min_image_size: usize,

    /// Maximum accepted program image length
    pub max_image_size: usize,

    /// Expected 4-byte magic tag at the start of every image
    pub magic: [u8; 4],

    /// Maximum length of class and method names registered through the bridge
    pub max_name_length: usize,

    /// Truncation limit for formatted diagnostic messages
    pub diag_truncate_at: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            arena_size: DEFAULT_ARENA_SIZE,
            min_image_size: MIN_IMAGE_SIZE,
            max_image_size: MAX_IMAGE_SIZE,
            magic: IMAGE_MAGIC,
            max_name_length: MAX_NAME_LENGTH,
            diag_truncate_at: DIAG_TRUNCATE_AT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.arena_size, 40 * 1024);
        assert_eq!(config.min_image_size, 8);
        assert_eq!(config.max_image_size, 1024 * 1024);
        assert_eq!(config.magic, *b"RITE");
    }
}
