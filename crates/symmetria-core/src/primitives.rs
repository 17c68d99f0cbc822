//! # Engine Primitives
//!
//! Hardcoded runtime constants for the Symmetria engine.
//!
//! These limits are compiled into the binary and are immutable at runtime.
//! They bound every computation the engine performs so that each command
//! completes within one host tick.

/// Maximum number of crystals for brute-force automorphism enumeration.
///
/// Enumeration visits all `n!` permutations; 9! = 362 880 is the largest
/// count that stays comfortably inside one tick.
pub const MAX_ENUMERATION_CRYSTALS: usize = 9;

/// Maximum number of crystals in a single level.
pub const MAX_LEVEL_CRYSTALS: usize = 64;

/// Maximum number of pending events kept between two drains.
///
/// When a client never drains, the oldest events are dropped and counted.
pub const MAX_PENDING_EVENTS: usize = 1024;

/// Magic bytes for the canonical level encoding.
pub const MAGIC_BYTES: &[u8; 4] = b"SYMX";

/// Current canonical encoding version.
///
/// Increment this when making breaking changes to the canonical form.
pub const FORMAT_VERSION: u8 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumeration_limit_fits_level_limit() {
        assert!(MAX_ENUMERATION_CRYSTALS <= MAX_LEVEL_CRYSTALS);
    }

    #[test]
    fn magic_bytes_correct() {
        assert_eq!(MAGIC_BYTES, b"SYMX");
    }
}
