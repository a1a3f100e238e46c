//! Version-gated transaction features.
//!
//! Each Zcash-derived upgrade adds fields to the wire format. Whether a field
//! is present depends only on the (flag-stripped) transaction version.

/// First version carrying a join-split count.
pub const JOINSPLITS_SUPPORT_VERSION: u32 = 2;

/// First version carrying a version group id and expiry height.
pub const OVERWINTER_VERSION: u32 = 3;

/// First version carrying a value balance and shielded spend/output counts.
pub const SAPLING_VERSION: u32 = 4;

/// Top bit of the header word: the overwintered flag.
pub const OVERWINTER_FLAG: u32 = 0x8000_0000;

/// Mask selecting the version out of the header word.
pub const VERSION_MASK: u32 = 0x7FFF_FFFF;

pub fn supports_join_splits(version: u32) -> bool {
    version >= JOINSPLITS_SUPPORT_VERSION
}

pub fn is_overwinter_compatible(version: u32) -> bool {
    version >= OVERWINTER_VERSION
}

pub fn is_sapling_compatible(version: u32) -> bool {
    version >= SAPLING_VERSION
}

/// Split a raw header word into `(overwintered, version)`.
pub fn split_header(header: u32) -> (bool, u32) {
    (header & OVERWINTER_FLAG != 0, header & VERSION_MASK)
}

/// Join a version and overwintered flag into a header word.
pub fn join_header(version: u32, overwintered: bool) -> u32 {
    if overwintered {
        version | OVERWINTER_FLAG
    } else {
        version
    }
}
