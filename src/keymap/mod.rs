//! Hash map keyed by fixed-size composite values.
//!
//! Keys compare element-wise over every coordinate and the flag. A coordinate
//! the caller never set is zero and still takes part in equality, so
//! `{[0 0 ..] 0}` and `{[1 0 ..] 0}` are unrelated entries.

pub mod key;
pub mod map;

pub use key::{CompositeKey, KeyFlag, ProbeRecord};
pub use map::{Entries, StructuralKeyMap};

/// Number of records the map probe inserts.
pub const PROBE_RECORDS: i64 = 16;

/// Runs the map probe loop: for `i` in `0..16`, insert the record whose
/// coordinate 0 is `i` with value `i`.
pub fn populate_probe(map: &mut StructuralKeyMap<16, u8>) {
    for i in 0..PROBE_RECORDS {
        map.put(ProbeRecord::with_coordinate(0, i), i);
    }
}
