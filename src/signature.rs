use crate::decompose::Shape;
use crate::tokenize::ParsedPiece;
use ahash::RandomState;
use itertools::Itertools;
use once_cell::sync::Lazy;
use std::hash::{BuildHasher, Hash, Hasher};
use std::sync::Arc;

// Fixed seeds so fingerprints are reproducible for a given build.
static HASHER_STATE: Lazy<RandomState> =
    Lazy::new(|| RandomState::with_seeds(0x7a5c, 0x1d0b, 0x44e1, 0x9f37));

fn hash_str(s: &str) -> u64 {
    let mut h = HASHER_STATE.build_hasher();
    s.hash(&mut h);
    h.finish()
}

/// Stable fingerprint of a Shape, derived from its canonical string.
pub fn shape_fingerprint(shape: &Shape) -> u64 {
    hash_str(&shape.canonical())
}

/// Fingerprint of the ordered fuzzy-rule sequence of a piece sequence.
/// Literal content and run lengths do not participate.
pub fn pieces_fingerprint(pieces: &[Arc<ParsedPiece>]) -> u64 {
    let joined = pieces.iter().map(|p| p.fuzzy_rule()).join("/");
    hash_str(&joined)
}

/// Identifier of a structural cluster: URLs whose pieces are class-identical
/// position by position share a struct id even when every literal differs.
pub fn struct_id(shape: &Shape, pieces: &[Arc<ParsedPiece>]) -> String {
    format!(
        "{:016x}-{:016x}",
        shape_fingerprint(shape),
        pieces_fingerprint(pieces)
    )
}
