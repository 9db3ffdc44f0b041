//! Identity Module
//!
//! Boundary between face crops and enrolled identities:
//! - `IdentityMatcher` contract for the external matcher
//! - Acceptance policy on the returned distance (lower = more similar)
//! - In-memory embedding gallery keyed by subject ID
//! - Cheap proximity association between full re-matches

mod gallery;
mod policy;
mod proximity;

pub use gallery::{Embedding, EmbeddingGallery, FaceEmbedder, GalleryEntry, GalleryMatcher};
pub use policy::{AcceptancePolicy, IdentityDecision, IdentityMatcher, MatchCandidate, DEFAULT_MATCH_THRESHOLD};
pub use proximity::{associate_by_proximity, DEFAULT_PROXIMITY_RADIUS};

use thiserror::Error;

/// Identity error types
#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Embedding extraction failed: {0}")]
    Embedding(String),

    #[error("Invalid embedding: {0}")]
    InvalidEmbedding(String),

    #[error("Matcher unavailable: {0}")]
    Unavailable(String),
}
