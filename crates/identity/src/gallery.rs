//! Embedding gallery
//!
//! Pre-computed reference embeddings held in memory, keyed by subject ID.
//! Matching is a linear cosine-distance scan over every stored embedding.

use crate::policy::{IdentityMatcher, MatchCandidate};
use crate::IdentityError;
use camera_capture::VideoFrame;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::RwLock;
use tracing::info;

/// Face embedding vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
}

impl Embedding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    /// Cosine similarity in [-1, 1]; 0 when either vector has zero norm
    pub fn similarity(&self, other: &Embedding) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;
        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 {
            dot / denom
        } else {
            0.0
        }
    }

    /// Cosine distance `1 - similarity`, in [0, 2]
    pub fn distance(&self, other: &Embedding) -> f32 {
        1.0 - self.similarity(other)
    }
}

/// Reference embeddings for one enrolled subject
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub display_name: String,
    pub embeddings: Vec<Embedding>,
    pub enrolled_at: DateTime<Utc>,
}

/// In-memory gallery keyed by subject ID
#[derive(Debug, Clone, Default)]
pub struct EmbeddingGallery {
    entries: BTreeMap<String, GalleryEntry>,
    dimension: Option<usize>,
}

impl EmbeddingGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enroll or replace a subject's reference embeddings
    pub fn enroll(
        &mut self,
        subject_id: impl Into<String>,
        display_name: impl Into<String>,
        embeddings: Vec<Embedding>,
        now: DateTime<Utc>,
    ) -> Result<(), IdentityError> {
        let subject_id = subject_id.into();
        if embeddings.is_empty() {
            return Err(IdentityError::InvalidEmbedding(format!(
                "no embeddings for {subject_id}"
            )));
        }

        let dimension = self.dimension.unwrap_or(embeddings[0].dimension());
        if dimension == 0 {
            return Err(IdentityError::InvalidEmbedding("empty vector".to_string()));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.dimension() != dimension) {
            return Err(IdentityError::InvalidEmbedding(format!(
                "expected dimension {dimension}, got {}",
                bad.dimension()
            )));
        }

        self.dimension = Some(dimension);
        let display_name = display_name.into();
        info!(subject = %subject_id, name = %display_name, samples = embeddings.len(), "Subject enrolled");
        self.entries.insert(
            subject_id,
            GalleryEntry {
                display_name,
                embeddings,
                enrolled_at: now,
            },
        );
        Ok(())
    }

    pub fn remove(&mut self, subject_id: &str) -> Option<GalleryEntry> {
        let removed = self.entries.remove(subject_id);
        if self.entries.is_empty() {
            self.dimension = None;
        }
        removed
    }

    pub fn get(&self, subject_id: &str) -> Option<&GalleryEntry> {
        self.entries.get(subject_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Closest subject over every stored embedding. Scans the whole gallery;
    /// ties go to the smaller subject ID.
    pub fn best_match(&self, query: &Embedding) -> Option<MatchCandidate> {
        let mut best: Option<(&String, &GalleryEntry, f32)> = None;

        for (id, entry) in &self.entries {
            for reference in &entry.embeddings {
                let distance = query.distance(reference);
                if best.map_or(true, |(_, _, d)| distance < d) {
                    best = Some((id, entry, distance));
                }
            }
        }

        best.map(|(id, entry, distance)| MatchCandidate {
            subject_id: id.clone(),
            display_name: entry.display_name.clone(),
            distance,
        })
    }
}

/// External face embedding model
pub trait FaceEmbedder: Send + Sync {
    fn embed(&self, crop: &VideoFrame) -> Result<Embedding, IdentityError>;
}

/// `IdentityMatcher` backed by an embedder and an in-memory gallery
pub struct GalleryMatcher<E> {
    embedder: E,
    gallery: RwLock<EmbeddingGallery>,
}

impl<E: FaceEmbedder> GalleryMatcher<E> {
    pub fn new(embedder: E, gallery: EmbeddingGallery) -> Self {
        Self {
            embedder,
            gallery: RwLock::new(gallery),
        }
    }

    /// Embed each enrollment frame and store the results
    pub fn enroll_frames(
        &self,
        subject_id: &str,
        display_name: &str,
        frames: &[VideoFrame],
        now: DateTime<Utc>,
    ) -> Result<(), IdentityError> {
        let embeddings = frames
            .iter()
            .map(|f| self.embedder.embed(f))
            .collect::<Result<Vec<_>, _>>()?;

        self.gallery
            .write()
            .map_err(|_| IdentityError::Unavailable("gallery lock poisoned".to_string()))?
            .enroll(subject_id, display_name, embeddings, now)
    }

    pub fn remove(&self, subject_id: &str) -> Result<bool, IdentityError> {
        let mut gallery = self
            .gallery
            .write()
            .map_err(|_| IdentityError::Unavailable("gallery lock poisoned".to_string()))?;
        Ok(gallery.remove(subject_id).is_some())
    }

    pub fn enrolled(&self) -> usize {
        self.gallery.read().map(|g| g.len()).unwrap_or(0)
    }
}

impl<E: FaceEmbedder> IdentityMatcher for GalleryMatcher<E> {
    fn best_match(&self, crop: &VideoFrame) -> Result<Option<MatchCandidate>, IdentityError> {
        let query = self.embedder.embed(crop)?;
        let gallery = self
            .gallery
            .read()
            .map_err(|_| IdentityError::Unavailable("gallery lock poisoned".to_string()))?;
        Ok(gallery.best_match(&query))
    }
}
