//! Artwork request bookkeeping.
//!
//! Downloads are keyed by a small rotating slot (`player.artwork.0` ..
//! `player.artwork.9`) so the on-disk cache never grows past ten files. The
//! generation number makes each request distinguishable even when a slot is
//! reused, which lets the player drop completions that arrive after a newer
//! request was issued.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::player::ChangeSet;

mod http;

pub use http::HttpArtworkFetcher;

/// Number of rotating download slots.
pub const ARTWORK_SLOTS: u8 = 10;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArtworkRequestId {
    slot: u8,
    generation: u64,
}

impl ArtworkRequestId {
    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Download key, e.g. `player.artwork.3`.
    pub fn key(&self) -> String {
        format!("player.artwork.{}", self.slot)
    }
}

impl fmt::Display for ArtworkRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.key(), self.generation)
    }
}

/// Hands out request ids: monotonic generation, slot wraps at `ARTWORK_SLOTS`.
#[derive(Debug, Default)]
pub struct ArtworkIds {
    next: u64,
}

impl ArtworkIds {
    pub fn next_id(&mut self) -> ArtworkRequestId {
        let generation = self.next;
        self.next += 1;
        ArtworkRequestId {
            slot: (generation % u64::from(ARTWORK_SLOTS)) as u8,
            generation,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtworkRequest {
    pub id: ArtworkRequestId,
    pub url: String,
}

#[derive(Debug, Error)]
pub enum ArtworkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP error: {status} {reason}")]
    Status { status: u16, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported artwork URL: {0}")]
    UnsupportedUrl(String),
}

/// Completion of an artwork request.
#[derive(Debug)]
pub struct ArtworkResult {
    pub id: ArtworkRequestId,
    pub outcome: Result<PathBuf, ArtworkError>,
}

/// Request still waiting for its completion, with the change-set that
/// triggered it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PendingArtwork {
    pub id: ArtworkRequestId,
    pub changes: ChangeSet,
}

#[cfg(test)]
mod tests;
