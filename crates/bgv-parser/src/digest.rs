//! Duplicate-snapshot detection by content digest.
//!
//! Compilers often dump the same graph several times in a row (for
//! example, before and after a phase that changed nothing). Instead of
//! comparing graphs structurally, the parser hashes the exact bytes each
//! top-level graph occupied on the wire with blake3 (see
//! [`ChunkedReader::begin_digest`](crate::reader::ChunkedReader::begin_digest))
//! and compares the result with the previous graph at the same folder level.
//!
//! [`DigestTracker`] holds one recorded digest per open folder level and
//! is pushed and popped in lockstep with the parser's folder stack.

use tracing::trace;

#[derive(Debug)]
pub struct DigestTracker {
    /// Last recorded digest per folder level; index 0 is the document.
    levels: Vec<Option<blake3::Hash>>,
}

impl Default for DigestTracker {
    fn default() -> Self {
        DigestTracker::new()
    }
}

impl DigestTracker {
    pub fn new() -> Self {
        DigestTracker {
            levels: vec![None],
        }
    }

    /// Opens a fresh level for a newly begun group.
    pub fn push_level(&mut self) {
        self.levels.push(None);
    }

    /// Discards the innermost level. The document level is never removed.
    pub fn pop_level(&mut self) {
        if self.levels.len() > 1 {
            self.levels.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Compares `digest` with the one recorded at the current level.
    ///
    /// Returns `true` if they are equal. The level is only updated when the
    /// digests differ, so an identical follower never rewrites it.
    pub fn observe(&mut self, digest: blake3::Hash) -> bool {
        let Some(recorded) = self.levels.last_mut() else {
            return false;
        };
        if *recorded == Some(digest) {
            trace!(digest = %digest.to_hex(), "graph digest matches previous snapshot");
            return true;
        }
        *recorded = Some(digest);
        false
    }
}
