use std::path::{Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::cache::LruCache;
use crate::errors::VqalignError;
use crate::io::{load_frame, load_manifest};
use crate::scorer::ssim::{frame_similarity, FramePlanes};
use crate::scorer::{PairwiseScorer, SequenceId, SequenceRef};

/// Number of decoded frames kept in memory per sequence
pub const DEFAULT_CACHE_CAPACITY: usize = 20;

struct FrameSequence {
    frames: Vec<PathBuf>,
    cache: LruCache<usize, Rc<FramePlanes>>,
}

impl FrameSequence {
    fn frame(&mut self, index: usize) -> Result<Rc<FramePlanes>, VqalignError> {
        let path = self.frames.get(index)
            .ok_or_else(|| VqalignError::InvalidFrame {
                path: PathBuf::new(),
                reason: format!("frame index {index} out of range ({} frames)", self.frames.len()),
            })?;

        let frame = self.cache.get_or_try_insert_with(index, || {
            trace!(index, path = %path.display(), "Decoding frame");
            load_frame(path).map(|image| Rc::new(FramePlanes::from_image(&image)))
        })?;

        Ok(Rc::clone(frame))
    }
}

/// Scores frames of video sequences using SSIM.
///
/// Frames are decoded on demand. Each sequence keeps its own bounded cache of decoded frames.
pub struct FrameScorer {
    sequences: Vec<FrameSequence>,
    cache_capacity: usize,
}

impl FrameScorer {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(cache_capacity: usize) -> Self {
        Self {
            sequences: Vec::new(),
            cache_capacity: cache_capacity.max(1),
        }
    }

    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity
    }

    /// Register a sequence of frame files
    pub fn add_sequence(&mut self, frames: Vec<PathBuf>) -> SequenceRef {
        let seq = SequenceRef::new(SequenceId(self.sequences.len()), frames.len());

        self.sequences.push(FrameSequence {
            frames,
            cache: LruCache::new(self.cache_capacity),
        });

        seq
    }

    /// Register the sequence listed in a manifest file
    pub fn load_manifest(&mut self, path: &Path) -> Result<SequenceRef, VqalignError> {
        let frames = load_manifest(path)?;
        debug!(manifest = %path.display(), num_frames = frames.len(), "Loaded sequence");

        Ok(self.add_sequence(frames))
    }

    /// Number of cache hits and misses of a sequence
    pub fn cache_stats(&self, seq: SequenceId) -> Option<(usize, usize)> {
        self.sequences.get(seq.0)
            .map(|s| (s.cache.num_hits(), s.cache.num_misses()))
    }

    fn frame(&mut self, seq: SequenceId, index: usize) -> Result<Rc<FramePlanes>, VqalignError> {
        self.sequences.get_mut(seq.0)
            .ok_or_else(|| VqalignError::InvalidFrame {
                path: PathBuf::new(),
                reason: format!("unknown sequence {seq}"),
            })?
            .frame(index)
    }
}

impl Default for FrameScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl PairwiseScorer for FrameScorer {
    fn score(&mut self, seq1: SequenceId, seq2: SequenceId, index1: usize, index2: usize) -> Result<f64, VqalignError> {
        let frames = self.frame(seq1, index1)
            .and_then(|f1| Ok((f1, self.frame(seq2, index2)?)));

        let (frame1, frame2) = frames
            .map_err(|e| VqalignError::scorer_failure(index1, index2, e.to_string()))?;

        frame_similarity(&frame1, &frame2)
            .map_err(|reason| VqalignError::scorer_failure(index1, index2, reason))
    }
}


#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{Rgb, RgbImage};

    use super::FrameScorer;
    use crate::scorer::PairwiseScorer;

    fn write_frame(dir: &std::path::Path, name: &str, value: u8) -> PathBuf {
        let image = RgbImage::from_fn(4, 4, |x, y| {
            let v = value.wrapping_add((y * 4 + x) as u8 * 9);
            Rgb([v, v / 2, 255 - v])
        });

        let path = dir.join(name);
        image.save(&path).unwrap();
        path
    }

    #[test]
    fn test_score_and_cache() {
        let dir = std::env::temp_dir().join(format!("vqalign-frames-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let a = write_frame(&dir, "a.bmp", 10);
        let b = write_frame(&dir, "b.png", 90);

        let mut scorer = FrameScorer::with_cache_capacity(1);
        let seq1 = scorer.add_sequence(vec![a.clone(), b.clone()]);
        let seq2 = scorer.add_sequence(vec![a, dir.join("missing.bmp")]);

        assert!((scorer.score(seq1.id, seq2.id, 0, 0).unwrap() - 1.0).abs() < 1e-9);
        assert!(scorer.score(seq1.id, seq2.id, 1, 0).unwrap() < 1.0);

        // Capacity of one: frame 0 of sequence 1 was evicted by frame 1
        assert_eq!(scorer.cache_stats(seq1.id), Some((0, 2)));
        assert_eq!(scorer.cache_stats(seq2.id), Some((1, 1)));

        let err = scorer.score(seq1.id, seq2.id, 0, 1).unwrap_err();
        assert!(err.is_scorer_failure());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
