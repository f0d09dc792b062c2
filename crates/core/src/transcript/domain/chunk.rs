use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ChunkError {
    #[error("chunk {index}: overlap {overlap}s exceeds duration {duration}s")]
    OverlapExceedsDuration {
        index: usize,
        overlap: f64,
        duration: f64,
    },
    #[error("chunk {index}: {field} must be finite and non-negative, got {value}")]
    InvalidTiming {
        index: usize,
        field: &'static str,
        value: f64,
    },
    #[error("chunk length must exceed overlap ({chunk_len}s <= {overlap}s)")]
    NonAdvancingPlan { chunk_len: f64, overlap: f64 },
}

/// One time-windowed transcript fragment.
///
/// `overlap_seconds` is how much of the predecessor's trailing audio this
/// chunk restates; it never exceeds the chunk's own duration.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    index: usize,
    text: String,
    overlap_seconds: f64,
    duration_seconds: f64,
}

impl Chunk {
    pub fn new(
        index: usize,
        text: impl Into<String>,
        overlap_seconds: f64,
        duration_seconds: f64,
    ) -> Result<Self, ChunkError> {
        check_timing(index, "overlap_seconds", overlap_seconds)?;
        check_timing(index, "duration_seconds", duration_seconds)?;
        if overlap_seconds > duration_seconds {
            return Err(ChunkError::OverlapExceedsDuration {
                index,
                overlap: overlap_seconds,
                duration: duration_seconds,
            });
        }
        Ok(Self {
            index,
            text: text.into(),
            overlap_seconds,
            duration_seconds,
        })
    }

    /// Build the chunk produced by transcribing a planned window.
    pub fn from_window(window: &ChunkWindow, text: impl Into<String>) -> Self {
        Self {
            index: window.index,
            text: text.into(),
            overlap_seconds: window.overlap_seconds,
            duration_seconds: window.duration(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn overlap_seconds(&self) -> f64 {
        self.overlap_seconds
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }
}

/// A planned slice of the source audio handed to a transcriber.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkWindow {
    pub index: usize,
    pub start_time: f64,
    pub end_time: f64,
    pub overlap_seconds: f64,
}

impl ChunkWindow {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Cut `total_seconds` of audio into windows of `chunk_seconds`, each
/// starting `overlap_seconds` before its predecessor ends.
///
/// The first window has no overlap, and a short final window has its overlap
/// clamped to its own duration.
pub fn plan_chunks(
    total_seconds: f64,
    chunk_seconds: f64,
    overlap_seconds: f64,
) -> Result<Vec<ChunkWindow>, ChunkError> {
    check_timing(0, "total_seconds", total_seconds)?;
    check_timing(0, "chunk_seconds", chunk_seconds)?;
    check_timing(0, "overlap_seconds", overlap_seconds)?;
    if chunk_seconds <= overlap_seconds {
        return Err(ChunkError::NonAdvancingPlan {
            chunk_len: chunk_seconds,
            overlap: overlap_seconds,
        });
    }

    let mut windows = Vec::new();
    let mut start = 0.0;
    while start < total_seconds {
        let index = windows.len();
        let end = (start + chunk_seconds).min(total_seconds);
        let overlap = if index == 0 {
            0.0
        } else {
            overlap_seconds.min(end - start)
        };
        windows.push(ChunkWindow {
            index,
            start_time: start,
            end_time: end,
            overlap_seconds: overlap,
        });
        if end >= total_seconds {
            break;
        }
        start = end - overlap_seconds;
    }
    Ok(windows)
}

fn check_timing(index: usize, field: &'static str, value: f64) -> Result<(), ChunkError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ChunkError::InvalidTiming {
            index,
            field,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_chunk_fields() {
        let c = Chunk::new(2, "สวัสดี", 5.0, 300.0).unwrap();
        assert_eq!(c.index(), 2);
        assert_eq!(c.text(), "สวัสดี");
        assert_eq!(c.overlap_seconds(), 5.0);
        assert_eq!(c.duration_seconds(), 300.0);
    }

    #[test]
    fn test_overlap_longer_than_duration_is_rejected() {
        let err = Chunk::new(1, "x", 10.0, 5.0).unwrap_err();
        assert_eq!(
            err,
            ChunkError::OverlapExceedsDuration {
                index: 1,
                overlap: 10.0,
                duration: 5.0
            }
        );
    }

    #[test]
    fn test_negative_timing_is_rejected() {
        assert!(matches!(
            Chunk::new(0, "x", -1.0, 5.0),
            Err(ChunkError::InvalidTiming { field: "overlap_seconds", .. })
        ));
        assert!(Chunk::new(0, "x", 0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_plan_covers_audio_with_overlap() {
        let windows = plan_chunks(250.0, 100.0, 10.0).unwrap();
        assert_eq!(windows.len(), 3);
        assert_relative_eq!(windows[0].start_time, 0.0);
        assert_relative_eq!(windows[0].overlap_seconds, 0.0);
        assert_relative_eq!(windows[1].start_time, 90.0);
        assert_relative_eq!(windows[1].end_time, 190.0);
        assert_relative_eq!(windows[1].overlap_seconds, 10.0);
        assert_relative_eq!(windows[2].start_time, 180.0);
        assert_relative_eq!(windows[2].end_time, 250.0);
    }

    #[test]
    fn test_plan_windows_never_overlap_more_than_their_duration() {
        let windows = plan_chunks(95.0, 50.0, 40.0).unwrap();
        for w in &windows {
            assert!(w.overlap_seconds <= w.duration());
            let chunk = Chunk::from_window(w, "");
            assert!(chunk.overlap_seconds() <= chunk.duration_seconds());
        }
    }

    #[test]
    fn test_plan_rejects_non_advancing_windows() {
        assert_eq!(
            plan_chunks(100.0, 10.0, 10.0).unwrap_err(),
            ChunkError::NonAdvancingPlan {
                chunk_len: 10.0,
                overlap: 10.0
            }
        );
    }

    #[test]
    fn test_plan_of_empty_audio_is_empty() {
        assert!(plan_chunks(0.0, 60.0, 5.0).unwrap().is_empty());
    }
}
