use crate::{
    config::SegmentConfig,
    error::{ConfigError, Result},
    video::Segment,
};

/// Splits a clip's duration into bounded, contiguous segments
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentScheduler {
    min_len: f64,
    max_len: f64,
}

impl SegmentScheduler {
    /// Requires `0 < min_len <= max_len`, both finite
    pub fn new(min_len: f64, max_len: f64) -> Result<Self> {
        let finite = min_len.is_finite() && max_len.is_finite();
        if !finite || min_len <= 0.0 || max_len < min_len {
            return Err(ConfigError::InvalidValue {
                key: "segments.length_range".to_string(),
                value: format!("{}-{}", min_len, max_len),
            }
            .into());
        }
        Ok(Self { min_len, max_len })
    }

    pub fn from_config(config: &SegmentConfig) -> Result<Self> {
        Self::new(config.min_len, config.max_len)
    }

    pub fn min_len(&self) -> f64 {
        self.min_len
    }

    pub fn max_len(&self) -> f64 {
        self.max_len
    }

    /// Greedy left-to-right split of `[0, duration)`
    ///
    /// Full `max_len` windows are emitted while more than `max_len` remains.
    /// A remainder within bounds becomes the last segment. A remainder
    /// shorter than `min_len` is folded into the previous segment, or becomes
    /// the only segment when the whole clip is that short.
    pub fn schedule(&self, duration: f64) -> Vec<Segment> {
        let mut segments: Vec<Segment> = Vec::new();
        if !duration.is_finite() {
            return segments;
        }

        let mut cursor = 0.0;
        while cursor < duration {
            let remaining = duration - cursor;

            if remaining > self.max_len {
                segments.push(Segment::new(cursor, cursor + self.max_len));
                cursor += self.max_len;
            } else if remaining < self.min_len {
                match segments.last_mut() {
                    Some(last) => last.end = duration,
                    None => segments.push(Segment::new(cursor, duration)),
                }
                break;
            } else {
                segments.push(Segment::new(cursor, duration));
                break;
            }
        }

        // Rounding in `cursor += max_len` must not leave the end short of the clip
        if let Some(last) = segments.last_mut() {
            last.end = duration;
        }

        segments
    }
}

impl Default for SegmentScheduler {
    fn default() -> Self {
        let config = SegmentConfig::default();
        Self {
            min_len: config.min_len,
            max_len: config.max_len,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(segments: &[Segment]) -> Vec<(f64, f64)> {
        segments.iter().map(|s| (s.start, s.end)).collect()
    }

    #[test]
    fn test_short_tail_merges_into_previous() {
        let segments = SegmentScheduler::default().schedule(32.0);
        assert_eq!(spans(&segments), vec![(0.0, 15.0), (15.0, 32.0)]);
    }

    #[test]
    fn test_clip_shorter_than_minimum_is_one_segment() {
        let segments = SegmentScheduler::default().schedule(2.0);
        assert_eq!(spans(&segments), vec![(0.0, 2.0)]);
    }

    #[test]
    fn test_exact_fit() {
        let segments = SegmentScheduler::default().schedule(15.0);
        assert_eq!(spans(&segments), vec![(0.0, 15.0)]);
    }

    #[test]
    fn test_exact_multiple_of_max() {
        let segments = SegmentScheduler::default().schedule(45.0);
        assert_eq!(spans(&segments), vec![(0.0, 15.0), (15.0, 30.0), (30.0, 45.0)]);
    }

    #[test]
    fn test_remainder_within_bounds_is_kept() {
        let segments = SegmentScheduler::default().schedule(20.0);
        assert_eq!(spans(&segments), vec![(0.0, 15.0), (15.0, 20.0)]);

        let segments = SegmentScheduler::default().schedule(18.0);
        assert_eq!(spans(&segments), vec![(0.0, 15.0), (15.0, 18.0)]);
    }

    #[test]
    fn test_empty_and_degenerate_durations() {
        let scheduler = SegmentScheduler::default();
        assert!(scheduler.schedule(0.0).is_empty());
        assert!(scheduler.schedule(-4.0).is_empty());
        assert!(scheduler.schedule(f64::NAN).is_empty());
        assert!(scheduler.schedule(f64::INFINITY).is_empty());
    }

    #[test]
    fn test_rejects_bad_bounds() {
        assert!(SegmentScheduler::new(0.0, 15.0).is_err());
        assert!(SegmentScheduler::new(5.0, 4.0).is_err());
        assert!(SegmentScheduler::new(3.0, f64::INFINITY).is_err());
        assert!(SegmentScheduler::new(5.0, 5.0).is_ok());
    }

    #[test]
    fn test_coverage_and_bounds_over_many_durations() {
        for (min_len, max_len) in [(3.0, 15.0), (1.0, 1.0), (2.5, 7.25), (10.0, 60.0)] {
            let scheduler = SegmentScheduler::new(min_len, max_len).unwrap();

            for step in 0..400 {
                let duration = step as f64 * 0.37;
                let segments = scheduler.schedule(duration);

                if duration == 0.0 {
                    assert!(segments.is_empty());
                    continue;
                }

                assert_eq!(segments.first().unwrap().start, 0.0);
                assert_eq!(segments.last().unwrap().end, duration);
                for pair in segments.windows(2) {
                    assert_eq!(pair[0].end, pair[1].start, "gap or overlap at {}", duration);
                }

                // Only the last segment may break the bounds: a merged tail
                // (up to max + min) or a whole clip shorter than min.
                for segment in &segments[..segments.len() - 1] {
                    assert!(segment.duration() <= max_len + 1e-9);
                    assert!(segment.duration() >= min_len - 1e-9);
                }
                let last = segments.last().unwrap();
                assert!(last.start < last.end);
                assert!(last.duration() < max_len + min_len + 1e-9);
                if segments.len() > 1 {
                    assert!(last.duration() >= min_len - 1e-9);
                }
            }
        }
    }
}
