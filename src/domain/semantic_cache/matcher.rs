//! Best-match tracking for semantic lookups

/// Tracks the best-scoring candidate of a scan
///
/// A candidate is accepted when its score is at least the threshold and
/// strictly greater than the current best. Candidates offered later never
/// displace an earlier one with an equal score.
#[derive(Debug, Clone)]
pub struct BestMatch<T> {
    threshold: f32,
    best: Option<(f32, T)>,
}

impl<T> BestMatch<T> {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            best: None,
        }
    }

    /// Offers a candidate, returning whether it became the new best
    pub fn offer(&mut self, score: f32, candidate: T) -> bool {
        if score.is_nan() || score < self.threshold {
            return false;
        }

        let beats_current = match &self.best {
            Some((best_score, _)) => score > *best_score,
            None => true,
        };

        if beats_current {
            self.best = Some((score, candidate));
        }

        beats_current
    }

    pub fn best_score(&self) -> Option<f32> {
        self.best.as_ref().map(|(score, _)| *score)
    }

    pub fn into_best(self) -> Option<(f32, T)> {
        self.best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_best() {
        let matcher: BestMatch<&str> = BestMatch::new(0.75);
        assert!(matcher.into_best().is_none());
    }

    #[test]
    fn test_below_threshold_rejected() {
        let mut matcher = BestMatch::new(0.75);
        assert!(!matcher.offer(0.7499, "a"));
        assert!(matcher.into_best().is_none());
    }

    #[test]
    fn test_exactly_at_threshold_accepted() {
        let mut matcher = BestMatch::new(0.75);
        assert!(matcher.offer(0.75, "a"));
        assert_eq!(matcher.into_best(), Some((0.75, "a")));
    }

    #[test]
    fn test_higher_score_wins() {
        let mut matcher = BestMatch::new(0.75);
        matcher.offer(0.80, "low");
        matcher.offer(0.92, "high");
        matcher.offer(0.85, "mid");

        assert_eq!(matcher.into_best(), Some((0.92, "high")));
    }

    #[test]
    fn test_ties_keep_first_seen() {
        let mut matcher = BestMatch::new(0.75);
        assert!(matcher.offer(0.75, "first"));
        assert!(!matcher.offer(0.75, "second"));

        assert_eq!(matcher.best_score(), Some(0.75));
        assert_eq!(matcher.into_best().map(|(_, c)| c), Some("first"));
    }

    #[test]
    fn test_nan_never_matches() {
        let mut matcher = BestMatch::new(0.0);
        assert!(!matcher.offer(f32::NAN, "nan"));
    }
}
