//! Real-time value: the current rating adjusted by recent form.

use rally_core::{Participant, RatingError, RatingHistory};

/// Default number of ratings that make up "recent form".
pub const DEFAULT_WINDOW: usize = 3;

/// Blends long-run and recent performance into one strength figure.
///
/// With more than `window` ratings on record, the value is
///
/// ```text
/// last + (mean(recent) - mean(history)) / (match_count / (match_count - window))
/// ```
///
/// where `recent` are the `window` ratings preceding the current one. The
/// adjustment shrinks as `match_count` grows relative to `window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueEstimator {
    window: usize,
}

impl Default for ValueEstimator {
    fn default() -> Self {
        ValueEstimator {
            window: DEFAULT_WINDOW,
        }
    }
}

impl ValueEstimator {
    pub fn new(window: usize) -> Self {
        ValueEstimator { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Computes the value, failing where the formula is undefined.
    ///
    /// A history no longer than the window, or a window of 0, yields the
    /// current rating.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::InsufficientHistory`] when the history is longer
    /// than the window but `match_count <= window`. That covers the zero
    /// divisor at `match_count == window` and the histories left longer than
    /// `match_count + 1` by reversed matches.
    pub fn try_value(&self, history: &RatingHistory, match_count: u32) -> Result<f64, RatingError> {
        let ratings = history.as_slice();
        let last = history.current();
        if self.window == 0 || ratings.len() <= self.window {
            return Ok(last);
        }
        if (match_count as usize) <= self.window {
            return Err(RatingError::InsufficientHistory {
                match_count,
                window: self.window,
            });
        }

        let end = ratings.len() - 1;
        let recent = &ratings[end - self.window..end];
        let total_avg = mean(ratings);
        let recent_avg = mean(recent);

        let matches = match_count as f64;
        let confidence = matches / (matches - self.window as f64);
        Ok(last + (recent_avg - total_avg) / confidence)
    }

    /// Computes the value, falling back to the current rating when the
    /// formula is undefined.
    pub fn value(&self, history: &RatingHistory, match_count: u32) -> f64 {
        match self.try_value(history, match_count) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(%err, "value estimate fell back to current rating");
                history.current()
            }
        }
    }

    pub fn value_of(&self, participant: &Participant) -> f64 {
        self.value(&participant.history, participant.match_count)
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
