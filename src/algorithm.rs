//! Popularity band statistics for album candidates.
//!
//! Every album gets its own acceptance band. The lower bound is derived from
//! the album's track popularities; the upper bound is the caller's
//! `max_popularity`. Both bounds are inclusive.

use crate::catalog::TrackRef;
use crate::error::{Result, SelectionError};

/// Highest popularity the provider can assign to a track.
pub const MAX_PROVIDER_POPULARITY: u32 = 100;

/// Default inclusive upper bound for candidate popularity.
pub const DEFAULT_MAX_POPULARITY: u32 = 60;

/// How many sample standard deviations below the mean the lower bound sits.
const DEVIATIONS_BELOW_MEAN: f64 = 2.0;

/// Inclusive popularity range a track must fall into to be picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopularityBand {
    pub lower: u32,
    pub upper: u32,
}

impl PopularityBand {
    #[must_use]
    pub const fn contains(&self, popularity: u32) -> bool {
        popularity >= self.lower && popularity <= self.upper
    }

    /// A band is empty when the album's threshold sits above the cap.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.lower > self.upper
    }
}

impl std::fmt::Display for PopularityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.lower, self.upper)
    }
}

/// Lower popularity threshold for one album.
///
/// ```text
/// threshold = max(0, floor(mean - 2 * sample_stdev))
/// ```
///
/// A single-track album has no meaningful dispersion, so its threshold is
/// the track's own popularity.
///
/// # Errors
///
/// Returns [`SelectionError::EmptyInput`] for an empty slice. Callers are
/// expected to skip empty albums before asking for a threshold.
///
/// # Examples
///
/// ```
/// use songslike::algorithm::compute_lower_threshold;
///
/// assert_eq!(compute_lower_threshold(&[50, 52, 54, 56, 58]).unwrap(), 47);
/// assert_eq!(compute_lower_threshold(&[73]).unwrap(), 73);
/// ```
pub fn compute_lower_threshold(popularities: &[u32]) -> Result<u32> {
    match popularities {
        [] => Err(SelectionError::EmptyInput),
        [only] => Ok(*only),
        _ => {
            let mean = statistics::mean(popularities);
            let std_deviation = statistics::sample_std_deviation(popularities);
            let threshold = (mean - DEVIATIONS_BELOW_MEAN * std_deviation).floor();

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let threshold = threshold.max(0.0) as u32;
            Ok(threshold)
        }
    }
}

/// Builds the inclusive acceptance band for an album.
///
/// # Errors
///
/// Same as [`compute_lower_threshold`].
pub fn popularity_band(popularities: &[u32], max_popularity: u32) -> Result<PopularityBand> {
    let lower = compute_lower_threshold(popularities)?;
    log::trace!("Album band [{lower}, {max_popularity}] from {} tracks", popularities.len());
    Ok(PopularityBand {
        lower,
        upper: max_popularity,
    })
}

/// Track ids whose popularity falls inside `band`, in catalog order.
#[must_use]
pub fn qualifying_tracks(tracks: &[(TrackRef, u32)], band: PopularityBand) -> Vec<TrackRef> {
    tracks
        .iter()
        .filter(|(_, popularity)| band.contains(*popularity))
        .map(|(track, _)| track.clone())
        .collect()
}

/// Descriptive statistics over track popularities.
pub mod statistics {
    /// Arithmetic mean. Returns 0.0 for an empty slice.
    #[must_use]
    pub fn mean(values: &[u32]) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let count = values.len() as f64;
        values.iter().map(|&v| f64::from(v)).sum::<f64>() / count
    }

    /// Standard deviation with the N-1 denominator.
    /// Returns 0.0 when fewer than two samples are available.
    #[must_use]
    pub fn sample_std_deviation(values: &[u32]) -> f64 {
        if values.len() < 2 {
            return 0.0;
        }
        let mean = mean(values);
        #[allow(clippy::cast_precision_loss)]
        let denominator = (values.len() - 1) as f64;
        let variance = values
            .iter()
            .map(|&v| (f64::from(v) - mean).powi(2))
            .sum::<f64>()
            / denominator;
        variance.sqrt()
    }

    /// Summary of one album's popularity distribution, for display.
    #[derive(Debug, Clone, PartialEq)]
    pub struct PopularityStatistics {
        pub mean: f64,
        pub std_deviation: f64,
        pub min: u32,
        pub max: u32,
        pub count: usize,
    }

    /// Summarizes a popularity sample. `None` for an empty slice.
    #[must_use]
    pub fn analyze(values: &[u32]) -> Option<PopularityStatistics> {
        Some(PopularityStatistics {
            mean: mean(values),
            std_deviation: sample_std_deviation(values),
            min: *values.iter().min()?,
            max: *values.iter().max()?,
            count: values.len(),
        })
    }
}
