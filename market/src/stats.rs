//! Summary statistics over a ticker's deltas.

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: i128 = values.iter().map(|v| i128::from(*v)).sum();
    Some(sum as f64 / values.len() as f64)
}

/// Middle value of the sorted input; the average of the two middle values
/// for an even count.
pub fn median(values: &[i64]) -> Option<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    median_sorted(&sorted)
}

fn median_sorted(sorted: &[i64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        return Some(sorted[n / 2] as f64);
    }
    let lo = i128::from(sorted[n / 2 - 1]);
    let hi = i128::from(sorted[n / 2]);
    Some((lo + hi) as f64 / 2.0)
}

/// Percentile `p` in `[0, 100]` of a sorted slice, linearly interpolated
/// between the closest ranks:
///
/// ```text
/// rank = p / 100 * (n - 1)
/// q    = x[floor(rank)] + (x[ceil(rank)] - x[floor(rank)]) * frac(rank)
/// ```
pub fn percentile_sorted(sorted: &[i64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&p) {
        return None;
    }

    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let lo_v = sorted[lo] as f64;
    let hi_v = sorted[hi] as f64;

    Some(lo_v + (hi_v - lo_v) * (rank - lo as f64))
}

/// Everything reported about one ticker's deltas in a cycle.
#[derive(Clone, Debug, PartialEq)]
pub struct DeltaSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub max: i64,
    pub min: i64,

    /// 5th percentile. Logged, not written to the stats file.
    pub p5: f64,

    /// 95th percentile. Logged, not written to the stats file.
    pub p95: f64,
}

impl DeltaSummary {
    /// `None` when there are no deltas to summarise.
    pub fn from_values(values: &[i64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_unstable();

        let (&min, &max) = (sorted.first()?, sorted.last()?);

        Some(Self {
            count: sorted.len(),
            mean: mean(&sorted)?,
            median: median_sorted(&sorted)?,
            max,
            min,
            p5: percentile_sorted(&sorted, 5.0)?,
            p95: percentile_sorted(&sorted, 95.0)?,
        })
    }
}
