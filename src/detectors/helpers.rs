//! Common helper functions for pattern detection
//!
//! Canonical thresholds and the window utilities shared across detector
//! modules. The peak finder and line fit live here because the trend-line
//! detector depends on their exact tie-breaking behavior.

// ============================================================
// CANONICAL THRESHOLDS
// ============================================================

/// Body is small relative to range: body <= range * BODY_SMALL_RATIO
pub const BODY_SMALL_RATIO: f64 = 0.3;
/// A dominant wick must exceed body * WICK_DOMINANCE_FACTOR
pub const WICK_DOMINANCE_FACTOR: f64 = 2.0;
/// Tolerance band under the fitted trend line: close >= trend_y * TREND_BREAK_TOLERANCE
pub const TREND_BREAK_TOLERANCE: f64 = 0.995;
/// Cup rims must agree within this fraction of the left rim
pub const RIM_SYMMETRY_RATIO: f64 = 0.05;
/// Handle pullback must stay shallower than cup_height / HANDLE_DEPTH_DIVISOR
pub const HANDLE_DEPTH_DIVISOR: f64 = 3.0;

// Default window parameters
pub const DEFAULT_BREAKOUT_LOOKBACK: usize = 60;
pub const DEFAULT_TREND_LOOKBACK: usize = 40;
pub const DEFAULT_PEAK_DISTANCE: usize = 3;
pub const DEFAULT_CUP_WINDOW: usize = 30;
pub const DEFAULT_HANDLE_WINDOW: usize = 5;

// ============================================================
// BODY/RANGE COMPARISONS (zero-range safe)
// ============================================================

/// body <= range * max_ratio, in cross-multiplied form.
/// A zero-range bar never satisfies the comparison.
#[inline]
pub fn is_body_at_most(body: f64, range: f64, max_ratio: f64) -> bool {
    range > 0.0 && body <= range * max_ratio
}

/// body < range * max_ratio (strict), in cross-multiplied form.
/// A zero-range bar never satisfies the comparison.
#[inline]
pub fn is_body_under(body: f64, range: f64, max_ratio: f64) -> bool {
    range > 0.0 && body < range * max_ratio
}

/// wick > body * factor - the "long wick" side of hammer-family shapes.
#[inline]
pub fn is_wick_dominant(wick: f64, body: f64, factor: f64) -> bool {
    wick > body * factor
}

// ============================================================
// WINDOW EXTREMA
// ============================================================

/// Highest high over a window. None for an empty window.
#[inline]
pub fn window_high_max<T: crate::Ohlc>(bars: &[T]) -> Option<f64> {
    bars.iter().map(|b| b.high()).reduce(f64::max)
}

/// Lowest low over a window with its index; ties keep the first index.
/// None for an empty window.
#[inline]
pub fn window_low_argmin<T: crate::Ohlc>(bars: &[T]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (i, bar) in bars.iter().enumerate() {
        let low = bar.low();
        match best {
            Some((_, b)) if b <= low => {}
            _ => best = Some((i, low)),
        }
    }
    best
}

// ============================================================
// PEAK FINDING
// ============================================================

/// Find indices of local maxima in `values`, suppressing near-duplicate
/// peaks closer than `min_distance` samples.
///
/// A local maximum is strictly higher than its immediate neighbours;
/// a plateau of equal highs reports its first index. When two peaks are
/// closer than `min_distance`, the higher one survives (earlier index on
/// equal height). Endpoints never qualify.
pub fn find_peaks(values: &[f64], min_distance: usize) -> Vec<usize> {
    let n = values.len();
    if n < 3 {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    let mut i = 1;
    while i < n - 1 {
        if values[i] > values[i - 1] {
            // Walk a plateau of equal values; the candidate is its first index.
            let mut j = i;
            while j + 1 < n && values[j + 1] == values[i] {
                j += 1;
            }
            if j + 1 < n && values[j + 1] < values[i] {
                candidates.push(i);
            }
            i = j + 1;
        } else {
            i += 1;
        }
    }

    if min_distance <= 1 || candidates.len() < 2 {
        return candidates;
    }

    // Taller peaks win the separation contest; ties go to the earlier index.
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        values[candidates[b]]
            .partial_cmp(&values[candidates[a]])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(candidates[a].cmp(&candidates[b]))
    });

    let mut keep = vec![true; candidates.len()];
    for &oi in &order {
        if !keep[oi] {
            continue;
        }
        for (k, &cand) in candidates.iter().enumerate() {
            if k != oi && keep[k] && cand.abs_diff(candidates[oi]) < min_distance {
                keep[k] = false;
            }
        }
    }

    candidates
        .into_iter()
        .zip(keep)
        .filter_map(|(c, k)| k.then_some(c))
        .collect()
}

// ============================================================
// LEAST-SQUARES LINE FIT
// ============================================================

/// First-degree least-squares fit through `(x, y)` points, minimizing
/// squared vertical residuals. Returns `(slope, intercept)`, or None for
/// fewer than 2 points or a degenerate x spread.
pub fn linear_fit(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|p| p.0).sum();
    let sum_y: f64 = points.iter().map(|p| p.1).sum();
    let sum_xy: f64 = points.iter().map(|p| p.0 * p.1).sum();
    let sum_x2: f64 = points.iter().map(|p| p.0 * p.0).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom.abs() <= f64::EPSILON {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    let intercept = (sum_y - slope * sum_x) / n;
    Some((slope, intercept))
}

// ============================================================
// TESTS
// ============================================================
