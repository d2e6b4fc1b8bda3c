//! Bracketing and linear interpolation over time-ordered samples.

/// Where a query time falls relative to a sorted sequence of samples.
#[derive(Debug, PartialEq)]
pub enum Bracket<'a, P> {
    /// Before the first sample
    Before(&'a P),
    /// After the last sample
    After(&'a P),
    /// On a sample's time; the first sample with that time
    Exact(&'a P),
    /// Strictly between two consecutive samples
    Between(&'a P, &'a P),
}

/// Locate `t` in `samples`, which must be sorted ascending by `time_of`.
///
/// Returns `None` for an empty slice or a NaN `t`.
pub fn bracket<P, F>(samples: &[P], t: f64, time_of: F) -> Option<Bracket<'_, P>>
where
    F: Fn(&P) -> f64,
{
    if t.is_nan() {
        return None;
    }

    let first = samples.first()?;
    let last = samples.last()?;

    if t < time_of(first) {
        return Some(Bracket::Before(first));
    }
    if t > time_of(last) {
        return Some(Bracket::After(last));
    }

    // First index whose time is >= t; in bounds because t <= last.
    let idx = samples.partition_point(|s| time_of(s) < t);
    let at = &samples[idx];
    if time_of(at) == t {
        return Some(Bracket::Exact(at));
    }

    // t > first, so idx > 0.
    Some(Bracket::Between(&samples[idx - 1], at))
}

/// Position of `t` between `t0` and `t1` as a fraction in `[0, 1]`.
#[inline]
pub fn fraction(t0: f64, t1: f64, t: f64) -> f64 {
    let span = t1 - t0;
    if span <= 0.0 {
        0.0
    } else {
        ((t - t0) / span).clamp(0.0, 1.0)
    }
}

/// Linear interpolation between `a` and `b`.
#[inline]
pub fn lerp(a: f64, b: f64, fraction: f64) -> f64 {
    a + (b - a) * fraction
}
