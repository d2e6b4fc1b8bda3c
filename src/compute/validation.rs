//! Validation for query times and loaded samples.

use crate::compute::timeline::{MAX_BUCKET_SPAN, bucket_of};
use crate::error::{Result, SimtraceError};
use simtrace_types::path::EntityPath;
use simtrace_types::statistics::StatisticsSeries;

/// Validates a query time is a finite simulation clock value.
///
/// # Examples
///
/// ```
/// use simtrace::compute::validation::validate_time;
///
/// assert!(validate_time(12.5).is_ok());
/// assert!(validate_time(f64::NAN).is_err());
/// assert!(validate_time(f64::INFINITY).is_err());
/// ```
pub fn validate_time(t: f64) -> Result<()> {
    if !t.is_finite() {
        return Err(SimtraceError::InvalidInput(format!(
            "Time must be finite, got: {}",
            t
        )));
    }
    Ok(())
}

/// Validates a query window and orders its bounds.
///
/// # Examples
///
/// ```
/// use simtrace::compute::validation::normalize_window;
///
/// assert_eq!(normalize_window(10.0, 0.0).unwrap(), (0.0, 10.0));
/// assert!(normalize_window(0.0, f64::NAN).is_err());
/// ```
pub fn normalize_window(start: f64, end: f64) -> Result<(f64, f64)> {
    validate_time(start)?;
    validate_time(end)?;
    if start <= end {
        Ok((start, end))
    } else {
        Ok((end, start))
    }
}

/// Validates that an entity has an id, finite samples and a lifetime the
/// timeline can index.
pub fn validate_entity_path(entity: &EntityPath) -> Result<()> {
    if entity.id.is_empty() {
        return Err(SimtraceError::InvalidInput(
            "Entity id cannot be empty".into(),
        ));
    }

    if let Some(point) = entity
        .path
        .iter()
        .find(|p| !(p.clock.is_finite() && p.x.is_finite() && p.y.is_finite()))
    {
        return Err(SimtraceError::InvalidInput(format!(
            "Entity '{}' has a non-finite sample at clock {}",
            entity.id, point.clock
        )));
    }

    if let Some((first, last)) = entity.lifetime()
        && bucket_of(last).saturating_sub(bucket_of(first)) > MAX_BUCKET_SPAN
    {
        return Err(SimtraceError::InvalidInput(format!(
            "Entity '{}' lifetime [{}, {}] spans more than {} timeline buckets",
            entity.id, first, last, MAX_BUCKET_SPAN
        )));
    }

    Ok(())
}

/// Validates that every sample of a series has a finite time.
pub fn validate_series(series: &StatisticsSeries) -> Result<()> {
    if let Some(point) = series.time_series.iter().find(|p| !p.time.is_finite()) {
        return Err(SimtraceError::InvalidInput(format!(
            "Series '{}' has a non-finite sample time: {}",
            series.key(),
            point.time
        )));
    }
    Ok(())
}
