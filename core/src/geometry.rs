//! Stateless vector and timing helpers shared by the world and systems.

use std::time::Duration;

use glam::Vec2;

/// Euclidean distance between two points.
#[must_use]
pub fn distance(a: Vec2, b: Vec2) -> f32 {
    a.distance(b)
}

/// Unit vector pointing along `v`; the zero vector stays zero.
#[must_use]
pub fn normalize(v: Vec2) -> Vec2 {
    v.normalize_or_zero()
}

/// Restricts `value` to the inclusive range `[lo, hi]`.
#[must_use]
pub fn clamp(value: f32, lo: f32, hi: f32) -> f32 {
    value.max(lo).min(hi)
}

/// Linear interpolation between `a` and `b`; `t` is clamped to `[0, 1]`.
#[must_use]
pub fn lerp(a: Vec2, b: Vec2, t: f32) -> Vec2 {
    a.lerp(b, clamp(t, 0.0, 1.0))
}

/// Moves `from` towards `to` by at most `max_step` units.
///
/// Returns the new position together with a flag reporting whether `to` was
/// reached. A non-positive step leaves the position unchanged.
#[must_use]
pub fn move_towards(from: Vec2, to: Vec2, max_step: f32) -> (Vec2, bool) {
    let offset = to - from;
    let remaining = offset.length();
    if remaining <= max_step {
        return (to, true);
    }
    if max_step <= 0.0 {
        return (from, false);
    }
    (from + offset / remaining * max_step, false)
}

/// Shortest distance between `point` and the segment `start..end`.
#[must_use]
pub fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(start);
    }
    let t = clamp((point - start).dot(segment) / length_squared, 0.0, 1.0);
    point.distance(start + segment * t)
}

/// Converts seconds to a [`Duration`] rounded to whole microseconds.
///
/// Negative, NaN and infinite inputs collapse to zero.
#[must_use]
pub fn seconds(value: f32) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::from_micros((f64::from(value) * 1e6).round() as u64)
    } else {
        Duration::ZERO
    }
}

/// Scales a duration by a non-negative factor, rounding to whole microseconds.
#[must_use]
pub fn scale_duration(duration: Duration, factor: f32) -> Duration {
    if !factor.is_finite() || factor <= 0.0 {
        return Duration::ZERO;
    }
    let micros = (duration.as_micros() as f64 * f64::from(factor)).round();
    Duration::from_micros(micros as u64)
}

/// Multiplies an integer stat by `factor` and floors the result.
///
/// The product is formed in double precision with a small tolerance so that
/// factors such as `1.4` do not floor `10 * 1.4` down to `13`.
#[must_use]
pub fn scale_floor(value: u32, factor: f32) -> u32 {
    if !factor.is_finite() || factor <= 0.0 {
        return 0;
    }
    let scaled = f64::from(value) * f64::from(factor) + 1e-4;
    scaled.floor().min(f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_keeps_zero_vector() {
        assert_eq!(normalize(Vec2::ZERO), Vec2::ZERO);
        let unit = normalize(Vec2::new(3.0, 4.0));
        assert!((unit.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn move_towards_stops_at_destination() {
        let (position, arrived) = move_towards(Vec2::ZERO, Vec2::new(10.0, 0.0), 4.0);
        assert_eq!(position, Vec2::new(4.0, 0.0));
        assert!(!arrived);

        let (position, arrived) = move_towards(position, Vec2::new(10.0, 0.0), 100.0);
        assert_eq!(position, Vec2::new(10.0, 0.0));
        assert!(arrived);
    }

    #[test]
    fn lerp_clamps_parameter() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 20.0);
        assert_eq!(lerp(a, b, 0.5), Vec2::new(5.0, 10.0));
        assert_eq!(lerp(a, b, 2.0), b);
        assert_eq!(lerp(a, b, -1.0), a);
    }

    #[test]
    fn segment_distance_projects_onto_segment() {
        let start = Vec2::new(0.0, 0.0);
        let end = Vec2::new(10.0, 0.0);
        assert!((distance_to_segment(Vec2::new(5.0, 3.0), start, end) - 3.0).abs() < 1e-6);
        assert!((distance_to_segment(Vec2::new(13.0, 4.0), start, end) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn invalid_seconds_collapse_to_zero() {
        assert_eq!(seconds(-0.5), Duration::ZERO);
        assert_eq!(seconds(f32::NAN), Duration::ZERO);
        assert_eq!(seconds(f32::INFINITY), Duration::ZERO);
        assert_eq!(seconds(0.25), Duration::from_millis(250));
        assert_eq!(seconds(0.1), Duration::from_millis(100));
    }

    #[test]
    fn scaled_integers_floor_without_float_drift() {
        assert_eq!(scale_floor(10, 1.4), 14);
        assert_eq!(scale_floor(100, 0.75), 75);
        assert_eq!(scale_floor(75, 0.75), 56);
        assert_eq!(scale_floor(7, -2.0), 0);
    }

    #[test]
    fn durations_scale_by_factor() {
        assert_eq!(
            scale_duration(Duration::from_secs(2), 0.9),
            Duration::from_millis(1800)
        );
        assert_eq!(scale_duration(Duration::from_secs(2), -1.0), Duration::ZERO);
    }
}
