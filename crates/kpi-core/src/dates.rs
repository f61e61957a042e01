// File: crates/kpi-core/src/dates.rs
// Summary: Day arithmetic and nearest-date-at-or-before lookup over sorted points.

use chrono::{DateTime, Utc};

use crate::series::Point;

/// Whole days between two instants, order-insensitive.
pub fn days_between(a: DateTime<Utc>, b: DateTime<Utc>) -> i64 {
    (b - a).num_days().abs()
}

/// Point with the latest `x <= target` in an ascending array; `default` when none qualifies.
/// An exact date match returns immediately.
pub fn nearest_at_or_before<'a>(points: &'a [Point], target: Option<DateTime<Utc>>, default: Option<&'a Point>) -> Option<&'a Point> {
    let Some(target) = target else { return default };
    let mut found = None;
    for p in points {
        if p.x == target {
            return Some(p);
        }
        if p.x > target {
            break;
        }
        found = Some(p);
    }
    found.or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn days_are_whole_and_unsigned() {
        assert_eq!(days_between(day(1), day(11)), 10);
        assert_eq!(days_between(day(11), day(1)), 10);
    }

    #[test]
    fn picks_latest_point_before_target() {
        let pts = vec![Point::new(0, day(1), 1.0), Point::new(1, day(3), 2.0), Point::new(2, day(5), 3.0)];
        let got = nearest_at_or_before(&pts, Some(day(4)), None).unwrap();
        assert_eq!(got.x, day(3));
    }

    #[test]
    fn missing_target_uses_default() {
        let pts = vec![Point::new(0, day(2), 1.0)];
        let got = nearest_at_or_before(&pts, None, pts.first()).unwrap();
        assert_eq!(got.index, 0);
        assert!(nearest_at_or_before(&[], Some(day(2)), None).is_none());
    }

    #[test]
    fn target_before_every_point_uses_default() {
        let pts = vec![Point::new(0, day(2), 1.0)];
        let fallback = Point::new(99, day(20), 7.0);
        let got = nearest_at_or_before(&pts, Some(day(1)), Some(&fallback)).unwrap();
        assert_eq!(got.index, 99);
    }

    #[test]
    fn exact_match_is_returned() {
        let pts = vec![Point::new(0, day(2), 1.0), Point::new(1, day(4), 2.0)];
        let fallback = Point::new(99, day(20), 7.0);
        let got = nearest_at_or_before(&pts, Some(day(4)), Some(&fallback)).unwrap();
        assert_eq!(got.index, 1);
        assert_eq!(got.x, day(4));
    }
}
