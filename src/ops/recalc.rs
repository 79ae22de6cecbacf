//! Pure date math for the recalculation engine. Everything here is a function
//! of its arguments: no store access, no overlay mutation, no I/O.
//!
//! Dates are raw calendar days counted inclusively, so a one-day task starts
//! and finishes on the same date. The canonical duration unit is fractional
//! calendar days; hours convert at the boundary via [`days_from_hours`].

use chrono::{Duration, NaiveDate};

use crate::model::DependencyType;

/// Hours in one working day, the single unit-conversion constant
pub const HOURS_PER_DAY: f64 = 8.0;

/// Upper bound on any single span or lag, in calendar days (a century).
/// Keeps `chrono` date arithmetic in range no matter what the input field
/// held, so derivation can stay panic-free.
pub const MAX_SPAN_DAYS: i64 = 36_500;

/// A value that is either the result of a real computation or a fallback.
///
/// The recalculation contract never fails: bad input produces a usable
/// default. Callers that care (tests, audit surfaces) can still tell the two
/// apart; callers that don't just take [`Derived::value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Derived<T> {
    Computed(T),
    Defaulted(T),
}

impl<T> Derived<T> {
    pub fn value(self) -> T {
        match self {
            Derived::Computed(v) | Derived::Defaulted(v) => v,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Derived::Defaulted(_))
    }
}

/// Calendar-day span occupied by a duration: `ceil`, never below one day and
/// never above [`MAX_SPAN_DAYS`]. Non-finite input counts as one day.
pub fn span_days(duration_days: f64) -> i64 {
    if !duration_days.is_finite() {
        return 1;
    }
    (duration_days.ceil() as i64).clamp(1, MAX_SPAN_DAYS)
}

/// Finish date of a task given its start and duration (inclusive counting):
/// `start + ceil(duration) - 1` days.
pub fn finish_from_start(start: NaiveDate, duration_days: f64) -> NaiveDate {
    start + Duration::days(span_days(duration_days) - 1)
}

/// Duration covered by an inclusive date range. An inverted range (finish
/// before start) yields `Defaulted(1.0)` rather than a negative duration.
pub fn duration_from_range(start: NaiveDate, finish: NaiveDate) -> Derived<f64> {
    if finish < start {
        return Derived::Defaulted(1.0);
    }
    Derived::Computed(((finish - start).num_days() + 1) as f64)
}

/// Dates derived for a dependent task from its predecessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependentDates {
    pub start: NaiveDate,
    pub finish: NaiveDate,
}

/// Derive a dependent task's dates from its predecessor's dates, the link
/// type, and the lag (negative lag means lead/overlap). The duration span is
/// at least one day, so finish never precedes start.
pub fn dependent_dates(
    link: DependencyType,
    predecessor_start: NaiveDate,
    predecessor_finish: NaiveDate,
    lag_days: i64,
    duration_days: f64,
) -> DependentDates {
    let span = Duration::days(span_days(duration_days) - 1);
    let lag = Duration::days(lag_days.clamp(-MAX_SPAN_DAYS, MAX_SPAN_DAYS));
    match link {
        DependencyType::FS => {
            let start = predecessor_finish + lag + Duration::days(1);
            DependentDates {
                start,
                finish: start + span,
            }
        }
        DependencyType::SS => {
            let start = predecessor_start + lag;
            DependentDates {
                start,
                finish: start + span,
            }
        }
        DependencyType::FF => {
            let finish = predecessor_finish + lag;
            DependentDates {
                start: finish - span,
                finish,
            }
        }
        DependencyType::SF => {
            let finish = predecessor_start + lag;
            DependentDates {
                start: finish - span,
                finish,
            }
        }
    }
}

/// Aggregate dates and progress for a phase summary row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRollup {
    pub start: NaiveDate,
    pub finish: NaiveDate,
    /// Rounded arithmetic mean of child progress, 0..=100
    pub progress: u8,
}

/// Roll child `(start, finish, progress)` rows up into a phase aggregate:
/// earliest start, latest finish, mean progress. An empty child list returns
/// `None` so the caller leaves the phase untouched.
pub fn phase_rollup(
    children: impl IntoIterator<Item = (NaiveDate, NaiveDate, u8)>,
) -> Option<PhaseRollup> {
    let mut iter = children.into_iter();
    let (mut start, mut finish, first) = iter.next()?;
    let mut progress_sum = u32::from(first);
    let mut count = 1u32;
    for (s, f, p) in iter {
        start = start.min(s);
        finish = finish.max(f);
        progress_sum += u32::from(p);
        count += 1;
    }
    let progress = (f64::from(progress_sum) / f64::from(count)).round() as u8;
    Some(PhaseRollup {
        start,
        finish,
        progress,
    })
}

// ---------------------------------------------------------------------------
// Boundary parsers — raw field input to typed values, with explicit fallback
// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` date field, falling back to the given date
pub fn parse_date(raw: &str, fallback: NaiveDate) -> Derived<NaiveDate> {
    match NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d") {
        Ok(date) => Derived::Computed(date),
        Err(_) => Derived::Defaulted(fallback),
    }
}

/// Parse a duration field in days, falling back to one day
pub fn parse_days(raw: &str) -> Derived<f64> {
    match raw.trim().parse::<f64>() {
        Ok(days) if days.is_finite() && days > 0.0 => Derived::Computed(days),
        _ => Derived::Defaulted(1.0),
    }
}

/// Parse a lag field in days (negative allowed), falling back to zero
pub fn parse_lag(raw: &str) -> Derived<i64> {
    match raw.trim().parse::<i64>() {
        Ok(lag) => Derived::Computed(lag),
        Err(_) => Derived::Defaulted(0),
    }
}

/// Parse a dependency-type code, falling back to FS
pub fn parse_dependency_type(raw: &str) -> Derived<DependencyType> {
    match DependencyType::from_code(raw.trim()) {
        Some(link) => Derived::Computed(link),
        None => Derived::Defaulted(DependencyType::FS),
    }
}

/// Convert a work-effort estimate in hours to fractional days.
/// Non-positive or non-finite input counts as one day.
pub fn days_from_hours(hours: f64) -> f64 {
    if !hours.is_finite() || hours <= 0.0 {
        return 1.0;
    }
    hours / HOURS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // --- finish/duration derivation ---

    #[test]
    fn test_one_day_task_starts_and_finishes_same_day() {
        let s = date(2024, 1, 5);
        assert_eq!(finish_from_start(s, 1.0), s);
    }

    #[test]
    fn test_finish_from_start_rounds_fractional_days_up() {
        let s = date(2024, 1, 5);
        assert_eq!(finish_from_start(s, 2.5), date(2024, 1, 7));
        assert_eq!(finish_from_start(s, 0.25), s);
    }

    #[test]
    fn test_finish_from_start_bad_duration_counts_as_one_day() {
        let s = date(2024, 1, 5);
        assert_eq!(finish_from_start(s, f64::NAN), s);
        assert_eq!(finish_from_start(s, -3.0), s);
    }

    #[test]
    fn test_huge_duration_is_capped_not_a_panic() {
        let s = date(2024, 1, 1);
        // a parseable but absurd duration still yields a valid date
        let finish = finish_from_start(s, parse_days("1e12").value());
        assert_eq!(finish, s + Duration::days(MAX_SPAN_DAYS - 1));
        let finish = finish_from_start(s, f64::MAX);
        assert!(finish >= s);
    }

    #[test]
    fn test_huge_lag_is_capped_not_a_panic() {
        let d = dependent_dates(
            DependencyType::FS,
            date(2024, 1, 1),
            date(2024, 1, 3),
            i64::MAX,
            2.0,
        );
        assert_eq!(d.start, date(2024, 1, 4) + Duration::days(MAX_SPAN_DAYS));
        assert!(d.finish >= d.start);
    }

    #[test]
    fn test_duration_from_range_inclusive() {
        let d = duration_from_range(date(2024, 1, 1), date(2024, 1, 5));
        assert_eq!(d, Derived::Computed(5.0));
        let d = duration_from_range(date(2024, 1, 1), date(2024, 1, 1));
        assert_eq!(d, Derived::Computed(1.0));
    }

    #[test]
    fn test_duration_from_range_inverted_defaults_to_one() {
        let d = duration_from_range(date(2024, 1, 5), date(2024, 1, 1));
        assert_eq!(d, Derived::Defaulted(1.0));
        assert!(d.is_defaulted());
    }

    #[test]
    fn test_round_trip_duration_consistency() {
        let s = date(2024, 3, 1);
        for d in [1.0, 2.0, 2.5, 7.0, 0.5, 30.0] {
            let finish = finish_from_start(s, d);
            let back = duration_from_range(s, finish).value();
            assert_eq!(back, span_days(d) as f64, "duration {}", d);
        }
    }

    // --- dependent dates (worked examples from the link semantics) ---

    #[test]
    fn test_fs_link_zero_lag() {
        let d = dependent_dates(
            DependencyType::FS,
            date(2024, 1, 8),
            date(2024, 1, 10),
            0,
            3.0,
        );
        assert_eq!(d.start, date(2024, 1, 11));
        assert_eq!(d.finish, date(2024, 1, 13));
    }

    #[test]
    fn test_ss_link_with_lag() {
        let d = dependent_dates(
            DependencyType::SS,
            date(2024, 1, 1),
            date(2024, 1, 4),
            2,
            5.0,
        );
        assert_eq!(d.start, date(2024, 1, 3));
        assert_eq!(d.finish, date(2024, 1, 7));
    }

    #[test]
    fn test_ff_link_with_lead() {
        let d = dependent_dates(
            DependencyType::FF,
            date(2024, 1, 15),
            date(2024, 1, 20),
            -1,
            4.0,
        );
        assert_eq!(d.finish, date(2024, 1, 19));
        assert_eq!(d.start, date(2024, 1, 16));
    }

    #[test]
    fn test_sf_link_anchors_finish_to_predecessor_start() {
        let d = dependent_dates(
            DependencyType::SF,
            date(2024, 2, 10),
            date(2024, 2, 14),
            0,
            3.0,
        );
        assert_eq!(d.finish, date(2024, 2, 10));
        assert_eq!(d.start, date(2024, 2, 8));
    }

    #[test]
    fn test_dependent_finish_never_precedes_start() {
        let links = [
            DependencyType::FS,
            DependencyType::SS,
            DependencyType::FF,
            DependencyType::SF,
        ];
        let durations = [0.1, 1.0, 2.5, 10.0, -4.0, f64::NAN];
        for link in links {
            for lag in [-10i64, -1, 0, 1, 10] {
                for dur in durations {
                    let d = dependent_dates(link, date(2024, 6, 1), date(2024, 6, 8), lag, dur);
                    assert!(
                        d.finish >= d.start,
                        "{:?} lag={} dur={}: {:?}",
                        link,
                        lag,
                        dur,
                        d
                    );
                }
            }
        }
    }

    // --- phase rollup ---

    #[test]
    fn test_phase_rollup_spans_children_and_averages_progress() {
        let agg = phase_rollup([
            (date(2024, 2, 1), date(2024, 2, 5), 40),
            (date(2024, 2, 3), date(2024, 2, 10), 80),
        ])
        .unwrap();
        assert_eq!(agg.start, date(2024, 2, 1));
        assert_eq!(agg.finish, date(2024, 2, 10));
        assert_eq!(agg.progress, 60);
    }

    #[test]
    fn test_phase_rollup_rounds_mean_progress() {
        let agg = phase_rollup([
            (date(2024, 2, 1), date(2024, 2, 1), 33),
            (date(2024, 2, 1), date(2024, 2, 1), 33),
            (date(2024, 2, 1), date(2024, 2, 1), 34),
        ])
        .unwrap();
        assert_eq!(agg.progress, 33);
    }

    #[test]
    fn test_phase_rollup_empty_is_none() {
        assert_eq!(phase_rollup(Vec::<(NaiveDate, NaiveDate, u8)>::new()), None);
    }

    // --- boundary parsers ---

    #[test]
    fn test_parse_date_fallback() {
        let today = date(2024, 5, 1);
        assert_eq!(
            parse_date("2024-05-09", today),
            Derived::Computed(date(2024, 5, 9))
        );
        assert_eq!(parse_date("not a date", today), Derived::Defaulted(today));
        assert_eq!(parse_date("", today), Derived::Defaulted(today));
    }

    #[test]
    fn test_parse_days_fallback() {
        assert_eq!(parse_days("2.5"), Derived::Computed(2.5));
        assert_eq!(parse_days("0"), Derived::Defaulted(1.0));
        assert_eq!(parse_days("-2"), Derived::Defaulted(1.0));
        assert_eq!(parse_days("soon"), Derived::Defaulted(1.0));
    }

    #[test]
    fn test_parse_lag_allows_negative() {
        assert_eq!(parse_lag("-3"), Derived::Computed(-3));
        assert_eq!(parse_lag("x"), Derived::Defaulted(0));
    }

    #[test]
    fn test_parse_dependency_type_fallback() {
        assert_eq!(
            parse_dependency_type("FF"),
            Derived::Computed(DependencyType::FF)
        );
        assert_eq!(
            parse_dependency_type("XX"),
            Derived::Defaulted(DependencyType::FS)
        );
    }

    #[test]
    fn test_days_from_hours() {
        assert_eq!(days_from_hours(8.0), 1.0);
        assert_eq!(days_from_hours(20.0), 2.5);
        assert_eq!(days_from_hours(0.0), 1.0);
        assert_eq!(days_from_hours(f64::NAN), 1.0);
    }
}
