use chrono::{NaiveTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

/// Represents the interval a class section meets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn duration(&self) -> TimeDelta {
        self.end.signed_duration_since(self.start)
    }

    /// Parses a listing time such as `10:00-10:50`, ` 2:00- 3:20p` or `11:00-12:20p`.
    ///
    /// Only the end time carries a meridiem marker. A `p` moves an end hour before
    /// noon into the afternoon; if the interval then spans twelve hours or more the
    /// start must be in the afternoon too.
    ///
    /// # Returns
    /// `None` if either bound is not a valid `h:mm` time
    pub fn parse(raw: &str) -> Option<Self> {
        let (start, end) = raw.trim().split_once('-')?;
        let end = end.trim();

        let (end, pm) = match end.strip_suffix(['p', 'P']) {
            Some(end) => (end, true),
            None => (end.strip_suffix(['a', 'A']).unwrap_or(end), false),
        };

        let mut start = parse_clock(start)?;
        let mut end = parse_clock(end)?;

        if pm && end.hour() < 12 {
            end += TimeDelta::hours(12);
        }

        if end.signed_duration_since(start) >= TimeDelta::hours(12) {
            start += TimeDelta::hours(12);
        }

        Some(Self { start, end })
    }
}

/// Parses an `h:mm` clock reading without a meridiem marker
fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let (hour, minute) = raw.trim().split_once(':')?;
    let hour = hour.trim().parse().ok()?;
    let minute = minute.trim().parse().ok()?;

    NaiveTime::from_hms_opt(hour, minute, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(range: &TimeRange) -> ((u32, u32), (u32, u32)) {
        (
            (range.start.hour(), range.start.minute()),
            (range.end.hour(), range.end.minute()),
        )
    }

    #[test]
    fn test_morning_interval() {
        let range = TimeRange::parse("10:00-10:50").unwrap();
        assert_eq!(hm(&range), ((10, 0), (10, 50)));
        assert_eq!(range.duration(), TimeDelta::minutes(50));
    }

    #[test]
    fn test_afternoon_interval_moves_both_ends() {
        let range = TimeRange::parse(" 2:00- 3:20p").unwrap();
        assert_eq!(hm(&range), ((14, 0), (15, 20)));
    }

    #[test]
    fn test_interval_across_noon() {
        let range = TimeRange::parse("11:00-12:20p").unwrap();
        assert_eq!(hm(&range), ((11, 0), (12, 20)));

        let range = TimeRange::parse("11:00-1:50p").unwrap();
        assert_eq!(hm(&range), ((11, 0), (13, 50)));
    }

    #[test]
    fn test_explicit_morning_marker() {
        let range = TimeRange::parse(" 8:00- 9:20a").unwrap();
        assert_eq!(hm(&range), ((8, 0), (9, 20)));
    }

    #[test]
    fn test_malformed_time() {
        assert!(TimeRange::parse("TBA").is_none());
        assert!(TimeRange::parse("10:00").is_none());
        assert!(TimeRange::parse("ab:cd-10:50").is_none());
        assert!(TimeRange::parse("25:00-26:00").is_none());
    }
}
