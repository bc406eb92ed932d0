// SPDX-FileCopyrightText: 2026 Dealcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Timing-window matching and frequency throttling.

use chrono::{DateTime, Datelike, Local, NaiveTime, TimeZone, Utc, Weekday};

use dealcast_core::types::Timing;

/// The instant a tick evaluates, split into the parts the rules look at.
///
/// Windows are wall-clock, so `weekday` and `time` come from the local zone
/// while `utc` is what gets persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickClock {
    pub utc: DateTime<Utc>,
    pub weekday: Weekday,
    pub time: NaiveTime,
}

impl TickClock {
    pub fn local_now() -> Self {
        Self::from_datetime(Local::now())
    }

    pub fn from_datetime<Tz: TimeZone>(at: DateTime<Tz>) -> Self {
        Self {
            utc: at.with_timezone(&Utc),
            weekday: at.weekday(),
            time: at.time(),
        }
    }
}

/// True if any window matches the clock's weekday and time.
pub fn window_open(timings: &[Timing], clock: &TickClock) -> bool {
    timings.iter().any(|t| t.is_match(clock.weekday, clock.time))
}

/// Minimum seconds between posts for a posts-per-hour frequency; `None` when unthrottled.
pub fn min_interval_secs(posting_frequency: u32) -> Option<f64> {
    (posting_frequency > 0).then(|| 3600.0 / f64::from(posting_frequency))
}

/// Whether the throttle lets a campaign post at `now`.
pub fn frequency_allows(
    posting_frequency: u32,
    last_post_time: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    let (Some(min_gap), Some(last)) = (min_interval_secs(posting_frequency), last_post_time) else {
        return true;
    };
    let elapsed = (now - last).num_milliseconds() as f64 / 1000.0;
    elapsed >= min_gap
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeDelta};
    use dealcast_core::types::TimingDay;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn window(day: TimingDay, start: NaiveTime, end: NaiveTime) -> Timing {
        Timing {
            id: 1,
            campaign_id: 1,
            day,
            start,
            end,
        }
    }

    fn clock(weekday: Weekday, time: NaiveTime) -> TickClock {
        TickClock {
            utc: Utc::now(),
            weekday,
            time,
        }
    }

    #[test]
    fn end_of_window_is_exclusive() {
        let timings = vec![window(TimingDay::Weekday(2), at(9, 0, 0), at(10, 0, 0))];
        assert!(window_open(&timings, &clock(Weekday::Wed, at(9, 59, 59))));
        assert!(!window_open(&timings, &clock(Weekday::Wed, at(10, 0, 0))));
        assert!(window_open(&timings, &clock(Weekday::Wed, at(9, 0, 0))));
        assert!(!window_open(&timings, &clock(Weekday::Thu, at(9, 30, 0))));
    }

    #[test]
    fn any_matching_window_opens() {
        let timings = vec![
            window(TimingDay::Weekday(0), at(8, 0, 0), at(9, 0, 0)),
            window(TimingDay::Daily, at(20, 0, 0), at(22, 0, 0)),
        ];
        assert!(window_open(&timings, &clock(Weekday::Sat, at(21, 0, 0))));
        assert!(!window_open(&timings, &clock(Weekday::Sat, at(8, 30, 0))));
        assert!(!window_open(&[], &clock(Weekday::Mon, at(8, 30, 0))));
    }

    #[test]
    fn throttle_uses_hourly_frequency() {
        let now = Utc::now();
        assert!(!frequency_allows(2, Some(now - TimeDelta::seconds(1000)), now));
        assert!(frequency_allows(2, Some(now - TimeDelta::seconds(1900)), now));
        assert!(frequency_allows(2, Some(now - TimeDelta::seconds(1800)), now));
    }

    #[test]
    fn unthrottled_or_never_posted_always_allows() {
        let now = Utc::now();
        assert!(frequency_allows(0, Some(now), now));
        assert!(frequency_allows(12, None, now));
        assert_eq!(min_interval_secs(0), None);
        assert_eq!(min_interval_secs(4), Some(900.0));
    }

    #[test]
    fn clock_keeps_local_wall_time() {
        let offset = FixedOffset::east_opt(2 * 3600).unwrap();
        let local = offset.with_ymd_and_hms(2026, 6, 1, 0, 30, 0).unwrap();
        let clock = TickClock::from_datetime(local);
        assert_eq!(clock.weekday, Weekday::Mon);
        assert_eq!(clock.time, at(0, 30, 0));
        assert_eq!(clock.utc.weekday(), Weekday::Sun);
    }
}
