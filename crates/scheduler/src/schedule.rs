use crate::error::SchedulerError;
use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveTime, TimeZone, Weekday};
use configuration::ScheduleConfig;

/// How many weeks ahead `next_after` looks for a valid local time.
const SEARCH_WEEKS: i64 = 53;

/// A weekly trigger at a wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeeklySchedule {
    weekday: Weekday,
    time: NaiveTime,
}

impl WeeklySchedule {
    pub fn new(weekday: Weekday, hour: u32, minute: u32) -> Result<Self, SchedulerError> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or(SchedulerError::InvalidTime { hour, minute })?;
        Ok(Self { weekday, time })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self, SchedulerError> {
        Self::new(config.weekday, config.hour, config.minute)
    }

    pub fn weekday(&self) -> Weekday {
        self.weekday
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }

    /// The first trigger strictly after `now`, in `now`'s time zone.
    ///
    /// A trigger that falls into a skipped local hour (a DST gap) is skipped;
    /// a repeated local hour fires once, at its earlier instant.
    pub fn next_after<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let today = now.date_naive();
        let days_ahead = (i64::from(self.weekday.num_days_from_monday())
            - i64::from(today.weekday().num_days_from_monday()))
        .rem_euclid(7);

        (0..SEARCH_WEEKS).find_map(|week| {
            let date = today + Duration::days(days_ahead + 7 * week);
            let candidate = match tz.from_local_datetime(&date.and_time(self.time)) {
                LocalResult::Single(at) => at,
                LocalResult::Ambiguous(earliest, _) => earliest,
                LocalResult::None => return None,
            };
            (candidate > *now).then_some(candidate)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn at(offset_hours: i32, y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(offset_hours * 3600)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
    }

    #[test]
    fn rejects_out_of_range_times() {
        assert_eq!(
            WeeklySchedule::new(Weekday::Mon, 24, 0),
            Err(SchedulerError::InvalidTime { hour: 24, minute: 0 })
        );
        assert!(WeeklySchedule::new(Weekday::Mon, 9, 60).is_err());
    }

    #[test]
    fn mid_week_rolls_to_next_monday() {
        let schedule = WeeklySchedule::new(Weekday::Mon, 9, 0).unwrap();
        // 2025-01-01 is a Wednesday.
        let next = schedule.next_after(&at(-3, 2025, 1, 1, 10, 0)).unwrap();
        assert_eq!(next, at(-3, 2025, 1, 6, 9, 0));
    }

    #[test]
    fn same_day_before_the_trigger_fires_today() {
        let schedule = WeeklySchedule::new(Weekday::Mon, 9, 0).unwrap();
        let next = schedule.next_after(&at(0, 2025, 1, 6, 8, 59)).unwrap();
        assert_eq!(next, at(0, 2025, 1, 6, 9, 0));
    }

    #[test]
    fn exactly_at_the_trigger_waits_a_week() {
        let schedule = WeeklySchedule::new(Weekday::Mon, 9, 0).unwrap();
        let next = schedule.next_after(&at(0, 2025, 1, 6, 9, 0)).unwrap();
        assert_eq!(next, at(0, 2025, 1, 13, 9, 0));
    }

    #[test]
    fn keeps_the_callers_offset() {
        let schedule = WeeklySchedule::new(Weekday::Sun, 23, 30).unwrap();
        let next = schedule.next_after(&at(5, 2025, 1, 1, 0, 0)).unwrap();
        assert_eq!(next.offset(), &FixedOffset::east_opt(5 * 3600).unwrap());
        assert_eq!(next.weekday(), Weekday::Sun);
        assert_eq!(next, at(5, 2025, 1, 5, 23, 30));
    }
}
