//! Market calendar resolution.
//!
//! Decides whether the market is open at a given instant by combining the
//! weekly schedule table with the holiday-exception table. The decision is a
//! pure function over rows already fetched from the database, which keeps it
//! directly testable; the engine supplies fresh rows per call.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use core_types::{HolidaySession, MarketHolidayEntry, MarketScheduleEntry};
use serde::{Deserialize, Serialize};

/// Why the open/closed verdict came out the way it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateReason {
    /// A holiday row with session type `closed` decided the outcome.
    Holiday,
    /// The weekly schedule decided the outcome (including the case where no
    /// schedule row exists for the weekday).
    Schedule,
}

/// Which session window the instant falls in, derived from the schedule
/// row's extended-hours bounds. Informational only: trading is gated purely
/// on the regular session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionLabel {
    PreMarket,
    Regular,
    AfterHours,
    Closed,
}

/// The resolver's verdict for one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketStatus {
    pub open: bool,
    pub reason: GateReason,
    pub session: SessionLabel,
}

/// Maps a calendar date to the schedule table's weekday key
/// (0 = Sunday .. 6 = Saturday).
pub fn weekday_index(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_sunday() as i16
}

/// The market calendar resolver for one operating timezone.
#[derive(Debug, Clone, Copy)]
pub struct MarketCalendar {
    offset: FixedOffset,
}

impl MarketCalendar {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Builds a resolver from a UTC offset in minutes (east positive).
    /// Returns `None` when the offset is out of range for a real timezone.
    pub fn from_offset_minutes(minutes: i32) -> Option<Self> {
        FixedOffset::east_opt(minutes * 60).map(Self::new)
    }

    /// The calendar date of `instant` in the operating timezone. Holiday
    /// lookups key on this date, not the UTC date.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Decides whether the market is open at `instant`.
    ///
    /// Precedence: a holiday row of type `closed` for the local calendar
    /// date wins outright. Otherwise the weekday's schedule row decides; a
    /// missing row, or a row with either regular bound unset, means the
    /// market simply does not trade that day. The regular session window is
    /// inclusive of the open minute and exclusive of the close minute.
    pub fn status_at(
        &self,
        instant: DateTime<Utc>,
        schedule: &[MarketScheduleEntry],
        holidays: &[MarketHolidayEntry],
    ) -> MarketStatus {
        let local = instant.with_timezone(&self.offset);
        let date = local.date_naive();

        let closed_holiday = holidays.iter().any(|h| {
            h.holiday_date == date && h.session_type == HolidaySession::Closed.as_str()
        });
        if closed_holiday {
            return MarketStatus {
                open: false,
                reason: GateReason::Holiday,
                session: SessionLabel::Closed,
            };
        }

        let row = schedule.iter().find(|r| r.weekday == weekday_index(date));
        let (open_time, close_time) = match row {
            Some(r) => match (r.open_time, r.close_time) {
                (Some(open), Some(close)) => (open, close),
                // A schedule row with either bound unset is a non-trading
                // day, not an error.
                _ => {
                    return MarketStatus {
                        open: false,
                        reason: GateReason::Schedule,
                        session: SessionLabel::Closed,
                    };
                }
            },
            None => {
                return MarketStatus {
                    open: false,
                    reason: GateReason::Schedule,
                    session: SessionLabel::Closed,
                };
            }
        };

        let now = local.time();
        let open = now >= open_time && now < close_time;

        let session = if open {
            SessionLabel::Regular
        } else if matches!(row.and_then(|r| r.premarket_open), Some(pre) if now >= pre && now < open_time)
        {
            // Pre-market closes at the regular open by definition.
            SessionLabel::PreMarket
        } else if matches!(row.and_then(|r| r.afterhours_close), Some(after) if now >= close_time && now < after)
        {
            // After-hours opens at the regular close by definition.
            SessionLabel::AfterHours
        } else {
            SessionLabel::Closed
        };

        MarketStatus {
            open,
            reason: GateReason::Schedule,
            session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn utc(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, 0)
            .unwrap()
    }

    fn t(hour: u32, min: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, min, 0).unwrap()
    }

    fn weekday_row(weekday: i16) -> MarketScheduleEntry {
        MarketScheduleEntry {
            weekday,
            open_time: Some(t(9, 30)),
            close_time: Some(t(16, 0)),
            premarket_open: Some(t(4, 0)),
            afterhours_close: Some(t(20, 0)),
            notes: None,
        }
    }

    /// Monday..Friday regular sessions, weekend rows absent.
    fn weekly_schedule() -> Vec<MarketScheduleEntry> {
        (1..=5).map(weekday_row).collect()
    }

    fn holiday(date: NaiveDate, session_type: &str) -> MarketHolidayEntry {
        MarketHolidayEntry {
            holiday_date: date,
            description: "test holiday".to_string(),
            session_type: session_type.to_string(),
        }
    }

    fn cal() -> MarketCalendar {
        MarketCalendar::new(FixedOffset::east_opt(0).unwrap())
    }

    #[test]
    fn weekday_index_is_sunday_based() {
        // 2026-08-23 is a Sunday.
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2026, 8, 23).unwrap()), 0);
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()), 1);
        assert_eq!(weekday_index(NaiveDate::from_ymd_opt(2026, 8, 29).unwrap()), 6);
    }

    #[test]
    fn open_during_regular_session() {
        // 2026-08-24 is a Monday.
        let status = cal().status_at(utc(2026, 8, 24, 12, 0), &weekly_schedule(), &[]);
        assert!(status.open);
        assert_eq!(status.reason, GateReason::Schedule);
        assert_eq!(status.session, SessionLabel::Regular);
    }

    #[test]
    fn open_boundary_is_inclusive_close_boundary_is_exclusive() {
        let schedule = weekly_schedule();
        assert!(cal().status_at(utc(2026, 8, 24, 9, 30), &schedule, &[]).open);
        assert!(cal().status_at(utc(2026, 8, 24, 15, 59), &schedule, &[]).open);
        assert!(!cal().status_at(utc(2026, 8, 24, 16, 0), &schedule, &[]).open);
        assert!(!cal().status_at(utc(2026, 8, 24, 9, 29), &schedule, &[]).open);
    }

    #[test]
    fn missing_weekday_row_means_closed_not_error() {
        // 2026-08-29 is a Saturday; the weekly schedule has no row for it.
        let status = cal().status_at(utc(2026, 8, 29, 12, 0), &weekly_schedule(), &[]);
        assert!(!status.open);
        assert_eq!(status.reason, GateReason::Schedule);
    }

    #[test]
    fn unset_open_time_means_closed_that_day() {
        let mut row = weekday_row(1);
        row.open_time = None;
        let status = cal().status_at(utc(2026, 8, 24, 12, 0), &[row], &[]);
        assert!(!status.open);
        assert_eq!(status.reason, GateReason::Schedule);
    }

    #[test]
    fn closed_holiday_wins_over_schedule() {
        let holidays = vec![holiday(
            NaiveDate::from_ymd_opt(2026, 8, 24).unwrap(),
            "closed",
        )];
        let status = cal().status_at(utc(2026, 8, 24, 12, 0), &weekly_schedule(), &holidays);
        assert!(!status.open);
        assert_eq!(status.reason, GateReason::Holiday);
        assert_eq!(status.session, SessionLabel::Closed);
    }

    #[test]
    fn early_close_holiday_is_recorded_but_not_enforced() {
        let holidays = vec![holiday(
            NaiveDate::from_ymd_opt(2026, 8, 24).unwrap(),
            "early_close",
        )];
        let status = cal().status_at(utc(2026, 8, 24, 15, 0), &weekly_schedule(), &holidays);
        assert!(status.open);
        assert_eq!(status.reason, GateReason::Schedule);
    }

    #[test]
    fn holiday_on_another_date_has_no_effect() {
        let holidays = vec![holiday(
            NaiveDate::from_ymd_opt(2026, 8, 25).unwrap(),
            "closed",
        )];
        assert!(
            cal()
                .status_at(utc(2026, 8, 24, 12, 0), &weekly_schedule(), &holidays)
                .open
        );
    }

    #[test]
    fn session_labels_cover_extended_hours() {
        let schedule = weekly_schedule();
        let c = cal();
        assert_eq!(
            c.status_at(utc(2026, 8, 24, 5, 0), &schedule, &[]).session,
            SessionLabel::PreMarket
        );
        assert_eq!(
            c.status_at(utc(2026, 8, 24, 17, 0), &schedule, &[]).session,
            SessionLabel::AfterHours
        );
        assert_eq!(
            c.status_at(utc(2026, 8, 24, 22, 0), &schedule, &[]).session,
            SessionLabel::Closed
        );
        assert_eq!(
            c.status_at(utc(2026, 8, 24, 3, 0), &schedule, &[]).session,
            SessionLabel::Closed
        );
    }

    #[test]
    fn offset_shifts_both_date_and_minute_of_day() {
        // UTC-5: 14:30 UTC on Monday is 09:30 local, exactly the open.
        let est = MarketCalendar::from_offset_minutes(-300).unwrap();
        let schedule = weekly_schedule();
        assert!(est.status_at(utc(2026, 8, 24, 14, 30), &schedule, &[]).open);
        // 02:00 UTC on Saturday is still Friday 21:00 local; the Friday row
        // exists but the regular session is over.
        let late = est.status_at(utc(2026, 8, 29, 2, 0), &schedule, &[]);
        assert!(!late.open);
        assert_eq!(late.reason, GateReason::Schedule);
        // A closed holiday on the local Friday date must catch that instant.
        let holidays = vec![holiday(
            NaiveDate::from_ymd_opt(2026, 8, 28).unwrap(),
            "closed",
        )];
        let status = est.status_at(utc(2026, 8, 29, 2, 0), &schedule, &holidays);
        assert_eq!(status.reason, GateReason::Holiday);
    }
}
