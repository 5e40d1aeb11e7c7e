//! Shift definition model.
//!
//! A shift is a staffed time window repeated on every day of the roster
//! period: type, start/end times, paid duration, break allowance, and a
//! staffing band `min ≤ required ≤ max`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// Shift classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShiftType {
    /// Daytime ward shift.
    Day,
    /// Evening ward shift.
    Evening,
    /// Overnight ward shift.
    Night,
    /// Administrative / office-hours shift.
    Admin,
}

impl ShiftType {
    /// Lower-case label for messages ("day", "evening", ...).
    pub fn label(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::Admin => "admin",
        }
    }
}

/// A shift slot definition.
///
/// The staffing band distinguishes the legal floor (`min_staff`), the
/// operational target (`required_staff`) and the ceiling (`max_staff`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shift {
    /// Unique shift identifier.
    pub id: String,
    /// Shift classification.
    pub shift_type: ShiftType,
    /// Start of the time window.
    pub start: NaiveTime,
    /// End of the time window (may be on the following day).
    pub end: NaiveTime,
    /// Paid duration in hours.
    pub duration_hours: f64,
    /// Unpaid break within the window, in minutes.
    pub break_minutes: u32,
    /// Minimum headcount for a legally staffed slot.
    pub min_staff: u32,
    /// Target headcount.
    pub required_staff: u32,
    /// Maximum headcount.
    pub max_staff: u32,
}

impl Shift {
    /// Creates a shift; duration is derived from the time window
    /// (wrapping midnight when `end <= start`).
    pub fn new(id: impl Into<String>, shift_type: ShiftType, start: NaiveTime, end: NaiveTime) -> Self {
        let minutes = if end > start {
            (end - start).num_minutes()
        } else {
            (end - start).num_minutes() + 24 * 60
        };
        Self {
            id: id.into(),
            shift_type,
            start,
            end,
            duration_hours: minutes as f64 / 60.0,
            break_minutes: 0,
            min_staff: 1,
            required_staff: 1,
            max_staff: 1,
        }
    }

    /// A standard 07:00–15:00 day shift.
    pub fn day(id: impl Into<String>) -> Self {
        Self::new(id, ShiftType::Day, hm(7, 0), hm(15, 0))
    }

    /// A standard 15:00–23:00 evening shift.
    pub fn evening(id: impl Into<String>) -> Self {
        Self::new(id, ShiftType::Evening, hm(15, 0), hm(23, 0))
    }

    /// A standard 23:00–07:00 night shift.
    pub fn night(id: impl Into<String>) -> Self {
        Self::new(id, ShiftType::Night, hm(23, 0), hm(7, 0))
    }

    /// A standard 09:00–17:00 admin shift.
    pub fn admin(id: impl Into<String>) -> Self {
        Self::new(id, ShiftType::Admin, hm(9, 0), hm(17, 0))
    }

    /// Sets the staffing band.
    pub fn with_staffing(mut self, min: u32, required: u32, max: u32) -> Self {
        self.min_staff = min;
        self.required_staff = required;
        self.max_staff = max;
        self
    }

    /// Sets the unpaid break.
    pub fn with_break_minutes(mut self, minutes: u32) -> Self {
        self.break_minutes = minutes;
        self
    }

    /// Overrides the derived paid duration.
    pub fn with_duration_hours(mut self, hours: f64) -> Self {
        self.duration_hours = hours;
        self
    }

    /// Worked hours excluding the break.
    pub fn work_hours(&self) -> f64 {
        self.duration_hours - self.break_minutes as f64 / 60.0
    }

    /// Whether the shift crosses midnight.
    pub fn crosses_midnight(&self) -> bool {
        self.end <= self.start
    }

    /// Start instant when worked on `date`.
    pub fn start_on(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(self.start)
    }

    /// End instant when worked on `date` (next calendar day for
    /// midnight-crossing shifts).
    pub fn end_on(&self, date: NaiveDate) -> NaiveDateTime {
        if self.crosses_midnight() {
            date.succ_opt()
                .map(|next| next.and_time(self.end))
                .unwrap_or_else(|| date.and_time(self.end))
        } else {
            date.and_time(self.end)
        }
    }

    /// Whether `min_staff ≤ required_staff ≤ max_staff`.
    pub fn band_is_valid(&self) -> bool {
        self.min_staff <= self.required_staff && self.required_staff <= self.max_staff
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("literal time is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_factories() {
        let d = Shift::day("D1");
        assert_eq!(d.shift_type, ShiftType::Day);
        assert!((d.duration_hours - 8.0).abs() < 1e-10);
        assert!(!d.crosses_midnight());

        let n = Shift::night("N1");
        assert!(n.crosses_midnight());
        assert!((n.duration_hours - 8.0).abs() < 1e-10);
    }

    #[test]
    fn test_work_hours_excludes_break() {
        let s = Shift::day("D1").with_break_minutes(30);
        assert!((s.work_hours() - 7.5).abs() < 1e-10);
    }

    #[test]
    fn test_night_shift_ends_next_day() {
        let n = Shift::night("N1");
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(n.start_on(date).date(), date);
        assert_eq!(n.end_on(date).date(), date.succ_opt().unwrap());
    }

    #[test]
    fn test_staffing_band_validity() {
        let ok = Shift::day("D1").with_staffing(2, 3, 4);
        assert!(ok.band_is_valid());

        let bad = Shift::day("D2").with_staffing(4, 3, 2);
        assert!(!bad.band_is_valid());
    }

    #[test]
    fn test_shift_type_labels() {
        assert_eq!(ShiftType::Day.label(), "day");
        assert_eq!(ShiftType::Night.label(), "night");
    }
}
