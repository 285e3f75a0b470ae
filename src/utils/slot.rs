//! Mapping from (date, slot index) to concrete facility-local instants.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

/// Hour of day at which slot 1 begins.
pub const FIRST_SLOT_HOUR: i64 = 7;
/// Length of every slot; the remaining ten minutes of each hour are changeover.
pub const SLOT_MINUTES: i64 = 50;
/// Highest slot index a request may name.
pub const MAX_SLOTS_PER_DAY: u32 = 12;

/// Start and end of `slot` on `date`. Slot indices start at 1.
pub fn slot_interval(date: NaiveDate, slot: u32) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(NaiveTime::MIN)
        + Duration::hours(FIRST_SLOT_HOUR + i64::from(slot) - 1);
    (start, start + Duration::minutes(SLOT_MINUTES))
}

/// Check-in at the start of `start_slot`, check-out at the end of `end_slot`.
///
/// Callers guarantee `start_slot <= end_slot`.
pub fn interval_for_range(
    date: NaiveDate,
    start_slot: u32,
    end_slot: u32,
) -> (NaiveDateTime, NaiveDateTime) {
    let (check_in, _) = slot_interval(date, start_slot);
    let (_, check_out) = slot_interval(date, end_slot);
    (check_in, check_out)
}

/// Number of slots covered by an inclusive range.
pub fn slot_count(start_slot: u32, end_slot: u32) -> i64 {
    i64::from(end_slot) - i64::from(start_slot) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn first_slot_starts_at_seven() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(slot_interval(date, 1), (at(date, 7, 0), at(date, 7, 50)));
    }

    #[test]
    fn later_slots_start_on_the_hour_and_last_fifty_minutes() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(slot_interval(date, 3), (at(date, 9, 0), at(date, 9, 50)));
        assert_eq!(slot_interval(date, 12), (at(date, 18, 0), at(date, 18, 50)));
    }

    #[test]
    fn no_upper_bound_is_enforced() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let next = date.succ_opt().unwrap();
        assert_eq!(slot_interval(date, 18), (at(next, 0, 0), at(next, 0, 50)));
    }

    #[test]
    fn range_spans_first_start_to_last_end() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(
            interval_for_range(date, 2, 4),
            (at(date, 8, 0), at(date, 10, 50))
        );
        assert_eq!(interval_for_range(date, 5, 5), slot_interval(date, 5));
        assert_eq!(slot_count(2, 4), 3);
    }

    #[test]
    fn adjacent_slots_do_not_touch() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        let (_, first_end) = slot_interval(date, 1);
        let (second_start, _) = slot_interval(date, 2);
        assert!(first_end < second_start);
    }
}
