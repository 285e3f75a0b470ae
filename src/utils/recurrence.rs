use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurrenceRule {
    Daily,
    Weekly,
    Monthly,
}

impl RecurrenceRule {
    /// The `step`-th occurrence after `anchor`, or `None` past the calendar's range.
    ///
    /// Monthly steps are taken from the anchor, so a series anchored on the
    /// 31st lands on the last day of short months and returns to the 31st
    /// afterwards instead of drifting.
    fn nth_after(self, anchor: NaiveDate, step: u32) -> Option<NaiveDate> {
        match self {
            RecurrenceRule::Daily => anchor.checked_add_days(Days::new(u64::from(step))),
            RecurrenceRule::Weekly => anchor.checked_add_days(Days::new(7 * u64::from(step))),
            RecurrenceRule::Monthly => anchor.checked_add_months(Months::new(step)),
        }
    }
}

/// Expand a reservation into the ordered dates it must cover.
///
/// Always contains `anchor`. Without a rule, or without an end date, that is
/// the only date. Fails when the series would exceed `max_occurrences`.
pub fn expand(
    anchor: NaiveDate,
    rule: Option<RecurrenceRule>,
    until: Option<NaiveDate>,
    max_occurrences: usize,
) -> AppResult<Vec<NaiveDate>> {
    let mut dates = vec![anchor];

    let (Some(rule), Some(until)) = (rule, until) else {
        return Ok(dates);
    };

    let mut step = 1;
    while let Some(next) = rule.nth_after(anchor, step) {
        if next > until {
            break;
        }
        if dates.len() >= max_occurrences {
            return Err(AppError::InvalidArgument(format!(
                "Recurrence would create more than {} occurrences",
                max_occurrences
            )));
        }
        dates.push(next);
        step += 1;
    }

    Ok(dates)
}
