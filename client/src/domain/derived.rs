//! Derived fields recomputed from their inputs: ages from birth dates and
//! project end dates from a start date plus a day count.

use chrono::{Datelike, Days, NaiveDate};
use mockable::Clock;

/// Wire date format used throughout the API.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a wire date, `None` when absent or unparsable.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

/// Whole years between `birth_date` and `today`, decremented by one when
/// the anniversary has not yet occurred this year. `None` for missing or
/// unparsable input.
#[must_use]
pub fn age_in_years(birth_date: Option<&str>, today: NaiveDate) -> Option<i32> {
    let birth = parse_date(birth_date?)?;

    let mut years = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        years -= 1;
    }
    Some(years)
}

/// [`age_in_years`] against the injected clock's current UTC date.
#[must_use]
pub fn age_from_clock(birth_date: Option<&str>, clock: &dyn Clock) -> Option<i32> {
    age_in_years(birth_date, clock.utc().date_naive())
}

/// Inclusive end date: a one-day duration ends on its start date.
///
/// `None` when `days_needed < 1` or the offset overflows the calendar.
#[must_use]
pub fn end_date(start: NaiveDate, days_needed: i64) -> Option<NaiveDate> {
    if days_needed < 1 {
        return None;
    }
    let offset = u64::try_from(days_needed - 1).ok()?;
    start.checked_add_days(Days::new(offset))
}

/// Recompute-on-write holder for a development project's schedule.
///
/// `end_date` refreshes whenever either input changes and clears when the
/// inputs are invalid, mirroring the reactive form behaviour.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DevelopmentSchedule {
    start_date: Option<String>,
    days_needed: Option<i64>,
    end_date: Option<String>,
}

impl DevelopmentSchedule {
    /// Empty schedule with no derived end date.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the start date and recompute.
    pub fn set_start_date(&mut self, start_date: Option<&str>) {
        self.start_date = start_date.map(str::to_owned);
        self.recompute();
    }

    /// Update the day count and recompute.
    pub fn set_days_needed(&mut self, days_needed: Option<i64>) {
        self.days_needed = days_needed;
        self.recompute();
    }

    /// The derived end date in wire format, empty when inputs are invalid.
    #[must_use]
    pub fn end_date(&self) -> Option<&str> {
        self.end_date.as_deref()
    }

    fn recompute(&mut self) {
        self.end_date = self
            .start_date
            .as_deref()
            .and_then(parse_date)
            .zip(self.days_needed)
            .and_then(|(start, days)| end_date(start, days))
            .map(|date| date.format(DATE_FORMAT).to_string());
    }
}

#[cfg(test)]
mod tests {
    //! Fixed-clock coverage for the date arithmetic.

    use super::*;
    use rstest::rstest;

    fn date(raw: &str) -> NaiveDate {
        parse_date(raw).expect("valid fixture date")
    }

    #[rstest]
    #[case::day_before_anniversary("2000-03-15", "2024-03-14", 23)]
    #[case::on_anniversary("2000-03-15", "2024-03-15", 24)]
    #[case::day_after_anniversary("2000-03-15", "2024-03-16", 24)]
    #[case::end_of_year("1990-12-31", "2024-01-01", 33)]
    fn computes_whole_years(#[case] birth: &str, #[case] today: &str, #[case] expected: i32) {
        assert_eq!(age_in_years(Some(birth), date(today)), Some(expected));
    }

    #[rstest]
    #[case::absent(None)]
    #[case::unparsable(Some("not-a-date"))]
    #[case::blank(Some(""))]
    fn unusable_birth_dates_yield_absent(#[case] birth: Option<&str>) {
        assert_eq!(age_in_years(birth, date("2024-03-14")), None);
    }

    #[rstest]
    #[case::thirty_days("2024-01-01", 30, Some("2024-01-30"))]
    #[case::single_day("2024-01-01", 1, Some("2024-01-01"))]
    #[case::zero_days("2024-01-01", 0, None)]
    #[case::negative("2024-01-01", -3, None)]
    fn end_date_counts_days_inclusively(
        #[case] start: &str,
        #[case] days: i64,
        #[case] expected: Option<&str>,
    ) {
        let computed = end_date(date(start), days).map(|d| d.format(DATE_FORMAT).to_string());
        assert_eq!(computed.as_deref(), expected);
    }

    #[test]
    fn schedule_recomputes_on_every_input_change() {
        let mut schedule = DevelopmentSchedule::new();
        assert_eq!(schedule.end_date(), None);

        schedule.set_start_date(Some("2024-01-01"));
        assert_eq!(schedule.end_date(), None, "missing day count yields no end date");

        schedule.set_days_needed(Some(30));
        assert_eq!(schedule.end_date(), Some("2024-01-30"));

        schedule.set_days_needed(Some(1));
        assert_eq!(schedule.end_date(), Some("2024-01-01"));

        schedule.set_days_needed(Some(0));
        assert_eq!(schedule.end_date(), None, "invalid day count clears the end date");

        schedule.set_days_needed(Some(10));
        schedule.set_start_date(Some("garbage"));
        assert_eq!(schedule.end_date(), None, "unparsable start clears the end date");
    }
}
