//! Logging frequency estimation
//!
//! Derives the expected number of days between log days from whatever date
//! evidence a device has left on disk. The estimate is deliberately coarse
//! and is refined each time a device resumes logging.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::errors::DomainError;
use super::newtypes::Frequency;

/// Estimate a device's logging frequency from observed log days
///
/// Dates are deduplicated before use.
///
/// - no dates: [`DomainError::NoEvidence`]
/// - one date `d`: `max(1, ceil((today - d) / 2))`
/// - two or more: `floor(sum of consecutive gaps / (count - 1))`, where an
///   average of zero means daily
///
/// # Errors
/// Returns [`DomainError::NoEvidence`] for an empty set and
/// [`DomainError::InconsistentEvidence`] if the average gap is negative
pub fn estimate_frequency<I>(dates: I, today: NaiveDate) -> Result<Frequency, DomainError>
where
    I: IntoIterator<Item = NaiveDate>,
{
    let dates: Vec<NaiveDate> = dates.into_iter().collect::<BTreeSet<_>>().into_iter().collect();

    match dates.as_slice() {
        [] => Err(DomainError::NoEvidence),
        [only] => {
            let elapsed = (today - *only).num_days();
            Frequency::new(((elapsed + 1).div_euclid(2)).max(1))
        }
        many => {
            let total_gap: i64 = many
                .windows(2)
                .map(|pair| (pair[1] - pair[0]).num_days())
                .sum();
            let intervals = many.len() as i64 - 1;
            match total_gap.div_euclid(intervals) {
                average if average < 0 => Err(DomainError::InconsistentEvidence { average }),
                0 => Ok(Frequency::DAILY),
                average => Frequency::new(average),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()
    }

    fn ago(days: i64) -> NaiveDate {
        today() - Duration::days(days)
    }

    #[test]
    fn test_no_dates() {
        assert_eq!(
            estimate_frequency(Vec::new(), today()),
            Err(DomainError::NoEvidence)
        );
    }

    #[test]
    fn test_single_date_halves_elapsed_rounding_up() {
        assert_eq!(estimate_frequency([ago(5)], today()).unwrap().days(), 3);
        assert_eq!(estimate_frequency([ago(4)], today()).unwrap().days(), 2);
        assert_eq!(estimate_frequency([ago(1)], today()).unwrap().days(), 1);
    }

    #[test]
    fn test_single_date_today_floors_at_one() {
        assert_eq!(estimate_frequency([today()], today()).unwrap().days(), 1);
    }

    #[test]
    fn test_single_future_date_floors_at_one() {
        let tomorrow = today() + Duration::days(3);
        assert_eq!(estimate_frequency([tomorrow], today()).unwrap().days(), 1);
    }

    #[test]
    fn test_identical_dates_collapse_to_single_date_rule() {
        let freq = estimate_frequency([ago(5), ago(5), ago(5)], today()).unwrap();
        assert_eq!(freq.days(), 3);
    }

    #[test]
    fn test_even_spacing() {
        let freq = estimate_frequency([ago(10), ago(5), today()], today()).unwrap();
        assert_eq!(freq.days(), 5);
    }

    #[test]
    fn test_uneven_spacing_floors_average() {
        // gaps 1 and 4, average 2.5
        let freq = estimate_frequency([ago(5), ago(4), today()], today()).unwrap();
        assert_eq!(freq.days(), 2);
    }

    #[test]
    fn test_order_does_not_matter() {
        let a = estimate_frequency([today(), ago(14), ago(7)], today()).unwrap();
        let b = estimate_frequency([ago(7), today(), ago(14)], today()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.days(), 7);
    }

    #[test]
    fn test_two_dates_known_example() {
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let last = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        assert_eq!(estimate_frequency([first, last], today()).unwrap().days(), 9);
    }

    #[test]
    fn test_consecutive_days_are_daily() {
        let freq = estimate_frequency([ago(2), ago(1), today()], today()).unwrap();
        assert_eq!(freq, Frequency::DAILY);
    }
}
