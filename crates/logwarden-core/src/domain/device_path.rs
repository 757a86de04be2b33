//! Device path parsing
//!
//! Log trees encode device identity and log day in the directory layout:
//! everything before the first `YYYY-MM-DD` component names the device,
//! and that component is the day the logs beneath it were written.

use std::sync::OnceLock;

use chrono::NaiveDate;

use super::errors::DomainError;

/// Format used for date-named directories
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Relative day labels some collectors write instead of a calendar date
const RELATIVE_DAY_LABELS: &[&str] = &["today", "yesterday"];

fn date_segment_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| {
        regex::Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("static regex is valid")
    })
}

/// Result of classifying one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevicePath {
    /// The path sits under a date-named directory
    Dated {
        /// `/`-joined components preceding the date; empty when the date
        /// directory sits directly under the scanned root
        device: String,
        /// The calendar day encoded by the date component
        date: NaiveDate,
    },
    /// No date-shaped component; not a classifiable log path
    Undated,
}

/// Parse a single path component as a log-day directory name
///
/// Returns `Ok(None)` when the component is not date-shaped at all.
///
/// # Errors
/// Returns [`DomainError::MalformedDate`] when the component looks like
/// `YYYY-MM-DD` but is not a real calendar date
pub fn parse_date_segment(segment: &str) -> Result<Option<NaiveDate>, DomainError> {
    if !date_segment_re().is_match(segment) {
        return Ok(None);
    }
    NaiveDate::parse_from_str(segment, DATE_FORMAT)
        .map(Some)
        .map_err(|_| DomainError::MalformedDate {
            segment: segment.to_string(),
            path: segment.to_string(),
        })
}

/// True for a directory name that marks a day of logs: a date, `today` or `yesterday`
#[must_use]
pub fn is_day_label(name: &str) -> bool {
    RELATIVE_DAY_LABELS.contains(&name) || date_segment_re().is_match(name)
}

/// The directory name a collector writes for `date`
#[must_use]
pub fn day_label(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Split a `/`-separated path at its first date-shaped component
///
/// The first date-shaped component wins when several are present.
///
/// # Errors
/// Returns [`DomainError::MalformedDate`] when the winning component is
/// date-shaped but not a valid calendar date
pub fn parse_device_path(path: &str) -> Result<DevicePath, DomainError> {
    let components: Vec<&str> = path.split('/').collect();

    for (idx, component) in components.iter().enumerate() {
        let date = match parse_date_segment(component) {
            Ok(Some(date)) => date,
            Ok(None) => continue,
            Err(_) => {
                return Err(DomainError::MalformedDate {
                    segment: (*component).to_string(),
                    path: path.to_string(),
                })
            }
        };

        let device = components[..idx]
            .iter()
            .filter(|c| !c.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/");
        return Ok(DevicePath::Dated { device, date });
    }

    Ok(DevicePath::Undated)
}
