//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures, malformed date evidence, and
//! frequency estimation anomalies.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Device name is empty, absolute, traverses upward, or holds a control
    /// character
    #[error("Invalid device name: {0}")]
    InvalidDeviceName(String),

    /// Frequency must be a positive number of days
    #[error("Invalid frequency: {0} (must be at least 1 day)")]
    InvalidFrequency(i64),

    /// A path component shaped like `YYYY-MM-DD` is not a real calendar date
    #[error("Malformed date segment '{segment}' in {path}")]
    MalformedDate {
        /// The offending component
        segment: String,
        /// The full path it was found in
        path: String,
    },

    /// No dates at all were observed for a device
    #[error("No date evidence")]
    NoEvidence,

    /// Ordered date evidence produced a negative average gap
    #[error("Inconsistent date evidence: average gap {average} days")]
    InconsistentEvidence {
        /// The computed average gap
        average: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidDeviceName("../etc".to_string());
        assert_eq!(err.to_string(), "Invalid device name: ../etc");

        let err = DomainError::InvalidFrequency(0);
        assert_eq!(
            err.to_string(),
            "Invalid frequency: 0 (must be at least 1 day)"
        );

        let err = DomainError::MalformedDate {
            segment: "2024-13-40".to_string(),
            path: "fw01/2024-13-40/x.log".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Malformed date segment '2024-13-40' in fw01/2024-13-40/x.log"
        );
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::InconsistentEvidence { average: -2 };
        let err2 = DomainError::InconsistentEvidence { average: -2 };
        let err3 = DomainError::NoEvidence;

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
