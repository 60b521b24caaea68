use chrono::NaiveDate;
use thiserror::Error;

use super::Cents;

/// Input format for history dates, e.g. `15-03-2024`.
pub const HISTORY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Malformed input, rejected before any unit of work is opened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    /// Name of the offending field as the caller knows it.
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Amounts moved through the ledger must be strictly positive.
pub fn validate_amount(amount: Cents) -> Result<Cents, ValidationError> {
    if amount <= 0 {
        return Err(ValidationError::new("amount", "must be positive"));
    }
    Ok(amount)
}

/// Parse a `dd-mm-yyyy` calendar day.
pub fn parse_history_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), HISTORY_DATE_FORMAT)
        .map_err(|_| ValidationError::new("date", "invalid date format (dd-mm-yyyy)"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_amount() {
        assert_eq!(validate_amount(1), Ok(1));
        assert_eq!(validate_amount(0).unwrap_err().field, "amount");
        assert!(validate_amount(-5).is_err());
    }

    #[test]
    fn test_parse_history_date() {
        let date = parse_history_date("15-03-2024").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
    }

    #[test]
    fn test_parse_history_date_rejects_other_layouts() {
        assert!(parse_history_date("2024-03-15").is_err());
        assert!(parse_history_date("31-02-2024").is_err());
        assert!(parse_history_date("").is_err());

        let err = parse_history_date("15/03/2024").unwrap_err();
        assert_eq!(err.field, "date");
    }
}
