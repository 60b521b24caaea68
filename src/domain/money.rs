use super::{ValidationError, validate_amount};

/// Money is an integer count of the smallest currency unit.
/// Balances are never negative; transaction amounts are always positive.
pub type Cents = i64;

/// Parse a user-supplied amount in the smallest currency unit.
/// Example: "150" -> 150. Fractions, signs and zero are rejected.
pub fn parse_amount(input: &str) -> Result<Cents, ValidationError> {
    let input = input.trim();
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::new(
            "amount",
            "must be a whole number of the smallest currency unit",
        ));
    }
    let amount: Cents = input
        .parse()
        .map_err(|_| ValidationError::new("amount", "too large"))?;
    validate_amount(amount)
}
