use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, ValidationError};

/// Length of every wallet identifier.
pub const WALLET_ID_LEN: usize = 32;

/// Opaque wallet identifier: 32 characters of `[a-z0-9]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletId(String);

impl WalletId {
    /// Generate a fresh identifier (a v4 UUID in simple, lowercase form).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Parse and validate an identifier supplied from outside the ledger.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        if input.chars().count() != WALLET_ID_LEN {
            return Err(ValidationError::new(
                "id",
                format!("wallet id must be {} characters", WALLET_ID_LEN),
            ));
        }
        if !input
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ValidationError::new(
                "id",
                "wallet id may only contain lowercase letters and digits",
            ));
        }
        Ok(Self(input.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for WalletId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<WalletId> for String {
    fn from(id: WalletId) -> Self {
        id.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: WalletId,
    pub firstname: String,
    pub lastname: String,
    /// Current balance in the smallest currency unit. Never negative.
    pub balance: Cents,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    /// Build a new, empty wallet. Names must be non-blank.
    pub fn new(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let firstname = firstname.into();
        let lastname = lastname.into();

        if firstname.trim().is_empty() {
            return Err(ValidationError::new("firstname", "must not be empty"));
        }
        if lastname.trim().is_empty() {
            return Err(ValidationError::new("lastname", "must not be empty"));
        }

        Ok(Self {
            id: WalletId::generate(),
            firstname,
            lastname,
            balance: 0,
            created_at,
        })
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_is_valid() {
        let id = WalletId::generate();
        assert_eq!(id.as_str().len(), WALLET_ID_LEN);
        assert!(WalletId::parse(id.as_str()).is_ok());
    }

    #[test]
    fn test_wallet_id_length() {
        let ok = "a".repeat(32);
        assert!(WalletId::parse(&ok).is_ok());
        assert!(WalletId::parse(&"a".repeat(31)).is_err());
        assert!(WalletId::parse(&"a".repeat(33)).is_err());
        assert!(WalletId::parse("").is_err());
    }

    #[test]
    fn test_wallet_id_charset() {
        assert!(WalletId::parse("0123456789abcdefghijklmnopqrstuv").is_ok());
        assert!(WalletId::parse("0123456789abcdefghijklmnopqrstuV").is_err());
        assert!(WalletId::parse("0123456789abcdefghijklmnopqrst-v").is_err());
        // 32 chars, but not ASCII
        assert!(WalletId::parse("0123456789abcdefghijklmnopqrstué").is_err());
    }

    #[test]
    fn test_wallet_id_error_names_field() {
        let err = WalletId::parse("short").unwrap_err();
        assert_eq!(err.field, "id");
    }

    #[test]
    fn test_wallet_id_serde_rejects_bad_ids() {
        let json = format!("\"{}\"", "b".repeat(32));
        let good: WalletId = serde_json::from_str(&json).unwrap();
        assert_eq!(good.as_str(), "b".repeat(32));
        assert!(serde_json::from_str::<WalletId>("\"NOT-AN-ID\"").is_err());
    }

    #[test]
    fn test_new_wallet_starts_empty() {
        let wallet = Wallet::new("Ada", "Lovelace", Utc::now()).unwrap();
        assert_eq!(wallet.balance, 0);
        assert_eq!(wallet.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_new_wallet_rejects_blank_names() {
        let err = Wallet::new("", "Lovelace", Utc::now()).unwrap_err();
        assert_eq!(err.field, "firstname");

        let err = Wallet::new("Ada", "   ", Utc::now()).unwrap_err();
        assert_eq!(err.field, "lastname");
    }
}
