use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Cents, ValidationError, WalletId};

/// Store-assigned, monotonically increasing transaction id.
pub type TransactionId = i64;

/// An immutable record of value moved into a wallet.
/// A missing `from_wallet` marks an external top-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub from_wallet: Option<WalletId>,
    pub to_wallet: WalletId,
    /// Always positive
    pub amount: Cents,
    /// Server time at which the transaction was recorded
    pub date: DateTime<Utc>,
}

impl Transaction {
    pub fn is_top_up(&self) -> bool {
        self.from_wallet.is_none()
    }
}

/// Which side of a transaction a history query looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Transactions received by the wallet
    Deposit,
    /// Transactions sent by the wallet
    Withdraw,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Deposit => "deposit",
            Direction::Withdraw => "withdraw",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Direction::Deposit),
            "withdraw" => Ok(Direction::Withdraw),
            _ => Err(ValidationError::new(
                "direction",
                "invalid parameter (deposit|withdraw)",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(from: Option<&WalletId>, to: &WalletId, amount: Cents) -> Transaction {
        Transaction {
            id: 1,
            from_wallet: from.cloned(),
            to_wallet: to.clone(),
            amount,
            date: Utc::now(),
        }
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("deposit".parse::<Direction>(), Ok(Direction::Deposit));
        assert_eq!("withdraw".parse::<Direction>(), Ok(Direction::Withdraw));

        let err = "Deposit".parse::<Direction>().unwrap_err();
        assert_eq!(err.field, "direction");
        assert!("".parse::<Direction>().is_err());
    }

    #[test]
    fn test_top_up_has_no_sender() {
        let a = WalletId::generate();
        assert!(tx(None, &a, 100).is_top_up());
        assert!(!tx(Some(&WalletId::generate()), &a, 100).is_top_up());
    }
}
