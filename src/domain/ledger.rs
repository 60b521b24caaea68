use std::collections::HashMap;

use serde::Serialize;

use super::{Cents, Transaction, Wallet, WalletId};

/// Sums across wallets or over a whole log can exceed a single balance's
/// range, so they are accumulated in 128 bits.
pub type LedgerSum = i128;

/// Replay a transaction log into per-wallet balances.
/// Wallets that never appear in the log are absent from the map (balance = 0).
pub fn replay_balances(transactions: &[Transaction]) -> HashMap<WalletId, LedgerSum> {
    let mut balances: HashMap<WalletId, LedgerSum> = HashMap::new();

    for tx in transactions {
        let amount = LedgerSum::from(tx.amount);
        if let Some(from) = &tx.from_wallet {
            *balances.entry(from.clone()).or_insert(0) -= amount;
        }
        *balances.entry(tx.to_wallet.clone()).or_insert(0) += amount;
    }

    balances
}

/// Total value that entered the ledger through top-ups.
pub fn total_topped_up(transactions: &[Transaction]) -> LedgerSum {
    transactions
        .iter()
        .filter(|tx| tx.is_top_up())
        .map(|tx| LedgerSum::from(tx.amount))
        .sum()
}

/// A wallet whose stored balance disagrees with its transaction history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceDiscrepancy {
    pub wallet_id: WalletId,
    pub stored: Cents,
    pub replayed: LedgerSum,
}

impl std::fmt::Display for BalanceDiscrepancy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "wallet {}: stored balance {} but history sums to {}",
            self.wallet_id, self.stored, self.replayed
        )
    }
}

/// Outcome of checking stored balances against the transaction log.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationReport {
    pub wallet_count: usize,
    pub transaction_count: usize,
    /// Sum of all stored balances
    pub total_balance: LedgerSum,
    /// Sum of all top-ups; equals `total_balance` in a closed system
    pub total_topped_up: LedgerSum,
    pub discrepancies: Vec<BalanceDiscrepancy>,
    /// Wallets holding a negative balance
    pub negative_wallets: Vec<WalletId>,
}

impl ReconciliationReport {
    pub fn is_consistent(&self) -> bool {
        self.discrepancies.is_empty()
            && self.negative_wallets.is_empty()
            && self.total_balance == self.total_topped_up
    }
}

/// Compare stored wallet balances against the replayed transaction log.
pub fn reconcile(wallets: &[Wallet], transactions: &[Transaction]) -> ReconciliationReport {
    let replayed = replay_balances(transactions);

    let mut discrepancies = Vec::new();
    let mut negative_wallets = Vec::new();
    for wallet in wallets {
        let expected = replayed.get(&wallet.id).copied().unwrap_or(0);
        if expected != LedgerSum::from(wallet.balance) {
            discrepancies.push(BalanceDiscrepancy {
                wallet_id: wallet.id.clone(),
                stored: wallet.balance,
                replayed: expected,
            });
        }
        if wallet.balance < 0 {
            negative_wallets.push(wallet.id.clone());
        }
    }

    ReconciliationReport {
        wallet_count: wallets.len(),
        transaction_count: transactions.len(),
        total_balance: wallets.iter().map(|w| LedgerSum::from(w.balance)).sum(),
        total_topped_up: total_topped_up(transactions),
        discrepancies,
        negative_wallets,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn wallet(balance: Cents) -> Wallet {
        let mut w = Wallet::new("Test", "Wallet", Utc::now()).unwrap();
        w.balance = balance;
        w
    }

    fn tx(id: i64, from: Option<&WalletId>, to: &WalletId, amount: Cents) -> Transaction {
        Transaction {
            id,
            from_wallet: from.cloned(),
            to_wallet: to.clone(),
            amount,
            date: Utc::now(),
        }
    }

    #[test]
    fn test_replay_empty() {
        assert!(replay_balances(&[]).is_empty());
    }

    #[test]
    fn test_replay_top_ups_and_sends() {
        let a = WalletId::generate();
        let b = WalletId::generate();

        let log = vec![
            tx(1, None, &a, 100),
            tx(2, None, &a, 50),
            tx(3, Some(&a), &b, 30),
        ];

        let balances = replay_balances(&log);
        assert_eq!(balances.get(&a), Some(&120));
        assert_eq!(balances.get(&b), Some(&30));
        assert_eq!(total_topped_up(&log), 150);
    }

    #[test]
    fn test_reconcile_consistent() {
        let a = wallet(120);
        let b = wallet(30);
        let idle = wallet(0);

        let log = vec![tx(1, None, &a.id, 150), tx(2, Some(&a.id), &b.id, 30)];

        let report = reconcile(&[a, b, idle], &log);
        assert!(report.is_consistent());
        assert_eq!(report.wallet_count, 3);
        assert_eq!(report.transaction_count, 2);
        assert_eq!(report.total_balance, 150);
    }

    #[test]
    fn test_totals_beyond_single_balance_range() {
        let a = wallet(Cents::MAX);
        let b = wallet(1);
        let log = vec![tx(1, None, &a.id, Cents::MAX), tx(2, None, &b.id, 1)];

        let report = reconcile(&[a, b], &log);
        assert!(report.is_consistent());
        assert_eq!(report.total_balance, LedgerSum::from(Cents::MAX) + 1);
        assert_eq!(report.total_topped_up, report.total_balance);
    }

    #[test]
    fn test_reconcile_detects_drift() {
        let a = wallet(200);
        let log = vec![tx(1, None, &a.id, 150)];

        let report = reconcile(std::slice::from_ref(&a), &log);
        assert!(!report.is_consistent());
        assert_eq!(
            report.discrepancies,
            vec![BalanceDiscrepancy {
                wallet_id: a.id.clone(),
                stored: 200,
                replayed: 150,
            }]
        );
    }

    #[test]
    fn test_reconcile_flags_negative_balance() {
        let a = wallet(-10);
        let b = wallet(10);
        let log = vec![tx(1, Some(&a.id), &b.id, 10)];

        let report = reconcile(&[a.clone(), b], &log);
        assert!(report.discrepancies.is_empty());
        assert_eq!(report.negative_wallets, vec![a.id]);
        assert!(!report.is_consistent());
    }
}
