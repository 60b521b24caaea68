use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::domain::{
    Cents, Direction, ReconciliationReport, Transaction, TransactionId, ValidationError, Wallet,
    WalletId, reconcile, validate_amount,
};
use crate::storage::{CreditOutcome, DebitOutcome, LedgerStore, StoreConfig, UnitOfWork};

use super::{Clock, LedgerError, SystemClock};

/// The ledger transaction engine.
///
/// Every operation runs inside exactly one unit of work: it either commits
/// all of its balance changes together with their transaction log entry, or
/// none of them. Cloning is cheap and clones share the same store.
#[derive(Clone)]
pub struct LedgerEngine {
    store: LedgerStore,
    clock: Arc<dyn Clock>,
}

impl LedgerEngine {
    /// Create an engine over the given store, stamping records with wall-clock time.
    pub fn new(store: LedgerStore) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: LedgerStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Initialize the database (creating it if needed) and build an engine on it.
    pub async fn init(config: &StoreConfig) -> Result<Self, LedgerError> {
        let store = LedgerStore::init(config).await?;
        Ok(Self::new(store))
    }

    /// Connect to an already initialized database.
    pub async fn connect(config: &StoreConfig) -> Result<Self, LedgerError> {
        let store = LedgerStore::connect(config).await?;
        Ok(Self::new(store))
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    // ========================
    // Mutating operations
    // ========================

    /// Create an empty wallet. No transaction is logged for creation.
    pub async fn create_wallet(
        &self,
        firstname: &str,
        lastname: &str,
    ) -> Result<Wallet, LedgerError> {
        let wallet = Wallet::new(firstname, lastname, self.clock.now())?;

        let mut uow = self.store.begin().await?;
        uow.insert_wallet(&wallet).await?;
        uow.commit().await?;

        info!(wallet_id = %wallet.id, "wallet created");
        Ok(wallet)
    }

    /// Add external value to a wallet.
    pub async fn top_up(
        &self,
        recipient: &WalletId,
        amount: Cents,
    ) -> Result<TransactionId, LedgerError> {
        let amount = validate_amount(amount)?;

        let mut uow = self.store.begin().await?;
        credit(&mut uow, recipient, amount).await?;
        let tx_id = uow
            .append_transaction(None, recipient, amount, self.clock.now())
            .await?;
        uow.commit().await?;

        info!(transaction_id = tx_id, recipient = %recipient, amount, "top-up committed");
        Ok(tx_id)
    }

    /// Move value from one wallet to another.
    ///
    /// The sender is debited first with a conditional update, so a short
    /// balance is rejected before anything changes.
    pub async fn send(
        &self,
        sender: &WalletId,
        recipient: &WalletId,
        amount: Cents,
    ) -> Result<TransactionId, LedgerError> {
        let amount = validate_amount(amount)?;
        if sender == recipient {
            return Err(ValidationError::new(
                "recipient-id",
                "sender and recipient must be different wallets",
            )
            .into());
        }

        let mut uow = self.store.begin().await?;

        // On rejection `uow` is dropped uncommitted, which rolls it back.
        match uow.debit(sender, amount).await? {
            DebitOutcome::Applied => {}
            DebitOutcome::Missing => {
                warn!(sender = %sender, "send rejected: sender not found");
                return Err(LedgerError::WalletNotFound(sender.clone()));
            }
            DebitOutcome::Insufficient { balance } => {
                warn!(sender = %sender, balance, amount, "send rejected: insufficient funds");
                return Err(LedgerError::InsufficientFunds {
                    wallet_id: sender.clone(),
                    balance,
                    required: amount,
                });
            }
        }

        credit(&mut uow, recipient, amount).await?;
        let tx_id = uow
            .append_transaction(Some(sender), recipient, amount, self.clock.now())
            .await?;
        uow.commit().await?;

        info!(
            transaction_id = tx_id,
            sender = %sender,
            recipient = %recipient,
            amount,
            "send committed"
        );
        Ok(tx_id)
    }

    // ========================
    // Read operations
    // ========================

    /// Transactions a wallet received (deposit) or sent (withdraw) on a calendar day (UTC).
    /// An unknown wallet simply has no history.
    pub async fn history(
        &self,
        direction: Direction,
        wallet_id: &WalletId,
        day: NaiveDate,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let mut uow = self.store.begin().await?;
        let transactions = uow.transactions_on_day(direction, wallet_id, day).await?;
        uow.commit().await?;

        debug!(
            wallet_id = %wallet_id,
            %direction,
            %day,
            count = transactions.len(),
            "history query"
        );
        Ok(transactions)
    }

    /// Get a wallet with its current balance.
    pub async fn wallet(&self, id: &WalletId) -> Result<Wallet, LedgerError> {
        let mut uow = self.store.begin().await?;
        let wallet = uow.fetch_wallet(id).await?;
        uow.commit().await?;

        wallet.ok_or_else(|| LedgerError::WalletNotFound(id.clone()))
    }

    /// List all wallets.
    pub async fn wallets(&self) -> Result<Vec<Wallet>, LedgerError> {
        let mut uow = self.store.begin().await?;
        let wallets = uow.list_wallets().await?;
        uow.commit().await?;
        Ok(wallets)
    }

    /// Check every stored balance against a replay of the transaction log.
    /// Wallets and log are read in one unit of work, so they describe the same state.
    pub async fn reconcile(&self) -> Result<ReconciliationReport, LedgerError> {
        let mut uow = self.store.begin().await?;
        let wallets = uow.list_wallets().await?;
        let transactions = uow.list_transactions().await?;
        uow.commit().await?;

        let report = reconcile(&wallets, &transactions);
        if !report.is_consistent() {
            warn!(
                discrepancies = report.discrepancies.len(),
                negative = report.negative_wallets.len(),
                "ledger reconciliation found problems"
            );
        }
        Ok(report)
    }
}

/// Credit inside an open unit of work, turning a failed credit into an error.
/// On error the unit of work is left to roll back when dropped.
async fn credit(
    uow: &mut UnitOfWork,
    recipient: &WalletId,
    amount: Cents,
) -> Result<(), LedgerError> {
    match uow.credit(recipient, amount).await? {
        CreditOutcome::Applied => Ok(()),
        CreditOutcome::Missing => {
            warn!(recipient = %recipient, "credit rejected: recipient not found");
            Err(LedgerError::WalletNotFound(recipient.clone()))
        }
        CreditOutcome::Overflow { balance } => {
            warn!(recipient = %recipient, balance, amount, "credit rejected: balance overflow");
            Err(ValidationError::new("amount", "would overflow the recipient balance").into())
        }
    }
}
