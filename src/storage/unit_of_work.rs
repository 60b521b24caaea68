use anyhow::{Context, Result};
use chrono::{DateTime, Days, NaiveDate, NaiveTime, SecondsFormat, Utc};
use sqlx::{Row, Sqlite, Transaction as DbTransaction};

use crate::domain::{Cents, Direction, Transaction, TransactionId, Wallet, WalletId};

/// Result of adding value to a wallet balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreditOutcome {
    Applied,
    /// No wallet with that id.
    Missing,
    /// The new balance would not fit in a `Cents`.
    Overflow { balance: Cents },
}

/// Result of taking value out of a wallet balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    Applied,
    /// No wallet with that id.
    Missing,
    /// The balance does not cover the amount; nothing was changed.
    Insufficient { balance: Cents },
}

/// One atomic group of store operations, backed by a single SQLite transaction.
///
/// Nothing is visible to other units of work until [`UnitOfWork::commit`].
/// Dropping a unit of work without committing rolls it back.
pub struct UnitOfWork {
    tx: DbTransaction<'static, Sqlite>,
}

impl UnitOfWork {
    pub(crate) fn new(tx: DbTransaction<'static, Sqlite>) -> Self {
        Self { tx }
    }

    pub async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .context("Failed to commit unit of work")
    }

    pub async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .context("Failed to roll back unit of work")
    }

    // ========================
    // Wallet store
    // ========================

    /// Insert a new wallet row.
    pub async fn insert_wallet(&mut self, wallet: &Wallet) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO wallets (id, firstname, lastname, balance, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(wallet.id.as_str())
        .bind(&wallet.firstname)
        .bind(&wallet.lastname)
        .bind(wallet.balance)
        .bind(format_timestamp(wallet.created_at))
        .execute(&mut *self.tx)
        .await
        .context("Failed to save wallet")?;
        Ok(())
    }

    /// Get a wallet by ID.
    pub async fn fetch_wallet(&mut self, id: &WalletId) -> Result<Option<Wallet>> {
        let row = sqlx::query(
            r#"
            SELECT id, firstname, lastname, balance, created_at
            FROM wallets
            WHERE id = ?
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&mut *self.tx)
        .await
        .context("Failed to fetch wallet")?;

        row.as_ref().map(row_to_wallet).transpose()
    }

    /// List all wallets, oldest first.
    pub async fn list_wallets(&mut self) -> Result<Vec<Wallet>> {
        let rows = sqlx::query(
            r#"
            SELECT id, firstname, lastname, balance, created_at
            FROM wallets
            ORDER BY created_at, id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .context("Failed to list wallets")?;

        rows.iter().map(row_to_wallet).collect()
    }

    /// Increase a balance by `amount`.
    pub async fn credit(&mut self, id: &WalletId, amount: Cents) -> Result<CreditOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance + ?
            WHERE id = ? AND balance <= ?
            "#,
        )
        .bind(amount)
        .bind(id.as_str())
        .bind(Cents::MAX - amount)
        .execute(&mut *self.tx)
        .await
        .context("Failed to credit wallet")?;

        if result.rows_affected() == 1 {
            return Ok(CreditOutcome::Applied);
        }

        Ok(match self.balance_of(id).await? {
            None => CreditOutcome::Missing,
            Some(balance) => CreditOutcome::Overflow { balance },
        })
    }

    /// Decrease a balance by `amount`, only if the balance covers it.
    pub async fn debit(&mut self, id: &WalletId, amount: Cents) -> Result<DebitOutcome> {
        let result = sqlx::query(
            r#"
            UPDATE wallets
            SET balance = balance - ?
            WHERE id = ? AND balance >= ?
            "#,
        )
        .bind(amount)
        .bind(id.as_str())
        .bind(amount)
        .execute(&mut *self.tx)
        .await
        .context("Failed to debit wallet")?;

        if result.rows_affected() == 1 {
            return Ok(DebitOutcome::Applied);
        }

        Ok(match self.balance_of(id).await? {
            None => DebitOutcome::Missing,
            Some(balance) => DebitOutcome::Insufficient { balance },
        })
    }

    async fn balance_of(&mut self, id: &WalletId) -> Result<Option<Cents>> {
        let row = sqlx::query("SELECT balance FROM wallets WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .context("Failed to read wallet balance")?;

        Ok(row.map(|row| row.get("balance")))
    }

    // ========================
    // Transaction log
    // ========================

    /// Append a transaction to the log and return its store-assigned id.
    pub async fn append_transaction(
        &mut self,
        from: Option<&WalletId>,
        to: &WalletId,
        amount: Cents,
        date: DateTime<Utc>,
    ) -> Result<TransactionId> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (from_id, to_id, amount, date)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(from.map(WalletId::as_str))
        .bind(to.as_str())
        .bind(amount)
        .bind(format_timestamp(date))
        .fetch_one(&mut *self.tx)
        .await
        .context("Failed to append transaction")?;

        Ok(row.get("id"))
    }

    /// Transactions received (deposit) or sent (withdraw) by a wallet on one UTC calendar day.
    pub async fn transactions_on_day(
        &mut self,
        direction: Direction,
        wallet_id: &WalletId,
        day: NaiveDate,
    ) -> Result<Vec<Transaction>> {
        let column = match direction {
            Direction::Deposit => "to_id",
            Direction::Withdraw => "from_id",
        };
        let next_day = day
            .checked_add_days(Days::new(1))
            .context("History date out of range")?;
        let start = format_timestamp(day.and_time(NaiveTime::MIN).and_utc());
        let end = format_timestamp(next_day.and_time(NaiveTime::MIN).and_utc());

        let query = format!(
            "SELECT id, from_id, to_id, amount, date FROM transactions \
             WHERE {} = ? AND date >= ? AND date < ? ORDER BY id",
            column
        );

        let rows = sqlx::query(&query)
            .bind(wallet_id.as_str())
            .bind(&start)
            .bind(&end)
            .fetch_all(&mut *self.tx)
            .await
            .context("Failed to query wallet history")?;

        rows.iter().map(row_to_transaction).collect()
    }

    /// The whole log in id order.
    pub async fn list_transactions(&mut self) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"
            SELECT id, from_id, to_id, amount, date
            FROM transactions
            ORDER BY id
            "#,
        )
        .fetch_all(&mut *self.tx)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(row_to_transaction).collect()
    }
}

/// Fixed-width UTC timestamps so that text order matches time order.
fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp: {}", s))?
        .with_timezone(&Utc))
}

fn parse_wallet_id(s: &str) -> Result<WalletId> {
    WalletId::parse(s).with_context(|| format!("Invalid wallet ID in store: {}", s))
}

fn row_to_wallet(row: &sqlx::sqlite::SqliteRow) -> Result<Wallet> {
    let id_str: String = row.get("id");
    let created_at_str: String = row.get("created_at");

    Ok(Wallet {
        id: parse_wallet_id(&id_str)?,
        firstname: row.get("firstname"),
        lastname: row.get("lastname"),
        balance: row.get("balance"),
        created_at: parse_timestamp(&created_at_str)?,
    })
}

fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
    let from_str: Option<String> = row.get("from_id");
    let to_str: String = row.get("to_id");
    let date_str: String = row.get("date");

    Ok(Transaction {
        id: row.get("id"),
        from_wallet: from_str.as_deref().map(parse_wallet_id).transpose()?,
        to_wallet: parse_wallet_id(&to_str)?,
        amount: row.get("amount"),
        date: parse_timestamp(&date_str)?,
    })
}
