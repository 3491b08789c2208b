//! Balance ledger seam and the in-memory ledger implementation.

use super::{
    errors::{WalletError, WalletResult},
    models::{EntryDirection, GuildId, UserId, Wallet, WalletEntry},
};
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

/// Balance store reached by lobbies for stakes, refunds and payouts.
///
/// Every call must be atomic with respect to other calls touching the same
/// user, since one player may sit in several lobbies at once.
pub trait BalanceLedger: Send + Sync {
    /// Current balance of a user.
    fn balance(&self, guild: GuildId, user_id: UserId) -> WalletResult<u64>;

    /// Take `amount` from a user.
    ///
    /// # Errors
    ///
    /// * `WalletError::InsufficientBalance` - Not enough coins, nothing changed
    fn debit(&self, guild: GuildId, user_id: UserId, amount: u64) -> WalletResult<u64>;

    /// Give `amount` to a user and return the new balance.
    fn credit(&self, guild: GuildId, user_id: UserId, amount: u64) -> WalletResult<u64>;

    /// Give `amount` to each user in one batch.
    fn credit_many(&self, guild: GuildId, user_ids: &[UserId], amount: u64) -> WalletResult<()>;
}

#[derive(Debug, Default)]
struct LedgerBook {
    balances: HashMap<(GuildId, UserId), Wallet>,
    entries: Vec<WalletEntry>,
}

impl LedgerBook {
    fn wallet_mut(&mut self, guild: GuildId, user_id: UserId, default_balance: u64) -> &mut Wallet {
        self.balances
            .entry((guild, user_id))
            .or_insert_with(|| Wallet {
                guild,
                user_id,
                balance: default_balance,
                updated_at: Utc::now(),
            })
    }

    fn record(
        &mut self,
        guild: GuildId,
        user_id: UserId,
        amount: u64,
        balance_after: u64,
        direction: EntryDirection,
    ) {
        let id = self.entries.len() as u64 + 1;
        self.entries.push(WalletEntry {
            id,
            guild,
            user_id,
            amount,
            balance_after,
            direction,
            created_at: Utc::now(),
        });
    }
}

/// In-memory ledger guarded by a single mutex.
///
/// Unknown users start with `default_balance`. Every movement is kept as a
/// [`WalletEntry`] so callers can audit stakes and payouts.
#[derive(Debug)]
pub struct InMemoryLedger {
    default_balance: u64,
    book: Mutex<LedgerBook>,
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(0)
    }
}

impl InMemoryLedger {
    /// Create a ledger where every new wallet starts at `default_balance`
    pub fn new(default_balance: u64) -> Self {
        Self {
            default_balance,
            book: Mutex::new(LedgerBook::default()),
        }
    }

    /// Overwrite a user's balance without recording an entry
    pub fn set_balance(&self, guild: GuildId, user_id: UserId, balance: u64) -> WalletResult<()> {
        let mut book = self.lock()?;
        let wallet = book.wallet_mut(guild, user_id, self.default_balance);
        wallet.balance = balance;
        wallet.updated_at = Utc::now();
        Ok(())
    }

    /// Get the wallet for a user, creating it if needed
    pub fn get_wallet(&self, guild: GuildId, user_id: UserId) -> WalletResult<Wallet> {
        let mut book = self.lock()?;
        Ok(book.wallet_mut(guild, user_id, self.default_balance).clone())
    }

    /// All recorded movements, oldest first
    pub fn entries(&self) -> WalletResult<Vec<WalletEntry>> {
        Ok(self.lock()?.entries.clone())
    }

    /// Recorded movements for one user, oldest first
    pub fn entries_for(&self, guild: GuildId, user_id: UserId) -> WalletResult<Vec<WalletEntry>> {
        Ok(self
            .lock()?
            .entries
            .iter()
            .filter(|entry| entry.guild == guild && entry.user_id == user_id)
            .cloned()
            .collect())
    }

    fn lock(&self) -> WalletResult<MutexGuard<'_, LedgerBook>> {
        self.book
            .lock()
            .map_err(|_| WalletError::Storage("ledger lock poisoned".to_string()))
    }
}

impl BalanceLedger for InMemoryLedger {
    fn balance(&self, guild: GuildId, user_id: UserId) -> WalletResult<u64> {
        Ok(self.get_wallet(guild, user_id)?.balance)
    }

    fn debit(&self, guild: GuildId, user_id: UserId, amount: u64) -> WalletResult<u64> {
        let mut book = self.lock()?;
        let wallet = book.wallet_mut(guild, user_id, self.default_balance);
        if amount == 0 {
            return Ok(wallet.balance);
        }

        // Check and update under the same lock
        if wallet.balance < amount {
            return Err(WalletError::InsufficientBalance {
                user_id,
                available: wallet.balance,
                required: amount,
            });
        }
        wallet.balance -= amount;
        wallet.updated_at = Utc::now();
        let new_balance = wallet.balance;

        book.record(guild, user_id, amount, new_balance, EntryDirection::Debit);
        log::debug!("Debited {amount} from user {user_id} in guild {guild}");
        Ok(new_balance)
    }

    fn credit(&self, guild: GuildId, user_id: UserId, amount: u64) -> WalletResult<u64> {
        let mut book = self.lock()?;
        let wallet = book.wallet_mut(guild, user_id, self.default_balance);
        if amount == 0 {
            return Ok(wallet.balance);
        }

        wallet.balance = wallet
            .balance
            .checked_add(amount)
            .ok_or(WalletError::BalanceOverflow(user_id))?;
        wallet.updated_at = Utc::now();
        let new_balance = wallet.balance;

        book.record(guild, user_id, amount, new_balance, EntryDirection::Credit);
        log::debug!("Credited {amount} to user {user_id} in guild {guild}");
        Ok(new_balance)
    }

    fn credit_many(&self, guild: GuildId, user_ids: &[UserId], amount: u64) -> WalletResult<()> {
        if amount == 0 || user_ids.is_empty() {
            return Ok(());
        }

        let mut book = self.lock()?;

        // Validate the whole batch first so a failure leaves no partial credit
        for &user_id in user_ids {
            let wallet = book.wallet_mut(guild, user_id, self.default_balance);
            if wallet.balance.checked_add(amount).is_none() {
                return Err(WalletError::BalanceOverflow(user_id));
            }
        }

        for &user_id in user_ids {
            let wallet = book.wallet_mut(guild, user_id, self.default_balance);
            wallet.balance += amount;
            wallet.updated_at = Utc::now();
            let new_balance = wallet.balance;
            book.record(guild, user_id, amount, new_balance, EntryDirection::Credit);
        }

        log::debug!(
            "Credited {amount} to {} users in guild {guild}",
            user_ids.len()
        );
        Ok(())
    }
}
