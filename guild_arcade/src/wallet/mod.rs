//! Wallet module providing coin balances for lobby stakes.
//!
//! This module implements:
//! - The [`BalanceLedger`] seam every lobby debits and credits through
//! - An in-memory ledger with an audit trail of wallet entries
//! - Client-safe wallet errors
//!
//! ## Example
//!
//! ```
//! use guild_arcade::wallet::{BalanceLedger, InMemoryLedger};
//!
//! let ledger = InMemoryLedger::new(1_000);
//!
//! // Stake 100 coins, then refund them
//! let after_stake = ledger.debit(1, 42, 100).unwrap();
//! assert_eq!(after_stake, 900);
//! ledger.credit(1, 42, 100).unwrap();
//! assert_eq!(ledger.balance(1, 42).unwrap(), 1_000);
//! ```

pub mod errors;
pub mod ledger;
pub mod models;

pub use errors::{WalletError, WalletResult};
pub use ledger::{BalanceLedger, InMemoryLedger};
pub use models::{EntryDirection, GuildId, UserId, Wallet, WalletEntry};
