//! Wallet error types.

use super::models::{GuildId, UserId};
use thiserror::Error;

/// Wallet errors
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum WalletError {
    /// Insufficient balance
    #[error("Insufficient balance for user {user_id}: available {available}, required {required}")]
    InsufficientBalance {
        user_id: UserId,
        available: u64,
        required: u64,
    },

    /// Credit would overflow the balance
    #[error("Balance overflow for user {0}")]
    BalanceOverflow(UserId),

    /// No pet registered for this user
    #[error("No pet for user {user_id} in guild {guild}")]
    PetNotFound { guild: GuildId, user_id: UserId },

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

impl WalletError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Storage errors are sanitized and user IDs are redacted.
    pub fn client_message(&self) -> String {
        match self {
            WalletError::InsufficientBalance { required, .. } => {
                format!("Not enough coins: {required} required")
            }
            WalletError::PetNotFound { .. } => "You don't have a pet yet".to_string(),
            WalletError::Storage(_) | WalletError::BalanceOverflow(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

/// Result type for wallet operations
pub type WalletResult<T> = Result<T, WalletError>;
