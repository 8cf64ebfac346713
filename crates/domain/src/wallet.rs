//! Wallet aggregate.

use chrono::{DateTime, Utc};
use common::{Money, UserId, Version};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by wallet mutations. These are business-rule violations,
/// distinct from version conflicts, and are never retried.
#[derive(Debug, Error)]
pub enum WalletError {
    /// Mutation amounts must be strictly positive.
    #[error("wallet amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Money },

    /// The balance does not cover the requested use.
    #[error("insufficient balance: {balance} available, {requested} requested")]
    InsufficientBalance { balance: Money, requested: Money },
}

/// A user's wallet balance, guarded by an optimistic version check.
///
/// Mutation methods validate invariants and update the balance only; the
/// store bumps `version` when the conditional write succeeds, so the version
/// a caller holds always reflects the state it read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    owner_id: UserId,
    balance: Money,
    version: Version,
}

impl Wallet {
    /// Creates an empty wallet for a user.
    pub fn new(owner_id: UserId) -> Self {
        Self {
            owner_id,
            balance: Money::zero(),
            version: Version::initial(),
        }
    }

    /// Creates a wallet with a starting balance.
    pub fn with_balance(owner_id: UserId, balance: Money) -> Self {
        Self {
            owner_id,
            balance,
            version: Version::initial(),
        }
    }

    /// Returns the owning user.
    pub fn owner_id(&self) -> UserId {
        self.owner_id
    }

    /// Returns the current balance.
    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Returns the version this state was read at.
    pub fn version(&self) -> Version {
        self.version
    }

    /// Sets the version. Called by the store after a successful write.
    pub fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    /// Adds funds to the wallet.
    pub fn charge(&mut self, amount: Money) -> Result<(), WalletError> {
        Self::require_positive(amount)?;
        self.balance = self.balance.add(amount);
        Ok(())
    }

    /// Spends funds from the wallet. Fails if the balance does not cover
    /// the amount; the balance never goes negative.
    pub fn use_balance(&mut self, amount: Money) -> Result<(), WalletError> {
        Self::require_positive(amount)?;
        if self.balance < amount {
            return Err(WalletError::InsufficientBalance {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance = self.balance.subtract(amount);
        Ok(())
    }

    /// Returns previously spent funds to the wallet.
    pub fn refund(&mut self, amount: Money) -> Result<(), WalletError> {
        Self::require_positive(amount)?;
        self.balance = self.balance.add(amount);
        Ok(())
    }

    fn require_positive(amount: Money) -> Result<(), WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::NonPositiveAmount { amount });
        }
        Ok(())
    }
}

/// The kind of movement a ledger entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WalletEntryKind {
    /// Funds added to the wallet.
    Charge,
    /// Funds spent on a payment.
    Use,
    /// Funds returned after a cancellation or compensation.
    Refund,
}

impl WalletEntryKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            WalletEntryKind::Charge => "Charge",
            WalletEntryKind::Use => "Use",
            WalletEntryKind::Refund => "Refund",
        }
    }
}

impl std::fmt::Display for WalletEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An append-only record of one wallet movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    /// The wallet owner.
    pub owner_id: UserId,
    /// What kind of movement this was.
    pub kind: WalletEntryKind,
    /// The moved amount (always positive).
    pub amount: Money,
    /// The balance after the movement.
    pub balance_after: Money,
    /// When the movement was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl WalletEntry {
    /// Creates a ledger entry stamped with the current time.
    pub fn new(
        owner_id: UserId,
        kind: WalletEntryKind,
        amount: Money,
        balance_after: Money,
    ) -> Self {
        Self {
            owner_id,
            kind,
            amount,
            balance_after,
            recorded_at: Utc::now(),
        }
    }
}
