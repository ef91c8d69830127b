use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: Decimal,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub kind: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl Wallet {
    pub fn new(user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            balance: Decimal::ZERO,
        }
    }

    /// Increments the balance and returns the matching ledger row. Every
    /// balance change must be persisted together with its row.
    pub fn credit(
        &mut self,
        amount: Decimal,
        description: String,
    ) -> Result<WalletTransaction, Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }

        self.balance += amount;

        Ok(self.transaction(TransactionType::Credit, amount, description))
    }

    /// Decrements the balance, refusing to let it go negative.
    pub fn debit(
        &mut self,
        amount: Decimal,
        description: String,
    ) -> Result<WalletTransaction, Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }

        if self.balance < amount {
            return Err(Error::InsufficientFunds {
                balance: self.balance,
            });
        }

        self.balance -= amount;

        Ok(self.transaction(TransactionType::Debit, amount, description))
    }

    fn transaction(
        &self,
        kind: TransactionType,
        amount: Decimal,
        description: String,
    ) -> WalletTransaction {
        WalletTransaction {
            id: Uuid::new_v4(),
            wallet_id: self.id,
            kind,
            amount,
            description,
            timestamp: Utc::now(),
        }
    }
}
