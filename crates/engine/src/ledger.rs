//! The cash ledger: atomic balance adjustment plus the append-only
//! transaction log.

use crate::{error::EngineError, ExecutionEngine};
use core_types::{Account, CashTransaction, CashTxKind};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

/// Applies a signed cash adjustment to a balance. Deposits carry a positive
/// sign, withdrawals a negative one; a result below zero is refused, so the
/// non-negative balance invariant holds before any row is written.
pub(crate) fn adjusted_balance(
    balance: Decimal,
    signed_amount: Decimal,
) -> Result<Decimal, EngineError> {
    let new_balance = balance + signed_amount;
    if new_balance < Decimal::ZERO {
        return Err(EngineError::InsufficientFunds {
            required: signed_amount.abs(),
            available: balance,
        });
    }
    Ok(new_balance)
}

impl ExecutionEngine {
    /// Deposits `amount` into the caller's account and returns the account
    /// with its new balance. Amounts must be strictly positive.
    pub async fn deposit(&self, user_id: Uuid, amount: Decimal) -> Result<Account, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(amount));
        }
        self.adjust(user_id, amount, CashTxKind::Deposit).await
    }

    /// Withdraws `amount` from the caller's account and returns the account
    /// with its new balance. Fails with `InsufficientFunds` rather than
    /// letting the balance go negative.
    pub async fn withdraw(&self, user_id: Uuid, amount: Decimal) -> Result<Account, EngineError> {
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount(amount));
        }
        self.adjust(user_id, -amount, CashTxKind::Withdrawal).await
    }

    /// The one primitive underlying both deposits and withdrawals: lock the
    /// account row, apply the signed amount, refuse a negative result, and
    /// log the absolute magnitude under the given kind. The balance update
    /// and the log append commit or roll back together. Returns the account
    /// as it stands after the adjustment.
    async fn adjust(
        &self,
        user_id: Uuid,
        signed_amount: Decimal,
        kind: CashTxKind,
    ) -> Result<Account, EngineError> {
        let mut tx = self.repo().begin().await?;
        let mut account = self
            .repo()
            .lock_account_by_user(&mut tx, user_id)
            .await?
            .ok_or(EngineError::AccountNotFound(user_id))?;

        let new_balance = adjusted_balance(account.balance, signed_amount)?;

        self.repo()
            .update_account_balance(&mut tx, account.id, new_balance)
            .await?;
        self.repo()
            .insert_cash_transaction(&mut tx, account.id, kind.as_str(), signed_amount.abs())
            .await?;
        tx.commit().await.map_err(database::DbError::from)?;

        info!(
            user_id = %user_id,
            kind = kind.as_str(),
            amount = %signed_amount.abs(),
            balance = %new_balance,
            "cash adjusted"
        );
        account.balance = new_balance;
        Ok(account)
    }

    /// Fetches the caller's account, including its current balance.
    pub async fn balance(&self, user_id: Uuid) -> Result<Account, EngineError> {
        self.repo()
            .get_account_by_user(user_id)
            .await?
            .ok_or(EngineError::AccountNotFound(user_id))
    }

    /// Fetches the caller's cash-ledger history, newest first.
    pub async fn transaction_history(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<CashTransaction>, EngineError> {
        let account = self
            .repo()
            .get_account_by_user(user_id)
            .await?
            .ok_or(EngineError::AccountNotFound(user_id))?;
        Ok(self.repo().get_cash_transactions(account.id).await?)
    }

    /// Opens the single cash account a user receives at registration.
    /// Driven by the administrative CLI; the identity provider itself is an
    /// external collaborator.
    pub async fn open_account(
        &self,
        user_id: Uuid,
        currency: &str,
        opening_balance: Decimal,
    ) -> Result<Account, EngineError> {
        if opening_balance < Decimal::ZERO {
            return Err(EngineError::InvalidAmount(opening_balance));
        }
        let account = self
            .repo()
            .create_account(user_id, currency, opening_balance)
            .await?;
        info!(user_id = %user_id, account_id = %account.id, "account opened");
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn deposit_sign_adds_to_the_balance() {
        assert_eq!(adjusted_balance(dec!(100), dec!(25)).unwrap(), dec!(125));
    }

    #[test]
    fn withdrawal_sign_subtracts_from_the_balance() {
        assert_eq!(adjusted_balance(dec!(100), dec!(-40)).unwrap(), dec!(60));
    }

    #[test]
    fn withdrawal_may_drain_the_balance_to_exactly_zero() {
        assert_eq!(
            adjusted_balance(dec!(100), dec!(-100)).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn overdraft_is_rejected_with_the_shortfall_context() {
        // Balance 100, withdrawal of 100.01: refused before any write.
        let err = adjusted_balance(dec!(100), dec!(-100.01)).unwrap_err();
        match err {
            EngineError::InsufficientFunds {
                required,
                available,
            } => {
                assert_eq!(required, dec!(100.01));
                assert_eq!(available, dec!(100));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
