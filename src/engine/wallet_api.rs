use super::helpers::{fetch_user, fetch_wallet_for_update, insert_wallet_transaction, update_wallet};
use super::{Database, Engine};

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{types::Json, Acquire, Executor, Row, Transaction};
use uuid::Uuid;

use crate::{
    api::WalletAPI,
    auth::Caller,
    entities::{Wallet, WalletTransaction},
    error::Error,
};

#[async_trait]
impl WalletAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn balance(&self, caller: Caller) -> Result<Decimal, Error> {
        let mut conn = self.pool.acquire().await?;

        fetch_user(&mut *conn, &caller.id).await?;

        let wallet = get_or_create_wallet(&mut conn, &caller.id).await?;

        Ok(wallet.balance)
    }

    #[tracing::instrument(skip(self))]
    async fn top_up(&self, caller: Caller, amount: Decimal) -> Result<Wallet, Error> {
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }

        let mut conn = self.pool.acquire().await?;

        fetch_user(&mut *conn, &caller.id).await?;

        let mut tx = conn.begin().await?;

        let wallet_id = ensure_wallet(&mut tx, &caller.id).await?;
        let mut wallet = fetch_wallet_for_update(&mut tx, &wallet_id).await?;

        let row = wallet.credit(amount, "Wallet top-up".into())?;

        update_wallet(&mut tx, &wallet).await?;
        insert_wallet_transaction(&mut tx, &row).await?;

        tx.commit().await?;

        tracing::info!("wallet topped up, new balance: {}", wallet.balance);

        Ok(wallet)
    }

    #[tracing::instrument(skip(self))]
    async fn transfer_funds(
        &self,
        caller: Caller,
        receiver_user_id: Uuid,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;

        fetch_user(&mut *conn, &caller.id).await?;
        let receiver = fetch_user(&mut *conn, &receiver_user_id).await?;

        let description =
            description.unwrap_or_else(|| format!("Transfer to {}", receiver.email));

        let mut tx = conn.begin().await?;

        transfer_in_tx(&mut tx, &caller.id, &receiver_user_id, amount, description).await?;

        tx.commit().await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn wallet_history(&self, caller: Caller) -> Result<Vec<WalletTransaction>, Error> {
        let mut conn = self.pool.acquire().await?;

        fetch_user(&mut *conn, &caller.id).await?;

        let wallet = get_or_create_wallet(&mut conn, &caller.id).await?;

        let results = conn
            .fetch_all(
                sqlx::query(
                    "SELECT data FROM wallet_transactions WHERE wallet_id = $1 ORDER BY created_at DESC",
                )
                .bind(&wallet.id),
            )
            .await?;

        let mut history = Vec::with_capacity(results.len());

        for result in results.iter() {
            let Json(row): Json<WalletTransaction> = result.try_get("data")?;
            history.push(row);
        }

        Ok(history)
    }
}

/// Treasury account the platform commission settles into. Not reachable
/// through the caller-facing wallet API.
pub(super) const PLATFORM_ACCOUNT_ID: Uuid = Uuid::nil();

/// Inserts a zero-balance wallet unless the user already has one, and
/// returns the wallet's id. Concurrent callers race on the unique user_id
/// constraint, so at most one wallet per user ever exists.
pub(super) async fn ensure_wallet(
    tx: &mut Transaction<'_, Database>,
    user_id: &Uuid,
) -> Result<Uuid, Error> {
    let wallet = Wallet::new(*user_id);

    tx.execute(
        sqlx::query(
            "INSERT INTO wallets (id, user_id, data) VALUES ($1, $2, $3) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(&wallet.id)
        .bind(&wallet.user_id)
        .bind(Json(&wallet)),
    )
    .await?;

    let id: Uuid = tx
        .fetch_one(sqlx::query("SELECT id FROM wallets WHERE user_id = $1").bind(user_id))
        .await?
        .try_get("id")?;

    Ok(id)
}

async fn get_or_create_wallet(
    conn: &mut sqlx::pool::PoolConnection<Database>,
    user_id: &Uuid,
) -> Result<Wallet, Error> {
    let mut tx = conn.begin().await?;
    let wallet_id = ensure_wallet(&mut tx, user_id).await?;
    tx.commit().await?;

    let Json(wallet): Json<Wallet> = conn
        .fetch_one(sqlx::query("SELECT data FROM wallets WHERE id = $1").bind(&wallet_id))
        .await?
        .try_get("data")?;

    Ok(wallet)
}

/// Moves `amount` between two users' wallets. Both balance updates and both
/// ledger rows commit with the surrounding transaction or not at all.
#[tracing::instrument(skip(tx))]
pub(super) async fn transfer_in_tx(
    tx: &mut Transaction<'_, Database>,
    sender_user_id: &Uuid,
    receiver_user_id: &Uuid,
    amount: Decimal,
    description: String,
) -> Result<(), Error> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount);
    }

    let sender_wallet_id = ensure_wallet(tx, sender_user_id).await?;
    let receiver_wallet_id = ensure_wallet(tx, receiver_user_id).await?;

    if sender_wallet_id == receiver_wallet_id {
        let mut wallet = fetch_wallet_for_update(tx, &sender_wallet_id).await?;

        let debit = wallet.debit(amount, description.clone())?;
        let credit = wallet.credit(amount, description)?;

        update_wallet(tx, &wallet).await?;
        insert_wallet_transaction(tx, &debit).await?;
        insert_wallet_transaction(tx, &credit).await?;

        return Ok(());
    }

    // lock wallet rows in id order so concurrent transfers cannot deadlock
    let (first, second) = if sender_wallet_id < receiver_wallet_id {
        (sender_wallet_id, receiver_wallet_id)
    } else {
        (receiver_wallet_id, sender_wallet_id)
    };

    let first_wallet = fetch_wallet_for_update(tx, &first).await?;
    let second_wallet = fetch_wallet_for_update(tx, &second).await?;

    let (mut sender_wallet, mut receiver_wallet) = if first_wallet.user_id == *sender_user_id {
        (first_wallet, second_wallet)
    } else {
        (second_wallet, first_wallet)
    };

    let debit = sender_wallet.debit(amount, description.clone())?;
    let credit = receiver_wallet.credit(amount, description)?;

    update_wallet(tx, &sender_wallet).await?;
    update_wallet(tx, &receiver_wallet).await?;
    insert_wallet_transaction(tx, &debit).await?;
    insert_wallet_transaction(tx, &credit).await?;

    tracing::info!(
        "transferred {} from wallet {} to wallet {}",
        amount,
        sender_wallet.id,
        receiver_wallet.id
    );

    Ok(())
}
