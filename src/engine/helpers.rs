use super::Database;

use sqlx::{types::Json, Executor, Row, Transaction};
use uuid::Uuid;

use crate::{
    entities::{Driver, Order, User, VehicleType, Wallet, WalletTransaction},
    error::Error,
};

#[tracing::instrument(skip(tx))]
pub async fn fetch_order_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Order, Error> {
    let Json(order): Json<Order> = tx
        .fetch_optional(sqlx::query("SELECT data FROM orders WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or(Error::NotFound("order"))?
        .try_get("data")?;

    Ok(order)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_driver_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Driver, Error> {
    let Json(driver): Json<Driver> = tx
        .fetch_optional(sqlx::query("SELECT data FROM drivers WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or(Error::NotFound("driver"))?
        .try_get("data")?;

    Ok(driver)
}

/// Drivers are keyed by their owning user for direct lookup.
#[tracing::instrument(skip(tx))]
pub async fn fetch_driver_by_user_for_update(
    tx: &mut Transaction<'_, Database>,
    user_id: &Uuid,
) -> Result<Driver, Error> {
    let Json(driver): Json<Driver> = tx
        .fetch_optional(
            sqlx::query("SELECT data FROM drivers WHERE user_id = $1 FOR UPDATE").bind(user_id),
        )
        .await?
        .ok_or(Error::NotFound("driver"))?
        .try_get("data")?;

    Ok(driver)
}

#[tracing::instrument(skip(tx))]
pub async fn fetch_wallet_for_update(
    tx: &mut Transaction<'_, Database>,
    id: &Uuid,
) -> Result<Wallet, Error> {
    let Json(wallet): Json<Wallet> = tx
        .fetch_optional(sqlx::query("SELECT data FROM wallets WHERE id = $1 FOR UPDATE").bind(id))
        .await?
        .ok_or(Error::NotFound("wallet"))?
        .try_get("data")?;

    Ok(wallet)
}

#[tracing::instrument(skip(executor))]
pub async fn fetch_user<'e, E>(executor: E, id: &Uuid) -> Result<User, Error>
where
    E: Executor<'e, Database = Database>,
{
    let Json(user): Json<User> = sqlx::query("SELECT data FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or(Error::NotFound("user"))?
        .try_get("data")?;

    Ok(user)
}

#[tracing::instrument(skip(executor))]
pub async fn fetch_vehicle_type<'e, E>(executor: E, id: &Uuid) -> Result<VehicleType, Error>
where
    E: Executor<'e, Database = Database>,
{
    let Json(vehicle_type): Json<VehicleType> =
        sqlx::query("SELECT data FROM vehicle_types WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or(Error::NotFound("vehicle type"))?
            .try_get("data")?;

    Ok(vehicle_type)
}

#[tracing::instrument(skip(tx))]
pub async fn update_order(tx: &mut Transaction<'_, Database>, order: &Order) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE orders SET status = $2, data = $3 WHERE id = $1")
            .bind(&order.id)
            .bind(order.status.name())
            .bind(Json(order)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx))]
pub async fn update_driver(
    tx: &mut Transaction<'_, Database>,
    driver: &Driver,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "UPDATE drivers SET status = $2, approved = $3, blocked = $4, data = $5 WHERE id = $1",
        )
        .bind(&driver.id)
        .bind(driver.status.name())
        .bind(driver.approved)
        .bind(driver.blocked)
        .bind(Json(driver)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx))]
pub async fn update_wallet(
    tx: &mut Transaction<'_, Database>,
    wallet: &Wallet,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query("UPDATE wallets SET data = $2 WHERE id = $1")
            .bind(&wallet.id)
            .bind(Json(wallet)),
    )
    .await?;

    Ok(())
}

#[tracing::instrument(skip(tx, row))]
pub async fn insert_wallet_transaction(
    tx: &mut Transaction<'_, Database>,
    row: &WalletTransaction,
) -> Result<(), Error> {
    tx.execute(
        sqlx::query(
            "INSERT INTO wallet_transactions (id, wallet_id, created_at, data) VALUES ($1, $2, $3, $4)",
        )
        .bind(&row.id)
        .bind(&row.wallet_id)
        .bind(row.timestamp)
        .bind(Json(row)),
    )
    .await?;

    Ok(())
}
