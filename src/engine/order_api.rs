use super::helpers::{
    fetch_driver_by_user_for_update, fetch_order_for_update, fetch_user, fetch_vehicle_type,
    fetch_wallet_for_update, update_driver, update_order,
};
use super::wallet_api::{ensure_wallet, transfer_in_tx, PLATFORM_ACCOUNT_ID};
use super::Engine;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::OrderAPI,
    auth::Caller,
    entities::{Driver, Order, OrderStatus, Role, Stop},
    error::Error,
    external::notifier,
};

#[async_trait]
impl OrderAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_order(
        &self,
        caller: Caller,
        vehicle_type_id: Uuid,
        pickup: Stop,
        drop_off: Stop,
        distance_km: Decimal,
    ) -> Result<Order, Error> {
        let mut conn = self.pool.acquire().await?;

        let customer = fetch_user(&mut *conn, &caller.id).await?;
        let vehicle_type = fetch_vehicle_type(&mut *conn, &vehicle_type_id).await?;

        let order = Order::new(customer.id, &vehicle_type, pickup, drop_off, distance_km);

        conn.execute(
            sqlx::query("INSERT INTO orders (id, status, created_at, data) VALUES ($1, $2, $3, $4)")
                .bind(&order.id)
                .bind(order.status.name())
                .bind(order.created_at)
                .bind(Json(&order)),
        )
        .await?;

        tracing::info!("order {} created, quoted price {}", order.id, order.price);

        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    async fn find_order(&self, caller: Caller, id: Uuid) -> Result<Order, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(order): Json<Order> = conn
            .fetch_optional(sqlx::query("SELECT data FROM orders WHERE id = $1").bind(&id))
            .await?
            .ok_or(Error::NotFound("order"))?
            .try_get("data")?;

        if caller.is_admin() || order.customer_id == caller.id {
            return Ok(order);
        }

        // the assigned driver may also read the order
        if let Some(driver) = driver_for_user(&mut conn, &caller.id).await? {
            if order.driver_id == Some(driver.id) {
                return Ok(order);
            }
        }

        Err(Error::forbidden("no access to this order"))
    }

    #[tracing::instrument(skip(self))]
    async fn cancel_order(&self, caller: Caller, id: Uuid) -> Result<Order, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut order = fetch_order_for_update(&mut tx, &id).await?;

        order.cancel(caller.id)?;

        update_order(&mut tx, &order).await?;

        tx.commit().await?;

        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    async fn accept_order(&self, caller: Caller, id: Uuid) -> Result<Order, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut order = fetch_order_for_update(&mut tx, &id).await?;
        let mut driver = fetch_driver_by_user_for_update(&mut tx, &caller.id).await?;

        // the status check and the driver lock commit as one unit; the loser
        // of a concurrent accept sees the order already ACCEPTED
        order.assign_driver(driver.id)?;
        driver.assign(order.id)?;

        update_order(&mut tx, &order).await?;
        update_driver(&mut tx, &driver).await?;

        tx.commit().await?;

        tracing::info!("order {} accepted by driver {}", order.id, driver.id);

        // notification is best effort; the acceptance is already committed
        match fetch_user(&mut *conn, &order.customer_id).await {
            Ok(customer) => {
                let body = format!(
                    "Your order {} was accepted. Vehicle {} is on the way.",
                    order.id, driver.vehicle_plate_number
                );

                tokio::spawn(async move {
                    if let Err(err) =
                        notifier::send_email(&customer.email, "Driver assigned", &body).await
                    {
                        tracing::warn!("failed to send acceptance notification: {}", err);
                    }
                });
            }
            Err(err) => tracing::warn!("failed to load customer for notification: {}", err),
        }

        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    async fn update_order_status(
        &self,
        caller: Caller,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut order = fetch_order_for_update(&mut tx, &id).await?;
        let mut driver = fetch_driver_by_user_for_update(&mut tx, &caller.id).await?;

        order.advance(driver.id, status)?;

        update_order(&mut tx, &order).await?;

        if status != OrderStatus::Completed {
            tx.commit().await?;

            return Ok(order);
        }

        driver.free();
        update_driver(&mut tx, &driver).await?;

        // settlement: the customer pays the full price, split into the
        // driver's earning and the platform commission; both transfers commit
        // with the status change or the whole transition rolls back to
        // IN_TRANSIT
        let commission = order.commission();
        let earning = order.driver_earning();

        tracing::info!(
            "settling order {}: price {}, commission {}, driver earning {}",
            order.id,
            order.price,
            commission,
            earning
        );

        let customer_wallet_id = ensure_wallet(&mut tx, &order.customer_id).await?;
        let customer_wallet = fetch_wallet_for_update(&mut tx, &customer_wallet_id).await?;

        // the customer must cover the full price; checking up front keeps the
        // reported balance meaningful
        if customer_wallet.balance < order.price {
            return Err(Error::Payment(Box::new(Error::InsufficientFunds {
                balance: customer_wallet.balance,
            })));
        }

        let settlement = async {
            transfer_in_tx(
                &mut tx,
                &order.customer_id,
                &driver.user_id,
                earning,
                format!(
                    "Payment for order {} (driver earning after 10% commission)",
                    order.id
                ),
            )
            .await?;

            transfer_in_tx(
                &mut tx,
                &order.customer_id,
                &PLATFORM_ACCOUNT_ID,
                commission,
                format!("Platform commission for order {}", order.id),
            )
            .await
        };

        if let Err(err) = settlement.await {
            tracing::warn!("settlement failed for order {}: {}", order.id, err);

            return Err(Error::Payment(Box::new(err)));
        }

        tx.commit().await?;

        match fetch_user(&mut *conn, &order.customer_id).await {
            Ok(customer) => {
                let body = format!(
                    "Your trip is finished. Total price: {}. The amount was debited from your wallet.",
                    order.price
                );

                tokio::spawn(async move {
                    if let Err(err) =
                        notifier::send_email(&customer.email, "Trip completed", &body).await
                    {
                        tracing::warn!("failed to send completion notification: {}", err);
                    }
                });
            }
            Err(err) => tracing::warn!("failed to load customer for notification: {}", err),
        }

        Ok(order)
    }

    #[tracing::instrument(skip(self))]
    async fn list_pending_orders(&self, caller: Caller) -> Result<Vec<Order>, Error> {
        if caller.role != Role::Driver && !caller.is_admin() {
            return Err(Error::forbidden("only drivers may list pending orders"));
        }

        let mut conn = self.pool.acquire().await?;

        let results = conn
            .fetch_all(sqlx::query(
                "SELECT data FROM orders WHERE status = 'PENDING' ORDER BY created_at DESC",
            ))
            .await?;

        let mut orders = Vec::with_capacity(results.len());

        for result in results.iter() {
            let Json(order): Json<Order> = result.try_get("data")?;
            orders.push(order);
        }

        Ok(orders)
    }
}

async fn driver_for_user(
    conn: &mut sqlx::pool::PoolConnection<super::Database>,
    user_id: &Uuid,
) -> Result<Option<Driver>, Error> {
    let maybe_result = conn
        .fetch_optional(sqlx::query("SELECT data FROM drivers WHERE user_id = $1").bind(user_id))
        .await?;

    match maybe_result {
        Some(result) => {
            let Json(driver): Json<Driver> = result.try_get("data")?;
            Ok(Some(driver))
        }
        None => Ok(None),
    }
}
