use super::helpers::{
    fetch_driver_by_user_for_update, fetch_driver_for_update, fetch_user, fetch_vehicle_type,
    update_driver,
};
use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Acquire, Executor, Row};
use uuid::Uuid;

use crate::{
    api::DriverAPI,
    auth::Caller,
    entities::{Driver, Role},
    error::Error,
    external::notifier,
};

#[async_trait]
impl DriverAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_driver(
        &self,
        caller: Caller,
        vehicle_type_id: Uuid,
        license_number: String,
        vehicle_plate_number: String,
    ) -> Result<Driver, Error> {
        let mut conn = self.pool.acquire().await?;

        let user = fetch_user(&mut *conn, &caller.id).await?;

        if user.role != Role::Driver {
            return Err(Error::forbidden("only driver accounts may register"));
        }

        fetch_vehicle_type(&mut *conn, &vehicle_type_id).await?;

        let driver = Driver::new(user.id, vehicle_type_id, license_number, vehicle_plate_number);

        let result = conn
            .execute(
                sqlx::query(
                    "INSERT INTO drivers (id, user_id, status, approved, blocked, data) VALUES ($1, $2, $3, $4, $5, $6) ON CONFLICT (user_id) DO NOTHING",
                )
                .bind(&driver.id)
                .bind(&driver.user_id)
                .bind(driver.status.name())
                .bind(driver.approved)
                .bind(driver.blocked)
                .bind(Json(&driver)),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AlreadyExists("driver"));
        }

        Ok(driver)
    }

    #[tracing::instrument(skip(self))]
    async fn find_driver(&self, caller: Caller, id: Uuid) -> Result<Driver, Error> {
        let mut conn = self.pool.acquire().await?;

        let Json(driver): Json<Driver> = conn
            .fetch_optional(sqlx::query("SELECT data FROM drivers WHERE id = $1").bind(&id))
            .await?
            .ok_or(Error::NotFound("driver"))?
            .try_get("data")?;

        Ok(driver)
    }

    #[tracing::instrument(skip(self))]
    async fn set_driver_availability(
        &self,
        caller: Caller,
        available: bool,
    ) -> Result<Driver, Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut driver = fetch_driver_by_user_for_update(&mut tx, &caller.id).await?;

        if available {
            driver.go_online()?;
        } else {
            driver.go_offline()?;
        }

        update_driver(&mut tx, &driver).await?;

        tx.commit().await?;

        Ok(driver)
    }

    #[tracing::instrument(skip(self))]
    async fn approve_driver(&self, caller: Caller, id: Uuid) -> Result<Driver, Error> {
        if !caller.is_admin() {
            return Err(Error::forbidden("admin only"));
        }

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut driver = fetch_driver_for_update(&mut tx, &id).await?;

        driver.approved = true;

        update_driver(&mut tx, &driver).await?;

        tx.commit().await?;

        tracing::info!("driver {} approved", driver.id);

        let user = fetch_user(&mut *conn, &driver.user_id).await?;

        tokio::spawn(async move {
            if let Err(err) = notifier::send_email(
                &user.email,
                "Registration approved",
                "Your driver registration has been approved. You can now go online.",
            )
            .await
            {
                tracing::warn!("failed to send approval notification: {}", err);
            }
        });

        Ok(driver)
    }

    #[tracing::instrument(skip(self))]
    async fn set_driver_blocked(
        &self,
        caller: Caller,
        id: Uuid,
        blocked: bool,
    ) -> Result<Driver, Error> {
        if !caller.is_admin() {
            return Err(Error::forbidden("admin only"));
        }

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut driver = fetch_driver_for_update(&mut tx, &id).await?;

        if blocked {
            driver.block();
        } else {
            driver.unblock();
        }

        update_driver(&mut tx, &driver).await?;

        tx.commit().await?;

        Ok(driver)
    }
}
