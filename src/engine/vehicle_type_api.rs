use super::Engine;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{types::Json, Acquire, Executor, Row, Transaction};
use uuid::Uuid;

use crate::{api::VehicleTypeAPI, auth::Caller, entities::VehicleType, error::Error};

#[async_trait]
impl VehicleTypeAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn create_vehicle_type(
        &self,
        caller: Caller,
        name: String,
        base_fare: Decimal,
        price_per_km: Decimal,
    ) -> Result<VehicleType, Error> {
        if !caller.is_admin() {
            return Err(Error::forbidden("admin only"));
        }

        if base_fare < Decimal::ZERO || price_per_km < Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }

        let vehicle_type = VehicleType::new(name, base_fare, price_per_km);

        let mut conn = self.pool.acquire().await?;

        let result = conn
            .execute(
                sqlx::query(
                    "INSERT INTO vehicle_types (id, name, data) VALUES ($1, $2, $3) ON CONFLICT (name) DO NOTHING",
                )
                .bind(&vehicle_type.id)
                .bind(&vehicle_type.name)
                .bind(Json(&vehicle_type)),
            )
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::AlreadyExists("vehicle type"));
        }

        Ok(vehicle_type)
    }

    #[tracing::instrument(skip(self))]
    async fn update_vehicle_type_pricing(
        &self,
        caller: Caller,
        id: Uuid,
        base_fare: Decimal,
        price_per_km: Decimal,
    ) -> Result<VehicleType, Error> {
        if !caller.is_admin() {
            return Err(Error::forbidden("admin only"));
        }

        if base_fare < Decimal::ZERO || price_per_km < Decimal::ZERO {
            return Err(Error::InvalidAmount);
        }

        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut vehicle_type = fetch_vehicle_type_for_update(&mut tx, &id).await?;

        // identity is immutable, only the pricing may change
        vehicle_type.base_fare = base_fare;
        vehicle_type.price_per_km = price_per_km;

        tx.execute(
            sqlx::query("UPDATE vehicle_types SET data = $2 WHERE id = $1")
                .bind(&vehicle_type.id)
                .bind(Json(&vehicle_type)),
        )
        .await?;

        tx.commit().await?;

        Ok(vehicle_type)
    }

    #[tracing::instrument(skip(self))]
    async fn find_vehicle_type(&self, caller: Caller, id: Uuid) -> Result<VehicleType, Error> {
        let mut conn = self.pool.acquire().await?;

        super::helpers::fetch_vehicle_type(&mut *conn, &id).await
    }

    #[tracing::instrument(skip(self))]
    async fn list_vehicle_types(&self, caller: Caller) -> Result<Vec<VehicleType>, Error> {
        let mut conn = self.pool.acquire().await?;

        let results = conn
            .fetch_all(sqlx::query("SELECT data FROM vehicle_types ORDER BY name"))
            .await?;

        let mut vehicle_types = Vec::with_capacity(results.len());

        for result in results.iter() {
            let Json(vehicle_type): Json<VehicleType> = result.try_get("data")?;
            vehicle_types.push(vehicle_type);
        }

        Ok(vehicle_types)
    }
}

async fn fetch_vehicle_type_for_update(
    tx: &mut Transaction<'_, super::Database>,
    id: &Uuid,
) -> Result<VehicleType, Error> {
    let Json(vehicle_type): Json<VehicleType> = tx
        .fetch_optional(
            sqlx::query("SELECT data FROM vehicle_types WHERE id = $1 FOR UPDATE").bind(id),
        )
        .await?
        .ok_or(Error::NotFound("vehicle type"))?
        .try_get("data")?;

    Ok(vehicle_type)
}
