use super::helpers::{fetch_driver_by_user_for_update, update_driver};
use super::Engine;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Acquire, Executor};

use crate::{api::DriverLocationAPI, auth::Caller, entities::Coordinates, error::Error};

#[async_trait]
impl DriverLocationAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn update_driver_location(
        &self,
        caller: Caller,
        coordinates: Coordinates,
    ) -> Result<(), Error> {
        let mut conn = self.pool.acquire().await?;
        let mut tx = conn.begin().await?;

        let mut driver = fetch_driver_by_user_for_update(&mut tx, &caller.id).await?;

        // last write wins, both on the entity and on the queryable row
        driver.location = Some(coordinates);

        update_driver(&mut tx, &driver).await?;

        tx.execute(
            sqlx::query(
                "INSERT INTO driver_locations (driver_id, latitude, longitude, updated_at) VALUES ($1, $2, $3, $4) ON CONFLICT (driver_id) DO UPDATE SET latitude = $2, longitude = $3, updated_at = $4",
            )
            .bind(&driver.id)
            .bind(coordinates.latitude)
            .bind(coordinates.longitude)
            .bind(Utc::now()),
        )
        .await?;

        tx.commit().await?;

        Ok(())
    }
}
