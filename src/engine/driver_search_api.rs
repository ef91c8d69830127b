use super::Engine;

use async_trait::async_trait;
use sqlx::{types::Json, Executor, Row};

use crate::{
    api::{DriverSearchAPI, NearbyDriver},
    auth::Caller,
    entities::{Coordinates, Driver},
    error::Error,
};

const DEFAULT_RADIUS_KM: f64 = 5.0;

/// One degree of a great circle on the 6371 km sphere.
const KM_PER_DEGREE: f64 = 111.19492664455873;

#[async_trait]
impl DriverSearchAPI for Engine {
    #[tracing::instrument(skip(self))]
    async fn find_nearby_drivers(
        &self,
        caller: Caller,
        center: Coordinates,
        radius_km: Option<f64>,
    ) -> Result<Vec<NearbyDriver>, Error> {
        let radius_km = radius_km.unwrap_or(DEFAULT_RADIUS_KM);

        let (min_lat, max_lat, min_lng, max_lng) = bounding_box(&center, radius_km);

        // the box over-selects; the exact great-circle distance decides below
        let query = "
            SELECT
                d.data AS driver,
                l.latitude,
                l.longitude
            FROM
                drivers d
                JOIN driver_locations l ON l.driver_id = d.id
            WHERE
                d.status = 'AVAILABLE'
                AND d.approved
                AND NOT d.blocked
                AND l.latitude BETWEEN $1 AND $2
                AND l.longitude BETWEEN $3 AND $4
        ";

        let mut conn = self.pool.acquire().await?;

        let results = conn
            .fetch_all(
                sqlx::query(query)
                    .bind(min_lat)
                    .bind(max_lat)
                    .bind(min_lng)
                    .bind(max_lng),
            )
            .await?;

        let mut nearby = vec![];

        for result in results.iter() {
            let Json(driver): Json<Driver> = result.try_get("driver")?;
            let latitude: f64 = result.try_get("latitude")?;
            let longitude: f64 = result.try_get("longitude")?;

            let distance_km = center.distance_km(&Coordinates::new(latitude, longitude));

            if distance_km <= radius_km {
                nearby.push(NearbyDriver {
                    driver,
                    distance_km,
                });
            }
        }

        nearby.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::info!(
            "found {} matchable drivers within {} km",
            nearby.len(),
            radius_km
        );

        Ok(nearby)
    }
}

/// Degree bounds that are guaranteed to contain every point within
/// `radius_km` of the center.
fn bounding_box(center: &Coordinates, radius_km: f64) -> (f64, f64, f64, f64) {
    let lat_delta = radius_km / KM_PER_DEGREE;
    let lng_delta = radius_km / (KM_PER_DEGREE * center.latitude.to_radians().cos().abs().max(1e-6));

    let min_lat = (center.latitude - lat_delta).max(-90.0);
    let max_lat = (center.latitude + lat_delta).min(90.0);

    let mut min_lng = center.longitude - lng_delta;
    let mut max_lng = center.longitude + lng_delta;

    // a box crossing the antimeridian would lose candidates; widen instead
    if min_lng < -180.0 || max_lng > 180.0 {
        min_lng = -180.0;
        max_lng = 180.0;
    }

    (min_lat, max_lat, min_lng, max_lng)
}
