use axum::extract::{Extension, Json, Path, Query};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{DynAPI, NearbyDriver};
use crate::auth::Caller;
use crate::entities::{Coordinates, Driver};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    vehicle_type_id: Uuid,
    license_number: String,
    vehicle_plate_number: String,
}

#[derive(Serialize, Deserialize)]
pub struct AvailabilityParams {
    available: bool,
}

#[derive(Serialize, Deserialize)]
pub struct LocationParams {
    coordinates: Coordinates,
}

#[derive(Serialize, Deserialize)]
pub struct BlockParams {
    blocked: bool,
}

#[derive(Serialize, Deserialize)]
pub struct NearbyParams {
    lat: f64,
    lng: f64,
    radius_km: Option<f64>,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Json(params): Json<CreateParams>,
) -> Result<Json<Driver>, Error> {
    let driver = api
        .create_driver(
            caller,
            params.vehicle_type_id,
            params.license_number,
            params.vehicle_plate_number,
        )
        .await?;

    Ok(driver.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, Error> {
    let driver = api.find_driver(caller, id).await?;

    Ok(driver.into())
}

pub async fn find_nearby(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<Vec<NearbyDriver>>, Error> {
    let nearby = api
        .find_nearby_drivers(
            caller,
            Coordinates::new(params.lat, params.lng),
            params.radius_km,
        )
        .await?;

    Ok(nearby.into())
}

pub async fn update_availability(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Json(params): Json<AvailabilityParams>,
) -> Result<Json<Driver>, Error> {
    let driver = api
        .set_driver_availability(caller, params.available)
        .await?;

    Ok(driver.into())
}

pub async fn update_location(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Json(params): Json<LocationParams>,
) -> Result<Json<()>, Error> {
    api.update_driver_location(caller, params.coordinates)
        .await?;

    Ok(().into())
}

pub async fn approve(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Driver>, Error> {
    let driver = api.approve_driver(caller, id).await?;

    Ok(driver.into())
}

pub async fn update_block(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(params): Json<BlockParams>,
) -> Result<Json<Driver>, Error> {
    let driver = api.set_driver_blocked(caller, id, params.blocked).await?;

    Ok(driver.into())
}
