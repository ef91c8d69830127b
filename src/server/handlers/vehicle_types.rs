use axum::extract::{Extension, Json, Path};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Caller;
use crate::entities::VehicleType;
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    name: String,
    base_fare: Decimal,
    price_per_km: Decimal,
}

#[derive(Serialize, Deserialize)]
pub struct UpdatePricingParams {
    base_fare: Decimal,
    price_per_km: Decimal,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Json(params): Json<CreateParams>,
) -> Result<Json<VehicleType>, Error> {
    let vehicle_type = api
        .create_vehicle_type(caller, params.name, params.base_fare, params.price_per_km)
        .await?;

    Ok(vehicle_type.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleType>, Error> {
    let vehicle_type = api.find_vehicle_type(caller, id).await?;

    Ok(vehicle_type.into())
}

pub async fn list(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<VehicleType>>, Error> {
    let vehicle_types = api.list_vehicle_types(caller).await?;

    Ok(vehicle_types.into())
}

pub async fn update_pricing(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdatePricingParams>,
) -> Result<Json<VehicleType>, Error> {
    let vehicle_type = api
        .update_vehicle_type_pricing(caller, id, params.base_fare, params.price_per_km)
        .await?;

    Ok(vehicle_type.into())
}
