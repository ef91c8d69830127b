use axum::extract::{Extension, Json, Path};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Caller;
use crate::entities::{Order, OrderStatus, Stop};
use crate::error::Error;

#[derive(Serialize, Deserialize)]
pub struct CreateParams {
    vehicle_type_id: Uuid,
    pickup: Stop,
    drop_off: Stop,
    distance_km: Decimal,
}

#[derive(Serialize, Deserialize)]
pub struct UpdateStatusParams {
    status: OrderStatus,
}

pub async fn create(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Json(params): Json<CreateParams>,
) -> Result<Json<Order>, Error> {
    let order = api
        .create_order(
            caller,
            params.vehicle_type_id,
            params.pickup,
            params.drop_off,
            params.distance_km,
        )
        .await?;

    Ok(order.into())
}

pub async fn find(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, Error> {
    let order = api.find_order(caller, id).await?;

    Ok(order.into())
}

pub async fn list_pending(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<Vec<Order>>, Error> {
    let orders = api.list_pending_orders(caller).await?;

    Ok(orders.into())
}

pub async fn cancel(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, Error> {
    let order = api.cancel_order(caller, id).await?;

    Ok(order.into())
}

pub async fn accept(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, Error> {
    let order = api.accept_order(caller, id).await?;

    Ok(order.into())
}

pub async fn update_status(
    Extension(api): Extension<DynAPI>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<Uuid>,
    Json(params): Json<UpdateStatusParams>,
) -> Result<Json<Order>, Error> {
    let order = api.update_order_status(caller, id, params.status).await?;

    Ok(order.into())
}
