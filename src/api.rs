use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::Caller;
use crate::entities::{
    Coordinates, Driver, Order, OrderStatus, Review, Role, Stop, User, VehicleType, Wallet,
    WalletTransaction,
};
use crate::error::Error;

#[async_trait]
pub trait OrderAPI {
    async fn create_order(
        &self,
        caller: Caller,
        vehicle_type_id: Uuid,
        pickup: Stop,
        drop_off: Stop,
        distance_km: Decimal,
    ) -> Result<Order, Error>;

    async fn find_order(&self, caller: Caller, id: Uuid) -> Result<Order, Error>;

    async fn cancel_order(&self, caller: Caller, id: Uuid) -> Result<Order, Error>;

    async fn accept_order(&self, caller: Caller, id: Uuid) -> Result<Order, Error>;

    async fn update_order_status(
        &self,
        caller: Caller,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<Order, Error>;

    async fn list_pending_orders(&self, caller: Caller) -> Result<Vec<Order>, Error>;
}

#[async_trait]
pub trait DriverAPI {
    async fn create_driver(
        &self,
        caller: Caller,
        vehicle_type_id: Uuid,
        license_number: String,
        vehicle_plate_number: String,
    ) -> Result<Driver, Error>;

    async fn find_driver(&self, caller: Caller, id: Uuid) -> Result<Driver, Error>;

    async fn set_driver_availability(
        &self,
        caller: Caller,
        available: bool,
    ) -> Result<Driver, Error>;

    async fn approve_driver(&self, caller: Caller, id: Uuid) -> Result<Driver, Error>;

    async fn set_driver_blocked(
        &self,
        caller: Caller,
        id: Uuid,
        blocked: bool,
    ) -> Result<Driver, Error>;
}

#[async_trait]
pub trait DriverLocationAPI {
    async fn update_driver_location(
        &self,
        caller: Caller,
        coordinates: Coordinates,
    ) -> Result<(), Error>;
}

/// A matchable driver within the search radius.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NearbyDriver {
    pub driver: Driver,
    pub distance_km: f64,
}

#[async_trait]
pub trait DriverSearchAPI {
    async fn find_nearby_drivers(
        &self,
        caller: Caller,
        center: Coordinates,
        radius_km: Option<f64>,
    ) -> Result<Vec<NearbyDriver>, Error>;
}

#[async_trait]
pub trait WalletAPI {
    async fn balance(&self, caller: Caller) -> Result<Decimal, Error>;

    async fn top_up(&self, caller: Caller, amount: Decimal) -> Result<Wallet, Error>;

    async fn transfer_funds(
        &self,
        caller: Caller,
        receiver_user_id: Uuid,
        amount: Decimal,
        description: Option<String>,
    ) -> Result<(), Error>;

    async fn wallet_history(&self, caller: Caller) -> Result<Vec<WalletTransaction>, Error>;
}

#[async_trait]
pub trait VehicleTypeAPI {
    async fn create_vehicle_type(
        &self,
        caller: Caller,
        name: String,
        base_fare: Decimal,
        price_per_km: Decimal,
    ) -> Result<VehicleType, Error>;

    async fn update_vehicle_type_pricing(
        &self,
        caller: Caller,
        id: Uuid,
        base_fare: Decimal,
        price_per_km: Decimal,
    ) -> Result<VehicleType, Error>;

    async fn find_vehicle_type(&self, caller: Caller, id: Uuid) -> Result<VehicleType, Error>;

    async fn list_vehicle_types(&self, caller: Caller) -> Result<Vec<VehicleType>, Error>;
}

#[async_trait]
pub trait ReviewAPI {
    async fn create_review(
        &self,
        caller: Caller,
        order_id: Uuid,
        rating: i32,
        comment: Option<String>,
    ) -> Result<Review, Error>;
}

#[async_trait]
pub trait UserAPI {
    async fn create_user(
        &self,
        caller: Caller,
        email: String,
        name: String,
        phone: Option<String>,
        role: Role,
    ) -> Result<User, Error>;

    async fn find_user(&self, caller: Caller, id: Uuid) -> Result<User, Error>;
}

pub trait API:
    OrderAPI
    + DriverAPI
    + DriverLocationAPI
    + DriverSearchAPI
    + WalletAPI
    + VehicleTypeAPI
    + ReviewAPI
    + UserAPI
{
}

pub type DynAPI = Arc<dyn API + Send + Sync>;
